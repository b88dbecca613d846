use serde::{Deserialize, Serialize};

use crate::models::analytics::{Granularity, DEFAULT_TIMEZONE, DEFAULT_TOP_KEYWORDS};

pub const DEFAULT_MIN_KEYWORD_LENGTH: usize = 3;
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 5_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    pub default_granularity: Granularity,
    pub default_timezone: String,
    pub top_keywords: usize,
    pub min_keyword_length: usize,
    /// Added on top of the built-in stop words unless `replace_default_stop_words` is set.
    pub extra_stop_words: Vec<String>,
    pub replace_default_stop_words: bool,
    /// Record count above which sub-computations run on the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_granularity: Granularity::Day,
            default_timezone: DEFAULT_TIMEZONE.to_string(),
            top_keywords: DEFAULT_TOP_KEYWORDS,
            min_keyword_length: DEFAULT_MIN_KEYWORD_LENGTH,
            extra_stop_words: Vec::new(),
            replace_default_stop_words: false,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}
