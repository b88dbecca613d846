use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::analytics::KeywordFrequency;
use crate::models::feedback::FeedbackRecord;
use crate::models::settings::{EngineSettings, DEFAULT_MIN_KEYWORD_LENGTH};

/// Articles, conjunctions, pronouns and the filler words that dominate
/// free-text answers without carrying a topic.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "and", "but", "nor", "yet", "for", "not", "are", "was", "were", "been", "being",
    "have", "has", "had", "does", "did", "will", "would", "could", "should", "can", "may",
    "might", "must", "shall", "you", "your", "yours", "she", "her", "hers", "him", "his",
    "its", "our", "ours", "they", "them", "their", "theirs", "who", "whom", "whose", "which",
    "what", "this", "that", "these", "those", "myself", "yourself", "itself", "ourselves",
    "themselves", "with", "from", "into", "onto", "about", "than", "then", "there", "here",
    "when", "where", "while", "because", "also", "just", "very", "too", "some", "any", "all",
    "each", "both", "such", "only", "own", "same", "other", "more", "most", "out", "off",
    "over", "under", "again", "once", "how", "why", "one", "get", "got",
];

#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    stop_words: HashSet<String>,
    min_length: usize,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(
            DEFAULT_STOP_WORDS.iter().map(|word| word.to_string()),
            DEFAULT_MIN_KEYWORD_LENGTH,
        )
    }
}

impl KeywordExtractor {
    pub fn new<I, S>(stop_words: I, min_length: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|word| word.as_ref().trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
            min_length,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        let base: &[&str] = if settings.replace_default_stop_words {
            &[]
        } else {
            DEFAULT_STOP_WORDS
        };
        let words = base
            .iter()
            .map(|word| word.to_string())
            .chain(settings.extra_stop_words.iter().cloned());
        Self::new(words, settings.min_keyword_length)
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Lower-cases and splits on anything that is not a letter or digit,
    /// dropping short tokens and stop words.
    pub fn tokenize<'t>(&'t self, text: &'t str) -> impl Iterator<Item = String> + 't {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
            .filter(move |token| token.chars().count() >= self.min_length)
            .filter(move |token| !self.is_stop_word(token))
    }

    /// Top `top_n` terms by frequency; ties keep first-seen order in record order.
    pub fn extract<'a, I>(&self, records: I, top_n: usize) -> Vec<KeywordFrequency>
    where
        I: IntoIterator<Item = &'a FeedbackRecord>,
    {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut counted: Vec<KeywordFrequency> = Vec::new();
        let mut documents = 0usize;

        for record in records {
            let corpus = record.corpus();
            if corpus.is_empty() {
                continue;
            }
            documents += 1;

            for token in self.tokenize(&corpus) {
                match positions.get(&token) {
                    Some(&index) => counted[index].frequency += 1,
                    None => {
                        positions.insert(token.clone(), counted.len());
                        counted.push(KeywordFrequency {
                            term: token,
                            frequency: 1,
                        });
                    }
                }
            }
        }

        let distinct = counted.len();
        // Stable sort: equal frequencies stay in first-seen order.
        counted.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        counted.truncate(top_n);

        debug!(
            target: "app::analytics::keywords",
            documents,
            distinct,
            returned = counted.len(),
            "keyword extraction complete"
        );

        counted
    }
}
