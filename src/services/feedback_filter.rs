use serde::{Deserialize, Serialize};

use crate::models::feedback::{FeedbackRecord, SentimentLabel};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SentimentFilter {
    #[default]
    All,
    Positive,
    Neutral,
    Negative,
    Unscored,
}

impl SentimentFilter {
    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        let label = record.sentiment.map(|sentiment| sentiment.label);
        match self {
            SentimentFilter::All => true,
            SentimentFilter::Positive => label == Some(SentimentLabel::Positive),
            SentimentFilter::Neutral => label == Some(SentimentLabel::Neutral),
            SentimentFilter::Negative => label == Some(SentimentLabel::Negative),
            SentimentFilter::Unscored => label.is_none(),
        }
    }
}

/// Narrows a record slice the way the admin table does, before it is
/// handed to the engine. Borrowed in, borrowed out.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackFilter {
    #[serde(default)]
    pub sentiment: SentimentFilter,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl FeedbackFilter {
    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        self.sentiment.matches(record) && self.matches_status(record) && self.matches_search(record)
    }

    pub fn apply<'a>(&self, records: &'a [FeedbackRecord]) -> Vec<&'a FeedbackRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }

    fn matches_status(&self, record: &FeedbackRecord) -> bool {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => true,
            Some(status) => record.status.as_deref() == Some(status),
        }
    }

    /// Case-insensitive substring over id, form id and the serialized answers.
    fn matches_search(&self, record: &FeedbackRecord) -> bool {
        let needle = match self.search.as_deref().map(str::trim) {
            None | Some("") => return true,
            Some(term) => term.to_lowercase(),
        };

        if record.id.to_lowercase().contains(&needle) || record.form_id.to_lowercase().contains(&needle) {
            return true;
        }

        serde_json::to_string(&record.responses)
            .map(|answers| answers.to_lowercase().contains(&needle))
            .unwrap_or(false)
    }
}
