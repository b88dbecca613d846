use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::utils::time::parse_instant;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SentimentLabel {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "neutral" => Ok(SentimentLabel::Neutral),
            "negative" => Ok(SentimentLabel::Negative),
            other => Err(format!("unsupported sentiment label: {other}")),
        }
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl<'de> Deserialize<'de> for SentimentLabel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        SentimentLabel::try_from(raw.as_str()).map_err(serde::de::Error::custom)
    }
}

/// Classifier output attached to a record at ingestion time.
///
/// `score` always lives in `[0, 1]`; the 0-5 star scale shown on the
/// dashboard is applied by the presentation layer.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub score: f64,
}

impl Sentiment {
    /// Returns `None` for non-finite scores; finite scores are clamped into `[0, 1]`.
    pub fn new(label: SentimentLabel, score: f64) -> Option<Self> {
        if !score.is_finite() {
            return None;
        }
        Some(Self {
            label,
            score: score.clamp(0.0, 1.0),
        })
    }

    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;
        let label = object
            .get("label")
            .and_then(JsonValue::as_str)
            .and_then(|raw| SentimentLabel::try_from(raw).ok())?;
        let score = object.get("score").and_then(JsonValue::as_f64)?;
        Sentiment::new(label, score)
    }
}

fn lenient_sentiment<'de, D>(deserializer: D) -> Result<Option<Sentiment>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Sentiment::from_json))
}

/// One answer inside a submission. Only `Text` feeds keyword extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ResponseValue {
    Text(String),
    Number(f64),
    Choices(Vec<String>),
    Structured(JsonValue),
}

impl ResponseValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for ResponseValue {
    fn from(value: &str) -> Self {
        ResponseValue::Text(value.to_string())
    }
}

impl From<String> for ResponseValue {
    fn from(value: String) -> Self {
        ResponseValue::Text(value)
    }
}

impl From<f64> for ResponseValue {
    fn from(value: f64) -> Self {
        ResponseValue::Number(value)
    }
}

/// Storage-shaped submission. Every field reads leniently: a value of the
/// wrong type degrades to its empty form so one bad field never rejects a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    #[serde(default, alias = "_id", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub form_id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub submitted_at: Option<String>,
    /// Answers in submission order.
    #[serde(default, deserialize_with = "lenient_responses")]
    pub responses: IndexMap<String, ResponseValue>,
    #[serde(default, deserialize_with = "lenient_sentiment")]
    pub sentiment: Option<Sentiment>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text"
    )]
    pub status: Option<String>,
}

/// Strings pass through; numeric ids are kept as text; anything else is empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match raw {
        Some(JsonValue::String(value)) => value,
        Some(JsonValue::Number(value)) => value.to_string(),
        _ => String::new(),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match raw {
        Some(JsonValue::String(value)) => Some(value),
        _ => None,
    })
}

/// Non-object `responses` read as no answers. Key order is preserved.
fn lenient_responses<'de, D>(deserializer: D) -> Result<IndexMap<String, ResponseValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<JsonValue>::deserialize(deserializer)?;
    let Some(JsonValue::Object(fields)) = raw else {
        return Ok(IndexMap::new());
    };
    Ok(fields
        .into_iter()
        .filter_map(|(field, value)| {
            serde_json::from_value::<ResponseValue>(value)
                .ok()
                .map(|value| (field, value))
        })
        .collect())
}

impl FeedbackRecord {
    pub fn new(id: impl Into<String>, form_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            form_id: form_id.into(),
            submitted_at: None,
            responses: IndexMap::new(),
            sentiment: None,
            status: None,
        }
    }

    pub fn with_submitted_at(mut self, submitted_at: impl Into<String>) -> Self {
        self.submitted_at = Some(submitted_at.into());
        self
    }

    pub fn with_response(mut self, field: impl Into<String>, value: impl Into<ResponseValue>) -> Self {
        self.responses.insert(field.into(), value.into());
        self
    }

    pub fn with_sentiment(mut self, label: SentimentLabel, score: f64) -> Self {
        self.sentiment = Sentiment::new(label, score);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// `None` means "unknown time": the record stays out of time-bucketed views.
    pub fn submitted_instant(&self) -> Option<DateTime<Utc>> {
        self.submitted_at.as_deref().and_then(parse_instant)
    }

    pub fn is_scored(&self) -> bool {
        self.sentiment.is_some()
    }

    pub fn text_responses(&self) -> impl Iterator<Item = &str> {
        self.responses.values().filter_map(ResponseValue::as_text)
    }

    /// All text answers joined into the single corpus used for keywords.
    pub fn corpus(&self) -> String {
        self.text_responses().collect::<Vec<_>>().join(" ")
    }
}

/// Reads a JSON array of stored records. Entries that are not objects are
/// skipped and counted; every object yields a record.
pub fn records_from_json(value: JsonValue) -> Vec<FeedbackRecord> {
    let JsonValue::Array(entries) = value else {
        warn!(target: "app::analytics", "feedback payload is not an array");
        return Vec::new();
    };

    let total = entries.len();
    let records: Vec<FeedbackRecord> = entries
        .into_iter()
        .filter(JsonValue::is_object)
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        warn!(target: "app::analytics", skipped, total, "skipped malformed feedback entries");
    }
    records
}
