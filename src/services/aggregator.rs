use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::analytics::{Overview, SentimentDistribution};
use crate::models::feedback::{FeedbackRecord, Sentiment, SentimentLabel};

const RESPONSE_RATE_PER_FORM: f64 = 20.0;
const RESPONSE_RATE_CAP: f64 = 100.0;

/// Count/mean pair shared by the overview, every trend bucket and every
/// heatmap cell. Merging is associative, so any partition of the input
/// folds to the same totals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SentimentStats {
    pub total: u64,
    pub scored: u64,
    score_sum: f64,
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

impl SentimentStats {
    pub fn observe(&mut self, record: &FeedbackRecord) {
        self.observe_sentiment(record.sentiment.as_ref());
    }

    pub fn observe_sentiment(&mut self, sentiment: Option<&Sentiment>) {
        self.total += 1;
        let Some(sentiment) = sentiment else {
            return;
        };
        self.scored += 1;
        self.score_sum += sentiment.score;
        match sentiment.label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }

    pub fn merge(&mut self, other: &SentimentStats) {
        self.total += other.total;
        self.scored += other.scored;
        self.score_sum += other.score_sum;
        self.positive += other.positive;
        self.neutral += other.neutral;
        self.negative += other.negative;
    }

    pub fn merged(mut self, other: SentimentStats) -> Self {
        self.merge(&other);
        self
    }

    /// `0.0` when nothing is scored; check `scored` before reading it as negative sentiment.
    pub fn average_score(&self) -> f64 {
        if self.scored == 0 {
            0.0
        } else {
            self.score_sum / self.scored as f64
        }
    }

    pub fn score_sum(&self) -> f64 {
        self.score_sum
    }

    pub fn unscored(&self) -> u64 {
        self.total - self.scored
    }

    pub fn distribution(&self) -> SentimentDistribution {
        SentimentDistribution {
            positive: self.positive,
            neutral: self.neutral,
            negative: self.negative,
        }
    }
}

impl<'a> Extend<&'a FeedbackRecord> for SentimentStats {
    fn extend<T: IntoIterator<Item = &'a FeedbackRecord>>(&mut self, iter: T) {
        for record in iter {
            self.observe(record);
        }
    }
}

impl<'a> FromIterator<&'a FeedbackRecord> for SentimentStats {
    fn from_iter<T: IntoIterator<Item = &'a FeedbackRecord>>(iter: T) -> Self {
        let mut stats = SentimentStats::default();
        stats.extend(iter);
        stats
    }
}

pub fn aggregate<'a, I>(records: I) -> SentimentStats
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    records.into_iter().collect()
}

/// Folds the slice chunk by chunk, checking `cancel` between chunks.
pub fn aggregate_chunked(
    records: &[FeedbackRecord],
    chunk_size: usize,
    cancel: &AtomicBool,
) -> AppResult<SentimentStats> {
    if chunk_size == 0 {
        return Err(AppError::validation("chunk size must be positive"));
    }

    let mut stats = SentimentStats::default();
    for (index, chunk) in records.chunks(chunk_size).enumerate() {
        if cancel.load(Ordering::Relaxed) {
            debug!(
                target: "app::analytics",
                chunks_done = index,
                records_done = stats.total,
                "chunked aggregation interrupted"
            );
            return Err(AppError::cancelled());
        }
        stats.merge(&aggregate(chunk));
    }
    Ok(stats)
}

/// Distinct non-empty form ids.
pub fn count_active_forms<'a, I>(records: I) -> u64
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    records
        .into_iter()
        .map(|record| record.form_id.trim())
        .filter(|form_id| !form_id.is_empty())
        .collect::<HashSet<_>>()
        .len() as u64
}

/// Legacy dashboard heuristic: `min(100, total / max(forms, 1) * 20)`.
pub fn response_rate(total_feedback: u64, form_count: usize) -> f64 {
    let forms = form_count.max(1) as f64;
    (total_feedback as f64 / forms * RESPONSE_RATE_PER_FORM).min(RESPONSE_RATE_CAP)
}

pub fn build_overview(stats: &SentimentStats, active_forms: u64, form_count: Option<usize>) -> Overview {
    Overview {
        total_feedback: stats.total,
        scored_feedback: stats.scored,
        average_sentiment_score: stats.average_score(),
        active_forms,
        response_rate: form_count.map(|forms| response_rate(stats.total, forms)),
    }
}
