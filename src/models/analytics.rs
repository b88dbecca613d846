use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{AppError, AppResult};
use crate::models::settings::EngineSettings;

pub const DEFAULT_TOP_KEYWORDS: usize = 50;
pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

/// Inclusive `[start, end]` range of instants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.start > self.end {
            return Err(AppError::invalid_window(self.start, self.end));
        }
        Ok(())
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOptions {
    #[serde(default)]
    pub window: Option<TimeWindow>,
    #[serde(default)]
    pub granularity: Granularity,
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Number of forms owned by the caller; enables the legacy response-rate figure.
    #[serde(default)]
    pub form_count: Option<usize>,
}

fn default_top_keywords() -> usize {
    DEFAULT_TOP_KEYWORDS
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            window: None,
            granularity: Granularity::Day,
            top_keywords: DEFAULT_TOP_KEYWORDS,
            timezone: DEFAULT_TIMEZONE.to_string(),
            form_count: None,
        }
    }
}

impl AnalyticsOptions {
    /// Per-query defaults taken from the engine settings.
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            window: None,
            granularity: settings.default_granularity,
            top_keywords: settings.top_keywords,
            timezone: settings.default_timezone.clone(),
            form_count: None,
        }
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }
}

/// Half-open calendar interval `[period_start, period_end)` in the query's time zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub label: String,
}

impl TimeBucket {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.period_start && date < self.period_end
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_feedback: u64,
    pub scored_feedback: u64,
    pub average_sentiment_score: f64,
    pub active_forms: u64,
    pub response_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SentimentDistribution {
    #[serde(rename = "Positive")]
    pub positive: u64,
    #[serde(rename = "Neutral")]
    pub neutral: u64,
    #[serde(rename = "Negative")]
    pub negative: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentimentPercentages {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SentimentTendency {
    Positive,
    Negative,
    Balanced,
}

impl SentimentDistribution {
    pub fn total(&self) -> u64 {
        self.positive + self.neutral + self.negative
    }

    pub fn percentages(&self) -> SentimentPercentages {
        let total = self.total();
        let share = |count: u64| {
            if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };
        SentimentPercentages {
            positive: share(self.positive),
            neutral: share(self.neutral),
            negative: share(self.negative),
        }
    }

    pub fn tendency(&self) -> SentimentTendency {
        match self.positive.cmp(&self.negative) {
            std::cmp::Ordering::Greater => SentimentTendency::Positive,
            std::cmp::Ordering::Less => SentimentTendency::Negative,
            std::cmp::Ordering::Equal => SentimentTendency::Balanced,
        }
    }
}

/// One bucket of the trend series: the single source for both legacy chart arrays.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub bucket: TimeBucket,
    pub count: u64,
    pub scored_count: u64,
    pub average_score: f64,
}

impl TrendPoint {
    pub fn date(&self) -> String {
        self.bucket.period_start.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackTrendPoint {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentimentTrendPoint {
    pub date: String,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeywordFrequency {
    pub term: String,
    pub frequency: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub day_of_week: u8,
    pub hour_of_day: u8,
    pub count: u64,
    pub average_score: f64,
}

/// Fixed 7x24 grid, row-major by day of week (0 = Sunday) then hour.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct Heatmap {
    cells: Vec<HeatmapCell>,
}

impl Heatmap {
    pub const DAYS: usize = 7;
    pub const HOURS: usize = 24;

    pub(crate) fn from_cells(cells: Vec<HeatmapCell>) -> Self {
        debug_assert_eq!(cells.len(), Self::DAYS * Self::HOURS);
        Self { cells }
    }

    pub fn cells(&self) -> &[HeatmapCell] {
        &self.cells
    }

    pub fn cell(&self, day_of_week: u8, hour_of_day: u8) -> Option<&HeatmapCell> {
        let (day, hour) = (usize::from(day_of_week), usize::from(hour_of_day));
        if day >= Self::DAYS || hour >= Self::HOURS {
            return None;
        }
        self.cells.get(day * Self::HOURS + hour)
    }

    pub fn total_count(&self) -> u64 {
        self.cells.iter().map(|cell| cell.count).sum()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsMeta {
    pub granularity: Granularity,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_end: Option<String>,
    pub bucket_count: usize,
}

/// Value object handed to the dashboard. Serializes the legacy positional
/// `feedbackTrends` / `sentimentTrends` arrays from the single `trends` series.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsResult {
    pub overview: Overview,
    pub sentiment_distribution: SentimentDistribution,
    pub trends: Vec<TrendPoint>,
    pub keywords: Vec<KeywordFrequency>,
    pub heatmap: Heatmap,
    pub meta: AnalyticsMeta,
}

impl AnalyticsResult {
    /// Both legacy chart arrays in one pass; index `i` of each refers to the same bucket.
    pub fn chart_series(&self) -> (Vec<FeedbackTrendPoint>, Vec<SentimentTrendPoint>) {
        self.trends
            .iter()
            .map(|point| {
                let date = point.date();
                (
                    FeedbackTrendPoint {
                        date: date.clone(),
                        count: point.count,
                    },
                    SentimentTrendPoint {
                        date,
                        average_score: point.average_score,
                    },
                )
            })
            .unzip()
    }

    pub fn feedback_trends(&self) -> Vec<FeedbackTrendPoint> {
        self.trends
            .iter()
            .map(|point| FeedbackTrendPoint {
                date: point.date(),
                count: point.count,
            })
            .collect()
    }

    pub fn sentiment_trends(&self) -> Vec<SentimentTrendPoint> {
        self.trends
            .iter()
            .map(|point| SentimentTrendPoint {
                date: point.date(),
                average_score: point.average_score,
            })
            .collect()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsResultWire<'a> {
    overview: &'a Overview,
    sentiment_distribution: &'a SentimentDistribution,
    feedback_trends: Vec<FeedbackTrendPoint>,
    sentiment_trends: Vec<SentimentTrendPoint>,
    trends: &'a [TrendPoint],
    keywords: &'a [KeywordFrequency],
    heatmap: &'a Heatmap,
    meta: &'a AnalyticsMeta,
}

impl Serialize for AnalyticsResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let (feedback_trends, sentiment_trends) = self.chart_series();
        AnalyticsResultWire {
            overview: &self.overview,
            sentiment_distribution: &self.sentiment_distribution,
            feedback_trends,
            sentiment_trends,
            trends: &self.trends,
            keywords: &self.keywords,
            heatmap: &self.heatmap,
            meta: &self.meta,
        }
        .serialize(serializer)
    }
}
