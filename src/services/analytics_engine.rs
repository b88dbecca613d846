use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::analytics::{
    AnalyticsMeta, AnalyticsOptions, AnalyticsResult, Heatmap, KeywordFrequency, TimeWindow,
    TrendPoint,
};
use crate::models::feedback::FeedbackRecord;
use crate::models::settings::EngineSettings;
use crate::services::aggregator::{aggregate, build_overview, count_active_forms, SentimentStats};
use crate::services::heatmap_builder::build_heatmap;
use crate::services::keyword_extractor::KeywordExtractor;
use crate::services::trend_builder::build_trends;
use crate::utils::time::parse_timezone;

/// Stateless facade: every call is a pure function of `records` and `options`.
/// The only fields are immutable configuration, so one engine can serve
/// concurrent callers.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    keywords: KeywordExtractor,
    parallel_threshold: usize,
}

struct PreparedQuery<'a> {
    tz: Tz,
    window: Option<TimeWindow>,
    scoped: Vec<&'a FeedbackRecord>,
    untimed: usize,
    outside_window: usize,
}

struct Sections {
    stats: SentimentStats,
    active_forms: u64,
    keywords: Vec<KeywordFrequency>,
    trends: Vec<TrendPoint>,
    heatmap: Heatmap,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(&EngineSettings::default())
    }
}

impl AnalyticsEngine {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            keywords: KeywordExtractor::from_settings(settings),
            parallel_threshold: settings.parallel_threshold,
        }
    }

    pub fn keyword_extractor(&self) -> &KeywordExtractor {
        &self.keywords
    }

    /// Runs the parallel path once the input exceeds the configured threshold.
    pub fn compute(
        &self,
        records: &[FeedbackRecord],
        options: &AnalyticsOptions,
    ) -> AppResult<AnalyticsResult> {
        if records.len() > self.parallel_threshold {
            self.compute_parallel(records, options)
        } else {
            self.compute_sequential(records, options)
        }
    }

    pub fn compute_sequential(
        &self,
        records: &[FeedbackRecord],
        options: &AnalyticsOptions,
    ) -> AppResult<AnalyticsResult> {
        let prepared = prepare(records, options)?;
        let scoped = prepared.scoped.as_slice();
        let window = prepared.window.as_ref();

        let sections = Sections {
            stats: aggregate(scoped.iter().copied()),
            active_forms: count_active_forms(scoped.iter().copied()),
            keywords: self
                .keywords
                .extract(scoped.iter().copied(), options.top_keywords),
            trends: build_trends(scoped.iter().copied(), window, options.granularity, prepared.tz)?,
            heatmap: build_heatmap(scoped.iter().copied(), window, prepared.tz),
        };

        Ok(assemble(&prepared, options, sections))
    }

    /// Same result as `compute_sequential`; the independent sections run on the rayon pool.
    pub fn compute_parallel(
        &self,
        records: &[FeedbackRecord],
        options: &AnalyticsOptions,
    ) -> AppResult<AnalyticsResult> {
        let prepared = prepare(records, options)?;
        let scoped = prepared.scoped.as_slice();
        let window = prepared.window.as_ref();
        let tz = prepared.tz;

        let ((stats, active_forms), (keywords, (trends, heatmap))) = rayon::join(
            || {
                (
                    aggregate(scoped.iter().copied()),
                    count_active_forms(scoped.iter().copied()),
                )
            },
            || {
                rayon::join(
                    || {
                        self.keywords
                            .extract(scoped.iter().copied(), options.top_keywords)
                    },
                    || {
                        rayon::join(
                            || build_trends(scoped.iter().copied(), window, options.granularity, tz),
                            || build_heatmap(scoped.iter().copied(), window, tz),
                        )
                    },
                )
            },
        );

        let sections = Sections {
            stats,
            active_forms,
            keywords,
            trends: trends?,
            heatmap,
        };

        Ok(assemble(&prepared, options, sections))
    }
}

/// Validates the query before any pass over the records, then narrows the
/// input to the window. Untimed records stay in scope for the non-temporal views.
fn prepare<'a>(
    records: &'a [FeedbackRecord],
    options: &AnalyticsOptions,
) -> AppResult<PreparedQuery<'a>> {
    if let Some(window) = &options.window {
        window.validate()?;
    }
    let tz = parse_timezone(&options.timezone)?;
    let window = options.window;

    let mut untimed = 0usize;
    let mut outside_window = 0usize;
    let scoped: Vec<&FeedbackRecord> = records
        .iter()
        .filter(|record| match (record.submitted_instant(), window) {
            (None, _) => {
                untimed += 1;
                true
            }
            (Some(instant), Some(window)) if !window.contains(instant) => {
                outside_window += 1;
                false
            }
            _ => true,
        })
        .collect();

    Ok(PreparedQuery {
        tz,
        window,
        scoped,
        untimed,
        outside_window,
    })
}

fn assemble(prepared: &PreparedQuery<'_>, options: &AnalyticsOptions, sections: Sections) -> AnalyticsResult {
    let Sections {
        stats,
        active_forms,
        keywords,
        trends,
        heatmap,
    } = sections;

    if prepared.untimed > 0 {
        warn!(
            target: "app::analytics",
            untimed = prepared.untimed,
            "records without a usable submittedAt were left out of trend and heatmap views"
        );
    }

    debug!(
        target: "app::analytics",
        total = stats.total,
        scored = stats.scored,
        outside_window = prepared.outside_window,
        buckets = trends.len(),
        keywords = keywords.len(),
        granularity = options.granularity.as_str(),
        timezone = %prepared.tz.name(),
        "analytics computed"
    );

    AnalyticsResult {
        overview: build_overview(&stats, active_forms, options.form_count),
        sentiment_distribution: stats.distribution(),
        meta: AnalyticsMeta {
            granularity: options.granularity,
            timezone: prepared.tz.name().to_string(),
            window_start: prepared.window.map(|window| window.start.to_rfc3339()),
            window_end: prepared.window.map(|window| window.end.to_rfc3339()),
            bucket_count: trends.len(),
        },
        trends,
        keywords,
        heatmap,
    }
}
