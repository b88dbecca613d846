//! Property-based tests for the analytics engine using proptest.
//!
//! Random record sets exercise the invariants that must hold for any input:
//! counts add up, the trend series stay aligned, and the parallel path
//! agrees with the sequential one.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use feedbackpro_analytics_lib::models::analytics::{AnalyticsOptions, Granularity, TimeWindow};
use feedbackpro_analytics_lib::models::feedback::{FeedbackRecord, SentimentLabel};
use feedbackpro_analytics_lib::services::analytics_engine::AnalyticsEngine;
use feedbackpro_analytics_lib::services::keyword_extractor::KeywordExtractor;
use proptest::prelude::*;

const FORMS: [&str; 4] = ["", "checkout", "onboarding", "support"];
const WORDS: [&str; 8] = [
    "slow", "refund", "friendly", "checkout", "delivery", "great", "the", "app",
];

fn timestamp_strategy() -> impl Strategy<Value = String> {
    (0i64..120, 0u32..24, 0u32..60).prop_map(|(days, hour, minute)| {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(days);
        format!("{}T{:02}:{:02}:00Z", date.format("%Y-%m-%d"), hour, minute)
    })
}

fn submitted_at_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        6 => timestamp_strategy().prop_map(Some),
        1 => Just(None),
        1 => Just(Some("not-a-date".to_string())),
    ]
}

fn sentiment_strategy() -> impl Strategy<Value = Option<(SentimentLabel, f64)>> {
    prop::option::of((
        prop_oneof![
            Just(SentimentLabel::Positive),
            Just(SentimentLabel::Neutral),
            Just(SentimentLabel::Negative),
        ],
        0.0f64..=1.0,
    ))
}

fn record_strategy(
    submitted_at: impl Strategy<Value = Option<String>>,
) -> impl Strategy<Value = FeedbackRecord> {
    (
        0usize..FORMS.len(),
        submitted_at,
        sentiment_strategy(),
        prop::collection::vec(0usize..WORDS.len(), 0..6),
    )
        .prop_map(|(form, submitted_at, sentiment, words)| {
            let comment: Vec<&str> = words.into_iter().map(|index| WORDS[index]).collect();
            let mut record = FeedbackRecord::new("", FORMS[form]).with_response("comment", comment.join(" "));
            record.submitted_at = submitted_at;
            if let Some((label, score)) = sentiment {
                record = record.with_sentiment(label, score);
            }
            record
        })
}

fn records_strategy() -> impl Strategy<Value = Vec<FeedbackRecord>> {
    prop::collection::vec(record_strategy(submitted_at_strategy()), 0..60).prop_map(|records| {
        records
            .into_iter()
            .enumerate()
            .map(|(index, mut record)| {
                record.id = format!("r{index}");
                record
            })
            .collect()
    })
}

fn timed_records_strategy() -> impl Strategy<Value = Vec<FeedbackRecord>> {
    prop::collection::vec(record_strategy(timestamp_strategy().prop_map(Some)), 1..60)
}

fn granularity_strategy() -> impl Strategy<Value = Granularity> {
    prop_oneof![
        Just(Granularity::Day),
        Just(Granularity::Week),
        Just(Granularity::Month),
    ]
}

fn timezone_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("UTC"),
        Just("Asia/Tokyo"),
        Just("America/Los_Angeles"),
        Just("Asia/Kolkata"),
    ]
}

proptest! {
    #[test]
    fn distribution_never_exceeds_total(
        records in records_strategy(),
        granularity in granularity_strategy(),
    ) {
        let options = AnalyticsOptions::default().with_granularity(granularity);
        let result = AnalyticsEngine::default().compute(&records, &options).unwrap();

        let distributed = result.sentiment_distribution.total();
        prop_assert!(distributed <= result.overview.total_feedback);
        prop_assert_eq!(distributed, result.overview.scored_feedback);
        let all_scored = records.iter().all(FeedbackRecord::is_scored);
        prop_assert_eq!(distributed == result.overview.total_feedback, all_scored);
        prop_assert!((0.0..=1.0).contains(&result.overview.average_sentiment_score));
    }

    #[test]
    fn trend_series_stay_aligned(
        records in records_strategy(),
        granularity in granularity_strategy(),
        zone in timezone_strategy(),
    ) {
        let options = AnalyticsOptions::default()
            .with_granularity(granularity)
            .with_timezone(zone);
        let result = AnalyticsEngine::default().compute(&records, &options).unwrap();

        let feedback = result.feedback_trends();
        let sentiment = result.sentiment_trends();
        prop_assert_eq!(feedback.len(), sentiment.len());
        prop_assert_eq!(feedback.len(), result.meta.bucket_count);
        for (count_point, score_point) in feedback.iter().zip(&sentiment) {
            prop_assert_eq!(&count_point.date, &score_point.date);
        }
        for pair in result.trends.windows(2) {
            prop_assert_eq!(pair[0].bucket.period_end, pair[1].bucket.period_start);
            prop_assert!(pair[0].bucket.period_start < pair[1].bucket.period_start);
        }
    }

    #[test]
    fn bucket_counts_cover_every_timed_record(
        records in records_strategy(),
        granularity in granularity_strategy(),
        zone in timezone_strategy(),
    ) {
        let options = AnalyticsOptions::default()
            .with_granularity(granularity)
            .with_timezone(zone);
        let result = AnalyticsEngine::default().compute(&records, &options).unwrap();

        let timed = records.iter().filter(|r| r.submitted_instant().is_some()).count() as u64;
        prop_assert_eq!(result.trends.iter().map(|p| p.count).sum::<u64>(), timed);
        prop_assert_eq!(result.heatmap.total_count(), timed);
        prop_assert_eq!(result.heatmap.cells().len(), 168);
    }

    #[test]
    fn window_limits_bucketed_records(
        records in records_strategy(),
        start_day in 0i64..100,
        span_days in 0i64..40,
    ) {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(start_day);
        let window = TimeWindow::new(start, start + Duration::days(span_days)).unwrap();
        let options = AnalyticsOptions::default().with_window(window);
        let result = AnalyticsEngine::default().compute(&records, &options).unwrap();

        let inside = records
            .iter()
            .filter_map(FeedbackRecord::submitted_instant)
            .filter(|instant| window.contains(*instant))
            .count() as u64;
        prop_assert_eq!(result.trends.iter().map(|p| p.count).sum::<u64>(), inside);
        prop_assert_eq!(result.trends.len() as i64, span_days + 1);
    }

    #[test]
    fn weighted_bucket_mean_matches_overall_mean(
        records in timed_records_strategy(),
        granularity in granularity_strategy(),
    ) {
        let options = AnalyticsOptions::default().with_granularity(granularity);
        let result = AnalyticsEngine::default().compute(&records, &options).unwrap();

        let scored: u64 = result.trends.iter().map(|p| p.scored_count).sum();
        prop_assert_eq!(scored, result.overview.scored_feedback);
        if scored > 0 {
            let weighted: f64 = result
                .trends
                .iter()
                .map(|p| p.average_score * p.scored_count as f64)
                .sum::<f64>()
                / scored as f64;
            prop_assert!((weighted - result.overview.average_sentiment_score).abs() < 1e-9);
        } else {
            prop_assert_eq!(result.overview.average_sentiment_score, 0.0);
        }
    }

    #[test]
    fn keywords_are_deterministic_and_ranked(
        records in records_strategy(),
        top_n in 0usize..10,
    ) {
        let extractor = KeywordExtractor::default();
        let first = extractor.extract(&records, top_n);
        let second = extractor.extract(&records, top_n);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.len() <= top_n);
        for pair in first.windows(2) {
            prop_assert!(pair[0].frequency >= pair[1].frequency);
        }
        prop_assert!(first.iter().all(|k| k.term != "the"));
    }

    #[test]
    fn parallel_matches_sequential(
        records in records_strategy(),
        granularity in granularity_strategy(),
        zone in timezone_strategy(),
    ) {
        let engine = AnalyticsEngine::default();
        let options = AnalyticsOptions::default()
            .with_granularity(granularity)
            .with_timezone(zone);
        let sequential = engine.compute_sequential(&records, &options).unwrap();
        let parallel = engine.compute_parallel(&records, &options).unwrap();
        prop_assert_eq!(sequential, parallel);
    }
}
