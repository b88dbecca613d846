use chrono_tz::Tz;

use crate::error::AppResult;
use crate::models::analytics::{Granularity, TimeWindow, TrendPoint};
use crate::models::feedback::FeedbackRecord;
use crate::services::aggregator::SentimentStats;
use crate::services::time_bucketer::{BucketPlan, TimeBucketer};

/// Builds the trend series in one pass over one bucket plan, so the
/// count and sentiment views can never disagree on length or order.
pub fn build_trends<'a, I>(
    records: I,
    window: Option<&TimeWindow>,
    granularity: Granularity,
    tz: Tz,
) -> AppResult<Vec<TrendPoint>>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
    I::IntoIter: Clone,
{
    let records = records.into_iter();
    let bucketer = TimeBucketer::new(granularity, tz);
    let plan = bucketer.plan(records.clone(), window)?;
    Ok(fold_into_plan(&bucketer, &plan, records))
}

pub fn fold_into_plan<'a, I>(bucketer: &TimeBucketer, plan: &BucketPlan, records: I) -> Vec<TrendPoint>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let mut stats = vec![SentimentStats::default(); plan.len()];
    for record in records {
        if let Some(index) = bucketer.assign(plan, record) {
            stats[index].observe(record);
        }
    }

    plan.buckets
        .iter()
        .zip(stats)
        .map(|(bucket, stats)| TrendPoint {
            bucket: bucket.clone(),
            count: stats.total,
            scored_count: stats.scored,
            average_score: stats.average_score(),
        })
        .collect()
}
