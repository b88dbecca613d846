use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::{AppError, AppResult};
use crate::models::analytics::{Granularity, TimeBucket, TimeWindow};
use crate::models::feedback::FeedbackRecord;
use crate::utils::time::local_date;

/// Upper bound on buckets in one plan (about 27 years of days).
pub const MAX_BUCKETS: usize = 10_000;

/// Contiguous buckets covering a window, plus the window used to filter records.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketPlan {
    pub buckets: Vec<TimeBucket>,
    pub window: Option<TimeWindow>,
}

impl BucketPlan {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TimeBucketer {
    granularity: Granularity,
    tz: Tz,
}

impl TimeBucketer {
    pub fn new(granularity: Granularity, tz: Tz) -> Self {
        Self { granularity, tz }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Without a window, bounds come from the earliest and latest valid
    /// `submittedAt`, rounded outward to bucket boundaries.
    pub fn plan<'a, I>(&self, records: I, window: Option<&TimeWindow>) -> AppResult<BucketPlan>
    where
        I: IntoIterator<Item = &'a FeedbackRecord>,
    {
        let bounds = match window {
            Some(window) => {
                window.validate()?;
                Some((window.start, window.end))
            }
            None => instant_bounds(records),
        };

        let buckets = match bounds {
            Some((start, end)) => build_buckets(
                local_date(start, self.tz),
                local_date(end, self.tz),
                self.granularity,
            )?,
            None => Vec::new(),
        };

        Ok(BucketPlan {
            buckets,
            window: window.copied(),
        })
    }

    pub fn assign(&self, plan: &BucketPlan, record: &FeedbackRecord) -> Option<usize> {
        record
            .submitted_instant()
            .and_then(|instant| self.assign_instant(plan, instant))
    }

    /// Index of the bucket whose `[period_start, period_end)` holds the
    /// instant's local date; `None` outside the window.
    pub fn assign_instant(&self, plan: &BucketPlan, instant: DateTime<Utc>) -> Option<usize> {
        if let Some(window) = plan.window {
            if !window.contains(instant) {
                return None;
            }
        }

        let date = local_date(instant, self.tz);
        let position = plan
            .buckets
            .partition_point(|bucket| bucket.period_start <= date);
        let index = position.checked_sub(1)?;
        plan.buckets[index].contains(date).then_some(index)
    }
}

fn instant_bounds<'a, I>(records: I) -> Option<(DateTime<Utc>, DateTime<Utc>)>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    records
        .into_iter()
        .filter_map(FeedbackRecord::submitted_instant)
        .fold(None, |bounds, instant| match bounds {
            None => Some((instant, instant)),
            Some((min, max)) => Some((min.min(instant), max.max(instant))),
        })
}

pub fn floor_to_bucket(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => {
            let offset = i64::from(date.weekday().num_days_from_monday());
            date.checked_sub_signed(Duration::days(offset))
                .unwrap_or(date)
        }
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

pub fn next_bucket_start(start: NaiveDate, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => start.succ_opt(),
        Granularity::Week => start.checked_add_signed(Duration::days(7)),
        Granularity::Month => start.checked_add_months(Months::new(1)),
    }
}

pub fn bucket_label(start: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => start.format("%Y-%m-%d").to_string(),
        Granularity::Week => start.format("%G-W%V").to_string(),
        Granularity::Month => start.format("%Y-%m").to_string(),
    }
}

/// Number of buckets from the one holding `first_day` to the one holding `last_day`.
pub fn bucket_count(first_day: NaiveDate, last_day: NaiveDate, granularity: Granularity) -> usize {
    let start = floor_to_bucket(first_day, granularity);
    if last_day < start {
        return 0;
    }
    let span = match granularity {
        Granularity::Day => (last_day - start).num_days(),
        Granularity::Week => (last_day - start).num_days() / 7,
        Granularity::Month => {
            let months = |date: NaiveDate| i64::from(date.year()) * 12 + i64::from(date.month0());
            months(last_day) - months(start)
        }
    };
    usize::try_from(span).map_or(usize::MAX, |span| span.saturating_add(1))
}

/// Gap-filled buckets from the one holding `first_day` to the one holding `last_day`.
/// Fails with a validation error above `MAX_BUCKETS`, before anything is allocated.
pub fn build_buckets(
    first_day: NaiveDate,
    last_day: NaiveDate,
    granularity: Granularity,
) -> AppResult<Vec<TimeBucket>> {
    let count = bucket_count(first_day, last_day, granularity);
    if count > MAX_BUCKETS {
        return Err(AppError::validation(format!(
            "{count} {} buckets requested, at most {MAX_BUCKETS} allowed; use a coarser granularity or a shorter window",
            granularity.as_str()
        )));
    }

    let mut buckets = Vec::with_capacity(count);
    let mut start = floor_to_bucket(first_day, granularity);

    while start <= last_day {
        let Some(end) = next_bucket_start(start, granularity) else {
            break;
        };
        buckets.push(TimeBucket {
            period_start: start,
            period_end: end,
            label: bucket_label(start, granularity),
        });
        start = end;
    }

    Ok(buckets)
}
