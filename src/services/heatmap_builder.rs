use chrono::{Datelike, Timelike};
use chrono_tz::Tz;

use crate::models::analytics::{Heatmap, HeatmapCell, TimeWindow};
use crate::models::feedback::FeedbackRecord;
use crate::services::aggregator::SentimentStats;

/// Day-of-week (0 = Sunday) by hour-of-day grid in the given zone.
/// Cells without records report `count = 0` and `average_score = 0.0`.
pub fn build_heatmap<'a, I>(records: I, window: Option<&TimeWindow>, tz: Tz) -> Heatmap
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let mut grid = [[SentimentStats::default(); Heatmap::HOURS]; Heatmap::DAYS];

    for record in records {
        let Some(instant) = record.submitted_instant() else {
            continue;
        };
        if window.is_some_and(|window| !window.contains(instant)) {
            continue;
        }
        let local = instant.with_timezone(&tz);
        let day = local.weekday().num_days_from_sunday() as usize;
        let hour = local.hour() as usize;
        grid[day][hour].observe(record);
    }

    let cells = grid
        .iter()
        .enumerate()
        .flat_map(|(day, hours)| {
            hours.iter().enumerate().map(move |(hour, stats)| HeatmapCell {
                day_of_week: day as u8,
                hour_of_day: hour as u8,
                count: stats.total,
                average_score: stats.average_score(),
            })
        })
        .collect();

    Heatmap::from_cells(cells)
}
