use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::analytics::{AnalyticsResult, HeatmapCell};

const REPORT_PREFIX: &str = "analytics-report";
const REPORT_KEYWORD_LIMIT: usize = 10;
const REPORT_HEATMAP_LIMIT: usize = 5;
const MAX_NAME_ATTEMPTS: usize = 100;
const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn file_extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportExport {
    pub file_path: String,
    pub format: ReportFormat,
    pub generated_at: String,
}

pub struct ReportService;

impl ReportService {
    pub fn render(result: &AnalyticsResult, format: ReportFormat) -> AppResult<String> {
        match format {
            ReportFormat::Markdown => Ok(render_markdown_report(result)),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        }
    }

    /// Writes `analytics-report-<UTC stamp>.<ext>` into `dir`, creating it if needed.
    /// An existing file is never overwritten: a `-<n>` suffix is added instead.
    pub fn export(result: &AnalyticsResult, format: ReportFormat, dir: &Path) -> AppResult<ReportExport> {
        std::fs::create_dir_all(dir)?;

        let content = Self::render(result, format)?;
        let now = Utc::now();
        let stem = format!("{REPORT_PREFIX}-{}", now.format("%Y%m%dT%H%M%S%.3fZ"));
        let (path, mut file) = create_unique(dir, &stem, format.file_extension())?;
        file.write_all(content.as_bytes())?;

        info!(
            target: "app::report",
            path = %path.display(),
            format = format.file_extension(),
            "analytics report exported"
        );

        Ok(ReportExport {
            file_path: path.to_string_lossy().to_string(),
            format,
            generated_at: now.to_rfc3339(),
        })
    }
}

fn create_unique(dir: &Path, stem: &str, extension: &str) -> AppResult<(PathBuf, File)> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let filename = if attempt == 0 {
            format!("{stem}.{extension}")
        } else {
            format!("{stem}-{attempt}.{extension}")
        };
        let path = dir.join(filename);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Err(AppError::other(format!(
        "no free report file name for {stem} after {MAX_NAME_ATTEMPTS} attempts"
    )))
}

fn render_markdown_report(result: &AnalyticsResult) -> String {
    let overview = &result.overview;
    let distribution = &result.sentiment_distribution;
    let pct = distribution.percentages();
    let mut content = String::new();

    content.push_str("# Feedback Analytics Report\n\n");
    content.push_str(&format!(
        "Granularity: {} · Time zone: {}\n\n",
        result.meta.granularity.as_str(),
        result.meta.timezone
    ));
    if let (Some(start), Some(end)) = (&result.meta.window_start, &result.meta.window_end) {
        content.push_str(&format!("Window: {start} to {end}\n\n"));
    }

    content.push_str("## Overview\n");
    content.push_str(&format!(
        "- Total feedback: {}\n- Scored feedback: {}\n- Average sentiment: {:.3}\n- Active forms: {}\n",
        overview.total_feedback,
        overview.scored_feedback,
        overview.average_sentiment_score,
        overview.active_forms
    ));
    if let Some(rate) = overview.response_rate {
        content.push_str(&format!("- Response rate: {rate:.1}%\n"));
    }
    content.push('\n');

    content.push_str("## Sentiment\n");
    content.push_str(&format!(
        "- Positive: {} ({:.1}%)\n- Neutral: {} ({:.1}%)\n- Negative: {} ({:.1}%)\n\n",
        distribution.positive,
        pct.positive,
        distribution.neutral,
        pct.neutral,
        distribution.negative,
        pct.negative
    ));

    content.push_str("## Trends\n");
    if result.trends.is_empty() {
        content.push_str("No timestamped feedback in range.\n");
    } else {
        content.push_str("| Period | Responses | Avg sentiment |\n|---|---|---|\n");
        for point in &result.trends {
            let average = if point.scored_count > 0 {
                format!("{:.3}", point.average_score)
            } else {
                "-".to_string()
            };
            content.push_str(&format!(
                "| {} | {} | {} |\n",
                point.bucket.label, point.count, average
            ));
        }
    }
    content.push('\n');

    content.push_str("## Top keywords\n");
    for keyword in result.keywords.iter().take(REPORT_KEYWORD_LIMIT) {
        content.push_str(&format!("- {} ({})\n", keyword.term, keyword.frequency));
    }
    content.push('\n');

    content.push_str("## Busiest hours\n");
    let mut busiest: Vec<&HeatmapCell> = result
        .heatmap
        .cells()
        .iter()
        .filter(|cell| cell.count > 0)
        .collect();
    busiest.sort_by(|a, b| b.count.cmp(&a.count));
    for cell in busiest.into_iter().take(REPORT_HEATMAP_LIMIT) {
        content.push_str(&format!(
            "- {} {:02}:00 · {} responses · avg {:.3}\n",
            WEEKDAY_NAMES[usize::from(cell.day_of_week) % WEEKDAY_NAMES.len()],
            cell.hour_of_day,
            cell.count,
            cell.average_score
        ));
    }

    content
}
