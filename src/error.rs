use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidWindow,
    InvalidTimezone,
    Validation,
    Cancelled,
    Serialization,
    Io,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidWindow => "INVALID_WINDOW",
            ErrorCode::InvalidTimezone => "INVALID_TIMEZONE",
            ErrorCode::Validation => "VALIDATION_FAILED",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::Serialization => "SERIALIZATION_ERROR",
            ErrorCode::Io => "IO_ERROR",
            ErrorCode::Unknown => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid time window: start {start} is after end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("unrecognized time zone: {0}")]
    InvalidTimezone(String),

    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("aggregation cancelled")]
    Cancelled,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn invalid_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        warn!(
            target: "app::analytics",
            start = %start.to_rfc3339(),
            end = %end.to_rfc3339(),
            "rejected time window"
        );
        AppError::InvalidWindow { start, end }
    }

    pub fn invalid_timezone(zone: impl Into<String>) -> Self {
        let zone = zone.into();
        warn!(target: "app::analytics", %zone, "rejected time zone");
        AppError::InvalidTimezone(zone)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation { message }
    }

    pub fn cancelled() -> Self {
        warn!(target: "app::analytics", "aggregation cancelled by caller");
        AppError::Cancelled
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidWindow { .. } => ErrorCode::InvalidWindow,
            AppError::InvalidTimezone(_) => ErrorCode::InvalidTimezone,
            AppError::Validation { .. } => ErrorCode::Validation,
            AppError::Cancelled => ErrorCode::Cancelled,
            AppError::Serialization(_) | AppError::Yaml(_) => ErrorCode::Serialization,
            AppError::Io(_) => ErrorCode::Io,
            AppError::Other(_) => ErrorCode::Unknown,
        }
    }

    /// Caller errors are rejected before any work starts and are never retried.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidWindow { .. } | AppError::InvalidTimezone(_) | AppError::Validation { .. }
        )
    }
}
