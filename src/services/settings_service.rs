use std::path::Path;

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::settings::EngineSettings;
use crate::utils::time::parse_timezone;

/// Loads and validates `EngineSettings` from YAML or JSON.
pub struct SettingsService;

impl SettingsService {
    pub fn load_from_path(path: &Path) -> AppResult<EngineSettings> {
        let raw = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let settings = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw)?,
            Some("json") => Self::from_json_str(&raw)?,
            other => {
                return Err(AppError::validation(format!(
                    "unsupported settings file extension: {}",
                    other.unwrap_or("<none>")
                )))
            }
        };

        info!(
            target: "app::settings",
            path = %path.display(),
            timezone = %settings.default_timezone,
            "engine settings loaded"
        );
        Ok(settings)
    }

    pub fn from_yaml_str(raw: &str) -> AppResult<EngineSettings> {
        let settings: EngineSettings = if raw.trim().is_empty() {
            EngineSettings::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        Self::validate(&settings)?;
        Ok(settings)
    }

    pub fn from_json_str(raw: &str) -> AppResult<EngineSettings> {
        let settings: EngineSettings = serde_json::from_str(raw)?;
        Self::validate(&settings)?;
        Ok(settings)
    }

    pub fn validate(settings: &EngineSettings) -> AppResult<()> {
        if settings.top_keywords == 0 {
            return Err(AppError::validation("topKeywords must be at least 1"));
        }
        if settings.min_keyword_length == 0 {
            return Err(AppError::validation("minKeywordLength must be at least 1"));
        }
        parse_timezone(&settings.default_timezone)?;
        debug!(target: "app::settings", "engine settings validated");
        Ok(())
    }
}
