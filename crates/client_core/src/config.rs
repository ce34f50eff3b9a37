use std::{fs, path::Path};

use serde::Deserialize;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const SETTINGS_FILE: &str = "estimator.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
        }
    }
}

/// Keys read from `estimator.toml`; anything else in the file is ignored.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    #[serde(default)]
    api_url: Option<String>,
}

/// Defaults, then `estimator.toml` in the working directory, then
/// `PREDICTION_API_URL`, then `APP__API_URL`.
pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.api_url.as_deref().and_then(normalize_base_url) {
                    settings.api_base_url = v;
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "ignoring unreadable settings file");
            }
        }
    }

    if let Some(v) = env("PREDICTION_API_URL").and_then(|v| normalize_base_url(&v)) {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_URL").and_then(|v| normalize_base_url(&v)) {
        settings.api_base_url = v;
    }

    settings
}

pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
