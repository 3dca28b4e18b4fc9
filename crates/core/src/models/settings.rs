use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::locale::Locale;
use crate::errors::CoreError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_API_URL: &str = "FINCHAT_API_URL";
const ENV_TIMEOUT: &str = "FINCHAT_TIMEOUT_SECS";
const ENV_LOCALE: &str = "FINCHAT_LOCALE";
const ENV_SESSION_STORE: &str = "FINCHAT_SESSION_STORE";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Base URL of the analysis service, without trailing slash.
    pub api_base_url: String,

    /// Upper bound for every request. An expired request counts as a failure.
    pub request_timeout_secs: u64,

    pub locale: Locale,

    /// Where chat sessions are persisted. `None` means the platform data dir.
    pub session_store_path: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            locale: Locale::default(),
            session_store_path: None,
        }
    }
}

impl ClientSettings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults overlaid with `FINCHAT_*` environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (environment, CLI flags, ...).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            self.request_timeout_secs = raw.trim().parse().map_err(|_| {
                CoreError::ValidationError(format!("{ENV_TIMEOUT} must be a whole number of seconds, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup(ENV_LOCALE) {
            self.locale = raw.parse()?;
        }
        if let Some(path) = lookup(ENV_SESSION_STORE) {
            self.session_store_path = Some(PathBuf::from(path));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::ValidationError(format!(
                "API base URL '{}' must start with http:// or https://",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::ValidationError(
                "Request timeout must be at least 1 second".into(),
            ));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }

    /// Resolved location of the session store file (native only).
    #[cfg(not(target_arch = "wasm32"))]
    #[must_use]
    pub fn resolved_session_store_path(&self) -> PathBuf {
        if let Some(path) = &self.session_store_path {
            return path.clone();
        }
        match directories::ProjectDirs::from("", "", "finchat") {
            Some(dirs) => dirs.data_dir().join("sessions.json"),
            None => PathBuf::from("finchat-sessions.json"),
        }
    }
}
