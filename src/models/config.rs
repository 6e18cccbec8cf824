//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend endpoint and HTTP behavior
    #[serde(default)]
    pub backend: BackendConfig,

    /// Job feed behavior
    #[serde(default)]
    pub feed: FeedConfig,

    /// Client-side upload limits
    #[serde(default)]
    pub uploads: UploadConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override backend credentials from `JOBFEED_URL` / `JOBFEED_ANON_KEY`.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("JOBFEED_URL") {
            self.backend.url = url;
        }
        if let Ok(key) = std::env::var("JOBFEED_ANON_KEY") {
            self.backend.anon_key = key;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.backend.user_agent.trim().is_empty() {
            return Err(AppError::config("backend.user_agent is empty"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(AppError::config("backend.timeout_secs must be > 0"));
        }
        if !self.backend.url.is_empty() {
            url::Url::parse(&self.backend.url)
                .map_err(|e| AppError::config(format!("backend.url is invalid: {e}")))?;
        }
        if self.feed.page_size == 0 {
            return Err(AppError::config("feed.page_size must be > 0"));
        }
        if self.feed.read_attempts == 0 {
            return Err(AppError::config("feed.read_attempts must be > 0"));
        }
        if self.uploads.max_photo_bytes == 0 || self.uploads.max_cv_bytes == 0 {
            return Err(AppError::config("uploads limits must be > 0"));
        }
        Ok(())
    }
}

/// Remote backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: String,

    /// Public (anonymous) API key sent with every request
    #[serde(default)]
    pub anon_key: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Job feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Rows per page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Quiet period before search text becomes effective
    #[serde(default = "defaults::debounce_ms")]
    pub debounce_ms: u64,

    /// Attempts per page read (mutations are never retried)
    #[serde(default = "defaults::read_attempts")]
    pub read_attempts: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            debounce_ms: defaults::debounce_ms(),
            read_attempts: defaults::read_attempts(),
        }
    }
}

/// Upload allow-lists and size limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "defaults::max_photo_bytes")]
    pub max_photo_bytes: usize,

    #[serde(default = "defaults::max_cv_bytes")]
    pub max_cv_bytes: usize,

    #[serde(default = "defaults::photo_bucket")]
    pub photo_bucket: String,

    #[serde(default = "defaults::cv_bucket")]
    pub cv_bucket: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_photo_bytes: defaults::max_photo_bytes(),
            max_cv_bytes: defaults::max_cv_bytes(),
            photo_bucket: defaults::photo_bucket(),
            cv_bucket: defaults::cv_bucket(),
        }
    }
}

mod defaults {
    // Backend defaults
    pub fn user_agent() -> String {
        concat!("jobfeed/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Feed defaults
    pub fn page_size() -> usize {
        10
    }
    pub fn debounce_ms() -> u64 {
        500
    }
    pub fn read_attempts() -> u32 {
        2
    }

    // Upload defaults
    pub fn max_photo_bytes() -> usize {
        500 * 1024
    }
    pub fn max_cv_bytes() -> usize {
        2 * 1024 * 1024
    }
    pub fn photo_bucket() -> String {
        "profile-photos".into()
    }
    pub fn cv_bucket() -> String {
        "cvs".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.feed.page_size = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = Config::default();
        config.backend.url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [backend]
            url = "https://example.supabase.co"

            [feed]
            page_size = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.feed.page_size, 25);
        assert_eq!(config.feed.debounce_ms, 500);
        assert_eq!(config.feed.read_attempts, 2);
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.uploads.max_photo_bytes, 500 * 1024);
    }
}
