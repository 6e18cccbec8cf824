// src/config.rs

//! Configuration loading utilities.

use std::path::Path;

use crate::error::Result;
use crate::models::Config;

/// Load configuration from a TOML file and apply environment overrides.
///
/// Falls back to defaults if the file is missing or unreadable. The result
/// is validated.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load_or_default(path)
    } else {
        log::info!("No config at {}, using defaults", path.display());
        Config::default()
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.feed.page_size, 10);
    }

    #[test]
    fn test_broken_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[feed\npage_size = ").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.feed.debounce_ms, 500);
    }

    #[test]
    fn test_file_values_are_used_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        fs::write(&path, "[feed]\npage_size = 20\nread_attempts = 3\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.feed.page_size, 20);
        assert_eq!(config.feed.read_attempts, 3);

        fs::write(&path, "[feed]\npage_size = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
