//! Configuration loading utilities.
//!
//! Environment variable lookup and YAML/JSON file loading with the format
//! picked from the file extension.
//!
//! # Example
//!
//! ```rust,ignore
//! use utils::config::{get_env_or, load_config_file};
//!
//! let path = get_env_or("FASTKNOWLEDGE_CONFIG", "config/fastknowledge.yaml");
//! let config: AppConfig = load_config_file(&path)?;
//! config.validate()?;
//! ```

use crate::error::{Result, UtilsError};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Get an environment variable with a default value.
pub fn get_env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Load configuration from a YAML file.
pub fn load_yaml_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let content = std::fs::read_to_string(path.as_ref())?;
    serde_yaml::from_str(&content).map_err(|e| {
        UtilsError::ConfigError(format!(
            "Failed to parse YAML config from {:?}: {}",
            path.as_ref(),
            e
        ))
    })
}

/// Load configuration from a JSON file.
pub fn load_json_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let content = std::fs::read_to_string(path.as_ref())?;
    serde_json::from_str(&content).map_err(|e| {
        UtilsError::ConfigError(format!(
            "Failed to parse JSON config from {:?}: {}",
            path.as_ref(),
            e
        ))
    })
}

/// Load configuration from a file, choosing the format from its extension.
pub fn load_config_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| {
            UtilsError::ConfigError(format!("Unable to determine file extension for {:?}", path))
        })?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => load_yaml_config(path),
        "json" => load_json_config(path),
        _ => Err(UtilsError::ConfigError(format!(
            "Unsupported config file extension: {}",
            extension
        ))),
    }
}

/// Trait for validating configuration after it has been loaded.
pub trait ValidateConfig {
    /// Validate the configuration, returning an error if invalid.
    fn validate(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct SearchSection {
        server_url: String,
        top_k: u32,
        score_threshold: f64,
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_get_env_or_falls_back() {
        assert_eq!(get_env_or("FASTKNOWLEDGE_TEST_UNSET_VAR", "fallback"), "fallback");
    }

    #[test]
    fn test_load_yaml_config() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "search.yaml",
            "server_url: http://127.0.0.1:7862\ntop_k: 3\nscore_threshold: 1.0\n",
        );

        let section: SearchSection = load_config_file(&path).unwrap();
        assert_eq!(
            section,
            SearchSection {
                server_url: "http://127.0.0.1:7862".to_string(),
                top_k: 3,
                score_threshold: 1.0,
            }
        );
    }

    #[test]
    fn test_load_json_config() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "search.json",
            r#"{"server_url": "http://search:7862", "top_k": 5, "score_threshold": 0.5}"#,
        );

        let section: SearchSection = load_config_file(&path).unwrap();
        assert_eq!(section.top_k, 5);
        assert_eq!(section.server_url, "http://search:7862");
    }

    #[test]
    fn test_load_yml_extension_is_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "search.YML",
            "server_url: http://x\ntop_k: 1\nscore_threshold: 2.0\n",
        );

        let section: SearchSection = load_config_file(&path).unwrap();
        assert_eq!(section.score_threshold, 2.0);
    }

    #[test]
    fn test_load_malformed_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.yaml", "server_url: [unclosed\n");

        let result: Result<SearchSection> = load_config_file(&path);
        assert!(matches!(result, Err(UtilsError::ConfigError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result: Result<SearchSection> = load_config_file("/nonexistent/fastknowledge.yaml");
        assert!(matches!(result, Err(UtilsError::IoError(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "search.toml", "top_k = 3");

        let result: Result<SearchSection> = load_config_file(&path);
        assert!(matches!(result, Err(UtilsError::ConfigError(msg)) if msg.contains("toml")));
    }

    #[test]
    fn test_no_extension() {
        let result: Result<SearchSection> = load_config_file("config/fastknowledge");
        assert!(result.is_err());
    }
}
