use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ImageOptions;
use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.pollinations.ai/prompt";
pub const DEFAULT_IMAGE_DELAY_MS: u64 = 1500;
/// Used for image probes when `request_timeout_secs` is unset.
pub const DEFAULT_IMAGE_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variables checked for the Gemini key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub image_base_url: String,
    pub image_width: u32,
    pub image_height: u32,
    pub suppress_watermark: bool,
    pub image_delay_ms: u64,
    pub verify_images: bool,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            image_width: 512,
            image_height: 512,
            suppress_watermark: true,
            image_delay_ms: DEFAULT_IMAGE_DELAY_MS,
            verify_images: false,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load from the user config directory, falling back to defaults when the
    /// file is missing.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Like [`Config::load`], but never fails: problems are logged and the
    /// defaults are used instead.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            tracing::warn!("Failed to load config, using defaults: {err}");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// The API key from the environment first, then the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.find_api_key(lookup).map(|(key, _)| key)
    }

    /// Returns where the API key came from: "env", "config", or None
    pub fn key_source(&self) -> Option<&'static str> {
        self.key_source_with(|name| std::env::var(name).ok())
    }

    pub fn key_source_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<&'static str> {
        self.find_api_key(lookup).map(|(_, source)| source)
    }

    // Blank values count as unset so they never shadow a later source.
    fn find_api_key(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<(String, &'static str)> {
        let non_blank = |key: &String| !key.trim().is_empty();

        API_KEY_ENV_VARS
            .iter()
            .find_map(|&name| lookup(name).filter(non_blank))
            .map(|key| (key, "env"))
            .or_else(|| {
                self.gemini_api_key
                    .clone()
                    .filter(non_blank)
                    .map(|key| (key, "config"))
            })
    }

    pub fn image_options(&self) -> ImageOptions {
        ImageOptions {
            width: self.image_width,
            height: self.image_height,
            suppress_watermark: self.suppress_watermark,
        }
    }

    pub fn image_delay(&self) -> Duration {
        Duration::from_millis(self.image_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("ai-nexus"))
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.image_width, 512);
        assert_eq!(config.image_delay_ms, 1500);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            model: "gemini-1.5-pro".to_string(),
            verify_images: true,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "model": "gemini-pro" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.image_base_url, DEFAULT_IMAGE_BASE_URL);
        assert!(config.suppress_watermark);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_key_wins_over_config() {
        let config = Config {
            gemini_api_key: Some("from-config".to_string()),
            ..Config::default()
        };

        let key = config.resolve_api_key_with(|name| {
            (name == "GOOGLE_API_KEY").then(|| "from-env".to_string())
        });
        assert_eq!(key.as_deref(), Some("from-env"));

        let key = config.resolve_api_key_with(|_| None);
        assert_eq!(key.as_deref(), Some("from-config"));
    }

    #[test]
    fn test_blank_key_is_treated_as_missing() {
        let config = Config {
            gemini_api_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.resolve_api_key_with(|_| None), None);
        assert_eq!(config.key_source_with(|_| None), None);
    }

    #[test]
    fn test_empty_env_var_falls_through_to_next_source() {
        let config = Config {
            gemini_api_key: Some("from-config".to_string()),
            ..Config::default()
        };

        let lookup = |name: &str| match name {
            "GEMINI_API_KEY" => Some(String::new()),
            "GOOGLE_API_KEY" => Some("from-google".to_string()),
            _ => None,
        };
        assert_eq!(config.resolve_api_key_with(lookup).as_deref(), Some("from-google"));
        assert_eq!(config.key_source_with(lookup), Some("env"));

        let blank_env = |_: &str| Some("  ".to_string());
        assert_eq!(config.resolve_api_key_with(blank_env).as_deref(), Some("from-config"));
        assert_eq!(config.key_source_with(blank_env), Some("config"));
    }
}
