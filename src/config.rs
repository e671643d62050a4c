//! Runtime configuration, resolved once at startup from the environment
//! (and an optional `.env` file) and then passed around by value.

use crate::error::{AssistantError, Result};
use std::path::PathBuf;
use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// `None` disables AI explanations entirely.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let config = Self {
            data_dir: get("COFFEE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        if config.ai_available() {
            info!("OpenAI API key found, AI explanations available");
        } else {
            warn!("OpenAI API key not found, AI explanations disabled");
        }
        config
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(model) = model {
            self.model = model;
        }
        self
    }

    /// Reject settings that can only fail later.
    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(AssistantError::Config(format!(
                "OPENAI_BASE_URL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.model.trim().is_empty() {
            return Err(AssistantError::Config("Model name must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn ai_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// First 8 characters of the key, for display in status lines.
    pub fn masked_key(&self) -> Option<String> {
        self.api_key
            .as_ref()
            .map(|key| format!("{}...", key.chars().take(8).collect::<String>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(!config.ai_available());
        assert_eq!(config.masked_key(), None);
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "   ")]));
        assert!(!config.ai_available());
    }

    #[test]
    fn test_reads_all_variables() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test-1234567890"),
            ("OPENAI_BASE_URL", "http://localhost:9999/v1"),
            ("OPENAI_MODEL", "gpt-test"),
            ("COFFEE_DATA_DIR", "/srv/coffee"),
        ]));
        assert!(config.ai_available());
        assert_eq!(config.masked_key().as_deref(), Some("sk-test-..."));
        assert_eq!(config.base_url, "http://localhost:9999/v1");
        assert_eq!(config.model, "gpt-test");
        assert_eq!(config.data_dir, PathBuf::from("/srv/coffee"));
    }

    #[test]
    fn test_overrides_win_over_environment() {
        let config = AppConfig::from_lookup(lookup_from(&[("OPENAI_MODEL", "gpt-env")]))
            .with_overrides(
                Some(PathBuf::from("fixtures")),
                Some("sk-cli".to_string()),
                Some("gpt-cli".to_string()),
            );
        assert_eq!(config.data_dir, PathBuf::from("fixtures"));
        assert_eq!(config.api_key.as_deref(), Some("sk-cli"));
        assert_eq!(config.model, "gpt-cli");
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        assert!(AppConfig::default().validate().is_ok());

        let config = AppConfig::from_lookup(lookup_from(&[("OPENAI_BASE_URL", "api.openai.com/v1")]));
        match config.validate() {
            Err(AssistantError::Config(msg)) => assert!(msg.contains("OPENAI_BASE_URL")),
            other => panic!("expected a config error, got {:?}", other),
        }

        let config = AppConfig::default().with_overrides(None, None, Some("  ".to_string()));
        assert!(matches!(config.validate(), Err(AssistantError::Config(_))));
    }
}
