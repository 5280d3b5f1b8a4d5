//! Configuration loading and management for rescore.
//!
//! Loads settings from `rescore.toml` with environment variable overrides for
//! the backend address and EmailJS credentials.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("scoring backend address is not configured (set api.base_url or RESCORE_API_BASE)")]
    MissingApiBase,
}

/// Scoring backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// Base URL of the scoring backend, e.g. "https://rescore.example.com"
    #[serde(default)]
    pub base_url: Option<String>,
}

/// EmailJS credentials (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmailConfig {
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
}

/// Storage paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base path for the local analysis history
    pub path: PathBuf,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the default location (rescore.toml in cwd or home)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::find_config_file();
        let mut config = if config_path.exists() {
            Self::parse_file(&config_path)?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override backend address and EmailJS credentials from environment variables
    fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var("RESCORE_API_BASE") {
            self.api.base_url = Some(base);
        }
        if let Ok(id) = std::env::var("EMAILJS_SERVICE_ID") {
            self.email.service_id = Some(id);
        }
        if let Ok(id) = std::env::var("EMAILJS_TEMPLATE_ID") {
            self.email.template_id = Some(id);
        }
        if let Ok(key) = std::env::var("EMAILJS_PUBLIC_KEY") {
            self.email.public_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> PathBuf {
        // Check current directory first
        let local_config = PathBuf::from("rescore.toml");
        if local_config.exists() {
            return local_config;
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config").join("rescore").join("rescore.toml");
            if home_config.exists() {
                return home_config;
            }
        }

        local_config
    }

    /// Get the scoring backend base URL, trailing slash stripped.
    ///
    /// A missing address is the one hard precondition failure: no request is
    /// attempted without it.
    pub fn api_base(&self) -> Result<String, ConfigError> {
        self.api
            .base_url
            .as_deref()
            .map(|base| base.trim_end_matches('/').to_string())
            .ok_or(ConfigError::MissingApiBase)
    }

    /// Whether all three EmailJS credentials are present.
    ///
    /// Missing credentials disable the email step only, they are never an error.
    pub fn email_configured(&self) -> bool {
        self.email.service_id.is_some()
            && self.email.template_id.is_some()
            && self.email.public_key.is_some()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://api.example.com/"

[email]
service_id = "svc_1"
template_id = "tpl_1"
public_key = "pk_1"

[storage]
path = "/tmp/rescore-data"
"#
        )
        .unwrap();

        let config = Config::parse_file(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.api_base().unwrap(), "https://api.example.com");
        assert!(config.email_configured());
        assert_eq!(config.storage.path, PathBuf::from("/tmp/rescore-data"));
    }

    #[test]
    fn missing_api_base_is_an_error() {
        let config = Config::default();
        assert!(matches!(
            config.api_base(),
            Err(ConfigError::MissingApiBase)
        ));
    }

    #[test]
    fn partial_email_credentials_disable_email() {
        let config = Config {
            email: EmailConfig {
                service_id: Some("svc_1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(!config.email_configured());
    }
}
