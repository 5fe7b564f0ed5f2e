//! Configuration for back-office clients
//!
//! Settings live in a TOML file: where the backend API is, how long
//! informational notices stay up, and any entity schemas beyond the built-in
//! catalog.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{ConfigError, CoreError, Result};
use crate::schema::EntitySchema;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackofficeConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub notices: NoticeConfig,

    /// Extra or overriding entity schemas
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<EntitySchema>,
}

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL resources are appended to, e.g. `http://localhost:5000/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// How long informational popups stay on screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeConfig {
    #[serde(default = "default_dismiss_after_ms")]
    pub dismiss_after_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_dismiss_after_ms() -> u64 {
    1800
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: default_dismiss_after_ms(),
        }
    }
}

impl NoticeConfig {
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_after_ms)
    }
}

impl BackofficeConfig {
    /// The built-in catalog with this configuration's entities laid over it
    pub fn catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::builtin()?;
        for schema in &self.entities {
            catalog.insert(schema.clone());
        }
        Ok(catalog)
    }

    /// Load configuration from standard locations
    pub async fn load() -> Result<Self> {
        load_config_from_standard_locations().await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        load_config(path).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        save_config(self, path).await
    }
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<BackofficeConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "readable TOML file".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    toml::from_str(&content).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "content".to_string(),
        expected: "valid TOML configuration".to_string(),
        cause: ConfigError::TomlParse(e.to_string()),
    })
}

/// Save configuration to a TOML file
pub async fn save_config(config: &BackofficeConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::ConfigurationError {
                config_path: parent.display().to_string(),
                field: "directory".to_string(),
                expected: "writable directory".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "serialization".to_string(),
        expected: "serializable config structure".to_string(),
        cause: ConfigError::TomlSerialize(e.to_string()),
    })?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "writable file location".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })
}

/// Standard config file locations
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("backoffice.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("backoffice").join("config.toml"));
    }

    paths
}

/// Load the first config found in [`config_paths`], or the defaults
pub async fn load_config_from_standard_locations() -> Result<BackofficeConfig> {
    for path in config_paths() {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading configuration");
            return load_config(&path).await;
        }
    }

    Ok(BackofficeConfig::default())
}
