//! src/config.rs
//! ============================================================================
//! # Config: interaction core settings
//!
//! Loads and saves settings as TOML from the platform config directory using
//! the [`directories`](https://docs.rs/directories) crate. Durations are
//! written in humantime form (`"15m"`, `"5s"`).
//!
//! ## Example
//! ```rust,ignore
//! let config = Config::load().await?;
//! let store = CallbackStore::new(config.components.callback.clone());
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs as TokioFs;
use tracing::info;

use crate::{
    error::{CoreError, CoreResult},
    logging::LoggerConfig,
};

/// Ephemeral callback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    /// TTL applied when a builder does not set one
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,

    /// Maximum number of live callbacks
    pub max_size: u64,

    /// Log every expiry and size eviction at debug level
    pub log_expirations: bool,

    /// Disable the components of a message once its callback is gone
    pub disable_on_expire: bool,

    /// Upper bound for the single disable attempt
    #[serde(with = "humantime_serde")]
    pub disable_timeout: Duration,

    /// Ephemeral reply for an expired callback (empty = silent)
    pub expired_message: String,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(15 * 60),
            max_size: 10_000,
            log_expirations: false,
            disable_on_expire: true,
            disable_timeout: Duration::from_secs(5),
            expired_message: "This interaction has expired.".to_string(),
        }
    }
}

/// Durable handler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Ephemeral reply when no handler matches (empty = silent)
    pub unknown_message: String,

    /// Ephemeral reply when a handler or callback fails (empty = silent)
    pub error_message: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            unknown_message: "Unknown interaction.".to_string(),
            error_message: "An error occurred processing your request.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// When false the router ignores every interaction
    pub enabled: bool,

    pub callback: CallbackConfig,

    pub handler: HandlerConfig,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            callback: CallbackConfig::default(),
            handler: HandlerConfig::default(),
        }
    }
}

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub components: ComponentConfig,

    #[serde(default)]
    pub logging: LoggerConfig,
}

impl Config {
    /// Loads config from the platform config dir, writing defaults if absent.
    pub async fn load() -> CoreResult<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path).await
    }

    /// Loads config from `path`, writing defaults there if the file is missing.
    pub async fn load_from(path: &Path) -> CoreResult<Self> {
        if TokioFs::try_exists(path)
            .await
            .map_err(|e| CoreError::config_io(path, e))?
        {
            info!("Loading config from {}", path.display());
            let text = TokioFs::read_to_string(path)
                .await
                .map_err(|e| CoreError::config_io(path, e))?;

            Ok(toml::from_str(&text)?)
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save_to(path).await?;

            Ok(default_config)
        }
    }

    /// Saves config to the platform config dir.
    pub async fn save(&self) -> CoreResult<()> {
        let path = Self::config_path()?;
        self.save_to(&path).await
    }

    pub async fn save_to(&self, path: &Path) -> CoreResult<()> {
        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::config_io(parent, e))?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        TokioFs::write(path, toml_str)
            .await
            .map_err(|e| CoreError::config_io(path, e))?;

        Ok(())
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn config_path() -> CoreResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn config_dir() -> CoreResult<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("org", "example", "Interact").ok_or(CoreError::ConfigDir)?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ComponentConfig::default();

        assert!(config.enabled);
        assert_eq!(config.callback.default_ttl, Duration::from_secs(900));
        assert_eq!(config.callback.max_size, 10_000);
        assert!(!config.callback.log_expirations);
        assert!(config.callback.disable_on_expire);
        assert_eq!(config.callback.expired_message, "This interaction has expired.");
        assert_eq!(config.handler.unknown_message, "Unknown interaction.");
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let text = r#"
            [components.callback]
            default_ttl = "5m"
            expired_message = ""

            [components.handler]
            unknown_message = "No idea."
        "#;

        let config: Config = toml::from_str(text).unwrap();

        assert_eq!(config.components.callback.default_ttl, Duration::from_secs(300));
        assert!(config.components.callback.expired_message.is_empty());
        assert_eq!(config.components.callback.max_size, 10_000);
        assert_eq!(config.components.handler.unknown_message, "No idea.");
        assert_eq!(
            config.components.handler.error_message,
            "An error occurred processing your request."
        );
    }

    #[tokio::test]
    async fn load_from_creates_missing_file_and_reads_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_from(&path).await.unwrap();
        assert!(path.exists());

        let mut changed = created.clone();
        changed.components.callback.max_size = 42;
        changed.components.callback.disable_timeout = Duration::from_millis(1500);
        changed.save_to(&path).await.unwrap();

        let loaded = Config::load_from(&path).await.unwrap();
        assert_eq!(loaded.components.callback.max_size, 42);
        assert_eq!(
            loaded.components.callback.disable_timeout,
            Duration::from_millis(1500)
        );
    }

    #[tokio::test]
    async fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        TokioFs::write(&path, "components = 3").await.unwrap();

        assert!(matches!(
            Config::load_from(&path).await,
            Err(CoreError::Config(_))
        ));
    }
}
