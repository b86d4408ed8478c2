//! Application Configuration
//!
//! Read from `pixelboard.toml`. Every section and key is optional; a missing
//! file yields the defaults.
//!
//! ```toml
//! [display]
//! width = 32
//! height = 8
//! slots = 8
//! default_duration_ms = 30000
//!
//! [storage]
//! dir = "./data"
//!
//! [server]
//! port = 8080
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use display_runtime::DisplaySettings;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub display: DisplayConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub plugins: PluginsConfig,
}

/// Display geometry and rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub slots: usize,
    /// Slot duration without override, 0 = infinite
    pub default_duration_ms: u64,
    /// Render tick period
    pub frame_period_ms: u64,
    pub max_render_failures: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 8,
            slots: 8,
            default_duration_ms: 30_000,
            frame_period_ms: 50,
            max_render_failures: 3,
        }
    }
}

impl DisplayConfig {
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_period_ms)
    }
}

/// Where the slot arrangement is kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Settings shared by the built-in plugins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Floor for each sub-item of composite plugins
    pub min_item_duration_ms: u64,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            min_item_duration_ms: 2_000,
        }
    }
}

impl PluginsConfig {
    pub fn min_item_duration(&self) -> Duration {
        Duration::from_millis(self.min_item_duration_ms)
    }
}

impl AppConfig {
    /// Load the configuration file, falling back to defaults if it does not exist
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml(&content)?;

        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let display = &self.display;
        if display.width == 0 || display.height == 0 {
            return Err(ConfigError::Invalid(
                "display width and height must be positive".to_string(),
            ));
        }
        if display.slots == 0 {
            return Err(ConfigError::Invalid("display needs at least one slot".to_string()));
        }
        if display.frame_period_ms == 0 {
            return Err(ConfigError::Invalid("frame_period_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Scheduler settings derived from the `[display]` section
    pub fn display_settings(&self) -> DisplaySettings {
        DisplaySettings::default()
            .with_size(self.display.width, self.display.height)
            .with_slots(self.display.slots)
            .with_default_duration(Duration::from_millis(self.display.default_duration_ms))
            .with_max_render_failures(self.display.max_render_failures)
    }
}
