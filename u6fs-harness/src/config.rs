//! Harness configuration.
//!
//! Defaults work out of the box; everything can be overridden through the
//! builder, a TOML snippet, or `U6FS_HARNESS_*` environment variables.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Settle pause after launching a background mount, before foreground
/// commands may touch the mount point. A heuristic, not a guarantee: the
/// kernel surfaces the mount asynchronously and nothing here confirms it.
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_millis(100);

/// Default unmount tool, invoked as `fusermount -u <mountpoint>`.
pub const DEFAULT_UNMOUNT_TOOL: &str = "fusermount";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },
}

/// Configuration for one harness instance.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Path to the executable under test.
    pub executable: PathBuf,
    /// Unmount tool run against the mount point on `stop`.
    pub unmount_tool: PathBuf,
    /// Pause after a background mount launch.
    pub settle_interval: Duration,
    /// Environment variables set for every spawned process.
    pub env_vars: HashMap<String, String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("u6fs"),
            unmount_tool: PathBuf::from(DEFAULT_UNMOUNT_TOOL),
            settle_interval: DEFAULT_SETTLE_INTERVAL,
            env_vars: HashMap::new(),
        }
    }
}

/// On-disk shape of the config; every key optional.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    executable: Option<PathBuf>,
    unmount_tool: Option<PathBuf>,
    settle_interval_ms: Option<u64>,
    #[serde(default)]
    env: HashMap<String, String>,
}

impl HarnessConfig {
    /// Parse a TOML snippet, filling unspecified keys with defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(raw)?;
        let mut config = Self::default();
        if let Some(executable) = raw.executable {
            config.executable = executable;
        }
        if let Some(unmount_tool) = raw.unmount_tool {
            config.unmount_tool = unmount_tool;
        }
        if let Some(ms) = raw.settle_interval_ms {
            config.settle_interval = Duration::from_millis(ms);
        }
        config.env_vars.extend(raw.env);
        Ok(config)
    }

    /// Apply `U6FS_HARNESS_*` environment overrides on top of the current
    /// values: `EXECUTABLE`, `UNMOUNT_TOOL`, and `SETTLE_MS`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(executable) = std::env::var("U6FS_HARNESS_EXECUTABLE") {
            self.executable = PathBuf::from(executable);
        }
        if let Ok(tool) = std::env::var("U6FS_HARNESS_UNMOUNT_TOOL") {
            self.unmount_tool = PathBuf::from(tool);
        }
        if let Ok(value) = std::env::var("U6FS_HARNESS_SETTLE_MS") {
            let ms: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "U6FS_HARNESS_SETTLE_MS".to_string(),
                expected: "milliseconds as a non-negative integer".to_string(),
                value,
            })?;
            self.settle_interval = Duration::from_millis(ms);
        }
        Ok(())
    }
}
