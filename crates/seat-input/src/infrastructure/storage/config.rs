//! TOML-based configuration for the input seat layer.
//!
//! The file lives at `$XDG_CONFIG_HOME/seat-input/config.toml`, falling back
//! to `~/.config/seat-input/config.toml`.
//!
//! # Example (for beginners)
//!
//! ```toml
//! [seat]
//! default_name = "seat0"
//! warn_on_no_devices = true
//!
//! [logging]
//! level = "info"
//!
//! [[output_hints]]
//! device = "Wacom HID 5256 Finger"
//! output = "eDP-1"
//! ```
//!
//! Every field has a serde default, so an absent file, an empty file, or a
//! file from an older version all load.  Output hints pin a device (matched
//! by product name or kernel sysname) to a named output when the input
//! library itself does not report one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    #[serde(default)]
    pub seat: SeatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output_hints: Vec<OutputHint>,
}

/// Seat assignment and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatConfig {
    /// Seat used for devices the input library does not assign elsewhere.
    #[serde(default = "default_seat_name")]
    pub default_name: String,
    /// Log a warning when a session start or resume finds no input devices.
    #[serde(default = "default_true")]
    pub warn_on_no_devices: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset, e.g. `"info"` or
    /// `"seat_input=debug"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Pins a device to a named output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputHint {
    /// Device product name or kernel sysname (e.g. `"event7"`).
    pub device: String,
    /// Output connector name (e.g. `"eDP-1"`).
    pub output: String,
}

impl OutputHint {
    pub fn matches(&self, name: &str, sysname: &str) -> bool {
        self.device == name || self.device == sysname
    }

    /// The output named by the first hint in `hints` that matches the device.
    pub fn lookup<'a>(hints: &'a [OutputHint], name: &str, sysname: &str) -> Option<&'a str> {
        hints
            .iter()
            .find(|hint| hint.matches(name, sysname))
            .map(|hint| hint.output.as_str())
    }
}

impl InputConfig {
    /// The configured output for a device, if any hint matches it.
    pub fn output_hint_for(&self, name: &str, sysname: &str) -> Option<&str> {
        OutputHint::lookup(&self.output_hints, name, sysname)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_seat_name() -> String {
    "seat0".to_string()
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SeatConfig {
    fn default() -> Self {
        Self {
            default_name: default_seat_name(),
            warn_on_no_devices: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the directory holding the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither
/// `XDG_CONFIG_HOME` nor `HOME` is set.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from the default location.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<InputConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads the config from `path`, returning the defaults if the file does not
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<InputConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(InputConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &InputConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("seat-input"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
