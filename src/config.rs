//! Configuration support for SnapCheck.
//!
//! Settings are read once at startup: from a JSON file in the user's config
//! directory on native builds, or from a JSON string handed to the WASM
//! constructor by the host page. Nothing is ever written back; labeled
//! records only live for the session.

use serde::{Deserialize, Serialize};

use crate::format::LabelOrder;
use crate::input::LoadPolicy;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }

    /// Convert to log crate's Level, for loggers that take one.
    pub fn to_level(&self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Whether pasted links are loaded one at a time or as a batch
    #[serde(default)]
    pub load_policy: LoadPolicy,

    /// Order of labels in the export's second column
    #[serde(default)]
    pub label_order: LabelOrder,

    /// Middle part of the export filename, `snapcheck_<context>_<timestamp>.csv`
    #[serde(default = "default_export_context")]
    pub export_context: String,

    /// Folder exports are written to (native only, empty = Downloads folder)
    #[serde(default)]
    pub export_folder: String,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_export_context() -> String {
    "validacion".to_string()
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            load_policy: LoadPolicy::default(),
            label_order: LabelOrder::default(),
            export_context: default_export_context(),
            export_folder: String::new(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        if config.export_context.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "export_context must not be empty".to_string(),
            ));
        }
        if config.export_context.contains(['/', '\\']) || config.export_context.contains("..") {
            return Err(ConfigError::Invalid(format!(
                "export_context must not contain path separators or '..': {}",
                config.export_context
            )));
        }

        Ok(config)
    }

    /// Get the default config filename.
    pub fn default_filename() -> &'static str {
        "snapcheck-config.json"
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|dir| dir.join("snapcheck").join(Self::default_filename()))
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Folder exports are written to, falling back to the Downloads folder
    /// and then the working directory.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn resolved_export_folder(&self) -> std::path::PathBuf {
        if !self.export_folder.trim().is_empty() {
            return std::path::PathBuf::from(self.export_folder.trim());
        }
        dirs::download_dir().unwrap_or_else(|| std::path::PathBuf::from("."))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// A field holds a value the application can't use
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
