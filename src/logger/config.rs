//! Runtime logger configuration, built from `[logger]` in the settings files.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::logger::error::{LoggerError, Result};

pub const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Leading bare level of an `EnvFilter` directive string:
/// `warn,launchpad_edge::sdk=debug` yields `warn`, `hyper=warn` yields `info`.
pub fn base_level(directives: &str) -> &str {
    directives
        .split(',')
        .map(str::trim)
        .find(|part| !part.is_empty() && !part.contains('='))
        .unwrap_or("info")
}

/// Main logger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub console: ConsoleConfig,
    pub file: FileConfig,
    /// Either a bare level or a full `EnvFilter` directive string
    pub level: String,
}

impl LoggerConfig {
    /// Create a new logger configuration with validation
    pub fn new(console: ConsoleConfig, file: FileConfig, level: String) -> Result<Self> {
        let config = Self {
            console,
            file,
            level,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.parse_level()?;
        self.file.validate()?;

        if !self.console.enabled && !self.file.enabled {
            return Err(LoggerError::config(
                "At least one output (console or file) must be enabled",
            ));
        }

        Ok(())
    }

    pub fn parse_level(&self) -> Result<Level> {
        let base = base_level(&self.level);
        if !VALID_LOG_LEVELS.contains(&base.to_ascii_lowercase().as_str()) {
            return Err(LoggerError::config(format!(
                "Invalid log level '{}'. Valid levels are: {}",
                self.level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        Level::from_str(base).map_err(|e| LoggerError::config(e.to_string()))
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Honored only when stdout is a terminal.
    pub colored: bool,
}

impl ConsoleConfig {
    pub fn new(enabled: bool, colored: bool) -> Self {
        Self { enabled, colored }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

/// Optional log file next to the console output; JSON by default so the
/// request and upstream fields survive for log shippers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub append: bool,
    pub format: LogFormat,
    pub rotation: RotationConfig,
}

impl FileConfig {
    pub fn new(
        enabled: bool,
        path: PathBuf,
        append: bool,
        format: LogFormat,
        rotation: RotationConfig,
    ) -> Result<Self> {
        let config = Self {
            enabled,
            path,
            append,
            format,
            rotation,
        };
        config.validate()?;
        Ok(config)
    }

    /// Pure validation; the writer creates missing directories on startup.
    pub fn validate(&self) -> Result<()> {
        if self.enabled {
            if self.path.as_os_str().is_empty() {
                return Err(LoggerError::config(
                    "File path cannot be empty when file output is enabled",
                ));
            }
            self.rotation.validate()?;
        }
        Ok(())
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("logs/launchpad-edge.log"),
            append: true,
            format: LogFormat::Json,
            rotation: RotationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| {
                LoggerError::config(format!(
                    "Invalid log format '{s}'. Valid formats are: {}",
                    Self::names().join(", ")
                ))
            })
    }
}

impl LogFormat {
    pub const ALL: [LogFormat; 3] = [LogFormat::Full, LogFormat::Compact, LogFormat::Json];

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(LogFormat::as_str).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Full => "full",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RotationConfig {
    /// Rotate once the active file reaches this many bytes
    pub max_size: u64,
    /// Rotated files kept next to the active one (`app.log.1` .. `app.log.N`)
    pub max_files: usize,
}

impl RotationConfig {
    pub fn new(max_size: u64, max_files: usize) -> Result<Self> {
        let config = Self {
            max_size,
            max_files,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(LoggerError::config(
                "Maximum file size must be greater than 0",
            ));
        }
        if self.max_files == 0 {
            return Err(LoggerError::config(
                "Maximum number of files must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size: 10 * 1024 * 1024,
            max_files: 5,
        }
    }
}
