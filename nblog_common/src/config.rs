//! Configuration loading traits and types.
//!
//! TOML configuration for the log tools. Every tool embeds [`SharedConfig`]
//! and loads through the blanket [`ConfigLoader`] implementation.
//!
//! # Usage
//!
//! ```rust,no_run
//! use nblog_common::config::{ConfigError, ConfigLoader, DumpConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = DumpConfig::load(Path::new("nblog_dump.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::SHM_DIR;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Deepest indentation accepted for dump output.
pub const MAX_DUMP_INDENT: usize = 32;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Common configuration fields shared across all tools.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "nblog-dump"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Dumper settings.
///
/// # TOML Example
///
/// ```toml
/// [dump]
/// shm_dir = "/dev/shm"
/// segments = ["mixer", "fast_mixer"]
/// indent = 2
/// interval_ms = 500
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpSection {
    /// Directory searched for named segments.
    #[serde(default = "default_shm_dir")]
    pub shm_dir: PathBuf,

    /// Segments to dump; empty means every segment found in `shm_dir`.
    #[serde(default)]
    pub segments: Vec<String>,

    /// Leading spaces on every dumped line.
    #[serde(default)]
    pub indent: usize,

    /// Watch interval; `None` dumps once and exits.
    #[serde(default)]
    pub interval_ms: Option<u64>,
}

fn default_shm_dir() -> PathBuf {
    PathBuf::from(SHM_DIR)
}

impl Default for DumpSection {
    fn default() -> Self {
        Self {
            shm_dir: default_shm_dir(),
            segments: Vec::new(),
            indent: 0,
            interval_ms: None,
        }
    }
}

/// Full configuration file of the dump tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Common fields.
    pub shared: SharedConfig,

    /// Dumper settings.
    #[serde(default)]
    pub dump: DumpSection,
}

impl DumpConfig {
    /// Configuration used when no file is given.
    pub fn with_service_name(service_name: &str) -> Self {
        Self {
            shared: SharedConfig {
                log_level: LogLevel::default(),
                service_name: service_name.to_string(),
            },
            dump: DumpSection::default(),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    /// - `indent` exceeds [`MAX_DUMP_INDENT`]
    /// - `interval_ms` is zero
    /// - a segment name is empty or contains a path separator
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.dump.indent > MAX_DUMP_INDENT {
            return Err(ConfigError::ValidationError(format!(
                "indent {} exceeds {}",
                self.dump.indent, MAX_DUMP_INDENT
            )));
        }
        if self.dump.interval_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "interval_ms must be positive".to_string(),
            ));
        }
        if let Some(bad) = self
            .dump
            .segments
            .iter()
            .find(|name| name.is_empty() || name.contains('/'))
        {
            return Err(ConfigError::ValidationError(format!(
                "invalid segment name '{bad}'"
            )));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for every `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (text, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: TestWrapper = toml::from_str(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, level);
            assert_eq!(level.as_directive(), text);
        }
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = DumpConfig::load(Path::new("/nonexistent/path/nblog_dump.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = DumpConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_dump_config_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
service_name = "nblog-dump"
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = DumpConfig::load(file.path()).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Info);
        assert_eq!(config.dump.shm_dir, PathBuf::from(SHM_DIR));
        assert!(config.dump.segments.is_empty());
        assert_eq!(config.dump.indent, 0);
        assert_eq!(config.dump.interval_ms, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dump_config_full() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
log_level = "debug"
service_name = "nblog-dump"

[dump]
shm_dir = "/tmp/logs"
segments = ["mixer", "fast_mixer"]
indent = 4
interval_ms = 250
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = DumpConfig::load(file.path()).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.dump.shm_dir, PathBuf::from("/tmp/logs"));
        assert_eq!(config.dump.segments, vec!["mixer", "fast_mixer"]);
        assert_eq!(config.dump.indent, 4);
        assert_eq!(config.dump.interval_ms, Some(250));
    }

    #[test]
    fn test_dump_config_validation() {
        let mut config = DumpConfig::with_service_name("nblog-dump");
        assert!(config.validate().is_ok());

        config.dump.indent = MAX_DUMP_INDENT + 1;
        assert!(config.validate().is_err());
        config.dump.indent = 2;

        config.dump.interval_ms = Some(0);
        assert!(config.validate().is_err());
        config.dump.interval_ms = Some(100);

        config.dump.segments = vec!["../escape/x".to_string()];
        assert!(config.validate().is_err());
    }
}
