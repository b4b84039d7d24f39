//! Application settings and paths.
//!
//! Settings only supply defaults; command-line flags always win. The engine
//! never reads them directly.

use crate::error::{ConfigError, ConfigResult};
use crate::output::OutputFormat;
use crate::scanner::DEFAULT_CONCURRENCY;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/netsniff)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the per-user directories. Nothing is created on disk.
    pub fn new() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "netsniff", "netsniff").ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Default concurrency ceiling.
    pub default_concurrency: usize,
    /// Default per-probe timeout in milliseconds.
    pub default_timeout_ms: u64,
    /// Default log level (debug, info, warn, error).
    pub log_level: String,
    /// Default stdout report format.
    pub default_output_format: OutputFormat,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_concurrency: DEFAULT_CONCURRENCY,
            default_timeout_ms: 1000,
            log_level: "info".to_string(),
            default_output_format: OutputFormat::Plain,
        }
    }
}

impl AppSettings {
    /// Load settings from `path`, or from the per-user settings file when
    /// no path is given.
    ///
    /// An explicit path must exist. A missing per-user file yields defaults.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let file = match Paths::new() {
                    Ok(paths) => paths.settings_file(),
                    Err(_) => return Ok(Self::default()),
                };
                if file.is_file() {
                    Self::load_from(&file)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.default_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "default_concurrency must be at least 1".to_string(),
            ));
        }
        if !matches!(self.log_level.as_str(), "debug" | "info" | "warn" | "error") {
            return Err(ConfigError::InvalidValue(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }
}
