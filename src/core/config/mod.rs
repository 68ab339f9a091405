//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment credentials (see [`crate::core::credentials`])
//! 4. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order; the first that exists wins:
//! 1. An explicit path (`--config`), which must exist
//! 2. `$BUGSIFT_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/bugsift/config.toml`
//! 4. `~/.bugsift/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use bugsift::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Project: {:?}", config.default_project());
//! println!("Model: {}", config.model());
//! println!("Max results: {}", config.max_results());
//! ```

mod keys;
pub mod schema;

pub use keys::KEYS;
pub use schema::{AnalysisConfig, FileConfig, OutputConfig, TrackerConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::analysis::anthropic;
use crate::core::types::OutputFormat;
use crate::tracker::{jira, retrieval, CustomFieldIds};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "BUGSIFT_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: FileConfig,
    /// Path the file was loaded from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation, or if `explicit` does not exist. Missing default
    /// files are not an error (defaults are used).
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()))
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::find(),
        };

        let file = match &path {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                Self::read(path)?
            }
            None => FileConfig::default(),
        };
        file.validate()?;

        Ok(Config { file, path })
    }

    /// Wrap already-parsed contents, as if loaded from nowhere.
    pub fn from_file(file: FileConfig) -> Config {
        Config { file, path: None }
    }

    /// First existing config file in the default search order.
    fn find() -> Option<PathBuf> {
        // 1. Check $BUGSIFT_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/bugsift/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("bugsift/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.bugsift/config.toml
        dirs::home_dir()
            .map(|home| home.join(".bugsift/config.toml"))
            .filter(|path| path.exists())
    }

    /// Read and parse a config file.
    fn read(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical config path, `~/.bugsift/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".bugsift/config.toml"))
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed. Uses atomic write
    /// (write to temp file, then rename) to prevent corruption.
    pub fn write(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    fn tracker(&self) -> Option<&TrackerConfig> {
        self.file.tracker.as_ref()
    }

    fn analysis(&self) -> Option<&AnalysisConfig> {
        self.file.analysis.as_ref()
    }

    /// Tracker site URL, if configured.
    pub fn tracker_url(&self) -> Option<&str> {
        self.tracker().and_then(|t| t.base_url.as_deref())
    }

    /// Tracker account email, if configured.
    pub fn tracker_email(&self) -> Option<&str> {
        self.tracker().and_then(|t| t.email.as_deref())
    }

    /// Project used when no query is given.
    pub fn default_project(&self) -> Option<&str> {
        self.tracker().and_then(|t| t.default_project.as_deref())
    }

    /// Upper bound on fetched records.
    ///
    /// Defaults to one search page.
    pub fn max_results(&self) -> usize {
        self.tracker()
            .and_then(|t| t.max_results)
            .unwrap_or(retrieval::PAGE_SIZE)
    }

    /// Concurrent hydration requests.
    pub fn hydration_concurrency(&self) -> usize {
        self.tracker()
            .and_then(|t| t.hydration_concurrency)
            .unwrap_or(retrieval::DEFAULT_HYDRATION_CONCURRENCY)
    }

    /// Tracker request timeout.
    pub fn tracker_timeout(&self) -> Duration {
        self.tracker()
            .and_then(|t| t.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(jira::DEFAULT_TIMEOUT)
    }

    /// Custom field identifiers.
    pub fn custom_fields(&self) -> CustomFieldIds {
        self.tracker()
            .and_then(|t| t.fields.clone())
            .unwrap_or_default()
    }

    /// Model identifier.
    pub fn model(&self) -> &str {
        self.analysis()
            .and_then(|a| a.model.as_deref())
            .unwrap_or(anthropic::DEFAULT_MODEL)
    }

    /// Output token bound.
    pub fn max_tokens(&self) -> u32 {
        self.analysis()
            .and_then(|a| a.max_tokens)
            .unwrap_or(anthropic::DEFAULT_MAX_TOKENS)
    }

    /// Model API base URL.
    pub fn analysis_url(&self) -> &str {
        self.analysis()
            .and_then(|a| a.base_url.as_deref())
            .unwrap_or(anthropic::DEFAULT_BASE_URL)
    }

    /// Model request timeout.
    pub fn analysis_timeout(&self) -> Duration {
        self.analysis()
            .and_then(|a| a.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(anthropic::DEFAULT_TIMEOUT)
    }

    /// Default report format.
    pub fn output_format(&self) -> OutputFormat {
        self.file
            .output
            .as_ref()
            .and_then(|o| o.format)
            .unwrap_or_default()
    }
}
