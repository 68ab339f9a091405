//! core::config::schema
//!
//! Configuration schema types.
//!
//! Located at (in order of precedence):
//! 1. `--config <path>`
//! 2. `$BUGSIFT_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/bugsift/config.toml`
//! 4. `~/.bugsift/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Config values are validated after parsing so that a bad URL or a zero
//! page size is reported at startup rather than as a confusing HTTP error.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::OutputFormat;
use crate::tracker::CustomFieldIds;

/// Upper bound on concurrent hydration requests.
pub const MAX_HYDRATION_CONCURRENCY: usize = 32;

/// Root of the configuration file.
///
/// # Example
///
/// ```toml
/// [tracker]
/// base_url = "https://acme.atlassian.net"
/// email = "me@acme.com"
/// default_project = "PROJ"
///
/// [analysis]
/// max_tokens = 16000
///
/// [output]
/// format = "markdown"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Issue tracker settings
    pub tracker: Option<TrackerConfig>,

    /// Completion model settings
    pub analysis: Option<AnalysisConfig>,

    /// Report output settings
    pub output: Option<OutputConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tracker) = &self.tracker {
            tracker.validate()?;
        }
        if let Some(analysis) = &self.analysis {
            analysis.validate()?;
        }
        Ok(())
    }
}

/// `[tracker]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Site root, e.g. `https://acme.atlassian.net`
    pub base_url: Option<String>,

    /// Account email
    pub email: Option<String>,

    /// Project used when no query is given
    pub default_project: Option<String>,

    /// Default upper bound on fetched records
    pub max_results: Option<usize>,

    /// Concurrent hydration requests
    pub hydration_concurrency: Option<usize>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Custom field identifiers for the tracker instance
    pub fields: Option<CustomFieldIds>,
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base_url {
            validate_url("tracker.base_url", url)?;
        }

        if self.max_results == Some(0) {
            return Err(ConfigError::InvalidValue(
                "tracker.max_results must be greater than zero".to_string(),
            ));
        }

        if let Some(n) = self.hydration_concurrency {
            if n == 0 || n > MAX_HYDRATION_CONCURRENCY {
                return Err(ConfigError::InvalidValue(format!(
                    "tracker.hydration_concurrency must be between 1 and {}",
                    MAX_HYDRATION_CONCURRENCY
                )));
            }
        }

        validate_timeout("tracker.timeout_secs", self.timeout_secs)?;

        if let Some(fields) = &self.fields {
            for (name, id) in [
                ("failure_type", &fields.failure_type),
                ("escape_bug", &fields.escape_bug),
                ("customer_impact", &fields.customer_impact),
                ("customer", &fields.customer),
                ("severity", &fields.severity),
            ] {
                if id.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "tracker.fields.{} cannot be empty",
                        name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// `[analysis]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Model identifier
    pub model: Option<String>,

    /// Output token bound
    pub max_tokens: Option<u32>,

    /// API base URL
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "analysis.model cannot be empty".to_string(),
                ));
            }
        }

        if self.max_tokens == Some(0) {
            return Err(ConfigError::InvalidValue(
                "analysis.max_tokens must be greater than zero".to_string(),
            ));
        }

        if let Some(url) = &self.base_url {
            validate_url("analysis.base_url", url)?;
        }

        validate_timeout("analysis.timeout_secs", self.timeout_secs)
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Default report format
    pub format: Option<OutputFormat>,
}

fn validate_url(name: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "{} must start with http:// or https://, got '{}'",
            name, url
        )))
    }
}

fn validate_timeout(name: &str, secs: Option<u64>) -> Result<(), ConfigError> {
    if secs == Some(0) {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be greater than zero",
            name
        )));
    }
    Ok(())
}
