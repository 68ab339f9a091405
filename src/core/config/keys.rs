//! core::config::keys
//!
//! Dotted-key access to configuration values (`tracker.max_results`,
//! `output.format`, ...), used by `bugsift config`.
//!
//! Reads return the effective value with defaults applied. Writes go to
//! the file contents and are validated before they take effect; an empty
//! value removes the key so its default applies again.

use std::str::FromStr;

use clap::ValueEnum;

use super::{AnalysisConfig, Config, ConfigError, FileConfig, TrackerConfig};
use crate::core::types::OutputFormat;

/// Every settable key, in display order.
pub const KEYS: &[&str] = &[
    "tracker.base_url",
    "tracker.email",
    "tracker.default_project",
    "tracker.max_results",
    "tracker.hydration_concurrency",
    "tracker.timeout_secs",
    "tracker.fields.failure_type",
    "tracker.fields.escape_bug",
    "tracker.fields.customer_impact",
    "tracker.fields.customer",
    "tracker.fields.severity",
    "analysis.model",
    "analysis.max_tokens",
    "analysis.base_url",
    "analysis.timeout_secs",
    "output.format",
];

impl Config {
    /// Effective value of `key`, or `None` when unset without a default.
    ///
    /// # Example
    ///
    /// ```
    /// use bugsift::core::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.get("tracker.max_results").unwrap().as_deref(), Some("50"));
    /// assert_eq!(config.get("tracker.email").unwrap(), None);
    /// assert!(config.get("tracker.nope").is_err());
    /// ```
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let owned = |s: Option<&str>| s.map(str::to_string);
        let fields = self.custom_fields();

        let value = match key {
            "tracker.base_url" => owned(self.tracker_url()),
            "tracker.email" => owned(self.tracker_email()),
            "tracker.default_project" => owned(self.default_project()),
            "tracker.max_results" => Some(self.max_results().to_string()),
            "tracker.hydration_concurrency" => Some(self.hydration_concurrency().to_string()),
            "tracker.timeout_secs" => Some(self.tracker_timeout().as_secs().to_string()),
            "tracker.fields.failure_type" => Some(fields.failure_type),
            "tracker.fields.escape_bug" => Some(fields.escape_bug),
            "tracker.fields.customer_impact" => Some(fields.customer_impact),
            "tracker.fields.customer" => Some(fields.customer),
            "tracker.fields.severity" => Some(fields.severity),
            "analysis.model" => Some(self.model().to_string()),
            "analysis.max_tokens" => Some(self.max_tokens().to_string()),
            "analysis.base_url" => Some(self.analysis_url().to_string()),
            "analysis.timeout_secs" => Some(self.analysis_timeout().as_secs().to_string()),
            "output.format" => Some(self.output_format().to_string()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }
}

impl FileConfig {
    /// Set `key` from its text form.
    ///
    /// The change is validated as a whole; on error `self` is unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut next = self.clone();
        let value = value.trim();
        let text = (!value.is_empty()).then(|| value.to_string());

        match key {
            "tracker.base_url" => tracker(&mut next).base_url = text,
            "tracker.email" => tracker(&mut next).email = text,
            "tracker.default_project" => tracker(&mut next).default_project = text,
            "tracker.max_results" => tracker(&mut next).max_results = number(key, value)?,
            "tracker.hydration_concurrency" => {
                tracker(&mut next).hydration_concurrency = number(key, value)?
            }
            "tracker.timeout_secs" => tracker(&mut next).timeout_secs = number(key, value)?,
            "analysis.model" => analysis(&mut next).model = text,
            "analysis.max_tokens" => analysis(&mut next).max_tokens = number(key, value)?,
            "analysis.base_url" => analysis(&mut next).base_url = text,
            "analysis.timeout_secs" => analysis(&mut next).timeout_secs = number(key, value)?,
            "output.format" => {
                next.output.get_or_insert_with(Default::default).format = parse_format(value)?
            }
            _ => {
                let name = key
                    .strip_prefix("tracker.fields.")
                    .ok_or_else(|| unknown_key(key))?;
                let fields = tracker(&mut next)
                    .fields
                    .get_or_insert_with(Default::default);
                let slot = match name {
                    "failure_type" => &mut fields.failure_type,
                    "escape_bug" => &mut fields.escape_bug,
                    "customer_impact" => &mut fields.customer_impact,
                    "customer" => &mut fields.customer,
                    "severity" => &mut fields.severity,
                    _ => return Err(unknown_key(key)),
                };
                *slot = value.to_string();
            }
        }

        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn tracker(file: &mut FileConfig) -> &mut TrackerConfig {
    file.tracker.get_or_insert_with(Default::default)
}

fn analysis(file: &mut FileConfig) -> &mut AnalysisConfig {
    file.analysis.get_or_insert_with(Default::default)
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::InvalidValue(format!(
        "unknown configuration key '{}' (known keys: {})",
        key,
        KEYS.join(", ")
    ))
}

/// Parse a number; empty means unset.
fn number<T: FromStr>(key: &str, value: &str) -> Result<Option<T>, ConfigError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue(format!("{} expects a number, got '{}'", key, value)))
}

fn parse_format(value: &str) -> Result<Option<OutputFormat>, ConfigError> {
    if value.is_empty() {
        return Ok(None);
    }
    <OutputFormat as ValueEnum>::from_str(value, true)
        .map(Some)
        .map_err(|_| {
            ConfigError::InvalidValue(format!(
                "output.format must be one of terminal, markdown, html, json; got '{}'",
                value
            ))
        })
}
