//! core::types
//!
//! Normalized issue-tracker records.
//!
//! # Types
//!
//! - [`BugRecord`] - One tracker issue, flattened to plain values
//! - [`Comment`] - A single issue comment
//! - [`FailureType`] - Tracker-specific failure categorization
//! - [`AnalysisMode`] - Which analysis template to run
//! - [`OutputFormat`] - How a report is rendered
//!
//! Records are built once by the record mapper and never mutated after.
//! The analysis layer only clones them into report clusters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single normalized bug from the issue tracker.
///
/// # Example
///
/// ```
/// use bugsift::core::types::BugRecord;
///
/// let bug = BugRecord::new("BUG-1", "10001");
/// assert_eq!(bug.key, "BUG-1");
/// assert_eq!(bug.status, "Unknown");
/// assert!(bug.comments.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugRecord {
    /// Human-readable key, unique within the tracker (e.g. `PROJ-123`)
    pub key: String,
    /// Stable internal id
    pub id: String,
    pub summary: String,
    /// Plain-text description (rich documents are flattened)
    pub description: String,
    pub status: String,
    /// Resolution name, `None` while unresolved
    pub resolution: Option<String>,
    pub priority: String,
    pub components: Vec<String>,
    pub labels: Vec<String>,
    /// Creation timestamp, preserved verbatim
    pub created: String,
    /// Last update timestamp, preserved verbatim
    pub updated: String,
    pub reporter: Option<String>,
    pub assignee: Option<String>,
    /// Comments in chronological order
    pub comments: Vec<Comment>,
    pub failure_type: Option<FailureType>,
    pub is_escape_bug: Option<bool>,
    pub customer_impact: Option<String>,
    pub customer: Option<String>,
    pub severity: Option<String>,
    /// Raw non-null custom fields, keyed by tracker field id
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

impl BugRecord {
    /// Create a record with the given identity and every other field defaulted.
    pub fn new(key: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            id: id.into(),
            summary: String::new(),
            description: String::new(),
            status: UNKNOWN.to_string(),
            resolution: None,
            priority: UNKNOWN.to_string(),
            components: Vec::new(),
            labels: Vec::new(),
            created: String::new(),
            updated: String::new(),
            reporter: None,
            assignee: None,
            comments: Vec::new(),
            failure_type: None,
            is_escape_bug: None,
            customer_impact: None,
            customer: None,
            severity: None,
            custom_fields: BTreeMap::new(),
        }
    }
}

/// Placeholder for scalar fields the tracker did not supply.
pub const UNKNOWN: &str = "Unknown";

/// A comment on a bug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    /// Author display name
    pub author: String,
    /// Plain-text body
    pub body: String,
    pub created: String,
}

/// Failure categorization carried by a tracker custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureType {
    /// Previously working behavior broke
    Regression,
    /// Defect in new or never-working functionality
    NewDefect,
    /// The field held a value outside the known categories
    Unknown,
}

impl FailureType {
    /// Classify a free-form field label.
    ///
    /// ```
    /// use bugsift::core::types::FailureType;
    ///
    /// assert_eq!(FailureType::from_label("Regression"), FailureType::Regression);
    /// assert_eq!(FailureType::from_label("New Defect"), FailureType::NewDefect);
    /// assert_eq!(FailureType::from_label("???"), FailureType::Unknown);
    /// ```
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_ascii_lowercase();
        if lower.contains("regression") {
            FailureType::Regression
        } else if lower.contains("new") {
            FailureType::NewDefect
        } else {
            FailureType::Unknown
        }
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Regression => write!(f, "Regression"),
            FailureType::NewDefect => write!(f, "New Defect"),
            FailureType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Which analysis template to run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Customer-escaped bugs: escape reasons and missing test scenarios
    Escape,
    /// Every bug: failure-type breakdown
    #[default]
    All,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Escape => write!(f, "escape"),
            AnalysisMode::All => write!(f, "all"),
        }
    }
}

/// How a report is rendered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain sectioned text
    #[default]
    Terminal,
    Markdown,
    /// Self-contained HTML page
    Html,
    Json,
}

impl OutputFormat {
    /// Conventional file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Terminal => "txt",
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Terminal => write!(f, "terminal"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Html => write!(f, "html"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
