//! core::report
//!
//! The pattern report produced by analysis.
//!
//! # Design
//!
//! A [`PatternReport`] is built once per analysis call by the normalizer and
//! never mutated afterward. Every collection is always present (possibly
//! empty) and every enumerated field holds a value from its closed set, so
//! renderers never need to handle missing data.
//!
//! Field names serialize as camelCase, matching the JSON shape the model is
//! asked to return.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::{AnalysisMode, BugRecord};

/// Four-level severity, also used for four-level priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

/// Three-level rating for impact, effort and similar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    #[default]
    Medium,
    Low,
}

/// Direction of a metric over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    #[default]
    Stable,
    Decreasing,
}

/// Error for a string outside an enumeration's set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! closed_enum {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Lowercase wire name.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(UnknownVariant(s.to_string())),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum!(Severity {
    Critical => "critical",
    High => "high",
    Medium => "medium",
    Low => "low",
});

closed_enum!(Level {
    High => "high",
    Medium => "medium",
    Low => "low",
});

closed_enum!(Trend {
    Increasing => "increasing",
    Stable => "stable",
    Decreasing => "decreasing",
});

/// Bugs sharing one underlying cause.
///
/// `bug_keys` is the list exactly as the model returned it; `bugs` holds the
/// records those keys resolved to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootCauseCluster {
    pub id: String,
    pub name: String,
    pub description: String,
    pub root_cause: String,
    pub bug_keys: Vec<String>,
    pub bugs: Vec<BugRecord>,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringIssue {
    pub pattern: String,
    pub description: String,
    pub frequency: u32,
    pub bug_keys: Vec<String>,
    pub impact: Level,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHotspot {
    pub component: String,
    pub bug_count: u32,
    pub common_issues: Vec<String>,
    pub bug_keys: Vec<String>,
    pub risk_level: Severity,
}

/// Why a group of bugs escaped to customers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscapeReason {
    pub category: String,
    pub description: String,
    pub frequency: u32,
    pub bug_keys: Vec<String>,
    pub prevention: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScenario {
    pub title: String,
    pub description: String,
    pub test_type: String,
    pub steps: Vec<String>,
    pub target_bugs: Vec<String>,
    pub automatable: bool,
    pub priority: Severity,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestingGap {
    pub area: String,
    pub description: String,
    pub bug_keys: Vec<String>,
    pub suggested_approach: String,
    pub severity: Severity,
}

/// Development phase where defects were introduced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionPoint {
    pub phase: String,
    pub description: String,
    pub frequency: u32,
    pub bug_keys: Vec<String>,
    pub prevention: String,
    pub impact: Level,
}

/// Risk score for one component, clamped to `0.0..=100.0`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRiskScore {
    pub component: String,
    pub score: f64,
    pub factors: Vec<String>,
    pub risk_level: Severity,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionFinding {
    pub description: String,
    pub affected_area: String,
    pub likely_cause: String,
    pub bug_keys: Vec<String>,
    pub confirmed: bool,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerImpact {
    pub customer: String,
    pub description: String,
    pub affected_features: Vec<String>,
    pub bug_keys: Vec<String>,
    pub impact_level: Severity,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDataRecommendation {
    pub scenario: String,
    pub description: String,
    pub data_requirements: Vec<String>,
    pub target_bugs: Vec<String>,
    pub priority: Level,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessImprovement {
    pub area: String,
    pub recommendation: String,
    pub rationale: String,
    pub target_bugs: Vec<String>,
    pub expected_impact: Level,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendMetrics {
    pub overall_trend: Trend,
    pub summary: String,
    pub hot_areas: Vec<String>,
    pub observations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationOpportunity {
    pub area: String,
    pub description: String,
    pub suggested_tooling: String,
    pub target_bugs: Vec<String>,
    pub effort: Level,
    pub impact: Level,
}

/// Bugs tied to porting the product to another platform.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPortAnalysis {
    pub summary: String,
    pub port_related_bugs: Vec<String>,
    pub common_issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_level: Level,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub text: String,
    pub reasoning: String,
    pub target_bugs: Vec<String>,
    pub priority: Severity,
}

impl Recommendation {
    /// Build from the legacy bare-string shape.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Bugs grouped by their failure-type field (`all` mode only).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureTypeGroup {
    pub failure_type: String,
    pub count: u32,
    pub summary: String,
    pub bug_keys: Vec<String>,
    pub severity: Severity,
}

/// Complete output of one analysis call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternReport {
    pub mode: AnalysisMode,
    pub total_bugs: usize,
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub summary: String,
    pub root_cause_clusters: Vec<RootCauseCluster>,
    pub recurring_issues: Vec<RecurringIssue>,
    pub component_hotspots: Vec<ComponentHotspot>,
    pub escape_reasons: Vec<EscapeReason>,
    pub suggested_test_scenarios: Vec<TestScenario>,
    pub testing_gaps: Vec<TestingGap>,
    pub defect_injection_points: Vec<InjectionPoint>,
    pub component_risk_scores: Vec<ComponentRiskScore>,
    pub regression_findings: Vec<RegressionFinding>,
    pub customer_impact: Vec<CustomerImpact>,
    pub test_data_recommendations: Vec<TestDataRecommendation>,
    pub process_improvements: Vec<ProcessImprovement>,
    pub trend_metrics: TrendMetrics,
    pub automation_opportunities: Vec<AutomationOpportunity>,
    pub platform_port_analysis: PlatformPortAnalysis,
    pub recommendations: Vec<Recommendation>,
    pub failure_type_breakdown: Vec<FailureTypeGroup>,
}

impl PatternReport {
    /// An empty report for the given mode.
    pub fn empty(mode: AnalysisMode) -> Self {
        Self {
            mode,
            generated_at: chrono::Utc::now().to_rfc3339(),
            ..Self::default()
        }
    }
}
