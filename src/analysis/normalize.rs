//! analysis::normalize
//!
//! Turns the model's JSON reply into a fully-populated [`PatternReport`].
//!
//! # Design
//!
//! The reply is untrusted. It is parsed into a [`serde_json::Value`] and
//! read field by field through [`Fields`], which substitutes a default for
//! anything missing or of the wrong type. Parsing fails only when the text
//! is not a JSON object at all; everything inside the object is best-effort.
//!
//! Cluster keys are resolved against the records that were sent. Keys the
//! model invented are kept in `bug_keys` but produce no entry in `bugs`.

use std::collections::HashMap;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::debug;

use super::traits::AnalysisError;
use crate::core::report::*;
use crate::core::types::{AnalysisMode, BugRecord};

/// Normalize a raw model reply.
///
/// `total_bugs` is set to `records.len()` and `generated_at` to now.
///
/// # Errors
///
/// [`AnalysisError::Parse`] if the de-fenced text is not a JSON object.
///
/// # Example
///
/// ```
/// use bugsift::analysis::normalize::normalize;
/// use bugsift::core::types::AnalysisMode;
///
/// let report = normalize("```json\n{\"summary\": \"ok\"}\n```", &[], AnalysisMode::All).unwrap();
/// assert_eq!(report.summary, "ok");
/// assert!(normalize("not json", &[], AnalysisMode::All).is_err());
/// ```
pub fn normalize(
    raw: &str,
    records: &[BugRecord],
    mode: AnalysisMode,
) -> Result<PatternReport, AnalysisError> {
    let value: Value = serde_json::from_str(strip_fences(raw))
        .map_err(|e| AnalysisError::Parse(e.to_string()))?;
    let root = match value {
        Value::Object(map) => map,
        other => {
            return Err(AnalysisError::Parse(format!(
                "expected a JSON object, got {}",
                kind(&other)
            )))
        }
    };

    let by_key: HashMap<&str, &BugRecord> =
        records.iter().map(|r| (r.key.as_str(), r)).collect();
    let f = Fields(Some(&root));

    Ok(PatternReport {
        mode,
        total_bugs: records.len(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        summary: f.string("summary"),
        root_cause_clusters: f.list("rootCauseClusters", |e| cluster(e, &by_key)),
        recurring_issues: f.list("recurringIssues", |e| RecurringIssue {
            pattern: e.string("pattern"),
            description: e.string("description"),
            frequency: e.count("frequency"),
            bug_keys: e.strings("bugKeys"),
            impact: e.closed("impact"),
        }),
        component_hotspots: f.list("componentHotspots", |e| ComponentHotspot {
            component: e.string("component"),
            bug_count: e.count("bugCount"),
            common_issues: e.strings("commonIssues"),
            bug_keys: e.strings("bugKeys"),
            risk_level: e.closed("riskLevel"),
        }),
        escape_reasons: f.list("escapeReasons", |e| EscapeReason {
            category: e.string("category"),
            description: e.string("description"),
            frequency: e.count("frequency"),
            bug_keys: e.strings("bugKeys"),
            prevention: e.string("prevention"),
            severity: e.closed("severity"),
        }),
        suggested_test_scenarios: f.list("suggestedTestScenarios", |e| TestScenario {
            title: e.string("title"),
            description: e.string("description"),
            test_type: e.string("testType"),
            steps: e.strings("steps"),
            target_bugs: e.strings("targetBugs"),
            automatable: e.flag("automatable"),
            priority: e.closed("priority"),
        }),
        testing_gaps: f.list("testingGaps", |e| TestingGap {
            area: e.string("area"),
            description: e.string("description"),
            bug_keys: e.strings("bugKeys"),
            suggested_approach: e.string("suggestedApproach"),
            severity: e.closed("severity"),
        }),
        defect_injection_points: f.list("defectInjectionPoints", |e| InjectionPoint {
            phase: e.string("phase"),
            description: e.string("description"),
            frequency: e.count("frequency"),
            bug_keys: e.strings("bugKeys"),
            prevention: e.string("prevention"),
            impact: e.closed("impact"),
        }),
        component_risk_scores: f.list("componentRiskScores", |e| ComponentRiskScore {
            component: e.string("component"),
            score: e.number("score").clamp(0.0, 100.0),
            factors: e.strings("factors"),
            risk_level: e.closed("riskLevel"),
            trend: e.closed("trend"),
        }),
        regression_findings: f.list("regressionFindings", |e| RegressionFinding {
            description: e.string("description"),
            affected_area: e.string("affectedArea"),
            likely_cause: e.string("likelyCause"),
            bug_keys: e.strings("bugKeys"),
            confirmed: e.flag("confirmed"),
            severity: e.closed("severity"),
        }),
        customer_impact: f.list("customerImpact", |e| CustomerImpact {
            customer: e.string("customer"),
            description: e.string("description"),
            affected_features: e.strings("affectedFeatures"),
            bug_keys: e.strings("bugKeys"),
            impact_level: e.closed("impactLevel"),
        }),
        test_data_recommendations: f.list("testDataRecommendations", |e| {
            TestDataRecommendation {
                scenario: e.string("scenario"),
                description: e.string("description"),
                data_requirements: e.strings("dataRequirements"),
                target_bugs: e.strings("targetBugs"),
                priority: e.closed("priority"),
            }
        }),
        process_improvements: f.list("processImprovements", |e| ProcessImprovement {
            area: e.string("area"),
            recommendation: e.string("recommendation"),
            rationale: e.string("rationale"),
            target_bugs: e.strings("targetBugs"),
            expected_impact: e.closed("expectedImpact"),
        }),
        trend_metrics: {
            let e = f.object("trendMetrics");
            TrendMetrics {
                overall_trend: e.closed("overallTrend"),
                summary: e.string("summary"),
                hot_areas: e.strings("hotAreas"),
                observations: e.strings("observations"),
            }
        },
        automation_opportunities: f.list("automationOpportunities", |e| {
            AutomationOpportunity {
                area: e.string("area"),
                description: e.string("description"),
                suggested_tooling: e.string("suggestedTooling"),
                target_bugs: e.strings("targetBugs"),
                effort: e.closed("effort"),
                impact: e.closed("impact"),
            }
        }),
        platform_port_analysis: {
            let e = f.object("platformPortAnalysis");
            PlatformPortAnalysis {
                summary: e.string("summary"),
                port_related_bugs: e.strings("portRelatedBugs"),
                common_issues: e.strings("commonIssues"),
                recommendations: e.strings("recommendations"),
                risk_level: e.closed("riskLevel"),
            }
        },
        recommendations: recommendations(root.get("recommendations")),
        failure_type_breakdown: f.list("failureTypeBreakdown", |e| FailureTypeGroup {
            failure_type: e.string("failureType"),
            count: e.count("count"),
            summary: e.string("summary"),
            bug_keys: e.strings("bugKeys"),
            severity: e.closed("severity"),
        }),
    })
}

/// Remove a surrounding markdown code fence, if any.
///
/// ```
/// use bugsift::analysis::normalize::strip_fences;
///
/// assert_eq!(strip_fences("```json\n{}\n```"), "{}");
/// assert_eq!(strip_fences("  {}  "), "{}");
/// ```
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // drop the optional language tag; the body may start on the same line
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()).trim();
        text = text.strip_suffix("```").unwrap_or(text);
    }
    text.trim()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn cluster(e: Fields<'_>, by_key: &HashMap<&str, &BugRecord>) -> RootCauseCluster {
    let bug_keys = e.strings("bugKeys");
    let bugs = bug_keys
        .iter()
        .filter_map(|key| match by_key.get(key.as_str()) {
            Some(record) => Some((*record).clone()),
            None => {
                debug!(key = %key, "dropping unknown bug key from cluster");
                None
            }
        })
        .collect();

    RootCauseCluster {
        id: e.string("id"),
        name: e.string("name"),
        description: e.string("description"),
        root_cause: e.string("rootCause"),
        bug_keys,
        bugs,
        severity: e.closed("severity"),
        recommendation: e.string("recommendation"),
    }
}

/// Recommendations arrive either as objects or, from older prompts, as
/// bare strings.
fn recommendations(value: Option<&Value>) -> Vec<Recommendation> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(text) => Recommendation::from_text(text.as_str()),
            other => {
                let e = Fields(other.as_object());
                Recommendation {
                    text: e.string("text"),
                    reasoning: e.string("reasoning"),
                    target_bugs: e.strings("targetBugs"),
                    priority: e.closed("priority"),
                }
            }
        })
        .collect()
}

/// Defaulting accessors over an optional JSON object.
#[derive(Clone, Copy)]
struct Fields<'a>(Option<&'a Map<String, Value>>);

impl<'a> Fields<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.and_then(|map| map.get(key))
    }

    fn string(&self, key: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    fn strings(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn number(&self, key: &str) -> f64 {
        match self.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn count(&self, key: &str) -> u32 {
        let n = self.number(key);
        if n.is_finite() && n > 0.0 {
            n.min(u32::MAX as f64) as u32
        } else {
            0
        }
    }

    fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }

    fn closed<T: FromStr + Default>(&self, key: &str) -> T {
        match self.get(key) {
            Some(Value::String(s)) => s.parse().unwrap_or_default(),
            _ => T::default(),
        }
    }

    fn object(&self, key: &str) -> Fields<'a> {
        Fields(self.get(key).and_then(Value::as_object))
    }

    fn list<T>(&self, key: &str, build: impl Fn(Fields<'a>) -> T) -> Vec<T> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| build(Fields(item.as_object())))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(keys: &[&str]) -> Vec<BugRecord> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| BugRecord::new(*k, i.to_string()))
            .collect()
    }

    mod fences {
        use super::*;

        #[test]
        fn strips_tagged_fence() {
            assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        }

        #[test]
        fn strips_untagged_fence() {
            assert_eq!(strip_fences("```\n{}\n```\n"), "{}");
        }

        #[test]
        fn leaves_bare_json_alone() {
            assert_eq!(strip_fences("{\"a\":\"```\"}"), "{\"a\":\"```\"}");
        }

        #[test]
        fn tolerates_missing_closing_fence() {
            assert_eq!(strip_fences("```json\n{}"), "{}");
        }

        #[test]
        fn body_on_fence_line() {
            assert_eq!(strip_fences("```json {\"a\":1}```"), "{\"a\":1}");
            assert_eq!(strip_fences("```{\"a\":1}```"), "{\"a\":1}");
        }

        #[test]
        fn body_starts_on_fence_line_and_continues() {
            assert_eq!(strip_fences("```json {\n\"a\":1}\n```"), "{\n\"a\":1}");
        }

        #[test]
        fn fenced_reply_on_one_line_normalizes() {
            let records = records(&["BUG-1"]);
            let report =
                normalize("```json {\"summary\":\"x\"}```", &records, AnalysisMode::All).unwrap();
            assert_eq!(report.summary, "x");

            let report =
                normalize("```json {\n\"summary\":\"y\"}\n```", &records, AnalysisMode::All)
                    .unwrap();
            assert_eq!(report.summary, "y");
        }
    }

    #[test]
    fn fenced_cluster_with_unknown_key() {
        let raw = "```json\n{\"summary\":\"s\",\"rootCauseClusters\":[{\"name\":\"Save path\",\"bugKeys\":[\"BUG-1\",\"BUG-9\"]}]}\n```";
        let records = records(&["BUG-1", "BUG-2"]);
        let report = normalize(raw, &records, AnalysisMode::All).unwrap();

        assert_eq!(report.summary, "s");
        assert_eq!(report.total_bugs, 2);
        let cluster = &report.root_cause_clusters[0];
        assert_eq!(cluster.name, "Save path");
        assert_eq!(cluster.bug_keys, vec!["BUG-1", "BUG-9"]);
        assert_eq!(cluster.bugs.len(), 1);
        assert_eq!(cluster.bugs[0].key, "BUG-1");
        assert_eq!(cluster.severity, Severity::Medium);
        assert_eq!(cluster.root_cause, "");
    }

    #[test]
    fn not_json_is_parse_error() {
        let err = normalize("not json", &[], AnalysisMode::All).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }

    #[test]
    fn non_object_is_parse_error() {
        for raw in ["[]", "\"text\"", "42", "null"] {
            let err = normalize(raw, &[], AnalysisMode::Escape).unwrap_err();
            assert!(matches!(err, AnalysisError::Parse(_)), "{}", raw);
        }
    }

    #[test]
    fn legacy_string_recommendation() {
        let report = normalize(
            r#"{"recommendations":["Add tests", {"text":"Fix","priority":"high","targetBugs":["A-1"]}]}"#,
            &[],
            AnalysisMode::All,
        )
        .unwrap();
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.recommendations[0], Recommendation::from_text("Add tests"));
        assert_eq!(report.recommendations[1].text, "Fix");
        assert_eq!(report.recommendations[1].priority, Severity::High);
        assert_eq!(report.recommendations[1].target_bugs, vec!["A-1"]);
    }

    #[test]
    fn empty_object_defaults_everything() {
        let report = normalize("{}", &records(&["A-1"]), AnalysisMode::Escape).unwrap();
        assert_eq!(report.mode, AnalysisMode::Escape);
        assert_eq!(report.total_bugs, 1);
        assert!(!report.generated_at.is_empty());
        assert_eq!(report.summary, "");
        assert!(report.root_cause_clusters.is_empty());
        assert!(report.escape_reasons.is_empty());
        assert_eq!(report.trend_metrics, TrendMetrics::default());
        assert_eq!(report.platform_port_analysis, PlatformPortAnalysis::default());
    }

    #[test]
    fn wrong_types_fall_back_to_defaults() {
        let raw = json!({
            "summary": 7,
            "recurringIssues": "nope",
            "componentHotspots": [42, {"component": "UI", "bugCount": "3", "riskLevel": "urgent"}],
            "trendMetrics": [],
        })
        .to_string();
        let report = normalize(&raw, &[], AnalysisMode::All).unwrap();

        assert_eq!(report.summary, "7");
        assert!(report.recurring_issues.is_empty());
        assert_eq!(report.component_hotspots.len(), 2);
        assert_eq!(report.component_hotspots[0], ComponentHotspot::default());
        assert_eq!(report.component_hotspots[1].component, "UI");
        assert_eq!(report.component_hotspots[1].bug_count, 3);
        assert_eq!(report.component_hotspots[1].risk_level, Severity::Medium);
        assert_eq!(report.trend_metrics, TrendMetrics::default());
    }

    #[test]
    fn enums_parse_case_insensitively() {
        let raw = json!({
            "componentRiskScores": [{"riskLevel": "HIGH", "trend": "Increasing"}],
            "automationOpportunities": [{"effort": "low", "impact": "bogus"}],
        })
        .to_string();
        let report = normalize(&raw, &[], AnalysisMode::All).unwrap();
        assert_eq!(report.component_risk_scores[0].risk_level, Severity::High);
        assert_eq!(report.component_risk_scores[0].trend, Trend::Increasing);
        assert_eq!(report.automation_opportunities[0].effort, Level::Low);
        assert_eq!(report.automation_opportunities[0].impact, Level::Medium);
    }

    #[test]
    fn risk_score_is_clamped() {
        let raw = json!({
            "componentRiskScores": [
                {"component": "a", "score": 250},
                {"component": "b", "score": -5},
                {"component": "c", "score": 42.5}
            ]
        })
        .to_string();
        let report = normalize(&raw, &[], AnalysisMode::All).unwrap();
        let scores: Vec<f64> = report.component_risk_scores.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![100.0, 0.0, 42.5]);
    }

    #[test]
    fn negative_counts_become_zero() {
        let raw = json!({"recurringIssues": [{"frequency": -3}, {"frequency": 2.9}]}).to_string();
        let report = normalize(&raw, &[], AnalysisMode::All).unwrap();
        assert_eq!(report.recurring_issues[0].frequency, 0);
        assert_eq!(report.recurring_issues[1].frequency, 2);
    }

    #[test]
    fn booleans_default_false() {
        let raw = json!({
            "suggestedTestScenarios": [{"automatable": true}, {"automatable": "yes"}],
            "regressionFindings": [{}]
        })
        .to_string();
        let report = normalize(&raw, &[], AnalysisMode::Escape).unwrap();
        assert!(report.suggested_test_scenarios[0].automatable);
        assert!(!report.suggested_test_scenarios[1].automatable);
        assert!(!report.regression_findings[0].confirmed);
    }

    #[test]
    fn cluster_bugs_follow_key_order() {
        let raw = json!({"rootCauseClusters": [{"bugKeys": ["B-2", "B-1", "B-3"]}]}).to_string();
        let records = records(&["B-1", "B-2"]);
        let report = normalize(&raw, &records, AnalysisMode::All).unwrap();
        let keys: Vec<&str> = report.root_cause_clusters[0]
            .bugs
            .iter()
            .map(|b| b.key.as_str())
            .collect();
        assert_eq!(keys, vec!["B-2", "B-1"]);
    }
}
