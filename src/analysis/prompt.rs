//! analysis::prompt
//!
//! Builds the analysis prompt from bug records.
//!
//! # Design
//!
//! The prompt has three parts: mode-specific instructions, one bounded
//! text block per bug, and the JSON schema the reply must follow. The
//! schema is built as a [`serde_json::Value`] from the same camelCase names
//! [`PatternReport`](crate::core::report::PatternReport) serializes with,
//! and the tests check the two stay in lock-step.

use serde_json::{json, Value};

use crate::core::types::{AnalysisMode, BugRecord};

/// Character cap for a description in a bug block.
pub const DESCRIPTION_LIMIT: usize = 1000;

/// Character cap for each comment in a bug block.
pub const COMMENT_LIMIT: usize = 300;

/// Number of trailing comments included per bug.
pub const RECENT_COMMENTS: usize = 2;

/// Line placed between bug blocks.
pub const RECORD_SEPARATOR: &str = "\n---\n";

const SEVERITY: &str = "critical|high|medium|low";
const LEVEL: &str = "high|medium|low";
const TREND: &str = "increasing|stable|decreasing";

/// Build the full prompt for `records` in `mode`.
///
/// ```
/// use bugsift::analysis::prompt::build;
/// use bugsift::core::types::{AnalysisMode, BugRecord};
///
/// let prompt = build(&[BugRecord::new("BUG-1", "1")], AnalysisMode::All);
/// assert!(prompt.contains("Bug: BUG-1"));
/// assert!(prompt.contains("\"rootCauseClusters\""));
/// ```
pub fn build(records: &[BugRecord], mode: AnalysisMode) -> String {
    let blocks = records
        .iter()
        .map(|bug| format_record(bug, mode))
        .collect::<Vec<_>>()
        .join(RECORD_SEPARATOR);

    format!(
        "{intro}\n\n{dimensions}\n\nBugs:\n\n{blocks}\n\n\
         Respond with a single JSON object with exactly this structure:\n\n{schema:#}\n\n\
         Use only the listed values for enumerated fields ({SEVERITY}, {LEVEL}, or {TREND}). \
         Refer to bugs by their keys exactly as written above.\n\
         Return ONLY the JSON object. Do not include any text before or after it, \
         and do not wrap it in markdown code fences.",
        intro = intro(records.len(), mode),
        dimensions = dimensions(mode),
        blocks = blocks,
        schema = schema(mode),
    )
}

fn intro(count: usize, mode: AnalysisMode) -> String {
    match mode {
        AnalysisMode::Escape => format!(
            "You are a senior QA engineer reviewing {} bugs that escaped to customers. \
             Work out why testing missed them and what would have caught them.",
            count
        ),
        AnalysisMode::All => format!(
            "You are a senior QA engineer reviewing {} bugs from an issue tracker. \
             Find the patterns behind them and where quality effort should go next.",
            count
        ),
    }
}

fn dimensions(mode: AnalysisMode) -> String {
    let mut items = vec![
        "Group bugs into root-cause clusters.",
        "Identify recurring issues and how often they occur.",
        "Identify component hotspots.",
        "Find gaps in testing coverage.",
        "Identify the phases where defects were injected.",
        "Score risk per component (0-100) with its trend.",
        "Call out regressions.",
        "Assess customer impact.",
        "Recommend test data.",
        "Suggest process improvements.",
        "Summarize trends.",
        "Find automation opportunities.",
        "Analyze issues related to platform ports.",
        "Give prioritized recommendations with reasoning and target bugs.",
    ];
    match mode {
        AnalysisMode::Escape => {
            items.push("Categorize the reasons each bug escaped testing.");
            items.push("Suggest concrete test scenarios that would have caught them.");
        }
        AnalysisMode::All => {
            items.push("Break the bugs down by failure type.");
        }
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one bug as a bounded text block.
pub fn format_record(bug: &BugRecord, mode: AnalysisMode) -> String {
    let mut lines = vec![
        format!("Bug: {}", bug.key),
        format!("Summary: {}", bug.summary),
        format!("Status: {} | Priority: {}", bug.status, bug.priority),
    ];

    if mode == AnalysisMode::All {
        lines.push(format!(
            "Failure Type: {} | Customer: {}",
            bug.failure_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            bug.customer.as_deref().unwrap_or("N/A"),
        ));
    }

    lines.push(format!("Components: {}", join_or_none(&bug.components)));
    lines.push(format!("Labels: {}", join_or_none(&bug.labels)));
    lines.push(format!(
        "Description: {}",
        truncate(&bug.description, DESCRIPTION_LIMIT)
    ));

    let skip = bug.comments.len().saturating_sub(RECENT_COMMENTS);
    let recent: Vec<String> = bug
        .comments
        .iter()
        .skip(skip)
        .map(|c| format!("- {}: {}", c.author, truncate(&c.body, COMMENT_LIMIT)))
        .collect();
    if !recent.is_empty() {
        lines.push("Recent Comments:".to_string());
        lines.extend(recent);
    }

    lines.join("\n")
}

/// Truncate to `limit` characters, marking truncation with `...`.
///
/// ```
/// use bugsift::analysis::prompt::truncate;
///
/// assert_eq!(truncate("abcdef", 3), "abc...");
/// assert_eq!(truncate("abc", 3), "abc");
/// ```
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// The JSON structure the reply must follow in `mode`.
pub fn schema(mode: AnalysisMode) -> Value {
    let mut schema = json!({
        "summary": "2-3 sentence executive summary",
        "rootCauseClusters": [{
            "id": "cluster-1",
            "name": "short name",
            "description": "what the bugs have in common",
            "rootCause": "underlying cause",
            "bugKeys": ["BUG-123"],
            "severity": SEVERITY,
            "recommendation": "how to fix the cause"
        }],
        "recurringIssues": [{
            "pattern": "pattern name",
            "description": "description",
            "frequency": 0,
            "bugKeys": ["BUG-123"],
            "impact": LEVEL
        }],
        "componentHotspots": [{
            "component": "component name",
            "bugCount": 0,
            "commonIssues": ["issue"],
            "bugKeys": ["BUG-123"],
            "riskLevel": SEVERITY
        }],
        "testingGaps": [{
            "area": "area",
            "description": "what is not covered",
            "bugKeys": ["BUG-123"],
            "suggestedApproach": "how to cover it",
            "severity": SEVERITY
        }],
        "defectInjectionPoints": [{
            "phase": "requirements|design|implementation|integration|deployment",
            "description": "description",
            "frequency": 0,
            "bugKeys": ["BUG-123"],
            "prevention": "how to prevent",
            "impact": LEVEL
        }],
        "componentRiskScores": [{
            "component": "component name",
            "score": 0,
            "factors": ["factor"],
            "riskLevel": SEVERITY,
            "trend": TREND
        }],
        "regressionFindings": [{
            "description": "what regressed",
            "affectedArea": "area",
            "likelyCause": "cause",
            "bugKeys": ["BUG-123"],
            "confirmed": false,
            "severity": SEVERITY
        }],
        "customerImpact": [{
            "customer": "customer name",
            "description": "impact description",
            "affectedFeatures": ["feature"],
            "bugKeys": ["BUG-123"],
            "impactLevel": SEVERITY
        }],
        "testDataRecommendations": [{
            "scenario": "scenario",
            "description": "description",
            "dataRequirements": ["requirement"],
            "targetBugs": ["BUG-123"],
            "priority": LEVEL
        }],
        "processImprovements": [{
            "area": "area",
            "recommendation": "recommendation",
            "rationale": "why",
            "targetBugs": ["BUG-123"],
            "expectedImpact": LEVEL
        }],
        "trendMetrics": {
            "overallTrend": TREND,
            "summary": "trend summary",
            "hotAreas": ["area"],
            "observations": ["observation"]
        },
        "automationOpportunities": [{
            "area": "area",
            "description": "description",
            "suggestedTooling": "tool or framework",
            "targetBugs": ["BUG-123"],
            "effort": LEVEL,
            "impact": LEVEL
        }],
        "platformPortAnalysis": {
            "summary": "summary of port-related issues, empty if none",
            "portRelatedBugs": ["BUG-123"],
            "commonIssues": ["issue"],
            "recommendations": ["recommendation"],
            "riskLevel": LEVEL
        },
        "recommendations": [{
            "text": "recommendation",
            "reasoning": "why, citing evidence from the bugs",
            "targetBugs": ["BUG-123"],
            "priority": SEVERITY
        }]
    });

    let extra = match mode {
        AnalysisMode::Escape => json!({
            "escapeReasons": [{
                "category": "reason category",
                "description": "description",
                "frequency": 0,
                "bugKeys": ["BUG-123"],
                "prevention": "how to prevent",
                "severity": SEVERITY
            }],
            "suggestedTestScenarios": [{
                "title": "scenario title",
                "description": "description",
                "testType": "unit|integration|e2e|manual",
                "steps": ["step"],
                "targetBugs": ["BUG-123"],
                "automatable": false,
                "priority": SEVERITY
            }]
        }),
        AnalysisMode::All => json!({
            "failureTypeBreakdown": [{
                "failureType": "failure type",
                "count": 0,
                "summary": "summary",
                "bugKeys": ["BUG-123"],
                "severity": SEVERITY
            }]
        }),
    };

    if let (Some(base), Value::Object(extra)) = (schema.as_object_mut(), extra) {
        base.extend(extra);
    }
    schema
}
