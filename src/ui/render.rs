//! ui::render
//!
//! Renders a [`PatternReport`] as terminal text, Markdown, HTML or JSON.
//!
//! # Design
//!
//! The report is first flattened into a small document model of sections
//! and entries; each text format then walks that model. Sections with no
//! content are left out of the model, so no format prints empty headings.

use std::fmt::Write;

use crate::core::report::*;
use crate::core::types::OutputFormat;

const TITLE: &str = "Bug Pattern Analysis";

/// Render `report` in `format`.
///
/// # Example
///
/// ```
/// use bugsift::core::report::PatternReport;
/// use bugsift::core::types::{AnalysisMode, OutputFormat};
/// use bugsift::ui::render::render;
///
/// let mut report = PatternReport::empty(AnalysisMode::All);
/// report.summary = "Two hotspots".to_string();
/// let text = render(&report, OutputFormat::Markdown);
/// assert!(text.starts_with("# Bug Pattern Analysis"));
/// assert!(text.contains("Two hotspots"));
/// ```
pub fn render(report: &PatternReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Terminal => terminal(report),
        OutputFormat::Markdown => markdown(report),
        OutputFormat::Html => html(report),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

// --------------------------------------------------------------------------
// Document model
// --------------------------------------------------------------------------

struct Section {
    title: &'static str,
    intro: Vec<(&'static str, String)>,
    entries: Vec<Entry>,
}

struct Entry {
    title: String,
    badge: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl Entry {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            badge: None,
            fields: Vec::new(),
        }
    }

    fn badge(mut self, badge: impl ToString) -> Self {
        self.badge = Some(badge.to_string());
        self
    }

    /// Add a field, skipping empty values.
    fn field(mut self, label: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.fields.push((label, value));
        }
        self
    }

    fn list(self, label: &'static str, items: &[String]) -> Self {
        self.field(label, items.join(", "))
    }
}

fn section(title: &'static str, entries: Vec<Entry>) -> Option<Section> {
    (!entries.is_empty()).then_some(Section {
        title,
        intro: Vec::new(),
        entries,
    })
}

fn or_untitled(text: &str) -> String {
    if text.trim().is_empty() {
        "(untitled)".to_string()
    } else {
        text.to_string()
    }
}

fn sections(report: &PatternReport) -> Vec<Section> {
    let mut out = vec![
        section(
            "Root Cause Clusters",
            report
                .root_cause_clusters
                .iter()
                .map(|c| {
                    Entry::new(or_untitled(&c.name))
                        .badge(c.severity)
                        .field("Description", &c.description)
                        .field("Root cause", &c.root_cause)
                        .list("Bugs", &c.bug_keys)
                        .field("Recommendation", &c.recommendation)
                })
                .collect(),
        ),
        section(
            "Recurring Issues",
            report
                .recurring_issues
                .iter()
                .map(|i| {
                    Entry::new(or_untitled(&i.pattern))
                        .badge(format!("{} impact", i.impact))
                        .field("Description", &i.description)
                        .field("Frequency", i.frequency.to_string())
                        .list("Bugs", &i.bug_keys)
                })
                .collect(),
        ),
        section(
            "Component Hotspots",
            report
                .component_hotspots
                .iter()
                .map(|h| {
                    Entry::new(or_untitled(&h.component))
                        .badge(h.risk_level)
                        .field("Bug count", h.bug_count.to_string())
                        .list("Common issues", &h.common_issues)
                        .list("Bugs", &h.bug_keys)
                })
                .collect(),
        ),
        section(
            "Escape Reasons",
            report
                .escape_reasons
                .iter()
                .map(|r| {
                    Entry::new(or_untitled(&r.category))
                        .badge(r.severity)
                        .field("Description", &r.description)
                        .field("Frequency", r.frequency.to_string())
                        .field("Prevention", &r.prevention)
                        .list("Bugs", &r.bug_keys)
                })
                .collect(),
        ),
        section(
            "Suggested Test Scenarios",
            report
                .suggested_test_scenarios
                .iter()
                .map(|s| {
                    Entry::new(or_untitled(&s.title))
                        .badge(s.priority)
                        .field("Type", &s.test_type)
                        .field("Description", &s.description)
                        .field("Steps", numbered(&s.steps))
                        .field("Automatable", yes_no(s.automatable))
                        .list("Targets", &s.target_bugs)
                })
                .collect(),
        ),
        section(
            "Testing Gaps",
            report
                .testing_gaps
                .iter()
                .map(|g| {
                    Entry::new(or_untitled(&g.area))
                        .badge(g.severity)
                        .field("Description", &g.description)
                        .field("Suggested approach", &g.suggested_approach)
                        .list("Bugs", &g.bug_keys)
                })
                .collect(),
        ),
        section(
            "Defect Injection Points",
            report
                .defect_injection_points
                .iter()
                .map(|p| {
                    Entry::new(or_untitled(&p.phase))
                        .badge(format!("{} impact", p.impact))
                        .field("Description", &p.description)
                        .field("Frequency", p.frequency.to_string())
                        .field("Prevention", &p.prevention)
                        .list("Bugs", &p.bug_keys)
                })
                .collect(),
        ),
        section(
            "Component Risk Scores",
            report
                .component_risk_scores
                .iter()
                .map(|r| {
                    Entry::new(or_untitled(&r.component))
                        .badge(r.risk_level)
                        .field("Score", format!("{:.0}/100", r.score))
                        .field("Trend", r.trend.to_string())
                        .list("Factors", &r.factors)
                })
                .collect(),
        ),
        section(
            "Regression Findings",
            report
                .regression_findings
                .iter()
                .map(|r| {
                    Entry::new(or_untitled(&r.affected_area))
                        .badge(r.severity)
                        .field("Description", &r.description)
                        .field("Likely cause", &r.likely_cause)
                        .field("Confirmed", yes_no(r.confirmed))
                        .list("Bugs", &r.bug_keys)
                })
                .collect(),
        ),
        section(
            "Customer Impact",
            report
                .customer_impact
                .iter()
                .map(|c| {
                    Entry::new(or_untitled(&c.customer))
                        .badge(c.impact_level)
                        .field("Description", &c.description)
                        .list("Affected features", &c.affected_features)
                        .list("Bugs", &c.bug_keys)
                })
                .collect(),
        ),
        section(
            "Failure Type Breakdown",
            report
                .failure_type_breakdown
                .iter()
                .map(|g| {
                    Entry::new(or_untitled(&g.failure_type))
                        .badge(g.severity)
                        .field("Count", g.count.to_string())
                        .field("Summary", &g.summary)
                        .list("Bugs", &g.bug_keys)
                })
                .collect(),
        ),
        section(
            "Test Data Recommendations",
            report
                .test_data_recommendations
                .iter()
                .map(|t| {
                    Entry::new(or_untitled(&t.scenario))
                        .badge(format!("{} priority", t.priority))
                        .field("Description", &t.description)
                        .list("Data requirements", &t.data_requirements)
                        .list("Targets", &t.target_bugs)
                })
                .collect(),
        ),
        section(
            "Process Improvements",
            report
                .process_improvements
                .iter()
                .map(|p| {
                    Entry::new(or_untitled(&p.area))
                        .badge(format!("{} impact", p.expected_impact))
                        .field("Recommendation", &p.recommendation)
                        .field("Rationale", &p.rationale)
                        .list("Targets", &p.target_bugs)
                })
                .collect(),
        ),
        section(
            "Automation Opportunities",
            report
                .automation_opportunities
                .iter()
                .map(|a| {
                    Entry::new(or_untitled(&a.area))
                        .badge(format!("{} effort / {} impact", a.effort, a.impact))
                        .field("Description", &a.description)
                        .field("Tooling", &a.suggested_tooling)
                        .list("Targets", &a.target_bugs)
                })
                .collect(),
        ),
    ];

    out.push(trend_section(&report.trend_metrics));
    out.push(port_section(&report.platform_port_analysis));
    out.push(section(
        "Recommendations",
        report
            .recommendations
            .iter()
            .enumerate()
            .map(|(i, r)| {
                Entry::new(format!("{}. {}", i + 1, or_untitled(&r.text)))
                    .badge(r.priority)
                    .field("Reasoning", &r.reasoning)
                    .list("Targets", &r.target_bugs)
            })
            .collect(),
    ));

    out.into_iter().flatten().collect()
}

fn trend_section(trend: &TrendMetrics) -> Option<Section> {
    let entries: Vec<Entry> = trend
        .observations
        .iter()
        .map(|o| Entry::new(o.as_str()))
        .collect();
    if trend.summary.trim().is_empty() && trend.hot_areas.is_empty() && entries.is_empty() {
        return None;
    }

    let mut intro = vec![("Overall trend", trend.overall_trend.to_string())];
    if !trend.summary.trim().is_empty() {
        intro.push(("Summary", trend.summary.clone()));
    }
    if !trend.hot_areas.is_empty() {
        intro.push(("Hot areas", trend.hot_areas.join(", ")));
    }
    Some(Section {
        title: "Trends",
        intro,
        entries,
    })
}

fn port_section(port: &PlatformPortAnalysis) -> Option<Section> {
    if port.summary.trim().is_empty()
        && port.port_related_bugs.is_empty()
        && port.common_issues.is_empty()
        && port.recommendations.is_empty()
    {
        return None;
    }

    let mut intro = vec![("Risk", port.risk_level.to_string())];
    if !port.summary.trim().is_empty() {
        intro.push(("Summary", port.summary.clone()));
    }
    if !port.port_related_bugs.is_empty() {
        intro.push(("Bugs", port.port_related_bugs.join(", ")));
    }
    if !port.common_issues.is_empty() {
        intro.push(("Common issues", port.common_issues.join(", ")));
    }
    Some(Section {
        title: "Platform Port Analysis",
        intro,
        entries: port
            .recommendations
            .iter()
            .map(|r| Entry::new(r.as_str()))
            .collect(),
    })
}

fn numbered(steps: &[String]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}) {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("  ")
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn meta(report: &PatternReport) -> String {
    format!(
        "Mode: {} | Bugs analyzed: {} | Generated: {}",
        report.mode, report.total_bugs, report.generated_at
    )
}

// --------------------------------------------------------------------------
// Formats
// --------------------------------------------------------------------------

fn terminal(report: &PatternReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", TITLE.to_uppercase());
    let _ = writeln!(out, "{}", meta(report));
    if !report.summary.trim().is_empty() {
        let _ = write!(out, "\nSUMMARY\n{}\n", report.summary);
    }

    for section in sections(report) {
        let _ = write!(out, "\n{}\n", section.title.to_uppercase());
        for (label, value) in &section.intro {
            let _ = writeln!(out, "  {}: {}", label, value);
        }
        for entry in &section.entries {
            match &entry.badge {
                Some(badge) => {
                    let _ = writeln!(out, "  * {} [{}]", entry.title, badge);
                }
                None => {
                    let _ = writeln!(out, "  * {}", entry.title);
                }
            }
            for (label, value) in &entry.fields {
                let _ = writeln!(out, "      {}: {}", label, value);
            }
        }
    }
    out
}

fn markdown(report: &PatternReport) -> String {
    let mut out = String::new();
    let _ = write!(out, "# {}\n\n_{}_\n", TITLE, meta(report));
    if !report.summary.trim().is_empty() {
        let _ = write!(out, "\n## Summary\n\n{}\n", report.summary);
    }

    for section in sections(report) {
        let _ = write!(out, "\n## {}\n\n", section.title);
        for (label, value) in &section.intro {
            let _ = writeln!(out, "**{}:** {}  ", label, value);
        }
        if !section.intro.is_empty() && !section.entries.is_empty() {
            out.push('\n');
        }
        for entry in &section.entries {
            if entry.fields.is_empty() {
                let _ = writeln!(out, "- {}{}", entry.title, md_badge(&entry.badge));
                continue;
            }
            let _ = write!(out, "### {}{}\n\n", entry.title, md_badge(&entry.badge));
            for (label, value) in &entry.fields {
                let _ = writeln!(out, "- **{}:** {}", label, value);
            }
            out.push('\n');
        }
    }
    out
}

fn md_badge(badge: &Option<String>) -> String {
    badge
        .as_ref()
        .map(|b| format!(" `{}`", b))
        .unwrap_or_default()
}

fn html(report: &PatternReport) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        "<h1>{}</h1>\n<p class=\"meta\">{}</p>\n",
        TITLE,
        escape_html(&meta(report))
    );
    if !report.summary.trim().is_empty() {
        let _ = write!(
            body,
            "<section>\n<h2>Summary</h2>\n<p>{}</p>\n</section>\n",
            escape_html(&report.summary)
        );
    }

    for section in sections(report) {
        let _ = write!(body, "<section>\n<h2>{}</h2>\n", section.title);
        if !section.intro.is_empty() {
            body.push_str("<dl>\n");
            for (label, value) in &section.intro {
                let _ = writeln!(
                    body,
                    "<dt>{}</dt><dd>{}</dd>",
                    label,
                    escape_html(value)
                );
            }
            body.push_str("</dl>\n");
        }
        for entry in &section.entries {
            body.push_str("<div class=\"entry\">\n");
            let _ = write!(body, "<h3>{}", escape_html(&entry.title));
            if let Some(badge) = &entry.badge {
                let _ = write!(body, " <span class=\"badge\">{}</span>", escape_html(badge));
            }
            body.push_str("</h3>\n");
            if !entry.fields.is_empty() {
                body.push_str("<dl>\n");
                for (label, value) in &entry.fields {
                    let _ = writeln!(
                        body,
                        "<dt>{}</dt><dd>{}</dd>",
                        label,
                        escape_html(value)
                    );
                }
                body.push_str("</dl>\n");
            }
            body.push_str("</div>\n");
        }
        body.push_str("</section>\n");
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:960px;margin:2rem auto;\
padding:0 1rem;color:#222}h2{border-bottom:1px solid #ddd;padding-bottom:.25rem}\
.meta{color:#666}.entry{margin:1rem 0;padding:.5rem 1rem;border-left:3px solid #4a7}\
.badge{font-size:.75rem;background:#eee;border-radius:4px;padding:.1rem .4rem}\
dt{font-weight:600}dd{margin:0 0 .5rem 1rem}";

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
