//! tracker::mapper
//!
//! Converts raw tracker issue JSON into [`BugRecord`]s.
//!
//! # Design
//!
//! Mapping is a pure function with no failure path. Tracker responses are
//! heterogeneous and often partial, so every missing or oddly-shaped field
//! collapses to its default instead of raising.
//!
//! Descriptions and comment bodies may arrive as rich documents (a tree of
//! typed nodes). These are flattened to plain text with [`flatten_document`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::types::{BugRecord, Comment, FailureType, UNKNOWN};

/// Prefix the tracker uses for custom field identifiers.
pub const CUSTOM_FIELD_PREFIX: &str = "customfield_";

/// Custom field identifiers pulled out into named [`BugRecord`] attributes.
///
/// # Example
///
/// ```toml
/// [tracker.fields]
/// failure_type = "customfield_10100"
/// escape_bug = "customfield_10101"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomFieldIds {
    pub failure_type: String,
    pub escape_bug: String,
    pub customer_impact: String,
    pub customer: String,
    pub severity: String,
}

impl Default for CustomFieldIds {
    fn default() -> Self {
        Self {
            failure_type: "customfield_10100".to_string(),
            escape_bug: "customfield_10101".to_string(),
            customer_impact: "customfield_10102".to_string(),
            customer: "customfield_10103".to_string(),
            severity: "customfield_10104".to_string(),
        }
    }
}

/// Maps raw issues to [`BugRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct RecordMapper {
    fields: CustomFieldIds,
}

impl RecordMapper {
    /// Create a mapper using the given custom field identifiers.
    pub fn new(fields: CustomFieldIds) -> Self {
        Self { fields }
    }

    /// The custom field identifiers in use.
    pub fn fields(&self) -> &CustomFieldIds {
        &self.fields
    }

    /// Map one raw issue.
    ///
    /// # Example
    ///
    /// ```
    /// use bugsift::tracker::RecordMapper;
    /// use serde_json::json;
    ///
    /// let raw = json!({
    ///     "id": "10001",
    ///     "key": "BUG-1",
    ///     "fields": { "summary": "Crash on save", "labels": ["ui"] }
    /// });
    /// let bug = RecordMapper::default().map(&raw);
    /// assert_eq!(bug.key, "BUG-1");
    /// assert_eq!(bug.summary, "Crash on save");
    /// assert_eq!(bug.status, "Unknown");
    /// ```
    pub fn map(&self, raw: &Value) -> BugRecord {
        let empty = Map::new();
        let fields = raw
            .get("fields")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let mut bug = BugRecord::new(
            scalar_text(raw.get("key")).unwrap_or_default(),
            scalar_text(raw.get("id")).unwrap_or_default(),
        );

        bug.summary = scalar_text(fields.get("summary")).unwrap_or_default();
        bug.description = flatten_document(fields.get("description").unwrap_or(&Value::Null));
        bug.status = named(fields.get("status")).unwrap_or_else(|| UNKNOWN.to_string());
        bug.resolution = named(fields.get("resolution"));
        bug.priority = named(fields.get("priority")).unwrap_or_else(|| UNKNOWN.to_string());
        bug.components = list(fields.get("components"))
            .iter()
            .filter_map(|c| named(Some(c)))
            .collect();
        bug.labels = list(fields.get("labels"))
            .iter()
            .filter_map(|l| scalar_text(Some(l)))
            .collect();
        bug.created = scalar_text(fields.get("created")).unwrap_or_default();
        bug.updated = scalar_text(fields.get("updated")).unwrap_or_default();
        bug.reporter = display_name(fields.get("reporter"));
        bug.assignee = display_name(fields.get("assignee"));
        bug.comments = map_comments(fields.get("comment"));

        bug.custom_fields = fields
            .iter()
            .filter(|(id, value)| id.starts_with(CUSTOM_FIELD_PREFIX) && !value.is_null())
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect::<BTreeMap<_, _>>();

        let custom = |id: &str| fields.get(id).filter(|v| !v.is_null());
        bug.failure_type = option_text(custom(&self.fields.failure_type))
            .map(|label| FailureType::from_label(&label));
        bug.is_escape_bug = custom(&self.fields.escape_bug).map(truthy);
        bug.customer_impact = option_text(custom(&self.fields.customer_impact));
        bug.customer = option_text(custom(&self.fields.customer));
        bug.severity = option_text(custom(&self.fields.severity));

        bug
    }
}

/// Flatten a rich document (or plain string) to text.
///
/// A `text` node contributes its literal text, any node with a `content`
/// list contributes its children's text concatenated, and every other node
/// contributes nothing. Top-level children of the root are joined with
/// newlines.
///
/// ```
/// use bugsift::tracker::mapper::flatten_document;
/// use serde_json::json;
///
/// let doc = json!({
///     "type": "doc",
///     "content": [
///         { "type": "paragraph", "content": [
///             { "type": "text", "text": "Steps: " },
///             { "type": "strong", "content": [{ "type": "text", "text": "save" }] }
///         ]},
///         { "type": "paragraph", "content": [{ "type": "text", "text": "Crashes." }] }
///     ]
/// });
/// assert_eq!(flatten_document(&doc), "Steps: save\nCrashes.");
/// ```
pub fn flatten_document(doc: &Value) -> String {
    match doc {
        Value::String(s) => s.clone(),
        Value::Object(node) => match node.get("content").and_then(Value::as_array) {
            Some(children) => children
                .iter()
                .map(node_text)
                .collect::<Vec<_>>()
                .join("\n"),
            None => node_text(doc),
        },
        _ => String::new(),
    }
}

fn node_text(node: &Value) -> String {
    if node.get("type").and_then(Value::as_str) == Some("text") {
        return node
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
    }
    match node.get("content").and_then(Value::as_array) {
        Some(children) => children.iter().map(node_text).collect(),
        None => String::new(),
    }
}

fn map_comments(comment_field: Option<&Value>) -> Vec<Comment> {
    let comments = comment_field.and_then(|c| c.get("comments"));
    list(comments)
        .iter()
        .map(|c| Comment {
            id: scalar_text(c.get("id")).unwrap_or_default(),
            author: display_name(c.get("author")).unwrap_or_else(|| UNKNOWN.to_string()),
            body: flatten_document(c.get("body").unwrap_or(&Value::Null)),
            created: scalar_text(c.get("created")).unwrap_or_default(),
        })
        .collect()
}

fn list(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Strings verbatim, numbers and booleans stringified.
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The `name` of a `{ name: .. }` object. Blank names count as absent.
fn named(value: Option<&Value>) -> Option<String> {
    scalar_text(value?.get("name")).filter(|name| !name.trim().is_empty())
}

fn display_name(value: Option<&Value>) -> Option<String> {
    scalar_text(value?.get("displayName"))
}

/// Text of a custom field value: option objects, scalars, or lists of those.
fn option_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Object(obj) => scalar_text(obj.get("value"))
            .or_else(|| scalar_text(obj.get("name")))
            .or_else(|| scalar_text(obj.get("displayName"))),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(|i| option_text(Some(i))).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        other => scalar_text(Some(other)),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Array(items) => items.iter().any(truthy),
        _ => option_text(Some(value)).is_some_and(|text| {
            matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "yes" | "true" | "y"
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_issue() -> Value {
        json!({
            "id": "10001",
            "key": "BUG-1",
            "fields": {
                "summary": "Login fails",
                "description": {
                    "type": "doc",
                    "version": 1,
                    "content": [
                        { "type": "paragraph", "content": [{ "type": "text", "text": "First" }] },
                        { "type": "paragraph", "content": [{ "type": "text", "text": "Second" }] }
                    ]
                },
                "status": { "name": "Open" },
                "resolution": null,
                "priority": { "name": "High" },
                "components": [{ "name": "Auth" }, { "name": "API" }],
                "labels": ["escape", "login"],
                "created": "2024-01-02T03:04:05.000+0000",
                "updated": "2024-01-03T03:04:05.000+0000",
                "reporter": { "displayName": "Ana" },
                "assignee": null,
                "comment": {
                    "comments": [
                        {
                            "id": "1",
                            "author": { "displayName": "Ben" },
                            "body": { "type": "doc", "content": [
                                { "type": "paragraph", "content": [{ "type": "text", "text": "Repro'd" }] }
                            ]},
                            "created": "2024-01-02T04:00:00.000+0000"
                        },
                        { "id": "2", "body": "plain", "created": "x" }
                    ]
                },
                "customfield_10100": { "value": "Regression" },
                "customfield_10101": [{ "value": "Yes" }],
                "customfield_10102": { "value": "Severe" },
                "customfield_10103": "Acme Corp",
                "customfield_10104": { "value": "S1" },
                "customfield_99999": null,
                "customfield_12345": 42
            }
        })
    }

    #[test]
    fn maps_standard_fields() {
        let bug = RecordMapper::default().map(&full_issue());
        assert_eq!(bug.key, "BUG-1");
        assert_eq!(bug.id, "10001");
        assert_eq!(bug.summary, "Login fails");
        assert_eq!(bug.description, "First\nSecond");
        assert_eq!(bug.status, "Open");
        assert_eq!(bug.resolution, None);
        assert_eq!(bug.priority, "High");
        assert_eq!(bug.components, vec!["Auth", "API"]);
        assert_eq!(bug.labels, vec!["escape", "login"]);
        assert_eq!(bug.created, "2024-01-02T03:04:05.000+0000");
        assert_eq!(bug.reporter.as_deref(), Some("Ana"));
        assert_eq!(bug.assignee, None);
    }

    #[test]
    fn maps_comments_in_order() {
        let bug = RecordMapper::default().map(&full_issue());
        assert_eq!(bug.comments.len(), 2);
        assert_eq!(bug.comments[0].author, "Ben");
        assert_eq!(bug.comments[0].body, "Repro'd");
        assert_eq!(bug.comments[1].author, "Unknown");
        assert_eq!(bug.comments[1].body, "plain");
    }

    #[test]
    fn maps_named_custom_fields() {
        let bug = RecordMapper::default().map(&full_issue());
        assert_eq!(bug.failure_type, Some(FailureType::Regression));
        assert_eq!(bug.is_escape_bug, Some(true));
        assert_eq!(bug.customer_impact.as_deref(), Some("Severe"));
        assert_eq!(bug.customer.as_deref(), Some("Acme Corp"));
        assert_eq!(bug.severity.as_deref(), Some("S1"));
    }

    #[test]
    fn copies_non_null_custom_fields_only() {
        let bug = RecordMapper::default().map(&full_issue());
        assert!(bug.custom_fields.contains_key("customfield_12345"));
        assert!(bug.custom_fields.contains_key("customfield_10100"));
        assert!(!bug.custom_fields.contains_key("customfield_99999"));
        assert!(!bug.custom_fields.contains_key("summary"));
    }

    #[test]
    fn custom_field_ids_are_configurable() {
        let mapper = RecordMapper::new(CustomFieldIds {
            customer: "customfield_12345".to_string(),
            ..CustomFieldIds::default()
        });
        let bug = mapper.map(&full_issue());
        assert_eq!(bug.customer.as_deref(), Some("42"));
    }

    #[test]
    fn empty_input_yields_defaults() {
        let bug = RecordMapper::default().map(&json!({}));
        assert_eq!(bug.key, "");
        assert_eq!(bug.status, "Unknown");
        assert_eq!(bug.priority, "Unknown");
        assert!(bug.components.is_empty());
        assert!(bug.comments.is_empty());
        assert!(bug.is_escape_bug.is_none());
        assert!(bug.failure_type.is_none());
    }

    #[test]
    fn malformed_shapes_do_not_panic() {
        let raw = json!({
            "id": 5,
            "key": ["not", "a", "string"],
            "fields": {
                "components": "Auth",
                "labels": [1, null, "ok"],
                "status": "Open",
                "comment": { "comments": "none" },
                "description": 17
            }
        });
        let bug = RecordMapper::default().map(&raw);
        assert_eq!(bug.id, "5");
        assert_eq!(bug.key, "");
        assert!(bug.components.is_empty());
        assert_eq!(bug.labels, vec!["1", "ok"]);
        assert_eq!(bug.status, "Unknown");
        assert!(bug.comments.is_empty());
        assert_eq!(bug.description, "");
    }

    #[test]
    fn non_object_fields_yield_defaults() {
        let bug = RecordMapper::default().map(&json!({ "key": "A-1", "fields": [] }));
        assert_eq!(bug.key, "A-1");
        assert_eq!(bug.summary, "");
    }

    #[test]
    fn escape_flag_variants() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!("YES")));
        assert!(truthy(&json!({ "value": "true" })));
        assert!(truthy(&json!([{ "value": "No" }, { "value": "Yes" }])));
        assert!(!truthy(&json!("No")));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!([])));
    }

    #[test]
    fn unknown_failure_type_label() {
        let raw = json!({ "fields": { "customfield_10100": { "value": "Cosmic ray" } } });
        let bug = RecordMapper::default().map(&raw);
        assert_eq!(bug.failure_type, Some(FailureType::Unknown));
    }

    mod flatten {
        use super::*;

        #[test]
        fn deep_nesting() {
            let doc = json!({
                "type": "doc",
                "content": [{
                    "type": "bulletList",
                    "content": [{
                        "type": "listItem",
                        "content": [{
                            "type": "paragraph",
                            "content": [
                                { "type": "text", "text": "a" },
                                { "type": "em", "content": [{ "type": "text", "text": "b" }] }
                            ]
                        }]
                    }]
                }]
            });
            assert_eq!(flatten_document(&doc), "ab");
        }

        #[test]
        fn unknown_nodes_are_empty() {
            let doc = json!({
                "type": "doc",
                "content": [
                    { "type": "mediaSingle", "attrs": { "id": "x" } },
                    { "type": "paragraph", "content": [
                        { "type": "hardBreak" },
                        { "type": "text", "text": "kept" }
                    ]}
                ]
            });
            assert_eq!(flatten_document(&doc), "\nkept");
        }

        #[test]
        fn text_node_without_text_is_empty() {
            assert_eq!(flatten_document(&json!({ "type": "text" })), "");
        }

        #[test]
        fn null_and_scalars() {
            assert_eq!(flatten_document(&Value::Null), "");
            assert_eq!(flatten_document(&json!(3)), "");
            assert_eq!(flatten_document(&json!("legacy body")), "legacy body");
        }
    }
}
