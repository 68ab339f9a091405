//! tracker::jira
//!
//! Jira Cloud tracker implementation using the REST v3 API.
//!
//! # Design
//!
//! This module implements the `Tracker` trait for Jira. Search always uses
//! the IDs-only `/search/jql` endpoint followed by one `/issue/{id}` request
//! per result; the full-record search mode is rejected outright by some
//! deployments, so it is never used.
//!
//! # Authentication
//!
//! Every request carries HTTP Basic auth built from the account email and
//! an API token. Credentials are supplied by the caller; this module does
//! not read the environment or any files.
//!
//! # Rate Limiting
//!
//! Returns `TrackerError::RateLimited` on HTTP 429. No automatic retry.
//!
//! # Example
//!
//! ```ignore
//! use bugsift::tracker::jira::JiraTracker;
//! use bugsift::tracker::Tracker;
//!
//! let tracker = JiraTracker::new("https://acme.atlassian.net", "me@acme.com", token)?;
//! let me = tracker.myself().await?;
//! println!("Connected as {}", me.display_name);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::traits::{SavedFilter, SearchPage, Tracker, TrackerError, TrackerUser};

/// REST API path appended to the site URL.
const API_PATH: &str = "/rest/api/3";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "bugsift-cli";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Jira tracker implementation.
pub struct JiraTracker {
    /// HTTP client for making requests
    client: Client,
    /// REST base, e.g. `https://acme.atlassian.net/rest/api/3`
    api_base: String,
    /// Account email (Basic auth user)
    email: String,
    /// API token (Basic auth password)
    api_token: String,
}

// Custom Debug to avoid exposing api_token
impl std::fmt::Debug for JiraTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraTracker")
            .field("api_base", &self.api_base)
            .field("email", &self.email)
            .field("has_api_token", &!self.api_token.is_empty())
            .finish()
    }
}

impl JiraTracker {
    /// Create a tracker for a Jira site with the default timeout.
    ///
    /// # Arguments
    ///
    /// * `site_url` - Site root, e.g. `https://acme.atlassian.net`
    /// * `email` - Account email
    /// * `api_token` - API token for that account
    pub fn new(
        site_url: &str,
        email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self, TrackerError> {
        Self::with_timeout(site_url, email, api_token, DEFAULT_TIMEOUT)
    }

    /// Create a tracker with an explicit request timeout.
    pub fn with_timeout(
        site_url: &str,
        email: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers())
            .build()
            .map_err(|e| TrackerError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base_for(site_url),
            email: email.into(),
            api_token: api_token.into(),
        })
    }

    /// The REST base URL requests are built from.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build a GET request with auth applied.
    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.api_base, path))
            .basic_auth(&self.email, Some(&self.api_token))
    }

    /// Send a request and decode a JSON body.
    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, TrackerError> {
        let response = request
            .send()
            .await
            .map_err(|e| TrackerError::NetworkError(e.to_string()))?;
        self.handle_response(response).await
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, TrackerError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| TrackerError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(self.error_from_response(response, status).await)
        }
    }

    /// Map an error response to a `TrackerError`.
    async fn error_from_response(&self, response: Response, status: StatusCode) -> TrackerError {
        let message = match response.json::<JiraErrorResponse>().await {
            Ok(err) => err.message(),
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => {
                TrackerError::AuthFailed("Invalid email or API token".into())
            }
            StatusCode::FORBIDDEN => {
                TrackerError::AuthFailed(format!("Permission denied: {}", message))
            }
            StatusCode::NOT_FOUND => TrackerError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => TrackerError::RateLimited,
            _ if status.is_server_error() => TrackerError::ApiError {
                status: status.as_u16(),
                message: format!("Jira server error: {}", message),
            },
            _ => TrackerError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl Tracker for JiraTracker {
    fn name(&self) -> &'static str {
        "jira"
    }

    async fn myself(&self) -> Result<TrackerUser, TrackerError> {
        let user: JiraUser = self.send(self.get("/myself")).await?;
        Ok(TrackerUser {
            display_name: user.display_name.unwrap_or_default(),
            email: user.email_address,
        })
    }

    async fn filter_jql(&self, filter_id: &str) -> Result<String, TrackerError> {
        let request = self
            .get(&format!("/filter/{}", filter_id))
            .query(&[("expand", "jql")]);
        let filter: JiraFilter = self.send(request).await?;
        filter.jql.ok_or_else(|| TrackerError::ApiError {
            status: 200,
            message: format!("filter {} has no query text", filter_id),
        })
    }

    async fn search_ids(
        &self,
        jql: &str,
        max_results: usize,
        next_page_token: Option<&str>,
    ) -> Result<SearchPage, TrackerError> {
        let max = max_results.to_string();
        let mut query: Vec<(&str, &str)> = vec![("jql", jql), ("maxResults", max.as_str())];
        if let Some(token) = next_page_token {
            query.push(("nextPageToken", token));
        }

        debug!(max_results, has_token = next_page_token.is_some(), "searching issue ids");
        let page: JiraSearchPage = self.send(self.get("/search/jql").query(&query)).await?;
        Ok(page.into())
    }

    async fn issue(&self, issue_id: &str) -> Result<serde_json::Value, TrackerError> {
        let request = self
            .get(&format!("/issue/{}", issue_id))
            .query(&[("fields", "*all")]);
        self.send(request).await
    }

    async fn search_filters(
        &self,
        name: &str,
        max_results: usize,
    ) -> Result<Vec<SavedFilter>, TrackerError> {
        let max = max_results.to_string();
        let request = self
            .get("/filter/search")
            .query(&[("filterName", name), ("maxResults", max.as_str())]);
        let page: JiraFilterPage = self.send(request).await?;
        Ok(page
            .values
            .into_iter()
            .map(|f| SavedFilter {
                id: f.id.into_string(),
                name: f.name,
            })
            .collect())
    }
}

/// Normalize a site URL into the REST base.
///
/// Accepts the bare site (`https://acme.atlassian.net`), a trailing slash,
/// or a URL that already includes the API path.
///
/// ```
/// use bugsift::tracker::jira::api_base_for;
///
/// assert_eq!(
///     api_base_for("https://acme.atlassian.net/"),
///     "https://acme.atlassian.net/rest/api/3"
/// );
/// assert_eq!(
///     api_base_for("https://acme.atlassian.net/rest/api/3"),
///     "https://acme.atlassian.net/rest/api/3"
/// );
/// ```
pub fn api_base_for(site_url: &str) -> String {
    let trimmed = site_url.trim().trim_end_matches('/');
    if trimmed.ends_with(API_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, API_PATH)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers
}

// --------------------------------------------------------------------------
// API Response Types
// --------------------------------------------------------------------------

/// Jira ids arrive as strings on most endpoints but numbers on some.
#[derive(Deserialize)]
#[serde(untagged)]
enum JiraId {
    Text(String),
    Number(u64),
}

impl JiraId {
    fn into_string(self) -> String {
        match self {
            JiraId::Text(s) => s,
            JiraId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraUser {
    display_name: Option<String>,
    email_address: Option<String>,
}

#[derive(Deserialize)]
struct JiraFilter {
    jql: Option<String>,
}

#[derive(Deserialize)]
struct JiraIssueRef {
    id: JiraId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraSearchPage {
    #[serde(default)]
    issues: Vec<JiraIssueRef>,
    next_page_token: Option<String>,
    #[serde(default)]
    is_last: bool,
}

impl From<JiraSearchPage> for SearchPage {
    fn from(page: JiraSearchPage) -> Self {
        SearchPage {
            issue_ids: page
                .issues
                .into_iter()
                .map(|issue| issue.id.into_string())
                .collect(),
            next_page_token: page.next_page_token.filter(|t| !t.is_empty()),
            is_last: page.is_last,
        }
    }
}

#[derive(Deserialize)]
struct JiraFilterSummary {
    id: JiraId,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct JiraFilterPage {
    #[serde(default)]
    values: Vec<JiraFilterSummary>,
}

/// Jira error body: `{"errorMessages": [...], "errors": {...}}`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraErrorResponse {
    #[serde(default)]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: std::collections::BTreeMap<String, String>,
}

impl JiraErrorResponse {
    fn message(self) -> String {
        let mut parts = self.error_messages;
        parts.extend(self.errors.into_iter().map(|(k, v)| format!("{}: {}", k, v)));
        if parts.is_empty() {
            "Unknown error".to_string()
        } else {
            parts.join("; ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod api_base {
        use super::*;

        #[test]
        fn appends_api_path() {
            assert_eq!(
                api_base_for("https://acme.atlassian.net"),
                "https://acme.atlassian.net/rest/api/3"
            );
        }

        #[test]
        fn strips_trailing_slashes_and_whitespace() {
            assert_eq!(
                api_base_for("  https://acme.atlassian.net//  "),
                "https://acme.atlassian.net/rest/api/3"
            );
        }

        #[test]
        fn keeps_existing_api_path() {
            assert_eq!(
                api_base_for("http://localhost:8080/rest/api/3/"),
                "http://localhost:8080/rest/api/3"
            );
        }
    }

    mod construction {
        use super::*;

        #[test]
        fn new_creates_tracker() {
            let tracker = JiraTracker::new("https://acme.atlassian.net", "me@acme.com", "secret")
                .unwrap();
            assert_eq!(tracker.name(), "jira");
            assert_eq!(tracker.api_base(), "https://acme.atlassian.net/rest/api/3");
        }

        #[test]
        fn debug_redacts_token() {
            let tracker =
                JiraTracker::new("https://acme.atlassian.net", "me@acme.com", "super-secret")
                    .unwrap();
            let debug = format!("{:?}", tracker);
            assert!(!debug.contains("super-secret"));
            assert!(debug.contains("has_api_token: true"));
            assert!(debug.contains("me@acme.com"));
        }
    }

    mod response_types {
        use super::*;

        #[test]
        fn search_page_with_numeric_and_string_ids() {
            let page: JiraSearchPage = serde_json::from_value(serde_json::json!({
                "issues": [{ "id": "1" }, { "id": 2 }],
                "nextPageToken": "abc",
                "isLast": false
            }))
            .unwrap();
            let page: SearchPage = page.into();
            assert_eq!(page.issue_ids, vec!["1", "2"]);
            assert_eq!(page.next_page_token.as_deref(), Some("abc"));
            assert!(!page.is_last);
        }

        #[test]
        fn search_page_missing_fields_defaults() {
            let page: JiraSearchPage = serde_json::from_value(serde_json::json!({})).unwrap();
            let page: SearchPage = page.into();
            assert!(page.issue_ids.is_empty());
            assert!(page.next_page_token.is_none());
            assert!(!page.is_last);
        }

        #[test]
        fn empty_token_is_treated_as_absent() {
            let page: JiraSearchPage =
                serde_json::from_value(serde_json::json!({ "issues": [], "nextPageToken": "" }))
                    .unwrap();
            let page: SearchPage = page.into();
            assert!(page.next_page_token.is_none());
        }

        #[test]
        fn error_response_message_joins_parts() {
            let err: JiraErrorResponse = serde_json::from_value(serde_json::json!({
                "errorMessages": ["Field 'x' does not exist"],
                "errors": { "jql": "bad query" }
            }))
            .unwrap();
            assert_eq!(err.message(), "Field 'x' does not exist; jql: bad query");
        }

        #[test]
        fn error_response_empty_message() {
            let err: JiraErrorResponse = serde_json::from_value(serde_json::json!({})).unwrap();
            assert_eq!(err.message(), "Unknown error");
        }
    }
}
