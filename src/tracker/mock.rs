//! tracker::mock
//!
//! Mock tracker implementation for deterministic testing.
//!
//! # Design
//!
//! The mock serves scripted search pages in order, hydrates issues from an
//! in-memory map, and can be told to fail specific calls. Every call is
//! recorded so tests can assert on request volume and page sizes.
//!
//! # Example
//!
//! ```
//! use bugsift::tracker::mock::MockTracker;
//! use bugsift::tracker::{SearchPage, Tracker};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let tracker = MockTracker::new()
//!     .with_page(SearchPage {
//!         issue_ids: vec!["1".into()],
//!         next_page_token: None,
//!         is_last: true,
//!     })
//!     .with_issue("1", json!({ "id": "1", "key": "BUG-1" }));
//!
//! let page = tracker.search_ids("type = Bug", 50, None).await.unwrap();
//! assert_eq!(page.issue_ids, vec!["1"]);
//! let raw = tracker.issue("1").await.unwrap();
//! assert_eq!(raw["key"], "BUG-1");
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::traits::{SavedFilter, SearchPage, Tracker, TrackerError, TrackerUser};

/// Mock tracker for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockTracker {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockTrackerInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockTrackerInner {
    /// Search pages served in call order.
    pages: Vec<SearchPage>,
    /// Number of search calls served so far.
    search_calls: usize,
    /// Raw issues by id.
    issues: HashMap<String, serde_json::Value>,
    /// Saved filter query text by filter id.
    filter_jql: HashMap<String, String>,
    /// Saved filters returned by discovery.
    saved_filters: Vec<SavedFilter>,
    /// Failures to inject.
    fail_on: Vec<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which call should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail `myself` with the given error.
    Myself(TrackerError),
    /// Fail `filter_jql` with the given error.
    FilterJql(TrackerError),
    /// Fail the search call with this zero-based index.
    SearchPage(usize, TrackerError),
    /// Fail hydration of this issue id.
    Issue(String, TrackerError),
    /// Fail `search_filters` with the given error.
    SearchFilters(TrackerError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Myself,
    FilterJql {
        filter_id: String,
    },
    SearchIds {
        jql: String,
        max_results: usize,
        next_page_token: Option<String>,
    },
    Issue {
        issue_id: String,
    },
    SearchFilters {
        name: String,
        max_results: usize,
    },
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTracker {
    /// Create a new empty mock tracker.
    ///
    /// With no pages configured, every search returns an empty final page.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTrackerInner::default())),
        }
    }

    /// Append a search page to serve.
    pub fn with_page(self, page: SearchPage) -> Self {
        self.inner.lock().unwrap().pages.push(page);
        self
    }

    /// Register a raw issue for hydration.
    pub fn with_issue(self, issue_id: impl Into<String>, raw: serde_json::Value) -> Self {
        self.inner
            .lock()
            .unwrap()
            .issues
            .insert(issue_id.into(), raw);
        self
    }

    /// Register a saved filter with its query text.
    pub fn with_filter(
        self,
        filter_id: impl Into<String>,
        name: impl Into<String>,
        jql: impl Into<String>,
    ) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let id = filter_id.into();
            inner.filter_jql.insert(id.clone(), jql.into());
            inner.saved_filters.push(SavedFilter {
                id,
                name: name.into(),
            });
        }
        self
    }

    /// Configure a call to fail. May be called repeatedly.
    ///
    /// # Example
    ///
    /// ```
    /// use bugsift::tracker::mock::{MockTracker, FailOn};
    /// use bugsift::tracker::TrackerError;
    ///
    /// let tracker = MockTracker::new()
    ///     .fail_on(FailOn::Myself(TrackerError::AuthFailed("bad token".into())));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.inner.lock().unwrap().fail_on.push(fail_on);
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Number of hydration requests made.
    pub fn issue_requests(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::Issue { .. }))
            .count()
    }

    /// Page sizes requested by each search call, in order.
    pub fn requested_page_sizes(&self) -> Vec<usize> {
        self.operations()
            .iter()
            .filter_map(|op| match op {
                MockOperation::SearchIds { max_results, .. } => Some(*max_results),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: MockOperation) {
        self.inner.lock().unwrap().operations.push(op);
    }

    fn find_failure(&self, pred: impl Fn(&FailOn) -> Option<TrackerError>) -> Option<TrackerError> {
        self.inner.lock().unwrap().fail_on.iter().find_map(pred)
    }
}

#[async_trait]
impl Tracker for MockTracker {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn myself(&self) -> Result<TrackerUser, TrackerError> {
        self.record(MockOperation::Myself);
        if let Some(err) = self.find_failure(|f| match f {
            FailOn::Myself(e) => Some(e.clone()),
            _ => None,
        }) {
            return Err(err);
        }
        Ok(TrackerUser {
            display_name: "Mock User".to_string(),
            email: Some("mock@example.com".to_string()),
        })
    }

    async fn filter_jql(&self, filter_id: &str) -> Result<String, TrackerError> {
        self.record(MockOperation::FilterJql {
            filter_id: filter_id.to_string(),
        });
        if let Some(err) = self.find_failure(|f| match f {
            FailOn::FilterJql(e) => Some(e.clone()),
            _ => None,
        }) {
            return Err(err);
        }
        self.inner
            .lock()
            .unwrap()
            .filter_jql
            .get(filter_id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("filter {}", filter_id)))
    }

    async fn search_ids(
        &self,
        jql: &str,
        max_results: usize,
        next_page_token: Option<&str>,
    ) -> Result<SearchPage, TrackerError> {
        self.record(MockOperation::SearchIds {
            jql: jql.to_string(),
            max_results,
            next_page_token: next_page_token.map(str::to_string),
        });

        let mut inner = self.inner.lock().unwrap();
        let index = inner.search_calls;
        inner.search_calls += 1;

        let failure = inner.fail_on.iter().find_map(|f| match f {
            FailOn::SearchPage(i, e) if *i == index => Some(e.clone()),
            _ => None,
        });
        if let Some(err) = failure {
            return Err(err);
        }

        Ok(inner.pages.get(index).cloned().unwrap_or(SearchPage {
            issue_ids: Vec::new(),
            next_page_token: None,
            is_last: true,
        }))
    }

    async fn issue(&self, issue_id: &str) -> Result<serde_json::Value, TrackerError> {
        self.record(MockOperation::Issue {
            issue_id: issue_id.to_string(),
        });
        if let Some(err) = self.find_failure(|f| match f {
            FailOn::Issue(id, e) if id == issue_id => Some(e.clone()),
            _ => None,
        }) {
            return Err(err);
        }
        self.inner
            .lock()
            .unwrap()
            .issues
            .get(issue_id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("issue {}", issue_id)))
    }

    async fn search_filters(
        &self,
        name: &str,
        max_results: usize,
    ) -> Result<Vec<SavedFilter>, TrackerError> {
        self.record(MockOperation::SearchFilters {
            name: name.to_string(),
            max_results,
        });
        if let Some(err) = self.find_failure(|f| match f {
            FailOn::SearchFilters(e) => Some(e.clone()),
            _ => None,
        }) {
            return Err(err);
        }
        let needle = name.to_lowercase();
        Ok(self
            .inner
            .lock()
            .unwrap()
            .saved_filters
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .take(max_results)
            .cloned()
            .collect())
    }
}
