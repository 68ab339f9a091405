//! tracker::retrieval
//!
//! The retrieval engine: resolves a query, pages through IDs-only search
//! results, and hydrates each id into a [`BugRecord`].
//!
//! # State machine
//!
//! 1. **Resolve.** Saved filter id > explicit JQL > project key > all bugs.
//!    A saved filter costs one extra request to read its query text.
//! 2. **Search.** Request `min(50, remaining)` ids per page, passing the
//!    continuation token from the previous page. Pages are sequential.
//! 3. **Hydrate.** Fetch each id's full field set (bounded concurrency,
//!    search order preserved) and run it through the [`RecordMapper`].
//!    A failed hydration is logged and skipped.
//! 4. **Stop** at `max_results`, on the last-page flag, when no token is
//!    returned, or on an empty page.
//!
//! # Failure semantics
//!
//! Retrieval is all-or-nothing: a failed filter lookup or search page
//! discards anything already accumulated and returns an error. Only
//! per-issue hydration failures are tolerated.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::mapper::RecordMapper;
use super::traits::{SavedFilter, Tracker, TrackerError, TrackerUser};
use crate::core::types::BugRecord;

/// Largest page the search endpoint is asked for.
pub const PAGE_SIZE: usize = 50;

/// Default number of concurrent hydration requests.
pub const DEFAULT_HYDRATION_CONCURRENCY: usize = 5;

/// Query text used when no project is given.
const ALL_BUGS_JQL: &str = "type = Bug ORDER BY created DESC";

/// Errors that abort a retrieval call.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The tracker could not be reached.
    #[error("cannot reach tracker: {0}")]
    Connectivity(TrackerError),

    /// The tracker rejected the credentials.
    #[error("tracker rejected credentials: {0}")]
    Auth(TrackerError),

    /// The saved filter id is not a number.
    #[error("invalid filter id '{0}': expected a numeric id")]
    InvalidFilterId(String),

    /// The saved filter's query text could not be read.
    #[error("failed to read saved filter {id}: {source}")]
    FilterLookup {
        id: String,
        #[source]
        source: TrackerError,
    },

    /// A search page request failed.
    #[error("search page {page} failed: {source}")]
    SearchPage {
        /// One-based page number
        page: usize,
        #[source]
        source: TrackerError,
    },
}

impl RetrievalError {
    /// Classify a tracker error from a fatal request.
    fn classify(err: TrackerError, otherwise: impl FnOnce(TrackerError) -> Self) -> Self {
        if err.is_auth() {
            RetrievalError::Auth(err)
        } else if err.is_network() {
            RetrievalError::Connectivity(err)
        } else {
            otherwise(err)
        }
    }
}

/// What to retrieve.
///
/// Exactly one source decides the query sent: a saved filter wins over an
/// explicit query, which wins over a project key. With none of them every
/// bug is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalQuery {
    pub jql: Option<String>,
    pub filter_id: Option<String>,
    pub project: Option<String>,
    pub max_results: usize,
}

impl Default for RetrievalQuery {
    fn default() -> Self {
        Self {
            jql: None,
            filter_id: None,
            project: None,
            max_results: PAGE_SIZE,
        }
    }
}

impl RetrievalQuery {
    /// The query text implied by a project key (or by nothing).
    ///
    /// ```
    /// use bugsift::tracker::RetrievalQuery;
    ///
    /// assert_eq!(
    ///     RetrievalQuery::project_jql(Some("PROJ")),
    ///     "project = \"PROJ\" AND type = Bug ORDER BY created DESC"
    /// );
    /// assert_eq!(
    ///     RetrievalQuery::project_jql(None),
    ///     "type = Bug ORDER BY created DESC"
    /// );
    /// ```
    pub fn project_jql(project: Option<&str>) -> String {
        match project.map(str::trim).filter(|p| !p.is_empty()) {
            Some(key) => format!("project = \"{}\" AND {}", key.replace('"', ""), ALL_BUGS_JQL),
            None => ALL_BUGS_JQL.to_string(),
        }
    }
}

/// Drives a [`Tracker`] through the retrieval state machine.
pub struct Retriever<'a> {
    tracker: &'a dyn Tracker,
    mapper: RecordMapper,
    hydration_concurrency: usize,
}

impl<'a> Retriever<'a> {
    /// Create a retriever with the default mapper and concurrency.
    pub fn new(tracker: &'a dyn Tracker) -> Self {
        Self {
            tracker,
            mapper: RecordMapper::default(),
            hydration_concurrency: DEFAULT_HYDRATION_CONCURRENCY,
        }
    }

    /// Use a specific record mapper.
    pub fn with_mapper(mut self, mapper: RecordMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Bound the number of in-flight hydration requests (minimum 1).
    pub fn with_hydration_concurrency(mut self, limit: usize) -> Self {
        self.hydration_concurrency = limit.max(1);
        self
    }

    /// Check connectivity and credentials.
    ///
    /// Run once before the first real call so that bad credentials are
    /// reported as such rather than looking like an empty result.
    pub async fn test_connection(&self) -> Result<TrackerUser, RetrievalError> {
        self.tracker.myself().await.map_err(|err| {
            if err.is_auth() {
                RetrievalError::Auth(err)
            } else {
                RetrievalError::Connectivity(err)
            }
        })
    }

    /// List saved filters whose name contains `name`.
    pub async fn search_filters(
        &self,
        name: &str,
        max_results: usize,
    ) -> Result<Vec<SavedFilter>, RetrievalError> {
        self.tracker
            .search_filters(name, max_results)
            .await
            .map_err(|err| RetrievalError::classify(err, RetrievalError::Connectivity))
    }

    /// Resolve the query text to send.
    pub async fn resolve_jql(&self, query: &RetrievalQuery) -> Result<String, RetrievalError> {
        if let Some(id) = query.filter_id.as_deref() {
            if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RetrievalError::InvalidFilterId(id.to_string()));
            }
            let jql = self.tracker.filter_jql(id).await.map_err(|err| {
                RetrievalError::classify(err, |source| RetrievalError::FilterLookup {
                    id: id.to_string(),
                    source,
                })
            })?;
            debug!(filter_id = id, %jql, "resolved saved filter");
            return Ok(jql);
        }
        if let Some(jql) = query.jql.as_deref().filter(|q| !q.trim().is_empty()) {
            return Ok(jql.to_string());
        }
        Ok(RetrievalQuery::project_jql(query.project.as_deref()))
    }

    /// Retrieve at most `query.max_results` bugs.
    ///
    /// An empty result is success: the query matched nothing.
    pub async fn fetch(&self, query: &RetrievalQuery) -> Result<Vec<BugRecord>, RetrievalError> {
        if query.max_results == 0 {
            return Ok(Vec::new());
        }

        let jql = self.resolve_jql(query).await?;
        info!(%jql, max_results = query.max_results, "retrieving bugs");

        let mut records: Vec<BugRecord> = Vec::new();
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut token: Option<String> = None;
        let mut page_number = 0;

        loop {
            let remaining = query.max_results - records.len();
            page_number += 1;

            let page = self
                .tracker
                .search_ids(&jql, remaining.min(PAGE_SIZE), token.as_deref())
                .await
                .map_err(|err| {
                    RetrievalError::classify(err, |source| RetrievalError::SearchPage {
                        page: page_number,
                        source,
                    })
                })?;

            debug!(
                page = page_number,
                ids = page.issue_ids.len(),
                is_last = page.is_last,
                "search page received"
            );

            // a tracker that keeps returning empty pages with tokens would loop forever
            if page.issue_ids.is_empty() {
                break;
            }

            let ids: Vec<&str> = page
                .issue_ids
                .iter()
                .take(remaining)
                .map(String::as_str)
                .collect();

            for bug in self.hydrate(&ids).await {
                if records.len() >= query.max_results {
                    break;
                }
                if !seen_keys.insert(bug.key.clone()) {
                    debug!(key = %bug.key, "skipping duplicate issue");
                    continue;
                }
                records.push(bug);
            }

            if records.len() >= query.max_results || page.is_last {
                break;
            }
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        info!(count = records.len(), "retrieval complete");
        Ok(records)
    }

    /// Hydrate ids concurrently, keeping search order and skipping failures.
    async fn hydrate(&self, ids: &[&str]) -> Vec<BugRecord> {
        stream::iter(ids.iter().copied())
            .map(|id| async move { (id, self.tracker.issue(id).await) })
            .buffered(self.hydration_concurrency)
            .filter_map(|(id, result)| async move {
                match result {
                    Ok(raw) => Some(self.mapper.map(&raw)),
                    Err(err) => {
                        warn!(issue_id = id, error = %err, "skipping issue that failed to hydrate");
                        None
                    }
                }
            })
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::mock::{FailOn, MockOperation, MockTracker};
    use crate::tracker::SearchPage;
    use serde_json::json;

    fn issue(id: &str, key: &str) -> serde_json::Value {
        json!({ "id": id, "key": key, "fields": { "summary": format!("bug {}", key) } })
    }

    fn page(ids: &[&str], token: Option<&str>, is_last: bool) -> SearchPage {
        SearchPage {
            issue_ids: ids.iter().map(|s| s.to_string()).collect(),
            next_page_token: token.map(str::to_string),
            is_last,
        }
    }

    fn query(max_results: usize) -> RetrievalQuery {
        RetrievalQuery {
            max_results,
            ..RetrievalQuery::default()
        }
    }

    fn keys(records: &[BugRecord]) -> Vec<&str> {
        records.iter().map(|r| r.key.as_str()).collect()
    }

    mod resolve {
        use super::*;

        #[tokio::test]
        async fn filter_takes_precedence_over_jql() {
            let tracker = MockTracker::new().with_filter("10", "Escapes", "labels = escape");
            let retriever = Retriever::new(&tracker);
            let q = RetrievalQuery {
                filter_id: Some("10".into()),
                jql: Some("project = X".into()),
                project: Some("Y".into()),
                ..query(10)
            };
            assert_eq!(retriever.resolve_jql(&q).await.unwrap(), "labels = escape");
        }

        #[tokio::test]
        async fn jql_takes_precedence_over_project() {
            let tracker = MockTracker::new();
            let retriever = Retriever::new(&tracker);
            let q = RetrievalQuery {
                jql: Some("project = X".into()),
                project: Some("Y".into()),
                ..query(10)
            };
            assert_eq!(retriever.resolve_jql(&q).await.unwrap(), "project = X");
            assert!(tracker.operations().is_empty());
        }

        #[tokio::test]
        async fn project_and_all_bugs() {
            let tracker = MockTracker::new();
            let retriever = Retriever::new(&tracker);
            let q = RetrievalQuery {
                project: Some("PROJ".into()),
                ..query(10)
            };
            assert_eq!(
                retriever.resolve_jql(&q).await.unwrap(),
                "project = \"PROJ\" AND type = Bug ORDER BY created DESC"
            );
            assert_eq!(
                retriever.resolve_jql(&query(10)).await.unwrap(),
                "type = Bug ORDER BY created DESC"
            );
        }

        #[tokio::test]
        async fn blank_jql_falls_through() {
            let tracker = MockTracker::new();
            let retriever = Retriever::new(&tracker);
            let q = RetrievalQuery {
                jql: Some("   ".into()),
                ..query(10)
            };
            assert_eq!(
                retriever.resolve_jql(&q).await.unwrap(),
                "type = Bug ORDER BY created DESC"
            );
        }

        #[tokio::test]
        async fn non_numeric_filter_id_is_rejected() {
            let tracker = MockTracker::new().with_filter("10", "Bugs", "type = Bug");
            let retriever = Retriever::new(&tracker);
            for id in ["../myself", "10/../../myself", "", "10 "] {
                let q = RetrievalQuery {
                    filter_id: Some(id.into()),
                    ..query(10)
                };
                let err = retriever.fetch(&q).await.unwrap_err();
                assert!(
                    matches!(err, RetrievalError::InvalidFilterId(ref got) if got == id),
                    "{:?}",
                    err
                );
            }
            assert!(tracker.operations().is_empty());
        }

        #[tokio::test]
        async fn missing_filter_is_fatal() {
            let tracker = MockTracker::new();
            let retriever = Retriever::new(&tracker);
            let q = RetrievalQuery {
                filter_id: Some("404".into()),
                ..query(10)
            };
            let err = retriever.fetch(&q).await.unwrap_err();
            assert!(matches!(err, RetrievalError::FilterLookup { ref id, .. } if id == "404"));
        }
    }

    #[tokio::test]
    async fn hydration_failure_is_skipped() {
        let tracker = MockTracker::new()
            .with_page(page(&["1", "2"], None, true))
            .with_issue("1", issue("1", "BUG-1"))
            .with_issue("2", issue("2", "BUG-2"))
            .fail_on(FailOn::Issue(
                "2".into(),
                TrackerError::ApiError {
                    status: 500,
                    message: "boom".into(),
                },
            ));

        let records = Retriever::new(&tracker).fetch(&query(50)).await.unwrap();
        assert_eq!(keys(&records), vec!["BUG-1"]);
    }

    #[tokio::test]
    async fn one_of_three_failing_returns_other_two() {
        let tracker = MockTracker::new()
            .with_page(page(&["1", "2", "3"], None, true))
            .with_issue("1", issue("1", "BUG-1"))
            .with_issue("3", issue("3", "BUG-3"));

        let records = Retriever::new(&tracker).fetch(&query(50)).await.unwrap();
        assert_eq!(keys(&records), vec!["BUG-1", "BUG-3"]);
    }

    #[tokio::test]
    async fn stops_on_last_page_flag_even_with_token() {
        let tracker = MockTracker::new()
            .with_page(page(&["1"], Some("more"), true))
            .with_page(page(&["2"], None, true))
            .with_issue("1", issue("1", "BUG-1"))
            .with_issue("2", issue("2", "BUG-2"));

        let records = Retriever::new(&tracker).fetch(&query(50)).await.unwrap();
        assert_eq!(keys(&records), vec!["BUG-1"]);
        assert_eq!(tracker.requested_page_sizes().len(), 1);
    }

    #[tokio::test]
    async fn stops_when_no_token() {
        let tracker = MockTracker::new()
            .with_page(page(&["1"], None, false))
            .with_page(page(&["2"], None, true))
            .with_issue("1", issue("1", "BUG-1"))
            .with_issue("2", issue("2", "BUG-2"));

        let records = Retriever::new(&tracker).fetch(&query(50)).await.unwrap();
        assert_eq!(keys(&records), vec!["BUG-1"]);
    }

    #[tokio::test]
    async fn follows_continuation_tokens() {
        let tracker = MockTracker::new()
            .with_page(page(&["1"], Some("t1"), false))
            .with_page(page(&["2"], Some("t2"), false))
            .with_page(page(&["3"], None, true))
            .with_issue("1", issue("1", "BUG-1"))
            .with_issue("2", issue("2", "BUG-2"))
            .with_issue("3", issue("3", "BUG-3"));

        let records = Retriever::new(&tracker).fetch(&query(50)).await.unwrap();
        assert_eq!(keys(&records), vec!["BUG-1", "BUG-2", "BUG-3"]);

        let tokens: Vec<Option<String>> = tracker
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::SearchIds {
                    next_page_token, ..
                } => Some(next_page_token),
                _ => None,
            })
            .collect();
        assert_eq!(tokens, vec![None, Some("t1".into()), Some("t2".into())]);
    }

    #[tokio::test]
    async fn max_results_bounds_output_and_page_size() {
        let ids: Vec<String> = (1..=60).map(|i| i.to_string()).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut tracker = MockTracker::new()
            .with_page(page(&id_refs[..50], Some("t1"), false))
            .with_page(page(&id_refs[50..], None, true));
        for id in &ids {
            tracker = tracker.with_issue(id.clone(), issue(id, &format!("BUG-{}", id)));
        }

        let records = Retriever::new(&tracker).fetch(&query(55)).await.unwrap();
        assert_eq!(records.len(), 55);
        assert_eq!(tracker.requested_page_sizes(), vec![50, 5]);
        assert_eq!(tracker.issue_requests(), 55);
    }

    #[tokio::test]
    async fn oversized_page_is_truncated_before_hydration() {
        let tracker = MockTracker::new()
            .with_page(page(&["1", "2", "3"], Some("more"), false))
            .with_issue("1", issue("1", "BUG-1"))
            .with_issue("2", issue("2", "BUG-2"))
            .with_issue("3", issue("3", "BUG-3"));

        let records = Retriever::new(&tracker).fetch(&query(2)).await.unwrap();
        assert_eq!(keys(&records), vec!["BUG-1", "BUG-2"]);
        assert_eq!(tracker.issue_requests(), 2);
    }

    #[tokio::test]
    async fn zero_max_results_makes_no_requests() {
        let tracker = MockTracker::new();
        let records = Retriever::new(&tracker).fetch(&query(0)).await.unwrap();
        assert!(records.is_empty());
        assert!(tracker.operations().is_empty());
    }

    #[tokio::test]
    async fn empty_page_with_token_stops() {
        let tracker = MockTracker::new()
            .with_page(page(&["1"], Some("t1"), false))
            .with_page(page(&[], Some("t2"), false))
            .with_page(page(&["3"], None, true))
            .with_issue("1", issue("1", "BUG-1"))
            .with_issue("3", issue("3", "BUG-3"));
        let records = Retriever::new(&tracker).fetch(&query(10)).await.unwrap();
        assert_eq!(keys(&records), vec!["BUG-1"]);
    }

    #[tokio::test]
    async fn empty_result_is_success() {
        let tracker = MockTracker::new();
        let records = Retriever::new(&tracker).fetch(&query(10)).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn search_page_failure_discards_partial_results() {
        let tracker = MockTracker::new()
            .with_page(page(&["1"], Some("t1"), false))
            .with_issue("1", issue("1", "BUG-1"))
            .fail_on(FailOn::SearchPage(
                1,
                TrackerError::ApiError {
                    status: 400,
                    message: "bad".into(),
                },
            ));

        let err = Retriever::new(&tracker).fetch(&query(10)).await.unwrap_err();
        assert!(matches!(err, RetrievalError::SearchPage { page: 2, .. }));
    }

    #[tokio::test]
    async fn search_auth_failure_is_auth_error() {
        let tracker = MockTracker::new().fail_on(FailOn::SearchPage(
            0,
            TrackerError::AuthFailed("expired".into()),
        ));
        let err = Retriever::new(&tracker).fetch(&query(10)).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Auth(_)));
    }

    #[tokio::test]
    async fn duplicate_keys_are_dropped() {
        let tracker = MockTracker::new()
            .with_page(page(&["1"], Some("t1"), false))
            .with_page(page(&["1", "2"], None, true))
            .with_issue("1", issue("1", "BUG-1"))
            .with_issue("2", issue("2", "BUG-2"));

        let records = Retriever::new(&tracker).fetch(&query(10)).await.unwrap();
        assert_eq!(keys(&records), vec!["BUG-1", "BUG-2"]);
    }

    #[tokio::test]
    async fn sequential_hydration_preserves_order() {
        let tracker = MockTracker::new()
            .with_page(page(&["3", "1", "2"], None, true))
            .with_issue("1", issue("1", "BUG-1"))
            .with_issue("2", issue("2", "BUG-2"))
            .with_issue("3", issue("3", "BUG-3"));

        let records = Retriever::new(&tracker)
            .with_hydration_concurrency(0)
            .fetch(&query(10))
            .await
            .unwrap();
        assert_eq!(keys(&records), vec!["BUG-3", "BUG-1", "BUG-2"]);
    }

    mod connection {
        use super::*;

        #[tokio::test]
        async fn success_returns_user() {
            let tracker = MockTracker::new();
            let user = Retriever::new(&tracker).test_connection().await.unwrap();
            assert_eq!(user.display_name, "Mock User");
        }

        #[tokio::test]
        async fn auth_failure_is_distinguished() {
            let tracker =
                MockTracker::new().fail_on(FailOn::Myself(TrackerError::AuthFailed("x".into())));
            let err = Retriever::new(&tracker).test_connection().await.unwrap_err();
            assert!(matches!(err, RetrievalError::Auth(_)));
        }

        #[tokio::test]
        async fn other_failures_are_connectivity() {
            let tracker = MockTracker::new().fail_on(FailOn::Myself(TrackerError::NetworkError(
                "refused".into(),
            )));
            let err = Retriever::new(&tracker).test_connection().await.unwrap_err();
            assert!(matches!(err, RetrievalError::Connectivity(_)));
        }
    }
}
