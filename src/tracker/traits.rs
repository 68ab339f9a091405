//! tracker::traits
//!
//! Tracker trait definition for reading issues from a remote tracker.
//!
//! # Design
//!
//! The `Tracker` trait is async because every operation is network I/O.
//! It exposes only the endpoints the retrieval engine needs: the IDs-only
//! search, per-issue hydration, saved-filter lookup, and an identity probe
//! used as a connectivity pre-check. The "full record" search mode is not
//! part of the interface.
//!
//! Issue payloads are returned as raw `serde_json::Value` because tracker
//! schemas are heterogeneous; the record mapper is the only place that
//! interprets them.
//!
//! # Example
//!
//! ```ignore
//! use bugsift::tracker::{Tracker, TrackerError};
//!
//! async fn first_page(tracker: &dyn Tracker) -> Result<(), TrackerError> {
//!     let page = tracker.search_ids("type = Bug", 50, None).await?;
//!     for id in &page.issue_ids {
//!         let raw = tracker.issue(id).await?;
//!         println!("{}", raw["key"]);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from tracker operations.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// Credentials were rejected (invalid token, missing permission).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error, or a body that could not be decoded.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl TrackerError {
    /// Whether this error means the credentials were rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, TrackerError::AuthFailed(_))
    }

    /// Whether this error means the tracker could not be reached at all.
    pub fn is_network(&self) -> bool {
        matches!(self, TrackerError::NetworkError(_))
    }
}

/// One page of the IDs-only search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Issue ids in result order
    pub issue_ids: Vec<String>,
    /// Continuation token, absent on the final page
    pub next_page_token: Option<String>,
    /// Whether the tracker flagged this as the final page
    pub is_last: bool,
}

/// A saved filter as listed by filter discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub id: String,
    pub name: String,
}

/// The account the credentials belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerUser {
    pub display_name: String,
    pub email: Option<String>,
}

/// The Tracker trait for reading issues from a remote issue tracker.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: hydration requests run
/// concurrently against a shared reference.
///
/// # Error Handling
///
/// All methods return `Result<T, TrackerError>`. The retrieval engine
/// decides which failures are fatal:
/// - `search_ids` / `filter_jql` failures abort retrieval
/// - `issue` failures skip that single issue
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Get the tracker name (e.g., "jira").
    fn name(&self) -> &'static str;

    /// Return the authenticated account.
    ///
    /// Used as a connectivity and credential pre-check.
    ///
    /// # Errors
    ///
    /// - `AuthFailed` if the credentials are rejected
    /// - `NetworkError` if the tracker cannot be reached
    async fn myself(&self) -> Result<TrackerUser, TrackerError>;

    /// Fetch the stored query text of a saved filter.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the filter doesn't exist or isn't visible
    async fn filter_jql(&self, filter_id: &str) -> Result<String, TrackerError>;

    /// Run one page of the IDs-only search.
    ///
    /// # Arguments
    ///
    /// * `jql` - Query text
    /// * `max_results` - Page size to request
    /// * `next_page_token` - Continuation token from the previous page
    async fn search_ids(
        &self,
        jql: &str,
        max_results: usize,
        next_page_token: Option<&str>,
    ) -> Result<SearchPage, TrackerError>;

    /// Fetch the full field set of one issue.
    async fn issue(&self, issue_id: &str) -> Result<serde_json::Value, TrackerError>;

    /// List saved filters whose name contains `name`.
    async fn search_filters(
        &self,
        name: &str,
        max_results: usize,
    ) -> Result<Vec<SavedFilter>, TrackerError>;
}
