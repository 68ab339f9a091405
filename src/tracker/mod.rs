//! tracker
//!
//! Reading bug records from a remote issue tracker.
//!
//! # Architecture
//!
//! The `Tracker` trait defines the handful of endpoints retrieval needs.
//! The [`Retriever`] drives any tracker through the search-then-hydrate
//! state machine and hands each raw issue to the [`RecordMapper`].
//!
//! # Modules
//!
//! - `traits`: Core `Tracker` trait and request/response types
//! - [`jira`]: Jira Cloud implementation over REST
//! - [`mock`]: Mock implementation for deterministic testing
//! - [`mapper`]: Raw issue JSON to [`BugRecord`](crate::core::types::BugRecord)
//! - [`retrieval`]: Query resolution, pagination and hydration
//!
//! # Example
//!
//! ```ignore
//! use bugsift::tracker::{jira::JiraTracker, RetrievalQuery, Retriever};
//!
//! let tracker = JiraTracker::new("https://acme.atlassian.net", email, token)?;
//! let retriever = Retriever::new(&tracker);
//! retriever.test_connection().await?;
//!
//! let bugs = retriever
//!     .fetch(&RetrievalQuery {
//!         project: Some("PROJ".to_string()),
//!         max_results: 100,
//!         ..RetrievalQuery::default()
//!     })
//!     .await?;
//! ```

pub mod jira;
pub mod mapper;
pub mod mock;
pub mod retrieval;
mod traits;

pub use mapper::{CustomFieldIds, RecordMapper};
pub use retrieval::{RetrievalError, RetrievalQuery, Retriever};
pub use traits::*;
