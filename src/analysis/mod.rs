//! analysis
//!
//! Pattern analysis of bug records through a completion model.
//!
//! # Architecture
//!
//! ```text
//! records ──► prompt::build ──► CompletionModel::complete ──► normalize ──► PatternReport
//! ```
//!
//! # Modules
//!
//! - `traits`: `CompletionModel` trait and [`AnalysisError`]
//! - [`anthropic`]: Anthropic Messages API client
//! - [`mock`]: Scripted model for deterministic testing
//! - [`prompt`]: Prompt construction
//! - [`normalize`]: Reply parsing and defaulting
//!
//! # Example
//!
//! ```
//! use bugsift::analysis::{mock::MockModel, Analyzer};
//! use bugsift::core::types::{AnalysisMode, BugRecord};
//!
//! # tokio_test::block_on(async {
//! let model = MockModel::replying(r#"{"summary": "one flaky area"}"#);
//! let analyzer = Analyzer::new(&model);
//! let report = analyzer
//!     .analyze(&[BugRecord::new("BUG-1", "1")], AnalysisMode::All)
//!     .await
//!     .unwrap();
//! assert_eq!(report.summary, "one flaky area");
//! assert_eq!(report.total_bugs, 1);
//! # });
//! ```

pub mod anthropic;
pub mod mock;
pub mod normalize;
pub mod prompt;
mod traits;

pub use traits::*;

use tracing::{debug, info};

use crate::core::report::PatternReport;
use crate::core::types::{AnalysisMode, BugRecord};

/// Runs one analysis call against a completion model.
pub struct Analyzer<'a> {
    model: &'a dyn CompletionModel,
}

impl<'a> Analyzer<'a> {
    pub fn new(model: &'a dyn CompletionModel) -> Self {
        Self { model }
    }

    /// Analyze `records` and return the normalized report.
    ///
    /// An empty record list yields an empty report without calling the
    /// model.
    ///
    /// # Errors
    ///
    /// Any error from the model, or [`AnalysisError::Parse`] if the reply is
    /// not a JSON object.
    pub async fn analyze(
        &self,
        records: &[BugRecord],
        mode: AnalysisMode,
    ) -> Result<PatternReport, AnalysisError> {
        if records.is_empty() {
            debug!("no records to analyze");
            return Ok(PatternReport::empty(mode));
        }

        let prompt = prompt::build(records, mode);
        info!(
            model = self.model.model(),
            bugs = records.len(),
            %mode,
            "requesting pattern analysis"
        );
        let reply = self.model.complete(&prompt).await?;
        debug!(reply_chars = reply.len(), "normalizing analysis reply");

        normalize::normalize(&reply, records, mode)
    }
}
