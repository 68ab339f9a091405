//! bugsift - Find root-cause and test-gap patterns in issue-tracker bugs
//!
//! bugsift pulls bug records out of Jira, sends them to a language model in
//! a single analysis request, and turns the reply into a typed pattern
//! report: root-cause clusters, component hotspots, testing gaps, risk
//! scores, regressions, and prioritized recommendations.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, wires clients)
//! - [`tracker`] - Paginated search and per-issue hydration against Jira
//! - [`analysis`] - Prompt construction, model client, reply normalization
//! - [`core`] - Records, reports, configuration and credentials
//! - [`secrets`] - Secret storage for tokens and API keys
//! - [`ui`] - Terminal output, prompts, and report rendering
//!
//! # Guarantees
//!
//! 1. A report is always fully populated; missing or malformed reply
//!    fields fall back to defaults instead of failing the run
//! 2. Retrieval never returns more records than requested
//! 3. One unreadable issue is skipped, not fatal
//! 4. Secrets are never logged or printed

pub mod analysis;
pub mod cli;
pub mod core;
pub mod secrets;
pub mod tracker;
pub mod ui;
