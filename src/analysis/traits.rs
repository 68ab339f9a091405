//! analysis::traits
//!
//! Completion model trait and analysis errors.
//!
//! # Design
//!
//! Analysis needs exactly one capability from an LLM service: send one
//! user-role prompt, get one text reply back. Model identifier and output
//! token bound are fixed at construction time, not per call.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from an analysis call.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// The reply was not a JSON object after stripping code fences.
    #[error("could not parse analysis response: {0}")]
    Parse(String),

    /// The model service could not be reached.
    #[error("cannot reach model service: {0}")]
    Connectivity(String),

    /// The model service rejected the API key.
    #[error("model service rejected credentials: {0}")]
    Auth(String),

    /// Rate limit exceeded.
    #[error("model service rate limited: {0}")]
    RateLimited(String),

    /// The service returned an error status.
    #[error("model service error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// The reply contained no text.
    #[error("model returned an empty response")]
    EmptyResponse,
}

/// A text-completion backend.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Send one user-role prompt and return the reply text.
    ///
    /// # Errors
    ///
    /// - `Connectivity` on transport failure
    /// - `Auth` if the key is rejected
    /// - `Api` / `RateLimited` for error statuses
    /// - `EmptyResponse` if the reply carries no text
    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError>;
}
