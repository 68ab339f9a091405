//! analysis::mock
//!
//! Scripted completion model for deterministic testing.
//!
//! # Example
//!
//! ```
//! use bugsift::analysis::mock::MockModel;
//! use bugsift::analysis::CompletionModel;
//!
//! # tokio_test::block_on(async {
//! let model = MockModel::replying("{}");
//! assert_eq!(model.complete("prompt").await.unwrap(), "{}");
//! assert_eq!(model.prompts(), vec!["prompt".to_string()]);
//! # });
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{AnalysisError, CompletionModel};

/// Completion model that returns a fixed reply and records prompts.
#[derive(Debug, Clone)]
pub struct MockModel {
    reply: Result<String, AnalysisError>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockModel {
    /// Always reply with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always fail with `error`.
    pub fn failing(error: AnalysisError) -> Self {
        Self {
            reply: Err(error),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionModel for MockModel {
    fn model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failing_model_returns_error_and_records_prompt() {
        let model = MockModel::failing(AnalysisError::Connectivity("down".into()));
        assert!(model.complete("p").await.is_err());
        assert_eq!(model.prompts().len(), 1);
    }
}
