//! secrets
//!
//! Storage for tracker and model credentials.
//!
//! # Architecture
//!
//! Secrets are stored through the [`SecretStore`] trait. The only provider
//! is [`FileSecretStore`], a TOML file at `~/.bugsift/secrets.toml`.
//! Resolution order (environment, config, store) lives in
//! [`crate::core::credentials`].
//!
//! # Security
//!
//! - Secrets are **never** logged or included in error messages
//! - The file is created with 0600 permissions on Unix
//! - All writes are atomic (temp file + rename)

mod file_store;
mod traits;

pub use file_store::FileSecretStore;
pub use traits::{SecretError, SecretStore};

/// Well-known secret keys.
pub mod keys {
    /// Tracker site URL
    pub const JIRA_URL: &str = "jira.url";
    /// Tracker account email
    pub const JIRA_EMAIL: &str = "jira.email";
    /// Tracker API token
    pub const JIRA_TOKEN: &str = "jira.token";
    /// Model service API key
    pub const ANTHROPIC_API_KEY: &str = "anthropic.api_key";

    /// Every key `bugsift auth` manages.
    pub const ALL: &[&str] = &[JIRA_URL, JIRA_EMAIL, JIRA_TOKEN, ANTHROPIC_API_KEY];
}
