//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! # Design
//!
//! The `SecretStore` trait is a key-value interface. Keys are
//! `section.name` pairs (e.g. `jira.token`, `anthropic.api_key`); the
//! well-known ones are listed in [`keys`](super::keys).
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include secrets in error messages
//! - Be thread-safe (Send + Sync)

use thiserror::Error;

/// Errors from secret storage operations.
///
/// Error messages never include secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Key is not of the form `section.name`.
    #[error("invalid secret key '{0}', expected 'section.name'")]
    InvalidKey(String),

    /// Failed to read from secret storage.
    #[error("failed to read secret: {0}")]
    ReadError(String),

    /// Failed to write to secret storage.
    #[error("failed to write secret: {0}")]
    WriteError(String),
}

/// Trait for secret storage providers.
///
/// # Example
///
/// ```
/// use bugsift::secrets::{keys, FileSecretStore, SecretStore};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = FileSecretStore::with_path(dir.path().join("secrets.toml"));
///
/// store.set(keys::JIRA_TOKEN, "t0ken").unwrap();
/// assert!(store.exists(keys::JIRA_TOKEN).unwrap());
/// store.delete(keys::JIRA_TOKEN).unwrap();
/// assert_eq!(store.get(keys::JIRA_TOKEN).unwrap(), None);
/// ```
pub trait SecretStore: Send + Sync {
    /// Get a secret by key, `Ok(None)` if absent.
    ///
    /// The returned value is the raw secret. Do not log or print it.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Set a secret, overwriting any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Delete a secret. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), SecretError>;

    /// Check if a secret exists.
    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}

/// Split a `section.name` key.
pub(super) fn split_key(key: &str) -> Result<(&str, &str), SecretError> {
    match key.split_once('.') {
        Some((section, name)) if !section.is_empty() && !name.is_empty() => Ok((section, name)),
        _ => Err(SecretError::InvalidKey(key.to_string())),
    }
}
