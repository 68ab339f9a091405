//! secrets::file_store
//!
//! File-based secret storage.
//!
//! # Security
//!
//! - Secrets are stored in `~/.bugsift/secrets.toml`
//! - File permissions are set to 0600 on Unix (owner read/write only)
//! - All writes are atomic (write to temp file, then rename)
//! - Secrets are NEVER logged, printed, or included in error messages
//!
//! # Format
//!
//! Each key section becomes a TOML table:
//!
//! ```toml
//! [jira]
//! url = "https://acme.atlassian.net"
//! token = "..."
//!
//! [anthropic]
//! api_key = "..."
//! ```

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::traits::{split_key, SecretError, SecretStore};

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// File-based secret storage at `~/.bugsift/secrets.toml`.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Create a store at the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::ReadError("cannot determine home directory".into()))?;
        Ok(Self {
            path: home.join(".bugsift").join("secrets.toml"),
        })
    }

    /// Create a store at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path to the secrets file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_sections(&self) -> Result<Sections, SecretError> {
        if !self.path.exists() {
            return Ok(Sections::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read secrets file: {}", e)))?;

        // toml errors quote the offending line, which may hold a secret
        toml::from_str(&content).map_err(|_| {
            SecretError::ReadError(format!(
                "cannot parse secrets file '{}'",
                self.path.display()
            ))
        })
    }

    fn write_sections(&self, sections: &Sections) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SecretError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(sections)
            .map_err(|e| SecretError::WriteError(format!("cannot serialize secrets: {}", e)))?;

        let temp_path = self.path.with_extension("toml.tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| SecretError::WriteError(format!("cannot create temp file: {}", e)))?;

            // Restrict before any content is written
            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| SecretError::WriteError(format!("cannot set permissions: {}", e)))?;

            file.write_all(content.as_bytes())
                .map_err(|e| SecretError::WriteError(format!("cannot write secrets: {}", e)))?;
            file.sync_all()
                .map_err(|e| SecretError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SecretError::WriteError(format!("cannot rename temp file: {}", e)))
    }

    /// Whether the file is absent or readable by its owner only.
    #[cfg(unix)]
    pub fn permissions_ok(&self) -> Result<bool, SecretError> {
        if !self.path.exists() {
            return Ok(true);
        }
        let metadata = fs::metadata(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read file metadata: {}", e)))?;
        Ok(metadata.permissions().mode() & 0o077 == 0)
    }

    /// Whether the file is absent or readable by its owner only.
    #[cfg(not(unix))]
    pub fn permissions_ok(&self) -> Result<bool, SecretError> {
        Ok(true)
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        let (section, name) = split_key(key)?;
        let sections = self.read_sections()?;
        Ok(sections.get(section).and_then(|s| s.get(name)).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let (section, name) = split_key(key)?;
        let mut sections = self.read_sections()?;
        sections
            .entry(section.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        self.write_sections(&sections)
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        let (section, name) = split_key(key)?;
        let mut sections = self.read_sections()?;
        let Some(entries) = sections.get_mut(section) else {
            return Ok(());
        };
        if entries.remove(name).is_none() {
            return Ok(());
        }
        if entries.is_empty() {
            sections.remove(section);
        }
        self.write_sections(&sections)
    }
}
