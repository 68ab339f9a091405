//! core::credentials
//!
//! Resolves tracker and model credentials.
//!
//! # Precedence
//!
//! Each value is taken from the first source that has it:
//! 1. Environment (`JIRA_BASE_URL`, `JIRA_EMAIL`, `JIRA_API_TOKEN`,
//!    `ANTHROPIC_API_KEY`)
//! 2. Config file (`[tracker] base_url` / `email` only; tokens never live
//!    in config)
//! 3. Secret store (written by `bugsift auth`)
//!
//! Empty values count as absent at every level.

use std::fmt;

use thiserror::Error;

use super::config::Config;
use crate::secrets::{keys, SecretError, SecretStore};

/// Errors from credential resolution.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// A required value was not found anywhere.
    #[error("{what} not configured: set {env} or run 'bugsift auth'")]
    Missing {
        what: &'static str,
        env: &'static str,
    },

    #[error(transparent)]
    Store(#[from] SecretError),
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Environment,
    Config,
    SecretStore,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Environment => write!(f, "environment"),
            Source::Config => write!(f, "config file"),
            Source::SecretStore => write!(f, "secret store"),
        }
    }
}

/// Credentials for the issue tracker.
#[derive(Clone)]
pub struct TrackerCredentials {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

// Custom Debug to avoid exposing api_token
impl fmt::Debug for TrackerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerCredentials")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

/// One credential and its resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStatus {
    /// Human-readable name
    pub what: &'static str,
    /// Environment variable that overrides it
    pub env: &'static str,
    /// Where it resolved from, `None` if missing
    pub source: Option<Source>,
}

struct Slot {
    what: &'static str,
    env: &'static str,
    key: &'static str,
}

const TRACKER_URL: Slot = Slot {
    what: "Jira URL",
    env: "JIRA_BASE_URL",
    key: keys::JIRA_URL,
};
const TRACKER_EMAIL: Slot = Slot {
    what: "Jira email",
    env: "JIRA_EMAIL",
    key: keys::JIRA_EMAIL,
};
const TRACKER_TOKEN: Slot = Slot {
    what: "Jira API token",
    env: "JIRA_API_TOKEN",
    key: keys::JIRA_TOKEN,
};
const MODEL_KEY: Slot = Slot {
    what: "Anthropic API key",
    env: "ANTHROPIC_API_KEY",
    key: keys::ANTHROPIC_API_KEY,
};

type EnvLookup<'a> = Box<dyn Fn(&str) -> Option<String> + 'a>;

/// Resolves credentials across environment, config and secret store.
pub struct CredentialResolver<'a> {
    config: &'a Config,
    store: &'a dyn SecretStore,
    env: EnvLookup<'a>,
}

impl<'a> CredentialResolver<'a> {
    /// Resolve against the process environment.
    pub fn new(config: &'a Config, store: &'a dyn SecretStore) -> Self {
        Self {
            config,
            store,
            env: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replace the environment lookup.
    pub fn with_env(mut self, env: impl Fn(&str) -> Option<String> + 'a) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Resolve everything the tracker client needs.
    ///
    /// # Errors
    ///
    /// `Missing` names the first absent value.
    pub fn tracker(&self) -> Result<TrackerCredentials, CredentialError> {
        Ok(TrackerCredentials {
            base_url: self.require(&TRACKER_URL, self.config.tracker_url())?,
            email: self.require(&TRACKER_EMAIL, self.config.tracker_email())?,
            api_token: self.require(&TRACKER_TOKEN, None)?,
        })
    }

    /// Resolve the model service API key.
    pub fn anthropic_key(&self) -> Result<String, CredentialError> {
        self.require(&MODEL_KEY, None)
    }

    /// Resolution status of every credential, for display.
    pub fn status(&self) -> Result<Vec<CredentialStatus>, CredentialError> {
        [
            (&TRACKER_URL, self.config.tracker_url()),
            (&TRACKER_EMAIL, self.config.tracker_email()),
            (&TRACKER_TOKEN, None),
            (&MODEL_KEY, None),
        ]
        .into_iter()
        .map(|(slot, configured)| {
            Ok(CredentialStatus {
                what: slot.what,
                env: slot.env,
                source: self.lookup(slot, configured)?.map(|(_, source)| source),
            })
        })
        .collect()
    }

    fn require(&self, slot: &Slot, configured: Option<&str>) -> Result<String, CredentialError> {
        self.lookup(slot, configured)?
            .map(|(value, _)| value)
            .ok_or(CredentialError::Missing {
                what: slot.what,
                env: slot.env,
            })
    }

    fn lookup(
        &self,
        slot: &Slot,
        configured: Option<&str>,
    ) -> Result<Option<(String, Source)>, CredentialError> {
        if let Some(value) = non_empty((self.env)(slot.env)) {
            return Ok(Some((value, Source::Environment)));
        }
        if let Some(value) = non_empty(configured.map(str::to_string)) {
            return Ok(Some((value, Source::Config)));
        }
        Ok(non_empty(self.store.get(slot.key)?).map(|value| (value, Source::SecretStore)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
