//! cli::commands::auth
//!
//! Store, inspect, or remove credentials.
//!
//! # Design
//!
//! - Values are stored via [`SecretStore`]
//! - Secret values are NEVER printed, only where they resolve from
//! - Flags always work; prompts fill in the rest when interactive, and a
//!   blank answer keeps the stored value

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::credentials::CredentialResolver;
use crate::secrets::{keys, FileSecretStore, SecretStore};
use crate::ui::{output, prompts};

/// Values passed on the command line.
#[derive(Debug, Clone, Default)]
pub struct AuthArgs {
    pub url: Option<String>,
    pub email: Option<String>,
    pub token: Option<String>,
    pub anthropic_key: Option<String>,
    pub status: bool,
    pub logout: bool,
}

impl AuthArgs {
    fn any_value(&self) -> bool {
        self.url.is_some()
            || self.email.is_some()
            || self.token.is_some()
            || self.anthropic_key.is_some()
    }
}

/// Run the auth command.
pub fn auth(ctx: &Context, args: AuthArgs) -> Result<()> {
    let store = FileSecretStore::new().context("Failed to initialize secret store")?;

    if args.status {
        let config = ctx.load_config()?;
        return show_status(ctx, &CredentialResolver::new(&config, &store));
    }

    if args.logout {
        return logout(ctx, &store);
    }

    let values = if args.any_value() {
        vec![
            (keys::JIRA_URL, args.url),
            (keys::JIRA_EMAIL, args.email),
            (keys::JIRA_TOKEN, args.token),
            (keys::ANTHROPIC_API_KEY, args.anthropic_key),
        ]
    } else if ctx.interactive {
        prompt_all(&store)?
    } else {
        bail!(
            "Nothing to store. Pass --url, --email, --token or --anthropic-key, \
             or run interactively."
        );
    };

    let stored = store_values(&store, values)?;
    if stored == 0 {
        output::status("Nothing changed.", ctx.verbosity());
    } else {
        output::success(
            format!("Stored {} credential(s) in {}.", stored, store.path().display()),
            ctx.verbosity(),
        );
    }
    Ok(())
}

fn show_status(ctx: &Context, resolver: &CredentialResolver<'_>) -> Result<()> {
    let statuses = resolver.status()?;

    if ctx.quiet {
        // machine-readable
        let all = statuses.iter().all(|s| s.source.is_some());
        output::print(if all { "configured" } else { "incomplete" });
        return Ok(());
    }

    for status in &statuses {
        match status.source {
            Some(source) => output::print(format!("{:<18} set ({})", status.what, source)),
            None => output::print(format!(
                "{:<18} missing (set {} or run 'bugsift auth')",
                status.what, status.env
            )),
        }
    }
    Ok(())
}

fn logout(ctx: &Context, store: &dyn SecretStore) -> Result<()> {
    for key in keys::ALL {
        store
            .delete(key)
            .with_context(|| format!("Failed to remove {}", key))?;
    }
    output::success("Removed stored credentials.", ctx.verbosity());
    Ok(())
}

/// Prompt for every value, offering stored URL and email as defaults.
fn prompt_all(store: &dyn SecretStore) -> Result<Vec<(&'static str, Option<String>)>> {
    let url_default = store.get(keys::JIRA_URL)?;
    let email_default = store.get(keys::JIRA_EMAIL)?;

    let url = prompts::input("Jira URL", url_default.as_deref(), true)?;
    let email = prompts::input("Jira email", email_default.as_deref(), true)?;
    let token = prompts::password("Jira API token (blank to keep)", true)?;
    let anthropic_key = prompts::password("Anthropic API key (blank to keep)", true)?;

    Ok(vec![
        (keys::JIRA_URL, Some(url)),
        (keys::JIRA_EMAIL, Some(email)),
        (keys::JIRA_TOKEN, Some(token)),
        (keys::ANTHROPIC_API_KEY, Some(anthropic_key)),
    ])
}

/// Validate and store non-blank values; returns how many were written.
fn store_values(
    store: &dyn SecretStore,
    values: Vec<(&'static str, Option<String>)>,
) -> Result<usize> {
    let values: Vec<(&str, String)> = values
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value?.trim().to_string();
            (!value.is_empty()).then_some((key, value))
        })
        .collect();

    for (key, value) in &values {
        validate(key, value)?;
    }

    for (key, value) in &values {
        if store.get(key)?.as_deref() == Some(value.as_str()) {
            continue;
        }
        store
            .set(key, value)
            .with_context(|| format!("Failed to store {}", key))?;
    }
    Ok(values.len())
}

/// Basic format checks. Nothing is verified against the network here;
/// `bugsift check` does that.
fn validate(key: &str, value: &str) -> Result<()> {
    if value.chars().any(char::is_whitespace) {
        bail!("{} should not contain whitespace.", key);
    }
    match key {
        keys::JIRA_URL if !(value.starts_with("https://") || value.starts_with("http://")) => {
            bail!("Jira URL must start with https:// or http://");
        }
        keys::JIRA_EMAIL if !value.contains('@') => {
            bail!("Jira email '{}' does not look like an email address.", value);
        }
        keys::JIRA_TOKEN | keys::ANTHROPIC_API_KEY if value.len() < 10 => {
            bail!("{} appears to be too short.", key);
        }
        _ => Ok(()),
    }
}
