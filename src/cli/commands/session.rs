//! cli::commands::session
//!
//! Wiring shared by the network commands: config, credentials, clients.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::analysis::anthropic::AnthropicModel;
use crate::cli::args::QueryArgs;
use crate::cli::Context;
use crate::core::config::Config;
use crate::core::credentials::CredentialResolver;
use crate::secrets::FileSecretStore;
use crate::tracker::jira::JiraTracker;
use crate::tracker::{RecordMapper, RetrievalQuery, Retriever, Tracker, TrackerUser};
use crate::ui::output;

/// Loaded config plus the secret store credentials fall back to.
pub(super) struct Session {
    pub config: Config,
    store: FileSecretStore,
}

impl Session {
    pub fn open(ctx: &Context) -> Result<Self> {
        let config = ctx.load_config()?;
        let store = FileSecretStore::new().context("Failed to initialize secret store")?;
        Ok(Self { config, store })
    }

    pub fn store(&self) -> &FileSecretStore {
        &self.store
    }

    pub fn resolver(&self) -> CredentialResolver<'_> {
        CredentialResolver::new(&self.config, &self.store)
    }

    /// Jira client from resolved credentials.
    pub fn tracker(&self) -> Result<JiraTracker> {
        let creds = self.resolver().tracker()?;
        JiraTracker::with_timeout(
            &creds.base_url,
            creds.email,
            creds.api_token,
            self.config.tracker_timeout(),
        )
        .context("Failed to create Jira client")
    }

    /// Model client from resolved credentials.
    pub fn model(&self) -> Result<AnthropicModel> {
        let api_key = self.resolver().anthropic_key()?;
        let model = AnthropicModel::new(api_key, self.config.model(), self.config.max_tokens())
            .context("Failed to create model client")?
            .with_base_url(self.config.analysis_url())
            .with_timeout(self.config.analysis_timeout())
            .context("Failed to create model client")?;
        Ok(model)
    }

    /// Retriever configured with custom fields and concurrency.
    pub fn retriever<'a>(&self, tracker: &'a dyn Tracker) -> Retriever<'a> {
        Retriever::new(tracker)
            .with_mapper(RecordMapper::new(self.config.custom_fields()))
            .with_hydration_concurrency(self.config.hydration_concurrency())
    }

    /// Query from flags, falling back to the configured project and limit.
    pub fn query(&self, args: &QueryArgs) -> RetrievalQuery {
        let project = match (&args.filter, &args.jql, &args.project) {
            (None, None, None) => self.config.default_project().map(str::to_string),
            _ => args.project.clone(),
        };
        RetrievalQuery {
            jql: args.jql.clone(),
            filter_id: args.filter.clone(),
            project,
            max_results: args.max_results.unwrap_or(self.config.max_results()),
        }
    }
}

/// Test the connection, reporting who we are connected as.
pub(super) async fn connect(ctx: &Context, retriever: &Retriever<'_>) -> Result<TrackerUser> {
    output::status("Connecting to Jira...", ctx.verbosity());
    let user = retriever.test_connection().await?;
    output::debug(
        format!("authenticated as {}", user.display_name),
        ctx.verbosity(),
    );
    Ok(user)
}

/// Write `content` to `path`, or to stdout when no path is given.
pub(super) fn write_output(ctx: &Context, path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output::success(format!("Wrote {}", path.display()), ctx.verbosity());
        }
        None => output::print(content.trim_end()),
    }
    Ok(())
}
