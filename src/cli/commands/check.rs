//! cli::commands::check
//!
//! Connectivity and credential pre-check.

use anyhow::Result;

use super::session::Session;
use crate::cli::Context;
use crate::tracker::TrackerUser;
use crate::ui::output;

/// Run the check command.
///
/// Fails if Jira is unreachable or rejects the credentials. A missing model
/// key is only a warning, since `fetch` and `filters` work without one, and
/// so is a secrets file other users can read.
pub fn check(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let tracker = session.tracker()?;

    let rt = tokio::runtime::Runtime::new()?;
    let user = rt.block_on(async { session.retriever(&tracker).test_connection().await })?;

    output::success(describe(tracker.api_base(), &user), ctx.verbosity());

    if let Err(err) = session.resolver().anthropic_key() {
        output::warn(err, ctx.verbosity());
    }

    let store = session.store();
    if !store.permissions_ok()? {
        output::warn(
            format!(
                "{} is readable by other users; run: chmod 600 {}",
                store.path().display(),
                store.path().display()
            ),
            ctx.verbosity(),
        );
    }
    Ok(())
}

fn describe(api_base: &str, user: &TrackerUser) -> String {
    match &user.email {
        Some(email) => format!(
            "Connected to {} as {} <{}>",
            api_base, user.display_name, email
        ),
        None => format!("Connected to {} as {}", api_base, user.display_name),
    }
}
