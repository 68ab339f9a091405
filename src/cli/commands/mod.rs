//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads config and resolves credentials (via `session`)
//! 2. Builds the clients it needs
//! 3. Runs the work and reports through [`crate::ui::output`]
//!
//! # Async Commands
//!
//! Tracker and model calls are async. Handlers stay synchronous and drive
//! them on a `tokio::runtime::Runtime` created per invocation.

mod analyze;
mod auth;
mod check;
mod completion;
mod config_cmd;
mod fetch;
mod filters;
mod session;

// Re-export command functions for testing and direct invocation
pub use analyze::{analyze, AnalyzeArgs};
pub use auth::{auth, AuthArgs};
pub use check::check;
pub use completion::completion;
pub use fetch::fetch;
pub use filters::filters;

use anyhow::Result;

use crate::cli::args::{Command, ConfigAction};
use crate::cli::Context;

pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Analyze {
            query,
            mode,
            format,
            output,
            open,
        } => analyze::analyze(
            ctx,
            AnalyzeArgs {
                query,
                mode,
                format,
                output,
                open,
            },
        ),
        Command::Fetch { query, output } => fetch::fetch(ctx, &query, output.as_deref()),
        Command::Filters { name, limit } => filters::filters(ctx, &name, limit),
        Command::Check => check::check(ctx),
        Command::Auth {
            url,
            email,
            token,
            anthropic_key,
            status,
            logout,
        } => auth::auth(
            ctx,
            AuthArgs {
                url,
                email,
                token,
                anthropic_key,
                status,
                logout,
            },
        ),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}
