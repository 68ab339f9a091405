//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve configuration and credentials
//! - Delegate to the tracker, analysis and rendering layers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers wire concrete clients together from
//! config and credentials and report progress through [`crate::ui::output`];
//! retrieval and analysis semantics live in [`crate::tracker`] and
//! [`crate::analysis`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub debug: bool,
    pub quiet: bool,
    pub interactive: bool,
    /// Explicit `--config` path
    pub config_path: Option<PathBuf>,
}

impl Context {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// Load configuration honoring `--config`.
    pub fn load_config(&self) -> Result<Config> {
        let config = Config::load(self.config_path.as_deref()).context("Failed to load config")?;
        if let Some(path) = config.loaded_from() {
            crate::ui::output::debug(
                format!("config loaded from {}", path.display()),
                self.verbosity(),
            );
        }
        Ok(config)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        debug: cli.debug,
        quiet: cli.quiet,
        interactive: cli.interactive(),
        config_path: cli.config.clone(),
    };

    commands::dispatch(cli.command, &ctx)
}
