//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file
//! - `--debug`: Enable debug logging
//! - `--no-interactive`: Never prompt
//! - `--quiet` / `-q`: Minimal output

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::types::{AnalysisMode, OutputFormat};

/// bugsift - Find root-cause and test-gap patterns in your Jira bugs
#[derive(Parser, Debug)]
#[command(name = "bugsift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Interactive unless `--no-interactive` or `--quiet` was given or
    /// stdin is not a terminal.
    pub fn interactive(&self) -> bool {
        !self.no_interactive && !self.quiet && std::io::stdin().is_terminal()
    }
}

/// Which bugs to retrieve.
///
/// At most one of `--filter`, `--jql` and `--project` may be given. With
/// none, the configured default project is used.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Saved filter id whose query to run
    #[arg(long, value_name = "ID", conflicts_with_all = ["jql", "project"])]
    pub filter: Option<String>,

    /// Raw JQL query
    #[arg(long, value_name = "JQL", conflicts_with = "project")]
    pub jql: Option<String>,

    /// Project key; fetches all its bugs, newest first
    #[arg(short, long, value_name = "KEY")]
    pub project: Option<String>,

    /// Maximum number of bugs to fetch
    #[arg(short = 'n', long, value_name = "N")]
    pub max_results: Option<usize>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch bugs and analyze them for patterns
    #[command(
        name = "analyze",
        long_about = "Fetch bugs from Jira and analyze them for patterns.\n\n\
            Retrieves the matching bugs, sends them to the model in one request, and \
            renders the resulting pattern report: root-cause clusters, component \
            hotspots, testing gaps, risk scores, and prioritized recommendations.\n\n\
            Escape mode focuses on bugs that reached customers and asks why testing \
            missed them. All mode adds a breakdown by failure type.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Analyze the newest 50 bugs in a project
    bugsift analyze --project PROJ

    # Analyze a saved filter of customer escapes
    bugsift analyze --filter 10042 --mode escape

    # Write an HTML report and open it
    bugsift analyze --jql 'project = PROJ AND created >= -30d' \\
        --format html --output report.html --open

    # Machine-readable report for further processing
    bugsift analyze --project PROJ --format json > report.json"
    )]
    Analyze {
        #[command(flatten)]
        query: QueryArgs,

        /// Analysis template
        #[arg(short, long, value_enum, default_value_t = AnalysisMode::All)]
        mode: AnalysisMode,

        /// Report format [default: from config, else terminal]
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Write the report to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Open the written report with the system viewer
        #[arg(long, requires = "output")]
        open: bool,
    },

    /// Fetch bugs and print them as JSON, without analysis
    #[command(
        name = "fetch",
        long_about = "Fetch bugs from Jira and print the normalized records as JSON.\n\n\
            Useful for checking what a query returns, and how custom fields map, \
            before spending a model call on it.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Preview what a filter returns
    bugsift fetch --filter 10042 -n 5

    # Save records for later inspection
    bugsift fetch --project PROJ --output bugs.json"
    )]
    Fetch {
        #[command(flatten)]
        query: QueryArgs,

        /// Write the records to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Find saved filters by name
    #[command(
        name = "filters",
        after_help = "\
WORKFLOW EXAMPLES:
    # Find the id of a saved filter, then analyze it
    bugsift filters escapes
    bugsift analyze --filter 10042 --mode escape"
    )]
    Filters {
        /// Name or part of a name to search for
        name: String,

        /// Maximum number of filters to list
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Check Jira connectivity and credentials
    #[command(
        name = "check",
        long_about = "Check that Jira is reachable and the credentials are accepted.\n\n\
            Also reports whether a model API key is available, without contacting \
            the model service."
    )]
    Check,

    /// Store, inspect, or remove credentials
    #[command(
        name = "auth",
        long_about = "Store, inspect, or remove credentials.\n\n\
            Values are saved in ~/.bugsift/secrets.toml with owner-only permissions. \
            Environment variables (JIRA_BASE_URL, JIRA_EMAIL, JIRA_API_TOKEN, \
            ANTHROPIC_API_KEY) always take precedence over stored values.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Prompt for everything (tokens are not echoed)
    bugsift auth

    # Non-interactive setup
    bugsift auth --url https://acme.atlassian.net --email me@acme.com \\
        --token \"$JIRA_API_TOKEN\" --anthropic-key \"$ANTHROPIC_API_KEY\"

    # See where each credential comes from
    bugsift auth --status

    # Remove stored credentials
    bugsift auth --logout"
    )]
    Auth {
        /// Jira site URL
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Jira account email
        #[arg(long)]
        email: Option<String>,

        /// Jira API token
        #[arg(long)]
        token: Option<String>,

        /// Anthropic API key
        #[arg(long, value_name = "KEY")]
        anthropic_key: Option<String>,

        /// Show where each credential resolves from
        #[arg(long, conflicts_with_all = ["logout", "url", "email", "token", "anthropic_key"])]
        status: bool,

        /// Remove all stored credentials
        #[arg(long, conflicts_with_all = ["url", "email", "token", "anthropic_key"])]
        logout: bool,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        long_about = "View or modify bugsift configuration.\n\n\
            Configuration is read from --config, $BUGSIFT_CONFIG, \
            $XDG_CONFIG_HOME/bugsift/config.toml or ~/.bugsift/config.toml, in that \
            order. `set` writes to the file in use, creating ~/.bugsift/config.toml \
            if there is none. An empty value removes the key.",
        after_help = "\
WORKFLOW EXAMPLES:
    # List all configuration values
    bugsift config list

    # Get a specific value
    bugsift config get tracker.max_results

    # Set a value
    bugsift config set tracker.default_project PROJ

    # Point the failure-type field at your instance's custom field
    bugsift config set tracker.fields.failure_type customfield_12345"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    bugsift completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    bugsift completion zsh >> ~/.zshrc

    # Fish
    bugsift completion fish > ~/.config/fish/completions/bugsift.fish

    # PowerShell
    bugsift completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key, e.g. tracker.max_results
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set; empty to remove
        value: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
