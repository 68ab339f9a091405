//! cli::commands::analyze
//!
//! Fetch, analyze and render in one run.
//!
//! # Flow
//!
//! 1. Resolve both credential sets before any network call
//! 2. Test the tracker connection
//! 3. Fetch records
//! 4. One analysis request
//! 5. Render to stdout or `--output`, optionally `--open`

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::session::{self, Session};
use crate::analysis::{Analyzer, CompletionModel};
use crate::cli::args::QueryArgs;
use crate::cli::Context;
use crate::core::types::{AnalysisMode, OutputFormat};
use crate::ui::{output, render};

/// Arguments for the analyze command.
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub query: QueryArgs,
    pub mode: AnalysisMode,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub open: bool,
}

/// Run the analyze command.
pub fn analyze(ctx: &Context, args: AnalyzeArgs) -> Result<()> {
    let session = Session::open(ctx)?;
    let tracker = session.tracker()?;
    let model = session.model()?;
    let query = session.query(&args.query);
    let format = args.format.unwrap_or_else(|| session.config.output_format());

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        let retriever = session.retriever(&tracker);
        session::connect(ctx, &retriever).await?;

        let records = retriever.fetch(&query).await?;
        if records.is_empty() {
            output::warn("no bugs matched the query", ctx.verbosity());
        } else {
            output::status(
                format!(
                    "Analyzing {} bugs with {} ({} mode)...",
                    records.len(),
                    model.model(),
                    args.mode
                ),
                ctx.verbosity(),
            );
        }

        Analyzer::new(&model)
            .analyze(&records, args.mode)
            .await
            .context("Analysis failed")
    })?;

    let rendered = render(&report, format);
    session::write_output(ctx, args.output.as_deref(), &rendered)?;

    if args.open {
        if let Some(path) = &args.output {
            open::that(path).with_context(|| format!("Failed to open {}", path.display()))?;
        }
    }

    Ok(())
}
