//! cli::commands::fetch
//!
//! Fetch records and print them as JSON.

use std::path::Path;

use anyhow::{Context as _, Result};

use super::session::{self, Session};
use crate::cli::args::QueryArgs;
use crate::cli::Context;
use crate::ui::output;

/// Run the fetch command.
pub fn fetch(ctx: &Context, query: &QueryArgs, out: Option<&Path>) -> Result<()> {
    let session = Session::open(ctx)?;
    let tracker = session.tracker()?;
    let query = session.query(query);

    let rt = tokio::runtime::Runtime::new()?;
    let records = rt.block_on(async {
        let retriever = session.retriever(&tracker);
        session::connect(ctx, &retriever).await?;
        Ok::<_, anyhow::Error>(retriever.fetch(&query).await?)
    })?;

    output::status(format!("Fetched {} bugs", records.len()), ctx.verbosity());
    let json = serde_json::to_string_pretty(&records).context("Failed to serialize records")?;
    session::write_output(ctx, out, &json)
}
