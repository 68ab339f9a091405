//! cli::commands::filters
//!
//! Saved-filter discovery.

use anyhow::Result;

use super::session::Session;
use crate::cli::Context;
use crate::tracker::SavedFilter;
use crate::ui::output;

/// Run the filters command.
///
/// Prints one `ID<TAB>NAME` line per match so the output can be piped.
pub fn filters(ctx: &Context, name: &str, limit: usize) -> Result<()> {
    let session = Session::open(ctx)?;
    let tracker = session.tracker()?;

    let rt = tokio::runtime::Runtime::new()?;
    let found = rt.block_on(async {
        let retriever = session.retriever(&tracker);
        retriever.search_filters(name, limit).await
    })?;

    if found.is_empty() {
        output::status(format!("No saved filters match '{}'.", name), ctx.verbosity());
        return Ok(());
    }

    output::print(format_filters(&found));
    Ok(())
}

fn format_filters(filters: &[SavedFilter]) -> String {
    let lines: Vec<String> = filters
        .iter()
        .map(|f| format!("{}\t{}", f.id, f.name))
        .collect();
    output::format_list(&lines, "")
}
