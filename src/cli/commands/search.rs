//! Search command implementation.

use crate::cli::Output;
use crate::context::ContextInstance;
use anyhow::Result;

/// Run the search command.
pub fn run_search(ctx: &ContextInstance, query: &str) -> Result<()> {
    let results = ctx.search(query);

    if results.is_empty() {
        Output::warning(&format!("Nothing matches '{}'.", query));
    } else {
        Output::success(&format!("Found {} results", results.len()));
        println!();
        for entity in &results {
            Output::entity(entity);
        }
    }

    Ok(())
}
