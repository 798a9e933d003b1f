//! Context command - show what was discovered.

use crate::cli::Output;
use crate::context::ContextInstance;
use anyhow::Result;

/// Run the context command.
pub fn run_context(ctx: &ContextInstance) -> Result<()> {
    if !ctx.has_context() {
        Output::warning("No context directory found. Run 'protokoll init' to create one.");
        return Ok(());
    }

    Output::header("Discovered Directories");
    for dir in ctx.discovered_dirs() {
        Output::list_item(&format!("{} (level {})", dir.path.display(), dir.level));
    }

    Output::header("Knowledge Base");
    for dir in ctx.context_dirs() {
        Output::list_item(&dir.display().to_string());
    }
    println!();
    Output::kv("People", &ctx.people().len().to_string());
    Output::kv("Projects", &ctx.projects().len().to_string());
    Output::kv("Companies", &ctx.companies().len().to_string());
    Output::kv("Terms", &ctx.terms().len().to_string());
    Output::kv("Ignored", &ctx.ignored_terms().len().to_string());

    Ok(())
}
