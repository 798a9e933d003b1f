//! Route command implementation.

use crate::cli::Output;
use crate::context::ContextInstance;
use crate::routing::{RouteDecision, RoutingContext, RoutingInstance};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use console::style;
use std::path::PathBuf;

/// Arguments to the route command.
#[derive(Debug, Clone)]
pub struct RouteArgs {
    pub file: PathBuf,
    pub date: Option<String>,
    pub subject: Option<String>,
    pub hash: String,
    pub json: bool,
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM` or `YYYY-MM-DDTHH:MM[:SS]`.
fn parse_date(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(date);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(date) = date.and_hms_opt(0, 0, 0) {
            return Ok(date);
        }
    }
    bail!("Unrecognized date '{}'; expected YYYY-MM-DD or \"YYYY-MM-DD HH:MM\"", input)
}

/// Run the route command.
pub async fn run_route(ctx: &ContextInstance, args: RouteArgs) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let audio_date = match &args.date {
        Some(date) => parse_date(date)?,
        None => {
            let modified = tokio::fs::metadata(&args.file).await?.modified()?;
            DateTime::<Local>::from(modified).naive_local()
        }
    };

    let routing_ctx = RoutingContext {
        transcript_text: text,
        audio_date,
        source_file: args.file.clone(),
        hash: args.hash.clone(),
    };

    let router = RoutingInstance::new(&ctx.settings().routing, ctx);
    let (decision, output_path) = router.route_to_path(&routing_ctx, args.subject.as_deref());

    if args.json {
        let report = serde_json::json!({
            "decision": decision,
            "output_path": output_path,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_decision(&decision, &output_path);
    }

    Ok(())
}

fn print_decision(decision: &RouteDecision, output_path: &std::path::Path) {
    Output::header("Routing Decision");
    Output::kv(
        "Project",
        decision.project_id.as_deref().unwrap_or("(default destination)"),
    );
    Output::kv("Confidence", &format!("{:.2}", decision.confidence));
    Output::kv("Output", &output_path.display().to_string());
    if !decision.destination.auto_tags.is_empty() {
        Output::kv("Tags", &decision.destination.auto_tags.join(", "));
    }

    if !decision.signals.is_empty() {
        println!();
        for signal in &decision.signals {
            Output::list_item(&format!(
                "{} '{}' from {} ({:.2})",
                signal.signal_type,
                signal.value,
                style(&signal.source).dim(),
                signal.weight
            ));
        }
    }

    println!();
    println!("  {}", style(&decision.reasoning).dim());

    if decision.confidence < 0.7 {
        Output::warning("Low confidence; review the destination before filing.");
    }
}
