//! Analytics command - summary statistics over the extraction history.

use clap::Args;
use console::style;

use idp_core::history;
use idp_core::AnalyticsSnapshot;

use super::{load_config, HistoryArgs};

/// Arguments for the analytics command.
#[derive(Args)]
pub struct AnalyticsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: AnalyticsFormat,

    #[command(flatten)]
    history: HistoryArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum AnalyticsFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: AnalyticsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    args.history.apply(&mut config);

    if config.history.path.is_none() {
        eprintln!(
            "{} No history file configured, analytics cover an empty history.",
            style("ℹ").blue()
        );
    }

    let store = history::open(&config.history)?;
    let snapshot = AnalyticsSnapshot::compute(&store.snapshot()?, &config.analytics);

    match args.format {
        AnalyticsFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        AnalyticsFormat::Text => print!("{}", format_text(&snapshot)),
    }

    Ok(())
}

fn format_text(snapshot: &AnalyticsSnapshot) -> String {
    let mut output = String::new();

    output.push_str(&format!("Documents processed: {}\n", snapshot.total_documents));
    output.push_str(&format!(
        "Average processing time: {:.2}s\n",
        snapshot.average_processing_time
    ));
    output.push_str(&format!("Time saved: {:.2} min\n", snapshot.time_saved));
    output.push_str(&format!("Efficiency gain: {:.1}%\n", snapshot.efficiency_gain));
    output.push_str(&format!("Monthly impact: {} documents\n", snapshot.monthly_impact));
    output.push_str(&format!("Error reduction: {}%\n", snapshot.error_reduction));

    if !snapshot.chart_data.document_types.is_empty() {
        output.push('\n');
        output.push_str("By type:\n");
        for (doc_type, count) in &snapshot.chart_data.document_types {
            output.push_str(&format!("  {:<8} {}\n", doc_type, count));
        }
    }

    output
}
