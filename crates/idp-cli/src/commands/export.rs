//! Export command - write the extraction history as CSV.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use clap::Args;
use console::style;

use idp_core::error::ExportError;
use idp_core::{export, history};

use super::{load_config, HistoryArgs};

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Output file or directory (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    history: HistoryArgs,
}

pub async fn run(args: ExportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    args.history.apply(&mut config);

    let store = history::open(&config.history)?;
    let csv = match export::to_csv(&store.snapshot()?) {
        Ok(csv) => csv,
        Err(ExportError::Empty) => anyhow::bail!("No data to export"),
        Err(e) => return Err(e.into()),
    };

    match args.output {
        Some(output) => {
            let output_path = if output.is_dir() {
                output.join(format!(
                    "extracted_data_{}.csv",
                    Local::now().format("%Y%m%d_%H%M%S")
                ))
            } else {
                output
            };

            fs::write(&output_path, csv)?;
            println!(
                "{} Exported {} records to {}",
                style("✓").green(),
                store.len()?,
                output_path.display()
            );
        }
        None => print!("{}", csv),
    }

    Ok(())
}
