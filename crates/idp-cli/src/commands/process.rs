//! Process command - extract fields from a single document image.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use idp_core::{export, DocumentProcessor, ExtractionResult};

use super::{is_supported_image, load_config, HistoryArgs};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input image
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// JSON rule file replacing the built-in extraction patterns
    #[arg(long)]
    patterns: Option<PathBuf>,

    /// Skip image normalization
    #[arg(long)]
    no_preprocess: bool,

    /// Show the recognition engine and processing time
    #[arg(long)]
    show_timing: bool,

    #[command(flatten)]
    history: HistoryArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.history.apply(&mut config);
    if let Some(patterns) = &args.patterns {
        config.extraction.patterns = Some(patterns.clone());
    }
    if args.no_preprocess {
        config.preprocessing.enabled = false;
    }

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    if !is_supported_image(&args.input) {
        let extension = args
            .input
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);

    pb.set_message("Loading OCR engines...");
    let processor = DocumentProcessor::from_config(&config)?;

    pb.set_message("Extracting fields...");
    let result = processor.process_document(&args.input)?;

    pb.finish_and_clear();

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_timing {
        println!();
        println!(
            "{} Recognition engine: {}",
            style("ℹ").blue(),
            result.ocr_engine.as_deref().unwrap_or("unknown")
        );
        println!(
            "{} Processing time: {:.3}s",
            style("ℹ").blue(),
            result.processing_time
        );
    }

    debug!("Total command time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => Ok(export::to_csv(std::slice::from_ref(result))?),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_text(result: &ExtractionResult) -> String {
    let fields = &result.fields;
    let or_dash = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };

    let mut output = String::new();
    output.push_str(&format!("File: {}\n", result.file_name));
    output.push_str(&format!("Type: {}\n", fields.document_type));
    output.push('\n');
    output.push_str(&format!("Company: {}\n", or_dash(&fields.company_name)));
    output.push_str(&format!("Number:  {}\n", or_dash(&fields.invoice_number)));
    output.push_str(&format!("Date:    {}\n", or_dash(&fields.date)));
    output.push_str(&format!("Amount:  {}\n", or_dash(&fields.amount)));
    output.push_str(&format!("Tax:     {}\n", or_dash(&fields.tax)));
    output.push('\n');
    output.push_str(&format!(
        "Processed: {}\n",
        result.timestamp.format("%Y-%m-%d %H:%M:%S")
    ));

    output
}
