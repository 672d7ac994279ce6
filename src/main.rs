use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use price_reconciler::{
    init_tracing, DocumentProcessor, DocumentStatus, LogOptions, ProcessorConfig, XlsxStore,
};

#[derive(Parser)]
#[command(name = "price-reconciler")]
#[command(
    about = "Allocate a declared total across price rows and reconcile rounding in both currencies",
    long_about = None
)]
struct Cli {
    /// Directory whose *.xlsx files are processed
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip reconciliation and keep full precision in written values
    #[arg(long, default_value_t = false)]
    manual: bool,

    /// Write summary and reference cells as cross-check formulas
    #[arg(long, default_value_t = false)]
    formulas: bool,

    /// Nudge size in local currency (overrides the configuration file)
    #[arg(long)]
    accuracy: Option<f64>,

    /// Bound on item selections per document (overrides the configuration file)
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log level or filter directive, used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit JSON log lines
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn processor_config(&self) -> Result<ProcessorConfig> {
        let mut config = match &self.config {
            Some(path) => ProcessorConfig::load(path)?,
            None => ProcessorConfig::default(),
        };
        if let Some(accuracy) = self.accuracy {
            config.accuracy = accuracy;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        config.manual |= self.manual;
        config.cross_check_formulas |= self.formulas;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&LogOptions {
        level: cli.log_level.clone(),
        json: cli.json_logs,
        file: cli.log_file.clone(),
    })?;

    let config = cli.processor_config().context("invalid configuration")?;
    let store = XlsxStore::new(&cli.dir);
    let mut processor = DocumentProcessor::new(store, &config)?;

    let report = processor
        .process_batch()
        .with_context(|| format!("cannot process {}", cli.dir.display()))?;

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
    }

    if report.documents.is_empty() {
        bail!("no Excel files found in {}", cli.dir.display());
    }

    for document in &report.documents {
        let outcome = match &document.status {
            DocumentStatus::Completed => "completed".to_string(),
            DocumentStatus::Incomplete { discrepancy } => format!("incomplete: {}", discrepancy),
            DocumentStatus::Failed { error } => format!("failed: {}", error),
        };
        println!("{}: {}", document.document, outcome);
    }
    println!(
        "run {}: {} completed, {} incomplete, {} failed",
        report.run_id,
        report.completed(),
        report.incomplete(),
        report.failed()
    );

    Ok(())
}
