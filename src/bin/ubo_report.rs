//! UBO Report CLI
//!
//! Loads a registry snapshot, resolves beneficial ownership and writes the
//! TSV report:
//! 1. Read and repair `company.tsv`, `founder_legal.tsv`, `founder_natural.tsv`
//! 2. Deduplicate and impute founder shares
//! 3. Flatten the ownership graph
//! 4. Write every person at or above the threshold to `results.tsv`
//!
//! Usage:
//!   cargo run --bin ubo_report -- --data-dir ./data
//!
//! Examples:
//!   # Sum multiple paths before applying a 10% threshold
//!   cargo run --bin ubo_report -- \
//!     --data-dir ./data \
//!     --threshold 0.10 \
//!     --aggregation sum \
//!     --summary-json run.json
//!
//!   # Settings from a YAML file, output path from the environment
//!   UBO_OUTPUT=/tmp/ubo.tsv cargo run --bin ubo_report -- --config ubo.yaml

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::prelude::*;

use ubo_resolver::{pipeline, report, AggregationPolicy, Registry, ResolverConfig};

/// Ultimate beneficial ownership report
#[derive(Parser, Debug)]
#[command(name = "ubo_report")]
#[command(about = "Resolve ultimate beneficial owners from registry TSV exports")]
struct Args {
    /// Directory holding the registry files
    #[arg(long, short = 'd', env = "UBO_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Report path (default: config `output`, relative to the working directory)
    #[arg(long, short = 'o', env = "UBO_OUTPUT")]
    output: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, short = 'c', env = "UBO_CONFIG")]
    config: Option<PathBuf>,

    /// Reporting threshold as a fraction (e.g. 0.25)
    #[arg(long, short = 't')]
    threshold: Option<f64>,

    /// How several paths to the same person are combined
    #[arg(long, value_enum)]
    aggregation: Option<AggregationPolicy>,

    /// Maximum number of companies on one ownership path
    #[arg(long)]
    max_depth: Option<usize>,

    /// Parse files as-is, without joining broken records
    #[arg(long)]
    no_repair: bool,

    /// Write the run summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

impl Args {
    fn resolve_config(&self) -> Result<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => ResolverConfig::default(),
        };

        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(aggregation) = self.aggregation {
            config.aggregation = aggregation;
        }
        if self.max_depth.is_some() {
            config.max_depth = self.max_depth;
        }
        if self.no_repair {
            config.repair_line_breaks = false;
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ubo_resolver=info,ubo_report=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.resolve_config()?;

    let files = config.files.in_dir(&args.data_dir);
    let registry = Registry::load(&files, config.repair_line_breaks)
        .with_context(|| format!("Failed to load registry from {}", args.data_dir.display()))?;

    let run = pipeline::run(&registry, &config);

    report::write_report_file(&run.report, &config.output)
        .with_context(|| format!("Failed to write report: {}", config.output.display()))?;

    if let Some(path) = &args.summary_json {
        let json = serde_json::to_string_pretty(&run.summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary: {}", path.display()))?;
    }

    let summary = &run.summary;
    println!("Run {}", summary.run_id);
    println!(
        "  Founders: {} loaded, {} after cleanup, {} unresolved",
        summary.dedup.input, summary.founders_after_legal_filter, summary.unresolved_founders
    );
    for outcome in &summary.imputation {
        println!(
            "  {:<26} {:>7.2}% -> {:>7.2}% missing ({} updated)",
            outcome.rule.as_str(),
            outcome.missing_before * 100.0,
            outcome.missing_after * 100.0,
            outcome.changed
        );
    }
    println!(
        "  Reported {} owners across {} companies -> {}",
        summary.owners_reported,
        summary.companies_reported,
        config.output.display()
    );

    Ok(())
}
