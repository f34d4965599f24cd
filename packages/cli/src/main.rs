#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the job listing statistics pipeline.
//!
//! Uses `indicatif-log-bridge` (via [`job_market_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the stage bar never fight for the terminal.

mod interactive;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use job_market_cli_utils::{IndicatifProgress, MultiProgress};
use job_market_listing::relabel::CategoryRelabel;
use job_market_listing_models::DistanceBand;
use job_market_pipeline::config::PipelineConfig;
use job_market_pipeline::sections::Section;
use job_market_pipeline::{RUN_STEPS, ValidationReport, run, validate};
use job_market_stats::quality::DataQualityPolicy;

#[derive(Parser)]
#[command(name = "job_market", about = "Job listing statistics pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags shared by every command that reads the listings.
#[derive(Args)]
struct InputArgs {
    /// Pipeline configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Listing CSV (overrides `input` in the config file)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Reference-table TOML (defaults to the embedded dataset)
    #[arg(long)]
    reference: Option<PathBuf>,
    /// Merge one category into another before aggregating, as `OLD=NEW`.
    /// May be repeated.
    #[arg(long = "merge-category")]
    merge_category: Vec<String>,
    /// `strict` aborts on inconsistent metro/airport/city attributes,
    /// `warn` logs them and keeps the first-seen value
    #[arg(long)]
    data_quality: Option<DataQualityPolicy>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute statistics and merge them into the document
    Run {
        #[command(flatten)]
        input: InputArgs,
        /// JSON document to update (overrides `document` in the config file)
        #[arg(long)]
        document: Option<PathBuf>,
        /// Comma-separated sections to rewrite (e.g., `summary_stats,state_statistics`).
        /// If not specified, every section is rewritten.
        #[arg(long, value_delimiter = ',')]
        sections: Vec<Section>,
        /// Categories ranked per state
        #[arg(long)]
        state_top_n: Option<usize>,
        /// Categories ranked per focused city
        #[arg(long)]
        city_top_n: Option<usize>,
        /// Farthest distance band counted as near a metro (e.g., `within_25`)
        #[arg(long)]
        near_threshold: Option<DistanceBand>,
    },
    /// Load and check the listings without writing anything
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },
    /// List the document sections
    Sections,
}

/// Loads the configuration file and applies the shared flag overrides.
fn resolve_config(args: InputArgs) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = PipelineConfig::load_or_default(args.config.as_deref())?;
    if let Some(input) = args.input {
        config.input = input;
    }
    if let Some(reference) = args.reference {
        config.reference = Some(reference);
    }
    if let Some(policy) = args.data_quality {
        config.data_quality = policy;
    }
    for raw in &args.merge_category {
        let (old, new) = CategoryRelabel::parse_pair(raw)?;
        config.category_merges.insert(old, new);
    }
    Ok(config)
}

fn run_pipeline(
    multi: &MultiProgress,
    config: &PipelineConfig,
    sections: &[Section],
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let progress = IndicatifProgress::stages_bar(multi, "Starting", RUN_STEPS);
    let summary = run(config, sections, &progress)?;

    log::info!(
        "Aggregated {} listing(s) into {} section(s) of {} in {:.1}s",
        summary.records,
        summary.sections.len(),
        summary.document.display(),
        start.elapsed().as_secs_f64()
    );
    if summary.data_quality_issues > 0 {
        log::warn!(
            "{} data quality issue(s) tolerated; see warnings above",
            summary.data_quality_issues
        );
    }
    Ok(())
}

const MAX_PRINTED_REJECTIONS: usize = 20;

fn print_validation(report: &ValidationReport) {
    let load = &report.load;
    println!("Rows read:                {}", load.rows_read);
    println!("Rows loaded:              {}", load.loaded);
    println!("Skipped (no category):    {}", load.skipped_missing_category);
    println!("Rejected:                 {}", load.rejected.len());
    for rejection in load.rejected.iter().take(MAX_PRINTED_REJECTIONS) {
        println!("  line {}: {}", rejection.line, rejection.reason);
    }
    if load.rejected.len() > MAX_PRINTED_REJECTIONS {
        println!(
            "  ... and {} more",
            load.rejected.len() - MAX_PRINTED_REJECTIONS
        );
    }
    println!("Data quality issues:      {}", report.data_quality.issues.len());
    for issue in &report.data_quality.issues {
        println!("  {issue}");
    }
}

fn print_sections() {
    println!("{:<26} DESCRIPTION", "SECTION");
    println!("{}", "-".repeat(80));
    for section in Section::all() {
        println!("{:<26} {}", section.as_ref(), section.description());
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = job_market_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi);
    };

    match command {
        Commands::Run {
            input,
            document,
            sections,
            state_top_n,
            city_top_n,
            near_threshold,
        } => {
            let mut config = resolve_config(input)?;
            if let Some(document) = document {
                config.document = document;
            }
            if let Some(n) = state_top_n {
                config.state_top_n = n;
            }
            if let Some(n) = city_top_n {
                config.city_top_n = n;
            }
            if let Some(band) = near_threshold {
                config.near_threshold = band;
            }
            run_pipeline(&multi, &config, &sections)?;
        }
        Commands::Validate { input } => {
            let config = resolve_config(input)?;
            let report = validate(&config)?;
            print_validation(&report);
            if !report.is_clean() {
                return Err(format!(
                    "{} rejected row(s), {} data quality issue(s)",
                    report.load.rejected.len(),
                    report.data_quality.issues.len()
                )
                .into());
            }
        }
        Commands::Sections => print_sections(),
    }

    Ok(())
}
