#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end job statistics pipeline.
//!
//! A run loads the listing CSV, applies category merges, computes every
//! view, renders the requested sections and merges them into the persisted
//! document. Each run recomputes from scratch; sections not requested keep
//! whatever the previous document held.

pub mod config;
pub mod progress;
pub mod sections;

use std::path::PathBuf;
use std::sync::Arc;

use job_market_listing::load::{LoadReport, load_csv};
use job_market_listing::relabel::CategoryRelabel;
use job_market_listing::{ListingError, RecordStore};
use job_market_reference::{ReferenceData, ReferenceError};
use job_market_stats::quality::DataQualityReport;
use job_market_stats::{StatsError, analyze, quality};

use crate::config::PipelineConfig;
use crate::progress::ProgressCallback;
use crate::sections::{InputSummary, Methodology, Section, produce_all};

/// Errors that can occur during a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Loading or relabeling listings failed.
    #[error(transparent)]
    Listing(#[from] ListingError),

    /// Loading the reference tables failed.
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Computing the views failed.
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Writing the document failed.
    #[error(transparent)]
    Document(#[from] job_market_document::DocumentError),

    /// Rendering a section failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is invalid.
    #[error("Invalid configuration {}: {message}", path.display())]
    Config {
        /// Configuration file, empty when parsed from a string.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Listings aggregated.
    pub records: usize,
    /// Sections rewritten.
    pub sections: Vec<Section>,
    /// Document written.
    pub document: PathBuf,
    /// Data-quality issues tolerated under the `warn` policy.
    pub data_quality_issues: usize,
}

/// Stages reported through [`ProgressCallback`] by [`run`].
pub const RUN_STEPS: u64 = 5;

/// Runs the pipeline, rewriting `sections` (every section when empty).
///
/// # Errors
///
/// Returns [`PipelineError`] if any stage fails. The document is only
/// written once every requested section has been computed.
pub fn run(
    config: &PipelineConfig,
    sections: &[Section],
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RunSummary, PipelineError> {
    let sections = if sections.is_empty() {
        Section::all()
    } else {
        sections.to_vec()
    };
    let options = config.analysis_options();
    options.validate()?;
    let merges = config.category_relabel()?;
    progress.set_total(RUN_STEPS);

    progress.set_message("Loading listings".to_string());
    let store = load_csv(&config.input)?;
    let reference = ReferenceData::load_or_embedded(config.reference.as_deref())?;
    let input = InputSummary::from(store.report());
    log::info!(
        "Loaded {} listing(s) from {} ({} skipped, {} rejected)",
        store.len(),
        config.input.display(),
        input.skipped_missing_category,
        input.rows_rejected
    );
    progress.inc(1);

    progress.set_message("Applying category merges".to_string());
    let store = apply_merges(store, &merges);
    progress.inc(1);

    progress.set_message("Computing statistics".to_string());
    let analysis = analyze(store.records(), &reference, &options)?;
    progress.inc(1);

    progress.set_message("Rendering sections".to_string());
    let methodology = Methodology::now(
        config.input.display().to_string(),
        input,
        config.category_merges.clone(),
        options,
        reference.population_source.clone(),
        &sections,
    );
    let fresh = produce_all(&sections, &analysis, &methodology)?;
    progress.inc(1);

    progress.set_message("Writing document".to_string());
    let previous = job_market_document::load_or_empty(&config.document);
    let document = job_market_document::merge(previous, fresh);
    job_market_document::save(&config.document, &document)?;
    progress.inc(1);
    progress.finish(format!(
        "Updated {} section(s) in {}",
        sections.len(),
        config.document.display()
    ));

    Ok(RunSummary {
        records: store.len(),
        sections,
        document: config.document.clone(),
        data_quality_issues: analysis.data_quality.issues.len(),
    })
}

/// Relabels `store` when any merge is configured.
fn apply_merges(store: RecordStore, merges: &CategoryRelabel) -> RecordStore {
    if merges.is_empty() {
        log::debug!("No category merges configured");
        store
    } else {
        store.relabel(merges)
    }
}

/// What `validate` found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Load outcome, including every rejected row.
    pub load: LoadReport,
    /// Many-to-one invariant violations.
    pub data_quality: DataQualityReport,
}

impl ValidationReport {
    /// Whether the input loads without rejections or invariant violations.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.load.rejected.is_empty() && self.data_quality.is_clean()
    }
}

/// Loads and checks the input without computing or writing anything.
///
/// # Errors
///
/// Returns [`PipelineError`] if the configuration is invalid or the input
/// cannot be read at all.
pub fn validate(config: &PipelineConfig) -> Result<ValidationReport, PipelineError> {
    config.analysis_options().validate()?;
    let merges = config.category_relabel()?;
    let store = apply_merges(load_csv(&config.input)?, &merges);
    let (_, data_quality) = quality::check(store.records());

    for issue in &data_quality.issues {
        log::warn!("Data quality: {issue}");
    }

    Ok(ValidationReport {
        load: store.report().clone(),
        data_quality,
    })
}
