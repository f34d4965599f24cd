#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory record store for job listings.
//!
//! Listings are read once from a CSV file, validated row by row, and held
//! in input order for the rest of the run. The only mutation the store
//! allows is a whole-collection category relabel (see [`relabel`]), which
//! produces a new store that must be re-aggregated from scratch.

pub mod load;
pub mod relabel;

use job_market_listing_models::ListingRecord;

use crate::load::LoadReport;
use crate::relabel::CategoryRelabel;

/// Errors that can occur while loading or relabeling listings.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV framing or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The header row lacks a required column.
    #[error("Missing required column '{column}'")]
    MissingColumn {
        /// Name of the absent column.
        column: String,
    },

    /// A category merge table is malformed.
    #[error("Invalid category merge: {message}")]
    Relabel {
        /// Description of what went wrong.
        message: String,
    },
}

/// Ordered, immutable collection of validated listings for one run.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<ListingRecord>,
    report: LoadReport,
}

impl RecordStore {
    /// Wraps already-validated records, e.g. built in memory by tests.
    #[must_use]
    pub fn from_records(records: Vec<ListingRecord>) -> Self {
        let report = LoadReport {
            rows_read: records.len() as u64,
            loaded: records.len() as u64,
            ..LoadReport::default()
        };
        Self { records, report }
    }

    pub(crate) const fn with_report(records: Vec<ListingRecord>, report: LoadReport) -> Self {
        Self { records, report }
    }

    /// The listings, in input order.
    #[must_use]
    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    /// Number of listings held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no listings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// What happened while loading: rows read, skipped and rejected.
    #[must_use]
    pub const fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Applies `relabel` to every record and returns the resulting store.
    ///
    /// Consumes `self` so that no aggregate computed from the old labels
    /// can be mixed with the new collection.
    #[must_use]
    pub fn relabel(self, merges: &CategoryRelabel) -> Self {
        let (records, changed) = crate::relabel::relabel(self.records, merges);
        if changed > 0 {
            log::info!(
                "Relabeled {changed} listing(s) across {} category merge(s)",
                merges.len()
            );
        }
        Self {
            records,
            report: self.report,
        }
    }
}
