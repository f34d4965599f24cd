//! CSV loading and per-row validation.
//!
//! Reads the listing table, checks the header for the required columns, and
//! turns every data row into a [`ListingRecord`]. Rows without a category are
//! skipped entirely. Rows with an unknown state, an unparseable job count or
//! an unrecognized distance band are rejected and logged, never guessed at.

use std::io::Read;
use std::path::Path;
use std::str::FromStr as _;

use job_market_listing_models::states::normalize_state;
use job_market_listing_models::{DistanceBand, ListingRecord};
use serde::{Deserialize, Serialize};

use crate::{ListingError, RecordStore};

/// Columns that must be present in the header row.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "job_category",
    "cleaned_city",
    "cleaned_state",
    "job_count",
];

/// Columns read when present; their values default to empty when absent.
pub const OPTIONAL_COLUMNS: &[&str] = &[
    "closest_metro",
    "closest_airport",
    "metro_distance_band",
    "extracted_job_title",
];

/// Maximum number of individual rejections logged at `warn` level before
/// the remainder is summarized.
const MAX_LOGGED_REJECTIONS: usize = 20;

/// A row as it appears in the file, before validation.
#[derive(Debug, Deserialize)]
struct RawListingRow {
    job_category: Option<String>,
    cleaned_city: Option<String>,
    cleaned_state: Option<String>,
    job_count: Option<String>,
    #[serde(default)]
    closest_metro: Option<String>,
    #[serde(default)]
    closest_airport: Option<String>,
    #[serde(default)]
    metro_distance_band: Option<String>,
    #[serde(default)]
    extracted_job_title: Option<String>,
}

/// Why a data row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "value", rename_all = "snake_case")]
pub enum RejectReason {
    /// The city column is empty.
    MissingCity,
    /// The state is not one of the 50 states + DC.
    InvalidState(String),
    /// The job count is missing, negative or not a whole number.
    InvalidJobCount(String),
    /// The distance band is not part of the banding enumeration.
    InvalidDistanceBand(String),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCity => write!(f, "missing city"),
            Self::InvalidState(v) => write!(f, "unknown state '{v}'"),
            Self::InvalidJobCount(v) => write!(f, "invalid job count '{v}'"),
            Self::InvalidDistanceBand(v) => write!(f, "unrecognized distance band '{v}'"),
        }
    }
}

/// A rejected row and where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    /// 1-based line number in the source file.
    pub line: u64,
    /// What was wrong with the row.
    #[serde(flatten)]
    pub reason: RejectReason,
}

/// Outcome of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Data rows read (excluding the header).
    pub rows_read: u64,
    /// Rows that became records.
    pub loaded: u64,
    /// Rows skipped because they have no job category.
    pub skipped_missing_category: u64,
    /// Rows rejected by validation.
    pub rejected: Vec<RowRejection>,
}

/// Loads listings from the CSV file at `path`.
///
/// # Errors
///
/// Returns [`ListingError`] if the file cannot be read, is not valid CSV,
/// or lacks a required column.
pub fn load_csv(path: &Path) -> Result<RecordStore, ListingError> {
    log::info!("Loading listings from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_listings(file)
}

/// Reads listings from any CSV source.
///
/// # Errors
///
/// Returns [`ListingError`] if the input is not valid CSV or lacks a
/// required column.
pub fn read_listings<R: Read>(reader: R) -> Result<RecordStore, ListingError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(ListingError::MissingColumn {
                column: (*column).to_string(),
            });
        }
    }
    for column in OPTIONAL_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            log::warn!("Column '{column}' not present; treating it as empty for every row");
        }
    }

    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for result in reader.records() {
        let row = result?;
        report.rows_read += 1;
        let line = row.position().map_or(report.rows_read + 1, csv::Position::line);

        let raw: RawListingRow = row.deserialize(Some(&headers))?;
        match validate_row(raw) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => report.skipped_missing_category += 1,
            Err(reason) => {
                if report.rejected.len() < MAX_LOGGED_REJECTIONS {
                    log::warn!("Rejecting line {line}: {reason}");
                }
                report.rejected.push(RowRejection { line, reason });
            }
        }
    }

    report.loaded = records.len() as u64;

    if report.rejected.len() > MAX_LOGGED_REJECTIONS {
        log::warn!(
            "... and {} more rejected row(s)",
            report.rejected.len() - MAX_LOGGED_REJECTIONS
        );
    }
    log::info!(
        "Loaded {} listing(s) from {} row(s) ({} without category, {} rejected)",
        report.loaded,
        report.rows_read,
        report.skipped_missing_category,
        report.rejected.len()
    );

    Ok(RecordStore::with_report(records, report))
}

/// Validates one raw row.
///
/// Returns `Ok(None)` for rows without a category, which are not errors
/// but are excluded from every view.
fn validate_row(raw: RawListingRow) -> Result<Option<ListingRecord>, RejectReason> {
    let Some(job_category) = non_empty(raw.job_category) else {
        return Ok(None);
    };

    let cleaned_city = non_empty(raw.cleaned_city).ok_or(RejectReason::MissingCity)?;

    let state_raw = raw.cleaned_state.unwrap_or_default();
    let cleaned_state = normalize_state(&state_raw)
        .ok_or_else(|| RejectReason::InvalidState(state_raw.clone()))?
        .to_string();

    let count_raw = raw.job_count.unwrap_or_default();
    let job_count =
        parse_job_count(&count_raw).ok_or_else(|| RejectReason::InvalidJobCount(count_raw))?;

    let metro_distance_band = match non_empty(raw.metro_distance_band) {
        Some(label) => Some(
            DistanceBand::from_str(&label)
                .map_err(|_| RejectReason::InvalidDistanceBand(label.clone()))?,
        ),
        None => None,
    };

    Ok(Some(ListingRecord {
        job_category,
        cleaned_city,
        cleaned_state,
        job_count,
        closest_metro: non_empty(raw.closest_metro),
        closest_airport: non_empty(raw.closest_airport),
        metro_distance_band,
        extracted_job_title: non_empty(raw.extracted_job_title).unwrap_or_default(),
    }))
}

/// Treats empty strings and the usual null spellings as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan") && !v.eq_ignore_ascii_case("null"))
}

/// Parses a non-negative whole job count.
///
/// Accepts integral floats such as `"12.0"`, which spreadsheet exports
/// produce for integer columns containing blanks.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_job_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<u64>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= 9_007_199_254_740_992.0 {
        Some(v as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "job_category,cleaned_city,cleaned_state,job_count,closest_metro,closest_airport,metro_distance_band,extracted_job_title\n";

    fn load(body: &str) -> RecordStore {
        read_listings(format!("{HEADER}{body}").as_bytes()).unwrap()
    }

    #[test]
    fn loads_valid_rows_in_order() {
        let store = load(
            "Registered Nurse,Mesa,AZ,12,Phoenix,PHX,Within 25 miles,RN - ICU\n\
             Truck Driver,Reno,nv,3,,,,\n",
        );
        assert_eq!(store.len(), 2);

        let first = &store.records()[0];
        assert_eq!(first.job_category, "Registered Nurse");
        assert_eq!(first.cleaned_state, "AZ");
        assert_eq!(first.job_count, 12);
        assert_eq!(first.closest_metro.as_deref(), Some("Phoenix"));
        assert_eq!(first.metro_distance_band, Some(DistanceBand::Within25));

        let second = &store.records()[1];
        assert_eq!(second.cleaned_state, "NV");
        assert_eq!(second.closest_metro, None);
        assert_eq!(second.metro_distance_band, None);
        assert_eq!(second.extracted_job_title, "");
    }

    #[test]
    fn skips_rows_without_category() {
        let store = load(",Mesa,AZ,12,,,,\nnan,Mesa,AZ,3,,,,\nCook,Mesa,AZ,1,,,,\n");
        assert_eq!(store.len(), 1);
        assert_eq!(store.report().skipped_missing_category, 2);
        assert!(store.report().rejected.is_empty());
    }

    #[test]
    fn rejects_unknown_band_and_state() {
        let store = load(
            "Cook,Mesa,AZ,1,Phoenix,PHX,0-25 miles,\n\
             Cook,Mesa,ZZ,1,Phoenix,PHX,within_metro,\n\
             Cook,Mesa,AZ,-4,Phoenix,PHX,within_metro,\n\
             Cook,Mesa,AZ,2,Phoenix,PHX,within_metro,\n",
        );
        assert_eq!(store.len(), 1);

        let reasons: Vec<&RejectReason> =
            store.report().rejected.iter().map(|r| &r.reason).collect();
        assert_eq!(
            reasons,
            vec![
                &RejectReason::InvalidDistanceBand("0-25 miles".to_string()),
                &RejectReason::InvalidState("ZZ".to_string()),
                &RejectReason::InvalidJobCount("-4".to_string()),
            ]
        );
        assert_eq!(store.report().rejected[0].line, 2);
    }

    #[test]
    fn accepts_integral_float_counts() {
        assert_eq!(parse_job_count("12.0"), Some(12));
        assert_eq!(parse_job_count("7"), Some(7));
        assert_eq!(parse_job_count("1.5"), None);
        assert_eq!(parse_job_count(""), None);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = read_listings("job_category,cleaned_city,job_count\nCook,Mesa,1\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, ListingError::MissingColumn { column } if column == "cleaned_state"));
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let store = read_listings(
            "job_category,cleaned_city,cleaned_state,job_count\nCook,Mesa,AZ,4\n".as_bytes(),
        )
        .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].closest_airport, None);
    }
}
