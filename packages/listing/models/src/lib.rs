#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Job-listing record types and the distance banding enumeration.
//!
//! A [`ListingRecord`] is one row of the input table: a single search result
//! for a job category in a city, with the number of jobs that result
//! advertised. Every downstream statistic is computed from a collection of
//! these records.

pub mod states;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Distance band between a listing's city and its closest metro center.
///
/// Bands are disjoint and ordered from nearest to farthest, so `<=` on two
/// bands answers "is this band at least as near as that one".
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum DistanceBand {
    /// Inside the metro area itself.
    #[serde(rename = "within_metro")]
    #[strum(to_string = "within_metro", serialize = "Within Metro")]
    WithinMetro,
    /// Outside the metro, up to 25 miles from it.
    #[serde(rename = "within_25")]
    #[strum(
        to_string = "within_25",
        serialize = "Within 25 miles",
        serialize = "within_25_miles"
    )]
    Within25,
    /// Between 25 and 50 miles from the metro.
    #[serde(rename = "within_50")]
    #[strum(
        to_string = "within_50",
        serialize = "Within 50 miles",
        serialize = "within_50_miles"
    )]
    Within50,
    /// More than 50 miles from the metro.
    #[serde(rename = "beyond_50")]
    #[strum(
        to_string = "beyond_50",
        serialize = "Beyond 50 miles",
        serialize = "beyond_50_miles"
    )]
    Beyond50,
}

impl DistanceBand {
    /// Returns all variants of this enum, nearest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::WithinMetro,
            Self::Within25,
            Self::Within50,
            Self::Beyond50,
        ]
    }

    /// Human-readable label, as used by the dashboard legend.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WithinMetro => "Within Metro",
            Self::Within25 => "Within 25 miles",
            Self::Within50 => "Within 50 miles",
            Self::Beyond50 => "Beyond 50 miles",
        }
    }

    /// Whether this band is at least as near as `threshold`.
    #[must_use]
    pub fn is_within(self, threshold: Self) -> bool {
        self <= threshold
    }
}

/// One row of the job-listing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Job category label (e.g. "Registered Nurse").
    pub job_category: String,
    /// Normalized city name.
    pub cleaned_city: String,
    /// Two-letter state abbreviation, validated against [`states::STATE_ABBRS`].
    pub cleaned_state: String,
    /// Jobs advertised by this single listing.
    pub job_count: u64,
    /// Closest metro center, when known.
    pub closest_metro: Option<String>,
    /// Closest commercial airport, when known.
    pub closest_airport: Option<String>,
    /// Distance band to `closest_metro`, when known.
    pub metro_distance_band: Option<DistanceBand>,
    /// Job title extracted from the listing text.
    pub extracted_job_title: String,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn parses_canonical_and_display_labels() {
        assert_eq!(
            DistanceBand::from_str("within_metro").unwrap(),
            DistanceBand::WithinMetro
        );
        assert_eq!(
            DistanceBand::from_str("Within 25 miles").unwrap(),
            DistanceBand::Within25
        );
        assert_eq!(
            DistanceBand::from_str("WITHIN 50 MILES").unwrap(),
            DistanceBand::Within50
        );
        assert_eq!(
            DistanceBand::from_str("beyond_50").unwrap(),
            DistanceBand::Beyond50
        );
    }

    #[test]
    fn rejects_legacy_labels() {
        assert!(DistanceBand::from_str("0-25 miles").is_err());
        assert!(DistanceBand::from_str("25-50 miles").is_err());
    }

    #[test]
    fn display_is_canonical() {
        for band in DistanceBand::all() {
            let parsed = DistanceBand::from_str(&band.to_string()).unwrap();
            assert_eq!(parsed, *band);
        }
        assert_eq!(DistanceBand::Within25.to_string(), "within_25");
    }

    #[test]
    fn ordering_is_nearest_first() {
        assert!(DistanceBand::WithinMetro.is_within(DistanceBand::Within50));
        assert!(DistanceBand::Within50.is_within(DistanceBand::Within50));
        assert!(!DistanceBand::Beyond50.is_within(DistanceBand::Within50));
        assert!(!DistanceBand::Within25.is_within(DistanceBand::WithinMetro));
    }

    #[test]
    fn serializes_snake_case() {
        for band in DistanceBand::all() {
            let json = serde_json::to_string(band).unwrap();
            assert_eq!(json, format!("\"{band}\""));
        }
    }
}
