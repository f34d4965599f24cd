//! Many-to-one invariants between listing attributes.
//!
//! Several views attach a single attribute to a group: a metro's state, an
//! airport's state, a city's metro, airport and distance band. Those
//! attachments are only meaningful if every record of the group agrees, so
//! the invariants are checked explicitly and every conflicting value is
//! reported. A city is identified by name and state together, so cities
//! sharing a name across states never conflict.

use job_market_listing_models::{DistanceBand, ListingRecord};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::StatsError;
use crate::group::GroupMap;
use crate::index::CityKey;

/// What to do when a many-to-one invariant is violated.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DataQualityPolicy {
    /// Abort the run.
    #[default]
    Strict,
    /// Log a warning and keep the first-seen value.
    Warn,
}

/// A many-to-one relationship that must hold in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Invariant {
    /// Each metro lies in one state.
    #[strum(to_string = "metro -> state")]
    MetroState,
    /// Each airport lies in one state.
    #[strum(to_string = "airport -> state")]
    AirportState,
    /// Each city has one closest metro.
    #[strum(to_string = "city -> closest_metro")]
    CityMetro,
    /// Each city has one closest airport.
    #[strum(to_string = "city -> closest_airport")]
    CityAirport,
    /// Each city has one distance band.
    #[strum(to_string = "city -> metro_distance_band")]
    CityBand,
}

/// One violated invariant and every value seen for the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataQualityIssue {
    /// Which relationship is violated.
    pub invariant: Invariant,
    /// The metro or airport name, or `"City, ST"`.
    pub key: String,
    /// Distinct values seen, in first-seen order.
    pub values: Vec<String>,
}

impl std::fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} violated for '{}': {}",
            self.invariant,
            self.key,
            self.values.join(", ")
        )
    }
}

/// Result of checking every invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQualityReport {
    /// Violations, grouped by invariant.
    pub issues: Vec<DataQualityIssue>,
}

impl DataQualityReport {
    /// Whether every invariant holds.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Applies `policy`: errors under [`DataQualityPolicy::Strict`], logs
    /// each issue under [`DataQualityPolicy::Warn`].
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::DataQuality`] if there are issues and the
    /// policy is strict.
    pub fn enforce(&self, policy: DataQualityPolicy) -> Result<(), StatsError> {
        if self.is_clean() {
            return Ok(());
        }
        match policy {
            DataQualityPolicy::Strict => Err(StatsError::DataQuality {
                issues: self.issues.clone(),
            }),
            DataQualityPolicy::Warn => {
                for issue in &self.issues {
                    log::warn!("Data quality: {issue}; keeping first-seen value");
                }
                Ok(())
            }
        }
    }
}

/// Attributes attached to a city wherever a single value is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityAttributes<'a> {
    /// State abbreviation.
    pub state: &'a str,
    /// Closest metro.
    pub metro: Option<&'a str>,
    /// Closest airport.
    pub airport: Option<&'a str>,
    /// Distance band to the closest metro.
    pub band: Option<DistanceBand>,
}

impl<'a> CityAttributes<'a> {
    /// The attributes carried by a single record.
    #[must_use]
    pub fn of(record: &'a ListingRecord) -> Self {
        Self {
            state: &record.cleaned_state,
            metro: record.closest_metro.as_deref(),
            airport: record.closest_airport.as_deref(),
            band: record.metro_distance_band,
        }
    }
}

/// First-seen values for every many-to-one attribute.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAttributes<'a> {
    metro_state: GroupMap<&'a str, &'a str>,
    airport_state: GroupMap<&'a str, &'a str>,
    cities: GroupMap<CityKey<'a>, CityAttributes<'a>>,
}

impl<'a> ResolvedAttributes<'a> {
    /// State of `metro`.
    #[must_use]
    pub fn metro_state(&self, metro: &str) -> Option<&'a str> {
        self.metro_state.get(metro).copied()
    }

    /// State of `airport`.
    #[must_use]
    pub fn airport_state(&self, airport: &str) -> Option<&'a str> {
        self.airport_state.get(airport).copied()
    }

    /// Attributes of the city of `record`, falling back to the record's
    /// own values for a city that was never resolved.
    #[must_use]
    pub fn city_attributes(&self, record: &'a ListingRecord) -> CityAttributes<'a> {
        self.cities
            .get(&CityKey::of(record))
            .copied()
            .unwrap_or_else(|| CityAttributes::of(record))
    }

    /// Number of distinct cities.
    #[must_use]
    pub fn city_count(&self) -> usize {
        self.cities.len()
    }
}

/// A value that can be shown in a data-quality report.
trait Describe: Copy + PartialEq {
    fn describe(self) -> String;
}

impl Describe for &str {
    fn describe(self) -> String {
        self.to_string()
    }
}

impl Describe for Option<&str> {
    fn describe(self) -> String {
        self.map_or_else(|| "(none)".to_string(), str::to_string)
    }
}

impl Describe for Option<DistanceBand> {
    fn describe(self) -> String {
        self.map_or_else(|| "(none)".to_string(), |band| band.to_string())
    }
}

/// Distinct values of `value` per `key`, both in first-seen order.
fn distinct_values<'a, K: Ord + Clone, V: Describe>(
    records: &'a [ListingRecord],
    key: impl Fn(&'a ListingRecord) -> Option<K>,
    value: impl Fn(&'a ListingRecord) -> V,
) -> GroupMap<K, Vec<V>> {
    let mut seen: GroupMap<K, Vec<V>> = GroupMap::new();
    for record in records {
        if let Some(k) = key(record) {
            let v = value(record);
            let values = seen.get_or_insert_with(k, Vec::new);
            if !values.contains(&v) {
                values.push(v);
            }
        }
    }
    seen
}

/// Records an issue for every key with more than one value and resolves
/// each key to its first-seen value.
fn resolve<K: Ord + Clone + std::fmt::Display, V: Describe>(
    invariant: Invariant,
    seen: GroupMap<K, Vec<V>>,
    issues: &mut Vec<DataQualityIssue>,
) -> GroupMap<K, V> {
    for (key, values) in seen.iter() {
        if values.len() > 1 {
            issues.push(DataQualityIssue {
                invariant,
                key: key.to_string(),
                values: values.iter().map(|&v| v.describe()).collect(),
            });
        }
    }
    seen.map_values(|_, values| values[0])
}

fn city_key(record: &ListingRecord) -> Option<CityKey<'_>> {
    Some(CityKey::of(record))
}

/// Checks every many-to-one invariant over `records`.
///
/// Returns the first-seen value of each attribute along with every
/// violation found. Applying a [`DataQualityPolicy`] is left to the caller.
#[must_use]
pub fn check(records: &[ListingRecord]) -> (ResolvedAttributes<'_>, DataQualityReport) {
    let mut issues = Vec::new();

    let metro_state = resolve(
        Invariant::MetroState,
        distinct_values(
            records,
            |r| r.closest_metro.as_deref(),
            |r| r.cleaned_state.as_str(),
        ),
        &mut issues,
    );
    let airport_state = resolve(
        Invariant::AirportState,
        distinct_values(
            records,
            |r| r.closest_airport.as_deref(),
            |r| r.cleaned_state.as_str(),
        ),
        &mut issues,
    );

    let city_metro = resolve(
        Invariant::CityMetro,
        distinct_values(records, city_key, |r| r.closest_metro.as_deref()),
        &mut issues,
    );
    let city_airport = resolve(
        Invariant::CityAirport,
        distinct_values(records, city_key, |r| r.closest_airport.as_deref()),
        &mut issues,
    );
    let city_band = resolve(
        Invariant::CityBand,
        distinct_values(records, city_key, |r| r.metro_distance_band),
        &mut issues,
    );

    let cities = city_metro.map_values(|city, metro| CityAttributes {
        state: city.state,
        metro,
        airport: city_airport.get(city).copied().flatten(),
        band: city_band.get(city).copied().flatten(),
    });

    if issues.is_empty() {
        log::debug!(
            "Data quality: {} metros, {} airports, {} cities consistent",
            metro_state.len(),
            airport_state.len(),
            cities.len()
        );
    }

    (
        ResolvedAttributes {
            metro_state,
            airport_state,
            cities,
        },
        DataQualityReport { issues },
    )
}
