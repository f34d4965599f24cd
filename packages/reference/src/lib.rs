#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Static reference tables used to enrich the job statistics.
//!
//! Three tables are supported: approximate city populations, city
//! coordinates (`[lat, lng]`) for mapping, and the set of cities treated as
//! major metro centers. A default dataset is baked into the binary with
//! [`include_str!`]; a replacement can be loaded from any TOML file with the
//! same shape.
//!
//! ```toml
//! population_source = "Approximate 2023 estimates"
//! major_metros = ["Atlanta", "Phoenix"]
//!
//! [populations]
//! "Atlanta" = 500000
//!
//! [coordinates]
//! "Atlanta" = [33.7490, -84.3880]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Reference data baked in at compile time.
const DEFAULT_REFERENCE_TOML: &str = include_str!("../data/reference.toml");

/// Errors that can occur while loading reference tables.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML could not be parsed into reference tables.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A coordinate pair is outside the valid latitude/longitude range.
    #[error("Invalid coordinates for '{city}': [{lat}, {lng}]")]
    InvalidCoordinates {
        /// City the coordinates belong to.
        city: String,
        /// Latitude as given.
        lat: f64,
        /// Longitude as given.
        lng: f64,
    },
}

/// Population, coordinate and major-metro tables keyed by city name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceData {
    /// Free-text description of where the population figures come from.
    #[serde(default)]
    pub population_source: String,
    /// Cities considered major metro centers.
    #[serde(default)]
    pub major_metros: BTreeSet<String>,
    /// Approximate population per city.
    #[serde(default)]
    pub populations: BTreeMap<String, u64>,
    /// `[lat, lng]` per city.
    #[serde(default)]
    pub coordinates: BTreeMap<String, [f64; 2]>,
}

impl ReferenceData {
    /// Returns the embedded default dataset.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError`] if the embedded TOML is malformed.
    pub fn embedded() -> Result<Self, ReferenceError> {
        Self::from_toml_str(DEFAULT_REFERENCE_TOML)
    }

    /// Loads reference tables from the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let contents = std::fs::read_to_string(path)?;
        let data = Self::from_toml_str(&contents)?;
        log::info!(
            "Loaded reference data from {} ({} populations, {} coordinates, {} major metros)",
            path.display(),
            data.populations.len(),
            data.coordinates.len(),
            data.major_metros.len()
        );
        Ok(data)
    }

    /// Loads from `path` when given, otherwise returns the embedded default.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError`] if the selected source cannot be read or
    /// parsed.
    pub fn load_or_embedded(path: Option<&Path>) -> Result<Self, ReferenceError> {
        path.map_or_else(Self::embedded, Self::load)
    }

    /// Parses reference tables from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError`] if the TOML is malformed or a coordinate
    /// pair is out of range.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ReferenceError> {
        let data: Self = toml::from_str(toml_str)?;
        for (city, &[lat, lng]) in &data.coordinates {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(ReferenceError::InvalidCoordinates {
                    city: city.clone(),
                    lat,
                    lng,
                });
            }
        }
        Ok(data)
    }

    /// Approximate population of `city` in `state`, if known.
    ///
    /// A `"City, ST"` entry wins over a plain `"City"` entry.
    #[must_use]
    pub fn population(&self, city: &str, state: &str) -> Option<u64> {
        lookup(&self.populations, city, state)
    }

    /// `[lat, lng]` of `city` in `state`, if known.
    #[must_use]
    pub fn coordinates(&self, city: &str, state: &str) -> Option<[f64; 2]> {
        lookup(&self.coordinates, city, state)
    }

    /// Whether `city` is a major metro center.
    #[must_use]
    pub fn is_major_metro(&self, city: &str) -> bool {
        self.major_metros.contains(city)
    }
}

fn lookup<V: Copy>(table: &BTreeMap<String, V>, city: &str, state: &str) -> Option<V> {
    table
        .get(&format!("{city}, {state}"))
        .or_else(|| table.get(city))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_dataset_parses() {
        let data = ReferenceData::embedded().unwrap();
        assert_eq!(data.major_metros.len(), 20);
        assert_eq!(data.populations.len(), 116);
        assert_eq!(data.coordinates.len(), 84);
        assert!(!data.population_source.is_empty());
    }

    #[test]
    fn lookups() {
        let data = ReferenceData::embedded().unwrap();
        assert_eq!(data.population("Mesa", "AZ"), Some(510_000));
        assert_eq!(data.population("Nowhere", "AZ"), None);
        assert!(data.is_major_metro("Phoenix"));
        assert!(!data.is_major_metro("Mesa"));
        assert_eq!(data.coordinates("Reno", "NV"), Some([39.5296, -119.8138]));
        assert_eq!(data.coordinates("Fernley", "NV"), None);
    }

    #[test]
    fn shared_city_names_resolve_by_state() {
        let data = ReferenceData::embedded().unwrap();
        assert_eq!(data.population("Mesquite", "TX"), Some(140_000));
        assert_eq!(data.population("Mesquite", "NV"), Some(20_000));
        assert_eq!(data.population("Smyrna", "GA"), Some(55_000));
        assert_eq!(data.population("Smyrna", "TN"), Some(50_000));
        assert_eq!(data.population("Smyrna", "DE"), None);
    }

    #[test]
    fn every_major_metro_has_a_population() {
        let data = ReferenceData::embedded().unwrap();
        for metro in &data.major_metros {
            assert!(
                data.populations.contains_key(metro.as_str()),
                "{metro} has no population"
            );
        }
    }

    #[test]
    fn qualified_entry_wins_over_plain_name() {
        let data = ReferenceData::from_toml_str(
            "[populations]\n\"Aurora\" = 390000\n\"Aurora, IL\" = 180000\n",
        )
        .unwrap();
        assert_eq!(data.population("Aurora", "IL"), Some(180_000));
        assert_eq!(data.population("Aurora", "CO"), Some(390_000));
    }

    #[test]
    fn missing_tables_default_to_empty() {
        let data = ReferenceData::from_toml_str("major_metros = [\"Reno\"]").unwrap();
        assert!(data.populations.is_empty());
        assert!(data.coordinates.is_empty());
        assert!(data.is_major_metro("Reno"));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = ReferenceData::from_toml_str("[coordinates]\n\"Atlantis\" = [123.0, 10.0]\n")
            .unwrap_err();
        assert!(matches!(err, ReferenceError::InvalidCoordinates { .. }));
    }
}
