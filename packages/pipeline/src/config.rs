//! Pipeline configuration, read from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. Command-line flags are applied on top by the CLI.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use job_market_listing::relabel::CategoryRelabel;
use job_market_listing_models::DistanceBand;
use job_market_stats::AnalysisOptions;
use job_market_stats::quality::DataQualityPolicy;
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Listing CSV to aggregate.
    pub input: PathBuf,
    /// JSON document to update.
    pub document: PathBuf,
    /// Reference-table TOML; the embedded dataset is used when unset.
    pub reference: Option<PathBuf>,
    /// Categories ranked per state.
    pub state_top_n: usize,
    /// Categories ranked per focused city.
    pub city_top_n: usize,
    /// Cities ranked per category for the power-city tiers.
    pub category_top_cities: usize,
    /// Cities in each population-based focus group.
    pub focus_limit: usize,
    /// Farthest distance band counted as near a metro.
    pub near_threshold: DistanceBand,
    /// `strict` aborts on data-quality issues, `warn` logs them.
    pub data_quality: DataQualityPolicy,
    /// Old category label → replacement label.
    pub category_merges: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let analysis = AnalysisOptions::default();
        Self {
            input: PathBuf::from("job_listings.csv"),
            document: PathBuf::from("job_statistics.json"),
            reference: None,
            state_top_n: analysis.state_top_n,
            city_top_n: analysis.city_top_n,
            category_top_cities: analysis.category_top_cities,
            focus_limit: analysis.focus_limit,
            near_threshold: analysis.near_threshold,
            data_quality: analysis.data_quality,
            category_merges: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the file cannot be read or is not a
    /// valid configuration.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents).map_err(|e| match e {
            PipelineError::Config { message, .. } => PipelineError::Config {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the given file cannot be loaded.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, PipelineError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the TOML is malformed or names
    /// an unknown field.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, PipelineError> {
        toml::from_str(toml_str).map_err(|e| PipelineError::Config {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    /// The analysis tunables of this configuration.
    #[must_use]
    pub const fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            state_top_n: self.state_top_n,
            city_top_n: self.city_top_n,
            category_top_cities: self.category_top_cities,
            focus_limit: self.focus_limit,
            near_threshold: self.near_threshold,
            data_quality: self.data_quality,
        }
    }

    /// The validated category relabel table.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Listing`] if the merge table is malformed.
    pub fn category_relabel(&self) -> Result<CategoryRelabel, PipelineError> {
        Ok(CategoryRelabel::new(
            self.category_merges
                .iter()
                .map(|(old, new)| (old.as_str(), new.as_str())),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.analysis_options(), AnalysisOptions::default());
    }

    #[test]
    fn parses_every_field() {
        let config = PipelineConfig::from_toml_str(
            r#"
            input = "data/listings.csv"
            document = "out/stats.json"
            reference = "data/reference.toml"
            state_top_n = 10
            city_top_n = 2
            category_top_cities = 5
            focus_limit = 15
            near_threshold = "within_25"
            data_quality = "warn"

            [category_merges]
            "Licensed Practical Nurse" = "Registered Nurse"
            "#,
        )
        .unwrap();

        assert_eq!(config.input, PathBuf::from("data/listings.csv"));
        assert_eq!(config.reference, Some(PathBuf::from("data/reference.toml")));
        assert_eq!(config.state_top_n, 10);
        assert_eq!(config.near_threshold, DistanceBand::Within25);
        assert_eq!(config.data_quality, DataQualityPolicy::Warn);

        let relabel = config.category_relabel().unwrap();
        assert_eq!(relabel.apply("Licensed Practical Nurse"), "Registered Nurse");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = PipelineConfig::from_toml_str("top_n = 3").unwrap_err();
        assert!(matches!(err, PipelineError::Config { .. }));
    }

    #[test]
    fn chained_merges_are_rejected() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [category_merges]
            A = "B"
            B = "C"
            "#,
        )
        .unwrap();
        assert!(config.category_relabel().is_err());
    }
}
