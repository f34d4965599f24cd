#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and ranking over job listings.
//!
//! Every view is derived from one [`index::ListingIndex`] built in a single
//! pass over the records. [`analyze`] checks the many-to-one invariants the
//! views rely on, then computes every view at once. There is no incremental
//! update: relabeling categories means calling [`analyze`] again on the
//! relabeled records.

pub mod concentration;
pub mod enrichment;
pub mod group;
pub mod index;
pub mod power;
pub mod quality;
pub mod rank;
pub mod views;

use std::collections::BTreeMap;

use job_market_listing_models::{DistanceBand, ListingRecord};
use job_market_reference::ReferenceData;
use job_market_stats_models::{
    AirportStatistics, CategoryCityEntry, CategoryOverviewEntry, EnhancedAnalysis,
    EnhancedSummary, FocusedCityAnalysis, MetroStatistics, PowerCitiesAnalysis, StateStatistics,
    SummaryStats,
};
use serde::{Deserialize, Serialize};

use crate::index::ListingIndex;
use crate::quality::{DataQualityIssue, DataQualityPolicy, DataQualityReport};

/// Errors that can occur while computing the views.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// One or more many-to-one invariants do not hold.
    #[error("{} data quality issue(s): {}", .issues.len(), format_issues(.issues))]
    DataQuality {
        /// Every violation found.
        issues: Vec<DataQualityIssue>,
    },

    /// An option is out of range.
    #[error("Invalid option {name}: {message}")]
    InvalidOption {
        /// Option name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

fn format_issues(issues: &[DataQualityIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Tunables for [`analyze`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Categories ranked per state.
    pub state_top_n: usize,
    /// Categories ranked per focused city.
    pub city_top_n: usize,
    /// Cities ranked per category for the power-city tiers.
    pub category_top_cities: usize,
    /// Cities in each focused group.
    pub focus_limit: usize,
    /// Farthest band counted as near a metro.
    pub near_threshold: DistanceBand,
    /// What to do about data-quality issues.
    pub data_quality: DataQualityPolicy,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            state_top_n: 5,
            city_top_n: 3,
            category_top_cities: 3,
            focus_limit: 20,
            near_threshold: DistanceBand::Within50,
            data_quality: DataQualityPolicy::Strict,
        }
    }
}

impl AnalysisOptions {
    /// Rejects ranking sizes of zero.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::InvalidOption`] naming the first zero size.
    pub fn validate(&self) -> Result<(), StatsError> {
        for (name, value) in [
            ("state_top_n", self.state_top_n),
            ("city_top_n", self.city_top_n),
            ("category_top_cities", self.category_top_cities),
            ("focus_limit", self.focus_limit),
        ] {
            if value == 0 {
                return Err(StatsError::InvalidOption {
                    name,
                    message: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Every view computed from one set of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Statistics per category.
    pub category_overview: BTreeMap<String, CategoryOverviewEntry>,
    /// Statistics per state.
    pub state_statistics: BTreeMap<String, StateStatistics>,
    /// Statistics per metro area.
    pub metro_area_statistics: BTreeMap<String, MetroStatistics>,
    /// Statistics per airport.
    pub airport_statistics: BTreeMap<String, AirportStatistics>,
    /// category → city → statistics.
    pub detailed_city_breakdown: BTreeMap<String, BTreeMap<String, CategoryCityEntry>>,
    /// Population-driven city selections.
    pub focused_city_analysis: FocusedCityAnalysis,
    /// Concentration and mapping data.
    pub enhanced_analysis: EnhancedAnalysis,
    /// Consistent category leaders.
    pub power_cities_analysis: PowerCitiesAnalysis,
    /// Document-wide counts.
    pub summary_stats: SummaryStats,
    /// Invariant violations tolerated under [`DataQualityPolicy::Warn`].
    pub data_quality: DataQualityReport,
}

/// Computes every view over `records`.
///
/// # Errors
///
/// * [`StatsError::InvalidOption`] if a ranking size is zero
/// * [`StatsError::DataQuality`] if an invariant is violated and the policy
///   is [`DataQualityPolicy::Strict`]
pub fn analyze(
    records: &[ListingRecord],
    reference: &ReferenceData,
    options: &AnalysisOptions,
) -> Result<Analysis, StatsError> {
    options.validate()?;

    let (resolved, data_quality) = quality::check(records);
    data_quality.enforce(options.data_quality)?;

    let index = ListingIndex::build(records);
    let breakdown = views::category_city_breakdown(&index, &resolved);

    let metros = concentration::metro_concentration(&index, &resolved, options.near_threshold);
    let city_mapping_data = enrichment::city_mapping_data(&breakdown, reference);
    let enhanced_analysis = EnhancedAnalysis {
        near_threshold: options.near_threshold,
        metros_by_listings: concentration::metros_by_listings(&metros),
        state_metro_concentration: concentration::state_concentration(&metros),
        summary_stats: EnhancedSummary {
            metros_analyzed: metros.len() as u64,
            cities_with_coordinates: city_mapping_data
                .values()
                .filter(|c| c.coordinates.is_some())
                .count() as u64,
            total_cities_for_mapping: city_mapping_data.len() as u64,
        },
        metro_concentration_50_miles: metros.into_sorted(str::to_string),
        city_mapping_data,
    };

    let top_lists = power::category_top_cities(&breakdown, options.category_top_cities);

    let analysis = Analysis {
        category_overview: views::category_overview(&index),
        state_statistics: views::state_statistics(&index, options.state_top_n),
        metro_area_statistics: views::metro_statistics(&index, &resolved),
        airport_statistics: views::airport_statistics(&index, &resolved),
        detailed_city_breakdown: views::sorted_breakdown(&breakdown),
        focused_city_analysis: enrichment::focused_cities(
            &breakdown,
            reference,
            options.focus_limit,
            options.city_top_n,
        ),
        enhanced_analysis,
        power_cities_analysis: power::power_cities(&top_lists, options.category_top_cities),
        summary_stats: views::summary(&index, &resolved),
        data_quality,
    };

    log::info!(
        "Analyzed {} listing(s): {} categories, {} states, {} metros, {} airports, {} cities",
        analysis.summary_stats.total_records,
        analysis.summary_stats.total_categories,
        analysis.summary_stats.total_states,
        analysis.summary_stats.total_metros,
        analysis.summary_stats.total_airports,
        analysis.summary_stats.total_cities
    );

    Ok(analysis)
}
