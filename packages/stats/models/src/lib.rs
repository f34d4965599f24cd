#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for every statistical view of the job-listing data.
//!
//! These are plain serializable structs. Field names are the JSON keys the
//! dashboard reads, so renaming a field is a breaking change to the
//! persisted document.

use std::collections::BTreeMap;

use job_market_listing_models::DistanceBand;
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Descriptive statistics over the `job_count` of a group of listings.
///
/// `mean`, `median` and `std` are rounded to one decimal place. `std` is
/// the sample standard deviation and is `0.0` for single-listing groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateStat {
    /// Number of listings in the group.
    #[serde(rename = "listings_count")]
    pub count: u64,
    /// Mean jobs per listing.
    #[serde(rename = "avg_jobs_per_listing")]
    pub mean: f64,
    /// Median jobs per listing.
    #[serde(rename = "median_jobs")]
    pub median: f64,
    /// Smallest job count.
    #[serde(rename = "min_jobs")]
    pub min: u64,
    /// Largest job count.
    #[serde(rename = "max_jobs")]
    pub max: u64,
    /// Sample standard deviation of the job counts.
    #[serde(rename = "std_jobs")]
    pub std: f64,
}

/// An item with its 1-based position in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry<T> {
    /// 1 = highest metric.
    pub rank: usize,
    /// The ranked item; its fields are inlined next to `rank`.
    #[serde(flatten)]
    pub item: T,
}

/// A top-N ranking serialized under a key carrying its size, such as
/// `top_5_categories`.
#[derive(Debug, Clone, PartialEq)]
pub struct TopCategories<T> {
    /// Requested ranking size.
    pub n: usize,
    /// Ranked entries, at most `n` of them.
    pub entries: Vec<RankedEntry<T>>,
}

impl<T> TopCategories<T> {
    /// JSON key for this ranking.
    #[must_use]
    pub fn key(&self) -> String {
        format!("top_{}_categories", self.n)
    }
}

impl<T: Serialize> Serialize for TopCategories<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key(), &self.entries)?;
        map.end()
    }
}

// ── Category overview ───────────────────────────────────────────────

/// Statistics for one category across every location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOverviewEntry {
    /// Listing-level statistics.
    #[serde(flatten)]
    pub stats: AggregateStat,
    /// Distinct cities with at least one listing.
    pub cities_count: u64,
    /// Distinct states with at least one listing.
    pub states_count: u64,
    /// Mean of each city's own mean.
    pub avg_jobs_per_city: f64,
    /// Mean jobs per listing, per state.
    pub state_averages: BTreeMap<String, f64>,
}

// ── Category → city ─────────────────────────────────────────────────

/// Statistics for one (category, city) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCityEntry {
    /// State the city belongs to.
    pub state: String,
    /// Closest metro center.
    pub closest_metro: Option<String>,
    /// Closest airport.
    pub closest_airport: Option<String>,
    /// Distance band to the closest metro.
    pub metro_distance_band: Option<DistanceBand>,
    /// Listing-level statistics.
    #[serde(flatten)]
    pub stats: AggregateStat,
}

// ── State → category ────────────────────────────────────────────────

/// Statistics for one category within one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateCategoryEntry {
    /// Listing-level statistics.
    #[serde(flatten)]
    pub stats: AggregateStat,
    /// Distinct cities with at least one listing.
    pub cities_count: u64,
    /// Distinct extracted job titles.
    pub titles_count: u64,
    /// Mean of each city's own mean.
    pub avg_jobs_per_city: f64,
}

/// One row of a state's top-categories ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateTopCategory {
    /// Category label.
    pub category: String,
    /// Mean jobs per listing.
    pub avg_jobs_per_listing: f64,
    /// Mean of each city's own mean.
    pub avg_jobs_per_city: f64,
    /// Distinct cities with at least one listing.
    pub cities_count: u64,
}

/// Everything known about one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateStatistics {
    /// Listings in the state.
    pub total_listings: u64,
    /// Distinct cities in the state.
    pub total_cities: u64,
    /// Distinct categories in the state.
    pub total_categories: u64,
    /// Distinct extracted job titles in the state.
    pub total_titles: u64,
    /// Per-category statistics.
    pub categories: BTreeMap<String, StateCategoryEntry>,
    /// Categories ranked by mean jobs per listing.
    #[serde(flatten)]
    pub top_categories: TopCategories<StateTopCategory>,
}

// ── Metro / airport → category ──────────────────────────────────────

/// Listings of a category within a distance subtotal of a metro or airport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandSubtotal {
    /// Listings in the subtotal.
    pub listings: u64,
    /// Mean jobs per listing, `0.0` when there are none.
    pub avg_jobs: f64,
    /// Distinct cities in the subtotal.
    pub cities: u64,
}

/// Statistics for one category around one metro or airport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaCategoryEntry {
    /// Listing-level statistics.
    #[serde(flatten)]
    pub stats: AggregateStat,
    /// Distinct cities with at least one listing.
    pub cities_count: u64,
    /// Distinct extracted job titles.
    pub titles_count: u64,
    /// Mean of each city's own mean.
    pub avg_jobs_per_city: f64,
    /// Listings within the metro or up to 25 miles from it.
    pub within_25_miles: BandSubtotal,
    /// Listings up to 50 miles from the metro.
    pub within_50_miles: BandSubtotal,
}

/// Listing count for one category, used by listing-count rankings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryListingCount {
    /// Category label.
    pub category: String,
    /// Listings of that category.
    pub listings: u64,
}

/// Everything known about one metro area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetroStatistics {
    /// State the metro center is in.
    pub state: String,
    /// Listings whose closest metro is this one.
    pub total_listings: u64,
    /// Distinct cities served.
    pub total_cities: u64,
    /// Distinct categories.
    pub total_categories: u64,
    /// Per-category statistics.
    pub categories: BTreeMap<String, AreaCategoryEntry>,
    /// Categories ranked by listing count.
    pub top_categories_by_listings: Vec<RankedEntry<CategoryListingCount>>,
}

/// Everything known about one airport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportStatistics {
    /// State the airport is in.
    pub state: String,
    /// Distinct states among the cities served.
    pub states_served: u64,
    /// Listings whose closest airport is this one.
    pub total_listings: u64,
    /// Distinct cities served.
    pub total_cities: u64,
    /// Distinct categories.
    pub total_categories: u64,
    /// Per-category statistics.
    pub categories: BTreeMap<String, AreaCategoryEntry>,
    /// Categories ranked by listing count.
    pub top_categories_by_listings: Vec<RankedEntry<CategoryListingCount>>,
}

// ── Concentration ───────────────────────────────────────────────────

/// Share of a metro's listings that fall near the metro center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetroConcentration {
    /// State the metro center is in.
    pub state: String,
    /// Listings with a distance band (sum of the four band counts).
    pub total_listings: u64,
    /// Distinct cities among those listings.
    pub unique_cities: u64,
    /// Listings inside the metro.
    pub within_metro: u64,
    /// Listings up to 25 miles out.
    pub within_25_miles: u64,
    /// Listings 25 to 50 miles out.
    pub within_50_miles: u64,
    /// Listings more than 50 miles out.
    pub beyond_50_miles: u64,
    /// `within_metro + within_25_miles + within_50_miles`.
    pub within_50_total: u64,
    /// Listings at or inside the configured near threshold.
    pub near_listings: u64,
    /// `near_listings / total_listings * 100`, rounded to one decimal.
    pub concentration_percentage: f64,
    /// Distinct categories among those listings.
    pub categories_count: u64,
    /// Most-listed categories.
    pub top_categories: Vec<RankedEntry<CategoryListingCount>>,
}

/// One row of the metros-by-size ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetroRankItem {
    /// Metro name.
    pub metro: String,
    /// State the metro center is in.
    pub state: String,
    /// Listings with a distance band.
    pub total_listings: u64,
    /// Near-listing share.
    pub concentration_percentage: f64,
}

/// A metro's contribution to its state's concentration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateMetroEntry {
    /// Metro name.
    pub metro: String,
    /// Listings with a distance band.
    pub total_listings: u64,
    /// Listings up to 50 miles out.
    pub within_50_total: u64,
    /// Listings at or inside the near threshold.
    pub near_listings: u64,
    /// Near-listing share.
    pub concentration_percentage: f64,
    /// Distinct cities.
    pub unique_cities: u64,
}

/// Concentration summed over every metro centered in a state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateConcentration {
    /// The state's metros, largest first.
    pub metros: Vec<StateMetroEntry>,
    /// Number of metros.
    pub total_metros: u64,
    /// Listings across the state's metros.
    pub total_listings: u64,
    /// Listings up to 50 miles out, across the state's metros.
    pub total_within_50_miles: u64,
    /// Near listings across the state's metros.
    pub total_near_listings: u64,
    /// Sum of each metro's distinct city count.
    pub total_cities: u64,
    /// Listing-weighted share: `total_near_listings / total_listings * 100`.
    pub state_concentration_percentage: f64,
    /// Unweighted mean of the metros' percentages.
    pub avg_concentration: f64,
}

// ── Mapping ─────────────────────────────────────────────────────────

/// Per-category values shown on the map for one city.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MappingCategory {
    /// Mean jobs per listing.
    pub avg_jobs: f64,
    /// Listings.
    pub listings: u64,
    /// Smallest job count.
    pub min_jobs: u64,
    /// Largest job count.
    pub max_jobs: u64,
}

/// A city as shown on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingCity {
    /// State the city belongs to.
    pub state: String,
    /// `[lat, lng]`, when the reference table knows the city.
    pub coordinates: Option<[f64; 2]>,
    /// Per-category values.
    pub categories: BTreeMap<String, MappingCategory>,
}

/// Counts describing the enhanced analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnhancedSummary {
    /// Metros with at least one banded listing.
    pub metros_analyzed: u64,
    /// Mapped cities with known coordinates.
    pub cities_with_coordinates: u64,
    /// Mapped cities.
    pub total_cities_for_mapping: u64,
}

/// Concentration and mapping data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedAnalysis {
    /// Farthest band counted as near.
    pub near_threshold: DistanceBand,
    /// Per-metro concentration.
    pub metro_concentration_50_miles: BTreeMap<String, MetroConcentration>,
    /// Metros ranked by listing count.
    pub metros_by_listings: Vec<RankedEntry<MetroRankItem>>,
    /// Per-state concentration.
    pub state_metro_concentration: BTreeMap<String, StateConcentration>,
    /// Every city, with optional coordinates.
    pub city_mapping_data: BTreeMap<String, MappingCity>,
    /// Counts.
    pub summary_stats: EnhancedSummary,
}

// ── Focused cities ──────────────────────────────────────────────────

/// One row of a city's top-categories ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityTopCategory {
    /// Category label.
    pub category: String,
    /// Mean jobs per listing.
    pub avg_jobs_per_listing: f64,
    /// Listings.
    pub listings_count: u64,
}

/// A city selected for focused analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusedCity {
    /// City name.
    pub city: String,
    /// State the city belongs to.
    pub state: String,
    /// Approximate population.
    pub population: u64,
    /// Whether the city is a major metro center.
    pub is_major_metro: bool,
    /// Per-category statistics for the city.
    pub job_categories: BTreeMap<String, CategoryCityEntry>,
    /// Number of categories with listings.
    pub category_count: u64,
    /// Listings across every category.
    pub total_listings: u64,
    /// Mean of the per-category means.
    pub avg_jobs_across_categories: f64,
    /// Categories ranked by mean jobs per listing.
    #[serde(flatten)]
    pub top_categories: TopCategories<CityTopCategory>,
}

/// How the focused city groups were selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FocusedMethodology {
    /// Selection rule for `top_by_population`.
    pub top_population_criteria: String,
    /// Selection rule for `top_outside_major_metros`.
    pub outside_metros_criteria: String,
    /// The major metro set.
    pub major_metros_defined: Vec<String>,
    /// Where population figures come from.
    pub population_source: String,
}

/// Counts describing the focused city analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FocusedSummary {
    /// Cities present in both the job data and the population table.
    pub total_cities_with_population_data: u64,
    /// Size of the major metro set.
    pub major_metros_count: u64,
    /// Cities in `top_by_population`.
    pub top_pop_with_jobs: u64,
    /// Cities in `top_outside_major_metros`.
    pub outside_metros_with_jobs: u64,
}

/// Population-driven city selections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusedCityAnalysis {
    /// Selection rules.
    pub methodology: FocusedMethodology,
    /// Most populous cities with job data, largest first.
    pub top_by_population: Vec<RankedEntry<FocusedCity>>,
    /// Most populous non-major-metro cities with job data, largest first.
    pub top_outside_major_metros: Vec<RankedEntry<FocusedCity>>,
    /// The population table used.
    pub city_populations: BTreeMap<String, u64>,
    /// Counts.
    pub summary: FocusedSummary,
}

// ── Power cities ────────────────────────────────────────────────────

/// Consistency tier of a city appearing in per-category top lists.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tier {
    /// Top-list appearances in 8 or more categories.
    ConsistentLeader,
    /// Top-list appearances in 4 to 7 categories.
    OccasionalLeader,
    /// Top-list appearances in 1 to 3 categories.
    Specialist,
}

impl Tier {
    /// Minimum appearances for [`Tier::ConsistentLeader`].
    pub const CONSISTENT_MIN: u64 = 8;
    /// Minimum appearances for [`Tier::OccasionalLeader`].
    pub const OCCASIONAL_MIN: u64 = 4;

    /// Tier for a number of top-list appearances, `None` for zero.
    #[must_use]
    pub const fn from_appearances(appearances: u64) -> Option<Self> {
        match appearances {
            0 => None,
            n if n >= Self::CONSISTENT_MIN => Some(Self::ConsistentLeader),
            n if n >= Self::OCCASIONAL_MIN => Some(Self::OccasionalLeader),
            _ => Some(Self::Specialist),
        }
    }

    /// Human-readable description of the tier's range.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ConsistentLeader => "8+ categories in top list",
            Self::OccasionalLeader => "4-7 categories in top list",
            Self::Specialist => "1-3 categories in top list",
        }
    }
}

/// One city in a category's top list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCityEntry {
    /// City name.
    pub city: String,
    /// State the city belongs to.
    pub state: String,
    /// Mean jobs per listing.
    pub avg_jobs: f64,
    /// Listings.
    pub listings: u64,
    /// Smallest job count.
    pub min_jobs: u64,
    /// Largest job count.
    pub max_jobs: u64,
}

/// The rank-1 city of a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryLeader {
    /// City name.
    pub city: String,
    /// State the city belongs to.
    pub state: String,
    /// Mean jobs per listing.
    pub avg_jobs: f64,
}

/// One top-list appearance of a city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPlacement {
    /// Category label.
    pub category: String,
    /// 1-based rank within the category.
    pub rank: usize,
    /// Mean jobs per listing.
    pub avg_jobs: f64,
}

/// A city's record across every category top list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerCityRecord {
    /// `"City, ST"`.
    pub city: String,
    /// Number of top lists the city appears in.
    pub appearances: u64,
    /// Categories of those top lists, in category order.
    pub categories: Vec<String>,
    /// Mean rank across appearances, rounded to one decimal.
    pub avg_rank: f64,
    /// Appearances at rank 1.
    pub first_place_count: u64,
    /// Consistency tier.
    pub tier: Tier,
    /// Every appearance.
    pub category_details: Vec<CategoryPlacement>,
}

/// Cities partitioned by tier, each list sorted by appearances then mean
/// rank.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PowerTiers {
    /// [`Tier::ConsistentLeader`] cities.
    pub consistent_leaders: Vec<PowerCityRecord>,
    /// [`Tier::OccasionalLeader`] cities.
    pub occasional_leaders: Vec<PowerCityRecord>,
    /// [`Tier::Specialist`] cities.
    pub specialists: Vec<PowerCityRecord>,
}

/// How the power-city ranking was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PowerMethodology {
    /// Ranking rule.
    pub approach: String,
    /// Cities per category top list.
    pub top_cities_per_category: usize,
    /// Tier name to range description.
    pub consistency_tiers: BTreeMap<String, String>,
    /// Reported metrics.
    pub metrics: Vec<String>,
}

/// Counts describing the power-city ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PowerSummary {
    /// Distinct cities appearing in any top list.
    pub total_unique_cities_in_top_lists: u64,
    /// Total top-list positions filled.
    pub total_category_leader_positions: u64,
    /// First consistent leader, if any.
    pub most_consistent_city: Option<String>,
    /// Categories ranked.
    pub categories_analyzed: u64,
}

/// Cities that consistently lead categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerCitiesAnalysis {
    /// How the ranking was built.
    pub methodology: PowerMethodology,
    /// Top cities per category.
    pub top_cities_by_category: BTreeMap<String, Vec<RankedEntry<TopCityEntry>>>,
    /// Rank-1 city per category.
    pub category_leaders: BTreeMap<String, CategoryLeader>,
    /// Tiered cities.
    pub power_cities: PowerTiers,
    /// Counts.
    pub summary_stats: PowerSummary,
}

// ── Summary ─────────────────────────────────────────────────────────

/// Top-level counts for the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    /// Distinct categories.
    pub total_categories: u64,
    /// Distinct states.
    pub total_states: u64,
    /// Distinct metros.
    pub total_metros: u64,
    /// Distinct airports.
    pub total_airports: u64,
    /// Listings aggregated.
    pub total_records: u64,
    /// Distinct cities.
    pub total_cities: u64,
}
