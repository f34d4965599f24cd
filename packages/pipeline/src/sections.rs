//! Named producers for the top-level document sections.
//!
//! Each [`Section`] owns exactly one top-level key of the persisted
//! document and knows how to render it from an [`Analysis`].

use std::collections::BTreeMap;

use job_market_document::Document;
use job_market_listing::load::LoadReport;
use job_market_stats::{Analysis, AnalysisOptions};
use serde::Serialize;
use serde_json::Value;
use strum::IntoEnumIterator as _;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A top-level key of the persisted document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Section {
    /// How the document was produced.
    Methodology,
    /// Statistics per category.
    CategoryOverview,
    /// Statistics per state with top categories.
    StateStatistics,
    /// Statistics per metro area.
    MetroAreaStatistics,
    /// Statistics per airport.
    AirportStatistics,
    /// category → city statistics.
    DetailedCityBreakdown,
    /// Population-driven city selections.
    FocusedCityAnalysis,
    /// Metro concentration, state concentration and mapping data.
    EnhancedAnalysis,
    /// Consistent category leaders.
    PowerCitiesAnalysis,
    /// Document-wide counts.
    SummaryStats,
}

impl Section {
    /// Every section, in document order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    /// One-line description for `job_market sections`.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Methodology => "Provenance: input, merges, settings, timestamp",
            Self::CategoryOverview => "Per-category statistics across all locations",
            Self::StateStatistics => "Per-state category statistics and top categories",
            Self::MetroAreaStatistics => "Per-metro category statistics with band subtotals",
            Self::AirportStatistics => "Per-airport category statistics with band subtotals",
            Self::DetailedCityBreakdown => "Category -> city statistics",
            Self::FocusedCityAnalysis => "Most populous cities, overall and outside major metros",
            Self::EnhancedAnalysis => "Metro and state concentration plus mapping data",
            Self::PowerCitiesAnalysis => "Cities that lead many categories",
            Self::SummaryStats => "Document-wide counts",
        }
    }

    /// Renders this section's value.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the value cannot be serialized.
    pub fn produce(
        self,
        analysis: &Analysis,
        methodology: &Methodology,
    ) -> Result<Value, serde_json::Error> {
        match self {
            Self::Methodology => serde_json::to_value(methodology),
            Self::CategoryOverview => serde_json::to_value(&analysis.category_overview),
            Self::StateStatistics => serde_json::to_value(&analysis.state_statistics),
            Self::MetroAreaStatistics => serde_json::to_value(&analysis.metro_area_statistics),
            Self::AirportStatistics => serde_json::to_value(&analysis.airport_statistics),
            Self::DetailedCityBreakdown => serde_json::to_value(&analysis.detailed_city_breakdown),
            Self::FocusedCityAnalysis => serde_json::to_value(&analysis.focused_city_analysis),
            Self::EnhancedAnalysis => serde_json::to_value(&analysis.enhanced_analysis),
            Self::PowerCitiesAnalysis => serde_json::to_value(&analysis.power_cities_analysis),
            Self::SummaryStats => serde_json::to_value(analysis.summary_stats),
        }
    }
}

/// Renders `sections` into a partial document ready for merging.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if a section cannot be serialized.
pub fn produce_all(
    sections: &[Section],
    analysis: &Analysis,
    methodology: &Methodology,
) -> Result<Document, serde_json::Error> {
    let mut document = Document::new();
    for &section in sections {
        document.insert(section.to_string(), section.produce(analysis, methodology)?);
    }
    Ok(document)
}

/// Row counts from loading the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSummary {
    /// Data rows read.
    pub rows_read: u64,
    /// Rows aggregated.
    pub records_loaded: u64,
    /// Rows skipped for lacking a job category.
    pub skipped_missing_category: u64,
    /// Rows rejected by validation.
    pub rows_rejected: u64,
}

impl From<&LoadReport> for InputSummary {
    fn from(report: &LoadReport) -> Self {
        Self {
            rows_read: report.rows_read,
            records_loaded: report.loaded,
            skipped_missing_category: report.skipped_missing_category,
            rows_rejected: report.rejected.len() as u64,
        }
    }
}

/// Provenance block written under `methodology`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Methodology {
    /// RFC 3339 generation time.
    pub generated_at: String,
    /// Input file.
    pub input_file: String,
    /// Row counts.
    pub input: InputSummary,
    /// What each statistic means.
    pub statistics: String,
    /// Category merges applied before aggregation.
    pub category_merges: BTreeMap<String, String>,
    /// Ranking sizes, near threshold and data-quality policy.
    pub settings: AnalysisOptions,
    /// Where population figures come from.
    pub population_source: String,
    /// Sections rewritten by this run.
    pub sections_updated: Vec<String>,
}

impl Methodology {
    /// Describes a run that is happening now.
    #[must_use]
    pub fn now(
        input_file: String,
        input: InputSummary,
        category_merges: BTreeMap<String, String>,
        settings: AnalysisOptions,
        population_source: String,
        sections: &[Section],
    ) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            input_file,
            input,
            statistics: "Per-listing job_count statistics: count, mean, median, min, max and \
                         sample standard deviation; mean, median and std rounded to one decimal"
                .to_string(),
            category_merges,
            settings,
            population_source,
            sections_updated: sections.iter().map(ToString::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn section_names_are_document_keys() {
        let names: Vec<String> = Section::all().iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "methodology",
                "category_overview",
                "state_statistics",
                "metro_area_statistics",
                "airport_statistics",
                "detailed_city_breakdown",
                "focused_city_analysis",
                "enhanced_analysis",
                "power_cities_analysis",
                "summary_stats",
            ]
        );
    }

    #[test]
    fn sections_parse_from_names() {
        assert_eq!(
            Section::from_str("power_cities_analysis").unwrap(),
            Section::PowerCitiesAnalysis
        );
        assert_eq!(
            Section::from_str("Summary_Stats").unwrap(),
            Section::SummaryStats
        );
        assert!(Section::from_str("salary_stats").is_err());
    }
}
