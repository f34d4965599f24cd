//! Joins the category → city breakdown with the reference tables.

use std::collections::BTreeMap;

use job_market_reference::ReferenceData;
use job_market_stats_models::{
    CategoryCityEntry, CityTopCategory, FocusedCity, FocusedCityAnalysis, FocusedMethodology,
    FocusedSummary, MappingCategory, MappingCity, RankedEntry, TopCategories,
};

use crate::group::{GroupMap, round1, to_f64};
use crate::index::{CityKey, CityLabels};
use crate::rank::top_n;
use crate::views::Breakdown;

/// city → (category, entry), cities and categories in first-encountered order.
type CityView<'b, 'a> = GroupMap<CityKey<'a>, Vec<(&'a str, &'b CategoryCityEntry)>>;

fn by_city<'b, 'a>(breakdown: &'b Breakdown<'a>) -> CityView<'b, 'a> {
    let mut cities: CityView<'b, 'a> = GroupMap::new();
    for (&category, entries) in breakdown.iter() {
        for (&city, entry) in entries.iter() {
            cities.get_or_insert_with(city, Vec::new).push((category, entry));
        }
    }
    cities
}

fn focused_city(
    city: CityKey<'_>,
    categories: &[(&str, &CategoryCityEntry)],
    population: u64,
    reference: &ReferenceData,
    city_top_n: usize,
) -> FocusedCity {
    let means: f64 = categories.iter().map(|(_, e)| e.stats.mean).sum();
    let candidates: Vec<CityTopCategory> = categories
        .iter()
        .map(|(category, entry)| CityTopCategory {
            category: (*category).to_string(),
            avg_jobs_per_listing: entry.stats.mean,
            listings_count: entry.stats.count,
        })
        .collect();

    FocusedCity {
        city: city.city.to_string(),
        state: city.state.to_string(),
        population,
        is_major_metro: reference.is_major_metro(city.city),
        job_categories: categories
            .iter()
            .map(|(category, entry)| ((*category).to_string(), (*entry).clone()))
            .collect(),
        category_count: categories.len() as u64,
        total_listings: categories.iter().map(|(_, e)| e.stats.count).sum(),
        avg_jobs_across_categories: if categories.is_empty() {
            0.0
        } else {
            round1(means / to_f64(categories.len() as u64))
        },
        top_categories: TopCategories {
            n: city_top_n,
            entries: top_n(candidates, city_top_n, |c| c.avg_jobs_per_listing),
        },
    }
}

/// Most populous cities with job data, overall and outside the major
/// metros.
///
/// Cities without a population figure are left out.
#[must_use]
pub fn focused_cities<'a>(
    breakdown: &Breakdown<'a>,
    reference: &ReferenceData,
    focus_limit: usize,
    city_top_n: usize,
) -> FocusedCityAnalysis {
    let cities = by_city(breakdown);
    let candidates: Vec<(CityKey<'a>, u64)> = cities
        .keys()
        .filter_map(|&city| {
            reference
                .population(city.city, city.state)
                .map(|p| (city, p))
        })
        .collect();
    let without_population = cities.len() - candidates.len();
    if without_population > 0 {
        log::debug!("{without_population} city(ies) without population data excluded from focus");
    }

    let outside: Vec<(CityKey<'a>, u64)> = candidates
        .iter()
        .copied()
        .filter(|(city, _)| !reference.is_major_metro(city.city))
        .collect();

    let expand = |ranked: Vec<RankedEntry<(CityKey<'a>, u64)>>| -> Vec<RankedEntry<FocusedCity>> {
        ranked
            .into_iter()
            .filter_map(|RankedEntry { rank, item: (city, population) }| {
                let categories = cities.get(&city)?;
                Some(RankedEntry {
                    rank,
                    item: focused_city(city, categories, population, reference, city_top_n),
                })
            })
            .collect()
    };
    let top_by_population = expand(top_n(candidates.clone(), focus_limit, |c| to_f64(c.1)));
    let top_outside_major_metros = expand(top_n(outside, focus_limit, |c| to_f64(c.1)));

    FocusedCityAnalysis {
        methodology: FocusedMethodology {
            top_population_criteria: format!(
                "Top {focus_limit} cities by population with job data"
            ),
            outside_metros_criteria: format!(
                "Top {focus_limit} cities by population outside the major metro centers"
            ),
            major_metros_defined: reference.major_metros.iter().cloned().collect(),
            population_source: reference.population_source.clone(),
        },
        summary: FocusedSummary {
            total_cities_with_population_data: candidates.len() as u64,
            major_metros_count: reference.major_metros.len() as u64,
            top_pop_with_jobs: top_by_population.len() as u64,
            outside_metros_with_jobs: top_outside_major_metros.len() as u64,
        },
        top_by_population,
        top_outside_major_metros,
        city_populations: reference.populations.clone(),
    }
}

/// Every city with its per-category figures and, when known, coordinates.
///
/// Keys follow the category → city breakdown.
#[must_use]
pub fn city_mapping_data(
    breakdown: &Breakdown<'_>,
    reference: &ReferenceData,
) -> BTreeMap<String, MappingCity> {
    let cities = by_city(breakdown);
    let labels = CityLabels::new(cities.keys().copied());
    cities
        .into_iter()
        .map(|(city, categories)| {
            let mapping = MappingCity {
                state: city.state.to_string(),
                coordinates: reference.coordinates(city.city, city.state),
                categories: categories
                    .iter()
                    .map(|(category, entry)| {
                        let value = MappingCategory {
                            avg_jobs: entry.stats.mean,
                            listings: entry.stats.count,
                            min_jobs: entry.stats.min,
                            max_jobs: entry.stats.max,
                        };
                        ((*category).to_string(), value)
                    })
                    .collect(),
            };
            (labels.label(city), mapping)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use job_market_stats_models::AggregateStat;

    use super::*;

    fn entry(mean: f64, count: u64) -> CategoryCityEntry {
        CategoryCityEntry {
            state: "TX".to_string(),
            closest_metro: None,
            closest_airport: None,
            metro_distance_band: None,
            stats: AggregateStat {
                count,
                mean,
                median: mean,
                min: 1,
                max: 40,
                std: 0.0,
            },
        }
    }

    fn reference() -> ReferenceData {
        ReferenceData::from_toml_str(
            r#"
            population_source = "Test table"
            major_metros = ["Houston"]

            [populations]
            Houston = 2300000
            Plano = 290000
            Frisco = 200000

            [coordinates]
            Houston = [29.76, -95.37]
            "#,
        )
        .unwrap()
    }

    const fn tx(city: &'static str) -> CityKey<'static> {
        CityKey { city, state: "TX" }
    }

    fn sample() -> Breakdown<'static> {
        let mut breakdown = Breakdown::new();
        let nurse = breakdown.get_or_insert_with("Nurse", GroupMap::new);
        nurse.get_or_insert_with(tx("Frisco"), || entry(4.0, 2));
        nurse.get_or_insert_with(tx("Houston"), || entry(12.0, 3));
        nurse.get_or_insert_with(tx("Tyler"), || entry(7.0, 1));
        let cook = breakdown.get_or_insert_with("Cook", GroupMap::new);
        cook.get_or_insert_with(tx("Houston"), || entry(3.0, 5));
        cook.get_or_insert_with(tx("Plano"), || entry(9.0, 1));
        breakdown
    }

    #[test]
    fn ranks_cities_by_population() {
        let analysis = focused_cities(&sample(), &reference(), 20, 3);

        let order: Vec<(usize, &str)> = analysis
            .top_by_population
            .iter()
            .map(|e| (e.rank, e.item.city.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "Houston"), (2, "Plano"), (3, "Frisco")]);

        let outside: Vec<&str> = analysis
            .top_outside_major_metros
            .iter()
            .map(|e| e.item.city.as_str())
            .collect();
        assert_eq!(outside, vec!["Plano", "Frisco"]);

        assert_eq!(analysis.summary.total_cities_with_population_data, 3);
        assert_eq!(analysis.summary.major_metros_count, 1);
        assert_eq!(analysis.methodology.population_source, "Test table");
    }

    #[test]
    fn focused_city_details() {
        let analysis = focused_cities(&sample(), &reference(), 1, 1);
        assert_eq!(analysis.top_by_population.len(), 1);

        let houston = &analysis.top_by_population[0].item;
        assert!(houston.is_major_metro);
        assert_eq!(houston.category_count, 2);
        assert_eq!(houston.total_listings, 8);
        assert!((houston.avg_jobs_across_categories - 7.5).abs() < f64::EPSILON);
        assert_eq!(houston.top_categories.key(), "top_1_categories");
        assert_eq!(houston.top_categories.entries[0].item.category, "Nurse");
    }

    #[test]
    fn mapping_covers_every_city() {
        let mapping = city_mapping_data(&sample(), &reference());
        assert_eq!(mapping.len(), 4);
        assert_eq!(mapping["Houston"].coordinates, Some([29.76, -95.37]));
        assert_eq!(mapping["Tyler"].coordinates, None);
        assert_eq!(mapping["Houston"].categories.len(), 2);
        assert_eq!(mapping["Plano"].categories["Cook"].listings, 1);
    }

    #[test]
    fn shared_city_names_use_state_specific_reference_data() {
        let reference = ReferenceData::from_toml_str(
            r#"
            [populations]
            "Mesquite, TX" = 140000
            "Mesquite, NV" = 20000

            [coordinates]
            "Mesquite, NV" = [36.80, -114.07]
            "#,
        )
        .unwrap();

        let mut breakdown = Breakdown::new();
        let cook = breakdown.get_or_insert_with("Cook", GroupMap::new);
        let nevada = CityKey {
            city: "Mesquite",
            state: "NV",
        };
        cook.get_or_insert_with(nevada, || entry(40.0, 1));
        cook.get_or_insert_with(tx("Mesquite"), || entry(2.0, 1));

        let analysis = focused_cities(&breakdown, &reference, 20, 3);
        let ranked: Vec<(&str, &str, u64)> = analysis
            .top_by_population
            .iter()
            .map(|e| (e.item.city.as_str(), e.item.state.as_str(), e.item.population))
            .collect();
        assert_eq!(
            ranked,
            vec![("Mesquite", "TX", 140_000), ("Mesquite", "NV", 20_000)]
        );

        let mapping = city_mapping_data(&breakdown, &reference);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["Mesquite, NV"].coordinates, Some([36.80, -114.07]));
        assert_eq!(mapping["Mesquite, TX"].coordinates, None);
        assert_eq!(mapping["Mesquite, TX"].state, "TX");
    }
}
