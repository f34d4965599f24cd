//! Hierarchical views: category overview, state, metro, airport and
//! category → city breakdowns, plus the document-wide counts.

use std::collections::{BTreeMap, BTreeSet};

use job_market_listing_models::{DistanceBand, ListingRecord};
use job_market_stats_models::{
    AggregateStat, AirportStatistics, AreaCategoryEntry, BandSubtotal, CategoryCityEntry,
    CategoryListingCount, CategoryOverviewEntry, MetroStatistics, RankedEntry,
    StateCategoryEntry, StateStatistics, StateTopCategory, SummaryStats, TopCategories,
};

use crate::group::{GroupMap, exact_mean, mean_of_group_means, round1, summarize, to_f64};
use crate::index::{CityKey, CityLabels, ListingIndex, Members, flatten};
use crate::quality::ResolvedAttributes;
use crate::rank::top_n;

/// Categories kept in every by-listing-count ranking.
pub const TOP_LISTED_CATEGORIES: usize = 3;

/// category → city → statistics, both levels in first-encountered order.
pub type Breakdown<'a> = GroupMap<&'a str, GroupMap<CityKey<'a>, CategoryCityEntry>>;

/// Statistics over the job counts of `members`.
pub(crate) fn stats_of(members: &[&ListingRecord]) -> AggregateStat {
    let values: Vec<u64> = members.iter().map(|r| r.job_count).collect();
    summarize(&values)
}

/// Number of distinct values of `field` among `records`, ignoring records
/// where `field` is absent.
pub(crate) fn distinct<'a, K: Ord>(
    records: impl IntoIterator<Item = &'a ListingRecord>,
    field: impl Fn(&'a ListingRecord) -> Option<K>,
) -> u64 {
    let set: BTreeSet<K> = records.into_iter().filter_map(field).collect();
    set.len() as u64
}

pub(crate) fn city_of(record: &ListingRecord) -> Option<CityKey<'_>> {
    Some(CityKey::of(record))
}

fn state_of(record: &ListingRecord) -> Option<&str> {
    Some(record.cleaned_state.as_str())
}

fn title_of(record: &ListingRecord) -> Option<&str> {
    Some(record.extracted_job_title.as_str()).filter(|t| !t.is_empty())
}

fn avg_jobs_per_city(members: &[&ListingRecord]) -> f64 {
    mean_of_group_means(members, city_of, |r| r.job_count)
}

/// Statistics per category across every location.
#[must_use]
pub fn category_overview(index: &ListingIndex<'_>) -> BTreeMap<String, CategoryOverviewEntry> {
    index
        .by_category
        .iter()
        .map(|(&category, members)| {
            let mut per_state: GroupMap<&str, Vec<u64>> = GroupMap::new();
            for record in members {
                per_state
                    .get_or_insert_with(&record.cleaned_state, Vec::new)
                    .push(record.job_count);
            }
            let state_averages = per_state
                .map_values(|_, values| round1(exact_mean(&values)))
                .into_sorted(str::to_string);

            let entry = CategoryOverviewEntry {
                stats: stats_of(members),
                cities_count: distinct(members.iter().copied(), city_of),
                states_count: distinct(members.iter().copied(), state_of),
                avg_jobs_per_city: avg_jobs_per_city(members),
                state_averages,
            };
            (category.to_string(), entry)
        })
        .collect()
}

fn state_category_entry(members: &[&ListingRecord]) -> StateCategoryEntry {
    StateCategoryEntry {
        stats: stats_of(members),
        cities_count: distinct(members.iter().copied(), city_of),
        titles_count: distinct(members.iter().copied(), title_of),
        avg_jobs_per_city: avg_jobs_per_city(members),
    }
}

/// Statistics per state, each with its top `top` categories by mean jobs
/// per listing.
#[must_use]
pub fn state_statistics(index: &ListingIndex<'_>, top: usize) -> BTreeMap<String, StateStatistics> {
    index
        .by_state_category
        .iter()
        .map(|(&state, categories)| {
            let entries = categories.iter().map(|(&category, members)| {
                (category, state_category_entry(members))
            });
            let entries: Vec<(&str, StateCategoryEntry)> = entries.collect();

            let candidates: Vec<StateTopCategory> = entries
                .iter()
                .map(|(category, entry)| StateTopCategory {
                    category: (*category).to_string(),
                    avg_jobs_per_listing: entry.stats.mean,
                    avg_jobs_per_city: entry.avg_jobs_per_city,
                    cities_count: entry.cities_count,
                })
                .collect();

            let statistics = StateStatistics {
                total_listings: entries.iter().map(|(_, e)| e.stats.count).sum(),
                total_cities: distinct(flatten(categories), city_of),
                total_categories: categories.len() as u64,
                total_titles: distinct(flatten(categories), title_of),
                categories: entries
                    .into_iter()
                    .map(|(category, entry)| (category.to_string(), entry))
                    .collect(),
                top_categories: TopCategories {
                    n: top,
                    entries: top_n(candidates, top, |c| c.avg_jobs_per_listing),
                },
            };
            (state.to_string(), statistics)
        })
        .collect()
}

fn band_subtotal(members: &[&ListingRecord], threshold: DistanceBand) -> BandSubtotal {
    let near: Vec<&ListingRecord> = members
        .iter()
        .copied()
        .filter(|r| r.metro_distance_band.is_some_and(|b| b.is_within(threshold)))
        .collect();
    let values: Vec<u64> = near.iter().map(|r| r.job_count).collect();

    BandSubtotal {
        listings: near.len() as u64,
        avg_jobs: round1(exact_mean(&values)),
        cities: distinct(near.iter().copied(), city_of),
    }
}

/// Listing counts per category, most-listed first.
pub(crate) fn top_listed(
    counts: Vec<CategoryListingCount>,
) -> Vec<RankedEntry<CategoryListingCount>> {
    top_n(counts, TOP_LISTED_CATEGORIES, |c| to_f64(c.listings))
}

/// Per-category statistics and totals for one metro or airport.
struct AreaSummary {
    categories: BTreeMap<String, AreaCategoryEntry>,
    total_listings: u64,
    total_cities: u64,
    total_categories: u64,
    top_categories_by_listings: Vec<RankedEntry<CategoryListingCount>>,
}

fn area_summary(categories: &GroupMap<&str, Members<'_>>) -> AreaSummary {
    let mut entries = BTreeMap::new();
    let mut counts = Vec::with_capacity(categories.len());

    for (&category, members) in categories.iter() {
        let entry = AreaCategoryEntry {
            stats: stats_of(members),
            cities_count: distinct(members.iter().copied(), city_of),
            titles_count: distinct(members.iter().copied(), title_of),
            avg_jobs_per_city: avg_jobs_per_city(members),
            within_25_miles: band_subtotal(members, DistanceBand::Within25),
            within_50_miles: band_subtotal(members, DistanceBand::Within50),
        };
        counts.push(CategoryListingCount {
            category: category.to_string(),
            listings: entry.stats.count,
        });
        entries.insert(category.to_string(), entry);
    }

    AreaSummary {
        total_listings: counts.iter().map(|c| c.listings).sum(),
        total_cities: distinct(flatten(categories), city_of),
        total_categories: categories.len() as u64,
        categories: entries,
        top_categories_by_listings: top_listed(counts),
    }
}

/// Statistics per metro area, for listings with a metro.
#[must_use]
pub fn metro_statistics(
    index: &ListingIndex<'_>,
    resolved: &ResolvedAttributes<'_>,
) -> BTreeMap<String, MetroStatistics> {
    index
        .by_metro_category
        .iter()
        .map(|(&metro, categories)| {
            let area = area_summary(categories);
            let statistics = MetroStatistics {
                state: resolved.metro_state(metro).unwrap_or_default().to_string(),
                total_listings: area.total_listings,
                total_cities: area.total_cities,
                total_categories: area.total_categories,
                categories: area.categories,
                top_categories_by_listings: area.top_categories_by_listings,
            };
            (metro.to_string(), statistics)
        })
        .collect()
}

/// Statistics per airport, for listings with an airport.
///
/// Band subtotals use each listing's metro distance band.
#[must_use]
pub fn airport_statistics(
    index: &ListingIndex<'_>,
    resolved: &ResolvedAttributes<'_>,
) -> BTreeMap<String, AirportStatistics> {
    index
        .by_airport_category
        .iter()
        .map(|(&airport, categories)| {
            let area = area_summary(categories);
            let statistics = AirportStatistics {
                state: resolved.airport_state(airport).unwrap_or_default().to_string(),
                states_served: distinct(flatten(categories), state_of),
                total_listings: area.total_listings,
                total_cities: area.total_cities,
                total_categories: area.total_categories,
                categories: area.categories,
                top_categories_by_listings: area.top_categories_by_listings,
            };
            (airport.to_string(), statistics)
        })
        .collect()
}

/// Statistics per (category, city), with the city's resolved attributes.
#[must_use]
pub fn category_city_breakdown<'a>(
    index: &ListingIndex<'a>,
    resolved: &ResolvedAttributes<'a>,
) -> Breakdown<'a> {
    let mut breakdown = Breakdown::new();

    for (&category, cities) in index.by_category_city.iter() {
        let entries = breakdown.get_or_insert_with(category, GroupMap::new);
        for (&city, members) in cities.iter() {
            let Some(&representative) = members.first() else {
                continue;
            };
            let attributes = resolved.city_attributes(representative);
            entries.get_or_insert_with(city, || CategoryCityEntry {
                state: attributes.state.to_string(),
                closest_metro: attributes.metro.map(str::to_string),
                closest_airport: attributes.airport.map(str::to_string),
                metro_distance_band: attributes.band,
                stats: stats_of(members),
            });
        }
    }

    breakdown
}

/// Converts a breakdown into the key-sorted form written to the document.
///
/// Cities are keyed by name, or by `"City, ST"` where the name is shared by
/// more than one state.
#[must_use]
pub fn sorted_breakdown(
    breakdown: &Breakdown<'_>,
) -> BTreeMap<String, BTreeMap<String, CategoryCityEntry>> {
    let labels = CityLabels::new(breakdown.values().flat_map(|cities| cities.keys().copied()));
    breakdown
        .iter()
        .map(|(&category, cities)| {
            let cities = cities
                .iter()
                .map(|(&city, entry)| (labels.label(city), entry.clone()))
                .collect();
            (category.to_string(), cities)
        })
        .collect()
}

/// Document-wide counts.
#[must_use]
pub fn summary(index: &ListingIndex<'_>, resolved: &ResolvedAttributes<'_>) -> SummaryStats {
    SummaryStats {
        total_categories: index.by_category.len() as u64,
        total_states: index.by_state_category.len() as u64,
        total_metros: index.by_metro.len() as u64,
        total_airports: index.by_airport.len() as u64,
        total_records: index.record_count as u64,
        total_cities: resolved.city_count() as u64,
    }
}

#[cfg(test)]
mod tests {
    use crate::quality::check;

    use super::*;

    fn record(
        category: &str,
        city: &str,
        state: &str,
        job_count: u64,
        metro: Option<(&str, DistanceBand)>,
        title: &str,
    ) -> ListingRecord {
        ListingRecord {
            job_category: category.to_string(),
            cleaned_city: city.to_string(),
            cleaned_state: state.to_string(),
            job_count,
            closest_metro: metro.map(|(m, _)| m.to_string()),
            closest_airport: metro.map(|(m, _)| format!("{m} Intl")),
            metro_distance_band: metro.map(|(_, b)| b),
            extracted_job_title: title.to_string(),
        }
    }

    fn sample() -> Vec<ListingRecord> {
        let phx = Some(("Phoenix", DistanceBand::WithinMetro));
        let mesa = Some(("Phoenix", DistanceBand::Within25));
        let tucson = Some(("Tucson", DistanceBand::Within50));
        vec![
            record("Nurse", "Phoenix", "AZ", 10, phx, "RN"),
            record("Nurse", "Phoenix", "AZ", 20, phx, "RN"),
            record("Nurse", "Mesa", "AZ", 6, mesa, "LPN"),
            record("Cook", "Mesa", "AZ", 2, mesa, "Line Cook"),
            record("Cook", "Marana", "AZ", 4, tucson, ""),
            record("Cook", "Reno", "NV", 8, None, "Chef"),
        ]
    }

    #[test]
    fn overview_counts_cities_states_and_city_means() {
        let records = sample();
        let index = ListingIndex::build(&records);
        let overview = category_overview(&index);

        let nurse = &overview["Nurse"];
        assert_eq!(nurse.stats.count, 3);
        assert!((nurse.stats.mean - 12.0).abs() < f64::EPSILON);
        assert_eq!(nurse.cities_count, 2);
        assert_eq!(nurse.states_count, 1);
        // Phoenix mean 15, Mesa mean 6.
        assert!((nurse.avg_jobs_per_city - 10.5).abs() < f64::EPSILON);

        let cook = &overview["Cook"];
        assert_eq!(cook.states_count, 2);
        assert!((cook.state_averages["AZ"] - 3.0).abs() < f64::EPSILON);
        assert!((cook.state_averages["NV"] - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn state_statistics_rank_categories_by_mean() {
        let records = sample();
        let index = ListingIndex::build(&records);
        let states = state_statistics(&index, 5);

        let az = &states["AZ"];
        assert_eq!(az.total_listings, 5);
        assert_eq!(az.total_cities, 3);
        assert_eq!(az.total_categories, 2);
        assert_eq!(az.total_titles, 3);
        assert_eq!(az.categories["Cook"].titles_count, 1);
        assert_eq!(az.top_categories.n, 5);

        let ranked: Vec<(usize, &str)> = az
            .top_categories
            .entries
            .iter()
            .map(|e| (e.rank, e.item.category.as_str()))
            .collect();
        assert_eq!(ranked, vec![(1, "Nurse"), (2, "Cook")]);
    }

    #[test]
    fn state_top_list_is_truncated() {
        let records = sample();
        let index = ListingIndex::build(&records);
        let states = state_statistics(&index, 1);
        assert_eq!(states["AZ"].top_categories.entries.len(), 1);
        assert_eq!(states["AZ"].categories.len(), 2);
    }

    #[test]
    fn metro_statistics_carry_state_and_band_subtotals() {
        let records = sample();
        let (resolved, _) = check(&records);
        let index = ListingIndex::build(&records);
        let metros = metro_statistics(&index, &resolved);

        assert_eq!(metros.len(), 2);
        let phoenix = &metros["Phoenix"];
        assert_eq!(phoenix.state, "AZ");
        assert_eq!(phoenix.total_listings, 4);
        assert_eq!(phoenix.total_cities, 2);

        let nurse = &phoenix.categories["Nurse"];
        assert_eq!(nurse.within_25_miles.listings, 3);
        assert_eq!(nurse.within_25_miles.cities, 2);
        assert!((nurse.within_25_miles.avg_jobs - 12.0).abs() < f64::EPSILON);

        let tucson = &metros["Tucson"].categories["Cook"];
        assert_eq!(tucson.within_25_miles.listings, 0);
        assert!(tucson.within_25_miles.avg_jobs.abs() < f64::EPSILON);
        assert_eq!(tucson.within_50_miles.listings, 1);

        let top: Vec<&str> = phoenix
            .top_categories_by_listings
            .iter()
            .map(|e| e.item.category.as_str())
            .collect();
        assert_eq!(top, vec!["Nurse", "Cook"]);
    }

    #[test]
    fn airport_statistics_count_states_served() {
        let records = sample();
        let (resolved, _) = check(&records);
        let index = ListingIndex::build(&records);
        let airports = airport_statistics(&index, &resolved);

        assert_eq!(airports.len(), 2);
        assert_eq!(airports["Phoenix Intl"].state, "AZ");
        assert_eq!(airports["Phoenix Intl"].states_served, 1);
        assert!(!airports.contains_key("Reno Intl"));
    }

    #[test]
    fn breakdown_matches_worked_example() {
        let records = vec![
            record("CatA", "CityP", "TX", 10, None, ""),
            record("CatA", "CityP", "TX", 20, None, ""),
            record("CatB", "CityP", "TX", 5, None, ""),
        ];
        let (resolved, _) = check(&records);
        let index = ListingIndex::build(&records);
        let breakdown = category_city_breakdown(&index, &resolved);

        let city_p = CityKey {
            city: "CityP",
            state: "TX",
        };
        let entry = breakdown.get("CatA").unwrap().get(&city_p).unwrap();
        assert_eq!(entry.stats.count, 2);
        assert!((entry.stats.mean - 15.0).abs() < f64::EPSILON);
        assert_eq!(entry.stats.min, 10);
        assert_eq!(entry.stats.max, 20);
        assert_eq!(entry.state, "TX");

        let sorted = sorted_breakdown(&breakdown);
        assert_eq!(sorted["CatB"]["CityP"].stats.count, 1);
    }

    #[test]
    fn same_name_cities_in_different_states_stay_apart() {
        let records = vec![
            record("Cook", "Mesquite", "TX", 2, Some(("Dallas", DistanceBand::Within25)), ""),
            record("Cook", "Mesquite", "NV", 40, Some(("Las Vegas", DistanceBand::Beyond50)), ""),
            record("Cook", "Reno", "NV", 8, None, ""),
        ];
        let (resolved, report) = check(&records);
        assert!(report.is_clean());
        let index = ListingIndex::build(&records);
        let breakdown = category_city_breakdown(&index, &resolved);

        let sorted = sorted_breakdown(&breakdown);
        let cook = &sorted["Cook"];
        let keys: Vec<&str> = cook.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Mesquite, NV", "Mesquite, TX", "Reno"]);

        let texas = &cook["Mesquite, TX"];
        assert_eq!(texas.state, "TX");
        assert_eq!(texas.stats.count, 1);
        assert!((texas.stats.mean - 2.0).abs() < f64::EPSILON);
        assert_eq!(texas.closest_metro.as_deref(), Some("Dallas"));
        assert_eq!(cook["Mesquite, NV"].closest_metro.as_deref(), Some("Las Vegas"));

        assert_eq!(category_overview(&index)["Cook"].cities_count, 3);
        assert_eq!(summary(&index, &resolved).total_cities, 3);
    }

    #[test]
    fn group_counts_add_up_to_records() {
        let records = sample();
        let (resolved, _) = check(&records);
        let index = ListingIndex::build(&records);

        let overview_total: u64 = category_overview(&index).values().map(|e| e.stats.count).sum();
        assert_eq!(overview_total, records.len() as u64);

        let breakdown = category_city_breakdown(&index, &resolved);
        let breakdown_total: u64 = breakdown
            .values()
            .flat_map(|cities| cities.values())
            .map(|e| e.stats.count)
            .sum();
        assert_eq!(breakdown_total, records.len() as u64);
        assert!(breakdown.values().flat_map(|cities| cities.values()).all(|e| e.stats.count > 0));

        let stats = summary(&index, &resolved);
        assert_eq!(stats.total_records, 6);
        assert_eq!(stats.total_cities, 4);
        assert_eq!(stats.total_states, 2);
        assert_eq!(stats.total_metros, 2);
        assert_eq!(stats.total_airports, 2);
        assert_eq!(stats.total_categories, 2);
    }
}
