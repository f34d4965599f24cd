//! Share of each metro's listings that sit near the metro center.

use std::collections::BTreeMap;

use job_market_listing_models::{DistanceBand, ListingRecord};
use job_market_stats_models::{
    CategoryListingCount, MetroConcentration, MetroRankItem, RankedEntry, StateConcentration,
    StateMetroEntry,
};

use crate::group::{GroupMap, percentage, round1, to_f64};
use crate::index::ListingIndex;
use crate::quality::ResolvedAttributes;
use crate::rank::top_n;
use crate::views::{city_of, distinct, top_listed};

fn concentration_of(
    state: &str,
    banded: &[(&ListingRecord, DistanceBand)],
    threshold: DistanceBand,
) -> MetroConcentration {
    let count = |band: DistanceBand| banded.iter().filter(|(_, b)| *b == band).count() as u64;

    let within_metro = count(DistanceBand::WithinMetro);
    let within_25_miles = count(DistanceBand::Within25);
    let within_50_miles = count(DistanceBand::Within50);
    let beyond_50_miles = count(DistanceBand::Beyond50);
    let total_listings = within_metro + within_25_miles + within_50_miles + beyond_50_miles;
    let near_listings = banded
        .iter()
        .filter(|(_, b)| b.is_within(threshold))
        .count() as u64;

    let mut per_category: GroupMap<&str, u64> = GroupMap::new();
    for (record, _) in banded {
        *per_category.get_or_insert_with(&record.job_category, || 0) += 1;
    }
    let counts: Vec<CategoryListingCount> = per_category
        .iter()
        .map(|(&category, &listings)| CategoryListingCount {
            category: category.to_string(),
            listings,
        })
        .collect();

    MetroConcentration {
        state: state.to_string(),
        total_listings,
        unique_cities: distinct(banded.iter().map(|(r, _)| *r), city_of),
        within_metro,
        within_25_miles,
        within_50_miles,
        beyond_50_miles,
        within_50_total: within_metro + within_25_miles + within_50_miles,
        near_listings,
        concentration_percentage: percentage(near_listings, total_listings),
        categories_count: per_category.len() as u64,
        top_categories: top_listed(counts),
    }
}

/// Concentration per metro, for listings with both a metro and a band.
///
/// A listing counts as near when its band is at or inside `threshold`.
/// Metros without a single banded listing are left out.
#[must_use]
pub fn metro_concentration<'a>(
    index: &ListingIndex<'a>,
    resolved: &ResolvedAttributes<'a>,
    threshold: DistanceBand,
) -> GroupMap<&'a str, MetroConcentration> {
    let mut metros = GroupMap::new();
    let mut unbanded_metros = 0_usize;

    for (&metro, members) in index.by_metro.iter() {
        let banded: Vec<(&ListingRecord, DistanceBand)> = members
            .iter()
            .filter_map(|&r| r.metro_distance_band.map(|band| (r, band)))
            .collect();
        if banded.is_empty() {
            unbanded_metros += 1;
            continue;
        }
        let state = resolved.metro_state(metro).unwrap_or_default();
        metros.get_or_insert_with(metro, || concentration_of(state, &banded, threshold));
    }

    if unbanded_metros > 0 {
        log::debug!("{unbanded_metros} metro(s) without banded listings excluded from concentration");
    }

    metros
}

/// Every analyzed metro, ranked by listing count.
#[must_use]
pub fn metros_by_listings(
    metros: &GroupMap<&str, MetroConcentration>,
) -> Vec<RankedEntry<MetroRankItem>> {
    let items: Vec<MetroRankItem> = metros
        .iter()
        .map(|(&metro, c)| MetroRankItem {
            metro: metro.to_string(),
            state: c.state.clone(),
            total_listings: c.total_listings,
            concentration_percentage: c.concentration_percentage,
        })
        .collect();
    let n = items.len();
    top_n(items, n, |m| to_f64(m.total_listings))
}

/// Concentration summed over the metros of each state.
///
/// `state_concentration_percentage` weights metros by listings;
/// `avg_concentration` weights them equally.
#[must_use]
pub fn state_concentration(
    metros: &GroupMap<&str, MetroConcentration>,
) -> BTreeMap<String, StateConcentration> {
    let mut by_state: GroupMap<&str, Vec<StateMetroEntry>> = GroupMap::new();
    for (&metro, c) in metros.iter() {
        by_state
            .get_or_insert_with(&c.state, Vec::new)
            .push(StateMetroEntry {
                metro: metro.to_string(),
                total_listings: c.total_listings,
                within_50_total: c.within_50_total,
                near_listings: c.near_listings,
                concentration_percentage: c.concentration_percentage,
                unique_cities: c.unique_cities,
            });
    }

    by_state
        .map_values(|_, mut entries| {
            entries.sort_by(|a, b| b.total_listings.cmp(&a.total_listings));

            let total_listings = entries.iter().map(|m| m.total_listings).sum();
            let total_near_listings = entries.iter().map(|m| m.near_listings).sum();
            let percentages: f64 = entries.iter().map(|m| m.concentration_percentage).sum();

            StateConcentration {
                total_metros: entries.len() as u64,
                total_listings,
                total_within_50_miles: entries.iter().map(|m| m.within_50_total).sum(),
                total_near_listings,
                total_cities: entries.iter().map(|m| m.unique_cities).sum(),
                state_concentration_percentage: percentage(total_near_listings, total_listings),
                avg_concentration: round1(percentages / to_f64(entries.len() as u64)),
                metros: entries,
            }
        })
        .into_sorted(str::to_string)
}
