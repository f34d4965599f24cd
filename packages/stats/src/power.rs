//! Cities that keep showing up at the top of category rankings.

use std::collections::BTreeMap;

use job_market_stats_models::{
    CategoryLeader, CategoryPlacement, PowerCitiesAnalysis, PowerCityRecord, PowerMethodology,
    PowerSummary, PowerTiers, RankedEntry, Tier, TopCityEntry,
};

use crate::group::{GroupMap, round1, to_f64};
use crate::rank::top_n;
use crate::views::Breakdown;

/// Top `n` cities per category by mean jobs per listing.
#[must_use]
pub fn category_top_cities<'a>(
    breakdown: &Breakdown<'a>,
    n: usize,
) -> GroupMap<&'a str, Vec<RankedEntry<TopCityEntry>>> {
    let mut lists = GroupMap::new();
    for (&category, cities) in breakdown.iter() {
        let candidates: Vec<TopCityEntry> = cities
            .iter()
            .map(|(&city, entry)| TopCityEntry {
                city: city.city.to_string(),
                state: city.state.to_string(),
                avg_jobs: entry.stats.mean,
                listings: entry.stats.count,
                min_jobs: entry.stats.min,
                max_jobs: entry.stats.max,
            })
            .collect();
        lists.get_or_insert_with(category, || top_n(candidates, n, |c| c.avg_jobs));
    }
    lists
}

struct Appearances {
    categories: Vec<String>,
    details: Vec<CategoryPlacement>,
}

fn into_record(city: String, appearances: Appearances) -> Option<PowerCityRecord> {
    let count = appearances.details.len() as u64;
    let tier = Tier::from_appearances(count)?;
    let rank_sum: usize = appearances.details.iter().map(|d| d.rank).sum();

    Some(PowerCityRecord {
        city,
        appearances: count,
        categories: appearances.categories,
        avg_rank: round1(to_f64(rank_sum as u64) / to_f64(count)),
        first_place_count: appearances.details.iter().filter(|d| d.rank == 1).count() as u64,
        tier,
        category_details: appearances.details,
    })
}

fn methodology(top: usize) -> PowerMethodology {
    PowerMethodology {
        approach: format!(
            "Rank cities by average jobs per listing within each category and count \
             appearances in each category's top {top}"
        ),
        top_cities_per_category: top,
        consistency_tiers: [Tier::ConsistentLeader, Tier::OccasionalLeader, Tier::Specialist]
            .into_iter()
            .map(|tier| (tier.to_string(), tier.description().to_string()))
            .collect(),
        metrics: vec![
            "appearances".to_string(),
            "avg_rank".to_string(),
            "first_place_count".to_string(),
        ],
    }
}

/// Classifies every city appearing in `top_lists` into a consistency tier.
///
/// Cities are keyed by `"City, ST"`. Each tier list is ordered by
/// appearances (most first), then by mean rank (best first).
#[must_use]
pub fn power_cities(
    top_lists: &GroupMap<&str, Vec<RankedEntry<TopCityEntry>>>,
    top: usize,
) -> PowerCitiesAnalysis {
    let mut by_city: GroupMap<String, Appearances> = GroupMap::new();
    let mut category_leaders = BTreeMap::new();

    for (&category, list) in top_lists.iter() {
        if let Some(leader) = list.first() {
            category_leaders.insert(
                category.to_string(),
                CategoryLeader {
                    city: leader.item.city.clone(),
                    state: leader.item.state.clone(),
                    avg_jobs: leader.item.avg_jobs,
                },
            );
        }
        for entry in list {
            let key = format!("{}, {}", entry.item.city, entry.item.state);
            let appearances = by_city.get_or_insert_with(key, || Appearances {
                categories: Vec::new(),
                details: Vec::new(),
            });
            appearances.categories.push(category.to_string());
            appearances.details.push(CategoryPlacement {
                category: category.to_string(),
                rank: entry.rank,
                avg_jobs: entry.item.avg_jobs,
            });
        }
    }

    let total_unique_cities = by_city.len() as u64;
    let mut tiers = PowerTiers::default();
    for (city, appearances) in by_city {
        let Some(record) = into_record(city, appearances) else {
            continue;
        };
        match record.tier {
            Tier::ConsistentLeader => tiers.consistent_leaders.push(record),
            Tier::OccasionalLeader => tiers.occasional_leaders.push(record),
            Tier::Specialist => tiers.specialists.push(record),
        }
    }
    for list in [
        &mut tiers.consistent_leaders,
        &mut tiers.occasional_leaders,
        &mut tiers.specialists,
    ] {
        list.sort_by(|a, b| {
            b.appearances
                .cmp(&a.appearances)
                .then(a.avg_rank.total_cmp(&b.avg_rank))
        });
    }

    let summary_stats = PowerSummary {
        total_unique_cities_in_top_lists: total_unique_cities,
        total_category_leader_positions: top_lists.values().map(|l| l.len() as u64).sum(),
        most_consistent_city: tiers.consistent_leaders.first().map(|r| r.city.clone()),
        categories_analyzed: top_lists.len() as u64,
    };

    log::debug!(
        "Power cities: {} consistent, {} occasional, {} specialists",
        tiers.consistent_leaders.len(),
        tiers.occasional_leaders.len(),
        tiers.specialists.len()
    );

    PowerCitiesAnalysis {
        methodology: methodology(top),
        top_cities_by_category: top_lists
            .iter()
            .map(|(&category, list)| (category.to_string(), list.clone()))
            .collect(),
        category_leaders,
        power_cities: tiers,
        summary_stats,
    }
}
