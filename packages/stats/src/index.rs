//! The normalized in-memory index every view is derived from.
//!
//! Built in a single pass over the record store. Each grouping keeps its
//! keys in first-encountered order and its members in input order.

use std::collections::BTreeSet;
use std::fmt;

use job_market_listing_models::ListingRecord;

use crate::group::GroupMap;

/// A city is its name together with its state; the same name recurs
/// across states (Mesquite, TX and Mesquite, NV).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CityKey<'a> {
    /// City name as it appears in the listings.
    pub city: &'a str,
    /// State abbreviation.
    pub state: &'a str,
}

impl<'a> CityKey<'a> {
    /// The city of `record`.
    #[must_use]
    pub fn of(record: &'a ListingRecord) -> Self {
        Self {
            city: &record.cleaned_city,
            state: &record.cleaned_state,
        }
    }
}

impl fmt::Display for CityKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.state)
    }
}

/// Document keys for cities: the plain name, or `"City, ST"` for names
/// shared by more than one state.
#[derive(Debug, Clone, Default)]
pub struct CityLabels<'a> {
    shared: BTreeSet<&'a str>,
}

impl<'a> CityLabels<'a> {
    /// Collects the shared names among `cities`.
    #[must_use]
    pub fn new(cities: impl IntoIterator<Item = CityKey<'a>>) -> Self {
        let mut states: GroupMap<&'a str, BTreeSet<&'a str>> = GroupMap::new();
        for key in cities {
            states.get_or_insert_with(key.city, BTreeSet::new).insert(key.state);
        }
        let shared = states
            .into_iter()
            .filter(|(_, seen)| seen.len() > 1)
            .map(|(city, _)| city)
            .collect();
        Self { shared }
    }

    /// Key under which `city` is written.
    #[must_use]
    pub fn label(&self, city: CityKey<'_>) -> String {
        if self.shared.contains(city.city) {
            city.to_string()
        } else {
            city.city.to_string()
        }
    }
}

/// Listings belonging to one group, in input order.
pub type Members<'a> = Vec<&'a ListingRecord>;

/// Two-level grouping: outer key, then category, then members.
pub type Nested<'a> = GroupMap<&'a str, GroupMap<&'a str, Members<'a>>>;

/// category → city → members.
pub type ByCity<'a> = GroupMap<&'a str, GroupMap<CityKey<'a>, Members<'a>>>;

/// Every grouping the views need, borrowed from one record slice.
#[derive(Debug, Clone, Default)]
pub struct ListingIndex<'a> {
    /// Listings aggregated.
    pub record_count: usize,
    /// category → listings.
    pub by_category: GroupMap<&'a str, Members<'a>>,
    /// category → city → listings.
    pub by_category_city: ByCity<'a>,
    /// state → category → listings.
    pub by_state_category: Nested<'a>,
    /// metro → listings, for listings with a metro.
    pub by_metro: GroupMap<&'a str, Members<'a>>,
    /// metro → category → listings.
    pub by_metro_category: Nested<'a>,
    /// airport → listings, for listings with an airport.
    pub by_airport: GroupMap<&'a str, Members<'a>>,
    /// airport → category → listings.
    pub by_airport_category: Nested<'a>,
}

impl<'a> ListingIndex<'a> {
    /// Builds the index from `records`.
    #[must_use]
    pub fn build(records: &'a [ListingRecord]) -> Self {
        let mut index = Self {
            record_count: records.len(),
            ..Self::default()
        };
        let mut without_metro = 0_usize;
        let mut without_airport = 0_usize;

        for record in records {
            let category = record.job_category.as_str();

            index
                .by_category
                .get_or_insert_with(category, Vec::new)
                .push(record);
            index
                .by_category_city
                .get_or_insert_with(category, GroupMap::new)
                .get_or_insert_with(CityKey::of(record), Vec::new)
                .push(record);
            push_nested(
                &mut index.by_state_category,
                &record.cleaned_state,
                category,
                record,
            );

            if let Some(metro) = record.closest_metro.as_deref() {
                index.by_metro.get_or_insert_with(metro, Vec::new).push(record);
                push_nested(&mut index.by_metro_category, metro, category, record);
            } else {
                without_metro += 1;
            }

            if let Some(airport) = record.closest_airport.as_deref() {
                index
                    .by_airport
                    .get_or_insert_with(airport, Vec::new)
                    .push(record);
                push_nested(&mut index.by_airport_category, airport, category, record);
            } else {
                without_airport += 1;
            }
        }

        log::debug!(
            "Indexed {} listing(s): {} categories, {} states, {} metros, {} airports",
            index.record_count,
            index.by_category.len(),
            index.by_state_category.len(),
            index.by_metro.len(),
            index.by_airport.len()
        );
        if without_metro > 0 {
            log::debug!("{without_metro} listing(s) without a metro excluded from metro views");
        }
        if without_airport > 0 {
            log::debug!("{without_airport} listing(s) without an airport excluded from airport views");
        }

        index
    }
}

fn push_nested<'a>(
    nested: &mut Nested<'a>,
    outer: &'a str,
    inner: &'a str,
    record: &'a ListingRecord,
) {
    nested
        .get_or_insert_with(outer, GroupMap::new)
        .get_or_insert_with(inner, Vec::new)
        .push(record);
}

/// Every member of a nested group, group by group.
pub fn flatten<'b, 'a: 'b, K: Ord + Clone>(
    groups: &'b GroupMap<K, Members<'a>>,
) -> impl Iterator<Item = &'a ListingRecord> + 'b {
    groups.values().flat_map(|members| members.iter().copied())
}
