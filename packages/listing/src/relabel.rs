//! Whole-collection category relabeling.
//!
//! A [`CategoryRelabel`] is a single-step `old -> new` label table. It is
//! applied to every record before aggregation so that no view ever sees the
//! old label.

use std::collections::BTreeMap;

use job_market_listing_models::ListingRecord;
use serde::Serialize;

use crate::ListingError;

/// Validated mapping from old category labels to their replacements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryRelabel {
    merges: BTreeMap<String, String>,
}

impl CategoryRelabel {
    /// Builds a relabel table from `old -> new` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Relabel`] if a label is empty, if an old label
    /// maps to two different replacements, or if a replacement is itself
    /// relabeled (chains are ambiguous and not followed).
    pub fn new<I, K, V>(pairs: I) -> Result<Self, ListingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merges = BTreeMap::new();

        for (old, new) in pairs {
            let old = old.into().trim().to_string();
            let new = new.into().trim().to_string();

            if old.is_empty() || new.is_empty() {
                return Err(ListingError::Relabel {
                    message: format!("empty label in '{old}' -> '{new}'"),
                });
            }
            if old == new {
                continue;
            }
            if let Some(existing) = merges.get(&old) {
                if existing != &new {
                    return Err(ListingError::Relabel {
                        message: format!("'{old}' is mapped to both '{existing}' and '{new}'"),
                    });
                }
            }
            merges.insert(old, new);
        }

        if let Some((old, new)) = merges.iter().find(|(_, new)| merges.contains_key(*new)) {
            return Err(ListingError::Relabel {
                message: format!("'{old}' -> '{new}' chains into another merge"),
            });
        }

        Ok(Self { merges })
    }

    /// Parses a single `OLD=NEW` pair as given on the command line.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Relabel`] if there is no `=` separator.
    pub fn parse_pair(raw: &str) -> Result<(String, String), ListingError> {
        raw.split_once('=')
            .map(|(old, new)| (old.trim().to_string(), new.trim().to_string()))
            .ok_or_else(|| ListingError::Relabel {
                message: format!("expected OLD=NEW, got '{raw}'"),
            })
    }

    /// Replacement label for `category`, or `category` itself.
    #[must_use]
    pub fn apply<'a>(&'a self, category: &'a str) -> &'a str {
        self.merges.get(category).map_or(category, String::as_str)
    }

    /// Number of merges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.merges.len()
    }

    /// Whether the table contains no merges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    /// Iterates over `(old, new)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.merges.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Relabels every record's category.
///
/// Returns the new collection, in the original order, and the number of
/// records whose category changed.
#[must_use]
pub fn relabel(records: Vec<ListingRecord>, relabel: &CategoryRelabel) -> (Vec<ListingRecord>, usize) {
    if relabel.is_empty() {
        return (records, 0);
    }

    let mut changed = 0;
    let records = records
        .into_iter()
        .map(|mut record| {
            if let Some(new) = relabel.merges.get(&record.job_category) {
                record.job_category.clone_from(new);
                changed += 1;
            }
            record
        })
        .collect();

    (records, changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: &str, city: &str, count: u64) -> ListingRecord {
        ListingRecord {
            job_category: category.to_string(),
            cleaned_city: city.to_string(),
            cleaned_state: "GA".to_string(),
            job_count: count,
            closest_metro: None,
            closest_airport: None,
            metro_distance_band: None,
            extracted_job_title: String::new(),
        }
    }

    #[test]
    fn relabels_only_matching_categories() {
        let merges =
            CategoryRelabel::new([("Licensed Practical Nurse", "Registered Nurse")]).unwrap();
        let (records, changed) = relabel(
            vec![
                record("Licensed Practical Nurse", "Macon", 4),
                record("Truck Driver", "Macon", 2),
                record("Licensed Practical Nurse", "Athens", 1),
            ],
            &merges,
        );

        assert_eq!(changed, 2);
        let categories: Vec<&str> = records.iter().map(|r| r.job_category.as_str()).collect();
        assert_eq!(
            categories,
            vec!["Registered Nurse", "Truck Driver", "Registered Nurse"]
        );
        assert_eq!(records[2].cleaned_city, "Athens");
    }

    #[test]
    fn rejects_chained_merges() {
        let err = CategoryRelabel::new([("A", "B"), ("B", "C")]).unwrap_err();
        assert!(matches!(err, ListingError::Relabel { .. }));
    }

    #[test]
    fn rejects_conflicting_and_empty_labels() {
        assert!(CategoryRelabel::new([("A", "B"), ("A", "C")]).is_err());
        assert!(CategoryRelabel::new([("", "B")]).is_err());
        assert!(CategoryRelabel::new([("A", " ")]).is_err());
    }

    #[test]
    fn identity_merge_is_dropped() {
        let merges = CategoryRelabel::new([("A", "A")]).unwrap();
        assert!(merges.is_empty());
    }

    #[test]
    fn parses_cli_pairs() {
        assert_eq!(
            CategoryRelabel::parse_pair("Licensed Practical Nurse = Registered Nurse").unwrap(),
            (
                "Licensed Practical Nurse".to_string(),
                "Registered Nurse".to_string()
            )
        );
        assert!(CategoryRelabel::parse_pair("no separator").is_err());
    }

    #[test]
    fn apply_falls_through_for_unknown_labels() {
        let merges = CategoryRelabel::new([("A", "B")]).unwrap();
        assert_eq!(merges.apply("A"), "B");
        assert_eq!(merges.apply("Z"), "Z");
    }

    #[test]
    fn store_relabel_keeps_report() {
        let store = crate::RecordStore::from_records(vec![record("A", "Macon", 1)]);
        let merges = CategoryRelabel::new([("A", "B")]).unwrap();
        let store = store.relabel(&merges);
        assert_eq!(store.records()[0].job_category, "B");
        assert_eq!(store.report().loaded, 1);
    }
}
