//! Generic group-by and aggregation primitives.
//!
//! Groups are kept in the order their key was first encountered, which is
//! what makes every downstream ranking tie-break deterministic.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use job_market_stats_models::AggregateStat;

/// Map that iterates in first-insertion order.
#[derive(Debug, Clone)]
pub struct GroupMap<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    positions: BTreeMap<K, usize>,
}

impl<K, V> Default for GroupMap<K, V> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            positions: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone, V> GroupMap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, inserting `default()` first if absent.
    pub fn get_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        let idx = match self.positions.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.keys.len();
                self.positions.insert(key.clone(), idx);
                self.keys.push(key);
                self.values.push(default());
                idx
            }
        };
        &mut self.values[idx]
    }

    /// Value for `key`, if present.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.positions.get(key).map(|&idx| &self.values[idx])
    }

    /// Whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.positions.contains_key(key)
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates over `(key, value)` in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys.iter().zip(self.values.iter())
    }

    /// Keys in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    /// Values in first-insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.values.iter()
    }

    /// Transforms every value, keeping keys and order.
    #[must_use]
    pub fn map_values<U>(self, mut f: impl FnMut(&K, V) -> U) -> GroupMap<K, U> {
        let values = self
            .keys
            .iter()
            .zip(self.values)
            .map(|(k, v)| f(k, v))
            .collect();
        GroupMap {
            keys: self.keys,
            values,
            positions: self.positions,
        }
    }

    /// Converts into a key-sorted map, converting keys with `key_fn`.
    #[must_use]
    pub fn into_sorted<K2: Ord>(self, mut key_fn: impl FnMut(K) -> K2) -> BTreeMap<K2, V> {
        self.keys
            .into_iter()
            .zip(self.values)
            .map(|(k, v)| (key_fn(k), v))
            .collect()
    }
}

impl<K: Ord + Clone, V> IntoIterator for GroupMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::iter::Zip<std::vec::IntoIter<K>, std::vec::IntoIter<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter().zip(self.values)
    }
}

/// Groups `items` by `key_fn`, preserving first-encountered group order and
/// the input order within each group.
///
/// Items for which `key_fn` returns `None` lack the grouping dimension and
/// are left out of the result.
pub fn group_by<'a, T, K, F>(
    items: impl IntoIterator<Item = &'a T>,
    key_fn: F,
) -> GroupMap<K, Vec<&'a T>>
where
    T: 'a,
    K: Ord + Clone,
    F: Fn(&'a T) -> Option<K>,
{
    let mut groups = GroupMap::new();
    let mut excluded = 0_usize;

    for item in items {
        match key_fn(item) {
            Some(key) => groups.get_or_insert_with(key, Vec::new).push(item),
            None => excluded += 1,
        }
    }

    if excluded > 0 {
        log::debug!(
            "{excluded} item(s) lack the grouping key; excluded from {} group(s)",
            groups.len()
        );
    }

    groups
}

/// Groups `items` by `key_fn` and summarizes `value_fn` within each group.
///
/// Groups with no members are never produced.
pub fn aggregate<'a, T, K, F, V>(
    items: impl IntoIterator<Item = &'a T>,
    key_fn: F,
    value_fn: V,
) -> GroupMap<K, AggregateStat>
where
    T: 'a,
    K: Ord + Clone,
    F: Fn(&'a T) -> Option<K>,
    V: Fn(&T) -> u64,
{
    group_by(items, key_fn).map_values(|_, members| {
        let values: Vec<u64> = members.iter().map(|&m| value_fn(m)).collect();
        summarize(&values)
    })
}

/// Descriptive statistics of a non-empty slice. An empty slice yields an
/// all-zero statistic with `count == 0`, which callers never emit.
#[must_use]
pub fn summarize(values: &[u64]) -> AggregateStat {
    if values.is_empty() {
        return AggregateStat {
            count: 0,
            mean: 0.0,
            median: 0.0,
            min: 0,
            max: 0,
            std: 0.0,
        };
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (to_f64(sorted[mid - 1]) + to_f64(sorted[mid])) / 2.0
    } else {
        to_f64(sorted[mid])
    };

    let mean = exact_mean(values);

    AggregateStat {
        count: values.len() as u64,
        mean: round1(mean),
        median: round1(median),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        std: round1(sample_std(values, mean)),
    }
}

/// Unrounded mean of `values`, `0.0` when empty.
#[must_use]
pub fn exact_mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| to_f64(v)).sum::<f64>() / to_f64(values.len() as u64)
}

/// Mean of the per-group means, where groups come from `key_fn`.
///
/// Each group's mean is left unrounded; only the final result is rounded.
#[must_use]
pub fn mean_of_group_means<'a, T, K, F, V>(items: &[&'a T], key_fn: F, value_fn: V) -> f64
where
    K: Ord + Clone,
    F: Fn(&'a T) -> Option<K>,
    V: Fn(&T) -> u64,
{
    let groups = group_by(items.iter().copied(), key_fn);
    if groups.is_empty() {
        return 0.0;
    }
    let means: Vec<f64> = groups
        .values()
        .map(|members| {
            let values: Vec<u64> = members.iter().map(|&m| value_fn(m)).collect();
            exact_mean(&values)
        })
        .collect();
    round1(means.iter().sum::<f64>() / to_f64(means.len() as u64))
}

/// Rounds to one decimal place.
///
/// Rounds the exact binary value, so `2.45` (stored as `2.4500000000000002`)
/// becomes `2.5` and `0.35` (stored as `0.34999999999999998`) becomes `0.3`.
/// Only exactly representable halves such as `0.25` round to even.
#[must_use]
pub fn round1(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

/// `part / whole * 100`, rounded to one decimal; `0.0` when `whole` is 0.
#[must_use]
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round1(to_f64(part) / to_f64(whole) * 100.0)
    }
}

/// Sample standard deviation (n - 1 denominator), `0.0` for fewer than two
/// values.
fn sample_std(values: &[u64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values
        .iter()
        .map(|&v| {
            let d = to_f64(v) - mean;
            d * d
        })
        .sum();
    (sum_sq / to_f64(values.len() as u64 - 1)).sqrt()
}

#[allow(clippy::cast_precision_loss)]
pub(crate) const fn to_f64(value: u64) -> f64 {
    value as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_two_values() {
        let stat = summarize(&[10, 20]);
        assert_eq!(stat.count, 2);
        assert!((stat.mean - 15.0).abs() < f64::EPSILON);
        assert!((stat.median - 15.0).abs() < f64::EPSILON);
        assert_eq!(stat.min, 10);
        assert_eq!(stat.max, 20);
        assert!((stat.std - 7.1).abs() < f64::EPSILON);
    }

    #[test]
    fn single_value_has_zero_std() {
        let stat = summarize(&[7]);
        assert_eq!(stat.count, 1);
        assert!((stat.mean - 7.0).abs() < f64::EPSILON);
        assert!(stat.std.abs() < f64::EPSILON);
    }

    #[test]
    fn median_of_odd_count() {
        let stat = summarize(&[9, 1, 4]);
        assert!((stat.median - 4.0).abs() < f64::EPSILON);
        assert!((stat.mean - 4.7).abs() < f64::EPSILON);
    }

    #[test]
    fn rounding_follows_the_stored_value() {
        assert!((round1(49.0 / 20.0) - 2.5).abs() < f64::EPSILON);
        assert!((round1(7.0 / 20.0) - 0.3).abs() < f64::EPSILON);
        assert!((round1(2.0 / 3.0) - 0.7).abs() < f64::EPSILON);
        assert!((round1(0.25) - 0.2).abs() < f64::EPSILON);
        assert!((round1(0.75) - 0.8).abs() < f64::EPSILON);
        assert!((round1(83.333_333) - 83.3).abs() < f64::EPSILON);
        assert!(round1(0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mean_of_near_tie_rounds_up() {
        let mut values = vec![2_u64; 11];
        values.extend([3; 9]);
        assert_eq!(values.iter().sum::<u64>(), 49);

        let stat = summarize(&values);
        assert_eq!(stat.count, 20);
        assert!((stat.mean - 2.5).abs() < f64::EPSILON);
        assert!((stat.median - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn min_le_mean_le_max() {
        let samples: &[&[u64]] = &[&[1], &[0, 0, 1], &[3, 3, 3, 4], &[1, 100, 1000], &[5, 6]];
        for values in samples {
            let stat = summarize(values);
            assert!(to_f64(stat.min) <= stat.mean, "{values:?}");
            assert!(stat.mean <= to_f64(stat.max), "{values:?}");
        }
    }

    #[test]
    fn group_by_keeps_first_encountered_order() {
        let items = ["b1", "a1", "b2", "c1", "a2"];
        let groups = group_by(items.iter(), |s| s.chars().next());
        let keys: Vec<char> = groups.keys().copied().collect();
        assert_eq!(keys, vec!['b', 'a', 'c']);
        assert_eq!(groups.get(&'a').unwrap(), &vec![&"a1", &"a2"]);
    }

    #[test]
    fn group_by_excludes_missing_keys() {
        let items = [Some(1_u64), None, Some(1), Some(2)];
        let groups = group_by(items.iter(), |v| *v);
        assert_eq!(groups.len(), 2);
        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn aggregate_counts_match_members() {
        let items = [("x", 10_u64), ("x", 20), ("y", 5)];
        let stats = aggregate(items.iter(), |t| Some(t.0), |t| t.1);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.get("x").unwrap().count, 2);
        assert_eq!(stats.get("y").unwrap().count, 1);
        assert!(stats.values().all(|s| s.count > 0));
    }

    #[test]
    fn mean_of_group_means_weights_groups_equally() {
        let items = [("a", 10_u64), ("a", 20), ("a", 30), ("b", 2)];
        let refs: Vec<&(&str, u64)> = items.iter().collect();
        let v = mean_of_group_means(&refs, |t| Some(t.0), |t| t.1);
        assert!((v - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_handles_zero_whole() {
        assert!((percentage(3, 5) - 60.0).abs() < f64::EPSILON);
        assert!(percentage(0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn into_sorted_orders_by_key() {
        let mut map = GroupMap::new();
        *map.get_or_insert_with("z", || 0) += 1;
        *map.get_or_insert_with("a", || 0) += 2;
        let sorted = map.into_sorted(str::to_string);
        let keys: Vec<&String> = sorted.keys().collect();
        assert_eq!(keys, vec!["a", "z"]);
    }
}
