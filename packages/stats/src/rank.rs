//! Top-N extraction.

use job_market_stats_models::RankedEntry;

/// Ranks `items` by `metric`, highest first, and keeps the first `n`.
///
/// The sort is stable, so items with equal metrics keep their input order.
/// Ranks are 1-based and consecutive. An empty input gives an empty ranking.
pub fn top_n<T>(items: Vec<T>, n: usize, metric: impl Fn(&T) -> f64) -> Vec<RankedEntry<T>> {
    let mut keyed: Vec<(f64, T)> = items.into_iter().map(|item| (metric(&item), item)).collect();
    keyed.sort_by(|(a, _), (b, _)| b.total_cmp(a));

    keyed
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (_, item))| RankedEntry { rank: i + 1, item })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_descending() {
        let ranked = top_n(vec![("a", 1.0), ("b", 3.0), ("c", 2.0)], 2, |x| x.1);
        let names: Vec<(usize, &str)> = ranked.iter().map(|e| (e.rank, e.item.0)).collect();
        assert_eq!(names, vec![(1, "b"), (2, "c")]);
    }

    #[test]
    fn ties_keep_input_order() {
        let ranked = top_n(
            vec![("first", 5.0), ("low", 1.0), ("second", 5.0), ("third", 5.0)],
            3,
            |x| x.1,
        );
        let names: Vec<&str> = ranked.iter().map(|e| e.item.0).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_input_gives_empty_ranking() {
        let ranked = top_n(Vec::<(&str, f64)>::new(), 5, |x| x.1);
        assert!(ranked.is_empty());
    }

    #[test]
    fn n_larger_than_input_returns_everything() {
        let ranked = top_n(vec![1_u64, 2], 10, |&x| x as f64);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[1].rank, 2);
        assert_eq!(ranked[1].item, 1);
    }
}
