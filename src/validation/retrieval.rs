//! Rank-aware retrieval metrics over lists of series ids.

/// Fraction of the first `k` retrieved ids that are relevant.
///
/// The denominator is always `k`, so short result lists are penalized.
/// Returns `0.0` for `k == 0` or an empty retrieval.
pub fn precision_at_k(retrieved: &[String], relevant: &[String], k: usize) -> f64 {
    if k == 0 || retrieved.is_empty() {
        return 0.0;
    }
    hits(retrieved, relevant, k) as f64 / k as f64
}

/// Fraction of the relevant ids found among the first `k` retrieved.
///
/// Returns `0.0` when `relevant` is empty.
pub fn recall_at_k(retrieved: &[String], relevant: &[String], k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    hits(retrieved, relevant, k) as f64 / relevant.len() as f64
}

/// Normalized discounted cumulative gain with binary relevance.
///
/// `DCG = sum(rel_i / log2(i + 2))` over the first `k` positions, divided by
/// the DCG of the ideal ordering (all relevant ids first). Returns `0.0` when
/// the ideal DCG is zero.
pub fn ndcg_at_k(retrieved: &[String], relevant: &[String], k: usize) -> f64 {
    let actual = dcg(retrieved.iter().take(k).map(|id| relevant.contains(id)));
    let ideal = dcg((0..relevant.len().min(k)).map(|_| true));
    if ideal == 0.0 {
        0.0
    } else {
        actual / ideal
    }
}

fn hits(retrieved: &[String], relevant: &[String], k: usize) -> usize {
    retrieved
        .iter()
        .take(k)
        .filter(|id| relevant.contains(*id))
        .count()
}

fn dcg(relevances: impl Iterator<Item = bool>) -> f64 {
    relevances
        .enumerate()
        .filter(|(_, rel)| *rel)
        .map(|(i, _)| 1.0 / (i as f64 + 2.0).log2())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_precision_and_recall() {
        let retrieved = ids(&["a", "x", "b", "y", "z"]);
        let relevant = ids(&["a", "b", "c"]);
        assert!((precision_at_k(&retrieved, &relevant, 5) - 0.4).abs() < 1e-12);
        assert!((precision_at_k(&retrieved, &relevant, 1) - 1.0).abs() < 1e-12);
        assert!((recall_at_k(&retrieved, &relevant, 5) - 2.0 / 3.0).abs() < 1e-12);
        assert!((recall_at_k(&retrieved, &relevant, 2) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_retrieval_penalizes_precision() {
        let retrieved = ids(&["a"]);
        let relevant = ids(&["a"]);
        assert!((precision_at_k(&retrieved, &relevant, 5) - 0.2).abs() < 1e-12);
        assert!((recall_at_k(&retrieved, &relevant, 5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs_are_zero() {
        let some = ids(&["a"]);
        assert_eq!(precision_at_k(&some, &some, 0), 0.0);
        assert_eq!(precision_at_k(&[], &some, 5), 0.0);
        assert_eq!(recall_at_k(&some, &[], 5), 0.0);
        assert_eq!(ndcg_at_k(&some, &[], 5), 0.0);
        assert_eq!(ndcg_at_k(&some, &some, 0), 0.0);
    }

    #[test]
    fn test_ndcg_rewards_early_hits() {
        let relevant = ids(&["a"]);
        let first = ndcg_at_k(&ids(&["a", "x", "y"]), &relevant, 3);
        let last = ndcg_at_k(&ids(&["x", "y", "a"]), &relevant, 3);
        assert!((first - 1.0).abs() < 1e-12);
        // 1 / log2(4)
        assert!((last - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ndcg_hand_computed() {
        // rel = [0, 1, 1], ideal = [1, 1]
        let retrieved = ids(&["x", "a", "b"]);
        let relevant = ids(&["a", "b"]);
        let actual = 1.0 / 3f64.log2() + 1.0 / 4f64.log2();
        let ideal = 1.0 + 1.0 / 3f64.log2();
        assert!((ndcg_at_k(&retrieved, &relevant, 3) - actual / ideal).abs() < 1e-12);
    }
}
