use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use sketch_rs::algorithms::normalize::{mean_std, DEFAULT_EPS};
use sketch_rs::{
    normalize_query, rank_top_k, resample, score_all, zscore, Corpus, Dtw, EnsembleScorer, Scorer,
    SimilarityMetric,
};

const MIN_PROPTEST_CASES: u32 = 64;
const ABS_TOL: f64 = 1e-9;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

fn series_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1_000.0f64..1_000.0, min_len..max_len)
}

fn pair_strategy(max_len: usize) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (2..max_len).prop_flat_map(|n| {
        (
            prop::collection::vec(-50.0f64..50.0, n),
            prop::collection::vec(-50.0f64..50.0, n),
        )
    })
}

fn corpus_strategy() -> impl Strategy<Value = (Vec<Vec<f64>>, usize)> {
    (
        prop::collection::vec(prop::collection::vec(-5.0f64..5.0, 8), 1..40),
        0usize..12,
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        .. ProptestConfig::default()
    })]

    #[test]
    fn resample_has_requested_length_and_keeps_nodes(
        values in series_strategy(2, 64),
        out_len in 2usize..200,
    ) {
        let r = resample(&values, out_len).unwrap();
        prop_assert_eq!(r.len(), out_len);
        prop_assert_eq!(r[0], values[0]);
        prop_assert_eq!(r[out_len - 1], values[values.len() - 1]);

        let same = resample(&values, values.len()).unwrap();
        prop_assert_eq!(same, values);
    }

    #[test]
    fn resample_stays_within_input_range(values in series_strategy(2, 64), out_len in 2usize..200) {
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for v in resample(&values, out_len).unwrap() {
            prop_assert!(v >= lo - ABS_TOL && v <= hi + ABS_TOL);
        }
    }

    #[test]
    fn zscore_is_finite_and_idempotent(values in series_strategy(2, 128)) {
        let (_, raw_std) = mean_std(&values);
        prop_assume!(raw_std > 1e-2);

        let z = zscore(&values, DEFAULT_EPS);
        prop_assert_eq!(z.len(), values.len());
        prop_assert!(z.iter().all(|v| v.is_finite()));

        let (mean, std) = mean_std(&z);
        prop_assert!(mean.abs() < 1e-9);
        prop_assert!((std - 1.0).abs() < 1e-9);

        let zz = zscore(&z, DEFAULT_EPS);
        for (a, b) in z.iter().zip(&zz) {
            prop_assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn zscore_contains_nan_poisoning(
        mut values in series_strategy(2, 64),
        nan_at in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        for idx in nan_at {
            let i = idx.index(values.len());
            values[i] = f64::NAN;
        }
        let z = zscore(&values, DEFAULT_EPS);
        prop_assert_eq!(z.len(), values.len());
        prop_assert!(z.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn ensemble_score_is_bounded((a, b) in pair_strategy(48)) {
        let scorer = EnsembleScorer::default();
        let s = scorer.score(&a, &b);
        prop_assert!(s.is_finite());
        prop_assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn self_similarity_is_near_one(values in series_strategy(2, 48)) {
        let (_, raw_std) = mean_std(&values);
        prop_assume!(raw_std > 1e-2);

        let v = normalize_query(&values, 32).unwrap();
        let s = EnsembleScorer::default().score(&v, &v);
        prop_assert!(s >= 0.95, "self score {}", s);
    }

    #[test]
    fn dtw_is_symmetric_and_band_only_adds_cost((a, b) in pair_strategy(40), radius in 0usize..6) {
        let full = Dtw::unconstrained();
        let d_ab = full.evaluate(&a, &b);
        let d_ba = full.evaluate(&b, &a);
        prop_assert!(d_ab >= 0.0);
        prop_assert!((d_ab - d_ba).abs() < 1e-9 * (1.0 + d_ab));

        let banded = Dtw::banded(radius).evaluate(&a, &b);
        prop_assert!(banded + 1e-9 >= d_ab);
    }

    #[test]
    fn ranking_returns_best_rows_in_order((rows, k) in corpus_strategy()) {
        let n = rows.len();
        let ids: Vec<String> = (0..n).map(|i| format!("S{i}")).collect();
        let corpus = Corpus::from_rows("MA20", ids, rows).unwrap();
        let query: Vec<f64> = (0..8).map(|i| i as f64 - 3.5).collect();
        let scorer = EnsembleScorer::default();

        let top = rank_top_k(&query, &corpus, k, &scorer);
        prop_assert_eq!(top.len(), k.min(n));
        for (i, r) in top.iter().enumerate() {
            prop_assert_eq!(r.rank, i + 1);
            prop_assert!((0.0..=1.0).contains(&r.score));
        }
        for w in top.windows(2) {
            prop_assert!(w[0].score >= w[1].score);
        }

        // Nothing left out scores above the last returned row.
        if let Some(last) = top.last() {
            let all = score_all(&query, &corpus, &scorer);
            let better = all.iter().filter(|&&s| s > last.score).count();
            prop_assert!(better < top.len());
        }
    }
}
