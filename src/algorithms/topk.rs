use tracing::{debug, warn};

use crate::algorithms::ensemble::Scorer;
use crate::core::corpus::Corpus;
use crate::core::segment::ScoreResult;

/// Minimum number of corpus rows before dispatching to the parallel ranker.
#[cfg(feature = "parallel")]
const MIN_PARALLEL_ROWS: usize = 256;

/// Bounded accumulator of the `k` best (row, score) pairs.
///
/// Entries are kept sorted by descending score. A candidate only displaces an
/// entry with a strictly lower score, so among equal scores the row seen first
/// stays ahead; feeding rows in corpus order yields a stable ranking.
pub(crate) struct TopKAccumulator {
    scores: Vec<f64>,
    indices: Vec<usize>,
    k: usize,
    /// Rows offered with a finite score.
    valid: usize,
}

impl TopKAccumulator {
    pub fn new(k: usize) -> Self {
        Self {
            scores: Vec::with_capacity(k),
            indices: Vec::with_capacity(k),
            k,
            valid: 0,
        }
    }

    /// Offer row `idx` with `score`. Non-finite scores are unscoreable and dropped.
    #[inline]
    pub fn update(&mut self, idx: usize, score: f64) {
        if !score.is_finite() {
            return;
        }
        self.valid += 1;
        if self.k == 0 {
            return;
        }
        if self.scores.len() == self.k {
            // Quick reject: does not beat the current k-th best
            if score <= self.scores[self.k - 1] {
                return;
            }
            self.scores.pop();
            self.indices.pop();
        }
        let pos = self.scores.partition_point(|&s| s >= score);
        self.scores.insert(pos, score);
        self.indices.insert(pos, idx);
    }

    /// Merge an accumulator built from rows that all come after this one's rows.
    ///
    /// Two-pointer merge of two descending lists; ties go to `self` so the
    /// earlier rows keep precedence.
    #[cfg(feature = "parallel")]
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.k, other.k);
        let cap = self.k.min(self.scores.len() + other.scores.len());
        let mut scores = Vec::with_capacity(cap);
        let mut indices = Vec::with_capacity(cap);
        let (mut ai, mut bi) = (0, 0);
        while scores.len() < self.k && (ai < self.scores.len() || bi < other.scores.len()) {
            let take_a = bi >= other.scores.len()
                || (ai < self.scores.len() && self.scores[ai] >= other.scores[bi]);
            if take_a {
                scores.push(self.scores[ai]);
                indices.push(self.indices[ai]);
                ai += 1;
            } else {
                scores.push(other.scores[bi]);
                indices.push(other.indices[bi]);
                bi += 1;
            }
        }
        self.scores = scores;
        self.indices = indices;
        self.valid += other.valid;
    }

    /// Ranked `(row index, score)` pairs, best first.
    pub fn into_rows(self) -> Vec<(usize, f64)> {
        self.indices.into_iter().zip(self.scores).collect()
    }
}

/// Score one corpus row; malformed rows (wrong width, NaN/inf samples) get `-inf`.
#[inline]
fn score_row<S: Scorer>(query: &[f64], row: &[f64], scorer: &S) -> f64 {
    if row.len() != query.len() || row.iter().any(|v| !v.is_finite()) {
        return f64::NEG_INFINITY;
    }
    let s = scorer.score(query, row);
    if s.is_finite() {
        s
    } else {
        f64::NEG_INFINITY
    }
}

/// Score `query` against every row; unscoreable rows are `f64::NEG_INFINITY`.
pub fn score_all<S: Scorer>(query: &[f64], corpus: &Corpus, scorer: &S) -> Vec<f64> {
    #[cfg(feature = "parallel")]
    if corpus.len() >= MIN_PARALLEL_ROWS {
        use rayon::prelude::*;
        return (0..corpus.len())
            .into_par_iter()
            .map(|i| score_row(query, corpus.row(i), scorer))
            .collect();
    }
    corpus.rows().map(|row| score_row(query, row, scorer)).collect()
}

/// Return the `k` corpus rows most similar to `query`, best first.
///
/// - Scores are sorted descending; equal scores keep corpus row order.
/// - Rows whose score is NaN or infinite, and rows containing NaN/infinite
///   samples, are never returned.
/// - Fewer than `k` valid rows → all valid rows. Empty corpus or `k == 0` → empty.
///
/// # Examples
///
/// ```
/// use sketch_rs::{normalize_query, rank_top_k, Corpus, EnsembleScorer};
///
/// let up: Vec<f64> = (0..10).map(|i| i as f64).collect();
/// let down: Vec<f64> = up.iter().rev().copied().collect();
/// let corpus = Corpus::from_rows(
///     "MA20",
///     vec!["UP".into(), "DOWN".into()],
///     vec![normalize_query(&up, 64).unwrap(), normalize_query(&down, 64).unwrap()],
/// )
/// .unwrap();
///
/// let query = normalize_query(&up, 64).unwrap();
/// let top = rank_top_k(&query, &corpus, 5, &EnsembleScorer::default());
/// assert_eq!(top.len(), 2);
/// assert_eq!(top[0].series_id, "UP");
/// assert_eq!(top[0].rank, 1);
/// ```
pub fn rank_top_k<S: Scorer>(query: &[f64], corpus: &Corpus, k: usize, scorer: &S) -> Vec<ScoreResult> {
    to_results(top_k_rows(query, corpus, k, scorer), corpus)
}

/// Serial ranking: one pass over the rows in corpus order.
pub fn rank_top_k_serial<S: Scorer>(
    query: &[f64],
    corpus: &Corpus,
    k: usize,
    scorer: &S,
) -> Vec<ScoreResult> {
    let k = k.min(corpus.len());
    let rows = finish(collect_serial(query, corpus, k, scorer), corpus, k);
    to_results(rows, corpus)
}

/// Parallel ranking: contiguous row chunks scored on the rayon pool, merged in
/// chunk order so ties resolve exactly as in the serial path.
#[cfg(feature = "parallel")]
pub fn rank_top_k_parallel<S: Scorer>(
    query: &[f64],
    corpus: &Corpus,
    k: usize,
    scorer: &S,
) -> Vec<ScoreResult> {
    let k = k.min(corpus.len());
    let rows = finish(collect_parallel(query, corpus, k, scorer), corpus, k);
    to_results(rows, corpus)
}

/// Ranked `(row index, score)` pairs; the row-level form of [`rank_top_k`].
pub(crate) fn top_k_rows<S: Scorer>(
    query: &[f64],
    corpus: &Corpus,
    k: usize,
    scorer: &S,
) -> Vec<(usize, f64)> {
    if corpus.is_empty() {
        warn!(kind = corpus.kind(), "ranking against an empty corpus");
        return Vec::new();
    }
    // At most one result per row.
    let k = k.min(corpus.len());
    if k == 0 {
        return Vec::new();
    }

    #[cfg(feature = "parallel")]
    if corpus.len() >= MIN_PARALLEL_ROWS {
        return finish(collect_parallel(query, corpus, k, scorer), corpus, k);
    }
    finish(collect_serial(query, corpus, k, scorer), corpus, k)
}

fn collect_serial<S: Scorer>(query: &[f64], corpus: &Corpus, k: usize, scorer: &S) -> TopKAccumulator {
    let mut acc = TopKAccumulator::new(k);
    for (i, row) in corpus.rows().enumerate() {
        acc.update(i, score_row(query, row, scorer));
    }
    acc
}

#[cfg(feature = "parallel")]
fn collect_parallel<S: Scorer>(query: &[f64], corpus: &Corpus, k: usize, scorer: &S) -> TopKAccumulator {
    use rayon::prelude::*;

    let n = corpus.len();
    let mut combined = TopKAccumulator::new(k);
    if n == 0 {
        return combined;
    }
    let n_chunks = rayon::current_num_threads().max(1).min(n);
    let chunk = n.div_ceil(n_chunks);
    let ranges: Vec<(usize, usize)> = (0..n).step_by(chunk).map(|s| (s, (s + chunk).min(n))).collect();

    let partials: Vec<TopKAccumulator> = ranges
        .into_par_iter()
        .map(|(start, end)| {
            let mut acc = TopKAccumulator::new(k);
            for i in start..end {
                acc.update(i, score_row(query, corpus.row(i), scorer));
            }
            acc
        })
        .collect();

    for partial in &partials {
        combined.merge(partial);
    }
    combined
}

fn finish(acc: TopKAccumulator, corpus: &Corpus, k: usize) -> Vec<(usize, f64)> {
    let valid = acc.valid;
    let rows = acc.into_rows();
    debug!(
        kind = corpus.kind(),
        rows = corpus.len(),
        valid,
        k,
        returned = rows.len(),
        best = rows.first().map(|&(_, s)| s),
        "ranked corpus"
    );
    rows
}

fn to_results(rows: Vec<(usize, f64)>, corpus: &Corpus) -> Vec<ScoreResult> {
    rows.into_iter()
        .enumerate()
        .map(|(pos, (idx, score))| ScoreResult {
            series_id: corpus.ids()[idx].clone(),
            score,
            rank: pos + 1,
        })
        .collect()
}
