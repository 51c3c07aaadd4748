use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::algorithms::normalize::normalize_query;
use crate::core::error::{Result, SketchError};
use crate::core::segment::Segment;

/// Source window of a corpus row built from a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RowWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Which segments of a series make it into a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentSelection {
    /// Every segment.
    #[default]
    All,
    /// Only the segment with the latest `window_end` per series.
    LatestPerSeries,
}

/// One corpus row before flattening.
#[derive(Debug, Clone)]
pub(crate) struct CorpusEntry {
    pub id: String,
    pub window: Option<RowWindow>,
    pub vector: Vec<f64>,
}

impl From<Segment> for CorpusEntry {
    fn from(s: Segment) -> Self {
        Self {
            id: s.series_id,
            window: Some(RowWindow {
                start: s.window_start,
                end: s.window_end,
            }),
            vector: s.vector,
        }
    }
}

/// Dense, immutable N x L matrix of normalized rows plus a parallel id list.
///
/// Row `i` belongs to `ids()[i]`; every row has length `width()`. A corpus is
/// never modified after construction; refreshes build a new value and swap it
/// in (see [`CorpusStore`](crate::CorpusStore)).
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    kind: String,
    width: usize,
    /// Row-major `len * width` values.
    data: Vec<f64>,
    ids: Vec<String>,
    windows: Vec<Option<RowWindow>>,
    /// First row index of every id.
    first_row: HashMap<String, usize>,
}

impl Corpus {
    /// An empty corpus of the given kind.
    pub fn empty(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Build from explicit rows.
    ///
    /// # Errors
    /// `LengthMismatch` if `ids` and `rows` differ in count or rows differ in width.
    pub fn from_rows(kind: impl Into<String>, ids: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if ids.len() != rows.len() {
            return Err(SketchError::LengthMismatch {
                context: "corpus ids vs rows",
                expected: rows.len(),
                got: ids.len(),
            });
        }
        let entries = ids
            .into_iter()
            .zip(rows)
            .map(|(id, vector)| CorpusEntry {
                id,
                window: None,
                vector,
            })
            .collect();
        Self::from_entries(kind.into(), entries)
    }

    /// Build from stored segments of one kind.
    ///
    /// Segments of other kinds are ignored. Rows are ordered by series id, then
    /// window start.
    pub fn from_segments(
        kind: impl Into<String>,
        segments: impl IntoIterator<Item = Segment>,
        selection: SegmentSelection,
    ) -> Result<Self> {
        let kind = kind.into();
        let matching = segments.into_iter().filter(|s| s.kind == kind);

        let mut entries: Vec<CorpusEntry> = match selection {
            SegmentSelection::All => matching.map(CorpusEntry::from).collect(),
            SegmentSelection::LatestPerSeries => {
                let mut latest: HashMap<String, Segment> = HashMap::new();
                for seg in matching {
                    match latest.get(&seg.series_id) {
                        Some(cur) if cur.window_end > seg.window_end => {}
                        _ => {
                            latest.insert(seg.series_id.clone(), seg);
                        }
                    }
                }
                latest.into_values().map(CorpusEntry::from).collect()
            }
        };
        sort_canonical(&mut entries);
        Self::from_entries(kind, entries)
    }

    /// Whole-series mode: one row per series, resampled and normalized to `out_len`.
    ///
    /// Series with fewer than `min_points` values are skipped.
    pub fn from_series<S, V>(
        kind: impl Into<String>,
        series: impl IntoIterator<Item = (S, V)>,
        out_len: usize,
        min_points: usize,
    ) -> Result<Self>
    where
        S: Into<String>,
        V: AsRef<[f64]>,
    {
        if min_points < 2 {
            return Err(SketchError::invalid("min_points", "must be >= 2"));
        }
        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for (id, values) in series {
            let values = values.as_ref();
            if values.len() < min_points {
                skipped += 1;
                continue;
            }
            entries.push(CorpusEntry {
                id: id.into(),
                window: None,
                vector: normalize_query(values, out_len)?,
            });
        }
        if skipped > 0 {
            warn!(skipped, min_points, "skipped series too short for the corpus");
        }
        Self::from_entries(kind.into(), entries)
    }

    pub(crate) fn from_entries(kind: String, entries: Vec<CorpusEntry>) -> Result<Self> {
        let width = entries.first().map_or(0, |e| e.vector.len());
        let mut data = Vec::with_capacity(entries.len() * width);
        let mut ids = Vec::with_capacity(entries.len());
        let mut windows = Vec::with_capacity(entries.len());
        let mut first_row = HashMap::new();

        for (i, entry) in entries.into_iter().enumerate() {
            if entry.vector.len() != width {
                return Err(SketchError::LengthMismatch {
                    context: "corpus row width",
                    expected: width,
                    got: entry.vector.len(),
                });
            }
            data.extend_from_slice(&entry.vector);
            first_row.entry(entry.id.clone()).or_insert(i);
            ids.push(entry.id);
            windows.push(entry.window);
        }

        Ok(Self {
            kind,
            width,
            data,
            ids,
            windows,
            first_row,
        })
    }

    /// Rows as owned entries, for rebuilding a modified copy.
    pub(crate) fn entries(&self) -> impl Iterator<Item = CorpusEntry> + '_ {
        (0..self.len()).map(move |i| CorpusEntry {
            id: self.ids[i].clone(),
            window: self.windows[i],
            vector: self.row(i).to_vec(),
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Row length `L`.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Row `i`.
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    /// Source window of row `i`, if it came from a segment.
    pub fn window(&self, i: usize) -> Option<RowWindow> {
        self.windows.get(i).copied().flatten()
    }

    /// Iterate rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    /// The first row stored for `id`.
    pub fn vector_for(&self, id: &str) -> Option<&[f64]> {
        self.first_row.get(id).map(|&i| self.row(i))
    }

    /// Number of distinct series ids.
    pub fn series_count(&self) -> usize {
        self.first_row.len()
    }
}

/// Order rows by series id, then by window start (rows without a window first).
pub(crate) fn sort_canonical(entries: &mut [CorpusEntry]) {
    entries.sort_by(|a, b| {
        a.id.cmp(&b.id)
            .then_with(|| a.window.map(|w| w.start).cmp(&b.window.map(|w| w.start)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn segment(id: &str, start: u32, end: u32, kind: &str, v: f64) -> Segment {
        Segment {
            series_id: id.to_string(),
            window_start: date(start),
            window_end: date(end),
            kind: kind.to_string(),
            vector: vec![v, -v, v],
            volatility: 1.0,
        }
    }

    #[test]
    fn test_from_rows_layout() {
        let corpus = Corpus::from_rows(
            "MA20",
            vec!["A".into(), "B".into()],
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        )
        .unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.width(), 3);
        assert_eq!(corpus.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(corpus.vector_for("A"), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(corpus.vector_for("C"), None);
        assert_eq!(corpus.window(0), None);
        assert_eq!(corpus.rows().count(), 2);
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let err = Corpus::from_rows("MA20", vec!["A".into(), "B".into()], vec![vec![1.0, 2.0], vec![1.0]])
            .unwrap_err();
        assert!(matches!(err, SketchError::LengthMismatch { expected: 2, got: 1, .. }));

        let err = Corpus::from_rows("MA20", vec!["A".into()], vec![]).unwrap_err();
        assert!(matches!(err, SketchError::LengthMismatch { .. }));
    }

    #[test]
    fn test_empty_corpus() {
        let corpus = Corpus::from_rows("MA20", vec![], vec![]).unwrap();
        assert!(corpus.is_empty());
        assert_eq!(corpus.width(), 0);
        assert_eq!(Corpus::empty("MA30").kind(), "MA30");
    }

    #[test]
    fn test_from_segments_orders_and_filters_kind() {
        let segs = vec![
            segment("MSFT", 5, 9, "MA20", 2.0),
            segment("AAPL", 3, 7, "MA20", 1.0),
            segment("AAPL", 1, 5, "MA20", 3.0),
            segment("AAPL", 2, 6, "MA30", 4.0),
        ];
        let corpus = Corpus::from_segments("MA20", segs, SegmentSelection::All).unwrap();
        assert_eq!(corpus.ids(), &["AAPL", "AAPL", "MSFT"]);
        assert_eq!(corpus.window(0).unwrap().start, date(1));
        assert_eq!(corpus.row(1)[0], 1.0);
        assert_eq!(corpus.series_count(), 2);
        // Overlay lookup returns the first row of the series.
        assert_eq!(corpus.vector_for("AAPL").unwrap()[0], 3.0);
    }

    #[test]
    fn test_from_segments_latest_per_series() {
        let segs = vec![
            segment("AAPL", 1, 5, "MA20", 1.0),
            segment("AAPL", 3, 9, "MA20", 2.0),
            segment("AAPL", 2, 6, "MA20", 3.0),
            segment("MSFT", 1, 4, "MA20", 4.0),
        ];
        let corpus = Corpus::from_segments("MA20", segs, SegmentSelection::LatestPerSeries).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.ids(), &["AAPL", "MSFT"]);
        assert_eq!(corpus.window(0).unwrap().end, date(9));
        assert_eq!(corpus.row(0)[0], 2.0);
    }

    #[test]
    fn test_from_series_skips_short() {
        let series = vec![
            ("LONG", (0..40).map(|i| i as f64).collect::<Vec<_>>()),
            ("SHORT", vec![1.0, 2.0, 3.0]),
        ];
        let corpus = Corpus::from_series("MA20", series, 64, 30).unwrap();
        assert_eq!(corpus.ids(), &["LONG"]);
        assert_eq!(corpus.width(), 64);
        let row = corpus.row(0);
        let mean = row.iter().sum::<f64>() / row.len() as f64;
        assert!(mean.abs() < 1e-9);

        assert!(Corpus::from_series("MA20", Vec::<(&str, Vec<f64>)>::new(), 64, 1).is_err());
    }
}
