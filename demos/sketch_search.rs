//! Sketch search over a small synthetic market.
//!
//! Builds MA20 segments for a handful of made-up tickers, then searches the
//! corpus with a hand-drawn "dip and recovery" sketch.
//!
//! Run with: RUST_LOG=sketch_rs=debug cargo run --release --example sketch_search

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sketch_rs::{Corpus, EnsembleEngine, SegmentSelection};
use tracing_subscriber::EnvFilter;

fn synthetic_closes(seed: u64, days: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 100.0;
    (0..days)
        .map(|i| {
            let noise: f64 = rng.gen_range(-1.0..1.0);
            let cycle = (i as f64 / (20.0 + seed as f64 * 3.0)).sin() * 0.8;
            price += noise + cycle;
            price
        })
        .collect()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let engine = EnsembleEngine::default();
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let days = 260;
    let dates: Vec<NaiveDate> = (0..days).map(|i| start + Duration::days(i as i64)).collect();

    let mut segments = Vec::new();
    for (seed, ticker) in ["ACME", "BOLT", "CRUX", "DYNO", "ECHO", "FLUX"].iter().enumerate() {
        let closes = synthetic_closes(seed as u64 + 1, days);
        let series = engine.average_closes(*ticker, &dates, &closes).unwrap();
        let built = series.build_segments(&engine.config().segment).unwrap();
        println!("{ticker}: {} MA20 points, {} segments", series.len(), built.len());
        segments.extend(built);
    }

    let corpus = Corpus::from_segments("MA20", segments, SegmentSelection::All).unwrap();
    println!("\nCorpus: {} rows x {} points, {} series", corpus.len(), corpus.width(), corpus.series_count());

    // Dip and recovery, drawn with 14 points.
    let sketch = [10.0, 9.5, 8.7, 7.5, 6.2, 5.1, 4.6, 4.8, 5.5, 6.6, 7.8, 8.9, 9.6, 10.2];
    let response = engine.search(&sketch, &corpus, 5).unwrap();

    println!("\nTop {} matches", response.len());
    println!("{:-<56}", "");
    for item in &response.items {
        let window = item
            .window
            .map(|w| format!("{} .. {}", w.start, w.end))
            .unwrap_or_default();
        println!("  #{} {:<6} score {:.4}  {window}", item.rank, item.series_id, item.score);
    }
}
