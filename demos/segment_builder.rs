//! Segment building with the volatility gate.
//!
//! Shows how flat stretches of a moving average are dropped while trending
//! windows become segments, and prints one segment as JSON.
//!
//! Run with: cargo run --release --example segment_builder

use chrono::{Duration, NaiveDate};
use sketch_rs::{build_segments, moving_average, SegmentConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 120 flat days followed by 120 days of trend.
    let mut closes = vec![42.0; 120];
    closes.extend((0..120).map(|i| 42.0 + i as f64 * 0.25 + (i as f64 / 6.0).sin()));

    let ma = moving_average(&closes, 20).unwrap();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let dates: Vec<NaiveDate> = (0..ma.len()).map(|i| start + Duration::days(i as i64 + 19)).collect();

    let config = SegmentConfig::default();
    let segments = build_segments("DEMO", &ma, &dates, &config).unwrap();
    let windows = ma.len() - config.window + 1;

    println!("MA20 points: {}", ma.len());
    println!("Windows scanned: {windows}");
    println!("Segments kept:   {}", segments.len());
    println!("Gated out:       {}", windows - segments.len());

    if let (Some(first), Some(last)) = (segments.first(), segments.last()) {
        println!("\nFirst kept window: {} .. {}", first.window_start, first.window_end);
        println!("Last kept window:  {} .. {}", last.window_start, last.window_end);

        let mut preview = first.clone();
        preview.vector.truncate(6);
        println!("\nFirst segment (vector truncated):");
        println!("{}", serde_json::to_string_pretty(&preview).unwrap());
    }
}
