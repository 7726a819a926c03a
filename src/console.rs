//! Terminal front end: prints one line per published snapshot and reads
//! control commands from stdin.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use vscope_config::{ConfigWatcher, VscopeConfig};
use vscope_core::{Command, Snapshot};
use vscope_pipeline::{ChannelConsumer, Pipeline, RuntimeClock};
use vscope_source::SyntheticSource;

const SPARK_WIDTH: usize = 40;
const SPARK_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Run the pipeline until `q` or Ctrl-C.
pub async fn run(path: PathBuf, config: VscopeConfig) -> Result<()> {
    let source = SyntheticSource::new(config.source.clone(), config.stream.ingest_hz)?;
    let (consumer, mut snapshots) = ChannelConsumer::new(4);
    let mut pipeline = Pipeline::start(
        config.stream.clone(),
        source,
        consumer,
        Arc::new(RuntimeClock::new()),
    )?;
    let mut current = config;

    let (_watcher, mut changes) = ConfigWatcher::spawn(&path);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    println!("commands: t = toggle ingest, r = reset, s = status, q = quit");

    loop {
        tokio::select! {
            Some(snapshot) = snapshots.recv() => println!("{}", render(&snapshot)),

            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match Command::parse(&line) {
                    Some(Command::Shutdown) => break,
                    Some(Command::Status) => info!(
                        "running: {}, window: {} samples",
                        pipeline.controller().is_running(),
                        pipeline.window().len()
                    ),
                    Some(command) => pipeline.controller().apply(command),
                    None if line.trim().is_empty() => {}
                    None => warn!("unknown command {line:?}; try t, r, s or q"),
                },
                // detached stdin: keep running until Ctrl-C
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!("stdin unreadable: {e}; console commands disabled");
                    stdin_open = false;
                }
            },

            Some(()) = changes.recv() => {
                match vscope_config::load(&path) {
                    Ok(cfg) => {
                        if cfg.source != current.source {
                            warn!("source settings change on restart only");
                        }
                        match pipeline.reconfigure(cfg.stream.clone()).await {
                            Ok(()) => info!("Config reloaded"),
                            Err(e) => warn!("Config reload failed: {e}"),
                        }
                        current = cfg;
                    }
                    Err(e) => warn!("Config reload failed: {e}"),
                }
            }

            _ = &mut ctrl_c => break,
        }
    }

    let report = pipeline.shutdown().await;
    if let Some(stats) = report.ingest {
        info!(
            "ingested {} samples ({} dropped, {} evicted)",
            stats.appended,
            stats.dropped(),
            stats.evicted
        );
    }
    Ok(())
}

/// One status line for a snapshot.
fn render(snapshot: &Snapshot) -> String {
    let stamp = snapshot.published_at.format("%H:%M:%S%.3f");
    let (Some(stats), Some(latest)) = (snapshot.stats(), snapshot.latest()) else {
        return format!("#{:<5} {stamp}  (empty)", snapshot.seq);
    };

    let series = snapshot.series();
    format!(
        "#{:<5} {stamp}  n={:<4} span={:>5.1}s  mag={:.3} θ={:+.3}  mean={:.3}  {}",
        snapshot.seq,
        stats.count,
        stats.span_ms as f64 / 1000.0,
        latest.mag(),
        latest.theta(),
        stats.mag_mean,
        sparkline(&series.mag, SPARK_WIDTH),
    )
}

/// Bucket `(seconds, value)` points into `width` columns of block glyphs,
/// averaging each bucket and scaling to the series' own range.
fn sparkline(points: &[(f64, f64)], width: usize) -> String {
    if points.is_empty() || width == 0 {
        return String::new();
    }

    let span = points.last().map_or(0.0, |p| p.0).max(f64::EPSILON);
    let mut sums = vec![(0.0, 0usize); width];
    for &(x, v) in points {
        let col = ((x / span) * (width - 1) as f64).round() as usize;
        let bucket = &mut sums[col.min(width - 1)];
        bucket.0 += v;
        bucket.1 += 1;
    }

    let means: Vec<Option<f64>> = sums
        .iter()
        .map(|&(sum, n)| (n > 0).then(|| sum / n as f64))
        .collect();
    let (lo, hi) = means
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = hi - lo;

    means
        .into_iter()
        .map(|mean| match mean {
            None => ' ',
            Some(_) if range <= f64::EPSILON => SPARK_GLYPHS[0],
            Some(v) => {
                let level = ((v - lo) / range * (SPARK_GLYPHS.len() - 1) as f64).round() as usize;
                SPARK_GLYPHS[level.min(SPARK_GLYPHS.len() - 1)]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vscope_core::{RawVector, Sample};

    #[test]
    fn sparkline_spans_full_range() {
        let points: Vec<(f64, f64)> = (0..8).map(|i| (i as f64, i as f64)).collect();
        assert_eq!(sparkline(&points, 8), "▁▂▃▄▅▆▇█");
    }

    #[test]
    fn sparkline_of_flat_series_is_lowest_glyph() {
        let points = [(0.0, 2.0), (1.0, 2.0)];
        assert_eq!(sparkline(&points, 2), "▁▁");
    }

    #[test]
    fn sparkline_leaves_gaps_for_empty_buckets() {
        let points = [(0.0, 0.0), (3.0, 1.0)];
        assert_eq!(sparkline(&points, 4), "▁  █");
        assert_eq!(sparkline(&[], 4), "");
    }

    #[test]
    fn render_marks_empty_snapshots() {
        let line = render(&Snapshot::new(3, Vec::new()));
        assert!(line.starts_with("#3"));
        assert!(line.ends_with("(empty)"));
    }

    #[test]
    fn render_reports_latest_sample() {
        let samples = vec![
            Sample::new(0, RawVector::new(3.0, 4.0, 0.0)).unwrap(),
            Sample::new(1_500, RawVector::new(0.0, 2.0, 0.0)).unwrap(),
        ];
        let line = render(&Snapshot::new(1, samples));
        assert!(line.contains("n=2"));
        assert!(line.contains("span=  1.5s"));
        assert!(line.contains("mag=2.000"));
        assert!(line.contains("mean=3.500"));
    }
}
