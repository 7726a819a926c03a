use crate::sample::Sample;
use chrono::{DateTime, Local};

/// Point-in-time copy of the sample window handed to a consumer.
///
/// The samples are owned; nothing the pipeline does afterwards can change
/// a snapshot that has already been published.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Publish sequence number, starting at 1 for the first publish.
    pub seq:          u64,
    /// Wall-clock time of the copy.
    pub published_at: DateTime<Local>,
    samples:          Vec<Sample>,
}

/// The two derived series a chart plots, keyed by seconds since the first
/// sample of the snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub mag:   Vec<(f64, f64)>,
    pub theta: Vec<(f64, f64)>,
}

/// Summary of the magnitude series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotStats {
    pub count:    usize,
    pub span_ms:  u64,
    pub mag_min:  f64,
    pub mag_max:  f64,
    pub mag_mean: f64,
}

impl Snapshot {
    pub fn new(seq: u64, samples: Vec<Sample>) -> Self {
        Self {
            seq,
            published_at: Local::now(),
            samples,
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Milliseconds between the oldest and newest sample.
    pub fn span_ms(&self) -> u64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.t().saturating_sub(first.t()),
            _ => 0,
        }
    }

    /// Split into `(elapsed_seconds, mag)` and `(elapsed_seconds, theta)`.
    pub fn series(&self) -> Series {
        let Some(origin) = self.samples.first().map(Sample::t) else {
            return Series::default();
        };

        let elapsed = |s: &Sample| s.t().saturating_sub(origin) as f64 / 1000.0;
        Series {
            mag:   self.samples.iter().map(|s| (elapsed(s), s.mag())).collect(),
            theta: self.samples.iter().map(|s| (elapsed(s), s.theta())).collect(),
        }
    }

    /// `None` for an empty snapshot.
    pub fn stats(&self) -> Option<SnapshotStats> {
        if self.samples.is_empty() {
            return None;
        }

        let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
        for mag in self.samples.iter().map(Sample::mag) {
            min = min.min(mag);
            max = max.max(mag);
            sum += mag;
        }

        Some(SnapshotStats {
            count:    self.samples.len(),
            span_ms:  self.span_ms(),
            mag_min:  min,
            mag_max:  max,
            mag_mean: sum / self.samples.len() as f64,
        })
    }
}
