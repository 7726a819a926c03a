use serde::{Deserialize, Serialize};
use std::time::Duration;
use vscope_core::{Result, VscopeError};

/// Root configuration structure parsed from `vscope.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VscopeConfig {
    /// Rates and retention of the sample pipeline.
    pub stream: StreamConfig,
    /// Settings for the built-in synthetic source.
    pub source: SourceConfig,
}

impl VscopeConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.stream.validate()?;
        self.source.validate()
    }
}

/// Timing of the ingest and snapshot paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Ingest ticks per second.
    pub ingest_hz: f64,
    /// Snapshot publishes per second (upper bound).
    pub display_hz: f64,
    /// Scheduling opportunities per second offered to the snapshot path.
    pub frame_hz: f64,
    /// Trailing retention in milliseconds.
    pub window_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ingest_hz:  60.0,
            display_hz: 6.0,
            frame_hz:   60.0,
            window_ms:  10_000,
        }
    }
}

/// Slowest rate accepted for any stream setting (one tick per ~17 minutes).
pub const MIN_RATE_HZ: f64 = 1e-3;
/// Fastest rate accepted for any stream setting.
pub const MAX_RATE_HZ: f64 = 1e6;

/// Period of a rate, saturating instead of panicking on rates `validate`
/// would reject.
fn period_of(hz: f64) -> Duration {
    Duration::try_from_secs_f64(1.0 / hz).unwrap_or(Duration::MAX)
}

impl StreamConfig {
    pub fn ingest_period(&self) -> Duration {
        period_of(self.ingest_hz)
    }

    pub fn display_period(&self) -> Duration {
        period_of(self.display_hz)
    }

    pub fn frame_period(&self) -> Duration {
        period_of(self.frame_hz)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, hz) in [
            ("ingest_hz", self.ingest_hz),
            ("display_hz", self.display_hz),
            ("frame_hz", self.frame_hz),
        ] {
            // bounds keep the derived period non-zero and representable
            if !(MIN_RATE_HZ..=MAX_RATE_HZ).contains(&hz) {
                return Err(VscopeError::Config(format!(
                    "stream.{name} must be in [{MIN_RATE_HZ}, {MAX_RATE_HZ}], got {hz}"
                )));
            }
        }
        if self.display_hz > self.frame_hz {
            return Err(VscopeError::Config(format!(
                "stream.display_hz ({}) cannot exceed stream.frame_hz ({})",
                self.display_hz, self.frame_hz
            )));
        }
        if self.window_ms == 0 {
            return Err(VscopeError::Config("stream.window_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Synthetic signal parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Peak amplitude of each sinusoidal component.
    pub amplitude: f64,
    /// Base frequency of the generated signal.
    pub frequency_hz: f64,
    /// Uniform noise added to each component, `±noise`.
    pub noise: f64,
    /// Probability in `[0, 1]` that a tick yields a malformed payload.
    pub fault_rate: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            seed:         None,
            amplitude:    1.0,
            frequency_hz: 0.5,
            noise:        0.05,
            fault_rate:   0.0,
        }
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fault_rate) {
            return Err(VscopeError::Config(format!(
                "source.fault_rate must be within [0, 1], got {}",
                self.fault_rate
            )));
        }
        for (name, value) in [
            ("amplitude", self.amplitude),
            ("frequency_hz", self.frequency_hz),
            ("noise", self.noise),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(VscopeError::Config(format!(
                    "source.{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
