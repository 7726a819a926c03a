use crate::payload::encode_payload;
use crate::Source;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use vscope_config::SourceConfig;
use vscope_core::{RawVector, Result, VscopeError};

/// Stand-in producer: a slowly rotating vector with uniform noise.
///
/// The signal advances by one sample period per [`read`](Source::read), so
/// output depends only on the seed and the number of reads, never on wall
/// time. With `fault_rate > 0` some reads return deliberately broken
/// payloads to exercise the drop path.
#[derive(Debug)]
pub struct SyntheticSource {
    rng:       StdRng,
    config:    SourceConfig,
    period_s:  f64,
    reads:     u64,
}

impl SyntheticSource {
    /// `sample_hz` is the rate `read` will be called at.
    pub fn new(config: SourceConfig, sample_hz: f64) -> Result<Self> {
        config.validate()?;
        if !sample_hz.is_finite() || sample_hz <= 0.0 {
            return Err(VscopeError::Source(format!(
                "sample rate must be positive, got {sample_hz}"
            )));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_os_rng(),
        };

        Ok(Self {
            rng,
            config,
            period_s: 1.0 / sample_hz,
            reads: 0,
        })
    }

    /// Number of payloads produced so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    fn noise(&mut self) -> f64 {
        let n = self.config.noise;
        if n > 0.0 {
            self.rng.random_range(-n..=n)
        } else {
            0.0
        }
    }

    fn next_vector(&mut self) -> RawVector {
        let t = self.reads as f64 * self.period_s;
        let phase = TAU * self.config.frequency_hz * t;
        let a = self.config.amplitude;

        let x = a * phase.cos() + self.noise();
        let y = a * phase.sin() + self.noise();
        let z = 0.5 * a * (0.5 * phase).sin() + self.noise();
        RawVector::new(x, y, z)
    }

    fn faulty_payload(&mut self, v: RawVector) -> String {
        match self.rng.random_range(0..3) {
            0 => format!(r#"{{"x":{},"y":{}}}"#, v.x, v.y),
            1 => format!(r#"{{"x":{},"y":"n/a","z":{}}}"#, v.x, v.z),
            _ => {
                let mut full = encode_payload(v);
                full.truncate(full.len() / 2);
                full
            }
        }
    }
}

impl Source for SyntheticSource {
    fn read(&mut self) -> Option<String> {
        let v = self.next_vector();
        self.reads += 1;

        let fault_rate = self.config.fault_rate;
        if fault_rate > 0.0 && self.rng.random_bool(fault_rate) {
            return Some(self.faulty_payload(v));
        }
        Some(encode_payload(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::decode_payload;

    fn config(seed: u64, fault_rate: f64) -> SourceConfig {
        SourceConfig {
            seed: Some(seed),
            fault_rate,
            ..SourceConfig::default()
        }
    }

    #[test]
    fn clean_source_always_decodes() {
        let mut source = SyntheticSource::new(config(7, 0.0), 60.0).unwrap();
        for _ in 0..500 {
            let payload = source.read().unwrap();
            let v = decode_payload(&payload).unwrap();
            assert!(v.is_finite());
            assert!(v.x.abs() <= 1.05 + 1e-9);
        }
        assert_eq!(source.reads(), 500);
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = SyntheticSource::new(config(42, 0.2), 60.0).unwrap();
        let mut b = SyntheticSource::new(config(42, 0.2), 60.0).unwrap();
        for _ in 0..100 {
            assert_eq!(a.read(), b.read());
        }
    }

    #[test]
    fn always_faulty_source_never_decodes() {
        let mut source = SyntheticSource::new(config(3, 1.0), 60.0).unwrap();
        for _ in 0..100 {
            let payload = source.read().unwrap();
            assert!(decode_payload(&payload).is_err(), "decoded {payload}");
        }
    }

    #[test]
    fn noiseless_signal_starts_on_the_x_axis() {
        let cfg = SourceConfig {
            seed: Some(1),
            noise: 0.0,
            amplitude: 2.0,
            ..SourceConfig::default()
        };
        let mut source = SyntheticSource::new(cfg, 60.0).unwrap();
        let v = decode_payload(&source.read().unwrap()).unwrap();
        assert_eq!(v, RawVector::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn rejects_bad_rate() {
        assert!(SyntheticSource::new(SourceConfig::default(), 0.0).is_err());
        assert!(SyntheticSource::new(config(1, 2.0), 60.0).is_err());
    }
}
