use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Derive `(mag, theta)` from a raw vector.
///
/// `mag` is the Euclidean norm, `theta` the planar angle `atan2(y, x)` folded
/// into `(-π, π]`.
#[must_use]
pub fn derive_metrics(x: f64, y: f64, z: f64) -> (f64, f64) {
    let mag = (x * x + y * y + z * z).sqrt();
    let mut theta = y.atan2(x);
    // atan2(-0.0, negative) is exactly -π
    if theta == -PI {
        theta = PI;
    }
    (mag, theta)
}

/// Three raw vector components as read from a source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RawVector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// `true` when every component is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One timestamped observation with its derived metrics.
///
/// Fields are private so a `Sample` can only be built through [`Sample::new`],
/// which guarantees finite components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    t: u64,
    x: f64,
    y: f64,
    z: f64,
    mag: f64,
    theta: f64,
}

impl Sample {
    /// Stamp `raw` at `t` milliseconds. Returns `None` for non-finite input.
    pub fn new(t: u64, raw: RawVector) -> Option<Self> {
        if !raw.is_finite() {
            return None;
        }
        let (mag, theta) = derive_metrics(raw.x, raw.y, raw.z);
        Some(Self { t, x: raw.x, y: raw.y, z: raw.z, mag, theta })
    }

    pub fn t(&self) -> u64 {
        self.t
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn mag(&self) -> f64 {
        self.mag
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn raw(&self) -> RawVector {
        RawVector::new(self.x, self.y, self.z)
    }
}
