// src/activity.rs
//
// Synthetic "social media activity" curve for the chart collaborator. The
// shape is a Gaussian bump at a random pre-event offset plus per-sample
// noise — fabricated display data, not a real signal. Unseeded on purpose:
// every call gives a fresh curve.

use rand::Rng;
use serde::{Deserialize, Serialize};

const BASELINE: f64 = 0.05;
const NOISE_AMPLITUDE: f64 = 0.1;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Look-back window in hours; samples span `[-window_hours, 0]`.
    pub window_hours: f64,
    pub samples: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            window_hours: 24.0,
            samples: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActivityPoint {
    /// Hours relative to the incident; negative is before.
    pub hour: f64,
    pub level: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivitySeries {
    pub window_hours: f64,
    pub samples: usize,
    pub points: Vec<ActivityPoint>,
}

/// Generate one curve. Coordinates are accepted for interface symmetry with
/// the event records; the math does not use them.
pub fn synthetic_series(cfg: &ActivityConfig, _latitude: f64, _longitude: f64) -> ActivitySeries {
    let mut rng = rand::rng();

    let peak_hour: f64 = rng.random_range(-8.0..=-2.0);
    let width: f64 = rng.random_range(2.0..=6.0);

    let n = cfg.samples.max(1);
    let denom = (n - 1).max(1) as f64;
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let hour = -cfg.window_hours + cfg.window_hours * (i as f64) / denom;
        let bump = (-0.5 * ((hour - peak_hour) / width).powi(2)).exp();
        let noise: f64 = rng.random::<f64>() * NOISE_AMPLITUDE;
        let level = (BASELINE + bump + noise).max(0.0);
        points.push(ActivityPoint { hour, level });
    }

    ActivitySeries {
        window_hours: cfg.window_hours,
        samples: points.len(),
        points,
    }
}
