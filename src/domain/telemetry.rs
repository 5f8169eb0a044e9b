// Bounded random-walk primitives shared by every simulator
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range. Unlike `f64::clamp` this never panics.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Uniform draw inside the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// new = clamp(old + delta, bounds)
pub fn apply_delta(value: f64, delta: f64, bounds: Bounds) -> f64 {
    bounds.clamp(value + delta)
}

/// One field's walk rule: a uniform delta in `[-drift, drift]` then a clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Walk {
    pub drift: f64,
    #[serde(default = "neg_infinity")]
    pub min: f64,
    #[serde(default = "infinity")]
    pub max: f64,
}

fn neg_infinity() -> f64 {
    f64::NEG_INFINITY
}

fn infinity() -> f64 {
    f64::INFINITY
}

impl Walk {
    pub const fn new(drift: f64, min: f64, max: f64) -> Self {
        Self { drift, min, max }
    }

    pub const fn unbounded(drift: f64) -> Self {
        Self {
            drift,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min, self.max)
    }

    pub fn delta<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.drift > 0.0 {
            rng.gen_range(-self.drift..=self.drift)
        } else {
            0.0
        }
    }

    pub fn apply(&self, value: f64, delta: f64) -> f64 {
        apply_delta(value, delta, self.bounds())
    }

    pub fn step<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        let delta = self.delta(rng);
        self.apply(value, delta)
    }
}

/// Fresh draw around a fixed centre each tick (no memory of the last value).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jitter {
    pub center: f64,
    pub spread: f64,
}

impl Jitter {
    pub const fn new(center: f64, spread: f64) -> Self {
        Self { center, spread }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.spread > 0.0 {
            self.center + rng.gen_range(-self.spread..=self.spread)
        } else {
            self.center
        }
    }
}

/// Round to `digits` decimal places.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
