//! Object-safe distributions and threshold criteria.
//!
//! `rand_distr::Distribution::sample` is generic over the RNG, which makes the
//! trait unusable behind `dyn`.  Components need to store "some distribution"
//! chosen at configuration time, so [`Sampler`] fixes the RNG type to the
//! kernel's `SmallRng` and is implemented for every `Distribution<f64>`.
//!
//! ```rust
//! use rf_core::{Sampler, SimRng};
//! use rand_distr::Normal;
//!
//! let normal: Box<dyn Sampler> = Box::new(Normal::new(5.0, 1.0).unwrap());
//! let mut rng = SimRng::new(7);
//! let x = rng.draw(normal.as_ref());
//! assert!(x.is_finite());
//! ```

use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand_distr::Distribution;

use crate::{FlowError, FlowResult};

// ── Sampler ──────────────────────────────────────────────────────────────────

/// A real-valued distribution that can be stored as `Box<dyn Sampler>`.
pub trait Sampler {
    fn draw(&self, rng: &mut SmallRng) -> f64;
}

impl<D: Distribution<f64>> Sampler for D {
    #[inline]
    fn draw(&self, rng: &mut SmallRng) -> f64 {
        self.sample(rng)
    }
}

/// A degenerate distribution that always yields the same value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Constant(pub f64);

impl Distribution<f64> for Constant {
    #[inline]
    fn sample<R: rand::Rng + ?Sized>(&self, _rng: &mut R) -> f64 {
        self.0
    }
}

// ── Criterion ────────────────────────────────────────────────────────────────

/// Comparison between a random draw and a configured threshold.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Criterion {
    /// `draw > threshold`
    Greater,
    /// `draw >= threshold`
    #[default]
    GreaterOrEqual,
    /// `draw < threshold`
    Less,
    /// `draw <= threshold`
    LessOrEqual,
}

impl Criterion {
    #[inline]
    pub fn holds(self, draw: f64, threshold: f64) -> bool {
        match self {
            Criterion::Greater        => draw > threshold,
            Criterion::GreaterOrEqual => draw >= threshold,
            Criterion::Less           => draw < threshold,
            Criterion::LessOrEqual    => draw <= threshold,
        }
    }
}

impl FromStr for Criterion {
    type Err = FlowError;

    fn from_str(s: &str) -> FlowResult<Self> {
        match s.trim() {
            ">" | "gt" => Ok(Criterion::Greater),
            ">=" | "ge" => Ok(Criterion::GreaterOrEqual),
            "<" | "lt" => Ok(Criterion::Less),
            "<=" | "le" => Ok(Criterion::LessOrEqual),
            other => Err(FlowError::Config(format!("unknown comparison criterion '{other}'"))),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Criterion::Greater        => ">",
            Criterion::GreaterOrEqual => ">=",
            Criterion::Less           => "<",
            Criterion::LessOrEqual    => "<=",
        };
        f.write_str(s)
    }
}

/// A threshold test driven by a distribution.
///
/// With no distribution configured the gate is always open.
#[derive(Default)]
pub struct Gate {
    pub distribution: Option<Box<dyn Sampler>>,
    pub threshold:    f64,
    pub criterion:    Criterion,
}

impl Gate {
    /// Draw once (if a distribution is set) and test the criterion.
    pub fn passes(&self, rng: &mut crate::SimRng) -> bool {
        match &self.distribution {
            None => true,
            Some(d) => self.criterion.holds(rng.draw(d.as_ref()), self.threshold),
        }
    }

    /// Validate and install a threshold.
    pub fn set_threshold(&mut self, threshold: f64) -> FlowResult<()> {
        if threshold.is_nan() {
            return Err(FlowError::Config("threshold must not be NaN".into()));
        }
        self.threshold = threshold;
        Ok(())
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("distribution", &self.distribution.as_ref().map(|_| "<dyn Sampler>"))
            .field("threshold", &self.threshold)
            .field("criterion", &self.criterion)
            .finish()
    }
}
