//! Simulation time model.
//!
//! # Design
//!
//! The kernel does not own a scheduler.  The host advances time and steps
//! components; the kernel only needs to read "now" when it stamps a delay
//! node or checks whether one is ripe.  Two views of time are kept side by
//! side:
//!
//! - `Tick` — how many host steps have happened (exact, integer).
//! - `SimTime` — the continuous simulation clock that delay draws are added
//!   to.  Each `FlowContext::advance` moves it forward by the configured
//!   `time_step`.
//!
//! `SimTime` is totally ordered via `f64::total_cmp`, so it can key a heap.

use std::cmp::Ordering;
use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute host-step counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimTime ──────────────────────────────────────────────────────────────────

/// A point on the continuous simulation clock.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// `true` once `self` has reached `deadline`.
    #[inline]
    pub fn has_reached(self, deadline: SimTime) -> bool {
        self >= deadline
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}

// ── FlowConfig ───────────────────────────────────────────────────────────────

/// Run-level configuration handed to [`FlowContext`][crate::FlowContext].
///
/// Typically filled in by the host application (possibly from a config file
/// with the `serde` feature) and turned into a context with
/// [`make_context`][Self::make_context].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowConfig {
    /// Master RNG seed.  The same seed always produces identical offer orders,
    /// production draws and delay draws.
    pub seed: u64,

    /// Simulation time at tick 0.
    pub start_time: f64,

    /// How far `SimTime` moves per tick.  Default: 1.0.
    pub time_step: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            seed:       0,
            start_time: 0.0,
            time_step:  1.0,
        }
    }
}

impl FlowConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, ..Self::default() }
    }

    /// Construct the per-run context.
    ///
    /// Fails if `time_step` is not a finite, positive number or `start_time`
    /// is not finite.
    pub fn make_context(&self) -> crate::FlowResult<crate::FlowContext> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(crate::FlowError::Config(format!(
                "time_step must be finite and positive, got {}",
                self.time_step
            )));
        }
        if !self.start_time.is_finite() {
            return Err(crate::FlowError::Config(format!(
                "start_time must be finite, got {}",
                self.start_time
            )));
        }
        Ok(crate::FlowContext::new(
            SimTime(self.start_time),
            self.time_step,
            crate::SimRng::new(self.seed),
        ))
    }
}
