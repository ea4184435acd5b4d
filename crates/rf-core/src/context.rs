//! Mutable per-run state threaded through every step and offer.

use crate::{FlowError, FlowResult, SimRng, SimTime, Tick};

/// What a component may observe or consume while it steps, offers or
/// accepts: the current time and the shared random stream.
///
/// The host owns exactly one `FlowContext` per network and passes it by
/// `&mut` into `step`, which forwards it into every `accept` down the chain.
/// The kernel never advances time itself; the host calls
/// [`advance`][Self::advance] (or [`advance_to`][Self::advance_to]) between
/// ticks.
pub struct FlowContext {
    /// Number of completed host steps.
    pub tick: Tick,

    /// Current simulation time.
    pub now: SimTime,

    /// How far [`advance`][Self::advance] moves `now`.
    pub time_step: f64,

    /// Shared random source for offer policies, sources and delays.
    pub rng: SimRng,
}

impl FlowContext {
    pub fn new(start: SimTime, time_step: f64, rng: SimRng) -> Self {
        Self {
            tick: Tick::ZERO,
            now: start,
            time_step,
            rng,
        }
    }

    /// A context at time 0 with unit steps and the given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(SimTime::ZERO, 1.0, SimRng::new(seed))
    }

    /// Move to the next tick.
    #[inline]
    pub fn advance(&mut self) {
        self.tick = self.tick + 1;
        self.now = self.now + self.time_step;
    }

    /// Jump to an absolute time, counting it as one tick.
    pub fn advance_to(&mut self, time: SimTime) -> FlowResult<()> {
        if time < self.now || !time.0.is_finite() {
            return Err(FlowError::TimeReversal {
                now:       self.now,
                requested: time,
            });
        }
        self.tick = self.tick + 1;
        self.now = time;
        Ok(())
    }
}
