//! Offer policies: in which order, and to how many, receivers are offered.
//!
//! | Policy               | Order                                                   |
//! |----------------------|---------------------------------------------------------|
//! | `Forward`            | registration order                                      |
//! | `Backward`           | reverse registration order                              |
//! | `RoundRobin`         | from a cursor that persists across calls, wrapping once |
//! | `Shuffle`            | lazy uniform permutation (swap-to-front)                |
//! | `OneRandom`          | a single uniformly chosen receiver                      |
//! | `RandomDistribution` | first receiver whose draw passes the [`Gate`]           |
//!
//! For every policy that visits several receivers, the walk stops early when
//! the stock is exhausted, or when offers are take-it-or-leave-it and a
//! receiver has accepted.

use std::fmt;
use std::str::FromStr;

use rf_core::{Criterion, FlowContext, FlowError, FlowResult, Gate, Sampler};

use crate::ReceiverRef;

/// How a provider orders its offers.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OfferPolicy {
    #[default]
    Forward,
    Backward,
    RoundRobin,
    Shuffle,
    OneRandom,
    RandomDistribution,
}

impl FromStr for OfferPolicy {
    type Err = FlowError;

    fn from_str(s: &str) -> FlowResult<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "forward"            => Ok(OfferPolicy::Forward),
            "backward"           => Ok(OfferPolicy::Backward),
            "roundrobin"         => Ok(OfferPolicy::RoundRobin),
            "shuffle"            => Ok(OfferPolicy::Shuffle),
            "onerandom"          => Ok(OfferPolicy::OneRandom),
            "randomdistribution" => Ok(OfferPolicy::RandomDistribution),
            _ => Err(FlowError::Config(format!("unknown offer policy '{s}'"))),
        }
    }
}

impl fmt::Display for OfferPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OfferPolicy::Forward            => "forward",
            OfferPolicy::Backward           => "backward",
            OfferPolicy::RoundRobin         => "round_robin",
            OfferPolicy::Shuffle            => "shuffle",
            OfferPolicy::OneRandom          => "one_random",
            OfferPolicy::RandomDistribution => "random_distribution",
        };
        f.write_str(s)
    }
}

/// Result of a single offer to a single receiver.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Offered {
    /// The receiver accepted something.
    pub accepted:  bool,
    /// Amount (or entity count) removed from the offer.
    pub taken:     f64,
    /// Nothing is left to offer to further receivers.
    pub exhausted: bool,
}

impl Offered {
    pub const EXHAUSTED: Offered = Offered {
        accepted:  false,
        taken:     0.0,
        exhausted: true,
    };

    #[inline]
    fn stops(self, take_it_or_leave_it: bool) -> bool {
        self.exhausted || (take_it_or_leave_it && self.accepted)
    }
}

/// Offer-policy state owned by a provider.
#[derive(Debug, Default)]
pub struct OfferStrategy {
    policy: OfferPolicy,
    cursor: usize,
    gate:   Gate,
}

impl OfferStrategy {
    #[inline]
    pub fn policy(&self) -> OfferPolicy {
        self.policy
    }

    /// Change the policy.  Always resets the round-robin cursor.
    pub fn set_policy(&mut self, policy: OfferPolicy) {
        self.policy = policy;
        self.cursor = 0;
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn set_distribution(&mut self, distribution: Option<Box<dyn Sampler>>) {
        self.gate.distribution = distribution;
    }

    pub fn set_threshold(&mut self, threshold: f64) -> FlowResult<()> {
        self.gate.set_threshold(threshold)
    }

    pub fn set_criterion(&mut self, criterion: Criterion) {
        self.gate.criterion = criterion;
    }

    /// Walk `receivers` according to the policy, calling `offer` for each
    /// receiver visited.  Returns `true` if any receiver accepted.
    ///
    /// `Shuffle` permutes `receivers` in place; the slice stays a valid
    /// (reordered) registration list afterwards.
    pub fn dispatch<F>(
        &mut self,
        receivers:           &mut [ReceiverRef],
        take_it_or_leave_it: bool,
        ctx:                 &mut FlowContext,
        mut offer:           F,
    ) -> FlowResult<bool>
    where
        F: FnMut(&ReceiverRef, &mut FlowContext) -> FlowResult<Offered>,
    {
        let n = receivers.len();
        if n == 0 {
            return Ok(false);
        }

        let mut accepted = false;
        match self.policy {
            OfferPolicy::Forward => {
                for receiver in receivers.iter() {
                    let outcome = offer(receiver, ctx)?;
                    accepted |= outcome.accepted;
                    if outcome.stops(take_it_or_leave_it) {
                        break;
                    }
                }
            }

            OfferPolicy::Backward => {
                for receiver in receivers.iter().rev() {
                    let outcome = offer(receiver, ctx)?;
                    accepted |= outcome.accepted;
                    if outcome.stops(take_it_or_leave_it) {
                        break;
                    }
                }
            }

            OfferPolicy::RoundRobin => {
                let start = self.cursor % n;
                for k in 0..n {
                    let i = (start + k) % n;
                    let outcome = offer(&receivers[i], ctx)?;
                    accepted |= outcome.accepted;
                    self.cursor = (i + 1) % n;
                    if outcome.stops(take_it_or_leave_it) {
                        break;
                    }
                }
            }

            // Partial Fisher–Yates: only as many swaps as receivers visited.
            OfferPolicy::Shuffle => {
                for i in 0..n {
                    let j = ctx.rng.gen_range(i..n);
                    receivers.swap(i, j);
                    let outcome = offer(&receivers[i], ctx)?;
                    accepted |= outcome.accepted;
                    if outcome.stops(take_it_or_leave_it) {
                        break;
                    }
                }
            }

            OfferPolicy::OneRandom => {
                let i = ctx.rng.index(n);
                accepted = offer(&receivers[i], ctx)?.accepted;
            }

            OfferPolicy::RandomDistribution => {
                for receiver in receivers.iter() {
                    if self.gate.passes(&mut ctx.rng) {
                        accepted = offer(receiver, ctx)?.accepted;
                        break;
                    }
                }
            }
        }
        Ok(accepted)
    }
}
