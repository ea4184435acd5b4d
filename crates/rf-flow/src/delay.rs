//! `Delay` — holds each accepted item for its own randomly drawn time.
//!
//! # Ordering
//!
//! Because every item may draw a different delay, release order is not
//! arrival order.  Nodes live in a min-heap keyed by absolute release time
//! (ties broken by arrival sequence, so equal release times stay FIFO).
//! `update` pops while the minimum is due.
//!
//! The fixed-delay variant with a FIFO and early-exit scan is
//! [`SimpleDelay`][crate::SimpleDelay].
//!
//! # Capacity
//!
//! Capacity bounds the total held: the countable amount (or entity count)
//! still in flight plus whatever has been released but not yet taken.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rf_core::{FlowContext, FlowError, FlowResult, Resource, Sampler, SimTime};
use tracing::trace;

use crate::provider::take_within;
use crate::{Named, Provider, ProviderCore, Receiver, Steppable};

// ── DelayNode ─────────────────────────────────────────────────────────────────

/// A held payload and the time it becomes available.
#[derive(Debug)]
struct DelayNode {
    release: SimTime,
    seq:     u64,
    payload: Resource,
}

impl PartialEq for DelayNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DelayNode {}

impl PartialOrd for DelayNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release
            .cmp(&other.release)
            .then(self.seq.cmp(&other.seq))
    }
}

pub(crate) fn check_delay(owner: &str, delay: f64) -> FlowResult<f64> {
    if !(delay.is_finite() && delay >= 0.0) {
        return Err(FlowError::Config(format!(
            "'{owner}': delay time must be finite and non-negative, got {delay}"
        )));
    }
    Ok(delay)
}

pub(crate) fn check_capacity(owner: &str, capacity: f64) -> FlowResult<f64> {
    if capacity.is_nan() || capacity < 0.0 {
        return Err(FlowError::Config(format!(
            "'{owner}': capacity must be non-negative, got {capacity}"
        )));
    }
    Ok(capacity)
}

// ── Delay ─────────────────────────────────────────────────────────────────────

pub struct Delay {
    core:         ProviderCore,
    capacity:     f64,
    delay_time:   f64,
    distribution: Option<Box<dyn Sampler>>,
    heap:         BinaryHeap<Reverse<DelayNode>>,
    in_flight:    f64,
    next_seq:     u64,
    drops_resources_before_update: bool,
}

impl Delay {
    /// An unbounded delay for `typical`'s type.  Without a distribution each
    /// item is held for `delay_time` (default 1.0).
    pub fn new(name: impl Into<String>, typical: &Resource) -> Self {
        Self {
            core:         ProviderCore::new(name, typical),
            capacity:     f64::INFINITY,
            delay_time:   1.0,
            distribution: None,
            heap:         BinaryHeap::new(),
            in_flight:    0.0,
            next_seq:     0,
            drops_resources_before_update: true,
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: f64) -> FlowResult<()> {
        self.capacity = check_capacity(self.core.name(), capacity)?;
        Ok(())
    }

    pub fn delay_time(&self) -> f64 {
        self.delay_time
    }

    /// Delay used when no distribution is set.
    pub fn set_delay_time(&mut self, delay: f64) -> FlowResult<()> {
        self.delay_time = check_delay(self.core.name(), delay)?;
        Ok(())
    }

    /// Per-item delays are `|draw|`.  `None` falls back to `delay_time`.
    pub fn set_delay_distribution(&mut self, distribution: Option<Box<dyn Sampler>>) {
        self.distribution = distribution;
    }

    pub fn drops_resources_before_update(&self) -> bool {
        self.drops_resources_before_update
    }

    /// Whether released resources nobody took are discarded at the next
    /// update (default) or carried over.
    pub fn set_drops_resources_before_update(&mut self, value: bool) {
        self.drops_resources_before_update = value;
    }

    /// Amount (or entity count) still being delayed.
    pub fn in_flight(&self) -> f64 {
        self.in_flight
    }

    /// Number of delayed nodes.
    pub fn pending(&self) -> usize {
        self.heap.len()
    }

    /// Earliest scheduled release, if anything is in flight.
    pub fn next_release(&self) -> Option<SimTime> {
        self.heap.peek().map(|Reverse(node)| node.release)
    }

    fn draw_delay(&self, ctx: &mut FlowContext) -> f64 {
        match &self.distribution {
            None => self.delay_time,
            Some(dist) => {
                let d = ctx.rng.draw(dist.as_ref()).abs();
                if d.is_finite() { d } else { self.delay_time }
            }
        }
    }

    /// Discard (optionally) last tick's unclaimed output and release every
    /// node that is due at `ctx.now` into the stock.
    pub fn update(&mut self, ctx: &FlowContext) -> FlowResult<()> {
        if self.drops_resources_before_update {
            self.core.clear_stock();
        }
        while self
            .heap
            .peek()
            .is_some_and(|Reverse(node)| ctx.now.has_reached(node.release))
        {
            let Some(Reverse(node)) = self.heap.pop() else {
                break;
            };
            self.in_flight -= node.payload.amount();
            trace!(delay = self.core.name(), release = %node.release, "released");
            self.core.store(node.payload)?;
        }
        Ok(())
    }

    /// Remove everything in flight and on offer.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.in_flight = 0.0;
        self.core.clear_stock();
    }
}

impl Named for Delay {
    fn name(&self) -> &str {
        self.core.name()
    }
}

impl Provider for Delay {
    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }
}

impl Receiver for Delay {
    fn typical_received(&self) -> Option<&Resource> {
        Some(self.core.typical())
    }

    fn accept(
        &mut self,
        _from:    &str,
        resource: &mut Resource,
        at_least: f64,
        at_most:  f64,
        ctx:      &mut FlowContext,
    ) -> FlowResult<bool> {
        resource.ensure_kind(self.core.typical().kind())?;
        let room = self.capacity - self.in_flight - self.core.available();
        let Some(payload) = take_within(resource, room, at_least, at_most)? else {
            return Ok(false);
        };
        let release = ctx.now + self.draw_delay(ctx);
        self.in_flight += payload.amount();
        self.heap.push(Reverse(DelayNode {
            release,
            seq: self.next_seq,
            payload,
        }));
        self.next_seq += 1;
        Ok(true)
    }
}

impl Steppable for Delay {
    fn step(&mut self, ctx: &mut FlowContext) -> FlowResult<()> {
        self.update(ctx)?;
        self.core.offer_receivers(ctx)?;
        Ok(())
    }
}
