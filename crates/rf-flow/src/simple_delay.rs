//! `SimpleDelay` — holds every accepted item for the same fixed time.
//!
//! With a constant delay, arrival order is release order, so nodes sit in a
//! FIFO and `update` stops scanning at the first node that is not yet due.
//! Changing the delay time shifts every pending node by the same amount,
//! which keeps that order intact.

use std::collections::VecDeque;

use rf_core::{FlowContext, FlowResult, Resource, SimTime};
use tracing::trace;

use crate::delay::{check_capacity, check_delay};
use crate::provider::take_within;
use crate::{Named, Provider, ProviderCore, Receiver, Steppable};

/// A held payload and when it is due.
#[derive(Debug)]
struct Held {
    release: SimTime,
    payload: Resource,
}

pub struct SimpleDelay {
    core:       ProviderCore,
    capacity:   f64,
    delay_time: f64,
    nodes:      VecDeque<Held>,
    in_flight:  f64,
    drops_resources_before_update: bool,
}

impl SimpleDelay {
    pub fn new(name: impl Into<String>, typical: &Resource, delay_time: f64) -> FlowResult<Self> {
        let core = ProviderCore::new(name, typical);
        let delay_time = check_delay(core.name(), delay_time)?;
        Ok(Self {
            core,
            capacity: f64::INFINITY,
            delay_time,
            nodes: VecDeque::new(),
            in_flight: 0.0,
            drops_resources_before_update: true,
        })
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

    /// Pending items are re-stamped so each is due `delay` after it arrived.
    pub fn set_delay_time(&mut self, delay: f64) -> FlowResult<()> {
        let delay = check_delay(self.core.name(), delay)?;
        let shift = delay - self.delay_time;
        for node in &mut self.nodes {
            node.release = node.release + shift;
        }
        self.delay_time = delay;
        Ok(())
    }

    pub fn set_drops_resources_before_update(&mut self, value: bool) {
        self.drops_resources_before_update = value;
    }

    pub fn in_flight(&self) -> f64 {
        self.in_flight
    }

    pub fn pending(&self) -> usize {
        self.nodes.len()
    }

    pub fn next_release(&self) -> Option<SimTime> {
        self.nodes.front().map(|node| node.release)
    }

    pub fn update(&mut self, ctx: &FlowContext) -> FlowResult<()> {
        if self.drops_resources_before_update {
            self.core.clear_stock();
        }
        while self
            .nodes
            .front()
            .is_some_and(|node| ctx.now.has_reached(node.release))
        {
            let Some(node) = self.nodes.pop_front() else {
                break;
            };
            self.in_flight -= node.payload.amount();
            trace!(delay = self.core.name(), release = %node.release, "released");
            self.core.store(node.payload)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.in_flight = 0.0;
        self.core.clear_stock();
    }
}

impl Named for SimpleDelay {
    fn name(&self) -> &str {
        self.core.name()
    }
}

impl Provider for SimpleDelay {
    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }
}

impl Receiver for SimpleDelay {
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
        self.in_flight += payload.amount();
        self.nodes.push_back(Held {
            release: ctx.now + self.delay_time,
            payload,
        });
        Ok(true)
    }
}

impl Steppable for SimpleDelay {
    fn step(&mut self, ctx: &mut FlowContext) -> FlowResult<()> {
        self.update(ctx)?;
        self.core.offer_receivers(ctx)?;
        Ok(())
    }
}
