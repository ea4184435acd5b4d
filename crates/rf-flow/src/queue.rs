//! `Queue` — a capacity-bounded buffer between an upstream provider and its
//! own downstream receivers.
//!
//! Accepting only stores; the buffered stock is offered onward when the host
//! steps the queue.  Keeping the two halves apart means an `accept` never
//! triggers an offer, so a queue cannot be dragged into a reentrant offer
//! cycle through its own `accept`.  An upstream offer that reaches a queue
//! while that queue is itself offering still fails with `CyclicOffer`.

use rf_core::{FlowContext, FlowError, FlowResult, Resource};

use crate::provider::take_within;
use crate::{Named, Provider, ProviderCore, Receiver, Steppable};

pub struct Queue {
    core:     ProviderCore,
    capacity: f64,
}

impl Queue {
    /// An unbounded queue for `typical`'s type.
    pub fn new(name: impl Into<String>, typical: &Resource) -> Self {
        Self {
            core:     ProviderCore::new(name, typical),
            capacity: f64::INFINITY,
        }
    }

    pub fn with_capacity(name: impl Into<String>, typical: &Resource, capacity: f64) -> FlowResult<Self> {
        let mut queue = Self::new(name, typical);
        queue.set_capacity(capacity)?;
        Ok(queue)
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: f64) -> FlowResult<()> {
        if capacity.is_nan() || capacity < 0.0 {
            return Err(FlowError::Config(format!(
                "queue '{}': capacity must be non-negative, got {capacity}",
                self.core.name()
            )));
        }
        self.capacity = capacity;
        Ok(())
    }

    /// Amount (or entity count) currently buffered.
    pub fn size(&self) -> f64 {
        self.core.available()
    }
}

impl Named for Queue {
    fn name(&self) -> &str {
        self.core.name()
    }
}

impl Provider for Queue {
    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }
}

impl Receiver for Queue {
    fn typical_received(&self) -> Option<&Resource> {
        Some(self.core.typical())
    }

    fn accept(
        &mut self,
        _from:    &str,
        resource: &mut Resource,
        at_least: f64,
        at_most:  f64,
        _ctx:     &mut FlowContext,
    ) -> FlowResult<bool> {
        resource.ensure_kind(self.core.typical().kind())?;
        let room = self.capacity - self.core.available();
        match take_within(resource, room, at_least, at_most)? {
            Some(part) => {
                self.core.store(part)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Steppable for Queue {
    fn step(&mut self, ctx: &mut FlowContext) -> FlowResult<()> {
        self.core.offer_receivers(ctx)?;
        Ok(())
    }
}
