//! `Server` — a processing station that serves a bounded number of items at
//! a time.
//!
//! ```text
//!            ┌──────────────── Server ────────────────┐
//!  offer ──▶ │ Lock ──▶ Delay (service time) ──▶ Unlock │ ──▶ receivers
//!            └───────────────────┬────────────────────┘
//!                              Pool
//! ```
//!
//! Each item entering holds `allocation` units of the pool for its service
//! time.  Several servers may share one pool (e.g. a staff roster).  Served
//! items wait in the delay until the downstream takes them, keeping their
//! pool units until then.

use std::cell::RefCell;
use std::rc::Rc;

use rf_core::{FlowContext, FlowError, FlowResult, Resource, Sampler};
use rf_flow::{shared, Delay, Named, Provider, Receiver, ReceiverRef, Steppable};

use crate::{Lock, Macro, PoolRef, Unlock};

pub struct Server {
    typical:    Resource,
    lock:       Rc<RefCell<Lock>>,
    delay:      Rc<RefCell<Delay>>,
    unlock:     Rc<RefCell<Unlock>>,
    pool:       PoolRef,
    allocation: f64,
    parts:      Macro,
}

fn busy(name: &str) -> FlowError {
    FlowError::CyclicOffer {
        provider: name.to_string(),
    }
}

impl Server {
    /// Serve items of `typical`'s type for `service_time` each, holding
    /// `allocation` units of `pool` per item.
    pub fn new(
        name:         impl Into<String>,
        typical:      &Resource,
        pool:         PoolRef,
        allocation:   f64,
        service_time: f64,
    ) -> FlowResult<Self> {
        let name = name.into();
        let lock = Lock::new(format!("{name}.lock"), typical, pool.clone(), allocation)?;
        let unlock = shared(Unlock::new(format!("{name}.unlock"), &lock));
        let lock = shared(lock);

        let mut delay = Delay::new(format!("{name}.delay"), typical);
        delay.set_delay_time(service_time)?;
        delay.set_drops_resources_before_update(false);
        let delay = shared(delay);

        lock.borrow_mut().add_receiver(delay.clone())?;
        delay.borrow_mut().add_receiver(unlock.clone())?;

        let mut parts = Macro::new(name);
        parts.add_receiver(lock.clone());
        parts.add_steppable(delay.clone());
        parts.add_provider(unlock.clone());

        Ok(Self {
            typical: typical.duplicate0(),
            lock,
            delay,
            unlock,
            pool,
            allocation,
            parts,
        })
    }

    pub fn lock(&self) -> &Rc<RefCell<Lock>> {
        &self.lock
    }

    pub fn delay(&self) -> &Rc<RefCell<Delay>> {
        &self.delay
    }

    pub fn unlock(&self) -> &Rc<RefCell<Unlock>> {
        &self.unlock
    }

    pub fn pool(&self) -> &PoolRef {
        &self.pool
    }

    pub fn allocation(&self) -> f64 {
        self.allocation
    }

    /// Items currently being served or waiting to leave.
    pub fn in_service(&self) -> FlowResult<f64> {
        let delay = self.delay.try_borrow().map_err(|_| busy(self.parts.name()))?;
        Ok(delay.in_flight() + delay.available())
    }

    /// Draw each item's service time from `distribution` instead of using
    /// the fixed time.
    pub fn set_service_distribution(&self, distribution: Option<Box<dyn Sampler>>) -> FlowResult<()> {
        self.delay
            .try_borrow_mut()
            .map_err(|_| busy(self.parts.name()))?
            .set_delay_distribution(distribution);
        Ok(())
    }

    /// Send served items to `receiver`.
    pub fn add_receiver(&self, receiver: ReceiverRef) -> FlowResult<bool> {
        self.unlock
            .try_borrow_mut()
            .map_err(|_| busy(self.parts.name()))?
            .add_receiver(receiver)
    }

    pub fn parts(&self) -> &Macro {
        &self.parts
    }
}

impl Named for Server {
    fn name(&self) -> &str {
        self.parts.name()
    }
}

impl Receiver for Server {
    fn typical_received(&self) -> Option<&Resource> {
        Some(&self.typical)
    }

    fn accept(
        &mut self,
        from:     &str,
        resource: &mut Resource,
        at_least: f64,
        at_most:  f64,
        ctx:      &mut FlowContext,
    ) -> FlowResult<bool> {
        self.lock
            .try_borrow_mut()
            .map_err(|_| busy(self.parts.name()))?
            .accept(from, resource, at_least, at_most, ctx)
    }
}

impl Steppable for Server {
    fn step(&mut self, ctx: &mut FlowContext) -> FlowResult<()> {
        self.parts.step(ctx)
    }
}
