//! `Lock` and `Unlock` — the two ends of a bounded-concurrency section.
//!
//! A `Lock` and its `Unlock` share one [`Pool`].  Every unit that enters
//! through the lock holds `allocation` units of the pool until it leaves
//! through the unlock.  An entity is one unit; a countable offer passes as
//! many units as it moves, so offers merged or split on the way through
//! (a delay pooling released amounts, an elastic partial take) are still
//! charged and refunded exactly:
//!
//! ```text
//! Lock::accept:   at_most ← min(at_most, floor(pool.available / allocation))
//!                 refuse if that is below max(at_least, 1)
//!                 offer downstream
//!                 moved units → pool.acquire(moved × allocation)
//! Unlock::accept: offer downstream
//!                 moved units → pool.release(moved × allocation)   (clamped)
//! ```
//!
//! Neither end buffers.

use rf_core::{check_amount, FlowContext, FlowError, FlowResult, Resource};
use rf_flow::{Named, Provider, ProviderCore, Receiver};
use tracing::trace;

use crate::pool::{pool_mut, Pool, PoolRef};

/// Forward `resource` and report how many units went through.
fn pass_through(
    core:     &mut ProviderCore,
    resource: &mut Resource,
    at_least: f64,
    at_most:  f64,
    ctx:      &mut FlowContext,
) -> FlowResult<f64> {
    let before = resource.amount();
    if !core.offer_through(resource, at_least, at_most, ctx)? {
        return Ok(0.0);
    }
    Ok(match resource {
        Resource::Entity(_) => 1.0,
        Resource::Countable(c) => before - c.amount(),
    })
}

// ── Lock ──────────────────────────────────────────────────────────────────────

pub struct Lock {
    core:       ProviderCore,
    pool:       PoolRef,
    allocation: f64,
}

impl Lock {
    /// A lock drawing `allocation` units of `pool` per pass.
    pub fn new(
        name:       impl Into<String>,
        typical:    &Resource,
        pool:       PoolRef,
        allocation: f64,
    ) -> FlowResult<Self> {
        let core = ProviderCore::new(name, typical);
        let allocation = check_amount(allocation)?;
        let maximum = pool.try_borrow().map(|p| p.maximum()).map_err(|_| FlowError::CyclicOffer {
            provider: core.name().to_string(),
        })?;
        if allocation <= 0.0 || allocation > maximum {
            return Err(FlowError::Config(format!(
                "lock '{}': allocation {allocation} must be in 1..={maximum}",
                core.name()
            )));
        }
        Ok(Self { core, pool, allocation })
    }

    /// A lock with a private pool admitting at most `max_locks` passes.
    pub fn with_capacity(name: impl Into<String>, typical: &Resource, max_locks: f64) -> FlowResult<Self> {
        let name = name.into();
        let pool = Pool::full(format!("{name}.locks"), max_locks)?.shared();
        Self::new(name, typical, pool, 1.0)
    }

    pub fn pool(&self) -> &PoolRef {
        &self.pool
    }

    pub fn allocation(&self) -> f64 {
        self.allocation
    }

    /// Units that can still enter before the pool runs dry.
    pub fn free_passes(&self) -> FlowResult<f64> {
        let pool = self.pool.try_borrow().map_err(|_| FlowError::CyclicOffer {
            provider: self.core.name().to_string(),
        })?;
        Ok((pool.available() / self.allocation).floor())
    }
}

impl Named for Lock {
    fn name(&self) -> &str {
        self.core.name()
    }
}

impl Provider for Lock {
    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }
}

impl Receiver for Lock {
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
        let free = (pool_mut(&self.pool, self.core.name())?.available() / self.allocation).floor();
        let at_most = at_most.min(free);
        if at_most < at_least.max(1.0) {
            return Ok(false);
        }
        let passed = pass_through(&mut self.core, resource, at_least, at_most, ctx)?;
        if passed <= 0.0 {
            return Ok(false);
        }
        let units = passed * self.allocation;
        let acquired = pool_mut(&self.pool, self.core.name())?.acquire(units);
        debug_assert!(acquired, "lock '{}' admitted more than its pool holds", self.core.name());
        trace!(lock = self.core.name(), passed, units, "acquired");
        Ok(true)
    }
}

// ── Unlock ────────────────────────────────────────────────────────────────────

pub struct Unlock {
    core:       ProviderCore,
    pool:       PoolRef,
    allocation: f64,
}

impl Unlock {
    /// The exit paired with `lock`: same type, same pool, same allocation.
    pub fn new(name: impl Into<String>, lock: &Lock) -> Self {
        Self {
            core:       ProviderCore::new(name, lock.core.typical()),
            pool:       lock.pool.clone(),
            allocation: lock.allocation,
        }
    }

    pub fn pool(&self) -> &PoolRef {
        &self.pool
    }
}

impl Named for Unlock {
    fn name(&self) -> &str {
        self.core.name()
    }
}

impl Provider for Unlock {
    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }
}

impl Receiver for Unlock {
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
        let passed = pass_through(&mut self.core, resource, at_least, at_most, ctx)?;
        if passed <= 0.0 {
            return Ok(false);
        }
        let units = passed * self.allocation;
        pool_mut(&self.pool, self.core.name())?.release(units);
        trace!(unlock = self.core.name(), passed, units, "released");
        Ok(true)
    }
}
