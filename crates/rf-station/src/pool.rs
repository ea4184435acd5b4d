//! `Pool` — a bounded counter shared between the gates that draw on it.

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use rf_core::{check_amount, CountableResource, FlowError, FlowResult};

pub type PoolRef = Rc<RefCell<Pool>>;

/// Units of some capacity (staff, beds, locks) that are taken and given
/// back.  `0 ≤ available ≤ maximum` always holds; releases past the maximum
/// are clamped.
#[derive(Clone, Debug)]
pub struct Pool {
    name:     String,
    units:    CountableResource,
    maximum:  f64,
}

impl Pool {
    pub fn new(name: impl Into<String>, available: f64, maximum: f64) -> FlowResult<Self> {
        let name = name.into();
        let maximum = check_amount(maximum)?;
        if available > maximum {
            return Err(FlowError::Config(format!(
                "pool '{name}': {available} available exceeds maximum {maximum}"
            )));
        }
        let units = CountableResource::new(name.clone(), available)?;
        Ok(Self { name, units, maximum })
    }

    /// A full pool of `maximum` units.
    pub fn full(name: impl Into<String>, maximum: f64) -> FlowResult<Self> {
        Self::new(name, maximum, maximum)
    }

    pub fn shared(self) -> PoolRef {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn available(&self) -> f64 {
        self.units.amount()
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    pub fn in_use(&self) -> f64 {
        self.maximum - self.units.amount()
    }

    /// Take `n` units if that many are available.
    pub fn acquire(&mut self, n: f64) -> bool {
        self.available() >= n && self.units.decrease(n)
    }

    /// Give back `n` units, clamped to the maximum.
    pub fn release(&mut self, n: f64) {
        let room = self.maximum - self.units.amount();
        self.units.increase(n.min(room).max(0.0));
    }
}

/// Mutably borrow a shared pool on behalf of `owner`.
pub(crate) fn pool_mut<'a>(pool: &'a PoolRef, owner: &str) -> FlowResult<RefMut<'a, Pool>> {
    pool.try_borrow_mut().map_err(|_| FlowError::CyclicOffer {
        provider: owner.to_string(),
    })
}
