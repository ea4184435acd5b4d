//! `Source` — synthesizes new supply each tick and offers it downstream.
//!
//! # Production cycle
//!
//! ```text
//! step:
//!   if held < capacity:
//!     if success gate configured and the draw fails   → produce nothing
//!     amount = draw from amount distribution (≤ 20 tries for a value ≥ 0)
//!              or the fixed production amount
//!     stock += round(amount), clamped to capacity
//!   offer_receivers()
//! ```
//!
//! Capacity overflow is clamped silently.  Invalid configuration is rejected
//! by the setters.

use rf_core::{Criterion, FlowContext, FlowError, FlowResult, Gate, Resource, Sampler};
use tracing::warn;

use crate::{Named, Provider, ProviderCore, Steppable};

/// How many draws the amount distribution gets to produce a usable value.
pub const PRODUCTION_RETRIES: usize = 20;

pub struct Source {
    core:                ProviderCore,
    capacity:            f64,
    production_amount:   f64,
    amount_distribution: Option<Box<dyn Sampler>>,
    success:             Gate,
    warned_exhausted:    bool,
}

impl Source {
    /// A source of `typical`'s type with unbounded capacity that produces one
    /// unit per tick.
    pub fn new(name: impl Into<String>, typical: &Resource) -> Self {
        Self {
            core:                ProviderCore::new(name, typical),
            capacity:            f64::INFINITY,
            production_amount:   1.0,
            amount_distribution: None,
            success:             Gate::default(),
            warned_exhausted:    false,
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Upper bound on the stock.  Must be non-negative (may be infinite).
    pub fn set_capacity(&mut self, capacity: f64) -> FlowResult<()> {
        if capacity.is_nan() || capacity < 0.0 {
            return Err(FlowError::Config(format!(
                "source '{}': capacity must be non-negative, got {capacity}",
                self.core.name()
            )));
        }
        self.capacity = capacity;
        Ok(())
    }

    pub fn production_amount(&self) -> f64 {
        self.production_amount
    }

    /// Fixed amount produced per successful tick when no amount
    /// distribution is set.  Must be finite and non-negative.
    pub fn set_production_amount(&mut self, amount: f64) -> FlowResult<()> {
        if !(amount.is_finite() && amount >= 0.0) {
            return Err(FlowError::Config(format!(
                "source '{}': production amount must be finite and non-negative, got {amount}",
                self.core.name()
            )));
        }
        self.production_amount = amount;
        Ok(())
    }

    pub fn set_amount_distribution(&mut self, distribution: Option<Box<dyn Sampler>>) {
        self.amount_distribution = distribution;
    }

    pub fn set_success_distribution(&mut self, distribution: Option<Box<dyn Sampler>>) {
        self.success.distribution = distribution;
    }

    pub fn set_success_threshold(&mut self, threshold: f64) -> FlowResult<()> {
        self.success.set_threshold(threshold)
    }

    pub fn set_success_criterion(&mut self, criterion: Criterion) {
        self.success.criterion = criterion;
    }

    // ── Production ────────────────────────────────────────────────────────

    /// Run the production half of a step without offering.
    ///
    /// Returns the amount added to the stock.
    pub fn produce(&mut self, ctx: &mut FlowContext) -> FlowResult<f64> {
        let held = self.core.available();
        if held >= self.capacity {
            return Ok(0.0);
        }
        if !self.success.passes(&mut ctx.rng) {
            return Ok(0.0);
        }

        let drawn = match &self.amount_distribution {
            None => Some(self.production_amount),
            Some(dist) => (0..PRODUCTION_RETRIES)
                .map(|_| ctx.rng.draw(dist.as_ref()))
                .find(|v| v.is_finite() && *v >= 0.0),
        };
        let amount = match drawn {
            Some(v) => v,
            None => {
                if !self.warned_exhausted {
                    warn!(
                        source = self.core.name(),
                        retries = PRODUCTION_RETRIES,
                        "amount distribution kept drawing negative values; producing nothing"
                    );
                    self.warned_exhausted = true;
                }
                0.0
            }
        };

        let amount = amount.round().min((self.capacity - held).floor());
        if amount <= 0.0 {
            return Ok(0.0);
        }
        self.core.produce(amount)?;
        Ok(amount)
    }
}

impl Named for Source {
    fn name(&self) -> &str {
        self.core.name()
    }
}

impl Provider for Source {
    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }
}

impl Steppable for Source {
    fn step(&mut self, ctx: &mut FlowContext) -> FlowResult<()> {
        self.produce(ctx)?;
        self.core.offer_receivers(ctx)?;
        Ok(())
    }
}
