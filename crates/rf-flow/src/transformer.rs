//! `Transformer` — converts offers of one type into offers of another.
//!
//! # Batches
//!
//! Conversion happens in whole batches: `ratio_in` units of input become
//! `ratio_out` units of output.  Output only ever leaves as all-or-nothing
//! chunks of whole batches, so every accepted offer satisfies
//! `charged × ratio_out == delivered × ratio_in` exactly:
//!
//! ```text
//! accept(input, at_least, at_most):
//!   max_batches = floor(min(input, at_most) / ratio_in)
//!   min_batches = ceil(at_least / ratio_in)
//!   offer min_batches × ratio_out as one chunk; decline if refused
//!   offer the remaining batches in halving chunks until one batch is refused
//!   charge = delivered batches × ratio_in
//! ```
//!
//! A transformer never buffers.  Entities are indivisible, so an entity
//! input needs `ratio_in == 1` and an entity output needs `ratio_out == 1`;
//! entity output goes one entity at a time, which means an offer insisting
//! on more than one batch is declined.

use rf_core::{FlowContext, FlowError, FlowResult, Resource};
use tracing::trace;

use crate::{Named, Provider, ProviderCore, Receiver};

pub struct Transformer {
    core:      ProviderCore,
    input:     Resource,
    ratio_in:  f64,
    ratio_out: f64,
    consumed:  f64,
    produced:  f64,
}

fn check_ratio(owner: &str, which: &str, ratio: f64) -> FlowResult<f64> {
    if !(ratio.is_finite() && ratio > 0.0 && ratio.fract() == 0.0) {
        return Err(FlowError::Config(format!(
            "transformer '{owner}': {which} must be a positive integer, got {ratio}"
        )));
    }
    Ok(ratio)
}

impl Transformer {
    /// Turn every `ratio_in` of `input`'s type into `ratio_out` of
    /// `output`'s type.
    pub fn new(
        name:      impl Into<String>,
        input:     &Resource,
        output:    &Resource,
        ratio_in:  f64,
        ratio_out: f64,
    ) -> FlowResult<Self> {
        let core = ProviderCore::new(name, output);
        let ratio_in = check_ratio(core.name(), "ratio_in", ratio_in)?;
        let ratio_out = check_ratio(core.name(), "ratio_out", ratio_out)?;
        if input.is_entity() && ratio_in != 1.0 {
            return Err(FlowError::Config(format!(
                "transformer '{}': entity input '{}' needs ratio_in 1, got {ratio_in}",
                core.name(),
                input.name()
            )));
        }
        if output.is_entity() && ratio_out != 1.0 {
            return Err(FlowError::Config(format!(
                "transformer '{}': entity output '{}' needs ratio_out 1, got {ratio_out}",
                core.name(),
                output.name()
            )));
        }
        Ok(Self {
            core,
            input: input.duplicate0(),
            ratio_in,
            ratio_out,
            consumed: 0.0,
            produced: 0.0,
        })
    }

    pub fn ratio_in(&self) -> f64 {
        self.ratio_in
    }

    pub fn ratio_out(&self) -> f64 {
        self.ratio_out
    }

    pub fn typical_input(&self) -> &Resource {
        &self.input
    }

    pub fn typical_output(&self) -> &Resource {
        self.core.typical()
    }

    /// Total input (amount or entity count) charged so far.
    pub fn consumed(&self) -> f64 {
        self.consumed
    }

    /// Total output (amount or entity count) delivered so far.
    pub fn produced(&self) -> f64 {
        self.produced
    }

    /// Offer `batches` worth of countable output as one all-or-nothing chunk.
    fn offer_chunk(&mut self, batches: f64, ctx: &mut FlowContext) -> FlowResult<bool> {
        let amount = batches * self.ratio_out;
        let Resource::Countable(typical) = self.core.typical() else {
            return Ok(false);
        };
        let mut staged = Resource::Countable(typical.with_amount(amount)?);
        self.core.offer_through(&mut staged, amount, amount, ctx)?;
        let left = staged.amount();
        debug_assert!(
            left == 0.0 || left == amount,
            "transformer '{}': chunk of {amount} split, {left} left",
            self.core.name()
        );
        Ok(left == 0.0)
    }

    /// Deliver countable output; returns the number of batches taken.
    fn deliver_batches(
        &mut self,
        min_batches: f64,
        max_batches: f64,
        ctx:         &mut FlowContext,
    ) -> FlowResult<f64> {
        let mut delivered = 0.0;
        if min_batches > 0.0 {
            if !self.offer_chunk(min_batches, ctx)? {
                return Ok(0.0);
            }
            delivered = min_batches;
        }
        let mut chunk = max_batches - delivered;
        while chunk >= 1.0 {
            if self.offer_chunk(chunk, ctx)? {
                delivered += chunk;
                chunk = chunk.min(max_batches - delivered);
            } else {
                chunk = (chunk / 2.0).floor();
            }
        }
        Ok(delivered)
    }

    /// Deliver entity output one entity (one batch) at a time.
    fn deliver_entities(&mut self, max_batches: f64, ctx: &mut FlowContext) -> FlowResult<f64> {
        let Resource::Entity(proto) = self.core.typical() else {
            return Ok(0.0);
        };
        let proto = proto.clone();
        let mut delivered = 0.0;
        while delivered < max_batches {
            let mut staged = Resource::Entity(proto.duplicate0());
            if !self.core.offer_through(&mut staged, 1.0, 1.0, ctx)? {
                break;
            }
            delivered += 1.0;
        }
        Ok(delivered)
    }
}

impl Named for Transformer {
    fn name(&self) -> &str {
        self.core.name()
    }
}

impl Provider for Transformer {
    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }
}

impl Receiver for Transformer {
    fn typical_received(&self) -> Option<&Resource> {
        Some(&self.input)
    }

    fn accept(
        &mut self,
        _from:    &str,
        resource: &mut Resource,
        at_least: f64,
        at_most:  f64,
        ctx:      &mut FlowContext,
    ) -> FlowResult<bool> {
        resource.ensure_kind(self.input.kind())?;
        let (min_batches, max_batches) = match resource {
            Resource::Entity(_) => (1.0, 1.0),
            Resource::Countable(c) => (
                (at_least / self.ratio_in).ceil().max(0.0),
                (c.amount().min(at_most) / self.ratio_in).floor(),
            ),
        };
        if max_batches < 1.0 || min_batches > max_batches {
            return Ok(false);
        }

        let batches = if self.core.typical().is_entity() {
            if min_batches > 1.0 {
                return Ok(false);
            }
            self.deliver_entities(max_batches, ctx)?
        } else {
            self.deliver_batches(min_batches, max_batches, ctx)?
        };
        if batches < 1.0 {
            return Ok(false);
        }

        let charge = batches * self.ratio_in;
        if let Resource::Countable(c) = resource {
            if !c.decrease(charge) {
                return Err(FlowError::InvalidAmount(c.amount() - charge));
            }
        }
        self.consumed += charge;
        self.produced += batches * self.ratio_out;
        trace!(transformer = self.core.name(), charge, batches, "converted");
        Ok(true)
    }
}
