//! `Sink` — a terminal receiver that takes everything of its type.

use rf_core::{FlowContext, FlowResult, Resource};

use crate::{Named, Receiver};

/// Accepts the full `at_most` of every offer and discards it, keeping only
/// counts.
pub struct Sink {
    name:     String,
    typical:  Resource,
    received: f64,
    offers:   u64,
}

impl Sink {
    pub fn new(name: impl Into<String>, typical: &Resource) -> Self {
        Self {
            name:     name.into(),
            typical:  typical.duplicate0(),
            received: 0.0,
            offers:   0,
        }
    }

    /// Total amount (or entity count) taken so far.
    pub fn received(&self) -> f64 {
        self.received
    }

    /// Number of offers accepted so far.
    pub fn accepted_offers(&self) -> u64 {
        self.offers
    }

    pub fn reset(&mut self) {
        self.received = 0.0;
        self.offers = 0;
    }
}

impl Named for Sink {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Receiver for Sink {
    fn typical_received(&self) -> Option<&Resource> {
        Some(&self.typical)
    }

    fn accept(
        &mut self,
        _from:    &str,
        resource: &mut Resource,
        at_least: f64,
        at_most:  f64,
        _ctx:     &mut FlowContext,
    ) -> FlowResult<bool> {
        resource.ensure_kind(self.typical.kind())?;
        let taken = match resource {
            Resource::Entity(_) => 1.0,
            Resource::Countable(c) => match c.reduce(at_least, at_most)? {
                Some(part) if part.is_positive() => part.amount(),
                // Zero-width offers move nothing.
                _ => return Ok(false),
            },
        };
        self.received += taken;
        self.offers += 1;
        Ok(true)
    }
}
