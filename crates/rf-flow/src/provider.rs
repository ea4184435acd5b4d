//! `ProviderCore` — the state and behaviour every provider embeds.
//!
//! A provider holds a *typical* resource (a zero-amount type witness that
//! never circulates itself) and a [`Stock`] whose variant follows the
//! typical: a single countable pool, or a FIFO of entities.  The variant is
//! fixed at construction.
//!
//! Components embed a `ProviderCore` and expose it through the
//! [`Provider`][crate::Provider] trait, mirroring how the kernel composes
//! behaviour instead of inheriting it.

use std::collections::VecDeque;
use std::rc::Rc;

use rf_core::{
    check_amount, Criterion, Entity, FlowContext, FlowError, FlowResult, Resource, Sampler,
};
use tracing::trace;

use crate::policy::{OfferPolicy, OfferStrategy, Offered};
use crate::{borrow_receiver, ReceiverRef};

// ── Stock ─────────────────────────────────────────────────────────────────────

/// What a provider currently has on offer.
#[derive(Clone, Debug, PartialEq)]
pub enum Stock {
    /// A single pool; always holds a `Resource::Countable`.
    Countable(Resource),
    /// Entities in arrival order.
    Entities(VecDeque<Entity>),
}

impl Stock {
    /// An empty stock of the same shape as `typical`.
    pub fn for_typical(typical: &Resource) -> Stock {
        match typical {
            Resource::Countable(c) => Stock::Countable(Resource::Countable(c.duplicate0())),
            Resource::Entity(_)    => Stock::Entities(VecDeque::new()),
        }
    }

    /// Countable amount, or number of entities.
    pub fn available(&self) -> f64 {
        match self {
            Stock::Countable(pool) => pool.amount(),
            Stock::Entities(queue) => queue.len() as f64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.available() <= 0.0
    }

    pub fn clear(&mut self) {
        match self {
            Stock::Countable(pool) => pool.clear(),
            Stock::Entities(queue) => queue.clear(),
        }
    }

    pub fn entities(&self) -> Option<&VecDeque<Entity>> {
        match self {
            Stock::Entities(queue) => Some(queue),
            Stock::Countable(_)    => None,
        }
    }

    /// Add `amount` fresh units of `typical`: a countable increase, or that
    /// many new entity instances.
    pub fn produce(&mut self, typical: &Resource, amount: f64) -> FlowResult<()> {
        let amount = check_amount(amount)?;
        match (self, typical) {
            (Stock::Countable(pool), _) => {
                let next = check_amount(pool.amount() + amount)?;
                if let Some(c) = pool.as_countable_mut() {
                    c.set_amount(next)?;
                }
                Ok(())
            }
            (Stock::Entities(queue), Resource::Entity(proto)) => {
                queue.extend((0..amount as u64).map(|_| proto.duplicate0()));
                Ok(())
            }
            (Stock::Entities(_), Resource::Countable(c)) => Err(FlowError::Config(format!(
                "entity stock cannot be filled from countable '{}'",
                c.name()
            ))),
        }
    }

    /// Move `resource` into the stock.  Caller checks the type.
    pub fn push(&mut self, resource: Resource) -> FlowResult<()> {
        match (self, resource) {
            (Stock::Countable(pool), mut incoming @ Resource::Countable(_)) => pool.add(&mut incoming),
            (Stock::Entities(queue), Resource::Entity(e)) => {
                queue.push_back(e);
                Ok(())
            }
            (_, other) => Err(FlowError::Config(format!(
                "'{}' does not match the stock variant",
                other.name()
            ))),
        }
    }
}

// ── ProviderCore ──────────────────────────────────────────────────────────────

/// Receiver registry, stock, offer policy and statistics of one provider.
pub struct ProviderCore {
    name:                String,
    typical:             Resource,
    stock:               Stock,
    receivers:           Vec<ReceiverRef>,
    strategy:            OfferStrategy,
    take_it_or_leave_it: bool,
    total_provided:      f64,
    accepted_offers:     u64,
}

impl ProviderCore {
    /// `typical` only fixes the type and stock variant; its amount and
    /// payload are discarded.
    pub fn new(name: impl Into<String>, typical: &Resource) -> Self {
        Self {
            name:                name.into(),
            typical:             typical.duplicate0(),
            stock:               Stock::for_typical(typical),
            receivers:           Vec::new(),
            strategy:            OfferStrategy::default(),
            take_it_or_leave_it: false,
            total_provided:      0.0,
            accepted_offers:     0,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn typical(&self) -> &Resource {
        &self.typical
    }

    pub fn stock(&self) -> &Stock {
        &self.stock
    }

    pub fn stock_mut(&mut self) -> &mut Stock {
        &mut self.stock
    }

    pub fn available(&self) -> f64 {
        self.stock.available()
    }

    pub fn receivers(&self) -> &[ReceiverRef] {
        &self.receivers
    }

    /// Total amount (or entity count) taken by receivers since the last reset.
    pub fn total_provided(&self) -> f64 {
        self.total_provided
    }

    /// Number of individual offers that were accepted since the last reset.
    pub fn accepted_offers(&self) -> u64 {
        self.accepted_offers
    }

    // ── Configuration ─────────────────────────────────────────────────────

    pub fn offer_policy(&self) -> OfferPolicy {
        self.strategy.policy()
    }

    /// Change the policy; resets the round-robin cursor.
    pub fn set_offer_policy(&mut self, policy: OfferPolicy) {
        self.strategy.set_policy(policy);
    }

    pub fn round_robin_position(&self) -> usize {
        self.strategy.cursor()
    }

    /// Distribution used by [`OfferPolicy::RandomDistribution`].
    pub fn set_offer_distribution(&mut self, distribution: Option<Box<dyn Sampler>>) {
        self.strategy.set_distribution(distribution);
    }

    pub fn set_offer_threshold(&mut self, threshold: f64) -> FlowResult<()> {
        self.strategy.set_threshold(threshold)
    }

    pub fn set_offer_criterion(&mut self, criterion: Criterion) {
        self.strategy.set_criterion(criterion);
    }

    pub fn offers_take_it_or_leave_it(&self) -> bool {
        self.take_it_or_leave_it
    }

    /// When set, countable offers are all-or-nothing
    /// (`at_least == at_most == available`).
    pub fn set_offers_take_it_or_leave_it(&mut self, value: bool) {
        self.take_it_or_leave_it = value;
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register `receiver`.  `Ok(false)` if it is already registered; an
    /// error if it cannot take this provider's type.
    pub fn add_receiver(&mut self, receiver: ReceiverRef) -> FlowResult<bool> {
        if self.receivers.iter().any(|r| Rc::ptr_eq(r, &receiver)) {
            return Ok(false);
        }
        let (compatible, receiver_name) = {
            let r = receiver.try_borrow().map_err(|_| FlowError::CyclicOffer {
                provider: self.name.clone(),
            })?;
            (r.accepts_type(self.typical.kind()), r.name().to_string())
        };
        if !compatible {
            return Err(FlowError::IncompatibleReceiver {
                provider: self.name.clone(),
                receiver: receiver_name,
            });
        }
        self.receivers.push(receiver);
        Ok(true)
    }

    pub fn remove_receiver(&mut self, receiver: &ReceiverRef) -> bool {
        match self.receivers.iter().position(|r| Rc::ptr_eq(r, receiver)) {
            Some(i) => {
                self.receivers.remove(i);
                self.strategy.reset_cursor();
                true
            }
            None => false,
        }
    }

    // ── Offering ──────────────────────────────────────────────────────────

    /// Offer the stock to the registered receivers under the current policy.
    pub fn offer_receivers(&mut self, ctx: &mut FlowContext) -> FlowResult<bool> {
        if self.stock.is_empty() {
            return Ok(false);
        }
        let Self {
            name,
            stock,
            receivers,
            strategy,
            take_it_or_leave_it,
            total_provided,
            accepted_offers,
            ..
        } = self;
        let name = name.as_str();
        let tioli = *take_it_or_leave_it;
        strategy.dispatch(receivers, tioli, ctx, |receiver, ctx| {
            let outcome = offer_stock(name, stock, receiver, f64::INFINITY, tioli, ctx)?;
            tally(total_provided, accepted_offers, outcome);
            Ok(outcome)
        })
    }

    /// Offer at most `at_most` of the stock to one registered receiver.
    pub fn provide(
        &mut self,
        receiver: &ReceiverRef,
        at_most:  f64,
        ctx:      &mut FlowContext,
    ) -> FlowResult<bool> {
        if !self.receivers.iter().any(|r| Rc::ptr_eq(r, receiver)) {
            return Ok(false);
        }
        let tioli = self.take_it_or_leave_it;
        let outcome = offer_stock(&self.name, &mut self.stock, receiver, at_most, tioli, ctx)?;
        tally(&mut self.total_provided, &mut self.accepted_offers, outcome);
        Ok(outcome.accepted)
    }

    /// Forward an externally owned `resource` to the receivers under the
    /// current policy, without touching the stock.
    ///
    /// The first receiver to accept must satisfy `at_least`; later ones are
    /// offered whatever is left of `at_most`.  Returns `true` if anything was
    /// taken.
    pub fn offer_through(
        &mut self,
        resource: &mut Resource,
        at_least: f64,
        at_most:  f64,
        ctx:      &mut FlowContext,
    ) -> FlowResult<bool> {
        resource.ensure_kind(self.typical.kind())?;
        let Self {
            name,
            receivers,
            strategy,
            take_it_or_leave_it,
            total_provided,
            accepted_offers,
            ..
        } = self;
        let name = name.as_str();
        let tioli = *take_it_or_leave_it;
        let mut moved = 0.0;

        strategy.dispatch(receivers, tioli, ctx, |receiver, ctx| {
            let mut target = borrow_receiver(receiver, name)?;
            let outcome = if resource.is_entity() {
                let accepted = target.accept(name, resource, 1.0, 1.0, ctx)?;
                Offered {
                    accepted,
                    taken: if accepted { 1.0 } else { 0.0 },
                    exhausted: accepted,
                }
            } else {
                let before = resource.amount();
                let ceiling = (at_most - moved).min(before).floor();
                let floor = if tioli { ceiling } else { (at_least - moved).max(0.0) };
                if ceiling <= 0.0 || floor > ceiling {
                    return Ok(Offered::EXHAUSTED);
                }
                let accepted = target.accept(name, resource, floor, ceiling, ctx)?;
                let taken = before - resource.amount();
                Offered {
                    accepted,
                    taken,
                    exhausted: moved + taken >= at_most || resource.amount() <= 0.0,
                }
            };
            moved += outcome.taken;
            tally(total_provided, accepted_offers, outcome);
            Ok(outcome)
        })?;
        Ok(moved > 0.0)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Add `amount` fresh units of the typical resource to the stock.
    pub fn produce(&mut self, amount: f64) -> FlowResult<()> {
        self.stock.produce(&self.typical, amount)
    }

    /// Move `resource` into the stock after checking its type.
    pub fn store(&mut self, resource: Resource) -> FlowResult<()> {
        resource.ensure_kind(self.typical.kind())?;
        self.stock.push(resource)
    }

    /// Drop the stock without offering it.
    pub fn clear_stock(&mut self) {
        self.stock.clear();
    }

    /// Clear stock, round-robin cursor and statistics.  Registration and
    /// configuration survive.
    pub fn reset(&mut self) {
        self.stock.clear();
        self.strategy.reset_cursor();
        self.total_provided = 0.0;
        self.accepted_offers = 0;
    }
}

/// Carve what fits into `room` out of `resource` for a buffering receiver.
///
/// Entities need one unit of room.  Countables are taken up to
/// `min(room, at_most)`; if that falls short of `at_least` nothing moves.
/// Returns the carved-out part, or `None` to decline.
pub fn take_within(
    resource: &mut Resource,
    room:     f64,
    at_least: f64,
    at_most:  f64,
) -> FlowResult<Option<Resource>> {
    let room = room.floor();
    match resource {
        Resource::Entity(e) => Ok((room >= 1.0).then(|| Resource::Entity(e.clone()))),
        Resource::Countable(c) => {
            let take = room.min(at_most).min(c.amount()).floor();
            if take < at_least || take <= 0.0 {
                return Ok(None);
            }
            Ok(c.reduce(take, take)?.map(Resource::Countable))
        }
    }
}

fn tally(total_provided: &mut f64, accepted_offers: &mut u64, outcome: Offered) {
    *total_provided += outcome.taken;
    if outcome.accepted {
        *accepted_offers += 1;
    }
}

/// Offer up to `at_most` from `stock` to a single receiver.
///
/// Countable stock is offered in one call.  Entities are offered one at a
/// time from the front until the receiver declines or `at_most` entities
/// have gone.
fn offer_stock(
    from:     &str,
    stock:    &mut Stock,
    receiver: &ReceiverRef,
    at_most:  f64,
    tioli:    bool,
    ctx:      &mut FlowContext,
) -> FlowResult<Offered> {
    let mut target = borrow_receiver(receiver, from)?;
    match stock {
        Stock::Countable(pool) => {
            let before = pool.amount();
            let offered = before.min(at_most).floor();
            if offered <= 0.0 {
                return Ok(Offered::EXHAUSTED);
            }
            let at_least = if tioli { offered } else { 0.0 };
            let accepted = target.accept(from, pool, at_least, offered, ctx)?;
            let taken = before - pool.amount();
            debug_assert!(
                accepted || taken == 0.0,
                "receiver '{}' declined but took {taken}",
                target.name()
            );
            debug_assert!(
                !accepted || (taken >= at_least && taken <= offered),
                "receiver '{}' took {taken} outside [{at_least}, {offered}]",
                target.name()
            );
            if accepted {
                trace!(provider = from, receiver = target.name(), taken, "offer accepted");
            }
            Ok(Offered {
                accepted,
                taken,
                exhausted: pool.amount() <= 0.0,
            })
        }
        Stock::Entities(queue) => {
            let mut taken = 0.0;
            while taken < at_most {
                let Some(entity) = queue.pop_front() else {
                    break;
                };
                let mut offer = Resource::Entity(entity);
                if target.accept(from, &mut offer, 1.0, 1.0, ctx)? {
                    taken += 1.0;
                } else {
                    if let Resource::Entity(e) = offer {
                        queue.push_front(e);
                    }
                    break;
                }
            }
            if taken > 0.0 {
                trace!(provider = from, receiver = target.name(), taken, "entities accepted");
            }
            Ok(Offered {
                accepted: taken > 0.0,
                taken,
                exhausted: queue.is_empty(),
            })
        }
    }
}
