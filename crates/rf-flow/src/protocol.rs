//! The offer/accept contract shared by every component.
//!
//! # Contract
//!
//! A [`Provider`] pushes supply by calling [`Receiver::accept`] with a
//! resource and an acceptable range `[at_least, at_most]`:
//!
//! - For a countable resource the receiver removes some amount in that range
//!   from `resource` *in place* and returns `true`, or leaves `resource`
//!   completely untouched and returns `false`.  The shrinking amount is the
//!   only signal the provider gets about how much was taken.
//! - For an entity the receiver either takes the whole token (`true`) or
//!   declines (`false`).  On `true` the provider forgets its copy.
//!
//! Hard errors (type mismatch, re-entrant offers, broken wiring) are `Err`;
//! everything else is a boolean.
//!
//! # Sharing
//!
//! Components are wired through `Rc<RefCell<…>>` handles.  A component is
//! mutably borrowed for the whole duration of its own `step`/`accept`, so an
//! offer that loops back into a component already on the call stack fails
//! to borrow and is reported as [`FlowError::CyclicOffer`].

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use rf_core::{FlowContext, FlowError, FlowResult, Resource, ResourceType};
use tracing::debug;

use crate::ProviderCore;

/// Anything with a human-readable name.
pub trait Named {
    fn name(&self) -> &str;
}

/// The accepting side of the protocol.
pub trait Receiver: Named {
    /// Prototype of what this receiver takes, if it takes a single type.
    fn typical_received(&self) -> Option<&Resource>;

    /// Whether resources of `kind` may be offered here at all.
    fn accepts_type(&self, kind: ResourceType) -> bool {
        self.typical_received().is_some_and(|t| t.kind() == kind)
    }

    /// Take between `at_least` and `at_most` of `resource`, or decline.
    ///
    /// `from` is the name of the offering provider.
    fn accept(
        &mut self,
        from:     &str,
        resource: &mut Resource,
        at_least: f64,
        at_most:  f64,
        ctx:      &mut FlowContext,
    ) -> FlowResult<bool>;
}

/// The offering side of the protocol.
///
/// Implementors only expose their [`ProviderCore`]; registration, offer
/// policies and statistics all live there.
pub trait Provider: Named {
    fn core(&self) -> &ProviderCore;

    fn core_mut(&mut self) -> &mut ProviderCore;

    /// Register a downstream receiver.  Returns `false` if it was already
    /// registered.
    fn add_receiver(&mut self, receiver: ReceiverRef) -> FlowResult<bool> {
        self.core_mut().add_receiver(receiver)
    }

    fn remove_receiver(&mut self, receiver: &ReceiverRef) -> bool {
        self.core_mut().remove_receiver(receiver)
    }

    /// Offer the current stock to the registered receivers.
    fn offer_receivers(&mut self, ctx: &mut FlowContext) -> FlowResult<bool> {
        self.core_mut().offer_receivers(ctx)
    }

    /// Offer at most `at_most` to one registered receiver, ignoring the
    /// offer policy.
    fn provide(
        &mut self,
        receiver: &ReceiverRef,
        at_most:  f64,
        ctx:      &mut FlowContext,
    ) -> FlowResult<bool> {
        self.core_mut().provide(receiver, at_most, ctx)
    }

    /// Amount (or entity count) currently available for offering.
    fn available(&self) -> f64 {
        self.core().available()
    }
}

/// Something the host steps once per tick.
pub trait Steppable: Named {
    fn step(&mut self, ctx: &mut FlowContext) -> FlowResult<()>;
}

pub type ReceiverRef = Rc<RefCell<dyn Receiver>>;
pub type ProviderRef = Rc<RefCell<dyn Provider>>;
pub type SteppableRef = Rc<RefCell<dyn Steppable>>;

/// Wrap a component for wiring.
///
/// The returned handle coerces to [`ReceiverRef`], [`ProviderRef`] or
/// [`SteppableRef`] as the component allows.
pub fn shared<T>(component: T) -> Rc<RefCell<T>> {
    Rc::new(RefCell::new(component))
}

/// Mutably borrow `receiver` for an offer made by `provider`.
pub fn borrow_receiver<'a>(
    receiver: &'a ReceiverRef,
    provider: &str,
) -> FlowResult<RefMut<'a, dyn Receiver + 'static>> {
    receiver.try_borrow_mut().map_err(|_| {
        debug!(provider, "receiver already busy; cyclic offer");
        FlowError::CyclicOffer {
            provider: provider.to_string(),
        }
    })
}
