//! `Composer` and `Decomposer` — packing resources of several types into a
//! composite entity and unpacking it again.

use rf_core::{Entity, FlowContext, FlowError, FlowResult, Resource, ResourceType};
use tracing::debug;

use crate::{borrow_receiver, Named, Provider, ProviderCore, Receiver, ReceiverRef, Steppable};

// ── Composer ──────────────────────────────────────────────────────────────────

/// Buffers at most one offer per incoming type and, on `step`, packs the
/// buffered parts into a fresh copy of its composite prototype.
///
/// Parts are stored in the order the incoming types were configured, not
/// the order they arrived.
pub struct Composer {
    core:      ProviderCore,
    prototype: Entity,
    incoming:  Vec<Resource>,
    buffer:    Vec<Option<Resource>>,
    sends_only_when_full: bool,
    composed:  u64,
}

impl Composer {
    /// Each entry of `incoming` contributes one type; types must be unique.
    pub fn new(name: impl Into<String>, prototype: &Entity, incoming: &[Resource]) -> FlowResult<Self> {
        let core = ProviderCore::new(name, &Resource::Entity(prototype.duplicate0()));
        for (i, r) in incoming.iter().enumerate() {
            if incoming[..i].iter().any(|earlier| earlier.is_same_type(r)) {
                return Err(FlowError::Config(format!(
                    "composer '{}': incoming type '{}' listed twice",
                    core.name(),
                    r.name()
                )));
            }
        }
        Ok(Self {
            core,
            prototype: prototype.duplicate0(),
            incoming:  incoming.iter().map(Resource::duplicate0).collect(),
            buffer:    vec![None; incoming.len()],
            sends_only_when_full: true,
            composed:  0,
        })
    }

    pub fn sends_only_when_full(&self) -> bool {
        self.sends_only_when_full
    }

    /// When unset, `step` packs whatever is buffered instead of waiting for
    /// every incoming type.
    pub fn set_sends_only_when_full(&mut self, value: bool) {
        self.sends_only_when_full = value;
    }

    pub fn incoming(&self) -> &[Resource] {
        &self.incoming
    }

    /// Number of incoming types currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.iter().filter(|slot| slot.is_some()).count()
    }

    /// Composite entities produced so far.
    pub fn composed(&self) -> u64 {
        self.composed
    }

    /// Drop buffered parts and unsent composites.
    pub fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|slot| *slot = None);
        self.core.clear_stock();
    }

    fn slot_of(&self, kind: ResourceType) -> Option<usize> {
        self.incoming.iter().position(|r| r.kind() == kind)
    }

    /// Pack the buffer if it is ready.  Returns whether a composite was made.
    pub fn compose(&mut self) -> FlowResult<bool> {
        let filled = self.buffered();
        let ready = if self.sends_only_when_full {
            filled == self.incoming.len()
        } else {
            filled > 0
        };
        if !ready {
            return Ok(false);
        }
        let parts: Vec<Resource> = self.buffer.iter_mut().filter_map(Option::take).collect();
        let mut composite = self.prototype.duplicate0();
        composite.compose(parts);
        debug!(composer = self.core.name(), entity = %composite.id(), parts = filled, "composed");
        self.core.store(Resource::Entity(composite))?;
        self.composed += 1;
        Ok(true)
    }
}

impl Named for Composer {
    fn name(&self) -> &str {
        self.core.name()
    }
}

impl Provider for Composer {
    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }
}

impl Receiver for Composer {
    fn typical_received(&self) -> Option<&Resource> {
        None
    }

    fn accepts_type(&self, kind: ResourceType) -> bool {
        self.slot_of(kind).is_some()
    }

    fn accept(
        &mut self,
        _from:    &str,
        resource: &mut Resource,
        at_least: f64,
        at_most:  f64,
        _ctx:     &mut FlowContext,
    ) -> FlowResult<bool> {
        let Some(slot) = self.slot_of(resource.kind()) else {
            return Err(FlowError::UnexpectedType {
                receiver: self.core.name().to_string(),
                found:    resource.kind(),
            });
        };
        if self.buffer[slot].is_some() {
            return Ok(false);
        }
        let part = match resource {
            Resource::Entity(e) => Resource::Entity(e.clone()),
            Resource::Countable(c) => {
                if at_most < 1.0 {
                    return Ok(false);
                }
                match c.reduce(at_least, at_most)? {
                    Some(part) => Resource::Countable(part),
                    None => return Ok(false),
                }
            }
        };
        self.buffer[slot] = Some(part);
        Ok(true)
    }
}

impl Steppable for Composer {
    fn step(&mut self, ctx: &mut FlowContext) -> FlowResult<()> {
        self.compose()?;
        self.core.offer_receivers(ctx)?;
        Ok(())
    }
}

// ── Decomposer ────────────────────────────────────────────────────────────────

/// Unpacks composite entities, routing each part to the receiver registered
/// for its type.  Parts with no route are dropped with the entity.
pub struct Decomposer {
    name:    String,
    typical: Resource,
    routes:  Vec<(ResourceType, ReceiverRef)>,
    take_it_or_leave_it: bool,
}

impl Decomposer {
    pub fn new(name: impl Into<String>, typical: &Entity) -> Self {
        Self {
            name:    name.into(),
            typical: Resource::Entity(typical.duplicate0()),
            routes:  Vec::new(),
            take_it_or_leave_it: false,
        }
    }

    /// Route parts of `receiver`'s typical type to it.  `Ok(false)` if that
    /// type already has a route.
    pub fn add_receiver(&mut self, receiver: ReceiverRef) -> FlowResult<bool> {
        let kind = {
            let r = receiver.try_borrow().map_err(|_| FlowError::CyclicOffer {
                provider: self.name.clone(),
            })?;
            match r.typical_received() {
                Some(t) => t.kind(),
                None => {
                    return Err(FlowError::Config(format!(
                        "decomposer '{}': receiver '{}' has no single typical type",
                        self.name,
                        r.name()
                    )));
                }
            }
        };
        if self.routes.iter().any(|(k, _)| *k == kind) {
            return Ok(false);
        }
        self.routes.push((kind, receiver));
        Ok(true)
    }

    pub fn remove_receiver(&mut self, kind: ResourceType) -> Option<ReceiverRef> {
        let i = self.routes.iter().position(|(k, _)| *k == kind)?;
        Some(self.routes.remove(i).1)
    }

    pub fn route(&self, kind: ResourceType) -> Option<&ReceiverRef> {
        self.routes.iter().find(|(k, _)| *k == kind).map(|(_, r)| r)
    }

    /// When set, each countable part must be taken whole.
    pub fn set_offers_take_it_or_leave_it(&mut self, value: bool) {
        self.take_it_or_leave_it = value;
    }
}

impl Named for Decomposer {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Receiver for Decomposer {
    fn typical_received(&self) -> Option<&Resource> {
        Some(&self.typical)
    }

    fn accept(
        &mut self,
        _from:    &str,
        resource: &mut Resource,
        _at_least: f64,
        _at_most:  f64,
        ctx:      &mut FlowContext,
    ) -> FlowResult<bool> {
        resource.ensure_kind(self.typical.kind())?;
        let name = resource.name().to_string();
        let parts = resource
            .as_entity_mut()
            .and_then(Entity::storage_mut)
            .ok_or(FlowError::NotComposite(name))?;

        let mut any = false;
        for part in parts.iter_mut() {
            let Some((_, receiver)) = self.routes.iter().find(|(k, _)| *k == part.kind()) else {
                continue;
            };
            let amount = part.amount();
            if amount <= 0.0 {
                continue;
            }
            let at_least = if self.take_it_or_leave_it || part.is_entity() { amount } else { 0.0 };
            let mut target = borrow_receiver(receiver, &self.name)?;
            any |= target.accept(&self.name, part, at_least, amount, ctx)?;
        }
        Ok(any)
    }
}
