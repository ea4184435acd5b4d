//! The resource model: countable quantities and indivisible entities.
//!
//! # Variants
//!
//! | Type                 | Amount                          | Divisible |
//! |----------------------|---------------------------------|-----------|
//! | [`CountableResource`]| non-negative integer (`f64`)    | yes       |
//! | [`Entity`]           | always 1                        | no        |
//!
//! [`Resource`] is the closed sum over both and is what flows through the
//! offer/accept protocol.
//!
//! # Types
//!
//! Constructing a *typical* resource (`CountableResource::typical`,
//! `CountableResource::new`, `Entity::typical`) allocates a fresh
//! [`ResourceType`].  Everything derived from it (`duplicate`, `with_amount`,
//! `reduce`, `divide`) shares that type.  Only resources with the same type
//! may be combined; mixing types is a wiring error and fails with
//! [`FlowError::UnequalType`].
//!
//! # Amounts
//!
//! Countable amounts are stored as `f64` for range but must always be
//! integral, non-negative and no larger than 2^53.  Setting an amount that
//! breaks this is a hard error; `increase`/`decrease` instead return `false`
//! and leave the amount untouched, since callers use them as probes.

use std::cmp::Ordering;
use std::fmt;

use crate::{EntityId, FlowError, FlowResult, ResourceType};

/// Largest amount a countable resource may hold (2^53, the largest integer
/// `f64` represents exactly together with all smaller integers).
pub const MAX_AMOUNT: f64 = 9_007_199_254_740_992.0;

/// Validate a countable amount.
pub fn check_amount(amount: f64) -> FlowResult<f64> {
    if !(amount.is_finite() && amount >= 0.0 && amount <= MAX_AMOUNT) {
        return Err(FlowError::InvalidAmount(amount));
    }
    if amount.floor() != amount {
        return Err(FlowError::NonIntegerAmount(amount));
    }
    Ok(amount)
}

#[inline]
fn is_valid_amount(amount: f64) -> bool {
    check_amount(amount).is_ok()
}

// ── CountableResource ─────────────────────────────────────────────────────────

/// A mergeable, divisible quantity of one resource type.
#[derive(Clone, Debug, PartialEq)]
pub struct CountableResource {
    kind:   ResourceType,
    name:   String,
    amount: f64,
}

impl CountableResource {
    /// A zero-amount prototype with a brand-new resource type.
    pub fn typical(name: impl Into<String>) -> Self {
        Self {
            kind:   ResourceType::allocate(),
            name:   name.into(),
            amount: 0.0,
        }
    }

    /// A prototype with a brand-new resource type and an initial amount.
    pub fn new(name: impl Into<String>, amount: f64) -> FlowResult<Self> {
        let amount = check_amount(amount)?;
        let mut res = Self::typical(name);
        res.amount = amount;
        Ok(res)
    }

    /// A resource of the same type as `self` holding `amount`.
    pub fn with_amount(&self, amount: f64) -> FlowResult<Self> {
        Ok(Self {
            kind:   self.kind,
            name:   self.name.clone(),
            amount: check_amount(amount)?,
        })
    }

    #[inline]
    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn set_amount(&mut self, amount: f64) -> FlowResult<()> {
        self.amount = check_amount(amount)?;
        Ok(())
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.amount == 0.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.amount > 0.0
    }

    pub fn clear(&mut self) {
        self.amount = 0.0;
    }

    /// Independent copy including the amount.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Independent copy with the amount cleared to zero.
    pub fn duplicate0(&self) -> Self {
        Self {
            kind:   self.kind,
            name:   self.name.clone(),
            amount: 0.0,
        }
    }

    #[inline]
    pub fn is_same_type(&self, other: &CountableResource) -> bool {
        self.kind == other.kind
    }

    fn ensure_same_type(&self, other: &CountableResource) -> FlowResult<()> {
        if self.kind != other.kind {
            return Err(FlowError::UnequalType {
                expected: self.kind,
                found:    other.kind,
            });
        }
        Ok(())
    }

    /// Add `value` to the amount.  Returns `false` and leaves the amount
    /// unchanged if the result would be invalid.
    pub fn increase(&mut self, value: f64) -> bool {
        let next = self.amount + value;
        if !is_valid_amount(value.abs()) || !is_valid_amount(next) {
            return false;
        }
        self.amount = next;
        true
    }

    /// Subtract `value` from the amount.  Returns `false` and leaves the
    /// amount unchanged if the result would be invalid.
    pub fn decrease(&mut self, value: f64) -> bool {
        self.increase(-value)
    }

    pub fn increment(&mut self) -> bool {
        self.increase(1.0)
    }

    pub fn decrement(&mut self) -> bool {
        self.decrease(1.0)
    }

    /// Clamp the amount to at most `max`.
    pub fn bound(&mut self, max: f64) {
        if self.amount > max {
            self.amount = max.max(0.0).floor();
        }
    }

    /// Clamp the amount into `[min, max]`.
    pub fn bound_range(&mut self, min: f64, max: f64) {
        self.bound(max);
        if self.amount < min {
            self.amount = min.ceil().min(MAX_AMOUNT);
        }
    }

    /// Move everything `other` holds into `self`.
    pub fn add(&mut self, other: &mut CountableResource) -> FlowResult<()> {
        self.add_at_most(other, f64::INFINITY).map(|_| ())
    }

    /// Move up to `at_most` from `other` into `self`, returning the amount
    /// moved.
    pub fn add_at_most(&mut self, other: &mut CountableResource, at_most: f64) -> FlowResult<f64> {
        self.ensure_same_type(other)?;
        let moved = other.amount.min(at_most).max(0.0).floor();
        let next = check_amount(self.amount + moved)?;
        self.amount = next;
        other.amount -= moved;
        Ok(moved)
    }

    /// Carve between `at_least` and `at_most` out of `self` into a new
    /// resource of the same type.
    ///
    /// Takes as much as possible up to `at_most`.  Returns `Ok(None)` (and
    /// leaves `self` untouched) if even `at_least` is not available.
    pub fn reduce(&mut self, at_least: f64, at_most: f64) -> FlowResult<Option<CountableResource>> {
        let at_least = check_amount(at_least)?;
        if at_most.is_nan() || at_most < at_least {
            return Err(FlowError::InvalidAmount(at_most));
        }
        if self.amount < at_least {
            return Ok(None);
        }
        let taken = self.amount.min(at_most).floor();
        self.amount -= taken;
        Ok(Some(Self {
            kind:   self.kind,
            name:   self.name.clone(),
            amount: taken,
        }))
    }

    /// Remove exactly `amount` into a new resource, or `Ok(None)` if not
    /// enough is held.
    pub fn divide(&mut self, amount: f64) -> FlowResult<Option<CountableResource>> {
        self.reduce(amount, amount)
    }

    /// Type-checked comparison of amounts.
    pub fn compare(&self, other: &CountableResource) -> FlowResult<Ordering> {
        self.ensure_same_type(other)?;
        Ok(self.amount.total_cmp(&other.amount))
    }
}

impl fmt::Display for CountableResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.name, self.amount)
    }
}

// ── Entity ────────────────────────────────────────────────────────────────────

/// An indivisible token, optionally bundling other resources.
///
/// Equality of *type* is decided by `kind()` alone; the payload is not
/// part of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    kind:    ResourceType,
    id:      EntityId,
    name:    String,
    storage: Option<Vec<Resource>>,
}

impl Entity {
    /// A prototype entity with a brand-new resource type.
    pub fn typical(name: impl Into<String>) -> Self {
        Self {
            kind:    ResourceType::allocate(),
            id:      EntityId::allocate(),
            name:    name.into(),
            storage: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A fresh instance (new id) of the same type with a copy of the payload.
    pub fn duplicate(&self) -> Self {
        Self {
            kind:    self.kind,
            id:      EntityId::allocate(),
            name:    self.name.clone(),
            storage: self.storage.clone(),
        }
    }

    /// A fresh instance (new id) of the same type with no payload.
    pub fn duplicate0(&self) -> Self {
        Self {
            kind:    self.kind,
            id:      EntityId::allocate(),
            name:    self.name.clone(),
            storage: None,
        }
    }

    /// Drop the payload.
    pub fn clear(&mut self) {
        self.storage = None;
    }

    #[inline]
    pub fn is_same_type(&self, other: &Entity) -> bool {
        self.kind == other.kind
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        self.storage.is_some()
    }

    pub fn storage(&self) -> Option<&[Resource]> {
        self.storage.as_deref()
    }

    pub fn storage_mut(&mut self) -> Option<&mut Vec<Resource>> {
        self.storage.as_mut()
    }

    /// Replace the payload with `parts`.
    pub fn compose(&mut self, parts: Vec<Resource>) {
        self.storage = Some(parts);
    }

    /// Take the payload out, failing if this entity is not composite.
    pub fn decompose(&mut self) -> FlowResult<Vec<Resource>> {
        self.storage
            .take()
            .ok_or_else(|| FlowError::NotComposite(self.name.clone()))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.name, self.id.0)
    }
}

// ── Resource ─────────────────────────────────────────────────────────────────

/// Anything that can be offered and accepted.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    Countable(CountableResource),
    Entity(Entity),
}

impl Resource {
    #[inline]
    pub fn kind(&self) -> ResourceType {
        match self {
            Resource::Countable(c) => c.kind(),
            Resource::Entity(e)    => e.kind(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Resource::Countable(c) => c.name(),
            Resource::Entity(e)    => e.name(),
        }
    }

    /// Countable amount, or 1 for an entity.
    #[inline]
    pub fn amount(&self) -> f64 {
        match self {
            Resource::Countable(c) => c.amount(),
            Resource::Entity(_)    => 1.0,
        }
    }

    #[inline]
    pub fn is_countable(&self) -> bool {
        matches!(self, Resource::Countable(_))
    }

    #[inline]
    pub fn is_entity(&self) -> bool {
        matches!(self, Resource::Entity(_))
    }

    /// Zero a countable amount or drop an entity's payload.
    pub fn clear(&mut self) {
        match self {
            Resource::Countable(c) => c.clear(),
            Resource::Entity(e)    => e.clear(),
        }
    }

    pub fn duplicate(&self) -> Resource {
        match self {
            Resource::Countable(c) => Resource::Countable(c.duplicate()),
            Resource::Entity(e)    => Resource::Entity(e.duplicate()),
        }
    }

    /// Same-type copy with a zero amount / empty payload.
    pub fn duplicate0(&self) -> Resource {
        match self {
            Resource::Countable(c) => Resource::Countable(c.duplicate0()),
            Resource::Entity(e)    => Resource::Entity(e.duplicate0()),
        }
    }

    #[inline]
    pub fn is_same_type(&self, other: &Resource) -> bool {
        self.kind() == other.kind()
    }

    /// Fail with [`FlowError::UnequalType`] unless `self` has type `expected`.
    pub fn ensure_kind(&self, expected: ResourceType) -> FlowResult<()> {
        if self.kind() != expected {
            return Err(FlowError::UnequalType {
                expected,
                found: self.kind(),
            });
        }
        Ok(())
    }

    pub fn as_countable(&self) -> Option<&CountableResource> {
        match self {
            Resource::Countable(c) => Some(c),
            Resource::Entity(_)    => None,
        }
    }

    pub fn as_countable_mut(&mut self) -> Option<&mut CountableResource> {
        match self {
            Resource::Countable(c) => Some(c),
            Resource::Entity(_)    => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Resource::Entity(e)    => Some(e),
            Resource::Countable(_) => None,
        }
    }

    pub fn as_entity_mut(&mut self) -> Option<&mut Entity> {
        match self {
            Resource::Entity(e)    => Some(e),
            Resource::Countable(_) => None,
        }
    }

    /// Combine `other` into `self` (countables only, same type).
    pub fn add(&mut self, other: &mut Resource) -> FlowResult<()> {
        self.ensure_kind(other.kind())?;
        match (self, other) {
            (Resource::Countable(a), Resource::Countable(b)) => a.add(b),
            (Resource::Entity(e), _) | (_, Resource::Entity(e)) => Err(FlowError::Config(format!(
                "entity '{}' cannot be merged",
                e.name()
            ))),
        }
    }
}

impl From<CountableResource> for Resource {
    fn from(c: CountableResource) -> Self {
        Resource::Countable(c)
    }
}

impl From<Entity> for Resource {
    fn from(e: Entity) -> Self {
        Resource::Entity(e)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Countable(c) => c.fmt(f),
            Resource::Entity(e)    => e.fmt(f),
        }
    }
}
