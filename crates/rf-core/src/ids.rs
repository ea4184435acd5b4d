//! Process-wide identifiers for resource types and entity instances.
//!
//! Both ids come from monotonic atomic counters that are initialised once and
//! never reset.  A `ResourceType` is minted only when a *typical* (prototype)
//! resource is constructed; every duplicate, reduction or division of that
//! resource inherits it.  An `EntityId` is minted for every entity instance,
//! duplicates included, so individual tokens can be followed through a
//! network.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RESOURCE_TYPE: AtomicU64 = AtomicU64::new(0);
static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(0);

/// Generate an opaque id wrapper around a `u64` counter value.
macro_rules! counter_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident via $counter:ident;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub u64);

        impl $name {
            /// Draw the next value from the process-wide counter.
            #[inline]
            pub fn allocate() -> Self {
                $name($counter.fetch_add(1, Ordering::Relaxed))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

counter_id! {
    /// Identity of a kind of resource.  Equality of this id is the only
    /// compatibility criterion between two resources; names are cosmetic.
    pub struct ResourceType via NEXT_RESOURCE_TYPE;
}

counter_id! {
    /// Identity of a single entity instance.
    pub struct EntityId via NEXT_ENTITY_ID;
}
