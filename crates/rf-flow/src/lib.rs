//! `rf-flow` — the offer/accept protocol and the flow primitives built on it.
//!
//! # One tick
//!
//! ```text
//! host: ctx.advance()
//!   for each steppable in host order:
//!     Source      → produce, offer stock downstream
//!     Queue       → offer buffered stock downstream
//!     Delay       → drop unclaimed output, release due nodes, offer them
//!     Composer    → pack a full buffer, offer composites
//! receivers react inside the offer:
//!     Queue/Delay → store what fits
//!     Transformer → convert and offer onward immediately
//!     Decomposer  → route parts to per-type receivers
//!     Sink        → count and discard
//! ```
//!
//! The kernel has no scheduler of its own; the host decides what to step
//! and in which order.
//!
//! # Quick-start
//!
//! ```rust
//! use rf_core::{CountableResource, FlowContext, Resource};
//! use rf_flow::{shared, Provider, Sink, Source, Steppable};
//!
//! let wood = Resource::from(CountableResource::typical("wood"));
//! let source = shared(Source::new("forest", &wood));
//! let sink = shared(Sink::new("mill", &wood));
//! source.borrow_mut().add_receiver(sink.clone()).unwrap();
//!
//! let mut ctx = FlowContext::seeded(1);
//! source.borrow_mut().step(&mut ctx).unwrap();
//! assert_eq!(sink.borrow().received(), 1.0);
//! ```

pub mod composer;
pub mod delay;
pub mod policy;
pub mod protocol;
pub mod provider;
pub mod queue;
pub mod simple_delay;
pub mod sink;
pub mod source;
pub mod transformer;


pub use composer::{Composer, Decomposer};
pub use delay::Delay;
pub use policy::{OfferPolicy, OfferStrategy, Offered};
pub use protocol::{
    borrow_receiver, shared, Named, Provider, ProviderRef, Receiver, ReceiverRef, Steppable,
    SteppableRef,
};
pub use provider::{take_within, ProviderCore, Stock};
pub use queue::Queue;
pub use simple_delay::SimpleDelay;
pub use sink::Sink;
pub use source::{Source, PRODUCTION_RETRIES};
pub use transformer::Transformer;
