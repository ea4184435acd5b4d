//! `rf-station` — bounded-concurrency building blocks composed from
//! `rf-flow` primitives.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`pool`]      | `Pool` — bounded shared counter, `PoolRef`                 |
//! | [`lock`]      | `Lock` / `Unlock` — entry and exit of a bounded section    |
//! | [`composite`] | `Macro` — named sub-network container                      |
//! | [`server`]    | `Server` — `Lock → Delay → Unlock` processing station      |
//!
//! # Quick-start
//!
//! ```rust
//! use rf_core::{Entity, FlowContext, Resource};
//! use rf_flow::{shared, Sink, Steppable};
//! use rf_station::{Pool, Server};
//!
//! let patient = Resource::from(Entity::typical("patient"));
//! let doctors = Pool::full("doctors", 2.0).unwrap().shared();
//! let server = Server::new("exam", &patient, doctors, 1.0, 3.0).unwrap();
//! let discharged = shared(Sink::new("discharged", &patient));
//! server.add_receiver(discharged.clone()).unwrap();
//!
//! let mut ctx = FlowContext::seeded(1);
//! let mut server = server;
//! server.step(&mut ctx).unwrap();
//! assert_eq!(discharged.borrow().received(), 0.0);
//! ```

pub mod composite;
pub mod lock;
pub mod pool;
pub mod server;

#[cfg(test)]
mod tests;

pub use composite::Macro;
pub use lock::{Lock, Unlock};
pub use pool::{Pool, PoolRef};
pub use server::Server;
