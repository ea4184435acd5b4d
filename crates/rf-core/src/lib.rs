//! `rf-core` — foundational types for the `rust_flow` resource-flow kernel.
//!
//! This crate is a dependency of every other `rf-*` crate.  It has no `rf-*`
//! dependencies and only a few external ones (`rand`, `rand_distr`,
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`ids`]       | `ResourceType`, `EntityId` (process-wide counters)        |
//! | [`resource`]  | `CountableResource`, `Entity`, `Resource`                 |
//! | [`time`]      | `Tick`, `SimTime`, `FlowConfig`                           |
//! | [`context`]   | `FlowContext` — current time + shared RNG                 |
//! | [`rng`]       | `SimRng`                                                  |
//! | [`sample`]    | `Sampler`, `Constant`, `Criterion`, `Gate`                |
//! | [`error`]     | `FlowError`, `FlowResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, time and config.    |

pub mod context;
pub mod error;
pub mod ids;
pub mod resource;
pub mod rng;
pub mod sample;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use context::FlowContext;
pub use error::{FlowError, FlowResult};
pub use ids::{EntityId, ResourceType};
pub use resource::{check_amount, CountableResource, Entity, Resource, MAX_AMOUNT};
pub use rng::SimRng;
pub use sample::{Constant, Criterion, Gate, Sampler};
pub use time::{FlowConfig, SimTime, Tick};
