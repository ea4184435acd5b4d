//! Kernel error type.
//!
//! Only *hard* failures live here: wiring mistakes, type mismatches, invalid
//! amounts, malformed configuration.  Routine negotiation outcomes (a receiver
//! declines, capacity is exhausted, `at_least` cannot be met) are reported as
//! `Ok(false)` / `Ok(None)` by the components themselves and never reach this
//! enum.

use thiserror::Error;

use crate::{ResourceType, SimTime};

/// The error type shared by every `rf-*` crate.
#[derive(Debug, Error, PartialEq)]
pub enum FlowError {
    #[error("invalid amount {0}: must be finite, non-negative and at most 2^53")]
    InvalidAmount(f64),

    #[error("amount {0} is not an integer")]
    NonIntegerAmount(f64),

    #[error("resource type mismatch: expected {expected}, found {found}")]
    UnequalType {
        expected: ResourceType,
        found:    ResourceType,
    },

    #[error("{receiver} does not accept resources of {found}")]
    UnexpectedType {
        receiver: String,
        found:    ResourceType,
    },

    #[error("entity '{0}' does not hold a composite payload")]
    NotComposite(String),

    #[error("cyclic offer detected while '{provider}' was offering")]
    CyclicOffer { provider: String },

    #[error("receiver '{receiver}' cannot take what '{provider}' provides")]
    IncompatibleReceiver {
        provider: String,
        receiver: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("time cannot move backwards from {now} to {requested}")]
    TimeReversal {
        now:       SimTime,
        requested: SimTime,
    },
}

/// Shorthand result type for all `rf-*` crates.
pub type FlowResult<T> = Result<T, FlowError>;
