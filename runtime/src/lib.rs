//! # Plexus Runtime
//!
//! Asynchronous lifting for Plexus interceptors: [`promise_next`] and
//! [`as_promise`] turn interceptors into stages whose replies settle when the
//! downstream continuation is reached, tracked in a [`PendingSet`] that can be
//! aborted as a whole.

pub mod pending;
pub mod promise;

pub mod prelude {
    pub use crate::pending::{PendingSet, Ticket};
    pub use crate::promise::{PromiseNext, as_promise, promise_next};
}

pub use pending::{PendingSet, Ticket};
pub use promise::{PromiseNext, as_promise, lift_with, promise_next, promise_policy};
