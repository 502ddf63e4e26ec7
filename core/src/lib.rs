//! # Plexus Core
//!
//! The interceptor protocol and the synchronous composition engine:
//!
//! * [`Interceptor`] / [`Layer`] / [`Handler`]: the three-step calling convention
//! * [`chain`]: ordered composition
//! * [`combine`]: tag-keyed routing
//! * [`Policy`]: control inversion over the continuation
//!
//! Asynchronous lifting lives in `plexus-runtime`.

pub mod cases;
pub mod chain;
pub mod context;
pub mod fault;
pub mod interceptor;
pub mod message;
pub mod policy;
pub mod reply;
pub mod telemetry;

pub use cases::{CaseTable, Cases, combine, combine_cases, run_cases};
pub use chain::{chain, lift};
pub use context::{Context, Store};
pub use fault::Fault;
pub use interceptor::{Handler, Interceptor, Layer, Next};
pub use message::Message;
pub use policy::{Downstream, Policy, Wrapped, policy};
pub use reply::{Deferred, Handled, Reply, Settled, Thunk};
pub use telemetry::traced;

pub mod prelude {
    pub use crate::cases::{Cases, combine, combine_cases};
    pub use crate::chain::{chain, lift};
    pub use crate::context::{Context, Store};
    pub use crate::fault::Fault;
    pub use crate::interceptor::{Handler, Interceptor, Layer, Next};
    pub use crate::message::Message;
    pub use crate::policy::{Downstream, Policy, Wrapped, policy};
    pub use crate::reply::{Handled, Reply};
}
