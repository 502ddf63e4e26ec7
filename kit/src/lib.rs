//! Plexus facade crate.
//!
//! This crate re-exports the core, runtime and std crates with a single entry point.
//!
//! ```rust
//! use plexus::prelude::*;
//! use serde_json::json;
//!
//! let pipeline = chain([
//!     scope(|message, _state| Some(message.clone().with_payload(json!("scoped")))),
//!     Interceptor::identity(),
//! ]);
//! let sink = Handler::new(|message| Ok(Reply::Value(message.payload)));
//! let reply = pipeline
//!     .wrap(&Context::detached(), sink)
//!     .call(Message::new("x"))
//!     .unwrap();
//! assert_eq!(reply.as_value(), Some(&json!("scoped")));
//! ```

pub use plexus_core as core;
pub use plexus_runtime as runtime;
#[cfg(feature = "std")]
pub use plexus_std as std;

pub use plexus_core::{
    CaseTable, Cases, Context, Deferred, Fault, Handled, Handler, Interceptor, Layer, Message,
    Next, Policy, Reply, Store, Thunk, chain, combine, lift, policy, traced,
};
pub use plexus_runtime::{PromiseNext, as_promise, promise_next};

pub mod prelude {
    pub use plexus_core::prelude::*;
    pub use plexus_runtime::prelude::*;
    #[cfg(feature = "std")]
    pub use plexus_std::prelude::*;
}
