//! Context - The host's capabilities, shared by every interceptor.
//!
//! A pipeline is instantiated over a host state container. The host exposes two
//! capabilities and nothing else:
//!
//! * `dispatch`: submit a new message at the pipeline's outermost entry point
//! * `state`: read the current state, synchronously and without side effects
//!
//! The context is handed to every interceptor exactly once, when the pipeline is
//! built, and no interceptor may replace it.

use crate::fault::Fault;
use crate::message::Message;
use crate::reply::Handled;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A host state container.
///
/// `dispatch` may be called from inside an interceptor that is still running,
/// which re-enters the same pipeline. Implementations must not hold locks across
/// the pipeline call.
pub trait Store: Send + Sync + 'static {
    /// Submit a message at the outermost entry point of the pipeline.
    fn dispatch(&self, message: Message) -> Handled;

    /// Read the current state.
    fn state(&self) -> Value;
}

/// Shared, cheaply clonable handle to the host.
#[derive(Clone)]
pub struct Context {
    store: Arc<dyn Store>,
}

impl Context {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn from_store<S: Store>(store: S) -> Self {
        Self::new(Arc::new(store))
    }

    /// A context with no host behind it: state reads as `null`, dispatching is
    /// a contract violation. Useful for wiring pipelines that never redispatch.
    pub fn detached() -> Self {
        Self::from_store(Detached)
    }

    pub fn dispatch(&self, message: Message) -> Handled {
        self.store.dispatch(message)
    }

    pub fn state(&self) -> Value {
        self.store.state()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

struct Detached;

impl Store for Detached {
    fn dispatch(&self, message: Message) -> Handled {
        Err(Fault::contract(format!(
            "cannot dispatch `{}` on a detached context",
            message.kind
        )))
    }

    fn state(&self) -> Value {
        Value::Null
    }
}
