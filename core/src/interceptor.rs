//! # Interceptor: The Continuation Protocol
//!
//! Every stage of a pipeline obeys one three-step calling convention:
//!
//! ```text
//! Interceptor ──bind(ctx)──► Layer ──wrap(next)──► Handler ──call(msg)──► Handled
//! ```
//!
//! * **Context binding** happens once per pipeline.
//! * **Continuation binding** happens once per composition step.
//! * **Message handling** happens once per message.
//!
//! A handler decides whether and when to call its continuation (`next`). Zero
//! calls absorb the message; more than one call fans it out, each call being
//! independent and returning its own reply.

use crate::context::Context;
use crate::message::Message;
use crate::reply::{Handled, Reply};
use std::fmt;
use std::sync::Arc;

/// A message handler: a context- and continuation-bound interceptor, or the
/// terminal sink of a pipeline.
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(Message) -> Handled + Send + Sync>);

/// A continuation: "the rest of the pipeline" downstream of a stage.
pub type Next = Handler;

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Message) -> Handled + Send + Sync + 'static,
    {
        Handler(Arc::new(f))
    }

    /// A continuation that absorbs every message.
    pub fn noop() -> Self {
        Handler::new(|_| Ok(Reply::null()))
    }

    pub fn call(&self, message: Message) -> Handled {
        (self.0)(message)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

/// A context-bound interceptor, waiting for its continuation.
#[derive(Clone)]
pub struct Layer(Arc<dyn Fn(Next) -> Handler + Send + Sync>);

impl Layer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Next) -> Handler + Send + Sync + 'static,
    {
        Layer(Arc::new(f))
    }

    /// Bind the continuation, producing a message handler.
    pub fn wrap(&self, next: Next) -> Handler {
        (self.0)(next)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Layer")
    }
}

/// The basic composable unit.
///
/// Cloning an `Interceptor` shares the same underlying factory, so identity is
/// observable through [`Interceptor::ptr_eq`].
///
/// ## Example
///
/// ```rust
/// use plexus_core::{Context, Handler, Interceptor, Message, Reply};
///
/// let shout = Interceptor::from_fn(|_ctx, next, mut message: Message| {
///     message.kind = message.kind.to_uppercase();
///     next.call(message)
/// });
///
/// let sink = Handler::new(|message| Ok(Reply::value(message.kind)));
/// let handler = shout.wrap(&Context::detached(), sink);
/// let reply = handler.call(Message::new("hello")).unwrap();
/// assert_eq!(reply.as_value().and_then(|v| v.as_str()), Some("HELLO"));
/// ```
#[derive(Clone)]
pub struct Interceptor(Arc<dyn Fn(&Context) -> Layer + Send + Sync>);

impl Interceptor {
    /// Build an interceptor from its curried form.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Layer + Send + Sync + 'static,
    {
        Interceptor(Arc::new(f))
    }

    /// Build an interceptor from a per-message function that receives the
    /// bound context and continuation alongside the message.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Context, &Next, Message) -> Handled + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Interceptor::new(move |ctx| {
            let f = f.clone();
            let ctx = ctx.clone();
            Layer::new(move |next| {
                let f = f.clone();
                let ctx = ctx.clone();
                Handler::new(move |message| f(&ctx, &next, message))
            })
        })
    }

    /// Forwards every message unchanged to its continuation.
    pub fn identity() -> Self {
        Interceptor::new(|_| Layer::new(|next| next))
    }

    /// Bind the context.
    pub fn bind(&self, ctx: &Context) -> Layer {
        (self.0)(ctx)
    }

    /// Bind the context and the continuation in one go.
    pub fn wrap(&self, ctx: &Context, next: Next) -> Handler {
        self.bind(ctx).wrap(next)
    }

    /// Compose `self` in front of `next` (see [`chain`](crate::chain::chain)).
    pub fn then(self, next: Interceptor) -> Interceptor {
        crate::chain::chain([self, next])
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Interceptor")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo() -> Handler {
        Handler::new(|message| Ok(Reply::Value(message.payload)))
    }

    #[test]
    fn test_identity_forwards_unchanged() {
        let handler = Interceptor::identity().wrap(&Context::detached(), echo());
        let reply = handler.call(Message::new("a").with_payload("x")).unwrap();
        assert_eq!(reply.as_value(), Some(&json!("x")));
    }

    #[test]
    fn test_context_bound_once_per_pipeline() {
        let binds = Arc::new(AtomicUsize::new(0));
        let counter = binds.clone();
        let interceptor = Interceptor::new(move |_ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Layer::new(|next| next)
        });

        let layer = interceptor.bind(&Context::detached());
        let handler = layer.wrap(echo());
        for _ in 0..3 {
            handler.call(Message::new("a")).unwrap();
        }
        assert_eq!(binds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fan_out_calls_next_twice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let sink = Handler::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Reply::null())
        });
        let twice = Interceptor::from_fn(|_ctx, next, message| {
            next.call(message.clone())?;
            next.call(message)
        });
        twice
            .wrap(&Context::detached(), sink)
            .call(Message::new("a"))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clones_share_identity() {
        let interceptor = Interceptor::identity();
        assert!(interceptor.ptr_eq(&interceptor.clone()));
        assert!(!interceptor.ptr_eq(&Interceptor::identity()));
    }
}
