//! # Policy: Control Inversion
//!
//! A [`Policy`] wraps an interceptor and takes over every decision the
//! interceptor would normally make about its continuation. Per message, the
//! policy function receives:
//!
//! * [`Wrapped`]: the wrapped interceptor, already bound to the context. Give
//!   it a continuation of your choosing and run it, with the original message
//!   or a replacement.
//! * [`Downstream`]: the real continuation, pre-bound to the current message.
//!
//! Whatever the policy function returns is what the composed call returns.
//!
//! ```rust
//! use plexus_core::{Context, Handler, Interceptor, Message, Reply, policy};
//!
//! // Run the wrapped interceptor, but always answer with the downstream result.
//! let downstream_wins = policy(|wrapped, downstream| {
//!     wrapped.run(Handler::noop())?;
//!     downstream.call()
//! });
//!
//! let absorb = Interceptor::from_fn(|_ctx, _next, _message| Ok(Reply::value("absorbed")));
//! let sink = Handler::new(|message| Ok(Reply::value(message.kind)));
//! let reply = downstream_wins
//!     .apply(&absorb)
//!     .wrap(&Context::detached(), sink)
//!     .call(Message::new("ping"))
//!     .unwrap();
//! assert_eq!(reply.as_value().and_then(|v| v.as_str()), Some("ping"));
//! ```

use crate::context::Context;
use crate::interceptor::{Handler, Interceptor, Layer, Next};
use crate::message::Message;
use crate::reply::{Handled, Reply};
use std::fmt;
use std::sync::Arc;

/// The wrapped interceptor for one message, bound to the pipeline context and
/// waiting for a continuation.
#[derive(Clone)]
pub struct Wrapped {
    layer: Layer,
    message: Message,
    ctx: Context,
}

impl Wrapped {
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The message the composed interceptor was called with.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Bind the wrapped interceptor to `next`.
    pub fn with(&self, next: Next) -> Handler {
        self.layer.wrap(next)
    }

    /// Run the wrapped interceptor on the original message.
    pub fn run(&self, next: Next) -> Handled {
        self.with(next).call(self.message.clone())
    }

    /// Run the wrapped interceptor on a replacement message.
    pub fn run_with(&self, next: Next, message: Message) -> Handled {
        self.with(next).call(message)
    }
}

impl fmt::Debug for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// The real continuation, bound to the current message.
#[derive(Clone)]
pub struct Downstream {
    next: Next,
    message: Message,
}

impl Downstream {
    pub fn new(next: Next, message: Message) -> Self {
        Self { next, message }
    }

    /// Forward the original message.
    pub fn call(&self) -> Handled {
        self.next.call(self.message.clone())
    }

    /// Forward a replacement message.
    pub fn call_with(&self, message: Message) -> Handled {
        self.next.call(message)
    }

    /// The unbound continuation.
    pub fn handler(&self) -> Handler {
        self.next.clone()
    }

    pub fn message(&self) -> &Message {
        &self.message
    }
}

impl fmt::Debug for Downstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downstream")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// A per-message control function, applicable to any interceptor.
#[derive(Clone)]
pub struct Policy(Arc<dyn Fn(Wrapped, Downstream) -> Handled + Send + Sync>);

/// Build a policy from its control function.
pub fn policy<F>(f: F) -> Policy
where
    F: Fn(Wrapped, Downstream) -> Handled + Send + Sync + 'static,
{
    Policy(Arc::new(f))
}

impl Policy {
    /// Wrap `interceptor` so that every control decision goes through this policy.
    pub fn apply(&self, interceptor: &Interceptor) -> Interceptor {
        let f = self.0.clone();
        let interceptor = interceptor.clone();
        Interceptor::new(move |ctx| {
            let layer = interceptor.bind(ctx);
            let ctx = ctx.clone();
            let f = f.clone();
            Layer::new(move |next| {
                let layer = layer.clone();
                let ctx = ctx.clone();
                let f = f.clone();
                Handler::new(move |message| {
                    let wrapped = Wrapped {
                        layer: layer.clone(),
                        message: message.clone(),
                        ctx: ctx.clone(),
                    };
                    f(wrapped, Downstream::new(next.clone(), message))
                })
            })
        })
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Policy")
    }
}

/// Behaves exactly like the wrapped interceptor.
pub fn pass() -> Policy {
    policy(|wrapped, downstream| wrapped.run(downstream.handler()))
}

/// Runs the wrapped interceptor with a continuation that absorbs everything.
pub fn clip() -> Policy {
    policy(|wrapped, _downstream| wrapped.run(Handler::noop()))
}

/// Runs the wrapped interceptor, but whatever it forwards, the downstream
/// receives the original message.
pub fn noscope() -> Policy {
    policy(|wrapped, downstream| {
        let original = Handler::new(move |_| downstream.call());
        wrapped.run(original)
    })
}

/// Runs the wrapped interceptor first, on its own, then the downstream once
/// the wrapped result has settled. Returns the downstream result.
pub fn before() -> Policy {
    policy(|wrapped, downstream| {
        let ctx = wrapped.context().clone();
        wrapped
            .run(Handler::noop())?
            .then(&ctx, move |_| downstream.call())
    })
}

/// Runs the downstream first, then the wrapped interceptor on its own once the
/// downstream result has settled. Returns the downstream result.
pub fn after() -> Policy {
    policy(|wrapped, downstream| {
        let ctx = wrapped.context().clone();
        downstream.call()?.then(&ctx, move |value| {
            let ctx = wrapped.context().clone();
            wrapped
                .run(Handler::noop())?
                .then(&ctx, move |_| Ok(Reply::Value(value)))
        })
    })
}
