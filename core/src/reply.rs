//! Reply - What a handler hands back to its caller.
//!
//! Every handler returns [`Handled`], i.e. `Result<Reply, Fault>`. The variant is
//! chosen by the interceptor's author when the reply is built; consumers resolve
//! it by matching, never by inspecting the value at runtime.
//!
//! * [`Reply::Value`]: a plain, already available value
//! * [`Reply::Deferred`]: a value that settles later
//! * [`Reply::Thunk`]: a computation to run against the pipeline's [`Context`]

use crate::context::Context;
use crate::fault::Fault;
use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

/// The result of running a handler.
pub type Handled = Result<Reply, Fault>;

/// The final value of a settled reply.
pub type Settled = Result<Value, Fault>;

/// A deferred result.
///
/// Cloning a `Deferred` yields another handle to the same underlying
/// computation; every clone observes the same settled value.
#[derive(Clone)]
pub struct Deferred(Shared<BoxFuture<'static, Settled>>);

impl Deferred {
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Settled> + Send + 'static,
    {
        Deferred(fut.boxed().shared())
    }

    /// A deferred result that is already settled.
    pub fn settled(value: Settled) -> Self {
        Self::new(future::ready(value))
    }

    /// The settled value, if the computation already completed.
    pub fn peek(&self) -> Option<&Settled> {
        self.0.peek()
    }

    pub fn is_settled(&self) -> bool {
        self.peek().is_some()
    }
}

impl Future for Deferred {
    type Output = Settled;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        self.0.poll_unpin(cx)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// A computation that needs the pipeline's context to run.
#[derive(Clone)]
pub struct Thunk(Arc<dyn Fn(&Context) -> Handled + Send + Sync>);

impl Thunk {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Handled + Send + Sync + 'static,
    {
        Thunk(Arc::new(f))
    }

    pub fn run(&self, ctx: &Context) -> Handled {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk")
    }
}

/// The tagged return value of every handler.
#[derive(Clone, Debug)]
pub enum Reply {
    Value(Value),
    Deferred(Deferred),
    Thunk(Thunk),
}

impl Reply {
    /// The reply of a handler that absorbed its message.
    pub fn null() -> Self {
        Reply::Value(Value::Null)
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Reply::Value(value.into())
    }

    pub fn deferred<F>(fut: F) -> Self
    where
        F: Future<Output = Settled> + Send + 'static,
    {
        Reply::Deferred(Deferred::new(fut))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Reply::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Reply::Deferred(_))
    }

    /// Resolve this reply to its final value.
    ///
    /// Thunks run against `ctx` immediately; deferred results are awaited by
    /// the returned future.
    pub fn settle(self, ctx: &Context) -> BoxFuture<'static, Settled> {
        match self {
            Reply::Value(value) => future::ready(Ok(value)).boxed(),
            Reply::Deferred(deferred) => deferred.boxed(),
            Reply::Thunk(thunk) => match thunk.run(ctx) {
                Ok(reply) => reply.settle(ctx),
                Err(fault) => future::ready(Err(fault)).boxed(),
            },
        }
    }

    /// Continue with the settled value.
    ///
    /// Plain values (and thunks, once run) call `f` right away; a deferred reply
    /// yields a new deferred reply that calls `f` after settlement.
    pub fn then<F>(self, ctx: &Context, f: F) -> Handled
    where
        F: FnOnce(Value) -> Handled + Send + 'static,
    {
        match self {
            Reply::Value(value) => f(value),
            Reply::Thunk(thunk) => thunk.run(ctx)?.then(ctx, f),
            Reply::Deferred(deferred) => {
                let ctx = ctx.clone();
                Ok(Reply::deferred(async move {
                    let value = deferred.await?;
                    f(value)?.settle(&ctx).await
                }))
            }
        }
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Value(value)
    }
}

impl From<Deferred> for Reply {
    fn from(deferred: Deferred) -> Self {
        Reply::Deferred(deferred)
    }
}
