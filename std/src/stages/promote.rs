//! Promote - Turn a message into something to dispatch.
//!
//! A promoter looks at each message and returns a [`Promoted`] value: another
//! message to dispatch, a thunk to run against the context, a future that
//! yields one of those later, or nothing at all. The promoter also receives the
//! real continuation bound to the message ([`Downstream`]) and decides when the
//! message continues down the pipeline.
//!
//! [`promote`] is the common case: the message is forwarded first and the
//! promoter only decides what to dispatch afterwards.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use plexus_core::{Context, Downstream, Fault, Handled, Interceptor, Message, Reply, Thunk};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// What a promoter wants dispatched.
pub enum Promoted {
    Message(Message),
    Thunk(Thunk),
    Deferred(BoxFuture<'static, Result<Promoted, Fault>>),
    Skip,
}

impl Promoted {
    pub fn deferred<F>(fut: F) -> Self
    where
        F: Future<Output = Result<Promoted, Fault>> + Send + 'static,
    {
        Promoted::Deferred(fut.boxed())
    }
}

impl From<Message> for Promoted {
    fn from(message: Message) -> Self {
        Promoted::Message(message)
    }
}

impl From<Thunk> for Promoted {
    fn from(thunk: Thunk) -> Self {
        Promoted::Thunk(thunk)
    }
}

impl From<Option<Message>> for Promoted {
    fn from(message: Option<Message>) -> Self {
        message.map_or(Promoted::Skip, Promoted::Message)
    }
}

impl fmt::Debug for Promoted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Promoted::Message(message) => f.debug_tuple("Message").field(message).finish(),
            Promoted::Thunk(thunk) => f.debug_tuple("Thunk").field(thunk).finish(),
            Promoted::Deferred(_) => f.write_str("Deferred"),
            Promoted::Skip => f.write_str("Skip"),
        }
    }
}

/// Dispatch a promoted value. Messages go through `ctx.dispatch`, thunks run
/// against `ctx`, deferred values are awaited first.
pub fn dispatch_promoted(ctx: &Context, promoted: Promoted) -> Handled {
    match promoted {
        Promoted::Message(message) => ctx.dispatch(message),
        Promoted::Thunk(thunk) => thunk.run(ctx),
        Promoted::Deferred(fut) => {
            let ctx = ctx.clone();
            Ok(Reply::deferred(async move {
                let promoted = fut.await?;
                dispatch_promoted(&ctx, promoted)?.settle(&ctx).await
            }))
        }
        Promoted::Skip => Ok(Reply::null()),
    }
}

/// Promote with full control over the continuation. The reply is whatever the
/// promoted dispatch returns.
pub fn promote_with<P>(promoter: P) -> Interceptor
where
    P: Fn(&Message, Downstream) -> Result<Promoted, Fault> + Send + Sync + 'static,
{
    Interceptor::from_fn(move |ctx, next, message| {
        let done = Downstream::new(next.clone(), message.clone());
        let promoted = promoter(&message, done)?;
        dispatch_promoted(ctx, promoted)
    })
}

/// Forward the message, then promote it.
pub fn promote<F>(promoter: F) -> Interceptor
where
    F: Fn(&Message) -> Result<Promoted, Fault> + Send + Sync + 'static,
{
    promote_with(resolve_before_dispatch(promoter))
}

/// Adapt a promoter so the message is forwarded before the promoter runs. A
/// deferred downstream reply is awaited first.
pub fn resolve_before_dispatch<F>(
    promoter: F,
) -> impl Fn(&Message, Downstream) -> Result<Promoted, Fault> + Send + Sync + 'static
where
    F: Fn(&Message) -> Result<Promoted, Fault> + Send + Sync + 'static,
{
    let promoter = Arc::new(promoter);
    move |message: &Message, done: Downstream| match done.call()? {
        Reply::Deferred(deferred) => {
            let promoter = promoter.clone();
            let message = message.clone();
            Ok(Promoted::deferred(async move {
                deferred.await?;
                promoter(&message)
            }))
        }
        _ => promoter(message),
    }
}

/// Adapt a promoter so the message is forwarded only once the promoted
/// dispatch has settled. A skipped promotion forwards right away.
pub fn resolve_after_dispatch<F>(
    promoter: F,
) -> impl Fn(&Message, Downstream) -> Result<Promoted, Fault> + Send + Sync + 'static
where
    F: Fn(&Message) -> Result<Promoted, Fault> + Send + Sync + 'static,
{
    move |message: &Message, done: Downstream| after_dispatch(promoter(message)?, done)
}

fn after_dispatch(promoted: Promoted, done: Downstream) -> Result<Promoted, Fault> {
    match promoted {
        Promoted::Skip => {
            done.call()?;
            Ok(Promoted::Skip)
        }
        Promoted::Deferred(fut) => Ok(Promoted::deferred(async move {
            after_dispatch(fut.await?, done)
        })),
        Promoted::Message(message) => Ok(then_done(move |ctx| ctx.dispatch(message.clone()), done)),
        Promoted::Thunk(thunk) => Ok(then_done(move |ctx| thunk.run(ctx), done)),
    }
}

fn then_done<F>(dispatch: F, done: Downstream) -> Promoted
where
    F: Fn(&Context) -> Handled + Send + Sync + 'static,
{
    Promoted::Thunk(Thunk::new(move |ctx| {
        let done = done.clone();
        dispatch(ctx)?.then(ctx, move |value| {
            done.call()?;
            Ok(Reply::Value(value))
        })
    }))
}
