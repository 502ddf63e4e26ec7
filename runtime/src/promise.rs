//! # Promise: Asynchronous Lifting
//!
//! Lifting an interceptor makes every call through it return a
//! [`Reply::Deferred`] that settles with whatever the downstream continuation
//! returns, at the moment the continuation is actually invoked. The wrapped
//! interceptor's own return value is ignored, except that a fault it returns,
//! synchronously or through a deferred result, rejects the lifted call.
//!
//! Lifted calls are tracked in a [`PendingSet`], so a whole group of them can
//! be rejected at once with [`PromiseNext::abort`]. A call whose stage drops
//! its continuation without ever invoking it rejects with [`Fault::Dropped`]
//! and leaves the set.
//!
//! ```text
//! caller ──► lifted(stage) ──► stage ──(later)──► forward ──► next
//!   ▲                                               │
//!   └───────────── Deferred ◄──── ticket ◄──────────┘
//! ```

use crate::pending::{PendingSet, Ticket};
use futures_util::future::{self, Either};
use plexus_core::{
    Context, Deferred, Fault, Handled, Handler, Interceptor, Policy, Reply, Settled, chain,
    policy,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// The lifting policy, recording every call in `pending`.
pub fn promise_policy(pending: Arc<PendingSet>) -> Policy {
    policy(move |wrapped, downstream| {
        let (ticket, rx) = pending.open();
        let unsettled = Arc::new(Unsettled(ticket));

        let forward = {
            let unsettled = unsettled.clone();
            let next = downstream.handler();
            Handler::new(move |message| {
                let result = next.call(message);
                unsettled.0.settle(result.clone());
                result
            })
        };

        let watched = match wrapped.run(forward) {
            Err(fault) => {
                unsettled.0.settle(Err(fault));
                None
            }
            Ok(Reply::Deferred(deferred)) => watch(&unsettled, deferred),
            Ok(_) => None,
        };

        Ok(Reply::deferred(resolve(
            wrapped.context().clone(),
            rx,
            watched,
        )))
    })
}

/// Rejects its call with [`Fault::Dropped`] once nothing is left that could
/// still settle it: every copy of the forward continuation is gone and no
/// returned deferred result is being watched.
struct Unsettled(Ticket);

impl Drop for Unsettled {
    fn drop(&mut self) {
        if self.0.settle(Err(Fault::Dropped)) {
            trace!(id = %self.0.id(), "continuation dropped before settling");
        }
    }
}

/// A deferred result handed back for [`resolve`] to drive, together with the
/// handle that keeps its call open until it completes.
type Watched = (Deferred, Arc<Unsettled>);

/// Drive a deferred result returned by the wrapped interceptor so that its
/// fault, if any, rejects the lifted call. Inside a tokio runtime this happens
/// eagerly on a spawned task; otherwise the deferred result is handed back and
/// raced against the ticket when the lifted call is awaited.
fn watch(unsettled: &Arc<Unsettled>, deferred: Deferred) -> Option<Watched> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let unsettled = unsettled.clone();
            handle.spawn(async move {
                if let Err(fault) = deferred.await {
                    unsettled.0.settle(Err(fault));
                }
            });
            None
        }
        Err(_) => Some((deferred, unsettled.clone())),
    }
}

async fn resolve(
    ctx: Context,
    rx: oneshot::Receiver<Handled>,
    watched: Option<Watched>,
) -> Settled {
    let received = match watched {
        None => rx.await,
        Some((deferred, unsettled)) => match future::select(rx, deferred).await {
            Either::Left((received, _)) => received,
            Either::Right((Err(fault), _)) => {
                unsettled.0.settle(Err(fault.clone()));
                return Err(fault);
            }
            Either::Right((Ok(_), rx)) => {
                drop(unsettled);
                rx.await
            }
        },
    };

    match received {
        Ok(Ok(reply)) => reply.settle(&ctx).await,
        Ok(Err(fault)) => Err(fault),
        Err(_) => Err(Fault::Dropped),
    }
}

/// Lift one interceptor, recording its calls in `pending`.
pub fn lift_with(pending: &Arc<PendingSet>, interceptor: &Interceptor) -> Interceptor {
    promise_policy(pending.clone()).apply(interceptor)
}

/// Lift a single interceptor with a pending set of its own.
pub fn as_promise(interceptor: &Interceptor) -> Interceptor {
    lift_with(&PendingSet::new(), interceptor)
}

/// A lifted chain together with the pending set shared by all of its stages.
#[derive(Clone, Debug)]
pub struct PromiseNext {
    interceptor: Interceptor,
    pending: Arc<PendingSet>,
}

/// Lift every interceptor and chain the results. An empty list lifts the
/// identity interceptor.
///
/// ```rust
/// use plexus_core::{Context, Handler, Interceptor, Message, Reply};
/// use plexus_runtime::promise_next;
///
/// let lifted = promise_next([Interceptor::identity()]);
/// let sink = Handler::new(|message| Ok(Reply::value(message.kind)));
/// let reply = lifted
///     .interceptor()
///     .wrap(&Context::detached(), sink)
///     .call(Message::new("ping"))
///     .unwrap();
/// assert!(reply.is_deferred());
/// ```
pub fn promise_next<I>(interceptors: I) -> PromiseNext
where
    I: IntoIterator<Item = Interceptor>,
{
    let pending = PendingSet::new();
    let mut stages: Vec<Interceptor> = interceptors.into_iter().collect();
    if stages.is_empty() {
        stages.push(Interceptor::identity());
    }
    trace!(stages = stages.len(), "lifting interceptors");
    let interceptor = chain(stages.iter().map(|stage| lift_with(&pending, stage)));
    PromiseNext {
        interceptor,
        pending,
    }
}

impl PromiseNext {
    pub fn interceptor(&self) -> Interceptor {
        self.interceptor.clone()
    }

    pub fn pending(&self) -> &Arc<PendingSet> {
        &self.pending
    }

    /// Reject every call still pending in this lift. Returns how many were rejected.
    pub fn abort(&self) -> usize {
        self.pending.abort()
    }

    /// An interceptor that aborts this lift's pending calls whenever it handles
    /// a message. The message is absorbed; the reply is the number of calls
    /// that were rejected.
    pub fn abort_interceptor(&self) -> Interceptor {
        let pending = self.pending.clone();
        Interceptor::from_fn(move |_ctx, _next, message| {
            let aborted = pending.abort();
            debug!(kind = %message.kind, aborted, "abort handled");
            Ok(Reply::value(aborted))
        })
    }
}

impl From<PromiseNext> for Interceptor {
    fn from(lifted: PromiseNext) -> Self {
        lifted.interceptor
    }
}
