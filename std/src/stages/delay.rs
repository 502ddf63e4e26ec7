//! Delay - Hand the message to the downstream after a fixed pause.

use plexus_core::{Fault, Interceptor, Reply};
use std::time::Duration;

/// Forward every message after `duration`, on a task of the current tokio
/// runtime. The reply is deferred until the downstream reply settles.
pub fn delay(duration: Duration) -> Interceptor {
    Interceptor::from_fn(move |ctx, next, message| {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| Fault::contract("`delay` requires a tokio runtime"))?;
        let next = next.clone();
        let ctx = ctx.clone();
        let task = handle.spawn(async move {
            tokio::time::sleep(duration).await;
            next.call(message)?.settle(&ctx).await
        });
        Ok(Reply::deferred(async move {
            task.await
                .map_err(|e| Fault::stage(format!("delayed stage did not complete: {e}")))?
        }))
    })
}
