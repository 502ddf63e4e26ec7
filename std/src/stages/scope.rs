//! Scope - Rewrite the message seen by the rest of the pipeline.

use plexus_core::{Interceptor, Message};
use serde_json::Value;

/// Forward `f(message, state)`, or the original message when `f` returns `None`.
pub fn scope<F>(f: F) -> Interceptor
where
    F: Fn(&Message, &Value) -> Option<Message> + Send + Sync + 'static,
{
    Interceptor::from_fn(move |ctx, next, message| {
        let scoped = f(&message, &ctx.state()).unwrap_or(message);
        next.call(scoped)
    })
}
