//! Capture - Absorb or redispatch messages selected by a state predicate.

use plexus_core::{Interceptor, Message, Reply};
use serde_json::Value;
use std::sync::Arc;

/// Absorb every message for which `should_capture(state, message)` holds;
/// forward the rest.
pub fn capture<P>(should_capture: P) -> Interceptor
where
    P: Fn(&Value, &Message) -> bool + Send + Sync + 'static,
{
    Interceptor::from_fn(move |ctx, next, message| {
        if should_capture(&ctx.state(), &message) {
            return Ok(Reply::null());
        }
        next.call(message)
    })
}

/// Like [`capture`], but a captured message is replaced by
/// `redispatch(state, message)`, dispatched from the top of the pipeline. The
/// reply is whatever that dispatch returns.
pub fn capture_with<P, R>(should_capture: P, redispatch: R) -> Interceptor
where
    P: Fn(&Value, &Message) -> bool + Send + Sync + 'static,
    R: Fn(&Value, &Message) -> Message + Send + Sync + 'static,
{
    let redispatch = Arc::new(redispatch);
    Interceptor::from_fn(move |ctx, next, message| {
        let state = ctx.state();
        if should_capture(&state, &message) {
            return ctx.dispatch(redispatch(&state, &message));
        }
        next.call(message)
    })
}
