//! Chain - Ordered composition of interceptors.
//!
//! `chain([a, b, c])` behaves as one interceptor in which `a` sees the message
//! first, `a`'s continuation is `b`, `b`'s continuation is `c`, and `c`'s
//! continuation is whatever the chain itself is bound to.

use crate::interceptor::{Interceptor, Layer};
use tracing::trace;

/// Compose interceptors into one, preserving call order.
///
/// * Zero interceptors yield the identity interceptor.
/// * One interceptor is returned as is, so re-composition is a no-op.
/// * Otherwise every interceptor is bound to the context once, in the order
///   supplied, and continuations are threaded from last to first.
pub fn chain<I>(interceptors: I) -> Interceptor
where
    I: IntoIterator<Item = Interceptor>,
{
    let mut interceptors: Vec<Interceptor> = interceptors.into_iter().collect();
    if interceptors.len() <= 1 {
        return interceptors.pop().unwrap_or_else(Interceptor::identity);
    }

    Interceptor::new(move |ctx| {
        let layers: Vec<Layer> = interceptors.iter().map(|i| i.bind(ctx)).collect();
        trace!(stages = layers.len(), "chain bound to context");
        Layer::new(move |next| {
            layers
                .iter()
                .rev()
                .fold(next, |next, layer| layer.wrap(next))
        })
    })
}

/// Returns a function that places `head` in front of any interceptor it is given.
pub fn lift(head: Interceptor) -> impl Fn(Interceptor) -> Interceptor + Clone + Send + Sync {
    move |tail| chain([head.clone(), tail])
}
