//! Branch - Decide what to do with the downstream reply.

use plexus_core::{Context, Handled, Interceptor, Reply, lift};

/// Call the downstream, then hand its reply and the context to `f`.
pub fn branch<F>(f: F) -> Interceptor
where
    F: Fn(Reply, &Context) -> Handled + Send + Sync + 'static,
{
    Interceptor::from_fn(move |ctx, next, message| {
        let reply = next.call(message)?;
        f(reply, ctx)
    })
}

/// [`lift`] a [`branch`]: the returned function places the branch in front of
/// any interceptor.
pub fn branch_from<F>(f: F) -> impl Fn(Interceptor) -> Interceptor + Clone + Send + Sync
where
    F: Fn(Reply, &Context) -> Handled + Send + Sync + 'static,
{
    lift(branch(f))
}
