//! # Telemetry: Observability Decorators
//!
//! [`traced`] wraps any interceptor so that each message it handles runs inside
//! a tracing span, with the reply variant and elapsed time recorded on exit.

use crate::interceptor::{Handler, Interceptor, Layer};
use crate::reply::Reply;
use std::sync::Arc;
use tracing::info_span;

/// Decorate `interceptor` with a per-message span named after `name`.
///
/// The span only covers the synchronous part of the call. A deferred reply is
/// logged when it is handed back, not when it settles.
pub fn traced(name: impl Into<String>, interceptor: Interceptor) -> Interceptor {
    let name: Arc<str> = Arc::from(name.into());
    Interceptor::new(move |ctx| {
        let layer = interceptor.bind(ctx);
        let name = name.clone();
        Layer::new(move |next| {
            let handler = layer.wrap(next);
            let name = name.clone();
            Handler::new(move |message| {
                let span = info_span!(
                    "Interceptor",
                    plexus.interceptor = %name,
                    plexus.message = %message.kind
                );
                let _entered = span.enter();

                tracing::debug!(?message, "Entering interceptor");
                let start = std::time::Instant::now();

                let result = handler.call(message);

                let duration = start.elapsed();
                match &result {
                    Ok(Reply::Value(value)) => {
                        tracing::info!(?value, ?duration, "Interceptor completed: Value");
                    }
                    Ok(Reply::Deferred(deferred)) => {
                        tracing::info!(?deferred, ?duration, "Interceptor completed: Deferred");
                    }
                    Ok(Reply::Thunk(_)) => {
                        tracing::info!(?duration, "Interceptor completed: Thunk");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, ?duration, "Interceptor failed");
                    }
                }
                result
            })
        })
    })
}
