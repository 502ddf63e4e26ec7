//! Request - Lifecycle messages around an asynchronous stage.
//!
//! The wrapped interceptor is lifted with [`as_promise`], so the request
//! settles when the wrapped stage reaches the downstream. Around it, the
//! configured [`RequestTypes`] are dispatched:
//!
//! * `requested` before the stage runs
//! * `fulfilled` once the downstream reply settles
//! * `failed` (flagged as an error, with the fault in `meta.error`) if the
//!   stage or the downstream faults
//!
//! Messages carrying one of the lifecycle tags pass straight through, so the
//! stage never sees what it dispatched itself.

use crate::config::RequestTypes;
use plexus_core::{Handler, Interceptor, Layer, Message, Reply};
use plexus_runtime::as_promise;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

/// Wrap `interceptor` in a request lifecycle. A failed request resolves to
/// `null` after dispatching its `failed` message.
pub fn request(interceptor: &Interceptor, types: RequestTypes) -> Interceptor {
    let lifted = as_promise(interceptor);
    let types = Arc::new(types);
    Interceptor::new(move |ctx| {
        let layer = lifted.bind(ctx);
        let ctx = ctx.clone();
        let types = types.clone();
        Layer::new(move |next| {
            let fulfill = layer.wrap(next.clone());
            let ctx = ctx.clone();
            let types = types.clone();
            Handler::new(move |message| {
                if types.is_lifecycle(&message.kind) {
                    return next.call(message);
                }
                let original = message.to_value();
                if let Some(requested) = &types.requested {
                    ctx.dispatch(Message::new(requested.as_str()).with_payload(original.clone()))?;
                }

                let reply = fulfill.call(message)?;
                let ctx = ctx.clone();
                let types = types.clone();
                Ok(Reply::deferred(async move {
                    match reply.settle(&ctx).await {
                        Ok(value) => {
                            if let Some(fulfilled) = &types.fulfilled {
                                ctx.dispatch(Message::new(fulfilled.as_str()).with_payload(original))?;
                            }
                            Ok(value)
                        }
                        Err(fault) => {
                            debug!(error = %fault, "request failed");
                            if let Some(failed) = &types.failed {
                                let report = Message::new(failed.as_str())
                                    .with_payload(original)
                                    .failed()
                                    .with_meta(json!({ "error": fault.to_string() }));
                                ctx.dispatch(report)?;
                            }
                            Ok(Value::Null)
                        }
                    }
                }))
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::fixtures::{echo, recorder};
    use plexus_core::Fault;

    #[tokio::test]
    async fn test_dispatches_requested_then_fulfilled() {
        let (store, ctx) = recorder(Value::Null);
        let handler = request(&Interceptor::identity(), RequestTypes::lifecycle("LOAD"))
            .wrap(&ctx, echo());

        let reply = handler.call(Message::new("LOAD").with_payload(7)).unwrap();
        assert_eq!(store.kinds(), vec!["LOAD_REQUESTED"]);
        assert_eq!(reply.settle(&ctx).await.unwrap(), json!(7));
        assert_eq!(store.kinds(), vec!["LOAD_REQUESTED", "LOAD_FULFILLED"]);
        assert_eq!(
            store.dispatched()[1].payload,
            json!({ "type": "LOAD", "payload": 7 })
        );
    }

    #[tokio::test]
    async fn test_dispatches_failed_on_fault() {
        let (store, ctx) = recorder(Value::Null);
        let failing = Interceptor::from_fn(|_ctx, _next, _message| Err(Fault::stage("offline")));
        let handler = request(&failing, RequestTypes::default().with_failed("LOAD_FAILED"))
            .wrap(&ctx, echo());

        let reply = handler.call(Message::new("LOAD")).unwrap();
        assert_eq!(reply.settle(&ctx).await.unwrap(), Value::Null);

        let dispatched = store.dispatched();
        assert_eq!(dispatched.len(), 1);
        assert!(dispatched[0].error);
        assert_eq!(
            dispatched[0].meta,
            Some(json!({ "error": "stage fault: offline" }))
        );
    }

    #[test]
    fn test_lifecycle_messages_pass_through() {
        let (store, ctx) = recorder(Value::Null);
        let handler = request(&Interceptor::identity(), RequestTypes::lifecycle("LOAD"))
            .wrap(&ctx, echo());
        let reply = handler
            .call(Message::new("LOAD_FULFILLED").with_payload("direct"))
            .unwrap();
        assert_eq!(reply.as_value(), Some(&json!("direct")));
        assert!(store.dispatched().is_empty());
    }
}
