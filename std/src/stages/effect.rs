//! Effect - Forward first, then produce a reply from the message and the
//! state the downstream left behind.

use plexus_core::{Handled, Interceptor, Message};
use serde_json::Value;

pub fn effect<F>(f: F) -> Interceptor
where
    F: Fn(&Message, &Value) -> Handled + Send + Sync + 'static,
{
    Interceptor::from_fn(move |ctx, next, message| {
        next.call(message.clone())?;
        f(&message, &ctx.state())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::fixtures::recorder;
    use plexus_core::{Fault, Handler, Reply};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_runs_after_next_and_returns_its_own_reply() {
        let (_store, ctx) = recorder(json!({ "count": 2 }));
        let reached = Arc::new(AtomicBool::new(false));
        let flag = reached.clone();
        let sink = Handler::new(move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(Reply::value("downstream"))
        });

        let observed = reached.clone();
        let handler = effect(move |message, state| {
            assert!(observed.load(Ordering::SeqCst));
            Ok(Reply::value(format!("{}:{}", message.kind, state["count"])))
        })
        .wrap(&ctx, sink);

        let reply = handler.call(Message::new("TICK")).unwrap();
        assert_eq!(reply.as_value(), Some(&json!("TICK:2")));
    }

    #[test]
    fn test_downstream_fault_skips_effect() {
        let (_store, ctx) = recorder(Value::Null);
        let sink = Handler::new(|_| Err(Fault::stage("downstream")));
        let handler = effect(|_, _| panic!("effect must not run")).wrap(&ctx, sink);
        assert!(matches!(handler.call(Message::new("x")), Err(Fault::Stage(_))));
    }
}
