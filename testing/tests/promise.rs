use futures_util::FutureExt;
use plexus_core::{Cases, Fault, Interceptor, Message, Reply, chain, combine};
use plexus_runtime::{as_promise, promise_next};
use plexus_std::delay;
use plexus_test::{TestStore, append_payload, reducers};
use serde_json::{Value, json};
use std::time::Duration;

fn expect_deferred(reply: Reply) -> plexus_core::Deferred {
    match reply {
        Reply::Deferred(deferred) => deferred,
        other => panic!("expected a deferred reply, got {other:?}"),
    }
}

#[test]
fn test_resolves_synchronously_without_asynchronous_stages() {
    let lifted: Interceptor = promise_next([]).into();
    let store = TestStore::new(reducers::message, Value::Null, &lifted);
    let message = Message::new("Foo").with_payload("Bar");

    let deferred = expect_deferred(store.dispatch(message.clone()).unwrap());
    assert_eq!(store.state(), message.to_value());
    assert_eq!(deferred.now_or_never().unwrap().unwrap(), message.to_value());
}

#[test]
fn test_calls_lifted_stages_in_order() {
    let lifted = promise_next([append_payload("1"), append_payload("2"), append_payload("3")]);
    let store = TestStore::new(reducers::payload, Value::Null, &lifted.interceptor());

    expect_deferred(store.dispatch(Message::new("x").with_payload("0")).unwrap())
        .now_or_never()
        .unwrap()
        .unwrap();
    assert_eq!(store.state(), json!("0123"));

    expect_deferred(store.dispatch(Message::new("x").with_payload("!")).unwrap())
        .now_or_never()
        .unwrap()
        .unwrap();
    assert_eq!(store.state(), json!("!123"));
}

#[tokio::test]
async fn test_state_changes_only_after_timeout() {
    let lifted = promise_next([delay(Duration::from_millis(20))]);
    let store = TestStore::new(reducers::message, Value::Null, &lifted.interceptor());
    let message = Message::new("Foo").with_payload("Bar");

    let deferred = expect_deferred(store.dispatch(message.clone()).unwrap());
    assert_ne!(store.state(), message.to_value());

    deferred.await.unwrap();
    assert_eq!(store.state(), message.to_value());
}

#[tokio::test]
async fn test_multiple_timeouts() {
    let lifted = promise_next([
        delay(Duration::from_millis(10)),
        delay(Duration::from_millis(10)),
    ]);
    let store = TestStore::new(reducers::payload, Value::Null, &lifted.interceptor());
    let deferred = expect_deferred(store.dispatch(Message::new("x").with_payload("Bar")).unwrap());
    assert_eq!(store.state(), Value::Null);
    deferred.await.unwrap();
    assert_eq!(store.state(), json!("Bar"));
}

#[tokio::test]
async fn test_can_be_nested() {
    let inner: Interceptor = promise_next([delay(Duration::from_millis(10))]).into();
    let outer = promise_next([inner]);
    let store = TestStore::new(reducers::payload, Value::Null, &outer.interceptor());
    let deferred = expect_deferred(store.dispatch(Message::new("x").with_payload("deep")).unwrap());
    assert_eq!(store.state(), Value::Null);
    deferred.await.unwrap();
    assert_eq!(store.state(), json!("deep"));
}

#[tokio::test]
async fn test_nested_faults_reach_the_outermost_caller() {
    let failing = Interceptor::from_fn(|_ctx, _next, _message| {
        Ok(Reply::deferred(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(Fault::stage("deep"))
        }))
    });
    let innermost = promise_next([failing]);
    let middle = promise_next([innermost.interceptor()]);
    let outer = promise_next([middle.interceptor()]);
    let store = TestStore::new(reducers::payload, Value::Null, &outer.interceptor());

    let deferred = expect_deferred(store.dispatch(Message::new("x").with_payload("lost")).unwrap());
    assert!(matches!(deferred.await, Err(Fault::Stage(reason)) if reason == "deep"));
    assert!(innermost.pending().is_empty());
    assert!(middle.pending().is_empty());
    assert!(outer.pending().is_empty());
    assert!(store.log().is_empty());
}

#[tokio::test]
async fn test_catches_synchronous_faults() {
    let failing = Interceptor::from_fn(|_ctx, _next, _message| Err(Fault::stage("sync")));
    let store = TestStore::new(reducers::null, Value::Null, &promise_next([failing]).interceptor());
    let deferred = expect_deferred(store.dispatch(Message::new("x")).unwrap());
    assert!(matches!(deferred.await, Err(Fault::Stage(_))));
}

#[tokio::test]
async fn test_catches_faults_from_returned_deferreds() {
    let failing = Interceptor::from_fn(|_ctx, _next, _message| {
        Ok(Reply::deferred(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(Fault::stage("async"))
        }))
    });
    let store = TestStore::new(reducers::null, Value::Null, &as_promise(&failing));
    let deferred = expect_deferred(store.dispatch(Message::new("x")).unwrap());
    assert!(matches!(deferred.await, Err(Fault::Stage(reason)) if reason == "async"));
    assert!(store.log().is_empty());
}

#[tokio::test]
async fn test_abort_rejects_pending_dispatches() {
    let lifted = promise_next([delay(Duration::from_secs(60 * 60))]);
    let pipeline = chain([
        combine([Cases::on(lifted.abort_interceptor(), ["ABORT"])]),
        lifted.interceptor(),
    ]);
    let store = TestStore::new(reducers::payload, Value::Null, &pipeline);

    let first = expect_deferred(store.dispatch(Message::new("x").with_payload(1)).unwrap());
    let second = expect_deferred(store.dispatch(Message::new("x").with_payload(2)).unwrap());
    assert_eq!(lifted.pending().len(), 2);

    let reply = store.dispatch(Message::new("ABORT")).unwrap();
    assert_eq!(reply.as_value(), Some(&json!(2)));
    assert!(lifted.pending().is_empty());

    assert!(matches!(first.await, Err(Fault::Aborted)));
    assert!(matches!(second.await, Err(Fault::Aborted)));
    assert!(store.log().is_empty());
}
