//! # Plexus Test
//!
//! Utilities for exercising interceptors against a real host:
//!
//! * [`TestStore`]: a reducer-driven host with re-entrant `dispatch`
//! * [`reducers`]: stock reducers
//! * [`append_payload`]: a marker interceptor for ordering tests
//! * [`probe`]: run an interceptor once and record what it touched
//! * [`init_tracing`]: route `tracing` output to the test writer

use parking_lot::Mutex;
use plexus_core::{Context, Fault, Handled, Handler, Interceptor, Message, Reply, Store};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tracing_subscriber::EnvFilter;

type Reducer = Arc<dyn Fn(&Value, &Message) -> Value + Send + Sync>;

/// A host whose state is computed by a reducer from every message that reaches
/// the end of the pipeline.
///
/// The pipeline is built once, in [`TestStore::new`]. Dispatching while it is
/// being built is a [`Fault::Contract`].
pub struct TestStore {
    state: Mutex<Value>,
    reducer: Reducer,
    handler: OnceLock<Handler>,
    log: Mutex<Vec<Message>>,
}

impl TestStore {
    pub fn new<R>(reducer: R, initial: Value, interceptor: &Interceptor) -> Arc<Self>
    where
        R: Fn(&Value, &Message) -> Value + Send + Sync + 'static,
    {
        let store = Arc::new(Self {
            state: Mutex::new(initial),
            reducer: Arc::new(reducer),
            handler: OnceLock::new(),
            log: Mutex::new(Vec::new()),
        });

        let ctx = Context::from_store(Host(Arc::downgrade(&store)));
        let sink = {
            let host = Arc::downgrade(&store);
            Handler::new(move |message| match host.upgrade() {
                Some(store) => Ok(store.reduce(message)),
                None => Err(Fault::contract("test store dropped")),
            })
        };
        let handler = interceptor.wrap(&ctx, sink);
        // The cell is only ever set here.
        let _ = store.handler.set(handler);
        store
    }

    /// Submit a message at the top of the pipeline.
    pub fn dispatch(&self, message: Message) -> Handled {
        match self.handler.get() {
            Some(handler) => handler.call(message),
            None => Err(Fault::contract(format!(
                "cannot dispatch `{}` while the pipeline is being built",
                message.kind
            ))),
        }
    }

    pub fn state(&self) -> Value {
        self.state.lock().clone()
    }

    /// Every message that reached the reducer, in order.
    pub fn log(&self) -> Vec<Message> {
        self.log.lock().clone()
    }

    /// The tags of [`TestStore::log`].
    pub fn kinds(&self) -> Vec<String> {
        self.log.lock().iter().map(|m| m.kind.clone()).collect()
    }

    /// A context over this store, for wiring interceptors by hand.
    pub fn context(self: &Arc<Self>) -> Context {
        Context::from_store(Host(Arc::downgrade(self)))
    }

    fn reduce(&self, message: Message) -> Reply {
        let reply = Reply::Value(message.to_value());
        {
            let mut state = self.state.lock();
            let next = (self.reducer)(&state, &message);
            *state = next;
        }
        self.log.lock().push(message);
        reply
    }
}

impl Store for TestStore {
    fn dispatch(&self, message: Message) -> Handled {
        TestStore::dispatch(self, message)
    }

    fn state(&self) -> Value {
        TestStore::state(self)
    }
}

struct Host(Weak<TestStore>);

impl Store for Host {
    fn dispatch(&self, message: Message) -> Handled {
        match self.0.upgrade() {
            Some(store) => store.dispatch(message),
            None => Err(Fault::contract("test store dropped")),
        }
    }

    fn state(&self) -> Value {
        self.0.upgrade().map(|store| store.state()).unwrap_or(Value::Null)
    }
}

pub mod reducers {
    use plexus_core::Message;
    use serde_json::Value;

    /// The state becomes the payload of the last message.
    pub fn payload(_state: &Value, message: &Message) -> Value {
        message.payload.clone()
    }

    /// The state becomes the last message itself.
    pub fn message(_state: &Value, message: &Message) -> Value {
        message.to_value()
    }

    pub fn null(_state: &Value, _message: &Message) -> Value {
        Value::Null
    }

    /// The state is the array of every message's payload.
    pub fn log(state: &Value, message: &Message) -> Value {
        let mut entries = state.as_array().cloned().unwrap_or_default();
        entries.push(message.payload.clone());
        Value::Array(entries)
    }
}

/// Appends `suffix` to a string payload (a missing or non-string payload counts
/// as empty) and forwards the message.
pub fn append_payload(suffix: impl Into<String>) -> Interceptor {
    let suffix = suffix.into();
    Interceptor::from_fn(move |_ctx, next, mut message| {
        let current = message.payload_str().unwrap_or_default();
        message.payload = Value::String(format!("{current}{suffix}"));
        next.call(message)
    })
}

/// What an interceptor did with one message.
#[derive(Debug)]
pub struct Probe {
    pub called_next: bool,
    pub called_dispatch: bool,
    pub read_state: bool,
    pub reply: Handled,
}

/// Run `interceptor` once on `message` against a recording host whose state is
/// `state`. The continuation and `dispatch` both absorb.
pub fn probe(interceptor: &Interceptor, message: Message, state: Value) -> Probe {
    let host = Arc::new(Recording {
        state,
        called_dispatch: AtomicBool::new(false),
        read_state: AtomicBool::new(false),
    });
    let called_next = Arc::new(AtomicBool::new(false));
    let next = {
        let called_next = called_next.clone();
        Handler::new(move |_| {
            called_next.store(true, Ordering::SeqCst);
            Ok(Reply::null())
        })
    };

    let reply = interceptor
        .wrap(&Context::new(host.clone()), next)
        .call(message);

    Probe {
        called_next: called_next.load(Ordering::SeqCst),
        called_dispatch: host.called_dispatch.load(Ordering::SeqCst),
        read_state: host.read_state.load(Ordering::SeqCst),
        reply,
    }
}

struct Recording {
    state: Value,
    called_dispatch: AtomicBool,
    read_state: AtomicBool,
}

impl Store for Recording {
    fn dispatch(&self, _message: Message) -> Handled {
        self.called_dispatch.store(true, Ordering::SeqCst);
        Ok(Reply::null())
    }

    fn state(&self) -> Value {
        self.read_state.store(true, Ordering::SeqCst);
        self.state.clone()
    }
}

/// Install a `tracing` subscriber writing to the test output. Safe to call from
/// every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,plexus_core=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
