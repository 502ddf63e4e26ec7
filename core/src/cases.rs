//! # Cases: Tag-Keyed Routing
//!
//! A [`CaseTable`] maps message tags to interceptors. [`run_cases`] turns a
//! table into an interceptor that looks the tag of each message up once and
//! runs the matching case, or forwards the message untouched when no case
//! matches. The lookup cost does not grow with the number of cases, which is
//! the point of routing by tag instead of chaining predicate branches.
//!
//! ## Collisions
//!
//! Registering a second interceptor under an occupied tag composes the two:
//! the interceptor listed first becomes the outer layer, runs first, and decides
//! whether the later one is reached.
//!
//! ## Global wrappers
//!
//! An interceptor registered without tags wraps every case of the finished
//! table. It does not run for messages that match no case.

use crate::chain::chain;
use crate::interceptor::{Handler, Interceptor, Layer};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// One or more case registrations, in any of the accepted shapes.
#[derive(Clone, Debug)]
pub enum Cases {
    /// One interceptor under zero or more tags. No tags registers a global wrapper.
    Entry {
        interceptor: Interceptor,
        tags: Vec<String>,
    },
    /// Several registrations, in order.
    List(Vec<Cases>),
    /// Tag to interceptor.
    Map(Vec<(String, Interceptor)>),
}

impl Cases {
    pub fn on<T, S>(interceptor: Interceptor, tags: T) -> Self
    where
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Cases::Entry {
            interceptor,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Register `interceptor` around every case of the table.
    pub fn global(interceptor: Interceptor) -> Self {
        Cases::Entry {
            interceptor,
            tags: Vec::new(),
        }
    }

    fn flatten_into(self, out: &mut Vec<(Interceptor, Vec<String>)>) {
        match self {
            Cases::Entry { interceptor, tags } => out.push((interceptor, tags)),
            Cases::List(list) => {
                for cases in list {
                    cases.flatten_into(out);
                }
            }
            Cases::Map(map) => {
                out.extend(map.into_iter().map(|(tag, interceptor)| (interceptor, vec![tag])))
            }
        }
    }
}

impl<S: Into<String>, const N: usize> From<(Interceptor, [S; N])> for Cases {
    fn from((interceptor, tags): (Interceptor, [S; N])) -> Self {
        Cases::on(interceptor, tags)
    }
}

impl<S: Into<String>> From<(Interceptor, Vec<S>)> for Cases {
    fn from((interceptor, tags): (Interceptor, Vec<S>)) -> Self {
        Cases::on(interceptor, tags)
    }
}

impl From<Interceptor> for Cases {
    fn from(interceptor: Interceptor) -> Self {
        Cases::global(interceptor)
    }
}

impl<C: Into<Cases>> From<Vec<C>> for Cases {
    fn from(list: Vec<C>) -> Self {
        Cases::List(list.into_iter().map(Into::into).collect())
    }
}

impl From<HashMap<String, Interceptor>> for Cases {
    fn from(map: HashMap<String, Interceptor>) -> Self {
        Cases::Map(map.into_iter().collect())
    }
}

impl From<BTreeMap<String, Interceptor>> for Cases {
    fn from(map: BTreeMap<String, Interceptor>) -> Self {
        Cases::Map(map.into_iter().collect())
    }
}

impl From<CaseTable> for Cases {
    fn from(table: CaseTable) -> Self {
        Cases::Map(table.cases.into_iter().collect())
    }
}

/// Tag to interceptor mapping.
#[derive(Clone, Debug, Default)]
pub struct CaseTable {
    cases: HashMap<String, Interceptor>,
}

impl CaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: &str) -> Option<&Interceptor> {
        self.cases.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.cases.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.cases.keys().map(String::as_str)
    }

    /// Register `interceptor` under `tag` as the outer layer of whatever is
    /// already there.
    pub fn wrap_case(&mut self, tag: impl Into<String>, interceptor: Interceptor) {
        let tag = tag.into();
        let composed = match self.cases.remove(&tag) {
            Some(current) => chain([interceptor, current]),
            None => interceptor,
        };
        self.cases.insert(tag, composed);
    }

    /// Wrap every case with `interceptor`.
    pub fn wrap_all(&mut self, interceptor: &Interceptor) {
        for case in self.cases.values_mut() {
            *case = chain([interceptor.clone(), case.clone()]);
        }
    }

    /// Turn the table into a routing interceptor.
    pub fn into_interceptor(self) -> Interceptor {
        run_cases(self)
    }
}

/// Build a case table. For any tag, the registration listed first is the
/// outermost layer.
///
/// ```rust
/// use plexus_core::{Cases, Interceptor, combine_cases};
///
/// let a = Interceptor::identity();
/// let b = Interceptor::identity();
/// let table = combine_cases([
///     Cases::on(a.clone(), ["x", "y"]),
///     Cases::on(b.clone(), ["z"]),
/// ]);
/// assert!(table.get("x").unwrap().ptr_eq(&a));
/// assert!(table.get("z").unwrap().ptr_eq(&b));
/// assert!(table.get("w").is_none());
/// ```
pub fn combine_cases<I>(entries: I) -> CaseTable
where
    I: IntoIterator,
    I::Item: Into<Cases>,
{
    let mut flat = Vec::new();
    for entry in entries {
        entry.into().flatten_into(&mut flat);
    }

    let mut table = CaseTable::new();
    let mut globals = Vec::new();
    for (interceptor, tags) in flat.into_iter().rev() {
        if tags.is_empty() {
            globals.push(interceptor);
            continue;
        }
        for tag in tags {
            table.wrap_case(tag, interceptor.clone());
        }
    }
    for global in &globals {
        table.wrap_all(global);
    }

    trace!(
        cases = table.len(),
        globals = globals.len(),
        "case table built"
    );
    table
}

/// Route each message to the case registered for its tag; forward unmatched
/// messages untouched.
pub fn run_cases(table: CaseTable) -> Interceptor {
    Interceptor::new(move |ctx| {
        let layers: HashMap<String, Layer> = table
            .cases
            .iter()
            .map(|(tag, interceptor)| (tag.clone(), interceptor.bind(ctx)))
            .collect();
        Layer::new(move |next| {
            let handlers: HashMap<String, Handler> = layers
                .iter()
                .map(|(tag, layer)| (tag.clone(), layer.wrap(next.clone())))
                .collect();
            Handler::new(move |message| match handlers.get(message.kind.as_str()) {
                Some(handler) => handler.call(message),
                None => next.call(message),
            })
        })
    })
}

/// `run_cases(combine_cases(entries))`.
pub fn combine<I>(entries: I) -> Interceptor
where
    I: IntoIterator,
    I::Item: Into<Cases>,
{
    run_cases(combine_cases(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::message::Message;
    use crate::reply::Reply;
    use serde_json::{Value, json};

    fn append(suffix: &'static str) -> Interceptor {
        Interceptor::from_fn(move |_ctx, next, mut message| {
            let current = message.payload_str().unwrap_or_default().to_string();
            message.payload = Value::String(format!("{current}{suffix}"));
            next.call(message)
        })
    }

    fn run(router: &Interceptor, message: Message) -> Value {
        let sink = Handler::new(|message| Ok(Reply::Value(message.payload)));
        let reply = router
            .wrap(&Context::detached(), sink)
            .call(message)
            .unwrap();
        reply.as_value().cloned().unwrap_or(Value::Null)
    }

    #[test]
    fn test_routes_by_tag() {
        let digits: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let router = combine([
            Cases::on(append("a-c"), ["a", "b", "c"]),
            Cases::on(append("0-9"), digits),
        ]);

        assert_eq!(run(&router, Message::new("boo").with_payload("doo")), json!("doo"));
        assert_eq!(run(&router, Message::new("a").with_payload("1")), json!("1a-c"));
        assert_eq!(run(&router, Message::new("0").with_payload("2")), json!("20-9"));
        assert_eq!(run(&router, Message::new("4").with_payload("3")), json!("30-9"));
    }

    #[test]
    fn test_empty_router_forwards() {
        let router = combine(Vec::<Cases>::new());
        assert_eq!(run(&router, Message::new("x").with_payload("p")), json!("p"));
    }

    #[test]
    fn test_combines_across_shapes() {
        let append_ac = append("a-c");
        let append_09 = append("0-9");
        let mut map = HashMap::new();
        map.insert("d".to_string(), append_09.clone());

        let table = combine_cases([
            Cases::on(append_ac.clone(), ["a", "b", "c"]),
            Cases::List(vec![Cases::on(append_09.clone(), ["0", "1", "2", "3"])]),
            Cases::from(map),
        ]);

        assert_eq!(table.len(), 8);
        for tag in ["a", "b", "c"] {
            assert!(table.get(tag).unwrap().ptr_eq(&append_ac));
        }
        for tag in ["d", "0", "1", "2", "3"] {
            assert!(table.get(tag).unwrap().ptr_eq(&append_09));
        }
    }

    #[test]
    fn test_combines_existing_tables() {
        let append_ac = append("a-c");
        let inner = combine_cases([Cases::on(append_ac.clone(), ["a", "b", "c"])]);
        let table = combine_cases([Cases::from(inner)]);
        assert_eq!(table.len(), 3);
        assert!(table.get("b").unwrap().ptr_eq(&append_ac));
    }

    #[test]
    fn test_colliding_tags_compose_first_listed_outermost() {
        let router = combine([
            Cases::on(append("X"), ["a"]),
            Cases::on(append("Y"), ["a", "b"]),
        ]);
        assert_eq!(run(&router, Message::new("a").with_payload("")), json!("XY"));
        assert_eq!(run(&router, Message::new("b").with_payload("")), json!("Y"));
    }

    #[test]
    fn test_outer_case_controls_inner() {
        let gate = Interceptor::from_fn(|_ctx, next, message| {
            if message.payload == json!("stop") {
                return Ok(Reply::value("gated"));
            }
            next.call(message)
        });
        let router = combine([Cases::on(gate, ["a"]), Cases::on(append("Y"), ["a"])]);
        assert_eq!(run(&router, Message::new("a").with_payload("stop")), json!("gated"));
        assert_eq!(run(&router, Message::new("a").with_payload("go")), json!("goY"));
    }

    #[test]
    fn test_global_wraps_every_case_but_not_misses() {
        let router = combine([
            Cases::global(append("G")),
            Cases::on(append("A"), ["a"]),
            Cases::on(append("B"), ["b"]),
            Cases::global(append("H")),
        ]);
        assert_eq!(run(&router, Message::new("a").with_payload("")), json!("GHA"));
        assert_eq!(run(&router, Message::new("b").with_payload("")), json!("GHB"));
        assert_eq!(run(&router, Message::new("z").with_payload("")), json!(""));
    }

    #[test]
    fn test_case_shares_router_continuation() {
        let redirect = Interceptor::from_fn(|_ctx, next, message| {
            next.call(Message::new("redirected").with_payload(message.payload))
        });
        let router = combine([Cases::on(redirect, ["a"])]);
        let sink = Handler::new(|message| Ok(Reply::value(message.kind)));
        let reply = router
            .wrap(&Context::detached(), sink)
            .call(Message::new("a"))
            .unwrap();
        assert_eq!(reply.as_value(), Some(&json!("redirected")));
    }
}
