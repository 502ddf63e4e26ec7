//! Contract - Enforce message shape.
//!
//! A message that passes its check is forwarded. A broken one is absorbed and
//! reported according to [`ContractOptions`]: optionally dispatched under a
//! "broken" tag, logged as a warning, and/or turned into a
//! [`Fault::Contract`]. A check that itself faults is reported the same way,
//! with the fault attached to the broken message's `meta.error`.
//!
//! Faults raised downstream of a passing message are not reported here; they
//! propagate to the caller unchanged, and a passing message answers with the
//! downstream reply. Only the check itself is guarded.

use crate::config::ContractOptions;
use plexus_core::{Context, Fault, Handled, Interceptor, Message, Reply};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

type Check = Arc<dyn Fn(&Message, &Value) -> Result<bool, Fault> + Send + Sync>;
type Describe = Arc<dyn Fn(&Message, &Value) -> Value + Send + Sync>;

/// A configured contract, ready to be turned into an interceptor.
#[derive(Clone)]
pub struct Contract {
    check: Check,
    describe: Describe,
    options: ContractOptions,
}

/// Start a contract from its check. The check sees the message and the
/// current state.
pub fn contract<F>(check: F) -> Contract
where
    F: Fn(&Message, &Value) -> Result<bool, Fault> + Send + Sync + 'static,
{
    Contract {
        check: Arc::new(check),
        describe: Arc::new(|message: &Message, _state: &Value| message.to_value()),
        options: ContractOptions::default(),
    }
}

impl Contract {
    /// How a broken message is described in warnings and faults.
    pub fn describe<F>(mut self, describe: F) -> Self
    where
        F: Fn(&Message, &Value) -> Value + Send + Sync + 'static,
    {
        self.describe = Arc::new(describe);
        self
    }

    pub fn options(mut self, options: ContractOptions) -> Self {
        self.options = options;
        self
    }

    /// The contract, reporting broken messages through logs and faults only.
    pub fn interceptor(&self) -> Interceptor {
        self.build(None)
    }

    /// The contract, additionally dispatching `{ type: broken, payload: message }`
    /// for every broken message.
    pub fn reporting(&self, broken: impl Into<String>) -> Interceptor {
        self.build(Some(broken.into()))
    }

    fn build(&self, broken: Option<String>) -> Interceptor {
        let contract = self.clone();
        Interceptor::from_fn(move |ctx, next, message| {
            let state = ctx.state();
            match (contract.check)(&message, &state) {
                Ok(true) => next.call(message),
                Ok(false) => contract.broken(ctx, broken.as_deref(), &message, &state, None),
                Err(fault) => {
                    contract.broken(ctx, broken.as_deref(), &message, &state, Some(fault))
                }
            }
        })
    }

    fn broken(
        &self,
        ctx: &Context,
        broken: Option<&str>,
        message: &Message,
        state: &Value,
        fault: Option<Fault>,
    ) -> Handled {
        if let Some(tag) = broken {
            let mut report = Message::new(tag).with_payload(message.to_value());
            if let Some(fault) = &fault {
                report = report.with_meta(json!({ "error": fault.to_string() }));
            }
            ctx.dispatch(report)?;
        }

        let description = (self.describe)(message, state);
        if self.options.warn {
            match &fault {
                Some(fault) => warn!(error = %fault, %description, "Message contract broken"),
                None => warn!(%description, "Message contract broken"),
            }
        }

        if self.options.error {
            return Err(fault.unwrap_or_else(|| {
                Fault::contract(format!("message contract broken: {description}"))
            }));
        }
        Ok(Reply::null())
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
