use std::sync::Arc;
use thiserror::Error;

/// Faults raised while a message travels through a pipeline.
///
/// `Fault` is `Clone` so that a deferred result can be observed by more than one
/// awaiting party.
#[derive(Error, Debug, Clone)]
pub enum Fault {
    /// A programmer error detected synchronously (malformed wiring, broken contract).
    #[error("contract violation: {0}")]
    Contract(String),

    /// A fault raised by an interceptor body.
    #[error("stage fault: {0}")]
    Stage(String),

    /// A pending deferred result was flushed by an abort.
    #[error("deferred result aborted")]
    Aborted,

    /// The owner of a deferred result went away before settling it.
    #[error("deferred result dropped before settling")]
    Dropped,

    #[error("{0}")]
    Other(Arc<anyhow::Error>),
}

impl Fault {
    pub fn contract(message: impl Into<String>) -> Self {
        Fault::Contract(message.into())
    }

    pub fn stage(message: impl Into<String>) -> Self {
        Fault::Stage(message.into())
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Fault::Aborted)
    }
}

impl From<anyhow::Error> for Fault {
    fn from(err: anyhow::Error) -> Self {
        Fault::Other(Arc::new(err))
    }
}
