//! Pending - Registry of unsettled lifted calls.
//!
//! Every call through a lifted interceptor opens a [`Ticket`]. The ticket is
//! removed from its [`PendingSet`] when it settles, or force-rejected with
//! [`Fault::Aborted`] when the set is aborted. The lock is held only while
//! entries are inserted, removed or drained; results are always delivered
//! outside of it.

use parking_lot::Mutex;
use plexus_core::{Fault, Handled};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, trace};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct PendingSet {
    entries: Mutex<HashMap<Uuid, oneshot::Sender<Handled>>>,
}

impl PendingSet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new pending call. The receiver yields whatever the ticket is
    /// settled with, or [`Fault::Aborted`] if the set is aborted first.
    pub fn open(self: &Arc<Self>) -> (Ticket, oneshot::Receiver<Handled>) {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        let pending = {
            let mut entries = self.entries.lock();
            entries.insert(id, tx);
            entries.len()
        };
        trace!(%id, pending, "pending call opened");
        (
            Ticket {
                id,
                set: self.clone(),
            },
            rx,
        )
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Reject every pending call and clear the set. Returns how many calls were
    /// rejected.
    pub fn abort(&self) -> usize {
        let drained: Vec<_> = self.entries.lock().drain().collect();
        let aborted = drained.len();
        for (_, tx) in drained {
            // The awaiting side may already be gone.
            let _ = tx.send(Err(Fault::Aborted));
        }
        debug!(aborted, "pending calls aborted");
        aborted
    }
}

/// Handle to one pending call.
#[derive(Debug, Clone)]
pub struct Ticket {
    id: Uuid,
    set: Arc<PendingSet>,
}

impl Ticket {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Settle the call. Only the first settlement counts; later ones, and any
    /// settlement after an abort, return `false`.
    pub fn settle(&self, result: Handled) -> bool {
        let sender = self.set.entries.lock().remove(&self.id);
        match sender {
            Some(tx) => {
                trace!(id = %self.id, ok = result.is_ok(), "pending call settled");
                tx.send(result).is_ok()
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.set.contains(&self.id)
    }
}
