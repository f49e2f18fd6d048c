//! Acknowledgment tracker: sent messages awaiting a correlated ack, keyed by
//! message id. Entries leave the table only through a successful resolve;
//! there is no background expiry.

use std::collections::HashMap;
use std::time::SystemTime;

use crate::protocol::MessageId;

/// A sent message awaiting acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAck {
    pub sent_at: SystemTime,
    pub source: String,
    pub destination: String,
    pub text: String,
}

/// Outstanding sends keyed by id alone (session-global: ids are drawn from
/// one counter, acks are not scoped per destination).
#[derive(Debug, Default)]
pub struct AckTracker {
    pending: HashMap<u16, PendingAck>,
}

impl AckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sent message. Overwriting an id still pending is permitted;
    /// counter reuse is the caller's responsibility.
    pub fn record_sent(&mut self, id: MessageId, entry: PendingAck) {
        self.pending.insert(id.value(), entry);
    }

    /// Remove and return the entry for an incoming ack. `None` means a
    /// duplicate, delayed or spoofed ack; the caller reports it and carries
    /// on without mutating anything.
    pub fn resolve(&mut self, id: MessageId) -> Option<PendingAck> {
        self.pending.remove(&id.value())
    }

    pub fn is_pending(&self, id: MessageId) -> bool {
        self.pending.contains_key(&id.value())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
