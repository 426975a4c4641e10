//! Offline decision outbox.
//!
//! Decisions are recorded locally first and transmitted to the backend
//! best-effort; while the device is offline they wait here. The queue is
//! persisted as one CBOR blob in the host's key-value store after every
//! mutation, and reloaded when the outbox is opened, so recorded swipes
//! survive an app restart.
//!
//! Transmission itself is external: a delivery worker reads
//! [`DecisionOutbox::pending`], calls [`DecisionOutbox::record_attempt`]
//! before each try, and [`DecisionOutbox::ack`] on success.

use raftup_core::{
    model::{Decision, DecisionId},
    store::{KeyValueStore, StoreError},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key the queue is persisted under.
const OUTBOX_KEY: &str = "raftup.outbox.v1";

/// Errors from outbox operations.
///
/// Persistence failures never corrupt the in-memory queue; the caller may
/// retry the operation or accept that this process's queue outlives it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutboxError {
    /// The underlying key-value store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The persisted blob could not be encoded or decoded.
    #[error("outbox codec error: {0}")]
    Codec(String),
}

/// A decision awaiting delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedDecision {
    /// The recorded decision.
    pub decision: Decision,
    /// Delivery attempts made so far.
    pub attempts: u32,
}

/// Persisted best-effort retry queue of undelivered decisions.
#[derive(Debug, Clone)]
pub struct DecisionOutbox<K: KeyValueStore> {
    store: K,
    entries: Vec<QueuedDecision>,
}

impl<K: KeyValueStore> DecisionOutbox<K> {
    /// Open the outbox, restoring any queue persisted in the store.
    pub fn open(store: K) -> Result<Self, OutboxError> {
        let entries = match store.get(OUTBOX_KEY)? {
            Some(bytes) => ciborium::de::from_reader(bytes.as_slice())
                .map_err(|e| OutboxError::Codec(e.to_string()))?,
            None => Vec::new(),
        };
        Ok(Self { store, entries })
    }

    /// Append a decision to the queue.
    pub fn enqueue(&mut self, decision: Decision) -> Result<(), OutboxError> {
        self.entries.push(QueuedDecision { decision, attempts: 0 });
        self.persist()
    }

    /// Decisions awaiting delivery, oldest first.
    pub fn pending(&self) -> &[QueuedDecision] {
        &self.entries
    }

    /// Count a delivery attempt against a queued decision.
    ///
    /// Returns `false` if the decision is no longer queued.
    pub fn record_attempt(&mut self, id: DecisionId) -> Result<bool, OutboxError> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.decision.id == id) else {
            return Ok(false);
        };
        entry.attempts += 1;
        self.persist()?;
        Ok(true)
    }

    /// Remove a delivered decision from the queue.
    ///
    /// Returns `false` if the decision was not queued.
    pub fn ack(&mut self, id: DecisionId) -> Result<bool, OutboxError> {
        self.remove(id)
    }

    /// Remove an undone decision before it is ever transmitted.
    ///
    /// Returns `false` if the decision was not queued (e.g. already
    /// delivered and acknowledged).
    pub fn retract(&mut self, id: DecisionId) -> Result<bool, OutboxError> {
        self.remove(id)
    }

    /// Number of queued decisions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove(&mut self, id: DecisionId) -> Result<bool, OutboxError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.decision.id != id);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<(), OutboxError> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&self.entries, &mut bytes)
            .map_err(|e| OutboxError::Codec(e.to_string()))?;
        self.store.put(OUTBOX_KEY, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use raftup_core::{model::DecisionKind, store::MemoryStore};

    use super::*;

    fn decision(id: DecisionId, crew_id: u64) -> Decision {
        Decision { id, crew_id, kind: DecisionKind::Like, at: 1_000 }
    }

    #[test]
    fn queue_survives_reopen_over_same_store() {
        let store = MemoryStore::new();

        let mut outbox = DecisionOutbox::open(store.clone()).unwrap();
        outbox.enqueue(decision(1, 101)).unwrap();
        outbox.enqueue(decision(2, 102)).unwrap();

        let reopened = DecisionOutbox::open(store).unwrap();
        assert_eq!(reopened.pending(), outbox.pending());
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn ack_removes_and_persists() {
        let store = MemoryStore::new();
        let mut outbox = DecisionOutbox::open(store.clone()).unwrap();
        outbox.enqueue(decision(1, 101)).unwrap();
        outbox.enqueue(decision(2, 102)).unwrap();

        assert!(outbox.ack(1).unwrap());
        assert!(!outbox.ack(1).unwrap());
        assert_eq!(outbox.len(), 1);

        let reopened = DecisionOutbox::open(store).unwrap();
        assert_eq!(reopened.pending()[0].decision.id, 2);
    }

    #[test]
    fn retract_drops_undone_decision() {
        let mut outbox = DecisionOutbox::open(MemoryStore::new()).unwrap();
        outbox.enqueue(decision(1, 101)).unwrap();

        assert!(outbox.retract(1).unwrap());
        assert!(outbox.is_empty());
    }

    #[test]
    fn attempts_are_counted_per_decision() {
        let mut outbox = DecisionOutbox::open(MemoryStore::new()).unwrap();
        outbox.enqueue(decision(1, 101)).unwrap();

        assert!(outbox.record_attempt(1).unwrap());
        assert!(outbox.record_attempt(1).unwrap());
        assert!(!outbox.record_attempt(9).unwrap());
        assert_eq!(outbox.pending()[0].attempts, 2);
    }

    #[test]
    fn corrupted_blob_is_a_codec_error() {
        let store = MemoryStore::new();
        store.put("raftup.outbox.v1", vec![0xff, 0x00, 0x13]).unwrap();

        let err = DecisionOutbox::open(store);
        assert!(matches!(err, Err(OutboxError::Codec(_))));
    }
}
