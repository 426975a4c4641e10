//! Session composition root.
//!
//! One [`Session`] is constructed per signed-in user and passed by
//! reference to whatever consumes it; there is no global mutable state.
//! It owns the environment, the data source, both state machines, and the
//! decision outbox, and it is the only place where fetches actually
//! suspend: each load runs begin → await fetch → complete, so no partial
//! state is ever observable across the await and stale resolutions are
//! discarded by the token scheme inside the state machines.

use raftup_core::{
    env::Environment,
    model::{CrewId, Decision, MatchId, Message, SwipeKind, UserId},
    source::DataSource,
    store::KeyValueStore,
};
use thiserror::Error;

use crate::{
    conversation::{ConversationError, ConversationStore},
    discovery::{DiscoveryError, DiscoveryQueue},
    outbox::{DecisionOutbox, OutboxError},
};

/// Errors surfaced by session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Discovery queue rejected the operation.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Conversation store rejected the operation.
    #[error(transparent)]
    Conversation(#[from] ConversationError),

    /// Outbox persistence failed.
    #[error(transparent)]
    Outbox(#[from] OutboxError),
}

/// Per-user client session: discovery, conversations, and the offline
/// outbox behind one injectable handle.
pub struct Session<E: Environment, S: DataSource, K: KeyValueStore> {
    source: S,
    discovery: DiscoveryQueue<E>,
    conversations: ConversationStore<E>,
    outbox: DecisionOutbox<K>,
}

impl<E, S, K> Session<E, S, K>
where
    E: Environment,
    S: DataSource,
    K: KeyValueStore,
{
    /// Create a session for the given local user.
    ///
    /// Restores any undelivered decisions persisted in `store` by an
    /// earlier run.
    pub fn new(env: E, source: S, store: K, me: UserId) -> Result<Self, SessionError> {
        Ok(Self {
            source,
            discovery: DiscoveryQueue::new(env.clone()),
            conversations: ConversationStore::new(env, me),
            outbox: DecisionOutbox::open(store)?,
        })
    }

    /// Load (or reload) the discovery queue from the data source.
    ///
    /// Returns `false` when the resolution was stale (a newer load was
    /// issued while this one was in flight). Fetch failures are not
    /// returned: they land in [`DiscoveryQueue::load_error`] with the
    /// previous queue retained, for the view to surface and retry.
    pub async fn load_discovery(&mut self) -> bool {
        let token = self.discovery.begin_load();
        let result = self.source.fetch_candidates().await;
        self.discovery.complete_load(token, result)
    }

    /// Load (or reload) the match list from the data source.
    ///
    /// Same return and failure semantics as
    /// [`Session::load_discovery`].
    pub async fn load_matches(&mut self) -> bool {
        let token = self.conversations.begin_load_matches();
        let result = self.source.fetch_matches().await;
        self.conversations.complete_load_matches(token, result)
    }

    /// Load (or reload) the message log for one match.
    pub async fn load_messages(&mut self, match_id: MatchId) -> Result<bool, SessionError> {
        let token = self.conversations.begin_load_messages(match_id)?;
        let result = self.source.fetch_messages(match_id).await;
        Ok(self.conversations.complete_load_messages(match_id, token, result))
    }

    /// Swipe on the current card and queue the decision for delivery.
    ///
    /// The outbox write is best-effort: a persistence failure is logged
    /// and the swipe stands.
    pub fn decide(&mut self, crew_id: CrewId, kind: SwipeKind) -> Result<Decision, SessionError> {
        let decision = self.discovery.decide(crew_id, kind)?;
        if let Err(err) = self.outbox.enqueue(decision.clone()) {
            tracing::warn!(%err, decision_id = decision.id, "failed to persist queued decision");
        }
        Ok(decision)
    }

    /// Boost the current card and queue the decision for delivery.
    pub fn boost(&mut self, crew_id: CrewId) -> Result<Decision, SessionError> {
        let decision = self.discovery.boost(crew_id)?;
        if let Err(err) = self.outbox.enqueue(decision.clone()) {
            tracing::warn!(%err, decision_id = decision.id, "failed to persist queued decision");
        }
        Ok(decision)
    }

    /// Undo the last decision and retract it from the outbox if it has
    /// not been delivered yet.
    pub fn undo(&mut self) -> Result<Decision, SessionError> {
        let decision = self.discovery.undo()?;
        match self.outbox.retract(decision.id) {
            Ok(_) => {},
            Err(err) => {
                tracing::warn!(%err, decision_id = decision.id, "failed to retract queued decision");
            },
        }
        Ok(decision)
    }

    /// Optimistically send a text message in a match.
    pub fn send(&mut self, match_id: MatchId, content: &str) -> Result<Message, SessionError> {
        Ok(self.conversations.send(match_id, content)?)
    }

    /// Discovery queue state (read-only).
    pub fn discovery(&self) -> &DiscoveryQueue<E> {
        &self.discovery
    }

    /// Conversation state (read-only).
    pub fn conversations(&self) -> &ConversationStore<E> {
        &self.conversations
    }

    /// Conversation state, mutable: for acknowledgments, incoming
    /// messages, read marking, and match removal driven by external
    /// collaborators.
    pub fn conversations_mut(&mut self) -> &mut ConversationStore<E> {
        &mut self.conversations
    }

    /// Outbox contents (read-only).
    pub fn outbox(&self) -> &DecisionOutbox<K> {
        &self.outbox
    }

    /// Outbox, mutable: for the delivery worker's attempt/ack cycle.
    pub fn outbox_mut(&mut self) -> &mut DecisionOutbox<K> {
        &mut self.outbox
    }

    /// Reset both stores' load error fields.
    pub fn clear_errors(&mut self) {
        self.discovery.clear_error();
        self.conversations.clear_error();
    }
}
