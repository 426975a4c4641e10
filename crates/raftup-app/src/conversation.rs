//! Conversation store state machine.
//!
//! Maintains the match list and per-match message logs, supporting
//! optimistic send: a locally created message lands in the log and in the
//! match's `last_message` summary in one step, before any server
//! acknowledgment. Like the discovery queue this is a pure state machine;
//! fetches happen outside through `begin_load_*` / `complete_load_*`
//! token pairs.

use std::collections::HashMap;

use raftup_core::{
    env::Environment,
    model::{LastMessage, Match, MatchId, Message, MessageId, MessageKind, MessageStatus, UserId},
    source::SourceError,
};
use thiserror::Error;

use crate::load::{LoadToken, LoadTracker};

/// Errors from conversation store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// Message content was empty (or whitespace only).
    #[error("message content is empty")]
    EmptyContent,

    /// Operation referenced a match the store does not hold.
    #[error("unknown match: {0}")]
    UnknownMatch(MatchId),

    /// Acknowledgment referenced a message not pending in that match.
    #[error("no pending message {message_id} in match {match_id}")]
    UnknownMessage {
        /// The match that was addressed.
        match_id: MatchId,
        /// The locally generated id that could not be found.
        message_id: MessageId,
    },
}

/// Conversation store state machine.
///
/// # Invariants
///
/// - Every message log entry references a match the store currently holds.
/// - Logs are ordered by timestamp, oldest first.
/// - After a send, the newest log entry and the match's `last_message`
///   agree in content and timestamp.
#[derive(Debug, Clone)]
pub struct ConversationStore<E: Environment> {
    /// Environment for timestamps and local identifiers.
    env: E,
    /// The local user, used as sender for optimistic messages.
    me: UserId,
    /// Match list in source order.
    matches: Vec<Match>,
    /// Message logs keyed by match. A match without an entry is "cold":
    /// it reads as empty until its first message load resolves.
    logs: HashMap<MatchId, Vec<Message>>,
    /// Most recent load failure, if any.
    last_error: Option<SourceError>,
    /// Token sequence for match-list loads.
    match_loads: LoadTracker,
    /// Per-match token sequences for message loads.
    message_loads: HashMap<MatchId, LoadTracker>,
}

impl<E: Environment> ConversationStore<E> {
    /// Create an empty store for the given local user.
    pub fn new(env: E, me: UserId) -> Self {
        Self {
            env,
            me,
            matches: Vec::new(),
            logs: HashMap::new(),
            last_error: None,
            match_loads: LoadTracker::default(),
            message_loads: HashMap::new(),
        }
    }

    /// Begin a match-list load, staling earlier in-flight requests.
    pub fn begin_load_matches(&mut self) -> LoadToken {
        self.match_loads.issue()
    }

    /// Apply a match-list load resolution.
    ///
    /// Stale tokens are discarded (`false`, no state change). On success
    /// the list is replaced and logs for matches that no longer exist are
    /// dropped; on failure the previous list is retained and the error
    /// recorded.
    pub fn complete_load_matches(
        &mut self,
        token: LoadToken,
        result: Result<Vec<Match>, SourceError>,
    ) -> bool {
        if !self.match_loads.is_current(token) {
            tracing::debug!(?token, "discarding stale match-list load");
            return false;
        }

        match result {
            Ok(matches) => {
                self.matches = matches;
                self.logs.retain(|id, _| self.matches.iter().any(|m| m.id == *id));
                self.message_loads.retain(|id, _| self.matches.iter().any(|m| m.id == *id));
                self.last_error = None;
                tracing::debug!(count = self.matches.len(), "match list replaced");
            },
            Err(err) => {
                tracing::warn!(%err, "match-list load failed, keeping previous list");
                self.last_error = Some(err);
            },
        }
        true
    }

    /// Begin a message load for one match.
    pub fn begin_load_messages(&mut self, match_id: MatchId) -> Result<LoadToken, ConversationError> {
        if !self.matches.iter().any(|m| m.id == match_id) {
            return Err(ConversationError::UnknownMatch(match_id));
        }
        Ok(self.message_loads.entry(match_id).or_default().issue())
    }

    /// Apply a message load resolution for one match.
    ///
    /// Discarded (`false`) when the token is stale or the match has been
    /// removed since the load began. On success the log is replaced with
    /// the fetched messages (source order, oldest first) and the match's
    /// `last_message` summary is refreshed from the log tail.
    pub fn complete_load_messages(
        &mut self,
        match_id: MatchId,
        token: LoadToken,
        result: Result<Vec<Message>, SourceError>,
    ) -> bool {
        if !self.matches.iter().any(|m| m.id == match_id) {
            tracing::debug!(match_id, "discarding message load for removed match");
            return false;
        }
        let current = self.message_loads.get(&match_id).is_some_and(|t| t.is_current(token));
        if !current {
            tracing::debug!(match_id, ?token, "discarding stale message load");
            return false;
        }

        match result {
            Ok(messages) => {
                self.last_error = None;
                if let Some(newest) = messages.last() {
                    let summary =
                        LastMessage { content: newest.content.clone(), at: newest.at };
                    if let Some(entry) = self.matches.iter_mut().find(|m| m.id == match_id) {
                        entry.last_message = Some(summary);
                    }
                }
                tracing::debug!(match_id, count = messages.len(), "message log replaced");
                self.logs.insert(match_id, messages);
            },
            Err(err) => {
                tracing::warn!(%err, match_id, "message load failed, keeping previous log");
                self.last_error = Some(err);
            },
        }
        true
    }

    /// Optimistically send a text message.
    ///
    /// Synchronous: appends a `Pending` message with a locally generated
    /// identifier and updates the match's `last_message` with identical
    /// content and timestamp, so log and summary can never disagree.
    /// Reconciliation with the server-confirmed identifier happens later
    /// via [`ConversationStore::acknowledge`].
    pub fn send(
        &mut self,
        match_id: MatchId,
        content: &str,
    ) -> Result<Message, ConversationError> {
        if content.trim().is_empty() {
            return Err(ConversationError::EmptyContent);
        }
        if !self.matches.iter().any(|m| m.id == match_id) {
            return Err(ConversationError::UnknownMatch(match_id));
        }

        let message = Message {
            id: self.env.random_u64(),
            match_id,
            sender_id: self.me,
            kind: MessageKind::Text,
            content: content.to_owned(),
            at: self.env.now_ms(),
            read: true,
            status: MessageStatus::Pending,
        };

        self.logs.entry(match_id).or_default().push(message.clone());
        if let Some(entry) = self.matches.iter_mut().find(|m| m.id == match_id) {
            entry.last_message =
                Some(LastMessage { content: message.content.clone(), at: message.at });
        }
        tracing::debug!(match_id, message_id = message.id, "optimistic send recorded");
        Ok(message)
    }

    /// Reconcile a pending message with its server-confirmed identifier.
    pub fn acknowledge(
        &mut self,
        match_id: MatchId,
        local_id: MessageId,
        server_id: MessageId,
    ) -> Result<(), ConversationError> {
        let log =
            self.logs.get_mut(&match_id).ok_or(ConversationError::UnknownMatch(match_id))?;
        let message = log
            .iter_mut()
            .find(|m| m.id == local_id && m.status == MessageStatus::Pending)
            .ok_or(ConversationError::UnknownMessage { match_id, message_id: local_id })?;

        message.id = server_id;
        message.status = MessageStatus::Sent;
        tracing::debug!(match_id, local_id, server_id, "message acknowledged");
        Ok(())
    }

    /// Record a message received from the outside (push collaborator).
    ///
    /// Inserted in timestamp order; when it is the newest in the log the
    /// match's `last_message` summary follows, and a message from the other
    /// participant clears the match's read flag.
    pub fn message_received(&mut self, message: Message) -> Result<(), ConversationError> {
        let match_id = message.match_id;
        if !self.matches.iter().any(|m| m.id == match_id) {
            return Err(ConversationError::UnknownMatch(match_id));
        }

        let log = self.logs.entry(match_id).or_default();
        let position = log.partition_point(|m| m.at <= message.at);
        let is_newest = position == log.len();
        log.insert(position, message.clone());

        if let Some(entry) = self.matches.iter_mut().find(|m| m.id == match_id) {
            if is_newest {
                entry.last_message =
                    Some(LastMessage { content: message.content.clone(), at: message.at });
            }
            if message.sender_id != self.me {
                entry.read = false;
            }
        }
        tracing::debug!(match_id, message_id = message.id, "message received");
        Ok(())
    }

    /// Mark a conversation read: the match flag and every log entry.
    pub fn mark_read(&mut self, match_id: MatchId) -> Result<(), ConversationError> {
        let entry = self
            .matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or(ConversationError::UnknownMatch(match_id))?;
        entry.read = true;
        if let Some(log) = self.logs.get_mut(&match_id) {
            for message in log {
                message.read = true;
            }
        }
        Ok(())
    }

    /// Remove a match and its log (the "block" collaborator hook).
    pub fn remove_match(&mut self, match_id: MatchId) -> Result<Match, ConversationError> {
        let index = self
            .matches
            .iter()
            .position(|m| m.id == match_id)
            .ok_or(ConversationError::UnknownMatch(match_id))?;
        self.logs.remove(&match_id);
        self.message_loads.remove(&match_id);
        Ok(self.matches.remove(index))
    }

    /// Match list in source order.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Look up one match.
    pub fn match_by_id(&self, match_id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    /// Message log for a match, oldest first. Empty while the match is
    /// cold (no load has resolved yet) or unknown.
    pub fn messages(&self, match_id: MatchId) -> &[Message] {
        self.logs.get(&match_id).map_or(&[], Vec::as_slice)
    }

    /// The local user's identifier.
    pub fn local_user(&self) -> UserId {
        self.me
    }

    /// Most recent load failure. `None` after a successful load.
    pub fn load_error(&self) -> Option<&SourceError> {
        self.last_error.as_ref()
    }

    /// Reset the load error field.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    };

    use raftup_core::model::CrewSummary;

    use super::*;

    const ME: UserId = 1;
    const THEM: UserId = 2;

    #[derive(Clone, Default)]
    struct TestEnv {
        ticks: Arc<AtomicU64>,
    }

    impl Environment for TestEnv {
        fn now_ms(&self) -> i64 {
            1_000 + self.ticks.fetch_add(1, Ordering::Relaxed) as i64
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let step = self.ticks.fetch_add(1, Ordering::Relaxed);
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = (step as u8).wrapping_add(i as u8);
            }
        }
    }

    fn raft(id: MatchId) -> Match {
        Match {
            id,
            participants: [ME, THEM],
            crew: CrewSummary { crew_id: THEM, name: "Ava".into(), photo: None },
            created_at: 0,
            read: true,
            last_message: None,
        }
    }

    fn incoming(match_id: MatchId, id: MessageId, content: &str, at: i64) -> Message {
        Message {
            id,
            match_id,
            sender_id: THEM,
            kind: MessageKind::Text,
            content: content.into(),
            at,
            read: false,
            status: MessageStatus::Sent,
        }
    }

    fn loaded_store(matches: Vec<Match>) -> ConversationStore<TestEnv> {
        let mut store = ConversationStore::new(TestEnv::default(), ME);
        let token = store.begin_load_matches();
        assert!(store.complete_load_matches(token, Ok(matches)));
        store
    }

    #[test]
    fn send_appends_and_projects_last_message() {
        // matches = [{id: m1, last_message: None}]
        let mut store = loaded_store(vec![raft(1)]);

        let sent = store.send(1, "hi").unwrap();
        assert_eq!(sent.status, MessageStatus::Pending);

        let log = store.messages(1);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].content, "hi");

        let summary = store.match_by_id(1).and_then(|m| m.last_message.as_ref()).unwrap();
        assert_eq!(summary.content, "hi");
        assert_eq!(summary.at, sent.at);
    }

    #[test]
    fn send_rejects_blank_content_without_mutation() {
        let mut store = loaded_store(vec![raft(1)]);

        for content in ["", "   ", "\n\t"] {
            assert_eq!(store.send(1, content), Err(ConversationError::EmptyContent));
        }
        assert!(store.messages(1).is_empty());
        assert!(store.match_by_id(1).unwrap().last_message.is_none());
    }

    #[test]
    fn send_rejects_unknown_match() {
        let mut store = loaded_store(vec![raft(1)]);
        assert_eq!(store.send(99, "hi"), Err(ConversationError::UnknownMatch(99)));
    }

    #[test]
    fn acknowledge_flips_pending_to_sent() {
        let mut store = loaded_store(vec![raft(1)]);
        let sent = store.send(1, "see you at the dock").unwrap();

        store.acknowledge(1, sent.id, 777).unwrap();

        let log = store.messages(1);
        assert_eq!(log[0].id, 777);
        assert_eq!(log[0].status, MessageStatus::Sent);
        assert_eq!(log[0].content, "see you at the dock");

        // Second acknowledgment of the same id has nothing to match.
        assert_eq!(
            store.acknowledge(1, sent.id, 778),
            Err(ConversationError::UnknownMessage { match_id: 1, message_id: sent.id })
        );
    }

    #[test]
    fn received_message_is_inserted_in_timestamp_order() {
        let mut store = loaded_store(vec![raft(1)]);
        store.message_received(incoming(1, 11, "newest", 5_000)).unwrap();
        store.message_received(incoming(1, 10, "older", 4_000)).unwrap();

        let log = store.messages(1);
        assert_eq!(log[0].content, "older");
        assert_eq!(log[1].content, "newest");

        // Summary tracks the newest entry, not the latest arrival.
        let summary = store.match_by_id(1).and_then(|m| m.last_message.as_ref()).unwrap();
        assert_eq!(summary.content, "newest");
    }

    #[test]
    fn received_message_clears_read_flag_until_marked() {
        let mut store = loaded_store(vec![raft(1)]);
        assert!(store.match_by_id(1).unwrap().read);

        store.message_received(incoming(1, 11, "ahoy", 5_000)).unwrap();
        assert!(!store.match_by_id(1).unwrap().read);

        store.mark_read(1).unwrap();
        assert!(store.match_by_id(1).unwrap().read);
        assert!(store.messages(1).iter().all(|m| m.read));
    }

    #[test]
    fn cold_match_reads_as_empty_until_load_resolves() {
        let mut store = loaded_store(vec![raft(1)]);
        assert!(store.messages(1).is_empty());

        let token = store.begin_load_messages(1).unwrap();
        assert!(store.complete_load_messages(1, token, Ok(vec![incoming(1, 11, "ahoy", 5_000)])));
        assert_eq!(store.messages(1).len(), 1);

        // Summary refreshed from the fetched log tail.
        let summary = store.match_by_id(1).and_then(|m| m.last_message.as_ref()).unwrap();
        assert_eq!(summary.content, "ahoy");
    }

    #[test]
    fn stale_message_load_is_discarded() {
        let mut store = loaded_store(vec![raft(1)]);
        let stale = store.begin_load_messages(1).unwrap();
        let fresh = store.begin_load_messages(1).unwrap();

        assert!(store.complete_load_messages(1, fresh, Ok(vec![incoming(1, 11, "keep", 5_000)])));
        assert!(!store.complete_load_messages(1, stale, Ok(vec![incoming(1, 12, "drop", 6_000)])));

        let log = store.messages(1);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].content, "keep");
    }

    #[test]
    fn failed_match_load_retains_previous_list() {
        let mut store = loaded_store(vec![raft(1), raft(2)]);

        let token = store.begin_load_matches();
        assert!(store.complete_load_matches(token, Err(SourceError::Unavailable("offline".into()))));

        assert_eq!(store.matches().len(), 2);
        assert!(store.load_error().is_some());
        store.clear_error();
        assert!(store.load_error().is_none());
    }

    #[test]
    fn match_list_replace_drops_orphaned_logs() {
        let mut store = loaded_store(vec![raft(1), raft(2)]);
        store.send(2, "hello").unwrap();

        let token = store.begin_load_matches();
        assert!(store.complete_load_matches(token, Ok(vec![raft(1)])));

        // Match 2 is gone; its log must not linger.
        assert!(store.messages(2).is_empty());
        assert_eq!(store.send(2, "hello again"), Err(ConversationError::UnknownMatch(2)));
    }

    #[test]
    fn remove_match_drops_log_and_loads() {
        let mut store = loaded_store(vec![raft(1)]);
        store.send(1, "hello").unwrap();
        let token = store.begin_load_messages(1).unwrap();

        let removed = store.remove_match(1).unwrap();
        assert_eq!(removed.id, 1);
        assert!(store.messages(1).is_empty());
        assert!(!store.complete_load_messages(1, token, Ok(vec![])));
        assert_eq!(store.begin_load_messages(1), Err(ConversationError::UnknownMatch(1)));
    }
}
