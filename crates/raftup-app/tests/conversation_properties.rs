//! Property-based tests for the conversation store.
//!
//! Verifies that under arbitrary interleavings of optimistic sends and
//! incoming messages the log stays timestamp-ordered and the match's
//! `last_message` summary always mirrors the newest log entry.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use proptest::prelude::*;
use raftup_app::ConversationStore;
use raftup_core::{
    env::Environment,
    model::{
        CrewSummary, Match, MatchId, Message, MessageKind, MessageStatus, UserId,
    },
};

const ME: UserId = 1;
const THEM: UserId = 2;
const MATCH: MatchId = 9001;

/// Deterministic stepping environment; timestamps strictly increase.
#[derive(Clone, Default)]
struct SimEnv {
    ticks: Arc<AtomicU64>,
}

impl Environment for SimEnv {
    fn now_ms(&self) -> i64 {
        1_000_000 + self.ticks.fetch_add(1, Ordering::Relaxed) as i64
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let step = self.ticks.fetch_add(1, Ordering::Relaxed);
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = (step as u8).wrapping_add(i as u8);
        }
    }
}

fn loaded_store() -> ConversationStore<SimEnv> {
    let mut store = ConversationStore::new(SimEnv::default(), ME);
    let token = store.begin_load_matches();
    let seed = Match {
        id: MATCH,
        participants: [ME, THEM],
        crew: CrewSummary { crew_id: THEM, name: "Ava".into(), photo: None },
        created_at: 0,
        read: true,
        last_message: None,
    };
    assert!(store.complete_load_matches(token, Ok(vec![seed])));
    store
}

/// One step of conversation activity.
#[derive(Debug, Clone)]
enum Activity {
    /// Local user sends this content.
    Send(String),
    /// Other participant's message arrives with this timestamp offset.
    Receive { content: String, at: i64 },
}

fn activity_strategy() -> impl Strategy<Value = Activity> {
    prop_oneof![
        "[a-z ]{0,12}".prop_map(Activity::Send),
        ("[a-z]{1,12}", 0i64..900_000)
            .prop_map(|(content, at)| Activity::Receive { content, at }),
    ]
}

proptest! {
    /// The log is always timestamp-ordered and the summary mirrors the
    /// newest entry, no matter how sends and receives interleave.
    #[test]
    fn prop_summary_tracks_newest_entry(
        activities in prop::collection::vec(activity_strategy(), 0..24),
    ) {
        let mut store = loaded_store();
        let mut next_id = 10_000u64;

        for activity in activities {
            match activity {
                Activity::Send(content) => {
                    let result = store.send(MATCH, &content);
                    prop_assert_eq!(result.is_ok(), !content.trim().is_empty());
                },
                Activity::Receive { content, at } => {
                    next_id += 1;
                    let message = Message {
                        id: next_id,
                        match_id: MATCH,
                        sender_id: THEM,
                        kind: MessageKind::Text,
                        content,
                        at,
                        read: false,
                        status: MessageStatus::Sent,
                    };
                    prop_assert!(store.message_received(message).is_ok());
                },
            }

            let log = store.messages(MATCH);
            for pair in log.windows(2) {
                prop_assert!(pair[0].at <= pair[1].at);
            }

            let summary = store.match_by_id(MATCH).and_then(|m| m.last_message.clone());
            match (summary, log.last()) {
                (Some(summary), Some(newest)) => {
                    prop_assert_eq!(&summary.content, &newest.content);
                    prop_assert_eq!(summary.at, newest.at);
                },
                (None, None) => {},
                (summary, newest) => prop_assert!(
                    false,
                    "summary/log disagree: {summary:?} vs {newest:?}",
                ),
            }
        }
    }

    /// Sending never mutates any state when the content is blank.
    #[test]
    fn prop_blank_send_never_mutates(blank in "[ \t\n]{0,8}") {
        let mut store = loaded_store();
        store.send(MATCH, "anchor down").unwrap();
        let before = store.messages(MATCH).to_vec();

        prop_assert!(store.send(MATCH, &blank).is_err());
        prop_assert_eq!(store.messages(MATCH), before.as_slice());
    }
}
