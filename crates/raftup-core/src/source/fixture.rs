//! In-memory fixture data source for testing and demos.
//!
//! Stands in for the remote API with seeded, boating-themed profiles and
//! conversations. Clones share state through `Arc<Mutex<_>>`, so a test can
//! hold one handle to mutate fixtures while the session under test holds
//! another.

#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::{DataSource, SourceError};
use crate::model::{
    Boat, Candidate, CrewSummary, Match, MatchId, Message, MessageKind, MessageStatus, UserId,
};

/// In-memory data source with controllable failure toggles.
///
/// All operations are synchronous under the hood; the async trait methods
/// resolve immediately. Uses `lock().expect()` which will panic if the
/// mutex is poisoned - acceptable for test/fixture code.
#[derive(Clone)]
pub struct FixtureSource {
    inner: Arc<Mutex<FixtureInner>>,
}

struct FixtureInner {
    /// Discovery candidates in backend ranking order.
    candidates: Vec<Candidate>,
    /// Match list for the local user.
    matches: Vec<Match>,
    /// Message logs keyed by match, oldest first.
    messages: HashMap<MatchId, Vec<Message>>,
    /// Force the next (and subsequent) candidate fetches to fail.
    fail_candidates: bool,
    /// Force match fetches to fail.
    fail_matches: bool,
    /// Force message fetches to fail.
    fail_messages: bool,
}

impl FixtureSource {
    /// User id the seeded fixtures assume for the local account.
    pub const LOCAL_USER: UserId = 1;

    /// Create an empty fixture source.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FixtureInner {
                candidates: Vec::new(),
                matches: Vec::new(),
                messages: HashMap::new(),
                fail_candidates: false,
                fail_matches: false,
                fail_messages: false,
            })),
        }
    }

    /// Create a source pre-populated with the seeded boating fixtures:
    /// five candidates, two matches, and a short log per match.
    pub fn seeded() -> Self {
        let source = Self::new();
        source.set_candidates(seed_candidates());
        source.set_matches(seed_matches());
        for (match_id, log) in seed_messages() {
            source.set_messages(match_id, log);
        }
        source
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, FixtureInner> {
        self.inner.lock().expect("Mutex poisoned")
    }

    /// Replace the candidate list.
    pub fn set_candidates(&self, candidates: Vec<Candidate>) {
        self.lock().candidates = candidates;
    }

    /// Replace the match list.
    pub fn set_matches(&self, matches: Vec<Match>) {
        self.lock().matches = matches;
    }

    /// Replace the message log for a match.
    pub fn set_messages(&self, match_id: MatchId, messages: Vec<Message>) {
        self.lock().messages.insert(match_id, messages);
    }

    /// Make candidate fetches fail until re-enabled.
    pub fn fail_candidates(&self, fail: bool) {
        self.lock().fail_candidates = fail;
    }

    /// Make match fetches fail until re-enabled.
    pub fn fail_matches(&self, fail: bool) {
        self.lock().fail_matches = fail;
    }

    /// Make message fetches fail until re-enabled.
    pub fn fail_messages(&self, fail: bool) {
        self.lock().fail_messages = fail;
    }
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    async fn fetch_candidates(&self) -> Result<Vec<Candidate>, SourceError> {
        let inner = self.lock();
        if inner.fail_candidates {
            return Err(SourceError::Unavailable("fixture candidate fetch disabled".into()));
        }
        Ok(inner.candidates.clone())
    }

    async fn fetch_matches(&self) -> Result<Vec<Match>, SourceError> {
        let inner = self.lock();
        if inner.fail_matches {
            return Err(SourceError::Unavailable("fixture match fetch disabled".into()));
        }
        Ok(inner.matches.clone())
    }

    async fn fetch_messages(&self, match_id: MatchId) -> Result<Vec<Message>, SourceError> {
        let inner = self.lock();
        if inner.fail_messages {
            return Err(SourceError::Unavailable("fixture message fetch disabled".into()));
        }
        inner.messages.get(&match_id).cloned().ok_or(SourceError::UnknownMatch(match_id))
    }
}

/// Base timestamp for seeded fixtures: 2025-06-01T00:00:00Z.
const SEED_EPOCH_MS: i64 = 1_748_736_000_000;

fn seed_candidates() -> Vec<Candidate> {
    vec![
        Candidate {
            id: 101,
            name: "Maya".into(),
            age: 29,
            distance_km: 3.2,
            bio: "Weekend sailor, sunset races out of Shilshole. Looking for a crew that \
                  doesn't mind getting wet."
                .into(),
            photos: vec!["https://img.raftup.example/maya-1.jpg".into()],
            verified: true,
            premium: false,
            online: true,
            last_active: SEED_EPOCH_MS,
            boat: Some(Boat {
                name: "Salty Dog".into(),
                model: "Catalina 22".into(),
                marina: Some("Shilshole Bay".into()),
            }),
        },
        Candidate {
            id: 102,
            name: "Jonas".into(),
            age: 34,
            distance_km: 7.8,
            bio: "Liveaboard since 2021. Coffee on the foredeck beats any office.".into(),
            photos: vec![
                "https://img.raftup.example/jonas-1.jpg".into(),
                "https://img.raftup.example/jonas-2.jpg".into(),
            ],
            verified: true,
            premium: true,
            online: false,
            last_active: SEED_EPOCH_MS - 3_600_000,
            boat: Some(Boat {
                name: "Northern Drift".into(),
                model: "Nordic Tug 32".into(),
                marina: Some("Elliott Bay".into()),
            }),
        },
        Candidate {
            id: 103,
            name: "Priya".into(),
            age: 27,
            distance_km: 12.4,
            bio: "Kayaker crossing over to sail. Teach me your knots.".into(),
            photos: vec!["https://img.raftup.example/priya-1.jpg".into()],
            verified: false,
            premium: false,
            online: false,
            last_active: SEED_EPOCH_MS - 86_400_000,
            boat: None,
        },
        Candidate {
            id: 104,
            name: "Theo".into(),
            age: 41,
            distance_km: 18.9,
            bio: "Raced J/24s for a decade, now I mostly anchor out and grill.".into(),
            photos: vec!["https://img.raftup.example/theo-1.jpg".into()],
            verified: true,
            premium: false,
            online: true,
            last_active: SEED_EPOCH_MS,
            boat: Some(Boat {
                name: "Second Wind".into(),
                model: "J/24".into(),
                marina: None,
            }),
        },
        Candidate {
            id: 105,
            name: "Lena".into(),
            age: 31,
            distance_km: 25.0,
            bio: "Canal boat person. Slow water, fast friends.".into(),
            photos: vec![],
            verified: false,
            premium: false,
            online: false,
            last_active: SEED_EPOCH_MS - 172_800_000,
            boat: None,
        },
    ]
}

fn seed_matches() -> Vec<Match> {
    vec![
        Match {
            id: 9001,
            participants: [FixtureSource::LOCAL_USER, 201],
            crew: CrewSummary {
                crew_id: 201,
                name: "Ava".into(),
                photo: Some("https://img.raftup.example/ava-1.jpg".into()),
            },
            created_at: SEED_EPOCH_MS - 259_200_000,
            read: true,
            last_message: Some(LastMessageSeed::AVA.into_last_message()),
        },
        Match {
            id: 9002,
            participants: [FixtureSource::LOCAL_USER, 202],
            crew: CrewSummary { crew_id: 202, name: "Marco".into(), photo: None },
            created_at: SEED_EPOCH_MS - 86_400_000,
            read: false,
            last_message: None,
        },
    ]
}

/// Seed constants shared between the match summary and its log so the two
/// agree, as the store invariant requires.
struct LastMessageSeed {
    content: &'static str,
    at: i64,
}

impl LastMessageSeed {
    const AVA: Self =
        Self { content: "Raft up at Blake Island this weekend?", at: SEED_EPOCH_MS - 7_200_000 };

    fn into_last_message(self) -> crate::model::LastMessage {
        crate::model::LastMessage { content: self.content.into(), at: self.at }
    }
}

fn seed_messages() -> Vec<(MatchId, Vec<Message>)> {
    vec![
        (
            9001,
            vec![
                Message {
                    id: 50_001,
                    match_id: 9001,
                    sender_id: FixtureSource::LOCAL_USER,
                    kind: MessageKind::System,
                    content: "You rafted up with Ava!".into(),
                    at: SEED_EPOCH_MS - 259_200_000,
                    read: true,
                    status: MessageStatus::Sent,
                },
                Message {
                    id: 50_002,
                    match_id: 9001,
                    sender_id: FixtureSource::LOCAL_USER,
                    kind: MessageKind::Text,
                    content: "Ahoy! Love the ketch in your photos.".into(),
                    at: SEED_EPOCH_MS - 250_000_000,
                    read: true,
                    status: MessageStatus::Sent,
                },
                Message {
                    id: 50_003,
                    match_id: 9001,
                    sender_id: 201,
                    kind: MessageKind::Text,
                    content: LastMessageSeed::AVA.content.into(),
                    at: LastMessageSeed::AVA.at,
                    read: true,
                    status: MessageStatus::Sent,
                },
            ],
        ),
        (9002, vec![]),
    ]
}
