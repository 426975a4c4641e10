//! Core domain types.
//!
//! These structures are the client's view of the backend's world: swipeable
//! crew profiles, the decisions recorded against them, and the matches and
//! message logs that follow from mutual likes.
//!
//! All types are plain data. Ownership and mutation rules live in the state
//! machines of `raftup-app`: candidates are immutable once fetched, the
//! decision log is append-only (push on decide, pop on undo), and messages
//! are never rewritten after creation apart from pending-to-sent
//! acknowledgment.

use serde::{Deserialize, Serialize};

/// Identifier of a crew (a swipeable profile).
pub type CrewId = u64;

/// Identifier of a match.
pub type MatchId = u64;

/// Identifier of a message.
pub type MessageId = u64;

/// Identifier of a user account.
pub type UserId = u64;

/// Identifier of a recorded decision.
pub type DecisionId = u64;

/// Unix timestamp in milliseconds.
pub type TimestampMs = i64;

/// A crew's boat details, shown on the profile card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boat {
    /// Boat name (e.g. "Salty Dog").
    pub name: String,
    /// Make and model.
    pub model: String,
    /// Home marina. `None` if not shared.
    pub marina: Option<String>,
}

/// A swipeable profile in the discovery queue.
///
/// Immutable once fetched; the queue owns it for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Crew identifier assigned by the backend.
    pub id: CrewId,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u8,
    /// Distance from the viewer in kilometers.
    pub distance_km: f64,
    /// Profile bio text.
    pub bio: String,
    /// Photo URLs in display order.
    pub photos: Vec<String>,
    /// Identity-verified badge.
    pub verified: bool,
    /// Premium subscriber badge.
    pub premium: bool,
    /// Currently online.
    pub online: bool,
    /// Last activity timestamp.
    pub last_active: TimestampMs,
    /// Boat details. `None` for crews without a registered boat.
    pub boat: Option<Boat>,
}

/// Kind of a recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionKind {
    /// Passed on the crew.
    Pass,
    /// Liked the crew.
    Like,
    /// Super-liked the crew.
    Superlike,
    /// Boosted the crew's visibility (does not consume the card).
    Boost,
}

/// Cursor-consuming subset of [`DecisionKind`].
///
/// `decide` accepts only these; boosting goes through its own operation
/// because it leaves the cursor in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwipeKind {
    /// Pass on the current crew.
    Pass,
    /// Like the current crew.
    Like,
    /// Super-like the current crew.
    Superlike,
}

impl From<SwipeKind> for DecisionKind {
    fn from(kind: SwipeKind) -> Self {
        match kind {
            SwipeKind::Pass => Self::Pass,
            SwipeKind::Like => Self::Like,
            SwipeKind::Superlike => Self::Superlike,
        }
    }
}

/// A recorded user action on a crew.
///
/// Referenced crew must have been the current card when the decision was
/// made; the queue enforces this at append time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Locally generated decision identifier.
    pub id: DecisionId,
    /// Crew the decision was made on.
    pub crew_id: CrewId,
    /// What the user did.
    pub kind: DecisionKind,
    /// When the decision was made.
    pub at: TimestampMs,
}

/// Display summary of the matched crew, denormalized onto the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewSummary {
    /// Crew identifier.
    pub crew_id: CrewId,
    /// Display name.
    pub name: String,
    /// Primary photo URL. `None` if the crew has no photos.
    pub photo: Option<String>,
}

/// Denormalized newest-message summary for match list rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    /// Message content.
    pub content: String,
    /// Message timestamp.
    pub at: TimestampMs,
}

/// A mutual-like relationship with its own conversation thread.
///
/// Created by the backend when a mutual like is detected; on this client it
/// arrives via the match fetch. The `last_message` summary is updated
/// whenever a message is sent or received in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Match identifier assigned by the backend.
    pub id: MatchId,
    /// The two participant user identifiers.
    pub participants: [UserId; 2],
    /// Display summary of the matched crew.
    pub crew: CrewSummary,
    /// When the match was created.
    pub created_at: TimestampMs,
    /// Whether the conversation has been read by the local user.
    pub read: bool,
    /// Newest message in the conversation. `None` before the first message.
    pub last_message: Option<LastMessage>,
}

/// Kind of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// Image attachment.
    Image,
    /// Shared location.
    Location,
    /// System notice (e.g. "You rafted up!").
    System,
}

/// Delivery status of a message from the local client's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageStatus {
    /// Created locally, not yet acknowledged by the server.
    Pending,
    /// Acknowledged (or received from the server in the first place).
    Sent,
}

/// A message in a match's conversation.
///
/// Appended in timestamp order and never mutated after creation, except
/// that a `Pending` message may be acknowledged (id replaced with the
/// server-confirmed one, status flipped to `Sent`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier (locally generated until acknowledged).
    pub id: MessageId,
    /// Match this message belongs to.
    pub match_id: MatchId,
    /// Who sent it.
    pub sender_id: UserId,
    /// Content kind.
    pub kind: MessageKind,
    /// Message content (text, URL, or coordinates depending on kind).
    pub content: String,
    /// When the message was created.
    pub at: TimestampMs,
    /// Whether the local user has read it.
    pub read: bool,
    /// Delivery status.
    pub status: MessageStatus,
}

impl Match {
    /// Whether the given user participates in this match.
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participants.contains(&user_id)
    }
}
