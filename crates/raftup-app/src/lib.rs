//! Application layer for Raftup
//!
//! Pure state machines for the client's discovery and conversation state,
//! plus the session composition root that holds the I/O boundary. The
//! state machines never perform I/O themselves, so the same code runs in
//! production and in deterministic simulation tests.
//!
//! # Components
//!
//! - [`DiscoveryQueue`]: candidate queue, cursor, decision log, undo
//! - [`ConversationStore`]: match list and per-match message logs with
//!   optimistic send
//! - [`DecisionOutbox`]: persisted best-effort retry queue of undelivered
//!   decisions
//! - [`Session`]: injectable composition root owning the fetch boundary

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod conversation;
mod discovery;
mod load;
mod outbox;
mod session;

pub use conversation::{ConversationError, ConversationStore};
pub use discovery::{DiscoveryError, DiscoveryQueue, QueueProgress};
pub use load::LoadToken;
pub use outbox::{DecisionOutbox, OutboxError, QueuedDecision};
pub use session::{Session, SessionError};
