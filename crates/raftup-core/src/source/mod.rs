//! Data-source abstraction for the fetch boundary.
//!
//! The state machines in `raftup-app` never perform I/O themselves; a
//! [`DataSource`] hands them full result sets at explicit suspension
//! points. The trait is agnostic to its backing: a remote API in
//! production, [`FixtureSource`] in tests and demos, or [`FlakySource`]
//! when exercising failure paths.

mod fixture;
mod flaky;

use async_trait::async_trait;
pub use fixture::FixtureSource;
pub use flaky::FlakySource;
use thiserror::Error;

use crate::model::{Candidate, Match, MatchId, Message};

/// Errors reported by a data source.
///
/// All source errors are recoverable from the client's point of view: the
/// consuming store keeps its previous state and surfaces the error for the
/// caller to display and retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source could not be reached or refused the request.
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    /// A message fetch referenced a match the source does not know.
    #[error("unknown match: {0}")]
    UnknownMatch(MatchId),
}

/// Read-only fetch boundary the client cores consume.
///
/// Each call resolves with the complete result set or a [`SourceError`];
/// there are no partial results and no streaming. Timeout policy belongs to
/// the implementation, not to the consumers.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the discovery candidates, in the order the backend ranked them.
    async fn fetch_candidates(&self) -> Result<Vec<Candidate>, SourceError>;

    /// Fetch the match list for the local user.
    async fn fetch_matches(&self) -> Result<Vec<Match>, SourceError>;

    /// Fetch the full message log for a match, oldest first.
    async fn fetch_messages(&self, match_id: MatchId) -> Result<Vec<Message>, SourceError>;
}
