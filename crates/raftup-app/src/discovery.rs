//! Discovery queue state machine.
//!
//! Maintains the ordered candidate sequence and the user's position in it,
//! recording and reversing swipe decisions. Pure state machine: the fetch
//! itself happens outside via [`DiscoveryQueue::begin_load`] /
//! [`DiscoveryQueue::complete_load`], so no I/O dependencies and fully
//! testable in simulation.
//!
//! # Responsibilities
//!
//! - Holds the candidate queue in exactly the order the source returned it.
//! - Guards every decision against stale UI calls (the decided candidate
//!   must be the current card).
//! - Tracks the append-only decision log and supports undo.
//! - Tracks the remaining-boost allowance.

use std::collections::HashSet;

use raftup_core::{
    env::Environment,
    model::{Candidate, CrewId, Decision, DecisionKind, SwipeKind},
    source::SourceError,
};
use thiserror::Error;

use crate::load::{LoadToken, LoadTracker};

/// Boosts granted to a fresh session.
const DEFAULT_BOOST_ALLOWANCE: u32 = 3;

/// Errors from discovery queue operations.
///
/// None of these are fatal: mismatches and exhaustion reject the call
/// without mutating state, and the caller decides whether to surface them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// No current candidate; the queue is exhausted.
    #[error("discovery queue exhausted")]
    Exhausted,

    /// Decision targeted a candidate other than the current card.
    ///
    /// Guards against stale UI calls racing a cursor advance.
    #[error("stale decision: expected crew {expected}, got {got}")]
    CandidateMismatch {
        /// Crew at the current cursor.
        expected: CrewId,
        /// Crew the caller tried to decide on.
        got: CrewId,
    },

    /// No boosts remaining.
    #[error("no boosts remaining")]
    BoostsExhausted,

    /// Nothing to undo (empty log, or the last swipe is no longer
    /// reversible after a reload reset the cursor).
    #[error("nothing to undo")]
    NothingToUndo,
}

/// Read-only progress snapshot for the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueProgress {
    /// Zero-based cursor position.
    pub position: usize,
    /// Total candidates in the queue.
    pub total: usize,
    /// Boosts still available.
    pub boosts_remaining: u32,
}

/// Discovery queue state machine.
///
/// # Invariants
///
/// - The cursor is always in `[0, candidates.len()]`; at `len` the queue is
///   exhausted.
/// - Every decision in the log was made on the candidate that was current
///   at decision time.
/// - Queue order is source order; reloads filter already-decided crews by
///   set membership without touching the log.
#[derive(Debug, Clone)]
pub struct DiscoveryQueue<E: Environment> {
    /// Environment for timestamps and local identifiers.
    env: E,
    /// Candidate queue in source order.
    candidates: Vec<Candidate>,
    /// Index of the current card.
    cursor: usize,
    /// Append-only decision log.
    decisions: Vec<Decision>,
    /// Remaining boost allowance.
    boosts_remaining: u32,
    /// Most recent load failure, if any. Cleared by a successful load or
    /// [`DiscoveryQueue::clear_error`].
    last_error: Option<SourceError>,
    /// Token sequence for in-flight loads.
    loads: LoadTracker,
}

impl<E: Environment> DiscoveryQueue<E> {
    /// Create an empty queue with the default boost allowance.
    pub fn new(env: E) -> Self {
        Self::with_boosts(env, DEFAULT_BOOST_ALLOWANCE)
    }

    /// Create an empty queue with an explicit boost allowance.
    pub fn with_boosts(env: E, boosts: u32) -> Self {
        Self {
            env,
            candidates: Vec::new(),
            cursor: 0,
            decisions: Vec::new(),
            boosts_remaining: boosts,
            last_error: None,
            loads: LoadTracker::default(),
        }
    }

    /// Begin a load, staling every earlier in-flight request.
    ///
    /// The caller fetches from its data source and hands the result back to
    /// [`DiscoveryQueue::complete_load`] together with this token.
    pub fn begin_load(&mut self) -> LoadToken {
        self.loads.issue()
    }

    /// Apply a load resolution.
    ///
    /// Returns `false` and leaves all state untouched when the token is
    /// stale (a newer load was begun since). Otherwise: on success the
    /// queue is replaced with the fetched candidates minus every crew
    /// already in the decision log, the cursor resets to 0, and any
    /// previous error is cleared; on failure the previous queue and cursor
    /// are retained and the error is recorded for the caller to surface.
    pub fn complete_load(
        &mut self,
        token: LoadToken,
        result: Result<Vec<Candidate>, SourceError>,
    ) -> bool {
        if !self.loads.is_current(token) {
            tracing::debug!(?token, "discarding stale discovery load");
            return false;
        }

        match result {
            Ok(candidates) => {
                let decided: HashSet<CrewId> = self.decisions.iter().map(|d| d.crew_id).collect();
                self.candidates =
                    candidates.into_iter().filter(|c| !decided.contains(&c.id)).collect();
                self.cursor = 0;
                self.last_error = None;
                tracing::debug!(count = self.candidates.len(), "discovery queue replaced");
            },
            Err(err) => {
                tracing::warn!(%err, "discovery load failed, keeping previous queue");
                self.last_error = Some(err);
            },
        }
        true
    }

    /// Record a swipe on the current card and advance the cursor.
    ///
    /// `crew_id` must match the current candidate; this is the guard
    /// against decisions arriving from a stale view of the queue.
    /// Persistence and transmission of the decision are the caller's
    /// responsibility.
    pub fn decide(&mut self, crew_id: CrewId, kind: SwipeKind) -> Result<Decision, DiscoveryError> {
        let expected = self.current().ok_or(DiscoveryError::Exhausted)?.id;
        if expected != crew_id {
            return Err(DiscoveryError::CandidateMismatch { expected, got: crew_id });
        }

        let decision = Decision {
            id: self.env.random_u64(),
            crew_id,
            kind: kind.into(),
            at: self.env.now_ms(),
        };
        self.decisions.push(decision.clone());
        self.cursor += 1;
        tracing::debug!(crew_id, ?kind, cursor = self.cursor, "swipe recorded");
        Ok(decision)
    }

    /// Boost the current card's visibility.
    ///
    /// Consumes one boost but not the card: the cursor stays put. A no-op
    /// rejection when no boosts remain.
    pub fn boost(&mut self, crew_id: CrewId) -> Result<Decision, DiscoveryError> {
        let expected = self.current().ok_or(DiscoveryError::Exhausted)?.id;
        if expected != crew_id {
            return Err(DiscoveryError::CandidateMismatch { expected, got: crew_id });
        }
        if self.boosts_remaining == 0 {
            return Err(DiscoveryError::BoostsExhausted);
        }

        self.boosts_remaining -= 1;
        let decision = Decision {
            id: self.env.random_u64(),
            crew_id,
            kind: DecisionKind::Boost,
            at: self.env.now_ms(),
        };
        self.decisions.push(decision.clone());
        tracing::debug!(crew_id, remaining = self.boosts_remaining, "boost recorded");
        Ok(decision)
    }

    /// Remove the last decision and reverse its effect.
    ///
    /// Swipes move the cursor back one card; boosts refund the allowance
    /// and leave the cursor alone. There is no redo: once the log is empty
    /// further undos reject without effect. Returns the undone decision so
    /// the caller can retract it from any transmission queue.
    pub fn undo(&mut self) -> Result<Decision, DiscoveryError> {
        let last = self.decisions.last().cloned().ok_or(DiscoveryError::NothingToUndo)?;

        match last.kind {
            DecisionKind::Boost => {
                self.boosts_remaining += 1;
            },
            DecisionKind::Pass | DecisionKind::Like | DecisionKind::Superlike => {
                // A reload after the swipe resets the cursor to 0 and drops
                // the decided crew from the queue; that swipe can no longer
                // be walked back.
                if self.cursor == 0 {
                    return Err(DiscoveryError::NothingToUndo);
                }
                self.cursor -= 1;
            },
        }
        self.decisions.pop();
        tracing::debug!(crew_id = last.crew_id, cursor = self.cursor, "decision undone");
        Ok(last)
    }

    /// The candidate at the cursor. `None` when the queue is exhausted.
    pub fn current(&self) -> Option<&Candidate> {
        self.candidates.get(self.cursor)
    }

    /// Whether the cursor has reached the end of the queue.
    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.candidates.len()
    }

    /// Candidate queue in source order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The append-only decision log, oldest first.
    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// Boosts still available.
    pub fn boosts_remaining(&self) -> u32 {
        self.boosts_remaining
    }

    /// Progress snapshot for the view layer.
    pub fn progress(&self) -> QueueProgress {
        QueueProgress {
            position: self.cursor,
            total: self.candidates.len(),
            boosts_remaining: self.boosts_remaining,
        }
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
