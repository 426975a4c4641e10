//! Fault-injecting data source wrapper.
//!
//! Delegates to an underlying source but randomly fails fetches based on a
//! configured failure rate. Used to verify that consumers retain previous
//! state and surface recoverable errors when the network is misbehaving.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{DataSource, SourceError};
use crate::model::{Candidate, Match, MatchId, Message};

/// Wrapper that randomly injects [`SourceError::Unavailable`] failures.
///
/// Uses an `Arc<Mutex<>>` around the RNG state, making it Clone and
/// thread-safe; clones share one failure sequence.
#[derive(Clone)]
pub struct FlakySource<S> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail).
    failure_rate: f64,
    /// RNG state for deterministic chaos.
    rng: Arc<Mutex<FlakyRng>>,
}

/// Simple deterministic RNG for failure injection.
///
/// Linear congruential generator so failure sequences are reproducible
/// with the same seed.
struct FlakyRng {
    state: u64,
}

impl FlakyRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate next random value in [0.0, 1.0).
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }

    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<S> FlakySource<S> {
    /// Create a new flaky wrapper with a fixed default seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0].
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible failures.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0].
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self { inner, failure_rate, rng: Arc::new(Mutex::new(FlakyRng::new(seed))) }
    }

    #[allow(clippy::expect_used)]
    fn roll(&self) -> bool {
        self.rng.lock().expect("Mutex poisoned").should_fail(self.failure_rate)
    }

    fn injected(operation: &str) -> SourceError {
        SourceError::Unavailable(format!("injected failure during {operation}"))
    }
}

#[async_trait]
impl<S: DataSource> DataSource for FlakySource<S> {
    async fn fetch_candidates(&self) -> Result<Vec<Candidate>, SourceError> {
        if self.roll() {
            return Err(Self::injected("fetch_candidates"));
        }
        self.inner.fetch_candidates().await
    }

    async fn fetch_matches(&self) -> Result<Vec<Match>, SourceError> {
        if self.roll() {
            return Err(Self::injected("fetch_matches"));
        }
        self.inner.fetch_matches().await
    }

    async fn fetch_messages(&self, match_id: MatchId) -> Result<Vec<Message>, SourceError> {
        if self.roll() {
            return Err(Self::injected("fetch_messages"));
        }
        self.inner.fetch_messages(match_id).await
    }
}
