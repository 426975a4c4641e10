//! Environment abstraction for deterministic testing.
//!
//! Decouples state-machine logic from system resources (time, randomness).
//! Production code uses [`SystemEnv`]; tests supply a seeded environment
//! with a virtual clock so every generated identifier and timestamp is
//! reproducible.

use crate::model::TimestampMs;

/// Abstract environment providing time and randomness.
///
/// # Invariants
///
/// - `now_ms()` MUST be non-decreasing within a single execution context.
/// - Given the same seed, a simulation environment produces the same byte
///   sequence from `random_bytes()`.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time as Unix milliseconds.
    fn now_ms(&self) -> TimestampMs;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    ///
    /// Convenience for local identifiers (decisions, optimistic messages).
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

/// Production environment using system time and the OS RNG.
///
/// Wall-clock time can in principle step backwards across NTP adjustments;
/// consumers only use it for display timestamps, so no monotonic clamp is
/// applied here.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now_ms(&self) -> TimestampMs {
        std::time::UNIX_EPOCH.elapsed().map_or(0, |d| d.as_millis() as i64)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        use rand::RngCore;
        rand::rngs::OsRng.fill_bytes(buffer);
    }
}
