//! Load request tokens.
//!
//! Fetches are split into `begin_load` / `complete_load` pairs so the state
//! machines stay sans-IO. Each `begin_load` issues a token from a
//! monotonically increasing sequence; a resolution carrying anything older
//! than the newest issued token is stale and must be discarded without
//! touching state. This replaces the last-write-wins race that concurrent
//! loads would otherwise have.

/// Opaque token identifying one in-flight load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadToken(u64);

/// Issues tokens and decides which resolutions are still current.
///
/// A token is current only while it is the newest one issued; issuing a new
/// token implicitly stales every earlier in-flight request.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoadTracker {
    newest: u64,
}

impl LoadTracker {
    /// Issue the next token.
    pub(crate) fn issue(&mut self) -> LoadToken {
        self.newest += 1;
        LoadToken(self.newest)
    }

    /// Whether a resolution carrying this token may be applied.
    pub(crate) fn is_current(&self, token: LoadToken) -> bool {
        token.0 == self.newest
    }
}
