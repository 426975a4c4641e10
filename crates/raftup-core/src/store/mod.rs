//! Key-value persistence seam.
//!
//! Small trait-based abstraction over whatever durable storage the host
//! platform provides. The trait is synchronous to keep consumers sans-IO;
//! async backends belong behind their own adapter.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

/// Durable key-value store for small client-side blobs.
///
/// This trait must be:
/// - Clone: can be handed to multiple consumers
/// - Send + Sync: thread-safe for concurrent access
/// - Synchronous: no async methods
///
/// # Clone Semantics
///
/// Implementations typically share internal state via Arc, meaning clones
/// access the same underlying storage.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    /// Store a value under a key, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the underlying storage fails.
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Load the value stored under a key.
    ///
    /// Returns `None` if the key has never been written or was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the underlying storage fails.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the underlying storage fails.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
