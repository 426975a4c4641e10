//! Domain model and I/O seams for the Raftup client core.
//!
//! Raftup is a boating-themed social product; this crate holds the parts of
//! its client that are independent of any view layer:
//!
//! - [`model`]: crews, decisions, matches, and messages.
//! - [`env`]: the [`env::Environment`] abstraction for time and randomness,
//!   enabling deterministic simulation tests.
//! - [`source`]: the [`source::DataSource`] fetch boundary plus fixture and
//!   fault-injection implementations.
//! - [`store`]: the [`store::KeyValueStore`] persistence seam used by the
//!   offline decision outbox.
//!
//! State machines that consume these seams live in `raftup-app`.

pub mod env;
pub mod model;
pub mod source;
pub mod store;
