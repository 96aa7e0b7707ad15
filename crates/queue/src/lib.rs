//! Command queues keyed by EA identifier.
//!
//! Each EA id owns a FIFO of pending [`Command`]s. Operations on one id are
//! serialized by that key's shard lock; different ids do not contend.

pub mod store;

pub use store::*;

pub use eabridge_core::Command;
