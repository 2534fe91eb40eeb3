//! Persistence boundary.
//!
//! The engine consumes a small set of storage capabilities: row-level
//! read/write in transactions, compare-and-swap on a version column and
//! named advisory locks. [`MemoryStore`] provides them in process; a
//! database-backed store would implement the same surface.

mod memory;

pub use memory::{GenerationLockGuard, MemoryStore, VersionedCumulant};
