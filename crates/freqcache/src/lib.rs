//! # freqcache
//!
//! Byte-budgeted in-memory cache with pluggable eviction policies.
//!
//! ## Architecture
//! - **Entry table**: AHash map from key to a stable slot handle (O(1))
//! - **Priority queue**: index-tracking binary min-heap keyed by access
//!   frequency (O(log n) insert, update, removal)
//! - **Policies**: [`Lfu`] and [`Fifo`] behind the common [`Cache`] trait
//! - **Sharing**: [`SyncCache`] adds a mutex around any policy
//!
//! Every policy accounts `value size + ENTRY_OVERHEAD` bytes per entry and
//! evicts one entry when a fresh insert pushes the total over the budget.

#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod fifo;
mod lfu;
mod queue;
mod size;
mod stats;
mod sync;

pub use cache::{Cache, OnEvicted};
pub use config::{ByteBudget, CacheConfig};
pub use error::{Error, Result};
pub use fifo::Fifo;
pub use lfu::Lfu;
pub use size::{ByteSize, ENTRY_OVERHEAD};
pub use stats::CacheStats;
pub use sync::SyncCache;
