//! Storage backends.
//!
//! - [`traits`]: The [`CounterStore`](traits::CounterStore) and
//!   [`DurableStore`](traits::DurableStore) seams
//! - [`redis`]: Production counter store (atomic ops, pipelined batches)
//! - [`sql`]: Production durable store over sqlx `Any` (SQLite/MySQL)
//! - [`memory`]: In-process doubles for both seams, used by tests

pub mod memory;
pub mod redis;
pub mod sql;
pub mod traits;
