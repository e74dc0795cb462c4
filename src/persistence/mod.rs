//! SQLite-backed persistence for the durable-before-return aggregates
//! named in SPEC_FULL.md §4.13, gated behind the `persistence` feature.
//!
//! Every subsystem that accepts a pool holds `Option<Arc<DbPool>>` and
//! degrades to in-memory-only operation when it's `None` — this module
//! never becomes a hard dependency for the rest of the crate.

pub mod models;
pub mod pool;
pub mod repo;
mod schema;

pub use pool::{DbError, DbPool, init};
