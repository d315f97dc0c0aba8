//! Storage module for Pulse Monitor.
//!
//! Holds the target/outcome model and the SQLite-backed key-value slot the
//! registry is persisted into.

mod models;
mod store;

pub use models::*;
pub use store::*;
