//! Quill DB — store implementations.
//!
//! This crate provides:
//! - SurrealDB connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - SurrealDB implementations of the `quill-core` store traits
//! - An in-memory fixture-backed store ([`MemoryStore`]) for
//!   development and tests

mod connection;
mod error;
pub mod memory;
mod schema;
pub mod store;

pub use connection::{DbConfig, DbManager};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use schema::run_migrations;
