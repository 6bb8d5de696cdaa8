//! SQLite backend for the identity store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every resolution runs inside a single
//! `BEGIN IMMEDIATE` transaction on that thread.

mod encode;
mod repository;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use repository::SqliteRepository;
pub use store::SqliteStore;
