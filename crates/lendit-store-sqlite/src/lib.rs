//! SQLite backend for the Lendit rental store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That single connection thread is also
//! the atomicity mechanism: a closure passed to `call` executes to completion
//! before the next one starts, so check-then-write sequences inside one
//! closure cannot interleave.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
