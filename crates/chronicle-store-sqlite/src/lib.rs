//! SQLite backend for the Chronicle stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. One [`SqliteStore`] implements
//! both the activity log and the directory persistence.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
