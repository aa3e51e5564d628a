//! SQLite backends for the offboard cascade.
//!
//! [`SqliteStore`] is the data plane (business records plus every relation
//! that references a staff account) and also serves as the audit sink.
//! [`SqliteIdentityStore`] is the identity plane and lives in its own
//! database file, so the two final removals never share a transaction.
//!
//! Both wrap [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime.

mod encode;
mod identity;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use identity::SqliteIdentityStore;
pub use store::SqliteStore;
