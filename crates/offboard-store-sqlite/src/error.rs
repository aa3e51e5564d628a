//! Error type for `offboard-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] offboard_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decode error: {0}")]
  Decode(String),

  #[error("unknown column {relation}.{column}")]
  UnknownColumn { relation: String, column: String },

  /// A relation or column name that cannot be safely spliced into SQL.
  #[error("invalid SQL identifier: {0:?}")]
  InvalidIdentifier(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
