//! Error type for `offboard-cascade`.
//!
//! Runs never fail; only the standalone verification read can.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("data store error: {0}")]
  DataStore(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("identity store error: {0}")]
  IdentityStore(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
