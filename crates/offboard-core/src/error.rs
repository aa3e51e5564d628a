//! Error types for `offboard-core`.
//!
//! Only conditions that must stop a run before any mutation live here.
//! Expected per-step outcomes are typed values in [`crate::ledger`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("duplicate catalog rule for {relation}.{column}")]
  DuplicateRule { relation: String, column: String },

  #[error("invalid SQL identifier in catalog: {0:?}")]
  InvalidIdentifier(String),

  #[error("reparent rule for {relation}.{column} has an empty default")]
  EmptyDefault { relation: String, column: String },

  #[error(
    "rule {relation}.{column} rewrites a relation already cascade-deleted \
     by an earlier rule"
  )]
  RuleAfterCascade { relation: String, column: String },

  #[error("unknown role discriminant: {0:?}")]
  UnknownRole(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
