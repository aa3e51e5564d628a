//! Collaborator traits for the two planes and the audit sink.
//!
//! The data plane holds the account's business record and every relation
//! that references it. The identity plane holds the account's login. They
//! are separate systems with no shared transaction. Backends (e.g.
//! `offboard-store-sqlite`) implement these traits; the cascade depends only
//! on the abstraction.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  entity::{Role, TargetEntity},
  report::DeletionEvent,
};

// ─── Result shapes ───────────────────────────────────────────────────────────

/// Rows touched by a keyed delete, update, or count.
///
/// A missing relation is a normal answer, not an error: the catalog names
/// tables a deployment may not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affected {
  Rows(u64),
  RelationAbsent,
}

/// Outcome of removing a whole record from either plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRemoval {
  Removed,
  /// The record was already gone.
  NotFound,
}

// ─── Data plane ──────────────────────────────────────────────────────────────

pub trait DataStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The account's data-plane record, if it still exists.
  fn fetch_entity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TargetEntity>, Self::Error>> + Send + '_;

  /// Number of active accounts holding `role`.
  fn count_live_holders(
    &self,
    role: Role,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Count rows in `relation` whose `column` equals `target`.
  fn count_matching<'a>(
    &'a self,
    relation: &'a str,
    column: &'a str,
    target: Uuid,
  ) -> impl Future<Output = Result<Affected, Self::Error>> + Send + 'a;

  /// Whether the account's data-plane record still exists.
  fn record_exists(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Delete every row in `relation` whose `column` equals `target`.
  fn delete_matching<'a>(
    &'a self,
    relation: &'a str,
    column: &'a str,
    target: Uuid,
  ) -> impl Future<Output = Result<Affected, Self::Error>> + Send + 'a;

  /// Set `column` to `value` (NULL when `None`) on every row in `relation`
  /// whose `column` equals `target`.
  fn assign_matching<'a>(
    &'a self,
    relation: &'a str,
    column: &'a str,
    target: Uuid,
    value: Option<&'a str>,
  ) -> impl Future<Output = Result<Affected, Self::Error>> + Send + 'a;

  /// Remove the account's data-plane record itself.
  fn remove_record(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<RecordRemoval, Self::Error>> + Send + '_;
}

// ─── Identity plane ──────────────────────────────────────────────────────────

pub trait IdentityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Remove the login for `id`. `NotFound` means a previous run got there
  /// first and is not a failure.
  fn remove_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<RecordRemoval, Self::Error>> + Send + '_;

  fn identity_exists(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Audit ───────────────────────────────────────────────────────────────────

/// Write-only sink for removal events. Delivery failures are logged by the
/// caller and never change a run's outcome.
pub trait AuditSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn record_deletion<'a>(
    &'a self,
    event: &'a DeletionEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
