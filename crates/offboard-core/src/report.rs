//! Requests, reports, and the audit event derived from them.
//!
//! A [`DeletionReport`] is produced exactly once per run by
//! [`ReportDraft::finish`] and has no mutating methods. Its serialised form
//! is the response body of the invocation boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  entity::Role,
  ledger::{ExecutionLedger, ExecutionStep},
};

// ─── Request ─────────────────────────────────────────────────────────────────

/// One deletion request as it arrives at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRequest {
  pub target_id:    Uuid,
  /// The staff account asking for the deletion, when known.
  #[serde(default)]
  pub requested_by: Option<Uuid>,
}

impl DeletionRequest {
  pub fn new(target_id: Uuid) -> Self { Self { target_id, requested_by: None } }
}

// ─── Invariants ──────────────────────────────────────────────────────────────

/// A pre-flight check that failed. Any violation stops the run before the
/// first mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
  #[error("target is the last live holder of the {role} role")]
  LastRoleHolder { role: Role },

  #[error("an account cannot delete itself")]
  SelfDeletion,

  /// The guard could not read what it needed and refuses to guess.
  #[error("invariant guard unavailable: {reason}")]
  GuardUnavailable { reason: String },
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
  Success,
  AbortedByInvariant,
  AbortedByCriticalFailure,
  /// Data record gone, identity record still present. Safe to retry.
  PartialSuccess,
}

/// Result of one of the two final removals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Removal {
  Removed,
  /// Nothing to remove, typically because an earlier run already did.
  AlreadyAbsent,
  Failed(String),
}

impl Removal {
  /// The record is gone, whoever removed it.
  pub fn is_satisfied(&self) -> bool {
    matches!(self, Self::Removed | Self::AlreadyAbsent)
  }
}

// ─── Verification ────────────────────────────────────────────────────────────

/// Rows that still point at the target after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidualReference {
  pub relation: String,
  pub column:   String,
  pub rows:     u64,
}

/// Read-only snapshot of what is left of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
  pub target_id:               Uuid,
  pub data_record_present:     bool,
  pub identity_record_present: bool,
  #[serde(default)]
  pub residual_references:     Vec<ResidualReference>,
}

impl Verification {
  /// Neither plane holds a record for the target.
  pub fn records_absent(&self) -> bool {
    !self.data_record_present && !self.identity_record_present
  }

  /// Records absent and no catalogued relation still points at the target.
  pub fn is_clean(&self) -> bool {
    self.records_absent() && self.residual_references.is_empty()
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// The accumulating state of a run. Consumed by [`ReportDraft::finish`].
#[derive(Debug)]
pub struct ReportDraft {
  target_id:        Uuid,
  started_at:       DateTime<Utc>,
  violations:       Vec<InvariantViolation>,
  ledger:           ExecutionLedger,
  data_removal:     Option<Removal>,
  identity_removal: Option<Removal>,
  verification:     Option<Verification>,
}

impl ReportDraft {
  pub fn new(target_id: Uuid) -> Self {
    Self {
      target_id,
      started_at: Utc::now(),
      violations: Vec::new(),
      ledger: ExecutionLedger::new(),
      data_removal: None,
      identity_removal: None,
      verification: None,
    }
  }

  pub fn target_id(&self) -> Uuid { self.target_id }

  pub fn reject(&mut self, violations: Vec<InvariantViolation>) {
    self.violations.extend(violations);
  }

  /// Append a step and return it for inspection.
  pub fn record(&mut self, step: ExecutionStep) -> &ExecutionStep {
    self.ledger.record(step);
    // Just pushed, so the ledger is non-empty.
    &self.ledger.steps()[self.ledger.len() - 1]
  }

  pub fn ledger(&self) -> &ExecutionLedger { &self.ledger }

  pub fn data_removed(&mut self, removal: Removal) {
    self.data_removal = Some(removal);
  }

  pub fn identity_removed(&mut self, removal: Removal) {
    self.identity_removal = Some(removal);
  }

  pub fn verified(&mut self, verification: Verification) {
    self.verification = Some(verification);
  }

  /// Classify the run from what was recorded. `Success` requires no
  /// violation, no failed critical step, both removals satisfied, and, when
  /// a verification was taken, both records confirmed absent.
  pub fn outcome(&self) -> Outcome {
    if !self.violations.is_empty() {
      return Outcome::AbortedByInvariant;
    }
    if self.ledger.has_critical_failure() {
      return Outcome::AbortedByCriticalFailure;
    }
    match &self.data_removal {
      Some(r) if r.is_satisfied() => {}
      _ => return Outcome::AbortedByCriticalFailure,
    }
    match &self.identity_removal {
      Some(r) if r.is_satisfied() => {}
      _ => return Outcome::PartialSuccess,
    }
    match &self.verification {
      Some(v) if !v.records_absent() => Outcome::PartialSuccess,
      _ => Outcome::Success,
    }
  }

  pub fn finish(self) -> DeletionReport {
    let outcome = self.outcome();
    let data_record_removed = self
      .data_removal
      .as_ref()
      .is_some_and(Removal::is_satisfied);
    let identity_record_removed = self
      .identity_removal
      .as_ref()
      .is_some_and(Removal::is_satisfied);

    DeletionReport {
      success: outcome == Outcome::Success,
      outcome,
      target_id: self.target_id,
      violations: self.violations,
      ledger: self.ledger,
      data_record_removed,
      identity_record_removed,
      data_removal: self.data_removal,
      identity_removal: self.identity_removal,
      verification: self.verification,
      started_at: self.started_at,
      finished_at: Utc::now(),
    }
  }
}

/// The final, immutable artifact of one deletion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
  success:                 bool,
  outcome:                 Outcome,
  target_id:               Uuid,
  violations:              Vec<InvariantViolation>,
  ledger:                  ExecutionLedger,
  data_record_removed:     bool,
  identity_record_removed: bool,
  /// `None` when the run stopped before attempting this removal.
  data_removal:            Option<Removal>,
  identity_removal:        Option<Removal>,
  verification:            Option<Verification>,
  started_at:              DateTime<Utc>,
  finished_at:             DateTime<Utc>,
}

impl DeletionReport {
  pub fn is_success(&self) -> bool { self.success }

  pub fn outcome(&self) -> Outcome { self.outcome }

  pub fn target_id(&self) -> Uuid { self.target_id }

  pub fn violations(&self) -> &[InvariantViolation] { &self.violations }

  pub fn ledger(&self) -> &ExecutionLedger { &self.ledger }

  pub fn data_record_removed(&self) -> bool { self.data_record_removed }

  pub fn identity_record_removed(&self) -> bool { self.identity_record_removed }

  pub fn data_removal(&self) -> Option<&Removal> { self.data_removal.as_ref() }

  pub fn identity_removal(&self) -> Option<&Removal> {
    self.identity_removal.as_ref()
  }

  pub fn verification(&self) -> Option<&Verification> {
    self.verification.as_ref()
  }

  pub fn started_at(&self) -> DateTime<Utc> { self.started_at }

  pub fn finished_at(&self) -> DateTime<Utc> { self.finished_at }
}

// ─── Audit event ─────────────────────────────────────────────────────────────

/// What the audit collaborator receives after a successful removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionEvent {
  pub event_id:      Uuid,
  pub target_id:     Uuid,
  pub requested_by:  Option<Uuid>,
  pub outcome:       Outcome,
  pub steps_applied: usize,
  pub rows_affected: u64,
  pub recorded_at:   DateTime<Utc>,
}

impl DeletionEvent {
  pub fn from_report(report: &DeletionReport, requested_by: Option<Uuid>) -> Self {
    Self {
      event_id: Uuid::new_v4(),
      target_id: report.target_id,
      requested_by,
      outcome: report.outcome,
      steps_applied: report
        .ledger
        .steps()
        .iter()
        .filter(|s| s.outcome == crate::ledger::StepOutcome::Applied)
        .count(),
      rows_affected: report.ledger.rows_affected(),
      recorded_at: report.finished_at,
    }
  }
}
