//! Reference rules, one row of the reference catalog.
//!
//! A rule names a relation and the column in it that points at the target
//! account, and fixes what happens to matching rows before the account is
//! removed. Policy and criticality are decided when the catalog is written,
//! never at runtime.

use serde::{Deserialize, Serialize};

// ─── Policy ──────────────────────────────────────────────────────────────────

/// What to do with rows whose locator column equals the target id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
  /// Delete every matching row.
  CascadeDelete,
  /// Set the locator column to NULL on every matching row.
  NullifyColumn,
  /// Point every matching row at `default` instead.
  ReparentTo { default: String },
  /// Leave the relation alone. Always applied with zero rows.
  Ignore,
}

impl Policy {
  /// `true` for policies that rewrite rows rather than delete them.
  pub fn rewrites(&self) -> bool {
    matches!(self, Self::NullifyColumn | Self::ReparentTo { .. })
  }
}

// ─── Criticality ─────────────────────────────────────────────────────────────

/// Whether a failed rule halts the run.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Criticality {
  /// Failure aborts the run before either final removal.
  Critical,
  /// Failure is recorded and the run continues.
  BestEffort,
}

// ─── ReferenceRule ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRule {
  pub relation:    String,
  /// The column holding the target's id.
  pub column:      String,
  pub policy:      Policy,
  pub criticality: Criticality,
}

impl ReferenceRule {
  pub fn new(
    relation: impl Into<String>,
    column: impl Into<String>,
    policy: Policy,
    criticality: Criticality,
  ) -> Self {
    Self {
      relation: relation.into(),
      column: column.into(),
      policy,
      criticality,
    }
  }

  pub fn is_critical(&self) -> bool {
    self.criticality == Criticality::Critical
  }

  /// `relation.column`, for logs and error messages.
  pub fn locator(&self) -> String { format!("{}.{}", self.relation, self.column) }
}
