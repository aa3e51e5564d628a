//! Execution steps and the ledger that records them.
//!
//! A step is the runtime record of applying one catalog rule. Steps are
//! appended in catalog order and never changed once recorded; a rule that was
//! never reached simply has no step.

use serde::{Deserialize, Serialize};

use crate::rule::ReferenceRule;

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// How applying one rule turned out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
  Applied,
  /// The relation does not exist in this deployment.
  SkippedRelationAbsent,
  /// The relation exists but no row pointed at the target.
  SkippedNoMatchingRows,
  /// Anything else: permission, constraint, transport, timeout. The reason
  /// is the collaborator's message, verbatim.
  Failed(String),
}

impl StepOutcome {
  pub fn is_failed(&self) -> bool { matches!(self, Self::Failed(_)) }

  pub fn is_skipped(&self) -> bool {
    matches!(self, Self::SkippedRelationAbsent | Self::SkippedNoMatchingRows)
  }
}

// ─── ExecutionStep ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStep {
  pub rule:          ReferenceRule,
  pub outcome:       StepOutcome,
  pub rows_affected: u64,
}

impl ExecutionStep {
  pub fn new(rule: ReferenceRule, outcome: StepOutcome, rows_affected: u64) -> Self {
    Self { rule, outcome, rows_affected }
  }

  /// A failed step whose rule must halt the run.
  pub fn is_critical_failure(&self) -> bool {
    self.outcome.is_failed() && self.rule.is_critical()
  }
}

// ─── ExecutionLedger ─────────────────────────────────────────────────────────

/// Append-only, catalog-ordered record of one deletion attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionLedger {
  steps: Vec<ExecutionStep>,
}

impl ExecutionLedger {
  pub fn new() -> Self { Self::default() }

  pub fn record(&mut self, step: ExecutionStep) { self.steps.push(step); }

  pub fn steps(&self) -> &[ExecutionStep] { &self.steps }

  pub fn len(&self) -> usize { self.steps.len() }

  pub fn is_empty(&self) -> bool { self.steps.is_empty() }

  pub fn last(&self) -> Option<&ExecutionStep> { self.steps.last() }

  pub fn failures(&self) -> impl Iterator<Item = &ExecutionStep> {
    self.steps.iter().filter(|s| s.outcome.is_failed())
  }

  pub fn has_critical_failure(&self) -> bool {
    self.steps.iter().any(ExecutionStep::is_critical_failure)
  }

  /// Total rows deleted or rewritten across all applied steps.
  pub fn rows_affected(&self) -> u64 {
    self.steps.iter().map(|s| s.rows_affected).sum()
  }
}

impl<'a> IntoIterator for &'a ExecutionLedger {
  type Item = &'a ExecutionStep;
  type IntoIter = std::slice::Iter<'a, ExecutionStep>;

  fn into_iter(self) -> Self::IntoIter { self.steps.iter() }
}
