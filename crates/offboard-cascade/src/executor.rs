//! The step executor: applies one catalog rule and classifies the result.
//!
//! `apply` never fails. Whatever the store says (rows touched, relation
//! missing, an error, or nothing before the deadline) becomes a
//! [`StepOutcome`] so the orchestrator can decide what happens next.

use offboard_core::{
  ledger::{ExecutionStep, StepOutcome},
  rule::{Policy, ReferenceRule},
  store::{Affected, DataStore},
};
use tokio::time::Instant;
use uuid::Uuid;

use crate::deadline::within;

pub struct StepExecutor<'s, D> {
  store:    &'s D,
  deadline: Option<Instant>,
}

impl<'s, D: DataStore> StepExecutor<'s, D> {
  pub fn new(store: &'s D) -> Self { Self { store, deadline: None } }

  /// Bound every call made by this executor by the request deadline.
  pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
    self.deadline = deadline;
    self
  }

  /// Apply `rule` to rows pointing at `target`. Touches `rule.relation`
  /// only.
  pub async fn apply(&self, rule: &ReferenceRule, target: Uuid) -> ExecutionStep {
    let relation = rule.relation.as_str();
    let column = rule.column.as_str();

    let result = match &rule.policy {
      Policy::Ignore => {
        return ExecutionStep::new(rule.clone(), StepOutcome::Applied, 0);
      }
      Policy::CascadeDelete => {
        within(self.deadline, self.store.delete_matching(relation, column, target))
          .await
      }
      Policy::NullifyColumn => {
        within(
          self.deadline,
          self.store.assign_matching(relation, column, target, None),
        )
        .await
      }
      Policy::ReparentTo { default } => {
        within(
          self.deadline,
          self
            .store
            .assign_matching(relation, column, target, Some(default.as_str())),
        )
        .await
      }
    };

    let (outcome, rows) = classify(result);
    ExecutionStep::new(rule.clone(), outcome, rows)
  }
}

fn classify(result: Result<Affected, String>) -> (StepOutcome, u64) {
  match result {
    Ok(Affected::RelationAbsent) => (StepOutcome::SkippedRelationAbsent, 0),
    Ok(Affected::Rows(0)) => (StepOutcome::SkippedNoMatchingRows, 0),
    Ok(Affected::Rows(n)) => (StepOutcome::Applied, n),
    Err(reason) => (StepOutcome::Failed(reason), 0),
  }
}

#[cfg(test)]
mod tests {
  use offboard_core::rule::Criticality;

  use super::*;
  use crate::fake::MemoryData;

  fn rule(relation: &str, policy: Policy) -> ReferenceRule {
    ReferenceRule::new(relation, "user_id", policy, Criticality::BestEffort)
  }

  #[tokio::test]
  async fn cascade_delete_removes_matching_rows_only() {
    let store = MemoryData::default();
    let target = Uuid::new_v4();
    let other = Uuid::new_v4();
    store.create_table("notifications");
    store.insert_ref("notifications", "user_id", target);
    store.insert_ref("notifications", "user_id", target);
    store.insert_ref("notifications", "user_id", other);

    let step = StepExecutor::new(&store)
      .apply(&rule("notifications", Policy::CascadeDelete), target)
      .await;

    assert_eq!(step.outcome, StepOutcome::Applied);
    assert_eq!(step.rows_affected, 2);
    assert_eq!(store.rows("notifications").len(), 1);
  }

  #[tokio::test]
  async fn nullify_and_reparent_rewrite_the_locator() {
    let store = MemoryData::default();
    let target = Uuid::new_v4();
    store.create_table("clients");
    store.insert_ref("clients", "user_id", target);
    store.create_table("loans");
    store.insert_ref("loans", "user_id", target);

    let executor = StepExecutor::new(&store);
    executor.apply(&rule("clients", Policy::NullifyColumn), target).await;
    executor
      .apply(
        &rule("loans", Policy::ReparentTo { default: "system".into() }),
        target,
      )
      .await;

    assert_eq!(store.rows("clients")[0].get("user_id"), Some(&None));
    assert_eq!(
      store.rows("loans")[0].get("user_id"),
      Some(&Some("system".to_owned()))
    );
  }

  #[tokio::test]
  async fn missing_relation_is_skipped_not_failed() {
    let store = MemoryData::default();
    let step = StepExecutor::new(&store)
      .apply(&rule("staff_sessions", Policy::CascadeDelete), Uuid::new_v4())
      .await;
    assert_eq!(step.outcome, StepOutcome::SkippedRelationAbsent);
  }

  #[tokio::test]
  async fn zero_rows_is_skipped() {
    let store = MemoryData::default();
    store.create_table("loans");
    let step = StepExecutor::new(&store)
      .apply(&rule("loans", Policy::NullifyColumn), Uuid::new_v4())
      .await;
    assert_eq!(step.outcome, StepOutcome::SkippedNoMatchingRows);
    assert_eq!(step.rows_affected, 0);
  }

  #[tokio::test]
  async fn ignore_touches_nothing() {
    let store = MemoryData::default();
    let target = Uuid::new_v4();
    store.create_table("logs");
    store.insert_ref("logs", "user_id", target);

    let step = StepExecutor::new(&store)
      .apply(&rule("logs", Policy::Ignore), target)
      .await;
    assert_eq!(step.outcome, StepOutcome::Applied);
    assert_eq!(step.rows_affected, 0);
    assert_eq!(store.rows("logs").len(), 1);
  }

  #[tokio::test]
  async fn store_error_reason_is_kept_verbatim() {
    let store = MemoryData::default();
    store.create_table("loans");
    store.fail_relation("loans", "permission denied for table loans");

    let step = StepExecutor::new(&store)
      .apply(&rule("loans", Policy::NullifyColumn), Uuid::new_v4())
      .await;
    assert_eq!(
      step.outcome,
      StepOutcome::Failed("permission denied for table loans".into())
    );
  }

  #[tokio::test]
  async fn slow_store_call_times_out() {
    let store = MemoryData::default();
    store.create_table("audit_logs");
    store.slow_relation("audit_logs", std::time::Duration::from_millis(500));

    let deadline = Instant::now() + std::time::Duration::from_millis(20);
    let step = StepExecutor::new(&store)
      .with_deadline(Some(deadline))
      .apply(&rule("audit_logs", Policy::NullifyColumn), Uuid::new_v4())
      .await;
    assert_eq!(step.outcome, StepOutcome::Failed("timeout".into()));
  }
}
