//! The cascade orchestrator.
//!
//! One run, strictly sequential:
//!
//! 1. invariant guard: any violation ends the run with nothing touched;
//! 2. every catalog rule in order: a failed critical rule ends the run,
//!    a failed best-effort rule is logged and skipped past;
//! 3. remove the data-plane record, then the identity-plane record.
//!
//! The two removals are not transactional. Removing data first means a crash
//! between them leaves a login with nothing behind it, which a retry cleans
//! up, rather than business data with no identity guarding it.
//!
//! Concurrent runs for the same target are the caller's problem to prevent;
//! re-running after any outcome is always safe.

use std::time::Duration;

use offboard_core::{
  catalog::Catalog,
  entity::Role,
  ledger::StepOutcome,
  report::{
    DeletionEvent, DeletionReport, DeletionRequest, Removal, ReportDraft,
    Verification,
  },
  store::{AuditSink, DataStore, IdentityStore, RecordRemoval},
};
use tokio::time::Instant;
use tracing::Instrument as _;
use uuid::Uuid;

use crate::{
  Result,
  deadline::within,
  executor::StepExecutor,
  guard::InvariantGuard,
  verify::Verifier,
};

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CascadeOptions {
  /// Role whose last live holder may not be deleted.
  pub protected_role:       Role,
  /// Confirm both records are gone before reporting success.
  pub verify_after_removal: bool,
  /// Deadline for the whole run, applied to every collaborator call.
  pub request_timeout:      Option<Duration>,
}

impl Default for CascadeOptions {
  fn default() -> Self {
    Self {
      protected_role:       Role::highest(),
      verify_after_removal: true,
      request_timeout:      None,
    }
  }
}

// ─── Cascade ─────────────────────────────────────────────────────────────────

pub struct Cascade<D, I, A> {
  data:     D,
  identity: I,
  audit:    A,
  catalog:  Catalog,
  options:  CascadeOptions,
}

impl<D, I, A> Cascade<D, I, A>
where
  D: DataStore,
  I: IdentityStore,
  A: AuditSink,
{
  pub fn new(data: D, identity: I, audit: A, catalog: Catalog) -> Self {
    Self {
      data,
      identity,
      audit,
      catalog,
      options: CascadeOptions::default(),
    }
  }

  pub fn with_options(mut self, options: CascadeOptions) -> Self {
    self.options = options;
    self
  }

  pub fn catalog(&self) -> &Catalog { &self.catalog }

  pub fn options(&self) -> &CascadeOptions { &self.options }

  pub fn data(&self) -> &D { &self.data }

  pub fn identity(&self) -> &I { &self.identity }

  pub fn audit(&self) -> &A { &self.audit }

  /// Remove `request.target_id` and everything that references it.
  pub async fn delete_entity(&self, request: DeletionRequest) -> DeletionReport {
    let span = tracing::info_span!("delete_entity", target_id = %request.target_id);
    self.run(request).instrument(span).await
  }

  /// Read-only check of what remains of `target` in both planes.
  pub async fn verify(&self, target: Uuid) -> Result<Verification> {
    Verifier::new(&self.data, &self.identity, &self.catalog)
      .verify(target)
      .await
  }

  async fn run(&self, request: DeletionRequest) -> DeletionReport {
    let target = request.target_id;
    let deadline = self.options.request_timeout.map(|t| Instant::now() + t);
    let mut draft = ReportDraft::new(target);

    // ── 1. Invariants ─────────────────────────────────────────────────────

    let violations = InvariantGuard::new(&self.data, self.options.protected_role)
      .with_deadline(deadline)
      .check(&request)
      .await;
    if !violations.is_empty() {
      tracing::warn!(?violations, "deletion refused by invariant guard");
      draft.reject(violations);
      return draft.finish();
    }

    // ── 2. Catalog ────────────────────────────────────────────────────────

    let executor = StepExecutor::new(&self.data).with_deadline(deadline);
    for rule in &self.catalog {
      let step = draft.record(executor.apply(rule, target).await);
      let abort = step.is_critical_failure();

      match &step.outcome {
        StepOutcome::Failed(reason) if abort => {
          tracing::error!(rule = %rule.locator(), %reason, "critical cleanup step failed");
        }
        StepOutcome::Failed(reason) => {
          tracing::warn!(rule = %rule.locator(), %reason, "best-effort cleanup step failed");
        }
        outcome => {
          tracing::debug!(
            rule = %rule.locator(),
            ?outcome,
            rows = step.rows_affected,
            "cleanup step done"
          );
        }
      }

      if abort {
        return draft.finish();
      }
    }

    // ── 3. Final removals: data plane, then identity plane ────────────────

    let data_removal = removal(within(deadline, self.data.remove_record(target)).await);
    if let Removal::Failed(reason) = &data_removal {
      tracing::error!(%reason, "data record removal failed; identity left untouched");
      draft.data_removed(data_removal);
      return draft.finish();
    }
    draft.data_removed(data_removal);

    let identity_removal =
      removal(within(deadline, self.identity.remove_identity(target)).await);
    if let Removal::Failed(reason) = &identity_removal {
      tracing::error!(%reason, "identity removal failed after data removal; retry to finish");
      draft.identity_removed(identity_removal);
      return draft.finish();
    }
    draft.identity_removed(identity_removal);

    if self.options.verify_after_removal {
      match within(deadline, self.verify(target)).await {
        Ok(verification) => {
          if !verification.records_absent() {
            tracing::error!(?verification, "records still present after removal");
          }
          draft.verified(verification);
        }
        Err(reason) => tracing::warn!(%reason, "post-removal verification unavailable"),
      }
    }

    let report = draft.finish();
    tracing::info!(
      outcome = %report.outcome(),
      rows = report.ledger().rows_affected(),
      "deletion finished"
    );

    if report.is_success() {
      self.announce(&report, request.requested_by, deadline).await;
    }
    report
  }

  /// Hand the audit sink one event, giving up at `deadline`. Its failure is
  /// logged and otherwise ignored.
  async fn announce(
    &self,
    report: &DeletionReport,
    requested_by: Option<Uuid>,
    deadline: Option<Instant>,
  ) {
    let event = DeletionEvent::from_report(report, requested_by);
    if let Err(reason) = within(deadline, self.audit.record_deletion(&event)).await {
      tracing::warn!(%reason, event_id = %event.event_id, "audit event not delivered");
    }
  }
}

fn removal(result: std::result::Result<RecordRemoval, String>) -> Removal {
  match result {
    Ok(RecordRemoval::Removed) => Removal::Removed,
    Ok(RecordRemoval::NotFound) => Removal::AlreadyAbsent,
    Err(reason) => Removal::Failed(reason),
  }
}
