//! Pre-flight invariant checks. Reads only; evaluated once per run.

use offboard_core::{
  entity::Role,
  report::{DeletionRequest, InvariantViolation},
  store::DataStore,
};
use tokio::time::Instant;

use crate::deadline::within;

pub struct InvariantGuard<'s, D> {
  store:          &'s D,
  protected_role: Role,
  deadline:       Option<Instant>,
}

impl<'s, D: DataStore> InvariantGuard<'s, D> {
  pub fn new(store: &'s D, protected_role: Role) -> Self {
    Self { store, protected_role, deadline: None }
  }

  pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
    self.deadline = deadline;
    self
  }

  /// Every violation that forbids deleting `request.target_id`.
  ///
  /// A target that no longer has a data-plane record protects nothing and
  /// passes; this is what lets a retry after a partial success through.
  /// If the guard cannot read what it needs, it reports
  /// [`InvariantViolation::GuardUnavailable`] rather than letting the run
  /// proceed unchecked.
  pub async fn check(&self, request: &DeletionRequest) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if request.requested_by == Some(request.target_id) {
      violations.push(InvariantViolation::SelfDeletion);
    }

    let entity =
      match within(self.deadline, self.store.fetch_entity(request.target_id)).await {
        Ok(entity) => entity,
        Err(reason) => {
          violations.push(InvariantViolation::GuardUnavailable { reason });
          return violations;
        }
      };

    let Some(entity) = entity else {
      return violations;
    };

    // Inactive holders are not live, so removing one changes nothing.
    if entity.role != self.protected_role || !entity.is_active {
      return violations;
    }

    match within(self.deadline, self.store.count_live_holders(entity.role)).await {
      Ok(live) if live <= 1 => {
        violations.push(InvariantViolation::LastRoleHolder { role: entity.role });
      }
      Ok(_) => {}
      Err(reason) => {
        violations.push(InvariantViolation::GuardUnavailable { reason });
      }
    }

    violations
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::fake::MemoryData;

  #[tokio::test]
  async fn ordinary_staff_passes() {
    let store = MemoryData::default();
    let id = store.add_profile(Role::LoanOfficer, true);
    let guard = InvariantGuard::new(&store, Role::SuperAdmin);
    assert!(guard.check(&DeletionRequest::new(id)).await.is_empty());
  }

  #[tokio::test]
  async fn last_live_super_admin_is_protected() {
    let store = MemoryData::default();
    let id = store.add_profile(Role::SuperAdmin, true);
    // A second, inactive super admin is not a live holder.
    store.add_profile(Role::SuperAdmin, false);

    let violations = InvariantGuard::new(&store, Role::SuperAdmin)
      .check(&DeletionRequest::new(id))
      .await;
    assert_eq!(
      violations,
      vec![InvariantViolation::LastRoleHolder { role: Role::SuperAdmin }]
    );
  }

  #[tokio::test]
  async fn one_of_two_super_admins_may_go() {
    let store = MemoryData::default();
    let id = store.add_profile(Role::SuperAdmin, true);
    store.add_profile(Role::SuperAdmin, true);
    let guard = InvariantGuard::new(&store, Role::SuperAdmin);
    assert!(guard.check(&DeletionRequest::new(id)).await.is_empty());
  }

  #[tokio::test]
  async fn inactive_sole_super_admin_may_go() {
    let store = MemoryData::default();
    let id = store.add_profile(Role::SuperAdmin, false);
    let guard = InvariantGuard::new(&store, Role::SuperAdmin);
    assert!(guard.check(&DeletionRequest::new(id)).await.is_empty());
  }

  #[tokio::test]
  async fn protected_role_is_configurable() {
    let store = MemoryData::default();
    let id = store.add_profile(Role::Admin, true);
    let violations = InvariantGuard::new(&store, Role::Admin)
      .check(&DeletionRequest::new(id))
      .await;
    assert_eq!(violations.len(), 1);
  }

  #[tokio::test]
  async fn self_deletion_is_rejected() {
    let store = MemoryData::default();
    let id = store.add_profile(Role::Cashier, true);
    let request = DeletionRequest { target_id: id, requested_by: Some(id) };
    let violations = InvariantGuard::new(&store, Role::SuperAdmin)
      .check(&request)
      .await;
    assert_eq!(violations, vec![InvariantViolation::SelfDeletion]);
  }

  #[tokio::test]
  async fn missing_record_passes() {
    let store = MemoryData::default();
    let guard = InvariantGuard::new(&store, Role::SuperAdmin);
    assert!(guard.check(&DeletionRequest::new(Uuid::new_v4())).await.is_empty());
  }

  #[tokio::test]
  async fn unreadable_store_fails_closed() {
    let store = MemoryData::default();
    let id = store.add_profile(Role::Cashier, true);
    store.fail_reads("connection reset");

    let violations = InvariantGuard::new(&store, Role::SuperAdmin)
      .check(&DeletionRequest::new(id))
      .await;
    assert_eq!(
      violations,
      vec![InvariantViolation::GuardUnavailable { reason: "connection reset".into() }]
    );
  }
}
