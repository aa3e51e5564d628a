//! In-memory stand-ins for both planes and the audit sink, with knobs for
//! failures, latency, and call counting.

use std::{
  collections::{HashMap, HashSet},
  sync::{
    Mutex, MutexGuard,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
  time::Duration,
};

use offboard_core::{
  entity::{Role, TargetEntity},
  report::DeletionEvent,
  store::{Affected, AuditSink, DataStore, IdentityStore, RecordRemoval},
};
use uuid::Uuid;

pub type Row = HashMap<String, Option<String>>;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub String);

// ─── Data plane ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct DataState {
  tables:          HashMap<String, Vec<Row>>,
  profiles:        HashMap<Uuid, TargetEntity>,
  failing:         HashMap<String, String>,
  slow:            HashMap<String, Duration>,
  read_failure:    Option<String>,
  removal_failure: Option<String>,
}

#[derive(Default)]
pub struct MemoryData {
  state:    Mutex<DataState>,
  removals: AtomicUsize,
}

impl MemoryData {
  fn lock(&self) -> MutexGuard<'_, DataState> { self.state.lock().unwrap() }

  pub fn create_table(&self, relation: &str) {
    self.lock().tables.entry(relation.to_owned()).or_default();
  }

  /// Insert a row whose `column` points at `target`.
  pub fn insert_ref(&self, relation: &str, column: &str, target: Uuid) {
    let row = Row::from([(column.to_owned(), Some(target.to_string()))]);
    self
      .lock()
      .tables
      .entry(relation.to_owned())
      .or_default()
      .push(row);
  }

  pub fn rows(&self, relation: &str) -> Vec<Row> {
    self.lock().tables.get(relation).cloned().unwrap_or_default()
  }

  pub fn add_profile(&self, role: Role, is_active: bool) -> Uuid {
    let id = Uuid::new_v4();
    self
      .lock()
      .profiles
      .insert(id, TargetEntity { id, role, is_active });
    id
  }

  pub fn has_profile(&self, id: Uuid) -> bool { self.lock().profiles.contains_key(&id) }

  pub fn fail_relation(&self, relation: &str, reason: &str) {
    self.lock().failing.insert(relation.to_owned(), reason.to_owned());
  }

  pub fn slow_relation(&self, relation: &str, delay: Duration) {
    self.lock().slow.insert(relation.to_owned(), delay);
  }

  pub fn fail_reads(&self, reason: &str) {
    self.lock().read_failure = Some(reason.to_owned());
  }

  pub fn fail_removal(&self, reason: Option<&str>) {
    self.lock().removal_failure = reason.map(str::to_owned);
  }

  pub fn removal_calls(&self) -> usize { self.removals.load(Ordering::SeqCst) }

  /// Apply latency and injected failures; report whether the relation exists.
  async fn gate(&self, relation: &str) -> Result<bool, FakeError> {
    let delay = self.lock().slow.get(relation).copied();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    let state = self.lock();
    if let Some(reason) = state.failing.get(relation) {
      return Err(FakeError(reason.clone()));
    }
    Ok(state.tables.contains_key(relation))
  }

  fn check_reads(&self) -> Result<(), FakeError> {
    match &self.lock().read_failure {
      Some(reason) => Err(FakeError(reason.clone())),
      None => Ok(()),
    }
  }
}

fn points_at(row: &Row, column: &str, target: &str) -> bool {
  matches!(row.get(column), Some(Some(v)) if v == target)
}

impl DataStore for MemoryData {
  type Error = FakeError;

  async fn fetch_entity(&self, id: Uuid) -> Result<Option<TargetEntity>, FakeError> {
    self.check_reads()?;
    Ok(self.lock().profiles.get(&id).cloned())
  }

  async fn count_live_holders(&self, role: Role) -> Result<u64, FakeError> {
    self.check_reads()?;
    Ok(
      self
        .lock()
        .profiles
        .values()
        .filter(|p| p.role == role && p.is_active)
        .count() as u64,
    )
  }

  async fn count_matching(
    &self,
    relation: &str,
    column: &str,
    target: Uuid,
  ) -> Result<Affected, FakeError> {
    if !self.gate(relation).await? {
      return Ok(Affected::RelationAbsent);
    }
    let target = target.to_string();
    let state = self.lock();
    let rows = state.tables[relation]
      .iter()
      .filter(|row| points_at(row, column, &target))
      .count();
    Ok(Affected::Rows(rows as u64))
  }

  async fn record_exists(&self, id: Uuid) -> Result<bool, FakeError> {
    self.check_reads()?;
    Ok(self.has_profile(id))
  }

  async fn delete_matching(
    &self,
    relation: &str,
    column: &str,
    target: Uuid,
  ) -> Result<Affected, FakeError> {
    if !self.gate(relation).await? {
      return Ok(Affected::RelationAbsent);
    }
    let target = target.to_string();
    let mut state = self.lock();
    let rows = state.tables.entry(relation.to_owned()).or_default();
    let before = rows.len();
    rows.retain(|row| !points_at(row, column, &target));
    Ok(Affected::Rows((before - rows.len()) as u64))
  }

  async fn assign_matching(
    &self,
    relation: &str,
    column: &str,
    target: Uuid,
    value: Option<&str>,
  ) -> Result<Affected, FakeError> {
    if !self.gate(relation).await? {
      return Ok(Affected::RelationAbsent);
    }
    let target = target.to_string();
    let mut state = self.lock();
    let mut touched = 0;
    for row in state.tables.entry(relation.to_owned()).or_default() {
      if points_at(row, column, &target) {
        row.insert(column.to_owned(), value.map(str::to_owned));
        touched += 1;
      }
    }
    Ok(Affected::Rows(touched))
  }

  async fn remove_record(&self, id: Uuid) -> Result<RecordRemoval, FakeError> {
    self.removals.fetch_add(1, Ordering::SeqCst);
    let mut state = self.lock();
    if let Some(reason) = &state.removal_failure {
      return Err(FakeError(reason.clone()));
    }
    Ok(match state.profiles.remove(&id) {
      Some(_) => RecordRemoval::Removed,
      None => RecordRemoval::NotFound,
    })
  }
}

// ─── Identity plane ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryIdentity {
  identities: Mutex<HashSet<Uuid>>,
  failure:    Mutex<Option<String>>,
  removals:   AtomicUsize,
}

impl MemoryIdentity {
  pub fn add(&self, id: Uuid) { self.identities.lock().unwrap().insert(id); }

  pub fn contains(&self, id: Uuid) -> bool {
    self.identities.lock().unwrap().contains(&id)
  }

  pub fn fail_removal(&self, reason: Option<&str>) {
    *self.failure.lock().unwrap() = reason.map(str::to_owned);
  }

  pub fn removal_calls(&self) -> usize { self.removals.load(Ordering::SeqCst) }
}

impl IdentityStore for MemoryIdentity {
  type Error = FakeError;

  async fn remove_identity(&self, id: Uuid) -> Result<RecordRemoval, FakeError> {
    self.removals.fetch_add(1, Ordering::SeqCst);
    if let Some(reason) = self.failure.lock().unwrap().clone() {
      return Err(FakeError(reason));
    }
    Ok(if self.identities.lock().unwrap().remove(&id) {
      RecordRemoval::Removed
    } else {
      RecordRemoval::NotFound
    })
  }

  async fn identity_exists(&self, id: Uuid) -> Result<bool, FakeError> {
    Ok(self.contains(id))
  }
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryAudit {
  events:  Mutex<Vec<DeletionEvent>>,
  failing: AtomicBool,
  hanging: AtomicBool,
}

impl MemoryAudit {
  pub fn events(&self) -> Vec<DeletionEvent> { self.events.lock().unwrap().clone() }

  pub fn fail(&self) { self.failing.store(true, Ordering::SeqCst); }

  /// Never answer.
  pub fn hang(&self) { self.hanging.store(true, Ordering::SeqCst); }
}

impl AuditSink for MemoryAudit {
  type Error = FakeError;

  async fn record_deletion(&self, event: &DeletionEvent) -> Result<(), FakeError> {
    if self.hanging.load(Ordering::SeqCst) {
      std::future::pending::<()>().await;
    }
    if self.failing.load(Ordering::SeqCst) {
      return Err(FakeError("audit endpoint unreachable".into()));
    }
    self.events.lock().unwrap().push(event.clone());
    Ok(())
  }
}
