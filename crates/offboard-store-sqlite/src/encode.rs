//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. UUIDs are hyphenated lowercase strings.
//! Roles and outcomes are their snake_case discriminants.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use offboard_core::{
  catalog::is_identifier,
  entity::{Role, TargetEntity},
  report::{DeletionEvent, Outcome},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── Identifiers ──────────────────────────────────────────────────────────────

/// Double-quote a relation or column name for splicing into SQL.
pub fn quote_ident(ident: &str) -> Result<String> {
  if is_identifier(ident) {
    Ok(format!("\"{ident}\""))
  } else {
    Err(Error::InvalidIdentifier(ident.to_owned()))
  }
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// A `profiles` row as read from SQLite, before decoding.
pub struct RawProfile {
  pub id:        String,
  pub role:      String,
  pub is_active: bool,
}

impl RawProfile {
  pub fn into_entity(self) -> Result<TargetEntity> {
    Ok(TargetEntity {
      id:        decode_uuid(&self.id)?,
      role:      Role::decode(&self.role)?,
      is_active: self.is_active,
    })
  }
}

/// A `deletion_events` row as read from SQLite, before decoding.
pub struct RawDeletionEvent {
  pub event_id:      String,
  pub target_id:     String,
  pub requested_by:  Option<String>,
  pub outcome:       String,
  pub steps_applied: i64,
  pub rows_affected: i64,
  pub recorded_at:   String,
}

impl RawDeletionEvent {
  pub fn into_event(self) -> Result<DeletionEvent> {
    Ok(DeletionEvent {
      event_id:      decode_uuid(&self.event_id)?,
      target_id:     decode_uuid(&self.target_id)?,
      requested_by:  self.requested_by.as_deref().map(decode_uuid).transpose()?,
      outcome:       Outcome::from_str(&self.outcome)
        .map_err(|_| Error::Decode(format!("unknown outcome: {:?}", self.outcome)))?,
      steps_applied: self.steps_applied as usize,
      rows_affected: self.rows_affected as u64,
      recorded_at:   decode_dt(&self.recorded_at)?,
    })
  }
}
