//! [`SqliteStore`]: the SQLite data plane.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use offboard_core::{
  entity::{Role, TargetEntity},
  report::DeletionEvent,
  store::{Affected, AuditSink, DataStore, RecordRemoval},
};

use crate::{
  Error, Result,
  encode::{RawDeletionEvent, RawProfile, encode_dt, encode_uuid, quote_ident},
  schema::DATA_SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The back-office data plane backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(DATA_SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("data-plane schema ready");
    Ok(())
  }

  // ── Staff records ─────────────────────────────────────────────────────────

  /// Create a staff profile and return its invariant-relevant view.
  pub async fn add_profile(
    &self,
    full_name: &str,
    email: &str,
    role: Role,
    is_active: bool,
  ) -> Result<TargetEntity> {
    let entity = TargetEntity { id: Uuid::new_v4(), role, is_active };

    let id_str    = encode_uuid(entity.id);
    let name      = full_name.to_owned();
    let email     = email.to_owned();
    let role_str  = role.as_ref().to_owned();
    let at_str    = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (id, full_name, email, role, is_active, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, email, role_str, is_active, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(entity)
  }

  /// Record a permission grant for `user_id`.
  pub async fn grant_role(&self, user_id: Uuid, role: Role) -> Result<Uuid> {
    let grant_id = Uuid::new_v4();

    let grant_str = encode_uuid(grant_id);
    let user_str  = encode_uuid(user_id);
    let role_str  = role.as_ref().to_owned();
    let at_str    = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_roles (id, user_id, role, granted_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![grant_str, user_str, role_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(grant_id)
  }

  /// All recorded deletion events, oldest first.
  pub async fn deletion_events(&self) -> Result<Vec<DeletionEvent>> {
    let raws: Vec<RawDeletionEvent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, target_id, requested_by, outcome,
                  steps_applied, rows_affected, recorded_at
           FROM deletion_events
           ORDER BY recorded_at",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDeletionEvent {
              event_id:      row.get(0)?,
              target_id:     row.get(1)?,
              requested_by:  row.get(2)?,
              outcome:       row.get(3)?,
              steps_applied: row.get(4)?,
              rows_affected: row.get(5)?,
              recorded_at:   row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDeletionEvent::into_event).collect()
  }
}

/// Whether a keyed statement can run, and what it touched if it did.
enum Keyed {
  Rows(u64),
  RelationAbsent,
  ColumnAbsent,
}

fn relation_exists(conn: &rusqlite::Connection, relation: &str) -> rusqlite::Result<bool> {
  conn.query_row(
    "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE)",
    rusqlite::params![relation],
    |r| r.get(0),
  )
}

fn column_exists(
  conn:     &rusqlite::Connection,
  relation: &str,
  column:   &str,
) -> rusqlite::Result<bool> {
  conn.query_row(
    "SELECT EXISTS (SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2 COLLATE NOCASE)",
    rusqlite::params![relation, column],
    |r| r.get(0),
  )
}

impl SqliteStore {
  /// Run `statement` against `relation` once both it and `column` are known
  /// to exist. A quoted name that matches nothing would otherwise be read by
  /// SQLite as a string literal and silently match zero rows.
  async fn keyed<F>(&self, relation: &str, column: &str, statement: F) -> Result<Affected>
  where
    F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<u64> + Send + 'static,
  {
    let relation_owned = relation.to_owned();
    let column_owned   = column.to_owned();

    let keyed = self
      .conn
      .call(move |conn| {
        if !relation_exists(conn, &relation_owned)? {
          return Ok(Keyed::RelationAbsent);
        }
        if !column_exists(conn, &relation_owned, &column_owned)? {
          return Ok(Keyed::ColumnAbsent);
        }
        Ok(Keyed::Rows(statement(conn)?))
      })
      .await?;

    match keyed {
      Keyed::Rows(n) => Ok(Affected::Rows(n)),
      Keyed::RelationAbsent => Ok(Affected::RelationAbsent),
      Keyed::ColumnAbsent => Err(Error::UnknownColumn {
        relation: relation.to_owned(),
        column:   column.to_owned(),
      }),
    }
  }
}

// ─── DataStore impl ──────────────────────────────────────────────────────────

impl DataStore for SqliteStore {
  type Error = crate::Error;

  async fn fetch_entity(&self, id: Uuid) -> Result<Option<TargetEntity>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, role, is_active FROM profiles WHERE id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawProfile {
                id:        row.get(0)?,
                role:      row.get(1)?,
                is_active: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProfile::into_entity).transpose()
  }

  async fn count_live_holders(&self, role: Role) -> Result<u64> {
    let role_str = role.as_ref().to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM profiles WHERE role = ?1 AND is_active = 1",
          rusqlite::params![role_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }

  async fn count_matching(
    &self,
    relation: &str,
    column:   &str,
    target:   Uuid,
  ) -> Result<Affected> {
    let sql = format!(
      "SELECT COUNT(*) FROM {} WHERE {} = ?1",
      quote_ident(relation)?,
      quote_ident(column)?,
    );
    let target_str = encode_uuid(target);

    self
      .keyed(relation, column, move |conn| {
        let n: i64 = conn.query_row(&sql, rusqlite::params![target_str], |r| r.get(0))?;
        Ok(n as u64)
      })
      .await
  }

  async fn record_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let exists: bool = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS (SELECT 1 FROM profiles WHERE id = ?1)",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(exists)
  }

  async fn delete_matching(
    &self,
    relation: &str,
    column:   &str,
    target:   Uuid,
  ) -> Result<Affected> {
    let sql = format!(
      "DELETE FROM {} WHERE {} = ?1",
      quote_ident(relation)?,
      quote_ident(column)?,
    );
    let target_str = encode_uuid(target);

    self
      .keyed(relation, column, move |conn| {
        Ok(conn.execute(&sql, rusqlite::params![target_str])? as u64)
      })
      .await
  }

  async fn assign_matching(
    &self,
    relation: &str,
    column:   &str,
    target:   Uuid,
    value:    Option<&str>,
  ) -> Result<Affected> {
    let column_sql = quote_ident(column)?;
    let sql = format!(
      "UPDATE {} SET {column_sql} = ?1 WHERE {column_sql} = ?2",
      quote_ident(relation)?,
    );
    let target_str = encode_uuid(target);
    let value      = value.map(str::to_owned);

    self
      .keyed(relation, column, move |conn| {
        Ok(conn.execute(&sql, rusqlite::params![value, target_str])? as u64)
      })
      .await
  }

  async fn remove_record(&self, id: Uuid) -> Result<RecordRemoval> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM profiles WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(if removed == 0 {
      RecordRemoval::NotFound
    } else {
      RecordRemoval::Removed
    })
  }
}

// ─── AuditSink impl ──────────────────────────────────────────────────────────

impl AuditSink for SqliteStore {
  type Error = crate::Error;

  async fn record_deletion(&self, event: &DeletionEvent) -> Result<()> {
    let event_id_str  = encode_uuid(event.event_id);
    let target_str    = encode_uuid(event.target_id);
    let requested_str = event.requested_by.map(encode_uuid);
    let outcome_str   = event.outcome.to_string();
    let steps         = event.steps_applied as i64;
    let rows          = event.rows_affected as i64;
    let at_str        = encode_dt(event.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO deletion_events (
             event_id, target_id, requested_by, outcome,
             steps_applied, rows_affected, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            event_id_str,
            target_str,
            requested_str,
            outcome_str,
            steps,
            rows,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}
