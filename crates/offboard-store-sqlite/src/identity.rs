//! [`SqliteIdentityStore`]: the SQLite identity plane.
//!
//! Kept in a separate database file from [`crate::SqliteStore`] so the two
//! planes fail independently, like a hosted auth service would.

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use offboard_core::store::{IdentityStore, RecordRemoval};

use crate::{
  Result,
  encode::{encode_dt, encode_uuid},
  schema::IDENTITY_SCHEMA,
};

#[derive(Clone)]
pub struct SqliteIdentityStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteIdentityStore {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

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
        conn.execute_batch(IDENTITY_SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("identity-plane schema ready");
    Ok(())
  }

  /// Register a login for an existing staff account id.
  pub async fn add_identity(&self, id: Uuid, email: &str) -> Result<()> {
    let id_str = encode_uuid(id);
    let email  = email.to_owned();
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO identities (id, email, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, email, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl IdentityStore for SqliteIdentityStore {
  type Error = crate::Error;

  async fn remove_identity(&self, id: Uuid) -> Result<RecordRemoval> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM identities WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(if removed == 0 {
      RecordRemoval::NotFound
    } else {
      RecordRemoval::Removed
    })
  }

  async fn identity_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let exists: bool = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS (SELECT 1 FROM identities WHERE id = ?1)",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(exists)
  }
}
