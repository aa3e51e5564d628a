//! The principal entity being removed: a staff account.
//!
//! Owned by the stores; read-only to the cascade.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Back-office role classification, highest privilege first.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  SuperAdmin,
  Admin,
  BranchManager,
  LoanOfficer,
  Cashier,
}

impl Role {
  /// The role whose last live holder may never be removed.
  pub const fn highest() -> Self { Self::SuperAdmin }

  /// Parse the discriminant stored in a `role` column.
  pub fn decode(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownRole(s.to_owned()))
  }
}

impl Default for Role {
  fn default() -> Self { Self::highest() }
}

/// The denormalised view of an account that invariant checks need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntity {
  pub id:        Uuid,
  pub role:      Role,
  /// Inactive accounts do not count as live holders of their role.
  pub is_active: bool,
}
