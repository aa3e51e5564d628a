//! HTTP server wiring for the staff deletion cascade.
//!
//! Loads [`ServerConfig`], guards every route with operator Basic auth, and
//! mounts [`offboard_api::api_router`] under `/api`.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, middleware};
use offboard_cascade::{Cascade, CascadeOptions};
use offboard_core::{
  catalog::Catalog,
  entity::Role,
  rule::ReferenceRule,
  store::{AuditSink, DataStore, IdentityStore},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `OFFBOARD_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  pub data_store_path:      PathBuf,
  pub identity_store_path:  PathBuf,
  pub auth_username:        String,
  pub auth_password_hash:   String,
  #[serde(default)]
  pub request_timeout_ms:   Option<u64>,
  #[serde(default)]
  pub protected_role:       Role,
  #[serde(default = "default_verify")]
  pub verify_after_removal: bool,
  /// Replaces the built-in staff catalog when present.
  #[serde(default)]
  pub catalog:              Option<Vec<ReferenceRule>>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_verify() -> bool { true }

impl ServerConfig {
  /// The validated catalog for this deployment.
  pub fn catalog(&self) -> offboard_core::Result<Catalog> {
    match &self.catalog {
      Some(rules) => Catalog::new(rules.clone()),
      None => Ok(Catalog::staff_default()),
    }
  }

  pub fn cascade_options(&self) -> CascadeOptions {
    CascadeOptions {
      protected_role:       self.protected_role,
      verify_after_removal: self.verify_after_removal,
      request_timeout:      self.request_timeout_ms.map(Duration::from_millis),
    }
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the authenticated application router.
pub fn router<D, I, A>(cascade: Arc<Cascade<D, I, A>>, auth: Arc<AuthConfig>) -> Router
where
  D: DataStore + 'static,
  I: IdentityStore + 'static,
  A: AuditSink + 'static,
{
  Router::new()
    .nest("/api", offboard_api::api_router(cascade))
    .layer(middleware::from_fn_with_state(auth, require_auth))
    .layer(TraceLayer::new_for_http())
}
