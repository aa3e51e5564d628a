//! JSON API for the staff deletion cascade.
//!
//! Exposes an axum [`Router`] backed by any [`Cascade`] over any pair of
//! planes. Auth, TLS, and transport concerns are the caller's
//! responsibility, as is deduplicating concurrent requests for the same
//! target id.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", offboard_api::api_router(cascade.clone()))
//! ```

pub mod deletions;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use offboard_cascade::Cascade;
use offboard_core::store::{AuditSink, DataStore, IdentityStore};

pub use error::ApiError;

/// Build the API router for `cascade`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<D, I, A>(cascade: Arc<Cascade<D, I, A>>) -> Router<()>
where
  D: DataStore + 'static,
  I: IdentityStore + 'static,
  A: AuditSink + 'static,
{
  Router::new()
    .route("/deletions", post(deletions::create::<D, I, A>))
    .route("/staff/{id}/verification", get(deletions::verification::<D, I, A>))
    .route("/catalog", get(deletions::catalog::<D, I, A>))
    .with_state(cascade)
}
