//! Handlers for the deletion endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/deletions` | Body: [`DeletionRequest`]; returns the report |
//! | `GET`  | `/staff/:id/verification` | What remains of an account |
//! | `GET`  | `/catalog` | Reference rules in visiting order |
//!
//! `POST /deletions` always answers with a report body; the status code
//! mirrors the outcome: 200 success, 409 refused by an invariant, 500
//! aborted by a critical failure, 502 identity plane left behind.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use offboard_cascade::Cascade;
use offboard_core::{
  catalog::Catalog,
  report::{DeletionReport, DeletionRequest, Outcome, Verification},
  store::{AuditSink, DataStore, IdentityStore},
};
use uuid::Uuid;

use crate::error::ApiError;

fn status_for(outcome: Outcome) -> StatusCode {
  match outcome {
    Outcome::Success => StatusCode::OK,
    Outcome::AbortedByInvariant => StatusCode::CONFLICT,
    Outcome::AbortedByCriticalFailure => StatusCode::INTERNAL_SERVER_ERROR,
    Outcome::PartialSuccess => StatusCode::BAD_GATEWAY,
  }
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `POST /deletions`. Body: `{"target_id":"...","requested_by":"..."}`
pub async fn create<D, I, A>(
  State(cascade): State<Arc<Cascade<D, I, A>>>,
  Json(request): Json<DeletionRequest>,
) -> impl IntoResponse
where
  D: DataStore,
  I: IdentityStore,
  A: AuditSink,
{
  tracing::info!(target_id = %request.target_id, "deletion requested");
  let report: DeletionReport = cascade.delete_entity(request).await;
  (status_for(report.outcome()), Json(report))
}

// ─── Verify ───────────────────────────────────────────────────────────────────

/// `GET /staff/:id/verification`
pub async fn verification<D, I, A>(
  State(cascade): State<Arc<Cascade<D, I, A>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Verification>, ApiError>
where
  D: DataStore,
  I: IdentityStore,
  A: AuditSink,
{
  let verification = cascade
    .verify(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(verification))
}

// ─── Catalog ──────────────────────────────────────────────────────────────────

/// `GET /catalog`
pub async fn catalog<D, I, A>(
  State(cascade): State<Arc<Cascade<D, I, A>>>,
) -> Json<Catalog>
where
  D: DataStore,
  I: IdentityStore,
  A: AuditSink,
{
  Json(cascade.catalog().clone())
}
