//! Confirmation queue handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;

use crate::{core_error, get_user_id, AppError, AppState};
use pesabook_core::models::{ConfirmRequest, PendingTransaction, Transaction};
use pesabook_core::pipeline;

/// GET /api/pending - Unconfirmed pending transactions, newest first
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<PendingTransaction>>, AppError> {
    let user_id = get_user_id(&headers);
    let pending = state.db.list_unconfirmed(&user_id).map_err(core_error)?;
    Ok(Json(pending))
}

/// PATCH /api/pending/:id/confirm - Promote a pending transaction
///
/// Idempotent: re-confirming returns the already-created transaction.
pub async fn confirm_pending(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<Transaction>, AppError> {
    let user_id = get_user_id(&headers);
    let transaction =
        pipeline::confirm(&state.db, &user_id, id, &req, Utc::now()).map_err(core_error)?;
    Ok(Json(transaction))
}

/// POST /api/pending/:id/dismiss - Hide a pending transaction from the queue
pub async fn dismiss_pending(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<PendingTransaction>, AppError> {
    let user_id = get_user_id(&headers);
    let row = pipeline::dismiss(&state.db, &user_id, id, Utc::now()).map_err(core_error)?;
    Ok(Json(row))
}
