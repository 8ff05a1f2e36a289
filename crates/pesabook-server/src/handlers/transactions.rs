//! Committed transaction handlers

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};

use crate::{core_error, get_user_id, AppError, AppState};
use pesabook_core::models::Transaction;

/// GET /api/transactions - Committed transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let user_id = get_user_id(&headers);
    let transactions = state.db.list_transactions(&user_id).map_err(core_error)?;
    Ok(Json(transactions))
}
