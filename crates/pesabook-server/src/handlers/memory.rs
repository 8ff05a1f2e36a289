//! Supplier and item memory lookups
//!
//! Read-only views feeding the confirmation-form suggestions.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::{core_error, get_user_id, AppError, AppState};
use pesabook_core::models::{Item, Supplier};

/// GET /api/suppliers - Known suppliers, most recently used first
pub async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Supplier>>, AppError> {
    let user_id = get_user_id(&headers);
    let suppliers = state.db.list_suppliers(&user_id).map_err(core_error)?;
    Ok(Json(suppliers))
}

#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    pub category_id: Option<i64>,
}

/// GET /api/items?category_id= - Known items, optionally per category
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ItemQuery>,
) -> Result<Json<Vec<Item>>, AppError> {
    let user_id = get_user_id(&headers);
    let items = state
        .db
        .list_items(&user_id, params.category_id)
        .map_err(core_error)?;
    Ok(Json(items))
}
