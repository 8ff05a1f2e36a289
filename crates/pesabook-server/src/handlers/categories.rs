//! Category handlers

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;

use crate::{core_error, get_user_id, AppError, AppState};
use pesabook_core::models::Category;

fn default_is_business() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default = "default_is_business")]
    pub is_business: bool,
}

/// GET /api/categories - List categories, provisioning defaults on first use
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Category>>, AppError> {
    let user_id = get_user_id(&headers);
    state
        .db
        .seed_default_categories(&user_id)
        .map_err(core_error)?;
    let categories = state.db.list_categories(&user_id).map_err(core_error)?;
    Ok(Json(categories))
}

/// POST /api/categories - Create a category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let user_id = get_user_id(&headers);
    let category = state
        .db
        .create_category(&user_id, &req.name, req.is_business)
        .map_err(core_error)?;
    Ok(Json(category))
}
