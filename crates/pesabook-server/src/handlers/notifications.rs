//! Notification ingestion gateway

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::{core_error, get_user_id, AppError, AppState};
use pesabook_core::models::RawNotification;
use pesabook_core::pipeline::{self, SubmitOutcome};

/// Body forwarded by the device-side SMS listener
#[derive(Debug, Deserialize)]
pub struct SubmitNotificationRequest {
    pub sms_text: String,
    pub sender_number: String,
    /// Device-reported line, e.g. "SIM1", when the listener knows it
    pub line_id: Option<String>,
}

/// POST /api/notifications - Submit an inbound SMS notification
pub async fn submit_notification(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SubmitNotificationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = get_user_id(&headers);
    let now = Utc::now();

    // First contact for a user also provisions their category defaults
    state
        .db
        .seed_default_categories(&user_id)
        .map_err(core_error)?;

    let raw = RawNotification {
        text: req.sms_text,
        sender_id: req.sender_number,
        line_id: req.line_id,
        received_at: now,
    };

    let outcome = pipeline::submit_notification(&state.db, &state.parser, &user_id, &raw, now)
        .map_err(core_error)?;

    match outcome {
        SubmitOutcome::Irrelevant => Ok(Json(serde_json::json!({
            "relevant": false
        }))),
        SubmitOutcome::Invalid(_) => Err(AppError::unprocessable(
            "Could not extract a valid transaction from the message",
        )),
        SubmitOutcome::Accepted {
            pending,
            parsed,
            supplier,
            suggestion,
            duplicate,
        } => Ok(Json(serde_json::json!({
            "relevant": true,
            "pending_transaction": pending,
            "parsed": parsed,
            "supplier": supplier,
            "suggestion": suggestion,
            "needs_confirmation": true,
            "duplicate": duplicate,
        }))),
    }
}
