use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::conversation;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DevMessage {
    pub customer_id: String,
    pub message: String,
}

/// Loopback into the dialogue engine without a messaging round-trip;
/// exercises the same path the webhook takes.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DevMessage>,
) -> Result<Json<serde_json::Value>, AppError> {
    let customer_id = payload.customer_id.trim();
    let message = payload.message.trim();

    let reply = conversation::process_message(&state, customer_id, message)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "reply": reply.text,
        "choices": reply.choices,
    })))
}
