use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::services::conversation;
use crate::state::AppState;

const APOLOGY: &str = "Desculpe, ocorreu um erro. Tente novamente em alguns instantes.";

// ── Subscription handshake ──

#[derive(Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// WhatsApp Cloud API webhook verification: echo the challenge back when
/// the verify token matches, refuse otherwise.
pub async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let mode_ok = params.mode.as_deref() == Some("subscribe");
    let token_ok = !state.config.wa_verify_token.is_empty()
        && params.verify_token.as_deref() == Some(state.config.wa_verify_token.as_str());

    if mode_ok && token_ok {
        (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
    } else {
        tracing::warn!("webhook verification failed");
        (StatusCode::FORBIDDEN, "verification failed").into_response()
    }
}

// ── Inbound messages ──

#[derive(Deserialize, Default)]
pub struct WebhookPayload {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Deserialize, Default)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Deserialize, Default)]
struct Change {
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Deserialize, Default)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<InboundMessage>,
}

#[derive(Deserialize)]
struct InboundMessage {
    from: String,
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextBody>,
    interactive: Option<Interactive>,
}

#[derive(Deserialize)]
struct TextBody {
    body: String,
}

#[derive(Deserialize)]
struct Interactive {
    button_reply: Option<ButtonReply>,
}

#[derive(Deserialize)]
struct ButtonReply {
    title: String,
}

pub async fn receive_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WebhookPayload>,
) -> Json<serde_json::Value> {
    for entry in &payload.entry {
        for change in &entry.changes {
            for message in &change.value.messages {
                handle_inbound(&state, message).await;
            }
        }
    }

    Json(serde_json::json!({ "status": "success" }))
}

async fn handle_inbound(state: &Arc<AppState>, message: &InboundMessage) {
    // Button taps flow back through the dialogue as plain text; the
    // classifier reads the selection the same way it reads typed input.
    let input = match message.kind.as_str() {
        "text" => message.text.as_ref().map(|t| t.body.trim().to_string()),
        "interactive" => message
            .interactive
            .as_ref()
            .and_then(|i| i.button_reply.as_ref())
            .map(|b| format!("Selecionei: {}", b.title)),
        other => {
            tracing::info!(from = %message.from, kind = other, "ignoring unsupported message type");
            None
        }
    };
    let Some(input) = input else { return };

    tracing::info!(from = %message.from, body = %input, "incoming message");

    match conversation::process_message(state, &message.from, &input).await {
        Ok(reply) => {
            let sent = if reply.choices.is_empty() {
                state.messaging.send_text(&message.from, &reply.text).await
            } else {
                state
                    .messaging
                    .send_choices(&message.from, &reply.text, &reply.choices)
                    .await
            };
            if let Err(e) = sent {
                tracing::error!(error = %e, to = %message.from, "failed to send reply");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, from = %message.from, "conversation processing failed");
            let _ = state.messaging.send_text(&message.from, APOLOGY).await;
        }
    }
}
