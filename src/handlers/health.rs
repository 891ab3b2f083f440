use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "service": "salonbook",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
