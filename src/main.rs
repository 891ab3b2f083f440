use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::models::OpeningHours;
use salonbook::services::ai::gemini::GeminiProvider;
use salonbook::services::ai::ollama::OllamaProvider;
use salonbook::services::ai::LlmProvider;
use salonbook::services::calendar::google::GoogleCalendarClient;
use salonbook::services::messaging::whatsapp::WhatsAppProvider;
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let hours = match &config.business_hours {
        Some(json) => OpeningHours::from_json(json)?,
        None => OpeningHours::default(),
    };

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                "llama3.2".to_string(),
            ))
        }
        _ => {
            anyhow::ensure!(
                !config.gemini_api_key.is_empty(),
                "GEMINI_API_KEY must be set when LLM_PROVIDER=gemini"
            );
            tracing::info!("using Gemini LLM provider (model: {})", config.gemini_model);
            Box::new(GeminiProvider::new(
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
            ))
        }
    };

    let messaging = WhatsAppProvider::new(
        config.wa_access_token.clone(),
        config.wa_phone_number_id.clone(),
    );

    if config.calendar_token.is_empty() {
        tracing::warn!("CALENDAR_TOKEN not set, calendar mirror calls will fail");
    }
    let calendar = GoogleCalendarClient::new(
        config.calendar_token.clone(),
        config.calendar_id.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        hours,
        llm,
        messaging: Box::new(messaging),
        calendar: Box::new(calendar),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/webhook",
            get(handlers::webhook::verify_webhook).post(handlers::webhook::receive_message),
        )
        .route("/api/dev/message", post(handlers::dev::send_message))
        .route(
            "/api/admin/appointments",
            get(handlers::admin::get_appointments),
        )
        .route(
            "/api/admin/appointments/:id/cancel",
            post(handlers::admin::cancel_appointment),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
