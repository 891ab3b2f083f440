use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub llm_provider: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub ollama_url: String,
    pub wa_access_token: String,
    pub wa_phone_number_id: String,
    pub wa_verify_token: String,
    pub calendar_token: String,
    pub calendar_id: String,
    pub business_hours: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salonbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "gemini".to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-pro".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            wa_access_token: env::var("WA_ACCESS_TOKEN").unwrap_or_default(),
            wa_phone_number_id: env::var("WA_PHONE_NUMBER_ID").unwrap_or_default(),
            wa_verify_token: env::var("WA_VERIFY_TOKEN").unwrap_or_default(),
            calendar_token: env::var("CALENDAR_TOKEN").unwrap_or_default(),
            calendar_id: env::var("CALENDAR_ID").unwrap_or_else(|_| "primary".to_string()),
            business_hours: env::var("BUSINESS_HOURS").ok(),
        }
    }
}
