use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::OpeningHours;
use crate::services::ai::LlmProvider;
use crate::services::calendar::CalendarMirror;
use crate::services::messaging::MessagingProvider;

/// One instance per process, built in `main` and shared by every request
/// handler. Collaborators are boxed trait objects so tests can swap in
/// deterministic stand-ins.
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub hours: OpeningHours,
    pub llm: Box<dyn LlmProvider>,
    pub messaging: Box<dyn MessagingProvider>,
    pub calendar: Box<dyn CalendarMirror>,
}
