use serde::Deserialize;

use crate::models::SlotData;

/// Action tag the classifier asks the orchestrator to dispatch on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AgentAction {
    ListServices,
    CheckAvailability,
    CreateAppointment,
    ListAppointments,
    CancelAppointment,
    #[default]
    Continue,
}

impl AgentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentAction::ListServices => "list_services",
            AgentAction::CheckAvailability => "check_availability",
            AgentAction::CreateAppointment => "create_appointment",
            AgentAction::ListAppointments => "list_appointments",
            AgentAction::CancelAppointment => "cancel_appointment",
            AgentAction::Continue => "continue",
        }
    }

    /// Maps a classifier tag to an action; unknown tags fall back to
    /// `Continue` so a creative model never breaks dispatch. The
    /// `show_*`/`*_conversation` spellings are accepted because models
    /// occasionally echo them back from examples.
    pub fn parse(s: &str) -> Self {
        match s {
            "list_services" | "show_services" => AgentAction::ListServices,
            "check_availability" => AgentAction::CheckAvailability,
            "create_appointment" => AgentAction::CreateAppointment,
            "list_appointments" | "show_appointments" => AgentAction::ListAppointments,
            "cancel_appointment" => AgentAction::CancelAppointment,
            _ => AgentAction::Continue,
        }
    }
}

/// Structured outcome of one classifier call: the reply to relay, the
/// action to dispatch, and whatever slot data was extracted this turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifiedReply {
    pub message: String,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    pub data: ExtractedData,
}

impl ClassifiedReply {
    pub fn action(&self) -> AgentAction {
        self.action
            .as_deref()
            .map(AgentAction::parse)
            .unwrap_or_default()
    }

    pub fn fallback(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action: None,
            data: ExtractedData::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedData {
    /// Advisory next dialogue state; ignored when missing or unknown.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(flatten)]
    pub slots: SlotData,
}
