use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Greeting,
    ServiceSelection,
    DateSelection,
    TimeSelection,
    Confirmation,
    Completed,
    Help,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Greeting => "greeting",
            ConversationState::ServiceSelection => "service_selection",
            ConversationState::DateSelection => "date_selection",
            ConversationState::TimeSelection => "time_selection",
            ConversationState::Confirmation => "confirmation",
            ConversationState::Completed => "completed",
            ConversationState::Help => "help",
        }
    }

    pub fn from_tag(s: &str) -> Option<Self> {
        match s {
            "greeting" => Some(ConversationState::Greeting),
            "service_selection" => Some(ConversationState::ServiceSelection),
            "date_selection" => Some(ConversationState::DateSelection),
            "time_selection" => Some(ConversationState::TimeSelection),
            "confirmation" => Some(ConversationState::Confirmation),
            "completed" => Some(ConversationState::Completed),
            "help" => Some(ConversationState::Help),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Self {
        Self::from_tag(s).unwrap_or(ConversationState::Greeting)
    }
}

/// Slot-fill fields accumulated across turns. Well-known fields are typed;
/// anything else the classifier emits lands in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SlotData {
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SlotData {
    pub fn is_empty(&self) -> bool {
        self.service_id.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.client_name.is_none()
            && self.extra.is_empty()
    }

    /// Overlays `update` on top of self: new values win, absent values keep
    /// what was already accumulated.
    pub fn merge(&mut self, update: &SlotData) {
        if update.service_id.is_some() {
            self.service_id = update.service_id.clone();
        }
        if update.date.is_some() {
            self.date = update.date.clone();
        }
        if update.time.is_some() {
            self.time = update.time.clone();
        }
        if update.client_name.is_some() {
            self.client_name = update.client_name.clone();
        }
        for (key, value) in &update.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// The one live dialogue record per customer; overwritten every turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationContext {
    pub customer_id: String,
    pub state: ConversationState,
    pub data: SlotData,
    pub updated_at: NaiveDateTime,
}

impl ConversationContext {
    pub fn new(customer_id: &str) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            state: ConversationState::Greeting,
            data: SlotData::default(),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Applies one turn's outcome: merge extracted slot data, adopt the
    /// classifier's declared state if any, and reset the accumulated data
    /// once a booking flow completes.
    pub fn advance(&mut self, next_state: Option<ConversationState>, update: &SlotData) {
        self.data.merge(update);
        if let Some(state) = next_state {
            self.state = state;
        }
        if self.state == ConversationState::Completed {
            self.data = SlotData::default();
        }
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}
