use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Known customer profile, keyed by the messaging channel handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub customer_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
