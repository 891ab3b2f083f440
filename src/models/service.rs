use serde::{Deserialize, Serialize};

/// Immutable reference data, seeded by migration and read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub service_id: String,
    pub name: String,
    pub duration_minutes: i32,
    pub price: f64,
    pub description: String,
}

impl Service {
    pub fn price_label(&self) -> String {
        format!("R$ {:.2}", self.price)
    }
}
