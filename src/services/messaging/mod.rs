pub mod whatsapp;

use async_trait::async_trait;

use crate::models::Choice;

/// WhatsApp caps interactive reply buttons at three per message; every
/// choice list in the system is trimmed to this.
pub const MAX_CHOICES: usize = 3;

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> anyhow::Result<()>;

    async fn send_choices(&self, to: &str, body: &str, choices: &[Choice]) -> anyhow::Result<()>;
}
