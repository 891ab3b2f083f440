use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{MessagingProvider, MAX_CHOICES};
use crate::models::Choice;

pub struct WhatsAppProvider {
    access_token: String,
    phone_number_id: String,
    client: reqwest::Client,
}

impl WhatsAppProvider {
    pub fn new(access_token: String, phone_number_id: String) -> Self {
        Self {
            access_token,
            phone_number_id,
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "https://graph.facebook.com/v18.0/{}/messages",
            self.phone_number_id
        )
    }

    async fn post_payload(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        self.client
            .post(self.messages_url())
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .context("failed to send WhatsApp message")?
            .error_for_status()
            .context("WhatsApp API returned error")?;
        Ok(())
    }
}

#[async_trait]
impl MessagingProvider for WhatsAppProvider {
    async fn send_text(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.post_payload(json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        }))
        .await
    }

    async fn send_choices(&self, to: &str, body: &str, choices: &[Choice]) -> anyhow::Result<()> {
        let buttons: Vec<serde_json::Value> = choices
            .iter()
            .take(MAX_CHOICES)
            .map(|choice| {
                json!({
                    "type": "reply",
                    "reply": { "id": choice.id, "title": choice.title },
                })
            })
            .collect();

        self.post_payload(json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "interactive",
            "interactive": {
                "type": "button",
                "body": { "text": body },
                "action": { "buttons": buttons },
            },
        }))
        .await
    }
}
