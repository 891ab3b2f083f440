use crate::models::{ClassifiedReply, ConversationContext};
use crate::services::ai::{LlmProvider, Message};

const SYSTEM_PROMPT: &str = r#"Você é o assistente virtual de um salão de beleza. Seu objetivo é ajudar clientes a agendar serviços de forma amigável e eficiente pelo WhatsApp.

INSTRUÇÕES:
1. Seja sempre amigável e profissional
2. Ajude o cliente a escolher o serviço desejado
3. Sugira datas e horários dentro do horário de funcionamento
4. Confirme todos os detalhes antes de finalizar
5. Se não entender algo, peça esclarecimentos
6. Mantenha as respostas concisas mas informativas

Responda SOMENTE com JSON válido (sem markdown, sem explicações) nesta estrutura exata:
{
  "message": "sua resposta para o cliente",
  "action": "list_services|check_availability|create_appointment|list_appointments|cancel_appointment|continue",
  "data": {
    "state": "greeting|service_selection|date_selection|time_selection|confirmation|completed|help",
    "service_id": "id do serviço ou null",
    "date": "data no formato 2025-01-15 ou null",
    "time": "horário no formato 14:00 ou null",
    "client_name": "nome do cliente ou null"
  }
}

AÇÕES:
- "list_services": o cliente quer ver os serviços disponíveis
- "check_availability": o cliente escolheu serviço e data; verificar horários livres
- "create_appointment": serviço, data e horário definidos; confirmar o agendamento
- "list_appointments": o cliente quer ver seus agendamentos
- "cancel_appointment": o cliente quer cancelar um agendamento
- "continue": continuar a conversa normalmente

Em "data", repita também os campos já conhecidos da conversa."#;

/// Runs one classification turn: renders the conversation context into the
/// prompt, calls the model, and parses the JSON contract back out.
pub async fn classify(
    llm: &dyn LlmProvider,
    ctx: &ConversationContext,
    latest_message: &str,
    services_summary: &str,
    hours_summary: &str,
) -> anyhow::Result<ClassifiedReply> {
    let data_json = serde_json::to_string(&ctx.data).unwrap_or_else(|_| "{}".to_string());
    let system = format!(
        "{SYSTEM_PROMPT}\n\nSERVIÇOS DISPONÍVEIS:\n{services_summary}\n\nHORÁRIO DE FUNCIONAMENTO:\n{hours_summary}\n\nCONTEXTO DA CONVERSA:\nEstado atual: {}\nDados da conversa: {data_json}",
        ctx.state.as_str(),
    );

    let messages = [Message {
        role: "user".to_string(),
        content: latest_message.to_string(),
    }];

    let response = llm.chat(&system, &messages).await?;

    Ok(parse_reply(&response))
}

/// Tolerant parse of the model's reply. Models wrap JSON in code fences or
/// prose often enough that every layer gets a chance before falling back to
/// relaying the raw text with no action.
fn parse_reply(response: &str) -> ClassifiedReply {
    if let Ok(reply) = serde_json::from_str::<ClassifiedReply>(response) {
        return reply;
    }

    let cleaned = response.trim();
    let cleaned = cleaned
        .strip_prefix("```json")
        .or_else(|| cleaned.strip_prefix("```"))
        .unwrap_or(cleaned);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(reply) = serde_json::from_str::<ClassifiedReply>(cleaned) {
        return reply;
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            if let Ok(reply) = serde_json::from_str::<ClassifiedReply>(&cleaned[start..=end]) {
                return reply;
            }
        }
    }

    tracing::warn!("failed to parse classifier response as JSON, relaying raw text");
    ClassifiedReply::fallback(response.trim())
}
