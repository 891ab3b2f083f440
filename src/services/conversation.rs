use chrono::{NaiveDate, Utc};

use crate::db::queries;
use crate::models::{
    AgentAction, Appointment, AppointmentStatus, Choice, ClassifiedReply, ConversationContext,
    ConversationState, Reply, SlotData,
};
use crate::services::ai::intent;
use crate::services::messaging::MAX_CHOICES;
use crate::services::{availability, booking};
use crate::state::AppState;

const FALLBACK_GREETING: &str = "Olá! Como posso ajudá-lo hoje? Gostaria de agendar um serviço?";
const APOLOGY: &str = "Desculpe, ocorreu um erro. Tente novamente em alguns instantes.";
const CANCEL_REFERRAL: &str =
    "Para cancelar um agendamento, entre em contato conosco pelo telefone (11) 99999-9999.";

/// Handles one inbound turn: load context, classify, dispatch the action,
/// persist the merged context, and hand back the outbound reply.
///
/// A classifier or dispatch failure never kills the turn; it degrades to a
/// fixed reply and the context is still persisted with what was learned.
pub async fn process_message(
    state: &AppState,
    customer_id: &str,
    message: &str,
) -> anyhow::Result<Reply> {
    let mut ctx = {
        let db = state.db.lock().unwrap();
        queries::get_context(&db, customer_id)?
    }
    .unwrap_or_else(|| ConversationContext::new(customer_id));

    // Returning customers get their name pre-filled from the profile.
    if ctx.data.client_name.is_none() {
        let profile = {
            let db = state.db.lock().unwrap();
            queries::get_client(&db, customer_id).unwrap_or(None)
        };
        if let Some(client) = profile {
            ctx.data.client_name = client.name;
        }
    }

    let classified = match classify_turn(state, &ctx, message).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, customer = customer_id, "intent classification failed, using fallback greeting");
            ClassifiedReply::fallback(FALLBACK_GREETING)
        }
    };

    tracing::info!(
        customer = customer_id,
        action = classified.action().as_str(),
        state = ctx.state.as_str(),
        "processing message"
    );

    // The classifier re-emits what it knows; merge it over the accumulated
    // data so dispatch sees slots filled on earlier turns too.
    let mut effective = ctx.data.clone();
    effective.merge(&classified.data.slots);

    let mut booked = false;
    let reply = match classified.action() {
        AgentAction::ListServices => list_services(state, &classified.message),
        AgentAction::CheckAvailability => {
            check_availability(state, &effective, &classified.message).await
        }
        AgentAction::CreateAppointment => {
            create_appointment(state, customer_id, &effective, &classified.message, &mut booked)
                .await
        }
        AgentAction::ListAppointments => list_appointments(state, customer_id, &classified.message),
        AgentAction::CancelAppointment => Ok(Reply::text(CANCEL_REFERRAL)),
        AgentAction::Continue => Ok(Reply::text(classified.message.clone())),
    }
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, customer = customer_id, "action dispatch failed");
        Reply::text(APOLOGY)
    });

    // Persist the turn: accumulated data plus the classifier's advisory
    // state; a completed booking wins over whatever the classifier said.
    ctx.data = effective;
    let declared = classified
        .data
        .state
        .as_deref()
        .and_then(ConversationState::from_tag);
    ctx.advance(declared, &SlotData::default());
    if booked {
        ctx.state = ConversationState::Completed;
        ctx.data = SlotData::default();
    }

    {
        let db = state.db.lock().unwrap();
        if let Err(e) = queries::save_context(&db, &ctx) {
            tracing::error!(error = %e, customer = customer_id, "failed to persist conversation context");
        }
    }

    Ok(reply)
}

async fn classify_turn(
    state: &AppState,
    ctx: &ConversationContext,
    message: &str,
) -> anyhow::Result<ClassifiedReply> {
    let services = {
        let db = state.db.lock().unwrap();
        queries::list_services(&db)?
    };
    let services_summary = services
        .iter()
        .map(|s| {
            format!(
                "- {} ({} min) - {} [id: {}]",
                s.name, s.duration_minutes, s.price_label(), s.service_id
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    intent::classify(
        state.llm.as_ref(),
        ctx,
        message,
        &services_summary,
        &state.hours.to_human_readable(),
    )
    .await
}

fn list_services(state: &AppState, message: &str) -> anyhow::Result<Reply> {
    let services = {
        let db = state.db.lock().unwrap();
        queries::list_services(&db)?
    };

    let choices: Vec<Choice> = services
        .iter()
        .take(MAX_CHOICES)
        .map(|s| Choice {
            id: format!("service_{}", s.service_id),
            title: format!("{} - {}", s.name, s.price_label()),
        })
        .collect();

    Ok(Reply::with_choices(message, choices))
}

async fn check_availability(
    state: &AppState,
    data: &SlotData,
    message: &str,
) -> anyhow::Result<Reply> {
    let (Some(date_str), Some(service_id)) = (data.date.as_deref(), data.service_id.as_deref())
    else {
        return Ok(Reply::text(
            "Por favor, me informe a data e o serviço desejado.",
        ));
    };
    let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
        return Ok(Reply::text(
            "Não entendi a data. Pode me informar no formato 2025-01-15?",
        ));
    };

    let service = {
        let db = state.db.lock().unwrap();
        queries::get_service(&db, service_id)?
    };
    let Some(service) = service else {
        return Ok(Reply::text("Serviço não encontrado."));
    };

    let Some((open, close)) = state.hours.window_for(date) else {
        return Ok(Reply::text(format!(
            "Infelizmente não temos horários disponíveis para {date_str}. Gostaria de tentar outra data?"
        )));
    };

    let mut busy = match state.calendar.list_busy_intervals(date).await {
        Ok(busy) => busy,
        Err(e) => {
            tracing::error!(error = %e, date = date_str, "calendar busy lookup failed");
            return Ok(Reply::text(
                "Erro ao verificar disponibilidade. Tente novamente.",
            ));
        }
    };
    {
        let db = state.db.lock().unwrap();
        busy.extend(
            queries::appointments_on_date(&db, date)?
                .iter()
                .map(|a| (a.time, a.time + chrono::Duration::minutes(a.duration_minutes as i64))),
        );
    }

    let slots = availability::compute_slots(
        service.duration_minutes.max(0) as u32,
        &busy,
        open,
        close,
        availability::SLOT_STEP_MINUTES,
    );

    if slots.is_empty() {
        return Ok(Reply::text(format!(
            "Infelizmente não temos horários disponíveis para {date_str}. Gostaria de tentar outra data?"
        )));
    }

    let choices: Vec<Choice> = slots
        .iter()
        .take(MAX_CHOICES)
        .map(|slot| Choice {
            id: format!("time_{}", slot.start.format("%H:%M")),
            title: slot.formatted.clone(),
        })
        .collect();

    Ok(Reply::with_choices(
        format!("{message}\n\nHorários disponíveis para {date_str}:"),
        choices,
    ))
}

async fn create_appointment(
    state: &AppState,
    customer_id: &str,
    data: &SlotData,
    message: &str,
    booked: &mut bool,
) -> anyhow::Result<Reply> {
    let (Some(service_id), Some(date), Some(time)) = (
        data.service_id.as_deref(),
        data.date.as_deref(),
        data.time.as_deref(),
    ) else {
        return Ok(Reply::text(
            "Informações incompletas para o agendamento. Vamos começar novamente?",
        ));
    };

    match booking::create_appointment(
        state,
        customer_id,
        service_id,
        date,
        time,
        data.client_name.as_deref(),
    )
    .await
    {
        Ok(appointment) => {
            *booked = true;
            {
                let db = state.db.lock().unwrap();
                if let Err(e) =
                    queries::save_client(&db, customer_id, appointment.client_name.as_deref())
                {
                    tracing::warn!(error = %e, customer = customer_id, "failed to save client profile");
                }
            }
            Ok(Reply::text(format!(
                "{message}\n\n✅ Agendamento confirmado!\n\n📅 Data: {}\n🕐 Horário: {}\n💇 Serviço: {}\n💰 Valor: R$ {:.2}\n\nAguardamos você! 😊",
                appointment.date.format("%Y-%m-%d"),
                appointment.time.format("%H:%M"),
                appointment.service_name,
                appointment.price,
            )))
        }
        Err(booking::BookingError::SlotConflict) => Ok(Reply::text(
            "Esse horário acabou de ficar indisponível. Pode escolher outro?",
        )),
        Err(booking::BookingError::OutsideHours { hours }) => Ok(Reply::text(format!(
            "Esse horário fica fora do nosso funcionamento. Atendemos: {hours}"
        ))),
        Err(booking::BookingError::NotFound(_)) => Ok(Reply::text("Serviço não encontrado.")),
        Err(booking::BookingError::Validation(_)) => Ok(Reply::text(
            "Informações incompletas para o agendamento. Vamos começar novamente?",
        )),
        Err(booking::BookingError::Collaborator(e)) => {
            tracing::error!(error = %e, customer = customer_id, "booking commit failed");
            Ok(Reply::text("Erro ao finalizar agendamento. Tente novamente."))
        }
    }
}

fn list_appointments(state: &AppState, customer_id: &str, message: &str) -> anyhow::Result<Reply> {
    let appointments = booking::list_by_customer(state, customer_id)?;

    let today = Utc::now().date_naive();
    let upcoming: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Scheduled && a.date >= today)
        .collect();

    if upcoming.is_empty() {
        return Ok(Reply::text("Você não possui agendamentos futuros."));
    }

    let mut listing = String::from("Seus agendamentos:\n");
    for appointment in upcoming {
        listing.push_str(&format!(
            "\n📅 {} às {}\n💇 {}\n💰 R$ {:.2}\n",
            appointment.date.format("%Y-%m-%d"),
            appointment.time.format("%H:%M"),
            appointment.service_name,
            appointment.price,
        ));
    }

    Ok(Reply::text(format!("{message}\n\n{listing}")))
}
