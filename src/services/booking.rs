use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::db::queries;
use crate::models::{Appointment, AppointmentStatus};
use crate::services::availability;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("invalid field: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("requested time is outside opening hours")]
    OutsideHours { hours: String },

    #[error("requested interval overlaps an existing appointment")]
    SlotConflict,

    #[error("collaborator call failed: {0}")]
    Collaborator(#[from] anyhow::Error),
}

/// Creates an appointment, re-validating availability against the live busy
/// set immediately before the insert. Validation and insert happen under
/// one database lock, so of two racing commits for overlapping intervals
/// exactly one wins and the other sees `SlotConflict`. This stands in for
/// a transaction spanning the store and the external mirror.
pub async fn create_appointment(
    state: &AppState,
    customer_id: &str,
    service_id: &str,
    date_str: &str,
    time_str: &str,
    client_name: Option<&str>,
) -> Result<Appointment, BookingError> {
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| BookingError::Validation(format!("date: {date_str}")))?;
    let time = NaiveTime::parse_from_str(time_str, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time_str, "%H:%M:%S"))
        .map_err(|_| BookingError::Validation(format!("time: {time_str}")))?;

    let service = {
        let db = state.db.lock().unwrap();
        queries::get_service(&db, service_id).map_err(BookingError::Collaborator)?
    }
    .ok_or_else(|| BookingError::NotFound(format!("service {service_id}")))?;

    let Some((open, close)) = state.hours.window_for(date) else {
        return Err(BookingError::OutsideHours {
            hours: state.hours.to_human_readable(),
        });
    };
    let end = end_time(time, service.duration_minutes);
    if time < open || end > close || end <= time {
        return Err(BookingError::OutsideHours {
            hours: state.hours.to_human_readable(),
        });
    }

    // Mirror busy intervals are fetched outside the lock; the store's own
    // rows are re-read inside it so the overlap check sees every committed
    // booking. A mirror outage degrades to local-only validation because
    // the store, not the mirror, is authoritative (the miss is logged).
    let mirror_busy = match state.calendar.list_busy_intervals(date).await {
        Ok(busy) => busy,
        Err(e) => {
            tracing::warn!(error = %e, %date_str, "calendar busy lookup failed, validating against local bookings only");
            vec![]
        }
    };

    let appointment = {
        let db = state.db.lock().unwrap();

        let mut busy: Vec<(NaiveTime, NaiveTime)> = queries::appointments_on_date(&db, date)
            .map_err(BookingError::Collaborator)?
            .iter()
            .map(|a| (a.time, end_time(a.time, a.duration_minutes)))
            .collect();
        busy.extend(mirror_busy);

        if busy
            .iter()
            .any(|&(busy_start, busy_end)| availability::overlaps(time, end, busy_start, busy_end))
        {
            return Err(BookingError::SlotConflict);
        }

        let now = Utc::now().naive_utc();
        let appointment = Appointment {
            appointment_id: uuid::Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            service_id: service.service_id.clone(),
            service_name: service.name.clone(),
            date,
            time,
            duration_minutes: service.duration_minutes,
            price: service.price,
            status: AppointmentStatus::Scheduled,
            client_name: client_name.map(|s| s.to_string()),
            created_at: now,
            updated_at: now,
        };
        queries::insert_appointment(&db, &appointment).map_err(BookingError::Collaborator)?;
        appointment
    };

    mirror_insert(state, &appointment).await;

    Ok(appointment)
}

/// All appointments for a customer, earliest first. Status and date
/// filtering belong to the presentation layer.
pub fn list_by_customer(state: &AppState, customer_id: &str) -> Result<Vec<Appointment>, BookingError> {
    let db = state.db.lock().unwrap();
    queries::appointments_for_customer(&db, customer_id).map_err(BookingError::Collaborator)
}

/// Last-write-wins status overwrite; soft transitions only, rows are never
/// deleted. A cancellation also removes the mirrored calendar event.
pub async fn update_status(
    state: &AppState,
    appointment_id: &str,
    status: AppointmentStatus,
) -> Result<(), BookingError> {
    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_appointment_status(&db, appointment_id, status)
            .map_err(BookingError::Collaborator)?
    };
    if !updated {
        return Err(BookingError::NotFound(format!(
            "appointment {appointment_id}"
        )));
    }

    if status == AppointmentStatus::Cancelled {
        if let Err(e) = state.calendar.delete_event(&event_ref(appointment_id)).await {
            tracing::error!(error = %e, %appointment_id, "calendar mirror delete failed");
        }
    }

    Ok(())
}

async fn mirror_insert(state: &AppState, appointment: &Appointment) {
    let start = NaiveDateTime::new(appointment.date, appointment.time);
    let end = start + Duration::minutes(appointment.duration_minutes as i64);
    let summary = format!(
        "{} - {}",
        appointment.service_name,
        appointment.client_name.as_deref().unwrap_or("Cliente"),
    );
    let description = format!(
        "Cliente: {}\nServiço: {}\nPreço: R$ {:.2}",
        appointment.customer_id, appointment.service_name, appointment.price,
    );

    // The appointment stands either way; a failed mirror write is an
    // inconsistency to reconcile, not a failed booking.
    if let Err(e) = state
        .calendar
        .insert_event(
            &event_ref(&appointment.appointment_id),
            &summary,
            start,
            end,
            &description,
        )
        .await
    {
        tracing::error!(
            error = %e,
            appointment_id = %appointment.appointment_id,
            "calendar mirror insert failed, appointment kept"
        );
    }
}

/// Calendar event refs reuse the appointment id with dashes stripped (hex
/// is valid in Google's event-id alphabet), so reconciliation needs no
/// stored mapping.
fn event_ref(appointment_id: &str) -> String {
    appointment_id.replace('-', "")
}

fn end_time(start: NaiveTime, duration_minutes: i32) -> NaiveTime {
    use chrono::Timelike;
    let minutes = start.num_seconds_from_midnight() / 60 + duration_minutes.max(0) as u32;
    NaiveTime::from_hms_opt((minutes / 60).min(23), minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}
