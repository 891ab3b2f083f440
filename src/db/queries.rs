use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Appointment, AppointmentStatus, Client, ConversationContext, ConversationState, Service,
    SlotData,
};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ── Conversation contexts ──

pub fn get_context(conn: &Connection, customer_id: &str) -> anyhow::Result<Option<ConversationContext>> {
    let result = conn.query_row(
        "SELECT customer_id, state, data, updated_at FROM conversations WHERE customer_id = ?1",
        params![customer_id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((customer_id, state_str, data_json, updated_at_str)) => {
            let data: SlotData = serde_json::from_str(&data_json).unwrap_or_default();
            let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
                .unwrap_or_else(|_| Utc::now().naive_utc());

            Ok(Some(ConversationContext {
                customer_id,
                state: ConversationState::parse(&state_str),
                data,
                updated_at,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_context(conn: &Connection, ctx: &ConversationContext) -> anyhow::Result<()> {
    let data_json = serde_json::to_string(&ctx.data)?;
    let updated_at = ctx.updated_at.format(DATETIME_FMT).to_string();

    conn.execute(
        "INSERT INTO conversations (customer_id, state, data, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(customer_id) DO UPDATE SET
           state = excluded.state,
           data = excluded.data,
           updated_at = excluded.updated_at",
        params![ctx.customer_id, ctx.state.as_str(), data_json, updated_at],
    )?;
    Ok(())
}

// ── Services ──

pub fn list_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT service_id, name, duration_minutes, price, description FROM services ORDER BY rowid",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Service {
            service_id: row.get(0)?,
            name: row.get(1)?,
            duration_minutes: row.get(2)?,
            price: row.get(3)?,
            description: row.get(4)?,
        })
    })?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn get_service(conn: &Connection, service_id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT service_id, name, duration_minutes, price, description FROM services WHERE service_id = ?1",
        params![service_id],
        |row| {
            Ok(Service {
                service_id: row.get(0)?,
                name: row.get(1)?,
                duration_minutes: row.get(2)?,
                price: row.get(3)?,
                description: row.get(4)?,
            })
        },
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Appointments ──

pub fn insert_appointment(conn: &Connection, appointment: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments
           (appointment_id, customer_id, service_id, service_name, date, time,
            duration_minutes, price, status, client_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            appointment.appointment_id,
            appointment.customer_id,
            appointment.service_id,
            appointment.service_name,
            appointment.date.format("%Y-%m-%d").to_string(),
            appointment.time.format("%H:%M").to_string(),
            appointment.duration_minutes,
            appointment.price,
            appointment.status.as_str(),
            appointment.client_name,
            appointment.created_at.format(DATETIME_FMT).to_string(),
            appointment.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// All of a customer's appointments, any status, earliest date first.
/// Filtering to upcoming/scheduled is the caller's concern.
pub fn appointments_for_customer(
    conn: &Connection,
    customer_id: &str,
) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT appointment_id, customer_id, service_id, service_name, date, time,
                duration_minutes, price, status, client_name, created_at, updated_at
         FROM appointments WHERE customer_id = ?1 ORDER BY date ASC, time ASC",
    )?;

    let rows = stmt.query_map(params![customer_id], |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

/// Scheduled appointments on a date; the source of local busy intervals.
pub fn appointments_on_date(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT appointment_id, customer_id, service_id, service_name, date, time,
                duration_minutes, price, status, client_name, created_at, updated_at
         FROM appointments WHERE date = ?1 AND status = 'scheduled' ORDER BY time ASC",
    )?;

    let date_str = date.format("%Y-%m-%d").to_string();
    let rows = stmt.query_map(params![date_str], |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn get_appointment(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    let result = conn.query_row(
        "SELECT appointment_id, customer_id, service_id, service_name, date, time,
                duration_minutes, price, status, client_name, created_at, updated_at
         FROM appointments WHERE appointment_id = ?1",
        params![id],
        |row| Ok(parse_appointment_row(row)),
    );

    match result {
        Ok(appointment) => Ok(Some(appointment?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Last-write-wins status overwrite. Returns false when the id is unknown.
pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE appointment_id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn list_appointments(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Appointment>> {
    let mut appointments = vec![];
    match status_filter {
        Some(status) => {
            let mut stmt = conn.prepare(
                "SELECT appointment_id, customer_id, service_id, service_name, date, time,
                        duration_minutes, price, status, client_name, created_at, updated_at
                 FROM appointments WHERE status = ?1 ORDER BY date DESC, time DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![status, limit], |row| Ok(parse_appointment_row(row)))?;
            for row in rows {
                appointments.push(row??);
            }
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT appointment_id, customer_id, service_id, service_name, date, time,
                        duration_minutes, price, status, client_name, created_at, updated_at
                 FROM appointments ORDER BY date DESC, time DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| Ok(parse_appointment_row(row)))?;
            for row in rows {
                appointments.push(row??);
            }
        }
    }
    Ok(appointments)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let appointment_id: String = row.get(0)?;
    let customer_id: String = row.get(1)?;
    let service_id: String = row.get(2)?;
    let service_name: String = row.get(3)?;
    let date_str: String = row.get(4)?;
    let time_str: String = row.get(5)?;
    let duration_minutes: i32 = row.get(6)?;
    let price: f64 = row.get(7)?;
    let status_str: String = row.get(8)?;
    let client_name: Option<String> = row.get(9)?;
    let created_at_str: String = row.get(10)?;
    let updated_at_str: String = row.get(11)?;

    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .unwrap_or_else(|_| Utc::now().date_naive());
    let time = NaiveTime::parse_from_str(&time_str, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&time_str, "%H:%M:%S"))
        .unwrap_or(NaiveTime::MIN);
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Appointment {
        appointment_id,
        customer_id,
        service_id,
        service_name,
        date,
        time,
        duration_minutes,
        price,
        status: AppointmentStatus::parse(&status_str),
        client_name,
        created_at,
        updated_at,
    })
}

// ── Clients ──

pub fn get_client(conn: &Connection, customer_id: &str) -> anyhow::Result<Option<Client>> {
    let result = conn.query_row(
        "SELECT customer_id, name, email, created_at, updated_at FROM clients WHERE customer_id = ?1",
        params![customer_id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    );

    match result {
        Ok((customer_id, name, email, created_at_str, updated_at_str)) => {
            let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
                .unwrap_or_else(|_| Utc::now().naive_utc());
            let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
                .unwrap_or_else(|_| Utc::now().naive_utc());
            Ok(Some(Client {
                customer_id,
                name,
                email,
                created_at,
                updated_at,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Upsert that never erases a known name with an absent one.
pub fn save_client(conn: &Connection, customer_id: &str, name: Option<&str>) -> anyhow::Result<()> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    conn.execute(
        "INSERT INTO clients (customer_id, name, email, created_at, updated_at)
         VALUES (?1, ?2, NULL, ?3, ?3)
         ON CONFLICT(customer_id) DO UPDATE SET
           name = COALESCE(excluded.name, clients.name),
           updated_at = excluded.updated_at",
        params![customer_id, name, now],
    )?;
    Ok(())
}
