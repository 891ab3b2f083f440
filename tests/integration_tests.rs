use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tower::ServiceExt;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::models::{Choice, OpeningHours};
use salonbook::services::ai::{LlmProvider, Message};
use salonbook::services::booking::{self, BookingError};
use salonbook::services::calendar::CalendarMirror;
use salonbook::services::conversation;
use salonbook::services::messaging::MessagingProvider;
use salonbook::state::AppState;

// ── Mock Providers ──

/// Deterministic classifier: keys off the latest user message and answers
/// with the JSON contract the real model is prompted for.
struct MockLlm {
    date: String,
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn chat(&self, _system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let last = messages
            .last()
            .map(|m| m.content.to_lowercase())
            .unwrap_or_default();
        let date = &self.date;

        let response = if last.contains("disponibilidade") {
            format!(
                r#"{{"message":"Claro!","action":"check_availability","data":{{"state":"time_selection","service_id":"corte_feminino","date":"{date}"}}}}"#
            )
        } else if last.contains("manicure") {
            format!(
                r#"{{"message":"Perfeito, confirmando seu agendamento.","action":"create_appointment","data":{{"state":"confirmation","service_id":"manicure","date":"{date}","time":"10:00","client_name":"Ana"}}}}"#
            )
        } else if last.contains("meus agendamentos") {
            r#"{"message":"Aqui estão seus agendamentos.","action":"list_appointments","data":{}}"#.to_string()
        } else if last.contains("cancelar") {
            r#"{"message":"Entendido.","action":"cancel_appointment","data":{}}"#.to_string()
        } else if last.contains("oi") {
            r#"{"message":"Olá! Estes são os nossos serviços:","action":"list_services","data":{"state":"service_selection"}}"#.to_string()
        } else {
            r#"{"message":"Como posso ajudar?","action":"continue","data":{}}"#.to_string()
        };

        Ok(response)
    }
}

struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn chat(&self, _system_prompt: &str, _messages: &[Message]) -> anyhow::Result<String> {
        anyhow::bail!("model unavailable")
    }
}

#[derive(Debug, Clone)]
struct SentMessage {
    to: String,
    body: String,
    choices: Vec<Choice>,
}

struct MockMessaging {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

#[async_trait]
impl MessagingProvider for MockMessaging {
    async fn send_text(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
            choices: vec![],
        });
        Ok(())
    }

    async fn send_choices(&self, to: &str, body: &str, choices: &[Choice]) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
            choices: choices.to_vec(),
        });
        Ok(())
    }
}

struct MockCalendar {
    busy: Mutex<Vec<(NaiveDate, NaiveTime, NaiveTime)>>,
    inserted: Arc<Mutex<Vec<String>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    fail_inserts: bool,
}

impl MockCalendar {
    fn new() -> Self {
        Self {
            busy: Mutex::new(vec![]),
            inserted: Arc::new(Mutex::new(vec![])),
            deleted: Arc::new(Mutex::new(vec![])),
            fail_inserts: false,
        }
    }

    fn with_busy(date: NaiveDate, intervals: &[(&str, &str)]) -> Self {
        let calendar = Self::new();
        {
            let mut busy = calendar.busy.lock().unwrap();
            for &(start, end) in intervals {
                busy.push((date, t(start), t(end)));
            }
        }
        calendar
    }
}

#[async_trait]
impl CalendarMirror for MockCalendar {
    async fn list_busy_intervals(
        &self,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<(NaiveTime, NaiveTime)>> {
        Ok(self
            .busy
            .lock()
            .unwrap()
            .iter()
            .filter(|(d, _, _)| *d == date)
            .map(|(_, start, end)| (*start, *end))
            .collect())
    }

    async fn insert_event(
        &self,
        event_ref: &str,
        _summary: &str,
        _start: NaiveDateTime,
        _end: NaiveDateTime,
        _description: &str,
    ) -> anyhow::Result<()> {
        if self.fail_inserts {
            anyhow::bail!("calendar unavailable");
        }
        self.inserted.lock().unwrap().push(event_ref.to_string());
        Ok(())
    }

    async fn delete_event(&self, event_ref: &str) -> anyhow::Result<()> {
        self.deleted.lock().unwrap().push(event_ref.to_string());
        Ok(())
    }
}

// ── Helpers ──

fn t(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

/// A date comfortably in the future so "upcoming" filters keep it.
fn future_date() -> NaiveDate {
    Utc::now().date_naive() + chrono::Days::new(30)
}

/// The next Sunday after `future_date()`; closed under the default hours.
fn future_sunday() -> NaiveDate {
    let mut date = future_date();
    while date.weekday() != chrono::Weekday::Sun {
        date = date.succ_opt().unwrap();
    }
    date
}

/// Open every day of the week so dynamically chosen test dates never land
/// on a closed day.
fn all_week_hours() -> OpeningHours {
    let windows: Vec<String> = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"]
        .iter()
        .map(|d| format!(r#"{{"day":"{d}","start":"09:00","end":"18:00"}}"#))
        .collect();
    OpeningHours::from_json(&format!(r#"{{"windows":[{}]}}"#, windows.join(","))).unwrap()
}

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        llm_provider: "mock".to_string(),
        gemini_api_key: String::new(),
        gemini_model: "gemini-pro".to_string(),
        ollama_url: "http://localhost:11434".to_string(),
        wa_access_token: String::new(),
        wa_phone_number_id: String::new(),
        wa_verify_token: "verify-secret".to_string(),
        calendar_token: String::new(),
        calendar_id: "primary".to_string(),
        business_hours: None,
    }
}

struct TestHarness {
    state: Arc<AppState>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    inserted: Arc<Mutex<Vec<String>>>,
    deleted: Arc<Mutex<Vec<String>>>,
}

fn harness_with(llm: Box<dyn LlmProvider>, calendar: MockCalendar, hours: OpeningHours) -> TestHarness {
    let conn = db::init_db(":memory:").unwrap();
    let sent = Arc::new(Mutex::new(vec![]));
    let inserted = Arc::clone(&calendar.inserted);
    let deleted = Arc::clone(&calendar.deleted);
    let messaging = MockMessaging {
        sent: Arc::clone(&sent),
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        hours,
        llm,
        messaging: Box::new(messaging),
        calendar: Box::new(calendar),
    });

    TestHarness {
        state,
        sent,
        inserted,
        deleted,
    }
}

fn harness() -> TestHarness {
    harness_with(
        Box::new(MockLlm {
            date: future_date().format("%Y-%m-%d").to_string(),
        }),
        MockCalendar::new(),
        all_week_hours(),
    )
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/webhook",
            get(handlers::webhook::verify_webhook).post(handlers::webhook::receive_message),
        )
        .route("/api/dev/message", post(handlers::dev::send_message))
        .route(
            "/api/admin/appointments",
            get(handlers::admin::get_appointments),
        )
        .route(
            "/api/admin/appointments/:id/cancel",
            post(handlers::admin::cancel_appointment),
        )
        .with_state(state)
}

fn text_payload(from: &str, body: &str) -> String {
    format!(
        r#"{{"object":"whatsapp_business_account","entry":[{{"changes":[{{"value":{{"messages":[{{"from":"{from}","type":"text","text":{{"body":"{body}"}}}}]}}}}]}}]}}"#
    )
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let h = harness();
    let app = test_app(h.state);

    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "online");
}

// ── Webhook verification ──

#[tokio::test]
async fn test_webhook_verify_success() {
    let h = harness();
    let app = test_app(h.state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=verify-secret&hub.challenge=12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let challenge = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(challenge, "12345");
}

#[tokio::test]
async fn test_webhook_verify_wrong_token() {
    let h = harness();
    let app = test_app(h.state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

// ── Webhook message flow ──

#[tokio::test]
async fn test_webhook_greeting_offers_capped_service_choices() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("Content-Type", "application/json")
                .body(Body::from(text_payload("5511999990000", "oi")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "success");

    let sent = h.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "5511999990000");
    // Six services seeded, capped to the channel's three-button limit.
    assert_eq!(sent[0].choices.len(), 3);
    assert!(sent[0].choices[0].title.contains("Corte Feminino"));
}

#[tokio::test]
async fn test_webhook_button_reply_books_appointment() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let payload = r#"{"entry":[{"changes":[{"value":{"messages":[{"from":"5511999990000","type":"interactive","interactive":{"type":"button_reply","button_reply":{"id":"service_manicure","title":"Manicure - R$ 20.00"}}}]}}]}]}"#;
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("Content-Type", "application/json")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);

    let sent = h.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("Agendamento confirmado"));
    assert!(sent[0].choices.is_empty());
    assert_eq!(h.inserted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_webhook_status_only_payload_is_ignored() {
    let h = harness();
    let app = test_app(Arc::clone(&h.state));

    let payload = r#"{"entry":[{"changes":[{"value":{"statuses":[{"id":"wamid.X","status":"delivered"}]}}]}]}"#;
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("Content-Type", "application/json")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(h.sent.lock().unwrap().is_empty());
}

// ── Dialogue scenarios ──

#[tokio::test]
async fn test_greeting_lists_services() {
    let h = harness();

    let reply = conversation::process_message(&h.state, "5511988880000", "oi")
        .await
        .unwrap();

    assert!(reply.text.contains("serviços"));
    assert_eq!(reply.choices.len(), 3);
    assert_eq!(reply.choices[0].id, "service_corte_feminino");
}

#[tokio::test]
async fn test_availability_on_free_day_offers_slots() {
    let h = harness();

    let reply = conversation::process_message(&h.state, "5511988880000", "quero ver a disponibilidade")
        .await
        .unwrap();

    assert!(reply.text.contains("Horários disponíveis"));
    assert_eq!(reply.choices.len(), 3);
    assert_eq!(reply.choices[0].title, "09:00 - 10:00");
    assert_eq!(reply.choices[0].id, "time_09:00");
}

#[tokio::test]
async fn test_availability_fully_booked_day_has_no_choices() {
    let date = future_date();
    let h = harness_with(
        Box::new(MockLlm {
            date: date.format("%Y-%m-%d").to_string(),
        }),
        MockCalendar::with_busy(date, &[("09:00", "18:00")]),
        all_week_hours(),
    );

    let reply = conversation::process_message(&h.state, "5511988880000", "quero ver a disponibilidade")
        .await
        .unwrap();

    assert!(reply.text.contains("não temos horários disponíveis"));
    assert!(reply.choices.is_empty());
}

#[tokio::test]
async fn test_availability_skips_busy_intervals() {
    let date = future_date();
    let h = harness_with(
        Box::new(MockLlm {
            date: date.format("%Y-%m-%d").to_string(),
        }),
        MockCalendar::with_busy(date, &[("09:00", "10:00")]),
        all_week_hours(),
    );

    let reply = conversation::process_message(&h.state, "5511988880000", "quero ver a disponibilidade")
        .await
        .unwrap();

    // corte_feminino is 60 min; the first clear start is 10:00.
    assert_eq!(reply.choices[0].title, "10:00 - 11:00");
}

#[tokio::test]
async fn test_booking_flow_confirms_and_lists() {
    let h = harness();
    let customer = "5511988880000";

    let reply = conversation::process_message(&h.state, customer, "quero agendar manicure")
        .await
        .unwrap();

    assert!(reply.text.contains("Agendamento confirmado"));
    assert!(reply.text.contains("Manicure"));
    assert!(reply.text.contains("20.00"));
    assert!(reply.text.contains("10:00"));

    // The booking flow resets the conversation for the next one.
    let ctx = {
        let db = h.state.db.lock().unwrap();
        salonbook::db::queries::get_context(&db, customer).unwrap().unwrap()
    };
    assert_eq!(ctx.state.as_str(), "completed");
    assert!(ctx.data.is_empty());

    // Mirrored once into the calendar.
    assert_eq!(h.inserted.lock().unwrap().len(), 1);

    let listing = conversation::process_message(&h.state, customer, "meus agendamentos")
        .await
        .unwrap();
    assert!(listing.text.contains("Manicure"));
    assert!(listing.text.contains("R$ 20.00"));
    assert!(listing.choices.is_empty());
}

#[tokio::test]
async fn test_list_appointments_empty() {
    let h = harness();

    let reply = conversation::process_message(&h.state, "5511977770000", "meus agendamentos")
        .await
        .unwrap();

    assert_eq!(reply.text, "Você não possui agendamentos futuros.");
}

#[tokio::test]
async fn test_cancel_intent_returns_referral() {
    let h = harness();

    let reply = conversation::process_message(&h.state, "5511977770000", "quero cancelar")
        .await
        .unwrap();

    assert!(reply.text.contains("(11) 99999-9999"));
    assert!(reply.choices.is_empty());
}

#[tokio::test]
async fn test_classifier_failure_degrades_to_greeting() {
    let h = harness_with(Box::new(FailingLlm), MockCalendar::new(), all_week_hours());

    let reply = conversation::process_message(&h.state, "5511977770000", "oi")
        .await
        .unwrap();

    assert!(reply.text.contains("Como posso ajudá-lo"));
    assert!(reply.choices.is_empty());
}

#[tokio::test]
async fn test_slot_conflict_reply_asks_for_another_time() {
    let h = harness();
    let date = future_date().format("%Y-%m-%d").to_string();

    // First customer takes 10:00.
    booking::create_appointment(&h.state, "5511911110000", "manicure", &date, "10:00", None)
        .await
        .unwrap();

    // Second customer's flow lands on the same slot.
    let reply = conversation::process_message(&h.state, "5511922220000", "quero agendar manicure")
        .await
        .unwrap();

    assert!(reply.text.contains("acabou de ficar indisponível"));
}

// ── Booking store ──

#[tokio::test]
async fn test_commit_time_revalidation_blocks_overlap() {
    let h = harness();
    let date = future_date().format("%Y-%m-%d").to_string();

    booking::create_appointment(&h.state, "c1", "corte_feminino", &date, "10:00", None)
        .await
        .unwrap();

    // 10:30 crosses the 10:00-11:00 booking.
    let conflict =
        booking::create_appointment(&h.state, "c2", "corte_feminino", &date, "10:30", None).await;
    assert!(matches!(conflict, Err(BookingError::SlotConflict)));

    // Back-to-back at 11:00 is legal.
    booking::create_appointment(&h.state, "c2", "corte_feminino", &date, "11:00", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_concurrent_bookings_exactly_one_wins() {
    let h = harness();
    let date = future_date().format("%Y-%m-%d").to_string();

    let first =
        booking::create_appointment(&h.state, "c1", "corte_feminino", &date, "10:00", None);
    let second =
        booking::create_appointment(&h.state, "c2", "corte_feminino", &date, "10:00", None);
    let (first, second) = tokio::join!(first, second);

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser, Err(BookingError::SlotConflict)));

    let stored = {
        let db = h.state.db.lock().unwrap();
        salonbook::db::queries::appointments_on_date(
            &db,
            NaiveDate::parse_from_str(&date, "%Y-%m-%d").unwrap(),
        )
        .unwrap()
    };
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_booking_outside_hours_rejected() {
    let h = harness();
    let date = future_date().format("%Y-%m-%d").to_string();

    let result =
        booking::create_appointment(&h.state, "c1", "corte_feminino", &date, "20:00", None).await;
    assert!(matches!(result, Err(BookingError::OutsideHours { .. })));

    // Ends past closing even though it starts inside.
    let result =
        booking::create_appointment(&h.state, "c1", "hidratacao", &date, "17:00", None).await;
    assert!(matches!(result, Err(BookingError::OutsideHours { .. })));
}

#[tokio::test]
async fn test_booking_on_closed_day_rejected() {
    let h = harness_with(
        Box::new(MockLlm {
            date: future_date().format("%Y-%m-%d").to_string(),
        }),
        MockCalendar::new(),
        OpeningHours::default(),
    );
    let sunday = future_sunday().format("%Y-%m-%d").to_string();

    let result =
        booking::create_appointment(&h.state, "c1", "manicure", &sunday, "10:00", None).await;
    assert!(matches!(result, Err(BookingError::OutsideHours { .. })));
}

#[tokio::test]
async fn test_booking_unknown_service() {
    let h = harness();
    let date = future_date().format("%Y-%m-%d").to_string();

    let result =
        booking::create_appointment(&h.state, "c1", "massagem", &date, "10:00", None).await;
    assert!(matches!(result, Err(BookingError::NotFound(_))));
}

#[tokio::test]
async fn test_booking_invalid_date_and_time() {
    let h = harness();

    let result =
        booking::create_appointment(&h.state, "c1", "manicure", "amanhã", "10:00", None).await;
    assert!(matches!(result, Err(BookingError::Validation(_))));

    let date = future_date().format("%Y-%m-%d").to_string();
    let result =
        booking::create_appointment(&h.state, "c1", "manicure", &date, "10h", None).await;
    assert!(matches!(result, Err(BookingError::Validation(_))));
}

#[tokio::test]
async fn test_booking_conflicts_with_mirror_events() {
    let date = future_date();
    let h = harness_with(
        Box::new(MockLlm {
            date: date.format("%Y-%m-%d").to_string(),
        }),
        MockCalendar::with_busy(date, &[("10:00", "11:00")]),
        all_week_hours(),
    );

    let date_str = date.format("%Y-%m-%d").to_string();
    let result =
        booking::create_appointment(&h.state, "c1", "corte_feminino", &date_str, "10:30", None)
            .await;
    assert!(matches!(result, Err(BookingError::SlotConflict)));
}

#[tokio::test]
async fn test_mirror_insert_failure_keeps_appointment() {
    let mut calendar = MockCalendar::new();
    calendar.fail_inserts = true;
    let h = harness_with(
        Box::new(MockLlm {
            date: future_date().format("%Y-%m-%d").to_string(),
        }),
        calendar,
        all_week_hours(),
    );
    let date = future_date().format("%Y-%m-%d").to_string();

    let appointment =
        booking::create_appointment(&h.state, "c1", "manicure", &date, "10:00", Some("Ana"))
            .await
            .unwrap();

    let stored = {
        let db = h.state.db.lock().unwrap();
        salonbook::db::queries::get_appointment(&db, &appointment.appointment_id).unwrap()
    };
    assert!(stored.is_some());
    assert!(h.inserted.lock().unwrap().is_empty());
}

// ── Admin API ──

#[tokio::test]
async fn test_admin_requires_auth() {
    let h = harness();
    let app = test_app(h.state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/appointments")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_list_and_cancel() {
    let h = harness();
    let date = future_date().format("%Y-%m-%d").to_string();

    let appointment =
        booking::create_appointment(&h.state, "5511933330000", "escova", &date, "14:00", None)
            .await
            .unwrap();

    // List
    let app = test_app(Arc::clone(&h.state));
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/appointments")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["service_name"], "Escova");
    assert_eq!(json[0]["status"], "scheduled");

    // Cancel
    let app = test_app(Arc::clone(&h.state));
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!(
                    "/api/admin/appointments/{}/cancel",
                    appointment.appointment_id
                ))
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Soft-cancelled, not deleted, and the mirror event was removed.
    let app = test_app(Arc::clone(&h.state));
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/appointments?status=cancelled")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["status"], "cancelled");
    assert_eq!(h.deleted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_cancel_unknown_appointment() {
    let h = harness();
    let app = test_app(h.state);

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/appointments/nope/cancel")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Dev loopback ──

#[tokio::test]
async fn test_dev_message_round_trip() {
    let h = harness();
    let app = test_app(h.state);

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/dev/message")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"customer_id":"5511944440000","message":"oi"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["choices"].as_array().unwrap().len(), 3);
}
