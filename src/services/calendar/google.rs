use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;

use super::CalendarMirror;

const TIMEZONE: &str = "America/Sao_Paulo";

pub struct GoogleCalendarClient {
    token: String,
    calendar_id: String,
    client: reqwest::Client,
}

impl GoogleCalendarClient {
    pub fn new(token: String, calendar_id: String) -> Self {
        Self {
            token,
            calendar_id,
            client: reqwest::Client::new(),
        }
    }

    fn events_url(&self) -> String {
        format!(
            "https://www.googleapis.com/calendar/v3/calendars/{}/events",
            self.calendar_id
        )
    }
}

#[async_trait]
impl CalendarMirror for GoogleCalendarClient {
    async fn list_busy_intervals(
        &self,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<(NaiveTime, NaiveTime)>> {
        let day = date.format("%Y-%m-%d");
        let resp = self
            .client
            .get(self.events_url())
            .bearer_auth(&self.token)
            .query(&[
                ("timeMin", format!("{day}T00:00:00Z")),
                ("timeMax", format!("{day}T23:59:59Z")),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .context("failed to list calendar events")?
            .error_for_status()
            .context("calendar API returned error")?;

        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse calendar events")?;

        let mut busy = vec![];
        for item in data["items"].as_array().into_iter().flatten() {
            // All-day events carry "date" instead of "dateTime"; those block
            // nothing on the hourly grid here, mirroring only timed events.
            let (Some(start), Some(end)) = (
                item["start"]["dateTime"].as_str(),
                item["end"]["dateTime"].as_str(),
            ) else {
                continue;
            };
            if let (Some(start), Some(end)) = (parse_event_time(start), parse_event_time(end)) {
                busy.push((start, end));
            }
        }
        Ok(busy)
    }

    async fn insert_event(
        &self,
        event_ref: &str,
        summary: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        description: &str,
    ) -> anyhow::Result<()> {
        let body = json!({
            "id": event_ref,
            "summary": summary,
            "description": description,
            "start": { "dateTime": start.format("%Y-%m-%dT%H:%M:%S").to_string(), "timeZone": TIMEZONE },
            "end": { "dateTime": end.format("%Y-%m-%dT%H:%M:%S").to_string(), "timeZone": TIMEZONE },
            "reminders": {
                "useDefault": false,
                "overrides": [
                    { "method": "email", "minutes": 24 * 60 },
                    { "method": "popup", "minutes": 60 },
                ],
            },
        });

        let resp = self
            .client
            .post(self.events_url())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("failed to insert calendar event")?;

        // 409 means this event ref already exists: the retry case.
        if resp.status() == reqwest::StatusCode::CONFLICT {
            return Ok(());
        }
        resp.error_for_status()
            .context("calendar API rejected event insert")?;
        Ok(())
    }

    async fn delete_event(&self, event_ref: &str) -> anyhow::Result<()> {
        let resp = self
            .client
            .delete(format!("{}/{}", self.events_url(), event_ref))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("failed to delete calendar event")?;

        // Already deleted is fine.
        if resp.status() == reqwest::StatusCode::NOT_FOUND
            || resp.status() == reqwest::StatusCode::GONE
        {
            return Ok(());
        }
        resp.error_for_status()
            .context("calendar API rejected event delete")?;
        Ok(())
    }
}

fn parse_event_time(s: &str) -> Option<NaiveTime> {
    // "2025-06-16T14:00:00-03:00" or "...Z"; the time-of-day part is enough.
    let time_part = s.split('T').nth(1)?;
    NaiveTime::parse_from_str(time_part.get(..8)?, "%H:%M:%S").ok()
}
