pub mod google;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// External calendar the booking store mirrors into. The booking store is
/// authoritative; the mirror is best-effort and reconciled by event ref.
#[async_trait]
pub trait CalendarMirror: Send + Sync {
    /// Occupied `[start, end)` intervals on the given date.
    async fn list_busy_intervals(
        &self,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<(NaiveTime, NaiveTime)>>;

    /// Creates the mirrored event. Must be idempotent per `event_ref` so a
    /// retry after a partial failure cannot double-book the mirror.
    async fn insert_event(
        &self,
        event_ref: &str,
        summary: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        description: &str,
    ) -> anyhow::Result<()>;

    /// Removes the mirrored event; deleting an already-gone event is Ok.
    async fn delete_event(&self, event_ref: &str) -> anyhow::Result<()>;
}
