use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayWindow {
    pub day: String,
    pub start: String,
    pub end: String,
}

/// Per-weekday opening windows. Days with no window are closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningHours {
    pub windows: Vec<DayWindow>,
}

impl Default for OpeningHours {
    fn default() -> Self {
        let window = |day: &str, start: &str, end: &str| DayWindow {
            day: day.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        };
        Self {
            windows: vec![
                window("mon", "09:00", "18:00"),
                window("tue", "09:00", "18:00"),
                window("wed", "09:00", "18:00"),
                window("thu", "09:00", "18:00"),
                window("fri", "09:00", "18:00"),
                window("sat", "09:00", "16:00"),
            ],
        }
    }
}

impl OpeningHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: OpeningHours = serde_json::from_str(s)?;
        for window in &hours.windows {
            parse_weekday(&window.day)?;
            let start = parse_time(&window.start)?;
            let end = parse_time(&window.end)?;
            anyhow::ensure!(
                start < end,
                "window must open before it closes: {} {}-{}",
                window.day,
                window.start,
                window.end
            );
        }
        Ok(hours)
    }

    /// The open/close window for a calendar date, or `None` when closed.
    pub fn window_for(&self, date: NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
        let weekday = date.format("%a").to_string().to_lowercase();
        self.windows
            .iter()
            .find(|w| w.day.to_lowercase() == weekday)
            .and_then(|w| Some((parse_time(&w.start).ok()?, parse_time(&w.end).ok()?)))
    }

    pub fn to_human_readable(&self) -> String {
        if self.windows.is_empty() {
            return String::new();
        }

        let day_order = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

        let mut sorted = self.windows.clone();
        sorted.sort_by_key(|w| {
            day_order
                .iter()
                .position(|d| *d == w.day.to_lowercase())
                .unwrap_or(day_order.len())
        });

        sorted
            .iter()
            .map(|w| format!("{}: {}-{}", capitalize(&w.day), w.start, w.end))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
    }
}

fn parse_weekday(s: &str) -> anyhow::Result<()> {
    match s.to_lowercase().as_str() {
        "mon" | "tue" | "wed" | "thu" | "fri" | "sat" | "sun" => Ok(()),
        _ => Err(anyhow::anyhow!("invalid weekday: {s}")),
    }
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| anyhow::anyhow!("invalid time: {s}"))
}
