use chrono::NaiveTime;

/// Default sliding-window step between candidate slots.
pub const SLOT_STEP_MINUTES: u32 = 30;

/// A candidate bookable window within business hours. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub formatted: String,
}

/// Half-open overlap test: `[a_start, a_end)` against `[b_start, b_end)`.
/// Touching endpoints do not overlap, so back-to-back bookings are legal.
pub fn overlaps(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Slides a window of `duration_minutes` from `open` to
/// `close - duration_minutes` in steps of `step_minutes` and keeps every
/// candidate that clears all busy intervals. Results are in ascending
/// start-time order; callers rely on that ordering.
///
/// Busy intervals may be unordered and may overlap each other. A duration
/// that does not fit the window yields an empty list rather than an error.
pub fn compute_slots(
    duration_minutes: u32,
    busy: &[(NaiveTime, NaiveTime)],
    open: NaiveTime,
    close: NaiveTime,
    step_minutes: u32,
) -> Vec<Slot> {
    use chrono::Timelike;

    if duration_minutes == 0 || step_minutes == 0 || open >= close {
        return vec![];
    }

    let open_minutes = open.num_seconds_from_midnight() / 60;
    let close_minutes = close.num_seconds_from_midnight() / 60;

    let mut slots = vec![];
    let mut start_minutes = open_minutes;
    while start_minutes + duration_minutes <= close_minutes {
        let end_minutes = start_minutes + duration_minutes;
        let start = time_from_minutes(start_minutes);
        let end = time_from_minutes(end_minutes);

        let conflicts = busy
            .iter()
            .any(|&(busy_start, busy_end)| overlaps(start, end, busy_start, busy_end));

        if !conflicts {
            let formatted = format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"));
            slots.push(Slot {
                start,
                end,
                formatted,
            });
        }

        start_minutes += step_minutes;
    }

    slots
}

fn time_from_minutes(minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}
