//! Display helpers shared by every presentation surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{Mode, TimerState};
use crate::events::Event;

/// Status light next to the clock.
///
/// Green means the period is behaving as intended: rest time still left, or
/// focus time used up and ready to swap. Red is focus still counting down or
/// rest run into overtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Green,
    Red,
}

impl Indicator {
    pub fn for_period(mode: Mode, remaining_secs: i64) -> Self {
        if (mode == Mode::Rest) == (remaining_secs > 0) {
            Indicator::Green
        } else {
            Indicator::Red
        }
    }
}

/// `HH:MM:SS` of the absolute value. Hours are not wrapped.
pub fn format_clock(secs: i64) -> String {
    let abs = secs.unsigned_abs();
    format!("{:02}:{:02}:{:02}", abs / 3600, (abs % 3600) / 60, abs % 60)
}

/// One status line, e.g. `Rest 00:04:12` or `Focus 00:01:00 OVERTIME`.
pub fn render_line(state: &TimerState, now: DateTime<Utc>) -> String {
    let remaining = state.remaining_at(now);
    let mut line = format!("{} {}", state.mode, format_clock(remaining));
    if remaining < 0 {
        line.push_str(" OVERTIME");
    }
    if !state.running {
        line.push_str(" (paused)");
    }
    line
}

/// Read-only snapshot of the live timer.
pub fn snapshot(state: &TimerState, now: DateTime<Utc>) -> Event {
    let remaining = state.remaining_at(now);
    Event::StateSnapshot {
        mode: state.mode,
        running: state.running,
        remaining_secs: remaining,
        clock: format_clock(remaining),
        overtime: remaining < 0,
        indicator: Indicator::for_period(state.mode, remaining),
        focus_duration_secs: state.focus_duration_seconds(),
        rest_duration_secs: state.rest_duration_seconds(),
        rest_surplus_secs: state.rest_surplus_seconds,
        at: now,
    }
}
