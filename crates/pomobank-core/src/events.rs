use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Indicator, Mode};

/// Every accepted timer command produces an Event.
/// The CLI prints them and keeps a history; rejected commands produce none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    TimerReset {
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    /// Focus and Rest were exchanged.
    ModeSwapped {
        from: Mode,
        to: Mode,
        remaining_secs: i64,
        /// Overtime from the previous period, rescaled into the new one.
        carry_secs: i64,
        /// Rest credit consumed (entering Rest) or banked (leaving Rest early).
        banked_secs: i64,
        at: DateTime<Utc>,
    },
    DurationAdjusted {
        mode: Mode,
        duration_secs: i64,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    /// The wake-up fired: the current period ran out.
    PeriodElapsed {
        mode: Mode,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: Mode,
        running: bool,
        remaining_secs: i64,
        clock: String,
        overtime: bool,
        indicator: Indicator,
        focus_duration_secs: i64,
        rest_duration_secs: i64,
        rest_surplus_secs: i64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Snake-case name stored alongside the payload in the history table.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerReset { .. } => "timer_reset",
            Event::ModeSwapped { .. } => "mode_swapped",
            Event::DurationAdjusted { .. } => "duration_adjusted",
            Event::PeriodElapsed { .. } => "period_elapsed",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerReset { at, .. }
            | Event::ModeSwapped { at, .. }
            | Event::DurationAdjusted { at, .. }
            | Event::PeriodElapsed { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::PeriodElapsed {
            mode: Mode::Rest,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PeriodElapsed");
        assert_eq!(json["mode"], "rest");
        assert_eq!(event.kind(), "period_elapsed");
    }
}
