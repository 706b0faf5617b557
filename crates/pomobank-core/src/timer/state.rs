//! The persisted timer record and its reconciliation rules.
//!
//! `remaining_seconds` is only exact while paused. While running it is exact
//! as of `anchor_timestamp`, and the live value is derived from the wall clock:
//!
//! ```text
//! remaining(now) = remaining_seconds - floor((now - anchor_timestamp) / 1000)
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default focus period: 25 minutes.
pub const DEFAULT_FOCUS_SECS: i64 = 25 * 60;
/// Default rest period: 5 minutes.
pub const DEFAULT_REST_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Focus,
    Rest,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Focus => "focus",
            Mode::Rest => "rest",
        }
    }

    pub fn other(self) -> Mode {
        match self {
            Mode::Focus => Mode::Rest,
            Mode::Rest => Mode::Focus,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Focus => f.write_str("Focus"),
            Mode::Rest => f.write_str("Rest"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focus" => Ok(Mode::Focus),
            "rest" => Ok(Mode::Rest),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Authoritative timer record. One instance per installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTimerState")]
pub struct TimerState {
    pub mode: Mode,
    /// Negative values are overtime.
    pub remaining_seconds: i64,
    pub running: bool,
    /// Epoch milliseconds at which `remaining_seconds` was last exact.
    pub anchor_timestamp: i64,
    focus_duration_seconds: i64,
    rest_duration_seconds: i64,
    /// Banked rest credit, applied on the next entry into Rest.
    pub rest_surplus_seconds: i64,
}

impl TimerState {
    /// A paused focus period of `focus_secs` with nothing banked.
    pub fn new(focus_secs: i64, rest_secs: i64) -> Result<Self, ValidationError> {
        ensure_positive(focus_secs)?;
        ensure_positive(rest_secs)?;
        Ok(Self {
            mode: Mode::Focus,
            remaining_seconds: focus_secs,
            running: false,
            anchor_timestamp: 0,
            focus_duration_seconds: focus_secs,
            rest_duration_seconds: rest_secs,
            rest_surplus_seconds: 0,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn focus_duration_seconds(&self) -> i64 {
        self.focus_duration_seconds
    }

    pub fn rest_duration_seconds(&self) -> i64 {
        self.rest_duration_seconds
    }

    /// Configured length of a period in `mode`.
    pub fn duration_of(&self, mode: Mode) -> i64 {
        match mode {
            Mode::Focus => self.focus_duration_seconds,
            Mode::Rest => self.rest_duration_seconds,
        }
    }

    /// Whole seconds owed since the anchor. Zero while paused.
    ///
    /// A clock that moved backwards yields zero rather than adding time.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        if !self.running {
            return 0;
        }
        now.timestamp_millis()
            .saturating_sub(self.anchor_timestamp)
            .div_euclid(1000)
            .max(0)
    }

    /// True remaining time at `now`.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> i64 {
        self.remaining_seconds.saturating_sub(self.elapsed_secs(now))
    }

    pub fn is_overtime_at(&self, now: DateTime<Utc>) -> bool {
        self.remaining_at(now) < 0
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Fold the elapsed time into `remaining_seconds` and move the anchor to `now`.
    ///
    /// Paused states are left untouched. Applying this twice at the same
    /// instant is the same as applying it once.
    pub fn reconcile(&mut self, now: DateTime<Utc>) {
        if !self.running {
            return;
        }
        self.remaining_seconds = self.remaining_at(now);
        self.anchor_timestamp = now.timestamp_millis();
    }

    pub fn reconciled(&self, now: DateTime<Utc>) -> Self {
        let mut state = self.clone();
        state.reconcile(now);
        state
    }

    // ── Crate-internal mutation ──────────────────────────────────────

    pub(crate) fn set_duration(&mut self, mode: Mode, secs: i64) -> Result<(), ValidationError> {
        ensure_positive(secs)?;
        match mode {
            Mode::Focus => self.focus_duration_seconds = secs,
            Mode::Rest => self.rest_duration_seconds = secs,
        }
        Ok(())
    }

    pub(crate) fn anchor_at(&mut self, now: DateTime<Utc>) {
        self.anchor_timestamp = now.timestamp_millis();
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            mode: Mode::Focus,
            remaining_seconds: DEFAULT_FOCUS_SECS,
            running: false,
            anchor_timestamp: 0,
            focus_duration_seconds: DEFAULT_FOCUS_SECS,
            rest_duration_seconds: DEFAULT_REST_SECS,
            rest_surplus_seconds: 0,
        }
    }
}

fn ensure_positive(secs: i64) -> Result<(), ValidationError> {
    if secs <= 0 {
        return Err(ValidationError::invalid_duration(
            secs,
            "duration must be positive",
        ));
    }
    Ok(())
}

/// Unchecked wire form, validated on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTimerState {
    mode: Mode,
    remaining_seconds: i64,
    running: bool,
    anchor_timestamp: i64,
    focus_duration_seconds: i64,
    rest_duration_seconds: i64,
    #[serde(default)]
    rest_surplus_seconds: i64,
}

impl TryFrom<RawTimerState> for TimerState {
    type Error = ValidationError;

    fn try_from(raw: RawTimerState) -> Result<Self, Self::Error> {
        let mut state = TimerState::new(raw.focus_duration_seconds, raw.rest_duration_seconds)?;
        state.mode = raw.mode;
        state.remaining_seconds = raw.remaining_seconds;
        state.running = raw.running;
        state.anchor_timestamp = raw.anchor_timestamp;
        state.rest_surplus_seconds = raw.rest_surplus_seconds;
        Ok(state)
    }
}
