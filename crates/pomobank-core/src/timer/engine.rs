//! Timer engine implementation.
//!
//! Every transition is a pure function of the current [`TimerState`] and the
//! wall-clock instant. Nothing here touches storage or the wake scheduler;
//! the transition lists the effects it wants and the caller performs them.
//!
//! ## State Transitions
//!
//! ```text
//!             start                 pause
//! Paused ─────────────► Running ─────────────► Paused
//!
//! Focus ──swap (remaining <= 0)──► Rest (running)
//! Rest  ──swap (always)──────────► Focus (running)
//! any   ──reset──────────────────► Focus (paused)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let t = TimerEngine::apply(&state, Command::Swap, Utc::now())?;
//! for effect in &t.effects { /* persist, schedule, cancel */ }
//! state = t.state;
//! ```

use chrono::{DateTime, Utc};

use super::state::{Mode, TimerState};
use crate::error::ValidationError;
use crate::events::Event;

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Arm the one-shot wake-up `secs` seconds from now, replacing any pending one.
    /// Executors ignore non-positive values.
    ScheduleWake { secs: i64 },
    CancelWake,
    Persist(TimerState),
}

/// A user command from the presentation layer. Durations are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    Swap,
    AdjustFocusDuration(i64),
    AdjustRestDuration(i64),
}

impl Command {
    /// Build an adjustment from user text in whole minutes.
    pub fn adjust_minutes(mode: Mode, input: &str) -> Result<Self, ValidationError> {
        let secs = parse_minutes(input)?;
        Ok(match mode {
            Mode::Focus => Command::AdjustFocusDuration(secs),
            Mode::Rest => Command::AdjustRestDuration(secs),
        })
    }
}

/// Parse a whole, positive number of minutes into seconds.
pub fn parse_minutes(input: &str) -> Result<i64, ValidationError> {
    let trimmed = input.trim();
    let minutes: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::invalid_duration(trimmed, "not a whole number of minutes"))?;
    if minutes <= 0 {
        return Err(ValidationError::invalid_duration(
            trimmed,
            "minutes must be positive",
        ));
    }
    minutes
        .checked_mul(60)
        .ok_or_else(|| ValidationError::invalid_duration(trimmed, "too large"))
}

/// Result of applying a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: TimerState,
    /// Empty exactly when the command was a no-op.
    pub effects: Vec<Effect>,
    pub event: Option<Event>,
}

impl Transition {
    fn unchanged(state: &TimerState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
            event: None,
        }
    }

    fn changed(state: TimerState, wake: Option<Effect>, event: Event) -> Self {
        let mut effects = vec![Effect::Persist(state.clone())];
        effects.extend(wake);
        Self {
            state,
            effects,
            event: Some(event),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }
}

/// The timer state machine.
pub struct TimerEngine;

impl TimerEngine {
    /// Dispatch a command. Only duration adjustments can fail.
    pub fn apply(
        state: &TimerState,
        command: Command,
        now: DateTime<Utc>,
    ) -> Result<Transition, ValidationError> {
        match command {
            Command::Start => Ok(Self::start(state, now)),
            Command::Pause => Ok(Self::pause(state, now)),
            Command::Reset => Ok(Self::reset(state, now)),
            Command::Swap => Ok(Self::swap(state, now)),
            Command::AdjustFocusDuration(secs) => Self::adjust_duration(state, Mode::Focus, secs, now),
            Command::AdjustRestDuration(secs) => Self::adjust_duration(state, Mode::Rest, secs, now),
        }
    }

    pub fn start(state: &TimerState, now: DateTime<Utc>) -> Transition {
        if state.running {
            return Transition::unchanged(state);
        }
        let mut next = state.clone();
        next.running = true;
        next.anchor_at(now);
        let wake = (next.remaining_seconds > 0).then(|| Effect::ScheduleWake {
            secs: next.remaining_seconds,
        });
        let event = Event::TimerStarted {
            mode: next.mode,
            remaining_secs: next.remaining_seconds,
            at: now,
        };
        Transition::changed(next, wake, event)
    }

    pub fn pause(state: &TimerState, now: DateTime<Utc>) -> Transition {
        if !state.running {
            return Transition::unchanged(state);
        }
        let mut next = state.reconciled(now);
        next.running = false;
        let event = Event::TimerPaused {
            mode: next.mode,
            remaining_secs: next.remaining_seconds,
            at: now,
        };
        Transition::changed(next, Some(Effect::CancelWake), event)
    }

    /// Back to a paused, fresh focus period. Overtime and banked rest are dropped.
    pub fn reset(state: &TimerState, now: DateTime<Utc>) -> Transition {
        let mut next = state.clone();
        next.mode = Mode::Focus;
        next.remaining_seconds = next.focus_duration_seconds();
        next.running = false;
        next.rest_surplus_seconds = 0;
        let event = Event::TimerReset {
            remaining_secs: next.remaining_seconds,
            at: now,
        };
        Transition::changed(next, Some(Effect::CancelWake), event)
    }

    /// Toggle between Focus and Rest, carrying overtime and banked rest.
    ///
    /// Leaving Focus requires the focus time to be used up. Overtime is
    /// rescaled by the ratio of the two durations before it is added to the
    /// next period. Leaving Rest early banks what is left for the next Rest.
    pub fn swap(state: &TimerState, now: DateTime<Utc>) -> Transition {
        let mut next = state.reconciled(now);
        let focus = next.focus_duration_seconds();
        let rest = next.rest_duration_seconds();

        let (carry, banked) = match next.mode {
            Mode::Focus => {
                if next.remaining_seconds > 0 {
                    return Transition::unchanged(state);
                }
                let overtime = next.remaining_seconds.unsigned_abs();
                let carry = rescale(overtime, rest, focus);
                let banked = next.rest_surplus_seconds;
                next.remaining_seconds = rest.saturating_add(carry).saturating_add(banked);
                next.rest_surplus_seconds = 0;
                (carry, banked)
            }
            Mode::Rest => {
                if next.remaining_seconds < 0 {
                    let carry = rescale(next.remaining_seconds.unsigned_abs(), focus, rest);
                    next.rest_surplus_seconds = 0;
                    next.remaining_seconds = focus.saturating_add(carry);
                    (carry, 0)
                } else {
                    let banked = next.remaining_seconds;
                    next.rest_surplus_seconds = banked;
                    next.remaining_seconds = focus;
                    (0, banked)
                }
            }
        };

        let from = next.mode;
        next.mode = from.other();
        next.running = true;
        next.anchor_at(now);
        let wake = (next.remaining_seconds > 0).then(|| Effect::ScheduleWake {
            secs: next.remaining_seconds,
        });
        let event = Event::ModeSwapped {
            from,
            to: next.mode,
            remaining_secs: next.remaining_seconds,
            carry_secs: carry,
            banked_secs: banked,
            at: now,
        };
        Transition::changed(next, wake, event)
    }

    /// Change the configured length of `mode`'s period.
    ///
    /// When `mode` is the current period the difference is applied to the
    /// live countdown. A running timer always re-arms its wake with the
    /// corrected remaining time, whichever duration changed.
    pub fn adjust_duration(
        state: &TimerState,
        mode: Mode,
        secs: i64,
        now: DateTime<Utc>,
    ) -> Result<Transition, ValidationError> {
        let mut next = state.reconciled(now);
        let delta = secs.saturating_sub(next.duration_of(mode));
        next.set_duration(mode, secs)?;
        if next.mode == mode {
            next.remaining_seconds = next.remaining_seconds.saturating_add(delta);
        }

        let wake = if next.running {
            next.anchor_at(now);
            Some(if next.remaining_seconds > 0 {
                Effect::ScheduleWake {
                    secs: next.remaining_seconds,
                }
            } else {
                // Already past the new deadline; a pending wake would be stale.
                Effect::CancelWake
            })
        } else {
            None
        };
        let event = Event::DurationAdjusted {
            mode,
            duration_secs: secs,
            remaining_secs: next.remaining_seconds,
            at: now,
        };
        Ok(Transition::changed(next, wake, event))
    }

    pub fn adjust_focus_duration(
        state: &TimerState,
        secs: i64,
        now: DateTime<Utc>,
    ) -> Result<Transition, ValidationError> {
        Self::adjust_duration(state, Mode::Focus, secs, now)
    }

    pub fn adjust_rest_duration(
        state: &TimerState,
        secs: i64,
        now: DateTime<Utc>,
    ) -> Result<Transition, ValidationError> {
        Self::adjust_duration(state, Mode::Rest, secs, now)
    }
}

/// `floor(secs * to / from)`, saturating at `i64::MAX`.
fn rescale(secs: u64, to: i64, from: i64) -> i64 {
    let scaled = i128::from(secs) * i128::from(to) / i128::from(from);
    i64::try_from(scaled).unwrap_or(i64::MAX)
}
