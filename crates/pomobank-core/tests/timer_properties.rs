//! Property tests for the timer state machine.

use chrono::{DateTime, Utc};
use pomobank_core::{Command, Effect, Mode, TimerEngine, TimerState};
use proptest::prelude::*;

fn at_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

prop_compose! {
    fn arb_state()(
        focus in 1i64..=4 * 3600,
        rest in 1i64..=2 * 3600,
        rest_mode in any::<bool>(),
        remaining in -4 * 3600i64..=4 * 3600,
        running in any::<bool>(),
        anchor in 1_600_000_000_000i64..1_700_000_000_000,
        surplus in 0i64..=3600,
    ) -> TimerState {
        let mut state = TimerState::new(focus, rest).unwrap();
        state.mode = if rest_mode { Mode::Rest } else { Mode::Focus };
        state.remaining_seconds = remaining;
        state.running = running;
        state.anchor_timestamp = anchor;
        state.rest_surplus_seconds = surplus;
        state
    }
}

proptest! {
    /// Reset always lands on a paused, fresh focus period.
    #[test]
    fn prop_reset_yields_fresh_focus(state in arb_state(), later in 0i64..10_000_000) {
        let now = at_ms(state.anchor_timestamp + later);
        let t = TimerEngine::reset(&state, now);
        prop_assert_eq!(t.state.mode, Mode::Focus);
        prop_assert_eq!(t.state.remaining_seconds, state.focus_duration_seconds());
        prop_assert_eq!(t.state.rest_surplus_seconds, 0);
        prop_assert!(!t.state.running);
        prop_assert!(t.effects.contains(&Effect::CancelWake));
    }

    /// Leaving Focus before the time is used up does nothing.
    #[test]
    fn prop_early_focus_swap_is_noop(state in arb_state()) {
        let mut state = state;
        state.mode = Mode::Focus;
        state.running = false;
        prop_assume!(state.remaining_seconds > 0);
        let t = TimerEngine::swap(&state, at_ms(state.anchor_timestamp));
        prop_assert!(t.effects.is_empty());
        prop_assert!(t.event.is_none());
        prop_assert_eq!(t.state, state);
    }

    /// Pausing and immediately starting again keeps the countdown.
    #[test]
    fn prop_pause_start_roundtrip(state in arb_state(), later in 0i64..10_000_000) {
        let now = at_ms(state.anchor_timestamp + later);
        let live = state.remaining_at(now);
        let paused = TimerEngine::pause(&state, now).state;
        let restarted = TimerEngine::start(&paused, now).state;
        prop_assert_eq!(restarted.remaining_seconds, live);
        prop_assert_eq!(restarted.remaining_at(now), live);
        prop_assert!(restarted.running);
    }

    /// Reconciling twice at the same instant equals reconciling once.
    #[test]
    fn prop_reconcile_idempotent(state in arb_state(), later in -10_000i64..10_000_000) {
        let now = at_ms(state.anchor_timestamp + later);
        let once = state.reconciled(now);
        prop_assert_eq!(once.reconciled(now), once.clone());
        prop_assert_eq!(once.remaining_at(now), state.remaining_at(now));
    }

    /// Non-positive adjustments are rejected.
    #[test]
    fn prop_non_positive_adjustment_rejected(
        state in arb_state(),
        secs in -100_000i64..=0,
        rest in any::<bool>(),
    ) {
        let command = if rest {
            Command::AdjustRestDuration(secs)
        } else {
            Command::AdjustFocusDuration(secs)
        };
        prop_assert!(TimerEngine::apply(&state, command, at_ms(state.anchor_timestamp)).is_err());
    }

    /// Durations stay positive and wake-ups are never armed for the past.
    #[test]
    fn prop_invariants_hold_over_command_sequences(
        state in arb_state(),
        steps in proptest::collection::vec((0u8..6, -600i64..7200, 0i64..600_000), 1..40),
    ) {
        let mut state = state;
        let mut now_ms = state.anchor_timestamp;
        for (kind, secs, advance) in steps {
            now_ms += advance;
            let command = match kind {
                0 => Command::Start,
                1 => Command::Pause,
                2 => Command::Reset,
                3 => Command::Swap,
                4 => Command::AdjustFocusDuration(secs),
                _ => Command::AdjustRestDuration(secs),
            };
            if let Ok(t) = TimerEngine::apply(&state, command, at_ms(now_ms)) {
                for effect in &t.effects {
                    if let Effect::ScheduleWake { secs } = effect {
                        prop_assert!(*secs > 0);
                    }
                }
                state = t.state;
            }
            prop_assert!(state.focus_duration_seconds() > 0);
            prop_assert!(state.rest_duration_seconds() > 0);
            prop_assert!(state.rest_surplus_seconds >= 0);
        }
    }

    /// Focus overtime is carried into Rest at the rest/focus ratio, floored.
    #[test]
    fn prop_focus_overtime_carry(state in arb_state(), overtime in 0i64..=4 * 3600) {
        let mut state = state;
        state.mode = Mode::Focus;
        state.running = false;
        state.remaining_seconds = -overtime;
        let t = TimerEngine::swap(&state, at_ms(state.anchor_timestamp));
        let carry = overtime * state.rest_duration_seconds() / state.focus_duration_seconds();
        prop_assert_eq!(
            t.state.remaining_seconds,
            state.rest_duration_seconds() + carry + state.rest_surplus_seconds
        );
        prop_assert_eq!(t.state.mode, Mode::Rest);
        prop_assert_eq!(t.state.rest_surplus_seconds, 0);
    }
}

#[test]
fn worked_example_focus_overtime_into_rest() {
    let mut state = TimerState::new(1500, 300).unwrap();
    state.remaining_seconds = -60;
    let t = TimerEngine::swap(&state, at_ms(0));
    assert_eq!(t.state.remaining_seconds, 312);
}

#[test]
fn worked_example_banked_rest_is_spent_next_break() {
    let mut state = TimerState::new(1500, 300).unwrap();
    state.mode = Mode::Rest;
    state.remaining_seconds = 45;

    let focus = TimerEngine::swap(&state, at_ms(0)).state;
    assert_eq!(focus.rest_surplus_seconds, 45);
    assert_eq!(focus.remaining_seconds, 1500);

    // 1600s later the focus period is 100s into overtime.
    let rest = TimerEngine::swap(&focus, at_ms(1_600_000)).state;
    assert_eq!(rest.remaining_seconds, 300 + 20 + 45);
    assert_eq!(rest.rest_surplus_seconds, 0);
}

#[test]
fn zero_and_negative_adjustments_leave_state_alone() {
    let state = TimerState::default();
    for secs in [0, -1, -1500] {
        assert!(TimerEngine::adjust_focus_duration(&state, secs, at_ms(0)).is_err());
    }
    assert_eq!(state, TimerState::default());
}
