//! Effect execution around the pure engine.
//!
//! A [`Session`] is one activation of the presentation layer: it loads and
//! reconciles the stored state, feeds commands through [`TimerEngine`], and
//! carries out the requested effects against the host capabilities.

use chrono::Duration;
use tracing::{debug, info, warn};

use super::display;
use super::engine::{Command, Effect, TimerEngine};
use super::ports::{Clock, StateStore, WakeScheduler};
use super::state::TimerState;
use crate::error::{CoreError, Result};
use crate::events::Event;

/// What a dispatched command did.
#[derive(Debug)]
pub struct Outcome {
    pub state: TimerState,
    /// `None` when the command was a no-op.
    pub event: Option<Event>,
    /// Non-fatal host failures hit while executing effects.
    pub warnings: Vec<CoreError>,
}

impl Outcome {
    pub fn changed(&self) -> bool {
        self.event.is_some()
    }
}

pub struct Session<S, W, C> {
    store: S,
    scheduler: W,
    clock: C,
    state: TimerState,
}

impl<S: StateStore, W: WakeScheduler, C: Clock> Session<S, W, C> {
    /// Load the stored timer (or `defaults` on first use) and reconcile it
    /// against the clock.
    ///
    /// Activation neither writes the store nor touches the wake-up: the
    /// stored anchor already determines the live value, and any pending wake
    /// belongs to the host.
    pub fn activate(store: S, scheduler: W, clock: C, defaults: TimerState) -> Result<Self> {
        let stored = store.load()?;
        let state = match stored {
            Some(state) => state,
            None => {
                debug!("no stored timer, starting from defaults");
                defaults
            }
        };
        let now = clock.now();
        let state = state.reconciled(now);
        debug!(
            mode = %state.mode,
            remaining = state.remaining_seconds,
            running = state.running,
            "timer activated"
        );
        Ok(Self {
            store,
            scheduler,
            clock,
            state,
        })
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Snapshot of the live timer for display.
    pub fn view(&self) -> Event {
        display::snapshot(&self.state, self.clock.now())
    }

    /// Apply `command` now and execute its effects.
    ///
    /// # Errors
    /// Returns [`CoreError::Validation`] for a rejected duration; state and
    /// host are untouched in that case. Storage and wake failures are
    /// reported in [`Outcome::warnings`] instead.
    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        let now = self.clock.now();
        let transition = TimerEngine::apply(&self.state, command, now).inspect_err(|e| {
            warn!(?command, error = %e, "command rejected");
        })?;

        if transition.is_noop() {
            debug!(?command, "command had no effect");
        } else {
            info!(
                ?command,
                mode = %transition.state.mode,
                remaining = transition.state.remaining_seconds,
                running = transition.state.running,
                "timer updated"
            );
        }

        let warnings = self.execute(&transition.effects);
        self.state = transition.state;
        Ok(Outcome {
            state: self.state.clone(),
            event: transition.event,
            warnings,
        })
    }

    fn execute(&self, effects: &[Effect]) -> Vec<CoreError> {
        let mut warnings = Vec::new();
        for effect in effects {
            match effect {
                Effect::Persist(state) => {
                    if let Err(e) = self.store.save(state) {
                        warn!(error = %e, "timer state not persisted; in-memory state kept");
                        warnings.push(CoreError::PersistenceFailure(e.to_string()));
                    }
                }
                Effect::ScheduleWake { secs } if *secs <= 0 => {
                    debug!(secs, "ignoring non-positive wake-up");
                }
                Effect::ScheduleWake { secs } => {
                    let result = match Duration::try_seconds(*secs) {
                        Some(after) => self.scheduler.schedule(after),
                        None => Err(CoreError::Custom(format!("{secs}s is out of range"))),
                    };
                    if let Err(e) = result {
                        warn!(error = %e, secs, "wake-up not scheduled");
                        warnings.push(CoreError::WakeSchedulingFailure(e.to_string()));
                    }
                }
                Effect::CancelWake => {
                    if let Err(e) = self.scheduler.cancel() {
                        warn!(error = %e, "wake-up not cancelled");
                        warnings.push(CoreError::WakeSchedulingFailure(e.to_string()));
                    }
                }
            }
        }
        warnings
    }
}
