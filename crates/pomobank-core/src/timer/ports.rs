//! Host capabilities the timer depends on.
//!
//! The engine never calls these directly; [`super::Session`] executes the
//! effects a transition asks for against them.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use super::state::{Mode, TimerState};
use crate::error::Result;

/// Persistent home of the single [`TimerState`].
pub trait StateStore {
    /// `Ok(None)` on first use.
    fn load(&self) -> Result<Option<TimerState>>;
    fn save(&self, state: &TimerState) -> Result<()>;
}

/// Best-effort, host-owned one-shot wake-up.
///
/// Scheduling replaces any pending wake. The host may deliver it late or not
/// at all; nothing depends on it for correctness.
pub trait WakeScheduler {
    fn schedule(&self, after: Duration) -> Result<()>;
    fn cancel(&self) -> Result<()>;
}

/// User-facing alert raised when a wake-up fires.
pub trait Notifier {
    fn period_elapsed(&self, mode: Mode) -> Result<()>;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl<T: StateStore + ?Sized> StateStore for &T {
    fn load(&self) -> Result<Option<TimerState>> {
        (**self).load()
    }

    fn save(&self, state: &TimerState) -> Result<()> {
        (**self).save(state)
    }
}

impl<T: WakeScheduler + ?Sized> WakeScheduler for &T {
    fn schedule(&self, after: Duration) -> Result<()> {
        (**self).schedule(after)
    }

    fn cancel(&self) -> Result<()> {
        (**self).cancel()
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let start = DateTime::from_timestamp(1_000, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), DateTime::from_timestamp(1_090, 0).unwrap());
        clock.set(start);
        assert_eq!((&clock).now(), start);
    }
}
