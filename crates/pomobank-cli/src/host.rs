//! Host capabilities for the terminal.
//!
//! There is no background service: a scheduled wake-up is a deadline in the
//! database, and `pomobank timer watch` is what eventually fires it. When no
//! watcher is running the alarm is simply missed, which the timer tolerates.

use std::io::Write;

use chrono::Duration;
use pomobank_core::storage::NotificationsConfig;
use pomobank_core::{Clock, CoreError, Database, Mode, Notifier, WakeScheduler};
use tracing::debug;

/// Stores the wake-up as a deadline measured on the session's clock.
pub struct DeadlineScheduler<'a, C> {
    db: &'a Database,
    clock: C,
}

impl<'a, C: Clock> DeadlineScheduler<'a, C> {
    pub fn new(db: &'a Database, clock: C) -> Self {
        Self { db, clock }
    }
}

impl<C: Clock> WakeScheduler for DeadlineScheduler<'_, C> {
    fn schedule(&self, after: Duration) -> pomobank_core::Result<()> {
        let at = self
            .clock
            .now()
            .checked_add_signed(after)
            .ok_or_else(|| CoreError::Custom("wake-up too far in the future".into()))?;
        debug!(%at, "wake-up armed");
        self.db.set_wake_deadline(at)
    }

    fn cancel(&self) -> pomobank_core::Result<()> {
        debug!("wake-up cleared");
        self.db.clear_wake_deadline()
    }
}

/// Prints the alert and rings the terminal bell.
pub struct TerminalAlarm<'a> {
    config: &'a NotificationsConfig,
}

impl<'a> TerminalAlarm<'a> {
    pub fn new(config: &'a NotificationsConfig) -> Self {
        Self { config }
    }
}

impl Notifier for TerminalAlarm<'_> {
    fn period_elapsed(&self, mode: Mode) -> pomobank_core::Result<()> {
        if !self.config.enabled {
            debug!(%mode, "notifications disabled");
            return Ok(());
        }
        let mut out = std::io::stdout().lock();
        writeln!(out)?;
        writeln!(out, "{} ({mode} time is up)", self.config.title)?;
        writeln!(out, "{}", self.config.message)?;
        if self.config.bell {
            write!(out, "\x07")?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use pomobank_core::timer::ManualClock;
    use pomobank_core::{Command, Session, TimerState};

    use super::*;

    #[test]
    fn deadline_follows_session_clock() {
        let db = Database::open_memory().unwrap();
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = ManualClock::new(start);
        let scheduler = DeadlineScheduler::new(&db, &clock);
        let mut session =
            Session::activate(&db, &scheduler, &clock, TimerState::default()).unwrap();

        session.dispatch(Command::Start).unwrap();
        assert_eq!(db.wake_deadline().unwrap(), Some(start + Duration::seconds(1500)));

        session.dispatch(Command::Pause).unwrap();
        assert!(db.wake_deadline().unwrap().is_none());
    }
}
