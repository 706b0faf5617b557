//! In-process [`StateStore`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{CoreError, Result};
use crate::timer::{StateStore, TimerState};

/// Keeps the timer in memory. Writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<TimerState>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: TimerState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            ..Self::default()
        }
    }

    pub fn get(&self) -> Option<TimerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make subsequent saves fail with [`CoreError::PersistenceFailure`].
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<TimerState>> {
        Ok(self.get())
    }

    fn save(&self, state: &TimerState) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CoreError::PersistenceFailure("store is read-only".into()));
        }
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
