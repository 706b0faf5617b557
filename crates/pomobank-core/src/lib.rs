//! # Pomobank Core Library
//!
//! Core logic for a focus/rest timer that tracks overtime and banks unused
//! rest time for the next break. The `pomobank` CLI is a thin presentation
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: pure transitions over an explicit [`TimerState`]; each
//!   returns the next state plus the effects (persist, schedule or cancel the
//!   wake-up) the caller must carry out
//! - **Session**: loads and reconciles the stored timer against the wall
//!   clock, then executes effects against injected host capabilities
//! - **Storage**: SQLite key-value store and event history, TOML configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Session`]: Effect execution and resume reconciliation
//! - [`Database`]: Timer persistence and history
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use storage::{Config, Database, MemoryStore};
pub use timer::{
    Clock, Command, Effect, Mode, Notifier, Outcome, Session, StateStore, SystemClock,
    TimerEngine, TimerState, Transition, WakeScheduler,
};
