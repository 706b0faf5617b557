mod display;
mod engine;
mod ports;
mod session;
mod state;

pub use display::{format_clock, render_line, snapshot, Indicator};
pub use engine::{parse_minutes, Command, Effect, TimerEngine, Transition};
pub use ports::{Clock, ManualClock, Notifier, StateStore, SystemClock, WakeScheduler};
pub use session::{Outcome, Session};
pub use state::{Mode, TimerState, DEFAULT_FOCUS_SECS, DEFAULT_REST_SECS};
