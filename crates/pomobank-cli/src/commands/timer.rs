use std::io::{IsTerminal, Write};

use clap::Subcommand;
use pomobank_core::timer::render_line;
use pomobank_core::{
    Clock, Command, Config, Database, Event, Mode, Notifier, Result, Session, StateStore,
    SystemClock,
};
use tracing::{info, warn};

use crate::host::{DeadlineScheduler, TerminalAlarm};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Back to a paused focus period, dropping overtime and banked rest
    Reset,
    /// Switch between focus and rest
    Swap,
    /// Set the focus duration in minutes
    Focus {
        /// Whole minutes
        #[arg(allow_hyphen_values = true)]
        minutes: String,
    },
    /// Set the rest duration in minutes
    Rest {
        /// Whole minutes
        #[arg(allow_hyphen_values = true)]
        minutes: String,
    },
    /// Print current timer state as JSON
    Status,
    /// Show a live countdown and raise the alarm when the period runs out
    Watch {
        /// Stop after this many one-second ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Print recent timer events as JSON
    History {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

pub fn run(action: TimerAction) -> Result<()> {
    let config = Config::load_or_default();
    let db = Database::open()?;

    let command = match action {
        TimerAction::Start => Command::Start,
        TimerAction::Pause => Command::Pause,
        TimerAction::Reset => Command::Reset,
        TimerAction::Swap => Command::Swap,
        TimerAction::Focus { minutes } => Command::adjust_minutes(Mode::Focus, &minutes)?,
        TimerAction::Rest { minutes } => Command::adjust_minutes(Mode::Rest, &minutes)?,
        TimerAction::Status => return status(&db, &config),
        TimerAction::Watch { ticks } => return watch(&db, &config, ticks),
        TimerAction::History { limit } => {
            let events = db.recent_events(limit)?;
            println!("{}", serde_json::to_string_pretty(&events)?);
            return Ok(());
        }
    };

    let clock = SystemClock;
    let scheduler = DeadlineScheduler::new(&db, &clock);
    let mut session = Session::activate(&db, &scheduler, &clock, config.initial_state())?;
    let outcome = session.dispatch(command)?;

    for warning in &outcome.warnings {
        eprintln!("warning: {warning}");
    }
    match &outcome.event {
        Some(event) => {
            if let Err(e) = db.record_event(event) {
                warn!(error = %e, "event not recorded in history");
            }
        }
        None => eprintln!("{}", noop_reason(command)),
    }

    println!("{}", serde_json::to_string_pretty(&session.view())?);
    Ok(())
}

fn noop_reason(command: Command) -> &'static str {
    match command {
        Command::Start => "timer is already running",
        Command::Pause => "timer is not running",
        Command::Swap => "focus time is not used up yet; swap is available once it runs out",
        _ => "nothing changed",
    }
}

fn status(db: &Database, config: &Config) -> Result<()> {
    let clock = SystemClock;
    let scheduler = DeadlineScheduler::new(db, &clock);
    let session = Session::activate(db, &scheduler, &clock, config.initial_state())?;
    println!("{}", serde_json::to_string_pretty(&session.view())?);
    Ok(())
}

fn watch(db: &Database, config: &Config, ticks: Option<u64>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch_loop(db, config, &SystemClock, ticks))
}

/// One-second display loop. The countdown shown is derived from the stored
/// anchor each tick, so it never drifts from the stored state.
async fn watch_loop(
    db: &Database,
    config: &Config,
    clock: &impl Clock,
    ticks: Option<u64>,
) -> Result<()> {
    let alarm = TerminalAlarm::new(&config.notifications);
    let interactive = std::io::stdout().is_terminal();
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut count = 0u64;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut ctrl_c => {
                info!("watch stopped");
                break;
            }
        }

        let now = clock.now();
        let state = db.load()?.unwrap_or_else(|| config.initial_state());
        let line = render_line(&state, now);
        if interactive {
            let mut out = std::io::stdout().lock();
            write!(out, "\r{line}\x1b[K")?;
            out.flush()?;
        } else {
            println!("{line}");
        }

        if let Some(deadline) = db.wake_deadline()? {
            if deadline <= now {
                db.clear_wake_deadline()?;
                info!(mode = %state.mode, "period elapsed");
                if let Err(e) = alarm.period_elapsed(state.mode) {
                    warn!(error = %e, "alarm could not be shown");
                }
                let event = Event::PeriodElapsed {
                    mode: state.mode,
                    at: now,
                };
                if let Err(e) = db.record_event(&event) {
                    warn!(error = %e, "event not recorded in history");
                }
            }
        }

        count += 1;
        if ticks.is_some_and(|limit| count >= limit) {
            break;
        }
    }

    if interactive {
        println!();
    }
    Ok(())
}
