//! Interactive timer session.
//!
//! Reads one command per line from stdin while the clock ticks in the
//! background. Both sources feed a single coordinator, one event at a time.

use std::io::Write;
use std::sync::Arc;

use pomofomo_core::events::Event;
use pomofomo_core::format::format_clock;
use pomofomo_core::notify::Notifier;
use pomofomo_core::storage::config::NotificationsConfig;
use pomofomo_core::timer::{IntervalClock, PomodoroState, StopwatchState};
use pomofomo_core::{
    Config, Coordinator, HistoryView, LogNotifier, Mode, Preset, SaveError, SessionHistory,
    SessionRecorder,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::history::format_row;
use super::{open_store, runtime};

const HELP: &str = "\
commands:
  start | pause | s       start or pause the timer on screen
  reset | r               reset the timer on screen
  focus | break | test    pick a countdown preset
  duration <minutes>      pick a custom countdown length
  pomo | stopwatch        switch the timer on screen
  commit | save           record the stopped stopwatch run
  status                  show both timers
  history                 show recent sessions
  quit | q                leave (unsaved time is lost)";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Toggle,
    Reset,
    Preset(Preset),
    Duration(f64),
    Mode(Mode),
    Commit,
    Status,
    History,
    Help,
    Quit,
}

/// `Ok(None)` for a blank line.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    let head = head.to_ascii_lowercase();

    let command = match (head.as_str(), arg) {
        ("start" | "pause" | "toggle" | "s", _) => Command::Toggle,
        ("reset" | "r", _) => Command::Reset,
        ("preset", Some(name)) => Preset::from_name(name)
            .map(Command::Preset)
            .ok_or_else(|| format!("unknown preset: {name}"))?,
        ("preset", None) => return Err("usage: preset <focus|break|test>".into()),
        ("duration" | "set" | "d", Some(value)) => value
            .parse::<f64>()
            .map(Command::Duration)
            .map_err(|_| format!("not a number of minutes: {value}"))?,
        ("duration" | "set" | "d", None) => return Err("usage: duration <minutes>".into()),
        ("mode", Some(mode)) => Command::Mode(mode.parse()?),
        ("mode", None) => return Err("usage: mode <pomo|stopwatch>".into()),
        ("commit" | "save" | "done", _) => Command::Commit,
        ("status" | "st", _) => Command::Status,
        ("history" | "h", _) => Command::History,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", _) => Command::Quit,
        (other, _) => {
            if let Some(preset) = Preset::from_name(other) {
                Command::Preset(preset)
            } else if let Ok(mode) = other.parse::<Mode>() {
                Command::Mode(mode)
            } else {
                return Err(format!("unknown command: {other} (try `help`)"));
            }
        }
    };
    Ok(Some(command))
}

/// Prints notices to stdout and optionally rings the terminal bell on completion.
struct TerminalNotifier {
    bell: bool,
}

impl Notifier for TerminalNotifier {
    fn alarm(&self) {
        tracing::info!(target: "pomofomo::alarm", "countdown finished");
        if self.bell {
            print!("\x07");
            let _ = std::io::stdout().flush();
        }
    }

    fn notify(&self, event: &Event) {
        if let Some(message) = event.message() {
            println!("{message}");
        }
    }
}

/// Terminal notices when enabled, otherwise only the log.
fn notifier(config: &NotificationsConfig) -> Arc<dyn Notifier> {
    if config.enabled {
        Arc::new(TerminalNotifier { bell: config.bell })
    } else {
        Arc::new(LogNotifier)
    }
}

fn status_line(snapshot: &Event) -> String {
    let Event::StateSnapshot {
        mode,
        pomodoro,
        remaining_secs,
        initial_secs,
        stopwatch,
        elapsed_secs,
        saving,
        ..
    } = snapshot
    else {
        return String::new();
    };
    let pomo_state = match pomodoro {
        PomodoroState::Idle => "idle",
        PomodoroState::Running => "running",
        PomodoroState::Paused => "paused",
        PomodoroState::Completed => "done",
    };
    let sw_state = match stopwatch {
        StopwatchState::Idle => "idle",
        StopwatchState::Running => "running",
        StopwatchState::Stopped => "stopped",
    };
    let marker = |m: Mode| if *mode == m { "*" } else { " " };

    let mut line = format!(
        "{}Pomodoro  {} {} (of {})\n{}Stopwatch {} {}",
        marker(Mode::Pomo),
        format_clock(*remaining_secs),
        pomo_state,
        format_clock(*initial_secs),
        marker(Mode::Stopwatch),
        format_clock(*elapsed_secs),
        sw_state,
    );
    if *saving {
        line.push_str("\nsaving...");
    }
    line
}

fn print_history(view: &HistoryView) {
    if view.records().is_empty() {
        println!("no sessions recorded yet");
    }
    for record in view.records() {
        println!("{}", format_row(record));
    }
}

pub fn run(mode: Option<Mode>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let runtime = runtime()?;
    let result = runtime.block_on(session(config, mode));
    // A pending stdin read would otherwise hold the runtime open.
    runtime.shutdown_background();
    result
}

async fn session(config: Config, mode: Option<Mode>) -> Result<(), Box<dyn std::error::Error>> {
    let (db, identity) = open_store()?;
    let notifier = notifier(&config.notifications);
    let recorder = Arc::new(SessionRecorder::new(
        identity.clone(),
        db.clone(),
        Arc::clone(&notifier),
    ));
    let mut history = HistoryView::new(SessionHistory::new(identity.clone(), db), config.history.limit);

    let (clock, mut ticks) = IntervalClock::new();
    let mut coordinator = Coordinator::new(Arc::new(clock), recorder, notifier)
        .with_unsaved_policy(config.unsaved_policy());
    coordinator.set_duration(config.presets.focus_min)?;
    coordinator.switch_mode(mode.unwrap_or(config.start_mode));

    match identity.user()? {
        Some(user) => println!("signed in as {user}"),
        None => println!("not signed in; sessions will not be recorded"),
    }
    println!("{}", status_line(&coordinator.snapshot()));
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                if let Some(outcome) = coordinator.on_tick(tick).await {
                    after_save(outcome, &mut history).await;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(message) => {
                        eprintln!("{message}");
                        continue;
                    }
                };
                tracing::debug!(?command, "command");
                match command {
                    Command::Toggle => {
                        if !coordinator.toggle() {
                            println!("nothing to start; pick a duration first");
                        }
                    }
                    Command::Reset => {
                        if !coordinator.reset() {
                            println!("nothing to reset");
                        }
                    }
                    Command::Preset(preset) => {
                        coordinator.set_duration(preset.minutes(&config.presets))?;
                    }
                    Command::Duration(minutes) => {
                        if let Err(e) = coordinator.set_duration(minutes) {
                            eprintln!("{e}");
                        }
                    }
                    Command::Mode(mode) => coordinator.switch_mode(mode),
                    Command::Commit => match coordinator.commit().await {
                        Some(outcome) => after_save(outcome, &mut history).await,
                        None => println!("stop the stopwatch before saving"),
                    },
                    Command::Status => println!("{}", status_line(&coordinator.snapshot())),
                    Command::History => {
                        history.refresh().await;
                        print_history(&history);
                    }
                    Command::Help => println!("{HELP}"),
                    Command::Quit => break,
                }
            }
        }
    }

    coordinator.shutdown();
    Ok(())
}

/// Notices were already printed by the recorder; refresh the list on success.
async fn after_save(outcome: Result<(), SaveError>, history: &mut HistoryView) {
    match outcome {
        Ok(()) => {
            history.refresh().await;
        }
        Err(e) => tracing::debug!(error = %e, "session not recorded"),
    }
}
