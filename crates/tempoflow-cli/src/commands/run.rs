//! Interactive routine runner.
//!
//! Reads one command per line from stdin while the countdown runs:
//! `p` or an empty line toggles pause, `r` restarts, `q` quits.

use std::io::Write;
use std::time::Duration;

use clap::Args;
use tempoflow_core::format::format_clock;
use tempoflow_core::{
    AlarmNotifier, Config, Event, Routine, RoutineStore, RunState, TickScheduler, TimerEngine,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

#[derive(Args)]
pub struct RunArgs {
    /// Routine id, unique id prefix, or name
    pub id: String,
    /// Start counting immediately
    #[arg(long)]
    pub autostart: bool,
    /// Print events as JSON lines instead of a live clock
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Toggle,
    Restart,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "p" | "pause" | "space" => Some(Command::Toggle),
            "r" | "restart" => Some(Command::Restart),
            "q" | "quit" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Fixed facts about the routine being run, for rendering.
struct View {
    phase_count: usize,
    total_secs: u64,
    json: bool,
}

impl View {
    fn status_line(&self, state: &RunState) -> String {
        let mut line = format!(
            "Tempo {} of {} | {} | elapsed {} | total {}",
            state.current_phase_index + 1,
            self.phase_count,
            format_clock(state.time_remaining_in_phase),
            format_clock(state.elapsed_total),
            format_clock(self.total_secs),
        );
        if state.completed {
            line.push_str(" [done]");
        } else if state.paused {
            line.push_str(" [paused]");
        }
        line
    }

    fn render(&self, state: &RunState) {
        if self.json {
            return;
        }
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r{}\x1b[K", self.status_line(state));
        let _ = out.flush();
    }

    fn event(&self, event: &Event) {
        if self.json {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
            return;
        }
        match event {
            Event::PhaseAdvanced {
                to_phase,
                intensity,
                duration_secs,
                ..
            } => println!(
                "\nTempo {} ({}, {})",
                to_phase + 1,
                intensity,
                format_clock(*duration_secs)
            ),
            Event::RoutineCompleted { elapsed_secs, .. } => {
                println!("\nRoutine complete in {}", format_clock(*elapsed_secs))
            }
            _ => {}
        }
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = RoutineStore::open_default()?;
    let routine = store
        .find(&args.id)
        .cloned()
        .ok_or_else(|| format!("Routine '{}' not found", args.id))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_routine(routine, &config, &args))
}

async fn run_routine(
    routine: Routine,
    config: &Config,
    args: &RunArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = TimerEngine::new(routine)?;
    debug!(routine_id = engine.routine_id(), "running routine");
    let view = View {
        phase_count: engine.sequence().len(),
        total_secs: engine.sequence().total_duration(),
        json: args.json,
    };
    if view.json {
        view.event(&engine.snapshot_event());
    } else {
        println!(
            "{}  (p/enter: pause/resume, r: restart, q: quit)",
            engine.routine_name()
        );
    }

    let notifier = AlarmNotifier::from_config(&config.alarm);
    let linger = if config.alarm.enabled {
        notifier.ceiling()
    } else {
        Duration::ZERO
    };

    let (handle, mut events) = TickScheduler::spawn(engine, notifier);
    let mut states = handle.subscribe();
    view.render(&states.borrow_and_update());

    if args.autostart || config.runner.autostart {
        handle.start().await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    // Set when the run ends on its own rather than on `q`.
    let mut finished = false;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    stdin_open = false;
                    let state = handle.state();
                    if state.completed {
                        finished = true;
                        break;
                    }
                    if !state.is_running() {
                        break;
                    }
                    continue;
                };
                match Command::parse(&line) {
                    Some(Command::Toggle) => {
                        handle.toggle_pause().await?;
                    }
                    Some(Command::Restart) => {
                        handle.restart().await?;
                    }
                    Some(Command::Quit) => break,
                    None => debug!(input = %line, "ignored input"),
                }
            }
            Some(event) = events.recv() => {
                view.event(&event);
                // Without stdin nobody can restart, so completion ends the run.
                if matches!(event, Event::RoutineCompleted { .. }) && !stdin_open {
                    finished = true;
                    break;
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                view.render(&states.borrow_and_update());
            }
        }
    }

    if finished && !linger.is_zero() {
        tokio::time::sleep(linger).await;
    }

    handle.exit().await?;
    while let Ok(event) = events.try_recv() {
        view.event(&event);
    }
    if !view.json {
        println!();
    }
    Ok(())
}
