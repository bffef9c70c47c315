//! Routine management commands.

use clap::Subcommand;
use tempoflow_core::format::{format_clock, parse_clock};
use tempoflow_core::{Intensity, MoveDirection, Phase, Routine, RoutineStore};
use tracing::debug;

#[derive(Subcommand)]
pub enum RoutineAction {
    /// List stored routines
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the phases of a routine
    Show {
        /// Routine id, unique id prefix, or name
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a routine
    Create {
        /// Routine name
        name: String,
        /// Phase as MM:SS or MM:SS:intensity (low, normal, high). Repeatable.
        #[arg(long = "phase", required = true)]
        phases: Vec<String>,
    },
    /// Edit a routine in place
    ///
    /// Changes apply in this order: rename, intensity, moves, removals,
    /// additions. Phase numbers are 1-based and refer to the order at the
    /// time each change is applied.
    Edit {
        /// Routine id, unique id prefix, or name
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// Set the intensity of phase N (low, normal, high)
        #[arg(long = "set-intensity", num_args = 2, value_names = ["N", "INTENSITY"])]
        set_intensity: Vec<String>,
        /// Move phase N one step up or down
        #[arg(long = "move-phase", num_args = 2, value_names = ["N", "DIRECTION"])]
        move_phase: Vec<String>,
        /// Remove phase N. Repeatable; numbers refer to the order before removal.
        #[arg(long = "remove-phase", value_name = "N")]
        remove_phases: Vec<usize>,
        /// Append a phase as MM:SS or MM:SS:intensity. Repeatable.
        #[arg(long = "add-phase")]
        add_phases: Vec<String>,
    },
    /// Delete a routine
    Delete {
        /// Routine id, unique id prefix, or name
        id: String,
    },
}

pub fn run(action: RoutineAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        RoutineAction::List { json } => list(json),
        RoutineAction::Show { id, json } => show(&id, json),
        RoutineAction::Create { name, phases } => create(name, &phases),
        RoutineAction::Edit {
            id,
            name,
            set_intensity,
            move_phase,
            remove_phases,
            add_phases,
        } => edit(
            &id,
            EditPlan {
                name,
                set_intensity,
                move_phase,
                remove_phases,
                add_phases,
            },
        ),
        RoutineAction::Delete { id } => delete(&id),
    }
}

fn list(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = RoutineStore::open_default()?;
    let routines = store.list();

    if json {
        println!("{}", serde_json::to_string_pretty(routines)?);
        return Ok(());
    }

    if routines.is_empty() {
        println!("No routines. Create one with `tempoflow routine create`.");
        return Ok(());
    }
    for routine in routines {
        println!(
            "{}  {}  ({} phases, {})",
            short_id(&routine.id),
            routine.name,
            routine.phases.len(),
            format_clock(routine.total_duration_secs())
        );
    }
    Ok(())
}

fn show(key: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = RoutineStore::open_default()?;
    let routine = store
        .find(key)
        .ok_or_else(|| format!("Routine '{key}' not found"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(routine)?);
        return Ok(());
    }

    println!("{} ({})", routine.name, routine.id);
    for (i, phase) in routine.phases.iter().enumerate() {
        println!(
            "  {:>2}. {}  {}",
            i + 1,
            format_clock(phase.duration_secs),
            phase.intensity
        );
    }
    println!("  total {}", format_clock(routine.total_duration_secs()));
    Ok(())
}

fn create(name: String, specs: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let phases = specs
        .iter()
        .map(|s| parse_phase(s))
        .collect::<Result<Vec<_>, _>>()?;
    let routine = Routine::new(name, phases)?;

    let mut store = RoutineStore::open_default()?;
    let id = routine.id.clone();
    store.upsert(routine);
    store.save()?;
    debug!(path = %store.path().display(), "routines saved");

    println!("Routine created: {id}");
    Ok(())
}

struct EditPlan {
    name: Option<String>,
    set_intensity: Vec<String>,
    move_phase: Vec<String>,
    remove_phases: Vec<usize>,
    add_phases: Vec<String>,
}

impl EditPlan {
    fn apply(self, routine: &mut Routine) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(name) = &self.name {
            routine.rename(name)?;
        }
        for pair in self.set_intensity.chunks(2) {
            let index = phase_index(&pair[0])?;
            routine.set_intensity(index, pair[1].parse::<Intensity>()?)?;
        }
        for pair in self.move_phase.chunks(2) {
            let index = phase_index(&pair[0])?;
            routine.move_phase(index, pair[1].parse::<MoveDirection>()?)?;
        }
        let mut removals = self.remove_phases;
        removals.sort_unstable();
        removals.dedup();
        for position in removals.into_iter().rev() {
            let index = position
                .checked_sub(1)
                .ok_or("phase numbers start at 1")?;
            routine.remove_phase(index)?;
        }
        for spec in &self.add_phases {
            routine.push_phase(parse_phase(spec)?);
        }
        Ok(())
    }
}

fn edit(key: &str, plan: EditPlan) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = RoutineStore::open_default()?;
    let mut routine = store
        .find(key)
        .cloned()
        .ok_or_else(|| format!("Routine '{key}' not found"))?;

    plan.apply(&mut routine)?;

    println!(
        "Routine updated: {} ({} phases, {})",
        routine.name,
        routine.phases.len(),
        format_clock(routine.total_duration_secs())
    );
    store.upsert(routine);
    store.save()?;
    debug!(path = %store.path().display(), "routines saved");
    Ok(())
}

/// 1-based phase number from the command line to a 0-based index.
fn phase_index(text: &str) -> Result<usize, Box<dyn std::error::Error>> {
    match text.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("'{text}' is not a phase number (1, 2, ...)").into()),
    }
}

fn delete(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = RoutineStore::open_default()?;
    let id = store
        .find(key)
        .map(|r| r.id.clone())
        .ok_or_else(|| format!("Routine '{key}' not found"))?;
    let removed = store.remove(&id)?;
    store.save()?;

    println!("Routine deleted: {}", removed.name);
    Ok(())
}

/// Parse `MM:SS`, `SECS`, or either followed by `:intensity`.
fn parse_phase(spec: &str) -> Result<Phase, Box<dyn std::error::Error>> {
    let (clock, intensity) = match spec.rsplit_once(':') {
        // A word after the last colon is always an intensity tag.
        Some((clock, tail)) if tail.trim().chars().any(|c| c.is_ascii_alphabetic()) => {
            (clock, tail.parse::<Intensity>()?)
        }
        _ => (spec, Intensity::default()),
    };
    let secs = parse_clock(clock)?;
    Ok(Phase::new(secs, intensity)?)
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
