use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Intensity tag of a phase.
///
/// Older routine files stored a display color instead; those names are
/// accepted as aliases (green = low, yellow = normal, red = high).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    #[serde(alias = "green")]
    Low,
    #[default]
    #[serde(alias = "yellow")]
    Normal,
    #[serde(alias = "red")]
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Normal => "normal",
            Intensity::High => "high",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intensity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "green" => Ok(Intensity::Low),
            "normal" | "yellow" => Ok(Intensity::Normal),
            "high" | "red" => Ok(Intensity::High),
            other => Err(ValidationError::UnknownIntensity(other.to_string())),
        }
    }
}

/// Direction for [`Routine::move_phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl FromStr for MoveDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(MoveDirection::Up),
            "down" => Ok(MoveDirection::Down),
            other => Err(ValidationError::InvalidValue {
                field: "direction".into(),
                message: format!("'{other}' is not up or down"),
            }),
        }
    }
}

/// One timed segment of a routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    /// Duration in whole seconds.
    #[serde(alias = "duration")]
    pub duration_secs: u64,
    #[serde(default, alias = "color")]
    pub intensity: Intensity,
}

impl Phase {
    /// Create a phase with a fresh id.
    ///
    /// # Errors
    /// Returns [`ValidationError::ZeroDuration`] if `duration_secs` is 0.
    pub fn new(duration_secs: u64, intensity: Intensity) -> Result<Self, ValidationError> {
        if duration_secs == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            duration_secs,
            intensity,
        })
    }
}

/// A named, ordered sequence of phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "tempos")]
    pub phases: Vec<Phase>,
}

impl Routine {
    /// Create a routine with a fresh id.
    ///
    /// An empty phase list is allowed here (routines are edited
    /// incrementally); the engine refuses to run it.
    pub fn new(name: impl Into<String>, phases: Vec<Phase>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if phases.iter().any(|p| p.duration_secs == 0) {
            return Err(ValidationError::ZeroDuration);
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            phases,
        })
    }

    pub fn rename(&mut self, name: &str) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.name = name.to_string();
        Ok(())
    }

    pub fn push_phase(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    pub fn remove_phase(&mut self, index: usize) -> Result<Phase, ValidationError> {
        self.check_index(index)?;
        Ok(self.phases.remove(index))
    }

    /// Swap the phase at `index` with its neighbour. Moving the first phase
    /// up or the last one down leaves the order unchanged.
    pub fn move_phase(
        &mut self,
        index: usize,
        direction: MoveDirection,
    ) -> Result<(), ValidationError> {
        self.check_index(index)?;
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1).filter(|&i| i < self.phases.len()),
        };
        if let Some(target) = target {
            self.phases.swap(index, target);
        }
        Ok(())
    }

    pub fn set_intensity(
        &mut self,
        index: usize,
        intensity: Intensity,
    ) -> Result<(), ValidationError> {
        self.check_index(index)?;
        self.phases[index].intensity = intensity;
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), ValidationError> {
        if index < self.phases.len() {
            Ok(())
        } else {
            Err(ValidationError::PhaseOutOfRange {
                position: index + 1,
                len: self.phases.len(),
            })
        }
    }

    /// Saturates instead of overflowing on hand-edited files.
    pub fn total_duration_secs(&self) -> u64 {
        sum_durations(&self.phases)
    }
}

fn sum_durations<'a>(phases: impl IntoIterator<Item = &'a Phase>) -> u64 {
    phases
        .into_iter()
        .map(|p| p.duration_secs)
        .fold(0, u64::saturating_add)
}

/// Read-only view over the phases of one routine.
#[derive(Debug, Clone)]
pub struct PhaseSequence {
    phases: Vec<Phase>,
    total_secs: u64,
}

impl PhaseSequence {
    pub fn new(phases: Vec<Phase>) -> Self {
        let total_secs = sum_durations(&phases);
        Self { phases, total_secs }
    }

    /// Sum of all phase durations, in seconds.
    pub fn total_duration(&self) -> u64 {
        self.total_secs
    }

    /// Phase at `index`, or `None` past the end.
    pub fn at(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Seconds contained in the phases before `index`.
    pub fn cumulative(&self, index: usize) -> u64 {
        sum_durations(self.phases.iter().take(index))
    }
}
