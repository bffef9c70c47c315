//! JSON routine store.
//!
//! The minimal routine collaborator used by the CLI: a single
//! `routines.json` file holding every routine. Files written by older
//! versions (a bare array of profiles with `tempos` and `color`) are read
//! and rewritten in the current layout on the next save.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::data_dir;
use crate::error::{Result, StorageError};
use crate::timer::Routine;

const ROUTINES_FILE: &str = "routines.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Versioned {
        version: u32,
        #[serde(default)]
        routines: Vec<Routine>,
    },
    Legacy(Vec<Routine>),
}

#[derive(Debug, Clone)]
pub struct RoutineStore {
    path: PathBuf,
    routines: Vec<Routine>,
}

impl RoutineStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    /// Returns [`StorageError::LoadFailed`] if the file exists but cannot be
    /// read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let load_failed = |message: String| StorageError::LoadFailed {
            path: path.clone(),
            message,
        };

        let routines = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content)
                .map_err(|e| load_failed(e.to_string()))?
            {
                OnDisk::Versioned { routines, .. } => routines,
                OnDisk::Legacy(routines) => {
                    info!(
                        path = %path.display(),
                        count = routines.len(),
                        "read legacy routine file"
                    );
                    routines
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(load_failed(e.to_string()).into()),
        };

        Ok(Self { path, routines })
    }

    /// Open `routines.json` in the data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(data_dir()?.join(ROUTINES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[Routine] {
        &self.routines
    }

    pub fn get(&self, id: &str) -> Option<&Routine> {
        self.routines.iter().find(|r| r.id == id)
    }

    /// Look a routine up by exact id, unique id prefix, or exact name.
    /// A blank key matches nothing.
    pub fn find(&self, key: &str) -> Option<&Routine> {
        if key.trim().is_empty() {
            return None;
        }
        if let Some(routine) = self.get(key) {
            return Some(routine);
        }
        let mut by_prefix = self.routines.iter().filter(|r| r.id.starts_with(key));
        if let (Some(routine), None) = (by_prefix.next(), by_prefix.next()) {
            return Some(routine);
        }
        self.routines.iter().find(|r| r.name == key)
    }

    /// Replace the routine with the same id, or append it.
    pub fn upsert(&mut self, routine: Routine) {
        match self.routines.iter_mut().find(|r| r.id == routine.id) {
            Some(existing) => *existing = routine,
            None => self.routines.push(routine),
        }
    }

    pub fn remove(&mut self, id: &str) -> Result<Routine> {
        let pos = self
            .routines
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        Ok(self.routines.remove(pos))
    }

    /// Write the store back to its file.
    pub fn save(&self) -> Result<()> {
        let save_failed = |message: String| StorageError::SaveFailed {
            path: self.path.clone(),
            message,
        };
        let on_disk = OnDisk::Versioned {
            version: FORMAT_VERSION,
            routines: self.routines.clone(),
        };
        let content = serde_json::to_string_pretty(&on_disk)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(|e| save_failed(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }
}
