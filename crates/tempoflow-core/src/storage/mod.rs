mod config;
pub mod routines;

pub use config::{AlarmConfig, Config, RunnerConfig};
pub use routines::RoutineStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `config.toml` and `routines.json`.
///
/// `TEMPOFLOW_DATA_DIR` overrides the location. Otherwise it is
/// `~/.config/tempoflow[-dev]/`, picking the dev directory when
/// `TEMPOFLOW_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TEMPOFLOW_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TEMPOFLOW_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("tempoflow-dev")
            } else {
                base_dir.join("tempoflow")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
