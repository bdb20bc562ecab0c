/// Session configuration.
///
/// Values come from `Default`, a serde document, or the environment
/// (`SessionConfig::from_env`). Unset or unparsable environment variables
/// fall back to the defaults with a warning.

use crate::history::{UndoFloor, DEFAULT_HISTORY_CAPACITY};
use crate::table::LoadOptions;
use serde::{Deserialize, Serialize};

pub const ENV_HISTORY_CAPACITY: &str = "MINETABLE_HISTORY_CAPACITY";
pub const ENV_UNDO_FLOOR: &str = "MINETABLE_UNDO_FLOOR";
pub const ENV_DOWNCAST: &str = "MINETABLE_DOWNCAST";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum snapshots kept; `None` keeps all of them.
    pub history_capacity: Option<usize>,
    pub undo_floor: UndoFloor,
    /// Store CSV columns in 32-bit types when the values fit.
    pub downcast: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            history_capacity: Some(DEFAULT_HISTORY_CAPACITY),
            undo_floor: UndoFloor::default(),
            downcast: true,
        }
    }
}

impl SessionConfig {
    /// Read the configuration from `MINETABLE_*` environment variables.
    ///
    /// `MINETABLE_HISTORY_CAPACITY` accepts a number or `unbounded`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = SessionConfig::default();

        if let Some(raw) = lookup(ENV_HISTORY_CAPACITY) {
            match raw.trim() {
                "unbounded" | "none" => config.history_capacity = None,
                n => match n.parse::<usize>() {
                    Ok(n) => config.history_capacity = Some(n),
                    Err(_) => log::warn!("ignoring {}={:?}: not a number", ENV_HISTORY_CAPACITY, raw),
                },
            }
        }

        if let Some(raw) = lookup(ENV_UNDO_FLOOR) {
            match raw.parse::<UndoFloor>() {
                Ok(floor) => config.undo_floor = floor,
                Err(e) => log::warn!("ignoring {}: {}", ENV_UNDO_FLOOR, e),
            }
        }

        if let Some(raw) = lookup(ENV_DOWNCAST) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.downcast = true,
                "0" | "false" | "no" => config.downcast = false,
                _ => log::warn!("ignoring {}={:?}: expected true or false", ENV_DOWNCAST, raw),
            }
        }

        config
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            downcast: self.downcast,
        }
    }
}
