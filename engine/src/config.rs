use std::{fs, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::combatant::DEFAULT_MOVEMENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Host settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TrackerConfig {
    /// Directory holding the local encounter store.
    pub store_dir: PathBuf,
    /// Save the encounter whenever the turn changes.
    pub autosave: bool,
    pub tick_millis: u64,
    /// Movement given to newly added creatures.
    pub default_movement: u16,
    pub theme: Theme,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(".tracker"),
            autosave: true,
            tick_millis: 1000,
            default_movement: DEFAULT_MOVEMENT,
            theme: Theme::Light,
        }
    }
}

impl TrackerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let cfg = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config YAML: {}", path.display()))?;
        Ok(cfg)
    }

    /// Loads `path` when it exists, otherwise the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}
