//! Generation configuration
//!
//! Loaded from TOML; every table and field has a default so an empty file
//! is a valid configuration.
//!
//! ```toml
//! [general]
//! seed = 1234
//! max_attempts = 20
//!
//! [level]
//! special_room_count = 2
//!
//! [[prefabs.rooms]]
//! name = "cell"
//! weight = 3
//! width = 3
//! height = 3
//! exits = "UP | DOWN | LEFT | RIGHT"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};
use crate::layout::Directions;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub level: LevelConfig,
    #[serde(default)]
    pub prefabs: PrefabConfig,
}

impl GenerationConfig {
    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| GenerationError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject prefab tables the materializer cannot draw from
    pub fn validate(&self) -> Result<()> {
        validate_set("entry", &self.prefabs.entry, true)?;
        validate_set("rooms", &self.prefabs.rooms, true)?;
        // boss prefabs are only needed when the graph has a boss
        validate_set("boss", &self.prefabs.boss, false)?;
        if self.general.max_attempts == 0 {
            return Err(GenerationError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_set(name: &str, set: &[Prefab], required: bool) -> Result<()> {
    if set.is_empty() {
        if required {
            return Err(GenerationError::Config(format!("prefab set '{name}' is empty")));
        }
        return Ok(());
    }
    if set.iter().all(|p| p.weight == 0) {
        return Err(GenerationError::Config(format!(
            "prefab set '{name}' has no positive weight"
        )));
    }
    let total: u64 = set.iter().map(|p| u64::from(p.weight)).sum();
    if total > u64::from(u32::MAX) {
        return Err(GenerationError::Config(format!(
            "prefab set '{name}' has a total weight above {}",
            u32::MAX
        )));
    }
    if let Some(bad) = set.iter().find(|p| p.width <= 0 || p.height <= 0) {
        return Err(GenerationError::Config(format!(
            "prefab '{}' has non-positive size",
            bad.name
        )));
    }
    Ok(())
}

/// Run-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Seed of the first attempt; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Attempts before the orchestrator gives up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Time slice between yields when driven incrementally
    #[serde(default = "default_yield_budget_ms")]
    pub yield_budget_ms: u64,
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_attempts: default_max_attempts(),
            yield_budget_ms: default_yield_budget_ms(),
            log_level: default_log_level(),
        }
    }
}

/// Level-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Size of the special-room reservoir; 0 disables it
    #[serde(default)]
    pub special_room_count: usize,
    /// Above-ground levels register rooms with the overview camera
    #[serde(default = "default_true")]
    pub above_ground: bool,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            special_room_count: 0,
            above_ground: true,
        }
    }
}

/// A room template the layout can instantiate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefab {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    pub width: i32,
    pub height: i32,
    /// Sides with a door socket
    #[serde(default = "default_exits")]
    pub exits: Directions,
    /// Door-type nodes the room can hold
    #[serde(default = "default_max_doors")]
    pub max_doors: u8,
}

impl Prefab {
    pub fn new(name: &str, weight: u32, width: i32, height: i32, exits: Directions) -> Self {
        Self {
            name: name.to_string(),
            weight,
            width,
            height,
            exits,
            max_doors: default_max_doors(),
        }
    }

    pub fn with_max_doors(mut self, max_doors: u8) -> Self {
        self.max_doors = max_doors;
        self
    }
}

/// The three prefab sets the materializer draws from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefabConfig {
    #[serde(default = "default_entry")]
    pub entry: Vec<Prefab>,
    #[serde(default = "default_rooms")]
    pub rooms: Vec<Prefab>,
    #[serde(default = "default_boss")]
    pub boss: Vec<Prefab>,
}

impl Default for PrefabConfig {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            rooms: default_rooms(),
            boss: default_boss(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}
fn default_max_attempts() -> u32 {
    50
}
fn default_yield_budget_ms() -> u64 {
    33
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_weight() -> u32 {
    1
}
fn default_exits() -> Directions {
    Directions::ANY
}
fn default_max_doors() -> u8 {
    6
}

fn default_entry() -> Vec<Prefab> {
    vec![
        Prefab::new("entry_hall", 3, 4, 4, Directions::ANY),
        Prefab::new("entry_stair", 1, 3, 5, Directions::ANY),
    ]
}

fn default_rooms() -> Vec<Prefab> {
    vec![
        Prefab::new("cell", 4, 3, 3, Directions::ANY),
        Prefab::new("hall", 2, 5, 5, Directions::ANY),
        Prefab::new("gallery", 2, 6, 2, Directions::HORIZONTAL),
        Prefab::new("shaft", 2, 2, 6, Directions::VERTICAL),
        Prefab::new("closet", 1, 2, 2, Directions::ANY).with_max_doors(2),
    ]
}

fn default_boss() -> Vec<Prefab> {
    vec![Prefab::new("arena", 1, 7, 7, Directions::ANY).with_max_doors(2)]
}
