// Data-driven tuning for the navigation and collision core.
//
// Every constant the path finder and the collision resolver need lives in
// `CoreConfig`, loadable from JSON. `Default` reproduces the reference game
// values, so a host that never loads a file still behaves exactly like the
// shipped game: five expansions per search call, a one-sector lift for flying
// agents, a 160 unit scalp offset for the collision reference point, and a
// 50 unit margin when collecting rooms around the capsule.
//
// Missing keys fall back to defaults (`#[serde(default)]` on every section),
// so a config file only needs to name the values it changes.
//
// See also: `pathfinder.rs` (reads `NavConfig`), `collision.rs` (reads
// `CollisionConfig`), `height.rs` (`HeightPolicy`).
//
// **Critical constraint: determinism.** Config values feed directly into
// per-tick logic. Two hosts with different configs will steer agents
// differently.

use crate::collision::CollisionPolicy;
use crate::error::ConfigError;
use crate::height::HeightPolicy;
use crate::types::{HEIGHT_LIMIT, QUARTER_SECTOR_SIZE, SECTOR_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Path finder tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Boxes popped from the expansion queue per search call. This is the
    /// per-tick work quantum; large graphs are explored over several ticks.
    pub max_expansions: u8,
    /// Vertical lift applied to steering targets of flying agents while
    /// walking the exit chain.
    pub fly_step_offset: i32,
    /// Vertical lift applied to the wander target of flying agents.
    pub fly_wander_offset: i32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            max_expansions: 5,
            fly_step_offset: SECTOR_SIZE,
            fly_wander_offset: 384,
        }
    }
}

/// Collision resolver tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Extra height above the capsule top for the sector reference probe.
    pub scalp_to_hands_height: i32,
    /// Margin added to radius and height when collecting nearby rooms for
    /// static mesh tests.
    pub room_probe_margin: i32,
    /// Largest acceptable drop below the feet for forward probes.
    pub bad_positive_distance: i32,
    /// Largest acceptable step above the feet (negative) for forward probes.
    pub bad_negative_distance: i32,
    /// Ceiling clearance threshold for the front probe.
    pub bad_ceiling_distance: i32,
    /// Slope/pit/lava rules applied when the caller does not override them.
    pub policy: CollisionPolicy,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            scalp_to_hands_height: 160,
            room_probe_margin: 50,
            bad_positive_distance: HEIGHT_LIMIT,
            bad_negative_distance: -(QUARTER_SECTOR_SIZE + QUARTER_SECTOR_SIZE / 2),
            bad_ceiling_distance: 0,
            policy: CollisionPolicy::default(),
        }
    }
}

/// Complete core configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub nav: NavConfig,
    pub collision: CollisionConfig,
    pub height: HeightPolicy,
    /// Filter handed to `logging::init`, in env_logger directive syntax.
    pub log_filter: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            nav: NavConfig::default(),
            collision: CollisionConfig::default(),
            height: HeightPolicy::default(),
            log_filter: "info".to_owned(),
        }
    }
}

impl CoreConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON (for writing a template config file).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        log::info!("loaded core config from {}", path.display());
        Ok(config)
    }
}
