// Item controllers that override sector floor and ceiling heights.
//
// Some interactive items (bridges, trap doors) form walkable surfaces that
// the static sector grid knows nothing about. A sector's trigger program
// names such items through `Object` actions; the height interpreter then
// asks the item, through `FloorPatcher`, to patch the height it computed.
// The interpreter does not know the concrete item type.
//
// Heights follow the level convention (Y down): an item surface at `item_y`
// applies to positions at or above it (`pos.y <= item_y`), and acts as a
// ceiling one quarter sector thick for positions below it.
//
// Items are registered per level in an `ItemRegistry`, keyed by the item
// index used in trigger actions (10 bits). The registry is shared read-only
// between agents evaluated in parallel, hence `Send + Sync` and `Arc`.
//
// See also: `height.rs` (the only caller), `floordata.rs` (`Object` actions).

use crate::types::{Axis, QUARTER_SECTOR_SIZE, SECTOR_SIZE, TrVec};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Capability of an item to override floor and ceiling heights.
pub trait FloorPatcher: fmt::Debug + Send + Sync {
    /// Return the floor height at `pos` given the sector's `height`.
    fn patch_floor(&self, pos: TrVec, height: i32) -> i32;

    /// Return the ceiling height at `pos` given the sector's `height`.
    fn patch_ceiling(&self, pos: TrVec, height: i32) -> i32;
}

/// A horizontal bridge plank at the item's height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatBridge {
    pub position: TrVec,
}

impl FloorPatcher for FlatBridge {
    fn patch_floor(&self, pos: TrVec, height: i32) -> i32 {
        if pos.y <= self.position.y {
            self.position.y
        } else {
            height
        }
    }

    fn patch_ceiling(&self, pos: TrVec, height: i32) -> i32 {
        if pos.y <= self.position.y {
            height
        } else {
            self.position.y + QUARTER_SECTOR_SIZE
        }
    }
}

/// A bridge plank sloping across one sector.
///
/// The slope drops along the bridge's facing; `div` scales the full-sector
/// ramp (4 for a quarter-sector rise, 2 for a half-sector rise).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlopedBridge {
    pub position: TrVec,
    pub facing: Axis,
    pub div: i32,
}

impl SlopedBridge {
    fn slope_height(&self, pos: TrVec) -> i32 {
        match self.facing {
            Axis::PosZ => SECTOR_SIZE - 1 - pos.x % SECTOR_SIZE,
            Axis::PosX => pos.z % SECTOR_SIZE,
            Axis::NegZ => pos.x % SECTOR_SIZE,
            Axis::NegX => SECTOR_SIZE - 1 - pos.z % SECTOR_SIZE,
        }
    }

    fn surface(&self, pos: TrVec) -> i32 {
        self.position.y + self.slope_height(pos) / self.div
    }
}

impl FloorPatcher for SlopedBridge {
    fn patch_floor(&self, pos: TrVec, height: i32) -> i32 {
        let surface = self.surface(pos);
        if pos.y <= surface { surface } else { height }
    }

    fn patch_ceiling(&self, pos: TrVec, height: i32) -> i32 {
        let surface = self.surface(pos);
        if pos.y <= surface {
            height
        } else {
            surface + QUARTER_SECTOR_SIZE
        }
    }
}

/// A trap door that is walkable while closed, only over its own sector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrapDoor {
    pub position: TrVec,
    pub closed: bool,
}

impl TrapDoor {
    fn covers(&self, pos: TrVec) -> bool {
        self.closed
            && pos.x / SECTOR_SIZE == self.position.x / SECTOR_SIZE
            && pos.z / SECTOR_SIZE == self.position.z / SECTOR_SIZE
    }
}

impl FloorPatcher for TrapDoor {
    fn patch_floor(&self, pos: TrVec, height: i32) -> i32 {
        if self.covers(pos) && pos.y <= self.position.y {
            self.position.y
        } else {
            height
        }
    }

    fn patch_ceiling(&self, pos: TrVec, height: i32) -> i32 {
        if self.covers(pos) && pos.y > self.position.y {
            self.position.y + QUARTER_SECTOR_SIZE
        } else {
            height
        }
    }
}

/// Item controllers of one level, keyed by trigger item index.
#[derive(Clone, Default)]
pub struct ItemRegistry {
    items: BTreeMap<u16, Arc<dyn FloorPatcher>>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the controller for `index`.
    pub fn insert(&mut self, index: u16, item: impl FloorPatcher + 'static) {
        self.items.insert(index, Arc::new(item));
    }

    pub fn remove(&mut self, index: u16) {
        self.items.remove(&index);
    }

    pub fn get(&self, index: u16) -> Option<&dyn FloorPatcher> {
        self.items.get(&index).map(|item| item.as_ref())
    }

    /// Controller for a trigger action. A trigger naming an unregistered
    /// item is broken level data.
    pub fn expect_item(&self, index: u16) -> &dyn FloorPatcher {
        self.get(index)
            .unwrap_or_else(|| panic!("trigger references unregistered item {index}"))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for ItemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.items.iter()).finish()
    }
}
