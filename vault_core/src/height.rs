// Floor and ceiling height evaluation for a sector and a position.
//
// A sector's static heights are corrected by its floor-data program:
//
// - Floor: walk `room_below` links to the bottom-most sector at the position,
//   start from its floor height, apply the floor slant, record the first
//   trigger or death chunk, and let item controllers named by `Object`
//   trigger actions patch the result (bridges, trap doors).
// - Ceiling: walk `room_above` links to the top-most sector, start from its
//   ceiling height and apply a ceiling slant if the chain opens with one
//   (optionally after a floor slant). Item ceiling patches come from the
//   trigger program of the *bottom-most* sector at the same position.
//
// Slant correction is linear across the sector with truncating integer
// division, e.g. for a positive Z slant on the floor
// `(1024 - local_z) * z * 256 / 1024`. These formulas are part of the
// gameplay contract and must stay bit exact.
//
// Steep slants (either component above 2) can be ignored altogether through
// `HeightPolicy::skip_steep_slants`; the policy is passed explicitly on every
// query.
//
// See also: `floordata.rs` for chain decoding, `items.rs` for
// `FloorPatcher`, `collision.rs` for the probe that consumes these values.
//
// **Critical constraint: determinism.** Pure integer arithmetic, no state.

use crate::floordata::{
    Chunk, ChunkEntry, Chunks, FloorFunction, TriggerActions, TriggerFunction, is_last,
};
use crate::types::{QUARTER_SECTOR_SIZE, SECTOR_SIZE, SectorRef, TrVec};
use crate::world::World;
use serde::{Deserialize, Serialize};

/// Largest slant component magnitude that still counts as moderate.
pub const MODERATE_SLANT_LIMIT: i32 = 2;

/// Slant handling rules.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightPolicy {
    /// Ignore floor and ceiling slants steeper than `MODERATE_SLANT_LIMIT`.
    pub skip_steep_slants: bool,
}

impl HeightPolicy {
    fn applies(&self, x: i8, z: i8) -> bool {
        !self.skip_steep_slants || is_moderate(x, z)
    }
}

fn is_moderate(x: i8, z: i8) -> bool {
    i32::from(x).abs() <= MODERATE_SLANT_LIMIT && i32::from(z).abs() <= MODERATE_SLANT_LIMIT
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlantClass {
    #[default]
    None,
    Moderate,
    Steep,
}

/// Result of one floor or ceiling query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeightInfo {
    pub distance: i32,
    pub slant_class: SlantClass,
    /// Floor-data index of the header of the first trigger or death chunk.
    pub last_trigger_or_kill: Option<usize>,
}

impl HeightInfo {
    /// Effective floor height at `pos`.
    pub fn from_floor(world: &World, sector: SectorRef, pos: TrVec, policy: &HeightPolicy) -> Self {
        let bottom = world.bottom_sector(sector, pos);
        let s = world.sector(bottom);
        let mut hi = HeightInfo {
            distance: s.floor(),
            ..Default::default()
        };

        for ChunkEntry { header, chunk } in Chunks::new(&world.floor_data, s.floor_data_index) {
            match chunk {
                Chunk::FloorSlant { x, z } => {
                    if policy.applies(x, z) {
                        hi.slant_class = if is_moderate(x, z) {
                            SlantClass::Moderate
                        } else {
                            SlantClass::Steep
                        };
                        hi.distance += floor_slant_offset(x, z, pos);
                    }
                }
                Chunk::Death => {
                    if hi.last_trigger_or_kill.is_none() {
                        hi.last_trigger_or_kill = Some(header);
                    }
                }
                Chunk::Trigger { actions } => {
                    if hi.last_trigger_or_kill.is_none() {
                        hi.last_trigger_or_kill = Some(header);
                    }
                    for item in object_actions(world, actions) {
                        hi.distance = world.items.expect_item(item).patch_floor(pos, hi.distance);
                    }
                }
                _ => {}
            }
        }
        hi
    }

    /// Effective ceiling height at `pos`.
    pub fn from_ceiling(
        world: &World,
        sector: SectorRef,
        pos: TrVec,
        policy: &HeightPolicy,
    ) -> Self {
        let top = world.top_sector(sector, pos);
        let s = world.sector(top);
        let mut hi = HeightInfo {
            distance: s.ceiling(),
            ..Default::default()
        };

        let mut chunks = Chunks::new(&world.floor_data, s.floor_data_index);
        if let Some(first) = chunks.next() {
            let first_is_last = is_last(world.floor_data[first.header]);
            let candidate = match first.chunk {
                Chunk::FloorSlant { .. } => chunks.next(),
                _ => Some(first),
            };
            if let Some(ChunkEntry {
                chunk: Chunk::CeilingSlant { x, z },
                ..
            }) = candidate
            {
                if !first_is_last && policy.applies(x, z) {
                    hi.distance += ceiling_slant_offset(x, z, pos);
                }
            }
        }

        let bottom = world.bottom_sector(top, pos);
        let data_index = world.sector(bottom).floor_data_index;
        for entry in Chunks::new(&world.floor_data, data_index) {
            if let Chunk::Trigger { actions } = entry.chunk {
                for item in object_actions(world, actions) {
                    hi.distance = world.items.expect_item(item).patch_ceiling(pos, hi.distance);
                }
            }
        }
        hi
    }

    /// True if the recorded trigger-or-kill chunk is a death chunk.
    pub fn is_death(&self, world: &World) -> bool {
        self.last_trigger_or_kill.is_some_and(|header| {
            FloorFunction::from_header(world.floor_data[header]) == FloorFunction::Death
        })
    }
}

/// Raw floor slant components of the bottom-most sector at `pos`.
pub fn floor_slant_info(world: &World, sector: SectorRef, pos: TrVec) -> (i8, i8) {
    let bottom = world.bottom_sector(sector, pos);
    Chunks::new(&world.floor_data, world.sector(bottom).floor_data_index)
        .find_map(|entry| match entry.chunk {
            Chunk::FloorSlant { x, z } => Some((x, z)),
            _ => None,
        })
        .unwrap_or((0, 0))
}

fn object_actions(world: &World, start: usize) -> impl Iterator<Item = u16> + '_ {
    TriggerActions::new(&world.floor_data, start)
        .filter(|a| a.function == TriggerFunction::Object)
        .map(|a| a.param)
}

fn slant_step(dist: i32, slant: i8) -> i32 {
    dist * i32::from(slant) * QUARTER_SECTOR_SIZE / SECTOR_SIZE
}

/// Height correction of a floor slant at `pos`.
pub fn floor_slant_offset(x: i8, z: i8, pos: TrVec) -> i32 {
    let local_x = pos.x % SECTOR_SIZE;
    let local_z = pos.z % SECTOR_SIZE;
    let mut offset = 0;

    // Positive slant: lower edge at the negative side.
    if z > 0 {
        offset += slant_step(SECTOR_SIZE - local_z, z);
    } else if z < 0 {
        offset -= slant_step(local_z, z);
    }

    if x > 0 {
        offset += slant_step(SECTOR_SIZE - local_x, x);
    } else if x < 0 {
        offset -= slant_step(local_x, x);
    }
    offset
}

/// Height correction of a ceiling slant at `pos`.
pub fn ceiling_slant_offset(x: i8, z: i8, pos: TrVec) -> i32 {
    let local_x = pos.x % SECTOR_SIZE;
    let local_z = pos.z % SECTOR_SIZE;
    let mut offset = 0;

    if z > 0 {
        offset -= slant_step(SECTOR_SIZE - local_z, z);
    } else if z < 0 {
        offset += slant_step(local_z, z);
    }

    if x > 0 {
        offset -= slant_step(local_x, x);
    } else if x < 0 {
        offset += slant_step(SECTOR_SIZE - local_x, x);
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{RoomSpec, WorldBuilder};
    use crate::floordata::{FloorDataProgram, TriggerAction};
    use crate::items::FlatBridge;
    use crate::types::RoomId;

    fn single_room(program: Vec<u16>) -> (World, SectorRef) {
        let mut b = WorldBuilder::new();
        let room = b.room(RoomSpec::flat(TrVec::ZERO, 3, 3, 0, -8));
        let fd = b.floor_data(program);
        b.sector_mut(room, 1, 1).floor_data_index = fd;
        let world = b.build().unwrap();
        (world, SectorRef { room, index: 1 + 3 })
    }

    fn at(x: i32, z: i32) -> TrVec {
        TrVec::new(1024 + x, -100, 1024 + z)
    }

    #[test]
    fn flat_sector_reports_base_heights() {
        let (world, s) = single_room(Vec::new());
        let policy = HeightPolicy::default();
        let floor = HeightInfo::from_floor(&world, s, at(500, 500), &policy);
        assert_eq!(floor.distance, 0);
        assert_eq!(floor.slant_class, SlantClass::None);
        assert_eq!(floor.last_trigger_or_kill, None);
        let ceiling = HeightInfo::from_ceiling(&world, s, at(500, 500), &policy);
        assert_eq!(ceiling.distance, -2048);
    }

    #[test]
    fn floor_slant_formula_is_bit_exact() {
        // z = 2 at local z 100: (1024 - 100) * 2 * 256 / 1024 = 462.
        assert_eq!(floor_slant_offset(0, 2, at(0, 100)), 462);
        // z = -3 at local z 333: -(333 * -3 * 256 / 1024) = 249 (truncated).
        assert_eq!(floor_slant_offset(0, -3, at(0, 333)), 249);
        // Both axes.
        assert_eq!(floor_slant_offset(1, 1, at(0, 0)), 512);
        assert_eq!(floor_slant_offset(-1, 0, at(1023, 0)), 255);
    }

    #[test]
    fn ceiling_slant_mirrors_floor() {
        assert_eq!(ceiling_slant_offset(0, 2, at(0, 100)), -462);
        assert_eq!(ceiling_slant_offset(0, -2, at(0, 100)), -50);
        assert_eq!(ceiling_slant_offset(2, 0, at(100, 0)), -50);
        assert_eq!(ceiling_slant_offset(-2, 0, at(100, 0)), -462);
    }

    #[test]
    fn moderate_and_steep_classification() {
        let (world, s) = single_room(FloorDataProgram::new().floor_slant(2, -1).finish());
        let hi = HeightInfo::from_floor(&world, s, at(0, 0), &HeightPolicy::default());
        assert_eq!(hi.slant_class, SlantClass::Moderate);
        assert_eq!(hi.distance, floor_slant_offset(2, -1, at(0, 0)));

        let (world, s) = single_room(FloorDataProgram::new().floor_slant(0, 4).finish());
        let hi = HeightInfo::from_floor(&world, s, at(0, 512), &HeightPolicy::default());
        assert_eq!(hi.slant_class, SlantClass::Steep);
        assert_eq!(hi.distance, 512);
    }

    #[test]
    fn skip_steep_slants_ignores_steep_only() {
        let policy = HeightPolicy {
            skip_steep_slants: true,
        };
        let (world, s) = single_room(FloorDataProgram::new().floor_slant(0, 4).finish());
        let hi = HeightInfo::from_floor(&world, s, at(0, 512), &policy);
        assert_eq!(hi.slant_class, SlantClass::None);
        assert_eq!(hi.distance, 0);

        let (world, s) = single_room(FloorDataProgram::new().floor_slant(0, 1).finish());
        let hi = HeightInfo::from_floor(&world, s, at(0, 0), &policy);
        assert_eq!(hi.slant_class, SlantClass::Moderate);
        assert_eq!(hi.distance, 256);
    }

    #[test]
    fn first_trigger_or_kill_is_kept() {
        let (world, s) = single_room(FloorDataProgram::new().death().trigger(&[]).finish());
        let hi = HeightInfo::from_floor(&world, s, at(0, 0), &HeightPolicy::default());
        assert!(hi.is_death(&world));

        let (world, s) = single_room(FloorDataProgram::new().trigger(&[]).death().finish());
        let hi = HeightInfo::from_floor(&world, s, at(0, 0), &HeightPolicy::default());
        assert!(hi.last_trigger_or_kill.is_some());
        assert!(!hi.is_death(&world));
    }

    #[test]
    fn ceiling_slant_after_floor_slant() {
        let program = FloorDataProgram::new()
            .floor_slant(1, 0)
            .ceiling_slant(0, 2)
            .finish();
        let (world, s) = single_room(program);
        let hi = HeightInfo::from_ceiling(&world, s, at(0, 100), &HeightPolicy::default());
        assert_eq!(hi.distance, -2048 - 462);
    }

    #[test]
    fn lone_ceiling_slant_is_not_applied() {
        // A chain consisting only of a ceiling slant ends on its first
        // header; the slant is not picked up.
        let (world, s) = single_room(FloorDataProgram::new().ceiling_slant(0, 2).finish());
        let hi = HeightInfo::from_ceiling(&world, s, at(0, 100), &HeightPolicy::default());
        assert_eq!(hi.distance, -2048);
    }

    #[test]
    fn trigger_objects_patch_floor_and_ceiling() {
        let program = FloorDataProgram::new()
            .trigger(&[TriggerAction::object(5)])
            .finish();
        let (mut world, s) = single_room(program);
        world.items.insert(
            5,
            FlatBridge {
                position: TrVec::new(1500, -512, 1500),
            },
        );
        let policy = HeightPolicy::default();
        let above = TrVec::new(1500, -1000, 1500);
        assert_eq!(HeightInfo::from_floor(&world, s, above, &policy).distance, -512);
        let below = TrVec::new(1500, -100, 1500);
        assert_eq!(HeightInfo::from_floor(&world, s, below, &policy).distance, 0);
        assert_eq!(HeightInfo::from_ceiling(&world, s, below, &policy).distance, -256);
    }

    #[test]
    fn floor_query_uses_bottom_of_stack() {
        let mut b = WorldBuilder::new();
        let lower = b.room(RoomSpec::flat(TrVec::ZERO, 3, 3, 4, -8));
        let upper = b.room(RoomSpec::flat(TrVec::ZERO, 3, 3, -8, -16));
        b.sector_mut(upper, 1, 1).room_below = Some(lower);
        b.sector_mut(lower, 1, 1).room_above = Some(upper);
        let world = b.build().unwrap();
        let s = SectorRef {
            room: upper,
            index: 4,
        };
        let pos = TrVec::new(1500, -3000, 1500);
        let policy = HeightPolicy::default();
        assert_eq!(HeightInfo::from_floor(&world, s, pos, &policy).distance, 1024);
        let from_lower = SectorRef {
            room: RoomId(0),
            index: 4,
        };
        assert_eq!(HeightInfo::from_ceiling(&world, from_lower, pos, &policy).distance, -4096);
    }

    #[test]
    fn slant_info_reads_raw_bytes() {
        let (world, s) = single_room(FloorDataProgram::new().death().floor_slant(-3, 1).finish());
        assert_eq!(floor_slant_info(&world, s, at(0, 0)), (-3, 1));
        let (world, s) = single_room(Vec::new());
        assert_eq!(floor_slant_info(&world, s, at(0, 0)), (0, 0));
    }
}
