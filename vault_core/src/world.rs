// Static level geometry: rooms, sectors, navigation boxes, overlaps.
//
// The world is a set of flat arenas addressed by index:
//
// - `rooms[RoomId]`: each room is a grid of `sectors_x * sectors_z` sectors
//   stored at `z + x * sectors_z`, anchored at `position` (X/Z only). A
//   sector carries floor and ceiling heights in quarter-sector units, links
//   to the rooms directly below/above it (stacked rooms), the navigation box
//   it belongs to, and an optional floor-data program.
// - `boxes[BoxId]`: convex rectangular navigation cells with a floor
//   height and per-locomotion zone tags.
// - `overlaps`: the adjacency table. A box's neighbours are the entries
//   from `overlap_index` up to and including the first one with bit 15 set.
// - `floor_data`: the floor-data word table (see `floordata.rs`).
// - `static_meshes`: collision definitions for static scenery, placed per
//   room.
//
// Sector lookup (`find_real_floor_sector`) follows portal chunks sideways
// into neighbouring rooms, then walks stacked rooms up or down until the
// sector that actually contains the height of the query point is found.
// Lookups run on validated data only: an unresolvable in-bounds position is
// a data bug and panics. `validate()` reports everything that can be checked
// up front as a `WorldError`.
//
// The world is read-only during gameplay. Item controllers that patch floor
// and ceiling heights live in `items` and are not serialized; hosts register
// them after loading (`#[serde(skip)]`, same as the other transient state).
//
// See also: `height.rs` for floor/ceiling evaluation on top of sectors,
// `pathfinder.rs` for the box graph search, `builder.rs` for programmatic
// construction.
//
// **Critical constraint: determinism.** All lookups are pure functions of the
// arenas; no hashing, no interior mutability.

use crate::error::WorldError;
use crate::floordata::{Chunk, Chunks};
use crate::items::ItemRegistry;
use crate::types::{
    Angle, Axis, BoundingBox, BoxId, QUARTER_SECTOR_SIZE, RoomId, SECTOR_SIZE, SectorRef, TrVec,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Overlap entry bit marking the last neighbour of a box.
pub const OVERLAP_LAST: u16 = 0x8000;

/// Mask extracting the neighbour box index from an overlap entry.
pub const OVERLAP_INDEX_MASK: u16 = 0x7fff;

// ---------------------------------------------------------------------------
// Sectors and rooms
// ---------------------------------------------------------------------------

/// One grid cell of a room.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    /// Start of this sector's floor-data chain; 0 means none.
    pub floor_data_index: usize,
    pub box_index: Option<BoxId>,
    pub room_below: Option<RoomId>,
    pub room_above: Option<RoomId>,
    /// Floor height in quarter-sector units (Y down).
    pub floor_height: i32,
    /// Ceiling height in quarter-sector units (Y down).
    pub ceiling_height: i32,
}

impl Sector {
    pub fn floor(&self) -> i32 {
        self.floor_height * QUARTER_SECTOR_SIZE
    }

    pub fn ceiling(&self) -> i32 {
        self.ceiling_height * QUARTER_SECTOR_SIZE
    }
}

/// A static mesh placed in a room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStaticMesh {
    pub mesh_id: u32,
    pub position: TrVec,
    pub rotation: Angle,
}

/// Collision description of a static mesh type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMeshDef {
    /// Collision box in mesh-local space (unrotated).
    pub collision_box: BoundingBox,
    pub do_not_collide: bool,
}

impl StaticMeshDef {
    /// World-space collision box for a placement.
    ///
    /// Rotation snaps to the nearest cardinal axis; placements in level data
    /// are always axis aligned.
    pub fn collision_box_at(&self, position: TrVec, rotation: Angle) -> BoundingBox {
        let b = self.collision_box;
        let (min_x, max_x, min_z, max_z) = match rotation.axis() {
            Axis::PosZ => (b.min.x, b.max.x, b.min.z, b.max.z),
            Axis::PosX => (b.min.z, b.max.z, -b.max.x, -b.min.x),
            Axis::NegZ => (-b.max.x, -b.min.x, -b.max.z, -b.min.z),
            Axis::NegX => (-b.max.z, -b.min.z, b.min.x, b.max.x),
        };
        BoundingBox::new(
            TrVec::new(min_x, b.min.y, min_z),
            TrVec::new(max_x, b.max.y, max_z),
        )
        .translated(position)
    }
}

/// A room: a rectangular grid of sectors plus its static scenery.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// World-space origin of sector (0, 0). Only X and Z are used.
    pub position: TrVec,
    pub sectors_x: u16,
    pub sectors_z: u16,
    /// Sector grid, indexed `z + x * sectors_z`.
    pub sectors: Vec<Sector>,
    pub static_meshes: Vec<RoomStaticMesh>,
}

impl Room {
    /// Flat index of grid cell (dx, dz), if inside the grid.
    pub fn sector_index(&self, dx: i32, dz: i32) -> Option<usize> {
        if dx < 0 || dz < 0 || dx >= i32::from(self.sectors_x) || dz >= i32::from(self.sectors_z) {
            return None;
        }
        Some(dz as usize + dx as usize * usize::from(self.sectors_z))
    }

    /// Sector containing an absolute position, if the room covers it.
    pub fn sector_at(&self, pos: TrVec) -> Option<usize> {
        self.sector_index(
            (pos.x - self.position.x) / SECTOR_SIZE,
            (pos.z - self.position.z) / SECTOR_SIZE,
        )
    }

    /// Grid cell nearest to (dx, dz), never a corner of the outer wall ring.
    ///
    /// Rows at the Z edges are clamped to the inner X range so a query just
    /// outside the room lands on a wall sector that can carry a portal.
    pub fn clamped_sector_index(&self, dx: i32, dz: i32) -> usize {
        let last_x = i32::from(self.sectors_x) - 1;
        let last_z = i32::from(self.sectors_z) - 1;
        let inner = |v: i32| v.min(last_x - 1).max(1).min(last_x).max(0);
        let (dx, dz) = if dz <= 0 {
            (inner(dx), 0)
        } else if dz >= last_z {
            (inner(dx), last_z)
        } else {
            (dx.min(last_x).max(0), dz)
        };
        dz as usize + dx as usize * usize::from(self.sectors_z)
    }

    /// World-space extents of the room footprint (Y unbounded).
    pub fn footprint(&self) -> (i32, i32, i32, i32) {
        (
            self.position.x,
            self.position.x + i32::from(self.sectors_x) * SECTOR_SIZE - 1,
            self.position.z,
            self.position.z + i32::from(self.sectors_z) * SECTOR_SIZE - 1,
        )
    }
}

// ---------------------------------------------------------------------------
// Navigation boxes
// ---------------------------------------------------------------------------

/// Zone tags for one room configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSet {
    /// Walkers that can only climb a quarter sector.
    pub ground1: u16,
    /// Walkers that can climb half a sector.
    pub ground2: u16,
    pub fly: u16,
}

/// Which zone tag applies to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    Ground1,
    Ground2,
    Fly,
}

impl ZoneKind {
    /// Flying agents use the fly zone; walkers pick by their step height.
    pub fn for_agent(fly: i32, step: i32) -> Self {
        if fly != 0 {
            Self::Fly
        } else if step == QUARTER_SECTOR_SIZE {
            Self::Ground1
        } else {
            Self::Ground2
        }
    }
}

/// A convex rectangular navigation cell. Extents are inclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavBox {
    pub xmin: i32,
    pub xmax: i32,
    pub zmin: i32,
    pub zmax: i32,
    pub floor: i32,
    pub overlap_index: usize,
    pub zones: ZoneSet,
    /// Zones used while the alternate room set is swapped in.
    pub alternate_zones: ZoneSet,
    /// Currently blocked by a movable obstacle.
    pub blocked: bool,
    /// Can become blocked (doors, pushable blocks).
    pub blockable: bool,
}

impl NavBox {
    pub fn contains(&self, x: i32, z: i32) -> bool {
        self.contains_x(x) && self.contains_z(z)
    }

    pub fn contains_x(&self, x: i32) -> bool {
        x >= self.xmin && x <= self.xmax
    }

    pub fn contains_z(&self, z: i32) -> bool {
        z >= self.zmin && z <= self.zmax
    }

    pub fn zone(&self, kind: ZoneKind, swapped: bool) -> u16 {
        let set = if swapped {
            &self.alternate_zones
        } else {
            &self.zones
        };
        match kind {
            ZoneKind::Ground1 => set.ground1,
            ZoneKind::Ground2 => set.ground2,
            ZoneKind::Fly => set.fly,
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The complete static level.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct World {
    pub rooms: Vec<Room>,
    pub boxes: Vec<NavBox>,
    pub overlaps: Vec<u16>,
    pub floor_data: Vec<u16>,
    pub static_meshes: BTreeMap<u32, StaticMeshDef>,
    /// Alternate room set active (selects `NavBox::alternate_zones`).
    pub rooms_swapped: bool,
    /// Item controllers referenced by trigger actions. Registered by the
    /// host after loading.
    #[serde(skip)]
    pub items: ItemRegistry,
}

impl World {
    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id.index()]
    }

    pub fn sector(&self, s: SectorRef) -> &Sector {
        &self.rooms[s.room.index()].sectors[s.index]
    }

    pub fn nav_box(&self, id: BoxId) -> &NavBox {
        &self.boxes[id.index()]
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    /// Raw overlap entries of a box, including the terminating entry.
    pub fn overlap_entries(&self, id: BoxId) -> &[u16] {
        let first = self.nav_box(id).overlap_index;
        let tail = &self.overlaps[first..];
        let len = tail
            .iter()
            .position(|&e| e & OVERLAP_LAST != 0)
            .map_or(tail.len(), |i| i + 1);
        &tail[..len]
    }

    /// Neighbour boxes of a box in table order.
    pub fn overlaps_of(&self, id: BoxId) -> impl Iterator<Item = BoxId> + '_ {
        self.overlap_entries(id)
            .iter()
            .map(|&e| BoxId(e & OVERLAP_INDEX_MASK))
    }

    /// Sector of `room` containing `pos`. Panics if the room does not cover
    /// the position: stacked-room links must always land inside the target.
    fn sector_in(&self, room: RoomId, pos: TrVec) -> SectorRef {
        let index = self.room(room).sector_at(pos).unwrap_or_else(|| {
            panic!("{room} does not cover {pos} (broken room link)");
        });
        SectorRef { room, index }
    }

    /// Room a sector's portal chunk leads to, if any.
    pub fn portal_target(&self, sector: &Sector) -> Option<RoomId> {
        Chunks::new(&self.floor_data, sector.floor_data_index).find_map(|c| match c.chunk {
            Chunk::Portal { target } => Some(RoomId(target)),
            _ => None,
        })
    }

    /// Follow `room_below` links down to the bottom-most sector at `pos`.
    pub fn bottom_sector(&self, mut s: SectorRef, pos: TrVec) -> SectorRef {
        while let Some(below) = self.sector(s).room_below {
            s = self.sector_in(below, pos);
        }
        s
    }

    /// Follow `room_above` links up to the top-most sector at `pos`.
    pub fn top_sector(&self, mut s: SectorRef, pos: TrVec) -> SectorRef {
        while let Some(above) = self.sector(s).room_above {
            s = self.sector_in(above, pos);
        }
        s
    }

    /// Follow portals sideways from `room`, starting from the clamped grid
    /// cell under `pos`. Updates `room` to the room finally reached.
    fn follow_portals(&self, pos: TrVec, room: &mut RoomId) -> SectorRef {
        for _ in 0..=self.rooms.len() {
            let r = self.room(*room);
            let index = r.clamped_sector_index(
                (pos.x - r.position.x) / SECTOR_SIZE,
                (pos.z - r.position.z) / SECTOR_SIZE,
            );
            match self.portal_target(&r.sectors[index]) {
                Some(next) => *room = next,
                None => {
                    return SectorRef {
                        room: *room,
                        index,
                    };
                }
            }
        }
        panic!("portal cycle reached from {room} at {pos}");
    }

    /// Find the sector whose vertical span holds `pos`, following portals
    /// and stacked rooms. `room` is the search start and is updated to the
    /// room the sector belongs to.
    pub fn find_real_floor_sector(&self, pos: TrVec, room: &mut RoomId) -> SectorRef {
        let mut s = self.follow_portals(pos, room);

        if self.sector(s).floor() > pos.y {
            while self.sector(s).ceiling() >= pos.y {
                let Some(above) = self.sector(s).room_above else {
                    break;
                };
                *room = above;
                s = self.sector_in(above, pos);
            }
        } else {
            while self.sector(s).floor() <= pos.y {
                let Some(below) = self.sector(s).room_below else {
                    break;
                };
                *room = below;
                s = self.sector_in(below, pos);
            }
        }
        s
    }

    /// Room containing `pos`, starting the search from `room`.
    ///
    /// Same walk as `find_real_floor_sector`, except a point exactly at a
    /// ceiling stays in the lower room.
    pub fn find_room_for_position(&self, pos: TrVec, room: RoomId) -> RoomId {
        let mut room = room;
        let mut s = self.follow_portals(pos, &mut room);

        if self.sector(s).floor() > pos.y {
            while self.sector(s).ceiling() > pos.y {
                let Some(above) = self.sector(s).room_above else {
                    break;
                };
                room = above;
                s = self.sector_in(above, pos);
            }
        } else {
            while self.sector(s).floor() <= pos.y {
                let Some(below) = self.sector(s).room_below else {
                    break;
                };
                room = below;
                s = self.sector_in(below, pos);
            }
        }
        room
    }

    /// Navigation box under `pos`, if the sector belongs to one.
    pub fn find_box(&self, pos: TrVec, room: &mut RoomId) -> Option<BoxId> {
        let s = self.find_real_floor_sector(pos, room);
        self.sector(s).box_index
    }

    /// Check every structural invariant the per-tick queries rely on.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.rooms.len() > usize::from(u16::MAX) {
            return Err(WorldError::TooMany {
                what: "rooms",
                count: self.rooms.len(),
            });
        }
        if self.boxes.len() > usize::from(OVERLAP_INDEX_MASK) + 1 {
            return Err(WorldError::TooMany {
                what: "boxes",
                count: self.boxes.len(),
            });
        }

        for (ri, room) in self.rooms.iter().enumerate() {
            let room_id = RoomId(ri as u16);
            if room.sectors.is_empty() {
                return Err(WorldError::EmptyRoom { room: room_id });
            }
            let expected = usize::from(room.sectors_x) * usize::from(room.sectors_z);
            if expected != room.sectors.len() {
                return Err(WorldError::SectorCountMismatch {
                    room: room_id,
                    expected,
                    actual: room.sectors.len(),
                });
            }
            for (si, sector) in room.sectors.iter().enumerate() {
                for link in [sector.room_below, sector.room_above].into_iter().flatten() {
                    if link.index() >= self.rooms.len() {
                        return Err(WorldError::RoomLinkOutOfRange {
                            room: room_id,
                            sector: si,
                            target: link.0,
                        });
                    }
                }
                if let Some(b) = sector.box_index {
                    if b.index() >= self.boxes.len() {
                        return Err(WorldError::SectorBoxOutOfRange {
                            room: room_id,
                            sector: si,
                            target: b.0,
                            count: self.boxes.len(),
                        });
                    }
                }
                let fd = sector.floor_data_index;
                if fd >= self.floor_data.len() && fd != 0 {
                    return Err(WorldError::FloorDataOutOfRange {
                        room: room_id,
                        sector: si,
                        index: fd,
                        len: self.floor_data.len(),
                    });
                }
                let mut chunks = Chunks::new(&self.floor_data, fd);
                for entry in chunks.by_ref() {
                    if let Chunk::Portal { target } = entry.chunk {
                        if usize::from(target) >= self.rooms.len() {
                            return Err(WorldError::RoomLinkOutOfRange {
                                room: room_id,
                                sector: si,
                                target,
                            });
                        }
                    }
                }
                if chunks.malformed() {
                    return Err(WorldError::UnterminatedFloorData { start: fd });
                }
            }
            for placed in &room.static_meshes {
                if !self.static_meshes.contains_key(&placed.mesh_id) {
                    return Err(WorldError::UnknownStaticMesh {
                        room: room_id,
                        mesh_id: placed.mesh_id,
                    });
                }
            }
        }

        for (bi, nav_box) in self.boxes.iter().enumerate() {
            let box_id = BoxId(bi as u16);
            if nav_box.xmin > nav_box.xmax || nav_box.zmin > nav_box.zmax {
                return Err(WorldError::InvertedBox { box_id });
            }
            if nav_box.overlap_index >= self.overlaps.len() {
                return Err(WorldError::OverlapIndexOutOfRange {
                    box_id,
                    index: nav_box.overlap_index,
                    len: self.overlaps.len(),
                });
            }
            let entries = self.overlap_entries(box_id);
            if entries.last().is_none_or(|&e| e & OVERLAP_LAST == 0) {
                return Err(WorldError::UnterminatedOverlaps { box_id });
            }
            for &e in entries {
                let target = e & OVERLAP_INDEX_MASK;
                if usize::from(target) >= self.boxes.len() {
                    return Err(WorldError::OverlapTargetOutOfRange {
                        box_id,
                        target,
                        count: self.boxes.len(),
                    });
                }
            }
            if entries.iter().all(|&e| e & OVERLAP_INDEX_MASK == box_id.0) {
                log::warn!("{box_id} has no neighbours; agents cannot path through it");
            }
        }

        Ok(())
    }

    /// Parse a world from JSON and validate it. Item controllers must be
    /// registered afterwards.
    pub fn from_json(json: &str) -> Result<Self, crate::error::LoadError> {
        let world: World = serde_json::from_str(json)?;
        world.validate()?;
        log::debug!(
            "loaded world: {} rooms, {} boxes, {} overlap entries",
            world.rooms.len(),
            world.boxes.len(),
            world.overlaps.len()
        );
        Ok(world)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{RoomSpec, WorldBuilder};
    use crate::floordata::FloorDataProgram;

    fn two_story() -> (World, RoomId, RoomId) {
        // Lower room floor at 0, ceiling at -2048; upper room stacked on top.
        let mut b = WorldBuilder::new();
        let lower = b.room(RoomSpec::flat(TrVec::new(0, 0, 0), 4, 4, 0, -8));
        let upper = b.room(RoomSpec::flat(TrVec::new(0, 0, 0), 4, 4, -8, -16));
        for x in 1..3 {
            for z in 1..3 {
                b.sector_mut(lower, x, z).room_above = Some(upper);
                b.sector_mut(upper, x, z).room_below = Some(lower);
            }
        }
        (b.build().unwrap(), lower, upper)
    }

    #[test]
    fn sector_grid_indexing() {
        let room = Room {
            position: TrVec::new(2048, 0, 1024),
            sectors_x: 3,
            sectors_z: 2,
            sectors: vec![Sector::default(); 6],
            static_meshes: Vec::new(),
        };
        assert_eq!(room.sector_index(0, 0), Some(0));
        assert_eq!(room.sector_index(1, 1), Some(3));
        assert_eq!(room.sector_index(3, 0), None);
        assert_eq!(room.sector_at(TrVec::new(2048 + 1500, 0, 1024 + 10)), Some(2));
        assert_eq!(room.sector_at(TrVec::new(0, 0, 0)), None);
    }

    #[test]
    fn clamped_index_stays_off_corners() {
        let room = Room {
            position: TrVec::ZERO,
            sectors_x: 4,
            sectors_z: 4,
            sectors: vec![Sector::default(); 16],
            static_meshes: Vec::new(),
        };
        // Beyond the -Z edge and the -X edge: X is pulled in to column 1.
        assert_eq!(room.clamped_sector_index(-5, -5), 4);
        // Interior row, X beyond the +X edge.
        assert_eq!(room.clamped_sector_index(9, 2), 2 + 3 * 4);
    }

    #[test]
    fn rotated_collision_boxes() {
        let def = StaticMeshDef {
            collision_box: BoundingBox::new(TrVec::new(-100, -200, -50), TrVec::new(300, 0, 50)),
            do_not_collide: false,
        };
        let at = TrVec::new(1000, 0, 1000);
        let plain = def.collision_box_at(at, Axis::PosZ.angle());
        assert_eq!(plain.min, TrVec::new(900, -200, 950));
        assert_eq!(plain.max, TrVec::new(1300, 0, 1050));

        let quarter = def.collision_box_at(at, Axis::PosX.angle());
        assert_eq!(quarter.min, TrVec::new(950, -200, 700));
        assert_eq!(quarter.max, TrVec::new(1050, 0, 1100));

        let half = def.collision_box_at(at, Axis::NegZ.angle());
        assert_eq!(half.min, TrVec::new(700, -200, 950));
        assert_eq!(half.max, TrVec::new(1100, 0, 1050));
    }

    #[test]
    fn find_real_floor_sector_walks_up_stacked_rooms() {
        let (world, lower, upper) = two_story();
        let mut room = lower;
        // Point above the lower ceiling (Y down: -3000 is higher than -2048).
        let s = world.find_real_floor_sector(TrVec::new(1500, -3000, 1500), &mut room);
        assert_eq!(room, upper);
        assert_eq!(s.room, upper);

        let mut room = upper;
        let s = world.find_real_floor_sector(TrVec::new(1500, -100, 1500), &mut room);
        assert_eq!(room, lower);
        assert_eq!(s.room, lower);
    }

    #[test]
    fn find_real_floor_sector_follows_portals() {
        let mut b = WorldBuilder::new();
        let west = b.room(RoomSpec::flat(TrVec::new(0, 0, 0), 3, 3, 0, -8));
        let east = b.room(RoomSpec::flat(TrVec::new(3 * 1024, 0, 0), 3, 3, 0, -8));
        let portal = b.floor_data(FloorDataProgram::new().portal(east.0).finish());
        b.sector_mut(west, 2, 1).floor_data_index = portal;
        let world = b.build().unwrap();

        let mut room = west;
        let pos = TrVec::new(3 * 1024 + 1500, -10, 1500);
        let s = world.find_real_floor_sector(pos, &mut room);
        assert_eq!(room, east);
        assert_eq!(
            s,
            SectorRef {
                room: east,
                index: 1 + 3,
            }
        );
        assert_eq!(world.find_room_for_position(pos, west), east);
    }

    #[test]
    fn bottom_and_top_sector() {
        let (world, lower, upper) = two_story();
        let pos = TrVec::new(1500, 0, 1500);
        let top = SectorRef {
            room: upper,
            index: world.room(upper).sector_at(pos).unwrap(),
        };
        let bottom = world.bottom_sector(top, pos);
        assert_eq!(bottom.room, lower);
        assert_eq!(world.top_sector(bottom, pos).room, upper);
    }

    #[test]
    fn overlap_entries_stop_at_last_bit() {
        let world = World {
            boxes: vec![
                NavBox {
                    overlap_index: 0,
                    xmax: 10,
                    zmax: 10,
                    ..Default::default()
                },
                NavBox {
                    overlap_index: 2,
                    xmax: 10,
                    zmax: 10,
                    ..Default::default()
                },
                NavBox {
                    overlap_index: 3,
                    xmax: 10,
                    zmax: 10,
                    ..Default::default()
                },
            ],
            overlaps: vec![1, 2 | OVERLAP_LAST, OVERLAP_LAST, OVERLAP_LAST],
            ..Default::default()
        };
        let n: Vec<_> = world.overlaps_of(BoxId(0)).collect();
        assert_eq!(n, vec![BoxId(1), BoxId(2)]);
        assert_eq!(world.overlaps_of(BoxId(1)).collect::<Vec<_>>(), vec![BoxId(0)]);
        assert!(world.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unterminated_overlaps() {
        let world = World {
            boxes: vec![NavBox {
                overlap_index: 0,
                ..Default::default()
            }],
            overlaps: vec![0],
            ..Default::default()
        };
        assert_eq!(
            world.validate(),
            Err(WorldError::UnterminatedOverlaps { box_id: BoxId(0) })
        );
    }

    #[test]
    fn validate_rejects_bad_room_link() {
        let mut b = WorldBuilder::new();
        let r = b.room(RoomSpec::flat(TrVec::ZERO, 2, 2, 0, -8));
        b.sector_mut(r, 0, 0).room_below = Some(RoomId(9));
        assert!(matches!(
            b.build(),
            Err(WorldError::RoomLinkOutOfRange { target: 9, .. })
        ));
    }

    #[test]
    fn validate_rejects_portal_to_missing_room() {
        let mut b = WorldBuilder::new();
        let r = b.room(RoomSpec::flat(TrVec::ZERO, 2, 2, 0, -8));
        b.program(r, 1, 1, FloorDataProgram::new().floor_slant(1, 0).portal(7));
        assert!(matches!(
            b.build(),
            Err(WorldError::RoomLinkOutOfRange { target: 7, .. })
        ));
    }

    #[test]
    fn validate_rejects_unknown_static_mesh() {
        let mut b = WorldBuilder::new();
        let r = b.room(RoomSpec::flat(TrVec::ZERO, 2, 2, 0, -8));
        b.place_static_mesh(
            r,
            RoomStaticMesh {
                mesh_id: 4,
                position: TrVec::ZERO,
                rotation: Angle(0),
            },
        );
        assert_eq!(
            b.build().unwrap_err(),
            WorldError::UnknownStaticMesh {
                room: r,
                mesh_id: 4
            }
        );
    }

    #[test]
    fn zone_selection() {
        assert_eq!(ZoneKind::for_agent(1, 256), ZoneKind::Fly);
        assert_eq!(ZoneKind::for_agent(0, 256), ZoneKind::Ground1);
        assert_eq!(ZoneKind::for_agent(0, 512), ZoneKind::Ground2);
        let b = NavBox {
            zones: ZoneSet {
                ground1: 1,
                ground2: 2,
                fly: 3,
            },
            alternate_zones: ZoneSet {
                ground1: 4,
                ground2: 5,
                fly: 6,
            },
            ..Default::default()
        };
        assert_eq!(b.zone(ZoneKind::Ground2, false), 2);
        assert_eq!(b.zone(ZoneKind::Fly, true), 6);
    }

    #[test]
    fn json_roundtrip_validates() {
        let (world, _, _) = two_story();
        let json = world.to_json().unwrap();
        let restored = World::from_json(&json).unwrap();
        assert_eq!(restored.rooms, world.rooms);
        assert_eq!(restored.boxes, world.boxes);
    }
}
