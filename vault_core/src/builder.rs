// Programmatic world construction.
//
// `WorldBuilder` assembles a `World` the way a level converter would: rooms
// with flat sector grids, floor-data chains appended to one shared table,
// navigation boxes with symmetric or one-way links, static mesh definitions
// and placements, item controllers. `build()` lays out the overlap table
// (one terminated run per box, in link insertion order) and validates the
// result.
//
// Used by tests, benches and hosts that generate levels procedurally; real
// level files are converted by an external loader and go through
// `World::validate` directly.

use crate::error::WorldError;
use crate::floordata::FloorDataProgram;
use crate::items::{FloorPatcher, ItemRegistry};
use crate::types::{BoxId, HEIGHT_LIMIT, QUARTER_SECTOR_SIZE, RoomId, SECTOR_SIZE, TrVec};
use crate::world::{
    NavBox, OVERLAP_LAST, Room, RoomStaticMesh, Sector, StaticMeshDef, World, ZoneSet,
};
use std::collections::BTreeMap;

/// Shape of a new room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomSpec {
    pub position: TrVec,
    pub sectors_x: u16,
    pub sectors_z: u16,
    /// Floor height of every sector, quarter-sector units.
    pub floor: i32,
    /// Ceiling height of every sector, quarter-sector units.
    pub ceiling: i32,
}

impl RoomSpec {
    pub fn flat(position: TrVec, sectors_x: u16, sectors_z: u16, floor: i32, ceiling: i32) -> Self {
        Self {
            position,
            sectors_x,
            sectors_z,
            floor,
            ceiling,
        }
    }
}

#[derive(Debug, Default)]
pub struct WorldBuilder {
    rooms: Vec<Room>,
    boxes: Vec<NavBox>,
    links: Vec<Vec<BoxId>>,
    floor_data: Vec<u16>,
    static_meshes: BTreeMap<u32, StaticMeshDef>,
    items: ItemRegistry,
    rooms_swapped: bool,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            // Index 0 means "no floor data".
            floor_data: vec![0],
            ..Default::default()
        }
    }

    pub fn room(&mut self, spec: RoomSpec) -> RoomId {
        let id = RoomId(self.rooms.len() as u16);
        let sector = Sector {
            floor_height: spec.floor,
            ceiling_height: spec.ceiling,
            ..Default::default()
        };
        let count = usize::from(spec.sectors_x) * usize::from(spec.sectors_z);
        self.rooms.push(Room {
            position: spec.position,
            sectors_x: spec.sectors_x,
            sectors_z: spec.sectors_z,
            sectors: vec![sector; count],
            static_meshes: Vec::new(),
        });
        id
    }

    /// Grid cell (x, z) of a room. Panics outside the grid.
    pub fn sector_mut(&mut self, room: RoomId, x: i32, z: i32) -> &mut Sector {
        let r = &mut self.rooms[room.index()];
        let index = r
            .sector_index(x, z)
            .unwrap_or_else(|| panic!("({x}, {z}) is outside {room}"));
        &mut r.sectors[index]
    }

    /// Turn a sector into solid wall (no floor).
    pub fn wall(&mut self, room: RoomId, x: i32, z: i32) {
        let s = self.sector_mut(room, x, z);
        s.floor_height = -HEIGHT_LIMIT / QUARTER_SECTOR_SIZE;
        s.ceiling_height = -HEIGHT_LIMIT / QUARTER_SECTOR_SIZE;
        s.box_index = None;
    }

    /// Append a floor-data chain and return its start index (0 if empty).
    pub fn floor_data(&mut self, words: Vec<u16>) -> usize {
        if words.is_empty() {
            return 0;
        }
        let start = self.floor_data.len();
        self.floor_data.extend(words);
        start
    }

    /// Append a program to a sector's floor data.
    pub fn program(&mut self, room: RoomId, x: i32, z: i32, program: FloorDataProgram) {
        let start = self.floor_data(program.finish());
        self.sector_mut(room, x, z).floor_data_index = start;
    }

    /// Add a box with the given inclusive extents and floor, zone 0.
    pub fn nav_box(&mut self, xmin: i32, xmax: i32, zmin: i32, zmax: i32, floor: i32) -> BoxId {
        let id = BoxId(self.boxes.len() as u16);
        self.boxes.push(NavBox {
            xmin,
            xmax,
            zmin,
            zmax,
            floor,
            ..Default::default()
        });
        self.links.push(Vec::new());
        id
    }

    pub fn box_mut(&mut self, id: BoxId) -> &mut NavBox {
        &mut self.boxes[id.index()]
    }

    /// Set all zone tags of a box (both room sets).
    pub fn zone(&mut self, id: BoxId, zone: u16) {
        let set = ZoneSet {
            ground1: zone,
            ground2: zone,
            fly: zone,
        };
        let b = self.box_mut(id);
        b.zones = set;
        b.alternate_zones = set;
    }

    /// Make `b` a neighbour of `a` and vice versa.
    pub fn link(&mut self, a: BoxId, b: BoxId) {
        self.link_one_way(a, b);
        self.link_one_way(b, a);
    }

    pub fn link_one_way(&mut self, from: BoxId, to: BoxId) {
        let list = &mut self.links[from.index()];
        if !list.contains(&to) {
            list.push(to);
        }
    }

    /// Assign `id` to every sector of `room` whose center lies in the box.
    pub fn cover(&mut self, room: RoomId, id: BoxId) {
        let b = self.boxes[id.index()].clone();
        let r = &mut self.rooms[room.index()];
        let (origin, sectors_z) = (r.position, i32::from(r.sectors_z));
        for (i, sector) in r.sectors.iter_mut().enumerate() {
            let i = i as i32;
            let cx = origin.x + (i / sectors_z) * SECTOR_SIZE + SECTOR_SIZE / 2;
            let cz = origin.z + (i % sectors_z) * SECTOR_SIZE + SECTOR_SIZE / 2;
            if b.contains(cx, cz) {
                sector.box_index = Some(id);
            }
        }
    }

    pub fn static_mesh(&mut self, mesh_id: u32, def: StaticMeshDef) {
        self.static_meshes.insert(mesh_id, def);
    }

    pub fn place_static_mesh(&mut self, room: RoomId, mesh: RoomStaticMesh) {
        self.rooms[room.index()].static_meshes.push(mesh);
    }

    pub fn item(&mut self, index: u16, item: impl FloorPatcher + 'static) {
        self.items.insert(index, item);
    }

    pub fn rooms_swapped(&mut self, swapped: bool) {
        self.rooms_swapped = swapped;
    }

    pub fn build(self) -> Result<World, WorldError> {
        let mut boxes = self.boxes;
        let mut overlaps = Vec::new();
        for (i, (b, links)) in boxes.iter_mut().zip(&self.links).enumerate() {
            b.overlap_index = overlaps.len();
            if links.is_empty() {
                // Isolated box: a lone self entry, skipped by the search.
                overlaps.push(i as u16 | OVERLAP_LAST);
                continue;
            }
            overlaps.extend(links.iter().map(|l| l.0));
            if let Some(last) = overlaps.last_mut() {
                *last |= OVERLAP_LAST;
            }
        }

        let world = World {
            rooms: self.rooms,
            boxes,
            overlaps,
            floor_data: self.floor_data,
            static_meshes: self.static_meshes,
            rooms_swapped: self.rooms_swapped,
            items: self.items,
        };
        world.validate()?;
        Ok(world)
    }
}
