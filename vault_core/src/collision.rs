// Axis-aligned capsule collision against room geometry and static meshes.
//
// `CollisionInfo` is filled once per tick for the controlled character. The
// caller sets the inputs (facing, radius, policy, previous position and the
// acceptable floor band) and calls `init_height_info` with the new position.
// The resolver:
//
// 1. Snaps the facing to a cardinal axis and places three forward probes at
//    capsule radius: front (sideways component from the exact facing),
//    front-left and front-right (diagonals).
// 2. Lifts a reference point above the capsule and measures floor and
//    ceiling at the mid point and every probe, relative to the character.
//    Sector lookup carries the room from probe to probe.
// 3. Reinterprets forward probes per `CollisionPolicy`: steep rising slopes
//    become walls, steep falling slopes and death floors become pit edges.
// 4. Tests static meshes of all rooms the capsule touches. The first hit
//    sets a shift and a classification depending on the facing axis.
// 5. Runs the vertical checks in fixed priority: off-world, crushed,
//    ceiling bump (does not end the checks), front, front ceiling, left,
//    right. Front/left/right slide along the wall up to the next sector
//    seam (`reflect_at_sector_boundary`) instead of stopping dead.
//
// The result is a `shift` to add to the pending position and an
// `AxisCollision` classification for the movement state machine.
//
// See also: `height.rs` for the floor/ceiling queries, `world.rs` for
// sector lookup and static mesh definitions, `config.rs` for the
// `CollisionConfig` defaults.
//
// **Critical constraint: determinism.** Probe offsets use `sin`/`cos` of the
// facing angle only for the sideways front component, truncated to integer
// immediately. Everything else is integer arithmetic.

use crate::config::CoreConfig;
use crate::height::{HeightInfo, HeightPolicy, SlantClass, floor_slant_info};
use crate::types::{
    Angle, Axis, BoundingBox, NO_FLOOR, QUARTER_SECTOR_SIZE, RoomId, SECTOR_SIZE, SectorRef, TrVec,
};
use crate::world::World;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Floor value forced onto a probe that hits a slope treated as a wall.
pub const SLOPE_WALL_FLOOR: i32 = -32767;

/// Floor value forced onto a probe that hits a pit edge.
pub const PIT_FLOOR: i32 = 2 * QUARTER_SECTOR_SIZE;

/// Game rules for reinterpreting forward probe floors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionPolicy {
    pub slopes_are_walls: bool,
    pub slopes_are_pits: bool,
    pub lava_is_pit: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisCollision {
    #[default]
    None,
    Front,
    Top,
    Left,
    Right,
    TopFront,
    TopBottom,
}

/// Floor and ceiling at one probe, relative to the character.
///
/// Floor is relative to the feet (positive = below), ceiling relative to the
/// head. A sector without floor keeps the `NO_FLOOR` marker unadjusted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerticalInfo {
    pub floor: HeightInfo,
    pub ceiling: HeightInfo,
}

impl VerticalInfo {
    pub fn init(
        world: &World,
        sector: SectorRef,
        pos: TrVec,
        policy: &HeightPolicy,
        current_y: i32,
        height: i32,
    ) -> Self {
        let mut floor = HeightInfo::from_floor(world, sector, pos, policy);
        if floor.distance != NO_FLOOR {
            floor.distance -= current_y;
        }
        let mut ceiling = HeightInfo::from_ceiling(world, sector, pos, policy);
        if ceiling.distance != NO_FLOOR {
            ceiling.distance -= current_y - height;
        }
        Self { floor, ceiling }
    }
}

/// Correction along one axis that slides `target` back to the seam of the
/// sector `current` is in. Zero when both lie in the same sector.
pub fn reflect_at_sector_boundary(target: i32, current: i32) -> i32 {
    let target_sector = target / SECTOR_SIZE;
    let current_sector = current / SECTOR_SIZE;
    if target_sector == current_sector {
        return 0;
    }
    let local = target % SECTOR_SIZE;
    if current_sector <= target_sector {
        -(local + 1)
    } else {
        SECTOR_SIZE - local - 1
    }
}

/// Per-tick collision state of one character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollisionInfo {
    // Inputs.
    pub facing_angle: Angle,
    pub collision_radius: i32,
    pub policy: CollisionPolicy,
    pub old_position: TrVec,
    pub bad_positive_distance: i32,
    pub bad_negative_distance: i32,
    pub bad_ceiling_distance: i32,
    pub height_policy: HeightPolicy,
    pub scalp_to_hands_height: i32,
    pub room_probe_margin: i32,

    // Outputs.
    pub facing_axis: Axis,
    pub mid: VerticalInfo,
    pub front: VerticalInfo,
    pub front_left: VerticalInfo,
    pub front_right: VerticalInfo,
    pub shift: TrVec,
    pub collision_type: AxisCollision,
    pub floor_slant_x: i8,
    pub floor_slant_z: i8,
    pub has_static_mesh_collision: bool,
}

/// Horizontal offsets of the three forward probes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ProbeOffsets {
    front: (i32, i32),
    front_left: (i32, i32),
    front_right: (i32, i32),
}

impl CollisionInfo {
    pub fn new(config: &CoreConfig) -> Self {
        let c = &config.collision;
        Self {
            facing_angle: Angle(0),
            collision_radius: 0,
            policy: c.policy.clone(),
            old_position: TrVec::ZERO,
            bad_positive_distance: c.bad_positive_distance,
            bad_negative_distance: c.bad_negative_distance,
            bad_ceiling_distance: c.bad_ceiling_distance,
            height_policy: config.height.clone(),
            scalp_to_hands_height: c.scalp_to_hands_height,
            room_probe_margin: c.room_probe_margin,
            facing_axis: Axis::PosZ,
            mid: VerticalInfo::default(),
            front: VerticalInfo::default(),
            front_left: VerticalInfo::default(),
            front_right: VerticalInfo::default(),
            shift: TrVec::ZERO,
            collision_type: AxisCollision::None,
            floor_slant_x: 0,
            floor_slant_z: 0,
            has_static_mesh_collision: false,
        }
    }

    fn probe_offsets(&self) -> ProbeOffsets {
        let r = self.collision_radius;
        let side = |f: f64| (f * f64::from(r)) as i32;
        match self.facing_axis {
            Axis::PosZ => ProbeOffsets {
                front: (side(self.facing_angle.sin()), r),
                front_left: (-r, r),
                front_right: (r, r),
            },
            Axis::PosX => ProbeOffsets {
                front: (r, side(self.facing_angle.cos())),
                front_left: (r, r),
                front_right: (r, -r),
            },
            Axis::NegZ => ProbeOffsets {
                front: (side(self.facing_angle.sin()), -r),
                front_left: (r, -r),
                front_right: (-r, -r),
            },
            Axis::NegX => ProbeOffsets {
                front: (-r, side(self.facing_angle.cos())),
                front_left: (-r, -r),
                front_right: (-r, r),
            },
        }
    }

    /// Apply the slope and pit rules to a forward probe.
    fn reinterpret(&self, world: &World, probe: &mut VerticalInfo) {
        let floor = &mut probe.floor;
        let steep = floor.slant_class == SlantClass::Steep;
        if self.policy.slopes_are_walls && steep && floor.distance < 0 {
            floor.distance = SLOPE_WALL_FLOOR;
        } else if floor.distance > 0
            && ((self.policy.slopes_are_pits && steep)
                || (self.policy.lava_is_pit && floor.is_death(world)))
        {
            floor.distance = PIT_FLOOR;
        }
    }

    fn outside_floor_band(&self, probe: &VerticalInfo) -> bool {
        probe.floor.distance > self.bad_positive_distance
            || probe.floor.distance < self.bad_negative_distance
    }

    /// Resolve the capsule at `position` (feet) in `room`.
    pub fn init_height_info(&mut self, world: &World, room: RoomId, position: TrVec, height: i32) {
        self.collision_type = AxisCollision::None;
        self.shift = TrVec::ZERO;
        self.facing_axis = self.facing_angle.axis();

        let mut probe_room = room;
        let reference = position - TrVec::new(0, height + self.scalp_to_hands_height, 0);
        let current = world.find_real_floor_sector(reference, &mut probe_room);
        self.mid = VerticalInfo::init(
            world,
            current,
            reference,
            &self.height_policy,
            position.y,
            height,
        );
        (self.floor_slant_x, self.floor_slant_z) = floor_slant_info(world, current, position);

        let offsets = self.probe_offsets();
        let mut probe = |(dx, dz): (i32, i32)| {
            let p = reference + TrVec::new(dx, 0, dz);
            let sector = world.find_real_floor_sector(p, &mut probe_room);
            let mut info =
                VerticalInfo::init(world, sector, p, &self.height_policy, position.y, height);
            self.reinterpret(world, &mut info);
            info
        };
        let front = probe(offsets.front);
        let front_left = probe(offsets.front_left);
        let front_right = probe(offsets.front_right);
        self.front = front;
        self.front_left = front_left;
        self.front_right = front_right;

        self.check_static_mesh_collisions(world, room, position, height);

        let (front_x, front_z) = offsets.front;

        if self.mid.floor.distance == NO_FLOOR {
            self.shift = self.old_position - position;
            self.collision_type = AxisCollision::Front;
            log::trace!("off the world at {position}");
            return;
        }

        if self.mid.floor.distance <= self.mid.ceiling.distance {
            self.collision_type = AxisCollision::TopFront;
            self.shift = self.old_position - position;
            log::trace!("crushed at {position}");
            return;
        }

        if self.mid.ceiling.distance >= 0 {
            self.collision_type = AxisCollision::Top;
            self.shift.y = self.mid.ceiling.distance;
        }

        if self.outside_floor_band(&self.front)
            || self.front.ceiling.distance > self.bad_ceiling_distance
        {
            self.collision_type = AxisCollision::Front;
            if self.facing_axis.is_z() {
                self.shift.x = self.old_position.x - position.x;
                self.shift.z = reflect_at_sector_boundary(front_z + position.z, position.z);
            } else {
                self.shift.x = reflect_at_sector_boundary(front_x + position.x, position.x);
                self.shift.z = self.old_position.z - position.z;
            }
            log::trace!("front collision, shift {}", self.shift);
            return;
        }

        if self.front.ceiling.distance >= self.bad_ceiling_distance {
            self.collision_type = AxisCollision::TopBottom;
            self.shift = self.old_position - position;
            return;
        }

        let side = if self.outside_floor_band(&self.front_left) {
            Some((AxisCollision::Left, offsets.front_left))
        } else if self.outside_floor_band(&self.front_right) {
            Some((AxisCollision::Right, offsets.front_right))
        } else {
            None
        };
        if let Some((collision, (side_x, side_z))) = side {
            self.collision_type = collision;
            if self.facing_axis.is_z() {
                self.shift.x =
                    reflect_at_sector_boundary(side_x + position.x, front_x + position.x);
            } else {
                self.shift.z =
                    reflect_at_sector_boundary(side_z + position.z, front_z + position.z);
            }
            log::trace!("{collision:?} collision, shift {}", self.shift);
        }
    }

    /// Rooms the capsule (grown by `radius`/`height`) may overlap, in room
    /// order without duplicates.
    pub fn collect_touching_rooms(
        world: &World,
        room: RoomId,
        position: TrVec,
        radius: i32,
        height: i32,
    ) -> SmallVec<[RoomId; 9]> {
        let mut rooms = SmallVec::<[RoomId; 9]>::new();
        rooms.push(room);
        for dy in [0, -height] {
            for (dx, dz) in [
                (radius, radius),
                (-radius, radius),
                (radius, -radius),
                (-radius, -radius),
            ] {
                rooms.push(world.find_room_for_position(position + TrVec::new(dx, dy, dz), room));
            }
        }
        rooms.sort_unstable();
        rooms.dedup();
        rooms
    }

    /// Test static meshes near the capsule. The first hit sets `shift` and
    /// `collision_type`; returns whether anything was hit.
    pub fn check_static_mesh_collisions(
        &mut self,
        world: &World,
        room: RoomId,
        position: TrVec,
        height: i32,
    ) -> bool {
        let r = self.collision_radius;
        let rooms = Self::collect_touching_rooms(
            world,
            room,
            position,
            r + self.room_probe_margin,
            height + self.room_probe_margin,
        );
        let capsule = BoundingBox::new(
            TrVec::new(position.x - r, position.y - height, position.z - r),
            TrVec::new(position.x + r, position.y, position.z + r),
        );

        self.has_static_mesh_collision = false;

        for &room_id in &rooms {
            for placed in &world.room(room_id).static_meshes {
                let Some(def) = world.static_meshes.get(&placed.mesh_id) else {
                    panic!("static mesh {} in {room_id} is not defined", placed.mesh_id);
                };
                if def.do_not_collide {
                    continue;
                }
                let mesh = def.collision_box_at(placed.position, placed.rotation);
                if !mesh.intersects(&capsule) {
                    continue;
                }

                let dx = penetration(capsule.max.x - mesh.min.x, mesh.max.x - capsule.min.x);
                let dz = penetration(capsule.max.z - mesh.min.z, mesh.max.z - capsule.min.z);
                self.resolve_mesh_hit(dx, dz, position);
                self.has_static_mesh_collision = true;
                log::trace!(
                    "static mesh {} hit: {:?}, shift {}",
                    placed.mesh_id,
                    self.collision_type,
                    self.shift
                );
                return true;
            }
        }
        false
    }

    fn resolve_mesh_hit(&mut self, dx: i32, dz: i32, position: TrVec) {
        let r = self.collision_radius;
        let within = |d: i32| d != 0 && d.abs() <= r;
        match self.facing_axis {
            Axis::PosX | Axis::NegX => {
                if dz.abs() > r {
                    self.shift.x = dx;
                    self.shift.z = self.old_position.z - position.z;
                    self.collision_type = AxisCollision::Front;
                } else if within(dz) {
                    self.shift.x = 0;
                    self.shift.z = dz;
                    let toward_pos_z = dz > 0;
                    self.collision_type = if toward_pos_z == (self.facing_axis == Axis::PosX) {
                        AxisCollision::Right
                    } else {
                        AxisCollision::Left
                    };
                }
            }
            Axis::PosZ | Axis::NegZ => {
                if dx.abs() > r {
                    self.shift.x = self.old_position.x - position.x;
                    self.shift.z = if self.facing_axis == Axis::NegZ {
                        dz + 1
                    } else {
                        dz
                    };
                    self.collision_type = AxisCollision::Front;
                } else if within(dx) {
                    self.shift.x = dx;
                    self.shift.z = 0;
                    let toward_pos_x = dx > 0;
                    self.collision_type = if toward_pos_x == (self.facing_axis == Axis::PosZ) {
                        AxisCollision::Left
                    } else {
                        AxisCollision::Right
                    };
                }
            }
        }
    }
}

/// Signed push-out along one axis: the smaller overlap wins, pushing toward
/// negative when the capsule's max side is the shallow one.
fn penetration(left: i32, right: i32) -> i32 {
    if left < right { -left } else { right }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{RoomSpec, WorldBuilder};
    use crate::floordata::FloorDataProgram;
    use crate::world::{RoomStaticMesh, StaticMeshDef};

    const HEIGHT: i32 = 768;

    /// A 5x5 room, floor 0, ceiling 16 quarters up, with the edge ring walled.
    fn arena() -> (WorldBuilder, RoomId) {
        let mut b = WorldBuilder::new();
        let room = b.room(RoomSpec::flat(TrVec::ZERO, 5, 5, 0, -16));
        for i in 0..5 {
            b.wall(room, i, 0);
            b.wall(room, i, 4);
            b.wall(room, 0, i);
            b.wall(room, 4, i);
        }
        (b, room)
    }

    fn info(facing: Axis, position: TrVec) -> CollisionInfo {
        let mut c = CollisionInfo::new(&CoreConfig::default());
        c.facing_angle = facing.angle();
        c.collision_radius = 100;
        c.bad_positive_distance = 384;
        c.bad_negative_distance = -384;
        c.old_position = position - TrVec::new(0, 0, 20);
        c
    }

    #[test]
    fn reflection_rule() {
        assert_eq!(reflect_at_sector_boundary(1500, 1100), 0);
        assert_eq!(reflect_at_sector_boundary(2100, 2000), -53);
        assert_eq!(reflect_at_sector_boundary(2000, 2100), 47);
        // Same inputs, same answer.
        for _ in 0..3 {
            assert_eq!(reflect_at_sector_boundary(3077, 2900), -6);
        }
    }

    #[test]
    fn open_floor_is_no_collision() {
        let (b, room) = arena();
        let world = b.build().unwrap();
        let pos = TrVec::new(2560, 0, 2560);
        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::None);
        assert_eq!(c.shift, TrVec::ZERO);
        assert!(!c.has_static_mesh_collision);
        assert_eq!(c.mid.floor.distance, 0);
        assert_eq!(c.mid.ceiling.distance, -4096 + HEIGHT);
    }

    #[test]
    fn probe_offsets_follow_facing() {
        let mut c = info(Axis::PosX, TrVec::ZERO);
        c.facing_axis = Axis::PosX;
        let o = c.probe_offsets();
        assert_eq!(o.front, (100, 0));
        assert_eq!(o.front_left, (100, 100));
        assert_eq!(o.front_right, (100, -100));

        c.facing_angle = Angle::from_degrees(30);
        c.facing_axis = c.facing_angle.axis();
        let o = c.probe_offsets();
        assert_eq!(o.front, (49, 100));
    }

    #[test]
    fn steep_drop_ahead_is_front_with_pits() {
        let (mut b, room) = arena();
        // Front sector: two quarters lower plus a steep slant.
        b.sector_mut(room, 2, 2).floor_height = 2;
        b.program(room, 2, 2, FloorDataProgram::new().floor_slant(0, -4));
        let world = b.build().unwrap();

        // Front probe lands at local z 88: 512 + 88 * 4 / 4 = 600 below.
        let pos = TrVec::new(2500, 0, 2036);
        let mut c = info(Axis::PosZ, pos);
        c.policy.slopes_are_pits = true;
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.front.floor.slant_class, SlantClass::Steep);
        assert_eq!(c.front.floor.distance, PIT_FLOOR);
        assert_eq!(c.collision_type, AxisCollision::Front);
        assert_eq!(c.shift, TrVec::new(0, 0, -89));
    }

    #[test]
    fn pit_rule_turns_gentle_drop_into_edge() {
        let (mut b, room) = arena();
        b.program(room, 2, 2, FloorDataProgram::new().floor_slant(0, -3));
        let world = b.build().unwrap();
        let pos = TrVec::new(2500, 0, 2000);

        let mut plain = info(Axis::PosZ, pos);
        plain.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(plain.front.floor.distance, 39);
        assert_eq!(plain.collision_type, AxisCollision::None);

        let mut pits = info(Axis::PosZ, pos);
        pits.policy.slopes_are_pits = true;
        pits.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(pits.collision_type, AxisCollision::Front);
    }

    #[test]
    fn rising_steep_slope_is_wall() {
        let (mut b, room) = arena();
        // Front probe floor: -256 + 39 = -217, a step the band accepts.
        b.sector_mut(room, 2, 2).floor_height = -1;
        b.program(room, 2, 2, FloorDataProgram::new().floor_slant(0, -3));
        let world = b.build().unwrap();
        let pos = TrVec::new(2500, 0, 2000);

        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.front.floor.distance, -217);
        assert_eq!(c.collision_type, AxisCollision::None);

        c.policy.slopes_are_walls = true;
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.front.floor.distance, SLOPE_WALL_FLOOR);
        assert_eq!(c.collision_type, AxisCollision::Front);
    }

    #[test]
    fn lava_is_pit() {
        let (mut b, room) = arena();
        b.sector_mut(room, 2, 2).floor_height = 1;
        b.program(room, 2, 2, FloorDataProgram::new().death());
        let world = b.build().unwrap();
        let pos = TrVec::new(2500, 0, 2000);

        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::None);

        c.policy.lava_is_pit = true;
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.front.floor.distance, PIT_FLOOR);
        assert_eq!(c.collision_type, AxisCollision::Front);
    }

    #[test]
    fn standing_in_a_wall_reverts() {
        let (b, room) = arena();
        let world = b.build().unwrap();
        let pos = TrVec::new(500, 0, 2500);
        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::Front);
        assert_eq!(c.shift, TrVec::new(0, 0, -20));
    }

    #[test]
    fn low_ceiling_crushes() {
        let (mut b, room) = arena();
        b.sector_mut(room, 2, 2).ceiling_height = -2;
        let world = b.build().unwrap();
        let pos = TrVec::new(2500, 0, 2500);
        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::TopFront);
        assert_eq!(c.shift, TrVec::new(0, 0, -20));
    }

    #[test]
    fn head_bump_pushes_down_only() {
        let (mut b, room) = arena();
        b.sector_mut(room, 2, 1).ceiling_height = -3;
        let world = b.build().unwrap();
        // Mid-jump, 100 above the floor, head 32 into the ceiling.
        let pos = TrVec::new(2500, -100, 2000);
        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, 700);
        assert_eq!(c.collision_type, AxisCollision::Top);
        assert_eq!(c.shift, TrVec::new(0, 32, 0));
    }

    #[test]
    fn wall_on_the_left_slides_right() {
        let (mut b, room) = arena();
        b.wall(room, 1, 2);
        let world = b.build().unwrap();
        let pos = TrVec::new(2100, 0, 2000);
        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::Left);
        assert_eq!(c.shift, TrVec::new(47, 0, 0));
    }

    #[test]
    fn wall_on_the_right_slides_left() {
        let (mut b, room) = arena();
        b.wall(room, 3, 2);
        let world = b.build().unwrap();
        let pos = TrVec::new(3000, 0, 2000);
        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::Right);
        assert_eq!(c.shift, TrVec::new(-29, 0, 0));
    }

    #[test]
    fn wall_ahead_facing_pos_x() {
        let (mut b, room) = arena();
        b.wall(room, 3, 2);
        let world = b.build().unwrap();
        let pos = TrVec::new(3000, 0, 2500);
        let mut c = info(Axis::PosX, pos);
        c.old_position = pos - TrVec::new(20, 0, 0);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.facing_axis, Axis::PosX);
        assert_eq!(c.collision_type, AxisCollision::Front);
        assert_eq!(c.shift, TrVec::new(-29, 0, 0));
    }

    #[test]
    fn wall_ahead_facing_neg_x() {
        let (mut b, room) = arena();
        b.wall(room, 1, 2);
        let world = b.build().unwrap();
        let pos = TrVec::new(2100, 0, 2500);
        let mut c = info(Axis::NegX, pos);
        c.old_position = pos + TrVec::new(20, 0, 0);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::Front);
        assert_eq!(c.shift, TrVec::new(47, 0, 0));
    }

    #[test]
    fn side_walls_facing_pos_x_slide_along_z() {
        // Left of +X is +Z.
        let (mut b, room) = arena();
        b.wall(room, 2, 3);
        let world = b.build().unwrap();
        let pos = TrVec::new(2500, 0, 3000);
        let mut c = info(Axis::PosX, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::Left);
        assert_eq!(c.shift, TrVec::new(0, 0, -29));

        let (mut b, room) = arena();
        b.wall(room, 2, 1);
        let world = b.build().unwrap();
        let pos = TrVec::new(2500, 0, 2100);
        let mut c = info(Axis::PosX, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::Right);
        assert_eq!(c.shift, TrVec::new(0, 0, 47));
    }

    #[test]
    fn front_ceiling_at_head_height_is_top_bottom() {
        let (mut b, room) = arena();
        // -768 is exactly the head of a 768 tall capsule standing at 0.
        b.sector_mut(room, 2, 2).ceiling_height = -3;
        let world = b.build().unwrap();
        let pos = TrVec::new(2500, 0, 2000);
        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.front.ceiling.distance, 0);
        assert_eq!(c.collision_type, AxisCollision::TopBottom);
        assert_eq!(c.shift, TrVec::new(0, 0, -20));
    }

    fn with_mesh(offset: TrVec, pos: TrVec) -> (World, RoomId) {
        let (mut b, room) = arena();
        b.static_mesh(
            1,
            StaticMeshDef {
                collision_box: BoundingBox::new(
                    TrVec::new(-200, -500, -200),
                    TrVec::new(200, 0, 200),
                ),
                do_not_collide: false,
            },
        );
        b.place_static_mesh(
            room,
            RoomStaticMesh {
                mesh_id: 1,
                position: pos + offset,
                rotation: Angle(0),
            },
        );
        (b.build().unwrap(), room)
    }

    #[test]
    fn static_mesh_ahead_is_front() {
        let pos = TrVec::new(2500, 0, 2500);
        let (world, room) = with_mesh(TrVec::new(0, 0, 250), pos);
        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert!(c.has_static_mesh_collision);
        assert_eq!(c.collision_type, AxisCollision::Front);
        assert_eq!(c.shift, TrVec::new(0, 0, -50));
    }

    #[test]
    fn static_mesh_at_the_side_is_lateral() {
        let pos = TrVec::new(2500, 0, 2500);
        let (world, room) = with_mesh(TrVec::new(250, 0, 0), pos);
        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert!(c.has_static_mesh_collision);
        assert_eq!(c.collision_type, AxisCollision::Right);
        assert_eq!(c.shift, TrVec::new(-50, 0, 0));
    }

    #[test]
    fn static_mesh_on_the_z_side_of_x_facing_agents() {
        let pos = TrVec::new(2500, 0, 2500);
        let (world, room) = with_mesh(TrVec::new(0, 0, 250), pos);

        // +Z is left when facing +X and right when facing -X.
        let mut c = info(Axis::PosX, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert!(c.has_static_mesh_collision);
        assert_eq!(c.collision_type, AxisCollision::Left);
        assert_eq!(c.shift, TrVec::new(0, 0, -50));

        let mut c = info(Axis::NegX, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::Right);
        assert_eq!(c.shift, TrVec::new(0, 0, -50));
    }

    #[test]
    fn static_mesh_on_the_other_z_side_flips() {
        let pos = TrVec::new(2500, 0, 2500);
        let (world, room) = with_mesh(TrVec::new(0, 0, -250), pos);

        let mut c = info(Axis::PosX, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::Right);
        assert_eq!(c.shift, TrVec::new(0, 0, 50));

        let mut c = info(Axis::NegX, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::Left);
        assert_eq!(c.shift, TrVec::new(0, 0, 50));
    }

    #[test]
    fn static_mesh_ahead_facing_pos_x_is_front() {
        let pos = TrVec::new(2500, 0, 2500);
        let (world, room) = with_mesh(TrVec::new(250, 0, 0), pos);
        let mut c = info(Axis::PosX, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::Front);
        assert_eq!(c.shift, TrVec::new(-50, 0, -20));
    }

    #[test]
    fn neg_z_front_hit_keeps_one_unit_bias() {
        let pos = TrVec::new(2500, 0, 2500);
        let (world, room) = with_mesh(TrVec::new(0, 0, -250), pos);
        let mut c = info(Axis::NegZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert_eq!(c.collision_type, AxisCollision::Front);
        assert_eq!(c.shift.z, 51);
    }

    #[test]
    fn non_colliding_mesh_is_ignored() {
        let pos = TrVec::new(2500, 0, 2500);
        let (mut world, room) = with_mesh(TrVec::new(0, 0, 250), pos);
        if let Some(def) = world.static_meshes.get_mut(&1) {
            def.do_not_collide = true;
        }
        let mut c = info(Axis::PosZ, pos);
        c.init_height_info(&world, room, pos, HEIGHT);
        assert!(!c.has_static_mesh_collision);
        assert_eq!(c.collision_type, AxisCollision::None);
    }

    #[test]
    fn touching_rooms_across_a_portal() {
        let mut b = WorldBuilder::new();
        let west = b.room(RoomSpec::flat(TrVec::ZERO, 4, 3, 0, -16));
        let east = b.room(RoomSpec::flat(TrVec::new(3072, 0, 0), 3, 3, 0, -16));
        for z in 0..3 {
            b.program(west, 3, z, FloorDataProgram::new().portal(east.0));
        }
        let world = b.build().unwrap();

        let touching = |pos| CollisionInfo::collect_touching_rooms(&world, west, pos, 150, 818);
        let near = touching(TrVec::new(2950, 0, 1500));
        assert_eq!(near.as_slice(), &[west, east]);
        let far = touching(TrVec::new(1500, 0, 1500));
        assert_eq!(far.as_slice(), &[west]);
    }
}
