// Incremental box-graph search and per-tick steering for one agent.
//
// Each navigating agent owns a `PathFinder`. The search runs *backwards*
// from the destination box (`target_box`) over the overlap table: a box
// that becomes reachable gets `exit_box` pointing at the neighbour it was
// reached from, so following `exit_box` links from the agent's box leads to
// the destination.
//
// The search is a breadth-first flood that resumes across ticks. Every call
// pops at most `NavConfig::max_expansions` boxes from the front of
// `expansions`, so a distant destination is resolved over several frames
// while per-tick cost stays bounded. Neighbours are rejected on zone
// mismatch (zones partition the graph per locomotion mode) and on a floor
// delta outside `[drop, step]`. A neighbour first reached from a box that is
// itself not traversable is marked non-traversable and not expanded, which
// propagates unreachability past blocked boxes without re-deriving it.
//
// Changing `required_box` starts a new generation: every node touched by the
// previous generation is reset before the new root is seeded, so no stale
// `traversable`/`exit_box` state leaks across destinations.
//
// `calculate_target` turns the current search result into a movement target
// inside the agent's box. It walks the exit chain, narrowing an X/Z corridor
// whenever the agent lies outside the box being examined, and allows at most
// one detour per call. When the chain ends before the destination it falls
// back to a random wander point inside the last box, drawn from the agent's
// own `GameRng`.
//
// See also: `world.rs` for boxes and overlaps, `agents.rs` for stepping many
// agents at once, `config.rs` for `NavConfig`.
//
// **Critical constraint: determinism.** Queue order is insertion order,
// `visited` is a `BTreeSet`, and the only randomness comes from the injected
// `GameRng`. The whole struct round-trips through serde exactly.

use crate::config::NavConfig;
use crate::types::{BoxId, QUARTER_SECTOR_SIZE, SECTOR_SIZE, TrVec};
use crate::world::{NavBox, World, ZoneKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use vault_prng::GameRng;

const HALF_SECTOR: i32 = SECTOR_SIZE / 2;

// Movement permissions while walking the exit chain.
const CAN_MOVE_X_POS: u8 = 0x01;
const CAN_MOVE_X_NEG: u8 = 0x02;
const CAN_MOVE_Z_POS: u8 = 0x04;
const CAN_MOVE_Z_NEG: u8 = 0x08;
const CAN_MOVE_ALL: u8 = CAN_MOVE_X_POS | CAN_MOVE_X_NEG | CAN_MOVE_Z_POS | CAN_MOVE_Z_NEG;
const CAN_MOVE_X: u8 = CAN_MOVE_X_POS | CAN_MOVE_X_NEG;
const CAN_MOVE_Z: u8 = CAN_MOVE_Z_POS | CAN_MOVE_Z_NEG;

/// Caller-supplied traversability rule (ladders, locked doors, creature
/// specific restrictions). Checked on top of the blocked/blockable flags.
pub trait BoxAccess {
    fn can_visit(&self, world: &World, id: BoxId) -> bool;
}

/// Accepts every box.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl BoxAccess for AllowAll {
    fn can_visit(&self, _world: &World, _id: BoxId) -> bool {
        true
    }
}

impl<F> BoxAccess for F
where
    F: Fn(&World, BoxId) -> bool,
{
    fn can_visit(&self, world: &World, id: BoxId) -> bool {
        self(world, id)
    }
}

/// Per-box search state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFinderNode {
    /// Neighbour to head for when leaving this box.
    pub exit_box: Option<BoxId>,
    pub traversable: bool,
}

/// What the steering layer needs from the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentState {
    pub position: TrVec,
    /// Box the agent currently stands in, if any.
    pub box_id: Option<BoxId>,
}

/// Result of `PathFinder::calculate_target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SteerTarget {
    pub point: TrVec,
    /// True once the destination box is reached (or a detour resolved).
    pub reached: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFinder {
    pub nodes: Vec<PathFinderNode>,
    pub expansions: VecDeque<BoxId>,
    pub visited: BTreeSet<BoxId>,
    pub cannot_visit_blocked: bool,
    pub cannot_visit_blockable: bool,
    /// Largest floor delta to a neighbour (positive is downward).
    pub step: i32,
    /// Smallest floor delta to a neighbour (negative is upward).
    pub drop: i32,
    /// Non-zero for flying agents.
    pub fly: i32,
    pub target_box: Option<BoxId>,
    /// Destination requested by the AI layer; committed on the next update.
    pub required_box: Option<BoxId>,
    /// Point to reach inside the destination box.
    pub target: TrVec,
    pub config: NavConfig,
}

impl PathFinder {
    pub fn new(world: &World, config: &NavConfig) -> Self {
        Self {
            nodes: vec![PathFinderNode::default(); world.box_count()],
            expansions: VecDeque::new(),
            visited: BTreeSet::new(),
            cannot_visit_blocked: true,
            cannot_visit_blockable: false,
            step: QUARTER_SECTOR_SIZE,
            drop: -QUARTER_SECTOR_SIZE,
            fly: 0,
            target_box: None,
            required_box: None,
            target: TrVec::ZERO,
            config: config.clone(),
        }
    }

    /// Request a new destination.
    pub fn set_destination(&mut self, required_box: BoxId, target: TrVec) {
        self.required_box = Some(required_box);
        self.target = target;
    }

    pub fn node(&self, id: BoxId) -> &PathFinderNode {
        &self.nodes[id.index()]
    }

    /// Built-in blocked/blockable rules, then the caller's rule.
    pub fn can_visit(&self, world: &World, id: BoxId, access: &impl BoxAccess) -> bool {
        let b = world.nav_box(id);
        if self.cannot_visit_blocked && b.blocked {
            return false;
        }
        if self.cannot_visit_blockable && b.blockable {
            return false;
        }
        access.can_visit(world, id)
    }

    /// Commit a changed destination, then run one bounded search step.
    pub fn update_path(&mut self, world: &World, access: &impl BoxAccess) {
        if let Some(required) = self.required_box {
            if self.target_box != Some(required) {
                log::debug!(
                    "replanning toward {required}, discarding {} visited boxes",
                    self.visited.len()
                );
                for id in &self.visited {
                    self.nodes[id.index()] = PathFinderNode::default();
                }
                if let Some(old) = self.target_box {
                    self.nodes[old.index()] = PathFinderNode::default();
                }

                self.target_box = Some(required);
                self.nodes[required.index()] = PathFinderNode {
                    exit_box: None,
                    traversable: true,
                };
                self.expansions.clear();
                self.expansions.push_back(required);
                self.visited.clear();
                self.visited.insert(required);
            }
        }

        if self.target_box.is_some() {
            self.search_path(world, access);
        }
    }

    /// Expand up to `max_expansions` boxes from the front of the queue.
    pub fn search_path(&mut self, world: &World, access: &impl BoxAccess) {
        let kind = ZoneKind::for_agent(self.fly, self.step);
        let swapped = world.rooms_swapped;

        for _ in 0..self.config.max_expansions {
            let Some(current) = self.expansions.pop_front() else {
                break;
            };
            let current_box = world.nav_box(current);
            let current_traversable = self.nodes[current.index()].traversable;
            let zone = current_box.zone(kind, swapped);
            log::trace!("expanding {current} (traversable: {current_traversable})");

            for successor in world.overlaps_of(current) {
                if successor == current {
                    continue;
                }
                let successor_box = world.nav_box(successor);
                if successor_box.zone(kind, swapped) != zone {
                    continue;
                }
                let height_diff = successor_box.floor - current_box.floor;
                if height_diff > self.step || height_diff < self.drop {
                    // May still be reachable through another box.
                    continue;
                }

                if !current_traversable {
                    if self.visited.insert(successor) {
                        self.nodes[successor.index()].traversable = false;
                    }
                    continue;
                }

                if self.nodes[successor.index()].traversable && self.visited.contains(&successor) {
                    continue;
                }

                self.visited.insert(successor);
                let traversable = self.can_visit(world, successor, access);
                let node = &mut self.nodes[successor.index()];
                node.traversable = traversable;
                if traversable {
                    node.exit_box = Some(current);
                }

                if !self.expansions.contains(&successor) {
                    self.expansions.push_back(successor);
                }
            }
        }
    }

    /// Update the search and compute where the agent should move this tick.
    pub fn calculate_target(
        &mut self,
        world: &World,
        agent: &AgentState,
        access: &impl BoxAccess,
        rng: &mut GameRng,
    ) -> SteerTarget {
        self.update_path(world, access);

        let pos = agent.position;
        let mut point = pos;
        let Some(mut here) = agent.box_id else {
            return SteerTarget {
                point,
                reached: false,
            };
        };

        let start = world.nav_box(here);
        let mut corridor = Corridor {
            min_x: start.xmin,
            max_x: start.xmax,
            min_z: start.zmin,
            max_z: start.zmax,
        };
        let mut dirs = CAN_MOVE_ALL;
        let mut detour = false;

        // Bounded by the box count so a corrupted exit chain cannot spin.
        for _ in 0..=world.box_count() {
            let b = world.nav_box(here);
            let floor = if self.fly != 0 {
                b.floor - self.config.fly_step_offset
            } else {
                b.floor
            };
            point.y = point.y.min(floor);

            if b.contains(pos.x, pos.z) {
                corridor = Corridor::of(b);
            } else {
                if pos.z < b.zmin {
                    if dirs & CAN_MOVE_Z_NEG != 0 && b.contains_x(pos.x) {
                        point.z = point.z.max(b.zmin + HALF_SECTOR);
                        if detour {
                            return SteerTarget {
                                point,
                                reached: true,
                            };
                        }
                        corridor.clamp_x(b);
                        dirs = CAN_MOVE_Z_NEG;
                    } else if detour || dirs != CAN_MOVE_Z_NEG {
                        point.z = corridor.max_z - HALF_SECTOR;
                        if detour || dirs != CAN_MOVE_ALL {
                            return SteerTarget {
                                point,
                                reached: true,
                            };
                        }
                        detour = true;
                    }
                } else if pos.z > b.zmax {
                    if dirs & CAN_MOVE_Z_POS != 0 && b.contains_x(pos.x) {
                        point.z = point.z.min(b.zmax - HALF_SECTOR);
                        if detour {
                            return SteerTarget {
                                point,
                                reached: true,
                            };
                        }
                        corridor.clamp_x(b);
                        dirs = CAN_MOVE_Z_POS;
                    } else if detour || dirs != CAN_MOVE_Z_POS {
                        point.z = corridor.min_z + HALF_SECTOR;
                        if detour || dirs != CAN_MOVE_ALL {
                            return SteerTarget {
                                point,
                                reached: true,
                            };
                        }
                        detour = true;
                    }
                }

                if pos.x < b.xmin {
                    if dirs & CAN_MOVE_X_NEG != 0 && b.contains_z(pos.z) {
                        point.x = point.x.max(b.xmin + HALF_SECTOR);
                        if detour {
                            return SteerTarget {
                                point,
                                reached: true,
                            };
                        }
                        corridor.clamp_z(b);
                        dirs = CAN_MOVE_X_NEG;
                    } else if detour || dirs != CAN_MOVE_X_NEG {
                        point.x = corridor.max_x - HALF_SECTOR;
                        if detour || dirs != CAN_MOVE_ALL {
                            return SteerTarget {
                                point,
                                reached: true,
                            };
                        }
                        detour = true;
                    }
                } else if pos.x > b.xmax {
                    if dirs & CAN_MOVE_X_POS != 0 && b.contains_z(pos.z) {
                        point.x = point.x.min(b.xmax - HALF_SECTOR);
                        if detour {
                            return SteerTarget {
                                point,
                                reached: true,
                            };
                        }
                        corridor.clamp_z(b);
                        dirs = CAN_MOVE_X_POS;
                    } else if detour || dirs != CAN_MOVE_X_POS {
                        point.x = corridor.min_x + HALF_SECTOR;
                        if detour || dirs != CAN_MOVE_ALL {
                            return SteerTarget {
                                point,
                                reached: true,
                            };
                        }
                        detour = true;
                    }
                }
            }

            if Some(here) == self.target_box {
                if dirs & CAN_MOVE_Z != 0 {
                    point.z = self.target.z;
                } else if !detour {
                    point.z = inset_clamp(point.z, b.zmin, b.zmax);
                }
                if dirs & CAN_MOVE_X != 0 {
                    point.x = self.target.x;
                } else if !detour {
                    point.x = inset_clamp(point.x, b.xmin, b.xmax);
                }
                point.y = self.target.y;
                return SteerTarget {
                    point,
                    reached: true,
                };
            }

            match self.nodes[here.index()].exit_box {
                Some(next) if self.can_visit(world, next, access) => here = next,
                _ => break,
            }
        }

        // No (further) known path: wander inside the last box reached.
        let b = world.nav_box(here);
        if dirs & CAN_MOVE_Z != 0 {
            let span = b.zmax - b.zmin - SECTOR_SIZE + 1;
            point.z = inset_clamp(rng.rand15(span) + b.zmin + HALF_SECTOR, b.zmin, b.zmax);
        } else if !detour {
            point.z = inset_clamp(point.z, b.zmin, b.zmax);
        }
        if dirs & CAN_MOVE_X != 0 {
            let span = b.xmax - b.xmin - SECTOR_SIZE + 1;
            point.x = inset_clamp(rng.rand15(span) + b.xmin + HALF_SECTOR, b.xmin, b.xmax);
        } else if !detour {
            point.x = inset_clamp(point.x, b.xmin, b.xmax);
        }
        point.y = if self.fly != 0 {
            b.floor - self.config.fly_wander_offset
        } else {
            b.floor
        };

        SteerTarget {
            point,
            reached: false,
        }
    }
}

/// The X/Z range the agent may currently move through.
#[derive(Clone, Copy, Debug)]
struct Corridor {
    min_x: i32,
    max_x: i32,
    min_z: i32,
    max_z: i32,
}

impl Corridor {
    fn of(b: &NavBox) -> Self {
        Self {
            min_x: b.xmin,
            max_x: b.xmax,
            min_z: b.zmin,
            max_z: b.zmax,
        }
    }

    fn clamp_x(&mut self, b: &NavBox) {
        self.min_x = self.min_x.max(b.xmin);
        self.max_x = self.max_x.min(b.xmax);
    }

    fn clamp_z(&mut self, b: &NavBox) {
        self.min_z = self.min_z.max(b.zmin);
        self.max_z = self.max_z.min(b.zmax);
    }
}

/// Clamp into `[min + half sector, max - half sector + 1]`. Boxes narrower
/// than a sector resolve to the upper bound, or to `min` when that bound
/// already lies outside the box.
fn inset_clamp(v: i32, min: i32, max: i32) -> i32 {
    v.max(min + HALF_SECTOR).min(max - HALF_SECTOR + 1).max(min)
}
