// Navigating agents and batch steering.
//
// A `NavAgent` bundles what one non-player character needs to navigate:
// its position and room, the box it stands in, its own `PathFinder` and its
// own `GameRng` for wander targets. Agents share nothing mutable, so
// `steer_agents` evaluates a whole batch in parallel with rayon against the
// read-only `World`. Results come back in agent order and are identical to
// stepping the agents one by one.
//
// See also: `pathfinder.rs` for the search and steering itself.

use crate::config::NavConfig;
use crate::pathfinder::{AgentState, BoxAccess, PathFinder, SteerTarget};
use crate::types::{BoxId, RoomId, TrVec};
use crate::world::World;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use vault_prng::GameRng;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavAgent {
    pub position: TrVec,
    pub room: RoomId,
    pub box_id: Option<BoxId>,
    pub path_finder: PathFinder,
    pub rng: GameRng,
}

impl NavAgent {
    pub fn new(
        world: &World,
        config: &NavConfig,
        position: TrVec,
        room: RoomId,
        rng: GameRng,
    ) -> Self {
        let mut agent = Self {
            position,
            room,
            box_id: None,
            path_finder: PathFinder::new(world, config),
            rng,
        };
        agent.relocate(world, position);
        agent
    }

    /// Move the agent and refresh its room and box.
    pub fn relocate(&mut self, world: &World, position: TrVec) {
        self.position = position;
        self.box_id = world.find_box(position, &mut self.room);
    }

    pub fn state(&self) -> AgentState {
        AgentState {
            position: self.position,
            box_id: self.box_id,
        }
    }

    /// Compute this tick's movement target.
    pub fn steer(&mut self, world: &World, access: &impl BoxAccess) -> SteerTarget {
        let state = self.state();
        self.path_finder
            .calculate_target(world, &state, access, &mut self.rng)
    }
}

/// Steer every agent for one tick, in parallel.
pub fn steer_agents<A>(world: &World, agents: &mut [NavAgent], access: &A) -> Vec<SteerTarget>
where
    A: BoxAccess + Sync,
{
    agents
        .par_iter_mut()
        .map(|agent| agent.steer(world, access))
        .collect()
}
