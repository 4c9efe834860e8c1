// vault_core: navigation and collision core for a level-based action game.
//
// This crate answers two per-tick questions against a static level: where
// should a non-player character move next (incremental box-graph search with
// corridor steering), and how must the controlled character's capsule be
// pushed back out of walls, slopes, pits and static meshes (five-probe axis
// collision). Level loading, rendering, animation and the movement
// integrator live elsewhere and talk to this crate through `World`,
// `PathFinder::calculate_target` and `CollisionInfo::init_height_info`.
//
// Module overview:
// - `types.rs`:      TrVec, BoundingBox, Angle/Axis, BoxId/RoomId/SectorRef, grid constants.
// - `world.rs`:      World arenas (rooms, sectors, boxes, overlaps), sector and room
//                    lookup, validation.
// - `builder.rs`:    WorldBuilder: programmatic level construction for tests and tools.
// - `floordata.rs`:  Floor-data word decoding (chunks, trigger actions) and authoring.
// - `items.rs`:      FloorPatcher trait + bridges and trap doors, ItemRegistry.
// - `height.rs`:     HeightInfo: floor/ceiling evaluation with slants and item patches.
// - `pathfinder.rs`: PathFinder: bounded incremental search and steering target.
// - `collision.rs`:  CollisionInfo: probe placement, slope/pit rules, static meshes,
//                    classification.
// - `agents.rs`:     NavAgent + parallel batch steering with rayon.
// - `config.rs`:     CoreConfig: tunable constants, JSON loadable.
// - `error.rs`:      WorldError / LoadError / ConfigError.
// - `logging.rs`:    env_logger setup driven by `CoreConfig::log_filter`.
// - `prng`:          Re-exported from `vault_prng`, xoshiro256++ with SplitMix64 seeding.
//
// **Critical constraint: determinism.** Every query is a pure function of the
// world, the agent's own state and its own PRNG. No `HashMap`, no system
// time, no OS entropy; ordered collections are `BTreeMap`/`BTreeSet`.

pub mod agents;
pub mod builder;
pub mod collision;
pub mod config;
pub mod error;
pub mod floordata;
pub mod height;
pub mod items;
pub mod logging;
pub mod pathfinder;
pub use vault_prng as prng;
pub mod types;
pub mod world;
