// Typed errors for load-time validation and configuration.
//
// Runtime queries against a validated world never fail: a sector that cannot
// be resolved for an in-bounds position is a data bug and panics at the call
// site. Everything that *can* be checked up front is checked when a world is
// built or validated, and reported through `WorldError`.
//
// See also: `world.rs` (`World::validate`), `builder.rs`
// (`WorldBuilder::build`), `config.rs` (`CoreConfig::load`).

use crate::types::{BoxId, RoomId};
use thiserror::Error;

/// Malformed world data found while validating a level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("{room} has an empty sector grid")]
    EmptyRoom { room: RoomId },

    #[error("{room} declares {expected} sectors but stores {actual}")]
    SectorCountMismatch {
        room: RoomId,
        expected: usize,
        actual: usize,
    },

    #[error("{room} sector {sector} links to missing room {target}")]
    RoomLinkOutOfRange {
        room: RoomId,
        sector: usize,
        target: u16,
    },

    #[error("{room} sector {sector} references box {target} beyond {count} boxes")]
    SectorBoxOutOfRange {
        room: RoomId,
        sector: usize,
        target: u16,
        count: usize,
    },

    #[error("{room} sector {sector} floor data index {index} is beyond {len} words")]
    FloorDataOutOfRange {
        room: RoomId,
        sector: usize,
        index: usize,
        len: usize,
    },

    #[error("floor data chain starting at {start} runs off the end of the table")]
    UnterminatedFloorData { start: usize },

    #[error("{box_id} overlap list starts at {index} beyond {len} entries")]
    OverlapIndexOutOfRange {
        box_id: BoxId,
        index: usize,
        len: usize,
    },

    #[error("{box_id} overlap list is not terminated")]
    UnterminatedOverlaps { box_id: BoxId },

    #[error("{box_id} overlap entry points at box {target} beyond {count} boxes")]
    OverlapTargetOutOfRange {
        box_id: BoxId,
        target: u16,
        count: usize,
    },

    #[error("{box_id} has inverted extents")]
    InvertedBox { box_id: BoxId },

    #[error("static mesh {mesh_id} placed in {room} is not defined")]
    UnknownStaticMesh { room: RoomId, mesh_id: u32 },

    #[error("too many {what}: {count}")]
    TooMany { what: &'static str, count: usize },
}

/// Failure to load a serialized world.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("parsing world: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid world: {0}")]
    Invalid(#[from] WorldError),
}

/// Failure to read or parse a `CoreConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
}
