// Core types shared across the navigation and collision core.
//
// Defines world-space integer coordinates (`TrVec`), the fixed sector grid
// constants, facing angles and their snapping to cardinal axes, axis-aligned
// bounding boxes, and the compact index types used to address boxes and
// rooms in the world arenas. All persisted types derive `Serialize` and
// `Deserialize`.
//
// Coordinate system (level data convention):
// - X and Z span the horizontal plane, one sector is 1024 units wide.
// - Y points *down*: a larger Y is lower in the world. A floor "above" the
//   agent therefore has a smaller Y, and relative heights read as
//   "positive = below the reference point".
//
// **Critical constraint: determinism.** All gameplay arithmetic is integer
// arithmetic with truncating division. Floating point is only used to turn a
// facing angle into the sideways component of a probe offset, and that
// result is truncated immediately.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

// ---------------------------------------------------------------------------
// Grid constants
// ---------------------------------------------------------------------------

/// Width of one sector along X or Z.
pub const SECTOR_SIZE: i32 = 1024;

/// Height resolution of sector floors and ceilings.
pub const QUARTER_SECTOR_SIZE: i32 = SECTOR_SIZE / 4;

/// Absolute height bound. A floor at `-HEIGHT_LIMIT` means "no floor".
pub const HEIGHT_LIMIT: i32 = 127 * QUARTER_SECTOR_SIZE;

/// Floor distance reported when a sector has no floor (off the world).
pub const NO_FLOOR: i32 = -HEIGHT_LIMIT;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A world-space position in level units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrVec {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TrVec {
    pub const ZERO: Self = Self::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Sector column index along X (truncating, like the level data).
    pub fn sector_x(self) -> i32 {
        self.x / SECTOR_SIZE
    }

    /// Sector row index along Z.
    pub fn sector_z(self) -> i32 {
        self.z / SECTOR_SIZE
    }
}

impl Add for TrVec {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for TrVec {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for TrVec {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for TrVec {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for TrVec {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for TrVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Axis-aligned bounding box with inclusive bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: TrVec,
    pub max: TrVec,
}

impl BoundingBox {
    pub const fn new(min: TrVec, max: TrVec) -> Self {
        Self { min, max }
    }

    /// True if the two boxes share at least one point.
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y
            || self.max.z < other.min.z
            || self.min.z > other.max.z)
    }

    pub fn contains(&self, p: TrVec) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }

    /// Translate both corners by `offset`.
    pub fn translated(&self, offset: TrVec) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }
}

// ---------------------------------------------------------------------------
// Angles and axes
// ---------------------------------------------------------------------------

/// A yaw angle in 1/65536 turns (`0x4000` = 90 degrees), wrapping.
///
/// Angle 0 faces +Z, a quarter turn faces +X.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Angle(pub i16);

impl Angle {
    pub const QUARTER: i32 = 0x4000;

    pub fn from_degrees(deg: i32) -> Self {
        // Wrapping conversion keeps 180 and -180 identical.
        Self((deg * 0x10000 / 360) as i16)
    }

    fn radians(self) -> f64 {
        f64::from(self.0) * std::f64::consts::PI / 32768.0
    }

    pub fn sin(self) -> f64 {
        self.radians().sin()
    }

    pub fn cos(self) -> f64 {
        self.radians().cos()
    }

    /// Snap to the nearest cardinal axis (45 degree margin on each side).
    ///
    /// Exact diagonals resolve toward Z-facing axes, so 45 degrees is `PosZ`
    /// and 135 degrees is `NegZ`.
    pub fn axis(self) -> Axis {
        let a = i32::from(self.0);
        let eighth = Self::QUARTER / 2;
        if a.abs() <= eighth {
            Axis::PosZ
        } else if a > eighth && a < 3 * eighth {
            Axis::PosX
        } else if a < -eighth && a > -3 * eighth {
            Axis::NegX
        } else {
            Axis::NegZ
        }
    }
}

/// One of the four horizontal cardinal directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    PosZ,
    PosX,
    NegZ,
    NegX,
}

impl Axis {
    /// The angle that faces exactly along this axis.
    pub fn angle(self) -> Angle {
        match self {
            Axis::PosZ => Angle(0),
            Axis::PosX => Angle(0x4000),
            Axis::NegZ => Angle(i16::MIN),
            Axis::NegX => Angle(-0x4000),
        }
    }

    /// True for the two axes whose forward direction runs along Z.
    pub fn is_z(self) -> bool {
        matches!(self, Axis::PosZ | Axis::NegZ)
    }
}

// ---------------------------------------------------------------------------
// Arena indices
// ---------------------------------------------------------------------------

/// Index of a navigation box in `World::boxes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoxId(pub u16);

impl BoxId {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box#{}", self.0)
    }
}

/// Index of a room in `World::rooms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub u16);

impl RoomId {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

/// A sector addressed by its room and flat index within the room grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorRef {
    pub room: RoomId,
    pub index: usize,
}
