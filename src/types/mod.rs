//! Shared types used throughout the library.

mod direction;
mod transform;

pub use direction::{quarter_turns, Axis, Direction};
pub use transform::{BlockTransform, ElementRotation};

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Edge length of a block in model units.
pub const BLOCK_UNITS: f32 = 16.0;

/// A block position in world grid space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPosition {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position of the block center in model units (16 per block).
    pub fn to_model_units(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32) * BLOCK_UNITS
    }
}

impl From<IVec3> for BlockPosition {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<BlockPosition> for IVec3 {
    fn from(p: BlockPosition) -> Self {
        IVec3::new(p.x, p.y, p.z)
    }
}

/// Inclusive integer bounds of a region in world grid space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBounds {
    pub min: BlockPosition,
    pub max: BlockPosition,
}

impl BlockBounds {
    pub fn contains(&self, pos: BlockPosition) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    pub fn dimensions(&self) -> IVec3 {
        IVec3::from(self.max) - IVec3::from(self.min) + IVec3::ONE
    }
}
