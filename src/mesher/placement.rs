//! Positioning of element faces in world space.
//!
//! World space uses model units: a block at grid position `p` is centered on
//! `p * 16` and spans 8 units to each side.

use crate::types::{BlockPosition, BlockTransform, Direction, ElementRotation, BLOCK_UNITS};
use glam::Vec3;

const HALF_BLOCK: f32 = BLOCK_UNITS / 2.0;

/// Center of an element in world space.
///
/// The element's offset from the block center is rotated with the block.
/// Element rotations are not applied here.
pub fn element_world_position(grid: BlockPosition, from: Vec3, to: Vec3, transform: &BlockTransform) -> Vec3 {
    let padding = (Vec3::splat(BLOCK_UNITS) - (to - from)) / 2.0;
    let matrix = transform.matrix();
    grid.to_model_units() - matrix * padding + matrix * from
}

/// Quad corners of one element face in model space (0-16), in the order
/// UV corners are laid out: P0, P1, P2, P3.
///
/// P0 P1 P2 and P1 P3 P2 wind counter-clockwise seen from outside.
pub fn face_corners(facing: Direction, from: Vec3, to: Vec3) -> [Vec3; 4] {
    let (f, t) = (from, to);
    match facing {
        Direction::East => [
            Vec3::new(t.x, t.y, t.z),
            Vec3::new(t.x, f.y, t.z),
            Vec3::new(t.x, t.y, f.z),
            Vec3::new(t.x, f.y, f.z),
        ],
        Direction::West => [
            Vec3::new(f.x, t.y, f.z),
            Vec3::new(f.x, f.y, f.z),
            Vec3::new(f.x, t.y, t.z),
            Vec3::new(f.x, f.y, t.z),
        ],
        Direction::Up => [
            Vec3::new(f.x, t.y, f.z),
            Vec3::new(f.x, t.y, t.z),
            Vec3::new(t.x, t.y, f.z),
            Vec3::new(t.x, t.y, t.z),
        ],
        Direction::Down => [
            Vec3::new(f.x, f.y, t.z),
            Vec3::new(f.x, f.y, f.z),
            Vec3::new(t.x, f.y, t.z),
            Vec3::new(t.x, f.y, f.z),
        ],
        Direction::South => [
            Vec3::new(f.x, t.y, t.z),
            Vec3::new(f.x, f.y, t.z),
            Vec3::new(t.x, t.y, t.z),
            Vec3::new(t.x, f.y, t.z),
        ],
        Direction::North => [
            Vec3::new(t.x, t.y, f.z),
            Vec3::new(t.x, f.y, f.z),
            Vec3::new(f.x, t.y, f.z),
            Vec3::new(f.x, f.y, f.z),
        ],
    }
}

/// Move model-space corners into world space: element rotation, then the
/// block rotation about the block center, then the grid offset.
pub fn place_corners(
    corners: [Vec3; 4],
    rotation: Option<&ElementRotation>,
    transform: &BlockTransform,
    grid: BlockPosition,
) -> [Vec3; 4] {
    let matrix = transform.matrix();
    let offset = grid.to_model_units();

    corners.map(|corner| {
        let rotated = match rotation {
            Some(rotation) => rotation.apply(corner),
            None => corner,
        };
        matrix * (rotated - Vec3::splat(HALF_BLOCK)) + offset
    })
}
