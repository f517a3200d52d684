//! Face UV generation.
//!
//! Rectangles are in texture pixels (0-16 along u, the texture's pixel
//! height along v). Output coordinates are normalized with v flipped so that
//! v = 1 is the top edge of the texture.

use crate::types::{Direction, BLOCK_UNITS};
use glam::Vec3;

/// A UV rectangle `[u1, v1, u2, v2]` in texture pixels.
pub type UvRect = [f32; 4];

/// Corner order shared with quad positions: P0, P1, P2, P3.
pub type UvCorners = [[f32; 2]; 4];

/// Two triangles over the corners: P0 P1 P2, P1 P3 P2.
pub const TRIANGLE_CORNERS: [usize; 6] = [0, 1, 2, 1, 3, 2];

/// Rectangle used when a face declares no `uv`.
///
/// The vertical extent is measured from the top of the block. North, south,
/// east and west faces span `16 - to.y` to `16`.
pub fn default_uv(facing: Direction, from: Vec3, to: Vec3) -> UvRect {
    let size = to - from;
    let pv = BLOCK_UNITS - to.y;

    match facing {
        Direction::North | Direction::South => [from.x, pv, from.x + size.x, pv + to.y],
        Direction::Up => [from.x, from.z, from.x + size.x, from.z + size.z],
        Direction::Down => {
            let u = BLOCK_UNITS - to.x;
            let v = BLOCK_UNITS - to.z;
            [u, v, u + size.x, v + size.z]
        }
        Direction::East => {
            let u = BLOCK_UNITS - to.z;
            [u, pv, u + size.z, pv + to.y]
        }
        Direction::West => [from.z, pv, from.z + size.z, pv + to.y],
    }
}

/// Normalize a rectangle and lay it on the quad corners for a UV rotation.
///
/// Rotations of 90 and 270 degrees mirror the rectangle across the vertical
/// centre line of the texture before turning. Anything other than a quarter
/// turn in `90..=270` is laid out unrotated.
pub fn uv_corners(rect: UvRect, rotation: i32, texture_height: u32) -> UvCorners {
    let (rect, steps) = match rotation {
        90 => (mirror_u(rect), 1),
        180 => (rect, 2),
        270 => (mirror_u(rect), 3),
        _ => (rect, 0),
    };
    rotate_corners(lay_out(rect, texture_height), steps)
}

/// Reflect a rectangle's u span across the middle of the texture.
pub fn mirror_u(rect: UvRect) -> UvRect {
    [BLOCK_UNITS - rect[2], rect[1], BLOCK_UNITS - rect[0], rect[3]]
}

fn lay_out(rect: UvRect, texture_height: u32) -> UvCorners {
    let height = if texture_height == 0 {
        BLOCK_UNITS
    } else {
        texture_height as f32
    };

    let u1 = rect[0] / BLOCK_UNITS;
    let u2 = rect[2] / BLOCK_UNITS;
    let v1 = 1.0 - rect[1] / height;
    let v2 = 1.0 - rect[3] / height;
    [[u1, v1], [u1, v2], [u2, v1], [u2, v2]]
}

/// Expand corners into the six per-vertex UVs of the face's two triangles.
pub fn triangulate(corners: &UvCorners) -> [[f32; 2]; 6] {
    TRIANGLE_CORNERS.map(|i| corners[i])
}

/// Turn corners by `steps` quarter turns.
///
/// Corners walk the quad perimeter as P0, P1, P3, P2, so a quarter turn
/// shifts that cycle by one. Four steps return the input.
pub fn rotate_corners(corners: UvCorners, steps: i32) -> UvCorners {
    const CYCLE: [usize; 4] = [0, 1, 3, 2];

    let shift = steps.rem_euclid(4) as usize;
    let mut out = corners;
    for (slot, &corner) in CYCLE.iter().enumerate() {
        out[corner] = corners[CYCLE[(slot + shift) % 4]];
    }
    out
}
