//! Texture rotation for faces of rotated blocks.
//!
//! Two rings of facings track where the faces around each rotation axis end
//! up: the x ring holds the faces turned by an X rotation, the y ring those
//! turned by a Y rotation. A face's texture rotation is read off its slot.

use crate::types::{quarter_turns, BlockTransform, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRings {
    pub x: [Direction; 4],
    pub y: [Direction; 4],
    transform: BlockTransform,
}

impl FaceRings {
    pub const X_RING: [Direction; 4] = [
        Direction::North,
        Direction::Up,
        Direction::South,
        Direction::Down,
    ];
    pub const Y_RING: [Direction; 4] = [
        Direction::West,
        Direction::Down,
        Direction::East,
        Direction::Up,
    ];

    /// Rings turned to match a block rotation.
    pub fn new(transform: BlockTransform) -> Self {
        let mut x = Self::X_RING;
        let mut y = Self::Y_RING;

        let has_x = transform.x != 0;
        let has_y = transform.y != 0;

        if has_x && has_y {
            for _ in 0..quarter_turns(transform.x) {
                y[1] = x[2];
                y[3] = x[0];
                x.rotate_right(1);
            }
            for _ in 0..quarter_turns(transform.y) {
                x[1] = y[3];
                x[3] = y[1];
                y.rotate_left(1);
            }
        } else if has_y {
            for _ in 0..quarter_turns(transform.y) {
                let previous = y;
                y[0] = x[0];
                y[2] = x[2];
                x[2] = previous[0];
                x[0] = previous[2];
            }
        }
        // An X rotation alone leaves both rings in place.

        Self { x, y, transform }
    }

    /// Texture rotation in radians for a face of the block's model.
    ///
    /// Checks run in a fixed order and a later match overrides an earlier one.
    pub fn texture_rotation(&self, facing: Direction) -> f32 {
        let rx = self.transform.x_radians();
        let ry = self.transform.y_radians();
        let has_x = self.transform.x != 0;
        let has_y = self.transform.y != 0;

        let mut rotation = 0.0;
        if has_x && has_y {
            if facing == self.y[3] {
                rotation = ry;
            }
            if facing == self.x[2] {
                rotation = -ry;
            }
            if facing == self.y[0] {
                rotation = rx;
            }
            if facing == self.y[2] {
                rotation = -rx;
            }
        } else if has_y {
            if facing == self.x[1] {
                rotation = ry;
            }
            if facing == self.x[3] {
                rotation = -ry;
            }
        } else if has_x {
            if facing == self.y[0] {
                rotation = rx;
            }
            if facing == self.y[2] {
                rotation = -rx;
            }
        }
        rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;
    use Direction::*;

    fn assert_turn(rings: &FaceRings, facing: Direction, expected: f32) {
        let actual = rings.texture_rotation(facing);
        assert!((actual - expected).abs() < 1e-6, "{facing}: {actual} != {expected}");
    }

    #[test]
    fn test_identity_has_no_texture_rotation() {
        let rings = FaceRings::new(BlockTransform::default());
        assert_eq!(rings.x, FaceRings::X_RING);
        assert_eq!(rings.y, FaceRings::Y_RING);
        for facing in Direction::ALL {
            assert_turn(&rings, facing, 0.0);
        }
    }

    #[test]
    fn test_y_only_swaps_side_slots() {
        let rings = FaceRings::new(BlockTransform::new(0, 90, false));
        assert_eq!(rings.x, [East, Up, West, Down]);
        assert_eq!(rings.y, [North, Down, South, Up]);

        // Top and bottom turn with the block.
        assert_turn(&rings, Up, FRAC_PI_2);
        assert_turn(&rings, Down, -FRAC_PI_2);
        assert_turn(&rings, North, 0.0);

        let half = FaceRings::new(BlockTransform::new(0, 180, false));
        assert_eq!(half.x, [South, Up, North, Down]);
        assert_eq!(half.y, [East, Down, West, Up]);
    }

    #[test]
    fn test_x_only_rotates_east_and_west() {
        let rings = FaceRings::new(BlockTransform::new(90, 0, false));
        assert_eq!(rings.x, FaceRings::X_RING);
        assert_turn(&rings, West, FRAC_PI_2);
        assert_turn(&rings, East, -FRAC_PI_2);
        assert_turn(&rings, Up, 0.0);
    }

    #[test]
    fn test_both_rotations_cross_link_rings() {
        let rings = FaceRings::new(BlockTransform::new(90, 90, false));
        // One x step: y[1] = South, y[3] = North, x rotated right.
        // One y step: x[1] = North, x[3] = South, y rotated left.
        assert_eq!(rings.x, [Down, North, Up, South]);
        assert_eq!(rings.y, [South, East, North, West]);

        // North is checked as y[2]; x[1] is not consulted with both rotations.
        assert_turn(&rings, North, -FRAC_PI_2);
        assert_turn(&rings, South, FRAC_PI_2);
        assert_turn(&rings, West, FRAC_PI_2);
        assert_turn(&rings, Up, -FRAC_PI_2);
        assert_turn(&rings, East, 0.0);
    }
}
