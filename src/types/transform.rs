//! Transform types for block and element rotations.

use super::Axis;
use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

/// Block-level transform from a blockstate variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockTransform {
    /// X rotation in degrees (0, 90, 180, 270).
    pub x: i32,
    /// Y rotation in degrees (0, 90, 180, 270).
    pub y: i32,
    /// If true, UV coordinates don't rotate with the block.
    pub uvlock: bool,
}

impl BlockTransform {
    pub fn new(x: i32, y: i32, uvlock: bool) -> Self {
        Self { x, y, uvlock }
    }

    /// Check if this is an identity transform (no rotation).
    pub fn is_identity(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    pub fn x_radians(&self) -> f32 {
        (self.x as f32).to_radians()
    }

    pub fn y_radians(&self) -> f32 {
        (self.y as f32).to_radians()
    }

    /// Rotation matrix applied to block-centered positions.
    ///
    /// Angles are negated: blockstate rotations are clockwise looking down
    /// the positive axis, glam rotates counter-clockwise. X is applied first.
    pub fn matrix(&self) -> Mat3 {
        let x_rot = Mat3::from_rotation_x(-self.x_radians());
        let y_rot = Mat3::from_rotation_y(-self.y_radians());
        y_rot * x_rot
    }
}

/// Element-level rotation from a model element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRotation {
    /// Pivot in element space (0-16).
    #[serde(default = "default_origin")]
    pub origin: [f32; 3],
    /// Axis to rotate around.
    pub axis: Axis,
    /// Rotation angle in degrees (-45 to 45, in 22.5 increments).
    pub angle: f32,
    /// Whether to rescale the element after rotation.
    #[serde(default)]
    pub rescale: bool,
}

fn default_origin() -> [f32; 3] {
    [8.0, 8.0, 8.0]
}

impl ElementRotation {
    pub fn angle_radians(&self) -> f32 {
        self.angle.to_radians()
    }

    /// Scale applied across the rotation plane when `rescale` is set.
    pub fn rescale_factor(&self) -> f32 {
        if self.rescale {
            1.0 / self.angle_radians().cos()
        } else {
            1.0
        }
    }

    /// Rotate a point given in element space (0-16) about the pivot.
    pub fn apply(&self, point: Vec3) -> Vec3 {
        let origin = Vec3::from(self.origin);
        let angle = self.angle_radians();
        let matrix = match self.axis {
            Axis::X => Mat3::from_rotation_x(angle),
            Axis::Y => Mat3::from_rotation_y(angle),
            Axis::Z => Mat3::from_rotation_z(angle),
        };

        let rotated = matrix * (point - origin);
        let rescale = self.rescale_factor();
        let scaled = if rescale != 1.0 {
            match self.axis {
                Axis::X => Vec3::new(rotated.x, rotated.y * rescale, rotated.z * rescale),
                Axis::Y => Vec3::new(rotated.x * rescale, rotated.y, rotated.z * rescale),
                Axis::Z => Vec3::new(rotated.x * rescale, rotated.y * rescale, rotated.z),
            }
        } else {
            rotated
        };

        scaled + origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn test_identity_matrix() {
        let t = BlockTransform::default();
        assert!(t.is_identity());
        assert!(approx(t.matrix() * Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_y_rotation_turns_north_to_east() {
        let t = BlockTransform::new(0, 90, false);
        // North (-Z) ends up facing East (+X).
        assert!(approx(t.matrix() * Vec3::new(0.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_element_rotation_about_origin() {
        let rot = ElementRotation {
            origin: [8.0, 8.0, 8.0],
            axis: Axis::Y,
            angle: 90.0,
            rescale: false,
        };
        // Pivot stays fixed.
        assert!(approx(rot.apply(Vec3::splat(8.0)), Vec3::splat(8.0)));
        assert!(approx(rot.apply(Vec3::new(16.0, 8.0, 8.0)), Vec3::new(8.0, 8.0, 0.0)));
    }
}
