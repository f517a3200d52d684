//! Face geometry for placed block models.
//!
//! A [`PlacedBlock`] pairs a resolved model with its grid position and
//! blockstate rotation. [`PlacedBlock::faces`] emits one [`FaceRecord`] per
//! element face: where the quad sits in world space, its UVs and the texture
//! it samples.

pub mod placement;
pub mod rings;
pub mod uv;

pub use placement::{element_world_position, face_corners, place_corners};
pub use rings::FaceRings;
pub use uv::{default_uv, mirror_u, rotate_corners, triangulate, uv_corners, UvCorners, UvRect};

use crate::resolver::{ResolvedElement, ResolvedFace, ResolvedModel, ResolvedTexture};
use crate::types::{BlockPosition, BlockTransform, Direction};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Render category of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Fluid,
    Transparent,
    Opaque,
    #[default]
    Default,
    Air,
    Cross,
}

impl BlockType {
    /// Whether faces behind this block can be seen through it.
    pub fn is_see_through(&self) -> bool {
        !matches!(self, BlockType::Opaque | BlockType::Default)
    }
}

/// One textured quad ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct FaceRecord {
    /// Facing in the model's own frame.
    pub facing: Direction,
    /// Facing after the block rotation.
    pub world_facing: Direction,
    /// Center of the owning element in world space.
    pub world_position: Vec3,
    /// Unrotated element size.
    pub size: Vec3,
    /// Quad corners in world space, paired with the UV corners.
    pub corners: [Vec3; 4],
    /// Per-vertex UVs of the two triangles P0 P1 P2 and P1 P3 P2.
    pub uvs: [[f32; 2]; 6],
    /// Extra texture rotation in radians from the block rotation.
    pub texture_rotation: f32,
    pub cullface: Option<Direction>,
    pub texture: ResolvedTexture,
    pub tintindex: i32,
}

impl FaceRecord {
    pub fn is_tinted(&self) -> bool {
        self.tintindex >= 0
    }
}

/// A resolved model placed in the world.
#[derive(Debug, Clone)]
pub struct PlacedBlock {
    pub model: Arc<ResolvedModel>,
    pub grid: BlockPosition,
    pub transform: BlockTransform,
    pub block_type: BlockType,
}

impl PlacedBlock {
    pub fn new(model: Arc<ResolvedModel>, grid: BlockPosition, transform: BlockTransform) -> Self {
        Self {
            model,
            grid,
            transform,
            block_type: BlockType::Default,
        }
    }

    pub fn with_block_type(mut self, block_type: BlockType) -> Self {
        self.block_type = block_type;
        self
    }

    /// Every face of every element, elements in model order and faces in
    /// render order within each element.
    pub fn faces(&self) -> Vec<FaceRecord> {
        let rings = FaceRings::new(self.transform);
        let mut records = Vec::new();
        for element in &self.model.elements {
            self.element_faces(element, &rings, &mut records);
        }
        records
    }

    fn element_faces(&self, element: &ResolvedElement, rings: &FaceRings, out: &mut Vec<FaceRecord>) {
        let world_position = element_world_position(self.grid, element.from, element.to, &self.transform);
        let size = element.size();

        for (facing, face) in element.faces_in_render_order() {
            out.push(FaceRecord {
                facing,
                world_facing: facing.rotate_by_transform(self.transform.x, self.transform.y),
                world_position,
                size,
                corners: place_corners(
                    face_corners(facing, element.from, element.to),
                    element.rotation.as_ref(),
                    &self.transform,
                    self.grid,
                ),
                uvs: triangulate(&face_uv(facing, element, face)),
                texture_rotation: rings.texture_rotation(facing),
                cullface: face.cullface,
                texture: face.texture.clone(),
                tintindex: face.tintindex,
            });
        }
    }
}

fn face_uv(facing: Direction, element: &ResolvedElement, face: &ResolvedFace) -> UvCorners {
    let rect = face
        .uv
        .unwrap_or_else(|| default_uv(facing, element.from, element.to));
    uv_corners(rect, face.rotation, face.texture.height())
}
