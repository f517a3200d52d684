//! Block model parsing.
//!
//! A model file is one node of an inheritance chain: it may name a parent,
//! contribute texture variables and declare cuboid elements. `textures` and
//! `elements` stay `None` when a file omits them, which is different from
//! declaring them empty.

use crate::identifier::Identifier;
use crate::types::{Direction, ElementRotation};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A parsed block model from models/*.json.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockModel {
    #[serde(default)]
    pub parent: Option<String>,

    #[serde(default = "default_ao", rename = "ambientocclusion")]
    pub ambient_occlusion: bool,

    /// Texture variables: concrete texture ids or `#other` references.
    #[serde(default)]
    pub textures: Option<HashMap<String, String>>,

    #[serde(default)]
    pub elements: Option<Vec<ModelElement>>,
}

fn default_ao() -> bool {
    true
}

impl BlockModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_texture(mut self, variable: impl Into<String>, value: impl Into<String>) -> Self {
        self.textures
            .get_or_insert_with(HashMap::new)
            .insert(variable.into(), value.into());
        self
    }

    pub fn with_element(mut self, element: ModelElement) -> Self {
        self.elements.get_or_insert_with(Vec::new).push(element);
        self
    }

    pub fn parent_id(&self) -> Option<Identifier> {
        self.parent.as_deref().map(Identifier::parse)
    }

    /// The chain ends here: no parent, the `block/block` base, or a builtin.
    pub fn is_terminal(&self) -> bool {
        match self.parent.as_deref() {
            None => true,
            Some(parent) => {
                let id = Identifier::parse(parent);
                id.folder_file() == "block/block" || id.folder() == "builtin"
            }
        }
    }
}

/// A cuboid element within a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelElement {
    /// Minimum corner (0-16 range).
    pub from: [f32; 3],
    /// Maximum corner (0-16 range).
    pub to: [f32; 3],
    #[serde(default)]
    pub rotation: Option<ElementRotation>,
    #[serde(default = "default_shade")]
    pub shade: bool,
    #[serde(default)]
    pub faces: HashMap<Direction, ModelFace>,
}

fn default_shade() -> bool {
    true
}

impl ModelElement {
    pub fn new(from: [f32; 3], to: [f32; 3]) -> Self {
        Self {
            from,
            to,
            rotation: None,
            shade: true,
            faces: HashMap::new(),
        }
    }

    /// A box with the same texture variable on all six faces.
    pub fn cube(from: [f32; 3], to: [f32; 3], texture: &str) -> Self {
        let mut element = Self::new(from, to);
        for dir in Direction::ALL {
            element.faces.insert(dir, ModelFace::new(texture));
        }
        element
    }

    pub fn from_vec(&self) -> Vec3 {
        Vec3::from(self.from)
    }

    pub fn to_vec(&self) -> Vec3 {
        Vec3::from(self.to)
    }

    /// Extent of the element in model units.
    pub fn size(&self) -> Vec3 {
        self.to_vec() - self.from_vec()
    }
}

/// A face of a model element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFace {
    /// UV rectangle [u1, v1, u2, v2] in 0-16 range.
    #[serde(default)]
    pub uv: Option<[f32; 4]>,
    /// Texture variable (`#side`) or concrete texture id.
    pub texture: String,
    #[serde(default)]
    pub cullface: Option<Direction>,
    /// UV rotation in degrees (0, 90, 180, 270).
    #[serde(default)]
    pub rotation: i32,
    /// Tint index for biome coloring (-1 = no tint).
    #[serde(default = "default_tint_index")]
    pub tintindex: i32,
}

fn default_tint_index() -> i32 {
    -1
}

impl ModelFace {
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            uv: None,
            texture: texture.into(),
            cullface: None,
            rotation: 0,
            tintindex: -1,
        }
    }

    pub fn has_tint(&self) -> bool {
        self.tintindex >= 0
    }
}
