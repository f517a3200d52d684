//! Model inheritance and texture resolution.

use crate::error::{ResolveError, Result};
use crate::identifier::Identifier;
use crate::provider::{AssetCache, AssetProvider};
use crate::resource_pack::{AnimationMeta, ModelElement, ModelFace, TextureData};
use crate::types::{Direction, ElementRotation};
use glam::Vec3;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Default bound on parent links followed from a model.
pub const DEFAULT_MAX_INHERITANCE_DEPTH: usize = 32;

/// A texture reference resolved to its decoded image.
#[derive(Debug, Clone)]
pub struct ResolvedTexture {
    pub id: Identifier,
    pub asset: Arc<TextureData>,
    /// Present for animation strips.
    pub animation: Option<Arc<AnimationMeta>>,
}

impl ResolvedTexture {
    pub fn width(&self) -> u32 {
        self.asset.width
    }

    pub fn height(&self) -> u32 {
        self.asset.height
    }

    pub fn is_animated(&self) -> bool {
        self.animation.is_some()
    }
}

impl Serialize for ResolvedTexture {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResolvedTexture", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("width", &self.asset.width)?;
        state.serialize_field("height", &self.asset.height)?;
        state.serialize_field("animation", &self.animation.as_deref())?;
        state.end()
    }
}

/// A face whose texture variable has been resolved.
#[derive(Debug, Clone)]
pub struct ResolvedFace {
    pub uv: Option<[f32; 4]>,
    pub texture: ResolvedTexture,
    pub cullface: Option<Direction>,
    /// UV rotation in degrees.
    pub rotation: i32,
    pub tintindex: i32,
}

/// An element with resolved faces.
#[derive(Debug, Clone)]
pub struct ResolvedElement {
    pub from: Vec3,
    pub to: Vec3,
    pub rotation: Option<ElementRotation>,
    pub shade: bool,
    pub faces: BTreeMap<Direction, ResolvedFace>,
}

impl ResolvedElement {
    pub fn size(&self) -> Vec3 {
        self.to - self.from
    }

    /// Faces present on this element, in emission order.
    pub fn faces_in_render_order(&self) -> impl Iterator<Item = (Direction, &ResolvedFace)> {
        Direction::RENDER_ORDER
            .into_iter()
            .filter_map(move |dir| self.faces.get(&dir).map(|face| (dir, face)))
    }
}

/// A model with its inheritance chain flattened.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub id: Identifier,
    pub ambient_occlusion: bool,
    /// Merged texture table with references followed to concrete ids.
    /// Variables whose reference chain dangles are left out.
    pub textures: BTreeMap<String, String>,
    pub elements: Vec<ResolvedElement>,
}

/// Walks model parent chains and resolves face textures.
pub struct ModelResolver<'a, P> {
    cache: &'a AssetCache<P>,
    max_depth: usize,
    nearest_elements: bool,
}

impl<'a, P: AssetProvider> ModelResolver<'a, P> {
    pub fn new(cache: &'a AssetCache<P>) -> Self {
        Self {
            cache,
            max_depth: DEFAULT_MAX_INHERITANCE_DEPTH,
            nearest_elements: false,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Take elements from the nearest node that declares them instead of
    /// requiring them on the terminal node.
    pub fn with_nearest_elements(mut self, nearest_elements: bool) -> Self {
        self.nearest_elements = nearest_elements;
        self
    }

    /// Resolve a model with everything it inherits.
    ///
    /// Elements come from the terminal node of the chain, which fails with
    /// [`ResolveError::MissingElements`] when it has none.
    pub fn resolve(&self, model_id: &Identifier) -> Result<ResolvedModel> {
        let model_name = model_id.to_string();
        let mut visited = HashSet::new();
        let mut current = model_id.clone();
        let mut depth = 0;

        let mut textures: Option<HashMap<String, String>> = None;
        let mut elements: Option<Vec<ModelElement>> = None;
        let mut ambient_occlusion = None;

        loop {
            let key = current.namespace_folder_file().to_string();
            if !visited.insert(key.clone()) {
                return Err(ResolveError::ModelInheritanceCycle(key));
            }

            let node = self.cache.model(&current)?;
            log::debug!("Model chain {}: depth {} at {}", model_name, depth, key);

            // Entries already collected come from nearer nodes and win.
            if let Some(node_textures) = &node.textures {
                let merged = textures.get_or_insert_with(HashMap::new);
                for (variable, value) in node_textures {
                    merged
                        .entry(variable.clone())
                        .or_insert_with(|| value.clone());
                }
            }
            if self.nearest_elements && elements.is_none() {
                elements = node.elements.clone();
            }
            ambient_occlusion.get_or_insert(node.ambient_occlusion);

            if node.is_terminal() {
                if !self.nearest_elements {
                    elements = node.elements.clone();
                }
                break;
            }
            let Some(parent) = node.parent_id() else {
                break;
            };
            depth += 1;
            if depth > self.max_depth {
                return Err(ResolveError::ModelInheritanceTooDeep {
                    model: model_name,
                    depth: self.max_depth,
                });
            }
            current = parent;
        }

        let elements = elements.ok_or_else(|| ResolveError::MissingElements {
            model: model_name.clone(),
        })?;
        let textures = textures.ok_or_else(|| ResolveError::MissingTextures {
            model: model_name.clone(),
        })?;

        let resolved_elements = elements
            .iter()
            .map(|element| self.resolve_element(&model_name, element, &textures))
            .collect::<Result<Vec<_>>>()?;

        let table = textures
            .keys()
            .filter_map(|variable| {
                resolve_reference(&textures, &format!("#{}", variable))
                    .map(|value| (variable.clone(), value.to_string()))
            })
            .collect();

        Ok(ResolvedModel {
            id: model_id.clone(),
            ambient_occlusion: ambient_occlusion.unwrap_or(true),
            textures: table,
            elements: resolved_elements,
        })
    }

    fn resolve_element(
        &self,
        model: &str,
        element: &ModelElement,
        textures: &HashMap<String, String>,
    ) -> Result<ResolvedElement> {
        let mut faces = BTreeMap::new();
        for (direction, face) in &element.faces {
            faces.insert(*direction, self.resolve_face(model, face, textures)?);
        }
        Ok(ResolvedElement {
            from: element.from_vec(),
            to: element.to_vec(),
            rotation: element.rotation.clone(),
            shade: element.shade,
            faces,
        })
    }

    fn resolve_face(
        &self,
        model: &str,
        face: &ModelFace,
        textures: &HashMap<String, String>,
    ) -> Result<ResolvedFace> {
        let variable = face.texture.trim_start_matches('#');
        let value = resolve_reference(textures, &face.texture).ok_or_else(|| {
            ResolveError::MissingTextureLink {
                variable: variable.to_string(),
                model: model.to_string(),
            }
        })?;

        Ok(ResolvedFace {
            uv: face.uv,
            texture: self.resolve_texture(&Identifier::parse(value))?,
            cullface: face.cullface,
            rotation: face.rotation,
            tintindex: face.tintindex,
        })
    }

    /// Fetch a texture, plus its animation metadata when it is a frame strip.
    pub fn resolve_texture(&self, id: &Identifier) -> Result<ResolvedTexture> {
        let asset = self.cache.texture(id)?;
        let animation = if asset.is_animated_strip() {
            Some(self.cache.animation_meta(id)?)
        } else {
            None
        };
        Ok(ResolvedTexture {
            id: id.clone(),
            asset,
            animation,
        })
    }
}

/// Follow `#variable` links through `table` to a concrete texture id.
///
/// A value without `#` is already concrete. Returns `None` when a link points
/// at a missing variable or the links loop.
pub fn resolve_reference<'t>(table: &'t HashMap<String, String>, value: &'t str) -> Option<&'t str> {
    let mut current = value;
    for _ in 0..=table.len() {
        match current.strip_prefix('#') {
            None => return Some(current),
            Some(variable) => current = table.get(variable)?.as_str(),
        }
    }
    None
}
