//! Resource pack loading and parsing.
//!
//! This module handles loading Minecraft resource packs (ZIP files or directories)
//! and parsing their contents: blockstates, models, textures and texture
//! animation metadata. A loaded [`ResourcePack`] serves as an
//! [`AssetProvider`].

pub mod blockstate;
pub mod loader;
pub mod model;
pub mod texture;

pub use blockstate::{
    ApplyValue, BlockstateDefinition, Clause, ModelVariant, MultipartCase, MultipartCondition,
    VariantRule,
};
pub use model::{BlockModel, ModelElement, ModelFace};
pub use texture::{is_animated_strip, AnimationFrame, AnimationMeta, TextureData};

use crate::error::{ResolveError, Result};
use crate::identifier::Identifier;
use crate::provider::AssetProvider;
use std::collections::HashMap;
use std::sync::Arc;

type Namespaced<T> = HashMap<String, HashMap<String, Arc<T>>>;

/// A loaded Minecraft resource pack.
///
/// Blockstates are keyed by namespace and block file name; models, textures
/// and animation metadata by namespace and `folder/file` path.
#[derive(Debug, Default, Clone)]
pub struct ResourcePack {
    pub blockstates: Namespaced<BlockstateDefinition>,
    pub models: Namespaced<BlockModel>,
    pub textures: Namespaced<TextureData>,
    pub animations: Namespaced<AnimationMeta>,
}

fn lookup<'a, T>(map: &'a Namespaced<T>, namespace: &str, path: &str) -> Option<&'a Arc<T>> {
    map.get(namespace).and_then(|ns| ns.get(path))
}

fn insert<T>(map: &mut Namespaced<T>, namespace: &str, path: &str, value: T) {
    map.entry(namespace.to_string())
        .or_default()
        .insert(path.to_string(), Arc::new(value));
}

fn count<T>(map: &Namespaced<T>) -> usize {
    map.values().map(|m| m.len()).sum()
}

impl ResourcePack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a blockstate definition by block id (e.g., "minecraft:stone").
    pub fn get_blockstate(&self, id: &Identifier) -> Option<&Arc<BlockstateDefinition>> {
        lookup(&self.blockstates, id.namespace(), id.file()?)
    }

    /// Get a model by id (e.g., "minecraft:block/stone").
    pub fn get_model(&self, id: &Identifier) -> Option<&Arc<BlockModel>> {
        lookup(&self.models, id.namespace(), id.folder_file())
    }

    pub fn get_texture(&self, id: &Identifier) -> Option<&Arc<TextureData>> {
        lookup(&self.textures, id.namespace(), id.folder_file())
    }

    pub fn get_animation(&self, id: &Identifier) -> Option<&Arc<AnimationMeta>> {
        lookup(&self.animations, id.namespace(), id.folder_file())
    }

    pub fn add_blockstate(&mut self, namespace: &str, block_id: &str, definition: BlockstateDefinition) {
        insert(&mut self.blockstates, namespace, block_id, definition);
    }

    pub fn add_model(&mut self, namespace: &str, model_path: &str, model: BlockModel) {
        insert(&mut self.models, namespace, model_path, model);
    }

    pub fn add_texture(&mut self, namespace: &str, texture_path: &str, texture: TextureData) {
        insert(&mut self.textures, namespace, texture_path, texture);
    }

    pub fn add_animation(&mut self, namespace: &str, texture_path: &str, meta: AnimationMeta) {
        insert(&mut self.animations, namespace, texture_path, meta);
    }

    pub fn blockstate_count(&self) -> usize {
        count(&self.blockstates)
    }

    pub fn model_count(&self) -> usize {
        count(&self.models)
    }

    pub fn texture_count(&self) -> usize {
        count(&self.textures)
    }

    /// All namespaces in the resource pack, sorted.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<_> = self
            .blockstates
            .keys()
            .chain(self.models.keys())
            .chain(self.textures.keys())
            .map(|s| s.as_str())
            .collect();
        namespaces.sort();
        namespaces.dedup();
        namespaces
    }
}

fn not_found(kind: &str, id: &Identifier) -> ResolveError {
    ResolveError::ResourceNotFound(format!("{} {}", kind, id))
}

impl AssetProvider for ResourcePack {
    fn blockstate(&self, id: &Identifier) -> Result<Arc<BlockstateDefinition>> {
        id.file_name()?;
        self.get_blockstate(id)
            .cloned()
            .ok_or_else(|| not_found("blockstate", id))
    }

    fn model(&self, id: &Identifier) -> Result<Arc<BlockModel>> {
        id.file_name()?;
        self.get_model(id).cloned().ok_or_else(|| not_found("model", id))
    }

    fn texture(&self, id: &Identifier) -> Result<Arc<TextureData>> {
        id.file_name()?;
        self.get_texture(id)
            .cloned()
            .ok_or_else(|| not_found("texture", id))
    }

    fn animation_meta(&self, id: &Identifier) -> Result<Arc<AnimationMeta>> {
        id.file_name()?;
        self.get_animation(id)
            .cloned()
            .ok_or_else(|| not_found("animation metadata", id))
    }
}
