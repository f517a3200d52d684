//! Block state and model resolution.
//!
//! This module turns a block id plus its properties into the models it
//! renders: the blockstate picks model variants, and each variant's model
//! chain is flattened into elements with resolved textures.

pub mod model_resolver;
pub mod multipart;
pub mod state_resolver;

pub use model_resolver::{
    resolve_reference, ModelResolver, ResolvedElement, ResolvedFace, ResolvedModel,
    ResolvedTexture, DEFAULT_MAX_INHERITANCE_DEPTH,
};
pub use state_resolver::{FirstPicker, RandomPicker, SeededPicker, StateResolver, VariantPicker};

use state_resolver::pick_one;

use crate::error::{ResolveError, Result};
use crate::identifier::Identifier;
use crate::provider::{AssetCache, AssetProvider, SlotMap};
use crate::region::{BlockEntry, Properties};
use crate::resource_pack::{BlockstateDefinition, ModelVariant};
use crate::types::BlockTransform;
use std::sync::Arc;

/// One model a block renders, with the variant that placed it.
#[derive(Debug, Clone)]
pub struct ResolvedPart {
    pub variant: ModelVariant,
    pub model: Arc<ResolvedModel>,
}

impl ResolvedPart {
    pub fn transform(&self) -> BlockTransform {
        self.variant.transform()
    }
}

/// Every model a block state may render, resolved ahead of the pick.
///
/// One slot per model the state renders, each holding its weighted
/// alternatives. Shareable between voxels of the same state.
#[derive(Debug, Clone, Default)]
pub struct StateCandidates {
    slots: Vec<Vec<ResolvedPart>>,
}

impl StateCandidates {
    pub fn slots(&self) -> &[Vec<ResolvedPart>] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// One alternative per slot.
    pub fn pick(&self, picker: &dyn VariantPicker) -> Vec<ResolvedPart> {
        self.slots
            .iter()
            .filter_map(|alternatives| pick_one(alternatives, picker).cloned())
            .collect()
    }
}

/// Resolved models shared across blocks, keyed by model id.
#[derive(Default)]
pub struct ModelCache {
    slots: SlotMap<ResolvedModel>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_or_resolve<F>(&self, id: &Identifier, resolve: F) -> Result<Arc<ResolvedModel>>
    where
        F: FnOnce() -> Result<Arc<ResolvedModel>>,
    {
        let (outcome, _) = self.slots.get_or_fetch(id.namespace_folder_file(), resolve);
        outcome.map_err(ResolveError::from_shared)
    }
}

/// Resolves blocks to their model parts.
pub struct BlockResolver<'a, P> {
    cache: &'a AssetCache<P>,
    picker: &'a dyn VariantPicker,
    models: Option<&'a ModelCache>,
    max_depth: usize,
    nearest_elements: bool,
}

impl<'a, P: AssetProvider> BlockResolver<'a, P> {
    pub fn new(cache: &'a AssetCache<P>, picker: &'a dyn VariantPicker) -> Self {
        Self {
            cache,
            picker,
            models: None,
            max_depth: DEFAULT_MAX_INHERITANCE_DEPTH,
            nearest_elements: false,
        }
    }

    pub fn with_model_cache(mut self, models: &'a ModelCache) -> Self {
        self.models = Some(models);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_nearest_elements(mut self, nearest_elements: bool) -> Self {
        self.nearest_elements = nearest_elements;
        self
    }

    /// Resolve a block state against an already loaded blockstate definition.
    pub fn resolve(
        &self,
        block: &Identifier,
        properties: &Properties,
        blockstate: &BlockstateDefinition,
    ) -> Result<Vec<ResolvedPart>> {
        let variants = StateResolver::new(self.picker).select(block, blockstate, properties)?;

        variants
            .into_iter()
            .map(|variant| {
                let model = self.resolve_model(&variant.model_id())?;
                Ok(ResolvedPart { variant, model })
            })
            .collect()
    }

    /// Resolve every alternative of a block state without picking.
    pub fn candidates(&self, entry: &BlockEntry) -> Result<StateCandidates> {
        let blockstate = self.cache.blockstate(&entry.identity)?;
        let slots = StateResolver::new(self.picker).candidates(&entry.identity, &blockstate, &entry.properties)?;

        let slots = slots
            .into_iter()
            .map(|alternatives| {
                alternatives
                    .iter()
                    .map(|variant| {
                        let model = self.resolve_model(&variant.model_id())?;
                        Ok(ResolvedPart {
                            variant: variant.clone(),
                            model,
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(StateCandidates { slots })
    }

    /// Fetch the block's blockstate and resolve it.
    pub fn resolve_entry(&self, entry: &BlockEntry) -> Result<Vec<ResolvedPart>> {
        let blockstate = self.cache.blockstate(&entry.identity)?;
        self.resolve(&entry.identity, &entry.properties, &blockstate)
    }

    pub fn resolve_model(&self, id: &Identifier) -> Result<Arc<ResolvedModel>> {
        let resolve = || {
            ModelResolver::new(self.cache)
                .with_max_depth(self.max_depth)
                .with_nearest_elements(self.nearest_elements)
                .resolve(id)
                .map(Arc::new)
        };
        match self.models {
            Some(models) => models.get_or_resolve(id, resolve),
            None => resolve(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource_pack::{BlockModel, ModelElement, ResourcePack, TextureData};

    fn log_pack() -> ResourcePack {
        let mut pack = ResourcePack::new();
        pack.add_blockstate(
            "minecraft",
            "spruce_log",
            serde_json::from_str(
                r#"{ "variants": {
                    "axis=x": { "model": "minecraft:block/spruce_log_horizontal", "x": 90, "y": 90 },
                    "axis=y": { "model": "minecraft:block/spruce_log" },
                    "axis=z": { "model": "minecraft:block/spruce_log_horizontal", "x": 90 }
                } }"#,
            )
            .unwrap(),
        );
        for name in ["block/spruce_log", "block/spruce_log_horizontal"] {
            pack.add_model(
                "minecraft",
                name,
                BlockModel::new()
                    .with_texture("side", "block/spruce_log")
                    .with_element(ModelElement::cube([0.0; 3], [16.0; 3], "#side")),
            );
        }
        pack.add_texture("minecraft", "block/spruce_log", TextureData::solid(16, 16, [90, 60, 30, 255]));
        pack
    }

    #[test]
    fn test_resolve_entry_carries_transform() {
        let cache = AssetCache::new(log_pack());
        let resolver = BlockResolver::new(&cache, &FirstPicker);
        let entry = BlockEntry::from_block_string("minecraft:spruce_log[axis=x]");

        let parts = resolver.resolve_entry(&entry).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].transform(), BlockTransform::new(90, 90, false));
        assert_eq!(parts[0].model.id, Identifier::parse("minecraft:block/spruce_log_horizontal"));
    }

    #[test]
    fn test_model_cache_shares_resolved_models() {
        let cache = AssetCache::new(log_pack());
        let models = ModelCache::new();
        let resolver = BlockResolver::new(&cache, &FirstPicker).with_model_cache(&models);

        let x = resolver
            .resolve_entry(&BlockEntry::from_block_string("spruce_log[axis=x]"))
            .unwrap();
        let z = resolver
            .resolve_entry(&BlockEntry::from_block_string("spruce_log[axis=z]"))
            .unwrap();

        assert!(Arc::ptr_eq(&x[0].model, &z[0].model));
        assert_eq!(models.len(), 1);
    }

    #[test]
    fn test_missing_blockstate_is_asset_fetch() {
        let cache = AssetCache::new(ResourcePack::new());
        let resolver = BlockResolver::new(&cache, &FirstPicker);

        let err = resolver
            .resolve_entry(&BlockEntry::from_block_string("minecraft:unknown"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::AssetFetch { .. }));
    }

    #[test]
    fn test_candidates_keep_every_alternative() {
        let mut pack = log_pack();
        pack.add_blockstate(
            "minecraft",
            "stone",
            serde_json::from_str(
                r#"{ "variants": { "": [
                    { "model": "minecraft:block/spruce_log" },
                    { "model": "minecraft:block/spruce_log", "y": 90 }
                ] } }"#,
            )
            .unwrap(),
        );
        let cache = AssetCache::new(pack);
        let resolver = BlockResolver::new(&cache, &FirstPicker);

        let candidates = resolver
            .candidates(&BlockEntry::from_block_string("stone"))
            .unwrap();
        assert_eq!(candidates.slots().len(), 1);
        assert_eq!(candidates.slots()[0].len(), 2);

        let picked = candidates.pick(&FirstPicker);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].transform(), BlockTransform::default());
    }

    #[test]
    fn test_failed_model_is_not_cached() {
        let cache = AssetCache::new(ResourcePack::new());
        let models = ModelCache::new();
        let resolver = BlockResolver::new(&cache, &FirstPicker).with_model_cache(&models);

        let err = resolver.resolve_model(&Identifier::parse("block/none")).unwrap_err();
        assert!(matches!(err, ResolveError::AssetFetch { .. }));
        assert!(models.is_empty());
    }
}
