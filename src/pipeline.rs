//! Region to face records, end to end.
//!
//! [`Pipeline`] owns the asset cache, the resolved model and block state
//! caches and the variant picker. It walks a region's voxels, resolves each
//! block state to its models, classifies the block and emits the faces of
//! every placed model. Block states resolve once; alternatives are picked
//! per voxel.

use crate::error::{ResolveError, Result};
use crate::identifier::Identifier;
use crate::mesher::{BlockType, FaceRecord, PlacedBlock};
use crate::provider::{AssetCache, AssetProvider, SlotMap};
use crate::region::{BlockEntry, Properties, Region, RegionSource, Voxel};
use crate::resolver::{
    BlockResolver, ModelCache, RandomPicker, ResolvedElement, ResolvedPart, SeededPicker, StateCandidates,
    VariantPicker, DEFAULT_MAX_INHERITANCE_DEPTH,
};
use crate::types::{BlockPosition, BLOCK_UNITS};
use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Leave air blocks out of the output.
    pub skip_air: bool,
    /// Record failed blocks and keep going instead of aborting.
    pub skip_failures: bool,
    /// Bound on model parent links.
    pub max_inheritance_depth: usize,
    /// Take model elements from the nearest node declaring them rather than
    /// the end of the parent chain.
    pub nearest_elements: bool,
    /// Seed for choosing between weighted alternatives. Unseeded picks are random.
    pub variant_seed: Option<u64>,
    /// Block ids rendered as see-through.
    pub transparent_blocks: Vec<String>,
    /// Block ids drawn as crossed planes.
    pub cross_blocks: Vec<String>,
    /// Block ids treated as fluids.
    pub fluid_blocks: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip_air: true,
            skip_failures: true,
            max_inheritance_depth: DEFAULT_MAX_INHERITANCE_DEPTH,
            nearest_elements: false,
            variant_seed: None,
            transparent_blocks: Vec::new(),
            cross_blocks: Vec::new(),
            fluid_blocks: vec!["minecraft:water".to_string(), "minecraft:lava".to_string()],
        }
    }
}

impl PipelineConfig {
    pub fn with_skip_air(mut self, skip_air: bool) -> Self {
        self.skip_air = skip_air;
        self
    }

    pub fn with_skip_failures(mut self, skip_failures: bool) -> Self {
        self.skip_failures = skip_failures;
        self
    }

    pub fn with_max_inheritance_depth(mut self, depth: usize) -> Self {
        self.max_inheritance_depth = depth;
        self
    }

    pub fn with_nearest_elements(mut self, nearest_elements: bool) -> Self {
        self.nearest_elements = nearest_elements;
        self
    }

    pub fn with_variant_seed(mut self, seed: u64) -> Self {
        self.variant_seed = Some(seed);
        self
    }

    pub fn with_transparent_block(mut self, id: impl Into<String>) -> Self {
        self.transparent_blocks.push(id.into());
        self
    }

    pub fn with_cross_block(mut self, id: impl Into<String>) -> Self {
        self.cross_blocks.push(id.into());
        self
    }

    pub fn with_fluid_block(mut self, id: impl Into<String>) -> Self {
        self.fluid_blocks.push(id.into());
        self
    }

    /// Load from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A block that could not be resolved.
#[derive(Debug, Error, Serialize)]
#[error("{identity}[{properties}] at {}, {}, {}: {error}", .position.x, .position.y, .position.z)]
pub struct BlockFailure {
    pub position: BlockPosition,
    pub identity: Identifier,
    pub properties: Properties,
    #[source]
    #[serde(serialize_with = "serialize_error")]
    pub error: ResolveError,
}

fn serialize_error<S: Serializer>(error: &ResolveError, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Faces emitted for one block.
#[derive(Debug, Clone, Serialize)]
pub struct BlockFaces {
    pub position: BlockPosition,
    pub identity: Identifier,
    pub properties: Properties,
    pub block_type: BlockType,
    pub faces: Vec<FaceRecord>,
}

/// Output for one region.
#[derive(Debug, Default, Serialize)]
pub struct RegionFaces {
    pub region: String,
    pub blocks: Vec<BlockFaces>,
    pub failures: Vec<BlockFailure>,
}

impl RegionFaces {
    pub fn face_count(&self) -> usize {
        self.blocks.iter().map(|b| b.faces.len()).sum()
    }
}

enum VoxelOutcome {
    Skipped,
    Faces(BlockFaces),
    Failed(BlockFailure),
}

/// Resolves regions into face records against one asset provider.
pub struct Pipeline<P> {
    config: PipelineConfig,
    assets: AssetCache<P>,
    models: ModelCache,
    states: SlotMap<StateCandidates>,
    picker: Box<dyn VariantPicker>,
    transparent: HashSet<String>,
    cross: HashSet<String>,
    fluid: HashSet<String>,
}

impl<P: AssetProvider> Pipeline<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, PipelineConfig::default())
    }

    pub fn with_config(provider: P, config: PipelineConfig) -> Self {
        let picker: Box<dyn VariantPicker> = match config.variant_seed {
            Some(seed) => Box::new(SeededPicker::new(seed)),
            None => Box::new(RandomPicker),
        };
        Self {
            transparent: id_set(&config.transparent_blocks),
            cross: id_set(&config.cross_blocks),
            fluid: id_set(&config.fluid_blocks),
            config,
            assets: AssetCache::new(provider),
            models: ModelCache::new(),
            states: SlotMap::default(),
            picker,
        }
    }

    /// Replace the variant picker chosen from the configuration.
    pub fn with_picker(mut self, picker: impl VariantPicker + 'static) -> Self {
        self.picker = Box::new(picker);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetCache<P> {
        &self.assets
    }

    pub fn models(&self) -> &ModelCache {
        &self.models
    }

    fn resolver(&self) -> BlockResolver<'_, P> {
        BlockResolver::new(&self.assets, self.picker.as_ref())
            .with_model_cache(&self.models)
            .with_max_depth(self.config.max_inheritance_depth)
            .with_nearest_elements(self.config.nearest_elements)
    }

    /// Every alternative a block state may render, cached by state.
    pub fn candidates(&self, entry: &BlockEntry) -> Result<Arc<StateCandidates>> {
        let (outcome, _) = self.states.get_or_fetch(&entry.state_key(), || {
            self.resolver().candidates(entry).map(Arc::new)
        });
        outcome.map_err(ResolveError::from_shared)
    }

    /// Resolve a block state to the models it renders.
    pub fn resolve(&self, entry: &BlockEntry) -> Result<Vec<ResolvedPart>> {
        Ok(self.candidates(entry)?.pick(self.picker.as_ref()))
    }

    /// Number of distinct block states resolved so far.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Classify a resolved block.
    ///
    /// Configured id lists take precedence. Otherwise a block with any
    /// translucent face texture is transparent, and one with a full cube
    /// element is opaque.
    pub fn classify(&self, entry: &BlockEntry, parts: &[ResolvedPart]) -> BlockType {
        if entry.is_air() {
            return BlockType::Air;
        }
        let id = entry.identity.namespace_file();
        if self.fluid.contains(id) {
            return BlockType::Fluid;
        }
        if self.cross.contains(id) {
            return BlockType::Cross;
        }
        if self.transparent.contains(id) {
            return BlockType::Transparent;
        }

        let elements = || parts.iter().flat_map(|part| part.model.elements.iter());
        let translucent = elements()
            .flat_map(|element| element.faces.values())
            .any(|face| face.texture.asset.has_transparency());
        if translucent {
            BlockType::Transparent
        } else if elements().any(is_full_cube) {
            BlockType::Opaque
        } else {
            BlockType::Default
        }
    }

    /// Resolve and place a block at a grid position.
    pub fn place(&self, entry: &BlockEntry, position: BlockPosition) -> Result<Vec<PlacedBlock>> {
        let parts = self.resolve(entry)?;
        let block_type = self.classify(entry, &parts);
        Ok(parts
            .into_iter()
            .map(|part| {
                let transform = part.transform();
                PlacedBlock::new(part.model, position, transform).with_block_type(block_type)
            })
            .collect())
    }

    /// All faces of a block at a grid position.
    pub fn block_faces(&self, entry: &BlockEntry, position: BlockPosition) -> Result<BlockFaces> {
        let placed = self.place(entry, position)?;
        let block_type = placed
            .first()
            .map_or_else(|| self.classify(entry, &[]), |block| block.block_type);

        Ok(BlockFaces {
            position,
            identity: entry.identity.clone(),
            properties: entry.properties.clone(),
            block_type,
            faces: placed.iter().flat_map(PlacedBlock::faces).collect(),
        })
    }

    fn process(&self, voxel: Voxel<'_>) -> VoxelOutcome {
        let entry = voxel.entry;
        if entry.is_air() {
            if self.config.skip_air {
                return VoxelOutcome::Skipped;
            }
            return VoxelOutcome::Faces(BlockFaces {
                position: voxel.position,
                identity: entry.identity.clone(),
                properties: entry.properties.clone(),
                block_type: BlockType::Air,
                faces: Vec::new(),
            });
        }

        match self.block_faces(entry, voxel.position) {
            Ok(faces) => VoxelOutcome::Faces(faces),
            Err(error) => VoxelOutcome::Failed(BlockFailure {
                position: voxel.position,
                identity: entry.identity.clone(),
                properties: entry.properties.clone(),
                error,
            }),
        }
    }

    /// Faces of every block in a region, in voxel order.
    ///
    /// Undecodable region data is always an error. A block that fails to
    /// resolve is recorded and skipped when `skip_failures` is set and aborts
    /// the region otherwise.
    pub fn region_faces(&self, region: &Region) -> Result<RegionFaces> {
        let mut output = RegionFaces {
            region: region.name.clone(),
            ..RegionFaces::default()
        };
        for voxel in region.voxels() {
            let outcome = self.process(voxel?);
            self.collect(&mut output, outcome)?;
        }
        self.finish(&output);
        Ok(output)
    }

    /// Parallel counterpart of [`region_faces`](Self::region_faces) with the
    /// same output order.
    pub fn par_region_faces(&self, region: &Region) -> Result<RegionFaces> {
        let mut outcomes = region
            .par_voxels()
            .map(|voxel| voxel.map(|voxel| (voxel.index, self.process(voxel))))
            .collect::<Result<Vec<_>>>()?;
        outcomes.sort_unstable_by_key(|(index, _)| *index);

        let mut output = RegionFaces {
            region: region.name.clone(),
            ..RegionFaces::default()
        };
        for (_, outcome) in outcomes {
            self.collect(&mut output, outcome)?;
        }
        self.finish(&output);
        Ok(output)
    }

    /// Faces for one named region, or for every region when no name is given.
    pub fn source_faces<S: RegionSource>(&self, source: &S, name: Option<&str>) -> Result<Vec<RegionFaces>> {
        let names = match name {
            Some(name) => vec![name],
            None => source.region_names(),
        };
        names
            .into_iter()
            .map(|name| {
                let region = source.region(name).ok_or_else(|| ResolveError::InvalidRegion {
                    name: name.to_string(),
                    reason: "no such region".to_string(),
                })?;
                self.region_faces(region)
            })
            .collect()
    }

    fn collect(&self, output: &mut RegionFaces, outcome: VoxelOutcome) -> Result<()> {
        match outcome {
            VoxelOutcome::Skipped => {}
            VoxelOutcome::Faces(faces) => output.blocks.push(faces),
            VoxelOutcome::Failed(failure) if self.config.skip_failures => {
                log::warn!("Skipping block in region {}: {}", output.region, failure);
                output.failures.push(failure);
            }
            VoxelOutcome::Failed(failure) => return Err(ResolveError::BlockFailed(Box::new(failure))),
        }
        Ok(())
    }

    fn finish(&self, output: &RegionFaces) {
        log::debug!(
            "Region {}: {} blocks, {} faces, {} failures, {} states and {} models cached",
            output.region,
            output.blocks.len(),
            output.face_count(),
            output.failures.len(),
            self.states.len(),
            self.models.len()
        );
    }
}

fn id_set(ids: &[String]) -> HashSet<String> {
    ids.iter()
        .map(|id| Identifier::parse(id).namespace_file().to_string())
        .collect()
}

fn is_full_cube(element: &ResolvedElement) -> bool {
    element.rotation.is_none()
        && element.from == Vec3::ZERO
        && element.to == Vec3::splat(BLOCK_UNITS)
        && element.faces.len() == 6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FirstPicker;
    use crate::resource_pack::{BlockModel, ModelElement, ResourcePack, TextureData};
    use crate::types::Direction;
    use glam::IVec3;

    fn test_pack() -> ResourcePack {
        let mut pack = ResourcePack::new();
        pack.add_model(
            "minecraft",
            "block/cube_all",
            BlockModel::new().with_element(ModelElement::cube([0.0; 3], [16.0; 3], "#all")),
        );
        for (name, rgba) in [("stone", [128, 128, 128, 255]), ("glass", [255, 255, 255, 40])] {
            pack.add_blockstate(
                "minecraft",
                name,
                serde_json::from_str(&format!(r#"{{ "variants": {{ "": {{ "model": "block/{name}" }} }} }}"#))
                    .unwrap(),
            );
            pack.add_model(
                "minecraft",
                &format!("block/{name}"),
                BlockModel::new()
                    .with_parent("block/cube_all")
                    .with_texture("all", format!("block/{name}")),
            );
            pack.add_texture("minecraft", &format!("block/{name}"), TextureData::solid(16, 16, rgba));
        }
        pack
    }

    fn region(palette: &[&str], indices: &[usize]) -> Region {
        Region::from_indices(
            "Main",
            IVec3::new(indices.len() as i32, 1, 1),
            IVec3::new(0, 64, 0),
            palette.iter().map(|s| BlockEntry::from_block_string(s)).collect(),
            indices,
        )
    }

    #[test]
    fn test_region_faces_skips_air() {
        let pipeline = Pipeline::new(test_pack());
        let region = region(&["minecraft:air", "minecraft:stone"], &[1, 0, 1]);

        let output = pipeline.region_faces(&region).unwrap();
        assert_eq!(output.blocks.len(), 2);
        assert_eq!(output.face_count(), 12);
        assert!(output.failures.is_empty());

        let first = &output.blocks[0];
        assert_eq!(first.position, BlockPosition::new(0, 64, 0));
        assert_eq!(first.block_type, BlockType::Opaque);
        assert_eq!(first.faces[0].facing, Direction::East);
        assert_eq!(output.blocks[1].position, BlockPosition::new(2, 64, 0));

        // Both stone blocks share one resolved state and model.
        assert_eq!(pipeline.state_count(), 1);
        assert_eq!(pipeline.models().len(), 1);
    }

    #[test]
    fn test_air_kept_when_configured() {
        let pipeline = Pipeline::with_config(test_pack(), PipelineConfig::default().with_skip_air(false));
        let output = pipeline.region_faces(&region(&["minecraft:air"], &[0, 0])).unwrap();
        assert_eq!(output.blocks.len(), 2);
        assert!(output.blocks.iter().all(|b| b.block_type == BlockType::Air && b.faces.is_empty()));
    }

    #[test]
    fn test_failures_are_recorded_or_fatal() {
        let region = region(&["minecraft:stone", "minecraft:missing[facing=up]"], &[0, 1]);

        let lenient = Pipeline::new(test_pack());
        let output = lenient.region_faces(&region).unwrap();
        assert_eq!(output.blocks.len(), 1);
        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.failures[0].position, BlockPosition::new(1, 64, 0));
        assert!(matches!(output.failures[0].error, ResolveError::AssetFetch { .. }));

        let strict = Pipeline::with_config(test_pack(), PipelineConfig::default().with_skip_failures(false));
        let err = strict.region_faces(&region).unwrap_err();
        assert!(matches!(err, ResolveError::BlockFailed(_)));
        assert!(matches!(err.root_cause(), ResolveError::ResourceNotFound(_)));
    }

    #[test]
    fn test_classification() {
        let pipeline = Pipeline::with_config(
            test_pack(),
            PipelineConfig::default().with_cross_block("stone"),
        );
        let glass = BlockEntry::from_block_string("minecraft:glass");
        let parts = pipeline.resolve(&glass).unwrap();
        assert_eq!(pipeline.classify(&glass, &parts), BlockType::Transparent);

        let stone = BlockEntry::from_block_string("stone");
        let parts = pipeline.resolve(&stone).unwrap();
        assert_eq!(pipeline.classify(&stone, &parts), BlockType::Cross);

        let water = BlockEntry::from_block_string("minecraft:water[level=0]");
        assert_eq!(pipeline.classify(&water, &[]), BlockType::Fluid);
        assert_eq!(pipeline.classify(&BlockEntry::from_block_string("air"), &[]), BlockType::Air);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let pipeline = Pipeline::new(test_pack()).with_picker(FirstPicker);
        let region = region(
            &["minecraft:stone", "minecraft:glass", "minecraft:air"],
            &[0, 1, 2, 1, 0, 0, 2, 1],
        );

        let sequential = pipeline.region_faces(&region).unwrap();
        let parallel = pipeline.par_region_faces(&region).unwrap();
        let positions = |output: &RegionFaces| output.blocks.iter().map(|b| b.position).collect::<Vec<_>>();
        assert_eq!(positions(&sequential), positions(&parallel));
        assert_eq!(sequential.face_count(), parallel.face_count());
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let config = PipelineConfig::from_json_str(r#"{ "skip_air": false, "variant_seed": 42 }"#).unwrap();
        assert!(!config.skip_air);
        assert!(config.skip_failures);
        assert_eq!(config.variant_seed, Some(42));
        assert_eq!(config.max_inheritance_depth, DEFAULT_MAX_INHERITANCE_DEPTH);
        assert!(!config.nearest_elements);
    }

    #[test]
    fn test_output_serializes() {
        let pipeline = Pipeline::new(test_pack());
        let region = region(&["minecraft:stone", "minecraft:missing"], &[0, 1]);
        let output = pipeline.region_faces(&region).unwrap();

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["region"], "Main");
        assert_eq!(json["blocks"][0]["block_type"], "opaque");
        assert_eq!(json["blocks"][0]["faces"].as_array().unwrap().len(), 6);
        assert!(json["failures"][0]["error"].as_str().unwrap().contains("missing"));
    }
}
