//! # Schematic Resolver
//!
//! Decode Litematica schematic regions and resolve their blocks into
//! textured face geometry using a Minecraft resource pack.
//!
//! ## Overview
//!
//! A region is a palette of block states plus a bit-packed index array.
//! Each voxel's block state is matched against its blockstate definition
//! (variants or multipart), the selected models are flattened through their
//! parent chains, and every element face becomes a [`FaceRecord`] with
//! world-space corners, UVs and the decoded texture it samples.
//!
//! ## Quick Start
//!
//! ```ignore
//! use schematic_resolver::{load_resource_pack, Pipeline, Regions};
//!
//! let pack = load_resource_pack("path/to/pack.zip")?;
//! let regions = Regions::from_json_str(&std::fs::read_to_string("schematic.json")?)?;
//!
//! let pipeline = Pipeline::new(pack);
//! for region in regions.iter() {
//!     let output = pipeline.region_faces(region)?;
//!     println!("{}: {} faces", output.region, output.face_count());
//! }
//! ```
//!
//! ## Custom Asset Sources
//!
//! Anything implementing [`AssetProvider`] can stand in for a loaded
//! [`ResourcePack`]. Fetches go through an [`AssetCache`] so each asset is
//! requested at most once.

pub mod error;
pub mod identifier;
pub mod mesher;
pub mod pipeline;
pub mod provider;
pub mod region;
pub mod resolver;
pub mod resource_pack;
pub mod types;

// Re-export main types for convenience
pub use error::{AssetKind, ResolveError, Result};
pub use identifier::Identifier;
pub use mesher::{BlockType, FaceRecord, PlacedBlock};
pub use pipeline::{BlockFailure, BlockFaces, Pipeline, PipelineConfig, RegionFaces};
pub use provider::{AssetCache, AssetProvider, CacheStats};
pub use region::{BlockEntry, Properties, PropertyKey, PropertyValue, Region, RegionSource, Regions};
pub use resolver::{
    BlockResolver, FirstPicker, ModelResolver, RandomPicker, ResolvedModel, ResolvedPart, SeededPicker,
    VariantPicker,
};
pub use resource_pack::{BlockModel, BlockstateDefinition, ModelElement, ResourcePack};
pub use types::{Axis, BlockPosition, BlockTransform, Direction};

/// Load a resource pack from a file path (ZIP or directory).
pub fn load_resource_pack<P: AsRef<std::path::Path>>(path: P) -> Result<ResourcePack> {
    resource_pack::loader::load_from_path(path)
}

/// Load a resource pack from ZIP bytes.
pub fn load_resource_pack_from_bytes(data: &[u8]) -> Result<ResourcePack> {
    resource_pack::loader::load_from_bytes(data)
}
