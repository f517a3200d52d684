//! Error types for schematic decoding and model resolution.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias using ResolveError.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// The kind of asset an [`AssetProvider`](crate::provider::AssetProvider) was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Blockstate,
    Model,
    Texture,
    AnimationMeta,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Blockstate => write!(f, "blockstate"),
            AssetKind::Model => write!(f, "model"),
            AssetKind::Texture => write!(f, "texture"),
            AssetKind::AnimationMeta => write!(f, "animation metadata"),
        }
    }
}

/// Main error type for decoding and resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Identifier string had no usable `file` component.
    #[error("Malformed identifier: {0:?}")]
    MalformedIdentifier(String),

    /// No variant key matched the block's properties.
    #[error("No matching variant for {block} with properties [{properties}]")]
    NoMatchingVariant { block: String, properties: String },

    /// The terminal node of a model chain has no elements.
    #[error("Model {model} has no elements at the end of its inheritance chain")]
    MissingElements { model: String },

    /// No node of a model chain defines any textures.
    #[error("Model {model} has no texture table anywhere in its inheritance chain")]
    MissingTextures { model: String },

    /// A face references a texture variable absent from the merged table.
    #[error("Texture variable #{variable} is not defined for model {model}")]
    MissingTextureLink { variable: String, model: String },

    /// The asset provider failed to supply an asset.
    #[error("Failed to fetch {kind} {id}: {source}")]
    AssetFetch {
        kind: AssetKind,
        id: String,
        #[source]
        source: Arc<ResolveError>,
    },

    /// A packed entry decoded to a value outside the palette.
    #[error("Packed entry {index} decoded to {value}, palette has {palette_len} entries")]
    InvalidPackedIndex {
        index: usize,
        value: u64,
        palette_len: usize,
    },

    /// Model parents loop back onto an already visited model.
    #[error("Model inheritance cycle through {0}")]
    ModelInheritanceCycle(String),

    /// Model inheritance chain exceeded the configured depth.
    #[error("Model inheritance too deep (more than {depth} levels): {model}")]
    ModelInheritanceTooDeep { model: String, depth: usize },

    /// Asset not present in the resource pack.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Invalid resource pack structure.
    #[error("Invalid resource pack: {0}")]
    InvalidResourcePack(String),

    /// Region data that cannot be interpreted.
    #[error("Invalid region {name}: {reason}")]
    InvalidRegion { name: String, reason: String },

    /// Failed to read or parse a ZIP archive.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read or process an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A block failed while processing a region and failures were not skipped.
    #[error("{0}")]
    BlockFailed(Box<crate::pipeline::BlockFailure>),

    /// A failure handed to several callers waiting on the same cache slot.
    #[error(transparent)]
    Shared(Arc<ResolveError>),
}

impl ResolveError {
    /// Wrap a provider failure with the asset it was fetching.
    pub fn fetch(kind: AssetKind, id: impl Into<String>, source: impl Into<Arc<ResolveError>>) -> Self {
        ResolveError::AssetFetch {
            kind,
            id: id.into(),
            source: source.into(),
        }
    }

    /// Walk `AssetFetch` and other wrappers down to the underlying failure.
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            ResolveError::AssetFetch { source, .. } => source.root_cause(),
            ResolveError::Shared(inner) => inner.root_cause(),
            ResolveError::BlockFailed(failure) => failure.error.root_cause(),
            other => other,
        }
    }

    /// Take a failure back out of a shared slot, unwrapping it when this is
    /// the last reference.
    pub fn from_shared(err: Arc<ResolveError>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(ResolveError::Shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_wraps_and_unwraps() {
        let inner = ResolveError::ResourceNotFound("minecraft:block/stone".to_string());
        let err = ResolveError::fetch(AssetKind::Model, "minecraft:block/stone", inner);

        assert!(err.to_string().starts_with("Failed to fetch model minecraft:block/stone"));
        assert!(matches!(err.root_cause(), ResolveError::ResourceNotFound(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_shared() {
        let only = Arc::new(ResolveError::ModelInheritanceCycle("a".to_string()));
        assert!(matches!(
            ResolveError::from_shared(only),
            ResolveError::ModelInheritanceCycle(_)
        ));

        let shared = Arc::new(ResolveError::ModelInheritanceCycle("a".to_string()));
        let _other = shared.clone();
        let err = ResolveError::from_shared(shared);
        assert!(matches!(err, ResolveError::Shared(_)));
        assert!(matches!(err.root_cause(), ResolveError::ModelInheritanceCycle(_)));
    }
}
