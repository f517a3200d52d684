//! Asset provider contract and the read-through asset cache.
//!
//! An [`AssetProvider`] hands out parsed blockstates, models, textures and
//! animation metadata by identifier. [`AssetCache`] sits in front of a
//! provider for the duration of a resolution session. Each asset path has one
//! slot; the first caller runs the fetch and concurrent callers for the same
//! path block on that slot and share the outcome. Failed fetches are handed to
//! everyone waiting and then dropped so a later call fetches again.

use crate::error::{AssetKind, ResolveError, Result};
use crate::identifier::Identifier;
use crate::resource_pack::{AnimationMeta, BlockModel, BlockstateDefinition, TextureData};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Source of parsed assets.
pub trait AssetProvider: Send + Sync {
    fn blockstate(&self, id: &Identifier) -> Result<Arc<BlockstateDefinition>>;
    fn model(&self, id: &Identifier) -> Result<Arc<BlockModel>>;
    fn texture(&self, id: &Identifier) -> Result<Arc<TextureData>>;
    fn animation_meta(&self, id: &Identifier) -> Result<Arc<AnimationMeta>>;
}

impl<P: AssetProvider + ?Sized> AssetProvider for Arc<P> {
    fn blockstate(&self, id: &Identifier) -> Result<Arc<BlockstateDefinition>> {
        (**self).blockstate(id)
    }

    fn model(&self, id: &Identifier) -> Result<Arc<BlockModel>> {
        (**self).model(id)
    }

    fn texture(&self, id: &Identifier) -> Result<Arc<TextureData>> {
        (**self).texture(id)
    }

    fn animation_meta(&self, id: &Identifier) -> Result<Arc<AnimationMeta>> {
        (**self).animation_meta(id)
    }
}

type Outcome<T> = std::result::Result<Arc<T>, Arc<ResolveError>>;

/// Keyed single-flight slots.
pub(crate) struct SlotMap<T> {
    slots: Mutex<HashMap<String, Arc<OnceLock<Outcome<T>>>>>,
}

impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> SlotMap<T> {
    /// Return the value for `key`, running `fetch` if no slot holds one yet.
    /// The flag is true when this call ran the fetch.
    pub(crate) fn get_or_fetch<F>(&self, key: &str, fetch: F) -> (Outcome<T>, bool)
    where
        F: FnOnce() -> Result<Arc<T>>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(key.to_string()).or_default().clone()
        };

        let mut fetched = false;
        let outcome = slot
            .get_or_init(|| {
                fetched = true;
                fetch().map_err(Arc::new)
            })
            .clone();

        if outcome.is_err() {
            let mut slots = self.slots.lock();
            if slots.get(key).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                slots.remove(key);
            }
        }

        (outcome, fetched)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.slots.lock().clear();
    }
}

/// Hit and miss counters of an [`AssetCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Read-through cache over an [`AssetProvider`].
///
/// Provider failures come back wrapped in [`ResolveError::AssetFetch`].
pub struct AssetCache<P> {
    provider: P,
    blockstates: SlotMap<BlockstateDefinition>,
    models: SlotMap<BlockModel>,
    textures: SlotMap<TextureData>,
    animations: SlotMap<AnimationMeta>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<P: AssetProvider> AssetCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            blockstates: SlotMap::default(),
            models: SlotMap::default(),
            textures: SlotMap::default(),
            animations: SlotMap::default(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn blockstate(&self, id: &Identifier) -> Result<Arc<BlockstateDefinition>> {
        self.fetch(&self.blockstates, AssetKind::Blockstate, id, |p| p.blockstate(id))
    }

    pub fn model(&self, id: &Identifier) -> Result<Arc<BlockModel>> {
        self.fetch(&self.models, AssetKind::Model, id, |p| p.model(id))
    }

    pub fn texture(&self, id: &Identifier) -> Result<Arc<TextureData>> {
        self.fetch(&self.textures, AssetKind::Texture, id, |p| p.texture(id))
    }

    pub fn animation_meta(&self, id: &Identifier) -> Result<Arc<AnimationMeta>> {
        self.fetch(&self.animations, AssetKind::AnimationMeta, id, |p| {
            p.animation_meta(id)
        })
    }

    fn fetch<T, F>(&self, slots: &SlotMap<T>, kind: AssetKind, id: &Identifier, fetch: F) -> Result<Arc<T>>
    where
        F: FnOnce(&P) -> Result<Arc<T>>,
    {
        let key = id
            .asset_path(kind)
            .map_err(|e| ResolveError::fetch(kind, id.raw(), e))?;

        let (outcome, fetched) = slots.get_or_fetch(&key, || fetch(&self.provider));
        if fetched {
            self.misses.fetch_add(1, Ordering::Relaxed);
            log::debug!("Asset cache miss: {}", key);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        outcome.map_err(|source| ResolveError::fetch(kind, id.to_string(), source))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.blockstates.len()
                + self.models.len()
                + self.textures.len()
                + self.animations.len(),
        }
    }

    /// Drop every cached asset.
    pub fn clear(&self) {
        self.blockstates.clear();
        self.models.clear();
        self.textures.clear();
        self.animations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Provider that counts model fetches and can fail the first few.
    #[derive(Default)]
    struct CountingProvider {
        model_calls: AtomicUsize,
        failures_left: AtomicUsize,
        delay: Option<Duration>,
    }

    impl AssetProvider for CountingProvider {
        fn blockstate(&self, id: &Identifier) -> Result<Arc<BlockstateDefinition>> {
            Err(ResolveError::ResourceNotFound(id.to_string()))
        }

        fn model(&self, _id: &Identifier) -> Result<Arc<BlockModel>> {
            self.model_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(ResolveError::ResourceNotFound("flaky".to_string()));
            }
            Ok(Arc::new(BlockModel::new().with_parent("block/cube_all")))
        }

        fn texture(&self, id: &Identifier) -> Result<Arc<TextureData>> {
            Err(ResolveError::ResourceNotFound(id.to_string()))
        }

        fn animation_meta(&self, _id: &Identifier) -> Result<Arc<AnimationMeta>> {
            Ok(Arc::new(AnimationMeta::default()))
        }
    }

    #[test]
    fn test_second_fetch_is_a_hit() {
        let cache = AssetCache::new(CountingProvider::default());
        let id = Identifier::parse("block/stone");

        let a = cache.model(&id).unwrap();
        let b = cache.model(&Identifier::parse("minecraft:block/stone")).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.provider().model_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_concurrent_callers_share_one_fetch() {
        let cache = AssetCache::new(CountingProvider {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let id = Identifier::parse("block/stone");

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    cache.model(&id).unwrap();
                });
            }
        });

        assert_eq!(cache.provider().model_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_are_wrapped_and_evicted() {
        let cache = AssetCache::new(CountingProvider {
            failures_left: AtomicUsize::new(1),
            ..Default::default()
        });
        let id = Identifier::parse("block/stone");

        let err = cache.model(&id).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::AssetFetch { kind: AssetKind::Model, .. }
        ));
        assert!(matches!(err.root_cause(), ResolveError::ResourceNotFound(_)));

        // The failed slot was dropped, so this fetches again and succeeds.
        assert!(cache.model(&id).is_ok());
        assert_eq!(cache.provider().model_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_malformed_identifier_never_reaches_provider() {
        let cache = AssetCache::new(CountingProvider::default());
        let err = cache.model(&Identifier::parse("???")).unwrap_err();

        assert!(matches!(err.root_cause(), ResolveError::MalformedIdentifier(_)));
        assert_eq!(cache.provider().model_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clear_forgets_entries() {
        let cache = AssetCache::new(CountingProvider::default());
        cache.animation_meta(&Identifier::parse("block/water_still")).unwrap();
        assert_eq!(cache.stats().entries, 1);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }
}
