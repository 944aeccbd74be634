//! In-memory LRU cache for decoded raster images.
//!
//! Revisiting a recently shown (city, pollutant, year, month) skips the
//! fetch-and-decode step entirely.

use std::num::NonZeroUsize;
use std::sync::Arc;

use aq_common::LayerKey;
use lru::LruCache;
use raster::DecodedImage;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache statistics.
#[derive(Debug, Default, Clone)]
pub struct RasterCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// LRU cache of decoded RGBA images keyed by layer key.
pub struct RasterCache {
    cache: RwLock<LruCache<String, Arc<DecodedImage>>>,
    stats: RwLock<RasterCacheStats>,
}

impl RasterCache {
    /// Create a cache holding at most `capacity` decoded images.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity floored to 1");
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            stats: RwLock::new(RasterCacheStats::default()),
        }
    }

    pub async fn get(&self, key: &LayerKey) -> Option<Arc<DecodedImage>> {
        let mut cache = self.cache.write().await;
        let mut stats = self.stats.write().await;
        match cache.get(&key.cache_key()) {
            Some(image) => {
                stats.hits += 1;
                debug!(%key, "decoded raster cache hit");
                Some(image.clone())
            }
            None => {
                stats.misses += 1;
                None
            }
        }
    }

    pub async fn insert(&self, key: &LayerKey, image: Arc<DecodedImage>) {
        let mut cache = self.cache.write().await;
        cache.put(key.cache_key(), image);
        self.stats.write().await.entries = cache.len();
    }

    pub async fn stats(&self) -> RasterCacheStats {
        let mut stats = self.stats.read().await.clone();
        stats.entries = self.cache.read().await.len();
        stats
    }
}
