//! LRU cache for rendered pages

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::PageImage;

/// Cache key for rendered pages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Page number (1-based)
    pub page: u32,
    /// Scale factor (stored as millionths for stable hashing)
    pub scale_millionths: u32,
}

impl CacheKey {
    #[must_use]
    pub fn new(page: u32, scale: f64) -> Self {
        Self {
            page,
            scale_millionths: (scale * 1_000_000.0).round() as u32,
        }
    }
}

/// LRU cache for rendered page images
pub struct PageCache {
    cache: LruCache<CacheKey, Arc<PageImage>>,
}

impl PageCache {
    /// Number of pages kept when no capacity is given
    pub const DEFAULT_CAPACITY: usize = 8;

    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Get a cached page, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, page: u32, scale: f64) -> Option<Arc<PageImage>> {
        self.cache.get(&CacheKey::new(page, scale)).cloned()
    }

    pub fn insert(&mut self, page: u32, scale: f64, image: PageImage) -> Arc<PageImage> {
        let image = Arc::new(image);
        self.cache.put(CacheKey::new(page, scale), image.clone());
        image
    }

    /// Returns the cached image or renders and caches it.
    pub fn get_or_render<E>(
        &mut self,
        page: u32,
        scale: f64,
        render: impl FnOnce() -> Result<PageImage, E>,
    ) -> Result<Arc<PageImage>, E> {
        if let Some(image) = self.get(page, scale) {
            return Ok(image);
        }
        let image = render()?;
        Ok(self.insert(page, scale, image))
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
