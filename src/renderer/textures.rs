use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use log::{debug, warn};

use crate::element::ImageBytes;
use crate::error::TextureGenerationError;
use crate::id_generator::ElementId;

/// Identifies one version of an element's pixels.
type CacheKey = (ElementId, u64);

/// Content fingerprint of an image payload.
pub fn fingerprint(bytes: &ImageBytes) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.as_slice().hash(&mut hasher);
    hasher.finish()
}

/// LRU cache of uploaded element textures, keyed by element id and content
/// fingerprint. Replacing an element's image naturally misses the cache; the stale
/// entry ages out. Remembered decode failures share the same bound.
pub struct TextureManager {
    texture_cache: HashMap<CacheKey, TextureHandle>,
    last_used: HashMap<CacheKey, u64>,
    /// Payloads that failed to decode, with the frame they failed in; not retried
    /// until the content changes.
    failed: HashMap<CacheKey, (TextureGenerationError, u64)>,
    current_frame: u64,
    max_cache_size: usize,
}

impl std::fmt::Debug for TextureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureManager")
            .field("cached", &self.texture_cache.len())
            .field("failed", &self.failed.len())
            .field("current_frame", &self.current_frame)
            .finish()
    }
}

impl Default for TextureManager {
    fn default() -> Self {
        Self::new(64)
    }
}

impl TextureManager {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            texture_cache: HashMap::new(),
            last_used: HashMap::new(),
            failed: HashMap::new(),
            current_frame: 0,
            max_cache_size: max_cache_size.max(1),
        }
    }

    /// Call once per frame before painting.
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    pub fn get_or_create_texture<F>(
        &mut self,
        element_id: ElementId,
        version: u64,
        generator: F,
        ctx: &Context,
    ) -> Result<TextureId, TextureGenerationError>
    where
        F: FnOnce() -> Result<ColorImage, TextureGenerationError>,
    {
        let key = (element_id, version);
        if let Some(handle) = self.texture_cache.get(&key) {
            self.last_used.insert(key, self.current_frame);
            return Ok(handle.id());
        }
        if let Some((err, _)) = self.failed.get(&key) {
            return Err(err.clone());
        }

        let image = match generator() {
            Ok(image) => image,
            Err(err) => {
                warn!("texture for element {element_id} failed: {err}");
                self.failed.insert(key, (err.clone(), self.current_frame));
                self.prune_failed_if_needed();
                return Err(err);
            }
        };
        let name = format!("element_{element_id}_{version:x}");
        let handle = ctx.load_texture(name, image, TextureOptions::LINEAR);
        let id = handle.id();
        self.texture_cache.insert(key, handle);
        self.last_used.insert(key, self.current_frame);
        self.prune_cache_if_needed();
        Ok(id)
    }

    /// Texture for an image payload, decoding it on first use.
    pub fn image_texture(
        &mut self,
        element_id: ElementId,
        bytes: &ImageBytes,
        ctx: &Context,
    ) -> Result<TextureId, TextureGenerationError> {
        self.get_or_create_texture(element_id, fingerprint(bytes), || bytes.decode(), ctx)
    }

    /// Elements with a cached texture or a remembered failure.
    pub fn element_ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self.texture_cache.keys().chain(self.failed.keys()).map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn invalidate_element(&mut self, element_id: ElementId) {
        self.texture_cache.retain(|(id, _), _| *id != element_id);
        self.last_used.retain(|(id, _), _| *id != element_id);
        self.failed.retain(|(id, _), _| *id != element_id);
    }

    fn prune_cache_if_needed(&mut self) {
        if self.texture_cache.len() <= self.max_cache_size {
            return;
        }
        let mut entries: Vec<(CacheKey, u64)> = self.last_used.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let overflow = entries.len() - self.max_cache_size;
        for (key, _) in entries.into_iter().take(overflow) {
            self.texture_cache.remove(&key);
            self.last_used.remove(&key);
        }
        debug!("texture cache pruned {overflow} entries");
    }

    fn prune_failed_if_needed(&mut self) {
        if self.failed.len() <= self.max_cache_size {
            return;
        }
        let mut entries: Vec<(CacheKey, u64)> = self.failed.iter().map(|(k, (_, frame))| (*k, *frame)).collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let overflow = entries.len() - self.max_cache_size;
        for (key, _) in entries.into_iter().take(overflow) {
            self.failed.remove(&key);
        }
    }

    pub fn clear_cache(&mut self) {
        self.texture_cache.clear();
        self.last_used.clear();
        self.failed.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.texture_cache.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    #[cfg(test)]
    fn get_texture(&self, element_id: ElementId, version: u64) -> Option<&TextureHandle> {
        self.texture_cache.get(&(element_id, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_generator::generate_id;

    fn white() -> Result<ColorImage, TextureGenerationError> {
        Ok(ColorImage::new([4, 4], egui::Color32::WHITE))
    }

    #[test]
    fn test_cache_hit() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);
        let id = generate_id();

        let first = manager.get_or_create_texture(id, 1, white, &ctx).unwrap();
        let second = manager
            .get_or_create_texture(id, 1, || panic!("generator must not run on a hit"), &ctx)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(manager.cache_size(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(2);
        let ids = [generate_id(), generate_id(), generate_id()];

        for id in ids {
            manager.get_or_create_texture(id, 1, white, &ctx).unwrap();
            manager.begin_frame();
        }
        assert_eq!(manager.cache_size(), 2);
        assert!(manager.get_texture(ids[0], 1).is_none());
        assert!(manager.get_texture(ids[2], 1).is_some());
    }

    #[test]
    fn test_failed_decode_is_remembered() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(4);
        let id = generate_id();
        let garbage = ImageBytes::new(vec![1u8, 2, 3]);

        assert!(manager.image_texture(id, &garbage, &ctx).is_err());
        let again = manager.get_or_create_texture(id, fingerprint(&garbage), || panic!("retried"), &ctx);
        assert!(again.is_err());

        manager.invalidate_element(id);
        assert_eq!(manager.cache_size(), 0);
    }

    #[test]
    fn test_failures_are_bounded() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(2);
        let ids = [generate_id(), generate_id(), generate_id()];

        for id in ids {
            let failed = manager.get_or_create_texture(id, 7, || Err(TextureGenerationError::InvalidDimensions), &ctx);
            assert!(failed.is_err());
            manager.begin_frame();
        }
        assert_eq!(manager.failed_count(), 2);
        assert!(!manager.element_ids().contains(&ids[0]));
    }
}
