use std::collections::BTreeMap;

use egui::{TextureHandle, Vec2};

/// A rasterized page uploaded for display.
#[derive(Clone)]
pub struct PageSurface {
    pub texture: TextureHandle,
    /// Pixel size of the raster.
    pub size: Vec2,
    /// Device pixels per PDF point the raster was produced at.
    pub scale: f32,
}

impl std::fmt::Debug for PageSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSurface")
            .field("texture", &self.texture.id())
            .field("size", &self.size)
            .field("scale", &self.scale)
            .finish()
    }
}

/// Page-indexed surfaces. Pages are 1-based; binding a page again replaces its
/// surface.
#[derive(Debug, Clone)]
pub struct SurfaceRegistry<S = PageSurface> {
    surfaces: BTreeMap<u32, S>,
}

impl<S> Default for SurfaceRegistry<S> {
    fn default() -> Self {
        Self {
            surfaces: BTreeMap::new(),
        }
    }
}

impl<S> SurfaceRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the surface previously bound to `page`.
    pub fn bind(&mut self, page: u32, surface: S) -> Option<S> {
        self.surfaces.insert(page, surface)
    }

    pub fn get_surface(&self, page: u32) -> Option<&S> {
        self.surfaces.get(&page)
    }

    pub fn unbind(&mut self, page: u32) -> Option<S> {
        self.surfaces.remove(&page)
    }

    pub fn clear(&mut self) {
        self.surfaces.clear();
    }
}
