//! The overlay renderer: a pure display-list builder plus an egui paint step.

mod paint;
pub mod primitives;
mod surfaces;
mod textures;

use egui::{Color32, Painter, Rect, TextureOptions, pos2, vec2};

use crate::element::{Element, ElementStore};
use crate::geometry::CoordinateMapper;
use crate::id_generator::ElementId;
use crate::raster::RasterImage;
use crate::state::EditorConfig;

pub use paint::paint;
pub use primitives::Primitive;
pub use surfaces::{PageSurface, SurfaceRegistry};
pub use textures::{TextureManager, fingerprint};

/// Everything besides the elements that shows up on one page's overlay.
#[derive(Debug, Clone, Copy)]
pub struct OverlayFrame<'a> {
    pub page: u32,
    pub mapper: &'a CoordinateMapper,
    pub config: &'a EditorConfig,
    pub selected: Option<ElementId>,
    /// In-progress drawing.
    pub preview: Option<&'a Element>,
    /// Device-space range selection.
    pub marquee: Option<Rect>,
}

/// Display list for one page: grid, the page's elements in z-order, the gesture
/// preview, selection chrome, and the range marquee on top.
pub fn display_list<'e>(elements: impl IntoIterator<Item = &'e Element>, frame: &OverlayFrame<'_>) -> Vec<Primitive> {
    let mut list = Vec::new();
    if frame.config.show_grid {
        list.extend(primitives::grid_lines(frame.mapper, frame.config.grid_spacing()));
    }

    let mut selected = None;
    for element in elements.into_iter().filter(|e| e.on_page(frame.page)) {
        list.extend(primitives::element_primitives(element, frame.mapper, frame.config));
        if Some(element.id) == frame.selected {
            selected = Some(element);
        }
    }
    if let Some(preview) = frame.preview.filter(|e| e.on_page(frame.page)) {
        list.extend(primitives::element_primitives(preview, frame.mapper, frame.config));
    }
    if let Some(element) = selected {
        list.extend(primitives::selection_chrome(element, frame.mapper, frame.config));
    }
    if let Some(rect) = frame.marquee {
        list.extend(primitives::marquee(rect));
    }
    list
}

/// Owns the page surfaces and the element textures.
#[derive(Debug, Default)]
pub struct OverlayRenderer {
    surfaces: SurfaceRegistry,
    textures: TextureManager,
    synced_revision: Option<u64>,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surfaces(&self) -> &SurfaceRegistry {
        &self.surfaces
    }

    pub fn surfaces_mut(&mut self) -> &mut SurfaceRegistry {
        &mut self.surfaces
    }

    pub fn textures_mut(&mut self) -> &mut TextureManager {
        &mut self.textures
    }

    pub fn begin_frame(&mut self) {
        self.textures.begin_frame();
    }

    /// Drop textures of elements that left the store. Cheap when the store has not
    /// changed since the last call.
    pub fn sync_elements(&mut self, store: &ElementStore) {
        if self.synced_revision == Some(store.revision()) {
            return;
        }
        self.synced_revision = Some(store.revision());
        for id in self.textures.element_ids() {
            if !store.contains(id) {
                self.textures.invalidate_element(id);
            }
        }
    }

    /// Release the raster bound to `page`.
    pub fn unbind_page(&mut self, page: u32) -> bool {
        self.surfaces.unbind(page).is_some()
    }

    /// Upload a finished rasterization and bind it to its page.
    pub fn bind_raster(&mut self, ctx: &egui::Context, raster: RasterImage) {
        let size = vec2(raster.image.size[0] as f32, raster.image.size[1] as f32);
        let texture = ctx.load_texture(format!("page_{}", raster.page), raster.image, TextureOptions::LINEAR);
        self.surfaces.bind(
            raster.page,
            PageSurface {
                texture,
                size,
                scale: raster.scale,
            },
        );
    }

    /// Paint one page into `page_rect`: the bound raster (white until it arrives),
    /// then the overlay.
    pub fn render_page<'e>(
        &mut self,
        painter: &Painter,
        page_rect: Rect,
        elements: impl IntoIterator<Item = &'e Element>,
        frame: &OverlayFrame<'_>,
    ) {
        match self.surfaces.get_surface(frame.page) {
            Some(surface) => {
                let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                painter.image(surface.texture.id(), page_rect, uv, Color32::WHITE);
            }
            None => {
                painter.rect_filled(page_rect, 0.0, Color32::WHITE);
            }
        }

        let mut list = display_list(elements, frame);
        let offset = page_rect.min.to_vec2();
        for primitive in &mut list {
            primitive.translate(offset);
        }
        paint(&painter.with_clip_rect(page_rect), &list, &mut self.textures);
    }
}
