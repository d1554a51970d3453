use egui::{Pos2, Rect, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

/// A point in page-relative percentage space (0-100 of the unrotated, unzoomed page).
///
/// This is the persisted representation of every element coordinate. It does not
/// change when the viewer zooms.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn clamped(self) -> Self {
        Self::new(self.x.clamp(0.0, 100.0), self.y.clamp(0.0, 100.0))
    }

    /// Round both axes to the nearest multiple of `grid_size` percent.
    pub fn snapped(self, grid_size: f32) -> Self {
        Self::new(snap(self.x, grid_size), snap(self.y, grid_size))
    }
}

/// A width/height pair in percentage space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Page size in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const LETTER: Self = Self { width: 612.0, height: 792.0 };
    pub const A4: Self = Self { width: 595.0, height: 842.0 };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::LETTER
    }
}

/// A point in document space: PDF points, origin at the bottom-left of the page.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocPoint {
    pub x: f32,
    pub y: f32,
}

/// A rectangle in document space. `(x, y)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub fn snap(value: f32, grid_size: f32) -> f32 {
    if grid_size <= 0.0 {
        return value;
    }
    (value / grid_size).round() * grid_size
}

fn ratio(value: f32, total: f32) -> f32 {
    if total <= 0.0 { 0.0 } else { value / total }
}

/// Converts between percentage, device pixel and document space for one page.
///
/// `viewport` is the size of the page surface in device pixels at the current zoom;
/// `page` is the page's size in PDF points. The mapper is a plain value and is rebuilt
/// whenever the zoom or the surface changes. A degenerate (zero-sized) viewport maps
/// every device point to the page origin instead of producing NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    viewport: Vec2,
    page: PageSize,
}

impl CoordinateMapper {
    pub fn new(viewport: Vec2, page: PageSize) -> Self {
        Self { viewport, page }
    }

    /// Mapper for a page rendered at `zoom_percent`, where 100% is one device pixel per
    /// PDF point before the device pixel ratio is applied.
    pub fn for_zoom(page: PageSize, zoom_percent: f32, pixels_per_point: f32) -> Self {
        let scale = zoom_percent / 100.0 * pixels_per_point;
        Self::new(vec2(page.width * scale, page.height * scale), page)
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn page_size(&self) -> PageSize {
        self.page
    }

    /// Device pixels per PDF point (horizontal).
    pub fn scale(&self) -> f32 {
        ratio(self.viewport.x, self.page.width)
    }

    pub fn to_device(&self, pct: Position) -> Pos2 {
        pos2(pct.x * self.viewport.x / 100.0, pct.y * self.viewport.y / 100.0)
    }

    /// Device point back to percentage space. Not clamped: elements may legitimately
    /// sit partially off the page.
    pub fn to_percent(&self, device: Pos2) -> Position {
        Position::new(
            ratio(device.x * 100.0, self.viewport.x),
            ratio(device.y * 100.0, self.viewport.y),
        )
    }

    /// Clamped variant, only for interactive drag boundaries.
    pub fn to_percent_clamped(&self, device: Pos2) -> Position {
        self.to_percent(device).clamped()
    }

    /// Device-pixel delta to a percentage delta using the current viewport.
    pub fn delta_to_percent(&self, delta: Vec2) -> Vec2 {
        vec2(
            ratio(delta.x * 100.0, self.viewport.x),
            ratio(delta.y * 100.0, self.viewport.y),
        )
    }

    pub fn size_to_device(&self, size: Size) -> Vec2 {
        vec2(size.width * self.viewport.x / 100.0, size.height * self.viewport.y / 100.0)
    }

    pub fn rect_to_device(&self, position: Position, size: Size) -> Rect {
        Rect::from_min_size(self.to_device(position), self.size_to_device(size))
    }

    /// Top-left anchored percentage position to a bottom-left document point.
    ///
    /// PDF space grows upwards, so the element's own height has to be subtracted
    /// after flipping: `y = Hp - y% * Hp - h`.
    pub fn to_document(&self, pct: Position, height_pct: f32) -> DocPoint {
        let height_doc = height_pct * self.page.height / 100.0;
        DocPoint {
            x: pct.x * self.page.width / 100.0,
            y: self.page.height - pct.y * self.page.height / 100.0 - height_doc,
        }
    }

    pub fn rect_to_document(&self, position: Position, size: Size) -> DocRect {
        let origin = self.to_document(position, size.height);
        DocRect {
            x: origin.x,
            y: origin.y,
            width: size.width * self.page.width / 100.0,
            height: size.height * self.page.height / 100.0,
        }
    }

    /// Inverse of [`Self::to_document`]: a bottom-left document rectangle to a
    /// top-left percentage position and size.
    pub fn rect_from_document(&self, rect: DocRect) -> (Position, Size) {
        let position = Position::new(
            ratio(rect.x * 100.0, self.page.width),
            ratio((self.page.height - rect.y - rect.height) * 100.0, self.page.height),
        );
        let size = Size::new(
            ratio(rect.width * 100.0, self.page.width),
            ratio(rect.height * 100.0, self.page.height),
        );
        (position, size)
    }
}
