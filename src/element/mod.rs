use egui::{Color32, Pos2, Rect};
use serde::{Deserialize, Serialize};

pub mod color;
pub(crate) mod common;
pub mod image;
pub mod store;

pub use common::{
    DEFAULT_IMAGE_SIZE, DEFAULT_TEXT_SIZE, HIGHLIGHT_COLOR, HIGHLIGHT_OPACITY, HIGHLIGHT_STROKE_WIDTH,
    PLACEHOLDER_TEXT, REDACTION_COLOR, TILE_COLUMNS, TILE_ROWS, rect_between,
};
pub use image::{ImageBytes, ImageKind};
pub use store::{ElementStore, ReorderDirection};

use crate::geometry::{CoordinateMapper, Position, Size, hit_testing};
use crate::id_generator::{ElementId, generate_id};

/// One annotation on the overlay.
///
/// Every coordinate is in page percentage space. Size-based variants anchor their box
/// at `position` (top-left). Point-based variants (path, arrow, line) store their
/// points as offsets from `position`, so moving any element only touches `position`.
///
/// `page` is 1-based. `None` binds the element to every page, which only watermarks use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub position: Position,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "common::default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub locked: bool,
    #[serde(flatten)]
    pub kind: ElementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementKind {
    Text(TextElement),
    Image(ImageElement),
    Path(PathElement),
    Shape(ShapeElement),
    Arrow(LineElement),
    Line(LineElement),
    Redaction(RedactionElement),
    Watermark(WatermarkElement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
    Triangle,
    Star,
    Heart,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Rectangle,
        ShapeKind::Circle,
        ShapeKind::Triangle,
        ShapeKind::Star,
        ShapeKind::Heart,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Star => "star",
            ShapeKind::Heart => "heart",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FontFamily {
    #[default]
    Helvetica,
    TimesRoman,
    Courier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Font attributes shared by text and text watermarks. Font size is in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: f32,
    #[serde(default)]
    pub font_family: FontFamily,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub text_decoration: TextDecoration,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(with = "color")]
    pub color: Color32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: common::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            font_weight: FontWeight::default(),
            font_style: FontStyle::default(),
            text_decoration: TextDecoration::default(),
            text_align: TextAlign::default(),
            color: Color32::BLACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub content: String,
    pub size: Size,
    #[serde(flatten)]
    pub style: TextStyle,
}

/// An image box. `image_bytes` stays empty while the placement waits for a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    pub size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_bytes: Option<ImageBytes>,
    #[serde(default)]
    pub image_type: ImageKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathElement {
    pub points: Vec<Position>,
    #[serde(with = "color")]
    pub color: Color32,
    pub stroke_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeElement {
    pub shape_kind: ShapeKind,
    pub size: Size,
    #[serde(with = "color")]
    pub color: Color32,
    #[serde(default, with = "color::option", skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color32>,
    pub stroke_width: f32,
}

/// Arrows and lines: the first point is the tail, the last one the tip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineElement {
    pub points: Vec<Position>,
    #[serde(with = "color")]
    pub color: Color32,
    pub stroke_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionElement {
    pub size: Size,
    #[serde(with = "color")]
    pub color: Color32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A stamp repeated on one or all pages. Carries text, an image, or both
/// (the image wins when rendering).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkElement {
    pub size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_bytes: Option<ImageBytes>,
    #[serde(default)]
    pub image_type: ImageKind,
    #[serde(flatten)]
    pub style: TextStyle,
    #[serde(default)]
    pub tiled: bool,
}

/// A partial property update. Fields that do not apply to the element's variant are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub rotation: Option<f32>,
    pub opacity: Option<f32>,
    pub locked: Option<bool>,
    pub color: Option<Color32>,
    pub stroke_width: Option<f32>,
    pub text: Option<String>,
    pub font_size: Option<f32>,
    pub font_family: Option<FontFamily>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub text_decoration: Option<TextDecoration>,
    pub text_align: Option<TextAlign>,
    pub shape_kind: Option<ShapeKind>,
}

impl ElementPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch, returning whether anything changed.
    pub fn apply(&self, element: &mut Element) -> bool {
        let before = element.clone();

        if let Some(position) = self.position {
            element.position = position;
        }
        if let Some(size) = self.size {
            let (anchor, _) = element.bounds();
            element.resize_to(anchor, size);
        }
        if let Some(rotation) = self.rotation {
            element.rotation = rotation.rem_euclid(360.0);
        }
        if let Some(opacity) = self.opacity {
            element.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(locked) = self.locked {
            element.locked = locked;
        }
        if let Some(color) = self.color {
            element.set_color(color);
        }
        if let Some(width) = self.stroke_width {
            match &mut element.kind {
                ElementKind::Path(path) => path.stroke_width = width,
                ElementKind::Shape(shape) => shape.stroke_width = width,
                ElementKind::Arrow(line) | ElementKind::Line(line) => line.stroke_width = width,
                _ => {}
            }
        }
        if let Some(text) = &self.text {
            match &mut element.kind {
                ElementKind::Text(t) => t.content = text.clone(),
                ElementKind::Watermark(w) => w.text = Some(text.clone()),
                ElementKind::Redaction(r) => r.label = Some(text.clone()),
                _ => {}
            }
        }
        if let Some(kind) = self.shape_kind {
            if let ElementKind::Shape(shape) = &mut element.kind {
                shape.shape_kind = kind;
            }
        }
        if let Some(style) = element.text_style_mut() {
            if let Some(v) = self.font_size {
                style.font_size = v;
            }
            if let Some(v) = self.font_family {
                style.font_family = v;
            }
            if let Some(v) = self.font_weight {
                style.font_weight = v;
            }
            if let Some(v) = self.font_style {
                style.font_style = v;
            }
            if let Some(v) = self.text_decoration {
                style.text_decoration = v;
            }
            if let Some(v) = self.text_align {
                style.text_align = v;
            }
        }

        *element != before
    }
}

impl Element {
    /// New unlocked, unrotated, opaque element with a fresh id.
    pub fn new(page: Option<u32>, position: Position, kind: ElementKind) -> Self {
        Self {
            id: generate_id(),
            page,
            position,
            rotation: 0.0,
            opacity: 1.0,
            locked: false,
            kind,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ElementKind::Text(_) => "text",
            ElementKind::Image(_) => "image",
            ElementKind::Path(_) => "path",
            ElementKind::Shape(_) => "shape",
            ElementKind::Arrow(_) => "arrow",
            ElementKind::Line(_) => "line",
            ElementKind::Redaction(_) => "redaction",
            ElementKind::Watermark(_) => "watermark",
        }
    }

    /// Visible on `page`: either bound to it or bound to every page.
    pub fn on_page(&self, page: u32) -> bool {
        self.page.is_none_or(|p| p == page)
    }

    /// Explicit size of size-based variants.
    pub fn size(&self) -> Option<Size> {
        match &self.kind {
            ElementKind::Text(t) => Some(t.size),
            ElementKind::Image(i) => Some(i.size),
            ElementKind::Shape(s) => Some(s.size),
            ElementKind::Redaction(r) => Some(r.size),
            ElementKind::Watermark(w) => Some(w.size),
            ElementKind::Path(_) | ElementKind::Arrow(_) | ElementKind::Line(_) => None,
        }
    }

    fn size_mut(&mut self) -> Option<&mut Size> {
        match &mut self.kind {
            ElementKind::Text(t) => Some(&mut t.size),
            ElementKind::Image(i) => Some(&mut i.size),
            ElementKind::Shape(s) => Some(&mut s.size),
            ElementKind::Redaction(r) => Some(&mut r.size),
            ElementKind::Watermark(w) => Some(&mut w.size),
            ElementKind::Path(_) | ElementKind::Arrow(_) | ElementKind::Line(_) => None,
        }
    }

    /// Point offsets of point-based variants.
    pub fn points(&self) -> Option<&[Position]> {
        match &self.kind {
            ElementKind::Path(p) => Some(&p.points),
            ElementKind::Arrow(l) | ElementKind::Line(l) => Some(&l.points),
            _ => None,
        }
    }

    fn points_mut(&mut self) -> Option<&mut Vec<Position>> {
        match &mut self.kind {
            ElementKind::Path(p) => Some(&mut p.points),
            ElementKind::Arrow(l) | ElementKind::Line(l) => Some(&mut l.points),
            _ => None,
        }
    }

    /// Points in page percentage space.
    pub fn absolute_points(&self) -> Vec<Position> {
        self.points()
            .map(|points| points.iter().map(|p| self.position.offset(p.x, p.y)).collect())
            .unwrap_or_default()
    }

    pub fn text_style(&self) -> Option<&TextStyle> {
        match &self.kind {
            ElementKind::Text(t) => Some(&t.style),
            ElementKind::Watermark(w) => Some(&w.style),
            _ => None,
        }
    }

    fn text_style_mut(&mut self) -> Option<&mut TextStyle> {
        match &mut self.kind {
            ElementKind::Text(t) => Some(&mut t.style),
            ElementKind::Watermark(w) => Some(&mut w.style),
            _ => None,
        }
    }

    pub fn color(&self) -> Color32 {
        match &self.kind {
            ElementKind::Text(t) => t.style.color,
            ElementKind::Watermark(w) => w.style.color,
            ElementKind::Path(p) => p.color,
            ElementKind::Shape(s) => s.color,
            ElementKind::Arrow(l) | ElementKind::Line(l) => l.color,
            ElementKind::Redaction(r) => r.color,
            ElementKind::Image(_) => Color32::WHITE,
        }
    }

    pub fn set_color(&mut self, color: Color32) {
        match &mut self.kind {
            ElementKind::Text(t) => t.style.color = color,
            ElementKind::Watermark(w) => w.style.color = color,
            ElementKind::Path(p) => p.color = color,
            ElementKind::Shape(s) => s.color = color,
            ElementKind::Arrow(l) | ElementKind::Line(l) => l.color = color,
            ElementKind::Redaction(r) => r.color = color,
            ElementKind::Image(_) => {}
        }
    }

    pub fn stroke_width(&self) -> Option<f32> {
        match &self.kind {
            ElementKind::Path(p) => Some(p.stroke_width),
            ElementKind::Shape(s) => Some(s.stroke_width),
            ElementKind::Arrow(l) | ElementKind::Line(l) => Some(l.stroke_width),
            _ => None,
        }
    }

    /// Axis-aligned box in percentage space, ignoring rotation.
    pub fn bounds(&self) -> (Position, Size) {
        if let Some(size) = self.size() {
            return (self.position, size);
        }
        common::percent_bounds(&self.absolute_points()).unwrap_or((self.position, Size::default()))
    }

    pub fn device_rect(&self, mapper: &CoordinateMapper) -> Rect {
        let (position, size) = self.bounds();
        mapper.rect_to_device(position, size)
    }

    /// Move the element so its bounding box lands on `position` with `size`.
    /// Point-based variants scale their points into the new box.
    pub fn resize_to(&mut self, position: Position, size: Size) {
        if let Some(current) = self.size_mut() {
            *current = size;
            self.position = position;
            return;
        }

        let (old_pos, old_size) = self.bounds();
        let scale = |new: f32, old: f32| if old > 0.0 { new / old } else { 1.0 };
        let (sx, sy) = (scale(size.width, old_size.width), scale(size.height, old_size.height));
        let absolute = self.absolute_points();
        if let Some(points) = self.points_mut() {
            for (offset, point) in points.iter_mut().zip(absolute) {
                let x = position.x + (point.x - old_pos.x) * sx;
                let y = position.y + (point.y - old_pos.y) * sy;
                *offset = Position::new(x - position.x, y - position.y);
            }
        }
        self.position = position;
    }

    /// Whether the device point `pos` touches the element. Strokes get `tolerance`
    /// extra pixels on top of half their width.
    pub fn hit_test(&self, mapper: &CoordinateMapper, pos: Pos2, tolerance: f32) -> bool {
        let rect = self.device_rect(mapper);
        match self.points() {
            Some(_) => {
                let points: Vec<Pos2> =
                    self.absolute_points().into_iter().map(|p| mapper.to_device(p)).collect();
                let local = hit_testing::unrotate(pos, rect.center(), self.rotation);
                let reach = self.stroke_width().unwrap_or(0.0) / 2.0 + tolerance;
                hit_testing::near_polyline(&points, local, reach)
            }
            None => hit_testing::rotated_rect_contains(rect.expand(tolerance), self.rotation, pos),
        }
    }
}

/// Constructors used by the tools and by programmatic adds.
pub mod factory {
    use super::*;

    pub fn create_text(page: u32, position: Position, content: impl Into<String>, style: TextStyle) -> Element {
        Element::new(
            Some(page),
            position,
            ElementKind::Text(TextElement {
                content: content.into(),
                size: DEFAULT_TEXT_SIZE,
                style,
            }),
        )
    }

    /// `points` are absolute; the first one becomes the element's position.
    pub fn create_path(page: u32, points: &[Position], color: Color32, stroke_width: f32) -> Element {
        let origin = points.first().copied().unwrap_or_default();
        Element::new(
            Some(page),
            origin,
            ElementKind::Path(PathElement {
                points: relative_to(origin, points),
                color,
                stroke_width,
            }),
        )
    }

    pub fn create_shape(
        page: u32,
        shape_kind: ShapeKind,
        position: Position,
        size: Size,
        color: Color32,
        stroke_width: f32,
    ) -> Element {
        Element::new(
            Some(page),
            position,
            ElementKind::Shape(ShapeElement {
                shape_kind,
                size,
                color,
                fill: None,
                stroke_width,
            }),
        )
    }

    pub fn create_arrow(page: u32, tail: Position, tip: Position, color: Color32, stroke_width: f32) -> Element {
        Element::new(Some(page), tail, ElementKind::Arrow(segment(tail, tip, color, stroke_width)))
    }

    pub fn create_line(page: u32, start: Position, end: Position, color: Color32, stroke_width: f32) -> Element {
        Element::new(Some(page), start, ElementKind::Line(segment(start, end, color, stroke_width)))
    }

    pub fn create_image(page: u32, position: Position, bytes: Option<ImageBytes>) -> Element {
        let image_type = bytes.as_ref().and_then(ImageBytes::kind).unwrap_or_default();
        Element::new(
            Some(page),
            position,
            ElementKind::Image(ImageElement {
                size: DEFAULT_IMAGE_SIZE,
                image_bytes: bytes,
                image_type,
            }),
        )
    }

    pub fn create_redaction(page: u32, position: Position, size: Size, color: Color32) -> Element {
        Element::new(
            Some(page),
            position,
            ElementKind::Redaction(RedactionElement {
                size,
                color,
                label: None,
            }),
        )
    }

    /// A text watermark. `page: None` stamps every page.
    pub fn create_watermark(
        page: Option<u32>,
        position: Position,
        size: Size,
        text: impl Into<String>,
        style: TextStyle,
        tiled: bool,
    ) -> Element {
        Element::new(
            page,
            position,
            ElementKind::Watermark(WatermarkElement {
                size,
                text: Some(text.into()),
                image_bytes: None,
                image_type: ImageKind::default(),
                style,
                tiled,
            }),
        )
    }

    fn segment(start: Position, end: Position, color: Color32, stroke_width: f32) -> LineElement {
        LineElement {
            points: relative_to(start, &[start, end]),
            color,
            stroke_width,
        }
    }

    fn relative_to(origin: Position, points: &[Position]) -> Vec<Position> {
        points.iter().map(|p| Position::new(p.x - origin.x, p.y - origin.y)).collect()
    }
}
