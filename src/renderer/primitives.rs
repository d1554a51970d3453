//! Element geometry turned into device-space drawing primitives.
//!
//! Everything here is pure: the same element, mapper and config always produce the
//! same primitives. Coordinates are relative to the page surface's top-left corner.

use egui::epaint::CubicBezierShape;
use egui::{Color32, Pos2, Rect, Stroke, Vec2, pos2, vec2};

use crate::element::{
    Element, ElementKind, ImageBytes, LineElement, ShapeElement, ShapeKind, TILE_COLUMNS, TILE_ROWS,
    TextStyle, WatermarkElement,
};
use crate::geometry::shapes::{self, rotate_about};
use crate::geometry::CoordinateMapper;
use crate::id_generator::ElementId;
use crate::state::EditorConfig;

pub const GRID_COLOR: Color32 = Color32::from_rgb(0xe0, 0xe0, 0xe0);
pub const GRID_LINE_WIDTH: f32 = 0.5;
pub const SELECTION_COLOR: Color32 = Color32::from_rgb(0x3b, 0x82, 0xf6);
const IMAGE_PLACEHOLDER_FILL: Color32 = Color32::from_rgb(0xf3, 0xf4, 0xf6);
const IMAGE_PLACEHOLDER_BORDER: Color32 = Color32::from_rgb(0x9c, 0xa3, 0xaf);
const HEART_TOLERANCE: f32 = 0.5;
const ELLIPSE_SEGMENTS: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Polyline {
        points: Vec<Pos2>,
        closed: bool,
        stroke: Stroke,
    },
    /// A single-point stroke.
    Dot { center: Pos2, radius: f32, color: Color32 },
    /// Area swept by a fan around `center`; valid for any outline that is star-shaped
    /// with respect to it.
    Fill {
        center: Pos2,
        outline: Vec<Pos2>,
        color: Color32,
    },
    CubicBezier { points: [Pos2; 4], stroke: Stroke },
    Text {
        text: String,
        /// Unrotated layout box; the text is laid out from its top-left.
        rect: Rect,
        /// Degrees, clockwise, about `rect`'s centre.
        rotation: f32,
        font_size: f32,
        style: TextStyle,
    },
    Image {
        id: ElementId,
        bytes: ImageBytes,
        /// Top-left, top-right, bottom-right, bottom-left after rotation.
        corners: [Pos2; 4],
        tint: Color32,
    },
}

impl Primitive {
    /// Shift every coordinate by `offset`, e.g. onto the page's on-screen origin.
    pub fn translate(&mut self, offset: Vec2) {
        match self {
            Primitive::Polyline { points, .. } => points.iter_mut().for_each(|p| *p += offset),
            Primitive::Dot { center, .. } => *center += offset,
            Primitive::Fill { center, outline, .. } => {
                *center += offset;
                outline.iter_mut().for_each(|p| *p += offset);
            }
            Primitive::CubicBezier { points, .. } => points.iter_mut().for_each(|p| *p += offset),
            Primitive::Text { rect, .. } => *rect = rect.translate(offset),
            Primitive::Image { corners, .. } => corners.iter_mut().for_each(|p| *p += offset),
        }
    }
}

fn faded(color: Color32, opacity: f32) -> Color32 {
    if opacity >= 1.0 {
        color
    } else {
        color.gamma_multiply(opacity.max(0.0))
    }
}

fn rotated<const N: usize>(points: [Pos2; N], center: Pos2, degrees: f32) -> [Pos2; N] {
    points.map(|p| rotate_about(p, center, degrees))
}

fn rotated_vec(points: impl IntoIterator<Item = Pos2>, center: Pos2, degrees: f32) -> Vec<Pos2> {
    points.into_iter().map(|p| rotate_about(p, center, degrees)).collect()
}

/// Primitives for one element, opacity applied as alpha and rotation applied about
/// the element's device-space centre. Stroke widths are in PDF points and scale with
/// the page like font sizes do.
pub fn element_primitives(element: &Element, mapper: &CoordinateMapper, config: &EditorConfig) -> Vec<Primitive> {
    let rect = element.device_rect(mapper);
    let center = rect.center();
    let degrees = element.rotation;
    let alpha = element.opacity;
    let scale = mapper.scale();

    match &element.kind {
        ElementKind::Path(path) => {
            let points = device_points(element, mapper);
            let stroke = Stroke::new(path.stroke_width * scale, faded(path.color, alpha));
            polyline(rotated_vec(points, center, degrees), stroke)
        }
        ElementKind::Line(line) => {
            let points = device_points(element, mapper);
            polyline(rotated_vec(points, center, degrees), line_stroke(line, alpha, scale))
        }
        ElementKind::Arrow(line) => {
            let points = rotated_vec(device_points(element, mapper), center, degrees);
            let stroke = line_stroke(line, alpha, scale);
            let mut out = polyline(points.clone(), stroke);
            if let [.., from, tip] = points.as_slice() {
                for barb in shapes::arrowhead(*from, *tip, config.arrowhead_length_px, config.arrowhead_angle) {
                    out.push(Primitive::Polyline {
                        points: barb.to_vec(),
                        closed: false,
                        stroke,
                    });
                }
            }
            out
        }
        ElementKind::Shape(shape) => shape_primitives(shape, rect, degrees, alpha, scale),
        ElementKind::Text(text) => vec![Primitive::Text {
            text: text.content.clone(),
            rect,
            rotation: degrees,
            font_size: text.style.font_size * scale,
            style: TextStyle {
                color: faded(text.style.color, alpha),
                ..text.style
            },
        }],
        ElementKind::Image(image) => image_primitives(element.id, image.image_bytes.as_ref(), rect, degrees, alpha),
        ElementKind::Redaction(redaction) => {
            let mut out = vec![Primitive::Fill {
                center,
                outline: rotated(shapes::rect_corners(rect), center, degrees).to_vec(),
                color: faded(redaction.color, alpha),
            }];
            if let Some(label) = &redaction.label {
                out.push(Primitive::Text {
                    text: label.clone(),
                    rect,
                    rotation: degrees,
                    font_size: (rect.height() * 0.5).max(1.0),
                    style: TextStyle {
                        color: faded(Color32::WHITE, alpha),
                        text_align: crate::element::TextAlign::Center,
                        ..TextStyle::default()
                    },
                });
            }
            out
        }
        ElementKind::Watermark(watermark) => {
            let cells = if watermark.tiled {
                tile_cells(mapper.viewport(), rect.size())
            } else {
                vec![rect]
            };
            cells
                .into_iter()
                .flat_map(|cell| watermark_primitives(element.id, watermark, cell, degrees, alpha, scale))
                .collect()
        }
    }
}

fn device_points(element: &Element, mapper: &CoordinateMapper) -> Vec<Pos2> {
    element.absolute_points().into_iter().map(|p| mapper.to_device(p)).collect()
}

fn line_stroke(line: &LineElement, alpha: f32, scale: f32) -> Stroke {
    Stroke::new(line.stroke_width * scale, faded(line.color, alpha))
}

fn polyline(points: Vec<Pos2>, stroke: Stroke) -> Vec<Primitive> {
    match points.as_slice() {
        [] => Vec::new(),
        [only] => vec![Primitive::Dot {
            center: *only,
            radius: stroke.width / 2.0,
            color: stroke.color,
        }],
        _ => vec![Primitive::Polyline {
            points,
            closed: false,
            stroke,
        }],
    }
}

fn shape_primitives(shape: &ShapeElement, rect: Rect, degrees: f32, alpha: f32, scale: f32) -> Vec<Primitive> {
    let stroke = Stroke::new(shape.stroke_width * scale, faded(shape.color, alpha));
    let fill = shape.fill.map(|c| faded(c, alpha));
    let center = rect.center();

    let outline: Vec<Pos2> = match shape.shape_kind {
        ShapeKind::Heart => {
            let curves = shapes::heart_curves(rect).map(|curve| rotated(curve, center, degrees));
            let mut out = Vec::new();
            if let Some(color) = fill {
                let outline = curves
                    .iter()
                    .flat_map(|curve| {
                        CubicBezierShape::from_points_stroke(*curve, false, Color32::TRANSPARENT, Stroke::NONE)
                            .flatten(Some(HEART_TOLERANCE))
                    })
                    .collect();
                // The waist lies on the vertical axis, inside both lobes.
                let anchor = rotate_about(pos2(center.x, rect.min.y + rect.height() * 0.65), center, degrees);
                out.push(Primitive::Fill {
                    center: anchor,
                    outline,
                    color,
                });
            }
            out.extend(curves.into_iter().map(|points| Primitive::CubicBezier { points, stroke }));
            return out;
        }
        ShapeKind::Circle => shapes::ellipse_points(rect, ELLIPSE_SEGMENTS),
        ShapeKind::Rectangle => shapes::rect_corners(rect).to_vec(),
        ShapeKind::Triangle => shapes::triangle_points(rect).to_vec(),
        ShapeKind::Star => shapes::star_points(rect, shapes::STAR_POINTS),
    };

    let outline = rotated_vec(outline, center, degrees);
    let mut out = Vec::with_capacity(2);
    if let Some(color) = fill {
        out.push(Primitive::Fill {
            center,
            outline: outline.clone(),
            color,
        });
    }
    out.push(Primitive::Polyline {
        points: outline,
        closed: true,
        stroke,
    });
    out
}

fn image_primitives(id: ElementId, bytes: Option<&ImageBytes>, rect: Rect, degrees: f32, alpha: f32) -> Vec<Primitive> {
    let corners = rotated(shapes::rect_corners(rect), rect.center(), degrees);
    match bytes.filter(|b| !b.is_empty()) {
        Some(bytes) => vec![Primitive::Image {
            id,
            bytes: bytes.clone(),
            corners,
            tint: faded(Color32::WHITE, alpha),
        }],
        // Placement waiting for a file.
        None => vec![
            Primitive::Fill {
                center: rect.center(),
                outline: corners.to_vec(),
                color: faded(IMAGE_PLACEHOLDER_FILL, alpha),
            },
            Primitive::Polyline {
                points: corners.to_vec(),
                closed: true,
                stroke: Stroke::new(1.0, faded(IMAGE_PLACEHOLDER_BORDER, alpha)),
            },
        ],
    }
}

/// Cell boxes of a tiled watermark: the page split into a fixed grid, the stamp
/// centred in every cell.
pub fn tile_cells(viewport: Vec2, stamp: Vec2) -> Vec<Rect> {
    let cell = vec2(viewport.x / TILE_COLUMNS as f32, viewport.y / TILE_ROWS as f32);
    (0..TILE_ROWS)
        .flat_map(|row| (0..TILE_COLUMNS).map(move |col| (row, col)))
        .map(|(row, col)| {
            let center = pos2((col as f32 + 0.5) * cell.x, (row as f32 + 0.5) * cell.y);
            Rect::from_center_size(center, stamp)
        })
        .collect()
}

fn watermark_primitives(
    id: ElementId,
    watermark: &WatermarkElement,
    rect: Rect,
    degrees: f32,
    alpha: f32,
    scale: f32,
) -> Vec<Primitive> {
    if let Some(bytes) = watermark.image_bytes.as_ref().filter(|b| !b.is_empty()) {
        return image_primitives(id, Some(bytes), rect, degrees, alpha);
    }
    match &watermark.text {
        Some(text) => vec![Primitive::Text {
            text: text.clone(),
            rect,
            rotation: degrees,
            font_size: watermark.style.font_size * scale,
            style: TextStyle {
                color: faded(watermark.style.color, alpha),
                ..watermark.style
            },
        }],
        None => Vec::new(),
    }
}

/// Bounding box and, for unlocked boxed elements, the eight resize grips.
pub fn selection_chrome(element: &Element, mapper: &CoordinateMapper, config: &EditorConfig) -> Vec<Primitive> {
    use crate::widgets::Handle;

    let rect = element.device_rect(mapper);
    let center = rect.center();
    let stroke = Stroke::new(1.0, SELECTION_COLOR);
    let mut out = vec![Primitive::Polyline {
        points: rotated(shapes::rect_corners(rect), center, element.rotation).to_vec(),
        closed: true,
        stroke,
    }];

    if element.locked || element.size().is_none() {
        return out;
    }
    for handle in Handle::ALL {
        let anchor = rotate_about(handle.anchor(rect), center, element.rotation);
        let grip = Rect::from_center_size(anchor, Vec2::splat(config.handle_size));
        let corners = shapes::rect_corners(grip).to_vec();
        out.push(Primitive::Fill {
            center: anchor,
            outline: corners.clone(),
            color: Color32::WHITE,
        });
        out.push(Primitive::Polyline {
            points: corners,
            closed: true,
            stroke,
        });
    }
    out
}

/// Light grid lines every `grid_size` percent of the page.
pub fn grid_lines(mapper: &CoordinateMapper, grid_size: f32) -> Vec<Primitive> {
    if grid_size.is_nan() || grid_size <= 0.0 {
        return Vec::new();
    }
    let grid_size = grid_size.max(crate::state::config::MIN_GRID_SIZE);
    let viewport = mapper.viewport();
    let stroke = Stroke::new(GRID_LINE_WIDTH, GRID_COLOR);
    let steps = (100.0 / grid_size).floor() as usize;

    (0..=steps)
        .flat_map(|i| {
            let pct = i as f32 * grid_size;
            let x = pct * viewport.x / 100.0;
            let y = pct * viewport.y / 100.0;
            [
                Primitive::Polyline {
                    points: vec![pos2(x, 0.0), pos2(x, viewport.y)],
                    closed: false,
                    stroke,
                },
                Primitive::Polyline {
                    points: vec![pos2(0.0, y), pos2(viewport.x, y)],
                    closed: false,
                    stroke,
                },
            ]
        })
        .collect()
}

/// Rubber band of a range selection.
pub fn marquee(rect: Rect) -> Vec<Primitive> {
    let corners = shapes::rect_corners(rect).to_vec();
    vec![
        Primitive::Fill {
            center: rect.center(),
            outline: corners.clone(),
            color: SELECTION_COLOR.gamma_multiply(0.15),
        },
        Primitive::Polyline {
            points: corners,
            closed: true,
            stroke: Stroke::new(1.0, SELECTION_COLOR),
        },
    ]
}
