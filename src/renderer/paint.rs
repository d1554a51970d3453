use egui::epaint::{CubicBezierShape, Mesh, PathShape, TextShape, Vertex};
use egui::text::{LayoutJob, TextFormat};
use egui::{Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, pos2, vec2};
use log::debug;

use super::primitives::Primitive;
use super::textures::TextureManager;
use crate::element::{FontFamily, FontStyle, TextAlign, TextDecoration, TextStyle};
use crate::geometry::shapes::rotate_about;

const UV_CORNERS: [Pos2; 4] = [pos2(0.0, 0.0), pos2(1.0, 0.0), pos2(1.0, 1.0), pos2(0.0, 1.0)];
const BROKEN_IMAGE: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);

/// Paint a display list. Image payloads are uploaded through `textures` on first use.
pub fn paint(painter: &Painter, primitives: &[Primitive], textures: &mut TextureManager) {
    for primitive in primitives {
        match primitive {
            Primitive::Polyline { points, closed, stroke } => {
                let shape = if *closed {
                    PathShape::closed_line(points.clone(), *stroke)
                } else {
                    PathShape::line(points.clone(), *stroke)
                };
                painter.add(shape);
            }
            Primitive::Dot { center, radius, color } => {
                painter.circle_filled(*center, *radius, *color);
            }
            Primitive::Fill { center, outline, color } => {
                painter.add(fan_mesh(*center, outline, *color));
            }
            Primitive::CubicBezier { points, stroke } => {
                painter.add(CubicBezierShape::from_points_stroke(*points, false, Color32::TRANSPARENT, *stroke));
            }
            Primitive::Text {
                text,
                rect,
                rotation,
                font_size,
                style,
            } => {
                painter.add(text_shape(painter, text, *rect, *rotation, *font_size, style));
            }
            Primitive::Image {
                id,
                bytes,
                corners,
                tint,
            } => match textures.image_texture(*id, bytes, painter.ctx()) {
                Ok(texture) => {
                    let mut mesh = Mesh::with_texture(texture);
                    for (pos, uv) in corners.iter().zip(UV_CORNERS) {
                        mesh.vertices.push(Vertex {
                            pos: *pos,
                            uv,
                            color: *tint,
                        });
                    }
                    mesh.add_triangle(0, 1, 2);
                    mesh.add_triangle(0, 2, 3);
                    painter.add(mesh);
                }
                Err(err) => {
                    debug!("image {id} drawn as broken: {err}");
                    painter.add(PathShape::closed_line(corners.to_vec(), Stroke::new(1.0, BROKEN_IMAGE)));
                }
            },
        }
    }
}

fn fan_mesh(center: Pos2, outline: &[Pos2], color: Color32) -> Mesh {
    let mut mesh = Mesh::default();
    if outline.len() < 2 {
        return mesh;
    }
    mesh.colored_vertex(center, color);
    for point in outline {
        mesh.colored_vertex(*point, color);
    }
    let n = outline.len() as u32;
    for i in 0..n {
        mesh.add_triangle(0, 1 + i, 1 + (i + 1) % n);
    }
    mesh
}

fn text_shape(painter: &Painter, text: &str, rect: Rect, rotation: f32, font_size: f32, style: &TextStyle) -> Shape {
    let family = match style.font_family {
        FontFamily::Courier => egui::FontFamily::Monospace,
        FontFamily::Helvetica | FontFamily::TimesRoman => egui::FontFamily::Proportional,
    };
    let line = Stroke::new((font_size / 16.0).max(1.0), style.color);
    let format = TextFormat {
        font_id: FontId::new(font_size.max(1.0), family),
        color: style.color,
        italics: style.font_style == FontStyle::Italic,
        underline: if style.text_decoration == TextDecoration::Underline { line } else { Stroke::NONE },
        strikethrough: if style.text_decoration == TextDecoration::LineThrough { line } else { Stroke::NONE },
        ..Default::default()
    };
    let mut job = LayoutJob::single_section(text.to_owned(), format);
    job.wrap.max_width = rect.width().max(1.0);
    let galley = painter.layout_job(job);

    let slack = rect.width() - galley.size().x;
    let dx = match style.text_align {
        TextAlign::Left => 0.0,
        TextAlign::Center => slack / 2.0,
        TextAlign::Right => slack,
    };
    let pos = rotate_about(rect.min + vec2(dx, 0.0), rect.center(), rotation);
    let mut shape = TextShape::new(pos, galley, style.color);
    shape.angle = rotation.to_radians();
    Shape::Text(shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_mesh_closes_outline() {
        let outline = [pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0), pos2(0.0, 10.0)];
        let mesh = fan_mesh(pos2(5.0, 5.0), &outline, Color32::RED);
        assert_eq!(mesh.vertices.len(), 5);
        assert_eq!(mesh.indices.len(), 4 * 3);
        assert_eq!(&mesh.indices[9..], &[0, 4, 1]);
    }

    #[test]
    fn test_degenerate_fan_is_empty() {
        assert!(fan_mesh(Pos2::ZERO, &[Pos2::ZERO], Color32::RED).is_empty());
    }
}
