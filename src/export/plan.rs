use std::collections::BTreeMap;

use egui::Color32;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::element::{
    Element, ElementKind, FontFamily, ImageBytes, ImageKind, ShapeKind, TextAlign, TextStyle, color,
};
use crate::error::ExportError;
use crate::geometry::{CoordinateMapper, DocPoint, DocRect, PageSize};
use crate::id_generator::ElementId;
use crate::state::EditorConfig;

/// Pages an instruction group applies to. `All` sorts before any single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "scope", content = "page")]
pub enum PageTarget {
    All,
    Page(u32),
}

/// Text attributes in the vocabulary PDF backends use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAttributes {
    pub font_size: f32,
    pub font_family: FontFamily,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub line_through: bool,
    pub align: TextAlign,
    #[serde(with = "color")]
    pub color: Color32,
}

impl From<&TextStyle> for TextAttributes {
    fn from(style: &TextStyle) -> Self {
        use crate::element::{FontStyle, FontWeight, TextDecoration};
        Self {
            font_size: style.font_size,
            font_family: style.font_family,
            bold: style.font_weight == FontWeight::Bold,
            italic: style.font_style == FontStyle::Italic,
            underline: style.text_decoration == TextDecoration::Underline,
            line_through: style.text_decoration == TextDecoration::LineThrough,
            align: style.text_align,
            color: style.color,
        }
    }
}

/// What to draw, in document space (PDF points, bottom-left origin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DrawOp {
    Text {
        rect: DocRect,
        content: String,
        #[serde(flatten)]
        text: TextAttributes,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        rect: DocRect,
        bytes: ImageBytes,
        format: ImageKind,
    },
    #[serde(rename_all = "camelCase")]
    Path {
        points: Vec<DocPoint>,
        #[serde(with = "color")]
        color: Color32,
        stroke_width: f32,
    },
    #[serde(rename_all = "camelCase")]
    Shape {
        shape_kind: ShapeKind,
        rect: DocRect,
        #[serde(with = "color")]
        color: Color32,
        #[serde(with = "color::option")]
        fill: Option<Color32>,
        stroke_width: f32,
    },
    #[serde(rename_all = "camelCase")]
    Arrow {
        points: Vec<DocPoint>,
        #[serde(with = "color")]
        color: Color32,
        stroke_width: f32,
        head_length: f32,
        head_angle: f32,
    },
    #[serde(rename_all = "camelCase")]
    Line {
        points: Vec<DocPoint>,
        #[serde(with = "color")]
        color: Color32,
        stroke_width: f32,
    },
    /// Opaque fill; backends burn it in.
    Redaction {
        rect: DocRect,
        #[serde(with = "color")]
        color: Color32,
        label: Option<String>,
    },
    Watermark {
        rect: DocRect,
        text: Option<String>,
        image: Option<(ImageBytes, ImageKind)>,
        #[serde(flatten)]
        style: TextAttributes,
        tiled: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInstruction {
    pub element: ElementId,
    pub opacity: f32,
    /// Degrees, clockwise on screen, about the element's centre.
    pub rotation: f32,
    #[serde(flatten)]
    pub op: DrawOp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInstructions {
    pub target: PageTarget,
    /// Page size the coordinates were computed against. For `All` this is the first
    /// page; backends rescale for pages of other sizes.
    pub page_size: PageSize,
    pub instructions: Vec<ExportInstruction>,
}

/// Backend-neutral description of everything an export burns into the PDF.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPlan {
    pub groups: Vec<PageInstructions>,
}

impl ExportPlan {
    /// Group the document's elements by target, keeping z-order inside each group.
    pub fn build(document: &Document, config: &EditorConfig) -> Result<Self, ExportError> {
        let mut grouped: BTreeMap<PageTarget, PageInstructions> = BTreeMap::new();

        for element in document.elements().elements() {
            let (target, page_size) = match element.page {
                Some(page) => (
                    PageTarget::Page(page),
                    document.page_size(page).ok_or(ExportError::MissingPage(page))?,
                ),
                None => (PageTarget::All, document.page_size(1).unwrap_or_default()),
            };
            let mapper = CoordinateMapper::new(egui::vec2(page_size.width, page_size.height), page_size);
            let Some(op) = draw_op(element, &mapper, config)? else {
                debug!("skipping {} {} with nothing to draw", element.type_name(), element.id);
                continue;
            };
            grouped
                .entry(target)
                .or_insert_with(|| PageInstructions {
                    target,
                    page_size,
                    instructions: Vec::new(),
                })
                .instructions
                .push(ExportInstruction {
                    element: element.id,
                    opacity: element.opacity,
                    rotation: element.rotation,
                    op,
                });
        }
        Ok(Self {
            groups: grouped.into_values().collect(),
        })
    }

    pub fn group(&self, target: PageTarget) -> Option<&PageInstructions> {
        self.groups.iter().find(|g| g.target == target)
    }

    pub fn instruction_count(&self) -> usize {
        self.groups.iter().map(|g| g.instructions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string(self).map_err(|err| ExportError::Encode(err.to_string()))
    }
}

fn checked_image(bytes: &ImageBytes) -> Result<ImageKind, ExportError> {
    bytes.kind().ok_or(ExportError::UnsupportedImage)
}

fn draw_op(element: &Element, mapper: &CoordinateMapper, config: &EditorConfig) -> Result<Option<DrawOp>, ExportError> {
    let (position, size) = element.bounds();
    let rect = mapper.rect_to_document(position, size);
    let points = || -> Vec<DocPoint> {
        element
            .absolute_points()
            .into_iter()
            .map(|p| mapper.to_document(p, 0.0))
            .collect()
    };

    let op = match &element.kind {
        ElementKind::Text(text) => DrawOp::Text {
            rect,
            content: text.content.clone(),
            text: TextAttributes::from(&text.style),
        },
        ElementKind::Image(image) => match &image.image_bytes {
            Some(bytes) if !bytes.is_empty() => DrawOp::Image {
                rect,
                bytes: bytes.clone(),
                format: checked_image(bytes)?,
            },
            _ => return Ok(None),
        },
        ElementKind::Path(path) => DrawOp::Path {
            points: points(),
            color: path.color,
            stroke_width: path.stroke_width,
        },
        ElementKind::Shape(shape) => DrawOp::Shape {
            shape_kind: shape.shape_kind,
            rect,
            color: shape.color,
            fill: shape.fill,
            stroke_width: shape.stroke_width,
        },
        ElementKind::Arrow(line) => DrawOp::Arrow {
            points: points(),
            color: line.color,
            stroke_width: line.stroke_width,
            head_length: config.arrowhead_length_px,
            head_angle: config.arrowhead_angle,
        },
        ElementKind::Line(line) => DrawOp::Line {
            points: points(),
            color: line.color,
            stroke_width: line.stroke_width,
        },
        ElementKind::Redaction(redaction) => DrawOp::Redaction {
            rect,
            color: redaction.color,
            label: redaction.label.clone(),
        },
        ElementKind::Watermark(watermark) => {
            let image = match &watermark.image_bytes {
                Some(bytes) if !bytes.is_empty() => Some((bytes.clone(), checked_image(bytes)?)),
                _ => None,
            };
            if image.is_none() && watermark.text.is_none() {
                return Ok(None);
            }
            DrawOp::Watermark {
                rect,
                text: watermark.text.clone(),
                image,
                style: TextAttributes::from(&watermark.style),
                tiled: watermark.tiled,
            }
        }
    };
    Ok(Some(op))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::factory;
    use crate::geometry::{Position, Size};

    fn document() -> Document {
        let mut doc = Document::new(vec![PageSize::LETTER, PageSize::A4]);
        let store = doc.elements_mut();
        store.add(factory::create_text(2, Position::new(0.0, 0.0), "two", TextStyle::default()));
        store.add(factory::create_watermark(
            None,
            Position::new(40.0, 45.0),
            Size::new(20.0, 10.0),
            "DRAFT",
            TextStyle::default(),
            true,
        ));
        store.add(factory::create_redaction(1, Position::new(0.0, 90.0), Size::new(50.0, 10.0), Color32::BLACK));
        store.add(factory::create_image(1, Position::ZERO, None));
        doc
    }

    #[test]
    fn test_grouping_by_target() {
        let plan = ExportPlan::build(&document(), &EditorConfig::default()).unwrap();
        let targets: Vec<_> = plan.groups.iter().map(|g| g.target).collect();
        assert_eq!(targets, vec![PageTarget::All, PageTarget::Page(1), PageTarget::Page(2)]);
        // The pending image has nothing to draw.
        assert_eq!(plan.instruction_count(), 3);
        assert_eq!(plan.group(PageTarget::Page(2)).map(|g| g.page_size), Some(PageSize::A4));
    }

    #[test]
    fn test_document_space_geometry() {
        let plan = ExportPlan::build(&document(), &EditorConfig::default()).unwrap();
        let page1 = plan.group(PageTarget::Page(1)).unwrap();
        let DrawOp::Redaction { rect, .. } = &page1.instructions[0].op else {
            panic!("expected a redaction")
        };
        assert!(rect.y.abs() < 1e-3);
        assert!((rect.width - 306.0).abs() < 1e-3);
        assert!((rect.height - 79.2).abs() < 1e-3);

        let page2 = plan.group(PageTarget::Page(2)).unwrap();
        let DrawOp::Text { rect, .. } = &page2.instructions[0].op else {
            panic!("expected text")
        };
        // Top-left text on A4: its top edge touches y = 842.
        assert!((rect.y + rect.height - 842.0).abs() < 1e-3);
    }

    #[test]
    fn test_export_leaves_document_untouched() {
        let doc = document();
        let before = doc.clone();
        let _ = ExportPlan::build(&doc, &EditorConfig::default());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_unsupported_image() {
        let mut doc = Document::new(vec![PageSize::LETTER]);
        doc.elements_mut()
            .add(factory::create_image(1, Position::ZERO, Some(ImageBytes::new(vec![0u8, 1, 2, 3]))));
        let err = ExportPlan::build(&doc, &EditorConfig::default()).unwrap_err();
        assert_eq!(err, ExportError::UnsupportedImage);
    }

    #[test]
    fn test_json_uses_kind_tags() {
        let plan = ExportPlan::build(&document(), &EditorConfig::default()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
        assert_eq!(json["groups"][0]["target"]["scope"], "all");
        assert_eq!(json["groups"][0]["instructions"][0]["kind"], "watermark");
        assert_eq!(json["groups"][1]["instructions"][0]["color"], "#000000");
    }
}
