use egui::{Color32, CursorIcon};
use serde::{Deserialize, Serialize};

use crate::element::{
    FontFamily, FontStyle, FontWeight, HIGHLIGHT_COLOR, HIGHLIGHT_OPACITY, HIGHLIGHT_STROKE_WIDTH, REDACTION_COLOR,
    ShapeKind, TextAlign, TextDecoration, TextStyle,
};

mod controller;
pub use controller::{InteractionController, InteractionState, PointerContext, Subscription};

/// The tool driving pointer gestures on the page surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToolKind {
    /// Select, drag and resize existing elements.
    #[default]
    Select,
    /// Freehand pen.
    Draw,
    /// Freehand translucent marker.
    Highlighter,
    Shape(ShapeKind),
    Arrow,
    Line,
    /// Click to place a text box.
    Text,
    /// Click to place an image box.
    Image,
    Pan,
    /// Click an element to delete it.
    Erase,
    /// Click for a point comment, drag for a range comment.
    Comment,
    /// Click for a point highlight, drag to highlight a range.
    Highlight,
    /// Drag an area to black out.
    Redact,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "Select",
            ToolKind::Draw => "Draw",
            ToolKind::Highlighter => "Highlighter",
            ToolKind::Shape(kind) => match kind {
                ShapeKind::Rectangle => "Rectangle",
                ShapeKind::Circle => "Circle",
                ShapeKind::Triangle => "Triangle",
                ShapeKind::Star => "Star",
                ShapeKind::Heart => "Heart",
            },
            ToolKind::Arrow => "Arrow",
            ToolKind::Line => "Line",
            ToolKind::Text => "Text",
            ToolKind::Image => "Image",
            ToolKind::Pan => "Pan",
            ToolKind::Erase => "Eraser",
            ToolKind::Comment => "Comment",
            ToolKind::Highlight => "Highlight",
            ToolKind::Redact => "Redact",
        }
    }

    /// Every tool, in toolbar order.
    pub fn all() -> Vec<ToolKind> {
        let mut tools = vec![ToolKind::Select, ToolKind::Pan, ToolKind::Draw, ToolKind::Highlighter];
        tools.extend(ShapeKind::ALL.map(ToolKind::Shape));
        tools.extend([
            ToolKind::Arrow,
            ToolKind::Line,
            ToolKind::Text,
            ToolKind::Image,
            ToolKind::Erase,
            ToolKind::Comment,
            ToolKind::Highlight,
            ToolKind::Redact,
        ]);
        tools
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            ToolKind::Select => CursorIcon::Default,
            ToolKind::Pan => CursorIcon::Grab,
            ToolKind::Text => CursorIcon::Text,
            ToolKind::Erase => CursorIcon::NotAllowed,
            ToolKind::Comment | ToolKind::Image => CursorIcon::PointingHand,
            _ => CursorIcon::Crosshair,
        }
    }

    /// Tools that react to the pointer moving with no button held.
    pub fn wants_hover(&self) -> bool {
        matches!(self, ToolKind::Select | ToolKind::Erase)
    }

    pub fn is_freehand(&self) -> bool {
        matches!(self, ToolKind::Draw | ToolKind::Highlighter)
    }

    /// Tools that drag out a box or a segment between two corners.
    pub fn is_area(&self) -> bool {
        matches!(self, ToolKind::Shape(_) | ToolKind::Arrow | ToolKind::Line | ToolKind::Redact)
    }

    pub fn marker_kind(&self) -> Option<MarkerKind> {
        match self {
            ToolKind::Comment => Some(MarkerKind::Comment),
            ToolKind::Highlight => Some(MarkerKind::Highlight),
            _ => None,
        }
    }
}

/// Downstream action of a place/range gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    Comment,
    Highlight,
}

/// Style applied to newly created elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    #[serde(with = "crate::element::color")]
    pub color: Color32,
    pub stroke_width: f32,
    pub opacity: f32,
    pub font_size: f32,
    pub font_family: FontFamily,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub text_align: TextAlign,
    #[serde(with = "crate::element::color")]
    pub redaction_color: Color32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: Color32::BLACK,
            stroke_width: 3.0,
            opacity: 1.0,
            font_size: 24.0,
            font_family: FontFamily::default(),
            bold: false,
            italic: false,
            underline: false,
            text_align: TextAlign::default(),
            redaction_color: REDACTION_COLOR,
        }
    }
}

impl ToolSettings {
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font_size: self.font_size,
            font_family: self.font_family,
            font_weight: if self.bold { FontWeight::Bold } else { FontWeight::Normal },
            font_style: if self.italic { FontStyle::Italic } else { FontStyle::Normal },
            text_decoration: if self.underline { TextDecoration::Underline } else { TextDecoration::None },
            text_align: self.text_align,
            color: self.color,
        }
    }

    /// `(color, stroke width, opacity)` for a freehand stroke made with `tool`.
    pub fn stroke_for(&self, tool: ToolKind) -> (Color32, f32, f32) {
        match tool {
            ToolKind::Highlighter => (HIGHLIGHT_COLOR, HIGHLIGHT_STROKE_WIDTH, HIGHLIGHT_OPACITY),
            _ => (self.color, self.stroke_width, self.opacity),
        }
    }
}
