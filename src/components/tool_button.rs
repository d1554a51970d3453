use egui::{Align2, Color32, FontId, Response, Sense, Stroke, Ui, vec2};

use crate::element::ShapeKind;
use crate::tools::ToolKind;

const SELECTED_FILL: Color32 = Color32::from_rgb(100, 181, 246);
const SELECTED_BORDER: Color32 = Color32::from_rgb(33, 150, 243);

/// Square toolbar button showing a tool's glyph, with its name as tooltip.
pub struct ToolButton {
    pub tool: ToolKind,
    pub selected: bool,
}

impl ToolButton {
    pub fn new(tool: ToolKind, selected: bool) -> Self {
        Self { tool, selected }
    }

    pub fn icon(tool: ToolKind) -> &'static str {
        match tool {
            ToolKind::Select => "⬉",
            ToolKind::Pan => "✋",
            ToolKind::Draw => "✏",
            ToolKind::Highlighter => "🖍",
            ToolKind::Shape(ShapeKind::Rectangle) => "⬜",
            ToolKind::Shape(ShapeKind::Circle) => "⭕",
            ToolKind::Shape(ShapeKind::Triangle) => "🔺",
            ToolKind::Shape(ShapeKind::Star) => "⭐",
            ToolKind::Shape(ShapeKind::Heart) => "❤",
            ToolKind::Arrow => "➡",
            ToolKind::Line => "➖",
            ToolKind::Text => "T",
            ToolKind::Image => "🖼",
            ToolKind::Erase => "🗑",
            ToolKind::Comment => "💬",
            ToolKind::Highlight => "🖊",
            ToolKind::Redact => "⬛",
        }
    }

    pub fn show(&self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(vec2(32.0, 32.0), Sense::click());

        if ui.is_rect_visible(rect) {
            let fill = if self.selected {
                SELECTED_FILL
            } else if response.hovered() {
                Color32::from_gray(40)
            } else {
                Color32::from_gray(30)
            };
            ui.painter().rect_filled(rect, 4.0, fill);

            let text_color = if self.selected { Color32::BLACK } else { Color32::WHITE };
            ui.painter().text(
                rect.center(),
                Align2::CENTER_CENTER,
                Self::icon(self.tool),
                FontId::proportional(20.0),
                text_color,
            );

            if self.selected {
                ui.painter().rect_stroke(rect, 4.0, Stroke::new(2.0, SELECTED_BORDER));
            }
        }

        response.on_hover_text(self.tool.name())
    }
}
