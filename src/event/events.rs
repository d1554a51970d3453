use egui::Vec2;

use crate::command::{ChangeOrigin, CommandError};
use crate::geometry::{Position, Size};
use crate::id_generator::ElementId;
use crate::tools::{MarkerKind, ToolKind};

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ElementAdded {
        id: ElementId,
        page: Option<u32>,
    },
    ElementRemoved(ElementId),
    ElementChanged(ElementId),
    /// The whole element collection was replaced.
    StateRestored {
        origin: ChangeOrigin,
        element_count: usize,
    },
    HistoryChanged {
        can_undo: bool,
        can_redo: bool,
    },
    /// Click of the comment or highlight tool.
    MarkerPlaced {
        page: u32,
        position: Position,
        kind: MarkerKind,
    },
    /// Drag of the comment or highlight tool.
    RangeSelected {
        page: u32,
        position: Position,
        size: Size,
        kind: MarkerKind,
    },
    ViewPanned(Vec2),
    ToolChanged {
        old: ToolKind,
        new: ToolKind,
    },
    PageChanged(u32),
    SelectionChanged(Option<ElementId>),
    CommandRejected(CommandError),
}
