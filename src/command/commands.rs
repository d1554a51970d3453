use egui::Vec2;
use log::debug;

use super::{CommandError, CommandResult};
use crate::document::Document;
use crate::element::{Element, ElementPatch, ReorderDirection};
use crate::geometry::{Position, Size};
use crate::id_generator::ElementId;
use crate::state::EditorConfig;
use crate::tools::MarkerKind;

/// Everything that can change the document or report a gesture outcome.
///
/// Commands that record history produce exactly one snapshot when they change the
/// model. Gesture steps (`MoveElement`, `ResizeElement`) mutate the model live and are
/// recorded once by the `EndGesture` that closes the drag.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddElement(Element),
    UpdateElement {
        id: ElementId,
        patch: ElementPatch,
    },
    RemoveElement(ElementId),
    DuplicateElement(ElementId),
    ReorderElement {
        id: ElementId,
        direction: ReorderDirection,
    },
    MoveElement {
        id: ElementId,
        position: Position,
    },
    ResizeElement {
        id: ElementId,
        position: Position,
        size: Size,
    },
    EndGesture(ElementId),
    SetCurrentPage(u32),
    /// Scroll the viewer by a device-pixel delta.
    PanView(Vec2),
    /// A click of a comment/highlight tool.
    PlaceMarker {
        page: u32,
        position: Position,
        kind: MarkerKind,
    },
    /// A drag of a comment/highlight tool.
    SelectRange {
        page: u32,
        position: Position,
        size: Size,
        kind: MarkerKind,
    },
}

impl Command {
    /// The element the command operates on, if any.
    pub fn target(&self) -> Option<ElementId> {
        match self {
            Command::UpdateElement { id, .. }
            | Command::ReorderElement { id, .. }
            | Command::MoveElement { id, .. }
            | Command::ResizeElement { id, .. } => Some(*id),
            Command::RemoveElement(id) | Command::DuplicateElement(id) | Command::EndGesture(id) => Some(*id),
            Command::AddElement(_)
            | Command::SetCurrentPage(_)
            | Command::PanView(_)
            | Command::PlaceMarker { .. }
            | Command::SelectRange { .. } => None,
        }
    }

    /// Whether an effective execution pushes a history snapshot.
    pub fn records_history(&self) -> bool {
        match self {
            Command::AddElement(_)
            | Command::UpdateElement { .. }
            | Command::RemoveElement(_)
            | Command::DuplicateElement(_)
            | Command::ReorderElement { .. }
            | Command::EndGesture(_)
            | Command::SetCurrentPage(_) => true,
            Command::MoveElement { .. }
            | Command::ResizeElement { .. }
            | Command::PanView(_)
            | Command::PlaceMarker { .. }
            | Command::SelectRange { .. } => false,
        }
    }

    /// Apply the command to the document. `Ok(true)` means the model changed.
    /// Commands naming unknown elements are no-ops.
    pub fn execute(&self, doc: &mut Document, config: &EditorConfig) -> CommandResult {
        let changed = match self {
            Command::AddElement(element) => {
                if let Some(page) = element.page.filter(|p| !doc.contains_page(*p)) {
                    return Err(CommandError::PageOutOfRange {
                        page,
                        page_count: doc.page_count(),
                    });
                }
                doc.elements_mut().add(element.clone());
                true
            }
            Command::UpdateElement { id, patch } => doc.elements_mut().update(*id, patch),
            Command::RemoveElement(id) => doc.elements_mut().remove(*id).is_some(),
            Command::DuplicateElement(id) => doc.elements_mut().duplicate(*id, config.duplicate_offset).is_some(),
            Command::ReorderElement { id, direction } => doc.elements_mut().reorder(*id, *direction),
            Command::MoveElement { id, position } => doc.elements_mut().set_position(*id, *position),
            Command::ResizeElement { id, position, size } => doc.elements_mut().update_with(*id, |element| {
                let before = element.bounds();
                element.resize_to(*position, *size);
                element.bounds() != before
            }),
            // The gesture already changed the model; closing it records the result.
            Command::EndGesture(id) => doc.elements().contains(*id),
            Command::SetCurrentPage(page) => doc.set_current_page(*page),
            Command::PanView(_) | Command::PlaceMarker { .. } | Command::SelectRange { .. } => false,
        };

        if !changed {
            debug!("{self:?} left the document unchanged");
        }
        Ok(changed)
    }
}
