use egui::{CursorIcon, Pos2, Rect};
use log::{debug, info};

use super::{MarkerKind, ToolKind, ToolSettings};
use crate::command::Command;
use crate::element::common::meets_minimum;
use crate::element::{Element, ElementStore, PLACEHOLDER_TEXT, factory, rect_between};
use crate::geometry::{CoordinateMapper, Position, Size, hit_testing};
use crate::id_generator::ElementId;
use crate::state::EditorConfig;
use crate::widgets::Handle;

/// What a pointer event needs to know about the page it landed on.
pub struct PointerContext<'a> {
    pub page: u32,
    pub mapper: &'a CoordinateMapper,
    pub elements: &'a ElementStore,
    pub settings: &'a ToolSettings,
    pub config: &'a EditorConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    Idle,
    /// Absolute percent points collected since pointer-down.
    DrawingFreehand { page: u32, points: Vec<Position> },
    DrawingShape { page: u32, start: Position, end: Position },
    Dragging {
        page: u32,
        id: ElementId,
        origin: Pos2,
        original: Position,
        moved: bool,
    },
    Resizing {
        page: u32,
        id: ElementId,
        handle: Handle,
        origin: Pos2,
        original: (Position, Size),
        /// Degrees; pointer movement is read in the element's unrotated frame.
        rotation: f32,
        resized: bool,
    },
    Panning { last: Pos2 },
    RangeSelecting {
        page: u32,
        kind: MarkerKind,
        start: Pos2,
        current: Pos2,
    },
}

impl InteractionState {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "Idle",
            InteractionState::DrawingFreehand { .. } => "DrawingFreehand",
            InteractionState::DrawingShape { .. } => "DrawingShape",
            InteractionState::Dragging { .. } => "Dragging",
            InteractionState::Resizing { .. } => "Resizing",
            InteractionState::Panning { .. } => "Panning",
            InteractionState::RangeSelecting { .. } => "RangeSelecting",
        }
    }

    fn page(&self) -> Option<u32> {
        match self {
            InteractionState::DrawingFreehand { page, .. }
            | InteractionState::DrawingShape { page, .. }
            | InteractionState::Dragging { page, .. }
            | InteractionState::Resizing { page, .. }
            | InteractionState::RangeSelecting { page, .. } => Some(*page),
            InteractionState::Idle | InteractionState::Panning { .. } => None,
        }
    }
}

/// Handle on the pointer stream, held while a tool is active. The input layer only
/// forwards events to the controller while a subscription exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    tool: ToolKind,
    hover: bool,
}

impl Subscription {
    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Whether moves with no button held should be forwarded.
    pub fn wants_hover(&self) -> bool {
        self.hover
    }
}

/// Turns pointer events on page surfaces into commands.
///
/// While a drag or resize is in progress the controller owns the target element:
/// [`InteractionController::gesture_target`] names it so other writers can back off.
/// Pointer-leave ends a gesture exactly like pointer-up.
#[derive(Debug, Clone)]
pub struct InteractionController {
    tool: ToolKind,
    state: InteractionState,
    selected: Option<ElementId>,
    subscription: Option<Subscription>,
    last_pos: Option<Pos2>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(ToolKind::default())
    }
}

impl InteractionController {
    pub fn new(tool: ToolKind) -> Self {
        let mut controller = Self {
            tool,
            state: InteractionState::Idle,
            selected: None,
            subscription: None,
            last_pos: None,
        };
        controller.activate(tool);
        controller
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn subscription(&self) -> Option<Subscription> {
        self.subscription
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id;
    }

    pub fn is_busy(&self) -> bool {
        self.state != InteractionState::Idle
    }

    /// Page the running gesture started on.
    pub fn active_page(&self) -> Option<u32> {
        self.state.page()
    }

    /// Element exclusively owned by the running drag or resize.
    pub fn gesture_target(&self) -> Option<ElementId> {
        match &self.state {
            InteractionState::Dragging { id, .. } | InteractionState::Resizing { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn activate(&mut self, tool: ToolKind) {
        self.tool = tool;
        self.subscription = Some(Subscription {
            tool,
            hover: tool.wants_hover(),
        });
        debug!("tool activated: {}", tool.name());
    }

    /// Drop the subscription. A running drag or resize is closed so its result is
    /// recorded; unfinished drawings are discarded.
    pub fn deactivate(&mut self) -> Option<Command> {
        self.subscription = None;
        let closing = match std::mem::replace(&mut self.state, InteractionState::Idle) {
            InteractionState::Dragging { id, moved: true, .. } | InteractionState::Resizing { id, resized: true, .. } => {
                Some(Command::EndGesture(id))
            }
            InteractionState::Idle => None,
            other => {
                debug!("discarding {} on tool change", other.name());
                None
            }
        };
        debug!("tool deactivated: {}", self.tool.name());
        closing
    }

    /// Switch tools; returns the command closing an interrupted gesture, if any.
    pub fn set_tool(&mut self, tool: ToolKind) -> Option<Command> {
        let closing = self.deactivate();
        if tool != ToolKind::Select {
            self.selected = None;
        }
        self.activate(tool);
        closing
    }

    pub fn pointer_down(&mut self, pos: Pos2, cx: &PointerContext<'_>) -> Option<Command> {
        self.last_pos = Some(pos);
        if self.is_busy() {
            debug!("pointer down ignored while {}", self.state.name());
            return None;
        }

        let page = cx.page;
        match self.tool {
            ToolKind::Select => {
                self.begin_select(pos, cx);
                None
            }
            ToolKind::Draw | ToolKind::Highlighter => {
                self.state = InteractionState::DrawingFreehand {
                    page,
                    points: vec![cx.mapper.to_percent(pos)],
                };
                None
            }
            ToolKind::Shape(_) | ToolKind::Arrow | ToolKind::Line | ToolKind::Redact => {
                let start = cx.mapper.to_percent(pos);
                self.state = InteractionState::DrawingShape { page, start, end: start };
                None
            }
            ToolKind::Text => {
                let position = cx.mapper.to_percent(pos);
                let mut element = factory::create_text(page, position, PLACEHOLDER_TEXT, cx.settings.text_style());
                element.opacity = cx.settings.opacity;
                self.selected = Some(element.id);
                Some(Command::AddElement(element))
            }
            ToolKind::Image => {
                let element = factory::create_image(page, cx.mapper.to_percent(pos), None);
                self.selected = Some(element.id);
                Some(Command::AddElement(element))
            }
            ToolKind::Pan => {
                self.state = InteractionState::Panning { last: pos };
                None
            }
            ToolKind::Erase => {
                let id = cx.elements.hit_test(page, cx.mapper, pos, cx.config.hit_tolerance_px)?;
                if cx.elements.get(id).is_some_and(|e| e.locked) {
                    debug!("eraser skipped locked element {id}");
                    return None;
                }
                if self.selected == Some(id) {
                    self.selected = None;
                }
                Some(Command::RemoveElement(id))
            }
            ToolKind::Comment | ToolKind::Highlight => {
                let kind = self.tool.marker_kind().unwrap_or(MarkerKind::Comment);
                self.state = InteractionState::RangeSelecting {
                    page,
                    kind,
                    start: pos,
                    current: pos,
                };
                None
            }
        }
    }

    fn begin_select(&mut self, pos: Pos2, cx: &PointerContext<'_>) {
        let page = cx.page;

        // Grips of the current selection win over whatever lies beneath them.
        if let Some(selected) = self.selected.and_then(|id| cx.elements.get(id)) {
            if selected.on_page(page) && !selected.locked && selected.size().is_some() {
                let rect = selected.device_rect(cx.mapper);
                if let Some(handle) = Handle::at(rect, selected.rotation, pos, cx.config.handle_size) {
                    self.state = InteractionState::Resizing {
                        page,
                        id: selected.id,
                        handle,
                        origin: pos,
                        original: selected.bounds(),
                        rotation: selected.rotation,
                        resized: false,
                    };
                    return;
                }
            }
        }

        let hit = cx.elements.hit_test(page, cx.mapper, pos, cx.config.hit_tolerance_px);
        self.selected = hit;
        let Some(element) = hit.and_then(|id| cx.elements.get(id)) else {
            return;
        };
        if element.locked {
            return;
        }
        self.state = InteractionState::Dragging {
            page,
            id: element.id,
            origin: pos,
            original: element.position,
            moved: false,
        };
    }

    pub fn pointer_move(&mut self, pos: Pos2, cx: &PointerContext<'_>) -> Option<Command> {
        self.last_pos = Some(pos);
        match &mut self.state {
            InteractionState::Idle => None,
            InteractionState::DrawingFreehand { points, .. } => {
                points.push(cx.mapper.to_percent(pos));
                None
            }
            InteractionState::DrawingShape { end, .. } => {
                *end = cx.mapper.to_percent(pos);
                None
            }
            InteractionState::Dragging {
                id, origin, original, moved, ..
            } => {
                let delta = cx.mapper.delta_to_percent(pos - *origin);
                let mut position = original.offset(delta.x, delta.y);
                if let Some(grid) = cx.config.snap_grid() {
                    position = position.snapped(grid);
                }
                *moved = true;
                Some(Command::MoveElement {
                    id: *id,
                    position: position.clamped(),
                })
            }
            InteractionState::Resizing {
                id,
                handle,
                origin,
                original,
                rotation,
                resized,
                ..
            } => {
                let delta = cx.mapper.delta_to_percent(hit_testing::unrotate_delta(pos - *origin, *rotation));
                let (position, size) = handle.resize(*original, delta, cx.config.min_resize_percent);
                *resized = true;
                Some(Command::ResizeElement { id: *id, position, size })
            }
            InteractionState::Panning { last } => {
                let delta = pos - *last;
                *last = pos;
                (delta != egui::Vec2::ZERO).then_some(Command::PanView(delta))
            }
            InteractionState::RangeSelecting { current, .. } => {
                *current = pos;
                None
            }
        }
    }

    pub fn pointer_up(&mut self, pos: Pos2, cx: &PointerContext<'_>) -> Option<Command> {
        self.last_pos = Some(pos);
        match std::mem::replace(&mut self.state, InteractionState::Idle) {
            InteractionState::Idle | InteractionState::Panning { .. } => None,
            InteractionState::DrawingFreehand { page, points } => {
                let element = freehand_element(self.tool, page, &points, cx.settings);
                debug!("freehand stroke committed with {} point(s)", points.len());
                Some(Command::AddElement(element))
            }
            InteractionState::DrawingShape { page, start, .. } => {
                let end = cx.mapper.to_percent(pos);
                let (_, size) = rect_between(start, end);
                let min = match self.tool {
                    ToolKind::Redact => cx.config.min_redaction_percent,
                    _ => cx.config.min_shape_percent,
                };
                let big_enough = match self.tool {
                    ToolKind::Arrow | ToolKind::Line => size.width >= min || size.height >= min,
                    _ => meets_minimum(size, min),
                };
                if !big_enough {
                    debug!("discarded {} gesture of {:.2}x{:.2}%", self.tool.name(), size.width, size.height);
                    return None;
                }
                area_element(self.tool, page, start, end, cx.settings).map(Command::AddElement)
            }
            InteractionState::Dragging { id, moved, .. } | InteractionState::Resizing { id, resized: moved, .. } => {
                moved.then_some(Command::EndGesture(id))
            }
            InteractionState::RangeSelecting { page, kind, start, .. } => {
                let travel = start.distance(pos);
                if travel < cx.config.click_threshold_px {
                    Some(Command::PlaceMarker {
                        page,
                        position: cx.mapper.to_percent(start),
                        kind,
                    })
                } else {
                    let (position, size) = rect_between(cx.mapper.to_percent(start), cx.mapper.to_percent(pos));
                    info!("range selected on page {page}: {travel:.1}px drag");
                    Some(Command::SelectRange { page, position, size, kind })
                }
            }
        }
    }

    /// The pointer left the surface or the gesture was cancelled: finish it like a
    /// pointer-up at the last known position.
    pub fn pointer_leave(&mut self, cx: &PointerContext<'_>) -> Option<Command> {
        if !self.is_busy() {
            return None;
        }
        let pos = self.last_pos?;
        debug!("pointer left during {}, ending gesture", self.state.name());
        self.pointer_up(pos, cx)
    }

    /// The element being drawn, for the overlay preview.
    pub fn preview(&self, settings: &ToolSettings) -> Option<Element> {
        match &self.state {
            InteractionState::DrawingFreehand { page, points } => {
                Some(freehand_element(self.tool, *page, points, settings))
            }
            InteractionState::DrawingShape { page, start, end } => {
                area_element(self.tool, *page, *start, *end, settings)
            }
            _ => None,
        }
    }

    /// Device-space rectangle of a running range selection.
    pub fn marquee(&self) -> Option<Rect> {
        match &self.state {
            InteractionState::RangeSelecting { start, current, .. } => Some(Rect::from_two_pos(*start, *current)),
            _ => None,
        }
    }

    pub fn hover_cursor(&self, pos: Pos2, cx: &PointerContext<'_>) -> CursorIcon {
        match &self.state {
            InteractionState::Resizing { handle, .. } => return handle.cursor_icon(),
            InteractionState::Dragging { .. } => return CursorIcon::Grabbing,
            InteractionState::Panning { .. } => return CursorIcon::Grabbing,
            _ => {}
        }
        if self.tool != ToolKind::Select {
            return self.tool.cursor_icon();
        }
        if let Some(selected) = self.selected.and_then(|id| cx.elements.get(id)) {
            if selected.size().is_some() && !selected.locked {
                let rect = selected.device_rect(cx.mapper);
                if let Some(handle) = Handle::at(rect, selected.rotation, pos, cx.config.handle_size) {
                    return handle.cursor_icon();
                }
            }
        }
        match cx.elements.hit_test(cx.page, cx.mapper, pos, cx.config.hit_tolerance_px) {
            Some(_) => CursorIcon::Move,
            None => CursorIcon::Default,
        }
    }
}

fn freehand_element(tool: ToolKind, page: u32, points: &[Position], settings: &ToolSettings) -> Element {
    let (color, width, opacity) = settings.stroke_for(tool);
    let mut element = factory::create_path(page, points, color, width);
    element.opacity = opacity;
    element
}

fn area_element(tool: ToolKind, page: u32, start: Position, end: Position, settings: &ToolSettings) -> Option<Element> {
    let (position, size) = rect_between(start, end);
    let mut element = match tool {
        ToolKind::Shape(kind) => {
            factory::create_shape(page, kind, position, size, settings.color, settings.stroke_width)
        }
        ToolKind::Arrow => factory::create_arrow(page, start, end, settings.color, settings.stroke_width),
        ToolKind::Line => factory::create_line(page, start, end, settings.color, settings.stroke_width),
        ToolKind::Redact => return Some(factory::create_redaction(page, position, size, settings.redaction_color)),
        _ => return None,
    };
    element.opacity = settings.opacity;
    Some(element)
}
