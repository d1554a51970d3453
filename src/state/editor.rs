use egui::{CursorIcon, Pos2, Vec2};
use log::{debug, info, warn};

use crate::command::{ChangeOrigin, Command, CommandError, HistoryManager, HistoryState};
use crate::document::Document;
use crate::element::{Element, ElementPatch, ReorderDirection};
use crate::event::{EditorEvent, EventBus};
use crate::geometry::PageSize;
use crate::id_generator::ElementId;
use crate::input::{InputEvent, InputHandler};
use crate::state::EditorConfig;
use crate::tools::{InteractionController, PointerContext, ToolKind, ToolSettings};

/// The editing session: the document, its undo history and the interaction
/// controller, wired to an event bus.
///
/// Every change goes through [`EditorContext::execute`], which enforces the gesture
/// lock: while a drag or resize runs, commands from anyone but the controller that
/// target the dragged element are refused with [`CommandError::ElementBusy`].
#[derive(Debug)]
pub struct EditorContext {
    document: Document,
    history: HistoryManager,
    controller: InteractionController,
    settings: ToolSettings,
    config: EditorConfig,
    event_bus: EventBus,
    hover_cursor: CursorIcon,
    pending_pan: Vec2,
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::new(Document::default(), EditorConfig::default(), ToolSettings::default())
    }
}

impl EditorContext {
    pub fn new(document: Document, config: EditorConfig, settings: ToolSettings) -> Self {
        let history = HistoryManager::new(document.history_state(), config.history_capacity);
        Self {
            document,
            history,
            controller: InteractionController::default(),
            settings,
            config,
            event_bus: EventBus::new(),
            hover_cursor: CursorIcon::Default,
            pending_pan: Vec2::ZERO,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EditorConfig) {
        self.history.set_capacity(config.history_capacity);
        self.config = config;
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.controller.selected()
    }

    pub fn selected_element(&self) -> Option<&Element> {
        self.selected().and_then(|id| self.document.elements().get(id))
    }

    pub fn hover_cursor(&self) -> CursorIcon {
        self.hover_cursor
    }

    /// Scroll requested by the pan tool since the last call.
    pub fn take_pan(&mut self) -> Vec2 {
        std::mem::take(&mut self.pending_pan)
    }

    /// Run a command on behalf of anyone but the interaction controller.
    pub fn execute(&mut self, command: Command) -> Result<bool, CommandError> {
        if let Some(id) = command.target() {
            if self.controller.gesture_target() == Some(id) {
                warn!("rejected {command:?}: element {id} is being dragged");
                let err = CommandError::ElementBusy(id);
                self.event_bus.emit(EditorEvent::CommandRejected(err.clone()));
                return Err(err);
            }
        }
        self.run(command)
    }

    fn run(&mut self, command: Command) -> Result<bool, CommandError> {
        let before_len = self.document.elements().len();
        let changed = match command.execute(&mut self.document, &self.config) {
            Ok(changed) => changed,
            Err(err) => {
                warn!("command failed: {err}");
                self.event_bus.emit(EditorEvent::CommandRejected(err.clone()));
                return Err(err);
            }
        };

        match &command {
            Command::AddElement(element) if changed => self.event_bus.emit(EditorEvent::ElementAdded {
                id: element.id,
                page: element.page,
            }),
            Command::DuplicateElement(_) if changed && self.document.elements().len() > before_len => {
                if let Some(copy) = self.document.elements().elements().last() {
                    let (id, page) = (copy.id, copy.page);
                    self.event_bus.emit(EditorEvent::ElementAdded { id, page });
                    self.select(Some(id));
                }
            }
            Command::RemoveElement(id) if changed => {
                self.event_bus.emit(EditorEvent::ElementRemoved(*id));
                if self.selected() == Some(*id) {
                    self.select(None);
                }
            }
            Command::UpdateElement { id, .. }
            | Command::ReorderElement { id, .. }
            | Command::MoveElement { id, .. }
            | Command::ResizeElement { id, .. }
                if changed =>
            {
                self.event_bus.emit(EditorEvent::ElementChanged(*id));
            }
            Command::SetCurrentPage(_) if changed => {
                self.event_bus.emit(EditorEvent::PageChanged(self.document.current_page()));
            }
            Command::PanView(delta) => {
                self.pending_pan += *delta;
                self.event_bus.emit(EditorEvent::ViewPanned(*delta));
            }
            Command::PlaceMarker { page, position, kind } => self.event_bus.emit(EditorEvent::MarkerPlaced {
                page: *page,
                position: *position,
                kind: *kind,
            }),
            Command::SelectRange {
                page,
                position,
                size,
                kind,
            } => self.event_bus.emit(EditorEvent::RangeSelected {
                page: *page,
                position: *position,
                size: *size,
                kind: *kind,
            }),
            _ => {}
        }

        if changed && command.records_history() {
            self.record();
        }
        Ok(changed)
    }

    fn record(&mut self) {
        self.history.snapshot(self.document.history_state());
        self.emit_history();
    }

    fn emit_history(&self) {
        self.event_bus.emit(EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    /// Replace the elements and current page wholesale. User changes are recorded;
    /// history restores never are.
    pub fn apply_state(&mut self, state: &HistoryState, origin: ChangeOrigin) {
        self.document.restore(state);
        if origin == ChangeOrigin::User {
            self.history.snapshot(self.document.history_state());
        }
        if self.selected().is_some_and(|id| !self.document.elements().contains(id)) {
            self.select(None);
        }
        self.event_bus.emit(EditorEvent::StateRestored {
            origin,
            element_count: self.document.elements().len(),
        });
        self.emit_history();
    }

    pub fn can_undo(&self) -> bool {
        !self.controller.is_busy() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.controller.is_busy() && self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        if self.controller.is_busy() {
            debug!("undo ignored during {}", self.controller.state().name());
            return false;
        }
        match self.history.undo().cloned() {
            Some(state) => {
                self.apply_state(&state, ChangeOrigin::History);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.controller.is_busy() {
            debug!("redo ignored during {}", self.controller.state().name());
            return false;
        }
        match self.history.redo().cloned() {
            Some(state) => {
                self.apply_state(&state, ChangeOrigin::History);
                true
            }
            None => false,
        }
    }

    pub fn select(&mut self, id: Option<ElementId>) {
        if self.controller.selected() != id {
            self.controller.select(id);
            self.event_bus.emit(EditorEvent::SelectionChanged(id));
        }
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        let old = self.controller.tool();
        let selected = self.controller.selected();
        if let Some(closing) = self.controller.set_tool(tool) {
            self.dispatch(closing);
        }
        if self.controller.selected() != selected {
            self.event_bus.emit(EditorEvent::SelectionChanged(self.controller.selected()));
        }
        if old != tool {
            self.event_bus.emit(EditorEvent::ToolChanged { old, new: tool });
        }
    }

    pub fn delete_selected(&mut self) -> Result<bool, CommandError> {
        match self.selected() {
            Some(id) => self.execute(Command::RemoveElement(id)),
            None => Ok(false),
        }
    }

    pub fn duplicate_selected(&mut self) -> Result<bool, CommandError> {
        match self.selected() {
            Some(id) => self.execute(Command::DuplicateElement(id)),
            None => Ok(false),
        }
    }

    pub fn update_selected(&mut self, patch: ElementPatch) -> Result<bool, CommandError> {
        match self.selected() {
            Some(id) if !patch.is_empty() => self.execute(Command::UpdateElement { id, patch }),
            _ => Ok(false),
        }
    }

    pub fn reorder_selected(&mut self, direction: ReorderDirection) -> Result<bool, CommandError> {
        match self.selected() {
            Some(id) => self.execute(Command::ReorderElement { id, direction }),
            None => Ok(false),
        }
    }

    pub fn set_page(&mut self, page: u32) -> Result<bool, CommandError> {
        self.execute(Command::SetCurrentPage(page))
    }

    /// Add a batch of elements, e.g. the redactions of a search, as one undo step.
    /// Nothing is added when any element names a missing page.
    pub fn add_elements(&mut self, elements: Vec<Element>) -> Result<usize, CommandError> {
        if let Some(page) = elements
            .iter()
            .filter_map(|e| e.page)
            .find(|page| !self.document.contains_page(*page))
        {
            let err = CommandError::PageOutOfRange {
                page,
                page_count: self.document.page_count(),
            };
            self.event_bus.emit(EditorEvent::CommandRejected(err.clone()));
            return Err(err);
        }
        let count = elements.len();
        for element in elements {
            let (id, page) = (element.id, element.page);
            self.document.elements_mut().add(element);
            self.event_bus.emit(EditorEvent::ElementAdded { id, page });
        }
        if count > 0 {
            info!("added {count} element(s) in one step");
            self.record();
        }
        Ok(count)
    }

    pub fn set_zoom(&mut self, zoom_percent: f32) -> f32 {
        self.document.set_zoom(zoom_percent)
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.document.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.document.zoom_out()
    }

    /// Install the geometry of a newly opened PDF. Elements bound to pages that no
    /// longer exist are dropped and history starts over. Returns whether the page
    /// count changed.
    pub fn load_pages(&mut self, page_sizes: Vec<PageSize>) -> bool {
        if let Some(closing) = self.controller.deactivate() {
            self.dispatch(closing);
        }
        self.controller.activate(self.controller.tool());
        let changed = self.document.set_pages(page_sizes);
        self.history.reset(self.document.history_state());
        if self.selected().is_some_and(|id| !self.document.elements().contains(id)) {
            self.select(None);
        }
        info!("loaded {} page(s)", self.document.page_count());
        self.emit_history();
        changed
    }

    /// Run a command produced by the controller. Gesture steps pass the lock the
    /// controller itself holds.
    fn dispatch(&mut self, command: Command) {
        let selected = self.controller.selected();
        if let Err(err) = self.run(command) {
            debug!("controller command failed: {err}");
        }
        let now = self.controller.selected();
        if now != selected {
            self.event_bus.emit(EditorEvent::SelectionChanged(now));
        }
    }

    fn with_pointer<R>(
        &mut self,
        page: u32,
        pixels_per_point: f32,
        f: impl FnOnce(&mut InteractionController, &PointerContext<'_>) -> R,
    ) -> Option<R> {
        let mapper = self.document.mapper(page, pixels_per_point)?;
        let cx = PointerContext {
            page,
            mapper: &mapper,
            elements: self.document.elements(),
            settings: &self.settings,
            config: &self.config,
        };
        Some(f(&mut self.controller, &cx))
    }

    fn pointer(
        &mut self,
        page: u32,
        pixels_per_point: f32,
        f: impl FnOnce(&mut InteractionController, &PointerContext<'_>) -> Option<Command>,
    ) {
        let selected = self.controller.selected();
        let command = self.with_pointer(page, pixels_per_point, f).flatten();
        if self.controller.selected() != selected {
            self.event_bus.emit(EditorEvent::SelectionChanged(self.controller.selected()));
        }
        if let Some(command) = command {
            self.dispatch(command);
        }
    }

    /// `pos` is in device pixels relative to the page's top-left corner.
    pub fn pointer_down(&mut self, page: u32, pos: Pos2, pixels_per_point: f32) {
        self.pointer(page, pixels_per_point, |c, cx| c.pointer_down(pos, cx));
    }

    pub fn pointer_move(&mut self, page: u32, pos: Pos2, pixels_per_point: f32) {
        self.pointer(page, pixels_per_point, |c, cx| c.pointer_move(pos, cx));
    }

    pub fn pointer_up(&mut self, page: u32, pos: Pos2, pixels_per_point: f32) {
        self.pointer(page, pixels_per_point, |c, cx| c.pointer_up(pos, cx));
    }

    pub fn pointer_leave(&mut self, pixels_per_point: f32) {
        if let Some(page) = self.controller.active_page() {
            self.pointer(page, pixels_per_point, |c, cx| c.pointer_leave(cx));
        }
    }

    /// Forward one input event, as far as the active tool subscribed to it.
    ///
    /// A gesture stays on the page it started on; leaving that page ends it.
    pub fn handle_input(&mut self, event: &InputEvent, input: &InputHandler, pixels_per_point: f32) {
        let Some(subscription) = self.controller.subscription() else {
            return;
        };
        // Panning scrolls the view under the pointer, so it tracks screen positions.
        let screen_space = subscription.tool() == ToolKind::Pan;
        let on_page = |page: u32, position: Pos2| {
            if screen_space {
                Some(position)
            } else {
                input.local_to(page, position)
            }
        };

        match event {
            InputEvent::PointerDown { location, .. } => {
                if let Some((page, local)) = location.page {
                    let pos = if screen_space { location.position } else { local };
                    self.pointer_down(page, pos, pixels_per_point);
                }
            }
            InputEvent::PointerMove { location, .. } => match self.controller.active_page() {
                Some(active) if !screen_space && location.page.is_none_or(|(page, _)| page != active) => {
                    self.pointer_leave(pixels_per_point);
                }
                Some(active) => {
                    if let Some(pos) = on_page(active, location.position) {
                        self.pointer_move(active, pos, pixels_per_point);
                    }
                }
                None if subscription.wants_hover() => {
                    self.hover_cursor = match location.page {
                        Some((page, local)) => self
                            .with_pointer(page, pixels_per_point, |c, cx| c.hover_cursor(local, cx))
                            .unwrap_or_default(),
                        None => CursorIcon::Default,
                    };
                }
                None => {}
            },
            InputEvent::PointerUp { location, .. } => {
                if let Some(active) = self.controller.active_page() {
                    match on_page(active, location.position) {
                        Some(pos) => self.pointer_up(active, pos, pixels_per_point),
                        None => self.pointer_leave(pixels_per_point),
                    }
                }
            }
            InputEvent::PointerLeave { .. } => self.pointer_leave(pixels_per_point),
        }

        if self.controller.is_busy() || !subscription.wants_hover() {
            self.hover_cursor = self.controller_cursor();
        }
    }

    fn controller_cursor(&self) -> CursorIcon {
        match self.controller.state() {
            crate::tools::InteractionState::Idle => self.controller.tool().cursor_icon(),
            crate::tools::InteractionState::Dragging { .. } | crate::tools::InteractionState::Panning { .. } => {
                CursorIcon::Grabbing
            }
            crate::tools::InteractionState::Resizing { handle, .. } => handle.cursor_icon(),
            _ => self.controller.tool().cursor_icon(),
        }
    }
}
