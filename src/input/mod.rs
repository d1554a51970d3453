//! Raw egui input turned into page-local pointer events and editor shortcuts.

use egui::{Context, PointerButton, Pos2, Rect};

mod shortcuts;
pub use shortcuts::{ShortcutAction, action_for, collect_shortcuts};

/// Where a pointer event happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputLocation {
    /// Screen position.
    pub position: Pos2,
    /// Page under the pointer and the position relative to that page's top-left.
    pub page: Option<(u32, Pos2)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        location: InputLocation,
        button: PointerButton,
    },
    PointerUp {
        location: InputLocation,
        button: PointerButton,
    },
    PointerMove {
        location: InputLocation,
        /// Whether the primary button is held.
        dragging: bool,
    },
    /// The pointer left the window.
    PointerLeave { last_known_location: InputLocation },
}

/// Converts egui's pointer state into [`InputEvent`]s, tracking where each page is
/// laid out on screen this frame.
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    page_rects: Vec<(u32, Rect)>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget last frame's layout; call before laying out the pages.
    pub fn begin_frame(&mut self) {
        self.page_rects.clear();
    }

    pub fn set_page_rect(&mut self, page: u32, rect: Rect) {
        match self.page_rects.iter_mut().find(|(p, _)| *p == page) {
            Some(entry) => entry.1 = rect,
            None => self.page_rects.push((page, rect)),
        }
    }

    pub fn page_rect(&self, page: u32) -> Option<Rect> {
        self.page_rects.iter().find(|(p, _)| *p == page).map(|(_, r)| *r)
    }

    /// Locate a screen position; pages laid out later win on overlap.
    pub fn locate(&self, position: Pos2) -> InputLocation {
        let page = self
            .page_rects
            .iter()
            .rev()
            .find(|(_, rect)| rect.contains(position))
            .map(|(page, rect)| (*page, position - rect.min.to_vec2()));
        InputLocation { position, page }
    }

    /// Position relative to `page` even when the pointer is outside it.
    pub fn local_to(&self, page: u32, position: Pos2) -> Option<Pos2> {
        self.page_rect(page).map(|rect| position - rect.min.to_vec2())
    }

    pub fn process_input(&mut self, ctx: &Context) -> Vec<InputEvent> {
        let mut events = Vec::new();

        ctx.input(|input| {
            match (input.pointer.hover_pos(), self.last_pointer_pos) {
                (Some(pos), last) => {
                    if Some(pos) != last {
                        events.push(InputEvent::PointerMove {
                            location: self.locate(pos),
                            dragging: input.pointer.primary_down(),
                        });
                    }
                    self.last_pointer_pos = Some(pos);
                }
                (None, Some(last)) => {
                    events.push(InputEvent::PointerLeave {
                        last_known_location: self.locate(last),
                    });
                    self.last_pointer_pos = None;
                }
                (None, None) => {}
            }

            let Some(pos) = input.pointer.interact_pos() else {
                return;
            };
            let button = PointerButton::Primary;
            if input.pointer.button_pressed(button) {
                events.push(InputEvent::PointerDown {
                    location: self.locate(pos),
                    button,
                });
            }
            if input.pointer.button_released(button) {
                events.push(InputEvent::PointerUp {
                    location: self.locate(pos),
                    button,
                });
            }
        });

        events
    }
}
