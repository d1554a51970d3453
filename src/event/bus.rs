use std::cell::RefCell;

use crate::event::{EditorEvent, EventHandler};

/// Broadcasts editor events to registered handlers, in registration order.
pub struct EventBus {
    handlers: RefCell<Vec<Box<dyn EventHandler>>>,
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        // Handlers belong to the original bus.
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.borrow().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, handler: impl EventHandler + 'static) {
        self.handlers.borrow_mut().push(Box::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Deliver `event` to every handler. Handlers must not emit on the same bus.
    pub fn emit(&self, event: EditorEvent) {
        for handler in &mut *self.handlers.borrow_mut() {
            handler.handle_event(&event);
        }
    }
}
