use egui::{Context, Event, Key, Modifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    DeleteSelection,
}

/// Undo is `mod+Z`; redo is `mod+Shift+Z` or `Ctrl+Y`; Delete and Backspace remove
/// the selection unless a text field has keyboard focus.
pub fn action_for(key: Key, modifiers: Modifiers, text_focus: bool) -> Option<ShortcutAction> {
    match key {
        Key::Z if modifiers.command && modifiers.shift => Some(ShortcutAction::Redo),
        Key::Z if modifiers.command => Some(ShortcutAction::Undo),
        Key::Y if modifiers.ctrl => Some(ShortcutAction::Redo),
        Key::Delete | Key::Backspace if !text_focus && modifiers.is_none() => Some(ShortcutAction::DeleteSelection),
        _ => None,
    }
}

/// Shortcuts pressed this frame.
pub fn collect_shortcuts(ctx: &Context) -> Vec<ShortcutAction> {
    let text_focus = ctx.wants_keyboard_input();
    ctx.input(|input| {
        input
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Key {
                    key,
                    pressed: true,
                    modifiers,
                    ..
                } => action_for(*key, *modifiers, text_focus),
                _ => None,
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_bindings() {
        assert_eq!(action_for(Key::Z, Modifiers::COMMAND, false), Some(ShortcutAction::Undo));
        assert_eq!(
            action_for(Key::Z, Modifiers::COMMAND | Modifiers::SHIFT, false),
            Some(ShortcutAction::Redo)
        );
        assert_eq!(action_for(Key::Y, Modifiers::CTRL, false), Some(ShortcutAction::Redo));
        assert_eq!(action_for(Key::Z, Modifiers::NONE, false), None);
    }

    #[test]
    fn test_delete_respects_text_focus() {
        assert_eq!(
            action_for(Key::Delete, Modifiers::NONE, false),
            Some(ShortcutAction::DeleteSelection)
        );
        assert_eq!(
            action_for(Key::Backspace, Modifiers::NONE, false),
            Some(ShortcutAction::DeleteSelection)
        );
        assert_eq!(action_for(Key::Backspace, Modifiers::NONE, true), None);
    }
}
