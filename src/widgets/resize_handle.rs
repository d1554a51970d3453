use egui::{CursorIcon, Pos2, Rect, Vec2, pos2};

use crate::geometry::{Position, Size, hit_testing};

/// One of the eight grips around a selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::Top,
        Handle::TopRight,
        Handle::Right,
        Handle::BottomRight,
        Handle::Bottom,
        Handle::BottomLeft,
        Handle::Left,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Handle::TopLeft => "top_left",
            Handle::Top => "top",
            Handle::TopRight => "top_right",
            Handle::Right => "right",
            Handle::BottomRight => "bottom_right",
            Handle::Bottom => "bottom",
            Handle::BottomLeft => "bottom_left",
            Handle::Left => "left",
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            Handle::TopLeft | Handle::BottomRight => CursorIcon::ResizeNwSe,
            Handle::TopRight | Handle::BottomLeft => CursorIcon::ResizeNeSw,
            Handle::Top | Handle::Bottom => CursorIcon::ResizeVertical,
            Handle::Left | Handle::Right => CursorIcon::ResizeHorizontal,
        }
    }

    fn moves_left(&self) -> bool {
        matches!(self, Handle::TopLeft | Handle::Left | Handle::BottomLeft)
    }

    fn moves_right(&self) -> bool {
        matches!(self, Handle::TopRight | Handle::Right | Handle::BottomRight)
    }

    fn moves_top(&self) -> bool {
        matches!(self, Handle::TopLeft | Handle::Top | Handle::TopRight)
    }

    fn moves_bottom(&self) -> bool {
        matches!(self, Handle::BottomLeft | Handle::Bottom | Handle::BottomRight)
    }

    /// Where the grip sits on `rect`.
    pub fn anchor(&self, rect: Rect) -> Pos2 {
        let x = if self.moves_left() {
            rect.min.x
        } else if self.moves_right() {
            rect.max.x
        } else {
            rect.center().x
        };
        let y = if self.moves_top() {
            rect.min.y
        } else if self.moves_bottom() {
            rect.max.y
        } else {
            rect.center().y
        };
        pos2(x, y)
    }

    /// The grip of a box rotated by `rotation` degrees that lies under `pos`.
    pub fn at(rect: Rect, rotation: f32, pos: Pos2, handle_size: f32) -> Option<Handle> {
        let local = hit_testing::unrotate(pos, rect.center(), rotation);
        Self::ALL
            .into_iter()
            .find(|handle| hit_testing::near_point(local, handle.anchor(rect), handle_size))
    }

    /// New box after dragging this grip by `delta` (page percent) from `origin`.
    /// The opposite edges stay fixed; neither side shrinks below `min_size`.
    pub fn resize(&self, origin: (Position, Size), delta: Vec2, min_size: f32) -> (Position, Size) {
        let (mut position, mut size) = origin;
        let (start, start_size) = origin;

        if self.moves_right() {
            size.width = (start_size.width + delta.x).max(min_size);
        }
        if self.moves_left() {
            size.width = (start_size.width - delta.x).max(min_size);
            position.x = start.x + start_size.width - size.width;
        }
        if self.moves_bottom() {
            size.height = (start_size.height + delta.y).max(min_size);
        }
        if self.moves_top() {
            size.height = (start_size.height - delta.y).max(min_size);
            position.y = start.y + start_size.height - size.height;
        }
        (position, size)
    }
}
