use egui::Color32;

use crate::geometry::{Position, Size};

// Defaults shared by the tools that create elements.
pub const PLACEHOLDER_TEXT: &str = "Double click to edit";
pub const DEFAULT_TEXT_SIZE: Size = Size::new(20.0, 5.0);
pub const DEFAULT_IMAGE_SIZE: Size = Size::new(20.0, 15.0);
pub const DEFAULT_FONT_SIZE: f32 = 24.0;
pub const DEFAULT_STROKE_WIDTH: f32 = 3.0;

pub const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(255, 255, 0);
pub const HIGHLIGHT_STROKE_WIDTH: f32 = 20.0;
pub const HIGHLIGHT_OPACITY: f32 = 0.4;

pub const REDACTION_COLOR: Color32 = Color32::BLACK;

/// Watermark mosaic when `tiled` is set: columns x rows per page.
pub const TILE_COLUMNS: usize = 3;
pub const TILE_ROWS: usize = 4;

pub(crate) fn default_opacity() -> f32 {
    1.0
}

/// Whether a percentage size reaches `min` on both axes.
pub(crate) fn meets_minimum(size: Size, min: f32) -> bool {
    size.width >= min && size.height >= min
}

/// Bounding box of a set of percentage points, `None` when empty.
pub(crate) fn percent_bounds(points: &[Position]) -> Option<(Position, Size)> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for point in &points[1..] {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    Some((Position::new(min_x, min_y), Size::new(max_x - min_x, max_y - min_y)))
}

/// Normalized rectangle spanned by two corners: `min(start, end)` and `|end - start|`.
pub fn rect_between(start: Position, end: Position) -> (Position, Size) {
    (
        Position::new(start.x.min(end.x), start.y.min(end.y)),
        Size::new((end.x - start.x).abs(), (end.y - start.y).abs()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_between_any_direction() {
        let expected = (Position::new(10.0, 10.0), Size::new(30.0, 20.0));
        assert_eq!(rect_between(Position::new(10.0, 10.0), Position::new(40.0, 30.0)), expected);
        assert_eq!(rect_between(Position::new(40.0, 30.0), Position::new(10.0, 10.0)), expected);
        assert_eq!(rect_between(Position::new(40.0, 10.0), Position::new(10.0, 30.0)), expected);
    }

    #[test]
    fn test_percent_bounds() {
        assert!(percent_bounds(&[]).is_none());
        let (pos, size) =
            percent_bounds(&[Position::new(5.0, 9.0), Position::new(1.0, 12.0), Position::new(3.0, 2.0)])
                .unwrap();
        assert_eq!(pos, Position::new(1.0, 2.0));
        assert_eq!(size, Size::new(4.0, 10.0));
    }

    #[test]
    fn test_meets_minimum() {
        assert!(meets_minimum(Size::new(2.0, 2.0), 2.0));
        assert!(!meets_minimum(Size::new(30.0, 1.9), 2.0));
    }
}
