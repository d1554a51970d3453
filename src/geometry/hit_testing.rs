use egui::{Pos2, Rect, Vec2};

use super::shapes::rotate_about;

/// Distance from `point` to the segment `start..end`.
pub fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let line = end - start;
    let len_sq = line.length_sq();
    if len_sq == 0.0 {
        return point.distance(start);
    }
    let t = ((point - start).dot(line) / len_sq).clamp(0.0, 1.0);
    point.distance(start + line * t)
}

/// Whether `point` lies within `reach` of any segment of the polyline. A single
/// point behaves like a dot of radius `reach`.
pub fn near_polyline(points: &[Pos2], point: Pos2, reach: f32) -> bool {
    match points {
        [] => false,
        [only] => only.distance(point) <= reach,
        _ => points
            .windows(2)
            .any(|pair| distance_to_segment(point, pair[0], pair[1]) <= reach),
    }
}

/// Undo an element rotation: map a device point into the element's unrotated frame.
pub fn unrotate(point: Pos2, center: Pos2, degrees: f32) -> Pos2 {
    rotate_about(point, center, -degrees)
}

/// Undo an element rotation on a pointer movement.
pub fn unrotate_delta(delta: Vec2, degrees: f32) -> Vec2 {
    unrotate(Pos2::ZERO + delta, Pos2::ZERO, degrees).to_vec2()
}

/// Whether `point` is within `radius` of `target`.
pub fn near_point(point: Pos2, target: Pos2, radius: f32) -> bool {
    point.distance(target) <= radius
}

/// Rectangle that contains `point` after undoing `degrees` of rotation around the
/// rectangle's centre.
pub fn rotated_rect_contains(rect: Rect, degrees: f32, point: Pos2) -> bool {
    rect.contains(unrotate(point, rect.center(), degrees))
}
