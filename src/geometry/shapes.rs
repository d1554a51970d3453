//! Parametric outlines for the shape kinds, in device space.

use std::f32::consts::{FRAC_PI_2, PI};

use egui::{Pos2, Rect, Vec2, emath::Rot2, pos2};

pub const STAR_POINTS: usize = 5;

/// Rotate `point` by `degrees` (clockwise on screen) around `center`.
pub fn rotate_about(point: Pos2, center: Pos2, degrees: f32) -> Pos2 {
    if degrees == 0.0 {
        return point;
    }
    center + Rot2::from_angle(degrees.to_radians()) * (point - center)
}

pub fn rect_corners(rect: Rect) -> [Pos2; 4] {
    [rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()]
}

/// Apex at the top centre, base along the bottom edge.
pub fn triangle_points(rect: Rect) -> [Pos2; 3] {
    [
        pos2(rect.center().x, rect.min.y),
        rect.left_bottom(),
        rect.right_bottom(),
    ]
}

/// Star outline alternating outer and inner radius every `PI / num_points`, starting
/// straight up. The outer radius is half the shorter side, the inner radius half of that.
pub fn star_points(rect: Rect, num_points: usize) -> Vec<Pos2> {
    let center = rect.center();
    let outer = rect.width().min(rect.height()) / 2.0;
    let inner = outer / 2.0;
    let step = PI / num_points as f32;

    (0..num_points * 2)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = i as f32 * step - FRAC_PI_2;
            pos2(center.x + angle.cos() * radius, center.y + angle.sin() * radius)
        })
        .collect()
}

/// Heart outline as four cubic curves `[start, control1, control2, end]`, traced from
/// the top notch down the left lobe to the tip and back up the right lobe.
pub fn heart_curves(rect: Rect) -> [[Pos2; 4]; 4] {
    let cx = rect.center().x;
    let top = rect.min.y;
    let half = rect.width() / 2.0;
    let h = rect.height();
    let notch = top + h * 0.3;
    let waist = top + (h + h * 0.3) / 2.0;
    let tip = top + h;

    [
        [pos2(cx, notch), pos2(cx, top), pos2(cx - half, top), pos2(cx - half, notch)],
        [pos2(cx - half, notch), pos2(cx - half, waist), pos2(cx, waist), pos2(cx, tip)],
        [pos2(cx, tip), pos2(cx, waist), pos2(cx + half, waist), pos2(cx + half, notch)],
        [pos2(cx + half, notch), pos2(cx + half, top), pos2(cx, top), pos2(cx, notch)],
    ]
}

/// The two strokes of an arrowhead at `tip`, pointing along the heading `from -> tip`.
/// Each barb is `length` pixels long and opens `spread` radians from the shaft.
pub fn arrowhead(from: Pos2, tip: Pos2, length: f32, spread: f32) -> [[Pos2; 2]; 2] {
    let heading = (tip.y - from.y).atan2(tip.x - from.x);
    let barb = |angle: f32| tip - Vec2::angled(angle) * length;
    [[tip, barb(heading - spread)], [tip, barb(heading + spread)]]
}

/// Outline of the ellipse inscribed in `rect`, `segments` points clockwise from the
/// rightmost point.
pub fn ellipse_points(rect: Rect, segments: usize) -> Vec<Pos2> {
    let center = rect.center();
    let radius = rect.size() / 2.0;
    let step = 2.0 * PI / segments.max(3) as f32;
    (0..segments.max(3))
        .map(|i| {
            let angle = i as f32 * step;
            pos2(center.x + angle.cos() * radius.x, center.y + angle.sin() * radius.y)
        })
        .collect()
}
