use std::f32::consts::FRAC_PI_6;

use serde::{Deserialize, Serialize};

/// Finest grid the editor draws or snaps to, page percent.
pub const MIN_GRID_SIZE: f32 = 1.0;

/// Editor tunables. Persisted with the app state; missing fields fall back to the
/// defaults so older saves keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snapshots kept by the undo stack.
    pub history_capacity: usize,
    pub show_grid: bool,
    pub snap_to_grid: bool,
    /// Grid spacing in page percent. Read through [`EditorConfig::grid_spacing`].
    pub grid_size: f32,
    /// Shapes and areas narrower or shorter than this (page percent) are discarded.
    pub min_shape_percent: f32,
    pub min_redaction_percent: f32,
    /// Resizing never shrinks an element below this (page percent).
    pub min_resize_percent: f32,
    /// Pointer travel (device pixels) below which a press counts as a click.
    pub click_threshold_px: f32,
    /// Shift applied to duplicates, page percent on both axes.
    pub duplicate_offset: f32,
    pub arrowhead_length_px: f32,
    /// Half-angle between the arrowhead barbs and the shaft, radians.
    pub arrowhead_angle: f32,
    /// Side of the square resize handles, device pixels.
    pub handle_size: f32,
    /// Extra device pixels granted to stroke hit testing.
    pub hit_tolerance_px: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            show_grid: false,
            snap_to_grid: false,
            grid_size: 10.0,
            min_shape_percent: 2.0,
            min_redaction_percent: 1.0,
            min_resize_percent: 5.0,
            click_threshold_px: 5.0,
            duplicate_offset: 5.0,
            arrowhead_length_px: 15.0,
            arrowhead_angle: FRAC_PI_6,
            handle_size: 8.0,
            hit_tolerance_px: 4.0,
        }
    }
}

impl EditorConfig {
    /// `grid_size` kept within `[MIN_GRID_SIZE, 100]`; a garbled value falls back to
    /// the default.
    pub fn grid_spacing(&self) -> f32 {
        if self.grid_size.is_finite() {
            self.grid_size.clamp(MIN_GRID_SIZE, 100.0)
        } else {
            Self::default().grid_size
        }
    }

    /// Grid size when snapping is on.
    pub fn snap_grid(&self) -> Option<f32> {
        self.snap_to_grid.then(|| self.grid_spacing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"history_capacity": 20}"#).unwrap();
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.click_threshold_px, 5.0);
        assert_eq!(config.snap_grid(), None);
    }

    #[test]
    fn test_snap_grid() {
        let config = EditorConfig {
            snap_to_grid: true,
            grid_size: 5.0,
            ..Default::default()
        };
        assert_eq!(config.snap_grid(), Some(5.0));
    }

    #[test]
    fn test_grid_spacing_is_bounded() {
        let tiny: EditorConfig = serde_json::from_str(r#"{"grid_size": 0.0001, "snap_to_grid": true}"#).unwrap();
        assert_eq!(tiny.grid_spacing(), MIN_GRID_SIZE);
        assert_eq!(tiny.snap_grid(), Some(MIN_GRID_SIZE));

        let huge = EditorConfig {
            grid_size: 1e9,
            ..Default::default()
        };
        assert_eq!(huge.grid_spacing(), 100.0);

        let broken = EditorConfig {
            grid_size: f32::NAN,
            ..Default::default()
        };
        assert_eq!(broken.grid_spacing(), 10.0);
    }
}
