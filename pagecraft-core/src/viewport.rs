//! Zoom/pan state and the client ↔ canvas coordinate transform.
//!
//! ```text
//! canvasX = (clientX - rootLeft) / zoom - panX / zoom
//! clientX = canvasX * zoom + panX + rootLeft
//! ```
//!
//! Pan offsets are kept in screen pixels; only the conversion divides by zoom.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::EditorConfig;

/// Viewport settings shared by every coordinate transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Current zoom level (1.0 = 100%).
    zoom: f64,
    /// Pan offset X in screen pixels.
    pub pan_x: f64,
    /// Pan offset Y in screen pixels.
    pub pan_y: f64,
    /// Grid spacing for snapping.
    pub grid_size: f64,
    /// Snap distance from a grid line.
    pub snap_threshold: f64,
    /// Whether geometry snaps to the grid.
    pub snap_to_grid: bool,
    min_zoom: f64,
    max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl Viewport {
    /// Create a viewport with the configured grid and zoom bounds.
    #[must_use]
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            zoom: 1.0_f64.clamp(config.min_zoom, config.max_zoom),
            pan_x: 0.0,
            pan_y: 0.0,
            grid_size: config.grid_size,
            snap_threshold: config.snap_threshold,
            snap_to_grid: config.snap_to_grid,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }

    /// Current zoom level.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom level, clamped to the configured bounds.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
    }

    /// Adjust zoom by `delta`, clamped.
    pub fn zoom_by(&mut self, delta: f64) {
        // Round away float drift so repeated 0.1 steps land on tidy values.
        let next = ((self.zoom + delta) * 1000.0).round() / 1000.0;
        self.set_zoom(next);
    }

    /// Zoom in by one step.
    pub fn zoom_in(&mut self, step: f64) {
        self.zoom_by(step.abs());
    }

    /// Zoom out by one step.
    pub fn zoom_out(&mut self, step: f64) {
        self.zoom_by(-step.abs());
    }

    /// Shift the pan offset by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Back to 100% with no pan.
    pub fn reset(&mut self) {
        self.zoom = 1.0_f64.clamp(self.min_zoom, self.max_zoom);
        self.pan_x = 0.0;
        self.pan_y = 0.0;
    }

    /// Convert a client point to canvas space given the canvas root's screen box.
    #[must_use]
    pub fn client_to_canvas(&self, client: Point, root: &Rect) -> Point {
        Point::new(
            (client.x - root.x) / self.zoom - self.pan_x / self.zoom,
            (client.y - root.y) / self.zoom - self.pan_y / self.zoom,
        )
    }

    /// Convert a canvas point back to client space.
    #[must_use]
    pub fn canvas_to_client(&self, canvas: Point, root: &Rect) -> Point {
        Point::new(
            canvas.x * self.zoom + self.pan_x + root.x,
            canvas.y * self.zoom + self.pan_y + root.y,
        )
    }

    /// Convert a client-space rectangle to canvas space.
    #[must_use]
    pub fn client_rect_to_canvas(&self, rect: &Rect, root: &Rect) -> Rect {
        let origin = self.client_to_canvas(Point::new(rect.x, rect.y), root);
        Rect::new(
            origin.x,
            origin.y,
            rect.width / self.zoom,
            rect.height / self.zoom,
        )
    }

    /// Convert a screen-pixel distance to canvas pixels.
    #[must_use]
    pub fn screen_delta_to_canvas(&self, delta: f64) -> f64 {
        delta / self.zoom
    }

    /// Snap a value to the grid when snapping is enabled.
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        if self.snap_to_grid {
            snap_to_grid(value, self.grid_size, self.snap_threshold)
        } else {
            value
        }
    }
}

/// Symmetric grid snap.
///
/// Values within `threshold` of a grid line move onto it; anything else is
/// returned unchanged.
#[must_use]
pub fn snap_to_grid(value: f64, grid_size: f64, threshold: f64) -> f64 {
    if grid_size <= 0.0 || !value.is_finite() {
        return value;
    }
    let remainder = value.rem_euclid(grid_size);
    if remainder < threshold {
        value - remainder
    } else if grid_size - remainder < threshold {
        value - remainder + grid_size
    } else {
        value
    }
}
