//! Editor configuration.
//!
//! Every threshold the interaction engine uses lives here so hosts can tune
//! them without touching the state machine. Configurations deserialize from
//! camelCase JSON; missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::{BuilderError, BuilderResult};

/// Tunable constants for the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Pointer travel (screen px) before a press becomes a drag.
    pub drag_threshold: f64,
    /// Minimum marquee extent (canvas px) on both axes.
    pub marquee_min_size: f64,
    /// Smallest width/height a resize may produce.
    pub min_element_size: f64,
    /// Zoom change per wheel notch.
    pub zoom_step: f64,
    /// Lower zoom bound.
    pub min_zoom: f64,
    /// Upper zoom bound.
    pub max_zoom: f64,
    /// Offset applied to numeric `left`/`top` of duplicates.
    pub duplicate_offset: f64,
    /// Maximum number of undo snapshots kept.
    pub history_limit: usize,
    /// Animation frames to wait for an unmeasurable element.
    pub measure_retry_limit: u32,
    /// Track count used when a grid template cannot be parsed.
    pub default_grid_tracks: u32,
    /// How many single-child wrapper levels a flow reorder may climb.
    pub max_reorder_escalation: usize,
    /// Initial grid spacing for snapping.
    pub grid_size: f64,
    /// Distance from a grid line within which values snap.
    pub snap_threshold: f64,
    /// Whether snapping starts enabled.
    pub snap_to_grid: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 5.0,
            marquee_min_size: 5.0,
            min_element_size: 20.0,
            zoom_step: 0.1,
            min_zoom: 0.1,
            max_zoom: 5.0,
            duplicate_offset: 20.0,
            history_limit: 100,
            measure_retry_limit: 10,
            default_grid_tracks: 3,
            max_reorder_escalation: 8,
            grid_size: 10.0,
            snap_threshold: 5.0,
            snap_to_grid: false,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> BuilderResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> BuilderResult<()> {
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(BuilderError::InvalidConfig(format!(
                "zoom bounds must satisfy 0 < min <= max, got {}..{}",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.zoom_step <= 0.0 {
            return Err(BuilderError::InvalidConfig(
                "zoomStep must be positive".to_string(),
            ));
        }
        if self.grid_size <= 0.0 {
            return Err(BuilderError::InvalidConfig(
                "gridSize must be positive".to_string(),
            ));
        }
        if self.snap_threshold < 0.0 || self.snap_threshold > self.grid_size / 2.0 {
            return Err(BuilderError::InvalidConfig(format!(
                "snapThreshold must lie in 0..={}",
                self.grid_size / 2.0
            )));
        }
        if self.drag_threshold < 0.0 || self.marquee_min_size < 0.0 {
            return Err(BuilderError::InvalidConfig(
                "thresholds must not be negative".to_string(),
            ));
        }
        if self.min_element_size <= 0.0 {
            return Err(BuilderError::InvalidConfig(
                "minElementSize must be positive".to_string(),
            ));
        }
        if self.default_grid_tracks == 0 {
            return Err(BuilderError::InvalidConfig(
                "defaultGridTracks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
