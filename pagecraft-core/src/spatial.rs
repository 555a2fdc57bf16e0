//! Spatial queries against the rendered surface.
//!
//! The editor never measures anything itself. Hit testing and bounding boxes
//! come from a [`SpatialQuery`] implementation: the DOM in a browser host, or
//! [`StaticLayout`] in tests and headless tools.
//!
//! All coordinates here are client (screen) space.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::geometry::{Point, Rect};

/// Point hit testing and box measurement.
pub trait SpatialQuery {
    /// Elements under a client point, front-to-back.
    fn elements_at_point(&self, x: f64, y: f64) -> Vec<ElementId>;

    /// Client-space box of an element, or `None` if it is not laid out yet.
    fn bounding_box(&self, id: ElementId) -> Option<Rect>;

    /// Client-space box of the canvas root.
    fn canvas_rect(&self) -> Rect;
}

/// In-memory layout: a canvas rect plus a box per element in paint order
/// (later entries paint on top).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticLayout {
    /// The canvas root's client box.
    pub canvas: Rect,
    /// Element boxes in paint order.
    #[serde(default)]
    boxes: IndexMap<ElementId, Rect>,
}

impl StaticLayout {
    /// Create an empty layout with the given canvas root box.
    #[must_use]
    pub fn new(canvas: Rect) -> Self {
        Self {
            canvas,
            boxes: IndexMap::new(),
        }
    }

    /// Set an element's box. New elements paint on top; existing ones keep
    /// their paint order.
    pub fn set_box(&mut self, id: ElementId, rect: Rect) {
        self.boxes.insert(id, rect);
    }

    /// Builder form of [`StaticLayout::set_box`].
    #[must_use]
    pub fn with_box(mut self, id: ElementId, rect: Rect) -> Self {
        self.set_box(id, rect);
        self
    }

    /// Forget an element's box (it becomes unmeasurable).
    pub fn remove_box(&mut self, id: ElementId) -> Option<Rect> {
        self.boxes.shift_remove(&id)
    }

    /// Move an element to the top of the paint order.
    pub fn bring_to_front(&mut self, id: ElementId) {
        if let Some(rect) = self.boxes.shift_remove(&id) {
            self.boxes.insert(id, rect);
        }
    }

    /// Number of laid-out elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether nothing is laid out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl SpatialQuery for StaticLayout {
    fn elements_at_point(&self, x: f64, y: f64) -> Vec<ElementId> {
        let point = Point::new(x, y);
        self.boxes
            .iter()
            .rev()
            .filter(|(_, rect)| rect.contains(point))
            .map(|(id, _)| *id)
            .collect()
    }

    fn bounding_box(&self, id: ElementId) -> Option<Rect> {
        self.boxes.get(&id).copied()
    }

    fn canvas_rect(&self) -> Rect {
        self.canvas
    }
}

/// Result of polling a pending measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureOutcome {
    /// The element has a non-empty box.
    Ready(Rect),
    /// Not measurable yet; poll again next frame.
    Pending,
    /// Retry budget exhausted.
    GaveUp,
}

/// A measurement that is retried once per animation frame until the element
/// is laid out or the retry budget runs out.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMeasure {
    id: ElementId,
    failures: u32,
    retry_limit: u32,
}

impl PendingMeasure {
    /// Start measuring `id`, allowing `retry_limit` retries after the first try.
    #[must_use]
    pub fn new(id: ElementId, retry_limit: u32) -> Self {
        Self {
            id,
            failures: 0,
            retry_limit,
        }
    }

    /// The element being measured.
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Try to measure once.
    pub fn poll(&mut self, spatial: &dyn SpatialQuery) -> MeasureOutcome {
        match spatial.bounding_box(self.id) {
            Some(rect) if !rect.is_empty() => MeasureOutcome::Ready(rect),
            _ => {
                self.failures += 1;
                if self.failures > self.retry_limit {
                    tracing::debug!(
                        "Giving up measuring {} after {} retries",
                        self.id,
                        self.retry_limit
                    );
                    MeasureOutcome::GaveUp
                } else {
                    MeasureOutcome::Pending
                }
            }
        }
    }
}
