//! Rubber-band (marquee) selection.

use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::geometry::{Point, Rect};
use crate::spatial::SpatialQuery;
use crate::viewport::Viewport;
use crate::Document;

/// A marquee in progress, tracked in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marquee {
    /// Canvas-space corner where the drag started.
    pub start: Point,
    /// Canvas-space corner under the pointer.
    pub current: Point,
    /// Whether the result adds to the existing selection.
    pub additive: bool,
}

impl Marquee {
    /// Start a marquee at a canvas point.
    #[must_use]
    pub fn new(start: Point, additive: bool) -> Self {
        Self {
            start,
            current: start,
            additive,
        }
    }

    /// The normalized canvas-space rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.start, self.current)
    }

    /// Whether the rectangle exceeds `min_size` on both axes.
    #[must_use]
    pub fn exceeds(&self, min_size: f64) -> bool {
        let rect = self.rect();
        rect.width > min_size && rect.height > min_size
    }

    /// Visible elements whose canvas-space boxes intersect the marquee.
    ///
    /// Boxes are measured in client space and converted with the viewport.
    /// The result is in document pre-order so selection order is stable.
    #[must_use]
    pub fn hits(&self, doc: &Document, spatial: &dyn SpatialQuery, viewport: &Viewport) -> Vec<ElementId> {
        let area = self.rect();
        let root = spatial.canvas_rect();
        let mut order: Vec<ElementId> = Vec::new();
        for &id in doc.root_element_ids() {
            order.push(id);
            order.extend(doc.descendants(id));
        }
        order
            .into_iter()
            .filter(|&id| !doc.is_effectively_hidden(id))
            .filter(|&id| {
                spatial
                    .bounding_box(id)
                    .map(|b| viewport.client_rect_to_canvas(&b, &root))
                    .is_some_and(|b| b.intersects(&area))
            })
            .collect()
    }
}
