//! Drop-target and flow resolution.
//!
//! While an element is dragged, every pointer move asks two questions:
//!
//! 1. Which container is under the pointer? (the drop target)
//! 2. Should the drag move the element by coordinates (absolute) or by
//!    sibling order (flow)?
//!
//! For flow drags the element being reordered is the *effective element*:
//! the dragged element escalated past wrappers that hold nothing else, so
//! grabbing a leaf inside a single-child wrapper reorders the wrapper.

use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementId};
use crate::geometry::{Axis, Point, Rect};
use crate::spatial::SpatialQuery;
use crate::Document;

/// Indicator line thickness in client pixels.
const INDICATOR_THICKNESS: f64 = 2.0;

/// How a container lays out a dragged child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowMode {
    /// Children are placed by coordinates.
    Absolute,
    /// Children are placed by order.
    Flow,
}

/// Flow mode of a container, from its own `position`.
#[must_use]
pub fn flow_mode(container: &Element) -> FlowMode {
    if container.style.position().is_out_of_flow() {
        FlowMode::Absolute
    } else {
        FlowMode::Flow
    }
}

/// Primary layout axis of a container.
#[must_use]
pub fn primary_axis(container: &Element) -> Axis {
    let style = &container.style;
    let is_grid = style.text("display").is_some_and(|d| d.trim() == "grid");
    let is_row = style
        .text("flexDirection")
        .is_some_and(|d| d.trim().starts_with("row"));
    if is_grid || is_row {
        Axis::Row
    } else {
        Axis::Column
    }
}

/// Whether `candidate` is one of `dragged` or lies inside one of them.
fn is_dragged_subtree(doc: &Document, dragged: &[ElementId], candidate: ElementId) -> bool {
    dragged
        .iter()
        .any(|&d| d == candidate || doc.is_ancestor(d, candidate))
}

/// The first container under `client` (front-to-back), ignoring the dragged
/// elements, their descendants and hidden elements.
#[must_use]
pub fn resolve_drop_container(
    doc: &Document,
    spatial: &dyn SpatialQuery,
    client: Point,
    dragged: &[ElementId],
) -> Option<ElementId> {
    for hit in spatial.elements_at_point(client.x, client.y) {
        if !doc.contains(hit)
            || doc.is_effectively_hidden(hit)
            || is_dragged_subtree(doc, dragged, hit)
        {
            continue;
        }
        let mut current = Some(hit);
        while let Some(id) = current {
            let element = doc.element(id)?;
            if element.is_container() && !is_dragged_subtree(doc, dragged, id) {
                return Some(id);
            }
            current = element.parent_id;
        }
    }
    None
}

/// Escalate past single-child wrappers, at most `max_levels` times.
#[must_use]
pub fn effective_element(doc: &Document, dragged: ElementId, max_levels: usize) -> ElementId {
    let mut current = dragged;
    for _ in 0..max_levels {
        match doc.parent_of(current) {
            Some(parent) if doc.children_of(parent).len() == 1 => current = parent,
            _ => break,
        }
    }
    if current != dragged {
        tracing::trace!("Escalated reorder of {dragged} to wrapper {current}");
    }
    current
}

/// Where a flow drag would insert the effective element.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPlacement {
    /// The element being reordered.
    pub element: ElementId,
    /// Its parent (unchanged by reordering).
    pub parent: ElementId,
    /// Current position among the parent's children.
    pub current_index: usize,
    /// Target position, counted among the siblings without the element.
    pub index: usize,
    /// Client-space insertion line, when anything could be measured.
    pub indicator: Option<Rect>,
}

impl FlowPlacement {
    /// Whether applying this placement changes the order.
    #[must_use]
    pub fn changes_order(&self) -> bool {
        self.index != self.current_index
    }
}

/// Compute the insertion point for `element` among its siblings.
///
/// Returns `None` for root-level elements and unknown IDs.
#[must_use]
pub fn compute_flow_insertion(
    doc: &Document,
    spatial: &dyn SpatialQuery,
    element: ElementId,
    pointer: Point,
) -> Option<FlowPlacement> {
    let parent = doc.parent_of(element)?;
    let container = doc.element(parent)?;
    let axis = primary_axis(container);
    let current_index = doc.index_in_parent(element)?;

    let siblings: Vec<ElementId> = doc
        .children_of(parent)
        .iter()
        .copied()
        .filter(|&s| s != element)
        .collect();

    let measured: Vec<(usize, Rect)> = siblings
        .iter()
        .enumerate()
        .filter_map(|(i, &s)| {
            let sibling = doc.element(s)?;
            if sibling.hidden || sibling.style.text("display") == Some("none") {
                return None;
            }
            spatial
                .bounding_box(s)
                .filter(|rect| !rect.is_empty())
                .map(|rect| (i, rect))
        })
        .collect();

    let pointer_on_axis = match axis {
        Axis::Row => pointer.x,
        Axis::Column => pointer.y,
    };
    let target = measured
        .iter()
        .find(|(_, rect)| rect.center_on(axis) > pointer_on_axis);

    let (index, indicator) = match target {
        Some(&(i, rect)) => (i, Some(leading_edge(&rect, axis))),
        None => {
            let after = measured
                .last()
                .map(|(_, rect)| trailing_edge(rect, axis))
                .or_else(|| spatial.bounding_box(parent).map(|r| leading_edge(&r, axis)));
            (siblings.len(), after)
        }
    };

    Some(FlowPlacement {
        element,
        parent,
        current_index,
        index,
        indicator,
    })
}

fn leading_edge(rect: &Rect, axis: Axis) -> Rect {
    match axis {
        Axis::Row => Rect::new(
            rect.x - INDICATOR_THICKNESS / 2.0,
            rect.y,
            INDICATOR_THICKNESS,
            rect.height,
        ),
        Axis::Column => Rect::new(
            rect.x,
            rect.y - INDICATOR_THICKNESS / 2.0,
            rect.width,
            INDICATOR_THICKNESS,
        ),
    }
}

fn trailing_edge(rect: &Rect, axis: Axis) -> Rect {
    match axis {
        Axis::Row => Rect::new(
            rect.right() - INDICATOR_THICKNESS / 2.0,
            rect.y,
            INDICATOR_THICKNESS,
            rect.height,
        ),
        Axis::Column => Rect::new(
            rect.x,
            rect.bottom() - INDICATOR_THICKNESS / 2.0,
            rect.width,
            INDICATOR_THICKNESS,
        ),
    }
}

/// How the current drag step should be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum DragResolution {
    /// Move by coordinates; `container` is the highlighted drop target.
    Absolute {
        /// Container under the pointer, if any.
        container: Option<ElementId>,
    },
    /// Move by order.
    Flow {
        /// Container under the pointer.
        container: ElementId,
        /// Live reorder, when the pointer is within the element's own parent.
        placement: Option<FlowPlacement>,
    },
}

impl DragResolution {
    /// The container the drop would land in.
    #[must_use]
    pub fn container(&self) -> Option<ElementId> {
        match self {
            Self::Absolute { container } => *container,
            Self::Flow { container, .. } => Some(*container),
        }
    }
}

/// Resolve one drag step for `dragged` at client point `pointer`.
#[must_use]
pub fn resolve_drag(
    doc: &Document,
    spatial: &dyn SpatialQuery,
    dragged: ElementId,
    pointer: Point,
    max_escalation: usize,
) -> DragResolution {
    let Some(container) = resolve_drop_container(doc, spatial, pointer, &[dragged]) else {
        return DragResolution::Absolute { container: None };
    };
    let absolute = DragResolution::Absolute {
        container: Some(container),
    };
    if doc.element(container).map(flow_mode) != Some(FlowMode::Flow) {
        return absolute;
    }

    let effective = effective_element(doc, dragged, max_escalation);
    let Some(parent) = doc.parent_of(effective) else {
        // Root-level elements are positioned by coordinates.
        return absolute;
    };
    let placement = if container == parent || doc.is_ancestor(parent, container) {
        compute_flow_insertion(doc, spatial, effective, pointer)
    } else {
        None
    };
    DragResolution::Flow {
        container,
        placement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::StaticLayout;
    use crate::{ElementType, NewElement};

    fn flow_section(doc: &mut Document) -> ElementId {
        let section = doc.add_element(NewElement::new(ElementType::Container), None);
        doc.edit_style(section, |s| s.set("position", "relative"))
            .expect("section exists");
        section
    }

    #[test]
    fn test_primary_axis() {
        let mut element = Element::new(ElementType::Container);
        assert_eq!(primary_axis(&element), Axis::Column);
        element.style.set("flexDirection", "row-reverse");
        assert_eq!(primary_axis(&element), Axis::Row);
        let grid = Element::new(ElementType::Grid);
        assert_eq!(primary_axis(&grid), Axis::Row);
    }

    #[test]
    fn test_drop_container_skips_dragged_subtree() {
        let mut doc = Document::new();
        let outer = flow_section(&mut doc);
        let dragged = doc.add_element(NewElement::new(ElementType::Container), Some(outer));
        let inner = doc.add_element(NewElement::new(ElementType::Text), Some(dragged));
        let layout = StaticLayout::new(Rect::new(0.0, 0.0, 800.0, 600.0))
            .with_box(outer, Rect::new(0.0, 0.0, 800.0, 400.0))
            .with_box(dragged, Rect::new(0.0, 0.0, 800.0, 100.0))
            .with_box(inner, Rect::new(0.0, 0.0, 100.0, 20.0));
        let found = resolve_drop_container(&doc, &layout, Point::new(10.0, 10.0), &[dragged]);
        assert_eq!(found, Some(outer));
    }

    #[test]
    fn test_drop_container_walks_to_ancestor() {
        let mut doc = Document::new();
        let section = flow_section(&mut doc);
        let label = doc.add_element(NewElement::new(ElementType::Text), Some(section));
        let other = doc.add_element(NewElement::new(ElementType::Text), None);
        let layout = StaticLayout::new(Rect::default())
            .with_box(section, Rect::new(0.0, 0.0, 500.0, 500.0))
            .with_box(label, Rect::new(0.0, 0.0, 100.0, 40.0));
        let found = resolve_drop_container(&doc, &layout, Point::new(5.0, 5.0), &[other]);
        assert_eq!(found, Some(section));
    }

    #[test]
    fn test_effective_element_escalates_single_child_wrappers() {
        let mut doc = Document::new();
        let section = flow_section(&mut doc);
        let wrapper = doc.add_element(NewElement::new(ElementType::Container), Some(section));
        let leaf = doc.add_element(NewElement::new(ElementType::Text), Some(wrapper));
        doc.add_element(NewElement::new(ElementType::Text), Some(section));

        assert_eq!(effective_element(&doc, leaf, 8), wrapper);
        assert_eq!(effective_element(&doc, leaf, 0), leaf);
    }

    #[test]
    fn test_flow_insertion_before_first_past_center() {
        let mut doc = Document::new();
        let section = flow_section(&mut doc);
        let a = doc.add_element(NewElement::new(ElementType::Text), Some(section));
        let b = doc.add_element(NewElement::new(ElementType::Text), Some(section));
        let c = doc.add_element(NewElement::new(ElementType::Text), Some(section));
        let layout = StaticLayout::new(Rect::default())
            .with_box(section, Rect::new(0.0, 0.0, 400.0, 300.0))
            .with_box(a, Rect::new(0.0, 0.0, 400.0, 100.0))
            .with_box(b, Rect::new(0.0, 100.0, 400.0, 100.0))
            .with_box(c, Rect::new(0.0, 200.0, 400.0, 100.0));

        // Dragging A between B and C: siblings [B, C], C's center is past.
        let placement = compute_flow_insertion(&doc, &layout, a, Point::new(50.0, 230.0))
            .expect("placement");
        assert_eq!(placement.current_index, 0);
        assert_eq!(placement.index, 1);
        assert!(placement.changes_order());

        // Below everything: append.
        let placement = compute_flow_insertion(&doc, &layout, a, Point::new(50.0, 290.0))
            .expect("placement");
        assert_eq!(placement.index, 2);
    }

    #[test]
    fn test_flow_insertion_skips_zero_area_and_display_none() {
        let mut doc = Document::new();
        let section = flow_section(&mut doc);
        let a = doc.add_element(NewElement::new(ElementType::Text), Some(section));
        let ghost = doc.add_element(NewElement::new(ElementType::Text), Some(section));
        let gone = doc.add_element(NewElement::new(ElementType::Text), Some(section));
        doc.edit_style(gone, |s| s.set("display", "none")).expect("exists");
        let layout = StaticLayout::new(Rect::default())
            .with_box(a, Rect::new(0.0, 0.0, 400.0, 100.0))
            .with_box(ghost, Rect::new(0.0, 100.0, 0.0, 0.0))
            .with_box(gone, Rect::new(0.0, 100.0, 400.0, 100.0));
        let placement = compute_flow_insertion(&doc, &layout, a, Point::new(10.0, 10.0))
            .expect("placement");
        assert_eq!(placement.index, 2);
    }

    #[test]
    fn test_resolve_drag_absolute_container() {
        let mut doc = Document::new();
        let section = doc.add_element(NewElement::new(ElementType::Container), None);
        let child = doc.add_element(NewElement::new(ElementType::Text), None);
        let layout = StaticLayout::new(Rect::default())
            .with_box(section, Rect::new(0.0, 0.0, 400.0, 400.0));
        let resolution = resolve_drag(&doc, &layout, child, Point::new(10.0, 10.0), 8);
        assert_eq!(
            resolution,
            DragResolution::Absolute {
                container: Some(section)
            }
        );
    }
}
