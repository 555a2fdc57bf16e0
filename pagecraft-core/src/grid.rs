//! Grid containers: template parsing, drop-point → cell placement, style
//! normalization for dropped elements, and grid-cell reconciliation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::normalize_for_flow;
use crate::element::{Element, ElementId, ElementType, Style};
use crate::geometry::{Point, Rect};
use crate::{BuilderError, BuilderResult, Document, NewElement};

/// Track count used when a template is missing or unparsable.
pub const DEFAULT_GRID_TRACKS: u32 = 3;

static REPEAT_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"repeat\(\s*(\d+)\s*,").ok());

const MARGIN_KEYS: [&str; 5] = [
    "margin",
    "marginTop",
    "marginRight",
    "marginBottom",
    "marginLeft",
];

/// Read the track count from a `repeat(N, …)` template.
///
/// Missing, unparsable or zero counts fall back to `default`.
#[must_use]
pub fn parse_track_count(template: Option<&str>, default: u32) -> u32 {
    template
        .and_then(|t| REPEAT_PATTERN.as_ref()?.captures(t))
        .and_then(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(default)
}

/// `(columns, rows)` of a grid element.
///
/// Templates are read from the style first, then from the payload.
#[must_use]
pub fn grid_dimensions(element: &Element, default: u32) -> (u32, u32) {
    let template = |key: &str| element.style.text(key).or_else(|| element.props.text(key));
    (
        parse_track_count(template("gridTemplateColumns"), default),
        parse_track_count(template("gridTemplateRows"), default),
    )
}

/// A 1-indexed grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    /// Row line, starting at 1.
    pub row: u32,
    /// Column line, starting at 1.
    pub column: u32,
}

/// Map a client point to the cell of a grid whose client box is `grid_box`.
///
/// Points outside the box clamp to the nearest edge cell.
#[must_use]
pub fn cell_at(point: Point, grid_box: &Rect, columns: u32, rows: u32) -> GridCell {
    let columns = columns.max(1);
    let rows = rows.max(1);
    let track = |offset: f64, extent: f64, count: u32| -> u32 {
        if extent <= 0.0 {
            return 1;
        }
        let size = extent / f64::from(count);
        let index = (offset / size).floor();
        if index.is_nan() || index < 0.0 {
            1
        } else if index >= f64::from(count) {
            count
        } else {
            // In range 0..count, so the cast is lossless.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let index = index as u32;
            index + 1
        }
    };
    GridCell {
        column: track(point.x - grid_box.x, grid_box.width, columns),
        row: track(point.y - grid_box.y, grid_box.height, rows),
    }
}

/// What kind of container receives a dropped element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropDestination {
    /// A grid container; the element gets explicit grid lines.
    Grid(Option<GridCell>),
    /// An auto-generated grid cell.
    GridCell,
    /// Any other container.
    Container,
}

impl DropDestination {
    /// Classify a container element.
    #[must_use]
    pub fn of(container: &Element) -> Self {
        if container.element_type == ElementType::Grid {
            Self::Grid(None)
        } else if container.is_grid_cell() {
            Self::GridCell
        } else {
            Self::Container
        }
    }
}

/// Rewrite a dropped element's style for its new container.
pub fn normalize_dropped_style(style: &mut Style, destination: DropDestination) {
    match destination {
        DropDestination::Grid(cell) => {
            style.set("position", "relative");
            for key in ["left", "top", "right", "bottom"] {
                style.remove(key);
            }
            if let Some(cell) = cell {
                style.set("gridColumn", cell.column.to_string());
                style.set("gridRow", cell.row.to_string());
            }
        }
        DropDestination::GridCell | DropDestination::Container => {
            let width = style.get("width").cloned();
            let height = style.get("height").cloned();
            normalize_for_flow(style);
            match width {
                Some(w) => style.set("width", w),
                None => style.set("width", "100%"),
            }
            match height {
                Some(h) => style.set("height", h),
                None => style.set("height", "auto"),
            }
            for key in MARGIN_KEYS {
                style.remove(key);
            }
            style.remove("gridColumn");
            style.remove("gridRow");
            if destination == DropDestination::GridCell {
                style.set("overflow", "hidden");
            }
        }
    }
}

/// What [`Document::generate_grid_cells`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellReconciliation {
    /// Newly created cells.
    pub created: Vec<ElementId>,
    /// Surplus cells deleted (with their subtrees).
    pub removed: Vec<ElementId>,
}

impl CellReconciliation {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

impl Document {
    /// Reconcile a grid's cell children to exactly `columns × rows` cells.
    ///
    /// # Errors
    ///
    /// - [`BuilderError::ElementNotFound`] if the grid does not exist
    /// - [`BuilderError::NotAContainer`] if it is not a grid
    pub fn generate_grid_cells(&mut self, grid_id: ElementId) -> BuilderResult<CellReconciliation> {
        self.generate_grid_cells_with_default(grid_id, DEFAULT_GRID_TRACKS)
    }

    /// [`Document::generate_grid_cells`] with a custom fallback track count.
    ///
    /// # Errors
    ///
    /// See [`Document::generate_grid_cells`].
    pub fn generate_grid_cells_with_default(
        &mut self,
        grid_id: ElementId,
        default_tracks: u32,
    ) -> BuilderResult<CellReconciliation> {
        let grid = self
            .element(grid_id)
            .ok_or(BuilderError::ElementNotFound(grid_id))?;
        if grid.element_type != ElementType::Grid {
            return Err(BuilderError::NotAContainer(grid_id));
        }
        let (columns, rows) = grid_dimensions(grid, default_tracks);

        let mut existing = std::collections::HashSet::new();
        let mut surplus = Vec::new();
        for &child in &grid.children {
            let Some(position) = self.element(child).and_then(|c| c.props.grid_cell_position())
            else {
                continue;
            };
            let (row, column) = position;
            let in_range = (1..=rows).contains(&row) && (1..=columns).contains(&column);
            // A second cell claiming the same slot is surplus too.
            if in_range && existing.insert(position) {
                continue;
            }
            surplus.push(child);
        }

        let mut report = CellReconciliation::default();
        for cell in surplus {
            self.delete_element(cell)?;
            report.removed.push(cell);
        }

        for row in 1..=rows {
            for column in 1..=columns {
                if existing.contains(&(row, column)) {
                    continue;
                }
                report.created.push(self.create_grid_cell(grid_id, row, column)?);
            }
        }

        if !report.is_unchanged() {
            tracing::debug!(
                "Grid {grid_id} reconciled to {columns}x{rows}: {} created, {} removed",
                report.created.len(),
                report.removed.len()
            );
        }
        Ok(report)
    }

    fn create_grid_cell(&mut self, grid_id: ElementId, row: u32, column: u32) -> BuilderResult<ElementId> {
        let id = self.add_element(
            NewElement::new(ElementType::Container).with_name(format!("Cell {row}-{column}")),
            Some(grid_id),
        );
        self.edit_style(id, |style| {
            style.set("position", "relative");
            style.set("width", "100%");
            style.set("height", "100%");
            style.set("border", "1px dashed #cbd5e1");
            style.set("background", "rgba(148, 163, 184, 0.08)");
            style.set("gridRow", row.to_string());
            style.set("gridColumn", column.to_string());
        })?;
        let mut marker = crate::Props::new();
        marker.mark_grid_cell(row, column);
        self.update_element_props(id, &marker)?;
        Ok(id)
    }
}
