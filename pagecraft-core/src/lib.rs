//! # Pagecraft Core
//!
//! Interaction and layout engine for a visual page builder: the element
//! tree, undo history, viewport math and the pointer state machine that
//! turns raw input into document edits. Compiles to WASM for the browser
//! host.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 Editor<S>                   │
//! │   pointer / wheel / key / drop handlers     │
//! ├──────────────────────┬──────────────────────┤
//! │  Document            │  Resolver            │
//! │  - Element forest    │  - Drop containers   │
//! │  - Selection, hover  │  - Flow insertion    │
//! │  - Grid cells        │  - Resize, marquee   │
//! ├──────────────────────┼──────────────────────┤
//! │  History (snapshots) │  Viewport (zoom/pan) │
//! ├──────────────────────┴──────────────────────┤
//! │       SpatialQuery (DOM or StaticLayout)    │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod grid;
pub mod history;
pub mod interaction;
pub mod marquee;
pub mod resize;
pub mod resolver;
pub mod spatial;
pub mod viewport;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::EditorConfig;
pub use document::{Document, ElementPatch, NewElement, DUPLICATE_OFFSET};
pub use element::{Element, ElementId, ElementType, Position, Props, Style, StyleValue};
pub use error::{BuilderError, BuilderResult};
pub use event::{
    DragPayload, EditorEvent, KeyEvent, KeyModifiers, PointerButton, PointerEvent, WheelEvent,
};
pub use geometry::{Axis, Point, Rect};
pub use grid::{CellReconciliation, DropDestination, GridCell, DEFAULT_GRID_TRACKS};
pub use history::History;
pub use interaction::{
    ContextMenu, ContextMenuAction, Disposition, DragState, Editor, InteractionState, ResizeState,
};
pub use marquee::Marquee;
pub use resize::ResizeDirection;
pub use resolver::{DragResolution, FlowMode, FlowPlacement};
pub use spatial::{MeasureOutcome, PendingMeasure, SpatialQuery, StaticLayout};
pub use viewport::{snap_to_grid, Viewport};

/// Pagecraft core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
