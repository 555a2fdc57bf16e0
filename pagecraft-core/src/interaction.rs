//! The pointer interaction state machine.
//!
//! ```text
//!            ┌──────────────► PreparingDrag ──(> threshold)──► Dragging ─┐
//!            │                                                           │
//!   Idle ────┼──────────────► Resizing ──────────────────────────────────┤
//!            ├──────────────► Panning ───────────────────────────────────┼──► Idle
//!            ├──────────────► MarqueeSelecting ──────────────────────────┤
//!            └──────────────► ContextMenuOpen ───────────────────────────┘
//! ```
//!
//! Exactly one state is active. Pointer-up and Escape always return to
//! `Idle` and discard transient state; neither rolls back committed edits.
//! A history snapshot is pushed right before a gesture's first mutation.

use crate::element::{ElementId, Style, StyleValue};
use crate::event::{DragPayload, EditorEvent, KeyEvent, PointerButton, PointerEvent, WheelEvent};
use crate::geometry::{Point, Rect};
use crate::grid::{cell_at, grid_dimensions, normalize_dropped_style, DropDestination};
use crate::marquee::Marquee;
use crate::resize::{resize_rect, ResizeDirection};
use crate::resolver::{resolve_drag, resolve_drop_container, DragResolution};
use crate::spatial::{MeasureOutcome, PendingMeasure, SpatialQuery};
use crate::{BuilderResult, Document, EditorConfig, ElementType, History, NewElement, Viewport};

/// Whether the host should treat an event as handled (prevent its default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The editor handled the event.
    Consumed,
    /// The event should follow its default path (e.g. page scroll).
    Ignored,
}

impl Disposition {
    /// Whether the event was handled.
    #[must_use]
    pub fn is_consumed(self) -> bool {
        self == Self::Consumed
    }
}

/// Drag bookkeeping from pointer-down until pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    /// Element under the pointer at pointer-down.
    pub element: ElementId,
    /// Client position of the pointer-down.
    pub origin: Point,
    /// Canvas `left`/`top` of every movable selected element at pointer-down.
    pub originals: Vec<(ElementId, f64, f64)>,
    /// Raw `left`/`top` at pointer-down, restored on flow children that
    /// end the drag in their own parent.
    pub offsets: Vec<(ElementId, Option<StyleValue>, Option<StyleValue>)>,
    /// A plain click on a member of a multi-selection selects only it.
    pub collapse_on_click: bool,
}

/// Resize bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeState {
    /// Element being resized.
    pub element: ElementId,
    /// Handle being dragged.
    pub direction: ResizeDirection,
    /// Client position of the pointer-down on the handle.
    pub origin: Point,
    /// Canvas-space box at pointer-down.
    pub original: Rect,
    /// Whether the undo snapshot has been taken.
    pub snapshotted: bool,
}

/// An open context menu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextMenu {
    /// Screen position of the menu.
    pub position: Point,
    /// Element that was right-clicked, if any.
    pub target: Option<ElementId>,
}

/// Commands offered by the context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMenuAction {
    /// Duplicate the target(s).
    Duplicate,
    /// Delete the target(s).
    Delete,
    /// Flip the locked flag.
    ToggleLock,
    /// Flip the hidden flag.
    ToggleHidden,
}

/// Current gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    /// No gesture.
    #[default]
    Idle,
    /// Pointer is down on an element but has not travelled far enough.
    PreparingDrag(DragState),
    /// Element is being dragged.
    Dragging(DragState),
    /// A resize handle is being dragged.
    Resizing(ResizeState),
    /// The canvas is being panned.
    Panning {
        /// Last client position.
        last: Point,
    },
    /// A marquee is being drawn.
    MarqueeSelecting(Marquee),
    /// The context menu is showing.
    ContextMenuOpen(ContextMenu),
}

impl InteractionState {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PreparingDrag(_) => "preparing-drag",
            Self::Dragging(_) => "dragging",
            Self::Resizing(_) => "resizing",
            Self::Panning { .. } => "panning",
            Self::MarqueeSelecting(_) => "marquee",
            Self::ContextMenuOpen(_) => "context-menu",
        }
    }
}

/// The editor: document, history, viewport and the gesture state machine.
///
/// Generic over the [`SpatialQuery`] that backs hit testing, so the same
/// engine runs against the DOM or against a synthetic [`crate::StaticLayout`].
#[derive(Debug)]
pub struct Editor<S: SpatialQuery> {
    document: Document,
    history: History,
    viewport: Viewport,
    config: EditorConfig,
    spatial: S,
    state: InteractionState,
    drop_indicator: Option<Rect>,
    highlighted_drop_target: Option<ElementId>,
    search_open: bool,
    pending_measure: Option<PendingMeasure>,
    selection_box: Option<Rect>,
}

impl<S: SpatialQuery> Editor<S> {
    /// Create an editor with the default configuration.
    #[must_use]
    pub fn new(spatial: S) -> Self {
        let config = EditorConfig::default();
        Self {
            document: Document::new(),
            history: History::with_limit(config.history_limit),
            viewport: Viewport::from_config(&config),
            config,
            spatial,
            state: InteractionState::Idle,
            drop_indicator: None,
            highlighted_drop_target: None,
            search_open: false,
            pending_measure: None,
            selection_box: None,
        }
    }

    /// Create an editor with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BuilderError::InvalidConfig`] if the config is invalid.
    pub fn with_config(config: EditorConfig, spatial: S) -> BuilderResult<Self> {
        config.validate()?;
        let mut editor = Self::new(spatial);
        editor.history = History::with_limit(config.history_limit);
        editor.viewport = Viewport::from_config(&config);
        editor.config = config;
        Ok(editor)
    }

    /// Replace the document, dropping history and transient state.
    #[must_use]
    pub fn with_document(mut self, document: Document) -> Self {
        self.load_document(document);
        self
    }

    /// Replace the document, dropping history and transient state.
    pub fn load_document(&mut self, document: Document) {
        self.document = document;
        self.history.clear();
        self.reset_transient();
        self.state = InteractionState::Idle;
        self.refresh_selection_overlay();
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Undo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Viewport settings.
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable viewport settings (toolbar zoom, snap toggles).
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The spatial query backend.
    #[must_use]
    pub fn spatial(&self) -> &S {
        &self.spatial
    }

    /// Mutable spatial backend (hosts update it after re-layout).
    pub fn spatial_mut(&mut self) -> &mut S {
        &mut self.spatial
    }

    /// Current gesture.
    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Whether no gesture is active.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    /// Canvas-space flow insertion line during a drag.
    #[must_use]
    pub fn drop_indicator(&self) -> Option<Rect> {
        self.drop_indicator
    }

    /// Container currently highlighted as drop target.
    #[must_use]
    pub fn highlighted_drop_target(&self) -> Option<ElementId> {
        self.highlighted_drop_target
    }

    /// The open context menu, if any.
    #[must_use]
    pub fn context_menu(&self) -> Option<&ContextMenu> {
        match &self.state {
            InteractionState::ContextMenuOpen(menu) => Some(menu),
            _ => None,
        }
    }

    /// Canvas-space marquee rectangle while one is drawn.
    #[must_use]
    pub fn marquee_rect(&self) -> Option<Rect> {
        match &self.state {
            InteractionState::MarqueeSelecting(marquee) => Some(marquee.rect()),
            _ => None,
        }
    }

    /// Canvas-space box of the primary selected element, once measured.
    #[must_use]
    pub fn selection_box(&self) -> Option<Rect> {
        self.selection_box
    }

    /// Whether the component search overlay is open.
    #[must_use]
    pub fn is_search_open(&self) -> bool {
        self.search_open
    }

    /// Open the component search overlay.
    pub fn open_search(&mut self) {
        self.search_open = true;
    }

    // -----------------------------------------------------------------------
    // Selection callbacks and programmatic edits
    // -----------------------------------------------------------------------

    /// Select an element (`additive` toggles membership).
    ///
    /// # Errors
    ///
    /// Returns [`crate::BuilderError::ElementNotFound`] for unknown IDs.
    pub fn select_element(&mut self, id: ElementId, additive: bool) -> BuilderResult<()> {
        self.document.select_element(id, additive)?;
        self.refresh_selection_overlay();
        Ok(())
    }

    /// Replace the selection.
    pub fn select_multiple<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ElementId>,
    {
        self.document.select_multiple(ids);
        self.refresh_selection_overlay();
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        self.document.clear_selection();
        self.refresh_selection_overlay();
    }

    /// Apply an undoable edit to the document (property panels, toolbars).
    pub fn apply<F, T>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut Document) -> T,
    {
        self.history.push_snapshot(self.document.clone());
        let out = f(&mut self.document);
        self.refresh_selection_overlay();
        out
    }

    /// Toolbar zoom in by the configured step.
    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in(self.config.zoom_step);
    }

    /// Toolbar zoom out by the configured step.
    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out(self.config.zoom_step);
    }

    /// Restore the previous snapshot. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(self.document.clone()) else {
            return false;
        };
        self.document = previous;
        tracing::debug!("Undo ({} steps left)", self.history.undo_len());
        self.refresh_selection_overlay();
        true
    }

    /// Re-apply an undone snapshot. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(self.document.clone()) else {
            return false;
        };
        self.document = next;
        tracing::debug!("Redo ({} steps left)", self.history.redo_len());
        self.refresh_selection_overlay();
        true
    }

    // -----------------------------------------------------------------------
    // Event entry points
    // -----------------------------------------------------------------------

    /// Route a scripted event to its handler.
    pub fn dispatch(&mut self, event: &EditorEvent) -> Disposition {
        match event {
            EditorEvent::PointerDown(e) => self.on_pointer_down(e),
            EditorEvent::PointerMove(e) => self.on_pointer_move(e),
            EditorEvent::PointerUp(e) => self.on_pointer_up(e),
            EditorEvent::Wheel(e) => self.on_wheel(e),
            EditorEvent::ContextMenu(e) => self.on_context_menu(e),
            EditorEvent::KeyDown(e) => self.on_key_down(e),
            EditorEvent::ResizeStart { direction, event } => self.resize_start(*direction, event),
            EditorEvent::DragOver(e) => self.on_drag_over(e),
            EditorEvent::Drop { event, payload } => self.on_drop(event, payload),
            EditorEvent::AnimationFrame => {
                self.on_animation_frame();
                Disposition::Ignored
            }
        }
    }

    /// Handle a pointer-down on the canvas.
    pub fn on_pointer_down(&mut self, event: &PointerEvent) -> Disposition {
        if matches!(self.state, InteractionState::ContextMenuOpen(_)) {
            tracing::debug!("Closing context menu on outside click");
            self.state = InteractionState::Idle;
            return Disposition::Consumed;
        }
        if !self.is_idle() {
            // A second button during a gesture does not start another one.
            return Disposition::Consumed;
        }

        let point = event.point();
        match event.button {
            PointerButton::Middle => return self.begin_pan(point),
            PointerButton::Left if event.modifiers.alt => return self.begin_pan(point),
            PointerButton::Right => return Disposition::Ignored,
            PointerButton::Left => {}
        }

        let shift = event.modifiers.shift;
        let Some(hit) = self.topmost_hit(point) else {
            if !shift {
                self.document.clear_selection();
                self.refresh_selection_overlay();
            }
            let start = self.to_canvas(point);
            tracing::debug!("Marquee started at ({:.1}, {:.1})", start.x, start.y);
            self.state = InteractionState::MarqueeSelecting(Marquee::new(start, shift));
            return Disposition::Consumed;
        };

        if self.document.element(hit).is_some_and(|e| e.locked) {
            tracing::debug!("Ignoring pointer-down on locked element {hit}");
            return Disposition::Consumed;
        }

        let was_selected = self.document.is_selected(hit);
        let had_multi = self.document.selected_element_ids().len() > 1;
        let selected = if shift {
            self.document.select_element(hit, true)
        } else if was_selected {
            Ok(())
        } else {
            self.document.select_element(hit, false)
        };
        if let Err(e) = selected {
            tracing::warn!("Selection failed: {e}");
            return Disposition::Consumed;
        }
        self.refresh_selection_overlay();

        if !self.document.is_selected(hit) {
            // Shift-click toggled it off; nothing to drag.
            return Disposition::Consumed;
        }

        let movable: Vec<ElementId> = self
            .document
            .selected_element_ids()
            .iter()
            .copied()
            .filter(|&id| self.document.element(id).is_some_and(|e| !e.locked))
            .collect();
        let originals = movable
            .iter()
            .filter_map(|&id| {
                let (left, top) = self.drag_origin(id)?;
                Some((id, left, top))
            })
            .collect();
        let offsets = movable
            .iter()
            .filter_map(|&id| {
                let style = &self.document.element(id)?.style;
                Some((id, style.get("left").cloned(), style.get("top").cloned()))
            })
            .collect();

        self.state = InteractionState::PreparingDrag(DragState {
            element: hit,
            origin: point,
            originals,
            offsets,
            collapse_on_click: !shift && was_selected && had_multi,
        });
        Disposition::Consumed
    }

    /// Handle a pointer move.
    pub fn on_pointer_move(&mut self, event: &PointerEvent) -> Disposition {
        let point = event.point();
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => {
                let hovered = self.topmost_hit(point);
                self.document.set_hovered(hovered);
                Disposition::Ignored
            }
            InteractionState::Panning { last } => {
                self.viewport.pan_by(point.x - last.x, point.y - last.y);
                self.state = InteractionState::Panning { last: point };
                Disposition::Consumed
            }
            InteractionState::PreparingDrag(drag) => {
                if point.distance_to(drag.origin) > self.config.drag_threshold {
                    tracing::debug!("Drag of {} passed threshold", drag.element);
                    self.history.push_snapshot(self.document.clone());
                    self.drag_step(&drag, point);
                    self.state = InteractionState::Dragging(drag);
                } else {
                    self.state = InteractionState::PreparingDrag(drag);
                }
                Disposition::Consumed
            }
            InteractionState::Dragging(drag) => {
                self.drag_step(&drag, point);
                self.state = InteractionState::Dragging(drag);
                Disposition::Consumed
            }
            InteractionState::Resizing(mut resize) => {
                self.resize_step(&mut resize, point);
                self.state = InteractionState::Resizing(resize);
                Disposition::Consumed
            }
            InteractionState::MarqueeSelecting(mut marquee) => {
                marquee.current = self.to_canvas(point);
                self.state = InteractionState::MarqueeSelecting(marquee);
                Disposition::Consumed
            }
            menu @ InteractionState::ContextMenuOpen(_) => {
                self.state = menu;
                Disposition::Ignored
            }
        }
    }

    /// Handle a pointer release.
    pub fn on_pointer_up(&mut self, event: &PointerEvent) -> Disposition {
        let point = event.point();
        let disposition = match std::mem::take(&mut self.state) {
            InteractionState::Idle => Disposition::Ignored,
            InteractionState::PreparingDrag(drag) => {
                if drag.collapse_on_click {
                    if let Err(e) = self.document.select_element(drag.element, false) {
                        tracing::warn!("Selection failed: {e}");
                    }
                    self.refresh_selection_overlay();
                }
                Disposition::Consumed
            }
            InteractionState::Dragging(drag) => {
                self.finish_drag(&drag, point);
                Disposition::Consumed
            }
            InteractionState::Resizing(resize) => {
                tracing::debug!("Resize of {} finished", resize.element);
                self.refresh_selection_overlay();
                Disposition::Consumed
            }
            InteractionState::Panning { .. } => Disposition::Consumed,
            InteractionState::MarqueeSelecting(mut marquee) => {
                marquee.current = self.to_canvas(point);
                self.finish_marquee(&marquee);
                Disposition::Consumed
            }
            menu @ InteractionState::ContextMenuOpen(_) => {
                self.state = menu;
                return Disposition::Ignored;
            }
        };
        self.reset_transient();
        disposition
    }

    /// Handle a wheel event: ctrl/meta zooms, anything else passes through.
    pub fn on_wheel(&mut self, event: &WheelEvent) -> Disposition {
        if !event.modifiers.command() {
            return Disposition::Ignored;
        }
        if event.delta_y < 0.0 {
            self.viewport.zoom_in(self.config.zoom_step);
        } else if event.delta_y > 0.0 {
            self.viewport.zoom_out(self.config.zoom_step);
        }
        tracing::trace!("Zoom now {:.2}", self.viewport.zoom());
        Disposition::Consumed
    }

    /// Open the context menu at the pointer.
    pub fn on_context_menu(&mut self, event: &PointerEvent) -> Disposition {
        if !matches!(
            self.state,
            InteractionState::Idle | InteractionState::ContextMenuOpen(_)
        ) {
            return Disposition::Ignored;
        }
        let point = event.point();
        let target = self.topmost_hit(point);
        if let Some(id) = target {
            let locked = self.document.element(id).is_some_and(|e| e.locked);
            if !locked && !self.document.is_selected(id) {
                if let Err(e) = self.document.select_element(id, false) {
                    tracing::warn!("Selection failed: {e}");
                }
                self.refresh_selection_overlay();
            }
        }
        self.state = InteractionState::ContextMenuOpen(ContextMenu {
            position: point,
            target,
        });
        Disposition::Consumed
    }

    /// Run a context-menu command and close the menu.
    ///
    /// Acts on the whole selection when the right-clicked element is part of
    /// it, otherwise on the right-clicked element alone. Returns whether the
    /// document changed.
    pub fn apply_context_action(&mut self, action: ContextMenuAction) -> bool {
        let InteractionState::ContextMenuOpen(menu) = std::mem::take(&mut self.state) else {
            return false;
        };
        let Some(target) = menu.target.filter(|&t| self.document.contains(t)) else {
            return false;
        };
        let targets: Vec<ElementId> = if self.document.is_selected(target) {
            self.document.selected_element_ids().iter().copied().collect()
        } else {
            vec![target]
        };

        match action {
            ContextMenuAction::Duplicate => self.duplicate_elements(&targets),
            ContextMenuAction::Delete => self.delete_elements(&targets),
            ContextMenuAction::ToggleLock => {
                let locked = self.document.element(target).is_some_and(|e| e.locked);
                self.apply(|doc| {
                    for &id in &targets {
                        let _ = doc.set_locked(id, !locked);
                    }
                });
                true
            }
            ContextMenuAction::ToggleHidden => {
                let hidden = self.document.element(target).is_some_and(|e| e.hidden);
                self.apply(|doc| {
                    for &id in &targets {
                        let _ = doc.set_hidden(id, !hidden);
                    }
                });
                true
            }
        }
    }

    /// Handle a key press.
    pub fn on_key_down(&mut self, event: &KeyEvent) -> Disposition {
        if event.key == "Escape" {
            return self.cancel();
        }
        if !self.is_idle() {
            return Disposition::Ignored;
        }

        let command = event.modifiers.command();
        match event.key.as_str() {
            "Delete" | "Backspace" if !command => {
                let targets: Vec<ElementId> =
                    self.document.selected_element_ids().iter().copied().collect();
                if self.delete_elements(&targets) {
                    Disposition::Consumed
                } else {
                    Disposition::Ignored
                }
            }
            "z" | "Z" if command => {
                if event.modifiers.shift {
                    self.redo();
                } else {
                    self.undo();
                }
                Disposition::Consumed
            }
            "y" | "Y" if command => {
                self.redo();
                Disposition::Consumed
            }
            "d" | "D" if command => {
                let targets: Vec<ElementId> =
                    self.document.selected_element_ids().iter().copied().collect();
                self.duplicate_elements(&targets);
                Disposition::Consumed
            }
            "a" | "A" if command => {
                let roots: Vec<ElementId> = self
                    .document
                    .root_element_ids()
                    .iter()
                    .copied()
                    .filter(|&id| !self.document.is_effectively_hidden(id))
                    .collect();
                self.select_multiple(roots);
                Disposition::Consumed
            }
            _ => Disposition::Ignored,
        }
    }

    /// Escape: close overlays and abandon any gesture without rolling back.
    pub fn cancel(&mut self) -> Disposition {
        let was_active = !self.is_idle() || self.search_open;
        if was_active {
            tracing::debug!("Cancelled {}", self.state.name());
        }
        self.state = InteractionState::Idle;
        self.search_open = false;
        self.reset_transient();
        if was_active {
            Disposition::Consumed
        } else {
            Disposition::Ignored
        }
    }

    /// Begin resizing the single selected element from a handle.
    pub fn resize_start(&mut self, direction: ResizeDirection, event: &PointerEvent) -> Disposition {
        if !self.is_idle() {
            return Disposition::Ignored;
        }
        let selected = self.document.selected_element_ids();
        if selected.len() != 1 {
            return Disposition::Ignored;
        }
        let id = selected[0];
        let Some(element) = self.document.element(id) else {
            return Disposition::Ignored;
        };
        if element.locked {
            tracing::debug!("Ignoring resize of locked element {id}");
            return Disposition::Ignored;
        }

        let root = self.spatial.canvas_rect();
        let measured = self
            .spatial
            .bounding_box(id)
            .map(|b| self.viewport.client_rect_to_canvas(&b, &root));
        let pick = |key: &str, fallback: Option<f64>| {
            element.style.number(key).or(fallback).unwrap_or(0.0)
        };
        let original = Rect::new(
            pick("left", measured.map(|m| m.x)),
            pick("top", measured.map(|m| m.y)),
            pick("width", measured.map(|m| m.width)),
            pick("height", measured.map(|m| m.height)),
        );

        tracing::debug!("Resize of {id} started from {direction:?}");
        self.state = InteractionState::Resizing(ResizeState {
            element: id,
            direction,
            origin: event.point(),
            original,
            snapshotted: false,
        });
        Disposition::Consumed
    }

    /// An external drag is over the canvas: highlight the target container.
    pub fn on_drag_over(&mut self, event: &PointerEvent) -> Disposition {
        self.highlighted_drop_target =
            resolve_drop_container(&self.document, &self.spatial, event.point(), &[]);
        Disposition::Consumed
    }

    /// An external drag was dropped: create the described element.
    pub fn on_drop(&mut self, event: &PointerEvent, payload: &str) -> Disposition {
        self.highlighted_drop_target = None;
        let payload = match DragPayload::parse(payload) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!("Ignoring drop: {e}");
                return Disposition::Ignored;
            }
        };

        let point = event.point();
        let container = resolve_drop_container(&self.document, &self.spatial, point, &[]);
        let mut new = NewElement::new(payload.element_type);
        new.name = payload.name;

        let destination = container.and_then(|c| self.drop_destination(c, point));
        if container.is_none() && !payload.element_type.is_container() {
            let at = self.to_canvas(point);
            new.style.set("left", self.viewport.snap(at.x));
            new.style.set("top", self.viewport.snap(at.y));
        }

        self.history.push_snapshot(self.document.clone());
        let id = self.document.add_element(new, container);
        if let Some(destination @ (DropDestination::Grid(_) | DropDestination::GridCell)) = destination {
            let _ = self
                .document
                .edit_style(id, |s| normalize_dropped_style(s, destination));
        }
        if payload.element_type == ElementType::Grid {
            if let Err(e) = self
                .document
                .generate_grid_cells_with_default(id, self.config.default_grid_tracks)
            {
                tracing::warn!("Grid cell generation failed: {e}");
            }
        }
        let _ = self.document.select_element(id, false);
        self.refresh_selection_overlay();
        tracing::debug!("Dropped new {} {id}", payload.element_type.as_str());
        Disposition::Consumed
    }

    /// Animation-frame tick: retry pending measurements.
    pub fn on_animation_frame(&mut self) {
        let Some(mut pending) = self.pending_measure.take() else {
            return;
        };
        match pending.poll(&self.spatial) {
            MeasureOutcome::Ready(rect) => {
                let root = self.spatial.canvas_rect();
                self.selection_box = Some(self.viewport.client_rect_to_canvas(&rect, &root));
            }
            MeasureOutcome::Pending => self.pending_measure = Some(pending),
            MeasureOutcome::GaveUp => self.selection_box = None,
        }
    }

    // -----------------------------------------------------------------------
    // Gesture internals
    // -----------------------------------------------------------------------

    fn begin_pan(&mut self, point: Point) -> Disposition {
        tracing::debug!("Pan started");
        self.state = InteractionState::Panning { last: point };
        Disposition::Consumed
    }

    fn drag_step(&mut self, drag: &DragState, point: Point) {
        if !self.document.contains(drag.element) {
            return;
        }
        let resolution = resolve_drag(
            &self.document,
            &self.spatial,
            drag.element,
            point,
            self.config.max_reorder_escalation,
        );
        self.highlighted_drop_target = resolution.container();
        match resolution {
            DragResolution::Absolute { .. } => {
                self.drop_indicator = None;
                self.move_absolute(drag, point);
            }
            DragResolution::Flow {
                placement: Some(placement),
                ..
            } => {
                let root = self.spatial.canvas_rect();
                self.drop_indicator = placement
                    .indicator
                    .map(|line| self.viewport.client_rect_to_canvas(&line, &root));
                if placement.changes_order() {
                    tracing::trace!(
                        "Live reorder of {} to {}",
                        placement.element,
                        placement.index
                    );
                    if let Err(e) = self.document.reorder_element(placement.element, placement.index) {
                        tracing::warn!("Reorder failed: {e}");
                    }
                }
            }
            DragResolution::Flow { placement: None, .. } => {
                self.drop_indicator = None;
            }
        }
    }

    fn move_absolute(&mut self, drag: &DragState, point: Point) {
        let dx = self.viewport.screen_delta_to_canvas(point.x - drag.origin.x);
        let dy = self.viewport.screen_delta_to_canvas(point.y - drag.origin.y);
        for &(id, left, top) in &drag.originals {
            let left = self.viewport.snap(left + dx);
            let top = self.viewport.snap(top + dy);
            let _ = self.document.edit_style(id, |style| {
                style.set("left", left);
                style.set("top", top);
            });
        }
    }

    fn finish_drag(&mut self, drag: &DragState, point: Point) {
        let dragged = drag.element;
        if !self.document.contains(dragged) {
            return;
        }
        let container = resolve_drop_container(&self.document, &self.spatial, point, &[dragged]);
        let current_parent = self.document.parent_of(dragged);
        let mut reparented = false;

        match container {
            Some(target) if Some(target) != current_parent => {
                let destination = self
                    .drop_destination(target, point)
                    .unwrap_or(DropDestination::Container);
                match self.document.move_element(dragged, Some(target), None) {
                    Ok(()) => {
                        let _ = self
                            .document
                            .edit_style(dragged, |s| normalize_dropped_style(s, destination));
                        reparented = true;
                        tracing::debug!("Dropped {dragged} into {target}");
                    }
                    Err(e) => tracing::warn!("Drop into {target} rejected: {e}"),
                }
            }
            None if current_parent.is_some() => {
                let root = self.spatial.canvas_rect();
                let origin = self
                    .spatial
                    .bounding_box(dragged)
                    .map(|b| self.viewport.client_rect_to_canvas(&b, &root))
                    .map_or_else(|| self.to_canvas(point), |b| Point::new(b.x, b.y));
                match self.document.move_element(dragged, None, None) {
                    Ok(()) => {
                        let left = self.viewport.snap(origin.x);
                        let top = self.viewport.snap(origin.y);
                        let _ = self.document.edit_style(dragged, |style| {
                            style.set("position", "absolute");
                            style.set("left", left);
                            style.set("top", top);
                            style.remove("gridRow");
                            style.remove("gridColumn");
                        });
                        tracing::debug!("Dropped {dragged} onto the canvas root");
                    }
                    Err(e) => tracing::warn!("Drop to root rejected: {e}"),
                }
            }
            None => {
                let _ = self.document.edit_style(dragged, |style| {
                    style.set("position", "absolute");
                });
            }
            _ => {}
        }
        let skip = reparented.then_some(dragged);
        self.restore_flow_offsets(drag, skip);
        self.refresh_selection_overlay();
    }

    /// Flow children still inside their container keep their pre-drag
    /// offsets; coordinates written while over empty canvas do not stick.
    fn restore_flow_offsets(&mut self, drag: &DragState, skip: Option<ElementId>) {
        for (id, left, top) in &drag.offsets {
            if Some(*id) == skip {
                continue;
            }
            let Some(element) = self.document.element(*id) else {
                continue;
            };
            if element.parent_id.is_none() || element.style.position().is_out_of_flow() {
                continue;
            }
            let _ = self.document.edit_style(*id, |style| {
                for (key, value) in [("left", left), ("top", top)] {
                    match value {
                        Some(value) => style.set(key, value.clone()),
                        None => {
                            style.remove(key);
                        }
                    }
                }
            });
        }
    }

    /// Canvas-space `left`/`top` a drag starts from.
    ///
    /// Numeric style values win. Otherwise positioned elements fall back to
    /// their measured box and flow children to a zero offset.
    fn drag_origin(&self, id: ElementId) -> Option<(f64, f64)> {
        let element = self.document.element(id)?;
        let positioned =
            element.parent_id.is_none() || element.style.position().is_out_of_flow();
        let root = self.spatial.canvas_rect();
        let measured = positioned
            .then(|| self.spatial.bounding_box(id))
            .flatten()
            .map(|b| self.viewport.client_rect_to_canvas(&b, &root));
        let left = element
            .style
            .number("left")
            .or(measured.map(|m| m.x))
            .unwrap_or(0.0);
        let top = element
            .style
            .number("top")
            .or(measured.map(|m| m.y))
            .unwrap_or(0.0);
        Some((left, top))
    }

    /// Classify a drop container, measuring grids to pick the cell.
    fn drop_destination(&self, container: ElementId, point: Point) -> Option<DropDestination> {
        let element = self.document.element(container)?;
        let destination = match DropDestination::of(element) {
            DropDestination::Grid(_) => {
                let (columns, rows) = grid_dimensions(element, self.config.default_grid_tracks);
                let cell = self
                    .spatial
                    .bounding_box(container)
                    .map(|grid_box| cell_at(point, &grid_box, columns, rows));
                DropDestination::Grid(cell)
            }
            other => other,
        };
        Some(destination)
    }

    fn resize_step(&mut self, resize: &mut ResizeState, point: Point) {
        let dx = self.viewport.screen_delta_to_canvas(point.x - resize.origin.x);
        let dy = self.viewport.screen_delta_to_canvas(point.y - resize.origin.y);
        let raw = resize_rect(
            &resize.original,
            resize.direction,
            dx,
            dy,
            self.config.min_element_size,
        );
        let next = Rect::new(
            self.viewport.snap(raw.x),
            self.viewport.snap(raw.y),
            self.viewport.snap(raw.width),
            self.viewport.snap(raw.height),
        );

        let Some(element) = self.document.element(resize.element) else {
            return;
        };
        let out_of_flow = element.style.position().is_out_of_flow();
        let write_left = out_of_flow || resize.direction.moves_left();
        let write_top = out_of_flow || resize.direction.moves_top();

        let mut patch = Style::new();
        patch.set("width", next.width);
        patch.set("height", next.height);
        if write_left {
            patch.set("left", next.x);
        }
        if write_top {
            patch.set("top", next.y);
        }
        let unchanged = patch.iter().all(|(k, v)| element.style.get(k) == Some(v));
        if unchanged {
            return;
        }

        if !resize.snapshotted {
            self.history.push_snapshot(self.document.clone());
            resize.snapshotted = true;
        }
        let _ = self.document.update_element_style(resize.element, &patch);
    }

    fn finish_marquee(&mut self, marquee: &Marquee) {
        if !marquee.exceeds(self.config.marquee_min_size) {
            // Too small to be a rectangle: it was a click on empty canvas.
            return;
        }
        let hits = marquee.hits(&self.document, &self.spatial, &self.viewport);
        tracing::debug!("Marquee selected {} elements", hits.len());
        if marquee.additive {
            self.document.extend_selection(hits);
        } else {
            self.document.select_multiple(hits);
        }
        self.refresh_selection_overlay();
    }

    fn duplicate_elements(&mut self, targets: &[ElementId]) -> bool {
        let targets: Vec<ElementId> = targets
            .iter()
            .copied()
            .filter(|&id| self.document.contains(id))
            .collect();
        if targets.is_empty() {
            return false;
        }
        let offset = self.config.duplicate_offset;
        let clones = self.apply(|doc| {
            targets
                .iter()
                .filter_map(|&id| doc.duplicate_element_with_offset(id, offset))
                .collect::<Vec<_>>()
        });
        self.select_multiple(clones);
        true
    }

    fn delete_elements(&mut self, targets: &[ElementId]) -> bool {
        let targets: Vec<ElementId> = targets
            .iter()
            .copied()
            .filter(|&id| self.document.element(id).is_some_and(|e| !e.locked))
            .collect();
        if targets.is_empty() {
            return false;
        }
        self.apply(|doc| {
            for id in &targets {
                // Earlier deletions may already have taken descendants.
                if doc.contains(*id) {
                    let _ = doc.delete_element(*id);
                }
            }
        });
        true
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn to_canvas(&self, client: Point) -> Point {
        self.viewport
            .client_to_canvas(client, &self.spatial.canvas_rect())
    }

    /// Topmost visible element under a client point.
    fn topmost_hit(&self, client: Point) -> Option<ElementId> {
        self.spatial
            .elements_at_point(client.x, client.y)
            .into_iter()
            .find(|&id| self.document.contains(id) && !self.document.is_effectively_hidden(id))
    }

    fn reset_transient(&mut self) {
        self.drop_indicator = None;
        self.highlighted_drop_target = None;
    }

    fn refresh_selection_overlay(&mut self) {
        self.selection_box = None;
        self.pending_measure = self
            .document
            .selected_element_ids()
            .first()
            .map(|&id| PendingMeasure::new(id, self.config.measure_retry_limit));
        self.on_animation_frame();
    }
}
