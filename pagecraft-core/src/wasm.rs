//! WebAssembly bindings for pagecraft-core.
//!
//! The browser host mirrors DOM layout into a [`StaticLayout`] (canvas box
//! plus one client-space box per rendered element, pushed in paint order)
//! and forwards input as [`EditorEvent`] JSON.

use wasm_bindgen::prelude::*;

use crate::{
    ContextMenuAction, Document, Editor, EditorConfig, EditorEvent, ElementId,
    PointerButton, PointerEvent, Rect, StaticLayout,
};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Editor instance for WASM.
#[wasm_bindgen]
pub struct WasmEditor {
    editor: Editor<StaticLayout>,
}

#[wasm_bindgen]
impl WasmEditor {
    /// Create an editor with the default configuration.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            editor: Editor::new(StaticLayout::new(Rect::default())),
        }
    }

    /// Create an editor from a camelCase JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error string if the config is malformed or invalid.
    #[wasm_bindgen(js_name = withConfigJson)]
    pub fn with_config_json(json: &str) -> Result<WasmEditor, String> {
        let config = EditorConfig::from_json(json).map_err(|e| e.to_string())?;
        let editor = Editor::with_config(config, StaticLayout::new(Rect::default()))
            .map_err(|e| e.to_string())?;
        Ok(Self { editor })
    }

    /// Get the document as JSON.
    #[wasm_bindgen(js_name = getDocumentJson)]
    #[must_use]
    pub fn get_document_json(&self) -> String {
        self.editor.document().to_json().unwrap_or_default()
    }

    /// Replace the document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if parsing or validation fails.
    #[wasm_bindgen(js_name = loadDocumentJson)]
    pub fn load_document_json(&mut self, json: &str) -> Result<(), String> {
        let document = Document::from_json(json).map_err(|e| e.to_string())?;
        self.editor.load_document(document);
        Ok(())
    }

    /// Set the canvas root's client box.
    #[wasm_bindgen(js_name = setCanvasRect)]
    pub fn set_canvas_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.editor.spatial_mut().canvas = Rect::new(x, y, width, height);
    }

    /// Record an element's client box. Later calls paint on top.
    ///
    /// # Errors
    ///
    /// Returns an error string for a malformed element ID.
    #[wasm_bindgen(js_name = setElementBox)]
    pub fn set_element_box(
        &mut self,
        id: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), String> {
        let id = parse_id(id)?;
        self.editor
            .spatial_mut()
            .set_box(id, Rect::new(x, y, width, height));
        Ok(())
    }

    /// Forget one element's box (it was unmounted).
    ///
    /// # Errors
    ///
    /// Returns an error string for a malformed element ID.
    #[wasm_bindgen(js_name = removeElementBox)]
    pub fn remove_element_box(&mut self, id: &str) -> Result<bool, String> {
        let id = parse_id(id)?;
        Ok(self.editor.spatial_mut().remove_box(id).is_some())
    }

    /// Forget every element box (before re-mirroring a layout).
    #[wasm_bindgen(js_name = clearLayout)]
    pub fn clear_layout(&mut self) {
        let canvas = self.editor.spatial().canvas;
        *self.editor.spatial_mut() = StaticLayout::new(canvas);
    }

    /// Dispatch an event; returns `true` when the host should prevent its default.
    ///
    /// # Errors
    ///
    /// Returns an error string if the event JSON is malformed.
    #[wasm_bindgen(js_name = handleEventJson)]
    pub fn handle_event_json(&mut self, json: &str) -> Result<bool, String> {
        let event: EditorEvent = serde_json::from_str(json).map_err(|e| e.to_string())?;
        Ok(self.editor.dispatch(&event).is_consumed())
    }

    /// Forward a raw DOM pointer event (`down`, `move`, `up`, `contextmenu`)
    /// using the `MouseEvent.button` code.
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown kind or button code.
    #[wasm_bindgen(js_name = pointerEvent)]
    pub fn pointer_event(
        &mut self,
        kind: &str,
        x: f64,
        y: f64,
        button: i16,
    ) -> Result<bool, String> {
        let button =
            PointerButton::from_code(button).ok_or_else(|| format!("unknown button {button}"))?;
        let event = PointerEvent::at(x, y).with_button(button);
        let disposition = match kind {
            "down" => self.editor.on_pointer_down(&event),
            "move" => self.editor.on_pointer_move(&event),
            "up" => self.editor.on_pointer_up(&event),
            "contextmenu" => self.editor.on_context_menu(&event),
            other => return Err(format!("unknown pointer event {other:?}")),
        };
        Ok(disposition.is_consumed())
    }

    /// Run a context-menu command (`duplicate`, `delete`, `lock`, `hide`).
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown action name.
    #[wasm_bindgen(js_name = contextAction)]
    pub fn context_action(&mut self, action: &str) -> Result<bool, String> {
        let action = match action {
            "duplicate" => ContextMenuAction::Duplicate,
            "delete" => ContextMenuAction::Delete,
            "lock" => ContextMenuAction::ToggleLock,
            "hide" => ContextMenuAction::ToggleHidden,
            other => return Err(format!("unknown context action {other:?}")),
        };
        Ok(self.editor.apply_context_action(action))
    }

    /// Select an element, toggling membership when `additive`.
    ///
    /// # Errors
    ///
    /// Returns an error string for malformed or unknown IDs.
    #[wasm_bindgen(js_name = selectElement)]
    pub fn select_element(&mut self, id: &str, additive: bool) -> Result<(), String> {
        let id = parse_id(id)?;
        self.editor
            .select_element(id, additive)
            .map_err(|e| e.to_string())
    }

    /// Selected IDs in selection order.
    #[wasm_bindgen(js_name = selectedIds)]
    #[must_use]
    pub fn selected_ids(&self) -> js_sys::Array {
        self.editor
            .document()
            .selected_element_ids()
            .iter()
            .map(|id| JsValue::from_str(&id.to_string()))
            .collect()
    }

    /// Undo the last edit.
    pub fn undo(&mut self) -> bool {
        self.editor.undo()
    }

    /// Redo the last undone edit.
    pub fn redo(&mut self) -> bool {
        self.editor.redo()
    }

    /// Whether there is an edit to undo.
    #[wasm_bindgen(js_name = canUndo)]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.editor.history().can_undo()
    }

    /// Whether there is an undone edit to redo.
    #[wasm_bindgen(js_name = canRedo)]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.editor.history().can_redo()
    }

    /// Open the component search overlay; Escape closes it.
    #[wasm_bindgen(js_name = openSearch)]
    pub fn open_search(&mut self) {
        self.editor.open_search();
    }

    /// Whether the component search overlay is open.
    #[wasm_bindgen(js_name = isSearchOpen)]
    #[must_use]
    pub fn is_search_open(&self) -> bool {
        self.editor.is_search_open()
    }

    /// Current zoom factor.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.editor.viewport().zoom()
    }

    /// Current interaction state name.
    #[wasm_bindgen(js_name = stateName)]
    #[must_use]
    pub fn state_name(&self) -> String {
        self.editor.state().name().to_string()
    }
}

impl Default for WasmEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_id(id: &str) -> Result<ElementId, String> {
    ElementId::parse(id).ok_or_else(|| format!("invalid element id {id:?}"))
}
