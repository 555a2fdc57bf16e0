//! Input events delivered to the editor.

use serde::{Deserialize, Serialize};

use crate::element::ElementType;
use crate::geometry::Point;
use crate::resize::ResizeDirection;
use crate::{BuilderError, BuilderResult};

/// Mouse button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Primary (left) button.
    #[default]
    Left,
    /// Middle button / wheel click.
    Middle,
    /// Secondary (right) button.
    Right,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` code (0 = left, 1 = middle, 2 = right).
    #[must_use]
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Left),
            1 => Some(Self::Middle),
            2 => Some(Self::Right),
            _ => None,
        }
    }
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    pub shift: bool,
    /// Control key pressed.
    pub ctrl: bool,
    /// Alt/Option key pressed.
    pub alt: bool,
    /// Meta/Command key pressed.
    pub meta: bool,
}

impl KeyModifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Only shift.
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Only alt.
    pub const ALT: Self = Self {
        shift: false,
        ctrl: false,
        alt: true,
        meta: false,
    };

    /// Only ctrl.
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };

    /// Ctrl on Windows/Linux or Cmd on macOS.
    #[must_use]
    pub const fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// A pointer (mouse/pen) event in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Client X.
    pub x: f64,
    /// Client Y.
    pub y: f64,
    /// Button that changed (down/up) or is held (move).
    #[serde(default)]
    pub button: PointerButton,
    /// Active modifiers.
    #[serde(default)]
    pub modifiers: KeyModifiers,
}

impl PointerEvent {
    /// Left-button event with no modifiers.
    #[must_use]
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            button: PointerButton::Left,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Replace the button.
    #[must_use]
    pub const fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Replace the modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: KeyModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Client position.
    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A wheel event. Positive `delta_y` scrolls down / zooms out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelEvent {
    /// Client X.
    pub x: f64,
    /// Client Y.
    pub y: f64,
    /// Vertical scroll delta.
    pub delta_y: f64,
    /// Active modifiers.
    #[serde(default)]
    pub modifiers: KeyModifiers,
}

/// A key press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// DOM `KeyboardEvent.key` value (`"Escape"`, `"Delete"`, `"z"`, ...).
    pub key: String,
    /// Active modifiers.
    #[serde(default)]
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    /// Create a key event.
    #[must_use]
    pub fn new(key: impl Into<String>, modifiers: KeyModifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }
}

/// Payload carried by a palette drag (`{ "type": "new_element", ... }`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    /// Kind of element to create.
    pub element_type: ElementType,
    /// Display label.
    pub name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDragPayload {
    #[serde(rename = "type")]
    kind: String,
    element_type: String,
    #[serde(default)]
    name: Option<String>,
}

impl DragPayload {
    /// Parse the JSON payload of an external drag.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::InvalidPayload`] for malformed JSON, a payload
    /// type other than `new_element`, or an unknown element type.
    pub fn parse(json: &str) -> BuilderResult<Self> {
        let raw: RawDragPayload =
            serde_json::from_str(json).map_err(|e| BuilderError::InvalidPayload(e.to_string()))?;
        if raw.kind != "new_element" {
            return Err(BuilderError::InvalidPayload(format!(
                "unsupported payload type {:?}",
                raw.kind
            )));
        }
        let element_type = ElementType::from_name(&raw.element_type).ok_or_else(|| {
            BuilderError::InvalidPayload(format!("unknown element type {:?}", raw.element_type))
        })?;
        Ok(Self {
            element_type,
            name: raw.name.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Every event the editor can receive, for scripted replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum EditorEvent {
    /// Pointer pressed.
    PointerDown(PointerEvent),
    /// Pointer moved.
    PointerMove(PointerEvent),
    /// Pointer released.
    PointerUp(PointerEvent),
    /// Wheel turned.
    Wheel(WheelEvent),
    /// Context menu requested.
    ContextMenu(PointerEvent),
    /// Key pressed.
    KeyDown(KeyEvent),
    /// Resize handle grabbed.
    ResizeStart {
        /// Handle direction.
        direction: ResizeDirection,
        /// Pointer-down on the handle.
        event: PointerEvent,
    },
    /// External drag hovering the canvas.
    DragOver(PointerEvent),
    /// External drag dropped with a JSON payload.
    Drop {
        /// Drop position.
        event: PointerEvent,
        /// Raw payload text.
        payload: String,
    },
    /// Animation frame tick.
    AnimationFrame,
}
