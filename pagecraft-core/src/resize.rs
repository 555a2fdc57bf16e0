//! Resize-handle geometry.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Compass direction of a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeDirection {
    /// Top edge.
    N,
    /// Top-right corner.
    Ne,
    /// Right edge.
    E,
    /// Bottom-right corner.
    Se,
    /// Bottom edge.
    S,
    /// Bottom-left corner.
    Sw,
    /// Left edge.
    W,
    /// Top-left corner.
    Nw,
}

impl ResizeDirection {
    /// Whether the top edge moves.
    #[must_use]
    pub const fn moves_top(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    /// Whether the bottom edge moves.
    #[must_use]
    pub const fn moves_bottom(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// Whether the left edge moves.
    #[must_use]
    pub const fn moves_left(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    /// Whether the right edge moves.
    #[must_use]
    pub const fn moves_right(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }
}

/// Resize `original` by a canvas-space pointer delta.
///
/// The edge opposite each moved edge stays fixed; the moved edge stops at
/// `min_size`.
#[must_use]
pub fn resize_rect(original: &Rect, direction: ResizeDirection, dx: f64, dy: f64, min_size: f64) -> Rect {
    let mut out = *original;

    if direction.moves_right() {
        out.width = (original.width + dx).max(min_size);
    } else if direction.moves_left() {
        out.width = (original.width - dx).max(min_size);
        out.x = original.x + (original.width - out.width);
    }

    if direction.moves_bottom() {
        out.height = (original.height + dy).max(min_size);
    } else if direction.moves_top() {
        out.height = (original.height - dy).max(min_size);
        out.y = original.y + (original.height - out.height);
    }

    out
}
