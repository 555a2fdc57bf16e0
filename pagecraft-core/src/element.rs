//! Page elements - the nodes of the document tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an ID from its hyphenated string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of renderable element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Generic layout box.
    Container,
    /// CSS-grid container whose children are grid cells.
    Grid,
    /// Text block.
    Text,
    /// Clickable button.
    Button,
    /// Image.
    Image,
    /// Form input.
    Input,
    /// Icon glyph.
    Icon,
    /// Slideshow.
    Slider,
    /// Navigation menu.
    Menu,
}

impl ElementType {
    /// All element types, in palette order.
    pub const ALL: [Self; 9] = [
        Self::Container,
        Self::Grid,
        Self::Text,
        Self::Button,
        Self::Image,
        Self::Input,
        Self::Icon,
        Self::Slider,
        Self::Menu,
    ];

    /// Look up a type by its wire name (`"container"`, `"text"`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Wire name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Grid => "grid",
            Self::Text => "text",
            Self::Button => "button",
            Self::Image => "image",
            Self::Input => "input",
            Self::Icon => "icon",
            Self::Slider => "slider",
            Self::Menu => "menu",
        }
    }

    /// Human-readable default name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Container => "Container",
            Self::Grid => "Grid",
            Self::Text => "Text",
            Self::Button => "Button",
            Self::Image => "Image",
            Self::Input => "Input",
            Self::Icon => "Icon",
            Self::Slider => "Slider",
            Self::Menu => "Menu",
        }
    }

    /// Whether elements of this type can hold children.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Container | Self::Grid)
    }

    /// Style every new element of this type starts with.
    #[must_use]
    pub fn default_style(self) -> Style {
        let mut style = Style::new();
        style.set("position", "absolute");
        match self {
            Self::Container => {
                style.set("left", 0.0);
                style.set("width", "100%");
                style.set("height", 200.0);
                style.set("display", "flex");
                style.set("flexDirection", "column");
            }
            Self::Grid => {
                style.set("left", 0.0);
                style.set("width", "100%");
                style.set("height", 300.0);
                style.set("display", "grid");
                style.set("gridTemplateColumns", "repeat(3, 1fr)");
                style.set("gridTemplateRows", "repeat(3, 1fr)");
                style.set("gap", 8.0);
            }
            Self::Text => {
                style.set("left", 100.0);
                style.set("top", 100.0);
                style.set("width", 200.0);
                style.set("height", 40.0);
                style.set("fontSize", 16.0);
            }
            Self::Button => {
                style.set("left", 100.0);
                style.set("top", 100.0);
                style.set("width", 120.0);
                style.set("height", 40.0);
            }
            Self::Image => {
                style.set("left", 100.0);
                style.set("top", 100.0);
                style.set("width", 200.0);
                style.set("height", 150.0);
            }
            Self::Input => {
                style.set("left", 100.0);
                style.set("top", 100.0);
                style.set("width", 200.0);
                style.set("height", 36.0);
            }
            Self::Icon => {
                style.set("left", 100.0);
                style.set("top", 100.0);
                style.set("width", 24.0);
                style.set("height", 24.0);
            }
            Self::Slider => {
                style.set("left", 0.0);
                style.set("top", 100.0);
                style.set("width", "100%");
                style.set("height", 300.0);
            }
            Self::Menu => {
                style.set("left", 0.0);
                style.set("top", 0.0);
                style.set("width", "100%");
                style.set("height", 60.0);
            }
        }
        style
    }

    /// Type-specific payload every new element of this type starts with.
    #[must_use]
    pub fn default_props(self) -> Props {
        let mut props = Props::new();
        match self {
            Self::Container | Self::Grid => {}
            Self::Text => props.set("content", "Text"),
            Self::Button => props.set("text", "Button"),
            Self::Image => {
                props.set("src", "");
                props.set("alt", "");
            }
            Self::Input => props.set("placeholder", "Enter text"),
            Self::Icon => props.set("icon", "star"),
            Self::Slider => props.set("slides", serde_json::Value::Array(Vec::new())),
            Self::Menu => props.set("items", serde_json::Value::Array(Vec::new())),
        }
        props
    }
}

/// CSS positioning scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Explicit coordinates relative to the positioned ancestor.
    Absolute,
    /// Flow layout with optional offsets.
    Relative,
    /// Pinned to the viewport.
    Fixed,
    /// Plain flow layout.
    #[default]
    Static,
}

impl Position {
    /// Parse a CSS `position` keyword.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "absolute" => Some(Self::Absolute),
            "relative" => Some(Self::Relative),
            "fixed" => Some(Self::Fixed),
            "static" => Some(Self::Static),
            _ => None,
        }
    }

    /// CSS keyword for this position.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Relative => "relative",
            Self::Fixed => "fixed",
            Self::Static => "static",
        }
    }

    /// Whether the element is taken out of flow.
    #[must_use]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }
}

/// A style value: plain pixels or a CSS string (`"100%"`, `"auto"`, `calc(...)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    /// Number with an implicit pixel unit.
    Number(f64),
    /// Any other CSS value.
    Text(String),
}

impl StyleValue {
    /// The numeric value, if this is a plain number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// The string value, if this is a CSS string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl From<f64> for StyleValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Layout and visual properties of an element, keyed by camelCase CSS name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Style(BTreeMap<String, StyleValue>);

impl Style {
    /// Create an empty style.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Get a property.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.0.get(key)
    }

    /// Set a property, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<StyleValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Remove a property.
    pub fn remove(&mut self, key: &str) -> Option<StyleValue> {
        self.0.remove(key)
    }

    /// Whether a property is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Numeric (pixel) value of a property.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(StyleValue::as_number)
    }

    /// String value of a property.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(StyleValue::as_text)
    }

    /// The `position` property; absent or unknown values read as `static`.
    #[must_use]
    pub fn position(&self) -> Position {
        self.text("position")
            .and_then(Position::parse)
            .unwrap_or_default()
    }

    /// Shallow-merge `other` into this style; keys in `other` win.
    pub fn merge(&mut self, other: &Style) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Iterate over all properties.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no properties are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<StyleValue>> FromIterator<(K, V)> for Style {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Type-specific payload (text content, image src, grid-cell markers, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props(serde_json::Map<String, serde_json::Value>);

impl Props {
    /// Create an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self(serde_json::Map::new())
    }

    /// Get a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Set a value.
    pub fn set(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// String value of a key.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(serde_json::Value::as_str)
    }

    /// Shallow-merge `other` into this payload; keys in `other` win.
    pub fn merge(&mut self, other: &Props) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Whether this element is an auto-generated grid cell.
    #[must_use]
    pub fn is_grid_cell(&self) -> bool {
        self.0
            .get("isGridCell")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// The `(row, column)` marker of a grid cell, 1-indexed.
    #[must_use]
    pub fn grid_cell_position(&self) -> Option<(u32, u32)> {
        if !self.is_grid_cell() {
            return None;
        }
        let row = self.0.get("gridCellRow")?.as_u64()?;
        let column = self.0.get("gridCellColumn")?.as_u64()?;
        Some((u32::try_from(row).ok()?, u32::try_from(column).ok()?))
    }

    /// Mark this payload as the grid cell at `(row, column)`.
    pub fn mark_grid_cell(&mut self, row: u32, column: u32) {
        self.set("isGridCell", true);
        self.set("gridCellRow", row);
        self.set("gridCellColumn", column);
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Element kind.
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Display label.
    #[serde(default)]
    pub name: String,
    /// Layout and visual properties.
    #[serde(default)]
    pub style: Style,
    /// Type-specific payload.
    #[serde(default)]
    pub props: Props,
    /// Ordered child IDs.
    #[serde(default)]
    pub children: Vec<ElementId>,
    /// Owning element, `None` for roots.
    #[serde(default)]
    pub parent_id: Option<ElementId>,
    /// Rejects pointer-driven mutation.
    #[serde(default)]
    pub locked: bool,
    /// Excluded from hit testing and output.
    #[serde(default)]
    pub hidden: bool,
}

impl Element {
    /// Create a new detached element with the type's default style and props.
    #[must_use]
    pub fn new(element_type: ElementType) -> Self {
        Self {
            id: ElementId::new(),
            element_type,
            name: element_type.display_name().to_string(),
            style: element_type.default_style(),
            props: element_type.default_props(),
            children: Vec::new(),
            parent_id: None,
            locked: false,
            hidden: false,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Merge style overrides.
    #[must_use]
    pub fn with_style(mut self, style: &Style) -> Self {
        self.style.merge(style);
        self
    }

    /// Whether this element can hold children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.element_type.is_container()
    }

    /// Whether this element is an auto-generated grid cell.
    #[must_use]
    pub fn is_grid_cell(&self) -> bool {
        self.props.is_grid_cell()
    }
}
