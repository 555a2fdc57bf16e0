//! The element tree store.
//!
//! [`Document`] owns every element, the root display order, the selection and
//! the hover target. It is the only place parent/child links are written, so
//! the forest invariants are enforced here:
//!
//! - every id in a `children` list exists and names that parent as `parent_id`
//! - `root_element_ids` is exactly the parentless elements, in display order
//! - no element is its own ancestor
//!
//! Mutators that fail leave the document untouched.

use std::collections::HashMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementId, ElementType, Props, Style};
use crate::{BuilderError, BuilderResult};

/// Offset applied to duplicated elements' numeric `left`/`top`.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Style keys cleared when an element joins a flow container.
const OFFSET_KEYS: [&str; 4] = ["left", "top", "right", "bottom"];

/// Caller-supplied description of a new element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewElement {
    /// Element kind.
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Display label; defaults to the type's display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Style overrides merged over the type defaults.
    #[serde(default)]
    pub style: Style,
    /// Payload overrides merged over the type defaults.
    #[serde(default)]
    pub props: Props,
}

impl NewElement {
    /// Describe a new element of the given type with no overrides.
    #[must_use]
    pub fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            name: None,
            style: Style::new(),
            props: Props::new(),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override one style property.
    #[must_use]
    pub fn with_style(mut self, key: &str, value: impl Into<crate::StyleValue>) -> Self {
        self.style.set(key, value);
        self
    }

    /// Override one payload value.
    #[must_use]
    pub fn with_prop(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.props.set(key, value);
        self
    }
}

/// Shallow update applied by [`Document::update_element`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementPatch {
    /// New display label.
    pub name: Option<String>,
    /// Style keys to merge.
    pub style: Option<Style>,
    /// Payload keys to merge.
    pub props: Option<Props>,
    /// New locked flag.
    pub locked: Option<bool>,
    /// New hidden flag.
    pub hidden: Option<bool>,
}

/// The document: elements, root order, selection and hover.
///
/// This is the unit captured by history snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// All elements, indexed by ID.
    elements: HashMap<ElementId, Element>,
    /// Parentless elements in display order.
    root_element_ids: Vec<ElementId>,
    /// Selected elements in selection order.
    #[serde(default)]
    selected_element_ids: IndexSet<ElementId>,
    /// Element under the pointer, if any.
    #[serde(default)]
    hovered_element_id: Option<ElementId>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Get an element by ID.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Whether an element exists.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// All elements, in no particular order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Whether the document has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Root element IDs in display order.
    #[must_use]
    pub fn root_element_ids(&self) -> &[ElementId] {
        &self.root_element_ids
    }

    /// Selected element IDs in selection order.
    #[must_use]
    pub fn selected_element_ids(&self) -> &IndexSet<ElementId> {
        &self.selected_element_ids
    }

    /// The hovered element, if any.
    #[must_use]
    pub fn hovered_element_id(&self) -> Option<ElementId> {
        self.hovered_element_id
    }

    /// Parent of an element (`None` for roots and unknown IDs).
    #[must_use]
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(&id).and_then(|e| e.parent_id)
    }

    /// The ordered sibling list an element lives in: its parent's children
    /// or the root list.
    #[must_use]
    pub fn sibling_list(&self, parent: Option<ElementId>) -> &[ElementId] {
        match parent {
            Some(p) => self
                .elements
                .get(&p)
                .map_or(&[][..], |e| e.children.as_slice()),
            None => &self.root_element_ids,
        }
    }

    /// Children of an element (empty for leaves and unknown IDs).
    #[must_use]
    pub fn children_of(&self, id: ElementId) -> &[ElementId] {
        self.sibling_list(Some(id))
    }

    /// Position of an element within its sibling list.
    #[must_use]
    pub fn index_in_parent(&self, id: ElementId) -> Option<usize> {
        let element = self.elements.get(&id)?;
        self.sibling_list(element.parent_id)
            .iter()
            .position(|&sibling| sibling == id)
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut current = self.parent_of(node);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.elements.len() {
                break;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// All descendants of an element, pre-order, excluding the element itself.
    #[must_use]
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children_of(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children_of(next).iter().rev().copied());
        }
        out
    }

    /// Whether an element or any of its ancestors is hidden.
    #[must_use]
    pub fn is_effectively_hidden(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(cid) = current {
            match self.elements.get(&cid) {
                Some(e) if e.hidden => return true,
                Some(e) => current = e.parent_id,
                None => return false,
            }
            steps += 1;
            if steps > self.elements.len() {
                break;
            }
        }
        false
    }

    /// Whether an element is selected.
    #[must_use]
    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selected_element_ids.contains(&id)
    }

    // -----------------------------------------------------------------------
    // Structural mutators
    // -----------------------------------------------------------------------

    /// Add a new element and return its ID.
    ///
    /// When `parent_id` names an existing container the element is normalized
    /// to flow layout and appended to that container. Otherwise it becomes a
    /// root; root containers without an explicit `top` stack below the
    /// lowest existing root box.
    pub fn add_element(&mut self, new: NewElement, parent_id: Option<ElementId>) -> ElementId {
        let mut element = Element::new(new.element_type);
        if let Some(name) = new.name {
            element.name = name;
        }
        element.style.merge(&new.style);
        element.props.merge(&new.props);

        let parent = parent_id.filter(|p| self.elements.get(p).is_some_and(Element::is_container));
        let id = element.id;

        if let Some(parent) = parent {
            normalize_for_flow(&mut element.style);
            element.parent_id = Some(parent);
            if let Some(p) = self.elements.get_mut(&parent) {
                p.children.push(id);
            }
        } else {
            if parent_id.is_some() {
                tracing::debug!("Parent {parent_id:?} is not a container, adding {id} at root");
            }
            if element.is_container() && !new.style.contains("top") {
                let top = self.root_stack_bottom();
                element.style.set("top", top);
            }
            self.root_element_ids.push(id);
        }

        tracing::debug!(
            "Added {} element {id} under {:?}",
            element.element_type.as_str(),
            element.parent_id
        );
        self.elements.insert(id, element);
        id
    }

    /// Lowest edge (`top + height`) among root elements with numeric boxes.
    fn root_stack_bottom(&self) -> f64 {
        self.root_element_ids
            .iter()
            .filter_map(|id| self.elements.get(id))
            .filter_map(|e| Some(e.style.number("top")? + e.style.number("height")?))
            .fold(0.0, f64::max)
    }

    /// Shallow-merge a patch into an element.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::ElementNotFound`] if the element does not exist.
    pub fn update_element(&mut self, id: ElementId, patch: ElementPatch) -> BuilderResult<()> {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(BuilderError::ElementNotFound(id))?;
        if let Some(name) = patch.name {
            element.name = name;
        }
        if let Some(style) = &patch.style {
            element.style.merge(style);
        }
        if let Some(props) = &patch.props {
            element.props.merge(props);
        }
        if let Some(locked) = patch.locked {
            element.locked = locked;
        }
        if let Some(hidden) = patch.hidden {
            element.hidden = hidden;
        }
        Ok(())
    }

    /// Shallow-merge style keys into an element.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::ElementNotFound`] if the element does not exist.
    pub fn update_element_style(&mut self, id: ElementId, style: &Style) -> BuilderResult<()> {
        self.edit_style(id, |s| s.merge(style))
    }

    /// Shallow-merge payload keys into an element.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::ElementNotFound`] if the element does not exist.
    pub fn update_element_props(&mut self, id: ElementId, props: &Props) -> BuilderResult<()> {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(BuilderError::ElementNotFound(id))?;
        element.props.merge(props);
        Ok(())
    }

    /// Edit an element's style in place (including removing keys).
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::ElementNotFound`] if the element does not exist.
    pub fn edit_style<F>(&mut self, id: ElementId, f: F) -> BuilderResult<()>
    where
        F: FnOnce(&mut Style),
    {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(BuilderError::ElementNotFound(id))?;
        f(&mut element.style);
        Ok(())
    }

    /// Lock or unlock an element.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::ElementNotFound`] if the element does not exist.
    pub fn set_locked(&mut self, id: ElementId, locked: bool) -> BuilderResult<()> {
        self.update_element(
            id,
            ElementPatch {
                locked: Some(locked),
                ..ElementPatch::default()
            },
        )
    }

    /// Hide or show an element. Hiding also drops it from the hover slot.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::ElementNotFound`] if the element does not exist.
    pub fn set_hidden(&mut self, id: ElementId, hidden: bool) -> BuilderResult<()> {
        self.update_element(
            id,
            ElementPatch {
                hidden: Some(hidden),
                ..ElementPatch::default()
            },
        )?;
        if hidden && self.hovered_element_id == Some(id) {
            self.hovered_element_id = None;
        }
        Ok(())
    }

    /// Delete an element and its whole subtree.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::ElementNotFound`] if the element does not exist;
    /// the document is unchanged in that case.
    pub fn delete_element(&mut self, id: ElementId) -> BuilderResult<()> {
        let parent = self
            .elements
            .get(&id)
            .ok_or(BuilderError::ElementNotFound(id))?
            .parent_id;
        self.detach(id, parent);

        // Post-order: children go before their parents.
        let mut doomed = self.descendants(id);
        doomed.reverse();
        doomed.push(id);
        for victim in &doomed {
            self.elements.remove(victim);
            self.selected_element_ids.shift_remove(victim);
            if self.hovered_element_id == Some(*victim) {
                self.hovered_element_id = None;
            }
        }
        tracing::debug!("Deleted {id} and {} descendants", doomed.len() - 1);
        Ok(())
    }

    /// Deep-clone an element's subtree with fresh IDs and insert the clone
    /// right after the source.
    ///
    /// Returns the clone's ID, or `None` if the source does not exist.
    pub fn duplicate_element(&mut self, id: ElementId) -> Option<ElementId> {
        self.duplicate_element_with_offset(id, DUPLICATE_OFFSET)
    }

    /// [`Document::duplicate_element`] with a custom position offset.
    pub fn duplicate_element_with_offset(
        &mut self,
        id: ElementId,
        offset: f64,
    ) -> Option<ElementId> {
        let parent = self.elements.get(&id)?.parent_id;
        let index = self.index_in_parent(id)?;
        let clone_id = self.clone_subtree(id, parent)?;

        if let Some(clone) = self.elements.get_mut(&clone_id) {
            for key in ["left", "top"] {
                if let Some(v) = clone.style.number(key) {
                    clone.style.set(key, v + offset);
                }
            }
        }
        self.sibling_list_mut(parent).insert(index + 1, clone_id);
        tracing::debug!("Duplicated {id} as {clone_id}");
        Some(clone_id)
    }

    /// Copy `source` and its descendants under `new_parent`, returning the
    /// new root. The clone is not linked into `new_parent`'s child list.
    fn clone_subtree(&mut self, source: ElementId, new_parent: Option<ElementId>) -> Option<ElementId> {
        let mut copy = self.elements.get(&source)?.clone();
        let new_id = ElementId::new();
        copy.id = new_id;
        copy.parent_id = new_parent;
        let old_children = std::mem::take(&mut copy.children);
        self.elements.insert(new_id, copy);

        let new_children: Vec<ElementId> = old_children
            .into_iter()
            .filter_map(|child| self.clone_subtree(child, Some(new_id)))
            .collect();
        if let Some(copy) = self.elements.get_mut(&new_id) {
            copy.children = new_children;
        }
        Some(new_id)
    }

    /// Move an element under a new parent (`None` = root) at `index`
    /// (append when `None`). Moving within the same parent reorders.
    ///
    /// # Errors
    ///
    /// - [`BuilderError::ElementNotFound`] if the element does not exist
    /// - [`BuilderError::ParentNotFound`] if `new_parent` does not exist
    /// - [`BuilderError::CycleRejected`] if `new_parent` is the element or
    ///   one of its descendants
    pub fn move_element(
        &mut self,
        id: ElementId,
        new_parent: Option<ElementId>,
        index: Option<usize>,
    ) -> BuilderResult<()> {
        let current = self
            .elements
            .get(&id)
            .ok_or(BuilderError::ElementNotFound(id))?
            .parent_id;

        if let Some(parent) = new_parent {
            if !self.elements.contains_key(&parent) {
                return Err(BuilderError::ParentNotFound(parent));
            }
            if parent == id || self.is_ancestor(id, parent) {
                tracing::warn!("Rejected move of {id} under its own descendant {parent}");
                return Err(BuilderError::CycleRejected {
                    element: id,
                    parent,
                });
            }
        }

        self.detach(id, current);
        let list = self.sibling_list_mut(new_parent);
        let at = index.map_or(list.len(), |i| i.min(list.len()));
        list.insert(at, id);
        if let Some(element) = self.elements.get_mut(&id) {
            element.parent_id = new_parent;
        }
        tracing::debug!("Moved {id} from {current:?} to {new_parent:?} at {at}");
        Ok(())
    }

    /// Reorder an element within its current sibling list.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::ElementNotFound`] if the element does not exist.
    pub fn reorder_element(&mut self, id: ElementId, new_index: usize) -> BuilderResult<()> {
        let parent = self
            .elements
            .get(&id)
            .ok_or(BuilderError::ElementNotFound(id))?
            .parent_id;
        self.move_element(id, parent, Some(new_index))
    }

    /// Remove `id` from the sibling list of `parent`.
    fn detach(&mut self, id: ElementId, parent: Option<ElementId>) {
        self.sibling_list_mut(parent).retain(|&c| c != id);
    }

    fn sibling_list_mut(&mut self, parent: Option<ElementId>) -> &mut Vec<ElementId> {
        match parent {
            Some(p) => match self.elements.get_mut(&p) {
                Some(element) => &mut element.children,
                // Unreachable for validated parents; fall back to roots.
                None => &mut self.root_element_ids,
            },
            None => &mut self.root_element_ids,
        }
    }

    // -----------------------------------------------------------------------
    // Selection and hover
    // -----------------------------------------------------------------------

    /// Select an element. With `additive`, toggle its membership instead of
    /// replacing the selection.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::ElementNotFound`] if the element does not exist.
    pub fn select_element(&mut self, id: ElementId, additive: bool) -> BuilderResult<()> {
        if !self.elements.contains_key(&id) {
            return Err(BuilderError::ElementNotFound(id));
        }
        if additive {
            if !self.selected_element_ids.shift_remove(&id) {
                self.selected_element_ids.insert(id);
            }
        } else {
            self.selected_element_ids.clear();
            self.selected_element_ids.insert(id);
        }
        Ok(())
    }

    /// Replace the selection with the given IDs; unknown IDs are skipped.
    pub fn select_multiple<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ElementId>,
    {
        self.selected_element_ids.clear();
        for id in ids {
            if self.elements.contains_key(&id) {
                self.selected_element_ids.insert(id);
            }
        }
    }

    /// Add the given IDs to the selection, keeping existing members.
    pub fn extend_selection<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ElementId>,
    {
        for id in ids {
            if self.elements.contains_key(&id) {
                self.selected_element_ids.insert(id);
            }
        }
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        self.selected_element_ids.clear();
    }

    /// Set or clear the hovered element; unknown IDs clear it.
    pub fn set_hovered(&mut self, id: Option<ElementId>) {
        self.hovered_element_id = id.filter(|id| self.elements.contains_key(id));
    }

    // -----------------------------------------------------------------------
    // Validation and serialization
    // -----------------------------------------------------------------------

    /// Verify the forest invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::InvariantViolation`] describing the first
    /// inconsistency found.
    pub fn check_invariants(&self) -> BuilderResult<()> {
        let violation = |msg: String| Err(BuilderError::InvariantViolation(msg));

        let mut seen_roots = std::collections::HashSet::new();
        for root in &self.root_element_ids {
            if !seen_roots.insert(*root) {
                return violation(format!("root {root} listed twice"));
            }
            match self.elements.get(root) {
                None => return violation(format!("root {root} does not exist")),
                Some(e) if e.parent_id.is_some() => {
                    return violation(format!("root {root} has a parent"));
                }
                Some(_) => {}
            }
        }

        for (id, element) in &self.elements {
            if element.id != *id {
                return violation(format!("element keyed {id} carries id {}", element.id));
            }
            match element.parent_id {
                None if !seen_roots.contains(id) => {
                    return violation(format!("parentless {id} missing from roots"));
                }
                Some(parent) => {
                    let Some(p) = self.elements.get(&parent) else {
                        return violation(format!("{id} names missing parent {parent}"));
                    };
                    if p.children.iter().filter(|&&c| c == *id).count() != 1 {
                        return violation(format!("{parent} does not list {id} exactly once"));
                    }
                }
                None => {}
            }
            for child in &element.children {
                match self.elements.get(child) {
                    None => return violation(format!("{id} lists missing child {child}")),
                    Some(c) if c.parent_id != Some(*id) => {
                        return violation(format!("child {child} does not point back to {id}"));
                    }
                    Some(_) => {}
                }
            }
            if self.is_ancestor(*id, *id) {
                return violation(format!("{id} is its own ancestor"));
            }
        }

        // Walking up from every node must terminate at a root.
        for id in self.elements.keys() {
            let mut current = Some(*id);
            let mut steps = 0;
            while let Some(cid) = current {
                current = self.parent_of(cid);
                steps += 1;
                if steps > self.elements.len() {
                    return violation(format!("cycle above {id}"));
                }
            }
        }

        for id in &self.selected_element_ids {
            if !self.elements.contains_key(id) {
                return violation(format!("selected {id} does not exist"));
            }
        }
        Ok(())
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> BuilderResult<String> {
        serde_json::to_string(self).map_err(BuilderError::Serialization)
    }

    /// Deserialize a document from JSON and verify its invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the graph is inconsistent.
    pub fn from_json(json: &str) -> BuilderResult<Self> {
        let document: Self = serde_json::from_str(json)?;
        document.check_invariants()?;
        Ok(document)
    }
}

/// Switch a style to flow layout: relative, full width, no offsets.
pub(crate) fn normalize_for_flow(style: &mut Style) {
    style.set("position", "relative");
    style.set("width", "100%");
    for key in OFFSET_KEYS {
        style.remove(key);
    }
}
