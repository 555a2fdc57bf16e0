//! Error types for document and editor operations.

use thiserror::Error;

use crate::ElementId;

/// Result type for builder operations.
pub type BuilderResult<T> = Result<T, BuilderError>;

/// Errors that can occur while editing a document.
///
/// Every mutator that returns one of these leaves the document exactly as it
/// was before the call.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// Element not found in the document.
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    /// Requested parent does not exist.
    #[error("Parent not found: {0}")]
    ParentNotFound(ElementId),

    /// The move would make an element its own ancestor.
    #[error("Moving {element} under {parent} would create a cycle")]
    CycleRejected {
        /// Element being moved.
        element: ElementId,
        /// Requested new parent.
        parent: ElementId,
    },

    /// The operation needs a container (or grid) element.
    #[error("Element {0} is not a container")]
    NotAContainer(ElementId),

    /// The document graph is inconsistent.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// An external drag payload could not be understood.
    #[error("Invalid drag payload: {0}")]
    InvalidPayload(String),

    /// Editor configuration is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
