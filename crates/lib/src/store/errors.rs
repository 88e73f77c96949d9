//! Error types for element store operations.

use thiserror::Error;

use super::{ElementKey, StoreKind};

/// Errors about element identity, placement and container access.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No element stored under this key
    #[error("Element '{key}' not found")]
    NotFound { key: ElementKey },

    /// Nothing stored at the path within the element
    #[error("Nothing stored at '{path}' in element '{key}'")]
    PathNotFound { key: ElementKey, path: String },

    /// A populated element already uses the key
    #[error("Element '{key}' already exists")]
    AlreadyExists { key: ElementKey },

    /// A map store needs a name to add an element
    #[error("An element name is required in a map store")]
    KeyRequired,

    /// The key is a name in a list store or an index in a map store
    #[error("Key '{key}' cannot address elements of a {kind} store")]
    WrongKeyKind { key: ElementKey, kind: StoreKind },

    /// The position cannot receive an element
    #[error("Invalid position '{key}': {reason}")]
    InvalidPosition { key: ElementKey, reason: String },

    /// Unordered lists only allow removing their last populated element
    #[error("Cannot delete element '{key}': only the last populated element ({last}) can be deleted")]
    NotLastElement { key: ElementKey, last: usize },

    /// The element backs a default rule
    #[error("Element '{key}' is a default")]
    ElementIsDefault { key: ElementKey },

    /// The change would leave a default element without data
    #[error("Default element '{key}' cannot be left empty")]
    DefaultWouldBeEmpty { key: ElementKey },

    /// The element holds no data; use `add` to fill it
    #[error("Element '{key}' is empty")]
    ElementIsEmpty { key: ElementKey },

    /// The operation does not exist for this kind of store
    #[error("Operation '{operation}' is not supported by {kind} stores")]
    UnsupportedInMode {
        operation: &'static str,
        kind: StoreKind,
    },

    /// `keys`/`values` on a scalar
    #[error("'{path}' in element '{key}' is not a container")]
    NotAContainer { key: ElementKey, path: String },
}

impl StoreError {
    /// Check if this error indicates a missing element or value
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::PathNotFound { .. }
        )
    }

    /// Check if this error is a key collision
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    /// Check if this error concerns which element a key refers to
    pub fn is_identity_error(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. }
                | StoreError::AlreadyExists { .. }
                | StoreError::KeyRequired
                | StoreError::WrongKeyKind { .. }
                | StoreError::InvalidPosition { .. }
                | StoreError::NotLastElement { .. }
                | StoreError::ElementIsDefault { .. }
        )
    }

    /// Get the element key involved, if any
    pub fn key(&self) -> Option<&ElementKey> {
        match self {
            StoreError::NotFound { key }
            | StoreError::PathNotFound { key, .. }
            | StoreError::AlreadyExists { key }
            | StoreError::WrongKeyKind { key, .. }
            | StoreError::InvalidPosition { key, .. }
            | StoreError::NotLastElement { key, .. }
            | StoreError::ElementIsDefault { key }
            | StoreError::DefaultWouldBeEmpty { key }
            | StoreError::ElementIsEmpty { key }
            | StoreError::NotAContainer { key, .. } => Some(key),
            StoreError::KeyRequired | StoreError::UnsupportedInMode { .. } => None,
        }
    }
}

// Conversion from StoreError to the main Error type
impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
