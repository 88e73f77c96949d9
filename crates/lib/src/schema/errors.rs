//! Error types for schema declaration and conformance checking.

use thiserror::Error;

/// Structured error types for schema operations.
///
/// The conformance variants ([`SchemaError::Mismatch`], [`SchemaError::Undeclared`],
/// [`SchemaError::InvalidKey`]) are raised by [`Schema::check`](super::Schema::check)
/// when a tree does not fit the declared structure. The remaining variants come from
/// declaring structure or rulesets.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A value has a different kind than the schema declares
    #[error("Structure mismatch at '{path}': expected {expected}, found {found}")]
    Mismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// A value uses a path the (fully defined) schema does not declare
    #[error("Path '{path}' is not declared in the schema")]
    Undeclared { path: String },

    /// A map key that can never be addressed by a path
    #[error("Invalid key '{key}' at '{path}': keys must be non-empty and contain no '/'")]
    InvalidKey { path: String, key: String },

    /// A declaration contradicts an earlier one
    #[error("Conflicting declaration at '{path}': already {existing}, requested {requested}")]
    Conflict {
        path: String,
        existing: String,
        requested: String,
    },

    /// A `*` component whose parent is not a list or uniform map
    #[error("Wildcard at '{path}' requires the parent to be a list or uniform map")]
    WildcardParent { path: String },

    /// A merge method was set on a path with no declared structure
    #[error("Cannot set merge method in ruleset '{ruleset}': '{path}' is not declared")]
    UnknownPath { ruleset: String, path: String },

    /// A merge method that cannot apply to the node at this path
    #[error("Merge method '{method}' is not valid at '{path}': {reason}")]
    InvalidMergeMethod {
        path: String,
        method: String,
        reason: String,
    },
}

impl SchemaError {
    /// Check if this error means a tree does not conform to the schema
    pub fn is_conformance_error(&self) -> bool {
        matches!(
            self,
            SchemaError::Mismatch { .. }
                | SchemaError::Undeclared { .. }
                | SchemaError::InvalidKey { .. }
        )
    }

    /// Check if this error came from a conflicting declaration
    pub fn is_conflict(&self) -> bool {
        matches!(self, SchemaError::Conflict { .. })
    }

    /// Get the offending path
    pub fn path(&self) -> &str {
        match self {
            SchemaError::Mismatch { path, .. }
            | SchemaError::Undeclared { path }
            | SchemaError::InvalidKey { path, .. }
            | SchemaError::Conflict { path, .. }
            | SchemaError::WildcardParent { path }
            | SchemaError::UnknownPath { path, .. }
            | SchemaError::InvalidMergeMethod { path, .. } => path,
        }
    }
}

// Conversion from SchemaError to the main Error type
impl From<SchemaError> for crate::Error {
    fn from(err: SchemaError) -> Self {
        crate::Error::Schema(err)
    }
}
