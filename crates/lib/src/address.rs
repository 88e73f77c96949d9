//! Schema-validated addresses into value trees.
//!
//! A textual [`Path`] only says which components to follow. An [`Address`] is the
//! same path after the schema has decided, component by component, whether it is
//! a map key or a list index, and what shape the addressed node has. Addresses are
//! produced by [`Schema::address`](crate::schema::Schema::address) and then resolved
//! against any number of trees with [`resolve`].
//!
//! Resolution distinguishes two failure modes:
//! - [`Resolved::Absent`]: the path is valid but no value is stored there
//! - [`AddressError`]: the path cannot exist under the schema, or the tree
//!   disagrees with the schema about a node's kind

use std::fmt;

use thiserror::Error;

use crate::{
    path::Path,
    schema::Shape,
    value::{Value, ValueKind},
};

/// A single resolved component of an address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// Key into a map or uniform map
    Key(String),
    /// Position in a list; `ordered` records whether positions are meaningful
    Index { index: usize, ordered: bool },
}

impl Step {
    /// Name of the container kind this step descends into.
    pub fn container_name(&self) -> &'static str {
        match self {
            Step::Key(_) => "map",
            Step::Index { .. } => "list",
        }
    }

    /// Renders a sequence of steps back into a path string.
    pub fn render(steps: &[Step]) -> String {
        if steps.is_empty() {
            return "/".to_string();
        }
        steps.iter().map(|s| format!("/{s}")).collect()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(key) => f.write_str(key),
            Step::Index { index, .. } => write!(f, "{index}"),
        }
    }
}

/// Errors raised when a path cannot address anything under the schema.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// No schema node exists at this path
    #[error("Path '{path}' is not declared in the schema")]
    Undeclared { path: String },

    /// A list component is not a non-negative integer
    #[error("Invalid list index '{component}' in path '{path}'")]
    InvalidIndex { path: String, component: String },

    /// The path continues below a scalar node
    #[error("Path '{path}' descends below a scalar")]
    ThroughScalar { path: String },

    /// Writing at a list index would pad the list with too many items
    #[error("Index {index} at '{path}' is too far past the end of a list of {len}")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// A tree node does not have the kind the path requires
    #[error("Type mismatch at '{path}': expected {expected}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

impl AddressError {
    /// Get the offending path
    pub fn path(&self) -> &str {
        match self {
            AddressError::Undeclared { path }
            | AddressError::InvalidIndex { path, .. }
            | AddressError::ThroughScalar { path }
            | AddressError::IndexOutOfRange { path, .. }
            | AddressError::TypeMismatch { path, .. } => path,
        }
    }

    /// Check if this error is related to type mismatches
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            AddressError::TypeMismatch { .. } | AddressError::ThroughScalar { .. }
        )
    }
}

impl From<AddressError> for crate::Error {
    fn from(err: AddressError) -> Self {
        crate::Error::Address(err)
    }
}

/// A path that has been validated against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    path: Path,
    steps: Vec<Step>,
    shape: Shape,
}

impl Address {
    pub(crate) fn new(path: Path, steps: Vec<Step>, shape: Shape) -> Self {
        Self { path, steps, shape }
    }

    /// The textual path this address was built from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The resolved steps, one per path component.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The schema shape of the addressed node.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns true if this addresses the root of a value.
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Outcome of resolving an address against a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// A value is stored at the address (it may still be empty)
    Found(&'a Value),
    /// Nothing is stored; `depth` is the number of steps that did resolve
    Absent { depth: usize },
}

impl<'a> Resolved<'a> {
    /// Returns the found value, if any.
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Resolved::Found(value) => Some(value),
            Resolved::Absent { .. } => None,
        }
    }
}

/// Resolves `address` inside `tree`.
///
/// An empty node on the way counts as absent rather than a mismatch, since
/// empty values conform to any schema shape.
pub fn resolve<'a>(tree: Option<&'a Value>, address: &Address) -> Result<Resolved<'a>, AddressError> {
    let Some(mut current) = tree else {
        return Ok(Resolved::Absent { depth: 0 });
    };

    for (depth, step) in address.steps.iter().enumerate() {
        let next = match (current, step) {
            (Value::Map(map), Step::Key(key)) => map.get(key),
            (Value::List(items), Step::Index { index, .. }) => items.get(*index),
            (node, _) if node.is_empty() => None,
            (node, step) => {
                return Err(AddressError::TypeMismatch {
                    path: Step::render(&address.steps[..depth]),
                    expected: step.container_name().to_string(),
                    actual: node.type_name().to_string(),
                });
            }
        };
        match next {
            Some(value) => current = value,
            None => return Ok(Resolved::Absent { depth }),
        }
    }

    Ok(Resolved::Found(current))
}

/// Returns the kind of the node stored at `address`, if any.
pub fn kind_at(tree: Option<&Value>, address: &Address) -> Result<Option<ValueKind>, AddressError> {
    Ok(resolve(tree, address)?.value().map(Value::kind))
}
