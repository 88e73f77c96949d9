//! Nested values stored by elements.
//!
//! A [`Value`] is a scalar, an ordered sequence of values, or a map from string
//! keys to values. Values are plain owned trees: cloning produces an exclusive
//! deep copy and equality is structural.
//!
//! A location inside a value is in one of three states, and the distinction is
//! preserved everywhere:
//!
//! - **absent**: nothing stored (a missing map key, or `None` at element level)
//! - **empty**: present but carrying no data ([`Value::is_empty`])
//! - **populated**: anything else
//!
//! # Examples
//!
//! ```
//! # use ensemble::value::{Scalar, Value};
//! let text = Value::from("hello");
//! let number = Value::from(42);
//!
//! assert!(text == "hello");
//! assert!(number == 42);
//! assert!(!(text == 42));
//!
//! assert!(Value::null().is_empty());
//! assert!(Value::from("").is_empty());
//! assert!(Value::map().is_empty());
//! ```

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::address::{AddressError, Step};

mod conversions;

pub use conversions::ValueError;

/// A map node: keys are kept sorted.
pub type Map = BTreeMap<String, Value>;

/// Primitive leaf values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Null/empty value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Text string value
    Text(String),
}

impl Scalar {
    /// Returns true for `Null` and the empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Text(_) => "text",
        }
    }
}

impl PartialOrd for Scalar {
    /// Integers compare numerically, text lexicographically, booleans with
    /// `false < true`. Scalars of different kinds are incomparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => Some(Ordering::Equal),
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// The structural kind of a value node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar,
    List,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Scalar => "scalar",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        })
    }
}

/// A nested value: scalar, ordered sequence, or keyed map.
///
/// Serializes as natural JSON. Non-integral JSON numbers are not representable
/// and fail to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Leaf value
    Scalar(Scalar),
    /// Ordered collection of values
    List(Vec<Value>),
    /// Keyed collection of values
    Map(Map),
}

impl Default for Value {
    fn default() -> Self {
        Value::null()
    }
}

impl Value {
    /// The empty scalar.
    pub fn null() -> Self {
        Value::Scalar(Scalar::Null)
    }

    /// An empty map.
    pub fn map() -> Self {
        Value::Map(Map::new())
    }

    /// An empty list.
    pub fn list() -> Self {
        Value::List(Vec::new())
    }

    /// Returns the structural kind of this node.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Returns true if this value carries no data.
    ///
    /// `Null`, the empty string, and containers whose every child is empty are
    /// all empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Scalar(s) => s.is_empty(),
            Value::List(items) => items.iter().all(Value::is_empty),
            Value::Map(map) => map.values().all(Value::is_empty),
        }
    }

    /// Returns true if this value is populated (the opposite of [`Value::is_empty`]).
    pub fn is_populated(&self) -> bool {
        !self.is_empty()
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(s) => s.type_name(),
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Attempts to view as a scalar
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to convert to a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to convert to an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Scalar(Scalar::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to convert to a string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Attempts to view as a list
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Attempts to view as a mutable list
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Attempts to view as a map
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Attempts to view as a mutable map
    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Gets the subtree at `steps`, or `None` if any step is absent or does not
    /// match the node kind.
    pub fn get_at(&self, steps: &[Step]) -> Option<&Value> {
        let mut current = self;
        for step in steps {
            current = match (current, step) {
                (Value::Map(map), Step::Key(key)) => map.get(key)?,
                (Value::List(items), Step::Index { index, .. }) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Gets a mutable reference to the subtree at `steps`.
    pub fn get_at_mut(&mut self, steps: &[Step]) -> Option<&mut Value> {
        let mut current = self;
        for step in steps {
            current = match (current, step) {
                (Value::Map(map), Step::Key(key)) => map.get_mut(key)?,
                (Value::List(items), Step::Index { index, .. }) => items.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Returns the kind of the node at `steps`, if present.
    pub fn kind_at(&self, steps: &[Step]) -> Option<ValueKind> {
        self.get_at(steps).map(Value::kind)
    }

    /// Replaces the subtree at `steps`, returning the previous subtree if any.
    ///
    /// Intermediate containers are created as needed. An empty node on the way is
    /// replaced by a container of the kind the next step requires; a populated
    /// node of the wrong kind is an [`AddressError::TypeMismatch`]. Lists are
    /// padded with `Null` when the index is past the end.
    pub fn set_at(&mut self, steps: &[Step], value: Value) -> Result<Option<Value>, AddressError> {
        let Some((last, parents)) = steps.split_last() else {
            return Ok(Some(std::mem::replace(self, value)));
        };

        let mut current = self;
        for (depth, step) in parents.iter().enumerate() {
            current = descend_or_create(current, step, &steps[..depth])?;
        }

        prepare_container(current, last, parents)?;
        match (current, last) {
            (Value::Map(map), Step::Key(key)) => Ok(map.insert(key.clone(), value)),
            (Value::List(items), Step::Index { index, .. }) => {
                pad_list(items, *index, || Step::render(steps))?;
                Ok(Some(std::mem::replace(&mut items[*index], value)))
            }
            // prepare_container guarantees the node kind matches the step
            _ => Ok(None),
        }
    }

    /// Erases the subtree at `steps`, returning it if it was present.
    ///
    /// Parents left empty by the erase are collapsed: map keys are removed,
    /// ordered-list items become `Null` so later positions keep their index,
    /// and unordered-list items are removed. The root itself is never removed;
    /// erasing with no steps resets it to `Null`.
    pub fn erase_at(&mut self, steps: &[Step]) -> Option<Value> {
        let Some((first, rest)) = steps.split_first() else {
            return Some(std::mem::replace(self, Value::null()));
        };

        let removed = if rest.is_empty() {
            remove_child(self, first)?
        } else {
            let child = self.get_at_mut(std::slice::from_ref(first))?;
            let removed = child.erase_at(rest)?;
            if child.is_empty() {
                remove_child(self, first);
            }
            removed
        };
        Some(removed)
    }
}

/// Most `Null` items a single write may pad a list with.
pub const MAX_LIST_PADDING: usize = 1 << 16;

/// Extends `items` with `Null` so that `index` is in range.
fn pad_list(
    items: &mut Vec<Value>,
    index: usize,
    path: impl FnOnce() -> String,
) -> Result<(), AddressError> {
    let len = items.len();
    if index < len {
        return Ok(());
    }
    if index - len >= MAX_LIST_PADDING {
        return Err(AddressError::IndexOutOfRange {
            path: path(),
            index,
            len,
        });
    }
    items.resize(index + 1, Value::null());
    Ok(())
}

/// Removes a direct child, keeping ordered-list positions stable.
fn remove_child(parent: &mut Value, step: &Step) -> Option<Value> {
    match (parent, step) {
        (Value::Map(map), Step::Key(key)) => map.remove(key),
        (Value::List(items), Step::Index { index, ordered }) => {
            if *index >= items.len() {
                return None;
            }
            if *ordered {
                Some(std::mem::replace(&mut items[*index], Value::null()))
            } else {
                Some(items.remove(*index))
            }
        }
        _ => None,
    }
}

/// Makes sure `node` is a container suited to `step`, replacing it if empty.
fn prepare_container(node: &mut Value, step: &Step, at: &[Step]) -> Result<(), AddressError> {
    let matches = matches!(
        (&*node, step),
        (Value::Map(_), Step::Key(_)) | (Value::List(_), Step::Index { .. })
    );
    if matches {
        return Ok(());
    }
    if node.is_empty() {
        *node = match step {
            Step::Key(_) => Value::map(),
            Step::Index { .. } => Value::list(),
        };
        return Ok(());
    }
    Err(AddressError::TypeMismatch {
        path: Step::render(at),
        expected: step.container_name().to_string(),
        actual: node.type_name().to_string(),
    })
}

fn descend_or_create<'a>(
    node: &'a mut Value,
    step: &Step,
    at: &[Step],
) -> Result<&'a mut Value, AddressError> {
    prepare_container(node, step, at)?;
    match (node, step) {
        (Value::Map(map), Step::Key(key)) => Ok(map.entry(key.clone()).or_insert_with(Value::null)),
        (Value::List(items), Step::Index { index, .. }) => {
            pad_list(items, *index, || format!("{}/{step}", Step::render(at).trim_end_matches('/')))?;
            Ok(&mut items[*index])
        }
        (node, _) => Err(AddressError::TypeMismatch {
            path: Step::render(at),
            expected: step.container_name().to_string(),
            actual: node.type_name().to_string(),
        }),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
