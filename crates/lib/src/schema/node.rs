//! The schema tree and the two walks over it: conformance and learning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SchemaError;
use crate::{
    path::{Component, Path, WILDCARD},
    value::Value,
};

/// Declarable node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// A leaf value
    Scalar,
    /// A map with individually declared keys
    Map,
    /// A uniform map: arbitrary keys, one schema for every value (`*`)
    Hash,
    /// A list whose positions are meaningful
    OrderedList,
    /// A list whose positions carry no meaning
    UnorderedList,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Kind::Scalar => "scalar",
            Kind::Map => "map",
            Kind::Hash => "uniform map",
            Kind::OrderedList => "ordered list",
            Kind::UnorderedList => "unordered list",
        })
    }
}

/// A node of the schema tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum Node {
    /// Not yet determined
    #[default]
    Unknown,
    Scalar,
    Map(BTreeMap<String, Node>),
    Hash(Box<Node>),
    List { ordered: bool, item: Box<Node> },
}

impl Node {
    pub(crate) fn from_kind(kind: Kind) -> Self {
        match kind {
            Kind::Scalar => Node::Scalar,
            Kind::Map => Node::Map(BTreeMap::new()),
            Kind::Hash => Node::Hash(Box::default()),
            Kind::OrderedList => Node::List {
                ordered: true,
                item: Box::default(),
            },
            Kind::UnorderedList => Node::List {
                ordered: false,
                item: Box::default(),
            },
        }
    }

    pub(crate) fn kind(&self) -> Option<Kind> {
        match self {
            Node::Unknown => None,
            Node::Scalar => Some(Kind::Scalar),
            Node::Map(_) => Some(Kind::Map),
            Node::Hash(_) => Some(Kind::Hash),
            Node::List { ordered: true, .. } => Some(Kind::OrderedList),
            Node::List { ordered: false, .. } => Some(Kind::UnorderedList),
        }
    }

    pub(crate) fn describe(&self) -> String {
        self.kind()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "undeclared".to_string())
    }

    /// The schema of the value stored under `key`, if this node has keys.
    pub(crate) fn child(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(fields) => fields.get(key),
            Node::Hash(item) => Some(&**item),
            _ => None,
        }
    }

    /// The item schema, if this node is a list.
    pub(crate) fn item(&self) -> Option<&Node> {
        match self {
            Node::List { item, .. } => Some(&**item),
            _ => None,
        }
    }

    /// The component used for `key` in schema paths below this node.
    pub(crate) fn schema_component<'a>(&self, key: &'a str) -> &'a str {
        match self {
            Node::Hash(_) | Node::List { .. } => WILDCARD,
            _ => key,
        }
    }

    /// Follows a schema path (using `*` for items and uniform keys).
    pub(crate) fn at(&self, path: &Path) -> Option<&Node> {
        let mut node = self;
        for component in path.components() {
            node = match node {
                Node::Map(fields) => fields.get(component)?,
                Node::Hash(item) | Node::List { item, .. } if component == WILDCARD => &**item,
                _ => return None,
            };
        }
        Some(node)
    }
}

fn validate_key(key: &str, path: &Path) -> Result<(), SchemaError> {
    match Component::new(key) {
        Ok(_) => Ok(()),
        Err(_) => Err(SchemaError::InvalidKey {
            path: path.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Checks `value` against `node` without changing the schema.
pub(crate) fn conform(node: &Node, value: &Value, path: &Path) -> Result<(), SchemaError> {
    if value.is_empty() {
        return Ok(());
    }

    match (node, value) {
        (Node::Scalar, Value::Scalar(_)) => Ok(()),
        (Node::Map(fields), Value::Map(map)) => {
            for (key, child) in map {
                validate_key(key, path)?;
                let child_path = path.clone().push(key);
                match fields.get(key) {
                    Some(child_node) => conform(child_node, child, &child_path)?,
                    None if child.is_empty() => {}
                    None => {
                        return Err(SchemaError::Undeclared {
                            path: child_path.to_string(),
                        });
                    }
                }
            }
            Ok(())
        }
        (Node::Hash(item), Value::Map(map)) => {
            for (key, child) in map {
                validate_key(key, path)?;
                conform(item, child, &path.clone().push(key))?;
            }
            Ok(())
        }
        (Node::List { item, .. }, Value::List(items)) => {
            for (index, child) in items.iter().enumerate() {
                conform(item, child, &path.clone().push(index.to_string()))?;
            }
            Ok(())
        }
        (Node::Unknown, _) => Err(SchemaError::Undeclared {
            path: path.to_string(),
        }),
        (node, value) => Err(SchemaError::Mismatch {
            path: path.to_string(),
            expected: node.describe(),
            found: value.type_name().to_string(),
        }),
    }
}

/// Checks `value` against `node`, extending undetermined parts of the schema
/// with the shape of the value. Learned lists are unordered.
pub(crate) fn learn(node: &mut Node, value: &Value, path: &Path) -> Result<(), SchemaError> {
    if matches!(node, Node::Unknown) {
        match value {
            Value::Scalar(s) if s.is_empty() => return Ok(()),
            Value::Scalar(_) => *node = Node::Scalar,
            Value::Map(_) => *node = Node::Map(BTreeMap::new()),
            Value::List(_) => *node = Node::from_kind(Kind::UnorderedList),
        }
    } else if value.is_empty() {
        return Ok(());
    }

    match (node, value) {
        (Node::Scalar, Value::Scalar(_)) => Ok(()),
        (Node::Map(fields), Value::Map(map)) => {
            for (key, child) in map {
                validate_key(key, path)?;
                let child_node = fields.entry(key.clone()).or_default();
                learn(child_node, child, &path.clone().push(key))?;
            }
            Ok(())
        }
        (Node::Hash(item), Value::Map(map)) => {
            for (key, child) in map {
                validate_key(key, path)?;
                learn(item, child, &path.clone().push(key))?;
            }
            Ok(())
        }
        (Node::List { item, .. }, Value::List(items)) => {
            for (index, child) in items.iter().enumerate() {
                learn(item, child, &path.clone().push(index.to_string()))?;
            }
            Ok(())
        }
        (node, value) => Err(SchemaError::Mismatch {
            path: path.to_string(),
            expected: node.describe(),
            found: value.type_name().to_string(),
        }),
    }
}
