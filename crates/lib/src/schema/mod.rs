//! Structural schema shared by every element of a store.
//!
//! A [`Schema`] records which paths exist and what kind of node lives at each of
//! them. Values are checked against it before they are stored. A schema that is
//! not fully defined learns the shape of new values as they are checked; a fully
//! defined schema rejects anything it has not been told about.
//!
//! The schema also carries named rulesets that choose a [`MergeMethod`] per path
//! when defaults are merged into elements.
//!
//! # Examples
//!
//! ```
//! # use ensemble::schema::{Kind, Schema, Shape, ContainerKind};
//! # use ensemble::path::Path;
//! let schema = Schema::new();
//! schema.declare("/hosts", Kind::OrderedList).unwrap();
//! schema.declare("/hosts/*", Kind::Scalar).unwrap();
//! schema.set_fully_defined(true);
//!
//! assert!(schema.is_valid(&Path::from("/hosts/3")));
//! assert!(!schema.is_valid(&Path::from("/hosts/first")));
//! assert_eq!(
//!     schema.path_shape(&Path::from("/hosts")),
//!     Shape::Container(ContainerKind::OrderedList)
//! );
//! ```

use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard},
};

use tracing::debug;

use crate::{
    address::{Address, AddressError, Step},
    path::{Path, WILDCARD},
    value::Value,
};

mod config;
mod errors;
mod node;
mod ruleset;

pub use config::SchemaConfig;
pub use errors::SchemaError;
pub use node::Kind;
pub(crate) use node::Node;
pub use ruleset::{DEFAULT_RULESET, MergeMethod, Ruleset};

/// The container kinds a path can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Map,
    Hash,
    OrderedList,
    UnorderedList,
}

/// The schema's view of the node at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Container(ContainerKind),
    /// Not declared (yet)
    Unknown,
}

impl Shape {
    fn of(node: &Node) -> Self {
        match node {
            Node::Unknown => Shape::Unknown,
            Node::Scalar => Shape::Scalar,
            Node::Map(_) => Shape::Container(ContainerKind::Map),
            Node::Hash(_) => Shape::Container(ContainerKind::Hash),
            Node::List { ordered: true, .. } => Shape::Container(ContainerKind::OrderedList),
            Node::List { ordered: false, .. } => Shape::Container(ContainerKind::UnorderedList),
        }
    }

    /// Returns true for container shapes.
    pub fn is_container(&self) -> bool {
        matches!(self, Shape::Container(_))
    }
}

#[derive(Debug)]
pub(crate) struct SchemaInner {
    pub(crate) root: Node,
    pub(crate) fully_defined: bool,
    pub(crate) rulesets: BTreeMap<String, Ruleset>,
}

/// A shared, cloneable schema handle.
///
/// Clones refer to the same schema, so several stores can validate against one
/// instance.
#[derive(Debug, Clone)]
pub struct Schema {
    inner: Arc<RwLock<SchemaInner>>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// Creates an empty schema that learns structure from checked values.
    pub fn new() -> Self {
        let mut rulesets = BTreeMap::new();
        rulesets.insert(DEFAULT_RULESET.to_string(), Ruleset::new());
        Self {
            inner: Arc::new(RwLock::new(SchemaInner {
                root: Node::Unknown,
                fully_defined: false,
                rulesets,
            })),
        }
    }

    /// Builds a schema from its serializable description.
    pub fn from_config(config: &SchemaConfig) -> Result<Self, SchemaError> {
        let schema = Self::new();
        // Parents sort before their children, so declaration order is valid
        for (path, kind) in &config.paths {
            schema.declare(path, *kind)?;
        }
        for (name, methods) in &config.rulesets {
            schema.add_ruleset(name);
            for (path, method) in methods {
                schema.set_merge(name, path, *method)?;
            }
        }
        schema.set_fully_defined(config.fully_defined);
        Ok(schema)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, SchemaInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SchemaInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true if both handles refer to the same schema.
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Declares the node at `path` to be of `kind`.
    ///
    /// Named intermediate components are implied as maps. A `*` component
    /// requires its parent to already be a list or uniform map.
    pub fn declare(&self, path: impl Into<Path>, kind: Kind) -> Result<(), SchemaError> {
        let path = path.into();
        let mut inner = self.write();
        let mut root = inner.root.clone();
        declare_in(&mut root, &path, kind)?;
        inner.root = root;
        debug!(path = %path, kind = %kind, "Declared schema path");
        Ok(())
    }

    /// Sets whether unknown structure is rejected instead of learned.
    pub fn set_fully_defined(&self, fully_defined: bool) {
        self.write().fully_defined = fully_defined;
    }

    pub fn is_fully_defined(&self) -> bool {
        self.read().fully_defined
    }

    /// Adds an empty ruleset if none exists under `name`.
    pub fn add_ruleset(&self, name: &str) {
        self.write().rulesets.entry(name.to_string()).or_default();
    }

    pub fn has_ruleset(&self, name: &str) -> bool {
        self.read().rulesets.contains_key(name)
    }

    /// Names of all rulesets.
    pub fn rulesets(&self) -> Vec<String> {
        self.read().rulesets.keys().cloned().collect()
    }

    /// Sets the merge method for a declared schema path in `ruleset`, creating
    /// the ruleset if needed.
    ///
    /// `Merge` is rejected on scalars and unordered lists, which are only ever
    /// taken whole.
    pub fn set_merge(
        &self,
        ruleset: &str,
        path: impl Into<Path>,
        method: MergeMethod,
    ) -> Result<(), SchemaError> {
        let path = path.into();
        let mut inner = self.write();
        let node = match inner.root.at(&path) {
            Some(node) if !matches!(node, Node::Unknown) => node,
            _ => {
                return Err(SchemaError::UnknownPath {
                    ruleset: ruleset.to_string(),
                    path: path.to_string(),
                });
            }
        };
        if method == MergeMethod::Merge {
            let reason = match node {
                Node::Scalar => Some("scalars are taken whole"),
                Node::List { ordered: false, .. } => Some("unordered lists have no positions to merge"),
                _ => None,
            };
            if let Some(reason) = reason {
                return Err(SchemaError::InvalidMergeMethod {
                    path: path.to_string(),
                    method: method.to_string(),
                    reason: reason.to_string(),
                });
            }
        }
        debug!(ruleset, path = %path, method = %method, "Set merge method");
        inner
            .rulesets
            .entry(ruleset.to_string())
            .or_default()
            .set(path, method);
        Ok(())
    }

    /// Checks that `value` fits the schema.
    ///
    /// A schema that is not fully defined is extended with any new structure
    /// found in `value`. Either way a failed check leaves the schema unchanged.
    pub fn check(&self, value: &Value) -> Result<(), SchemaError> {
        self.check_all([value])
    }

    /// Checks several values as one unit: structure is only learned when
    /// every value fits.
    pub fn check_all<'a>(
        &self,
        values: impl IntoIterator<Item = &'a Value>,
    ) -> Result<(), SchemaError> {
        let mut inner = self.write();
        if inner.fully_defined {
            for value in values {
                node::conform(&inner.root, value, &Path::root())?;
            }
            return Ok(());
        }
        let mut root = inner.root.clone();
        for value in values {
            node::learn(&mut root, value, &Path::root())?;
        }
        inner.root = root;
        Ok(())
    }

    /// Validates `path` against the schema, deciding for each component whether
    /// it is a map key or a list index.
    ///
    /// When the schema is not fully defined, components below undeclared nodes
    /// are taken as map keys.
    pub fn address(&self, path: &Path) -> Result<Address, AddressError> {
        let inner = self.read();
        let mut node = Some(&inner.root);
        let mut steps = Vec::with_capacity(path.len());

        for component in path.components() {
            let current = match node {
                Some(current) => current,
                None => {
                    steps.push(Step::Key(component.to_string()));
                    continue;
                }
            };
            match current {
                Node::Scalar => {
                    return Err(AddressError::ThroughScalar {
                        path: path.to_string(),
                    });
                }
                Node::List { ordered, item } => {
                    let index = component.parse::<usize>().map_err(|_| {
                        AddressError::InvalidIndex {
                            path: path.to_string(),
                            component: component.to_string(),
                        }
                    })?;
                    steps.push(Step::Index {
                        index,
                        ordered: *ordered,
                    });
                    node = Some(&**item);
                }
                Node::Hash(item) => {
                    steps.push(Step::Key(component.to_string()));
                    node = Some(&**item);
                }
                Node::Map(fields) => {
                    steps.push(Step::Key(component.to_string()));
                    node = fields.get(component);
                    if node.is_none() && inner.fully_defined {
                        return Err(undeclared(&steps));
                    }
                }
                Node::Unknown => {
                    if inner.fully_defined {
                        steps.push(Step::Key(component.to_string()));
                        return Err(undeclared(&steps));
                    }
                    steps.push(Step::Key(component.to_string()));
                    node = None;
                }
            }
        }

        let shape = node.map(Shape::of).unwrap_or(Shape::Unknown);
        if inner.fully_defined && shape == Shape::Unknown && !steps.is_empty() {
            return Err(undeclared(&steps));
        }
        Ok(Address::new(path.clone(), steps, shape))
    }

    /// Returns true if [`Schema::address`] accepts `path`.
    pub fn is_valid(&self, path: &Path) -> bool {
        self.address(path).is_ok()
    }

    /// The schema's view of the node at `path`.
    pub fn path_shape(&self, path: &Path) -> Shape {
        self.address(path)
            .map(|address| address.shape())
            .unwrap_or(Shape::Unknown)
    }

    /// The declared kind at a schema path (using `*` for items), if any.
    pub fn kind_of(&self, schema_path: &Path) -> Option<Kind> {
        self.read().root.at(schema_path).and_then(Node::kind)
    }

    /// Converts an address into the schema path used for rulesets and
    /// declarations: list indices and uniform-map keys become `*`.
    pub fn schema_path(&self, address: &Address) -> Path {
        let inner = self.read();
        let mut node = Some(&inner.root);
        let mut path = Path::root();
        for step in address.steps() {
            let component = match step {
                Step::Index { .. } => WILDCARD,
                Step::Key(key) => node.map(|n| n.schema_component(key)).unwrap_or(key),
            };
            node = node.and_then(|n| match step {
                Step::Key(key) => n.child(key),
                Step::Index { .. } => n.item(),
            });
            path = path.push(component);
        }
        path
    }

    /// Exports the schema as a serializable description.
    pub fn to_config(&self) -> SchemaConfig {
        let inner = self.read();
        let mut paths = BTreeMap::new();
        collect_paths(&inner.root, Path::root(), &mut paths);
        let rulesets = inner
            .rulesets
            .iter()
            .map(|(name, ruleset)| {
                let methods = ruleset.iter().map(|(p, m)| (p.clone(), *m)).collect();
                (name.clone(), methods)
            })
            .collect();
        SchemaConfig {
            fully_defined: inner.fully_defined,
            paths,
            rulesets,
        }
    }
}

fn undeclared(steps: &[Step]) -> AddressError {
    AddressError::Undeclared {
        path: Step::render(steps),
    }
}

fn collect_paths(node: &Node, path: Path, out: &mut BTreeMap<Path, Kind>) {
    if let Some(kind) = node.kind() {
        out.insert(path.clone(), kind);
    }
    match node {
        Node::Map(fields) => {
            for (key, child) in fields {
                collect_paths(child, path.clone().push(key), out);
            }
        }
        Node::Hash(item) | Node::List { item, .. } => {
            collect_paths(item, path.push(WILDCARD), out);
        }
        _ => {}
    }
}

fn declare_in(root: &mut Node, path: &Path, kind: Kind) -> Result<(), SchemaError> {
    let mut node = root;
    let mut at = Path::root();
    for component in path.components() {
        at = at.push(component);
        if component == WILDCARD {
            node = match node {
                Node::Hash(item) | Node::List { item, .. } => &mut **item,
                _ => {
                    return Err(SchemaError::WildcardParent {
                        path: at.to_string(),
                    });
                }
            };
            continue;
        }
        if matches!(node, Node::Unknown) {
            *node = Node::Map(BTreeMap::new());
        }
        node = match node {
            Node::Map(fields) => fields.entry(component.to_string()).or_default(),
            other => {
                return Err(SchemaError::Conflict {
                    path: at.parent().unwrap_or_default().to_string(),
                    existing: other.describe(),
                    requested: Kind::Map.to_string(),
                });
            }
        };
    }

    match node.kind() {
        None => {
            *node = Node::from_kind(kind);
            Ok(())
        }
        Some(existing) if existing == kind => Ok(()),
        Some(existing) => Err(SchemaError::Conflict {
            path: path.to_string(),
            existing: existing.to_string(),
            requested: kind.to_string(),
        }),
    }
}
