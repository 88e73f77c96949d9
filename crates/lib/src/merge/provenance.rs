//! Where each part of an effective value came from.

use std::collections::BTreeMap;

use crate::{address::Step, value::Value};

/// The source of a node in an effective value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Authored in the element itself
    Raw,
    /// Filled in by the default rule with this declaration index
    Default { rule: usize },
}

impl Origin {
    pub fn is_default(&self) -> bool {
        matches!(self, Origin::Default { .. })
    }
}

/// A provenance tree shadowing an effective value.
///
/// Children are recorded only where they differ from their parent; any node
/// without an entry shares its parent's origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    origin: Origin,
    keys: BTreeMap<String, Provenance>,
    items: BTreeMap<usize, Provenance>,
}

impl Provenance {
    pub(crate) fn new(origin: Origin) -> Self {
        Self {
            origin,
            keys: BTreeMap::new(),
            items: BTreeMap::new(),
        }
    }

    /// Origin of this node.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Origin of the node reached by following `steps`.
    pub fn origin_at(&self, steps: &[Step]) -> Origin {
        let mut current = self;
        for step in steps {
            let next = match step {
                Step::Key(key) => current.keys.get(key),
                Step::Index { index, .. } => current.items.get(index),
            };
            match next {
                Some(child) => current = child,
                None => break,
            }
        }
        current.origin
    }

    pub(crate) fn key_mut(&mut self, key: &str) -> &mut Provenance {
        let origin = self.origin;
        self.keys
            .entry(key.to_string())
            .or_insert_with(|| Provenance::new(origin))
    }

    pub(crate) fn item_mut(&mut self, index: usize) -> &mut Provenance {
        let origin = self.origin;
        self.items
            .entry(index)
            .or_insert_with(|| Provenance::new(origin))
    }

    pub(crate) fn forget_key(&mut self, key: &str) {
        self.keys.remove(key);
    }

    pub(crate) fn forget_item(&mut self, index: usize) {
        self.items.remove(&index);
    }

    /// Drops child entries that carry no information of their own.
    pub(crate) fn prune(&mut self) {
        let origin = self.origin;
        let redundant = |p: &mut Provenance| {
            p.prune();
            p.origin == origin && p.keys.is_empty() && p.items.is_empty()
        };
        self.keys.retain(|_, p| !redundant(p));
        self.items.retain(|_, p| !redundant(p));
    }
}

/// An element's effective value together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effective {
    pub(crate) value: Option<Value>,
    pub(crate) provenance: Provenance,
}

impl Effective {
    /// An effective value that is exactly the raw value.
    pub(crate) fn from_raw(raw: Option<Value>) -> Self {
        Self {
            value: raw,
            provenance: Provenance::new(Origin::Raw),
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }
}
