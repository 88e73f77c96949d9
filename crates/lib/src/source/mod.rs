//! Loading and saving store contents.
//!
//! A [`Source`] produces the raw elements a store starts from and persists the
//! raw state a store hands back through [`Store::snapshot`](crate::store::Store::snapshot).
//! Only raw values cross this boundary; effective values are always recomputed
//! from them and the declared defaults.
//!
//! Two implementations are provided:
//! - [`JsonFile`]: a JSON document on disk
//! - [`InMemory`]: fixed contents held in memory, recording every save

use std::collections::BTreeMap;

use crate::{store::StoreKind, value::Value};

mod errors;
mod json;
mod memory;

pub use errors::SourceError;
pub use json::JsonFile;
pub use memory::InMemory;

/// Raw elements in store order. `None` marks an absent element (a placeholder
/// in list stores).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elements {
    /// Elements of a map store, by name
    Named(BTreeMap<String, Option<Value>>),
    /// Elements of a list store, by position
    Positional(Vec<Option<Value>>),
}

impl Elements {
    pub fn len(&self) -> usize {
        match self {
            Elements::Named(map) => map.len(),
            Elements::Positional(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The raw contents of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub kind: StoreKind,
    pub elements: Elements,
}

impl Snapshot {
    /// An empty snapshot for a store of `kind`.
    pub fn empty(kind: StoreKind) -> Self {
        let elements = match kind {
            StoreKind::Map => Elements::Named(BTreeMap::new()),
            StoreKind::OrderedList | StoreKind::UnorderedList => Elements::Positional(Vec::new()),
        };
        Self { kind, elements }
    }
}

/// What a source produces on load.
pub type Loaded = Snapshot;

/// Storage for raw store contents.
pub trait Source {
    /// Reads the stored contents.
    fn load(&self) -> Result<Loaded, SourceError>;

    /// Replaces the stored contents with `snapshot`.
    fn save(&self, snapshot: &Snapshot) -> Result<(), SourceError>;
}
