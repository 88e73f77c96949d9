//! The element store: a keyed or positional collection of value trees that
//! share one schema.
//!
//! Every element holds a raw value (what was authored) and an effective value
//! (the raw value with the store's defaults merged in). Effective values are
//! recomputed eagerly whenever something they depend on changes, so reads never
//! see a stale merge.
//!
//! A store comes in one of three kinds, fixed at construction:
//!
//! - [`StoreKind::Map`]: elements are named. Defaults are named elements that
//!   stay in place but are hidden from enumeration.
//! - [`StoreKind::OrderedList`]: positions carry meaning. Deleting leaves an
//!   empty placeholder so later elements keep their index.
//! - [`StoreKind::UnorderedList`]: positions carry no meaning. Only the last
//!   element may be deleted, so earlier indices never shift underneath a caller.
//!
//! Stores are built with a [`StoreBuilder`], which is also the only place
//! default rules can be declared.
//!
//! # Examples
//!
//! ```
//! # use ensemble::store::{ElementKey, StoreBuilder, StoreKind, View};
//! # use ensemble::merge::Condition;
//! # use ensemble::path::Path;
//! # use ensemble::Value;
//! # fn main() -> ensemble::Result<()> {
//! let mut builder = StoreBuilder::new(StoreKind::Map);
//! builder.element("base", Value::from_iter([("port".to_string(), 80)]))?;
//! builder.element("web", Value::from_iter([("host".to_string(), "example.org")]))?;
//! builder.declare_default(Some("base"), None, Vec::<Condition>::new())?;
//! let store = builder.build();
//!
//! assert_eq!(store.list(false), vec![ElementKey::from("web")]);
//! let port = store.value(&ElementKey::from("web"), &Path::from("/port"), View::Effective)?;
//! assert_eq!(port, &Value::from(80));
//! assert!(store.is_default_value(&ElementKey::from("web"), &Path::from("/port"))?);
//! # Ok(())
//! # }
//! ```

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Result,
    address::Address,
    merge::{Applied, DefaultRule, DefaultSource, Effective, merge_element},
    path::Path,
    schema::Schema,
    source::{Elements, Snapshot},
    value::{MAX_LIST_PADDING, Value},
};

mod builder;
mod errors;
mod query;

pub use builder::{StoreBuilder, StoreOptions};
pub use errors::StoreError;

/// The collection layout of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Elements addressed by name
    #[default]
    Map,
    /// Elements addressed by meaningful position
    OrderedList,
    /// Elements addressed by incidental position
    UnorderedList,
}

impl StoreKind {
    pub fn is_list(&self) -> bool {
        !matches!(self, StoreKind::Map)
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreKind::Map => "map",
            StoreKind::OrderedList => "ordered list",
            StoreKind::UnorderedList => "unordered list",
        })
    }
}

/// Identifies an element: by name in map stores, by position in list stores.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementKey {
    Name(String),
    Index(usize),
}

impl ElementKey {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            ElementKey::Name(name) => Some(name),
            ElementKey::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            ElementKey::Index(index) => Some(*index),
            ElementKey::Name(_) => None,
        }
    }

    /// Interprets textual input for a store of `kind`: list stores parse an
    /// index, map stores take the text as a name.
    pub fn parse_for(kind: StoreKind, text: &str) -> Option<Self> {
        if kind.is_list() {
            text.parse().ok().map(ElementKey::Index)
        } else {
            Some(ElementKey::Name(text.to_string()))
        }
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKey::Name(name) => f.write_str(name),
            ElementKey::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for ElementKey {
    fn from(name: &str) -> Self {
        ElementKey::Name(name.to_string())
    }
}

impl From<String> for ElementKey {
    fn from(name: String) -> Self {
        ElementKey::Name(name)
    }
}

impl From<usize> for ElementKey {
    fn from(index: usize) -> Self {
        ElementKey::Index(index)
    }
}

/// Which of an element's two trees a query reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum View {
    /// The authored value only
    Raw,
    /// The authored value with defaults merged in
    #[default]
    Effective,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) raw: Option<Value>,
    pub(crate) effective: Effective,
    pub(crate) is_default: bool,
}

impl Element {
    pub(crate) fn new(raw: Option<Value>) -> Self {
        Self {
            effective: Effective::from_raw(raw.clone()),
            raw,
            is_default: false,
        }
    }

    /// Returns true if the element has no raw data.
    pub(crate) fn is_empty(&self) -> bool {
        self.raw.as_ref().is_none_or(Value::is_empty)
    }

    pub(crate) fn tree(&self, view: View) -> Option<&Value> {
        match view {
            View::Raw => self.raw.as_ref(),
            View::Effective => self.effective.value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slots {
    Map(BTreeMap<String, Element>),
    List(Vec<Element>),
}

impl Slots {
    pub(crate) fn new(kind: StoreKind) -> Self {
        match kind {
            StoreKind::Map => Slots::Map(BTreeMap::new()),
            StoreKind::OrderedList | StoreKind::UnorderedList => Slots::List(Vec::new()),
        }
    }

    pub(crate) fn get(&self, key: &ElementKey) -> Option<&Element> {
        match (self, key) {
            (Slots::Map(map), ElementKey::Name(name)) => map.get(name),
            (Slots::List(list), ElementKey::Index(index)) => list.get(*index),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, key: &ElementKey) -> Option<&mut Element> {
        match (self, key) {
            (Slots::Map(map), ElementKey::Name(name)) => map.get_mut(name),
            (Slots::List(list), ElementKey::Index(index)) => list.get_mut(*index),
            _ => None,
        }
    }

    pub(crate) fn iter(&self) -> Box<dyn Iterator<Item = (ElementKey, &Element)> + '_> {
        match self {
            Slots::Map(map) => Box::new(
                map.iter()
                    .map(|(name, element)| (ElementKey::Name(name.clone()), element)),
            ),
            Slots::List(list) => Box::new(
                list.iter()
                    .enumerate()
                    .map(|(index, element)| (ElementKey::Index(index), element)),
            ),
        }
    }

    pub(crate) fn values_mut(&mut self) -> Box<dyn Iterator<Item = &mut Element> + '_> {
        match self {
            Slots::Map(map) => Box::new(map.values_mut()),
            Slots::List(list) => Box::new(list.iter_mut()),
        }
    }
}

/// Pairs each rule with the default value it supplies.
pub(crate) fn applied_rules<'a>(rules: &'a [DefaultRule], slots: &'a Slots) -> Vec<Applied<'a>> {
    rules
        .iter()
        .enumerate()
        .filter_map(|(index, rule)| {
            let value = match &rule.source {
                DefaultSource::Consumed(value) => Some(value),
                DefaultSource::Element(name) => slots
                    .get(&ElementKey::Name(name.clone()))
                    .and_then(|element| element.raw.as_ref()),
            }?;
            Some(Applied { index, rule, value })
        })
        .collect()
}

/// A collection of elements sharing one schema, with defaults applied.
///
/// Cloning a store produces an independent snapshot that still shares the
/// schema handle.
#[derive(Debug, Clone)]
pub struct Store {
    kind: StoreKind,
    schema: Schema,
    slots: Slots,
    rules: Vec<DefaultRule>,
}

impl Store {
    pub(crate) fn from_parts(
        kind: StoreKind,
        schema: Schema,
        slots: Slots,
        rules: Vec<DefaultRule>,
    ) -> Self {
        let mut store = Self {
            kind,
            schema,
            slots,
            rules,
        };
        store.recompute_all();
        store
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The declared default rules, in application order.
    pub fn rules(&self) -> &[DefaultRule] {
        &self.rules
    }

    /// Number of slots, including default elements and placeholders.
    pub fn len(&self) -> usize {
        match &self.slots {
            Slots::Map(map) => map.len(),
            Slots::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recomputes every effective value.
    fn recompute_all(&mut self) {
        let schema = self.schema.read();
        let applied = applied_rules(&self.rules, &self.slots);
        let computed: Vec<Effective> = self
            .slots
            .iter()
            .map(|(_, element)| {
                if element.is_default {
                    Effective::from_raw(element.raw.clone())
                } else {
                    merge_element(element.raw.as_ref(), &applied, &schema)
                }
            })
            .collect();
        drop(applied);
        for (element, effective) in self.slots.values_mut().zip(computed) {
            element.effective = effective;
        }
        debug!(elements = self.len(), rules = self.rules.len(), "Recomputed effective values");
    }

    /// Recomputes what depends on the element at `key`: just the element, or
    /// everything if it backs a default.
    fn recompute(&mut self, key: &ElementKey) {
        let is_default = self.slots.get(key).is_some_and(|e| e.is_default);
        if is_default {
            self.recompute_all();
            return;
        }
        let schema = self.schema.read();
        let applied = applied_rules(&self.rules, &self.slots);
        let Some(raw) = self.slots.get(key).map(|e| e.raw.as_ref()) else {
            return;
        };
        let effective = merge_element(raw, &applied, &schema);
        drop(applied);
        if let Some(element) = self.slots.get_mut(key) {
            element.effective = effective;
        }
    }

    fn check_key_kind(&self, key: &ElementKey) -> Result<()> {
        let fits = matches!(
            (&self.slots, key),
            (Slots::Map(_), ElementKey::Name(_)) | (Slots::List(_), ElementKey::Index(_))
        );
        if fits {
            Ok(())
        } else {
            Err(StoreError::WrongKeyKind {
                key: key.clone(),
                kind: self.kind,
            }
            .into())
        }
    }

    pub(crate) fn element(&self, key: &ElementKey) -> Result<&Element> {
        self.check_key_kind(key)?;
        self.slots
            .get(key)
            .ok_or_else(|| StoreError::NotFound { key: key.clone() }.into())
    }

    /// Keys of all ordinary elements, in store order. Default elements are never
    /// listed; empty elements and placeholders only with `include_empty`.
    pub fn list(&self, include_empty: bool) -> Vec<ElementKey> {
        self.slots
            .iter()
            .filter(|(_, element)| !element.is_default && (include_empty || !element.is_empty()))
            .map(|(key, _)| key)
            .collect()
    }

    /// Returns true if `key` names an ordinary element (and, unless
    /// `include_empty`, a populated one).
    pub fn exists(&self, key: &ElementKey, include_empty: bool) -> bool {
        self.slots
            .get(key)
            .is_some_and(|e| !e.is_default && (include_empty || !e.is_empty()))
    }

    /// Returns true if `key` names a default element.
    pub fn is_default_element(&self, key: &ElementKey) -> bool {
        self.slots.get(key).is_some_and(|e| e.is_default)
    }

    /// The raw value of an element; `None` for a placeholder or absent element.
    pub fn get_raw(&self, key: &ElementKey) -> Result<Option<&Value>> {
        Ok(self.element(key)?.raw.as_ref())
    }

    /// The effective value of an element.
    pub fn get_effective(&self, key: &ElementKey) -> Result<Option<&Value>> {
        Ok(self.element(key)?.effective.value())
    }

    /// The effective value of an element together with its provenance.
    pub fn effective(&self, key: &ElementKey) -> Result<&Effective> {
        Ok(&self.element(key)?.effective)
    }

    /// Adds an element and returns the key it was stored under.
    ///
    /// - Map stores require `key`. Its slot must be absent or empty unless
    ///   `allow_overwrite` is set.
    /// - Unordered lists append, or insert before the existing element at `key`.
    /// - Ordered lists append, fill an empty placeholder at `key`, extend with
    ///   placeholders up to a `key` past the end, or insert before an occupied
    ///   `key`.
    ///
    /// `value` is checked against the schema first; nothing changes on failure.
    pub fn add(
        &mut self,
        key: Option<ElementKey>,
        value: Value,
        allow_overwrite: bool,
    ) -> Result<ElementKey> {
        if let Some(key) = &key {
            self.check_key_kind(key)?;
        }
        let placement = self.placement(key, allow_overwrite)?;
        self.schema.check(&value)?;

        let element = Element::new(Some(value));
        let mut padded = 0..0;
        let key = match (&mut self.slots, placement) {
            (Slots::Map(map), Placement::Named(name)) => {
                map.insert(name.clone(), element);
                ElementKey::Name(name)
            }
            (Slots::List(list), Placement::Append) => {
                list.push(element);
                ElementKey::Index(list.len() - 1)
            }
            (Slots::List(list), Placement::Fill(index)) => {
                list[index] = element;
                ElementKey::Index(index)
            }
            (Slots::List(list), Placement::Insert(index)) => {
                list.insert(index, element);
                ElementKey::Index(index)
            }
            (Slots::List(list), Placement::Extend(index)) => {
                padded = list.len()..index;
                list.resize_with(index, || Element::new(None));
                list.push(element);
                ElementKey::Index(index)
            }
            (_, _) => return Err(StoreError::KeyRequired.into()),
        };
        debug!(key = %key, kind = %self.kind, "Added element");
        // New placeholders still show the defaults
        for index in padded {
            self.recompute(&ElementKey::Index(index));
        }
        self.recompute(&key);
        Ok(key)
    }

    /// Decides where `add` puts a new element, without changing anything.
    fn placement(&self, key: Option<ElementKey>, allow_overwrite: bool) -> Result<Placement> {
        match (&self.slots, key) {
            (Slots::Map(_), None) => Err(StoreError::KeyRequired.into()),
            (Slots::Map(map), Some(ElementKey::Name(name))) => match map.get(&name) {
                Some(existing) if existing.is_default => Err(StoreError::ElementIsDefault {
                    key: ElementKey::Name(name),
                }
                .into()),
                Some(existing) if !existing.is_empty() && !allow_overwrite => {
                    Err(StoreError::AlreadyExists {
                        key: ElementKey::Name(name),
                    }
                    .into())
                }
                _ => Ok(Placement::Named(name)),
            },
            (Slots::List(_), None) => Ok(Placement::Append),
            (Slots::List(list), Some(ElementKey::Index(index))) => match self.kind {
                StoreKind::UnorderedList if index < list.len() => Ok(Placement::Insert(index)),
                StoreKind::UnorderedList => Err(StoreError::InvalidPosition {
                    key: ElementKey::Index(index),
                    reason: format!("unordered lists insert before an existing element (0..{})", list.len()),
                }
                .into()),
                _ if index >= list.len() && index - list.len() >= MAX_LIST_PADDING => {
                    Err(StoreError::InvalidPosition {
                        key: ElementKey::Index(index),
                        reason: format!(
                            "more than {MAX_LIST_PADDING} placeholders past the end ({})",
                            list.len()
                        ),
                    }
                    .into())
                }
                _ if index >= list.len() => Ok(Placement::Extend(index)),
                _ if list[index].is_empty() => Ok(Placement::Fill(index)),
                _ => Ok(Placement::Insert(index)),
            },
            (_, Some(key)) => Err(StoreError::WrongKeyKind {
                key,
                kind: self.kind,
            }
            .into()),
        }
    }

    /// Replaces the raw subtree at `path` of a populated element, returning the
    /// previous subtree. The resulting raw value is checked against the schema.
    ///
    /// Empty elements and placeholders are filled with [`Store::add`] instead.
    pub fn update(&mut self, key: &ElementKey, path: &Path, value: Value) -> Result<Option<Value>> {
        let address = self.schema.address(path)?;
        let element = self.element(key)?;
        let Some(raw) = element.raw.as_ref().filter(|raw| raw.is_populated()) else {
            return Err(StoreError::ElementIsEmpty { key: key.clone() }.into());
        };

        let mut candidate = raw.clone();
        let previous = candidate.set_at(address.steps(), value)?;
        if element.is_default && candidate.is_empty() {
            return Err(StoreError::DefaultWouldBeEmpty { key: key.clone() }.into());
        }
        self.schema.check(&candidate)?;

        self.commit_raw(key, candidate);
        debug!(key = %key, path = %path, "Updated element");
        Ok(previous)
    }

    /// Erases the raw subtree at `path`, returning it if something was stored.
    /// Containers left empty are collapsed.
    pub fn erase(&mut self, key: &ElementKey, path: &Path) -> Result<Option<Value>> {
        let address = self.schema.address(path)?;
        let element = self.element(key)?;
        let Some(raw) = element.raw.as_ref() else {
            return Ok(None);
        };

        let mut candidate = raw.clone();
        let Some(removed) = candidate.erase_at(address.steps()) else {
            return Ok(None);
        };
        if element.is_default && candidate.is_empty() {
            return Err(StoreError::DefaultWouldBeEmpty { key: key.clone() }.into());
        }

        self.commit_raw(key, candidate);
        debug!(key = %key, path = %path, "Erased subtree");
        Ok(Some(removed))
    }

    fn commit_raw(&mut self, key: &ElementKey, raw: Value) {
        if let Some(element) = self.slots.get_mut(key) {
            element.raw = Some(raw);
        }
        self.recompute(key);
    }

    /// Deletes an element.
    ///
    /// Map stores remove the key; ordered lists leave a placeholder; unordered
    /// lists only allow deleting an element with nothing populated after it.
    /// Empty slots trailing the deleted element go with it.
    pub fn delete(&mut self, key: &ElementKey) -> Result<()> {
        let element = self.element(key)?;
        if element.is_default {
            return Err(StoreError::ElementIsDefault { key: key.clone() }.into());
        }

        let kind = self.kind;
        match (&mut self.slots, key) {
            (Slots::Map(map), ElementKey::Name(name)) => {
                map.remove(name);
            }
            (Slots::List(list), ElementKey::Index(index)) => match kind {
                StoreKind::UnorderedList => {
                    if let Some(last) = list.iter().rposition(|e| !e.is_empty()) {
                        if *index < last {
                            return Err(StoreError::NotLastElement {
                                key: key.clone(),
                                last,
                            }
                            .into());
                        }
                    }
                    list.truncate(*index);
                }
                _ => {
                    list[*index] = Element::new(None);
                }
            },
            _ => {}
        }
        debug!(key = %key, kind = %kind, "Deleted element");
        if kind == StoreKind::OrderedList {
            self.recompute(key);
        }
        Ok(())
    }

    /// Renames an element of a map store. Renaming a default element keeps its
    /// rule pointing at it.
    pub fn rename(&mut self, key: &ElementKey, new_key: &ElementKey) -> Result<()> {
        if self.kind.is_list() {
            return Err(StoreError::UnsupportedInMode {
                operation: "rename",
                kind: self.kind,
            }
            .into());
        }
        self.element(key)?;
        self.check_key_kind(new_key)?;
        if key == new_key {
            return Ok(());
        }
        if let Some(existing) = self.slots.get(new_key) {
            if existing.is_default {
                return Err(StoreError::ElementIsDefault {
                    key: new_key.clone(),
                }
                .into());
            }
            if !existing.is_empty() {
                return Err(StoreError::AlreadyExists {
                    key: new_key.clone(),
                }
                .into());
            }
        }

        let (Slots::Map(map), ElementKey::Name(old), ElementKey::Name(new)) =
            (&mut self.slots, key, new_key)
        else {
            return Ok(());
        };
        let Some(element) = map.remove(old) else {
            return Ok(());
        };
        let was_default = element.is_default;
        map.insert(new.clone(), element);
        if was_default {
            for rule in &mut self.rules {
                if rule.source == DefaultSource::Element(old.clone()) {
                    rule.source = DefaultSource::Element(new.clone());
                }
            }
        }
        debug!(from = %old, to = %new, "Renamed element");
        Ok(())
    }

    /// Adds a copy of an element's raw value, placed as [`Store::add`] would.
    pub fn copy(&mut self, key: &ElementKey, new_key: Option<ElementKey>) -> Result<ElementKey> {
        let Some(raw) = self.element(key)?.raw.clone() else {
            return Err(StoreError::ElementIsEmpty { key: key.clone() }.into());
        };
        self.add(new_key, raw, false)
    }

    /// The raw state of the store, ready to be saved.
    ///
    /// Map stores keep default elements under their names. List stores put the
    /// consumed defaults first, in declaration order, so loading the snapshot
    /// and declaring the same rules again reproduces this store.
    pub fn snapshot(&self) -> Snapshot {
        let elements = match &self.slots {
            Slots::Map(map) => Elements::Named(
                map.iter()
                    .map(|(name, element)| (name.clone(), element.raw.clone()))
                    .collect(),
            ),
            Slots::List(list) => Elements::Positional(
                self.rules
                    .iter()
                    .filter_map(|rule| match &rule.source {
                        DefaultSource::Consumed(value) => Some(Some(value.clone())),
                        DefaultSource::Element(_) => None,
                    })
                    .chain(list.iter().map(|element| element.raw.clone()))
                    .collect(),
            ),
        };
        Snapshot {
            kind: self.kind,
            elements,
        }
    }

    /// Resolves `path` into an address within this store's schema.
    pub(crate) fn address(&self, path: &Path) -> Result<Address> {
        Ok(self.schema.address(path)?)
    }
}

/// Where `add` puts an element.
enum Placement {
    Named(String),
    Append,
    Fill(usize),
    Insert(usize),
    Extend(usize),
}
