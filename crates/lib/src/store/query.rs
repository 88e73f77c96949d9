//! Path-based reads over raw or effective element values.

use std::collections::BTreeMap;

use super::{ElementKey, Store, StoreError, View};
use crate::{
    Result,
    address::{self, Address},
    merge::{Condition, DefaultSource, Origin},
    path::Path,
    schema::Shape,
    value::Value,
};

impl Store {
    fn lookup<'a>(
        &'a self,
        key: &ElementKey,
        address: &Address,
        view: View,
    ) -> Result<Option<&'a Value>> {
        let tree = self.element(key)?.tree(view);
        Ok(address::resolve(tree, address)?.value())
    }

    /// The value stored at `path` in an element.
    ///
    /// The reference is only valid until the store is next modified; use
    /// [`Store::value_copy`] for an owned value.
    pub fn value(&self, key: &ElementKey, path: &Path, view: View) -> Result<&Value> {
        let address = self.address(path)?;
        self.lookup(key, &address, view)?.ok_or_else(|| {
            StoreError::PathNotFound {
                key: key.clone(),
                path: path.to_string(),
            }
            .into()
        })
    }

    /// An owned copy of the value stored at `path` in an element.
    pub fn value_copy(&self, key: &ElementKey, path: &Path, view: View) -> Result<Value> {
        self.value(key, path, view).cloned()
    }

    /// The container at `path`, or `None` if nothing is stored there.
    fn container<'a>(
        &'a self,
        key: &ElementKey,
        path: &Path,
        view: View,
    ) -> Result<Option<&'a Value>> {
        let address = self.address(path)?;
        let not_a_container = || StoreError::NotAContainer {
            key: key.clone(),
            path: path.to_string(),
        };
        if address.shape() == Shape::Scalar {
            return Err(not_a_container().into());
        }
        match self.lookup(key, &address, view)? {
            Some(Value::Scalar(scalar)) if scalar.is_empty() => Ok(None),
            Some(Value::Scalar(_)) => Err(not_a_container().into()),
            found => Ok(found),
        }
    }

    /// Keys of the container at `path`: map keys, or list indices as text.
    ///
    /// Nothing stored at `path` gives no keys; a scalar is an error.
    pub fn keys(
        &self,
        key: &ElementKey,
        path: &Path,
        include_empty: bool,
        view: View,
    ) -> Result<Vec<String>> {
        Ok(match self.container(key, path, view)? {
            Some(Value::Map(map)) => map
                .iter()
                .filter(|(_, v)| include_empty || v.is_populated())
                .map(|(k, _)| k.clone())
                .collect(),
            Some(Value::List(items)) => items
                .iter()
                .enumerate()
                .filter(|(_, v)| include_empty || v.is_populated())
                .map(|(i, _)| i.to_string())
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Children of the container at `path`, borrowed from the store.
    pub fn values(
        &self,
        key: &ElementKey,
        path: &Path,
        include_empty: bool,
        view: View,
    ) -> Result<Vec<&Value>> {
        let children: Box<dyn Iterator<Item = &Value> + '_> = match self.container(key, path, view)? {
            Some(Value::Map(map)) => Box::new(map.values()),
            Some(Value::List(items)) => Box::new(items.iter()),
            _ => Box::new(std::iter::empty()),
        };
        Ok(children
            .filter(|v| include_empty || v.is_populated())
            .collect())
    }

    /// Owned copies of the children of the container at `path`.
    pub fn values_copy(
        &self,
        key: &ElementKey,
        path: &Path,
        include_empty: bool,
        view: View,
    ) -> Result<Vec<Value>> {
        Ok(self
            .values(key, path, include_empty, view)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Keys of every populated ordinary element whose effective value satisfies
    /// all `conditions`.
    pub fn which(&self, conditions: &[Condition]) -> Result<Vec<ElementKey>> {
        let compiled = conditions
            .iter()
            .map(|c| c.compile(&self.schema))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(self
            .slots
            .iter()
            .filter(|(_, element)| !element.is_default && !element.is_empty())
            .filter(|(_, element)| {
                let tree = element.tree(View::Effective);
                compiled.iter().all(|c| c.matches(tree))
            })
            .map(|(key, _)| key)
            .collect())
    }

    /// The effective value at `path` of every ordinary element that has one.
    ///
    /// Empty values, and empty elements such as ordered-list placeholders, are
    /// only included with `include_empty`.
    pub fn path_values(
        &self,
        path: &Path,
        include_empty: bool,
    ) -> Result<BTreeMap<ElementKey, &Value>> {
        let address = self.address(path)?;
        let mut found = BTreeMap::new();
        for (key, element) in self.slots.iter() {
            if element.is_default || (!include_empty && element.is_empty()) {
                continue;
            }
            if let Some(value) = address::resolve(element.tree(View::Effective), &address)?.value() {
                if include_empty || value.is_populated() {
                    found.insert(key, value);
                }
            }
        }
        Ok(found)
    }

    /// Owned copies of [`Store::path_values`].
    pub fn path_values_copy(
        &self,
        path: &Path,
        include_empty: bool,
    ) -> Result<BTreeMap<ElementKey, Value>> {
        Ok(self
            .path_values(path, include_empty)?
            .into_iter()
            .map(|(key, value)| (key, value.clone()))
            .collect())
    }

    /// Returns true if any element, default elements included, stores a raw
    /// value at `path`.
    pub fn path_in_use(&self, path: &Path, include_empty: bool) -> Result<bool> {
        let address = self.address(path)?;
        for (_, element) in self.slots.iter() {
            let found = address::resolve(element.tree(View::Raw), &address)?.value();
            if found.is_some_and(|v| include_empty || v.is_populated()) {
                return Ok(true);
            }
        }
        // Values consumed from list stores are defaults too
        Ok(self.rules.iter().any(|rule| match rule.source() {
            DefaultSource::Consumed(value) => address::resolve(Some(value), &address)
                .ok()
                .and_then(|r| r.value())
                .is_some_and(|v| include_empty || v.is_populated()),
            DefaultSource::Element(_) => false,
        }))
    }

    /// Where the effective value at `path` came from.
    pub fn origin(&self, key: &ElementKey, path: &Path) -> Result<Origin> {
        let address = self.address(path)?;
        if self.lookup(key, &address, View::Effective)?.is_none() {
            return Err(StoreError::PathNotFound {
                key: key.clone(),
                path: path.to_string(),
            }
            .into());
        }
        Ok(self
            .element(key)?
            .effective
            .provenance()
            .origin_at(address.steps()))
    }

    /// Returns true if the effective value at `path` was supplied by a default
    /// rule rather than authored in the element.
    pub fn is_default_value(&self, key: &ElementKey, path: &Path) -> Result<bool> {
        Ok(self.origin(key, path)?.is_default())
    }
}
