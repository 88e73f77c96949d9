//! Construction phase of a store: loading elements and declaring defaults.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Element, ElementKey, Slots, Store, StoreError, StoreKind};
use crate::{
    Result,
    merge::{Condition, DefaultError, DefaultRule, DefaultSource},
    schema::{DEFAULT_RULESET, Schema},
    source::{Elements, Snapshot, SourceError},
    value::Value,
};

/// Options fixed when a store is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Collection layout
    pub kind: StoreKind,
    /// Reject elements whose structure the schema does not already declare.
    /// Unset leaves the schema's own setting alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_defined: Option<bool>,
}

/// Builds a [`Store`].
///
/// Elements are loaded first, then default rules are declared in the order they
/// should apply. [`StoreBuilder::build`] computes every effective value and
/// hands over a store whose rules can no longer change.
#[derive(Debug)]
pub struct StoreBuilder {
    kind: StoreKind,
    schema: Schema,
    fully_defined: Option<bool>,
    slots: Slots,
    rules: Vec<DefaultRule>,
}

impl StoreBuilder {
    /// Starts a store of `kind` with a fresh schema.
    pub fn new(kind: StoreKind) -> Self {
        Self {
            kind,
            schema: Schema::new(),
            fully_defined: None,
            slots: Slots::new(kind),
            rules: Vec::new(),
        }
    }

    pub fn from_options(options: StoreOptions) -> Self {
        let builder = Self::new(options.kind);
        match options.fully_defined {
            Some(fully_defined) => builder.fully_defined(fully_defined),
            None => builder,
        }
    }

    /// Uses an existing (possibly shared) schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        if let Some(fully_defined) = self.fully_defined {
            schema.set_fully_defined(fully_defined);
        }
        self.schema = schema;
        self
    }

    /// Marks the schema as fully defined, so loaded elements must fit it.
    pub fn fully_defined(mut self, fully_defined: bool) -> Self {
        self.schema.set_fully_defined(fully_defined);
        self.fully_defined = Some(fully_defined);
        self
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn checked(&self, key: &dyn std::fmt::Display, value: Option<Value>) -> Result<Element> {
        if let Some(value) = &value {
            if let Err(err) = self.schema.check(value) {
                warn!(key = %key, error = %err, "Rejected element");
                return Err(err.into());
            }
        }
        Ok(Element::new(value))
    }

    /// Loads a named element into a map store.
    pub fn element(&mut self, name: impl Into<String>, value: Value) -> Result<&mut Self> {
        self.insert(name.into(), Some(value))
    }

    fn insert(&mut self, name: String, value: Option<Value>) -> Result<&mut Self> {
        let Slots::Map(map) = &self.slots else {
            return Err(StoreError::UnsupportedInMode {
                operation: "element",
                kind: self.kind,
            }
            .into());
        };
        if map.get(&name).is_some_and(|e| e.is_default || !e.is_empty()) {
            return Err(StoreError::AlreadyExists {
                key: ElementKey::Name(name),
            }
            .into());
        }
        let element = self.checked(&name, value)?;
        if let Slots::Map(map) = &mut self.slots {
            map.insert(name, element);
        }
        Ok(self)
    }

    /// Appends an element (or a placeholder, for `None`) to a list store.
    pub fn push(&mut self, value: Option<Value>) -> Result<&mut Self> {
        let Slots::List(list) = &self.slots else {
            return Err(StoreError::UnsupportedInMode {
                operation: "push",
                kind: self.kind,
            }
            .into());
        };
        let index = list.len();
        let element = self.checked(&index, value)?;
        if let Slots::List(list) = &mut self.slots {
            list.push(element);
        }
        Ok(self)
    }

    /// Loads every element of a snapshot produced by a [`Source`](crate::source::Source).
    ///
    /// The snapshot is taken whole: if any element is rejected, neither the
    /// builder nor the schema changes.
    pub fn load(&mut self, snapshot: Snapshot) -> Result<&mut Self> {
        if snapshot.kind != self.kind {
            return Err(SourceError::KindMismatch {
                expected: self.kind,
                found: snapshot.kind,
            }
            .into());
        }
        let count = snapshot.elements.len();
        let rejected = |err: crate::schema::SchemaError| {
            warn!(kind = %self.kind, error = %err, "Rejected snapshot");
            err
        };
        match (&mut self.slots, snapshot.elements) {
            (Slots::Map(map), Elements::Named(elements)) => {
                let taken = elements
                    .keys()
                    .find(|name| map.get(*name).is_some_and(|e| e.is_default || !e.is_empty()));
                if let Some(name) = taken {
                    return Err(StoreError::AlreadyExists {
                        key: ElementKey::Name(name.clone()),
                    }
                    .into());
                }
                self.schema
                    .check_all(elements.values().flatten())
                    .map_err(rejected)?;
                for (name, value) in elements {
                    map.insert(name, Element::new(value));
                }
            }
            (Slots::List(list), Elements::Positional(elements)) => {
                self.schema
                    .check_all(elements.iter().flatten())
                    .map_err(rejected)?;
                list.extend(elements.into_iter().map(Element::new));
            }
            _ => {
                return Err(SourceError::Malformed {
                    reason: format!("elements do not fit a {} store", self.kind),
                }
                .into());
            }
        }
        debug!(kind = %self.kind, elements = count, "Loaded elements");
        Ok(self)
    }

    /// Declares the next default rule and returns its index.
    ///
    /// Map stores name the element to use; it stays in the store but is hidden
    /// from enumeration. List stores take no key: their first element is
    /// removed and becomes the default, shifting the rest down by one.
    ///
    /// `ruleset` defaults to [`DEFAULT_RULESET`]. The rule applies only to
    /// elements that satisfy every condition.
    pub fn declare_default(
        &mut self,
        key: Option<&str>,
        ruleset: Option<&str>,
        conditions: impl IntoIterator<Item = Condition>,
    ) -> Result<usize> {
        let rule = self.rules.len();
        let ruleset = ruleset.unwrap_or(DEFAULT_RULESET).to_string();
        if !self.schema.has_ruleset(&ruleset) {
            return Err(DefaultError::UnknownRuleset { rule, ruleset }.into());
        }

        let conditions: Vec<Condition> = conditions.into_iter().collect();
        let compiled = conditions
            .iter()
            .map(|c| {
                c.compile(&self.schema)
                    .map_err(|source| DefaultError::InvalidConditionPath {
                        rule,
                        path: c.path().to_string(),
                        source,
                    })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let source = match (&mut self.slots, key) {
            (Slots::Map(_), None) => return Err(DefaultError::KeyRequired { rule }.into()),
            (Slots::Map(map), Some(name)) => {
                let key = name.to_string();
                let Some(element) = map.get_mut(name) else {
                    return Err(DefaultError::NotFound { rule, key }.into());
                };
                if element.is_default {
                    return Err(DefaultError::AlreadyDefault { rule, key }.into());
                }
                if element.is_empty() {
                    return Err(DefaultError::EmptyDefault { rule, key }.into());
                }
                element.is_default = true;
                DefaultSource::Element(key)
            }
            (Slots::List(_), Some(key)) => {
                return Err(DefaultError::KeyNotAllowed {
                    rule,
                    key: key.to_string(),
                }
                .into());
            }
            (Slots::List(list), None) => {
                let Some(first) = list.first() else {
                    return Err(DefaultError::NoElements { rule }.into());
                };
                let Some(value) = first.raw.clone().filter(Value::is_populated) else {
                    return Err(DefaultError::EmptyDefault {
                        rule,
                        key: "0".to_string(),
                    }
                    .into());
                };
                list.remove(0);
                DefaultSource::Consumed(value)
            }
        };

        debug!(
            rule,
            ruleset = %ruleset,
            element = key.unwrap_or("<first>"),
            conditions = conditions.len(),
            "Declared default"
        );
        self.rules.push(DefaultRule {
            source,
            ruleset,
            conditions,
            compiled,
        });
        Ok(rule)
    }

    /// Finishes construction, computing every effective value.
    pub fn build(self) -> Store {
        Store::from_parts(self.kind, self.schema, self.slots, self.rules)
    }
}
