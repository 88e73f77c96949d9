//! Default-merge engine.
//!
//! A store may declare an ordered list of default rules. Each rule points at a
//! default element and optionally carries conditions. To compute an element's
//! effective value the rules are applied in declaration order: a rule whose
//! conditions hold against the value built so far fills every location that is
//! still absent or empty with the default's value there. Defaults never
//! overwrite anything, whether it was authored or filled by an earlier rule.
//!
//! How a default is taken at each location is chosen by the rule's ruleset (see
//! [`MergeMethod`](crate::schema::MergeMethod)).
//!
//! The result is an [`Effective`] value whose [`Provenance`] records, node by
//! node, whether the data is raw or came from a rule.

use tracing::trace;

use crate::{
    path::{Path, WILDCARD},
    schema::{MergeMethod, Node, Ruleset, SchemaInner},
    value::Value,
};

mod condition;
mod errors;
mod provenance;

pub use condition::{CompiledCondition, Condition, Predicate};
pub use errors::DefaultError;
pub use provenance::{Effective, Origin, Provenance};

static UNKNOWN: Node = Node::Unknown;

/// Where a rule's default value lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultSource {
    /// A named element of a map store, kept in place but hidden
    Element(String),
    /// An element taken out of a list store
    Consumed(Value),
}

/// One declared default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRule {
    pub(crate) source: DefaultSource,
    pub(crate) ruleset: String,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) compiled: Vec<CompiledCondition>,
}

impl DefaultRule {
    /// Name of the backing element in a map store.
    pub fn element(&self) -> Option<&str> {
        match &self.source {
            DefaultSource::Element(name) => Some(name),
            DefaultSource::Consumed(_) => None,
        }
    }

    pub fn source(&self) -> &DefaultSource {
        &self.source
    }

    pub fn ruleset(&self) -> &str {
        &self.ruleset
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns true if the rule is unconditional.
    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns true if every condition holds against `tree`.
    pub fn applies(&self, tree: Option<&Value>) -> bool {
        self.compiled.iter().all(|c| c.matches(tree))
    }
}

/// A rule ready to apply: its index and the default value it supplies.
pub(crate) struct Applied<'a> {
    pub(crate) index: usize,
    pub(crate) rule: &'a DefaultRule,
    pub(crate) value: &'a Value,
}

struct Fill<'a> {
    ruleset: &'a Ruleset,
    rule: usize,
}

/// Computes the effective value of one element from its raw value.
pub(crate) fn merge_element(
    raw: Option<&Value>,
    rules: &[Applied<'_>],
    schema: &SchemaInner,
) -> Effective {
    let mut effective = Effective::from_raw(raw.cloned());

    for applied in rules {
        if !applied.rule.applies(effective.value.as_ref()) {
            trace!(rule = applied.index, "Default rule conditions not met");
            continue;
        }
        let Some(ruleset) = schema.rulesets.get(&applied.rule.ruleset) else {
            trace!(rule = applied.index, ruleset = %applied.rule.ruleset, "Ruleset missing");
            continue;
        };
        trace!(rule = applied.index, ruleset = %applied.rule.ruleset, "Applying default rule");
        let fill = Fill {
            ruleset,
            rule: applied.index,
        };
        let target = effective.value.get_or_insert_with(Value::null);
        merge_into(
            target,
            &mut effective.provenance,
            applied.value,
            &schema.root,
            &Path::root(),
            &fill,
        );
    }

    if raw.is_none() && effective.value.as_ref().is_some_and(Value::is_empty) {
        effective.value = None;
    }
    effective.provenance.prune();
    effective
}

fn merge_into(
    target: &mut Value,
    provenance: &mut Provenance,
    default: &Value,
    node: &Node,
    schema_path: &Path,
    fill: &Fill<'_>,
) {
    let method = fill.ruleset.method_for(schema_path, node);
    if method == MergeMethod::Skip || default.is_empty() {
        return;
    }
    if target.is_empty() {
        *target = default.clone();
        *provenance = Provenance::new(Origin::Default { rule: fill.rule });
        return;
    }
    if method == MergeMethod::Keep {
        return;
    }

    match (target, default) {
        (Value::Map(map), Value::Map(defaults)) => {
            for (key, default_child) in defaults {
                let child_node = node.child(key).unwrap_or(&UNKNOWN);
                let child_path = schema_path.clone().push(node.schema_component(key));
                let existed = map.contains_key(key);
                let child = map.entry(key.clone()).or_insert_with(Value::null);
                merge_into(
                    child,
                    provenance.key_mut(key),
                    default_child,
                    child_node,
                    &child_path,
                    fill,
                );
                if !existed && child.is_empty() {
                    map.remove(key);
                    provenance.forget_key(key);
                }
            }
        }
        (Value::List(items), Value::List(defaults)) if matches!(node, Node::List { ordered: true, .. }) => {
            let item_node = node.item().unwrap_or(&UNKNOWN);
            let item_path = schema_path.clone().push(WILDCARD);
            let original_len = items.len();
            for (index, default_item) in defaults.iter().enumerate() {
                if index >= items.len() {
                    items.push(Value::null());
                }
                merge_into(
                    &mut items[index],
                    provenance.item_mut(index),
                    default_item,
                    item_node,
                    &item_path,
                    fill,
                );
            }
            while items.len() > original_len && items.last().is_some_and(Value::is_empty) {
                items.pop();
                provenance.forget_item(items.len());
            }
        }
        // Kinds disagree or the list is unordered: keep what is there
        _ => {}
    }
}
