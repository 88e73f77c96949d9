//! Error types for declaring defaults and parsing conditions.

use thiserror::Error;

use crate::address::AddressError;

/// Errors raised while declaring a default rule.
///
/// Every variant tied to a declaration carries `rule`, the index the rule would
/// have had in declaration order.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefaultError {
    /// Map stores name the element that becomes the default
    #[error("Default rule {rule}: map stores require an element name")]
    KeyRequired { rule: usize },

    /// List stores always consume their first element
    #[error("Default rule {rule}: list stores take no element key, got '{key}'")]
    KeyNotAllowed { rule: usize, key: String },

    /// The named element does not exist
    #[error("Default rule {rule}: element '{key}' not found")]
    NotFound { rule: usize, key: String },

    /// Default elements must carry data
    #[error("Default rule {rule}: element '{key}' is empty")]
    EmptyDefault { rule: usize, key: String },

    /// The element already backs another rule
    #[error("Default rule {rule}: element '{key}' is already a default")]
    AlreadyDefault { rule: usize, key: String },

    /// A list store has no ordinary element left to consume
    #[error("Default rule {rule}: no element left to use as default")]
    NoElements { rule: usize },

    /// The rule names a ruleset the schema does not have
    #[error("Default rule {rule}: unknown ruleset '{ruleset}'")]
    UnknownRuleset { rule: usize, ruleset: String },

    /// A condition path cannot be addressed under the schema
    #[error("Default rule {rule}: invalid condition path '{path}'")]
    InvalidConditionPath {
        rule: usize,
        path: String,
        #[source]
        source: AddressError,
    },

    /// A condition string could not be parsed
    #[error("Invalid condition '{condition}': {reason}")]
    InvalidCondition { condition: String, reason: String },
}

impl DefaultError {
    /// Check if this error indicates a missing element
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DefaultError::NotFound { .. } | DefaultError::NoElements { .. }
        )
    }

    /// The index of the rule being declared, if the error concerns one.
    pub fn rule(&self) -> Option<usize> {
        match self {
            DefaultError::KeyRequired { rule }
            | DefaultError::KeyNotAllowed { rule, .. }
            | DefaultError::NotFound { rule, .. }
            | DefaultError::EmptyDefault { rule, .. }
            | DefaultError::AlreadyDefault { rule, .. }
            | DefaultError::NoElements { rule }
            | DefaultError::UnknownRuleset { rule, .. }
            | DefaultError::InvalidConditionPath { rule, .. } => Some(*rule),
            DefaultError::InvalidCondition { .. } => None,
        }
    }
}

impl From<DefaultError> for crate::Error {
    fn from(err: DefaultError) -> Self {
        crate::Error::Default(err)
    }
}
