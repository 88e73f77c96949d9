//!
//! Ensemble: a set of nested values that share one schema, with defaults.
//!
//! The library manages a homogeneous collection of value trees ("elements") and a
//! list of default elements that fill in whatever an element leaves out.
//!
//! ## Core Concepts
//!
//! * **Values (`value::Value`)**: Trees of scalars, ordered lists and keyed maps.
//!   A location in a tree is absent, empty, or populated, and the three never blur.
//! * **Paths (`path::Path`)**: Slash-delimited locations such as `/servers/0/host`.
//! * **Schema (`schema::Schema`)**: The structure every element shares. It decides
//!   whether a path component is a map key or a list index, checks values before
//!   they are stored, and carries the rulesets that steer merging.
//! * **Stores (`store::Store`)**: Elements keyed by name, or by position in an
//!   ordered or unordered list, each with a raw and an effective value.
//! * **Defaults (`merge::DefaultRule`)**: Ordered, optionally conditional rules
//!   that fill absent or empty locations of every element. Defaults never
//!   overwrite, and every filled location remembers which rule filled it.
//! * **Sources (`source::Source`)**: Where raw elements are loaded from and saved to.

pub mod address;
pub mod merge;
pub mod path;
pub mod schema;
pub mod source;
pub mod store;
pub mod value;

pub use path::Path;
pub use schema::Schema;
pub use store::{ElementKey, Store, StoreBuilder, StoreKind, View};
pub use value::Value;

/// Result type used throughout the Ensemble library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Ensemble library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured value conversion errors from the value module
    #[error(transparent)]
    Value(value::ValueError),

    /// Structured addressing errors from the address module
    #[error(transparent)]
    Address(address::AddressError),

    /// Structured conformance and declaration errors from the schema module
    #[error(transparent)]
    Schema(schema::SchemaError),

    /// Structured element errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured default declaration errors from the merge module
    #[error(transparent)]
    Default(merge::DefaultError),

    /// Structured load/save errors from the source module
    #[error(transparent)]
    Source(source::SourceError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Value(_) => "value",
            Error::Address(_) => "address",
            Error::Schema(_) => "schema",
            Error::Store(_) => "store",
            Error::Default(_) => "merge",
            Error::Source(_) => "source",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_not_found(),
            Error::Default(default_err) => default_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_conflict(),
            Error::Schema(schema_err) => schema_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error means a value does not fit the schema.
    pub fn is_conformance_error(&self) -> bool {
        match self {
            Error::Schema(schema_err) => schema_err.is_conformance_error(),
            _ => false,
        }
    }

    /// Check if this error is addressing-related.
    pub fn is_address_error(&self) -> bool {
        matches!(self, Error::Address(_))
    }

    /// Check if this error is type-related.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Value(value_err) => value_err.is_type_error(),
            Error::Address(address_err) => address_err.is_type_error(),
            Error::Store(store::StoreError::NotAContainer { .. }) => true,
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Source(source_err) => source_err.is_io_error(),
            _ => false,
        }
    }
}
