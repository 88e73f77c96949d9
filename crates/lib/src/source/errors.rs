//! Error types for loading and saving store contents.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreKind;

/// Errors raised by a [`Source`](super::Source).
///
/// None of these leave a store in a partial state: a failed load produces no
/// store, and a failed save leaves any existing file untouched.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SourceError {
    /// Reading or writing the backing file failed
    #[error("I/O error on '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid for this format
    #[error("Failed to parse '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed but its contents are inconsistent
    #[error("Malformed contents: {reason}")]
    Malformed { reason: String },

    /// The contents are for a different kind of store
    #[error("Store kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: StoreKind, found: StoreKind },
}

impl SourceError {
    /// Check if this error came from the file system
    pub fn is_io_error(&self) -> bool {
        matches!(self, SourceError::Io { .. })
    }

    /// Check if the contents themselves are at fault
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            SourceError::Parse { .. } | SourceError::Malformed { .. } | SourceError::KindMismatch { .. }
        )
    }
}

impl From<SourceError> for crate::Error {
    fn from(err: SourceError) -> Self {
        crate::Error::Source(err)
    }
}
