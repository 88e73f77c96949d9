//! JSON file source.
//!
//! The document format is:
//!
//! ```json
//! {
//!   "kind": "ordered_list",
//!   "elements": [{"host": "a"}, null, {"host": "c"}]
//! }
//! ```
//!
//! Map stores use an object for `elements`. `null` marks an absent element,
//! unless its key is listed in `nulls`, in which case the element is present
//! and holds a `null` value:
//!
//! ```json
//! {"kind": "map", "elements": {"a": null, "b": null}, "nulls": ["b"]}
//! ```

use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use super::{Elements, Loaded, Snapshot, Source, SourceError};
use crate::{
    store::{ElementKey, StoreKind},
    value::Value,
};

/// The current file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const FORMAT_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the format version during deserialization.
fn validate_format_version<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != FORMAT_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported format version {version}; only version {FORMAT_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DocumentElements {
    Named(BTreeMap<String, Option<Value>>),
    Positional(Vec<Option<Value>>),
}

/// On-disk layout of a store.
#[derive(Serialize, Deserialize)]
struct Document {
    /// File format version for compatibility checking
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_format_version"
    )]
    version: u8,
    kind: StoreKind,
    #[serde(default)]
    elements: Option<DocumentElements>,
    /// Elements written as `null` that are present rather than absent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    nulls: Vec<ElementKey>,
}

fn is_null(slot: &Option<Value>) -> bool {
    slot.as_ref() == Some(&Value::null())
}

impl Document {
    fn into_snapshot(self) -> Result<Snapshot, SourceError> {
        let elements = match (self.kind, self.elements) {
            (kind, None) => return Ok(Snapshot::empty(kind)),
            (StoreKind::Map, Some(DocumentElements::Named(mut map))) => {
                for key in &self.nulls {
                    let slot = key.as_name().and_then(|name| map.get_mut(name));
                    mark_null(key, slot)?;
                }
                Elements::Named(map)
            }
            (kind, Some(DocumentElements::Positional(mut list))) if kind.is_list() => {
                for key in &self.nulls {
                    let slot = key.as_index().and_then(|index| list.get_mut(index));
                    mark_null(key, slot)?;
                }
                Elements::Positional(list)
            }
            (kind, Some(_)) => {
                return Err(SourceError::Malformed {
                    reason: format!("'elements' has the wrong shape for a {kind} store"),
                });
            }
        };
        Ok(Snapshot {
            kind: self.kind,
            elements,
        })
    }

    fn from_snapshot(snapshot: &Snapshot) -> Self {
        let (elements, nulls) = match &snapshot.elements {
            Elements::Named(map) => (
                DocumentElements::Named(map.clone()),
                map.iter()
                    .filter(|(_, slot)| is_null(slot))
                    .map(|(name, _)| ElementKey::Name(name.clone()))
                    .collect(),
            ),
            Elements::Positional(list) => (
                DocumentElements::Positional(list.clone()),
                list.iter()
                    .enumerate()
                    .filter(|(_, slot)| is_null(slot))
                    .map(|(index, _)| ElementKey::Index(index))
                    .collect(),
            ),
        };
        Self {
            version: FORMAT_VERSION,
            kind: snapshot.kind,
            elements: Some(elements),
            nulls,
        }
    }
}

/// Turns an absent slot listed in `nulls` into a present `null` element.
fn mark_null(key: &ElementKey, slot: Option<&mut Option<Value>>) -> Result<(), SourceError> {
    match slot {
        Some(slot) if slot.is_none() => {
            *slot = Some(Value::null());
            Ok(())
        }
        _ => Err(SourceError::Malformed {
            reason: format!("'nulls' lists '{key}', which is not a null element"),
        }),
    }
}

/// A store persisted as a JSON document.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
    kind: Option<StoreKind>,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: None,
        }
    }

    /// Expects contents for a store of `kind`. A missing file then loads as an
    /// empty store instead of failing.
    pub fn with_kind(mut self, kind: StoreKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Source for JsonFile {
    fn load(&self) -> Result<Loaded, SourceError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(kind) = self.kind {
                    debug!(path = %self.path.display(), "No file found, starting empty");
                    return Ok(Snapshot::empty(kind));
                }
                return Err(self.io_error(e));
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let document: Document = serde_json::from_str(&json).map_err(|source| SourceError::Parse {
            path: self.path.clone(),
            source,
        })?;
        let snapshot = document.into_snapshot()?;
        if let Some(expected) = self.kind {
            if expected != snapshot.kind {
                warn!(path = %self.path.display(), %expected, found = %snapshot.kind, "Store kind mismatch");
                return Err(SourceError::KindMismatch {
                    expected,
                    found: snapshot.kind,
                });
            }
        }
        debug!(path = %self.path.display(), elements = snapshot.elements.len(), "Loaded store file");
        Ok(snapshot)
    }

    /// Writes a temporary file next to the target and renames it into place,
    /// so the target is never left half written.
    fn save(&self, snapshot: &Snapshot) -> Result<(), SourceError> {
        let json = serde_json::to_string_pretty(&Document::from_snapshot(snapshot)).map_err(
            |source| SourceError::Parse {
                path: self.path.clone(),
                source,
            },
        )?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| self.io_error(e))?;
        file.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;
        debug!(path = %self.path.display(), elements = snapshot.elements.len(), "Saved store file");
        Ok(())
    }
}
