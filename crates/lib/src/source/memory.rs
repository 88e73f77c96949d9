use std::sync::{Mutex, PoisonError};

use super::{Loaded, Snapshot, Source, SourceError};
use crate::store::StoreKind;

/// A source held entirely in memory.
///
/// `load` returns the most recently saved snapshot (initially the one it was
/// created with). Every save is also kept, in order, for inspection.
#[derive(Debug)]
pub struct InMemory {
    saved: Mutex<Vec<Snapshot>>,
}

impl InMemory {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            saved: Mutex::new(vec![initial]),
        }
    }

    /// A source with no elements.
    pub fn empty(kind: StoreKind) -> Self {
        Self::new(Snapshot::empty(kind))
    }

    /// Snapshots passed to `save`, oldest first.
    pub fn saves(&self) -> Vec<Snapshot> {
        let saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        saved.iter().skip(1).cloned().collect()
    }
}

impl Source for InMemory {
    fn load(&self) -> Result<Loaded, SourceError> {
        let saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        saved.last().cloned().ok_or_else(|| SourceError::Malformed {
            reason: "no contents".to_string(),
        })
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), SourceError> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());
        Ok(())
    }
}
