//! In-memory document store for testing

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;
use crate::workbook::Workbook;

/// In-memory store implementation for testing and development
///
/// Documents listed as locked reject saves, the way a workbook open in another
/// program does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    workbooks: Arc<RwLock<BTreeMap<DocumentId, Workbook>>>,
    locked: Arc<RwLock<BTreeSet<DocumentId>>>,
}

impl MemoryStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document
    pub fn insert(&self, id: DocumentId, workbook: Workbook) -> ReconcileResult<()> {
        self.workbooks
            .write()
            .map_err(|_| poisoned())?
            .insert(id, workbook);
        Ok(())
    }

    /// Current workbook of a document
    pub fn get(&self, id: &DocumentId) -> ReconcileResult<Option<Workbook>> {
        Ok(self.workbooks.read().map_err(|_| poisoned())?.get(id).cloned())
    }

    /// Make saves of `id` fail until [`unlock`](Self::unlock)
    pub fn lock(&self, id: DocumentId) -> ReconcileResult<()> {
        self.locked.write().map_err(|_| poisoned())?.insert(id);
        Ok(())
    }

    pub fn unlock(&self, id: &DocumentId) -> ReconcileResult<()> {
        self.locked.write().map_err(|_| poisoned())?.remove(id);
        Ok(())
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ReconcileResult<()> {
        self.workbooks.write().map_err(|_| poisoned())?.clear();
        self.locked.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }
}

fn poisoned() -> ReconcileError {
    ReconcileError::PersistenceFailure("memory store lock poisoned".to_string())
}

impl DocumentStore for MemoryStore {
    fn list_documents(&self) -> ReconcileResult<Vec<DocumentId>> {
        Ok(self
            .workbooks
            .read()
            .map_err(|_| poisoned())?
            .keys()
            .cloned()
            .collect())
    }

    fn load_workbook(&self, id: &DocumentId) -> ReconcileResult<Workbook> {
        self.get(id)?.ok_or_else(|| {
            ReconcileError::PersistenceFailure(format!("Document {} not found", id))
        })
    }

    fn save_workbook(&mut self, id: &DocumentId, workbook: &Workbook) -> ReconcileResult<()> {
        if self.locked.read().map_err(|_| poisoned())?.contains(id) {
            return Err(ReconcileError::PersistenceFailure(format!(
                "Document {} is locked by another process",
                id
            )));
        }
        self.insert(id.clone(), workbook.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_roundtrip_and_lock() {
        let mut store = MemoryStore::new();
        let id = DocumentId::new("b.xlsx");
        store.insert(DocumentId::new("c.xlsx"), Workbook::new()).unwrap();
        store.insert(id.clone(), Workbook::new()).unwrap();

        assert_eq!(
            store.list_documents().unwrap(),
            vec![id.clone(), DocumentId::new("c.xlsx")]
        );
        assert!(store.load_workbook(&DocumentId::new("missing")).is_err());

        store.lock(id.clone()).unwrap();
        assert!(matches!(
            store.save_workbook(&id, &Workbook::new()),
            Err(ReconcileError::PersistenceFailure(_))
        ));
        store.unlock(&id).unwrap();
        assert!(store.save_workbook(&id, &Workbook::new()).is_ok());

        store.clear().unwrap();
        assert!(store.list_documents().unwrap().is_empty());
    }
}
