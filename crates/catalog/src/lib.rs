pub mod layer;
pub mod record;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use layer::*;
pub use record::*;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub records: BTreeMap<String, CatalogRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("catalogue record not found")]
    NotFound,
    #[error("catalogue payload corrupt: {0}")]
    Corrupt(String),
}

/// Source of catalogue records. Records handed out already carry their
/// bounding boxes.
pub trait CatalogStore {
    fn list(&self) -> Result<Vec<CatalogRecord>, CatalogError>;
    fn get(&self, id: &str) -> Result<Option<CatalogRecord>, CatalogError>;
    fn upsert(&mut self, record: CatalogRecord) -> Result<(), CatalogError>;
    fn delete(&mut self, id: &str) -> Result<bool, CatalogError>;
}

/// Parse a JSON array of records as served by the portal backend.
pub fn records_from_json(json: &str) -> Result<Vec<CatalogRecord>, CatalogError> {
    serde_json::from_str(json).map_err(|e| CatalogError::Corrupt(e.to_string()))
}

/// Deterministic in-memory store; iteration is ordered by record id.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    snapshot: CatalogSnapshot,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut store = Self::new();
        for record in records_from_json(json)? {
            store.upsert(record)?;
        }
        Ok(store)
    }

    /// Fetch a record that must exist.
    pub fn require(&self, id: &str) -> Result<CatalogRecord, CatalogError> {
        self.get(id)?.ok_or(CatalogError::NotFound)
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn list(&self) -> Result<Vec<CatalogRecord>, CatalogError> {
        Ok(self.snapshot.records.values().cloned().collect())
    }

    fn get(&self, id: &str) -> Result<Option<CatalogRecord>, CatalogError> {
        Ok(self.snapshot.records.get(id).cloned())
    }

    fn upsert(&mut self, record: CatalogRecord) -> Result<(), CatalogError> {
        self.snapshot.records.insert(record.id.clone(), record);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool, CatalogError> {
        Ok(self.snapshot.records.remove(id).is_some())
    }
}
