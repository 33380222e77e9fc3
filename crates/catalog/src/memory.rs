//! In-memory catalog backend with JSON file persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;
use triage_core::{AsdpRecord, DownlinkState, MetadataValue};

use crate::error::CatalogError;
use crate::traits::AsdpCatalog;

/// Reference [`AsdpCatalog`] backend: records held in a `BTreeMap` so scan
/// order is ascending id order, persisted as a JSON array of records.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    records: BTreeMap<i64, AsdpRecord>,
}

impl MemoryCatalog {
    pub fn new() -> MemoryCatalog {
        MemoryCatalog::default()
    }

    /// Load a catalog previously written by [`store`](Self::store).
    pub fn load(path: &Path) -> Result<MemoryCatalog, CatalogError> {
        let text = fs::read_to_string(path)?;
        let records: Vec<AsdpRecord> = serde_json::from_str(&text)?;
        let mut catalog = MemoryCatalog::new();
        for record in records {
            catalog.records.insert(record.id, record);
        }
        debug!("loaded {} data products from {}", catalog.records.len(), path.display());
        Ok(catalog)
    }

    /// Persist the catalog as a JSON array of records.
    pub fn store(&self, path: &Path) -> Result<(), CatalogError> {
        let records: Vec<&AsdpRecord> = self.records.values().collect();
        let text = serde_json::to_string_pretty(&records)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record_mut(&mut self, id: i64) -> Result<&mut AsdpRecord, CatalogError> {
        self.records
            .get_mut(&id)
            .ok_or(CatalogError::NotFound { id })
    }
}

impl AsdpCatalog for MemoryCatalog {
    fn list_ids(&self) -> Vec<i64> {
        self.records.keys().copied().collect()
    }

    fn get(&self, id: i64) -> Result<AsdpRecord, CatalogError> {
        self.records
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound { id })
    }

    fn insert(&mut self, mut record: AsdpRecord) -> Result<i64, CatalogError> {
        let id = self.records.keys().next_back().copied().unwrap_or(0) + 1;
        record.id = id;
        self.records.insert(id, record);
        Ok(id)
    }

    fn update_science_utility(&mut self, id: i64, sue: f64) -> Result<(), CatalogError> {
        self.record_mut(id)?.science_utility_estimate = sue;
        Ok(())
    }

    fn update_priority_bin(&mut self, id: i64, bin: i64) -> Result<(), CatalogError> {
        self.record_mut(id)?.priority_bin = bin;
        Ok(())
    }

    fn update_downlink_state(
        &mut self,
        id: i64,
        state: DownlinkState,
    ) -> Result<(), CatalogError> {
        self.record_mut(id)?.downlink_state = state;
        Ok(())
    }

    fn update_metadata(
        &mut self,
        id: i64,
        field: &str,
        value: MetadataValue,
    ) -> Result<(), CatalogError> {
        let record = self.record_mut(id)?;
        match record.metadata.get_mut(field) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(CatalogError::UnknownField {
                id,
                field: field.to_string(),
            }),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::AsdpEntry;

    fn record(instrument: &str, sue: f64) -> AsdpRecord {
        let mut metadata = AsdpEntry::new();
        metadata.insert("depth".to_string(), MetadataValue::Float(10.0));
        AsdpRecord {
            id: 0,
            instrument_name: instrument.to_string(),
            asdp_type: "cntx".to_string(),
            uri: format!("file:///data/{}.dat", instrument),
            size: 100,
            science_utility_estimate: sue,
            priority_bin: 1,
            downlink_state: DownlinkState::Untransmitted,
            metadata,
        }
    }

    #[test]
    fn insert_assigns_sequential_positive_ids() {
        let mut catalog = MemoryCatalog::new();
        let first = catalog.insert(record("a", 0.1)).unwrap();
        let second = catalog.insert(record("b", 0.2)).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(catalog.get(first).unwrap().instrument_name, "a");
    }

    #[test]
    fn list_ids_is_ascending() {
        let mut catalog = MemoryCatalog::new();
        for i in 0..4 {
            catalog.insert(record("a", i as f64)).unwrap();
        }
        assert_eq!(catalog.list_ids(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn get_missing_id_is_not_found() {
        let catalog = MemoryCatalog::new();
        assert!(matches!(
            catalog.get(7),
            Err(CatalogError::NotFound { id: 7 })
        ));
    }

    #[test]
    fn updates_mutate_single_fields() {
        let mut catalog = MemoryCatalog::new();
        let id = catalog.insert(record("a", 0.1)).unwrap();

        catalog.update_science_utility(id, 0.9).unwrap();
        catalog.update_priority_bin(id, 5).unwrap();
        catalog
            .update_downlink_state(id, DownlinkState::Transmitted)
            .unwrap();
        catalog
            .update_metadata(id, "depth", MetadataValue::Float(42.0))
            .unwrap();

        let fetched = catalog.get(id).unwrap();
        assert_eq!(fetched.science_utility_estimate, 0.9);
        assert_eq!(fetched.priority_bin, 5);
        assert_eq!(fetched.downlink_state, DownlinkState::Transmitted);
        assert_eq!(fetched.metadata["depth"], MetadataValue::Float(42.0));
    }

    #[test]
    fn updates_on_missing_ids_fail() {
        let mut catalog = MemoryCatalog::new();
        assert!(catalog.update_science_utility(1, 0.5).is_err());
        assert!(catalog.update_priority_bin(1, 2).is_err());
        assert!(catalog
            .update_downlink_state(1, DownlinkState::Downlinked)
            .is_err());
        assert!(catalog
            .update_metadata(1, "depth", MetadataValue::Int(1))
            .is_err());
    }

    #[test]
    fn update_metadata_requires_existing_field() {
        let mut catalog = MemoryCatalog::new();
        let id = catalog.insert(record("a", 0.1)).unwrap();
        let err = catalog
            .update_metadata(id, "albedo", MetadataValue::Float(0.3))
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownField { .. }));
    }

    #[test]
    fn store_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let mut catalog = MemoryCatalog::new();
        catalog.insert(record("a", 0.1)).unwrap();
        catalog.insert(record("b", 0.2)).unwrap();
        catalog.store(&path).unwrap();

        let loaded = MemoryCatalog::load(&path).unwrap();
        assert_eq!(loaded.list_ids(), catalog.list_ids());
        assert_eq!(loaded.get(2).unwrap(), catalog.get(2).unwrap());
    }

    #[test]
    fn load_missing_file_is_a_backend_error() {
        let err = MemoryCatalog::load(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Backend(_)));
    }

    #[test]
    fn insert_after_load_does_not_reuse_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let mut catalog = MemoryCatalog::new();
        catalog.insert(record("a", 0.1)).unwrap();
        catalog.insert(record("b", 0.2)).unwrap();
        catalog.store(&path).unwrap();

        let mut loaded = MemoryCatalog::load(&path).unwrap();
        let id = loaded.insert(record("c", 0.3)).unwrap();
        assert_eq!(id, 3);
    }
}
