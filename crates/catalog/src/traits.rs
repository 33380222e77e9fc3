use triage_core::{AsdpRecord, DownlinkState, MetadataValue};

use crate::error::CatalogError;

/// The catalog trait for ASDP storage backends.
///
/// Every mutating operation is atomic per call. An update that matches zero
/// rows fails with [`CatalogError::NotFound`], as does a `get` on a
/// nonexistent id. `insert` assigns and returns a positive id.
///
/// The catalog is owned by the caller and read-only during prioritization;
/// the planner holds no handle across calls.
pub trait AsdpCatalog {
    /// Ids of all ASDPs in the catalog, in scan order.
    fn list_ids(&self) -> Vec<i64>;

    /// Fetch the full record for one ASDP.
    fn get(&self, id: i64) -> Result<AsdpRecord, CatalogError>;

    /// Insert a new ASDP; the record's id field is ignored and a fresh
    /// positive id is assigned and returned.
    fn insert(&mut self, record: AsdpRecord) -> Result<i64, CatalogError>;

    /// Overwrite the science utility estimate of one ASDP.
    fn update_science_utility(&mut self, id: i64, sue: f64) -> Result<(), CatalogError>;

    /// Overwrite the priority bin of one ASDP.
    fn update_priority_bin(&mut self, id: i64, bin: i64) -> Result<(), CatalogError>;

    /// Overwrite the downlink state of one ASDP.
    fn update_downlink_state(&mut self, id: i64, state: DownlinkState)
        -> Result<(), CatalogError>;

    /// Overwrite one metadata field of one ASDP. The field must already
    /// exist on the record.
    fn update_metadata(
        &mut self,
        id: i64,
        field: &str,
        value: MetadataValue,
    ) -> Result<(), CatalogError>;
}
