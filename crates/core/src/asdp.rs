//! ASDP entries and catalog records.
//!
//! An [`AsdpEntry`] is the in-memory form consumed by the rule evaluator and
//! planner: a flat field-name → value map holding both the promoted
//! first-class fields and the open-ended metadata bag. An [`AsdpRecord`] is
//! the persisted catalog form with the first-class fields broken out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::MetadataValue;

/// Mapping from field name to metadata value.
pub type AsdpEntry = BTreeMap<String, MetadataValue>;

/// Ordered sequence of ASDP entries; order is the queue under construction
/// or the pool of remaining candidates.
pub type AsdpList = Vec<AsdpEntry>;

/// Binding of rule variables to ASDP entries during quantified evaluation.
pub type AsdpAssignments = BTreeMap<String, AsdpEntry>;

/// Names of the promoted first-class fields in a populated [`AsdpEntry`].
pub mod fields {
    pub const ID: &str = "id";
    pub const INSTRUMENT_NAME: &str = "instrument_name";
    pub const TYPE: &str = "type";
    pub const SIZE: &str = "size";
    pub const SCIENCE_UTILITY_ESTIMATE: &str = "science_utility_estimate";
    pub const PRIORITY_BIN: &str = "priority_bin";
    /// Written by the planner while scoring; discounted utility.
    pub const FINAL_SCIENCE_UTILITY_ESTIMATE: &str = "final_science_utility_estimate";
}

/// Downlink lifecycle state of an ASDP.
///
/// `Downlinked` products are confirmed received on the ground and are
/// excluded from future prioritizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownlinkState {
    Untransmitted,
    Transmitted,
    Downlinked,
}

impl DownlinkState {
    /// Stable integer code for storage backends.
    pub fn code(self) -> i64 {
        match self {
            DownlinkState::Untransmitted => 0,
            DownlinkState::Transmitted => 1,
            DownlinkState::Downlinked => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<DownlinkState> {
        match code {
            0 => Some(DownlinkState::Untransmitted),
            1 => Some(DownlinkState::Transmitted),
            2 => Some(DownlinkState::Downlinked),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DownlinkState::Untransmitted => "untransmitted",
            DownlinkState::Transmitted => "transmitted",
            DownlinkState::Downlinked => "downlinked",
        }
    }
}

/// Persisted form of an ASDP in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsdpRecord {
    pub id: i64,
    pub instrument_name: String,
    pub asdp_type: String,
    /// Location of the product on the filesystem or other storage system.
    pub uri: String,
    /// Size in bytes.
    pub size: i64,
    pub science_utility_estimate: f64,
    pub priority_bin: i64,
    pub downlink_state: DownlinkState,
    /// Open-ended metadata bag; does not include the first-class fields.
    pub metadata: AsdpEntry,
}

impl AsdpRecord {
    /// Materialize the in-memory entry form: the metadata bag plus the
    /// promoted first-class fields.
    pub fn to_entry(&self) -> AsdpEntry {
        let mut entry = self.metadata.clone();
        entry.insert(fields::ID.to_string(), MetadataValue::Int(self.id));
        entry.insert(
            fields::INSTRUMENT_NAME.to_string(),
            MetadataValue::Text(self.instrument_name.clone()),
        );
        entry.insert(
            fields::TYPE.to_string(),
            MetadataValue::Text(self.asdp_type.clone()),
        );
        entry.insert(fields::SIZE.to_string(), MetadataValue::Int(self.size));
        entry.insert(
            fields::SCIENCE_UTILITY_ESTIMATE.to_string(),
            MetadataValue::Float(self.science_utility_estimate),
        );
        entry.insert(
            fields::PRIORITY_BIN.to_string(),
            MetadataValue::Int(self.priority_bin),
        );
        entry
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
