//! Shared data model for the triage downlink-prioritization engine.
//!
//! Defines the metadata value sum type, the in-memory ASDP entry used by the
//! rule evaluator and planner, and the persisted catalog record form.

pub mod asdp;
pub mod value;

pub use asdp::{fields, AsdpAssignments, AsdpEntry, AsdpList, AsdpRecord, DownlinkState};
pub use value::{MetadataKind, MetadataValue};
