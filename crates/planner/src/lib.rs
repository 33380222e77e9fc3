//! Downlink prioritization planner.
//!
//! `prioritize` scans the catalog, routes untransmitted products into
//! per-bin pools, and greedily orders each bin by rate of utility gain
//! under the configured rules, constraints, and similarity discounting.
//! Bins are processed in ascending order and their queues concatenated.
//!
//! The planner is a blocking batch call with no suspension points. The
//! catalog and clock are passed in as capability handles; no process-global
//! state survives between calls.

pub mod clock;
mod greedy;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;
use triage_catalog::{AsdpCatalog, CatalogError};
use triage_core::{AsdpList, DownlinkState};
use triage_rules::{load_rule_config, RuleSet};
use triage_similarity::{load_similarity_config, Similarity};

pub use clock::{Clock, ManualClock, SystemClock, Timer};

/// Failures that abort a prioritization call.
///
/// Soft errors (malformed configuration entries, expression evaluation
/// failures) never abort; they are logged and yield neutral values.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The processing deadline elapsed before planning began.
    #[error("prioritization deadline exceeded")]
    Timeout,

    /// The catalog failed underneath the scan.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl PlanError {
    /// Process exit code mirroring the engine's status convention
    /// (success = 0, failure = 1, timeout = 2).
    pub fn exit_code(&self) -> i32 {
        match self {
            PlanError::Catalog(_) => 1,
            PlanError::Timeout => 2,
        }
    }
}

/// Produce the recommended transmission order for every priority bin.
///
/// Products already confirmed received (`Downlinked`) are ignored; products
/// queued but unacknowledged (`Transmitted`) are materialized into a
/// separate set held out of the candidate pools. The deadline is checked
/// once, after the catalog scan; on expiry no list is produced.
pub fn prioritize(
    catalog: &dyn AsdpCatalog,
    clock: &dyn Clock,
    ruleset: &RuleSet,
    similarity: &mut Similarity,
    max_processing_time_sec: f64,
) -> Result<Vec<i64>, PlanError> {
    let mut timer = Timer::new(clock, max_processing_time_sec);
    timer.start();

    let mut binned: BTreeMap<i64, AsdpList> = BTreeMap::new();
    let mut transmitted: AsdpList = Vec::new();
    for id in catalog.list_ids() {
        let record = catalog.get(id)?;
        if record.downlink_state == DownlinkState::Downlinked {
            continue;
        }
        let entry = record.to_entry();
        if record.downlink_state == DownlinkState::Transmitted {
            transmitted.push(entry);
        } else {
            binned
                .entry(record.priority_bin)
                .or_default()
                .push(entry);
        }
    }
    debug!(
        "scanned {} products awaiting acknowledgement; {} bins to prioritize",
        transmitted.len(),
        binned.len()
    );

    if timer.is_expired() {
        return Err(PlanError::Timeout);
    }

    let mut prioritized = Vec::new();
    for (bin, pool) in binned {
        prioritized.extend(greedy::prioritize_bin(bin, pool, ruleset, similarity));
    }
    Ok(prioritized)
}

/// Planner facade bundling the capability handles with configuration
/// loading.
pub struct DownlinkPlanner<'a> {
    catalog: &'a dyn AsdpCatalog,
    clock: &'a dyn Clock,
}

impl<'a> DownlinkPlanner<'a> {
    pub fn new(catalog: &'a dyn AsdpCatalog, clock: &'a dyn Clock) -> DownlinkPlanner<'a> {
        DownlinkPlanner { catalog, clock }
    }

    /// Load the rule and similarity configurations (absent paths mean the
    /// empty rule set and default similarity) and run [`prioritize`].
    pub fn prioritize(
        &self,
        rule_config: Option<&Path>,
        similarity_config: Option<&Path>,
        max_processing_time_sec: f64,
    ) -> Result<Vec<i64>, PlanError> {
        let ruleset = match rule_config {
            Some(path) => load_rule_config(path),
            None => RuleSet::default(),
        };
        let mut similarity = match similarity_config {
            Some(path) => load_similarity_config(path),
            None => Similarity::default(),
        };
        prioritize(
            self.catalog,
            self.clock,
            &ruleset,
            &mut similarity,
            max_processing_time_sec,
        )
    }
}
