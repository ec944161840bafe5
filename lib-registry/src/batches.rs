//! Batch-to-monitor assignment.
//!
//! The asset id space is partitioned into fixed-size contiguous batches at
//! configuration time; each batch is bound to exactly one monitoring
//! authority. Ranges are disjoint and cover the id space by construction.

use lib_types::{Address, AssetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{RegistryError, RegistryResult};

/// Default ids per batch
pub const DEFAULT_BATCH_SIZE: u64 = 300_000_000;

/// Tagged lookup table from batch index to monitor identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMonitorAssignment {
    /// Ids per batch; fixed at construction
    batch_size: u64,
    /// Monitor per batch index
    monitors: BTreeMap<u64, Address>,
}

impl BatchMonitorAssignment {
    /// Create a partition with the given batch size.
    pub fn new(batch_size: u64) -> RegistryResult<Self> {
        if batch_size == 0 {
            return Err(RegistryError::InvalidParameters(
                "Batch size must be positive".to_string(),
            ));
        }
        Ok(Self {
            batch_size,
            monitors: BTreeMap::new(),
        })
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Index of the batch containing an asset id.
    pub fn batch_index(&self, asset_id: AssetId) -> u64 {
        asset_id.raw() / self.batch_size
    }

    /// Inclusive id range of a batch.
    pub fn range_of(&self, batch_index: u64) -> (u64, u64) {
        let start = batch_index.saturating_mul(self.batch_size);
        let end = start.saturating_add(self.batch_size - 1);
        (start, end)
    }

    /// Monitor assigned to the batch containing `asset_id`, if any.
    pub fn monitor_of(&self, asset_id: AssetId) -> Option<Address> {
        self.monitors.get(&self.batch_index(asset_id)).copied()
    }

    /// Whether `actor` is the monitor of the batch containing `asset_id`.
    pub fn authorize(&self, asset_id: AssetId, actor: &Address) -> bool {
        self.monitor_of(asset_id).is_some_and(|m| m == *actor)
    }

    /// Administrative (re)assignment of a batch's monitor. Takes effect for
    /// all subsequent authorization checks immediately.
    pub fn assign_monitor(&mut self, batch_index: u64, monitor: Address) -> Option<Address> {
        self.monitors.insert(batch_index, monitor)
    }

    /// All assignments, ordered by batch index.
    pub fn assignments(&self) -> impl Iterator<Item = (u64, &Address)> {
        self.monitors.iter().map(|(idx, m)| (*idx, m))
    }
}
