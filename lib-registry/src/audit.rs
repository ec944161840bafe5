//! Append-only audit log.
//!
//! One entry per state transition (plus one for mint). Entries are immutable
//! once appended. Denied authorization attempts are recorded separately and
//! never appear in the per-asset transition history.

use lib_types::{Address, AssetId, SerialNumber, Timestamp};
use serde::{Deserialize, Serialize};

use crate::registry::AssetState;

/// Why an asset was flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagReason {
    /// Reported stolen by the holder
    ReportedStolen,
    /// Suspected counterfeit or serial collision
    SuspectedCounterfeit,
    /// Ordered by a court or regulator
    LegalOrder,
    /// Monitor discretion, reason recorded off-ledger
    Other,
}

/// The audited action that caused a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    /// Asset minted into existence
    Mint,
    /// Asset flagged by its batch monitor
    Flag(FlagReason),
    /// Flagged asset burned in place
    Burn,
    /// Burned asset re-issued under the same serial
    Restore {
        /// The burned record this entry chains back to
        predecessor: AssetId,
    },
    /// Recovered asset returned to normal circulation
    Reactivate,
}

/// A single immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Asset record the transition applied to
    pub asset_id: AssetId,
    /// Serial number of that record (stable across burn-and-restore)
    pub serial: SerialNumber,
    /// Who performed the transition
    pub actor: Address,
    /// What happened
    pub action: AuditAction,
    /// Host timestamp
    pub timestamp: Timestamp,
    /// State before the transition; `None` for mint
    pub prior_state: Option<AssetState>,
    /// State after the transition
    pub new_state: AssetState,
}

/// A denied authorization attempt. No state changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenialRecord {
    /// Asset the actor attempted to act on
    pub asset_id: AssetId,
    /// The unauthorized actor
    pub actor: Address,
    /// The attempted action
    pub action: AuditAction,
    /// Host timestamp
    pub timestamp: Timestamp,
}

/// Append-only log of transitions and denials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    denials: Vec<DenialRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition entry.
    pub fn append(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    /// Record a denied authorization attempt.
    pub fn record_denial(&mut self, denial: DenialRecord) {
        self.denials.push(denial);
    }

    /// All transition entries, in append order.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// All denial records, in append order.
    pub fn denials(&self) -> &[DenialRecord] {
        &self.denials
    }

    /// Transition history for one asset record.
    pub fn for_asset(&self, asset_id: AssetId) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.asset_id == asset_id)
            .collect()
    }

    /// Transition history across a serial's whole lineage, including the
    /// records created by restore.
    pub fn for_serial(&self, serial: SerialNumber) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| e.serial == serial).collect()
    }
}
