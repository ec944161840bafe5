//! Unified ledger event log.
//!
//! The facade appends every committed state change here, in order. Sale and
//! registry events keep their own types; this log is the single stream a
//! host indexer consumes.

use lib_registry::{AuditEntry, DenialRecord};
use lib_sale::SaleEvent;
use lib_types::{Address, AssetId, Timestamp};
use serde::{Deserialize, Serialize};

/// One entry in the unified event stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A sale-side event
    Sale(SaleEvent),
    /// A registry state transition (mint, flag, burn, restore, reactivate)
    Audit(AuditEntry),
    /// A denied authorization attempt; no state changed
    AuthorizationDenied(DenialRecord),
    /// An ownership transfer
    Transferred {
        asset_id: AssetId,
        from: Address,
        to: Address,
        timestamp: Timestamp,
    },
}
