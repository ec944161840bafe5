//! Security state machine: the flag/burn/restore protocol.
//!
//! ```text
//! Active --flag--> Flagged --burn--> Burned --restore--> Recovered --reactivate--> Active
//! ```
//!
//! Flag and burn are gated on the batch monitor of the asset's id range;
//! restore and reactivate on the treasury administrator. Every transition
//! appends exactly one audit entry; a transition attempted from a non-source
//! state fails with no side effects.

use lib_types::{Address, AssetId, Timestamp};
use tracing::{info, warn};

use crate::audit::{AuditAction, AuditEntry, DenialRecord, FlagReason};
use crate::batches::BatchMonitorAssignment;
use crate::errors::{RegistryError, RegistryResult};
use crate::registry::{AssetRegistry, AssetState};

/// Authorization-gated lifecycle transitions over registry entries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SecurityStateMachine {
    /// Top-level treasury/administrator authority, distinct from batch monitors
    administrator: Address,
}

impl SecurityStateMachine {
    pub fn new(administrator: Address) -> Self {
        Self { administrator }
    }

    pub fn administrator(&self) -> Address {
        self.administrator
    }

    /// Mark an asset suspicious. Monitor-gated; `Active` only.
    pub fn flag(
        &self,
        registry: &mut AssetRegistry,
        batches: &BatchMonitorAssignment,
        asset_id: AssetId,
        reason: FlagReason,
        actor: Address,
        now: Timestamp,
    ) -> RegistryResult<()> {
        let action = AuditAction::Flag(reason);
        self.require_monitor(registry, batches, asset_id, action, actor, now)?;

        let asset = registry.asset_mut(asset_id)?;
        if asset.state != AssetState::Active {
            return Err(RegistryError::InvalidStateTransition {
                asset_id,
                from: asset.state,
                action,
            });
        }
        asset.state = AssetState::Flagged;
        let serial = asset.serial;

        registry.audit_mut().append(AuditEntry {
            asset_id,
            serial,
            actor,
            action,
            timestamp: now,
            prior_state: Some(AssetState::Active),
            new_state: AssetState::Flagged,
        });
        info!(asset_id = asset_id.raw(), monitor = %actor, ?reason, "asset flagged");
        Ok(())
    }

    /// Disable a flagged asset permanently in place. Monitor-gated.
    ///
    /// The serial number is retained, never released: nobody can re-mint it.
    pub fn burn(
        &self,
        registry: &mut AssetRegistry,
        batches: &BatchMonitorAssignment,
        asset_id: AssetId,
        actor: Address,
        now: Timestamp,
    ) -> RegistryResult<()> {
        self.require_monitor(registry, batches, asset_id, AuditAction::Burn, actor, now)?;

        let asset = registry.asset_mut(asset_id)?;
        if asset.state != AssetState::Flagged {
            return Err(RegistryError::InvalidStateTransition {
                asset_id,
                from: asset.state,
                action: AuditAction::Burn,
            });
        }
        asset.state = AssetState::Burned;
        let serial = asset.serial;
        let holder = asset.owner;

        // The burned record no longer counts toward the holder's inventory.
        registry.remove_from_owner_index(&holder, asset_id);

        registry.audit_mut().append(AuditEntry {
            asset_id,
            serial,
            actor,
            action: AuditAction::Burn,
            timestamp: now,
            prior_state: Some(AssetState::Flagged),
            new_state: AssetState::Burned,
        });
        info!(asset_id = asset_id.raw(), monitor = %actor, "asset burned");
        Ok(())
    }

    /// Re-issue a burned asset to its verified legitimate holder.
    ///
    /// Administrator-gated. Ownership verification happens off-ledger; the
    /// administrator attests to it by calling this. Creates a replacement
    /// record bound to the same serial number, chained to the burned
    /// predecessor, in state `Recovered`.
    pub fn restore(
        &self,
        registry: &mut AssetRegistry,
        asset_id: AssetId,
        verified_owner: Address,
        actor: Address,
        now: Timestamp,
    ) -> RegistryResult<AssetId> {
        let action = AuditAction::Restore {
            predecessor: asset_id,
        };
        self.require_administrator(registry, asset_id, action, actor, now)?;

        let asset = registry.asset_mut(asset_id)?;
        if asset.state != AssetState::Burned {
            return Err(RegistryError::InvalidStateTransition {
                asset_id,
                from: asset.state,
                action,
            });
        }
        let serial = asset.serial;
        let metadata_ref = asset.metadata_ref;

        let new_id = registry.insert_restored(serial, verified_owner, metadata_ref, asset_id, now)?;

        registry.audit_mut().append(AuditEntry {
            asset_id: new_id,
            serial,
            actor,
            action,
            timestamp: now,
            prior_state: Some(AssetState::Burned),
            new_state: AssetState::Recovered,
        });
        info!(
            asset_id = new_id.raw(),
            predecessor = asset_id.raw(),
            owner = %verified_owner,
            "asset restored under original serial"
        );
        Ok(new_id)
    }

    /// Return a recovered asset to normal circulation. Administrator-gated.
    pub fn reactivate(
        &self,
        registry: &mut AssetRegistry,
        asset_id: AssetId,
        actor: Address,
        now: Timestamp,
    ) -> RegistryResult<()> {
        self.require_administrator(registry, asset_id, AuditAction::Reactivate, actor, now)?;

        let asset = registry.asset_mut(asset_id)?;
        if asset.state != AssetState::Recovered {
            return Err(RegistryError::InvalidStateTransition {
                asset_id,
                from: asset.state,
                action: AuditAction::Reactivate,
            });
        }
        asset.state = AssetState::Active;
        let serial = asset.serial;

        registry.audit_mut().append(AuditEntry {
            asset_id,
            serial,
            actor,
            action: AuditAction::Reactivate,
            timestamp: now,
            prior_state: Some(AssetState::Recovered),
            new_state: AssetState::Active,
        });
        Ok(())
    }

    fn require_monitor(
        &self,
        registry: &mut AssetRegistry,
        batches: &BatchMonitorAssignment,
        asset_id: AssetId,
        action: AuditAction,
        actor: Address,
        now: Timestamp,
    ) -> RegistryResult<()> {
        // Existence first, so unknown assets report AssetNotFound rather
        // than an authorization failure.
        registry
            .asset(asset_id)
            .ok_or(RegistryError::AssetNotFound(asset_id))?;

        if !batches.authorize(asset_id, &actor) {
            warn!(asset_id = asset_id.raw(), actor = %actor, ?action, "monitor authorization denied");
            registry.audit_mut().record_denial(DenialRecord {
                asset_id,
                actor,
                action,
                timestamp: now,
            });
            return Err(RegistryError::UnauthorizedMonitor { asset_id, actor });
        }
        Ok(())
    }

    fn require_administrator(
        &self,
        registry: &mut AssetRegistry,
        asset_id: AssetId,
        action: AuditAction,
        actor: Address,
        now: Timestamp,
    ) -> RegistryResult<()> {
        registry
            .asset(asset_id)
            .ok_or(RegistryError::AssetNotFound(asset_id))?;

        if actor != self.administrator {
            warn!(asset_id = asset_id.raw(), actor = %actor, ?action, "administrator authorization denied");
            registry.audit_mut().record_denial(DenialRecord {
                asset_id,
                actor,
                action,
                timestamp: now,
            });
            return Err(RegistryError::UnauthorizedAdministrator { actor });
        }
        Ok(())
    }
}
