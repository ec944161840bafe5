//! Asset registry: issuance, ownership, and lookups.

use lib_types::{Address, AssetId, SerialNumber, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::audit::{AuditAction, AuditEntry, AuditLog};
use crate::errors::{RegistryError, RegistryResult};

/// Protection lifecycle state of an asset record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetState {
    /// In normal circulation
    Active,
    /// Marked suspicious by its batch monitor; transfers blocked
    Flagged,
    /// Disabled permanently in place; serial retained
    Burned,
    /// Re-issued to a verified owner after burn
    Recovered,
}

/// Whether a `Recovered` asset may transfer before explicit reactivation.
///
/// The safer default requires an administrative reactivate step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RecoveryTransferPolicy {
    /// Transfers resume only after `reactivate`
    #[default]
    RequireReactivate,
    /// A recovered asset transfers like an active one
    TransferableImmediately,
}

/// A serialized asset record.
///
/// Records are never deleted: burn and restore produce terminal-but-reachable
/// states and replacement records, not removals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Opaque storage id, unique per record
    pub id: AssetId,
    /// Globally unique serial, stable across burn-and-restore
    pub serial: SerialNumber,
    /// Current owner
    pub owner: Address,
    /// Lifecycle state
    pub state: AssetState,
    /// Hash of extended metadata (IPFS CID, certificate scan, etc.)
    pub metadata_ref: [u8; 32],
    /// For restored records, the burned record this one replaces
    pub predecessor: Option<AssetId>,
    /// When this record was created
    pub created_at: Timestamp,
}

/// The asset registry.
///
/// All mutation funnels through [`AssetRegistry::mint`],
/// [`AssetRegistry::transfer`], and the security state machine; no caller
/// reaches into storage directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRegistry {
    assets: BTreeMap<AssetId, Asset>,
    /// serial -> live record bearing it
    serial_index: BTreeMap<SerialNumber, AssetId>,
    owner_index: BTreeMap<Address, BTreeSet<AssetId>>,
    next_id: u64,
    audit: AuditLog,
    recovery_transfer_policy: RecoveryTransferPolicy,
}

impl AssetRegistry {
    pub fn new(recovery_transfer_policy: RecoveryTransferPolicy) -> Self {
        Self {
            assets: BTreeMap::new(),
            serial_index: BTreeMap::new(),
            owner_index: BTreeMap::new(),
            next_id: 0,
            audit: AuditLog::new(),
            recovery_transfer_policy,
        }
    }

    pub fn recovery_transfer_policy(&self) -> RecoveryTransferPolicy {
        self.recovery_transfer_policy
    }

    /// Administrative policy update for recovered-asset transfers.
    pub fn set_recovery_transfer_policy(&mut self, policy: RecoveryTransferPolicy) {
        self.recovery_transfer_policy = policy;
    }

    /// Mint a new asset.
    ///
    /// Fails with [`RegistryError::DuplicateSerial`] if the serial is already
    /// bound to any record, live or burned. Ids are assigned monotonically
    /// and never reused. Appends the mint audit entry.
    pub fn mint(
        &mut self,
        owner: Address,
        serial: SerialNumber,
        metadata_ref: [u8; 32],
        actor: Address,
        now: Timestamp,
    ) -> RegistryResult<AssetId> {
        if self.serial_index.contains_key(&serial) {
            return Err(RegistryError::DuplicateSerial(serial));
        }

        let id = AssetId::new(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(RegistryError::IdSpaceExhausted)?;

        self.assets.insert(
            id,
            Asset {
                id,
                serial,
                owner,
                state: AssetState::Active,
                metadata_ref,
                predecessor: None,
                created_at: now,
            },
        );
        self.serial_index.insert(serial, id);
        self.owner_index.entry(owner).or_default().insert(id);

        self.audit.append(AuditEntry {
            asset_id: id,
            serial,
            actor,
            action: AuditAction::Mint,
            timestamp: now,
            prior_state: None,
            new_state: AssetState::Active,
        });

        info!(asset_id = id.raw(), serial = %serial, owner = %owner, "asset minted");
        Ok(id)
    }

    /// Transfer ownership of an asset.
    ///
    /// Rejected with [`RegistryError::BlockedTransfer`] unless the asset is
    /// `Active`, or `Recovered` under the
    /// [`RecoveryTransferPolicy::TransferableImmediately`] policy.
    pub fn transfer(&mut self, asset_id: AssetId, to: Address) -> RegistryResult<()> {
        let policy = self.recovery_transfer_policy;
        let asset = self
            .assets
            .get_mut(&asset_id)
            .ok_or(RegistryError::AssetNotFound(asset_id))?;

        let transferable = match asset.state {
            AssetState::Active => true,
            AssetState::Recovered => policy == RecoveryTransferPolicy::TransferableImmediately,
            AssetState::Flagged | AssetState::Burned => false,
        };
        if !transferable {
            return Err(RegistryError::BlockedTransfer {
                asset_id,
                state: asset.state,
            });
        }

        let from = asset.owner;
        asset.owner = to;
        if let Some(set) = self.owner_index.get_mut(&from) {
            set.remove(&asset_id);
        }
        self.owner_index.entry(to).or_default().insert(asset_id);
        Ok(())
    }

    /// Look up an asset record by id.
    pub fn asset(&self, asset_id: AssetId) -> Option<&Asset> {
        self.assets.get(&asset_id)
    }

    /// The live record bearing a serial number, if any.
    pub fn asset_by_serial(&self, serial: &SerialNumber) -> Option<AssetId> {
        self.serial_index.get(serial).copied()
    }

    /// All asset ids currently owned by an address, in id order.
    pub fn assets_owned_by(&self, owner: &Address) -> Vec<AssetId> {
        self.owner_index
            .get(owner)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of records ever created.
    pub fn record_count(&self) -> usize {
        self.assets.len()
    }

    /// The append-only audit log.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    // ---- crate-internal access for the security state machine ----

    pub(crate) fn asset_mut(&mut self, asset_id: AssetId) -> RegistryResult<&mut Asset> {
        self.assets
            .get_mut(&asset_id)
            .ok_or(RegistryError::AssetNotFound(asset_id))
    }

    pub(crate) fn audit_mut(&mut self) -> &mut AuditLog {
        &mut self.audit
    }

    /// Insert the replacement record for a restore, rebinding the serial
    /// index and owner index. The caller has already validated states.
    pub(crate) fn insert_restored(
        &mut self,
        serial: SerialNumber,
        owner: Address,
        metadata_ref: [u8; 32],
        predecessor: AssetId,
        now: Timestamp,
    ) -> RegistryResult<AssetId> {
        let id = AssetId::new(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(RegistryError::IdSpaceExhausted)?;

        self.assets.insert(
            id,
            Asset {
                id,
                serial,
                owner,
                state: AssetState::Recovered,
                metadata_ref,
                predecessor: Some(predecessor),
                created_at: now,
            },
        );
        self.serial_index.insert(serial, id);
        self.owner_index.entry(owner).or_default().insert(id);
        Ok(id)
    }

    pub(crate) fn remove_from_owner_index(&mut self, owner: &Address, asset_id: AssetId) {
        if let Some(set) = self.owner_index.get_mut(owner) {
            set.remove(&asset_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    fn serial(s: &str) -> SerialNumber {
        SerialNumber::from_ascii(s).unwrap()
    }

    fn registry() -> AssetRegistry {
        AssetRegistry::new(RecoveryTransferPolicy::RequireReactivate)
    }

    #[test]
    fn test_mint_assigns_monotonic_ids() {
        let mut r = registry();
        let a = r.mint(addr(1), serial("HM-1"), [0u8; 32], addr(9), 0).unwrap();
        let b = r.mint(addr(1), serial("HM-2"), [0u8; 32], addr(9), 0).unwrap();
        assert_eq!(a.raw(), 0);
        assert_eq!(b.raw(), 1);
        assert_eq!(r.asset(a).unwrap().state, AssetState::Active);
    }

    #[test]
    fn test_duplicate_serial_rejected() {
        let mut r = registry();
        r.mint(addr(1), serial("HM-1"), [0u8; 32], addr(9), 0).unwrap();
        let err = r
            .mint(addr(2), serial("HM-1"), [0u8; 32], addr(9), 0)
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateSerial(serial("HM-1")));
    }

    #[test]
    fn test_mint_appends_audit_entry() {
        let mut r = registry();
        let id = r.mint(addr(1), serial("HM-1"), [0u8; 32], addr(9), 42).unwrap();
        let history = r.audit().for_asset(id);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, AuditAction::Mint);
        assert_eq!(history[0].prior_state, None);
        assert_eq!(history[0].new_state, AssetState::Active);
        assert_eq!(history[0].timestamp, 42);
    }

    #[test]
    fn test_transfer_updates_owner_index() {
        let mut r = registry();
        let id = r.mint(addr(1), serial("HM-1"), [0u8; 32], addr(9), 0).unwrap();
        r.transfer(id, addr(2)).unwrap();

        assert_eq!(r.asset(id).unwrap().owner, addr(2));
        assert!(r.assets_owned_by(&addr(1)).is_empty());
        assert_eq!(r.assets_owned_by(&addr(2)), vec![id]);
    }

    #[test]
    fn test_transfer_missing_asset() {
        let mut r = registry();
        let err = r.transfer(AssetId::new(7), addr(2)).unwrap_err();
        assert_eq!(err, RegistryError::AssetNotFound(AssetId::new(7)));
    }

    #[test]
    fn test_lookup_by_serial() {
        let mut r = registry();
        let id = r.mint(addr(1), serial("HM-1"), [0u8; 32], addr(9), 0).unwrap();
        assert_eq!(r.asset_by_serial(&serial("HM-1")), Some(id));
        assert_eq!(r.asset_by_serial(&serial("HM-2")), None);
    }
}
