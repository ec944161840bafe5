//! Registry Errors

use lib_types::{Address, AssetId, SerialNumber};
use thiserror::Error;

use crate::audit::AuditAction;
use crate::registry::AssetState;

/// Error during registry and protection operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Serial number already bound: {0}")]
    DuplicateSerial(SerialNumber),

    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    #[error("Transfer blocked: asset {asset_id} is {state:?}")]
    BlockedTransfer { asset_id: AssetId, state: AssetState },

    #[error("Actor {actor} is not the monitor for asset {asset_id}")]
    UnauthorizedMonitor { asset_id: AssetId, actor: Address },

    #[error("Actor {actor} is not the administrator")]
    UnauthorizedAdministrator { actor: Address },

    #[error("Invalid state transition: {action:?} from {from:?} on asset {asset_id}")]
    InvalidStateTransition {
        asset_id: AssetId,
        from: AssetState,
        action: AuditAction,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Asset id space exhausted")]
    IdSpaceExhausted,
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
