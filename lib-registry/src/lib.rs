//! Serialized Asset Registry and Protection Lifecycle
//!
//! Issues unique serialized assets and enforces the theft-response protocol
//! over them:
//!
//! ```text
//! Active --flag--> Flagged --burn--> Burned --restore--> Recovered --reactivate--> Active
//! ```
//!
//! # Invariants
//! - A serial number is bound to at most one live asset record, forever
//! - Asset ids increase monotonically and are never reused
//! - Every state transition appends exactly one audit entry
//! - Transitions from a non-source state fail with no side effects
//!
//! # Key Types
//!
//! - [`AssetRegistry`]: asset records, serial index, owner index, audit log
//! - [`SecurityStateMachine`]: authorization-gated lifecycle transitions
//! - [`BatchMonitorAssignment`]: id-space partitioning into monitored batches

pub mod audit;
pub mod batches;
pub mod errors;
pub mod registry;
pub mod security;

pub use audit::{AuditAction, AuditEntry, AuditLog, DenialRecord, FlagReason};
pub use batches::{BatchMonitorAssignment, DEFAULT_BATCH_SIZE};
pub use errors::{RegistryError, RegistryResult};
pub use registry::{Asset, AssetRegistry, AssetState, RecoveryTransferPolicy};
pub use security::SecurityStateMachine;
