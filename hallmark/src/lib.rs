//! Hallmark Ledger Facade
//!
//! The host-invocable boundary of the Hallmark asset issuance and protection
//! engine. The hosting ledger processor applies one operation at a time to
//! completion; this crate performs no threading and no async suspension.
//!
//! # Key Types
//!
//! - [`HallmarkLedger`]: the authoritative in-process store and every
//!   boundary operation (buy, mint, flag, burn, restore, lookups, admin)
//! - [`LedgerConfig`]: the administrative configuration surface
//! - [`LedgerEvent`]: the unified event stream for host indexers
//!
//! # Execution
//!
//! Construct with [`HallmarkLedger::new`], then invoke operations with a
//! host-supplied timestamp and price feed. Persist with
//! [`HallmarkLedger::save_to_file`].

pub mod config;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod snapshot;

pub use config::{AcceptedCurrency, ConfigError, CurrencyCode, LedgerConfig, StageParams};
pub use errors::{LedgerError, LedgerResult};
pub use events::LedgerEvent;
pub use ledger::{BuyOutcome, HallmarkLedger, StageInfo};
pub use snapshot::SnapshotError;
