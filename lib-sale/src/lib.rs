//! Staged Sale Engine and Purchase Ledger
//!
//! Implements the ordered, capacity-bounded pricing stages and the top-level
//! purchase entry point with referral splits.
//!
//! # Invariants
//! - `sold <= capacity` for every stage, always
//! - At most one stage is active at a time
//! - Stages advance monotonically; a deactivated stage never reactivates
//! - A failed purchase leaves no partial state behind
//!
//! # Key Types
//!
//! - [`SaleStage`] / [`StageTable`]: ordered pricing stages
//! - [`SaleStageEngine`]: quote-to-asset conversion over the current stage
//! - [`PurchaseLedger`]: bounds checking, referral splits, atomic commit

pub mod engine;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod stages;

pub use engine::{SaleStageEngine, QUOTE_DECIMALS};
pub use errors::{SaleError, SaleResult};
pub use events::SaleEvent;
pub use ledger::{
    Purchase, PurchaseLedger, PurchaserRecord, ReferralRecord, MAX_REFERRAL_RATE_BPS,
};
pub use stages::{SaleStage, StageReceipt, StageTable};
