//! Sale Events
//!
//! Every committed sale state change emits an event; these are the source of
//! truth for calling tooling and indexers.

use lib_types::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Sale state-change events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleEvent {
    /// A purchase committed
    Purchased {
        /// Buyer address
        buyer: Address,
        /// Settlement-currency payment amount
        payment: Amount,
        /// Quote-currency value of the payment
        quote_value: Amount,
        /// Asset quantity credited to the buyer
        asset_quantity: Amount,
        /// Stage the quantity was sold from
        stage_id: u8,
        /// Timestamp
        timestamp: Timestamp,
    },

    /// A referral reward accrued
    ReferralAccrued {
        /// Referrer address
        referrer: Address,
        /// The referred buyer
        beneficiary: Address,
        /// Reward credited to the referrer, in settlement units
        reward: Amount,
        /// Timestamp
        timestamp: Timestamp,
    },

    /// A stage was activated by capacity exhaustion
    StageActivated {
        /// Newly active stage
        stage_id: u8,
        /// Timestamp
        timestamp: Timestamp,
    },

    /// The final stage was exhausted; no stage is active
    SaleClosed {
        /// Timestamp
        timestamp: Timestamp,
    },

    /// Administrative stage price update
    StagePriceUpdated {
        /// Stage whose price changed
        stage_id: u8,
        /// Previous unit price
        old_price: Amount,
        /// New unit price
        new_price: Amount,
        /// Timestamp
        timestamp: Timestamp,
    },
}
