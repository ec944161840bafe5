//! Purchase Ledger
//!
//! Top-level sale entry point: validates purchase bounds, prices the payment
//! through the stage engine, applies referral splits, and commits buyer
//! balances atomically.
//!
//! # Atomicity
//!
//! All effects of a purchase commit together or not at all. Capacity is
//! consumed against a working copy of the stage table; the copy replaces the
//! live table only after every check has passed, so a failed purchase leaves
//! no partial state behind.

use std::collections::BTreeMap;

use lib_oracle::OracleQuote;
use lib_types::{Address, Amount, Bps, Timestamp, MAX_BPS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::SaleStageEngine;
use crate::errors::{SaleError, SaleResult};
use crate::events::SaleEvent;

/// Maximum configurable referral rate (10%)
pub const MAX_REFERRAL_RATE_BPS: Bps = 1_000;

/// Cumulative per-buyer totals. Monotonically non-decreasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaserRecord {
    /// Asset atomic units purchased over the buyer's lifetime
    pub assets_purchased: Amount,
    /// Quote-currency value contributed over the buyer's lifetime
    pub quote_contributed: Amount,
}

/// Accrued referral reward for one referrer/beneficiary pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralRecord {
    /// The referring address
    pub referrer: Address,
    /// The referred buyer; never equal to `referrer`
    pub beneficiary: Address,
    /// Total reward accrued, in settlement atomic units
    pub accrued_reward: Amount,
}

/// Result of a committed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    /// Asset atomic units credited to the buyer
    pub asset_quantity: Amount,
    /// Settlement amount actually accepted; less than the tender when the
    /// purchase was clipped to the stage's remaining capacity
    pub charged: Amount,
    /// Unaccepted remainder of the tender, returned to the buyer
    pub refund: Amount,
    /// Quote-currency value of the charged amount
    pub quote_value: Amount,
    /// Referral reward split off the charged amount, in settlement units
    pub referral_reward: Amount,
    /// Charged amount net of the referral reward, attributed to treasury
    pub net_to_treasury: Amount,
}

/// The purchase ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLedger {
    engine: SaleStageEngine,
    /// Minimum accepted payment, settlement atomic units
    min_purchase: Amount,
    /// Maximum accepted payment, settlement atomic units
    max_purchase: Amount,
    /// Referral reward rate in basis points, capped at [`MAX_REFERRAL_RATE_BPS`]
    referral_rate_bps: Bps,
    purchasers: BTreeMap<Address, PurchaserRecord>,
    referrals: BTreeMap<Address, Vec<ReferralRecord>>,
    /// Running settlement-currency total attributed to treasury
    treasury_total: Amount,
}

impl PurchaseLedger {
    pub fn new(
        engine: SaleStageEngine,
        min_purchase: Amount,
        max_purchase: Amount,
        referral_rate_bps: Bps,
    ) -> SaleResult<Self> {
        if min_purchase > max_purchase {
            return Err(SaleError::InvalidParameters(
                "min_purchase exceeds max_purchase".to_string(),
            ));
        }
        if referral_rate_bps > MAX_REFERRAL_RATE_BPS {
            return Err(SaleError::InvalidParameters(format!(
                "Referral rate {} bps exceeds cap {}",
                referral_rate_bps, MAX_REFERRAL_RATE_BPS
            )));
        }
        Ok(Self {
            engine,
            min_purchase,
            max_purchase,
            referral_rate_bps,
            purchasers: BTreeMap::new(),
            referrals: BTreeMap::new(),
            treasury_total: 0,
        })
    }

    pub fn engine(&self) -> &SaleStageEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SaleStageEngine {
        &mut self.engine
    }

    pub fn min_purchase(&self) -> Amount {
        self.min_purchase
    }

    pub fn max_purchase(&self) -> Amount {
        self.max_purchase
    }

    pub fn referral_rate_bps(&self) -> Bps {
        self.referral_rate_bps
    }

    pub fn treasury_total(&self) -> Amount {
        self.treasury_total
    }

    /// Cumulative record for a buyer, if any.
    pub fn purchaser(&self, address: &Address) -> Option<&PurchaserRecord> {
        self.purchasers.get(address)
    }

    /// Referral records accrued by a referrer.
    pub fn referral_records(&self, referrer: &Address) -> &[ReferralRecord] {
        self.referrals.get(referrer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Administrative update of the purchase bounds.
    pub fn set_purchase_bounds(&mut self, min: Amount, max: Amount) -> SaleResult<()> {
        if min > max {
            return Err(SaleError::InvalidParameters(
                "min_purchase exceeds max_purchase".to_string(),
            ));
        }
        self.min_purchase = min;
        self.max_purchase = max;
        Ok(())
    }

    /// Administrative update of the referral rate. The cap is enforced here,
    /// not at call sites.
    pub fn set_referral_rate(&mut self, rate_bps: Bps) -> SaleResult<()> {
        if rate_bps > MAX_REFERRAL_RATE_BPS {
            return Err(SaleError::InvalidParameters(format!(
                "Referral rate {} bps exceeds cap {}",
                rate_bps, MAX_REFERRAL_RATE_BPS
            )));
        }
        self.referral_rate_bps = rate_bps;
        Ok(())
    }

    /// Execute a purchase.
    ///
    /// Preconditions: `min_purchase <= payment <= max_purchase` and a tender
    /// large enough to buy at least one atomic asset unit. A tender that
    /// overshoots the stage's remaining capacity is clipped: the remaining
    /// quantity fills, the unaccepted remainder comes back as a refund, and
    /// exact exhaustion advances the stage. A referrer equal to the buyer
    /// earns no reward. On success returns the committed [`Purchase`] and
    /// the events it produced.
    pub fn purchase(
        &mut self,
        buyer: Address,
        payment: Amount,
        referrer: Option<Address>,
        quote: &OracleQuote,
        now: Timestamp,
    ) -> SaleResult<(Purchase, Vec<SaleEvent>)> {
        // ---- Validation phase: no state is touched until commit ----
        if payment == 0 {
            return Err(SaleError::ZeroAmount);
        }
        if payment < self.min_purchase {
            return Err(SaleError::BelowMinimumPurchase {
                amount: payment,
                min: self.min_purchase,
            });
        }
        if payment > self.max_purchase {
            return Err(SaleError::AboveMaximumPurchase {
                amount: payment,
                max: self.max_purchase,
            });
        }

        let full_quantity = self.engine.quote_for(payment, quote)?;
        if full_quantity == 0 {
            return Err(SaleError::ZeroAmount);
        }

        // Clip to the remaining capacity of the current stage. quote_for
        // succeeded, so a current stage exists.
        let remaining = self
            .engine
            .stages()
            .current()
            .ok_or(SaleError::StageInactive)?
            .remaining();
        let (asset_quantity, charged) = if full_quantity > remaining {
            (remaining, prorate(payment, remaining, full_quantity)?)
        } else {
            (full_quantity, payment)
        };
        let refund = payment.checked_sub(charged).ok_or(SaleError::Overflow)?;
        let quote_value = self.engine.quote_value(charged, quote)?;

        // Stage capacity against a working copy; commit replaces the table.
        let mut staged = self.engine.stages().clone();
        let receipt = staged.consume(asset_quantity)?;

        let referral_to = referrer.filter(|r| *r != buyer);
        let reward = match referral_to {
            Some(_) => mul_bps(charged, self.referral_rate_bps)?,
            None => 0,
        };
        let net_to_treasury = charged.checked_sub(reward).ok_or(SaleError::Overflow)?;

        let prior = self.purchasers.get(&buyer).copied().unwrap_or_default();
        let new_record = PurchaserRecord {
            assets_purchased: prior
                .assets_purchased
                .checked_add(asset_quantity)
                .ok_or(SaleError::Overflow)?,
            quote_contributed: prior
                .quote_contributed
                .checked_add(quote_value)
                .ok_or(SaleError::Overflow)?,
        };
        let new_treasury = self
            .treasury_total
            .checked_add(net_to_treasury)
            .ok_or(SaleError::Overflow)?;

        // ---- Commit phase: infallible from here on ----
        *self.engine.stages_mut() = staged;
        self.purchasers.insert(buyer, new_record);
        self.treasury_total = new_treasury;

        let mut events = vec![SaleEvent::Purchased {
            buyer,
            payment: charged,
            quote_value,
            asset_quantity,
            stage_id: receipt.stage_id,
            timestamp: now,
        }];

        if let (Some(referrer), true) = (referral_to, reward > 0) {
            self.accrue_referral(referrer, buyer, reward);
            events.push(SaleEvent::ReferralAccrued {
                referrer,
                beneficiary: buyer,
                reward,
                timestamp: now,
            });
        }

        if let Some(next) = receipt.activated {
            events.push(SaleEvent::StageActivated {
                stage_id: next,
                timestamp: now,
            });
        }
        if receipt.sale_closed {
            events.push(SaleEvent::SaleClosed { timestamp: now });
        }

        debug!(
            buyer = %buyer,
            charged = charged as u64,
            refund = refund as u64,
            asset_quantity = asset_quantity as u64,
            stage_id = receipt.stage_id,
            "purchase committed"
        );

        Ok((
            Purchase {
                asset_quantity,
                charged,
                refund,
                quote_value,
                referral_reward: reward,
                net_to_treasury,
            },
            events,
        ))
    }

    fn accrue_referral(&mut self, referrer: Address, beneficiary: Address, reward: Amount) {
        let records = self.referrals.entry(referrer).or_default();
        match records.iter_mut().find(|r| r.beneficiary == beneficiary) {
            Some(record) => {
                record.accrued_reward = record.accrued_reward.saturating_add(reward);
            }
            None => records.push(ReferralRecord {
                referrer,
                beneficiary,
                accrued_reward: reward,
            }),
        }
    }
}

fn mul_bps(amount: Amount, bps: Bps) -> SaleResult<Amount> {
    amount
        .checked_mul(bps as Amount)
        .map(|v| v / MAX_BPS as Amount)
        .ok_or(SaleError::Overflow)
}

/// Charged portion of a tender when only `filled` of `requested` units fit.
/// Truncates in the treasury's disfavor.
fn prorate(payment: Amount, filled: Amount, requested: Amount) -> SaleResult<Amount> {
    payment
        .checked_mul(filled)
        .map(|v| v / requested)
        .ok_or(SaleError::Overflow)
}
