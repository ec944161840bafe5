//! Ledger configuration.
//!
//! Everything the administrator fixes at deployment: purchase bounds,
//! referral rate, stage parameters, oracle fallback and staleness, batch
//! size, accepted alternate currencies, and the recovered-asset transfer
//! policy. Validated once before the ledger is constructed.

use lib_registry::RecoveryTransferPolicy;
use lib_sale::MAX_REFERRAL_RATE_BPS;
use lib_types::{Address, Amount, Bps};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Configuration validation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("min_purchase exceeds max_purchase")]
    InvertedPurchaseBounds,

    #[error("Referral rate {0} bps exceeds cap {MAX_REFERRAL_RATE_BPS}")]
    ReferralRateTooHigh(Bps),

    #[error("Fallback price must be positive")]
    ZeroFallbackPrice,

    #[error("Batch size must be positive")]
    ZeroBatchSize,

    #[error("At least one stage is required")]
    NoStages,

    #[error("Stage {0}: {1}")]
    BadStage(u8, String),

    #[error("Duplicate accepted currency: {0}")]
    DuplicateCurrency(CurrencyCode),

    #[error("Currency {0}: quote rate must be positive")]
    ZeroCurrencyRate(CurrencyCode),
}

/// Short ASCII code identifying an accepted alternate currency
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
pub struct CurrencyCode(pub [u8; 8]);

impl CurrencyCode {
    /// Create a code from an ASCII string of at most 8 bytes.
    pub fn from_ascii(s: &str) -> Option<Self> {
        if s.is_empty() || s.len() > 8 || !s.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 8];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Some(Self(bytes))
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrencyCode({})", self)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(8);
        match std::str::from_utf8(&self.0[..end]) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{}", hex::encode(&self.0[..end])),
        }
    }
}

/// An alternate currency accepted at the buy boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedCurrency {
    /// Currency code
    pub code: CurrencyCode,
    /// Atomic precision of the currency
    pub decimals: u8,
    /// Quote-currency value of one whole unit, at the oracle price scale
    pub quote_rate: Amount,
}

/// Stage parameters as configured, before any capacity is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageParams {
    pub id: u8,
    pub label: String,
    /// Quote atomic units per whole asset
    pub unit_price: Amount,
    /// Capacity in asset atomic units
    pub capacity: Amount,
}

/// Full deployment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Treasury/administrator authority
    pub administrator: Address,
    /// Minimum accepted payment, settlement atomic units
    pub min_purchase: Amount,
    /// Maximum accepted payment, settlement atomic units
    pub max_purchase: Amount,
    /// Referral reward rate, capped at [`MAX_REFERRAL_RATE_BPS`]
    pub referral_rate_bps: Bps,
    /// Administrator-set price used when the oracle is absent or stale
    pub fallback_price: Amount,
    /// Maximum accepted oracle reading age in seconds
    pub staleness_threshold_secs: u64,
    /// Asset ids per monitored batch
    pub batch_size: u64,
    /// Atomic precision of the settlement currency
    pub settlement_decimals: u8,
    /// Atomic precision of the sale asset
    pub asset_decimals: u8,
    /// Whether recovered assets transfer before reactivation
    pub recovery_transfer_policy: RecoveryTransferPolicy,
    /// Ordered sale stages; the first is activated at construction
    pub stages: Vec<StageParams>,
    /// Alternate currencies accepted at the buy boundary
    pub accepted_currencies: Vec<AcceptedCurrency>,
}

impl LedgerConfig {
    /// Validate the configuration as a whole.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_purchase > self.max_purchase {
            return Err(ConfigError::InvertedPurchaseBounds);
        }
        if self.referral_rate_bps > MAX_REFERRAL_RATE_BPS {
            return Err(ConfigError::ReferralRateTooHigh(self.referral_rate_bps));
        }
        if self.fallback_price == 0 {
            return Err(ConfigError::ZeroFallbackPrice);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.stages.is_empty() {
            return Err(ConfigError::NoStages);
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.unit_price == 0 {
                return Err(ConfigError::BadStage(
                    stage.id,
                    "unit price must be positive".to_string(),
                ));
            }
            if stage.capacity == 0 {
                return Err(ConfigError::BadStage(
                    stage.id,
                    "capacity must be positive".to_string(),
                ));
            }
            if i > 0 && self.stages[i - 1].id >= stage.id {
                return Err(ConfigError::BadStage(
                    stage.id,
                    "ids must be strictly increasing".to_string(),
                ));
            }
        }
        for (i, currency) in self.accepted_currencies.iter().enumerate() {
            if currency.quote_rate == 0 {
                return Err(ConfigError::ZeroCurrencyRate(currency.code));
            }
            if self.accepted_currencies[..i]
                .iter()
                .any(|c| c.code == currency.code)
            {
                return Err(ConfigError::DuplicateCurrency(currency.code));
            }
        }
        Ok(())
    }
}
