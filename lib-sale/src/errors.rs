//! Sale Errors

use lib_oracle::ConvertError;
use lib_types::Amount;
use thiserror::Error;

/// Error during sale operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaleError {
    #[error("No active sale stage")]
    StageInactive,

    #[error("Stage capacity exceeded: requested {requested}, remaining {remaining}")]
    CapacityExceeded { requested: Amount, remaining: Amount },

    #[error("Payment below minimum purchase: {amount} < {min}")]
    BelowMinimumPurchase { amount: Amount, min: Amount },

    #[error("Payment above maximum purchase: {amount} > {max}")]
    AboveMaximumPurchase { amount: Amount, max: Amount },

    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Invalid stage parameters: {0}")]
    InvalidParameters(String),

    #[error("Unknown stage id: {0}")]
    UnknownStage(u8),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),
}

/// Result type for sale operations
pub type SaleResult<T> = Result<T, SaleError>;
