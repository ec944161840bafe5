//! Facade Errors

use lib_oracle::ConvertError;
use lib_registry::RegistryError;
use lib_sale::SaleError;
use lib_types::Address;
use thiserror::Error;

use crate::config::{ConfigError, CurrencyCode};

/// Error at the host-invocable boundary
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(transparent)]
    Sale(#[from] SaleError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("Currency not accepted: {0}")]
    UnknownCurrency(CurrencyCode),

    #[error("Administrative operation requires the administrator, got {0}")]
    Unauthorized(Address),
}

/// Result type at the boundary
pub type LedgerResult<T> = Result<T, LedgerError>;
