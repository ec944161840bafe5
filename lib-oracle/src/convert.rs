//! Fixed-point currency conversion.
//!
//! All prices are expressed at [`PRICE_SCALE`] (8 decimals). Conversions
//! honor each currency's declared decimal precision and truncate toward
//! zero; rounding never favors the buyer beyond that truncation.

use lib_types::Amount;
use thiserror::Error;

/// Fixed-point scale for oracle prices (8 decimals).
pub const PRICE_SCALE: Amount = 100_000_000;

/// Error during fixed-point conversion
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Arithmetic overflow converting {amount} at price {price}")]
    Overflow { amount: Amount, price: Amount },

    #[error("Price must be positive")]
    ZeroPrice,
}

/// Convert `amount` of currency A into currency B.
///
/// `price_a_to_b` is the value of one whole unit of A in B, at
/// [`PRICE_SCALE`]. `decimals_a`/`decimals_b` are the atomic-unit precisions
/// of the two currencies.
///
/// Formula: `amount * price * 10^decimals_b / (PRICE_SCALE * 10^decimals_a)`,
/// truncating.
pub fn convert(
    amount: Amount,
    price_a_to_b: Amount,
    decimals_a: u8,
    decimals_b: u8,
) -> Result<Amount, ConvertError> {
    if price_a_to_b == 0 {
        return Err(ConvertError::ZeroPrice);
    }
    let overflow = ConvertError::Overflow {
        amount,
        price: price_a_to_b,
    };

    let numer = amount
        .checked_mul(price_a_to_b)
        .and_then(|v| v.checked_mul(pow10(decimals_b)?))
        .ok_or(overflow.clone())?;

    let denom = pow10(decimals_a)
        .and_then(|scale| PRICE_SCALE.checked_mul(scale))
        .ok_or(overflow)?;

    Ok(numer / denom)
}

fn pow10(exp: u8) -> Option<Amount> {
    (10 as Amount).checked_pow(exp as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_conversion() {
        // price 1.0, same decimals
        let out = convert(1_000, PRICE_SCALE, 8, 8).unwrap();
        assert_eq!(out, 1_000);
    }

    #[test]
    fn test_price_conversion_scales() {
        // 2 units of A at price 3.5 A/B, both 8 decimals
        let two_a = 2 * PRICE_SCALE;
        let price = 3 * PRICE_SCALE + PRICE_SCALE / 2;
        let out = convert(two_a, price, 8, 8).unwrap();
        assert_eq!(out, 7 * PRICE_SCALE);
    }

    #[test]
    fn test_decimal_mismatch() {
        // 1 whole unit of an 18-decimal currency at price 1.0 into an
        // 8-decimal currency
        let one_a: Amount = 1_000_000_000_000_000_000;
        let out = convert(one_a, PRICE_SCALE, 18, 8).unwrap();
        assert_eq!(out, PRICE_SCALE);
    }

    #[test]
    fn test_truncates_toward_zero() {
        // 1 atomic unit at price 0.9 truncates to 0
        let price = 9 * PRICE_SCALE / 10;
        assert_eq!(convert(1, price, 8, 8).unwrap(), 0);
    }

    #[test]
    fn test_zero_price_rejected() {
        assert_eq!(convert(100, 0, 8, 8), Err(ConvertError::ZeroPrice));
    }

    #[test]
    fn test_overflow_detected() {
        let result = convert(Amount::MAX, PRICE_SCALE, 8, 8);
        assert!(matches!(result, Err(ConvertError::Overflow { .. })));
    }
}
