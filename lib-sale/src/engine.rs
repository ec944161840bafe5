//! Sale stage engine: quote-to-asset pricing over the current stage.

use lib_oracle::{convert, OracleQuote, PRICE_SCALE};
use lib_types::Amount;
use serde::{Deserialize, Serialize};

use crate::errors::{SaleError, SaleResult};
use crate::stages::{StageReceipt, StageTable};

/// Quote-currency atomic precision (fixed at the oracle price scale).
pub const QUOTE_DECIMALS: u8 = 8;

/// Pricing engine over the ordered stage table.
///
/// Stage prices are defined in quote-currency terms; settlement-currency
/// payments are converted through a [`OracleQuote`] taken once per host
/// operation. Because conversion happens at read time, a live oracle price
/// reprices every stage immediately without touching `sold` counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleStageEngine {
    stages: StageTable,
    /// Atomic precision of the settlement currency buyers pay with
    settlement_decimals: u8,
    /// Atomic precision of the sale asset
    asset_decimals: u8,
}

impl SaleStageEngine {
    pub fn new(stages: StageTable, settlement_decimals: u8, asset_decimals: u8) -> Self {
        Self {
            stages,
            settlement_decimals,
            asset_decimals,
        }
    }

    pub fn stages(&self) -> &StageTable {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut StageTable {
        &mut self.stages
    }

    pub fn asset_decimals(&self) -> u8 {
        self.asset_decimals
    }

    pub fn settlement_decimals(&self) -> u8 {
        self.settlement_decimals
    }

    /// Convert a settlement-currency payment into its quote-currency value.
    pub fn quote_value(&self, payment: Amount, quote: &OracleQuote) -> SaleResult<Amount> {
        Ok(convert(
            payment,
            quote.value,
            self.settlement_decimals,
            QUOTE_DECIMALS,
        )?)
    }

    /// Asset quantity purchasable for a settlement-currency payment.
    ///
    /// Fails with [`SaleError::StageInactive`] when the sale is closed.
    pub fn quote_for(&self, payment: Amount, quote: &OracleQuote) -> SaleResult<Amount> {
        let stage = self.stages.current().ok_or(SaleError::StageInactive)?;
        let quote_value = self.quote_value(payment, quote)?;
        stage.assets_for_quote(quote_value, self.asset_decimals)
    }

    /// Current stage unit price expressed in settlement atomic units.
    pub fn price_in_settlement(&self, quote: &OracleQuote) -> SaleResult<Amount> {
        let stage = self.stages.current().ok_or(SaleError::StageInactive)?;
        // settlement = quote / (settlement->quote price)
        let inverse = PRICE_SCALE
            .checked_mul(PRICE_SCALE)
            .and_then(|v| v.checked_div(quote.value))
            .ok_or(SaleError::Overflow)?;
        Ok(convert(
            stage.unit_price,
            inverse,
            QUOTE_DECIMALS,
            self.settlement_decimals,
        )?)
    }

    /// Consume capacity from the active stage. See [`StageTable::consume`].
    pub fn consume_capacity(&mut self, quantity: Amount) -> SaleResult<StageReceipt> {
        self.stages.consume(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::SaleStage;

    fn quote(value: Amount) -> OracleQuote {
        OracleQuote {
            value,
            observed_at: 1_000,
            from_oracle: true,
        }
    }

    fn engine(unit_price: Amount) -> SaleStageEngine {
        let table = StageTable::new(vec![SaleStage {
            id: 1,
            label: "Founders".to_string(),
            unit_price,
            capacity: 1_000 * PRICE_SCALE,
            sold: 0,
            active: true,
        }])
        .unwrap();
        // settlement and asset both 8 decimals
        SaleStageEngine::new(table, 8, 8)
    }

    #[test]
    fn test_quote_for_identity_price() {
        // oracle 1.0, stage price 1.0 -> 1:1
        let e = engine(PRICE_SCALE);
        let qty = e.quote_for(150 * PRICE_SCALE, &quote(PRICE_SCALE)).unwrap();
        assert_eq!(qty, 150 * PRICE_SCALE);
    }

    #[test]
    fn test_quote_for_uses_oracle_price() {
        // settlement worth 2.0 quote each, stage price 0.5 quote per asset
        let e = engine(PRICE_SCALE / 2);
        let qty = e
            .quote_for(10 * PRICE_SCALE, &quote(2 * PRICE_SCALE))
            .unwrap();
        // 10 settlement -> 20 quote -> 40 assets
        assert_eq!(qty, 40 * PRICE_SCALE);
    }

    #[test]
    fn test_quote_for_closed_sale() {
        let mut e = engine(PRICE_SCALE);
        e.consume_capacity(1_000 * PRICE_SCALE).unwrap();
        let err = e
            .quote_for(PRICE_SCALE, &quote(PRICE_SCALE))
            .unwrap_err();
        assert_eq!(err, SaleError::StageInactive);
    }

    #[test]
    fn test_price_in_settlement() {
        // stage price 2.0 quote per asset, settlement worth 4.0 quote
        let e = engine(2 * PRICE_SCALE);
        let p = e.price_in_settlement(&quote(4 * PRICE_SCALE)).unwrap();
        // one asset costs 0.5 settlement
        assert_eq!(p, PRICE_SCALE / 2);
    }
}
