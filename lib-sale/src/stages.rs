//! Ordered pricing stages.
//!
//! A sale runs through a fixed, totally ordered sequence of stages. Each
//! stage carries a unit price (quote atomic units per whole asset), a
//! capacity in asset atomic units, and a sold counter. Exactly one stage is
//! active while the sale is open; exhausting a stage's capacity activates
//! the next one, and exhausting the last closes the sale.

use lib_types::Amount;
use serde::{Deserialize, Serialize};

use crate::errors::{SaleError, SaleResult};

/// A single priced, capacity-bounded phase of the sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleStage {
    /// Stage identifier; stages are ordered by ascending id
    pub id: u8,
    /// Human-readable stage label (display only)
    pub label: String,
    /// Quote atomic units per whole asset unit
    pub unit_price: Amount,
    /// Stage capacity in asset atomic units
    pub capacity: Amount,
    /// Asset atomic units sold so far
    pub sold: Amount,
    /// Whether this is the currently selling stage
    pub active: bool,
}

impl SaleStage {
    /// Remaining sellable capacity.
    pub fn remaining(&self) -> Amount {
        self.capacity.saturating_sub(self.sold)
    }

    /// Asset quantity (atomic units) purchasable for a quote-currency value.
    ///
    /// Truncates toward zero.
    pub fn assets_for_quote(&self, quote_value: Amount, asset_decimals: u8) -> SaleResult<Amount> {
        if self.unit_price == 0 {
            return Err(SaleError::InvalidParameters(
                "Stage unit price must be positive".to_string(),
            ));
        }
        let scale = (10 as Amount)
            .checked_pow(asset_decimals as u32)
            .ok_or(SaleError::Overflow)?;
        quote_value
            .checked_mul(scale)
            .map(|v| v / self.unit_price)
            .ok_or(SaleError::Overflow)
    }
}

/// Outcome of a capacity consumption, for event emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReceipt {
    /// Stage the quantity was sold from
    pub stage_id: u8,
    /// Stage activated by exact exhaustion, if any
    pub activated: Option<u8>,
    /// True when exhaustion closed the sale (no next stage)
    pub sale_closed: bool,
}

/// The ordered stage table.
///
/// Mutated only through [`StageTable::consume`] and the administrative
/// price/activation operations; `sold` counters are never rewound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTable {
    stages: Vec<SaleStage>,
}

impl StageTable {
    /// Build a validated stage table.
    ///
    /// Stage ids must be strictly increasing, prices and capacities positive,
    /// `sold <= capacity`, and at most one stage active.
    pub fn new(stages: Vec<SaleStage>) -> SaleResult<Self> {
        let mut active_count = 0usize;
        for (i, stage) in stages.iter().enumerate() {
            if stage.unit_price == 0 {
                return Err(SaleError::InvalidParameters(format!(
                    "Stage {} unit price must be positive",
                    stage.id
                )));
            }
            if stage.capacity == 0 {
                return Err(SaleError::InvalidParameters(format!(
                    "Stage {} capacity must be positive",
                    stage.id
                )));
            }
            if stage.sold > stage.capacity {
                return Err(SaleError::InvalidParameters(format!(
                    "Stage {} sold exceeds capacity",
                    stage.id
                )));
            }
            if i > 0 && stages[i - 1].id >= stage.id {
                return Err(SaleError::InvalidParameters(
                    "Stage ids must be strictly increasing".to_string(),
                ));
            }
            if stage.active {
                active_count += 1;
            }
        }
        if active_count > 1 {
            return Err(SaleError::InvalidParameters(
                "At most one stage may be active".to_string(),
            ));
        }
        Ok(Self { stages })
    }

    /// All stages in order.
    pub fn stages(&self) -> &[SaleStage] {
        &self.stages
    }

    /// The currently active stage, if the sale is open.
    pub fn current(&self) -> Option<&SaleStage> {
        self.stages.iter().find(|s| s.active)
    }

    /// Whether no stage is active (sale closed or never opened).
    pub fn is_closed(&self) -> bool {
        self.current().is_none()
    }

    /// Activate the first stage. Fails if any stage is already active.
    pub fn activate_first(&mut self) -> SaleResult<u8> {
        if self.current().is_some() {
            return Err(SaleError::InvalidParameters(
                "A stage is already active".to_string(),
            ));
        }
        let first = self
            .stages
            .first_mut()
            .ok_or(SaleError::StageInactive)?;
        first.active = true;
        Ok(first.id)
    }

    /// Append a future stage to the end of the table.
    ///
    /// The new stage must continue the id ordering and arrive inactive with
    /// nothing sold; it becomes reachable through the normal rollover chain.
    pub fn push_stage(&mut self, stage: SaleStage) -> SaleResult<()> {
        if stage.unit_price == 0 {
            return Err(SaleError::InvalidParameters(
                "Stage unit price must be positive".to_string(),
            ));
        }
        if stage.capacity == 0 {
            return Err(SaleError::InvalidParameters(
                "Stage capacity must be positive".to_string(),
            ));
        }
        if stage.sold != 0 || stage.active {
            return Err(SaleError::InvalidParameters(
                "New stages arrive inactive with nothing sold".to_string(),
            ));
        }
        if let Some(last) = self.stages.last() {
            if last.id >= stage.id {
                return Err(SaleError::InvalidParameters(
                    "Stage ids must be strictly increasing".to_string(),
                ));
            }
        }
        self.stages.push(stage);
        Ok(())
    }

    /// Administrative price update. Never touches `sold`.
    pub fn update_price(&mut self, stage_id: u8, unit_price: Amount) -> SaleResult<Amount> {
        if unit_price == 0 {
            return Err(SaleError::InvalidParameters(
                "Stage unit price must be positive".to_string(),
            ));
        }
        let stage = self
            .stages
            .iter_mut()
            .find(|s| s.id == stage_id)
            .ok_or(SaleError::UnknownStage(stage_id))?;
        let old = stage.unit_price;
        stage.unit_price = unit_price;
        Ok(old)
    }

    /// Consume capacity from the active stage.
    ///
    /// Requires an active stage and `sold + quantity <= capacity`; otherwise
    /// the call fails and the table is unchanged (partial fills are not
    /// permitted). Exact exhaustion deactivates the current stage and
    /// activates the next ordered one; if none exists the sale closes.
    pub fn consume(&mut self, quantity: Amount) -> SaleResult<StageReceipt> {
        if quantity == 0 {
            return Err(SaleError::ZeroAmount);
        }

        let idx = self
            .stages
            .iter()
            .position(|s| s.active)
            .ok_or(SaleError::StageInactive)?;

        let remaining = self.stages[idx].remaining();
        if quantity > remaining {
            return Err(SaleError::CapacityExceeded {
                requested: quantity,
                remaining,
            });
        }

        let stage = &mut self.stages[idx];
        stage.sold = stage.sold.checked_add(quantity).ok_or(SaleError::Overflow)?;
        let stage_id = stage.id;

        if stage.sold == stage.capacity {
            stage.active = false;
            if let Some(next) = self.stages.get_mut(idx + 1) {
                next.active = true;
                return Ok(StageReceipt {
                    stage_id,
                    activated: Some(next.id),
                    sale_closed: false,
                });
            }
            return Ok(StageReceipt {
                stage_id,
                activated: None,
                sale_closed: true,
            });
        }

        Ok(StageReceipt {
            stage_id,
            activated: None,
            sale_closed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_oracle::PRICE_SCALE;

    fn stage(id: u8, capacity: Amount, active: bool) -> SaleStage {
        SaleStage {
            id,
            label: format!("Stage {}", id),
            unit_price: PRICE_SCALE, // 1.0 quote per asset
            capacity,
            sold: 0,
            active,
        }
    }

    fn table() -> StageTable {
        StageTable::new(vec![stage(1, 100, true), stage(2, 200, false)]).unwrap()
    }

    #[test]
    fn test_rejects_two_active_stages() {
        let result = StageTable::new(vec![stage(1, 100, true), stage(2, 200, true)]);
        assert!(matches!(result, Err(SaleError::InvalidParameters(_))));
    }

    #[test]
    fn test_rejects_unordered_ids() {
        let result = StageTable::new(vec![stage(2, 100, true), stage(1, 200, false)]);
        assert!(matches!(result, Err(SaleError::InvalidParameters(_))));
    }

    #[test]
    fn test_consume_updates_sold() {
        let mut t = table();
        let receipt = t.consume(40).unwrap();
        assert_eq!(receipt.stage_id, 1);
        assert_eq!(receipt.activated, None);
        assert_eq!(t.current().unwrap().sold, 40);
    }

    #[test]
    fn test_consume_over_capacity_fails_without_partial_fill() {
        let mut t = table();
        t.consume(90).unwrap();
        let err = t.consume(20).unwrap_err();
        assert_eq!(
            err,
            SaleError::CapacityExceeded {
                requested: 20,
                remaining: 10
            }
        );
        // sold unchanged by the failed call
        assert_eq!(t.current().unwrap().sold, 90);
    }

    #[test]
    fn test_exact_exhaustion_rolls_over() {
        let mut t = table();
        let receipt = t.consume(100).unwrap();
        assert_eq!(receipt.stage_id, 1);
        assert_eq!(receipt.activated, Some(2));
        assert!(!receipt.sale_closed);
        assert_eq!(t.current().unwrap().id, 2);
    }

    #[test]
    fn test_last_stage_exhaustion_closes_sale() {
        let mut t = table();
        t.consume(100).unwrap();
        let receipt = t.consume(200).unwrap();
        assert!(receipt.sale_closed);
        assert!(t.is_closed());
        assert!(matches!(t.consume(1), Err(SaleError::StageInactive)));
    }

    #[test]
    fn test_deactivated_stage_never_reactivates() {
        let mut t = table();
        t.consume(100).unwrap();
        assert!(!t.stages()[0].active);
        // Admin price update must not resurrect it
        t.update_price(1, 2 * PRICE_SCALE).unwrap();
        assert!(!t.stages()[0].active);
        assert_eq!(t.current().unwrap().id, 2);
    }

    #[test]
    fn test_price_update_keeps_sold() {
        let mut t = table();
        t.consume(50).unwrap();
        let old = t.update_price(1, 3 * PRICE_SCALE).unwrap();
        assert_eq!(old, PRICE_SCALE);
        assert_eq!(t.stages()[0].sold, 50);
    }

    #[test]
    fn test_assets_for_quote_truncates() {
        let s = SaleStage {
            id: 1,
            label: "x".to_string(),
            unit_price: 3 * PRICE_SCALE, // 3.0 quote per asset
            capacity: 1_000,
            sold: 0,
            active: true,
        };
        // 10 quote units at 0 asset decimals -> 3 whole assets, truncated
        assert_eq!(s.assets_for_quote(10 * PRICE_SCALE, 0).unwrap(), 3);
    }

    #[test]
    fn test_push_stage_extends_rollover() {
        let mut t = table();
        t.push_stage(stage(3, 50, false)).unwrap();
        t.consume(100).unwrap();
        t.consume(200).unwrap();
        // The appended stage keeps the sale open
        assert_eq!(t.current().unwrap().id, 3);

        assert!(t.push_stage(stage(3, 50, false)).is_err()); // id regression
        assert!(t.push_stage(stage(4, 50, true)).is_err()); // must arrive inactive
    }

    #[test]
    fn test_activate_first() {
        let mut t = StageTable::new(vec![stage(1, 100, false), stage(2, 200, false)]).unwrap();
        assert!(t.is_closed());
        assert_eq!(t.activate_first().unwrap(), 1);
        assert_eq!(t.current().unwrap().id, 1);
        assert!(t.activate_first().is_err());
    }
}
