//! End-to-end sale flows through the host-invocable boundary.

use hallmark::{AcceptedCurrency, CurrencyCode, HallmarkLedger, LedgerConfig, LedgerError, StageParams};
use lib_oracle::{FeedReading, PriceFeed, PRICE_SCALE};
use lib_registry::RecoveryTransferPolicy;
use lib_sale::SaleError;
use lib_types::{Address, Amount};

struct FixedFeed(Option<FeedReading>);

impl PriceFeed for FixedFeed {
    fn latest(&self) -> Option<FeedReading> {
        self.0
    }
}

fn live_feed(value: Amount, updated_at: u64) -> FixedFeed {
    FixedFeed(Some(FeedReading { value, updated_at }))
}

fn addr(b: u8) -> Address {
    Address::new([b; 32])
}

fn admin() -> Address {
    addr(9)
}

/// Single stage: 100 whole assets at 1.0 quote each; whole-unit asset
/// precision so quantities read directly.
fn config() -> LedgerConfig {
    LedgerConfig {
        administrator: admin(),
        min_purchase: 1,
        max_purchase: 10_000 * PRICE_SCALE,
        referral_rate_bps: 500,
        fallback_price: PRICE_SCALE,
        staleness_threshold_secs: 300,
        batch_size: 100,
        settlement_decimals: 8,
        asset_decimals: 0,
        recovery_transfer_policy: RecoveryTransferPolicy::RequireReactivate,
        stages: vec![StageParams {
            id: 1,
            label: "Founders".to_string(),
            unit_price: PRICE_SCALE,
            capacity: 100,
        }],
        accepted_currencies: vec![],
    }
}

#[test]
fn overshooting_tender_fills_remaining_capacity_and_closes_sale() {
    let mut ledger = HallmarkLedger::new(config()).unwrap();
    let feed = live_feed(PRICE_SCALE, 1_000);

    let outcome = ledger
        .buy(addr(1), 150 * PRICE_SCALE, None, &feed, 1_000)
        .unwrap();
    assert_eq!(outcome.asset_quantity, 100);
    assert_eq!(outcome.charged, 100 * PRICE_SCALE);
    assert_eq!(outcome.refund, 50 * PRICE_SCALE);
    assert!(outcome.oracle_healthy);
    assert!(ledger.is_sale_closed());

    let err = ledger
        .buy(addr(2), 10 * PRICE_SCALE, None, &feed, 1_001)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Sale(SaleError::StageInactive)));
}

#[test]
fn referral_splits_five_percent_to_referrer() {
    let mut ledger = HallmarkLedger::new(config()).unwrap();
    let feed = live_feed(PRICE_SCALE, 1_000);
    let buyer = addr(1);
    let referrer = addr(2);

    let outcome = ledger
        .buy(buyer, 100 * PRICE_SCALE, Some(referrer), &feed, 1_000)
        .unwrap();

    assert_eq!(outcome.referral_reward, 5 * PRICE_SCALE);
    assert_eq!(outcome.net_to_treasury, 95 * PRICE_SCALE);
    assert_eq!(ledger.treasury_total(), 95 * PRICE_SCALE);

    let records = ledger.referral_records(&referrer);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].beneficiary, buyer);
    assert_eq!(records[0].accrued_reward, 5 * PRICE_SCALE);
}

#[test]
fn stale_feed_prices_with_fallback_and_reports_degraded() {
    let mut ledger = HallmarkLedger::new(config()).unwrap();
    // Reading is 400 seconds old against a 300 second threshold
    let feed = live_feed(5 * PRICE_SCALE, 600);

    let info = ledger.current_stage_info(&feed, 1_000).unwrap();
    assert!(!info.oracle_healthy);
    // Fallback price is 1.0, so one asset costs exactly one settlement unit
    assert_eq!(info.unit_price_settlement, PRICE_SCALE);

    let outcome = ledger
        .buy(addr(1), 10 * PRICE_SCALE, None, &feed, 1_000)
        .unwrap();
    assert!(!outcome.oracle_healthy);
    assert_eq!(outcome.asset_quantity, 10);
}

#[test]
fn quote_calculation_matches_actual_purchase() {
    let mut ledger = HallmarkLedger::new(config()).unwrap();
    let feed = live_feed(2 * PRICE_SCALE, 1_000);

    let (predicted, healthy) = ledger
        .calculate_assets_for_payment(10 * PRICE_SCALE, &feed, 1_000)
        .unwrap();
    assert!(healthy);

    let outcome = ledger
        .buy(addr(1), 10 * PRICE_SCALE, None, &feed, 1_000)
        .unwrap();
    assert_eq!(outcome.asset_quantity, predicted);
    // 10 settlement at 2.0 quote each buys 20 assets at 1.0 quote
    assert_eq!(predicted, 20);
}

#[test]
fn alternate_currency_buy_matches_quote_equivalence() {
    let mut cfg = config();
    let code = CurrencyCode::from_ascii("USDX").unwrap();
    cfg.accepted_currencies = vec![AcceptedCurrency {
        code,
        decimals: 6,
        quote_rate: PRICE_SCALE, // 1 USDX = 1 quote unit
    }];
    let mut ledger = HallmarkLedger::new(cfg).unwrap();
    let feed = live_feed(PRICE_SCALE, 1_000);

    // 100 whole USDX at 6 decimals
    let outcome = ledger
        .buy_with_alternate_currency(addr(1), code, 100_000_000, None, &feed, 1_000)
        .unwrap();
    assert_eq!(outcome.asset_quantity, 100);

    let unknown = CurrencyCode::from_ascii("XYZ").unwrap();
    let err = ledger
        .buy_with_alternate_currency(addr(2), unknown, 1_000_000, None, &feed, 1_001)
        .unwrap_err();
    assert!(matches!(err, LedgerError::UnknownCurrency(_)));
}

#[test]
fn stage_price_update_is_admin_gated_and_keeps_sold() {
    let mut ledger = HallmarkLedger::new(config()).unwrap();
    let feed = live_feed(PRICE_SCALE, 1_000);
    ledger.buy(addr(1), 40 * PRICE_SCALE, None, &feed, 1_000).unwrap();

    let err = ledger
        .update_stage_price(1, 2 * PRICE_SCALE, addr(5), 1_001)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));

    ledger
        .update_stage_price(1, 2 * PRICE_SCALE, admin(), 1_001)
        .unwrap();
    let info = ledger.current_stage_info(&feed, 1_002).unwrap();
    assert_eq!(info.unit_price_quote, 2 * PRICE_SCALE);
    assert_eq!(info.sold, 40);

    // Purchases now price at the updated rate
    let outcome = ledger
        .buy(addr(2), 10 * PRICE_SCALE, None, &feed, 1_003)
        .unwrap();
    assert_eq!(outcome.asset_quantity, 5);
}

#[test]
fn appended_stage_keeps_sale_open_past_exhaustion() {
    let mut ledger = HallmarkLedger::new(config()).unwrap();
    let feed = live_feed(PRICE_SCALE, 1_000);
    ledger
        .add_stage(
            StageParams {
                id: 2,
                label: "Public".to_string(),
                unit_price: 2 * PRICE_SCALE,
                capacity: 200,
            },
            admin(),
        )
        .unwrap();

    ledger.buy(addr(1), 100 * PRICE_SCALE, None, &feed, 1_000).unwrap();
    assert!(!ledger.is_sale_closed());
    let info = ledger.current_stage_info(&feed, 1_001).unwrap();
    assert_eq!(info.stage_id, 2);

    // Id regression is rejected
    let err = ledger
        .add_stage(
            StageParams {
                id: 2,
                label: "Dup".to_string(),
                unit_price: PRICE_SCALE,
                capacity: 10,
            },
            admin(),
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Sale(SaleError::InvalidParameters(_))));
}

#[test]
fn referral_rate_above_cap_is_rejected() {
    let mut cfg = config();
    cfg.referral_rate_bps = 1_500;
    assert!(HallmarkLedger::new(cfg).is_err());

    let mut ledger = HallmarkLedger::new(config()).unwrap();
    let err = ledger.set_referral_rate(1_500, admin()).unwrap_err();
    assert!(matches!(err, LedgerError::Sale(SaleError::InvalidParameters(_))));
}

#[test]
fn purchase_bounds_enforced_at_boundary() {
    let mut ledger = HallmarkLedger::new(config()).unwrap();
    ledger
        .set_purchase_bounds(10 * PRICE_SCALE, 50 * PRICE_SCALE, admin())
        .unwrap();
    let feed = live_feed(PRICE_SCALE, 1_000);

    let below = ledger.buy(addr(1), 5 * PRICE_SCALE, None, &feed, 1_000);
    assert!(matches!(
        below,
        Err(LedgerError::Sale(SaleError::BelowMinimumPurchase { .. }))
    ));

    let above = ledger.buy(addr(1), 60 * PRICE_SCALE, None, &feed, 1_000);
    assert!(matches!(
        above,
        Err(LedgerError::Sale(SaleError::AboveMaximumPurchase { .. }))
    ));
}
