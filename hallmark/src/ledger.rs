//! The Hallmark ledger facade.
//!
//! One authoritative in-process store behind an explicit interface. Every
//! host-invocable operation lives here; all mutation funnels through these
//! methods, never through shared ambient globals. The host serializes
//! operations: one at a time, to completion, commit or full rollback.

use lib_oracle::{convert, OracleQuote, PriceFeed, PriceOracleAdapter, PRICE_SCALE};
use lib_registry::{
    AssetRegistry, BatchMonitorAssignment, FlagReason, RegistryError, SecurityStateMachine,
};
use lib_sale::{
    PurchaseLedger, PurchaserRecord, ReferralRecord, SaleStage, SaleStageEngine, StageTable,
    QUOTE_DECIMALS,
};
use lib_types::{Address, Amount, AssetId, Bps, SerialNumber, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{AcceptedCurrency, CurrencyCode, LedgerConfig};
use crate::errors::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;

/// Result of a committed buy operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyOutcome {
    /// Asset atomic units credited to the buyer
    pub asset_quantity: Amount,
    /// Settlement amount actually accepted
    pub charged: Amount,
    /// Unaccepted remainder of the tender, returned to the buyer
    pub refund: Amount,
    /// Quote-currency value of the charged amount
    pub quote_value: Amount,
    /// Referral reward split off the charged amount
    pub referral_reward: Amount,
    /// Charged amount net of the reward, attributed to treasury
    pub net_to_treasury: Amount,
    /// False when fallback pricing was used (informational, not an error)
    pub oracle_healthy: bool,
}

/// Snapshot of the currently selling stage for host tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInfo {
    pub stage_id: u8,
    pub label: String,
    /// Quote atomic units per whole asset
    pub unit_price_quote: Amount,
    /// The same price expressed in settlement atomic units at today's quote
    pub unit_price_settlement: Amount,
    pub capacity: Amount,
    pub sold: Amount,
    pub active: bool,
    /// False when fallback pricing was used
    pub oracle_healthy: bool,
}

/// The authoritative ledger state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HallmarkLedger {
    oracle: PriceOracleAdapter,
    sale: PurchaseLedger,
    registry: AssetRegistry,
    security: SecurityStateMachine,
    batches: BatchMonitorAssignment,
    accepted_currencies: Vec<AcceptedCurrency>,
    events: Vec<LedgerEvent>,
}

impl HallmarkLedger {
    /// Build a ledger from a validated configuration.
    ///
    /// The first configured stage is activated; the sale opens immediately.
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;

        let stages: Vec<SaleStage> = config
            .stages
            .iter()
            .map(|p| SaleStage {
                id: p.id,
                label: p.label.clone(),
                unit_price: p.unit_price,
                capacity: p.capacity,
                sold: 0,
                active: false,
            })
            .collect();
        let mut table = StageTable::new(stages).map_err(LedgerError::Sale)?;
        table.activate_first().map_err(LedgerError::Sale)?;
        let engine =
            SaleStageEngine::new(table, config.settlement_decimals, config.asset_decimals);
        let sale = PurchaseLedger::new(
            engine,
            config.min_purchase,
            config.max_purchase,
            config.referral_rate_bps,
        )?;

        Ok(Self {
            oracle: PriceOracleAdapter::new(
                config.fallback_price,
                config.staleness_threshold_secs,
            ),
            sale,
            registry: AssetRegistry::new(config.recovery_transfer_policy),
            security: SecurityStateMachine::new(config.administrator),
            batches: BatchMonitorAssignment::new(config.batch_size)?,
            accepted_currencies: config.accepted_currencies,
            events: Vec::new(),
        })
    }

    // ========================================================================
    // SALE OPERATIONS
    // ========================================================================

    /// Purchase sale assets with the settlement currency.
    pub fn buy(
        &mut self,
        buyer: Address,
        payment: Amount,
        referrer: Option<Address>,
        feed: &dyn PriceFeed,
        now: Timestamp,
    ) -> LedgerResult<BuyOutcome> {
        let quote = self.oracle.read_price(feed, now);
        self.buy_at_quote(buyer, payment, referrer, &quote, now)
    }

    /// Purchase sale assets with an accepted alternate currency.
    ///
    /// The amount is converted to its quote-currency equivalence via the
    /// configured rate, then into settlement terms, before delegating to the
    /// purchase ledger.
    pub fn buy_with_alternate_currency(
        &mut self,
        buyer: Address,
        currency: CurrencyCode,
        amount: Amount,
        referrer: Option<Address>,
        feed: &dyn PriceFeed,
        now: Timestamp,
    ) -> LedgerResult<BuyOutcome> {
        let accepted = self
            .accepted_currencies
            .iter()
            .find(|c| c.code == currency)
            .cloned()
            .ok_or(LedgerError::UnknownCurrency(currency))?;

        let quote = self.oracle.read_price(feed, now);
        let quote_value = convert(amount, accepted.quote_rate, accepted.decimals, QUOTE_DECIMALS)?;
        let payment = self.quote_to_settlement(quote_value, &quote)?;
        self.buy_at_quote(buyer, payment, referrer, &quote, now)
    }

    fn buy_at_quote(
        &mut self,
        buyer: Address,
        payment: Amount,
        referrer: Option<Address>,
        quote: &OracleQuote,
        now: Timestamp,
    ) -> LedgerResult<BuyOutcome> {
        let (purchase, events) = self.sale.purchase(buyer, payment, referrer, quote, now)?;
        self.events.extend(events.into_iter().map(LedgerEvent::Sale));
        Ok(BuyOutcome {
            asset_quantity: purchase.asset_quantity,
            charged: purchase.charged,
            refund: purchase.refund,
            quote_value: purchase.quote_value,
            referral_reward: purchase.referral_reward,
            net_to_treasury: purchase.net_to_treasury,
            oracle_healthy: quote.from_oracle,
        })
    }

    /// Asset quantity a payment would currently buy. Read-only.
    pub fn calculate_assets_for_payment(
        &self,
        payment: Amount,
        feed: &dyn PriceFeed,
        now: Timestamp,
    ) -> LedgerResult<(Amount, bool)> {
        let quote = self.oracle.read_price(feed, now);
        let quantity = self.sale.engine().quote_for(payment, &quote)?;
        Ok((quantity, quote.from_oracle))
    }

    /// The currently selling stage, with pricing in both currencies.
    pub fn current_stage_info(
        &self,
        feed: &dyn PriceFeed,
        now: Timestamp,
    ) -> LedgerResult<StageInfo> {
        let quote = self.oracle.read_price(feed, now);
        let stage = self
            .sale
            .engine()
            .stages()
            .current()
            .ok_or(LedgerError::Sale(lib_sale::SaleError::StageInactive))?;
        let unit_price_settlement = self.sale.engine().price_in_settlement(&quote)?;
        Ok(StageInfo {
            stage_id: stage.id,
            label: stage.label.clone(),
            unit_price_quote: stage.unit_price,
            unit_price_settlement,
            capacity: stage.capacity,
            sold: stage.sold,
            active: stage.active,
            oracle_healthy: quote.from_oracle,
        })
    }

    /// Whether no stage is active.
    pub fn is_sale_closed(&self) -> bool {
        self.sale.engine().stages().is_closed()
    }

    // ========================================================================
    // ASSET OPERATIONS
    // ========================================================================

    /// Mint a new serialized asset. Administrator-gated.
    pub fn mint_asset(
        &mut self,
        owner: Address,
        serial: SerialNumber,
        metadata_ref: [u8; 32],
        actor: Address,
        now: Timestamp,
    ) -> LedgerResult<AssetId> {
        self.require_admin(actor)?;
        let id = self.registry.mint(owner, serial, metadata_ref, actor, now)?;
        self.push_last_audit_entry();
        Ok(id)
    }

    /// Transfer asset ownership. Blocked outside normal circulation.
    pub fn transfer_asset(
        &mut self,
        asset_id: AssetId,
        to: Address,
        now: Timestamp,
    ) -> LedgerResult<()> {
        let from = self
            .registry
            .asset(asset_id)
            .ok_or(RegistryError::AssetNotFound(asset_id))?
            .owner;
        self.registry.transfer(asset_id, to)?;
        self.events.push(LedgerEvent::Transferred {
            asset_id,
            from,
            to,
            timestamp: now,
        });
        Ok(())
    }

    /// Flag an asset as suspicious. Monitor-gated.
    pub fn flag_asset(
        &mut self,
        asset_id: AssetId,
        reason: FlagReason,
        actor: Address,
        now: Timestamp,
    ) -> LedgerResult<()> {
        let result = self
            .security
            .flag(&mut self.registry, &self.batches, asset_id, reason, actor, now);
        self.finish_security_op(result.map(|()| ()))
    }

    /// Burn a flagged asset in place. Monitor-gated.
    pub fn burn_asset(
        &mut self,
        asset_id: AssetId,
        actor: Address,
        now: Timestamp,
    ) -> LedgerResult<()> {
        let result = self
            .security
            .burn(&mut self.registry, &self.batches, asset_id, actor, now);
        self.finish_security_op(result.map(|()| ()))
    }

    /// Re-issue a burned asset to its verified owner. Administrator-gated.
    pub fn restore_asset(
        &mut self,
        asset_id: AssetId,
        verified_owner: Address,
        actor: Address,
        now: Timestamp,
    ) -> LedgerResult<AssetId> {
        let result = self
            .security
            .restore(&mut self.registry, asset_id, verified_owner, actor, now);
        self.finish_security_op(result)
    }

    /// Return a recovered asset to normal circulation. Administrator-gated.
    pub fn reactivate_asset(
        &mut self,
        asset_id: AssetId,
        actor: Address,
        now: Timestamp,
    ) -> LedgerResult<()> {
        let result = self
            .security
            .reactivate(&mut self.registry, asset_id, actor, now);
        self.finish_security_op(result.map(|()| ()))
    }

    /// The live record bearing a serial number.
    pub fn asset_by_serial(&self, serial: &SerialNumber) -> Option<AssetId> {
        self.registry.asset_by_serial(serial)
    }

    /// Asset ids currently owned by an address.
    pub fn assets_owned_by(&self, owner: &Address) -> Vec<AssetId> {
        self.registry.assets_owned_by(owner)
    }

    // ========================================================================
    // ADMINISTRATIVE SURFACE
    // ========================================================================

    pub fn set_purchase_bounds(
        &mut self,
        min: Amount,
        max: Amount,
        actor: Address,
    ) -> LedgerResult<()> {
        self.require_admin(actor)?;
        Ok(self.sale.set_purchase_bounds(min, max)?)
    }

    pub fn set_referral_rate(&mut self, rate_bps: Bps, actor: Address) -> LedgerResult<()> {
        self.require_admin(actor)?;
        Ok(self.sale.set_referral_rate(rate_bps)?)
    }

    /// Update a stage's quote-currency unit price. Never touches `sold`.
    pub fn update_stage_price(
        &mut self,
        stage_id: u8,
        unit_price: Amount,
        actor: Address,
        now: Timestamp,
    ) -> LedgerResult<()> {
        self.require_admin(actor)?;
        let old = self
            .sale
            .engine_mut()
            .stages_mut()
            .update_price(stage_id, unit_price)?;
        self.events
            .push(LedgerEvent::Sale(lib_sale::SaleEvent::StagePriceUpdated {
                stage_id,
                old_price: old,
                new_price: unit_price,
                timestamp: now,
            }));
        info!(stage_id, old_price = old as u64, new_price = unit_price as u64, "stage repriced");
        Ok(())
    }

    /// Append a future sale stage; it must continue the id ordering.
    pub fn add_stage(&mut self, params: crate::config::StageParams, actor: Address) -> LedgerResult<()> {
        self.require_admin(actor)?;
        Ok(self.sale.engine_mut().stages_mut().push_stage(SaleStage {
            id: params.id,
            label: params.label,
            unit_price: params.unit_price,
            capacity: params.capacity,
            sold: 0,
            active: false,
        })?)
    }

    /// Change whether recovered assets transfer before reactivation.
    pub fn set_recovery_transfer_policy(
        &mut self,
        policy: lib_registry::RecoveryTransferPolicy,
        actor: Address,
    ) -> LedgerResult<()> {
        self.require_admin(actor)?;
        self.registry.set_recovery_transfer_policy(policy);
        Ok(())
    }

    pub fn set_fallback_price(&mut self, price: Amount, actor: Address) -> LedgerResult<()> {
        self.require_admin(actor)?;
        if price == 0 {
            return Err(LedgerError::Config(crate::config::ConfigError::ZeroFallbackPrice));
        }
        self.oracle.set_fallback_price(price);
        Ok(())
    }

    pub fn set_staleness_threshold(&mut self, secs: u64, actor: Address) -> LedgerResult<()> {
        self.require_admin(actor)?;
        self.oracle.set_staleness_threshold_secs(secs);
        Ok(())
    }

    /// Assign or replace a batch's monitor; effective immediately.
    pub fn assign_monitor(
        &mut self,
        batch_index: u64,
        monitor: Address,
        actor: Address,
    ) -> LedgerResult<Option<Address>> {
        self.require_admin(actor)?;
        Ok(self.batches.assign_monitor(batch_index, monitor))
    }

    pub fn add_accepted_currency(
        &mut self,
        currency: AcceptedCurrency,
        actor: Address,
    ) -> LedgerResult<()> {
        self.require_admin(actor)?;
        if currency.quote_rate == 0 {
            return Err(LedgerError::Config(crate::config::ConfigError::ZeroCurrencyRate(
                currency.code,
            )));
        }
        if self.accepted_currencies.iter().any(|c| c.code == currency.code) {
            return Err(LedgerError::Config(crate::config::ConfigError::DuplicateCurrency(
                currency.code,
            )));
        }
        self.accepted_currencies.push(currency);
        Ok(())
    }

    // ========================================================================
    // READ SURFACE
    // ========================================================================

    pub fn purchaser(&self, address: &Address) -> Option<&PurchaserRecord> {
        self.sale.purchaser(address)
    }

    pub fn referral_records(&self, referrer: &Address) -> &[ReferralRecord] {
        self.sale.referral_records(referrer)
    }

    pub fn treasury_total(&self) -> Amount {
        self.sale.treasury_total()
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn batches(&self) -> &BatchMonitorAssignment {
        &self.batches
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    fn require_admin(&self, actor: Address) -> LedgerResult<()> {
        if actor != self.security.administrator() {
            return Err(LedgerError::Unauthorized(actor));
        }
        Ok(())
    }

    /// Convert a quote-currency value into settlement atomic units.
    fn quote_to_settlement(
        &self,
        quote_value: Amount,
        quote: &OracleQuote,
    ) -> LedgerResult<Amount> {
        let inverse = PRICE_SCALE
            .checked_mul(PRICE_SCALE)
            .and_then(|v| v.checked_div(quote.value))
            .ok_or(lib_sale::SaleError::Overflow)?;
        Ok(convert(
            quote_value,
            inverse,
            QUOTE_DECIMALS,
            self.sale.engine().settlement_decimals(),
        )?)
    }

    /// After a successful registry transition, mirror the audit entry into
    /// the unified event stream; after an authorization denial, mirror the
    /// denial record. Other errors pass through untouched.
    fn finish_security_op<T>(&mut self, result: Result<T, RegistryError>) -> LedgerResult<T> {
        match result {
            Ok(value) => {
                self.push_last_audit_entry();
                Ok(value)
            }
            Err(
                err @ (RegistryError::UnauthorizedMonitor { .. }
                | RegistryError::UnauthorizedAdministrator { .. }),
            ) => {
                if let Some(denial) = self.registry.audit().denials().last() {
                    self.events
                        .push(LedgerEvent::AuthorizationDenied(denial.clone()));
                }
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn push_last_audit_entry(&mut self) {
        if let Some(entry) = self.registry.audit().entries().last() {
            self.events.push(LedgerEvent::Audit(entry.clone()));
        }
    }
}
