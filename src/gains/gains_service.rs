//! Gain/loss and holdings reporting.
//!
//! Realized gains replay every SELL in the snapshot against the
//! position's tax lots under the injected lot selection policy, so lot
//! state stays consistent with the current position snapshot; only the
//! slices whose sale date falls inside the report window land in the
//! report. Unrealized gains compare current value against cost basis,
//! with the short/long split read off the remaining open lots.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::gains_model::{
    GainLossReport, GainLossSummary, HoldingEntry, HoldingsReport, PositionGainLoss, RealizedSale,
};
use super::gains_traits::GainsServiceTrait;
use super::lot_selection::{FifoLotSelection, LotConsumption, LotSelectionStrategy, OpenLot};
use crate::errors::{GainsError, Result};
use crate::ledger::{
    DataIntegrityWarning, GainLossKind, HoldingPeriod, LedgerRepositoryTrait, Position,
    ReportFilter, TaxLot, Transaction, TransactionType, WarningCode,
};
use crate::valuation::{percent_of, round_currency};

/// Outcome of replaying one position's sales against its lots.
struct PositionReplay {
    /// In-window sale slices, rounded for the report
    realized: Vec<RealizedSale>,
    /// In-window short-term realized gain, unrounded
    realized_short: Decimal,
    /// In-window long-term realized gain, unrounded
    realized_long: Decimal,
    /// Lot state after every sale in the snapshot has been applied
    open_lots: Vec<OpenLot>,
}

/// Service producing gain/loss and holdings reports.
pub struct GainsService {
    base_currency: Arc<RwLock<String>>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    lot_selection: Arc<dyn LotSelectionStrategy>,
}

impl GainsService {
    /// Creates the service with the default FIFO lot selection policy.
    pub fn new(
        base_currency: Arc<RwLock<String>>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    ) -> Self {
        Self::with_lot_selection(base_currency, ledger_repository, Arc::new(FifoLotSelection))
    }

    pub fn with_lot_selection(
        base_currency: Arc<RwLock<String>>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        lot_selection: Arc<dyn LotSelectionStrategy>,
    ) -> Self {
        Self {
            base_currency,
            ledger_repository,
            lot_selection,
        }
    }

    /// Validates a sale and asks the policy which lots it consumes.
    ///
    /// A missing or non-positive share quantity is the caller's cue to
    /// skip the sale; a plan exceeding the requested quantity or a lot's
    /// remaining shares breaks the policy contract and aborts the report.
    fn plan_sale(
        &self,
        position_id: &str,
        sale: &Transaction,
        open_lots: &[OpenLot],
    ) -> std::result::Result<(Decimal, Vec<LotConsumption>), GainsError> {
        let quantity = match sale.shares {
            Some(shares) if shares > Decimal::ZERO => shares,
            other => {
                return Err(GainsError::NonPositiveSaleQuantity {
                    transaction_id: sale.id.clone(),
                    quantity: other
                        .map(|shares| shares.to_string())
                        .unwrap_or_else(|| "missing".to_string()),
                });
            }
        };

        let plan = self.lot_selection.select(open_lots, quantity);

        let mut consumed_by_lot: HashMap<&str, Decimal> = HashMap::new();
        let mut planned_total = Decimal::ZERO;
        for consumption in &plan {
            let consumed = consumed_by_lot
                .entry(consumption.lot_id.as_str())
                .or_default();
            *consumed += consumption.shares;
            let remaining = open_lots
                .iter()
                .find(|lot| lot.lot_id == consumption.lot_id)
                .map(|lot| lot.remaining_shares)
                .unwrap_or(Decimal::ZERO);
            if consumption.shares <= Decimal::ZERO || *consumed > remaining {
                return Err(GainsError::OverConsumedLots {
                    position_id: position_id.to_string(),
                });
            }
            planned_total += consumption.shares;
        }
        if planned_total > quantity {
            return Err(GainsError::OverConsumedLots {
                position_id: position_id.to_string(),
            });
        }

        Ok((quantity, plan))
    }

    /// Replays one position's sales, oldest first, mutating lot state and
    /// collecting realized slices for sales inside the report window.
    fn replay_position(
        &self,
        position: &Position,
        lots: &[TaxLot],
        sales: &[Transaction],
        filter: &ReportFilter,
        warnings: &mut Vec<DataIntegrityWarning>,
    ) -> Result<PositionReplay> {
        let mut open_lots: Vec<OpenLot> = lots
            .iter()
            .map(|lot| OpenLot {
                lot_id: lot.id.clone(),
                acquisition_date: lot.acquisition_date,
                remaining_shares: lot.shares,
                cost_per_share: lot.cost_per_share(),
            })
            .collect();

        let mut replay = PositionReplay {
            realized: Vec::new(),
            realized_short: Decimal::ZERO,
            realized_long: Decimal::ZERO,
            open_lots: Vec::new(),
        };

        for sale in sales {
            let (quantity, plan) = match self.plan_sale(&position.id, sale, &open_lots) {
                Ok(planned) => planned,
                Err(error @ GainsError::NonPositiveSaleQuantity { .. }) => {
                    warn!("Skipping sale {}: {}", sale.id, error);
                    warnings.push(DataIntegrityWarning::new(
                        WarningCode::InvalidSaleQuantity,
                        &sale.id,
                        error.to_string(),
                    ));
                    continue;
                }
                Err(error) => return Err(error.into()),
            };

            let available: Decimal = open_lots.iter().map(|lot| lot.remaining_shares).sum();
            if available == Decimal::ZERO {
                warn!(
                    "Sale {} of {} has no open lots to realize against",
                    sale.id, position.symbol
                );
                warnings.push(DataIntegrityWarning::new(
                    WarningCode::MissingLots,
                    &sale.id,
                    format!(
                        "sale of {} shares of {} has no open lots to realize against",
                        quantity, position.symbol
                    ),
                ));
                continue;
            }
            if available < quantity {
                warn!(
                    "Sale {} oversells {}: {} shares requested, {} available",
                    sale.id, position.symbol, quantity, available
                );
                warnings.push(DataIntegrityWarning::new(
                    WarningCode::Oversell,
                    &sale.id,
                    format!(
                        "sale requests {} shares but open lots hold {}; the excess is ignored",
                        quantity, available
                    ),
                ));
            }

            let price_per_share = (sale.total_amount - sale.fees) / quantity;

            for consumption in &plan {
                if let Some(lot) = open_lots
                    .iter_mut()
                    .find(|lot| lot.lot_id == consumption.lot_id)
                {
                    lot.remaining_shares -= consumption.shares;
                }

                if !filter.contains_date(sale.transaction_date) {
                    continue;
                }

                let proceeds = price_per_share * consumption.shares;
                let gain_loss = proceeds - consumption.cost_basis;
                let holding_period =
                    HoldingPeriod::classify(consumption.acquisition_date, sale.transaction_date);
                match holding_period {
                    HoldingPeriod::ShortTerm => replay.realized_short += gain_loss,
                    HoldingPeriod::LongTerm => replay.realized_long += gain_loss,
                }
                replay.realized.push(RealizedSale {
                    transaction_id: sale.id.clone(),
                    position_id: position.id.clone(),
                    symbol: position.symbol.clone(),
                    lot_id: consumption.lot_id.clone(),
                    sale_date: sale.transaction_date,
                    acquisition_date: consumption.acquisition_date,
                    shares: consumption.shares,
                    proceeds: round_currency(proceeds),
                    cost_basis: round_currency(consumption.cost_basis),
                    gain_loss: round_currency(gain_loss),
                    holding_period,
                });
            }
        }

        replay.open_lots = open_lots;
        Ok(replay)
    }
}

#[async_trait]
impl GainsServiceTrait for GainsService {
    async fn get_gain_loss_report(&self, filter: &ReportFilter) -> Result<GainLossReport> {
        filter.validate()?;
        let base_currency = self.base_currency.read().unwrap().clone();
        let kind = filter.kind_or_default();
        debug!(
            "Building gain/loss report, kind {:?}, account {:?}",
            kind, filter.account_id
        );

        let mut positions: Vec<Position> = self
            .ledger_repository
            .get_positions(filter)?
            .into_iter()
            .filter(|p| filter.matches_account(&p.account_id))
            .collect();
        if positions.is_empty() {
            debug!("No positions in scope, returning empty gain/loss report");
            return Ok(GainLossReport::empty(base_currency, kind));
        }
        positions.sort_by(|a, b| a.id.cmp(&b.id));

        let position_ids: Vec<String> = positions.iter().map(|p| p.id.clone()).collect();
        let mut lots_by_position: HashMap<String, Vec<TaxLot>> = HashMap::new();
        for lot in self.ledger_repository.get_tax_lots(&position_ids)? {
            lots_by_position
                .entry(lot.position_id.clone())
                .or_default()
                .push(lot);
        }

        // Every sale in the snapshot replays, whatever the window, so lot
        // state matches the current position snapshot.
        let sales_filter = ReportFilter {
            account_id: filter.account_id.clone(),
            ..ReportFilter::default()
        };
        let mut sales_by_position: HashMap<String, Vec<Transaction>> = HashMap::new();
        for transaction in self.ledger_repository.get_transactions(&sales_filter)? {
            if transaction.transaction_type != TransactionType::Sell
                || !filter.matches_account(&transaction.account_id)
            {
                continue;
            }
            if let Some(position_id) = &transaction.position_id {
                sales_by_position
                    .entry(position_id.clone())
                    .or_default()
                    .push(transaction);
            }
        }
        for sales in sales_by_position.values_mut() {
            sales.sort_by(|a, b| {
                a.transaction_date
                    .cmp(&b.transaction_date)
                    .then_with(|| a.id.cmp(&b.id))
            });
        }

        let include_realized = matches!(kind, GainLossKind::Realized | GainLossKind::All);
        let include_unrealized = matches!(kind, GainLossKind::Unrealized | GainLossKind::All);
        let reference_date = filter.end_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut warnings: Vec<DataIntegrityWarning> = Vec::new();
        let mut realized: Vec<RealizedSale> = Vec::new();
        let mut by_position: Vec<PositionGainLoss> = Vec::new();
        let mut total_realized_short = Decimal::ZERO;
        let mut total_realized_long = Decimal::ZERO;
        let mut total_unrealized = Decimal::ZERO;
        let mut total_unrealized_short = Decimal::ZERO;
        let mut total_unrealized_long = Decimal::ZERO;

        for position in &positions {
            let lots = lots_by_position.remove(&position.id).unwrap_or_default();
            let sales = sales_by_position
                .get(&position.id)
                .map(|sales| sales.as_slice())
                .unwrap_or(&[]);

            let replay = self.replay_position(position, &lots, sales, filter, &mut warnings)?;

            // Positions without any lot records (cash-like holdings) are
            // legitimate; a mismatch is only reportable when lots exist.
            let remaining_shares: Decimal =
                replay.open_lots.iter().map(|lot| lot.remaining_shares).sum();
            if !lots.is_empty() && remaining_shares != position.shares {
                warn!(
                    "Open lot shares {} do not match position {} shares {}",
                    remaining_shares, position.id, position.shares
                );
                warnings.push(DataIntegrityWarning::new(
                    WarningCode::LotSharesMismatch,
                    &position.id,
                    format!(
                        "open lot shares {} do not match position shares {}",
                        remaining_shares, position.shares
                    ),
                ));
            }

            let realized_short = if include_realized {
                replay.realized_short
            } else {
                Decimal::ZERO
            };
            let realized_long = if include_realized {
                replay.realized_long
            } else {
                Decimal::ZERO
            };

            let mut unrealized_short = Decimal::ZERO;
            let mut unrealized_long = Decimal::ZERO;
            let mut unrealized = Decimal::ZERO;
            if include_unrealized {
                unrealized = position.current_value - position.cost_basis_total;
                for lot in &replay.open_lots {
                    if lot.remaining_shares <= Decimal::ZERO {
                        continue;
                    }
                    let lot_unrealized = lot.remaining_shares * position.current_price
                        - lot.remaining_shares * lot.cost_per_share;
                    match HoldingPeriod::classify(lot.acquisition_date, reference_date) {
                        HoldingPeriod::ShortTerm => unrealized_short += lot_unrealized,
                        HoldingPeriod::LongTerm => unrealized_long += lot_unrealized,
                    }
                }
            }

            total_realized_short += realized_short;
            total_realized_long += realized_long;
            total_unrealized += unrealized;
            total_unrealized_short += unrealized_short;
            total_unrealized_long += unrealized_long;

            let has_realized_rows = include_realized && !replay.realized.is_empty();
            if include_unrealized || has_realized_rows {
                by_position.push(PositionGainLoss {
                    position_id: position.id.clone(),
                    symbol: position.symbol.clone(),
                    realized_short_term: round_currency(realized_short),
                    realized_long_term: round_currency(realized_long),
                    realized_total: round_currency(realized_short + realized_long),
                    unrealized_short_term: round_currency(unrealized_short),
                    unrealized_long_term: round_currency(unrealized_long),
                    unrealized_total: round_currency(unrealized),
                });
            }
            if include_realized {
                realized.extend(replay.realized);
            }
        }

        realized.sort_by(|a, b| {
            a.sale_date
                .cmp(&b.sale_date)
                .then_with(|| a.transaction_id.cmp(&b.transaction_id))
        });
        by_position.sort_by(|a, b| {
            let a_total = a.realized_total + a.unrealized_total;
            let b_total = b.realized_total + b.unrealized_total;
            b_total
                .cmp(&a_total)
                .then_with(|| a.position_id.cmp(&b.position_id))
        });

        debug!(
            "Gain/loss report ready: {} realized slices, {} positions, {} warnings",
            realized.len(),
            by_position.len(),
            warnings.len()
        );

        Ok(GainLossReport {
            kind,
            summary: GainLossSummary {
                total_realized: round_currency(total_realized_short + total_realized_long),
                realized_short_term: round_currency(total_realized_short),
                realized_long_term: round_currency(total_realized_long),
                total_unrealized: round_currency(total_unrealized),
                unrealized_short_term: round_currency(total_unrealized_short),
                unrealized_long_term: round_currency(total_unrealized_long),
                total_gain_loss: round_currency(
                    total_realized_short + total_realized_long + total_unrealized,
                ),
            },
            realized,
            by_position,
            warnings,
            currency: base_currency,
        })
    }

    async fn get_holdings_report(&self, filter: &ReportFilter) -> Result<HoldingsReport> {
        filter.validate()?;
        let base_currency = self.base_currency.read().unwrap().clone();
        debug!("Building holdings report for account {:?}", filter.account_id);

        let positions: Vec<Position> = self
            .ledger_repository
            .get_positions(filter)?
            .into_iter()
            .filter(|p| filter.matches_account(&p.account_id))
            .collect();
        if positions.is_empty() {
            debug!("No positions in scope, returning empty holdings report");
            return Ok(HoldingsReport::empty(base_currency));
        }

        let total_value: Decimal = positions.iter().map(|p| p.current_value).sum();
        let total_cost_basis: Decimal = positions.iter().map(|p| p.cost_basis_total).sum();
        let total_gain_loss = total_value - total_cost_basis;

        let mut holdings: Vec<HoldingEntry> = positions
            .iter()
            .map(|position| {
                let gain_loss = position.current_value - position.cost_basis_total;
                HoldingEntry {
                    position_id: position.id.clone(),
                    symbol: position.symbol.clone(),
                    category: position.category,
                    shares: position.shares,
                    current_value: round_currency(position.current_value),
                    cost_basis: round_currency(position.cost_basis_total),
                    gain_loss: round_currency(gain_loss),
                    percent_return: percent_of(gain_loss, position.cost_basis_total),
                    percent_of_portfolio: percent_of(position.current_value, total_value),
                }
            })
            .collect();

        holdings.sort_by(|a, b| {
            b.current_value
                .cmp(&a.current_value)
                .then_with(|| a.position_id.cmp(&b.position_id))
        });

        debug!("Holdings report ready: {} holdings", holdings.len());

        Ok(HoldingsReport {
            total_value: round_currency(total_value),
            total_cost_basis: round_currency(total_cost_basis),
            total_gain_loss: round_currency(total_gain_loss),
            total_gain_loss_percent: percent_of(total_gain_loss, total_cost_basis),
            holdings,
            currency: base_currency,
        })
    }
}
