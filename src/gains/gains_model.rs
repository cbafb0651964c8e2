//! Gain/loss and holdings report models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{AssetCategory, DataIntegrityWarning, GainLossKind, HoldingPeriod};
use crate::utils::decimal_serde::decimal_serde;

/// One tax-lot slice consumed by a SELL transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedSale {
    pub transaction_id: String,
    pub position_id: String,
    pub symbol: String,
    pub lot_id: String,
    pub sale_date: NaiveDate,
    pub acquisition_date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    /// Sale proceeds allocated to this slice, net of fees
    #[serde(with = "decimal_serde")]
    pub proceeds: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub gain_loss: Decimal,
    /// Classified against the sale date
    pub holding_period: HoldingPeriod,
}

/// Per-position realized and unrealized gain/loss rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionGainLoss {
    pub position_id: String,
    pub symbol: String,
    #[serde(with = "decimal_serde")]
    pub realized_short_term: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_long_term: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_total: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_short_term: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_long_term: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_total: Decimal,
}

/// Aggregate gain/loss totals. Fields for a side the report kind omits
/// are zero, never absent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GainLossSummary {
    #[serde(with = "decimal_serde")]
    pub total_realized: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_short_term: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_long_term: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_unrealized: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_short_term: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_long_term: Decimal,
    /// Sum of the sides the report kind includes
    #[serde(with = "decimal_serde")]
    pub total_gain_loss: Decimal,
}

/// Gain/loss report: realized sale slices, per-position rollups, and
/// aggregate totals, narrowed to the requested kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GainLossReport {
    pub kind: GainLossKind,
    pub summary: GainLossSummary,
    /// Sale slices in replay order, empty when the kind omits realized
    pub realized: Vec<RealizedSale>,
    pub by_position: Vec<PositionGainLoss>,
    pub warnings: Vec<DataIntegrityWarning>,
    /// Base currency for all values
    pub currency: String,
}

impl GainLossReport {
    /// Empty report for a scope with no positions.
    pub fn empty(currency: String, kind: GainLossKind) -> Self {
        Self {
            kind,
            summary: GainLossSummary::default(),
            realized: Vec::new(),
            by_position: Vec::new(),
            warnings: Vec::new(),
            currency,
        }
    }
}

/// One row of the holdings snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingEntry {
    pub position_id: String,
    pub symbol: String,
    pub category: AssetCategory,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub current_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub gain_loss: Decimal,
    /// Percent of cost basis, unrounded
    #[serde(with = "decimal_serde")]
    pub percent_return: Decimal,
    /// Percent of total portfolio value, unrounded
    #[serde(with = "decimal_serde")]
    pub percent_of_portfolio: Decimal,
}

/// Holdings snapshot ordered descending by current value.
///
/// Always the full list; "top 10" style truncation belongs to the
/// presentation layer via [`HoldingsReport::top`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsReport {
    #[serde(with = "decimal_serde")]
    pub total_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_gain_loss: Decimal,
    /// Percent of total cost basis, unrounded
    #[serde(with = "decimal_serde")]
    pub total_gain_loss_percent: Decimal,
    pub holdings: Vec<HoldingEntry>,
    /// Base currency for all values
    pub currency: String,
}

impl HoldingsReport {
    /// Empty snapshot for a scope with no positions.
    pub fn empty(currency: String) -> Self {
        Self {
            total_value: Decimal::ZERO,
            total_cost_basis: Decimal::ZERO,
            total_gain_loss: Decimal::ZERO,
            total_gain_loss_percent: Decimal::ZERO,
            holdings: Vec::new(),
            currency,
        }
    }

    /// Largest `n` holdings by current value.
    pub fn top(&self, n: usize) -> Vec<&HoldingEntry> {
        self.holdings.iter().take(n).collect()
    }
}
