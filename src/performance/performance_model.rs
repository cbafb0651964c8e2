//! Performance report models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::decimal_serde::decimal_serde;

/// Calendar granularity for the by-period breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodBucket {
    Month,
    Quarter,
    Year,
}

/// Portfolio-level return totals.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    #[serde(with = "decimal_serde")]
    pub total_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_cost_basis: Decimal,
    /// Current value minus cost basis
    #[serde(with = "decimal_serde")]
    pub total_return: Decimal,
    /// Percent of cost basis, unrounded
    #[serde(with = "decimal_serde")]
    pub total_return_percent: Decimal,
}

/// Per-position performance entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPerformance {
    pub position_id: String,
    pub symbol: String,
    #[serde(with = "decimal_serde")]
    pub value: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub absolute_return: Decimal,
    /// Percent of cost basis, unrounded
    #[serde(with = "decimal_serde")]
    pub percent_return: Decimal,
}

/// One calendar period of the by-period breakdown.
///
/// The starting cost basis evolves across periods: each period opens with
/// the previous period's basis plus the net amount invested during it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPerformance {
    /// Label such as `2024-03`, `2024-Q1`, or `2024`
    pub label: String,
    /// First covered day (calendar period clamped to the report window)
    pub start_date: NaiveDate,
    /// Last covered day (calendar period clamped to the report window)
    pub end_date: NaiveDate,
    /// Cost basis at the period's start
    #[serde(with = "decimal_serde")]
    pub starting_cost_basis: Decimal,
    /// Net BUY minus SELL amounts during the period
    #[serde(with = "decimal_serde")]
    pub net_invested: Decimal,
    /// Gain/loss attributed to the period: investment income received in
    /// it, plus, for the final period, the unrealized remainder that
    /// carries the chain to the current portfolio value
    #[serde(with = "decimal_serde")]
    pub gain_loss: Decimal,
    /// Gain/loss as a percent of the starting cost basis, unrounded
    #[serde(with = "decimal_serde")]
    pub return_percent: Decimal,
}

/// Cash activity totals over the report window, read off the flow table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    /// CONTRIBUTION and TRANSFER_IN amounts
    #[serde(with = "decimal_serde")]
    pub contributions: Decimal,
    /// WITHDRAWAL and TRANSFER_OUT amounts
    #[serde(with = "decimal_serde")]
    pub withdrawals: Decimal,
    /// DIVIDEND, DISTRIBUTION, INTEREST, and INCOME amounts
    #[serde(with = "decimal_serde")]
    pub investment_income: Decimal,
    /// FEE and EXPENSE amounts
    #[serde(with = "decimal_serde")]
    pub fees_and_expenses: Decimal,
    /// Signed sum of flows crossing the portfolio boundary
    #[serde(with = "decimal_serde")]
    pub net_external_flow: Decimal,
}

/// Performance report: totals, ranked positions, the calendar breakdown,
/// and cash activity over the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub summary: PerformanceSummary,
    /// Full list, ordered by percent return descending
    pub positions: Vec<PositionPerformance>,
    /// Calendar periods ascending, continuous across the window
    pub by_period: Vec<PeriodPerformance>,
    pub activity: ActivitySummary,
    /// Base currency for all values
    pub currency: String,
}

impl PerformanceReport {
    /// Empty report for a window with no data.
    pub fn empty(currency: String) -> Self {
        Self {
            summary: PerformanceSummary::default(),
            positions: Vec::new(),
            by_period: Vec::new(),
            activity: ActivitySummary::default(),
            currency,
        }
    }

    /// Best `n` positions. The stored list is already ranked; this is a
    /// presentation convenience, the report itself is never truncated.
    pub fn top_performers(&self, n: usize) -> Vec<&PositionPerformance> {
        self.positions.iter().take(n).collect()
    }

    /// Worst `n` positions, ranked ascending by percent return with the
    /// same tie-breaks as the stored ordering.
    pub fn bottom_performers(&self, n: usize) -> Vec<&PositionPerformance> {
        let mut ranked: Vec<&PositionPerformance> = self.positions.iter().collect();
        ranked.sort_by(|a, b| {
            a.percent_return
                .cmp(&b.percent_return)
                .then_with(|| a.absolute_return.cmp(&b.absolute_return))
                .then_with(|| a.position_id.cmp(&b.position_id))
        });
        ranked.into_iter().take(n).collect()
    }
}
