//! Allocation report models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::DataIntegrityWarning;
use crate::utils::decimal_serde::decimal_serde;

/// One bucket of an allocation grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationGroup {
    /// Stable group key (category or tax-treatment constant)
    pub key: String,
    /// Display label
    pub label: String,
    /// Summed current value of member positions
    #[serde(with = "decimal_serde")]
    pub value: Decimal,
    /// Percent of total portfolio value, unrounded
    #[serde(with = "decimal_serde")]
    pub percentage: Decimal,
    /// Number of member positions
    pub position_count: usize,
}

/// Account bucket; carries summed cost basis and gain/loss as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAllocationGroup {
    /// Account id
    pub key: String,
    /// Account display name; falls back to the id when unknown
    pub label: String,
    #[serde(with = "decimal_serde")]
    pub value: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub gain_loss: Decimal,
    /// Percent of total portfolio value, unrounded
    #[serde(with = "decimal_serde")]
    pub percentage: Decimal,
    pub position_count: usize,
}

/// Whole-portfolio totals for the allocation report.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSummary {
    #[serde(with = "decimal_serde")]
    pub total_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_gain_loss: Decimal,
    /// Gain/loss as a percent of cost basis, unrounded
    #[serde(with = "decimal_serde")]
    pub total_gain_loss_percent: Decimal,
}

/// Allocation report: portfolio totals plus groupings by asset category,
/// account, and tax treatment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationReport {
    pub summary: AllocationSummary,
    /// Ordered descending by value
    pub by_category: Vec<AllocationGroup>,
    /// Ordered descending by value
    pub by_account: Vec<AccountAllocationGroup>,
    /// Fixed order: taxable, tax-deferred, tax-exempt
    pub by_tax_treatment: Vec<AllocationGroup>,
    /// Base currency for all values
    pub currency: String,
    /// Recovered data inconsistencies; empty for a clean snapshot
    pub warnings: Vec<DataIntegrityWarning>,
}

impl AllocationReport {
    /// Empty report for a snapshot with no positions in scope.
    pub fn empty(currency: String) -> Self {
        Self {
            summary: AllocationSummary::default(),
            by_category: Vec::new(),
            by_account: Vec::new(),
            by_tax_treatment: Vec::new(),
            currency,
            warnings: Vec::new(),
        }
    }
}
