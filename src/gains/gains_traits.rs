//! Gain/loss service traits.

use async_trait::async_trait;

use super::gains_model::{GainLossReport, HoldingsReport};
use crate::errors::Result;
use crate::ledger::ReportFilter;

/// Trait defining the contract for gain/loss and holdings reporting.
#[async_trait]
pub trait GainsServiceTrait: Send + Sync {
    /// Builds the gain/loss report for the positions in scope.
    ///
    /// Realized gains replay SELL transactions against the positions'
    /// tax lots under the configured lot selection policy; unrealized
    /// gains come from current value against cost basis. `filter.kind`
    /// narrows the report to one side; totals for the omitted side stay
    /// zeroed. Lot inconsistencies surface as warnings on the report,
    /// not as errors.
    async fn get_gain_loss_report(&self, filter: &ReportFilter) -> Result<GainLossReport>;

    /// Builds the holdings snapshot for the positions in scope, ordered
    /// descending by current value. The full list is always returned.
    async fn get_holdings_report(&self, filter: &ReportFilter) -> Result<HoldingsReport>;
}
