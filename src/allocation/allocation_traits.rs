//! Allocation service traits.

use async_trait::async_trait;

use super::allocation_model::AllocationReport;
use crate::errors::Result;
use crate::ledger::ReportFilter;

/// Trait defining the contract for allocation report operations.
#[async_trait]
pub trait AllocationServiceTrait: Send + Sync {
    /// Builds the allocation report for the positions in scope.
    ///
    /// Positions are grouped by asset category, account, and the owning
    /// account's tax treatment. Zero-value positions still count toward
    /// their groups, so group values always sum to the portfolio total.
    /// An empty snapshot yields an all-zero report, not an error.
    async fn get_allocation_report(&self, filter: &ReportFilter) -> Result<AllocationReport>;
}
