//! Performance service traits.

use async_trait::async_trait;

use super::performance_model::{PerformanceReport, PeriodBucket};
use crate::errors::Result;
use crate::ledger::ReportFilter;

/// Trait defining the contract for performance report operations.
#[async_trait]
pub trait PerformanceServiceTrait: Send + Sync {
    /// Builds the performance report for the positions and transactions
    /// in scope, with the by-period breakdown at the requested calendar
    /// granularity.
    ///
    /// Trades before the report window seed the opening cost basis, so a
    /// bounded window still reflects money invested earlier. An empty
    /// scope yields an all-zero report, not an error.
    async fn get_performance_report(
        &self,
        filter: &ReportFilter,
        bucket: PeriodBucket,
    ) -> Result<PerformanceReport>;
}
