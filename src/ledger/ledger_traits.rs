//! Storage collaborator contract for ledger data.

use super::ledger_model::{Account, Position, ReportFilter, TaxLot, Transaction};
use crate::errors::Result;

/// Trait defining the contract for ledger data access.
///
/// Implemented by the hosting application's storage layer. Every method
/// returns rows already scoped to the current user; an implementation may
/// additionally narrow by the filter's account and date window, but the
/// reporting services re-apply window matching themselves, so returning
/// a superset is always correct.
pub trait LedgerRepositoryTrait: Send + Sync {
    /// Open positions in scope for the filter.
    fn get_positions(&self, filter: &ReportFilter) -> Result<Vec<Position>>;

    /// Transactions in scope for the filter.
    fn get_transactions(&self, filter: &ReportFilter) -> Result<Vec<Transaction>>;

    /// Tax lots belonging to the given positions.
    fn get_tax_lots(&self, position_ids: &[String]) -> Result<Vec<TaxLot>>;

    /// All accounts for the current user.
    fn get_accounts(&self) -> Result<Vec<Account>>;
}
