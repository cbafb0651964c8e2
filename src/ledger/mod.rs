//! Ledger domain - shared entities, the transaction flow table, and the
//! storage collaborator seam.

mod ledger_model;
mod ledger_traits;

pub use ledger_model::*;
pub use ledger_traits::*;
