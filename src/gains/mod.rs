//! Gain/loss and holdings module.
//!
//! Computes realized gains by replaying SELL transactions against tax
//! lots under a named lot selection policy, unrealized gains from the
//! current snapshot, and the full holdings list ordered by value.

mod gains_model;
mod gains_service;
mod gains_traits;
mod lot_selection;

pub use gains_model::*;
pub use gains_service::*;
pub use gains_traits::*;
pub use lot_selection::*;
