//! Rental property analytics module.
//!
//! Normalizes income streams to monthly amounts, applies the vacancy
//! and expense deductions, and derives the investment metrics a
//! property owner tracks: NOI, cap rate, cash flow, cash-on-cash
//! return, equity ratios, and the quick screening rules.

mod property_model;
mod property_service;
mod property_traits;

pub use property_model::*;
pub use property_service::*;
pub use property_traits::*;
