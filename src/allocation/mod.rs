//! Portfolio allocation module.
//!
//! Groups positions by asset category, account, and tax treatment, and
//! computes per-group values, gain/loss, and percent-of-portfolio.

mod allocation_model;
mod allocation_service;
mod allocation_traits;

pub use allocation_model::*;
pub use allocation_service::*;
pub use allocation_traits::*;

#[cfg(test)]
mod allocation_service_tests;
