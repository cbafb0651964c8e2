//! Portfolio performance module.
//!
//! Ranks positions by return, breaks gains into calendar periods whose
//! evolving cost basis chains to the overall return, and summarizes cash
//! activity over the report window.

mod performance_model;
mod performance_service;
mod performance_traits;

pub use performance_model::*;
pub use performance_service::*;
pub use performance_traits::*;
