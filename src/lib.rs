pub mod constants;
pub mod errors;
pub mod utils;

pub mod valuation;

pub mod ledger;

pub mod allocation;
pub mod gains;
pub mod performance;
pub mod property;

pub use allocation::*;
pub use gains::*;
pub use performance::*;
pub use property::*;
