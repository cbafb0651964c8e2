//! Valuation primitives shared by every calculator.

mod valuation_math;

pub use valuation_math::{coalesce, percent_of, round_currency, weighted_average};
