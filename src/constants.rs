/// Group label for the whole-portfolio rollup
pub const PORTFOLIO_TOTAL_ID: &str = "TOTAL";

/// Decimal precision for intermediate valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for currency figures
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Months in a reporting year
pub const MONTHS_PER_YEAR: u32 = 12;
