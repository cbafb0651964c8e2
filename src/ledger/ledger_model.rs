//! Ledger domain models.
//!
//! Entities here are owned and mutated by external CRUD collaborators; the
//! engine only reads them and derives fresh, non-persisted result objects.

use std::str::FromStr;

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Broad asset classification used for allocation grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetCategory {
    Equity,
    FixedIncome,
    Cash,
    RealEstate,
    Commodity,
    Alternative,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Equity => "EQUITY",
            AssetCategory::FixedIncome => "FIXED_INCOME",
            AssetCategory::Cash => "CASH",
            AssetCategory::RealEstate => "REAL_ESTATE",
            AssetCategory::Commodity => "COMMODITY",
            AssetCategory::Alternative => "ALTERNATIVE",
        }
    }
}

/// Tax treatment of an account, used for allocation-by-tax-treatment grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxTreatment {
    Taxable,
    TaxDeferred,
    TaxExempt,
}

impl TaxTreatment {
    /// Fixed presentation order for tax-treatment groupings.
    pub const ALL: [TaxTreatment; 3] = [
        TaxTreatment::Taxable,
        TaxTreatment::TaxDeferred,
        TaxTreatment::TaxExempt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxTreatment::Taxable => "TAXABLE",
            TaxTreatment::TaxDeferred => "TAX_DEFERRED",
            TaxTreatment::TaxExempt => "TAX_EXEMPT",
        }
    }
}

/// Holding-period classification of a tax lot against a reference date.
///
/// Never stored; recomputed whenever a report needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldingPeriod {
    ShortTerm,
    LongTerm,
}

impl HoldingPeriod {
    /// Classify a holding period against `reference_date`.
    ///
    /// Long term only when held strictly more than one calendar year; a
    /// sale exactly on the anniversary stays short term.
    pub fn classify(acquisition_date: NaiveDate, reference_date: NaiveDate) -> Self {
        match acquisition_date.checked_add_months(Months::new(12)) {
            Some(anniversary) if reference_date > anniversary => HoldingPeriod::LongTerm,
            _ => HoldingPeriod::ShortTerm,
        }
    }
}

/// Domain model representing an account in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub tax_treatment: TaxTreatment,
    pub currency: String,
}

/// An open holding in an account.
///
/// `current_value` is expected to equal `shares * current_price` and
/// `unrealized_gain_loss` to equal `current_value - cost_basis_total`
/// within rounding tolerance. The collaborator maintains both; reports
/// re-derive gain/loss from value and basis rather than trusting the
/// stored figure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub category: AssetCategory,
    pub shares: Decimal,
    pub cost_basis_total: Decimal,
    pub current_price: Decimal,
    pub current_value: Decimal,
    pub unrealized_gain_loss: Decimal,
}

/// A discrete acquisition batch of shares with its own cost basis.
///
/// Precondition (not enforced here): a position's lot shares sum to the
/// position's total shares. Violations surface as report warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxLot {
    pub id: String,
    pub position_id: String,
    pub acquisition_date: NaiveDate,
    pub shares: Decimal,
    pub cost_basis: Decimal,
}

impl TaxLot {
    /// Cost per share for this lot, zero when the lot holds no shares.
    pub fn cost_per_share(&self) -> Decimal {
        if self.shares == Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.cost_basis / self.shares
    }

    /// Classify the holding period against `reference_date`.
    pub fn holding_period(&self, reference_date: NaiveDate) -> HoldingPeriod {
        HoldingPeriod::classify(self.acquisition_date, reference_date)
    }
}

/// Ledger transaction types recognized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
    Distribution,
    Interest,
    TransferIn,
    TransferOut,
    Contribution,
    Withdrawal,
    Fee,
    Expense,
    Income,
}

/// Direction a transaction moves cash, for net-flow computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    /// Cash coming in: sale proceeds, income, money deposited
    Inflow,
    /// Cash going out: purchases, fees, money withdrawn
    Outflow,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
            TransactionType::Dividend => "DIVIDEND",
            TransactionType::Distribution => "DISTRIBUTION",
            TransactionType::Interest => "INTEREST",
            TransactionType::TransferIn => "TRANSFER_IN",
            TransactionType::TransferOut => "TRANSFER_OUT",
            TransactionType::Contribution => "CONTRIBUTION",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::Fee => "FEE",
            TransactionType::Expense => "EXPENSE",
            TransactionType::Income => "INCOME",
        }
    }

    /// Sign policy table, defined once for every consumer.
    ///
    /// The performance calculator and the activity summary both read this
    /// table instead of matching on type strings at their call sites.
    pub fn flow_direction(&self) -> FlowDirection {
        match self {
            TransactionType::Sell
            | TransactionType::Dividend
            | TransactionType::Distribution
            | TransactionType::Interest
            | TransactionType::TransferIn
            | TransactionType::Contribution
            | TransactionType::Income => FlowDirection::Inflow,
            TransactionType::Buy
            | TransactionType::TransferOut
            | TransactionType::Withdrawal
            | TransactionType::Fee
            | TransactionType::Expense => FlowDirection::Outflow,
        }
    }

    /// True for types that move money across the portfolio boundary.
    ///
    /// BUY/SELL and income types reallocate or grow money already inside
    /// the portfolio; contributions, withdrawals, and transfers bring it
    /// in or take it out.
    pub fn is_external_flow(&self) -> bool {
        matches!(
            self,
            TransactionType::Contribution
                | TransactionType::Withdrawal
                | TransactionType::TransferIn
                | TransactionType::TransferOut
        )
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            "DIVIDEND" => Ok(TransactionType::Dividend),
            "DISTRIBUTION" => Ok(TransactionType::Distribution),
            "INTEREST" => Ok(TransactionType::Interest),
            "TRANSFER_IN" => Ok(TransactionType::TransferIn),
            "TRANSFER_OUT" => Ok(TransactionType::TransferOut),
            "CONTRIBUTION" => Ok(TransactionType::Contribution),
            "WITHDRAWAL" => Ok(TransactionType::Withdrawal),
            "FEE" => Ok(TransactionType::Fee),
            "EXPENSE" => Ok(TransactionType::Expense),
            "INCOME" => Ok(TransactionType::Income),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

/// A ledger transaction. Immutable from the engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub position_id: Option<String>,
    pub transaction_type: TransactionType,
    pub transaction_date: NaiveDate,
    /// Gross amount, stored positive; direction comes from the flow table.
    pub total_amount: Decimal,
    /// Share quantity for BUY/SELL; absent for cash-only types.
    pub shares: Option<Decimal>,
    pub fees: Decimal,
}

impl Transaction {
    /// Amount signed per the flow table: inflows positive, outflows negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type.flow_direction() {
            FlowDirection::Inflow => self.total_amount,
            FlowDirection::Outflow => -self.total_amount,
        }
    }
}

/// Gain/loss report scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GainLossKind {
    Realized,
    Unrealized,
    All,
}

impl GainLossKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GainLossKind::Realized => "REALIZED",
            GainLossKind::Unrealized => "UNREALIZED",
            GainLossKind::All => "ALL",
        }
    }
}

impl FromStr for GainLossKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "REALIZED" => Ok(GainLossKind::Realized),
            "UNREALIZED" => Ok(GainLossKind::Unrealized),
            "ALL" => Ok(GainLossKind::All),
            _ => Err(Error::InvalidFilter(format!(
                "Unknown gain/loss type '{}', expected realized, unrealized, or all",
                s
            ))),
        }
    }
}

/// Narrows which ledger rows a report covers.
///
/// An absent account means all accounts; an absent date bound means
/// unbounded on that side. Both bounds are inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    pub account_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub kind: Option<GainLossKind>,
}

impl ReportFilter {
    /// Builds a filter from raw query parameters.
    ///
    /// Dates are ISO 8601 (`YYYY-MM-DD`); the kind accepts the lowercase
    /// query values `realized`, `unrealized`, and `all`.
    pub fn parse(
        account_id: Option<String>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        kind: Option<&str>,
    ) -> Result<Self> {
        let start_date = start_date
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .transpose()?;
        let end_date = end_date
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .transpose()?;
        let kind = kind.map(GainLossKind::from_str).transpose()?;

        let filter = ReportFilter {
            account_id,
            start_date,
            end_date,
            kind,
        };
        filter.validate()?;
        Ok(filter)
    }

    /// Validates the filter bounds.
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(Error::InvalidFilter(format!(
                    "start date {} is after end date {}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    /// True when `date` falls inside the inclusive window.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start_date {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if date > end {
                return false;
            }
        }
        true
    }

    /// True when the account matches, or when no account filter is set.
    pub fn matches_account(&self, account_id: &str) -> bool {
        match &self.account_id {
            Some(id) => id == account_id,
            None => true,
        }
    }

    /// Gain/loss scope, defaulting to the full report.
    pub fn kind_or_default(&self) -> GainLossKind {
        self.kind.unwrap_or(GainLossKind::All)
    }
}

/// Machine-readable code for a recovered data inconsistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// A position's lot shares do not sum to the position's share count
    LotSharesMismatch,
    /// A SELL consumed more shares than its position's open lots held
    Oversell,
    /// A SELL had no open lots to realize against
    MissingLots,
    /// A SELL carried a missing or non-positive share quantity
    InvalidSaleQuantity,
    /// A position references an account the repository did not return
    UnknownAccount,
}

/// A recovered inconsistency surfaced on the report instead of failing it.
///
/// The affected record is excluded from the computation that tripped the
/// warning; the rest of the report is unaffected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataIntegrityWarning {
    pub code: WarningCode,
    pub entity_id: String,
    pub message: String,
}

impl DataIntegrityWarning {
    pub fn new(code: WarningCode, entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        DataIntegrityWarning {
            code,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_transaction(transaction_type: TransactionType) -> Transaction {
        Transaction {
            id: "txn-1".to_string(),
            account_id: "account-1".to_string(),
            position_id: None,
            transaction_type,
            transaction_date: date(2024, 6, 15),
            total_amount: dec!(100),
            shares: None,
            fees: Decimal::ZERO,
        }
    }

    // Flow table tests
    #[test]
    fn test_sell_is_inflow() {
        assert_eq!(
            TransactionType::Sell.flow_direction(),
            FlowDirection::Inflow
        );
    }

    #[test]
    fn test_buy_is_outflow() {
        assert_eq!(
            TransactionType::Buy.flow_direction(),
            FlowDirection::Outflow
        );
    }

    #[test]
    fn test_income_types_are_inflows() {
        for t in [
            TransactionType::Dividend,
            TransactionType::Distribution,
            TransactionType::Interest,
            TransactionType::Income,
        ] {
            assert_eq!(t.flow_direction(), FlowDirection::Inflow);
        }
    }

    #[test]
    fn test_deposit_types_are_inflows() {
        for t in [TransactionType::Contribution, TransactionType::TransferIn] {
            assert_eq!(t.flow_direction(), FlowDirection::Inflow);
        }
    }

    #[test]
    fn test_spend_types_are_outflows() {
        for t in [
            TransactionType::Withdrawal,
            TransactionType::TransferOut,
            TransactionType::Fee,
            TransactionType::Expense,
        ] {
            assert_eq!(t.flow_direction(), FlowDirection::Outflow);
        }
    }

    #[test]
    fn test_signed_amount_applies_flow_direction() {
        assert_eq!(
            create_test_transaction(TransactionType::Sell).signed_amount(),
            dec!(100)
        );
        assert_eq!(
            create_test_transaction(TransactionType::Buy).signed_amount(),
            dec!(-100)
        );
        assert_eq!(
            create_test_transaction(TransactionType::Fee).signed_amount(),
            dec!(-100)
        );
        assert_eq!(
            create_test_transaction(TransactionType::Dividend).signed_amount(),
            dec!(100)
        );
    }

    #[test]
    fn test_external_flow_classification() {
        assert!(TransactionType::Contribution.is_external_flow());
        assert!(TransactionType::Withdrawal.is_external_flow());
        assert!(TransactionType::TransferIn.is_external_flow());
        assert!(TransactionType::TransferOut.is_external_flow());

        assert!(!TransactionType::Buy.is_external_flow());
        assert!(!TransactionType::Sell.is_external_flow());
        assert!(!TransactionType::Dividend.is_external_flow());
        assert!(!TransactionType::Fee.is_external_flow());
    }

    #[test]
    fn test_transaction_type_round_trip() {
        for t in [
            TransactionType::Buy,
            TransactionType::Sell,
            TransactionType::Dividend,
            TransactionType::Distribution,
            TransactionType::Interest,
            TransactionType::TransferIn,
            TransactionType::TransferOut,
            TransactionType::Contribution,
            TransactionType::Withdrawal,
            TransactionType::Fee,
            TransactionType::Expense,
            TransactionType::Income,
        ] {
            assert_eq!(t.as_str().parse::<TransactionType>().unwrap(), t);
        }
        assert!("SPLIT".parse::<TransactionType>().is_err());
    }

    // Holding period tests
    #[test]
    fn test_holding_period_exactly_one_year_is_short_term() {
        let lot = TaxLot {
            id: "lot-1".to_string(),
            position_id: "pos-1".to_string(),
            acquisition_date: date(2023, 3, 15),
            shares: dec!(10),
            cost_basis: dec!(1000),
        };
        assert_eq!(lot.holding_period(date(2024, 3, 15)), HoldingPeriod::ShortTerm);
    }

    #[test]
    fn test_holding_period_one_year_and_a_day_is_long_term() {
        let lot = TaxLot {
            id: "lot-1".to_string(),
            position_id: "pos-1".to_string(),
            acquisition_date: date(2023, 3, 15),
            shares: dec!(10),
            cost_basis: dec!(1000),
        };
        assert_eq!(lot.holding_period(date(2024, 3, 16)), HoldingPeriod::LongTerm);
    }

    #[test]
    fn test_holding_period_leap_day_acquisition() {
        let lot = TaxLot {
            id: "lot-1".to_string(),
            position_id: "pos-1".to_string(),
            acquisition_date: date(2024, 2, 29),
            shares: dec!(10),
            cost_basis: dec!(1000),
        };
        // Anniversary clamps to Feb 28 the following year
        assert_eq!(lot.holding_period(date(2025, 2, 28)), HoldingPeriod::ShortTerm);
        assert_eq!(lot.holding_period(date(2025, 3, 1)), HoldingPeriod::LongTerm);
    }

    #[test]
    fn test_cost_per_share() {
        let lot = TaxLot {
            id: "lot-1".to_string(),
            position_id: "pos-1".to_string(),
            acquisition_date: date(2024, 1, 1),
            shares: dec!(50),
            cost_basis: dec!(5000),
        };
        assert_eq!(lot.cost_per_share(), dec!(100));

        let empty = TaxLot { shares: Decimal::ZERO, ..lot };
        assert_eq!(empty.cost_per_share(), Decimal::ZERO);
    }

    // Filter tests
    #[test]
    fn test_filter_validate_rejects_inverted_range() {
        let filter = ReportFilter {
            start_date: Some(date(2024, 6, 1)),
            end_date: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(Error::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_filter_validate_accepts_equal_bounds() {
        let filter = ReportFilter {
            start_date: Some(date(2024, 6, 1)),
            end_date: Some(date(2024, 6, 1)),
            ..Default::default()
        };
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn test_filter_contains_date_inclusive_bounds() {
        let filter = ReportFilter {
            start_date: Some(date(2024, 1, 1)),
            end_date: Some(date(2024, 12, 31)),
            ..Default::default()
        };
        assert!(filter.contains_date(date(2024, 1, 1)));
        assert!(filter.contains_date(date(2024, 12, 31)));
        assert!(!filter.contains_date(date(2023, 12, 31)));
        assert!(!filter.contains_date(date(2025, 1, 1)));
    }

    #[test]
    fn test_filter_unbounded_sides() {
        let filter = ReportFilter::default();
        assert!(filter.contains_date(date(1990, 1, 1)));
        assert!(filter.contains_date(date(2090, 1, 1)));

        let from_only = ReportFilter {
            start_date: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        assert!(!from_only.contains_date(date(2023, 6, 1)));
        assert!(from_only.contains_date(date(2030, 6, 1)));
    }

    #[test]
    fn test_filter_matches_account() {
        let all = ReportFilter::default();
        assert!(all.matches_account("account-1"));

        let narrowed = ReportFilter {
            account_id: Some("account-1".to_string()),
            ..Default::default()
        };
        assert!(narrowed.matches_account("account-1"));
        assert!(!narrowed.matches_account("account-2"));
    }

    #[test]
    fn test_filter_parse_from_query_values() {
        let filter = ReportFilter::parse(
            Some("account-1".to_string()),
            Some("2024-01-01"),
            Some("2024-06-30"),
            Some("realized"),
        )
        .unwrap();
        assert_eq!(filter.account_id.as_deref(), Some("account-1"));
        assert_eq!(filter.start_date, Some(date(2024, 1, 1)));
        assert_eq!(filter.end_date, Some(date(2024, 6, 30)));
        assert_eq!(filter.kind, Some(GainLossKind::Realized));
    }

    #[test]
    fn test_filter_parse_rejects_unknown_kind() {
        let result = ReportFilter::parse(None, None, None, Some("deferred"));
        assert!(matches!(result, Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn test_filter_parse_rejects_malformed_date() {
        let result = ReportFilter::parse(None, Some("01/15/2024"), None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_filter_parse_rejects_inverted_range() {
        let result = ReportFilter::parse(None, Some("2024-06-01"), Some("2024-01-01"), None);
        assert!(matches!(result, Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn test_gain_loss_kind_accepts_lowercase() {
        assert_eq!("realized".parse::<GainLossKind>().unwrap(), GainLossKind::Realized);
        assert_eq!("UNREALIZED".parse::<GainLossKind>().unwrap(), GainLossKind::Unrealized);
        assert_eq!("all".parse::<GainLossKind>().unwrap(), GainLossKind::All);
    }
}
