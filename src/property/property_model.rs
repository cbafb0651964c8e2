//! Property domain entities and the financial report model.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::constants::MONTHS_PER_YEAR;
use crate::utils::decimal_serde::{decimal_serde, decimal_serde_option};
use crate::valuation::coalesce;

/// Income categories a property can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyIncomeKind {
    Rent,
    Parking,
    Storage,
    Laundry,
    Other,
}

impl PropertyIncomeKind {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyIncomeKind::Rent => "RENT",
            PropertyIncomeKind::Parking => "PARKING",
            PropertyIncomeKind::Storage => "STORAGE",
            PropertyIncomeKind::Laundry => "LAUNDRY",
            PropertyIncomeKind::Other => "OTHER",
        }
    }
}

/// How often an income amount recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncomeFrequency {
    Monthly,
    Quarterly,
    Annually,
    OneTime,
}

impl IncomeFrequency {
    pub fn as_str(&self) -> &str {
        match self {
            IncomeFrequency::Monthly => "MONTHLY",
            IncomeFrequency::Quarterly => "QUARTERLY",
            IncomeFrequency::Annually => "ANNUALLY",
            IncomeFrequency::OneTime => "ONE_TIME",
        }
    }

    /// Normalizes an amount at this frequency to a monthly figure.
    ///
    /// One-time income never contributes to recurring monthly totals.
    pub fn monthly_amount(&self, amount: Decimal) -> Option<Decimal> {
        match self {
            IncomeFrequency::Monthly => Some(amount),
            IncomeFrequency::Quarterly => Some(amount / dec!(3)),
            IncomeFrequency::Annually => Some(amount / Decimal::from(MONTHS_PER_YEAR)),
            IncomeFrequency::OneTime => None,
        }
    }
}

/// A rental property with its financing and acquisition figures.
///
/// Optional fields model data the owner has not recorded; calculations
/// default them to zero rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub name: String,
    #[serde(with = "decimal_serde")]
    pub purchase_price: Decimal,
    #[serde(with = "decimal_serde")]
    pub current_value: Decimal,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub loan_amount: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub loan_balance: Option<Decimal>,
    /// Annual interest rate as a percentage, e.g. `6.5`
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub interest_rate_percent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub loan_term_years: Option<u32>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub monthly_mortgage_payment: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub down_payment: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub refurbish_costs: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub furnish_costs: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub acquisition_costs: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub management_fee_percent: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub vacancy_rate_percent: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub desired_cap_rate_percent: Option<Decimal>,
}

/// One recurring or one-time income stream of a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyIncome {
    pub id: String,
    pub property_id: String,
    pub kind: PropertyIncomeKind,
    #[serde(with = "decimal_serde")]
    pub amount: Decimal,
    pub frequency: IncomeFrequency,
    pub is_active: bool,
}

/// The fixed monthly expense template for a property.
///
/// Every field is optional; absent categories count as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyExpenses {
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub management_fee: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub legal_and_accounting: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub repairs_and_maintenance: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub pest_control: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub property_taxes: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub insurance: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub hoa_dues: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub utilities: Option<Decimal>,
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub advertising: Option<Decimal>,
}

impl PropertyExpenses {
    /// Sum of every template field, absent fields as zero.
    pub fn monthly_total(&self) -> Decimal {
        coalesce(self.management_fee)
            + coalesce(self.legal_and_accounting)
            + coalesce(self.repairs_and_maintenance)
            + coalesce(self.pest_control)
            + coalesce(self.property_taxes)
            + coalesce(self.insurance)
            + coalesce(self.hoa_dues)
            + coalesce(self.utilities)
            + coalesce(self.advertising)
    }
}

/// Full financial picture of one property.
///
/// Monetary figures are rounded to cents; percentages and ratios are
/// unrounded for the display layer to format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFinancialReport {
    pub property_id: String,
    pub property_name: String,
    #[serde(with = "decimal_serde")]
    pub gross_monthly_rental_income: Decimal,
    #[serde(with = "decimal_serde")]
    pub additional_monthly_income: Decimal,
    #[serde(with = "decimal_serde")]
    pub vacancy_loss: Decimal,
    #[serde(with = "decimal_serde")]
    pub effective_gross_income: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_monthly_expenses: Decimal,
    #[serde(with = "decimal_serde")]
    pub monthly_noi: Decimal,
    #[serde(with = "decimal_serde")]
    pub annual_noi: Decimal,
    /// Annual NOI as a percent of purchase price
    #[serde(with = "decimal_serde")]
    pub cap_rate: Decimal,
    #[serde(with = "decimal_serde")]
    pub monthly_cash_flow: Decimal,
    #[serde(with = "decimal_serde")]
    pub annual_cash_flow: Decimal,
    #[serde(with = "decimal_serde")]
    pub annual_gross_income: Decimal,
    #[serde(with = "decimal_serde")]
    pub annual_debt_service: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_investment: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_cash_invested: Decimal,
    /// Annual cash flow as a percent of cash invested
    #[serde(with = "decimal_serde")]
    pub cash_on_cash_return: Decimal,
    /// Cash flow plus appreciation as a percent of current equity
    #[serde(with = "decimal_serde")]
    pub return_on_equity: Decimal,
    #[serde(with = "decimal_serde")]
    pub loan_to_value: Decimal,
    /// Monthly NOI over the mortgage payment, `0` when unlevered
    #[serde(with = "decimal_serde")]
    pub debt_service_coverage_ratio: Decimal,
    /// Percent of effective gross income consumed by expenses
    #[serde(with = "decimal_serde")]
    pub operating_expense_ratio: Decimal,
    /// Purchase price over annual gross rent, `0` without rent
    #[serde(with = "decimal_serde")]
    pub gross_rent_multiplier: Decimal,
    /// Percent of scheduled income needed to cover expenses and debt
    #[serde(with = "decimal_serde")]
    pub break_even_occupancy: Decimal,
    /// Amortized payment derived from the loan terms, when present
    #[serde(
        with = "decimal_serde_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub estimated_monthly_payment: Option<Decimal>,
    pub meets_one_percent_rule: bool,
    pub meets_two_percent_rule: bool,
    pub meets_one_thirty_five_rule: bool,
    /// Cap rate versus the owner's target, when a target is set
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub meets_desired_cap_rate: Option<bool>,
    /// Base currency for all values
    pub currency: String,
}
