//! Property financial report service.
//!
//! Runs the fixed calculation pipeline over one property, its active
//! income streams, and its expense template. Every step feeds the next:
//! income normalization, vacancy, effective gross income, expenses, NOI,
//! then the financing ratios. Monetary figures round to cents as they
//! are produced; percentages and ratios stay unrounded.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::debug;
use num_traits::Zero;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use super::property_model::{
    Property, PropertyExpenses, PropertyFinancialReport, PropertyIncome, PropertyIncomeKind,
};
use super::property_traits::{PropertyAnalyticsServiceTrait, PropertyRepositoryTrait};
use crate::constants::MONTHS_PER_YEAR;
use crate::errors::Result;
use crate::valuation::{coalesce, percent_of, round_currency};

/// Service producing per-property financial reports.
pub struct PropertyAnalyticsService {
    base_currency: Arc<RwLock<String>>,
    property_repository: Arc<dyn PropertyRepositoryTrait>,
}

impl PropertyAnalyticsService {
    pub fn new(
        base_currency: Arc<RwLock<String>>,
        property_repository: Arc<dyn PropertyRepositoryTrait>,
    ) -> Self {
        Self {
            base_currency,
            property_repository,
        }
    }

    /// Sums active income normalized to monthly amounts, either the RENT
    /// streams or everything else.
    fn normalized_monthly(income: &[PropertyIncome], rent: bool) -> Decimal {
        income
            .iter()
            .filter(|row| row.is_active && (row.kind == PropertyIncomeKind::Rent) == rent)
            .filter_map(|row| row.frequency.monthly_amount(row.amount))
            .sum()
    }

    /// Standard amortized payment from the loan terms.
    ///
    /// `P * r * (1+r)^n / ((1+r)^n - 1)` over monthly periods; a
    /// zero-rate loan falls back to straight-line `P / n`. `None` when
    /// any loan term is missing.
    fn estimated_monthly_payment(property: &Property) -> Option<Decimal> {
        let principal = property.loan_amount?;
        let annual_rate = property.interest_rate_percent?;
        let years = property.loan_term_years?;
        if principal <= Decimal::zero() || years == 0 {
            return None;
        }

        let months = years * MONTHS_PER_YEAR;
        if annual_rate == Decimal::zero() {
            return Some(round_currency(principal / Decimal::from(months)));
        }

        let monthly_rate = annual_rate / dec!(100) / Decimal::from(MONTHS_PER_YEAR);
        let factor = (Decimal::ONE + monthly_rate).powi(i64::from(months));
        let denominator = factor - Decimal::ONE;
        if denominator == Decimal::zero() {
            return Some(round_currency(principal / Decimal::from(months)));
        }
        Some(round_currency(principal * monthly_rate * factor / denominator))
    }

    fn compute_report(
        property: &Property,
        income: &[PropertyIncome],
        expenses: &PropertyExpenses,
        currency: String,
    ) -> PropertyFinancialReport {
        let months = Decimal::from(MONTHS_PER_YEAR);

        let gross_monthly_rental_income = round_currency(Self::normalized_monthly(income, true));
        let additional_monthly_income = round_currency(Self::normalized_monthly(income, false));
        let vacancy_rate = coalesce(property.vacancy_rate_percent);
        let vacancy_loss = round_currency(gross_monthly_rental_income * vacancy_rate / dec!(100));
        let effective_gross_income = round_currency(
            gross_monthly_rental_income + additional_monthly_income - vacancy_loss,
        );
        let total_monthly_expenses = round_currency(expenses.monthly_total());
        let monthly_noi = round_currency(effective_gross_income - total_monthly_expenses);
        let annual_noi = round_currency(monthly_noi * months);
        let cap_rate = percent_of(annual_noi, property.purchase_price);

        let estimated_monthly_payment = Self::estimated_monthly_payment(property);
        let monthly_payment = round_currency(coalesce(
            property.monthly_mortgage_payment.or(estimated_monthly_payment),
        ));
        let monthly_cash_flow = round_currency(monthly_noi - monthly_payment);
        let annual_cash_flow = round_currency(monthly_cash_flow * months);
        let annual_debt_service = round_currency(monthly_payment * months);
        let scheduled_monthly_income = gross_monthly_rental_income + additional_monthly_income;
        let annual_gross_income = round_currency(scheduled_monthly_income * months);

        let one_time_costs = coalesce(property.refurbish_costs)
            + coalesce(property.furnish_costs)
            + coalesce(property.acquisition_costs);
        let total_investment = round_currency(property.purchase_price + one_time_costs);
        let total_cash_invested = match property.down_payment {
            Some(down_payment) => round_currency(down_payment + one_time_costs),
            None => round_currency(total_investment - coalesce(property.loan_amount)),
        };
        let cash_on_cash_return = percent_of(annual_cash_flow, total_cash_invested);

        let appreciation = round_currency(property.current_value - property.purchase_price);
        let equity = round_currency(property.current_value - coalesce(property.loan_balance));
        let return_on_equity = percent_of(annual_cash_flow + appreciation, equity);
        let loan_to_value = percent_of(coalesce(property.loan_balance), property.current_value);

        // Explicit guard: an unlevered property has a DSCR of zero, not
        // a division failure, whatever the sign of NOI.
        let debt_service_coverage_ratio = if monthly_payment > Decimal::zero() {
            monthly_noi / monthly_payment
        } else {
            Decimal::zero()
        };

        let operating_expense_ratio = percent_of(total_monthly_expenses, effective_gross_income);
        let annual_gross_rent = gross_monthly_rental_income * months;
        let gross_rent_multiplier = if annual_gross_rent > Decimal::zero() {
            property.purchase_price / annual_gross_rent
        } else {
            Decimal::zero()
        };
        let break_even_occupancy = percent_of(
            total_monthly_expenses + monthly_payment,
            scheduled_monthly_income,
        );

        let meets_one_percent_rule =
            gross_monthly_rental_income >= property.purchase_price * dec!(0.01);
        let meets_two_percent_rule =
            gross_monthly_rental_income >= property.purchase_price * dec!(0.02);
        let meets_one_thirty_five_rule =
            gross_monthly_rental_income >= total_monthly_expenses * dec!(1.35);
        let meets_desired_cap_rate = property
            .desired_cap_rate_percent
            .map(|target| cap_rate >= target);

        PropertyFinancialReport {
            property_id: property.id.clone(),
            property_name: property.name.clone(),
            gross_monthly_rental_income,
            additional_monthly_income,
            vacancy_loss,
            effective_gross_income,
            total_monthly_expenses,
            monthly_noi,
            annual_noi,
            cap_rate,
            monthly_cash_flow,
            annual_cash_flow,
            annual_gross_income,
            annual_debt_service,
            total_investment,
            total_cash_invested,
            cash_on_cash_return,
            return_on_equity,
            loan_to_value,
            debt_service_coverage_ratio,
            operating_expense_ratio,
            gross_rent_multiplier,
            break_even_occupancy,
            estimated_monthly_payment,
            meets_one_percent_rule,
            meets_two_percent_rule,
            meets_one_thirty_five_rule,
            meets_desired_cap_rate,
            currency,
        }
    }
}

#[async_trait]
impl PropertyAnalyticsServiceTrait for PropertyAnalyticsService {
    async fn get_property_report(&self, property_id: &str) -> Result<PropertyFinancialReport> {
        let base_currency = self.base_currency.read().unwrap().clone();
        debug!("Building property report for {}", property_id);

        let property = self.property_repository.get_property(property_id)?;
        let income = self.property_repository.get_property_income(property_id)?;
        let expenses = self
            .property_repository
            .get_property_expenses(property_id)?
            .unwrap_or_default();

        let report = Self::compute_report(&property, &income, &expenses, base_currency);
        debug!(
            "Property report ready for {}: monthly NOI {}, cap rate {}",
            property_id, report.monthly_noi, report.cap_rate
        );
        Ok(report)
    }
}
