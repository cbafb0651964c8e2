//! Property repository and service traits.

use async_trait::async_trait;

use super::property_model::{Property, PropertyExpenses, PropertyFinancialReport, PropertyIncome};
use crate::errors::Result;

/// Storage seam for property data, implemented by the hosting
/// application over whatever backend it uses.
pub trait PropertyRepositoryTrait: Send + Sync {
    fn get_property(&self, property_id: &str) -> Result<Property>;

    fn get_property_income(&self, property_id: &str) -> Result<Vec<PropertyIncome>>;

    /// The expense template, `None` when the owner never filled one in.
    fn get_property_expenses(&self, property_id: &str) -> Result<Option<PropertyExpenses>>;
}

/// Trait defining the contract for property financial reporting.
#[async_trait]
pub trait PropertyAnalyticsServiceTrait: Send + Sync {
    /// Builds the financial report for one property from its income
    /// streams and expense template.
    ///
    /// Missing optional figures default to zero, every ratio guards its
    /// zero denominator, and an absent expense template counts as all
    /// zeroes, so the report always computes.
    async fn get_property_report(&self, property_id: &str) -> Result<PropertyFinancialReport>;
}
