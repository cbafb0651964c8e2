//! Allocation report service implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;

use super::allocation_model::{
    AccountAllocationGroup, AllocationGroup, AllocationReport, AllocationSummary,
};
use super::allocation_traits::AllocationServiceTrait;
use crate::errors::Result;
use crate::ledger::{
    Account, AssetCategory, DataIntegrityWarning, LedgerRepositoryTrait, Position, ReportFilter,
    TaxTreatment, WarningCode,
};
use crate::valuation::{percent_of, round_currency};

/// Running totals for a single grouping bucket.
#[derive(Default)]
struct GroupTotals {
    value: Decimal,
    cost_basis: Decimal,
    position_count: usize,
}

impl GroupTotals {
    fn gain_loss(&self) -> Decimal {
        self.value - self.cost_basis
    }
}

/// Service producing portfolio allocation breakdowns.
pub struct AllocationService {
    base_currency: Arc<RwLock<String>>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
}

impl AllocationService {
    pub fn new(
        base_currency: Arc<RwLock<String>>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    ) -> Self {
        Self {
            base_currency,
            ledger_repository,
        }
    }

    fn category_label(category: AssetCategory) -> &'static str {
        match category {
            AssetCategory::Equity => "Equity",
            AssetCategory::FixedIncome => "Fixed Income",
            AssetCategory::Cash => "Cash",
            AssetCategory::RealEstate => "Real Estate",
            AssetCategory::Commodity => "Commodity",
            AssetCategory::Alternative => "Alternative",
        }
    }

    fn treatment_label(treatment: TaxTreatment) -> &'static str {
        match treatment {
            TaxTreatment::Taxable => "Taxable",
            TaxTreatment::TaxDeferred => "Tax-Deferred",
            TaxTreatment::TaxExempt => "Tax-Exempt",
        }
    }

    /// Folds positions into fresh buckets keyed by the given dimension.
    ///
    /// Gain/loss is re-derived from value and basis rather than read from
    /// the stored per-position figure.
    fn accumulate<K, F>(positions: &[Position], key_of: F) -> HashMap<K, GroupTotals>
    where
        K: std::hash::Hash + Eq,
        F: Fn(&Position) -> K,
    {
        let mut buckets: HashMap<K, GroupTotals> = HashMap::new();
        for position in positions {
            let entry = buckets.entry(key_of(position)).or_default();
            entry.value += position.current_value;
            entry.cost_basis += position.cost_basis_total;
            entry.position_count += 1;
        }
        buckets
    }

    fn build_category_groups(positions: &[Position], total_value: Decimal) -> Vec<AllocationGroup> {
        let buckets = Self::accumulate(positions, |p| p.category);
        let mut groups: Vec<AllocationGroup> = buckets
            .into_iter()
            .map(|(category, totals)| AllocationGroup {
                key: category.as_str().to_string(),
                label: Self::category_label(category).to_string(),
                value: round_currency(totals.value),
                percentage: percent_of(totals.value, total_value),
                position_count: totals.position_count,
            })
            .collect();
        // Descending by value; ties resolved by label so ordering is stable
        groups.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
        groups
    }

    fn build_account_groups(
        positions: &[Position],
        total_value: Decimal,
        account_map: &HashMap<&str, &Account>,
        warnings: &mut Vec<DataIntegrityWarning>,
    ) -> Vec<AccountAllocationGroup> {
        let mut buckets: Vec<(String, GroupTotals)> =
            Self::accumulate(positions, |p| p.account_id.clone())
                .into_iter()
                .collect();
        // Warnings are emitted while labelling, so walk accounts in a
        // stable order.
        buckets.sort_by(|a, b| a.0.cmp(&b.0));
        let mut groups: Vec<AccountAllocationGroup> = buckets
            .into_iter()
            .map(|(account_id, totals)| {
                let label = match account_map.get(account_id.as_str()) {
                    Some(account) => account.name.clone(),
                    None => {
                        warnings.push(DataIntegrityWarning::new(
                            WarningCode::UnknownAccount,
                            account_id.clone(),
                            format!("Account {} was not returned by the repository", account_id),
                        ));
                        account_id.clone()
                    }
                };
                AccountAllocationGroup {
                    key: account_id,
                    label,
                    value: round_currency(totals.value),
                    cost_basis: round_currency(totals.cost_basis),
                    gain_loss: round_currency(totals.gain_loss()),
                    percentage: percent_of(totals.value, total_value),
                    position_count: totals.position_count,
                }
            })
            .collect();
        groups.sort_by(|a, b| {
            b.value
                .cmp(&a.value)
                .then_with(|| a.label.cmp(&b.label))
                .then_with(|| a.key.cmp(&b.key))
        });
        groups
    }

    fn build_tax_treatment_groups(
        positions: &[Position],
        total_value: Decimal,
        account_map: &HashMap<&str, &Account>,
    ) -> Vec<AllocationGroup> {
        let buckets = Self::accumulate(positions, |p| {
            account_map
                .get(p.account_id.as_str())
                .map(|a| a.tax_treatment)
        });

        let mut groups = Vec::new();
        for treatment in TaxTreatment::ALL {
            if let Some(totals) = buckets.get(&Some(treatment)) {
                groups.push(AllocationGroup {
                    key: treatment.as_str().to_string(),
                    label: Self::treatment_label(treatment).to_string(),
                    value: round_currency(totals.value),
                    percentage: percent_of(totals.value, total_value),
                    position_count: totals.position_count,
                });
            }
        }
        // Positions in unresolvable accounts still have to land somewhere
        // or the group values would stop summing to the portfolio total.
        if let Some(totals) = buckets.get(&None) {
            groups.push(AllocationGroup {
                key: "UNKNOWN".to_string(),
                label: "Unknown".to_string(),
                value: round_currency(totals.value),
                percentage: percent_of(totals.value, total_value),
                position_count: totals.position_count,
            });
        }
        groups
    }
}

#[async_trait]
impl AllocationServiceTrait for AllocationService {
    async fn get_allocation_report(&self, filter: &ReportFilter) -> Result<AllocationReport> {
        filter.validate()?;
        let base_currency = self.base_currency.read().unwrap().clone();

        debug!("Building allocation report for filter {:?}", filter);

        let positions: Vec<Position> = self
            .ledger_repository
            .get_positions(filter)?
            .into_iter()
            .filter(|p| filter.matches_account(&p.account_id))
            .collect();

        if positions.is_empty() {
            debug!("No positions in scope. Returning empty allocation report.");
            return Ok(AllocationReport::empty(base_currency));
        }

        let accounts = self.ledger_repository.get_accounts()?;
        let account_map: HashMap<&str, &Account> =
            accounts.iter().map(|a| (a.id.as_str(), a)).collect();

        // Percentages come from the unrounded totals so grouped sums keep
        // full precision; rounding happens only on the reported figures.
        let total_value: Decimal = positions.iter().map(|p| p.current_value).sum();
        let total_cost_basis: Decimal = positions.iter().map(|p| p.cost_basis_total).sum();
        let total_gain_loss = total_value - total_cost_basis;

        let mut warnings: Vec<DataIntegrityWarning> = Vec::new();

        let by_category = Self::build_category_groups(&positions, total_value);
        let by_account =
            Self::build_account_groups(&positions, total_value, &account_map, &mut warnings);
        let by_tax_treatment =
            Self::build_tax_treatment_groups(&positions, total_value, &account_map);

        debug!(
            "Allocation report complete: total_value={}, {} categories, {} accounts",
            total_value,
            by_category.len(),
            by_account.len()
        );

        Ok(AllocationReport {
            summary: AllocationSummary {
                total_value: round_currency(total_value),
                total_cost_basis: round_currency(total_cost_basis),
                total_gain_loss: round_currency(total_gain_loss),
                total_gain_loss_percent: percent_of(total_gain_loss, total_cost_basis),
            },
            by_category,
            by_account,
            by_tax_treatment,
            currency: base_currency,
            warnings,
        })
    }
}
