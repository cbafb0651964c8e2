//! Unit tests for the allocation service.

use super::*;
use crate::errors::{Error, Result};
use crate::ledger::{
    Account, AssetCategory, LedgerRepositoryTrait, Position, ReportFilter, TaxLot, TaxTreatment,
    Transaction, WarningCode,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, RwLock};

// ============================================================================
// Mock Implementations
// ============================================================================

struct MockLedgerRepository {
    positions: Vec<Position>,
    accounts: Vec<Account>,
}

impl MockLedgerRepository {
    fn new(positions: Vec<Position>, accounts: Vec<Account>) -> Self {
        Self {
            positions,
            accounts,
        }
    }
}

impl LedgerRepositoryTrait for MockLedgerRepository {
    fn get_positions(&self, filter: &ReportFilter) -> Result<Vec<Position>> {
        Ok(self
            .positions
            .iter()
            .filter(|p| filter.matches_account(&p.account_id))
            .cloned()
            .collect())
    }

    fn get_transactions(&self, _filter: &ReportFilter) -> Result<Vec<Transaction>> {
        unimplemented!()
    }

    fn get_tax_lots(&self, _position_ids: &[String]) -> Result<Vec<TaxLot>> {
        unimplemented!()
    }

    fn get_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.clone())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn create_test_account(id: &str, name: &str, tax_treatment: TaxTreatment) -> Account {
    Account {
        id: id.to_string(),
        name: name.to_string(),
        tax_treatment,
        currency: "USD".to_string(),
    }
}

fn create_test_position(
    id: &str,
    account_id: &str,
    category: AssetCategory,
    cost_basis: Decimal,
    current_value: Decimal,
) -> Position {
    let shares = dec!(10);
    Position {
        id: id.to_string(),
        account_id: account_id.to_string(),
        symbol: id.to_uppercase(),
        category,
        shares,
        cost_basis_total: cost_basis,
        current_price: current_value / shares,
        current_value,
        unrealized_gain_loss: current_value - cost_basis,
    }
}

fn create_allocation_service(
    positions: Vec<Position>,
    accounts: Vec<Account>,
) -> AllocationService {
    let base_currency = Arc::new(RwLock::new("USD".to_string()));
    let ledger_repository = Arc::new(MockLedgerRepository::new(positions, accounts));
    AllocationService::new(base_currency, ledger_repository)
}

fn group_value(groups: &[AllocationGroup], key: &str) -> Decimal {
    groups
        .iter()
        .find(|g| g.key == key)
        .map(|g| g.value)
        .unwrap_or(Decimal::ZERO)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_empty_positions_returns_empty_report() {
    let service = create_allocation_service(vec![], vec![]);

    let report = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(report.summary.total_value, Decimal::ZERO);
    assert_eq!(report.summary.total_cost_basis, Decimal::ZERO);
    assert_eq!(report.summary.total_gain_loss, Decimal::ZERO);
    assert_eq!(report.summary.total_gain_loss_percent, Decimal::ZERO);
    assert!(report.by_category.is_empty());
    assert!(report.by_account.is_empty());
    assert!(report.by_tax_treatment.is_empty());
    assert!(report.warnings.is_empty());
    assert_eq!(report.currency, "USD");
}

#[tokio::test]
async fn test_single_position_is_whole_portfolio() {
    let account = create_test_account("acc-1", "Brokerage", TaxTreatment::Taxable);
    let position = create_test_position(
        "pos-1",
        "acc-1",
        AssetCategory::Equity,
        dec!(8000),
        dec!(10000),
    );
    let service = create_allocation_service(vec![position], vec![account]);

    let report = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(report.summary.total_value, dec!(10000));
    assert_eq!(report.summary.total_cost_basis, dec!(8000));
    assert_eq!(report.summary.total_gain_loss, dec!(2000));
    // 2000 / 8000 * 100 = 25%
    assert_eq!(report.summary.total_gain_loss_percent, dec!(25));

    assert_eq!(report.by_category.len(), 1);
    assert_eq!(report.by_category[0].key, "EQUITY");
    assert_eq!(report.by_category[0].label, "Equity");
    assert_eq!(report.by_category[0].percentage, dec!(100));
    assert_eq!(report.by_category[0].position_count, 1);

    assert_eq!(report.by_account.len(), 1);
    assert_eq!(report.by_account[0].label, "Brokerage");
    assert_eq!(report.by_account[0].gain_loss, dec!(2000));

    assert_eq!(report.by_tax_treatment.len(), 1);
    assert_eq!(report.by_tax_treatment[0].key, "TAXABLE");
}

#[tokio::test]
async fn test_group_values_sum_to_total_for_every_grouping() {
    let accounts = vec![
        create_test_account("acc-1", "Brokerage", TaxTreatment::Taxable),
        create_test_account("acc-2", "Retirement", TaxTreatment::TaxDeferred),
    ];
    let positions = vec![
        create_test_position("pos-1", "acc-1", AssetCategory::Equity, dec!(5000), dec!(6200.33)),
        create_test_position("pos-2", "acc-1", AssetCategory::FixedIncome, dec!(3000), dec!(2950.10)),
        create_test_position("pos-3", "acc-2", AssetCategory::Equity, dec!(7000), dec!(9100.57)),
        create_test_position("pos-4", "acc-2", AssetCategory::Cash, dec!(1000), dec!(1000)),
    ];
    let service = create_allocation_service(positions, accounts);

    let report = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    let total = report.summary.total_value;
    let tolerance = dec!(0.01);

    let category_sum: Decimal = report.by_category.iter().map(|g| g.value).sum();
    let account_sum: Decimal = report.by_account.iter().map(|g| g.value).sum();
    let treatment_sum: Decimal = report.by_tax_treatment.iter().map(|g| g.value).sum();

    assert!((category_sum - total).abs() <= tolerance);
    assert!((account_sum - total).abs() <= tolerance);
    assert!((treatment_sum - total).abs() <= tolerance);
}

#[tokio::test]
async fn test_percentages_sum_to_one_hundred() {
    let accounts = vec![create_test_account("acc-1", "Brokerage", TaxTreatment::Taxable)];
    let positions = vec![
        create_test_position("pos-1", "acc-1", AssetCategory::Equity, dec!(100), dec!(333.33)),
        create_test_position("pos-2", "acc-1", AssetCategory::Cash, dec!(100), dec!(333.33)),
        create_test_position("pos-3", "acc-1", AssetCategory::Commodity, dec!(100), dec!(333.34)),
    ];
    let service = create_allocation_service(positions, accounts);

    let report = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    let percent_sum: Decimal = report.by_category.iter().map(|g| g.percentage).sum();
    assert!((percent_sum - dec!(100)).abs() < dec!(0.000001));
}

#[tokio::test]
async fn test_zero_value_positions_still_counted() {
    let accounts = vec![create_test_account("acc-1", "Brokerage", TaxTreatment::Taxable)];
    let positions = vec![
        create_test_position("pos-1", "acc-1", AssetCategory::Equity, dec!(5000), dec!(5000)),
        // Worthless holding, still a member of its group
        create_test_position("pos-2", "acc-1", AssetCategory::Equity, dec!(900), dec!(0)),
    ];
    let service = create_allocation_service(positions, accounts);

    let report = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(report.by_category.len(), 1);
    assert_eq!(report.by_category[0].position_count, 2);
    assert_eq!(report.by_category[0].value, dec!(5000));
    assert_eq!(report.summary.total_value, dec!(5000));
}

#[tokio::test]
async fn test_groups_ordered_descending_by_value() {
    let accounts = vec![create_test_account("acc-1", "Brokerage", TaxTreatment::Taxable)];
    let positions = vec![
        create_test_position("pos-1", "acc-1", AssetCategory::Cash, dec!(100), dec!(100)),
        create_test_position("pos-2", "acc-1", AssetCategory::Equity, dec!(100), dec!(9000)),
        create_test_position("pos-3", "acc-1", AssetCategory::FixedIncome, dec!(100), dec!(4000)),
    ];
    let service = create_allocation_service(positions, accounts);

    let report = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    let keys: Vec<&str> = report.by_category.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["EQUITY", "FIXED_INCOME", "CASH"]);
}

#[tokio::test]
async fn test_equal_values_ordered_by_label() {
    let accounts = vec![create_test_account("acc-1", "Brokerage", TaxTreatment::Taxable)];
    let positions = vec![
        create_test_position("pos-1", "acc-1", AssetCategory::FixedIncome, dec!(100), dec!(500)),
        create_test_position("pos-2", "acc-1", AssetCategory::Cash, dec!(100), dec!(500)),
        create_test_position("pos-3", "acc-1", AssetCategory::Equity, dec!(100), dec!(500)),
    ];
    let service = create_allocation_service(positions, accounts);

    let report = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    let labels: Vec<&str> = report.by_category.iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, vec!["Cash", "Equity", "Fixed Income"]);
}

#[tokio::test]
async fn test_tax_treatment_groups_in_fixed_order() {
    let accounts = vec![
        create_test_account("acc-1", "Brokerage", TaxTreatment::Taxable),
        create_test_account("acc-2", "401k", TaxTreatment::TaxDeferred),
        create_test_account("acc-3", "Roth", TaxTreatment::TaxExempt),
    ];
    // Values ascending so value-ordering would invert the expected order
    let positions = vec![
        create_test_position("pos-1", "acc-1", AssetCategory::Equity, dec!(100), dec!(1000)),
        create_test_position("pos-2", "acc-2", AssetCategory::Equity, dec!(100), dec!(2000)),
        create_test_position("pos-3", "acc-3", AssetCategory::Equity, dec!(100), dec!(3000)),
    ];
    let service = create_allocation_service(positions, accounts);

    let report = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    let keys: Vec<&str> = report
        .by_tax_treatment
        .iter()
        .map(|g| g.key.as_str())
        .collect();
    assert_eq!(keys, vec!["TAXABLE", "TAX_DEFERRED", "TAX_EXEMPT"]);
}

#[tokio::test]
async fn test_account_grouping_carries_cost_basis_and_gain_loss() {
    let accounts = vec![
        create_test_account("acc-1", "Brokerage", TaxTreatment::Taxable),
        create_test_account("acc-2", "Retirement", TaxTreatment::TaxDeferred),
    ];
    let positions = vec![
        create_test_position("pos-1", "acc-1", AssetCategory::Equity, dec!(4000), dec!(5000)),
        create_test_position("pos-2", "acc-1", AssetCategory::Cash, dec!(1000), dec!(1000)),
        create_test_position("pos-3", "acc-2", AssetCategory::Equity, dec!(2000), dec!(1500)),
    ];
    let service = create_allocation_service(positions, accounts);

    let report = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    let brokerage = report
        .by_account
        .iter()
        .find(|g| g.key == "acc-1")
        .unwrap();
    assert_eq!(brokerage.value, dec!(6000));
    assert_eq!(brokerage.cost_basis, dec!(5000));
    assert_eq!(brokerage.gain_loss, dec!(1000));
    assert_eq!(brokerage.position_count, 2);

    let retirement = report
        .by_account
        .iter()
        .find(|g| g.key == "acc-2")
        .unwrap();
    assert_eq!(retirement.gain_loss, dec!(-500));
}

#[tokio::test]
async fn test_unknown_account_falls_back_to_id_and_warns() {
    // Position references an account the repository never returns
    let positions = vec![create_test_position(
        "pos-1",
        "ghost-account",
        AssetCategory::Equity,
        dec!(1000),
        dec!(1200),
    )];
    let service = create_allocation_service(positions, vec![]);

    let report = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(report.by_account.len(), 1);
    assert_eq!(report.by_account[0].label, "ghost-account");

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].code, WarningCode::UnknownAccount);
    assert_eq!(report.warnings[0].entity_id, "ghost-account");

    // The value still lands in a tax-treatment bucket so sums hold
    assert_eq!(report.by_tax_treatment.len(), 1);
    assert_eq!(report.by_tax_treatment[0].key, "UNKNOWN");
    assert_eq!(report.by_tax_treatment[0].value, dec!(1200));
}

#[tokio::test]
async fn test_account_filter_narrows_scope() {
    let accounts = vec![
        create_test_account("acc-1", "Brokerage", TaxTreatment::Taxable),
        create_test_account("acc-2", "Retirement", TaxTreatment::TaxDeferred),
    ];
    let positions = vec![
        create_test_position("pos-1", "acc-1", AssetCategory::Equity, dec!(100), dec!(1000)),
        create_test_position("pos-2", "acc-2", AssetCategory::Equity, dec!(100), dec!(2000)),
    ];
    let service = create_allocation_service(positions, accounts);

    let filter = ReportFilter {
        account_id: Some("acc-1".to_string()),
        ..Default::default()
    };
    let report = service.get_allocation_report(&filter).await.unwrap();

    assert_eq!(report.summary.total_value, dec!(1000));
    assert_eq!(report.by_account.len(), 1);
    assert_eq!(report.by_account[0].key, "acc-1");
    assert_eq!(report.by_account[0].percentage, dec!(100));
}

#[tokio::test]
async fn test_invalid_filter_rejected_before_aggregation() {
    let service = create_allocation_service(vec![], vec![]);

    let filter = ReportFilter {
        start_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
        end_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
        ..Default::default()
    };
    let result = service.get_allocation_report(&filter).await;

    assert!(matches!(result, Err(Error::InvalidFilter(_))));
}

#[tokio::test]
async fn test_identical_snapshots_produce_identical_reports() {
    let accounts = vec![create_test_account("acc-1", "Brokerage", TaxTreatment::Taxable)];
    let positions = vec![
        create_test_position("pos-1", "acc-1", AssetCategory::Equity, dec!(5000), dec!(6200.33)),
        create_test_position("pos-2", "acc-1", AssetCategory::Cash, dec!(1000), dec!(1000)),
    ];
    let service = create_allocation_service(positions, accounts);

    let first = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();
    let second = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_group_value_helper_consistency() {
    let accounts = vec![create_test_account("acc-1", "Brokerage", TaxTreatment::Taxable)];
    let positions = vec![
        create_test_position("pos-1", "acc-1", AssetCategory::Equity, dec!(100), dec!(750)),
        create_test_position("pos-2", "acc-1", AssetCategory::RealEstate, dec!(100), dec!(250)),
    ];
    let service = create_allocation_service(positions, accounts);

    let report = service
        .get_allocation_report(&ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(group_value(&report.by_category, "EQUITY"), dec!(750));
    assert_eq!(group_value(&report.by_category, "REAL_ESTATE"), dec!(250));
    assert_eq!(group_value(&report.by_category, "COMMODITY"), Decimal::ZERO);
}
