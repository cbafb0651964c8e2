//! Performance reporting over positions and the transaction ledger.
//!
//! The by-period breakdown walks continuous calendar periods across the
//! report window. Each period opens with the cost basis left by the
//! previous one, accumulates net BUY/SELL investment and investment
//! income, and the final period absorbs the unrealized remainder so the
//! chained period returns reconcile with the overall return.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use log::debug;
use rust_decimal::Decimal;

use super::performance_model::{
    ActivitySummary, PerformanceReport, PerformanceSummary, PeriodBucket, PeriodPerformance,
    PositionPerformance,
};
use super::performance_traits::PerformanceServiceTrait;
use crate::errors::Result;
use crate::ledger::{
    LedgerRepositoryTrait, Position, ReportFilter, Transaction, TransactionType,
};
use crate::valuation::{percent_of, round_currency};

/// Position of one calendar period on the timeline.
#[derive(Debug, Clone, Copy)]
struct PeriodKey {
    bucket: PeriodBucket,
    year: i32,
    /// Month (1-12), quarter (1-4), always 1 for year periods
    index: u32,
}

impl PeriodKey {
    fn containing(date: NaiveDate, bucket: PeriodBucket) -> Self {
        let index = match bucket {
            PeriodBucket::Month => date.month(),
            PeriodBucket::Quarter => (date.month() - 1) / 3 + 1,
            PeriodBucket::Year => 1,
        };
        Self {
            bucket,
            year: date.year(),
            index,
        }
    }

    fn next(self) -> Self {
        let last_index = match self.bucket {
            PeriodBucket::Month => 12,
            PeriodBucket::Quarter => 4,
            PeriodBucket::Year => 1,
        };
        if self.index >= last_index {
            Self {
                year: self.year + 1,
                index: 1,
                ..self
            }
        } else {
            Self {
                index: self.index + 1,
                ..self
            }
        }
    }

    fn first_month(&self) -> u32 {
        match self.bucket {
            PeriodBucket::Month => self.index,
            PeriodBucket::Quarter => (self.index - 1) * 3 + 1,
            PeriodBucket::Year => 1,
        }
    }

    fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.first_month(), 1).unwrap_or_default()
    }

    fn end_date(&self) -> NaiveDate {
        self.next().start_date().pred_opt().unwrap_or_default()
    }

    fn label(&self) -> String {
        match self.bucket {
            PeriodBucket::Month => format!("{:04}-{:02}", self.year, self.index),
            PeriodBucket::Quarter => format!("{:04}-Q{}", self.year, self.index),
            PeriodBucket::Year => format!("{:04}", self.year),
        }
    }
}

/// One calendar period before rounding and remainder attribution.
struct RawPeriod {
    label: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    starting_cost_basis: Decimal,
    net_invested: Decimal,
    income: Decimal,
}

pub struct PerformanceService {
    base_currency: Arc<RwLock<String>>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
}

impl PerformanceService {
    pub fn new(
        base_currency: Arc<RwLock<String>>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    ) -> Self {
        Self {
            base_currency,
            ledger_repository,
        }
    }

    /// Effect of a transaction on the invested cost basis.
    fn basis_effect(transaction: &Transaction) -> Decimal {
        match transaction.transaction_type {
            TransactionType::Buy => transaction.total_amount,
            TransactionType::Sell => -transaction.total_amount,
            _ => Decimal::ZERO,
        }
    }

    fn is_investment_income(transaction_type: &TransactionType) -> bool {
        matches!(
            transaction_type,
            TransactionType::Dividend
                | TransactionType::Distribution
                | TransactionType::Interest
                | TransactionType::Income
        )
    }

    /// Ranks every in-scope position by percent return descending, with
    /// deterministic tie-breaks on absolute return and position id.
    fn rank_positions(positions: &[Position]) -> Vec<PositionPerformance> {
        let mut entries: Vec<PositionPerformance> = positions
            .iter()
            .map(|position| {
                let absolute_return = position.current_value - position.cost_basis_total;
                PositionPerformance {
                    position_id: position.id.clone(),
                    symbol: position.symbol.clone(),
                    value: round_currency(position.current_value),
                    cost_basis: round_currency(position.cost_basis_total),
                    absolute_return: round_currency(absolute_return),
                    percent_return: percent_of(absolute_return, position.cost_basis_total),
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.percent_return
                .cmp(&a.percent_return)
                .then_with(|| b.absolute_return.cmp(&a.absolute_return))
                .then_with(|| a.position_id.cmp(&b.position_id))
        });
        entries
    }

    /// Walks calendar periods from the one containing `range_start`
    /// through the one containing `range_end`, empty periods included.
    fn build_period_breakdown(
        windowed: &[&Transaction],
        opening_basis: Decimal,
        range_start: NaiveDate,
        range_end: NaiveDate,
        bucket: PeriodBucket,
        total_value: Decimal,
    ) -> Vec<PeriodPerformance> {
        let mut raw_periods = Vec::new();
        let mut basis = opening_basis;
        let mut key = PeriodKey::containing(range_start, bucket);

        loop {
            let calendar_end = key.end_date();
            let start_date = key.start_date().max(range_start);
            let end_date = calendar_end.min(range_end);

            let mut net_invested = Decimal::ZERO;
            let mut income = Decimal::ZERO;
            for transaction in windowed
                .iter()
                .filter(|t| t.transaction_date >= start_date && t.transaction_date <= end_date)
            {
                net_invested += Self::basis_effect(transaction);
                if Self::is_investment_income(&transaction.transaction_type) {
                    income += transaction.total_amount;
                }
            }

            raw_periods.push(RawPeriod {
                label: key.label(),
                start_date,
                end_date,
                starting_cost_basis: basis,
                net_invested,
                income,
            });
            basis += net_invested;

            if calendar_end >= range_end {
                break;
            }
            key = key.next();
        }

        // The final period carries the gap between the evolved basis and
        // the current portfolio value as unrealized gain/loss.
        let remainder = total_value - basis;
        let last_index = raw_periods.len().saturating_sub(1);

        raw_periods
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let mut gain_loss = raw.income;
                if index == last_index {
                    gain_loss += remainder;
                }
                PeriodPerformance {
                    label: raw.label,
                    start_date: raw.start_date,
                    end_date: raw.end_date,
                    starting_cost_basis: round_currency(raw.starting_cost_basis),
                    net_invested: round_currency(raw.net_invested),
                    gain_loss: round_currency(gain_loss),
                    return_percent: percent_of(gain_loss, raw.starting_cost_basis),
                }
            })
            .collect()
    }

    fn build_activity_summary(windowed: &[&Transaction]) -> ActivitySummary {
        let mut summary = ActivitySummary::default();
        for transaction in windowed {
            match transaction.transaction_type {
                TransactionType::Contribution | TransactionType::TransferIn => {
                    summary.contributions += transaction.total_amount;
                }
                TransactionType::Withdrawal | TransactionType::TransferOut => {
                    summary.withdrawals += transaction.total_amount;
                }
                TransactionType::Fee | TransactionType::Expense => {
                    summary.fees_and_expenses += transaction.total_amount;
                }
                TransactionType::Dividend
                | TransactionType::Distribution
                | TransactionType::Interest
                | TransactionType::Income => {
                    summary.investment_income += transaction.total_amount;
                }
                TransactionType::Buy | TransactionType::Sell => {}
            }
            if transaction.transaction_type.is_external_flow() {
                summary.net_external_flow += transaction.signed_amount();
            }
        }

        summary.contributions = round_currency(summary.contributions);
        summary.withdrawals = round_currency(summary.withdrawals);
        summary.investment_income = round_currency(summary.investment_income);
        summary.fees_and_expenses = round_currency(summary.fees_and_expenses);
        summary.net_external_flow = round_currency(summary.net_external_flow);
        summary
    }
}

#[async_trait]
impl PerformanceServiceTrait for PerformanceService {
    async fn get_performance_report(
        &self,
        filter: &ReportFilter,
        bucket: PeriodBucket,
    ) -> Result<PerformanceReport> {
        filter.validate()?;
        let base_currency = self.base_currency.read().unwrap().clone();
        debug!(
            "Building performance report for account {:?}, bucket {:?}",
            filter.account_id, bucket
        );

        let positions: Vec<Position> = self
            .ledger_repository
            .get_positions(filter)?
            .into_iter()
            .filter(|p| filter.matches_account(&p.account_id))
            .collect();

        // Fetch without a start bound so trades before the window can
        // seed the opening cost basis.
        let fetch_filter = ReportFilter {
            start_date: None,
            kind: None,
            ..filter.clone()
        };
        let range_end = filter
            .end_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let mut transactions: Vec<Transaction> = self
            .ledger_repository
            .get_transactions(&fetch_filter)?
            .into_iter()
            .filter(|t| filter.matches_account(&t.account_id) && t.transaction_date <= range_end)
            .collect();

        if positions.is_empty() && transactions.is_empty() {
            debug!("No positions or transactions in scope, returning empty report");
            return Ok(PerformanceReport::empty(base_currency));
        }

        transactions.sort_by(|a, b| {
            a.transaction_date
                .cmp(&b.transaction_date)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total_value: Decimal = positions.iter().map(|p| p.current_value).sum();
        let total_cost_basis: Decimal = positions.iter().map(|p| p.cost_basis_total).sum();
        let total_return = total_value - total_cost_basis;

        let range_start = filter
            .start_date
            .or_else(|| transactions.first().map(|t| t.transaction_date));

        let (by_period, activity) = match range_start {
            Some(range_start) if range_start <= range_end => {
                let (pre_window, windowed): (Vec<&Transaction>, Vec<&Transaction>) = transactions
                    .iter()
                    .partition(|t| t.transaction_date < range_start);
                let opening_basis: Decimal =
                    pre_window.iter().map(|t| Self::basis_effect(t)).sum();
                let by_period = Self::build_period_breakdown(
                    &windowed,
                    opening_basis,
                    range_start,
                    range_end,
                    bucket,
                    total_value,
                );
                let activity = Self::build_activity_summary(&windowed);
                (by_period, activity)
            }
            _ => (Vec::new(), ActivitySummary::default()),
        };

        debug!(
            "Performance report ready: {} positions, {} periods",
            positions.len(),
            by_period.len()
        );

        Ok(PerformanceReport {
            summary: PerformanceSummary {
                total_value: round_currency(total_value),
                total_cost_basis: round_currency(total_cost_basis),
                total_return: round_currency(total_return),
                total_return_percent: percent_of(total_return, total_cost_basis),
            },
            positions: Self::rank_positions(&positions),
            by_period,
            activity,
            currency: base_currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_key_bounds_and_label() {
        let key = PeriodKey::containing(date(2024, 2, 15), PeriodBucket::Month);
        assert_eq!(key.start_date(), date(2024, 2, 1));
        assert_eq!(key.end_date(), date(2024, 2, 29));
        assert_eq!(key.label(), "2024-02");
    }

    #[test]
    fn test_month_key_rolls_over_year() {
        let key = PeriodKey::containing(date(2023, 12, 31), PeriodBucket::Month);
        let next = key.next();
        assert_eq!(next.start_date(), date(2024, 1, 1));
        assert_eq!(next.label(), "2024-01");
    }

    #[test]
    fn test_quarter_key_bounds_and_label() {
        let key = PeriodKey::containing(date(2024, 5, 10), PeriodBucket::Quarter);
        assert_eq!(key.start_date(), date(2024, 4, 1));
        assert_eq!(key.end_date(), date(2024, 6, 30));
        assert_eq!(key.label(), "2024-Q2");

        let q4 = PeriodKey::containing(date(2024, 11, 1), PeriodBucket::Quarter);
        assert_eq!(q4.label(), "2024-Q4");
        assert_eq!(q4.next().label(), "2025-Q1");
    }

    #[test]
    fn test_year_key_bounds_and_label() {
        let key = PeriodKey::containing(date(2024, 7, 4), PeriodBucket::Year);
        assert_eq!(key.start_date(), date(2024, 1, 1));
        assert_eq!(key.end_date(), date(2024, 12, 31));
        assert_eq!(key.label(), "2024");
        assert_eq!(key.next().label(), "2025");
    }
}
