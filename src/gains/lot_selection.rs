//! Lot selection policy for sale replay.
//!
//! Which open lots a sale consumes changes both the realized gain amount
//! and its holding-period classification, so the policy is a named,
//! injectable strategy rather than behavior buried in the replay loop.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A tax lot's consumable state during sale replay.
#[derive(Debug, Clone)]
pub struct OpenLot {
    pub lot_id: String,
    pub acquisition_date: NaiveDate,
    pub remaining_shares: Decimal,
    /// Fixed at acquisition; partial consumption never changes it
    pub cost_per_share: Decimal,
}

/// One planned consumption of an open lot.
#[derive(Debug, Clone, PartialEq)]
pub struct LotConsumption {
    pub lot_id: String,
    pub acquisition_date: NaiveDate,
    pub shares: Decimal,
    pub cost_basis: Decimal,
}

/// Policy choosing which open lots a sale consumes.
///
/// Implementations plan against the lots as given and never mutate them.
/// A plan never consumes more than `shares_to_sell` in total, never more
/// than a lot's remaining shares, and covers less than `shares_to_sell`
/// only when the open lots cannot supply it.
pub trait LotSelectionStrategy: Send + Sync {
    fn select(&self, open_lots: &[OpenLot], shares_to_sell: Decimal) -> Vec<LotConsumption>;
}

/// Earliest acquisition date first, ties broken by lot id.
#[derive(Debug, Clone, Copy, Default)]
pub struct FifoLotSelection;

impl LotSelectionStrategy for FifoLotSelection {
    fn select(&self, open_lots: &[OpenLot], shares_to_sell: Decimal) -> Vec<LotConsumption> {
        let mut ordered: Vec<&OpenLot> = open_lots
            .iter()
            .filter(|lot| lot.remaining_shares > Decimal::ZERO)
            .collect();
        ordered.sort_by(|a, b| {
            a.acquisition_date
                .cmp(&b.acquisition_date)
                .then_with(|| a.lot_id.cmp(&b.lot_id))
        });

        let mut plan = Vec::new();
        let mut unfilled = shares_to_sell;
        for lot in ordered {
            if unfilled <= Decimal::ZERO {
                break;
            }
            let shares = lot.remaining_shares.min(unfilled);
            plan.push(LotConsumption {
                lot_id: lot.lot_id.clone(),
                acquisition_date: lot.acquisition_date,
                shares,
                cost_basis: shares * lot.cost_per_share,
            });
            unfilled -= shares;
        }
        plan
    }
}
