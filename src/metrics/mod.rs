// src/metrics/mod.rs

pub mod coherence;

use crate::model::ledger::{Transaction, TransactionKind};
use crate::model::money::Money;
use crate::model::state::SimulationState;
use serde::Serialize;

/// End-of-day picture of the business. One row per simulated day in the
/// snapshot CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySnapshot {
    pub day: u32,
    pub cash: Money,
    pub inventory_value: Money,
    pub net_worth: Money,
    pub units_on_hand: u64,
    pub units_sold: u32,
    pub revenue: Money,
    pub pending_orders: usize,
    pub active_events: usize,
}

/// Cash plus stock on hand valued at cost.
pub fn net_worth(state: &SimulationState) -> Money {
    state.net_worth()
}

/// First day from which net worth stays above `starting_cash` for the rest of
/// the run. `None` when the last day ends at or below it.
pub fn days_to_profitability(series: &[DailySnapshot], starting_cash: Money) -> Option<u32> {
    let mut first = None;
    for snapshot in series.iter().rev() {
        if snapshot.net_worth <= starting_cash {
            break;
        }
        first = Some(snapshot.day);
    }
    first
}

/// Share of all units that ended up sold rather than spoiled or left on the
/// shelf.
pub fn inventory_efficiency(transactions: &[Transaction], on_hand_at_end: u64) -> Option<f64> {
    let sold = units_of(transactions, TransactionKind::Sale);
    let spoiled = units_of(transactions, TransactionKind::Spoilage);
    let total = sold + spoiled + on_hand_at_end;
    if total == 0 {
        return None;
    }
    Some(sold as f64 / total as f64)
}

pub fn units_of(transactions: &[Transaction], kind: TransactionKind) -> u64 {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .map(|t| u64::from(t.quantity))
        .sum()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub revenue: Money,
    /// Everything that left the till: purchases, fees and fines.
    pub costs: Money,
    pub fees: Money,
    pub fines: Money,
    pub purchases: Money,
    pub units_sold: u64,
    pub units_spoiled: u64,
}

impl Totals {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut totals = Totals::default();
        for t in transactions {
            match t.kind {
                TransactionKind::Sale => {
                    totals.revenue += t.amount;
                    totals.units_sold += u64::from(t.quantity);
                }
                TransactionKind::Spoilage => totals.units_spoiled += u64::from(t.quantity),
                TransactionKind::Purchase => totals.purchases -= t.amount,
                TransactionKind::Fee => totals.fees -= t.amount,
                TransactionKind::Fine => totals.fines -= t.amount,
            }
        }
        totals.costs = totals.purchases + totals.fees + totals.fines;
        totals
    }
}

/// Collects one snapshot per day. Reads the state, never writes it.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    snapshots: Vec<DailySnapshot>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, state: &SimulationState, units_sold: u32, revenue: Money) -> &DailySnapshot {
        let inventory_value = state.inventory.stock_value();
        self.snapshots.push(DailySnapshot {
            day: state.day(),
            cash: state.cash(),
            inventory_value,
            net_worth: state.cash() + inventory_value,
            units_on_hand: state.inventory.units_on_hand(),
            units_sold,
            revenue,
            pending_orders: state.pipeline.pending_count(),
            active_events: state.events.active().len(),
        });
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn snapshots(&self) -> &[DailySnapshot] {
        &self.snapshots
    }

    pub fn into_snapshots(self) -> Vec<DailySnapshot> {
        self.snapshots
    }
}
