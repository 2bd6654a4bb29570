// src/model/state.rs

use crate::error::SimulationError;
use crate::model::event::EventBook;
use crate::model::inventory::Inventory;
use crate::model::ledger::Ledger;
use crate::model::money::Money;
use crate::model::queues::OrderPipeline;
use crate::simulation::clock::Clock;
use serde::Serialize;

/// Everything a run knows about the business.
///
/// Owned by the simulation loop. Components borrow the part they need for a
/// single call and keep nothing between calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationState {
    pub clock: Clock,
    pub ledger: Ledger,
    pub inventory: Inventory,
    pub pipeline: OrderPipeline,
    pub events: EventBook,
    /// Agent calls made so far.
    pub messages_used: u32,
    /// Days in a row that ended with negative cash.
    pub days_in_debt: u32,
}

impl SimulationState {
    pub fn new(clock: Clock, starting_cash: Money, inventory: Inventory, lead_time: u32) -> Self {
        Self {
            clock,
            ledger: Ledger::new(starting_cash),
            inventory,
            pipeline: OrderPipeline::new(lead_time),
            events: EventBook::default(),
            messages_used: 0,
            days_in_debt: 0,
        }
    }

    pub fn day(&self) -> u32 {
        self.clock.day()
    }

    pub fn cash(&self) -> Money {
        self.ledger.balance()
    }

    /// Cash plus stock on hand at cost.
    pub fn net_worth(&self) -> Money {
        self.cash() + self.inventory.stock_value()
    }

    /// Checks the cross-component invariants. Run once per day; a failure
    /// aborts the run.
    pub fn check_invariants(&self) -> Result<(), SimulationError> {
        self.ledger.verify()?;

        for order in self.pipeline.pending() {
            if order.matures_on <= order.placed_on {
                return Err(SimulationError::invariant(format!(
                    "order {} matures on day {} but was placed on day {}",
                    order.id, order.matures_on, order.placed_on
                )));
            }
            if !self.inventory.contains(&order.sku) {
                return Err(SimulationError::invariant(format!(
                    "order {} references unknown SKU '{}'",
                    order.id, order.sku
                )));
            }
            if self.pipeline.delivered().iter().any(|d| d.id == order.id) {
                return Err(SimulationError::invariant(format!(
                    "order {} is both pending and delivered",
                    order.id
                )));
            }
        }

        for record in self.inventory.records() {
            if record.lot_units() != u64::from(record.quantity) {
                return Err(SimulationError::invariant(format!(
                    "'{}' has {} units on hand but {} in lots",
                    record.sku,
                    record.quantity,
                    record.lot_units()
                )));
            }
        }

        let mut ids: Vec<_> = self
            .pipeline
            .pending()
            .chain(self.pipeline.delivered())
            .map(|o| o.id)
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != total {
            return Err(SimulationError::invariant("duplicate order id"));
        }

        if let Some(stale) = self
            .events
            .active()
            .iter()
            .find(|e| e.is_expired_on(self.day()))
        {
            return Err(SimulationError::invariant(format!(
                "event {} is still active after its last day {}",
                stale.id,
                stale.last_day()
            )));
        }
        Ok(())
    }
}
