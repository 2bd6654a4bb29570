// src/model/queues.rs

use crate::error::{SimulationError, ValidationError};
use crate::model::inventory::Inventory;
use crate::model::ledger::{Entry, Ledger, TransactionKind};
use crate::model::money::Money;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

pub type OrderId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Delivered,
}

/// A paid purchase order waiting out its lead time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingOrder {
    pub id: OrderId,
    pub sku: String,
    pub quantity: u32,
    pub unit_cost: Money,
    pub placed_on: u32,
    pub matures_on: u32,
    pub status: OrderStatus,
}

impl PendingOrder {
    pub fn total_cost(&self) -> Money {
        Money::from_cents(self.unit_cost.cents() * self.quantity as i64)
    }
}

/// Goods that arrived today, for the daily feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    pub order_id: OrderId,
    pub sku: String,
    pub quantity: u32,
    pub placed_on: u32,
    pub delivered_on: u32,
}

/// The delayed-delivery queue between a purchase and the shelf.
///
/// Orders are bucketed by maturity day; within a bucket they keep the order in
/// which they were placed, so deliveries of the same SKU arrive FIFO.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPipeline {
    lead_time: u32,
    next_id: OrderId,
    pending: BTreeMap<u32, VecDeque<PendingOrder>>,
    delivered: Vec<PendingOrder>,
}

impl OrderPipeline {
    pub fn new(lead_time: u32) -> Self {
        Self {
            lead_time,
            next_id: 1,
            pending: BTreeMap::new(),
            delivered: Vec::new(),
        }
    }

    pub fn lead_time(&self) -> u32 {
        self.lead_time
    }

    /// Checks an order without placing it. Everything `place_order` can
    /// reject on is covered here.
    pub fn validate_order(
        &self,
        ledger: &Ledger,
        inventory: &Inventory,
        sku: &str,
        quantity: u32,
        unit_cost: Money,
    ) -> Result<Money, ValidationError> {
        let record = inventory.get(sku)?;
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity { quantity });
        }
        if !unit_cost.is_positive() {
            return Err(ValidationError::InvalidUnitCost { unit_cost });
        }
        let total = unit_cost
            .checked_times(quantity)
            .ok_or(ValidationError::AmountOverflow)?;

        // On hand plus everything in transit has to fit once it all lands.
        let landed = u64::from(record.quantity) + self.pending_units_wide(sku) + u64::from(quantity);
        if landed > u64::from(u32::MAX) {
            return Err(ValidationError::StockOverflow {
                sku: sku.to_string(),
                quantity,
            });
        }
        ledger.can_afford(total)?;
        Ok(total)
    }

    /// Pays for an order up front and queues it for delivery on
    /// `current_day + lead_time + extra_delay`.
    ///
    /// `extra_delay` comes from an active supplier-delay event and is normally 0.
    pub fn place_order(
        &mut self,
        ledger: &mut Ledger,
        inventory: &Inventory,
        sku: &str,
        quantity: u32,
        unit_cost: Money,
        current_day: u32,
        extra_delay: u32,
    ) -> Result<OrderId, ValidationError> {
        let total = self.validate_order(ledger, inventory, sku, quantity, unit_cost)?;
        let matures_on = current_day + self.lead_time.max(1) + extra_delay;

        ledger.debit(
            total,
            Entry::new(current_day, TransactionKind::Purchase)
                .sku(sku, quantity)
                .note(format!(
                    "Ordered {} {} at {} - delivery on day {}",
                    quantity, sku, unit_cost, matures_on
                )),
        )?;

        let id = self.next_id;
        self.next_id += 1;
        self.pending.entry(matures_on).or_default().push_back(PendingOrder {
            id,
            sku: sku.to_string(),
            quantity,
            unit_cost,
            placed_on: current_day,
            matures_on,
            status: OrderStatus::Pending,
        });
        Ok(id)
    }

    /// Releases every order maturing today into the inventory.
    ///
    /// This is the only path by which stock increases. Finding an order whose
    /// maturity day is already behind us means a day was skipped, which is an
    /// engine bug.
    pub fn advance_day(&mut self, inventory: &mut Inventory, current_day: u32) -> Result<Vec<Delivery>, SimulationError> {
        if let Some((&overdue, _)) = self.pending.range(..current_day).next() {
            return Err(SimulationError::invariant(format!(
                "orders maturing on day {} were never delivered (now day {})",
                overdue, current_day
            )));
        }

        let Some(batch) = self.pending.remove(&current_day) else {
            return Ok(Vec::new());
        };

        let mut deliveries = Vec::with_capacity(batch.len());
        for mut order in batch {
            if self.delivered.iter().any(|d| d.id == order.id) {
                return Err(SimulationError::invariant(format!(
                    "order {} delivered twice",
                    order.id
                )));
            }
            inventory
                .restock(&order.sku, order.quantity, order.unit_cost, current_day)
                .map_err(|e| {
                    SimulationError::invariant(format!("order {} could not be restocked: {}", order.id, e))
                })?;

            order.status = OrderStatus::Delivered;
            deliveries.push(Delivery {
                order_id: order.id,
                sku: order.sku.clone(),
                quantity: order.quantity,
                placed_on: order.placed_on,
                delivered_on: current_day,
            });
            self.delivered.push(order);
        }
        Ok(deliveries)
    }

    /// Orders still in transit, earliest maturity first.
    pub fn pending(&self) -> impl Iterator<Item = &PendingOrder> {
        self.pending.values().flatten()
    }

    pub fn delivered(&self) -> &[PendingOrder] {
        &self.delivered
    }

    /// In-transit units of `sku`, saturating at `u32::MAX`.
    pub fn pending_units(&self, sku: &str) -> u32 {
        u32::try_from(self.pending_units_wide(sku)).unwrap_or(u32::MAX)
    }

    fn pending_units_wide(&self, sku: &str) -> u64 {
        self.pending()
            .filter(|o| o.sku == sku)
            .map(|o| u64::from(o.quantity))
            .sum()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(VecDeque::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::default_catalog;

    fn setup(cash: f64) -> (OrderPipeline, Ledger, Inventory) {
        (
            OrderPipeline::new(3),
            Ledger::new(Money::from_dollars(cash)),
            Inventory::from_catalog(&default_catalog(), 0, 5),
        )
    }

    #[test]
    fn order_is_paid_immediately_and_delivered_after_lead_time() {
        let (mut pipeline, mut ledger, mut inventory) = setup(100.0);

        let id = pipeline
            .place_order(&mut ledger, &inventory, "chips", 20, Money::from_dollars(0.5), 4, 0)
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(ledger.balance(), Money::from_dollars(90.0));
        assert_eq!(pipeline.pending_units("chips"), 20);

        for day in 5..7 {
            assert!(pipeline.advance_day(&mut inventory, day).unwrap().is_empty());
            assert_eq!(inventory.get("chips").unwrap().quantity, 0);
        }

        let deliveries = pipeline.advance_day(&mut inventory, 7).unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].delivered_on, 7);
        assert_eq!(inventory.get("chips").unwrap().quantity, 20);
        assert_eq!(pipeline.pending_count(), 0);
        assert_eq!(pipeline.delivered()[0].status, OrderStatus::Delivered);
    }

    #[test]
    fn ids_increase_and_same_day_orders_arrive_in_placement_order() {
        let (mut pipeline, mut ledger, mut inventory) = setup(100.0);
        let a = pipeline
            .place_order(&mut ledger, &inventory, "soda", 5, Money::from_dollars(0.6), 1, 0)
            .unwrap();
        let b = pipeline
            .place_order(&mut ledger, &inventory, "soda", 7, Money::from_dollars(0.6), 1, 0)
            .unwrap();
        assert!(b > a);

        let ids: Vec<_> = pipeline
            .advance_day(&mut inventory, 4)
            .unwrap()
            .iter()
            .map(|d| d.order_id)
            .collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn supplier_delay_pushes_maturity_out() {
        let (mut pipeline, mut ledger, inventory) = setup(100.0);
        pipeline
            .place_order(&mut ledger, &inventory, "coffee", 2, Money::from_dollars(1.5), 10, 2)
            .unwrap();
        assert_eq!(pipeline.pending().next().unwrap().matures_on, 15);
    }

    #[test]
    fn rejected_orders_leave_everything_untouched() {
        let (mut pipeline, mut ledger, inventory) = setup(50.0);
        let before = (pipeline.clone(), ledger.clone());

        let cases = [
            ("chips", 100, Money::from_dollars(1.0)),
            ("chips", 0, Money::from_dollars(1.0)),
            ("chips", 10, Money::ZERO),
            ("gum", 10, Money::from_dollars(1.0)),
        ];
        for (sku, qty, cost) in cases {
            assert!(pipeline
                .place_order(&mut ledger, &inventory, sku, qty, cost, 1, 0)
                .is_err());
        }
        assert_eq!((pipeline, ledger), before);
    }

    #[test]
    fn order_that_would_overflow_the_stock_count_is_rejected_up_front() {
        let (mut pipeline, mut ledger, mut inventory) = setup(100_000_000.0);
        inventory.restock("chips", 1, Money::from_cents(1), 0).unwrap();
        let before = (pipeline.clone(), ledger.clone());

        let err = pipeline
            .place_order(&mut ledger, &inventory, "chips", u32::MAX, Money::from_cents(1), 1, 0)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::StockOverflow {
                sku: "chips".into(),
                quantity: u32::MAX
            }
        );
        assert_eq!((pipeline.clone(), ledger.clone()), before);

        // Counts what is already in transit, not just what is on the shelf.
        pipeline
            .place_order(&mut ledger, &inventory, "chips", u32::MAX - 10, Money::from_cents(1), 1, 0)
            .unwrap();
        assert!(matches!(
            pipeline.validate_order(&ledger, &inventory, "chips", 10, Money::from_cents(1)),
            Err(ValidationError::StockOverflow { .. })
        ));
        pipeline
            .validate_order(&ledger, &inventory, "chips", 9, Money::from_cents(1))
            .unwrap();

        // The order that was accepted lands without tripping an invariant.
        let deliveries = pipeline.advance_day(&mut inventory, 4).unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(inventory.get("chips").unwrap().quantity, u32::MAX - 9);
    }

    #[test]
    fn skipping_a_maturity_day_is_an_invariant_violation() {
        let (mut pipeline, mut ledger, mut inventory) = setup(100.0);
        pipeline
            .place_order(&mut ledger, &inventory, "chips", 1, Money::from_dollars(0.5), 1, 0)
            .unwrap();
        let err = pipeline.advance_day(&mut inventory, 5).unwrap_err();
        assert!(matches!(err, SimulationError::InvariantViolation(_)));
    }
}
