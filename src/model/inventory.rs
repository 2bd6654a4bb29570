// src/model/inventory.rs

use crate::error::ValidationError;
use crate::model::catalog::{ProductCategory, ProductSpec};
use crate::model::money::Money;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Units that arrived together and go off together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockLot {
    pub received_on: u32,
    /// First day the lot is no longer sellable.
    pub expires_on: u32,
    pub quantity: u32,
}

/// Stock and pricing for a single SKU.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuRecord {
    pub sku: String,
    /// Weighted-average cost basis of the units on hand.
    pub unit_cost: Money,
    pub shelf_price: Money,
    pub quantity: u32,
    pub reorder_point: u32,

    // Demand profile, fixed for the run
    pub reference_price: Money,
    pub price_elasticity: f64,
    pub base_sales: f64,
    pub category: ProductCategory,
    pub shelf_life_days: u32,

    /// Oldest first. Quantities always add up to `quantity`.
    pub lots: VecDeque<StockLot>,
}

impl SkuRecord {
    /// Opening stock counts as received on day 0.
    pub fn from_spec(spec: &ProductSpec, quantity: u32, reorder_point: u32) -> Self {
        let reference_price = Money::from_dollars(spec.typical_retail);
        let mut record = Self {
            sku: spec.sku.clone(),
            unit_cost: Money::from_dollars(spec.supplier_cost),
            shelf_price: reference_price,
            quantity,
            reorder_point,
            reference_price,
            price_elasticity: spec.price_elasticity,
            base_sales: spec.base_sales,
            category: spec.category,
            shelf_life_days: spec.shelf_life_days,
            lots: VecDeque::new(),
        };
        record.receive(quantity, 0);
        record
    }

    /// Value of the units on hand at cost.
    pub fn stock_value(&self) -> Money {
        Money::from_cents(self.unit_cost.cents() * self.quantity as i64)
    }

    /// Units in lots that are past their shelf life on `day`.
    ///
    /// Only the oldest run of lots counts, which is exactly what the next
    /// sale would take first.
    pub fn expired_units(&self, day: u32) -> u32 {
        self.lots
            .iter()
            .take_while(|lot| lot.expires_on <= day)
            .map(|lot| lot.quantity)
            .sum()
    }

    pub fn lot_units(&self) -> u64 {
        self.lots.iter().map(|lot| u64::from(lot.quantity)).sum()
    }

    fn receive(&mut self, quantity: u32, day: u32) {
        if quantity > 0 {
            self.lots.push_back(StockLot {
                received_on: day,
                expires_on: day.saturating_add(self.shelf_life_days),
                quantity,
            });
        }
    }

    fn take_oldest(&mut self, mut quantity: u32) {
        while quantity > 0 {
            let Some(lot) = self.lots.front_mut() else {
                break;
            };
            let taken = quantity.min(lot.quantity);
            lot.quantity -= taken;
            quantity -= taken;
            if lot.quantity == 0 {
                self.lots.pop_front();
            }
        }
    }
}

/// Per-SKU stock levels. Keyed by SKU id in sorted order so that every walk
/// over the store (sales, snapshots, reports) is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inventory {
    records: BTreeMap<String, SkuRecord>,
}

impl Inventory {
    pub fn new(records: impl IntoIterator<Item = SkuRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.sku.clone(), r)).collect(),
        }
    }

    pub fn from_catalog(catalog: &[ProductSpec], starting_units: u32, reorder_point: u32) -> Self {
        Self::new(
            catalog
                .iter()
                .map(|spec| SkuRecord::from_spec(spec, starting_units, reorder_point)),
        )
    }

    pub fn get(&self, sku: &str) -> Result<&SkuRecord, ValidationError> {
        self.records.get(sku).ok_or_else(|| unknown(sku))
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.records.contains_key(sku)
    }

    pub fn records(&self) -> impl Iterator<Item = &SkuRecord> {
        self.records.values()
    }

    pub fn skus(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Removes `quantity` units and returns the revenue at `unit_price`.
    ///
    /// Units leave oldest lot first. The caller credits the revenue to the
    /// ledger. A spoilage write-down is a sale at zero price.
    pub fn sell(&mut self, sku: &str, quantity: u32, unit_price: Money) -> Result<Money, ValidationError> {
        let record = self.records.get_mut(sku).ok_or_else(|| unknown(sku))?;
        if quantity > record.quantity {
            return Err(ValidationError::InsufficientStock {
                sku: sku.to_string(),
                requested: quantity,
                on_hand: record.quantity,
            });
        }
        let revenue = unit_price
            .checked_times(quantity)
            .ok_or(ValidationError::AmountOverflow)?;
        record.quantity -= quantity;
        record.take_oldest(quantity);
        Ok(revenue)
    }

    /// Adds delivered units as a new lot received on `day` and folds their
    /// cost into the cost basis. Returns the extended cost of the delivery.
    ///
    /// Only the fulfillment pipeline calls this.
    pub fn restock(&mut self, sku: &str, quantity: u32, unit_cost: Money, day: u32) -> Result<Money, ValidationError> {
        let record = self.records.get_mut(sku).ok_or_else(|| unknown(sku))?;
        let cost = unit_cost
            .checked_times(quantity)
            .ok_or(ValidationError::AmountOverflow)?;
        let new_quantity = record
            .quantity
            .checked_add(quantity)
            .ok_or(ValidationError::AmountOverflow)?;

        if new_quantity > 0 {
            let total = record.stock_value() + cost;
            record.unit_cost = Money::from_cents(
                (total.cents() as f64 / new_quantity as f64).round() as i64,
            );
        }
        record.quantity = new_quantity;
        record.receive(quantity, day);
        Ok(cost)
    }

    pub fn set_price(&mut self, sku: &str, price: Money) -> Result<Money, ValidationError> {
        let record = self.records.get_mut(sku).ok_or_else(|| unknown(sku))?;
        if !price.is_positive() {
            return Err(ValidationError::InvalidPrice { price });
        }
        let old = record.shelf_price;
        record.shelf_price = price;
        Ok(old)
    }

    /// Total value of everything on hand, at cost.
    pub fn stock_value(&self) -> Money {
        self.records.values().map(SkuRecord::stock_value).sum()
    }

    pub fn units_on_hand(&self) -> u64 {
        self.records.values().map(|r| r.quantity as u64).sum()
    }

    /// SKUs with at least one unit on hand.
    pub fn stocked_count(&self) -> usize {
        self.records.values().filter(|r| r.quantity > 0).count()
    }
}

fn unknown(sku: &str) -> ValidationError {
    ValidationError::UnknownSku {
        sku: sku.to_string(),
    }
}
