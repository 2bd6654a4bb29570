// src/strategy/traits.rs

use crate::model::decision::{Decision, DecisionResult};
use crate::model::event::Event;
use crate::model::money::Money;
use crate::model::queues::PendingOrder;
use crate::model::state::SimulationState;
use crate::simulation::events::price_cap;
use serde::Serialize;
use std::fmt::Debug;

/// What the agent sees about one SKU.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuView {
    pub sku: String,
    pub stock: u32,
    pub shelf_price: Money,
    pub unit_cost: Money,
    pub reference_price: Money,
    pub reorder_point: u32,
    /// Units paid for but not yet delivered.
    pub in_transit: u32,
    /// Highest allowed shelf price while a price war is on.
    pub price_cap: Option<Money>,
}

/// Everything handed to the agent at the start of a turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub day: u32,
    pub horizon: u32,
    pub turn: u32,
    pub cash: Money,
    pub skus: Vec<SkuView>,
    pub active_events: Vec<Event>,
    pub pending_orders: Vec<PendingOrder>,
    pub lead_time: u32,
    pub last_result: Option<DecisionResult>,
    pub messages_remaining: u32,
}

impl Observation {
    pub fn capture(
        state: &SimulationState,
        turn: u32,
        last_result: Option<DecisionResult>,
        max_messages: u32,
    ) -> Self {
        let skus = state
            .inventory
            .records()
            .map(|record| SkuView {
                sku: record.sku.clone(),
                stock: record.quantity,
                shelf_price: record.shelf_price,
                unit_cost: record.unit_cost,
                reference_price: record.reference_price,
                reorder_point: record.reorder_point,
                in_transit: state.pipeline.pending_units(&record.sku),
                price_cap: price_cap(&state.events, record),
            })
            .collect();

        Self {
            day: state.day(),
            horizon: state.clock.horizon(),
            turn,
            cash: state.cash(),
            skus,
            active_events: state.events.active().to_vec(),
            pending_orders: state.pipeline.pending().cloned().collect(),
            lead_time: state.pipeline.lead_time(),
            last_result,
            messages_remaining: max_messages.saturating_sub(state.messages_used),
        }
    }

    pub fn sku(&self, sku: &str) -> Option<&SkuView> {
        self.skus.iter().find(|s| s.sku == sku)
    }
}

/// The decision-making collaborator driving the business.
///
/// The engine calls `decide` once per turn and blocks until it returns. `Send`
/// lets independent runs own their agents on separate threads.
pub trait Agent: Debug + Send {
    fn decide(&mut self, observation: &Observation) -> Decision;

    /// Short label used in logs and reports.
    fn name(&self) -> &str;
}
