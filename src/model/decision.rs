// src/model/decision.rs

use crate::error::ValidationError;
use crate::model::money::Money;
use crate::model::queues::OrderId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The one thing an agent does in a turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Decision {
    PriceUpdate {
        sku: String,
        price: Money,
    },
    RestockOrder {
        sku: String,
        quantity: u32,
        unit_cost: Money,
    },
    NoOp,
}

impl Decision {
    pub fn set_price(sku: &str, price: Money) -> Self {
        Decision::PriceUpdate {
            sku: sku.to_string(),
            price,
        }
    }

    pub fn restock(sku: &str, quantity: u32, unit_cost: Money) -> Self {
        Decision::RestockOrder {
            sku: sku.to_string(),
            quantity,
            unit_cost,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Decision::NoOp)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::PriceUpdate { sku, price } => write!(f, "set {} price to {}", sku, price),
            Decision::RestockOrder {
                sku,
                quantity,
                unit_cost,
            } => write!(f, "order {} {} at {}", quantity, sku, unit_cost),
            Decision::NoOp => f.write_str("no-op"),
        }
    }
}

/// Net effect of an accepted decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateDelta {
    pub cash: Money,
    pub order_id: Option<OrderId>,
    pub old_price: Option<Money>,
    pub new_price: Option<Money>,
}

/// Outcome of one turn, fed back to the agent in its next observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionResult {
    pub turn: u32,
    pub day: u32,
    pub decision: Decision,
    pub accepted: bool,
    pub rejection: Option<ValidationError>,
    pub delta: StateDelta,
    pub outcome: String,
}

impl DecisionResult {
    pub fn accepted(turn: u32, day: u32, decision: Decision, delta: StateDelta, outcome: String) -> Self {
        Self {
            turn,
            day,
            decision,
            accepted: true,
            rejection: None,
            delta,
            outcome,
        }
    }

    pub fn rejected(turn: u32, day: u32, decision: Decision, reason: ValidationError) -> Self {
        let outcome = format!("Rejected '{}': {}", decision, reason);
        Self {
            turn,
            day,
            decision,
            accepted: false,
            rejection: Some(reason),
            delta: StateDelta::default(),
            outcome,
        }
    }
}
