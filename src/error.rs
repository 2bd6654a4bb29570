// src/error.rs

use crate::model::money::Money;
use crate::simulation::config::ConfigError;
use serde::Serialize;
use thiserror::Error;

/// A decision (or a component call made on its behalf) that cannot be applied.
///
/// These are recovered locally: the decision is rejected, nothing is mutated,
/// and the reason is fed back to the agent in its next observation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("unknown SKU '{sku}'")]
    UnknownSku { sku: String },

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Money, available: Money },

    #[error("insufficient stock of '{sku}': requested {requested}, on hand {on_hand}")]
    InsufficientStock {
        sku: String,
        requested: u32,
        on_hand: u32,
    },

    #[error("invalid price {price}: must be positive")]
    InvalidPrice { price: Money },

    #[error("price {price} for '{sku}' exceeds the price-war cap of {cap}")]
    PriceAboveCap { sku: String, price: Money, cap: Money },

    #[error("invalid quantity {quantity}: must be positive")]
    InvalidQuantity { quantity: u32 },

    #[error("invalid unit cost {unit_cost}: must be positive")]
    InvalidUnitCost { unit_cost: Money },

    #[error("order total overflows")]
    AmountOverflow,

    #[error("ordering {quantity} more '{sku}' would overflow its stock count")]
    StockOverflow { sku: String, quantity: u32 },
}

/// Fatal engine failures. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// An internal consistency rule was broken. Never caused by the agent.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("clock advanced past the horizon of {horizon} days")]
    HorizonExceeded { horizon: u32 },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimulationError {
    pub fn invariant(message: impl Into<String>) -> Self {
        SimulationError::InvariantViolation(message.into())
    }
}

pub type Result<T, E = SimulationError> = std::result::Result<T, E>;
