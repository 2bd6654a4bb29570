// src/simulation/applier.rs

use crate::error::ValidationError;
use crate::model::decision::{Decision, DecisionResult, StateDelta};
use crate::model::state::SimulationState;
use crate::simulation::events::{price_cap, supplier_delay};
use tracing::{debug, warn};

/// Applies a single agent decision, all or nothing.
///
/// Every check runs before the first mutation, so a rejected decision leaves
/// the state exactly as it found it.
pub fn apply_decision(state: &mut SimulationState, turn: u32, decision: Decision) -> DecisionResult {
    let day = state.day();
    match try_apply(state, &decision) {
        Ok((delta, outcome)) => {
            debug!(day, turn, %decision, "decision applied");
            DecisionResult::accepted(turn, day, decision, delta, outcome)
        }
        Err(reason) => {
            warn!(day, turn, %decision, %reason, "decision rejected");
            DecisionResult::rejected(turn, day, decision, reason)
        }
    }
}

fn try_apply(state: &mut SimulationState, decision: &Decision) -> Result<(StateDelta, String), ValidationError> {
    match decision {
        Decision::PriceUpdate { sku, price } => {
            let record = state.inventory.get(sku)?;
            if !price.is_positive() {
                return Err(ValidationError::InvalidPrice { price: *price });
            }
            if let Some(cap) = price_cap(&state.events, record) {
                if *price > cap {
                    return Err(ValidationError::PriceAboveCap {
                        sku: sku.clone(),
                        price: *price,
                        cap,
                    });
                }
            }

            let old = state.inventory.set_price(sku, *price)?;
            Ok((
                StateDelta {
                    old_price: Some(old),
                    new_price: Some(*price),
                    ..Default::default()
                },
                format!("Updated {} price: {} -> {}", sku, old, price),
            ))
        }

        Decision::RestockOrder {
            sku,
            quantity,
            unit_cost,
        } => {
            let day = state.day();
            let delay = supplier_delay(&state.events);
            let before = state.cash();
            let id = state.pipeline.place_order(
                &mut state.ledger,
                &state.inventory,
                sku,
                *quantity,
                *unit_cost,
                day,
                delay,
            )?;
            let paid = before - state.cash();
            let arrives = day + state.pipeline.lead_time() + delay;
            Ok((
                StateDelta {
                    cash: -paid,
                    order_id: Some(id),
                    ..Default::default()
                },
                format!(
                    "Ordered {} units of {} for {} (order #{}), arriving on day {}",
                    quantity, sku, paid, id, arrives
                ),
            ))
        }

        Decision::NoOp => Ok((StateDelta::default(), "No action taken".to_string())),
    }
}
