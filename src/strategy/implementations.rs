// src/strategy/implementations.rs

use crate::error::Result;
use crate::model::decision::Decision;
use crate::model::money::Money;
use crate::simulation::config::SimulationConfig;
use crate::strategy::optimization::optimal_base_stock;
use crate::strategy::traits::{Agent, Observation};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

// =========================================================================
// 1. Idle Agent
// =========================================================================

/// Never does anything. The baseline every other policy has to beat.
#[derive(Debug, Clone, Default)]
pub struct IdleAgent;

impl Agent for IdleAgent {
    fn decide(&mut self, _observation: &Observation) -> Decision {
        Decision::NoOp
    }

    fn name(&self) -> &str {
        "idle"
    }
}

// =========================================================================
// 2. Reorder-Point Agent (Order-Up-To)
// =========================================================================

/// Per-SKU parameters of the order-up-to policy.
#[derive(Debug, Clone, PartialEq)]
pub struct StockTarget {
    pub order_up_to: u32,
    pub unit_cost: Money,
}

/// A rational shopkeeper.
///
/// Each turn it does the most urgent of:
/// 1. pull a shelf price under an active price-war cap,
/// 2. top up the SKU whose position (on hand + in transit) fell furthest
///    below its reorder point, up to the newsvendor target,
/// 3. nothing.
#[derive(Debug, Clone)]
pub struct ReorderPointAgent {
    targets: BTreeMap<String, StockTarget>,
    undercut: Money,
}

impl ReorderPointAgent {
    pub fn new(targets: BTreeMap<String, StockTarget>) -> Self {
        Self {
            targets,
            undercut: Money::from_cents(5),
        }
    }

    /// Targets from the product catalog: a lost sale costs the margin, an
    /// unsold unit costs its purchase price, and daily demand is taken as the
    /// base sales rate with a generous spread for shocks.
    pub fn with_optimal_targets(config: &SimulationConfig) -> Self {
        let targets = config
            .products
            .iter()
            .map(|product| {
                let margin = (product.typical_retail - product.supplier_cost).max(0.0);
                let order_up_to = optimal_base_stock(
                    margin,
                    product.supplier_cost,
                    product.base_sales,
                    product.base_sales * 0.35,
                    config.lead_time_days,
                )
                .max(config.reorder_point + 1);
                let target = StockTarget {
                    order_up_to,
                    unit_cost: Money::from_dollars(product.supplier_cost),
                };
                (product.sku.clone(), target)
            })
            .collect();
        Self::new(targets)
    }

    fn reprice(&self, observation: &Observation) -> Option<Decision> {
        observation.skus.iter().find_map(|view| {
            let cap = view.price_cap?;
            if view.shelf_price <= cap {
                return None;
            }
            let price = if cap - self.undercut > view.unit_cost {
                cap - self.undercut
            } else {
                cap
            };
            Some(Decision::set_price(&view.sku, price))
        })
    }

    fn restock(&self, observation: &Observation) -> Option<Decision> {
        let (view, target) = observation
            .skus
            .iter()
            .filter_map(|view| Some((view, self.targets.get(&view.sku)?)))
            .filter(|(view, _)| view.stock + view.in_transit <= view.reorder_point)
            .min_by_key(|(view, _)| i64::from(view.stock + view.in_transit) - i64::from(view.reorder_point))?;

        let wanted = target.order_up_to.saturating_sub(view.stock + view.in_transit);
        let affordable = match target.unit_cost.cents() {
            cents if cents > 0 => {
                u32::try_from(observation.cash.cents().max(0) / cents).unwrap_or(u32::MAX)
            }
            _ => 0,
        };
        let quantity = wanted.min(affordable);
        if quantity == 0 {
            return None;
        }
        Some(Decision::restock(&view.sku, quantity, target.unit_cost))
    }
}

impl Agent for ReorderPointAgent {
    fn decide(&mut self, observation: &Observation) -> Decision {
        self.reprice(observation)
            .or_else(|| self.restock(observation))
            .unwrap_or(Decision::NoOp)
    }

    fn name(&self) -> &str {
        "reorder-point"
    }
}

// =========================================================================
// 3. Random Agent
// =========================================================================

/// Picks an arbitrary action each turn. Useful for stress-testing the
/// validation paths; its own random source keeps runs reproducible.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: ChaCha8Rng,
    max_quantity: u32,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_quantity: 30,
        }
    }
}

impl Agent for RandomAgent {
    fn decide(&mut self, observation: &Observation) -> Decision {
        let Some(view) = observation.skus.choose(&mut self.rng) else {
            return Decision::NoOp;
        };
        match self.rng.gen_range(0..3) {
            0 => {
                let factor = self.rng.gen_range(0.7..1.4);
                Decision::set_price(&view.sku, view.reference_price.scaled(factor))
            }
            1 => {
                let quantity = self.rng.gen_range(1..=self.max_quantity);
                Decision::restock(&view.sku, quantity, view.unit_cost)
            }
            _ => Decision::NoOp,
        }
    }

    fn name(&self) -> &str {
        "random"
    }
}

// =========================================================================
// 4. Scripted Agent
// =========================================================================

/// Replays a fixed list of decisions, then idles.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAgent {
    script: VecDeque<Decision>,
}

impl ScriptedAgent {
    pub fn new(script: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Reads a JSON array of decisions.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let script: Vec<Decision> = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(Self::new(script))
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Agent for ScriptedAgent {
    fn decide(&mut self, _observation: &Observation) -> Decision {
        self.script.pop_front().unwrap_or(Decision::NoOp)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::default_catalog;
    use crate::model::inventory::Inventory;
    use crate::model::state::SimulationState;
    use crate::simulation::clock::Clock;
    use std::io::Write;

    fn observation(units: u32, cash: f64) -> Observation {
        let state = SimulationState::new(
            Clock::new(30),
            Money::from_dollars(cash),
            Inventory::from_catalog(&default_catalog(), units, 5),
            3,
        );
        Observation::capture(&state, 1, None, 100)
    }

    #[test]
    fn idle_agent_waits() {
        assert_eq!(IdleAgent.decide(&observation(0, 500.0)), Decision::NoOp);
    }

    #[test]
    fn reorder_agent_tops_up_empty_shelves() {
        let mut agent = ReorderPointAgent::with_optimal_targets(&SimulationConfig::default());
        match agent.decide(&observation(0, 500.0)) {
            Decision::RestockOrder { quantity, unit_cost, .. } => {
                assert!(quantity > 5);
                assert!(unit_cost.is_positive());
            }
            other => panic!("expected a restock, got {}", other),
        }
    }

    #[test]
    fn reorder_agent_idles_when_stocked() {
        let mut agent = ReorderPointAgent::with_optimal_targets(&SimulationConfig::default());
        assert_eq!(agent.decide(&observation(20, 500.0)), Decision::NoOp);
    }

    #[test]
    fn reorder_agent_never_orders_more_than_it_can_pay_for() {
        let mut agent = ReorderPointAgent::with_optimal_targets(&SimulationConfig::default());
        if let Decision::RestockOrder { quantity, unit_cost, .. } = agent.decide(&observation(0, 3.0)) {
            assert!(unit_cost.checked_times(quantity).unwrap() <= Money::from_dollars(3.0));
        }
        assert_eq!(agent.decide(&observation(0, 0.0)), Decision::NoOp);
    }

    #[test]
    fn a_fortune_in_cash_does_not_shrink_the_order() {
        let targets = BTreeMap::from([(
            "chips".to_string(),
            StockTarget {
                order_up_to: 40,
                unit_cost: Money::from_cents(1),
            },
        )]);
        let mut agent = ReorderPointAgent::new(targets);
        let mut obs = observation(0, 0.0);
        // Affordable units land just past u32::MAX.
        obs.cash = Money::from_cents(i64::from(u32::MAX) + 4);

        assert_eq!(
            agent.decide(&obs),
            Decision::restock("chips", 40, Money::from_cents(1))
        );
    }

    #[test]
    fn reorder_agent_undercuts_a_price_cap() {
        let mut agent = ReorderPointAgent::with_optimal_targets(&SimulationConfig::default());
        let mut obs = observation(20, 500.0);
        let coffee = obs.skus.iter_mut().find(|s| s.sku == "coffee").unwrap();
        coffee.price_cap = Some(Money::from_dollars(2.5));

        assert_eq!(
            agent.decide(&obs),
            Decision::set_price("coffee", Money::from_dollars(2.45))
        );
    }

    #[test]
    fn random_agent_is_reproducible() {
        let obs = observation(10, 500.0);
        let mut a = RandomAgent::new(7);
        let mut b = RandomAgent::new(7);
        for _ in 0..20 {
            assert_eq!(a.decide(&obs), b.decide(&obs));
        }
    }

    #[test]
    fn scripted_agent_replays_then_idles() {
        let obs = observation(10, 500.0);
        let order = Decision::restock("chips", 10, Money::from_dollars(0.5));
        let mut agent = ScriptedAgent::new(vec![order.clone()]);
        assert_eq!(agent.decide(&obs), order);
        assert_eq!(agent.decide(&obs), Decision::NoOp);
        assert_eq!(agent.remaining(), 0);
    }

    #[test]
    fn scripted_agent_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"kind":"price-update","sku":"soda","price":275}},{{"kind":"no-op"}}]"#
        )
        .unwrap();

        let agent = ScriptedAgent::from_path(file.path()).unwrap();
        assert_eq!(agent.remaining(), 2);
    }
}
