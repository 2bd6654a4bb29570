// src/simulation/engine.rs

use crate::error::{Result, SimulationError};
use crate::metrics::coherence::{CoherenceReport, CoherenceScorer, RepetitionScorer};
use crate::metrics::{days_to_profitability, inventory_efficiency, net_worth, DailySnapshot, MetricsCollector, Totals};
use crate::model::decision::DecisionResult;
use crate::model::event::Event;
use crate::model::inventory::Inventory;
use crate::model::ledger::{Entry, Transaction, TransactionKind};
use crate::model::money::Money;
use crate::model::queues::Delivery;
use crate::model::state::SimulationState;
use crate::simulation::applier::apply_decision;
use crate::simulation::clock::Clock;
use crate::simulation::config::{ConfigError, EventComplexity, SimulationConfig};
use crate::simulation::events::{EventEngine, EventReport};
use crate::strategy::traits::{Agent, Observation};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, info_span, warn};
use validator::Validate;

/// How a run ended. None of these are errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndState {
    HorizonReached { day: u32 },
    Bankruptcy { day: u32, cash: Money },
    MessageBudgetExceeded { day: u32, messages_used: u32 },
}

impl fmt::Display for EndState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndState::HorizonReached { day } => write!(f, "horizon reached on day {}", day),
            EndState::Bankruptcy { day, cash } => write!(f, "bankrupt on day {} with {}", day, cash),
            EndState::MessageBudgetExceeded { day, messages_used } => write!(
                f,
                "message budget exhausted on day {} after {} calls",
                day, messages_used
            ),
        }
    }
}

/// Customer sales of one SKU during one night.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleLine {
    pub sku: String,
    pub demand: u32,
    pub units: u32,
    pub revenue: Money,
}

/// Everything that happened on one day, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayLog {
    pub day: u32,
    pub fee: Money,
    pub deliveries: Vec<Delivery>,
    pub events: EventReport,
    pub decisions: Vec<DecisionResult>,
    pub sales: Vec<SaleLine>,
    pub closing_cash: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalReport {
    pub agent: String,
    pub seed: u64,
    pub complexity: EventComplexity,
    pub end_state: EndState,
    pub days_simulated: u32,
    pub starting_cash: Money,
    pub final_cash: Money,
    pub final_net_worth: Money,
    pub messages_used: u32,
    pub totals: Totals,
    pub days_to_profitability: Option<u32>,
    pub inventory_efficiency: Option<f64>,
    pub coherence: CoherenceReport,
    pub net_worth_series: Vec<Money>,
    pub snapshots: Vec<DailySnapshot>,
    pub transactions: Vec<Transaction>,
    pub events: Vec<Event>,
    pub feed: Vec<DayLog>,
}

/// One vending business run from day 1 to a terminal state.
pub struct Simulation {
    config: SimulationConfig,
    state: SimulationState,
    events: EventEngine,
    agent: Box<dyn Agent>,
    scorer: Box<dyn CoherenceScorer>,
    metrics: MetricsCollector,
    decisions: Vec<DecisionResult>,
    feed: Vec<DayLog>,
    end_state: Option<EndState>,
}

impl Simulation {
    pub fn new(config: SimulationConfig, agent: Box<dyn Agent>) -> Result<Self> {
        config.validate().map_err(ConfigError::from)?;

        let inventory = Inventory::from_catalog(
            &config.products,
            config.starting_inventory_units,
            config.reorder_point,
        );
        let mut state = SimulationState::new(
            Clock::new(config.simulation_days),
            config.starting_cash(),
            inventory,
            config.lead_time_days,
        );
        let mut events = EventEngine::new(config.event_complexity, config.seed);
        events.schedule_initial(&mut state.events, &state.inventory, config.simulation_days);

        Ok(Self {
            config,
            state,
            events,
            agent,
            scorer: Box::new(RepetitionScorer::default()),
            metrics: MetricsCollector::new(),
            decisions: Vec::new(),
            feed: Vec::new(),
            end_state: None,
        })
    }

    pub fn with_scorer(mut self, scorer: Box<dyn CoherenceScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn feed(&self) -> &[DayLog] {
        &self.feed
    }

    pub fn end_state(&self) -> Option<&EndState> {
        self.end_state.as_ref()
    }

    /// Runs until a terminal state and returns the report.
    pub fn run(mut self) -> Result<FinalReport> {
        let span = info_span!("run", agent = self.agent.name(), seed = self.config.seed);
        let _enter = span.enter();
        info!(
            days = self.config.simulation_days,
            complexity = ?self.config.event_complexity,
            cash = %self.state.cash(),
            "starting simulation"
        );

        while self.end_state.is_none() {
            self.step()?;
        }
        let report = self.report()?;
        info!(end_state = %report.end_state, net_worth = %report.final_net_worth, "simulation finished");
        Ok(report)
    }

    /// Simulates one day. Returns the end state once the run is over.
    pub fn step(&mut self) -> Result<Option<EndState>> {
        if let Some(end) = &self.end_state {
            return Ok(Some(end.clone()));
        }

        // Morning: the day starts, the machine pays rent, orders land.
        let day = self.state.clock.advance()?;
        let fee = self.config.daily_fee();
        if fee.is_positive() {
            self.state.ledger.apply_daily_fee(fee, day);
        }
        let deliveries = self.state.pipeline.advance_day(&mut self.state.inventory, day)?;
        for delivery in &deliveries {
            debug!(day, order = delivery.order_id, sku = %delivery.sku, units = delivery.quantity, "order delivered");
        }
        let events = self.events.begin_day(&mut self.state)?;

        // Day: the agent acts.
        let (decisions, out_of_messages) = self.agent_turns(day);

        // Night: customers buy.
        let sales = self.sell_overnight(day)?;

        let closing_cash = self.state.cash();
        let bankrupt = self.track_bankruptcy(day, closing_cash);

        self.state.check_invariants()?;

        let units_sold = sales.iter().map(|s| s.units).sum();
        let revenue = sales.iter().map(|s| s.revenue).sum();
        let snapshot = self.metrics.record(&self.state, units_sold, revenue);
        if day % 30 == 0 || day == self.state.clock.horizon() {
            info!(day, cash = %snapshot.cash, net_worth = %snapshot.net_worth, "day closed");
        } else {
            debug!(day, cash = %snapshot.cash, net_worth = %snapshot.net_worth, units_sold, "day closed");
        }

        self.feed.push(DayLog {
            day,
            fee,
            deliveries,
            events,
            decisions,
            sales,
            closing_cash,
        });

        self.end_state = if bankrupt {
            Some(EndState::Bankruptcy { day, cash: closing_cash })
        } else if out_of_messages {
            Some(EndState::MessageBudgetExceeded {
                day,
                messages_used: self.state.messages_used,
            })
        } else if self.state.clock.is_terminal() {
            Some(EndState::HorizonReached { day })
        } else {
            None
        };
        Ok(self.end_state.clone())
    }

    /// Gives the agent its turns for the day. The flag is set when the
    /// message budget ran out before a turn could be taken.
    fn agent_turns(&mut self, day: u32) -> (Vec<DecisionResult>, bool) {
        let mut results = Vec::new();
        for _ in 0..self.config.turns_per_day {
            if self.state.messages_used >= self.config.max_messages {
                warn!(day, used = self.state.messages_used, "message budget exhausted");
                return (results, true);
            }

            let turn = self.state.messages_used + 1;
            let observation = Observation::capture(
                &self.state,
                turn,
                self.decisions.last().cloned(),
                self.config.max_messages,
            );
            let decision = self.agent.decide(&observation);
            self.state.messages_used += 1;

            let result = apply_decision(&mut self.state, turn, decision);
            self.decisions.push(result.clone());
            results.push(result);
        }
        (results, false)
    }

    fn sell_overnight(&mut self, day: u32) -> Result<Vec<SaleLine>> {
        let demand = self.events.sample_demand(&self.state);
        let mut sales = Vec::with_capacity(demand.len());

        for (sku, wanted) in demand {
            let record = self
                .state
                .inventory
                .get(&sku)
                .map_err(|e| SimulationError::invariant(format!("demand for {}", e)))?;
            let units = wanted.min(record.quantity);
            let price = record.shelf_price;

            let mut revenue = Money::ZERO;
            if units > 0 {
                revenue = self
                    .state
                    .inventory
                    .sell(&sku, units, price)
                    .map_err(|e| SimulationError::invariant(format!("overnight sale: {}", e)))?;
                self.state.ledger.credit(
                    revenue,
                    Entry::new(day, TransactionKind::Sale)
                        .sku(&sku, units)
                        .note(format!("Sold {} {} at {}", units, sku, price)),
                );
            }
            sales.push(SaleLine {
                sku,
                demand: wanted,
                units,
                revenue,
            });
        }
        Ok(sales)
    }

    /// Updates the debt streak and reports whether the business went under.
    fn track_bankruptcy(&mut self, day: u32, cash: Money) -> bool {
        if cash.is_negative() {
            self.state.days_in_debt += 1;
        } else {
            self.state.days_in_debt = 0;
        }

        let below_floor = self.config.bankruptcy_floor().is_some_and(|floor| cash < floor);
        let out_of_grace = self.state.days_in_debt > self.config.bankruptcy_grace_days;
        if below_floor || out_of_grace {
            warn!(day, cash = %cash, days_in_debt = self.state.days_in_debt, "business is bankrupt");
            return true;
        }
        if self.state.days_in_debt > 0 {
            warn!(day, cash = %cash, days_in_debt = self.state.days_in_debt, "day closed in debt");
        }
        false
    }

    /// Builds the report for the current state. Fails if the run is not over.
    pub fn report(&self) -> Result<FinalReport> {
        let end_state = self
            .end_state
            .clone()
            .ok_or_else(|| SimulationError::invariant("report requested before the run ended"))?;

        let snapshots = self.metrics.snapshots().to_vec();
        let transactions = self.state.ledger.transactions().to_vec();
        let starting_cash = self.config.starting_cash();

        Ok(FinalReport {
            agent: self.agent.name().to_string(),
            seed: self.config.seed,
            complexity: self.config.event_complexity,
            end_state,
            days_simulated: self.state.day(),
            starting_cash,
            final_cash: self.state.cash(),
            final_net_worth: net_worth(&self.state),
            messages_used: self.state.messages_used,
            totals: Totals::from_transactions(&transactions),
            days_to_profitability: days_to_profitability(&snapshots, starting_cash),
            inventory_efficiency: inventory_efficiency(&transactions, self.state.inventory.units_on_hand()),
            coherence: self.scorer.score(&self.decisions),
            net_worth_series: snapshots.iter().map(|s| s.net_worth).collect(),
            snapshots,
            transactions,
            events: self.state.events.all_events().into_iter().cloned().collect(),
            feed: self.feed.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::decision::Decision;
    use tracing_test::traced_test;

    #[derive(Debug)]
    struct Fixed(Decision);

    impl Agent for Fixed {
        fn decide(&mut self, _observation: &Observation) -> Decision {
            self.0.clone()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn config(days: u32) -> SimulationConfig {
        SimulationConfig {
            simulation_days: days,
            starting_inventory_units: 0,
            ..Default::default()
        }
    }

    #[test]
    fn invalid_config_is_refused() {
        let bad = SimulationConfig {
            starting_cash: 0.0,
            ..config(3)
        };
        assert!(matches!(
            Simulation::new(bad, Box::new(Fixed(Decision::NoOp))),
            Err(SimulationError::Config(_))
        ));
    }

    #[test]
    fn fee_only_run_reaches_the_horizon() {
        let report = Simulation::new(config(3), Box::new(Fixed(Decision::NoOp)))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.end_state, EndState::HorizonReached { day: 3 });
        assert_eq!(report.final_cash, Money::from_dollars(494.0));
        assert_eq!(report.feed.len(), 3);
        assert_eq!(report.net_worth_series.len(), 3);
        assert_eq!(report.messages_used, 3);
    }

    #[test]
    fn several_turns_per_day_share_the_budget() {
        let config = SimulationConfig {
            turns_per_day: 4,
            max_messages: 10,
            ..config(30)
        };
        let report = Simulation::new(config, Box::new(Fixed(Decision::NoOp)))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(
            report.end_state,
            EndState::MessageBudgetExceeded { day: 3, messages_used: 10 }
        );
        assert_eq!(report.feed[2].decisions.len(), 2);
    }

    #[test]
    fn floor_ends_the_run_immediately() {
        let config = SimulationConfig {
            bankruptcy_floor: Some(495.0),
            ..config(30)
        };
        let report = Simulation::new(config, Box::new(Fixed(Decision::NoOp)))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(
            report.end_state,
            EndState::Bankruptcy { day: 3, cash: Money::from_dollars(494.0) }
        );
    }

    #[test]
    fn stepping_after_the_end_changes_nothing() {
        let mut sim = Simulation::new(config(1), Box::new(Fixed(Decision::NoOp))).unwrap();
        let end = sim.step().unwrap();
        assert_eq!(end, Some(EndState::HorizonReached { day: 1 }));
        assert_eq!(sim.step().unwrap(), end);
        assert_eq!(sim.state().day(), 1);
    }

    #[test]
    fn report_before_the_end_is_an_error() {
        let sim = Simulation::new(config(5), Box::new(Fixed(Decision::NoOp))).unwrap();
        assert!(sim.report().is_err());
    }

    #[test]
    fn scorer_can_be_swapped() {
        use crate::metrics::coherence::RejectionStreakScorer;

        let agent = Fixed(Decision::set_price("gum", Money::from_dollars(1.0)));
        let report = Simulation::new(config(4), Box::new(agent))
            .unwrap()
            .with_scorer(Box::new(RejectionStreakScorer::default()))
            .run()
            .unwrap();
        assert_eq!(report.coherence.scorer, "rejection-streak");
        assert_eq!(report.coherence.flagged_turns, vec![1, 2, 3, 4]);
        assert_eq!(report.coherence.score, 0.0);
    }

    #[traced_test]
    #[test]
    fn rejections_and_the_outcome_are_logged() {
        let agent = Fixed(Decision::set_price("gum", Money::from_dollars(1.0)));
        Simulation::new(config(2), Box::new(agent)).unwrap().run().unwrap();
        assert!(logs_contain("decision rejected"));
        assert!(logs_contain("unknown SKU 'gum'"));
        assert!(logs_contain("simulation finished"));
    }
}
