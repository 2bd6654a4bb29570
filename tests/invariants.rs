use proptest::prelude::*;
use vendsim::model::decision::Decision;
use vendsim::model::event::EventKind;
use vendsim::model::money::Money;
use vendsim::strategy::implementations::{IdleAgent, ScriptedAgent};
use vendsim::{EventComplexity, Simulation, SimulationConfig};

const SKUS: [&str; 5] = ["coffee", "chocolate", "chips", "soda", "gum"];

fn decision() -> impl Strategy<Value = Decision> {
    prop_oneof![
        Just(Decision::NoOp),
        (0..SKUS.len(), -50i64..600).prop_map(|(i, cents)| Decision::set_price(SKUS[i], Money::from_cents(cents))),
        (0..SKUS.len(), 0u32..80, 0i64..300)
            .prop_map(|(i, quantity, cents)| Decision::restock(SKUS[i], quantity, Money::from_cents(cents))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn cash_always_matches_the_ledger(
        decisions in prop::collection::vec(decision(), 0..60),
        seed in any::<u64>(),
    ) {
        let config = SimulationConfig {
            simulation_days: 40,
            event_complexity: EventComplexity::Medium,
            starting_cash: 120.0,
            turns_per_day: 2,
            seed,
            ..Default::default()
        };
        let mut sim = Simulation::new(config, Box::new(ScriptedAgent::new(decisions))).unwrap();

        loop {
            let end = sim.step().unwrap();
            let ledger = &sim.state().ledger;
            let replayed = ledger.opening_balance()
                + ledger.transactions().iter().map(|t| t.amount).sum::<Money>();
            prop_assert_eq!(ledger.balance(), replayed);
            prop_assert_eq!(sim.state().cash(), ledger.balance());

            for day in sim.feed() {
                for result in day.decisions.iter().filter(|r| !r.accepted) {
                    prop_assert_eq!(result.delta.cash, Money::ZERO);
                }
            }
            if end.is_some() {
                break;
            }
        }
    }

    #[test]
    fn simple_runs_only_see_demand_shocks(seed in any::<u64>()) {
        let config = SimulationConfig {
            simulation_days: 120,
            event_complexity: EventComplexity::Simple,
            seed,
            ..Default::default()
        };
        let report = Simulation::new(config, Box::new(IdleAgent)).unwrap().run().unwrap();
        prop_assert!(report.events.iter().all(|e| e.kind == EventKind::DemandShock));
    }

    #[test]
    fn medium_runs_never_start_a_price_war(seed in any::<u64>()) {
        let config = SimulationConfig {
            simulation_days: 150,
            event_complexity: EventComplexity::Medium,
            seed,
            ..Default::default()
        };
        let report = Simulation::new(config, Box::new(IdleAgent)).unwrap().run().unwrap();
        prop_assert!(report.events.iter().all(|e| e.kind != EventKind::PriceWar));
    }
}
