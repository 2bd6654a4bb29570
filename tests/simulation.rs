use vendsim::model::decision::Decision;
use vendsim::model::money::Money;
use vendsim::strategy::implementations::{IdleAgent, ReorderPointAgent, ScriptedAgent};
use vendsim::{EndState, EventComplexity, Simulation, SimulationConfig, ValidationError};

fn quiet_config(days: u32) -> SimulationConfig {
    SimulationConfig {
        simulation_days: days,
        event_complexity: EventComplexity::Simple,
        starting_inventory_units: 0,
        ..Default::default()
    }
}

#[test]
fn fees_alone_take_six_dollars_over_three_days() {
    let report = Simulation::new(quiet_config(3), Box::new(IdleAgent))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.final_cash, Money::from_dollars(494.0));
    assert_eq!(report.end_state, EndState::HorizonReached { day: 3 });
    assert_eq!(report.totals.fees, Money::from_dollars(6.0));
}

#[test]
fn unaffordable_restock_is_rejected_and_nothing_moves() {
    let config = SimulationConfig {
        starting_cash: 50.0,
        daily_fee: 0.0,
        ..quiet_config(2)
    };
    let order = Decision::restock("chips", 100, Money::from_dollars(1.0));
    let mut sim = Simulation::new(config, Box::new(ScriptedAgent::new(vec![order]))).unwrap();
    sim.step().unwrap();

    let day = &sim.feed()[0];
    assert!(!day.decisions[0].accepted);
    assert_eq!(
        day.decisions[0].rejection,
        Some(ValidationError::InsufficientFunds {
            needed: Money::from_dollars(100.0),
            available: Money::from_dollars(50.0),
        })
    );
    assert_eq!(sim.state().cash(), Money::from_dollars(50.0));
    assert_eq!(sim.state().pipeline.pending_count(), 0);
    assert!(sim.state().ledger.transactions().is_empty());
}

#[test]
fn order_lands_exactly_after_the_lead_time() {
    let order = Decision::restock("chips", 10, Money::from_dollars(0.5));
    let mut sim = Simulation::new(quiet_config(10), Box::new(ScriptedAgent::new(vec![order]))).unwrap();

    for _ in 0..3 {
        sim.step().unwrap();
    }
    assert_eq!(sim.state().inventory.get("chips").unwrap().quantity, 0);
    assert_eq!(sim.state().pipeline.pending_units("chips"), 10);
    assert!(sim.feed().iter().all(|day| day.deliveries.is_empty()));

    sim.step().unwrap();
    let day4 = &sim.feed()[3];
    assert_eq!(day4.day, 4);
    assert_eq!(day4.deliveries.len(), 1);
    assert_eq!(day4.deliveries[0].placed_on, 1);

    let sold: u32 = day4.sales.iter().filter(|s| s.sku == "chips").map(|s| s.units).sum();
    assert_eq!(sim.state().inventory.get("chips").unwrap().quantity + sold, 10);
}

#[test]
fn same_seed_and_decisions_give_identical_reports() {
    let config = SimulationConfig {
        simulation_days: 150,
        event_complexity: EventComplexity::Full,
        seed: 9,
        ..Default::default()
    };
    let run = || {
        let agent = ReorderPointAgent::with_optimal_targets(&config);
        let report = Simulation::new(config.clone(), Box::new(agent))
            .unwrap()
            .run()
            .unwrap();
        serde_json::to_string(&report).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn different_seeds_see_different_customers() {
    let run = |seed| {
        let config = SimulationConfig {
            simulation_days: 60,
            seed,
            ..Default::default()
        };
        Simulation::new(config, Box::new(IdleAgent)).unwrap().run().unwrap()
    };
    assert_ne!(run(1).transactions, run(2).transactions);
}

#[test]
fn message_budget_ends_the_run() {
    let config = SimulationConfig {
        max_messages: 5,
        ..quiet_config(30)
    };
    let report = Simulation::new(config, Box::new(IdleAgent)).unwrap().run().unwrap();

    assert_eq!(
        report.end_state,
        EndState::MessageBudgetExceeded { day: 6, messages_used: 5 }
    );
    assert_eq!(report.feed.len(), 6);
    assert!(report.feed[5].decisions.is_empty());
}

#[test]
fn running_out_of_grace_is_bankruptcy() {
    let config = SimulationConfig {
        starting_cash: 10.0,
        daily_fee: 6.0,
        ..quiet_config(30)
    };
    let report = Simulation::new(config, Box::new(IdleAgent)).unwrap().run().unwrap();

    // Day 2 closes in debt within the grace period; day 3 does not.
    assert_eq!(
        report.end_state,
        EndState::Bankruptcy { day: 3, cash: Money::from_dollars(-8.0) }
    );
}

#[test]
fn competitor_arrives_in_full_runs() {
    let config = SimulationConfig {
        simulation_days: 120,
        event_complexity: EventComplexity::Full,
        ..Default::default()
    };
    let mut sim = Simulation::new(config, Box::new(IdleAgent)).unwrap();
    for _ in 0..100 {
        sim.step().unwrap();
    }
    let coffee = sim.state().inventory.get("coffee").unwrap();
    let cap = vendsim::simulation::events::price_cap(&sim.state().events, coffee);
    assert!(cap.is_some_and(|cap| cap <= Money::from_dollars(2.5)));
}

#[test]
fn a_sensible_agent_stays_in_business() {
    let config = SimulationConfig {
        simulation_days: 90,
        event_complexity: EventComplexity::Simple,
        ..Default::default()
    };
    let agent = ReorderPointAgent::with_optimal_targets(&config);
    let report = Simulation::new(config, Box::new(agent)).unwrap().run().unwrap();

    assert_eq!(report.end_state, EndState::HorizonReached { day: 90 });
    assert!(report.totals.units_sold > 0);
    assert!(report.totals.purchases.is_positive());
    assert!(report.inventory_efficiency.is_some());
}

#[test]
fn restock_that_would_overflow_the_shelf_is_rejected_and_the_run_goes_on() {
    let config = SimulationConfig {
        starting_cash: 100_000_000.0,
        starting_inventory_units: 1,
        ..quiet_config(5)
    };
    let order = Decision::restock("chips", u32::MAX, Money::from_cents(1));
    let report = Simulation::new(config, Box::new(ScriptedAgent::new(vec![order])))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.end_state, EndState::HorizonReached { day: 5 });
    assert_eq!(
        report.feed[0].decisions[0].rejection,
        Some(ValidationError::StockOverflow {
            sku: "chips".into(),
            quantity: u32::MAX,
        })
    );
    assert!(report.feed.iter().all(|day| day.deliveries.is_empty()));
    assert_eq!(report.totals.purchases, Money::ZERO);
}

#[test]
fn opening_coffee_goes_off_after_a_week_unless_the_run_is_simple() {
    let coffee_on_day_7 = |event_complexity| {
        let config = SimulationConfig {
            simulation_days: 30,
            event_complexity,
            ..Default::default()
        };
        let mut sim = Simulation::new(config, Box::new(IdleAgent)).unwrap();
        for _ in 0..7 {
            sim.step().unwrap();
        }
        sim.state().inventory.get("coffee").unwrap().quantity
    };

    assert_eq!(coffee_on_day_7(EventComplexity::Medium), 0);
    assert_eq!(coffee_on_day_7(EventComplexity::Full), 0);
    assert!(coffee_on_day_7(EventComplexity::Simple) > 0);
}
