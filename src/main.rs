// src/main.rs

use clap::Parser;
use std::process::ExitCode;
use std::thread;
use tracing::error;
use vendsim::cli::{build_agent, Cli};
use vendsim::io::reporting;
use vendsim::{FinalReport, Simulation, SimulationConfig};

fn run_seed(cli: &Cli, base: &SimulationConfig, seed: u64) -> vendsim::Result<FinalReport> {
    let config = SimulationConfig {
        seed,
        ..base.clone()
    };
    let agent = build_agent(cli.agent, &config, cli.script.as_deref())?;
    let report = Simulation::new(config, agent)?.run()?;
    reporting::write_all(&cli.out_dir, &report)?;
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    vendsim::logging::init(&cli.log_level);

    // 1. CONFIGURATION: defaults -> file -> environment -> flags
    let mut config = match SimulationConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply_overrides(&mut config);
    let seeds = cli.seeds(&config);

    // 2. RUN: one thread per seed, nothing shared but the read-only config
    let results: Vec<(u64, vendsim::Result<FinalReport>)> = thread::scope(|scope| {
        let handles: Vec<_> = seeds
            .iter()
            .map(|&seed| {
                let (cli, config) = (&cli, &config);
                let handle = thread::Builder::new()
                    .name(format!("seed-{}", seed))
                    .spawn_scoped(scope, move || run_seed(cli, config, seed));
                (seed, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(seed, handle)| {
                let result = match handle {
                    Ok(handle) => handle.join().unwrap_or_else(|_| {
                        Err(vendsim::SimulationError::invariant("simulation thread panicked"))
                    }),
                    Err(e) => Err(e.into()),
                };
                (seed, result)
            })
            .collect()
    });

    // 3. SUMMARY
    println!("\n=== Vending Simulation Results ({:?} agent) ===", cli.agent);
    let mut failed = false;
    for (seed, result) in results {
        match result {
            Ok(report) => {
                println!(
                    "seed {:>6}: {} | net worth {} | revenue {} | costs {} | coherence {:.2}",
                    seed,
                    report.end_state,
                    report.final_net_worth,
                    report.totals.revenue,
                    report.totals.costs,
                    report.coherence.score
                );
            }
            Err(e) => {
                failed = true;
                error!(seed, "run failed: {}", e);
            }
        }
    }
    println!("Reports written to {}", cli.out_dir.display());

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
