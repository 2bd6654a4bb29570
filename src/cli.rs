// src/cli.rs

use crate::error::Result;
use crate::simulation::config::{EventComplexity, SimulationConfig};
use crate::strategy::implementations::{IdleAgent, RandomAgent, ReorderPointAgent, ScriptedAgent};
use crate::strategy::traits::Agent;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentKind {
    Idle,
    ReorderPoint,
    Random,
    Scripted,
}

/// Runs the vending machine business simulation.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration file, layered over the defaults
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Days to simulate (overrides the config)
    #[arg(long)]
    pub days: Option<u32>,

    /// Event complexity (overrides the config)
    #[arg(long, value_enum)]
    pub complexity: Option<EventComplexity>,

    /// Seed to run; repeat for several independent runs in parallel
    #[arg(long = "seed")]
    pub seeds: Vec<u64>,

    #[arg(long, value_enum, default_value_t = AgentKind::ReorderPoint)]
    pub agent: AgentKind,

    /// JSON array of decisions for the scripted agent
    #[arg(long, required_if_eq("agent", "scripted"))]
    pub script: Option<PathBuf>,

    /// Directory for the JSON report and CSV logs
    #[arg(long, default_value = "results")]
    pub out_dir: PathBuf,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn apply_overrides(&self, config: &mut SimulationConfig) {
        if let Some(days) = self.days {
            config.simulation_days = days;
        }
        if let Some(complexity) = self.complexity {
            config.event_complexity = complexity;
        }
    }

    /// Seeds given on the command line, or the configured one.
    pub fn seeds(&self, config: &SimulationConfig) -> Vec<u64> {
        if self.seeds.is_empty() {
            vec![config.seed]
        } else {
            self.seeds.clone()
        }
    }
}

pub fn build_agent(kind: AgentKind, config: &SimulationConfig, script: Option<&Path>) -> Result<Box<dyn Agent>> {
    Ok(match kind {
        AgentKind::Idle => Box::new(IdleAgent),
        AgentKind::ReorderPoint => Box::new(ReorderPointAgent::with_optimal_targets(config)),
        // Offset so the agent's choices don't mirror the event stream.
        AgentKind::Random => Box::new(RandomAgent::new(config.seed.wrapping_add(1))),
        AgentKind::Scripted => match script {
            Some(path) => Box::new(ScriptedAgent::from_path(path)?),
            None => Box::new(ScriptedAgent::default()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_seeds_and_overrides() {
        let cli = Cli::try_parse_from([
            "vendsim", "--seed", "1", "--seed", "2", "--days", "30", "--complexity", "full",
        ])
        .unwrap();
        assert_eq!(cli.seeds, vec![1, 2]);
        assert_eq!(cli.agent, AgentKind::ReorderPoint);

        let mut config = SimulationConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.simulation_days, 30);
        assert_eq!(config.event_complexity, EventComplexity::Full);
    }

    #[test]
    fn falls_back_to_the_configured_seed() {
        let cli = Cli::try_parse_from(["vendsim", "--agent", "idle"]).unwrap();
        let config = SimulationConfig::default();
        assert_eq!(cli.seeds(&config), vec![42]);
    }

    #[test]
    fn scripted_agent_needs_a_script() {
        assert!(Cli::try_parse_from(["vendsim", "--agent", "scripted"]).is_err());
        assert!(Cli::try_parse_from(["vendsim", "--agent", "scripted", "--script", "plan.json"]).is_ok());
    }

    #[test]
    fn agents_report_their_names() {
        let config = SimulationConfig::default();
        for (kind, name) in [
            (AgentKind::Idle, "idle"),
            (AgentKind::ReorderPoint, "reorder-point"),
            (AgentKind::Random, "random"),
        ] {
            assert_eq!(build_agent(kind, &config, None).unwrap().name(), name);
        }
    }
}
