// src/lib.rs

//! Day-by-day simulation of a vending machine business run by a pluggable
//! agent: one decision per turn, exogenous events, overnight customer sales,
//! and a final report with net worth, profitability and coherence metrics.

pub mod cli;
pub mod error;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod simulation;
pub mod strategy;

pub use error::{Result, SimulationError, ValidationError};
pub use simulation::config::{EventComplexity, SimulationConfig};
pub use simulation::engine::{EndState, FinalReport, Simulation};
pub use strategy::traits::{Agent, Observation};
