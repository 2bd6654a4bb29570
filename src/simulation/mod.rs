// src/simulation/mod.rs

pub mod applier;
pub mod clock;
pub mod config;
pub mod engine;
pub mod events;
