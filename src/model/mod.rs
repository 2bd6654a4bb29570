// src/model/mod.rs

pub mod catalog;
pub mod decision;
pub mod event;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod queues;
pub mod state;
