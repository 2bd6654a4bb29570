// src/simulation/events.rs

use crate::error::SimulationError;
use crate::io::demand::{expected_demand, DemandModifiers, DemandNoise};
use crate::io::weather::Weather;
use crate::model::event::{Event, EventBook, EventKind, EventScope, EventStatus};
use crate::model::inventory::{Inventory, SkuRecord};
use crate::model::ledger::{Entry, TransactionKind};
use crate::model::money::Money;
use crate::model::state::SimulationState;
use crate::simulation::config::EventComplexity;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::Serialize;
use std::ops::RangeInclusive;
use tracing::{debug, info};

/// Day the competitor machine opens in `full` runs.
pub const COMPETITOR_ARRIVAL_DAY: u32 = 100;

/// Standard deviation of a demand shock's multiplier.
const SHOCK_SPREAD: f64 = 0.35;

/// The competitor's prices, in dollars.
const COMPETITOR_PRICES: [(&str, f64); 3] = [("coffee", 2.50), ("chips", 1.25), ("chocolate", 1.75)];

/// One row of the probability table.
struct EventSpec {
    kind: EventKind,
    daily_probability: f64,
    duration: RangeInclusive<u32>,
}

const EVENT_TABLE: [EventSpec; 5] = [
    EventSpec { kind: EventKind::DemandShock, daily_probability: 0.05, duration: 2..=7 },
    EventSpec { kind: EventKind::Spoilage, daily_probability: 0.03, duration: 0..=0 },
    EventSpec { kind: EventKind::EquipmentFailure, daily_probability: 0.05, duration: 0..=2 },
    EventSpec { kind: EventKind::SupplierDelay, daily_probability: 0.04, duration: 3..=10 },
    EventSpec { kind: EventKind::PriceWar, daily_probability: 0.02, duration: 14..=60 },
];

/// What changed at today's boundary, for the daily feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventReport {
    pub weather: Weather,
    pub started: Vec<Event>,
    pub expired: Vec<Event>,
    pub spoiled: Vec<SpoiledStock>,
    /// Stock thrown out for being past its shelf life.
    pub expired_stock: Vec<SpoiledStock>,
    pub repair_bills: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpoiledStock {
    pub sku: String,
    pub units: u32,
}

/// Samples and applies exogenous events, and draws customer demand.
///
/// This is the only holder of the run's random source. Same seed, same
/// decisions, same events.
pub struct EventEngine {
    complexity: EventComplexity,
    rng: ChaCha8Rng,
    next_id: u64,
    noise: DemandNoise,
    weather: Weather,
}

impl EventEngine {
    pub fn new(complexity: EventComplexity, seed: u64) -> Self {
        Self {
            complexity,
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_id: 1,
            noise: DemandNoise::default(),
            weather: Weather::default(),
        }
    }

    pub fn complexity(&self) -> EventComplexity {
        self.complexity
    }

    /// Weather drawn at the start of the current day.
    pub fn weather(&self) -> Weather {
        self.weather
    }

    /// Puts the fixed-date events of this complexity level on the calendar.
    pub fn schedule_initial(&mut self, book: &mut EventBook, inventory: &Inventory, horizon: u32) {
        if !self.complexity.allows(EventKind::PriceWar) || horizon < COMPETITOR_ARRIVAL_DAY {
            return;
        }
        for (sku, price) in COMPETITOR_PRICES {
            let Ok(record) = inventory.get(sku) else {
                continue;
            };
            let magnitude = Money::from_dollars(price).cents() as f64 / record.reference_price.cents() as f64;
            let event = Event {
                id: self.take_id(),
                kind: EventKind::PriceWar,
                scope: EventScope::Sku(sku.to_string()),
                magnitude,
                start_day: COMPETITOR_ARRIVAL_DAY,
                duration: horizon - COMPETITOR_ARRIVAL_DAY,
                status: EventStatus::Scheduled,
            };
            book.schedule(event);
        }
    }

    /// Runs the event state machine for the day that just started: the
    /// weather is drawn, stock past its shelf life is thrown out, scheduled
    /// events activate, stale ones expire, new ones are sampled and one-shot
    /// effects (spoilage, repair bills) are applied.
    pub fn begin_day(&mut self, state: &mut SimulationState) -> Result<EventReport, SimulationError> {
        let day = state.day();
        self.weather = Weather::draw(day, &mut self.rng);
        debug!(day, weather = ?self.weather, "weather drawn");

        let mut report = EventReport {
            weather: self.weather,
            expired: state.events.expire(day),
            ..Default::default()
        };
        for event in &report.expired {
            debug!(day, event = %event.describe(), "event expired");
        }
        if self.complexity.perishable() {
            report.expired_stock = discard_expired_stock(state)?;
        }

        let mut started = state.events.activate_due(day);
        for event in self.sample(state) {
            state.events.activate(event.clone());
            started.push(event);
        }

        for event in &started {
            info!(day, event = %event.describe(), "event started");
            match event.kind {
                EventKind::Spoilage => {
                    if let Some(spoiled) = apply_spoilage(state, event)? {
                        report.spoiled.push(spoiled);
                    }
                }
                EventKind::EquipmentFailure => {
                    let bill = Money::from_dollars(event.magnitude);
                    state.ledger.charge(
                        bill,
                        Entry::new(day, TransactionKind::Fine)
                            .note(format!("Equipment repair on day {}", day)),
                    );
                    report.repair_bills += bill;
                }
                _ => {}
            }
        }
        report.started = started;
        Ok(report)
    }

    /// Draws today's new events from the complexity level's table.
    fn sample(&mut self, state: &SimulationState) -> Vec<Event> {
        let day = state.day();
        let skus: Vec<&str> = state.inventory.skus().collect();
        let complexity = self.complexity;
        let mut sampled = Vec::new();

        for spec in EVENT_TABLE.iter().filter(|s| complexity.allows(s.kind)) {
            if !self.rng.gen_bool(spec.daily_probability) {
                continue;
            }

            let scope = match spec.kind {
                EventKind::EquipmentFailure | EventKind::SupplierDelay => EventScope::Machine,
                EventKind::DemandShock if self.rng.gen_bool(0.5) => EventScope::Machine,
                _ => match skus.choose(&mut self.rng) {
                    Some(sku) => EventScope::Sku(sku.to_string()),
                    None => EventScope::Machine,
                },
            };
            let magnitude = match spec.kind {
                EventKind::DemandShock => {
                    // Either way around 1.0.
                    let z: f64 = self.rng.sample(StandardNormal);
                    (1.0 + SHOCK_SPREAD * z).clamp(0.3, 2.0)
                }
                EventKind::Spoilage => self.rng.gen_range(0.1..0.5),
                EventKind::EquipmentFailure => (self.rng.gen_range(20.0..100.0_f64) * 100.0).round() / 100.0,
                EventKind::SupplierDelay => self.rng.gen_range(1..=3) as f64,
                EventKind::PriceWar => self.rng.gen_range(0.75..0.9),
            };
            let duration = self.rng.gen_range(spec.duration.clone());

            // One of each per target at a time.
            if state.events.is_active(spec.kind, &scope)
                || sampled.iter().any(|e: &Event| e.kind == spec.kind && e.scope == scope)
            {
                continue;
            }

            sampled.push(Event {
                id: self.take_id(),
                kind: spec.kind,
                scope,
                magnitude,
                start_day: day,
                duration,
                status: EventStatus::Active,
            });
        }
        sampled
    }

    /// Draws how many customers want each SKU today, in SKU order.
    ///
    /// Every SKU consumes one draw whether or not it is stocked, so the random
    /// stream only depends on the day count and the event history.
    pub fn sample_demand(&mut self, state: &SimulationState) -> Vec<(String, u32)> {
        let day = state.day();
        let stocked = state.inventory.stocked_count();
        state
            .inventory
            .records()
            .map(|record| {
                let modifiers = DemandModifiers {
                    weather: self.weather,
                    seasonal: self.complexity.seasonal(),
                    ..demand_modifiers(&state.events, record)
                };
                let expected = expected_demand(record, day, stocked, &modifiers);
                (record.sku.clone(), self.noise.realize(expected, &mut self.rng))
            })
            .collect()
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// The lowest price-war cap currently active on this SKU.
pub fn price_cap(book: &EventBook, record: &SkuRecord) -> Option<Money> {
    book.affecting(EventKind::PriceWar, &record.sku)
        .map(|e| record.reference_price.scaled(e.magnitude))
        .min()
}

/// Extra lead days for orders placed today.
pub fn supplier_delay(book: &EventBook) -> u32 {
    book.active()
        .iter()
        .filter(|e| e.kind == EventKind::SupplierDelay)
        .map(|e| e.magnitude.round().max(0.0) as u32)
        .max()
        .unwrap_or(0)
}

pub fn demand_modifiers(book: &EventBook, record: &SkuRecord) -> DemandModifiers {
    DemandModifiers {
        shock: book
            .affecting(EventKind::DemandShock, &record.sku)
            .map(|e| e.magnitude)
            .product(),
        competitor_cap: price_cap(book, record).map(Money::cents),
        machine_down: book.machine_down(),
        ..Default::default()
    }
}

/// Throws out every lot past its shelf life through the sale path at zero
/// revenue, one `Spoilage` entry per SKU.
fn discard_expired_stock(state: &mut SimulationState) -> Result<Vec<SpoiledStock>, SimulationError> {
    let day = state.day();
    let expired: Vec<(String, u32)> = state
        .inventory
        .records()
        .map(|r| (r.sku.clone(), r.expired_units(day)))
        .filter(|(_, units)| *units > 0)
        .collect();

    let mut discarded = Vec::with_capacity(expired.len());
    for (sku, units) in expired {
        let revenue = state
            .inventory
            .sell(&sku, units, Money::ZERO)
            .map_err(|e| SimulationError::invariant(format!("discarding expired {}: {}", sku, e)))?;
        state.ledger.credit(
            revenue,
            Entry::new(day, TransactionKind::Spoilage)
                .sku(&sku, units)
                .note(format!("{} units of {} past their shelf life", units, sku)),
        );
        info!(day, sku = %sku, units, "expired stock discarded");
        discarded.push(SpoiledStock { sku, units });
    }
    Ok(discarded)
}

/// Writes off part of a SKU's stock through the normal sale path at zero
/// revenue.
fn apply_spoilage(state: &mut SimulationState, event: &Event) -> Result<Option<SpoiledStock>, SimulationError> {
    let EventScope::Sku(sku) = &event.scope else {
        return Ok(None);
    };
    let on_hand = state
        .inventory
        .get(sku)
        .map_err(|e| SimulationError::invariant(format!("spoilage event {}: {}", event.id, e)))?
        .quantity;
    if on_hand == 0 {
        return Ok(None);
    }

    let units = ((on_hand as f64 * event.magnitude).floor() as u32).clamp(1, on_hand);
    let revenue = state
        .inventory
        .sell(sku, units, Money::ZERO)
        .map_err(|e| SimulationError::invariant(format!("spoilage event {}: {}", event.id, e)))?;
    state.ledger.credit(
        revenue,
        Entry::new(state.day(), TransactionKind::Spoilage)
            .sku(sku, units)
            .note(format!("{} units of {} spoiled", units, sku)),
    );
    Ok(Some(SpoiledStock {
        sku: sku.clone(),
        units,
    }))
}
