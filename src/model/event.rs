// src/model/event.rs

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// Multiplies customer demand by `magnitude`.
    DemandShock,
    /// Writes off `magnitude` (a fraction) of the SKU's stock, once.
    Spoilage,
    /// Repair bill of `magnitude` dollars; no sales while the machine is down.
    EquipmentFailure,
    /// New orders take `magnitude` extra days to arrive.
    SupplierDelay,
    /// A competitor caps the shelf price at `magnitude` × reference price.
    PriceWar,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::DemandShock,
        EventKind::Spoilage,
        EventKind::EquipmentFailure,
        EventKind::SupplierDelay,
        EventKind::PriceWar,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::DemandShock => "demand shock",
            EventKind::Spoilage => "spoilage",
            EventKind::EquipmentFailure => "equipment failure",
            EventKind::SupplierDelay => "supplier delay",
            EventKind::PriceWar => "price war",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "sku", rename_all = "snake_case")]
pub enum EventScope {
    Sku(String),
    Machine,
}

impl EventScope {
    /// Whether the event touches this SKU.
    pub fn covers(&self, sku: &str) -> bool {
        match self {
            EventScope::Sku(s) => s == sku,
            EventScope::Machine => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Active,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: u64,
    pub kind: EventKind,
    pub scope: EventScope,
    pub magnitude: f64,
    pub start_day: u32,
    pub duration: u32,
    pub status: EventStatus,
}

impl Event {
    /// Last day on which the event still has effect.
    pub fn last_day(&self) -> u32 {
        self.start_day.saturating_add(self.duration)
    }

    pub fn is_expired_on(&self, day: u32) -> bool {
        day > self.last_day()
    }

    pub fn describe(&self) -> String {
        let target = match &self.scope {
            EventScope::Sku(sku) => sku.as_str(),
            EventScope::Machine => "machine",
        };
        format!(
            "{} on {} (magnitude {:.2}, days {}-{})",
            self.kind,
            target,
            self.magnitude,
            self.start_day,
            self.last_day()
        )
    }
}

/// Live and past events. The active set only ever holds `Active` events;
/// everything that has expired moves to `history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventBook {
    scheduled: Vec<Event>,
    active: Vec<Event>,
    history: Vec<Event>,
}

impl EventBook {
    pub fn schedule(&mut self, mut event: Event) {
        event.status = EventStatus::Scheduled;
        self.scheduled.push(event);
    }

    /// Moves scheduled events starting today into the active set and returns
    /// copies of them.
    pub fn activate_due(&mut self, day: u32) -> Vec<Event> {
        let (due, later): (Vec<_>, Vec<_>) = self
            .scheduled
            .drain(..)
            .partition(|e| e.start_day <= day);
        self.scheduled = later;
        due.into_iter()
            .map(|mut e| {
                e.status = EventStatus::Active;
                e.start_day = day;
                self.active.push(e.clone());
                e
            })
            .collect()
    }

    pub fn activate(&mut self, mut event: Event) {
        event.status = EventStatus::Active;
        self.active.push(event);
    }

    /// Prunes events whose last day is before `day` and returns them.
    pub fn expire(&mut self, day: u32) -> Vec<Event> {
        let (expired, live): (Vec<_>, Vec<_>) =
            self.active.drain(..).partition(|e| e.is_expired_on(day));
        self.active = live;
        let expired: Vec<Event> = expired
            .into_iter()
            .map(|mut e| {
                e.status = EventStatus::Expired;
                e
            })
            .collect();
        self.history.extend(expired.iter().cloned());
        expired
    }

    pub fn active(&self) -> &[Event] {
        &self.active
    }

    pub fn scheduled(&self) -> &[Event] {
        &self.scheduled
    }

    pub fn history(&self) -> &[Event] {
        &self.history
    }

    pub fn is_active(&self, kind: EventKind, scope: &EventScope) -> bool {
        self.active.iter().any(|e| e.kind == kind && &e.scope == scope)
    }

    /// Active events of `kind` that touch `sku`.
    pub fn affecting<'a>(&'a self, kind: EventKind, sku: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.active
            .iter()
            .filter(move |e| e.kind == kind && e.scope.covers(sku))
    }

    pub fn machine_down(&self) -> bool {
        self.active.iter().any(|e| e.kind == EventKind::EquipmentFailure)
    }

    /// Every event ever activated, in activation-independent id order.
    pub fn all_events(&self) -> Vec<&Event> {
        let mut all: Vec<&Event> = self.history.iter().chain(self.active.iter()).collect();
        all.sort_by_key(|e| e.id);
        all
    }
}
