// src/simulation/config.rs

use crate::model::catalog::{at_least_one_cent, default_catalog, ProductSpec};
use crate::model::event::EventKind;
use crate::model::money::Money;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Which exogenous events a run can see. Each level covers every kind of
/// the level below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EventComplexity {
    Simple,
    Medium,
    Full,
}

impl EventComplexity {
    pub fn kinds(self) -> &'static [EventKind] {
        match self {
            EventComplexity::Simple => &[EventKind::DemandShock],
            EventComplexity::Medium => &[
                EventKind::DemandShock,
                EventKind::Spoilage,
                EventKind::EquipmentFailure,
                EventKind::SupplierDelay,
            ],
            EventComplexity::Full => &EventKind::ALL,
        }
    }

    pub fn allows(self, kind: EventKind) -> bool {
        self.kinds().contains(&kind)
    }

    /// Whether summer and winter swing hot and cold drink demand.
    /// `simple` runs keep demand flat across the year.
    pub fn seasonal(self) -> bool {
        self != EventComplexity::Simple
    }

    /// Whether stock past its shelf life is thrown out. Goes with spoilage
    /// events.
    pub fn perishable(self) -> bool {
        self.allows(EventKind::Spoilage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SimulationConfig {
    #[validate(range(min = 1, max = 365))]
    pub simulation_days: u32,
    pub event_complexity: EventComplexity,
    /// Dollars.
    #[validate(custom(function = at_least_one_cent))]
    pub starting_cash: f64,
    /// Dollars per day, charged before the agent acts.
    #[validate(range(min = 0.0))]
    pub daily_fee: f64,
    /// Agent calls allowed over the whole run.
    #[validate(range(min = 1))]
    pub max_messages: u32,
    /// Days between paying for an order and receiving it.
    #[validate(range(min = 1, max = 60))]
    pub lead_time_days: u32,
    /// Decisions the agent may make per simulated day.
    #[validate(range(min = 1, max = 100))]
    pub turns_per_day: u32,
    pub seed: u64,
    pub starting_inventory_units: u32,
    pub reorder_point: u32,
    /// Consecutive days with negative cash that are tolerated.
    pub bankruptcy_grace_days: u32,
    /// Dollars. Dropping below this ends the run immediately.
    pub bankruptcy_floor: Option<f64>,
    #[validate(length(min = 1))]
    #[validate(nested)]
    #[validate(custom(function = validate_unique_skus))]
    pub products: Vec<ProductSpec>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulation_days: 365,
            event_complexity: EventComplexity::Simple,
            starting_cash: 500.0,
            daily_fee: 2.0,
            max_messages: 2000,
            lead_time_days: 3,
            turns_per_day: 1,
            seed: 42,
            starting_inventory_units: 20,
            reorder_point: 5,
            bankruptcy_grace_days: 1,
            bankruptcy_floor: None,
            products: default_catalog(),
        }
    }
}

impl SimulationConfig {
    /// Defaults, then the YAML file if it exists, then `VENDSIM_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(SimulationConfig::default()));

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment
            .merge(Env::prefixed("VENDSIM_"))
            .extract()
            .map_err(|e| ConfigError::Parsing(Box::new(e)))
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    pub fn starting_cash(&self) -> Money {
        Money::from_dollars(self.starting_cash)
    }

    pub fn daily_fee(&self) -> Money {
        Money::from_dollars(self.daily_fee)
    }

    pub fn bankruptcy_floor(&self) -> Option<Money> {
        self.bankruptcy_floor.map(Money::from_dollars)
    }
}

fn validate_unique_skus(products: &[ProductSpec]) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    if products.iter().all(|p| seen.insert(p.sku.as_str())) {
        Ok(())
    } else {
        Err(ValidationError::new("duplicate_sku"))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("invalid configuration:\n{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),

    #[error("configuration parsing error: {0}")]
    Parsing(#[source] Box<figment::Error>),
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

fn format_validation_errors(errors: &ValidationErrors) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    for (field, errors) in errors.field_errors() {
        let _ = writeln!(output, "field '{}':", field);
        for error in errors {
            let message = match &error.message {
                Some(msg) => msg.to_string(),
                None => error.code.to_string(),
            };
            let _ = writeln!(output, "  - {}", message);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_validates() {
        SimulationConfig::default().validate().unwrap();
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let bad = [
            SimulationConfig { simulation_days: 0, ..Default::default() },
            SimulationConfig { simulation_days: 366, ..Default::default() },
            SimulationConfig { starting_cash: 0.0, ..Default::default() },
            SimulationConfig { daily_fee: -1.0, ..Default::default() },
            SimulationConfig { max_messages: 0, ..Default::default() },
            SimulationConfig { lead_time_days: 0, ..Default::default() },
            SimulationConfig { products: Vec::new(), ..Default::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn starting_cash_has_to_survive_rounding_to_cents() {
        let dust = SimulationConfig { starting_cash: 0.004, ..Default::default() };
        let errors = dust.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("starting_cash"));

        let one_cent = SimulationConfig { starting_cash: 0.01, ..Default::default() };
        one_cent.validate().unwrap();
        assert_eq!(one_cent.starting_cash(), Money::from_cents(1));
    }

    #[test]
    fn sub_cent_product_prices_fail_the_whole_config() {
        let mut products = default_catalog();
        products[1].supplier_cost = 0.001;
        let config = SimulationConfig { products, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn only_richer_levels_are_seasonal_and_perishable() {
        assert!(!EventComplexity::Simple.seasonal());
        assert!(!EventComplexity::Simple.perishable());
        for level in [EventComplexity::Medium, EventComplexity::Full] {
            assert!(level.seasonal());
            assert!(level.perishable());
        }
    }

    #[test]
    fn duplicate_skus_are_rejected() {
        let mut products = default_catalog();
        products.push(products[0].clone());
        let config = SimulationConfig { products, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn complexity_levels_nest() {
        let simple = EventComplexity::Simple.kinds();
        let medium = EventComplexity::Medium.kinds();
        let full = EventComplexity::Full.kinds();
        assert!(simple.iter().all(|k| medium.contains(k)));
        assert!(medium.iter().all(|k| full.contains(k)));
        assert!(simple.len() < medium.len() && medium.len() < full.len());
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "simulation_days: 30\nevent_complexity: full\ndaily_fee: 3.5").unwrap();

        let config = SimulationConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.simulation_days, 30);
        assert_eq!(config.event_complexity, EventComplexity::Full);
        assert_eq!(config.daily_fee(), Money::from_dollars(3.5));
        assert_eq!(config.starting_cash(), Money::from_dollars(500.0));
    }

    #[test]
    fn invalid_yaml_values_fail_validation() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "simulation_days: 400").unwrap();
        let err = SimulationConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = SimulationConfig::load(Some(Path::new("/nonexistent/vendsim.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
