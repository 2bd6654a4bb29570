// src/io/demand.rs

use crate::io::weather::Weather;
use crate::model::catalog::ProductCategory;
use crate::model::inventory::SkuRecord;
use crate::simulation::clock::calendar;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Extra demand multipliers coming from active events.
#[derive(Debug, Clone, Copy)]
pub struct DemandModifiers {
    /// Product of active demand-shock magnitudes (1.0 when none).
    pub shock: f64,
    /// Price-war cap on this SKU, if one is active.
    pub competitor_cap: Option<i64>,
    /// No sales at all while the machine is broken.
    pub machine_down: bool,
    pub weather: Weather,
    /// Summer and winter swings apply.
    pub seasonal: bool,
}

impl Default for DemandModifiers {
    fn default() -> Self {
        Self {
            shock: 1.0,
            competitor_cap: None,
            machine_down: false,
            weather: Weather::default(),
            seasonal: true,
        }
    }
}

/// Effect of the shelf price relative to the reference price.
///
/// Linear elasticity: impact = 1 + elasticity × relative price change,
/// floored at 0.1 so an extreme price still sells the odd unit.
pub fn price_impact(price_cents: i64, reference_cents: i64, elasticity: f64) -> f64 {
    if reference_cents <= 0 {
        return 1.0;
    }
    let change = (price_cents - reference_cents) as f64 / reference_cents as f64;
    (1.0 + elasticity * change).max(0.1)
}

/// Rewards a varied but not overwhelming selection. Three products is the
/// sweet spot.
pub fn choice_multiplier(products_stocked: usize) -> f64 {
    match products_stocked {
        0 => 0.0,
        1 => 0.60,
        2 => 0.95,
        3 => 1.10,
        4 => 1.00,
        _ => 0.50,
    }
}

/// How today's weather and the season move each category. Hot drinks sell
/// in foul weather and in winter, cold drinks on sunny summer days. Snacks
/// don't care.
///
/// With `seasonal` off only the weather itself counts.
pub fn category_weather_modifier(category: ProductCategory, weather: Weather, day: u32, seasonal: bool) -> f64 {
    let summer = seasonal && calendar::is_summer(day);
    let winter = seasonal && calendar::is_winter(day);
    match category {
        ProductCategory::HotBeverage if weather.is_foul() => 1.4,
        ProductCategory::HotBeverage if weather == Weather::Sunny && summer => 0.5,
        ProductCategory::HotBeverage if winter => 1.3,
        ProductCategory::ColdBeverage if weather == Weather::Sunny && summer => 1.5,
        ProductCategory::ColdBeverage if weather.is_foul() => 0.6,
        ProductCategory::ColdBeverage if winter => 0.7,
        _ => 1.0,
    }
}

/// Expected customer demand for one SKU on one day, before noise.
pub fn expected_demand(
    record: &SkuRecord,
    day: u32,
    products_stocked: usize,
    modifiers: &DemandModifiers,
) -> f64 {
    if modifiers.machine_down {
        return 0.0;
    }

    let mut demand = record.base_sales
        * price_impact(
            record.shelf_price.cents(),
            record.reference_price.cents(),
            record.price_elasticity,
        )
        * calendar::weekday_multiplier(day)
        * calendar::month_multiplier(day)
        * modifiers.weather.multiplier()
        * category_weather_modifier(record.category, modifiers.weather, day, modifiers.seasonal)
        * choice_multiplier(products_stocked)
        * modifiers.shock;

    // Customers walk to the competitor when we are pricier.
    if let Some(cap) = modifiers.competitor_cap {
        if record.shelf_price.cents() > cap {
            demand *= 0.5;
        }
    }

    demand.max(0.0)
}

/// Turns expected demand into a whole number of customers with ±20% noise.
#[derive(Debug, Clone)]
pub struct DemandNoise {
    noise: Uniform<f64>,
}

impl Default for DemandNoise {
    fn default() -> Self {
        Self {
            noise: Uniform::new_inclusive(0.8, 1.2),
        }
    }
}

impl DemandNoise {
    pub fn realize<R: Rng + ?Sized>(&self, expected: f64, rng: &mut R) -> u32 {
        // Draw even for zero demand so the random stream does not depend on
        // what happens to be stocked.
        let factor = self.noise.sample(rng);
        let units = (expected * factor).round();
        if units <= 0.0 {
            0
        } else {
            units as u32
        }
    }
}
