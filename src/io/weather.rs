// src/io/weather.rs

use crate::simulation::clock::calendar;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    Sunny,
    #[default]
    PartlyCloudy,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
}

impl Weather {
    const ALL: [Weather; 6] = [
        Weather::Sunny,
        Weather::PartlyCloudy,
        Weather::Cloudy,
        Weather::Rainy,
        Weather::Stormy,
        Weather::Snowy,
    ];

    /// Foot traffic past the machine.
    pub fn multiplier(self) -> f64 {
        match self {
            Weather::Sunny => 1.10,
            Weather::PartlyCloudy => 1.00,
            Weather::Cloudy => 0.90,
            Weather::Rainy => 0.65,
            Weather::Stormy => 0.40,
            Weather::Snowy => 0.50,
        }
    }

    /// Rain, storms and snow.
    pub fn is_foul(self) -> bool {
        matches!(self, Weather::Rainy | Weather::Stormy | Weather::Snowy)
    }

    /// Draws the weather for `day` from that month's odds. Uses exactly one
    /// value from `rng`.
    pub fn draw<R: Rng + ?Sized>(day: u32, rng: &mut R) -> Self {
        let odds = month_odds(calendar::month(day));
        let roll: f64 = rng.gen();
        let mut cumulative = 0.0;
        for (weather, p) in Self::ALL.into_iter().zip(odds) {
            cumulative += p;
            if roll < cumulative {
                return weather;
            }
        }
        Weather::PartlyCloudy
    }
}

/// Odds of each weather in `ALL` order, by month (1 = January).
fn month_odds(month: u32) -> [f64; 6] {
    match month {
        1 | 12 => [0.20, 0.20, 0.30, 0.15, 0.05, 0.10],
        2 | 11 => [0.25, 0.25, 0.25, 0.15, 0.05, 0.05],
        3 => [0.30, 0.30, 0.20, 0.15, 0.05, 0.00],
        4 | 10 => [0.35, 0.30, 0.20, 0.12, 0.03, 0.00],
        5 | 9 => [0.45, 0.30, 0.15, 0.08, 0.02, 0.00],
        6 | 8 => [0.55, 0.25, 0.12, 0.06, 0.02, 0.00],
        7 => [0.60, 0.25, 0.10, 0.04, 0.01, 0.00],
        _ => [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
    }
}
