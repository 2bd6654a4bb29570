// src/simulation/clock.rs

use crate::error::SimulationError;
use serde::Serialize;

/// The day counter for a run.
///
/// Day 0 is the opening state; the run simulates days `1..=horizon`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Clock {
    day: u32,
    horizon: u32,
}

impl Clock {
    pub fn new(horizon: u32) -> Self {
        Self { day: 0, horizon }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    pub fn days_remaining(&self) -> u32 {
        self.horizon - self.day
    }

    /// Moves to the next day and returns it.
    pub fn advance(&mut self) -> Result<u32, SimulationError> {
        if self.is_terminal() {
            return Err(SimulationError::HorizonExceeded {
                horizon: self.horizon,
            });
        }
        self.day += 1;
        Ok(self.day)
    }

    pub fn is_terminal(&self) -> bool {
        self.day >= self.horizon
    }
}

/// Calendar helpers. Day 0 is a Monday at the start of January and a month
/// is 30 days.
pub mod calendar {
    /// 0 = Monday ... 6 = Sunday.
    pub fn weekday(day: u32) -> u32 {
        day % 7
    }

    /// 1 = January ... 12 = December.
    pub fn month(day: u32) -> u32 {
        (day / 30) % 12 + 1
    }

    /// Office location: busier on weekdays, quiet at weekends.
    pub fn weekday_multiplier(day: u32) -> f64 {
        match weekday(day) {
            0 => 0.85,
            1 => 1.00,
            2 => 1.05,
            3 => 1.00,
            4 => 1.15,
            5 => 0.70,
            _ => 0.60,
        }
    }

    pub fn month_multiplier(day: u32) -> f64 {
        match month(day) {
            1 => 0.80,
            2 => 0.85,
            3 => 0.95,
            4 => 1.00,
            5 => 1.05,
            6 => 1.10,
            7 => 0.90,
            8 => 0.85,
            9 => 1.05,
            10 => 1.00,
            11 => 1.05,
            _ => 0.75,
        }
    }

    pub fn is_summer(day: u32) -> bool {
        matches!(month(day), 6..=8)
    }

    pub fn is_winter(day: u32) -> bool {
        matches!(month(day), 12 | 1 | 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_counts_up_to_the_horizon() {
        let mut clock = Clock::new(3);
        assert!(!clock.is_terminal());
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.advance().unwrap(), 3);
        assert!(clock.is_terminal());
        assert_eq!(clock.days_remaining(), 0);
    }

    #[test]
    fn advancing_past_the_horizon_fails() {
        let mut clock = Clock::new(1);
        clock.advance().unwrap();
        let err = clock.advance().unwrap_err();
        assert!(matches!(err, SimulationError::HorizonExceeded { horizon: 1 }));
        assert_eq!(clock.day(), 1);
    }

    #[test]
    fn calendar_wraps_weeks_and_months() {
        assert_eq!(calendar::weekday(0), 0);
        assert_eq!(calendar::weekday(13), 6);
        assert_eq!(calendar::month(0), 1);
        assert_eq!(calendar::month(29), 1);
        assert_eq!(calendar::month(30), 2);
        assert_eq!(calendar::month(360), 1);
        assert!(calendar::is_summer(160));
        assert!(calendar::is_winter(340));
    }
}
