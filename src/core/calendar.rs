//! Calendar for simulated time
//!
//! The orchestrator advances the calendar once per fixed step. Everything
//! time-based in the decision core (cache cooldowns, claim staleness,
//! timeouts) is measured in simulated hours read from here.

use serde::{Deserialize, Serialize};

use crate::core::types::{Hours, Tick};

pub const HOURS_PER_DAY: f64 = 24.0;

/// Calendar tracks simulation time with step and hour granularity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    tick: Tick,
    hours: Hours,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at an arbitrary time (tests, resumed scenarios)
    pub fn starting_at(hours: Hours) -> Self {
        Self { tick: 0, hours }
    }

    pub fn advance(&mut self, step_hours: Hours) {
        self.tick += 1;
        self.hours += step_hours;
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Simulated hours since the start of the run
    pub fn now(&self) -> Hours {
        self.hours
    }

    pub fn current_day(&self) -> u64 {
        (self.hours / HOURS_PER_DAY).floor() as u64
    }

    pub fn hour_of_day(&self) -> u32 {
        (self.hours.rem_euclid(HOURS_PER_DAY)).floor() as u32
    }

    pub fn is_night(&self) -> bool {
        !(6..20).contains(&self.hour_of_day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_counts_ticks_and_hours() {
        let mut cal = Calendar::new();
        cal.advance(0.5);
        cal.advance(0.5);
        assert_eq!(cal.current_tick(), 2);
        assert!((cal.now() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_day_and_hour() {
        let cal = Calendar::starting_at(24.0 * 2.0 + 13.5);
        assert_eq!(cal.current_day(), 2);
        assert_eq!(cal.hour_of_day(), 13);
        assert!(!cal.is_night());
    }

    #[test]
    fn test_night() {
        assert!(Calendar::starting_at(23.0).is_night());
        assert!(Calendar::starting_at(3.0).is_night());
        assert!(!Calendar::starting_at(6.0).is_night());
    }
}
