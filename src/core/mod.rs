pub mod calendar;
pub mod config;
pub mod error;
pub mod types;

pub use calendar::Calendar;
pub use config::SimulationConfig;
pub use error::{Result, SimError};
