//! # redrate-core
//! Foundation types, state layout and traits for the redrate controller.
//!
//! All arithmetic is on signed 256-bit integers with explicit scales
//! ([`constants::RAY`] for rates and prices, [`constants::WAD`] for gains);
//! there is no floating point anywhere in the control path.

pub mod config;
pub mod constants;
pub mod error;
pub mod fixed;
pub mod state;
pub mod traits;
pub mod types;

pub use config::{ControllerConfig, RewardSchedule};
pub use state::ControllerState;
pub use types::{ComputationResult, ControllerMode, Fixed, UpdateOutcome};
