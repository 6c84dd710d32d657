//! Controller configuration.
//!
//! Provides [`ControllerConfig`] with defaults taken from the reference
//! deployment of the scaled global validator. Every fixed-point field is
//! written as a decimal integer string in its documented scale, so a config
//! file reads e.g. `leak_per_second = "999970733618363951224236355"`.
//!
//! Loading from files and the environment is the binary's job; this module
//! only defines the shape, the defaults and [`ControllerConfig::validate`].

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;
use crate::fixed;
use crate::state::{ControllerState, DeviationWindow, History, OutputBounds};
use crate::types::{ControllerMode, Fixed};

/// Incentive paid to whoever triggers an update.
///
/// The reward equals `base` when the update lands exactly when due and grows
/// by `per_second_increase` (compounded) while overdue, up to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSchedule {
    /// WAD.
    #[serde(with = "fixed::string")]
    pub base: Fixed,
    /// WAD.
    #[serde(with = "fixed::string")]
    pub max: Fixed,
    /// RAY, >= 1.0.
    #[serde(with = "fixed::string")]
    pub per_second_increase: Fixed,
}

impl Default for RewardSchedule {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_CALLER_REWARD,
            max: DEFAULT_MAX_CALLER_REWARD,
            per_second_increase: DEFAULT_CALLER_REWARD_INCREASE,
        }
    }
}

impl RewardSchedule {
    /// A schedule that never pays.
    pub fn disabled() -> Self {
        Self { base: Fixed::ZERO, max: Fixed::ZERO, per_second_increase: RAY }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base < Fixed::ZERO || self.max < self.base {
            return Err(ConfigError::invalid("reward", "require 0 <= base <= max"));
        }
        if self.per_second_increase < RAY {
            return Err(ConfigError::invalid("reward", "per-second increase below RAY"));
        }
        Ok(())
    }
}

/// Full parameter set for one controller and its update gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub mode: ControllerMode,
    /// Kp (WAD).
    #[serde(with = "fixed::string")]
    pub proportional_gain: Fixed,
    /// Ki (WAD).
    #[serde(with = "fixed::string")]
    pub integral_gain: Fixed,
    /// RAY, in `(0, RAY]`.
    #[serde(with = "fixed::string")]
    pub leak_per_second: Fixed,
    /// Minimum seconds between committed updates.
    pub integral_period_size: u64,
    /// Window floor below the last approved rate (RAY units).
    #[serde(with = "fixed::string")]
    pub lower_deviation_bound: Fixed,
    /// Window floor above the last approved rate (RAY units).
    #[serde(with = "fixed::string")]
    pub upper_deviation_bound: Fixed,
    /// Window growth per rejection (RAY, >= 1.0).
    #[serde(with = "fixed::string")]
    pub deviation_growth_factor: Fixed,
    /// RAY, in `[0, RAY]`.
    #[serde(with = "fixed::string")]
    pub noise_barrier: Fixed,
    #[serde(with = "fixed::string")]
    pub output_lower_bound: Fixed,
    #[serde(with = "fixed::string")]
    pub output_upper_bound: Fixed,
    pub min_rate_timeline: u64,
    /// Per-second rate (RAY) in force before the first update.
    #[serde(with = "fixed::string")]
    pub initial_rate: Fixed,
    /// Maximum distance (RAY units) between a caller-proposed rate and the
    /// controller's own rate.
    #[serde(with = "fixed::string")]
    pub proposal_tolerance: Fixed,
    pub reward: RewardSchedule,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mode: ControllerMode::Global,
            proportional_gain: DEFAULT_PROPORTIONAL_GAIN,
            integral_gain: DEFAULT_INTEGRAL_GAIN,
            leak_per_second: DEFAULT_LEAK_PER_SECOND,
            integral_period_size: DEFAULT_INTEGRAL_PERIOD_SIZE,
            lower_deviation_bound: DEFAULT_DEVIATION_WIDTH,
            upper_deviation_bound: DEFAULT_DEVIATION_WIDTH,
            deviation_growth_factor: DEFAULT_DEVIATION_GROWTH,
            noise_barrier: DEFAULT_NOISE_BARRIER,
            output_lower_bound: DEFAULT_OUTPUT_LOWER_BOUND,
            output_upper_bound: DEFAULT_OUTPUT_UPPER_BOUND,
            min_rate_timeline: DEFAULT_MIN_RATE_TIMELINE,
            initial_rate: RAY,
            proposal_tolerance: DEFAULT_PROPOSAL_TOLERANCE,
            reward: RewardSchedule::default(),
        }
    }
}

impl ControllerConfig {
    /// Check every parameter against its domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_state().validate()?;
        if self.proposal_tolerance < Fixed::ZERO {
            return Err(ConfigError::invalid("proposal_tolerance", "must not be negative"));
        }
        self.reward.validate()
    }

    /// A fresh, validated controller state: zero accumulator, no prior update,
    /// window at its floor.
    pub fn initial_state(&self) -> Result<ControllerState, ConfigError> {
        self.validate()?;
        Ok(self.build_state())
    }

    fn build_state(&self) -> ControllerState {
        ControllerState {
            proportional_gain: self.proportional_gain,
            integral_gain: self.integral_gain,
            integral_accumulator: Fixed::ZERO,
            leak_per_second: self.leak_per_second,
            last_update_time: None,
            last_approved_rate: self.initial_rate,
            allowed_deviation_window: DeviationWindow::new(
                self.lower_deviation_bound,
                self.upper_deviation_bound,
                self.deviation_growth_factor,
            ),
            noise_barrier: self.noise_barrier,
            output_bounds: OutputBounds {
                lower: self.output_lower_bound,
                upper: self.output_upper_bound,
            },
            min_rate_timeline: self.min_rate_timeline,
            history: History::default(),
        }
    }
}
