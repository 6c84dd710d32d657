//! Core value types: the fixed-point integer, controller output mode and
//! the result records passed between the controller and the update gate.
//!
//! Every fixed-point quantity is a signed 256-bit integer. The scale is
//! implicit and documented per field ([`RAY`](crate::constants::RAY) unless
//! stated otherwise).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Signed 256-bit fixed-point integer.
pub type Fixed = ethnum::I256;

/// How the controller output is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerMode {
    /// The clamped output is the per-second rate itself.
    PerSecond,
    /// The clamped output is a one-year compounded multiplier; the controller
    /// derives the per-second rate and the timeline it is spread over.
    #[default]
    Global,
}

impl fmt::Display for ControllerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerSecond => write!(f, "per_second"),
            Self::Global => write!(f, "global"),
        }
    }
}

/// Output of a single controller computation.
///
/// `proportional_term` and `integral_term` are reported before gains are
/// applied; see `RateController::gain_adjusted_terms` for the weighted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputationResult {
    /// Per-second rate (RAY) to commit.
    pub rate: Fixed,
    /// Deviation after the deadband (RAY).
    pub proportional_term: Fixed,
    /// Leaky integral of the deviation (RAY · seconds).
    pub integral_term: Fixed,
    /// Seconds the global output is spread over. `None` in per-second mode.
    pub timeline: Option<u64>,
    /// Clamped controller output before any per-second conversion (RAY).
    pub raw_output: Fixed,
    /// Seconds elapsed since the last committed update.
    pub elapsed: u64,
}

/// A successfully committed update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Time the update was committed at.
    pub updated_at: u64,
    /// The committed per-second rate (RAY).
    pub rate: Fixed,
    /// Timeline of the committed rate, if computed in global mode.
    pub timeline: Option<u64>,
    /// Proportional term without gain (RAY).
    pub proportional_term: Fixed,
    /// Integral term without gain (RAY · seconds).
    pub integral_term: Fixed,
    /// Reward actually paid to the caller (WAD). Zero when unfunded.
    pub reward_paid: Fixed,
}

/// Diagnostic record of one committed update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub time: u64,
    pub proportional_term: Fixed,
    pub integral_term: Fixed,
    pub rate: Fixed,
    pub timeline: Option<u64>,
}
