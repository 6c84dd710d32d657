//! # redrate-controller — Rate controller and update gating.
//!
//! - [`controller::RateController`] — PI state machine: deadband, leaky
//!   integral, clamped output, global-to-per-second conversion and the
//!   deviation window
//! - [`gate::UpdateGate`] — minimum update interval, proposal checks,
//!   commit and caller reward under one lock
//! - [`reward`] — overdue-growing caller reward
//! - [`collaborators`] — in-memory price feed, reference store and treasury

pub mod collaborators;
pub mod controller;
pub mod gate;
pub mod reward;

pub use collaborators::{CompoundingReferenceStore, InMemoryTreasury, ManualPriceFeed};
pub use controller::RateController;
pub use gate::{GatePolicy, UpdateGate, UpdateRequest};
