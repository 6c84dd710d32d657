//! Shared test helpers for integration suites.

use std::sync::Arc;

use redrate_controller::{
    CompoundingReferenceStore, InMemoryTreasury, ManualPriceFeed, UpdateGate,
};
use redrate_core::config::ControllerConfig;
use redrate_core::constants::{RAY, WAD};
use redrate_core::fixed::parse_decimal;
use redrate_core::types::Fixed;

/// Arbitrary start time for scenarios.
pub const T0: u64 = 1_700_000_000;

/// Human decimal to RAY, e.g. `ray("0.98")`.
pub fn ray(text: &str) -> Fixed {
    parse_decimal(text, 27).unwrap()
}

/// Human decimal to WAD.
pub fn wad(text: &str) -> Fixed {
    parse_decimal(text, 18).unwrap()
}

/// Kp = 1, Ki = 0 and a deadband swallowing every deviation below 100%.
pub fn unit_proportional_config() -> ControllerConfig {
    ControllerConfig {
        proportional_gain: WAD,
        integral_gain: Fixed::ZERO,
        noise_barrier: RAY,
        ..ControllerConfig::default()
    }
}

/// A gate wired to in-memory collaborators.
pub struct Harness {
    pub gate: UpdateGate,
    pub feed: Arc<ManualPriceFeed>,
    pub store: Arc<CompoundingReferenceStore>,
    pub treasury: Arc<InMemoryTreasury>,
}

impl Harness {
    /// Market and reference both start at 1.0; the treasury holds 1000 WAD.
    pub fn new(config: ControllerConfig) -> Self {
        let feed = Arc::new(ManualPriceFeed::new(RAY));
        let store = Arc::new(CompoundingReferenceStore::new(RAY, T0));
        let treasury = Arc::new(InMemoryTreasury::new(WAD * Fixed::new(1_000)));
        let gate = UpdateGate::new(&config, feed.clone(), store.clone())
            .unwrap()
            .with_treasury(treasury.clone());
        Self { gate, feed, store, treasury }
    }
}

/// Assert `|a - b| <= tolerance`.
pub fn assert_close(a: Fixed, b: Fixed, tolerance: Fixed) {
    let diff = (a - b).abs();
    assert!(diff <= tolerance, "{a} and {b} differ by {diff} (> {tolerance})");
}
