//! Independent decimal oracle for per-second rates.
//!
//! Computes `(1 + percent / 100)^(1 / timeline)` with `rust_decimal`'s
//! logarithm and exponential, sharing no code with the compounder. Results
//! carry roughly 28 significant digits, so comparisons against the integer
//! implementation use [`ORACLE_TOLERANCE`].

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};

/// Largest accepted gap, in RAY units, between the oracle and the compounder.
pub const ORACLE_TOLERANCE: i128 = 1_000_000_000_000;

/// Per-second rate (RAY, as a decimal integer string) that compounds to a
/// `global_rate_percent` change over `timeline_seconds`.
///
/// `("50", "100000")` is the rate that grows 1.0 to 1.5 in 100000 seconds.
pub fn reference_compute_per_second_rate(global_rate_percent: &str, timeline_seconds: &str) -> String {
    let percent = Decimal::from_str(global_rate_percent).expect("percent is a decimal");
    let timeline = Decimal::from_str(timeline_seconds).expect("timeline is a decimal");
    let multiplier = percent / Decimal::ONE_HUNDRED + Decimal::ONE;
    assert!(multiplier > Decimal::ZERO, "multiplier must be positive");

    let per_second = (multiplier.ln() / timeline).exp();
    let ray = Decimal::from_i128_with_scale(1_000_000_000_000_000_000_000_000_000, 0);
    let scaled = (per_second * ray).trunc();
    scaled.to_i128().expect("rate fits i128").to_string()
}
