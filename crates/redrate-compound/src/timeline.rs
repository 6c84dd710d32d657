//! Timeline search for global-mode outputs.
//!
//! A global output is a multiplier meant to compound over one year. The
//! search walks candidate timelines from one year down to the configured
//! minimum, halving each step, and accepts the first one whose floored
//! per-second root compounds back to the target within
//! [`TIMELINE_TOLERANCE_PPB`]. The reported rate is always the floor root,
//! so compounding it never overshoots the target.

use redrate_core::constants::{
    MAX_ROOT_ITERATIONS, MAX_TIMELINE_STEPS, PPB_PRECISION, SECONDS_PER_YEAR,
    TIMELINE_TOLERANCE_PPB,
};
use redrate_core::error::CompoundError;
use redrate_core::fixed::mul_div;
use redrate_core::types::Fixed;
use tracing::debug;

use crate::engine::{fixed_pow, floor_root};

/// Candidate timelines, longest first.
///
/// `SECONDS_PER_YEAR`, then halvings while they stay at or above
/// `min_timeline`, then `min_timeline` itself. At most
/// `MAX_TIMELINE_STEPS + 1` entries.
pub fn candidates(min_timeline: u64) -> Vec<u64> {
    let min = min_timeline.clamp(1, SECONDS_PER_YEAR);
    let mut out = Vec::new();
    let mut t = SECONDS_PER_YEAR;
    while t >= min && out.len() < MAX_TIMELINE_STEPS as usize {
        out.push(t);
        t /= 2;
    }
    if out.last() != Some(&min) {
        out.push(min);
    }
    out
}

/// Whether `achieved` is close enough below `target` to accept the timeline.
fn within_tolerance(target: Fixed, achieved: Fixed) -> bool {
    let slack = mul_div(
        target,
        Fixed::from(TIMELINE_TOLERANCE_PPB),
        Fixed::from(PPB_PRECISION),
    )
    .unwrap_or(Fixed::MAX);
    achieved <= target && target - achieved <= slack
}

/// Per-second rate and timeline for `target` (a one-year multiplier).
pub(crate) fn search(
    target: Fixed,
    min_timeline: u64,
    scale: Fixed,
) -> Result<(Fixed, u64), CompoundError> {
    if target == scale {
        return Ok((scale, SECONDS_PER_YEAR));
    }

    for timeline in candidates(min_timeline) {
        let rate = match floor_root(target, timeline, scale) {
            Ok(rate) => rate,
            Err(CompoundError::RootNotFound { .. }) | Err(CompoundError::Overflow) => {
                debug!(%target, timeline, "compound: no root on timeline");
                continue;
            }
            Err(e) => return Err(e),
        };
        match fixed_pow(rate, timeline, scale) {
            Ok(achieved) if within_tolerance(target, achieved) => return Ok((rate, timeline)),
            Ok(achieved) => {
                debug!(%target, %achieved, timeline, "compound: timeline outside tolerance");
            }
            Err(_) => {
                debug!(%target, timeline, "compound: root overflowed on recompounding");
            }
        }
    }

    Err(CompoundError::RootNotFound {
        target,
        iterations: MAX_ROOT_ITERATIONS,
    })
}
