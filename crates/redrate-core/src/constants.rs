//! Fixed-point scales and controller defaults.
//!
//! Prices, rates, deviations and the leak are expressed in [`RAY`] (10^27).
//! Gains and caller rewards are expressed in [`WAD`] (10^18).

use crate::types::Fixed;

/// 1.0 at 18 decimals.
pub const WAD: Fixed = Fixed::new(1_000_000_000_000_000_000);

/// 1.0 at 27 decimals. The identity per-second rate.
pub const RAY: Fixed = Fixed::new(1_000_000_000_000_000_000_000_000_000);

/// Seconds in a 365-day year. The longest timeline a global rate is expressed over.
///
/// # Examples
///
/// ```
/// use redrate_core::constants::SECONDS_PER_YEAR;
/// assert_eq!(SECONDS_PER_YEAR, 365 * 24 * 60 * 60);
/// ```
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Number of diagnostic snapshots kept by the controller.
pub const HISTORY_LEN: usize = 5;

/// Upper bound on bisection steps when inverting a compounded rate.
///
/// A 256-bit search interval is exhausted in at most 256 halvings.
pub const MAX_ROOT_ITERATIONS: u32 = 256;

/// Upper bound on timeline halvings in the global-mode timeline search.
pub const MAX_TIMELINE_STEPS: u32 = 64;

/// Relative tolerance, in parts per billion, for accepting a timeline.
pub const TIMELINE_TOLERANCE_PPB: u64 = 1;

/// Parts-per-billion denominator.
pub const PPB_PRECISION: u64 = 1_000_000_000;

// ------------------------------------------------------------------
// Defaults (mirroring the reference deployment of the scaled global validator)
// ------------------------------------------------------------------

/// Minimum seconds between two committed updates.
pub const DEFAULT_INTEGRAL_PERIOD_SIZE: u64 = 3_600;

/// Shortest timeline a global rate may be spread over (30 days).
pub const DEFAULT_MIN_RATE_TIMELINE: u64 = 2_592_000;

/// Kp = 1.0.
pub const DEFAULT_PROPORTIONAL_GAIN: Fixed = WAD;

/// Ki = 1 / 3600^2.
pub const DEFAULT_INTEGRAL_GAIN: Fixed = Fixed::new(77_160_493_827);

/// -10% per hour, compounded per second.
pub const DEFAULT_LEAK_PER_SECOND: Fixed = Fixed::new(999_970_733_618_363_951_224_236_355);

/// Deviations below 0.5% are ignored.
pub const DEFAULT_NOISE_BARRIER: Fixed = Fixed::new(5_000_000_000_000_000_000_000_000);

/// Default window width around the last approved per-second rate (1e-8 per second).
pub const DEFAULT_DEVIATION_WIDTH: Fixed = Fixed::new(10_000_000_000_000_000_000);

/// Windows widen by 10% per rejected attempt.
pub const DEFAULT_DEVIATION_GROWTH: Fixed = Fixed::new(1_100_000_000_000_000_000_000_000_000);

/// Lowest allowed controller output (-99% per year in global mode).
pub const DEFAULT_OUTPUT_LOWER_BOUND: Fixed = Fixed::new(10_000_000_000_000_000_000_000_000);

/// Highest allowed controller output (+9900% per year in global mode).
pub const DEFAULT_OUTPUT_UPPER_BOUND: Fixed = Fixed::new(100_000_000_000_000_000_000_000_000_000);

/// Reward paid when an update lands exactly when due.
pub const DEFAULT_BASE_CALLER_REWARD: Fixed = WAD;

/// Cap on the caller reward.
pub const DEFAULT_MAX_CALLER_REWARD: Fixed = Fixed::new(10_000_000_000_000_000_000);

/// Per-second reward growth once an update is overdue (+166.67% per hour).
pub const DEFAULT_CALLER_REWARD_INCREASE: Fixed =
    Fixed::new(1_000_272_489_688_853_849_040_134_023);

/// Maximum distance between a proposed rate and the controller's own rate.
pub const DEFAULT_PROPOSAL_TOLERANCE: Fixed = Fixed::new(1_000_000_000_000);
