//! Trait interfaces between the controller and its collaborators.
//!
//! - [`RateCompounder`] — fixed-point compounding math (redrate-compound implements)
//! - [`PriceFeed`] — source of the observed market price
//! - [`ReferencePriceStore`] — holder of the reference price the rate is applied to
//! - [`RewardTreasury`] — pays the caller incentive for triggering an update
//!
//! Feeds, stores and treasuries live outside this workspace in production;
//! redrate-controller ships in-memory versions for simulation and tests.

use crate::constants::RAY;
use crate::error::{CollaboratorError, CompoundError};
use crate::fixed::rmul;
use crate::types::Fixed;

/// Deterministic fixed-point compounding.
///
/// Implementations must be bit-reproducible: integer arithmetic only, with
/// every multiplication floored by `scale`.
pub trait RateCompounder: Send + Sync {
    /// `base^exponent` in fixed point with `scale` as 1.0.
    fn pow(&self, base: Fixed, exponent: u64, scale: Fixed) -> Result<Fixed, CompoundError>;

    /// Largest `r` such that `pow(r, exponent, scale) <= target`.
    fn root(&self, target: Fixed, exponent: u64, scale: Fixed) -> Result<Fixed, CompoundError>;

    /// Per-second rate and timeline expressing a one-year compounded
    /// multiplier `global_rate` (never shorter than `min_timeline`).
    fn per_second_rate(
        &self,
        global_rate: Fixed,
        min_timeline: u64,
        scale: Fixed,
    ) -> Result<(Fixed, u64), CompoundError>;

    /// `price` compounded at `rate` (RAY) for `elapsed` seconds.
    ///
    /// Default implementation: `price * pow(rate, elapsed, RAY) / RAY`.
    fn compound_price(&self, price: Fixed, rate: Fixed, elapsed: u64) -> Result<Fixed, CompoundError> {
        let factor = self.pow(rate, elapsed, RAY)?;
        rmul(price, factor).ok_or(CompoundError::Overflow)
    }
}

/// Observed market price (RAY).
pub trait PriceFeed: Send + Sync {
    fn market_price(&self) -> Result<Fixed, CollaboratorError>;
}

/// The reference ("redemption") price the controller steers.
pub trait ReferencePriceStore: Send + Sync {
    /// Reference price (RAY) as of `now`, including drift from the current rate.
    fn reference_price(&self, now: u64) -> Result<Fixed, CollaboratorError>;

    /// Install a new per-second rate effective from `now`.
    fn apply_rate(&self, rate: Fixed, now: u64) -> Result<(), CollaboratorError>;
}

/// Funds the incentive paid to whoever triggers an update.
pub trait RewardTreasury: Send + Sync {
    /// Pay up to `amount` (WAD) to `receiver`; returns the amount actually paid.
    ///
    /// A short treasury may pay less than requested; an error means nothing was paid.
    fn pay(&self, receiver: &str, amount: Fixed) -> Result<Fixed, CollaboratorError>;
}
