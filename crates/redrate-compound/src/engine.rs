//! Compounding engine implementing the [`RateCompounder`] trait.
//!
//! Every multiplication is `(a * b) / scale` with truncation, so results are
//! biased low by at most a few units per multiply and never overshoot.

use redrate_core::constants::MAX_ROOT_ITERATIONS;
use redrate_core::error::CompoundError;
use redrate_core::traits::RateCompounder;
use redrate_core::types::Fixed;

use crate::timeline;

/// The production compounder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compounder;

impl Compounder {
    /// Create a new Compounder.
    pub fn new() -> Self {
        Self
    }
}

fn check_scale(scale: Fixed) -> Result<(), CompoundError> {
    if scale <= Fixed::ZERO {
        return Err(CompoundError::InvalidScale(scale));
    }
    Ok(())
}

/// Fixed-point exponentiation: `(base/scale)^exp` with `scale` as 1.0.
///
/// Binary exponentiation, O(log exp) multiplications. The caller has
/// already rejected negative bases and non-positive scales.
pub(crate) fn fixed_pow(base: Fixed, exp: u64, scale: Fixed) -> Result<Fixed, CompoundError> {
    if exp == 0 {
        return Ok(scale); // x^0 = 1.0
    }

    let mut result = scale;
    let mut b = base;
    let mut e = exp;

    while e > 0 {
        if e & 1 == 1 {
            result = result.checked_mul(b).ok_or(CompoundError::Overflow)? / scale;
        }
        e >>= 1;
        if e > 0 {
            b = b.checked_mul(b).ok_or(CompoundError::Overflow)? / scale;
        }
    }

    Ok(result)
}

/// Largest `r` with `fixed_pow(r, exp, scale) <= target`.
///
/// Bisection over `[lo, hi)` where `lo` always satisfies the bound and `hi`
/// never does. A probe that overflows is treated as too large.
pub(crate) fn floor_root(target: Fixed, exp: u64, scale: Fixed) -> Result<Fixed, CompoundError> {
    if exp == 0 {
        // Every base maps to `scale`; there is no meaningful root.
        return Err(CompoundError::RootNotFound { target, iterations: 0 });
    }
    if exp == 1 {
        return Ok(target);
    }

    // For target >= 1.0 the root lies in [1.0, target]; below 1.0 it lies in [0, 1.0).
    let (mut lo, mut hi) = if target >= scale {
        (scale, target.checked_add(Fixed::ONE).ok_or(CompoundError::Overflow)?)
    } else {
        (Fixed::ZERO, scale)
    };

    let mut iterations = 0u32;
    while hi - lo > Fixed::ONE {
        if iterations == MAX_ROOT_ITERATIONS {
            return Err(CompoundError::RootNotFound { target, iterations });
        }
        iterations += 1;

        let mid = lo + (hi - lo) / Fixed::new(2);
        match fixed_pow(mid, exp, scale) {
            Ok(v) if v <= target => lo = mid,
            Ok(_) | Err(CompoundError::Overflow) => hi = mid,
            Err(e) => return Err(e),
        }
    }

    Ok(lo)
}

impl RateCompounder for Compounder {
    fn pow(&self, base: Fixed, exponent: u64, scale: Fixed) -> Result<Fixed, CompoundError> {
        check_scale(scale)?;
        if base < Fixed::ZERO {
            return Err(CompoundError::NegativeBase(base));
        }
        fixed_pow(base, exponent, scale)
    }

    fn root(&self, target: Fixed, exponent: u64, scale: Fixed) -> Result<Fixed, CompoundError> {
        check_scale(scale)?;
        if target < Fixed::ZERO {
            return Err(CompoundError::NegativeBase(target));
        }
        floor_root(target, exponent, scale)
    }

    fn per_second_rate(
        &self,
        global_rate: Fixed,
        min_timeline: u64,
        scale: Fixed,
    ) -> Result<(Fixed, u64), CompoundError> {
        check_scale(scale)?;
        if global_rate < Fixed::ZERO {
            return Err(CompoundError::NegativeBase(global_rate));
        }
        timeline::search(global_rate, min_timeline, scale)
    }
}
