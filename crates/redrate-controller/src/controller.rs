//! Deadbanded leaky-PI rate controller.
//!
//! [`RateController`] owns the [`ControllerState`] and turns a
//! `(market, reference, elapsed)` observation into the next per-second rate.
//! Computation is split in two so callers can inspect a result before any
//! state changes:
//!
//! 1. [`RateController::preview`] is pure: deviation, deadband, leak,
//!    anti-windup, clamp and (in global mode) the timeline search.
//! 2. [`RateController::admit`] applies the deviation window, widening it on
//!    rejection.
//!
//! [`RateController::compute`] runs both. Nothing is committed until
//! [`RateController::commit`].
//!
//! While the output is saturated in the direction the deviation pushes, the
//! period's deviation is not integrated and only the leak applies. For such
//! periods the accumulator differs from the plain leaky sum
//! `acc * leak^elapsed + deviation * elapsed`, so comparisons against that
//! reference must skip saturated periods.

use std::fmt;
use std::sync::Arc;

use redrate_compound::Compounder;
use redrate_core::config::ControllerConfig;
use redrate_core::constants::RAY;
use redrate_core::error::{ConfigError, ControllerError};
use redrate_core::fixed::{mul_div, rmul, wmul};
use redrate_core::state::{
    self, ControllerState, DeviationWindow, History, OutputBounds,
};
use redrate_core::traits::RateCompounder;
use redrate_core::types::{ComputationResult, ControllerMode, Fixed, Snapshot};
use tracing::debug;

/// The PI controller.
pub struct RateController {
    mode: ControllerMode,
    state: ControllerState,
    compounder: Arc<dyn RateCompounder>,
}

impl fmt::Debug for RateController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateController")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl RateController {
    /// Create a controller from validated configuration with the production compounder.
    pub fn new(config: &ControllerConfig) -> Result<Self, ConfigError> {
        Self::with_compounder(config, Arc::new(Compounder::new()))
    }

    /// Create a controller with a custom compounder.
    pub fn with_compounder(
        config: &ControllerConfig,
        compounder: Arc<dyn RateCompounder>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            mode: config.mode,
            state: config.initial_state()?,
            compounder,
        })
    }

    /// Resume from previously persisted state.
    pub fn from_state(
        mode: ControllerMode,
        state: ControllerState,
        compounder: Arc<dyn RateCompounder>,
    ) -> Result<Self, ConfigError> {
        state.validate()?;
        Ok(Self { mode, state, compounder })
    }

    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.state.history
    }

    pub fn compounder(&self) -> &dyn RateCompounder {
        self.compounder.as_ref()
    }

    /// Seconds since the last committed update; 0 before the first one.
    pub fn elapsed_since_update(&self, now: u64) -> Result<u64, ControllerError> {
        let Some(last_update) = self.state.last_update_time else {
            return Ok(0);
        };
        now.checked_sub(last_update)
            .ok_or(ControllerError::InvalidElapsedTime { now, last_update })
    }

    /// Compute the next rate and check it against the deviation window.
    ///
    /// On [`ControllerError::DeviationRejected`] the window has been widened;
    /// no other state changes on any path.
    pub fn compute(
        &mut self,
        market: Fixed,
        reference: Fixed,
        elapsed: u64,
    ) -> Result<ComputationResult, ControllerError> {
        let result = self.preview(market, reference, elapsed)?;
        self.admit(result.rate)?;
        Ok(result)
    }

    /// Compute the next rate without touching state.
    pub fn preview(
        &self,
        market: Fixed,
        reference: Fixed,
        elapsed: u64,
    ) -> Result<ComputationResult, ControllerError> {
        let deviation = self.deviation(market, reference)?;

        let decay = self.compounder.pow(self.state.leak_per_second, elapsed, RAY)?;
        let decayed = rmul(self.state.integral_accumulator, decay).ok_or(ControllerError::Overflow)?;
        let integrated = deviation
            .checked_mul(Fixed::from(elapsed))
            .and_then(|added| decayed.checked_add(added))
            .ok_or(ControllerError::Overflow)?;

        let bounds = self.state.output_bounds;
        let mut integral = integrated;
        let mut unclamped = self.output(deviation, integrated)?;
        let pushes_up = unclamped > bounds.upper && deviation > Fixed::ZERO;
        let pushes_down = unclamped < bounds.lower && deviation < Fixed::ZERO;
        if pushes_up || pushes_down {
            // Saturated: keep the leak, drop this period's deviation.
            integral = decayed;
            unclamped = self.output(deviation, decayed)?;
        }
        let raw_output = bounds.clamp(unclamped);

        let (rate, timeline) = match self.mode {
            ControllerMode::PerSecond => (raw_output, None),
            ControllerMode::Global => {
                let (rate, timeline) = self.compounder.per_second_rate(
                    raw_output,
                    self.state.min_rate_timeline,
                    RAY,
                )?;
                (rate, Some(timeline))
            }
        };

        debug!(%deviation, %integral, %raw_output, %rate, elapsed, "controller: computed");

        Ok(ComputationResult {
            rate,
            proportional_term: deviation,
            integral_term: integral,
            timeline,
            raw_output,
            elapsed,
        })
    }

    /// Check `rate` against the deviation window around the last approved
    /// rate. Global mode only; per-second outputs are always admitted.
    pub fn admit(&mut self, rate: Fixed) -> Result<(), ControllerError> {
        if self.mode != ControllerMode::Global {
            return Ok(());
        }
        let last_approved = self.state.last_approved_rate;
        let window = &mut self.state.allowed_deviation_window;
        if window.admits(last_approved, rate) {
            return Ok(());
        }
        let err = ControllerError::DeviationRejected {
            candidate: rate,
            last_approved,
            lower: window.lower_bound,
            upper: window.upper_bound,
        };
        window.widen();
        debug!(
            %rate,
            %last_approved,
            lower = %window.lower_bound,
            upper = %window.upper_bound,
            "controller: deviation rejected, window widened"
        );
        Err(err)
    }

    /// Apply a computed result at time `now`: new accumulator and rate,
    /// window back at its floor, snapshot recorded.
    pub fn commit(&mut self, result: &ComputationResult, now: u64) -> Result<(), ControllerError> {
        if let Some(last_update) = self.state.last_update_time {
            if now < last_update {
                return Err(ControllerError::InvalidElapsedTime { now, last_update });
            }
        }
        self.state.integral_accumulator = result.integral_term;
        self.state.last_approved_rate = result.rate;
        self.state.last_update_time = Some(now);
        self.state.allowed_deviation_window.reset();
        self.state.history.push(Snapshot {
            time: now,
            proportional_term: result.proportional_term,
            integral_term: result.integral_term,
            rate: result.rate,
            timeline: result.timeline,
        });
        Ok(())
    }

    /// `(p * Kp / WAD, i * Ki / WAD)`.
    pub fn gain_adjusted_terms(&self, p: Fixed, i: Fixed) -> Result<(Fixed, Fixed), ControllerError> {
        let p = wmul(p, self.state.proportional_gain).ok_or(ControllerError::Overflow)?;
        let i = wmul(i, self.state.integral_gain).ok_or(ControllerError::Overflow)?;
        Ok((p, i))
    }

    /// Signed relative deviation `(reference - market) / reference` (RAY),
    /// zeroed inside the noise barrier.
    fn deviation(&self, market: Fixed, reference: Fixed) -> Result<Fixed, ControllerError> {
        if market <= Fixed::ZERO || reference <= Fixed::ZERO {
            return Err(ControllerError::InvalidPrice { market, reference });
        }
        let gap = reference.checked_sub(market).ok_or(ControllerError::Overflow)?;
        let deviation = mul_div(gap, RAY, reference).ok_or(ControllerError::Overflow)?;
        let magnitude = deviation.checked_abs().ok_or(ControllerError::Overflow)?;
        if magnitude < self.state.noise_barrier {
            return Ok(Fixed::ZERO);
        }
        Ok(deviation)
    }

    /// `RAY + Kp·p + Ki·i` before clamping.
    fn output(&self, p: Fixed, i: Fixed) -> Result<Fixed, ControllerError> {
        let (p, i) = self.gain_adjusted_terms(p, i)?;
        RAY.checked_add(p)
            .and_then(|v| v.checked_add(i))
            .ok_or(ControllerError::Overflow)
    }

    // --- setters ---

    pub fn set_gains(&mut self, proportional: Fixed, integral: Fixed) -> Result<(), ConfigError> {
        state::validate_gains(proportional, integral)?;
        self.state.proportional_gain = proportional;
        self.state.integral_gain = integral;
        Ok(())
    }

    pub fn set_leak(&mut self, leak_per_second: Fixed) -> Result<(), ConfigError> {
        state::validate_leak(leak_per_second)?;
        self.state.leak_per_second = leak_per_second;
        Ok(())
    }

    /// Replace the window floor and growth; the current window resets to the new floor.
    pub fn set_deviation_bounds(
        &mut self,
        lower: Fixed,
        upper: Fixed,
        growth_factor: Fixed,
    ) -> Result<(), ConfigError> {
        let window = DeviationWindow::new(lower, upper, growth_factor);
        state::validate_window(&window)?;
        self.state.allowed_deviation_window = window;
        Ok(())
    }

    pub fn set_noise_barrier(&mut self, barrier: Fixed) -> Result<(), ConfigError> {
        state::validate_noise_barrier(barrier)?;
        self.state.noise_barrier = barrier;
        Ok(())
    }

    pub fn set_output_bounds(&mut self, lower: Fixed, upper: Fixed) -> Result<(), ConfigError> {
        let bounds = OutputBounds { lower, upper };
        state::validate_output_bounds(&bounds)?;
        self.state.output_bounds = bounds;
        Ok(())
    }

    pub fn set_min_rate_timeline(&mut self, timeline: u64) -> Result<(), ConfigError> {
        state::validate_min_rate_timeline(timeline)?;
        self.state.min_rate_timeline = timeline;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use redrate_core::constants::{SECONDS_PER_YEAR, WAD};

    fn ray_frac(num: i128, den: i128) -> Fixed {
        RAY * Fixed::new(num) / Fixed::new(den)
    }

    fn controller(config: ControllerConfig) -> RateController {
        RateController::new(&config).unwrap()
    }

    fn global() -> RateController {
        controller(ControllerConfig::default())
    }

    fn per_second() -> RateController {
        controller(ControllerConfig {
            mode: ControllerMode::PerSecond,
            noise_barrier: Fixed::ZERO,
            ..Default::default()
        })
    }

    // --- steady state ---

    #[test]
    fn equal_prices_first_computation() {
        let mut c = global();
        let r = c.compute(RAY, RAY, 0).unwrap();
        assert_eq!(r.rate, RAY);
        assert_eq!(r.proportional_term, Fixed::ZERO);
        assert_eq!(r.integral_term, Fixed::ZERO);
        assert_eq!(r.timeline, Some(SECONDS_PER_YEAR));
    }

    #[test]
    fn equal_prices_after_warp() {
        let mut c = global();
        let r = c.compute(RAY, RAY, 21_600).unwrap();
        assert_eq!(r.rate, RAY);
        assert_eq!(r.proportional_term, Fixed::ZERO);
        assert_eq!(r.integral_term, Fixed::ZERO);
        assert_eq!(r.timeline, Some(SECONDS_PER_YEAR));
    }

    #[test]
    fn unit_proportional_no_integral_wide_deadband() {
        let mut c = controller(ControllerConfig {
            proportional_gain: WAD,
            integral_gain: Fixed::ZERO,
            noise_barrier: RAY,
            ..Default::default()
        });
        let r = c.compute(RAY, RAY, 0).unwrap();
        assert_eq!(r.rate, RAY);
        assert_eq!(r.proportional_term, Fixed::ZERO);
        assert_eq!(r.integral_term, Fixed::ZERO);
        assert_eq!(r.timeline, Some(SECONDS_PER_YEAR));
    }

    // --- deviation and deadband ---

    #[test]
    fn market_below_reference_raises_output() {
        let c = per_second();
        let r = c.preview(ray_frac(99, 100), RAY, 0).unwrap();
        assert_eq!(r.proportional_term, ray_frac(1, 100));
        assert_eq!(r.raw_output, RAY + ray_frac(1, 100));
        assert_eq!(r.rate, r.raw_output);
        assert_eq!(r.timeline, None);
    }

    #[test]
    fn market_above_reference_lowers_output() {
        let c = per_second();
        let r = c.preview(ray_frac(101, 100), RAY, 0).unwrap();
        assert_eq!(r.proportional_term, -ray_frac(1, 100));
        assert!(r.rate < RAY);
    }

    #[test]
    fn deviation_inside_noise_barrier_is_ignored() {
        let c = global();
        // 0.4% < 0.5% barrier
        let r = c.preview(ray_frac(996, 1000), RAY, 3_600).unwrap();
        assert_eq!(r.proportional_term, Fixed::ZERO);
        assert_eq!(r.integral_term, Fixed::ZERO);
        assert_eq!(r.rate, RAY);
    }

    #[test]
    fn deviation_at_noise_barrier_counts() {
        let c = global();
        let r = c.preview(ray_frac(995, 1000), RAY, 0).unwrap();
        assert_eq!(r.proportional_term, ray_frac(5, 1000));
    }

    #[test]
    fn non_positive_prices_rejected() {
        let c = global();
        assert!(matches!(
            c.preview(Fixed::ZERO, RAY, 0),
            Err(ControllerError::InvalidPrice { .. })
        ));
        assert!(matches!(
            c.preview(RAY, -RAY, 0),
            Err(ControllerError::InvalidPrice { .. })
        ));
    }

    // --- integral ---

    #[test]
    fn integral_accumulates_deviation_times_elapsed() {
        let c = per_second();
        let r = c.preview(ray_frac(99, 100), RAY, 600).unwrap();
        assert_eq!(r.integral_term, ray_frac(1, 100) * Fixed::new(600));
    }

    #[test]
    fn zero_deviation_leaks_accumulator() {
        let mut c = per_second();
        c.state.integral_accumulator = RAY * Fixed::new(1_000);
        let r = c.preview(RAY, RAY, 3_600).unwrap();
        assert!(r.integral_term < c.state.integral_accumulator);
        assert!(r.integral_term > Fixed::ZERO);
        // Default leak is -10% per hour.
        let expected = RAY * Fixed::new(900);
        assert!((r.integral_term - expected).abs() < RAY / Fixed::new(1_000_000));
    }

    #[test]
    fn negative_accumulator_leaks_toward_zero() {
        let mut c = per_second();
        c.state.integral_accumulator = -RAY * Fixed::new(50);
        let r = c.preview(RAY, RAY, 1).unwrap();
        assert!(r.integral_term > c.state.integral_accumulator);
        assert!(r.integral_term < Fixed::ZERO);
    }

    #[test]
    fn anti_windup_skips_integration_when_pushing_into_bound() {
        let mut c = controller(ControllerConfig {
            mode: ControllerMode::PerSecond,
            noise_barrier: Fixed::ZERO,
            integral_gain: WAD,
            output_upper_bound: ray_frac(101, 100),
            ..Default::default()
        });
        c.state.leak_per_second = RAY;
        let r = c.preview(ray_frac(1, 2), RAY, 10).unwrap();
        assert_eq!(r.integral_term, Fixed::ZERO);
        assert_eq!(r.rate, ray_frac(101, 100));
    }

    #[test]
    fn anti_windup_integrates_when_pulling_out_of_bound() {
        let mut c = controller(ControllerConfig {
            mode: ControllerMode::PerSecond,
            noise_barrier: Fixed::ZERO,
            integral_gain: WAD,
            leak_per_second: RAY,
            output_upper_bound: ray_frac(101, 100),
            ..Default::default()
        });
        c.state.integral_accumulator = RAY * Fixed::new(100);
        let r = c.preview(ray_frac(11, 10), RAY, 10).unwrap();
        assert_eq!(r.integral_term, RAY * Fixed::new(99));
        assert_eq!(r.rate, ray_frac(101, 100));
    }

    #[test]
    fn output_clamped_to_lower_bound() {
        let c = controller(ControllerConfig {
            mode: ControllerMode::PerSecond,
            noise_barrier: Fixed::ZERO,
            proportional_gain: WAD * Fixed::new(10),
            output_lower_bound: ray_frac(1, 2),
            ..Default::default()
        });
        let r = c.preview(RAY * Fixed::new(2), RAY, 0).unwrap();
        assert_eq!(r.rate, ray_frac(1, 2));
    }

    // --- deviation window ---

    #[test]
    fn large_move_rejected_until_window_grows() {
        let mut c = global();
        let before = c.state.allowed_deviation_window;
        let mut rejections = 0;
        let result = loop {
            match c.compute(ray_frac(1, 2), RAY, 0) {
                Ok(r) => break r,
                Err(ControllerError::DeviationRejected { .. }) => rejections += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
            assert!(rejections < 10);
        };
        // ln(1.5) / year is ~1.29e-8 per second; the 1e-8 window needs three
        // 10% widenings.
        assert_eq!(rejections, 3);
        assert!(c.state.allowed_deviation_window.upper_bound > before.upper_bound);
        c.commit(&result, 100).unwrap();
        assert!(c.state.allowed_deviation_window.is_at_floor());
    }

    #[test]
    fn rejection_strictly_widens_window() {
        let mut c = global();
        c.set_deviation_bounds(Fixed::ZERO, Fixed::ZERO, RAY).unwrap();
        let mut last = c.state.allowed_deviation_window;
        for _ in 0..5 {
            assert!(c.compute(ray_frac(1, 2), RAY, 0).is_err());
            let now = c.state.allowed_deviation_window;
            assert!(now.lower_bound > last.lower_bound);
            assert!(now.upper_bound > last.upper_bound);
            last = now;
        }
    }

    #[test]
    fn rejection_leaves_other_state_alone() {
        let mut c = global();
        let before = c.state.clone();
        assert!(c.compute(ray_frac(1, 2), RAY, 0).is_err());
        assert_eq!(c.state.integral_accumulator, before.integral_accumulator);
        assert_eq!(c.state.last_approved_rate, before.last_approved_rate);
        assert_eq!(c.state.last_update_time, before.last_update_time);
        assert!(c.state.history.is_empty());
    }

    #[test]
    fn per_second_mode_skips_window() {
        let mut c = per_second();
        c.set_deviation_bounds(Fixed::ZERO, Fixed::ZERO, RAY).unwrap();
        assert!(c.compute(ray_frac(1, 2), RAY, 0).is_ok());
    }

    // --- commit and timing ---

    #[test]
    fn commit_records_state_and_history() {
        let mut c = per_second();
        let r = c.compute(ray_frac(99, 100), RAY, 0).unwrap();
        c.commit(&r, 1_000).unwrap();
        assert_eq!(c.state.last_update_time, Some(1_000));
        assert_eq!(c.state.last_approved_rate, r.rate);
        assert_eq!(c.state.integral_accumulator, r.integral_term);
        let snap = c.history().latest().unwrap();
        assert_eq!(snap.time, 1_000);
        assert_eq!(snap.rate, r.rate);
    }

    #[test]
    fn commit_refuses_to_move_time_backwards() {
        let mut c = per_second();
        let r = c.compute(RAY, RAY, 0).unwrap();
        c.commit(&r, 1_000).unwrap();
        assert!(matches!(
            c.commit(&r, 999),
            Err(ControllerError::InvalidElapsedTime { now: 999, last_update: 1_000 })
        ));
    }

    #[test]
    fn elapsed_before_first_update_is_zero() {
        let c = global();
        assert_eq!(c.elapsed_since_update(1_700_000_000).unwrap(), 0);
    }

    #[test]
    fn elapsed_after_update() {
        let mut c = global();
        let r = c.compute(RAY, RAY, 0).unwrap();
        c.commit(&r, 5_000).unwrap();
        assert_eq!(c.elapsed_since_update(8_600).unwrap(), 3_600);
        assert!(matches!(
            c.elapsed_since_update(4_999),
            Err(ControllerError::InvalidElapsedTime { .. })
        ));
    }

    #[test]
    fn history_keeps_last_five_commits() {
        let mut c = per_second();
        for t in 1..=7u64 {
            let r = c.compute(RAY, RAY, 0).unwrap();
            c.commit(&r, t * 100).unwrap();
        }
        let times: Vec<u64> = c.history().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![300, 400, 500, 600, 700]);
    }

    // --- gains ---

    #[test]
    fn gain_adjusted_terms_apply_wad_gains() {
        let mut c = global();
        c.set_gains(WAD / Fixed::new(2), WAD * Fixed::new(3)).unwrap();
        let (p, i) = c.gain_adjusted_terms(ray_frac(1, 10), RAY).unwrap();
        assert_eq!(p, ray_frac(1, 20));
        assert_eq!(i, RAY * Fixed::new(3));
    }

    #[test]
    fn gain_adjusted_terms_overflow() {
        let mut c = global();
        c.set_gains(Fixed::MAX, Fixed::ZERO).unwrap();
        assert_eq!(c.gain_adjusted_terms(RAY, Fixed::ZERO), Err(ControllerError::Overflow));
    }

    // --- setters ---

    #[test]
    fn setters_validate_domain() {
        let mut c = global();
        assert!(c.set_gains(-WAD, Fixed::ZERO).is_err());
        assert!(c.set_leak(Fixed::ZERO).is_err());
        assert!(c.set_leak(RAY + Fixed::ONE).is_err());
        assert!(c.set_deviation_bounds(Fixed::ONE, Fixed::ONE, RAY - Fixed::ONE).is_err());
        assert!(c.set_noise_barrier(RAY + Fixed::ONE).is_err());
        assert!(c.set_output_bounds(Fixed::ZERO, RAY).is_err());
        assert!(c.set_output_bounds(RAY, Fixed::ONE).is_err());
        assert!(c.set_min_rate_timeline(0).is_err());
        assert!(c.state().validate().is_ok());
    }

    #[test]
    fn setters_overwrite() {
        let mut c = global();
        c.set_leak(RAY).unwrap();
        c.set_noise_barrier(Fixed::ZERO).unwrap();
        c.set_output_bounds(Fixed::ONE, RAY * Fixed::new(2)).unwrap();
        c.set_min_rate_timeline(86_400).unwrap();
        assert_eq!(c.state.leak_per_second, RAY);
        assert_eq!(c.state.noise_barrier, Fixed::ZERO);
        assert_eq!(c.state.output_bounds.upper, RAY * Fixed::new(2));
        assert_eq!(c.state.min_rate_timeline, 86_400);
    }

    #[test]
    fn from_state_resumes_persisted_state() {
        let mut c = per_second();
        let r = c.compute(ray_frac(99, 100), RAY, 0).unwrap();
        c.commit(&r, 42).unwrap();
        let bytes = c.state().encode().unwrap();
        let restored = RateController::from_state(
            ControllerMode::PerSecond,
            ControllerState::decode(&bytes).unwrap(),
            Arc::new(Compounder::new()),
        )
        .unwrap();
        assert_eq!(restored.state().last_update_time, Some(42));
        assert_eq!(restored.state().integral_accumulator, r.integral_term);
    }

    proptest! {
        #[test]
        fn rate_within_output_bounds(
            market in 1_000_000_000_000_000_000_000_000i128..=1_000_000_000_000_000_000_000_000_000_000i128,
            reference in 1_000_000_000_000_000_000_000_000i128..=1_000_000_000_000_000_000_000_000_000_000i128,
            elapsed in 0u64..1_000_000,
            ki in 0i128..=1_000_000_000_000_000_000i128,
        ) {
            let mut c = per_second();
            c.set_gains(WAD, Fixed::new(ki)).unwrap();
            let r = c.preview(Fixed::new(market), Fixed::new(reference), elapsed).unwrap();
            prop_assert!(c.state.output_bounds.contains(r.rate));
        }

        #[test]
        fn zero_deviation_never_grows_accumulator(
            acc in -1_000_000_000_000_000_000_000_000_000_000i128..=1_000_000_000_000_000_000_000_000_000_000i128,
            elapsed in 1u64..100_000,
        ) {
            let mut c = per_second();
            c.state.integral_accumulator = Fixed::new(acc);
            let r = c.preview(RAY, RAY, elapsed).unwrap();
            prop_assert!(r.integral_term.abs() <= Fixed::new(acc).abs());
            if acc != 0 {
                prop_assert!(r.integral_term.abs() < Fixed::new(acc).abs());
            }
        }
    }
}
