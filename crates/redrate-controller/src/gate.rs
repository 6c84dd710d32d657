//! Update gate: decides when a new rate may be committed.
//!
//! [`UpdateGate`] owns the [`RateController`] and the gate policy behind a
//! single `parking_lot` mutex. One update (timing check, price reads,
//! compute, deviation check, store push, commit, reward) runs under one lock
//! acquisition, so concurrent callers and parameter setters are serialized
//! and every call either fully commits or leaves state as it was (apart from
//! the window growth a deviation rejection is defined to cause).

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use redrate_core::config::{ControllerConfig, RewardSchedule};
use redrate_core::error::{ConfigError, ControllerError, UpdateError};
use redrate_core::state::ControllerState;
use redrate_core::traits::{PriceFeed, ReferencePriceStore, RewardTreasury};
use redrate_core::types::{ControllerMode, Fixed, Snapshot, UpdateOutcome};
use tracing::{debug, info, warn};

use crate::controller::RateController;
use crate::reward;

/// Timing, proposal and incentive parameters enforced by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePolicy {
    /// Minimum seconds between committed updates.
    pub integral_period_size: u64,
    /// Maximum distance (RAY units) between a proposed and a computed rate.
    pub proposal_tolerance: Fixed,
    pub reward: RewardSchedule,
}

impl GatePolicy {
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            integral_period_size: config.integral_period_size,
            proposal_tolerance: config.proposal_tolerance,
            reward: config.reward,
        }
    }
}

/// Optional inputs to an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Precomputed per-second rate the caller expects to be committed.
    pub proposed_rate: Option<Fixed>,
    /// Account that receives the caller reward. No reward is paid without one.
    pub fee_receiver: Option<String>,
}

struct Inner {
    controller: RateController,
    policy: GatePolicy,
}

/// Serializes updates and parameter changes for one controller.
pub struct UpdateGate {
    inner: Mutex<Inner>,
    feed: Arc<dyn PriceFeed>,
    store: Arc<dyn ReferencePriceStore>,
    treasury: Option<Arc<dyn RewardTreasury>>,
}

impl fmt::Debug for UpdateGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("UpdateGate")
            .field("controller", &inner.controller)
            .field("policy", &inner.policy)
            .finish_non_exhaustive()
    }
}

impl UpdateGate {
    /// Build a gate and a fresh controller from validated configuration.
    pub fn new(
        config: &ControllerConfig,
        feed: Arc<dyn PriceFeed>,
        store: Arc<dyn ReferencePriceStore>,
    ) -> Result<Self, ConfigError> {
        let controller = RateController::new(config)?;
        Self::from_parts(controller, GatePolicy::from_config(config), feed, store)
    }

    /// Build a gate around an existing controller (for example one resumed
    /// from persisted state).
    pub fn from_parts(
        controller: RateController,
        policy: GatePolicy,
        feed: Arc<dyn PriceFeed>,
        store: Arc<dyn ReferencePriceStore>,
    ) -> Result<Self, ConfigError> {
        validate_policy(&policy)?;
        Ok(Self {
            inner: Mutex::new(Inner { controller, policy }),
            feed,
            store,
            treasury: None,
        })
    }

    /// Pay caller rewards from `treasury`.
    pub fn with_treasury(mut self, treasury: Arc<dyn RewardTreasury>) -> Self {
        self.treasury = Some(treasury);
        self
    }

    /// Attempt an update at `now` with the controller's own rate.
    pub fn request_update(&self, now: u64) -> Result<UpdateOutcome, UpdateError> {
        self.request_update_with(now, UpdateRequest::default())
    }

    /// Attempt an update at `now`.
    ///
    /// A proposed rate must be within the policy's tolerance of the computed
    /// rate and inside the output bounds; it is then committed in place of
    /// the computed one.
    pub fn request_update_with(
        &self,
        now: u64,
        request: UpdateRequest,
    ) -> Result<UpdateOutcome, UpdateError> {
        let mut inner = self.inner.lock();
        let Inner { controller, policy } = &mut *inner;

        let last_update = controller.state().last_update_time;
        let elapsed = controller.elapsed_since_update(now)?;
        if controller.state().has_updated() && elapsed < policy.integral_period_size {
            debug!(elapsed, required = policy.integral_period_size, "gate: period not elapsed");
            return Err(UpdateError::PeriodNotElapsed {
                elapsed,
                required: policy.integral_period_size,
            });
        }

        let market = self.feed.market_price()?;
        let reference = self.store.reference_price(now)?;
        let mut result = controller.preview(market, reference, elapsed)?;

        if let Some(proposed) = request.proposed_rate {
            let distance = proposed
                .checked_sub(result.rate)
                .and_then(|d| d.checked_abs())
                .ok_or(ControllerError::Overflow)?;
            if distance > policy.proposal_tolerance {
                debug!(%proposed, computed = %result.rate, "gate: proposal rejected");
                return Err(UpdateError::ProposalMismatch {
                    proposed,
                    computed: result.rate,
                    tolerance: policy.proposal_tolerance,
                });
            }
            let bounds = controller.state().output_bounds;
            if !bounds.contains(proposed) {
                debug!(%proposed, lower = %bounds.lower, upper = %bounds.upper, "gate: proposal out of bounds");
                return Err(UpdateError::ProposalOutOfBounds {
                    proposed,
                    lower: bounds.lower,
                    upper: bounds.upper,
                });
            }
            result.rate = proposed;
        }

        if let Err(e) = controller.admit(result.rate) {
            warn!(rate = %result.rate, "gate: update refused: {e}");
            return Err(e.into());
        }

        self.store.apply_rate(result.rate, now)?;
        controller.commit(&result, now)?;

        let due = reward::due_time(last_update, policy.integral_period_size);
        let owed = reward::caller_reward(&policy.reward, controller.compounder(), due, now);
        let reward_paid = self.pay_reward(request.fee_receiver.as_deref(), owed);

        info!(
            now,
            rate = %result.rate,
            timeline = ?result.timeline,
            market = %market,
            reference = %reference,
            reward = %reward_paid,
            "gate: rate updated"
        );

        Ok(UpdateOutcome {
            updated_at: now,
            rate: result.rate,
            timeline: result.timeline,
            proportional_term: result.proportional_term,
            integral_term: result.integral_term,
            reward_paid,
        })
    }

    /// Best-effort payment; failures are logged and pay nothing.
    fn pay_reward(&self, receiver: Option<&str>, owed: Fixed) -> Fixed {
        let (Some(receiver), Some(treasury)) = (receiver, self.treasury.as_ref()) else {
            return Fixed::ZERO;
        };
        if owed <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        match treasury.pay(receiver, owed) {
            Ok(paid) => {
                if paid < owed {
                    warn!(%owed, %paid, receiver, "gate: reward paid partially");
                }
                paid.clamp(Fixed::ZERO, owed)
            }
            Err(e) => {
                warn!(%owed, receiver, "gate: reward not paid: {e}");
                Fixed::ZERO
            }
        }
    }

    // --- read access ---

    pub fn mode(&self) -> ControllerMode {
        self.inner.lock().controller.mode()
    }

    /// Copy of the controller state.
    pub fn state(&self) -> ControllerState {
        self.inner.lock().controller.state().clone()
    }

    pub fn policy(&self) -> GatePolicy {
        self.inner.lock().policy.clone()
    }

    /// Recent snapshots, oldest first.
    pub fn history(&self) -> Vec<Snapshot> {
        self.inner.lock().controller.history().iter().copied().collect()
    }

    pub fn gain_adjusted_terms(&self, p: Fixed, i: Fixed) -> Result<(Fixed, Fixed), ControllerError> {
        self.inner.lock().controller.gain_adjusted_terms(p, i)
    }

    /// Encode the controller state for storage.
    pub fn persist(&self) -> Result<Vec<u8>, ConfigError> {
        self.inner.lock().controller.state().encode()
    }

    // --- setters ---

    pub fn set_gains(&self, proportional: Fixed, integral: Fixed) -> Result<(), ConfigError> {
        self.inner.lock().controller.set_gains(proportional, integral)
    }

    pub fn set_leak(&self, leak_per_second: Fixed) -> Result<(), ConfigError> {
        self.inner.lock().controller.set_leak(leak_per_second)
    }

    pub fn set_deviation_bounds(
        &self,
        lower: Fixed,
        upper: Fixed,
        growth_factor: Fixed,
    ) -> Result<(), ConfigError> {
        self.inner.lock().controller.set_deviation_bounds(lower, upper, growth_factor)
    }

    pub fn set_noise_barrier(&self, barrier: Fixed) -> Result<(), ConfigError> {
        self.inner.lock().controller.set_noise_barrier(barrier)
    }

    pub fn set_output_bounds(&self, lower: Fixed, upper: Fixed) -> Result<(), ConfigError> {
        self.inner.lock().controller.set_output_bounds(lower, upper)
    }

    pub fn set_min_rate_timeline(&self, timeline: u64) -> Result<(), ConfigError> {
        self.inner.lock().controller.set_min_rate_timeline(timeline)
    }

    pub fn set_integral_period_size(&self, seconds: u64) -> Result<(), ConfigError> {
        let mut inner = self.inner.lock();
        let policy = GatePolicy { integral_period_size: seconds, ..inner.policy.clone() };
        validate_policy(&policy)?;
        inner.policy = policy;
        Ok(())
    }

    pub fn set_proposal_tolerance(&self, tolerance: Fixed) -> Result<(), ConfigError> {
        let mut inner = self.inner.lock();
        let policy = GatePolicy { proposal_tolerance: tolerance, ..inner.policy.clone() };
        validate_policy(&policy)?;
        inner.policy = policy;
        Ok(())
    }

    pub fn set_reward_schedule(&self, schedule: RewardSchedule) -> Result<(), ConfigError> {
        schedule.validate()?;
        self.inner.lock().policy.reward = schedule;
        Ok(())
    }
}

fn validate_policy(policy: &GatePolicy) -> Result<(), ConfigError> {
    if policy.proposal_tolerance < Fixed::ZERO {
        return Err(ConfigError::InvalidParameter {
            name: "proposal_tolerance",
            reason: "must not be negative".into(),
        });
    }
    policy.reward.validate()
}
