//! Drives an [`UpdateGate`] through a scenario's steps.

use std::sync::Arc;

use anyhow::Result;
use redrate_controller::{
    CompoundingReferenceStore, InMemoryTreasury, ManualPriceFeed, UpdateGate, UpdateRequest,
};
use redrate_core::fixed::format_decimal;
use redrate_core::traits::ReferencePriceStore;
use serde::Serialize;
use tracing::debug;

use crate::scenario::Scenario;

/// One row of simulator output. Fixed-point values are rendered as decimals.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub time: u64,
    pub market: String,
    pub reference: String,
    /// `"updated"` or the rejection reason.
    pub status: String,
    pub rate: String,
    pub timeline: Option<u64>,
    pub proportional: String,
    pub integral: String,
    pub weighted_proportional: String,
    pub weighted_integral: String,
    pub reward: String,
}

/// Run every step and report the outcome of each.
///
/// Rejected updates are reported, not returned as errors; only collaborator
/// setup failures abort the run.
pub fn run(scenario: &Scenario) -> Result<Vec<StepReport>> {
    let start = scenario.start_time;
    let feed = Arc::new(ManualPriceFeed::new(scenario.initial_reference()?));
    let store = Arc::new(CompoundingReferenceStore::new(scenario.initial_reference()?, start));
    let treasury = Arc::new(InMemoryTreasury::new(scenario.treasury_balance()?));
    let gate = UpdateGate::new(&scenario.controller, feed.clone(), store.clone())?
        .with_treasury(treasury);

    let mut now = start;
    let mut rows = Vec::with_capacity(scenario.steps.len());
    for (i, step) in scenario.steps.iter().enumerate() {
        now = now.saturating_add(step.delay);
        let market = step.market_price()?;
        feed.set_price(market);
        let reference = store.reference_price(now)?;

        let request = UpdateRequest {
            proposed_rate: None,
            fee_receiver: scenario.fee_receiver.clone(),
        };
        let row = match gate.request_update_with(now, request) {
            Ok(out) => {
                let (wp, wi) = gate.gain_adjusted_terms(out.proportional_term, out.integral_term)?;
                StepReport {
                    step: i,
                    time: now,
                    market: format_decimal(market, 27),
                    reference: format_decimal(reference, 27),
                    status: "updated".to_string(),
                    rate: format_decimal(out.rate, 27),
                    timeline: out.timeline,
                    proportional: format_decimal(out.proportional_term, 27),
                    integral: format_decimal(out.integral_term, 27),
                    weighted_proportional: format_decimal(wp, 27),
                    weighted_integral: format_decimal(wi, 27),
                    reward: format_decimal(out.reward_paid, 18),
                }
            }
            Err(e) => {
                debug!(step = i, "sim: update rejected: {e}");
                let state = gate.state();
                StepReport {
                    step: i,
                    time: now,
                    market: format_decimal(market, 27),
                    reference: format_decimal(reference, 27),
                    status: e.to_string(),
                    rate: format_decimal(state.last_approved_rate, 27),
                    timeline: None,
                    proportional: "-".to_string(),
                    integral: format_decimal(state.integral_accumulator, 27),
                    weighted_proportional: "-".to_string(),
                    weighted_integral: "-".to_string(),
                    reward: "0".to_string(),
                }
            }
        };
        rows.push(row);
    }
    Ok(rows)
}
