//! Scenario files: a controller configuration plus a list of price steps.
//!
//! ```toml
//! start_time = 1700000000
//! initial_reference = "1"
//! fee_receiver = "keeper"
//! treasury_balance = "100"
//!
//! [controller]
//! mode = "global"
//! noise_barrier = "5000000000000000000000000"
//!
//! [[steps]]
//! delay = 3600
//! market_price = "0.98"
//! ```
//!
//! Prices and balances in the top level and in steps are human decimals;
//! `[controller]` uses raw fixed-point integers like every other config.
//! Any key can be overridden from the environment, for example
//! `REDRATE_CONTROLLER__INTEGRAL_PERIOD_SIZE=60`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use redrate_core::config::ControllerConfig;
use redrate_core::fixed::parse_decimal;
use redrate_core::types::Fixed;
use serde::Deserialize;

/// Environment prefix for overrides.
pub const ENV_PREFIX: &str = "REDRATE";

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Simulated clock at the start of the run.
    #[serde(default = "default_start_time")]
    pub start_time: u64,
    /// Reference price at `start_time` (decimal).
    #[serde(default = "default_price")]
    pub initial_reference: String,
    /// Receiver of caller rewards; none are paid when absent.
    #[serde(default)]
    pub fee_receiver: Option<String>,
    /// Treasury funding in whole reward units (decimal).
    #[serde(default = "default_balance")]
    pub treasury_balance: String,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One observation: advance the clock, set the market price, try an update.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Seconds since the previous step.
    pub delay: u64,
    /// Market price (decimal).
    pub market_price: String,
}

fn default_start_time() -> u64 {
    1_700_000_000
}

fn default_price() -> String {
    "1".to_string()
}

fn default_balance() -> String {
    "0".to_string()
}

impl Scenario {
    /// Load a scenario from a TOML file with environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let scenario: Scenario = settings
            .try_deserialize()
            .with_context(|| format!("invalid scenario {}", path.display()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the controller parameters and every decimal field.
    pub fn validate(&self) -> Result<()> {
        self.controller.validate().context("invalid [controller] section")?;
        if self.initial_reference()? <= Fixed::ZERO {
            bail!("initial_reference must be positive");
        }
        if self.treasury_balance()? < Fixed::ZERO {
            bail!("treasury_balance must not be negative");
        }
        for (i, step) in self.steps.iter().enumerate() {
            step.market_price()
                .with_context(|| format!("step {i}: bad market_price"))?;
        }
        Ok(())
    }

    /// Reference price (RAY).
    pub fn initial_reference(&self) -> Result<Fixed> {
        Ok(parse_decimal(&self.initial_reference, 27)?)
    }

    /// Treasury balance (WAD).
    pub fn treasury_balance(&self) -> Result<Fixed> {
        Ok(parse_decimal(&self.treasury_balance, 18)?)
    }
}

impl Step {
    /// Market price (RAY).
    pub fn market_price(&self) -> Result<Fixed> {
        Ok(parse_decimal(&self.market_price, 27)?)
    }
}
