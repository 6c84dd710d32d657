//! In-memory collaborators for simulation and tests.
//!
//! Production deployments plug their own [`PriceFeed`],
//! [`ReferencePriceStore`] and [`RewardTreasury`] into the gate. These
//! versions keep everything in process memory behind `parking_lot` locks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use redrate_compound::Compounder;
use redrate_core::constants::RAY;
use redrate_core::error::CollaboratorError;
use redrate_core::traits::{PriceFeed, RateCompounder, ReferencePriceStore, RewardTreasury};
use redrate_core::types::Fixed;

/// A price feed whose value is set by hand.
#[derive(Debug, Default)]
pub struct ManualPriceFeed {
    price: RwLock<Option<Fixed>>,
}

impl ManualPriceFeed {
    pub fn new(price: Fixed) -> Self {
        Self { price: RwLock::new(Some(price)) }
    }

    pub fn set_price(&self, price: Fixed) {
        *self.price.write() = Some(price);
    }

    /// Make the feed unavailable until the next [`set_price`](Self::set_price).
    pub fn clear(&self) {
        *self.price.write() = None;
    }
}

impl PriceFeed for ManualPriceFeed {
    fn market_price(&self) -> Result<Fixed, CollaboratorError> {
        (*self.price.read()).ok_or_else(|| CollaboratorError::FeedUnavailable("no price set".into()))
    }
}

#[derive(Debug, Clone, Copy)]
struct Drift {
    price: Fixed,
    rate: Fixed,
    updated_at: u64,
}

/// Reference price that drifts at the installed per-second rate:
/// `price(now) = price(t0) * rate^(now - t0)`.
pub struct CompoundingReferenceStore {
    drift: Mutex<Drift>,
    compounder: Arc<dyn RateCompounder>,
}

impl fmt::Debug for CompoundingReferenceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundingReferenceStore")
            .field("drift", &*self.drift.lock())
            .finish_non_exhaustive()
    }
}

impl CompoundingReferenceStore {
    /// Start at `price` with the identity rate.
    pub fn new(price: Fixed, now: u64) -> Self {
        Self::with_compounder(price, now, Arc::new(Compounder::new()))
    }

    pub fn with_compounder(price: Fixed, now: u64, compounder: Arc<dyn RateCompounder>) -> Self {
        Self {
            drift: Mutex::new(Drift { price, rate: RAY, updated_at: now }),
            compounder,
        }
    }

    /// The per-second rate currently applied.
    pub fn current_rate(&self) -> Fixed {
        self.drift.lock().rate
    }

    fn price_at(&self, drift: &Drift, now: u64) -> Result<Fixed, CollaboratorError> {
        let elapsed = now.checked_sub(drift.updated_at).ok_or_else(|| {
            CollaboratorError::Store(format!(
                "time {now} before last rate change at {}",
                drift.updated_at
            ))
        })?;
        self.compounder
            .compound_price(drift.price, drift.rate, elapsed)
            .map_err(|e| CollaboratorError::Store(e.to_string()))
    }
}

impl ReferencePriceStore for CompoundingReferenceStore {
    fn reference_price(&self, now: u64) -> Result<Fixed, CollaboratorError> {
        let drift = *self.drift.lock();
        self.price_at(&drift, now)
    }

    fn apply_rate(&self, rate: Fixed, now: u64) -> Result<(), CollaboratorError> {
        let mut drift = self.drift.lock();
        let price = self.price_at(&drift, now)?;
        *drift = Drift { price, rate, updated_at: now };
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Ledger {
    balance: Fixed,
    paid: HashMap<String, Fixed>,
}

/// Treasury with a finite balance; pays what it can when short.
#[derive(Debug, Default)]
pub struct InMemoryTreasury {
    ledger: Mutex<Ledger>,
}

impl InMemoryTreasury {
    pub fn new(balance: Fixed) -> Self {
        Self {
            ledger: Mutex::new(Ledger { balance, paid: HashMap::new() }),
        }
    }

    pub fn balance(&self) -> Fixed {
        self.ledger.lock().balance
    }

    /// Total paid to `receiver` so far.
    pub fn paid_to(&self, receiver: &str) -> Fixed {
        self.ledger.lock().paid.get(receiver).copied().unwrap_or(Fixed::ZERO)
    }
}

impl RewardTreasury for InMemoryTreasury {
    fn pay(&self, receiver: &str, amount: Fixed) -> Result<Fixed, CollaboratorError> {
        if amount < Fixed::ZERO {
            return Err(CollaboratorError::Treasury(format!("negative amount {amount}")));
        }
        let mut ledger = self.ledger.lock();
        let paid = amount.min(ledger.balance);
        ledger.balance -= paid;
        let total = ledger.paid.entry(receiver.to_string()).or_insert(Fixed::ZERO);
        *total += paid;
        Ok(paid)
    }
}
