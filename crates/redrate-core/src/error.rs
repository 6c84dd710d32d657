//! Error types for the redrate controller.
use thiserror::Error;

use crate::types::Fixed;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompoundError {
    #[error("arithmetic overflow")] Overflow,
    #[error("negative base: {0}")] NegativeBase(Fixed),
    #[error("invalid scale: {0}")] InvalidScale(Fixed),
    #[error("no per-second root for {target} within {iterations} iterations")] RootNotFound { target: Fixed, iterations: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("deviation rejected: rate {candidate} outside [{last_approved} - {lower}, {last_approved} + {upper}]")] DeviationRejected { candidate: Fixed, last_approved: Fixed, lower: Fixed, upper: Fixed },
    #[error("arithmetic overflow")] Overflow,
    #[error("invalid elapsed time: now {now} before last update {last_update}")] InvalidElapsedTime { now: u64, last_update: u64 },
    #[error("invalid price: market {market}, reference {reference}")] InvalidPrice { market: Fixed, reference: Fixed },
    #[error("compounding: {0}")] Compound(CompoundError),
}

impl From<CompoundError> for ControllerError {
    fn from(err: CompoundError) -> Self {
        match err {
            CompoundError::Overflow => Self::Overflow,
            other => Self::Compound(other),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("price feed unavailable: {0}")] FeedUnavailable(String),
    #[error("reference store: {0}")] Store(String),
    #[error("treasury: {0}")] Treasury(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    #[error("update period not elapsed: {elapsed}s < {required}s")] PeriodNotElapsed { elapsed: u64, required: u64 },
    #[error("proposed rate {proposed} differs from computed {computed} by more than {tolerance}")] ProposalMismatch { proposed: Fixed, computed: Fixed, tolerance: Fixed },
    #[error("proposed rate {proposed} outside output bounds [{lower}, {upper}]")] ProposalOutOfBounds { proposed: Fixed, lower: Fixed, upper: Fixed },
    #[error(transparent)] Controller(#[from] ControllerError),
    #[error(transparent)] Collaborator(#[from] CollaboratorError),
}

impl UpdateError {
    /// Whether retrying later (without changing inputs) can succeed.
    ///
    /// Timing rejections clear once the period elapses; deviation rejections
    /// widen the window, so a later attempt is more likely to pass.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PeriodNotElapsed { .. }
                | Self::Controller(ControllerError::DeviationRejected { .. })
                | Self::Collaborator(CollaboratorError::FeedUnavailable(_))
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {name}: {reason}")] InvalidParameter { name: &'static str, reason: String },
    #[error("cannot parse fixed-point value: {value:?}")] Parse { value: String },
    #[error("state encoding: {0}")] Encoding(String),
}

impl ConfigError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name, reason: reason.into() }
    }
}

#[derive(Error, Debug)]
pub enum RedrateError {
    #[error(transparent)] Compound(#[from] CompoundError),
    #[error(transparent)] Controller(#[from] ControllerError),
    #[error(transparent)] Update(#[from] UpdateError),
    #[error(transparent)] Collaborator(#[from] CollaboratorError),
    #[error(transparent)] Config(#[from] ConfigError),
}
