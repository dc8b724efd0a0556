use scloud_types::{BalanceError, Dec, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StakingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("validator {0} not found")]
    ValidatorNotFound(String),

    #[error("no delegation from {delegator} to {validator}")]
    DelegationNotFound { delegator: String, validator: String },

    #[error("validator {0} already exists")]
    ValidatorExists(String),

    #[error("consensus key {0} already registered")]
    ConsensusKeyExists(String),

    #[error("self delegation {amount} below minimum {minimum}")]
    BelowMinimum { amount: u128, minimum: u128 },

    #[error("insufficient shares: have {have}, need {need}")]
    InsufficientShares { have: Dec, need: Dec },

    #[error("too many outstanding entries (max {max})")]
    TooManyEntries { max: u32 },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("balance ledger: {0}")]
    Balance(#[from] BalanceError),

    #[error("inconsistent staking state: {0}")]
    Inconsistent(String),
}

impl StakingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::BelowMinimum { .. } | Self::Overflow => {
                ErrorKind::Validation
            }
            Self::ValidatorNotFound(_) | Self::DelegationNotFound { .. } => ErrorKind::NotFound,
            Self::ValidatorExists(_) | Self::ConsensusKeyExists(_) => ErrorKind::AlreadyExists,
            Self::InsufficientShares { .. } => ErrorKind::InsufficientShares,
            Self::TooManyEntries { .. } => ErrorKind::LimitExceeded,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Balance(e) => e.kind(),
            Self::Inconsistent(_) => ErrorKind::Fatal,
        }
    }
}
