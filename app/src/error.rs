use scloud_governance::GovernanceError;
use scloud_staking::StakingError;
use scloud_types::{BalanceError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("staking: {0}")]
    Staking(#[from] StakingError),

    #[error("governance: {0}")]
    Governance(#[from] GovernanceError),

    #[error("balance ledger: {0}")]
    Balance(#[from] BalanceError),

    #[error("invalid genesis: {0}")]
    Genesis(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging init failed: {0}")]
    Logging(String),

    #[error("state encoding failed: {0}")]
    Encoding(String),

    /// Block processing must halt.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Staking(e) => e.kind(),
            Self::Governance(e) => e.kind(),
            Self::Balance(e) => e.kind(),
            Self::Genesis(_) | Self::Config(_) => ErrorKind::Validation,
            Self::Logging(_) => ErrorKind::Infrastructure,
            Self::Encoding(_) | Self::Fatal(_) => ErrorKind::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}
