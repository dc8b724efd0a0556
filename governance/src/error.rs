use crate::proposal::ProposalStatus;
use scloud_types::{BalanceError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("invalid proposal content: {0}")]
    InvalidContent(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("proposal {0} not found")]
    ProposalNotFound(u64),

    #[error("proposal {id} is {status}, cannot {action}")]
    WrongStatus {
        id: u64,
        status: ProposalStatus,
        action: &'static str,
    },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("balance ledger: {0}")]
    Balance(#[from] BalanceError),

    #[error("inconsistent governance state: {0}")]
    Inconsistent(String),
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidContent(_) | Self::InvalidInput(_) | Self::Overflow => {
                ErrorKind::Validation
            }
            Self::ProposalNotFound(_) => ErrorKind::NotFound,
            Self::WrongStatus { .. } => ErrorKind::InvalidState,
            Self::Balance(e) => e.kind(),
            Self::Inconsistent(_) => ErrorKind::Fatal,
        }
    }
}
