//! Error types shared across crates, plus the error taxonomy every domain error maps onto.

use thiserror::Error;

/// Coarse classification of a failed operation.
///
/// Every crate-level error exposes `kind()` returning one of these, so callers can
/// react to the category without matching on every concrete variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or structurally invalid input, rejected before any state is touched.
    Validation,
    NotFound,
    InsufficientFunds,
    InsufficientShares,
    /// Operation illegal for the entity's current status.
    InvalidState,
    LimitExceeded,
    AlreadyExists,
    /// An external collaborator failed; the whole transaction is aborted.
    Infrastructure,
    /// Internal inconsistency; block processing must halt.
    Fatal,
}

/// Failure reported by a [`crate::BalanceLedger`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("insufficient funds in {account}: need {needed}, have {available}")]
    InsufficientFunds {
        account: String,
        needed: u128,
        available: u128,
    },

    #[error("balance ledger unavailable: {0}")]
    Unavailable(String),
}

impl BalanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::Unavailable(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Failure to parse or validate a primitive value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    #[error("invalid token amount: {0}")]
    InvalidAmount(String),

    #[error("invalid consensus public key: {0}")]
    InvalidPubKey(String),

    #[error("invalid parameter: {0}")]
    InvalidParam(String),
}
