//! Staking ledger for the scloud chain.
//!
//! Validators pool delegated tokens and issue proportional shares; slashing
//! burns tokens without touching shares. Unbonding and redelegation entries
//! wait in time-ordered queues that mature at end of block. The bonded set is
//! the top `max_validators` by stake, tie-broken by operator address.
//!
//! Governance reads stake only through [`StakingPowerProvider`].

pub mod delegation;
pub mod error;
pub mod events;
pub mod invariants;
pub mod ledger;
pub mod maturity;
pub mod power;
pub mod query;
pub mod queue;
pub mod slash;
pub mod validator;
pub mod validator_set;

pub use delegation::{Delegation, RedelegationEntry, UnbondingEntry};
pub use error::StakingError;
pub use ledger::{DelegationKey, NewValidator, StakingLedger};
pub use maturity::MaturityReport;
pub use power::StakingPowerProvider;
pub use query::Pool;
pub use queue::{QueueKey, TimeQueue};
pub use slash::SlashOutcome;
pub use validator::{
    Commission, CommissionRates, Description, Validator, ValidatorStatus,
    COMMISSION_UPDATE_INTERVAL_SECS,
};
pub use validator_set::{LastPower, ValidatorUpdate};
