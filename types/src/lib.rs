//! Fundamental types for the scloud ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, token amounts, fixed-point decimals, block time, parameters, events,
//! and the traits through which the ledger talks to its external collaborators.

pub mod address;
pub mod amount;
pub mod dec;
pub mod error;
pub mod event;
pub mod keys;
pub mod ledger;
pub mod params;
pub mod power;
pub mod time;

pub use address::{AccountAddress, ValidatorAddress};
pub use amount::TokenAmount;
pub use dec::Dec;
pub use error::{BalanceError, ErrorKind, ParseError};
pub use event::{Event, EventSink};
pub use keys::ConsensusPubKey;
pub use ledger::BalanceLedger;
pub use params::{GovParams, ModuleAccounts, RedelegationPowerPolicy, StakingParams};
pub use power::VotingPowerProvider;
pub use time::{BlockClock, BlockHeight, BlockInfo, Timestamp};
