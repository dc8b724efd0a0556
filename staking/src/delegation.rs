//! Delegation records and the entries waiting in the maturity queues.

use scloud_types::{AccountAddress, BlockHeight, Dec, Timestamp, TokenAmount, ValidatorAddress};
use serde::{Deserialize, Serialize};

/// Ownership of a fraction of one validator's pooled tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator: AccountAddress,
    pub validator: ValidatorAddress,
    pub shares: Dec,
}

/// Tokens leaving a validator, paid out once `completion_time` is reached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingEntry {
    pub delegator: AccountAddress,
    pub validator: ValidatorAddress,
    pub creation_height: BlockHeight,
    pub creation_time: Timestamp,
    pub completion_time: Timestamp,
    pub initial_balance: TokenAmount,
    /// What will be paid out; reduced by slashes for earlier infractions.
    pub balance: TokenAmount,
}

/// Stake moved from one validator to another, still slashable for the source
/// validator's past infractions until `completion_time`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedelegationEntry {
    pub delegator: AccountAddress,
    pub src_validator: ValidatorAddress,
    pub dst_validator: ValidatorAddress,
    pub creation_height: BlockHeight,
    pub creation_time: Timestamp,
    pub completion_time: Timestamp,
    pub initial_balance: TokenAmount,
    pub balance: TokenAmount,
    /// Shares minted on the destination validator.
    pub shares_dst: Dec,
}
