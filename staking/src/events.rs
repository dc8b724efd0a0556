//! Event kinds and attribute keys emitted by the staking ledger.

pub const CREATE_VALIDATOR: &str = "create_validator";
pub const EDIT_VALIDATOR: &str = "edit_validator";
pub const DELEGATE: &str = "delegate";
pub const UNBOND: &str = "unbond";
pub const REDELEGATE: &str = "redelegate";
pub const SLASH: &str = "slash";
pub const JAIL: &str = "jail";
pub const UNJAIL: &str = "unjail";
pub const COMPLETE_UNBONDING: &str = "complete_unbonding";
pub const COMPLETE_REDELEGATION: &str = "complete_redelegation";
pub const BOND_VALIDATOR: &str = "bond_validator";
pub const BEGIN_UNBONDING_VALIDATOR: &str = "begin_unbonding_validator";
pub const COMPLETE_UNBONDING_VALIDATOR: &str = "complete_unbonding_validator";

pub const ATTR_VALIDATOR: &str = "validator";
pub const ATTR_SRC_VALIDATOR: &str = "source_validator";
pub const ATTR_DST_VALIDATOR: &str = "destination_validator";
pub const ATTR_DELEGATOR: &str = "delegator";
pub const ATTR_AMOUNT: &str = "amount";
pub const ATTR_SHARES: &str = "shares";
pub const ATTR_COMPLETION_TIME: &str = "completion_time";
pub const ATTR_FRACTION: &str = "fraction";
pub const ATTR_HEIGHT: &str = "infraction_height";
pub const ATTR_BURNED: &str = "burned";
