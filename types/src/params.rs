//! Staking and governance parameters.
//!
//! Everything except `power_reduction` and the redelegation power policy can
//! be changed by a passed ParameterChange proposal.

use crate::address::AccountAddress;
use crate::amount::TokenAmount;
use crate::dec::Dec;
use crate::error::ParseError;
use serde::{Deserialize, Serialize};

const DAY_SECS: u64 = 24 * 3600;

/// Which validator an in-flight redelegation counts toward until it matures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedelegationPowerPolicy {
    /// Destination gains power immediately.
    #[default]
    Destination,
    /// Source keeps the power until the redelegation completes.
    Source,
}

/// Parameters of the staking ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakingParams {
    /// Seconds between an unbonding request and the payout.
    pub unbonding_duration_secs: u64,

    /// Size of the bonded validator set.
    pub max_validators: u32,

    /// Maximum outstanding unbonding (or redelegation) entries per pair.
    pub max_entries: u32,

    /// Window during which an active redelegation to the same destination
    /// blocks another one.
    pub redelegation_lookback_secs: u64,

    /// Minimum self-delegation accepted by CreateValidator.
    pub min_self_delegation: TokenAmount,

    /// Tokens per unit of consensus power.
    pub power_reduction: u64,

    pub redelegation_power_policy: RedelegationPowerPolicy,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            unbonding_duration_secs: 21 * DAY_SECS, // 3 weeks
            max_validators: 100,
            max_entries: 7,
            redelegation_lookback_secs: 21 * DAY_SECS,
            min_self_delegation: TokenAmount::new(1),
            power_reduction: 1_000_000,
            redelegation_power_policy: RedelegationPowerPolicy::Destination,
        }
    }
}

impl StakingParams {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.unbonding_duration_secs == 0 {
            return Err(ParseError::InvalidParam(
                "unbonding_duration_secs must be positive".into(),
            ));
        }
        if self.max_validators == 0 {
            return Err(ParseError::InvalidParam("max_validators must be positive".into()));
        }
        if self.max_entries == 0 {
            return Err(ParseError::InvalidParam("max_entries must be positive".into()));
        }
        if self.power_reduction == 0 {
            return Err(ParseError::InvalidParam("power_reduction must be positive".into()));
        }
        Ok(())
    }
}

/// Parameters of the governance engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovParams {
    /// Total deposit that moves a proposal into its voting period.
    pub min_deposit: TokenAmount,

    /// Seconds a proposal may wait for its minimum deposit.
    pub max_deposit_period_secs: u64,

    /// Length of the voting period in seconds.
    pub voting_period_secs: u64,

    /// Minimum fraction of bonded supply that must vote.
    pub quorum: Dec,

    /// Minimum yes / (yes + no) to pass.
    pub threshold: Dec,

    /// Veto / (yes + no + veto) at which a proposal is rejected outright.
    pub veto_threshold: Dec,
}

impl Default for GovParams {
    fn default() -> Self {
        Self {
            min_deposit: TokenAmount::new(10_000_000),
            max_deposit_period_secs: 2 * DAY_SECS,
            voting_period_secs: 2 * DAY_SECS,
            quorum: Dec::from_raw(334_000_000_000_000_000),         // 0.334
            threshold: Dec::from_raw(500_000_000_000_000_000),      // 0.5
            veto_threshold: Dec::from_raw(334_000_000_000_000_000), // 0.334
        }
    }
}

impl GovParams {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.max_deposit_period_secs == 0 || self.voting_period_secs == 0 {
            return Err(ParseError::InvalidParam("governance periods must be positive".into()));
        }
        for (name, value) in [
            ("quorum", self.quorum),
            ("threshold", self.threshold),
            ("veto_threshold", self.veto_threshold),
        ] {
            if value > Dec::ONE {
                return Err(ParseError::InvalidParam(format!("{name} must be within [0, 1]")));
            }
        }
        Ok(())
    }
}

/// Well-known accounts holding tokens on behalf of the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleAccounts {
    /// Holds every bonded and unbonding token.
    pub staking_pool: AccountAddress,
    /// Holds proposal deposits until refund or burn.
    pub governance_escrow: AccountAddress,
    /// Receives slashed tokens and burned deposits.
    pub burn_sink: AccountAddress,
    /// Funds CommunityPoolSpend proposals.
    pub community_pool: AccountAddress,
}

impl Default for ModuleAccounts {
    fn default() -> Self {
        Self {
            staking_pool: AccountAddress::new("scloud1stakingpool"),
            governance_escrow: AccountAddress::new("scloud1govescrow"),
            burn_sink: AccountAddress::new("scloud1burnsink"),
            community_pool: AccountAddress::new("scloud1communitypool"),
        }
    }
}
