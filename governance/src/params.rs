//! Parameters governable through ParameterChange proposals.
//!
//! A change names a subspace and a key; the value travels as a string and is
//! parsed and range-checked at submission. Passed changes are applied by the
//! application to a copy of the owning component's params, which is validated
//! as a whole before it replaces the old one.

use crate::error::GovernanceError;
use scloud_types::{Dec, GovParams, StakingParams, TokenAmount};
use serde::{Deserialize, Serialize};

pub const STAKING_SUBSPACE: &str = "staking";
pub const GOV_SUBSPACE: &str = "gov";

/// Every parameter a proposal may change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GovernableParam {
    // Staking
    UnbondingDurationSecs,
    MaxValidators,
    MaxEntries,
    RedelegationLookbackSecs,
    MinSelfDelegation,

    // Governance (self-governing)
    MinDeposit,
    MaxDepositPeriodSecs,
    VotingPeriodSecs,
    Quorum,
    Threshold,
    VetoThreshold,
}

/// A parsed parameter value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Secs(u64),
    Count(u32),
    Amount(TokenAmount),
    Ratio(Dec),
}

impl GovernableParam {
    pub const ALL: [GovernableParam; 11] = [
        Self::UnbondingDurationSecs,
        Self::MaxValidators,
        Self::MaxEntries,
        Self::RedelegationLookbackSecs,
        Self::MinSelfDelegation,
        Self::MinDeposit,
        Self::MaxDepositPeriodSecs,
        Self::VotingPeriodSecs,
        Self::Quorum,
        Self::Threshold,
        Self::VetoThreshold,
    ];

    /// Key used in ParameterChange proposals.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UnbondingDurationSecs => "unbonding_duration_secs",
            Self::MaxValidators => "max_validators",
            Self::MaxEntries => "max_entries",
            Self::RedelegationLookbackSecs => "redelegation_lookback_secs",
            Self::MinSelfDelegation => "min_self_delegation",
            Self::MinDeposit => "min_deposit",
            Self::MaxDepositPeriodSecs => "max_deposit_period_secs",
            Self::VotingPeriodSecs => "voting_period_secs",
            Self::Quorum => "quorum",
            Self::Threshold => "threshold",
            Self::VetoThreshold => "veto_threshold",
        }
    }

    pub fn subspace(&self) -> &'static str {
        match self {
            Self::UnbondingDurationSecs
            | Self::MaxValidators
            | Self::MaxEntries
            | Self::RedelegationLookbackSecs
            | Self::MinSelfDelegation => STAKING_SUBSPACE,
            _ => GOV_SUBSPACE,
        }
    }

    pub fn lookup(subspace: &str, key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.subspace() == subspace && p.name() == key)
    }

    /// Parse and range-check a raw value for this parameter.
    pub fn parse(&self, raw: &str) -> Result<ParamValue, GovernanceError> {
        let bad = |why: &str| {
            GovernanceError::InvalidContent(format!("{} = {raw:?}: {why}", self.name()))
        };
        let raw = raw.trim();
        match self {
            Self::UnbondingDurationSecs
            | Self::RedelegationLookbackSecs
            | Self::MaxDepositPeriodSecs
            | Self::VotingPeriodSecs => {
                let secs: u64 = raw.parse().map_err(|_| bad("expected seconds"))?;
                if secs == 0 {
                    return Err(bad("must be positive"));
                }
                Ok(ParamValue::Secs(secs))
            }
            Self::MaxValidators | Self::MaxEntries => {
                let n: u32 = raw.parse().map_err(|_| bad("expected an integer"))?;
                if n == 0 {
                    return Err(bad("must be positive"));
                }
                Ok(ParamValue::Count(n))
            }
            Self::MinSelfDelegation | Self::MinDeposit => {
                let n: u128 = raw.parse().map_err(|_| bad("expected a token amount"))?;
                Ok(ParamValue::Amount(TokenAmount::new(n)))
            }
            Self::Quorum | Self::Threshold | Self::VetoThreshold => {
                let d: Dec = raw.parse().map_err(|_| bad("expected a decimal"))?;
                if d > Dec::ONE {
                    return Err(bad("must be within [0, 1]"));
                }
                Ok(ParamValue::Ratio(d))
            }
        }
    }
}

/// One `(subspace, key, value)` change carried by a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamChange {
    pub subspace: String,
    pub key: String,
    pub value: String,
}

impl ParamChange {
    pub fn new(subspace: &str, key: &str, value: impl ToString) -> Self {
        Self {
            subspace: subspace.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn param(&self) -> Result<GovernableParam, GovernanceError> {
        GovernableParam::lookup(&self.subspace, &self.key).ok_or_else(|| {
            GovernanceError::InvalidContent(format!(
                "unsupported parameter {}/{}",
                self.subspace, self.key
            ))
        })
    }

    pub fn validate(&self) -> Result<(), GovernanceError> {
        self.param()?.parse(&self.value).map(|_| ())
    }
}

/// Apply the staking-subspace changes to a copy of `current`.
pub fn apply_staking_changes(
    changes: &[ParamChange],
    current: &StakingParams,
) -> Result<StakingParams, GovernanceError> {
    let mut next = current.clone();
    for change in changes.iter().filter(|c| c.subspace == STAKING_SUBSPACE) {
        let param = change.param()?;
        match (param, param.parse(&change.value)?) {
            (GovernableParam::UnbondingDurationSecs, ParamValue::Secs(v)) => {
                next.unbonding_duration_secs = v
            }
            (GovernableParam::RedelegationLookbackSecs, ParamValue::Secs(v)) => {
                next.redelegation_lookback_secs = v
            }
            (GovernableParam::MaxValidators, ParamValue::Count(v)) => next.max_validators = v,
            (GovernableParam::MaxEntries, ParamValue::Count(v)) => next.max_entries = v,
            (GovernableParam::MinSelfDelegation, ParamValue::Amount(v)) => {
                next.min_self_delegation = v
            }
            (param, _) => {
                return Err(GovernanceError::InvalidContent(format!(
                    "{} is not a staking parameter",
                    param.name()
                )))
            }
        }
    }
    next.validate()
        .map_err(|e| GovernanceError::InvalidContent(e.to_string()))?;
    Ok(next)
}

/// Apply the governance-subspace changes to a copy of `current`.
pub fn apply_gov_changes(
    changes: &[ParamChange],
    current: &GovParams,
) -> Result<GovParams, GovernanceError> {
    let mut next = current.clone();
    for change in changes.iter().filter(|c| c.subspace == GOV_SUBSPACE) {
        let param = change.param()?;
        match (param, param.parse(&change.value)?) {
            (GovernableParam::MinDeposit, ParamValue::Amount(v)) => next.min_deposit = v,
            (GovernableParam::MaxDepositPeriodSecs, ParamValue::Secs(v)) => {
                next.max_deposit_period_secs = v
            }
            (GovernableParam::VotingPeriodSecs, ParamValue::Secs(v)) => next.voting_period_secs = v,
            (GovernableParam::Quorum, ParamValue::Ratio(v)) => next.quorum = v,
            (GovernableParam::Threshold, ParamValue::Ratio(v)) => next.threshold = v,
            (GovernableParam::VetoThreshold, ParamValue::Ratio(v)) => next.veto_threshold = v,
            (param, _) => {
                return Err(GovernanceError::InvalidContent(format!(
                    "{} is not a governance parameter",
                    param.name()
                )))
            }
        }
    }
    next.validate()
        .map_err(|e| GovernanceError::InvalidContent(e.to_string()))?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_requires_matching_subspace() {
        assert_eq!(
            GovernableParam::lookup("staking", "max_validators"),
            Some(GovernableParam::MaxValidators)
        );
        assert_eq!(GovernableParam::lookup("gov", "max_validators"), None);
        assert_eq!(GovernableParam::lookup("staking", "bogus"), None);
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = GovernableParam::ALL.iter().map(|p| p.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), GovernableParam::ALL.len());
    }

    #[test]
    fn values_are_range_checked() {
        assert!(ParamChange::new("gov", "quorum", "0.4").validate().is_ok());
        assert!(ParamChange::new("gov", "quorum", "1.5").validate().is_err());
        assert!(ParamChange::new("gov", "quorum", "abc").validate().is_err());
        assert!(ParamChange::new("staking", "max_entries", "0").validate().is_err());
        assert!(ParamChange::new("staking", "unbonding_duration_secs", "-1")
            .validate()
            .is_err());
    }

    #[test]
    fn staking_changes_apply_to_copy() {
        let current = StakingParams::default();
        let next = apply_staking_changes(
            &[
                ParamChange::new("staking", "max_validators", 50),
                ParamChange::new("gov", "quorum", "0.5"),
            ],
            &current,
        )
        .unwrap();
        assert_eq!(next.max_validators, 50);
        assert_eq!(current.max_validators, 100);
    }

    #[test]
    fn gov_changes_apply_to_copy() {
        let next = apply_gov_changes(
            &[ParamChange::new("gov", "min_deposit", 42)],
            &GovParams::default(),
        )
        .unwrap();
        assert_eq!(next.min_deposit, TokenAmount::new(42));
    }
}
