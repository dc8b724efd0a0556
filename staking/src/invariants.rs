//! Internal consistency checks over the staking indexes. Tests run them after
//! every operation.

use crate::error::StakingError;
use crate::ledger::StakingLedger;
use crate::validator::ValidatorStatus;
use scloud_types::{Dec, ValidatorAddress};
use std::collections::BTreeMap;

impl StakingLedger {
    pub fn check_invariants(&self) -> Result<(), StakingError> {
        let mut shares: BTreeMap<&ValidatorAddress, Dec> = BTreeMap::new();
        for ((delegator, operator), delegation) in &self.delegations {
            if &delegation.delegator != delegator || &delegation.validator != operator {
                return Err(StakingError::Inconsistent(format!(
                    "delegation stored under wrong key ({delegator}, {operator})"
                )));
            }
            if delegation.shares.is_zero() {
                return Err(StakingError::Inconsistent(format!(
                    "zero-share delegation ({delegator}, {operator}) kept"
                )));
            }
            if !self.validators.contains_key(operator) {
                return Err(StakingError::Inconsistent(format!(
                    "delegation to unknown validator {operator}"
                )));
            }
            let sum = shares.entry(operator).or_insert(Dec::ZERO);
            *sum = sum.checked_add(delegation.shares).ok_or(StakingError::Overflow)?;
        }

        for (operator, validator) in &self.validators {
            let delegated = shares.get(operator).copied().unwrap_or(Dec::ZERO);
            if delegated != validator.delegator_shares {
                return Err(StakingError::Inconsistent(format!(
                    "validator {operator} has {} shares, delegations sum to {delegated}",
                    validator.delegator_shares
                )));
            }
            if self.consensus_keys.get(&validator.consensus_pubkey) != Some(operator) {
                return Err(StakingError::Inconsistent(format!(
                    "consensus key index out of sync for {operator}"
                )));
            }
            let queued = validator
                .unbonding_queue_key
                .and_then(|key| self.validator_queue.get(&key))
                .is_some_and(|queued| queued == operator);
            if (validator.status == ValidatorStatus::Unbonding) != queued {
                return Err(StakingError::Inconsistent(format!(
                    "validator {operator} status {:?} disagrees with the unbonding queue",
                    validator.status
                )));
            }
        }

        if self.consensus_keys.len() != self.validators.len() {
            return Err(StakingError::Inconsistent(
                "consensus key index has stale entries".into(),
            ));
        }
        for operator in self.last_powers.keys() {
            if !self.validators.get(operator).is_some_and(|v| v.is_bonded()) {
                return Err(StakingError::Inconsistent(format!(
                    "reported power for non-bonded validator {operator}"
                )));
            }
        }
        Ok(())
    }
}
