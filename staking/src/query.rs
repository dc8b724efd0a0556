//! Read-only query surface over the staking ledger.

use crate::delegation::{Delegation, RedelegationEntry, UnbondingEntry};
use crate::ledger::StakingLedger;
use crate::validator::{Validator, ValidatorStatus};
use crate::validator_set::LastPower;
use scloud_types::{AccountAddress, StakingParams, TokenAmount, ValidatorAddress};
use serde::{Deserialize, Serialize};

/// Token totals held by the staking pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Tokens of bonded validators.
    pub bonded_tokens: TokenAmount,
    /// Tokens of unbonding/unbonded validators plus pending unbonding payouts.
    pub not_bonded_tokens: TokenAmount,
}

impl StakingLedger {
    pub fn validator(&self, operator: &ValidatorAddress) -> Option<&Validator> {
        self.validators.get(operator)
    }

    /// All validators in operator order, optionally filtered by status.
    pub fn validators(&self, status: Option<ValidatorStatus>) -> Vec<&Validator> {
        self.validators
            .values()
            .filter(|v| status.map_or(true, |s| v.status == s))
            .collect()
    }

    pub fn delegation(
        &self,
        delegator: &AccountAddress,
        operator: &ValidatorAddress,
    ) -> Option<&Delegation> {
        self.delegations.get(&(delegator.clone(), operator.clone()))
    }

    pub fn delegator_delegations(&self, delegator: &AccountAddress) -> Vec<&Delegation> {
        self.delegations
            .values()
            .filter(|d| &d.delegator == delegator)
            .collect()
    }

    pub fn validator_delegations(&self, operator: &ValidatorAddress) -> Vec<&Delegation> {
        self.delegations
            .values()
            .filter(|d| &d.validator == operator)
            .collect()
    }

    /// Current token value of a delegation.
    pub fn delegation_tokens(
        &self,
        delegator: &AccountAddress,
        operator: &ValidatorAddress,
    ) -> TokenAmount {
        match (self.delegation(delegator, operator), self.validators.get(operator)) {
            (Some(d), Some(v)) => v.tokens_from_shares(d.shares),
            _ => TokenAmount::ZERO,
        }
    }

    /// Pending unbonding entries for one pair, in maturity order.
    pub fn unbonding_delegations(
        &self,
        delegator: &AccountAddress,
        operator: &ValidatorAddress,
    ) -> Vec<&UnbondingEntry> {
        self.unbondings
            .iter()
            .map(|(_, e)| e)
            .filter(|e| &e.delegator == delegator && &e.validator == operator)
            .collect()
    }

    /// Immature redelegations of `delegator`, in maturity order.
    pub fn redelegations(&self, delegator: &AccountAddress) -> Vec<&RedelegationEntry> {
        self.redelegations
            .iter()
            .map(|(_, e)| e)
            .filter(|e| &e.delegator == delegator)
            .collect()
    }

    /// Bonded validators in rank order: effective tokens descending, then operator.
    pub fn bonded_validators(&self) -> Vec<&Validator> {
        let mut bonded: Vec<(TokenAmount, &Validator)> = self
            .validators
            .values()
            .filter(|v| v.is_bonded())
            .map(|v| (self.effective_tokens(&v.operator), v))
            .collect();
        bonded.sort_by(|(ta, a), (tb, b)| tb.cmp(ta).then_with(|| a.operator.cmp(&b.operator)));
        bonded.into_iter().map(|(_, v)| v).collect()
    }

    /// Powers last handed to consensus.
    pub fn last_powers(&self) -> impl Iterator<Item = (&ValidatorAddress, &LastPower)> {
        self.last_powers.iter()
    }

    pub fn pool(&self) -> Pool {
        let mut pool = Pool::default();
        for validator in self.validators.values() {
            if validator.is_bonded() {
                pool.bonded_tokens = pool.bonded_tokens.saturating_add(validator.tokens);
            } else {
                pool.not_bonded_tokens = pool.not_bonded_tokens.saturating_add(validator.tokens);
            }
        }
        for (_, entry) in self.unbondings.iter() {
            pool.not_bonded_tokens = pool.not_bonded_tokens.saturating_add(entry.balance);
        }
        pool
    }

    pub fn query_params(&self) -> StakingParams {
        self.params.clone()
    }
}
