//! Read-only adapter exposing bonded stake to governance.
//!
//! Both figures are computed from the ledger at the moment of the call; no
//! snapshot is cached.

use crate::ledger::StakingLedger;
use scloud_types::{
    AccountAddress, RedelegationPowerPolicy, TokenAmount, ValidatorAddress, VotingPowerProvider,
};

pub struct StakingPowerProvider<'a> {
    ledger: &'a StakingLedger,
}

impl<'a> StakingPowerProvider<'a> {
    pub fn new(ledger: &'a StakingLedger) -> Self {
        Self { ledger }
    }
}

impl StakingLedger {
    pub fn power_provider(&self) -> StakingPowerProvider<'_> {
        StakingPowerProvider::new(self)
    }

    /// Tokens `delegator` has bonded to validators in the active set.
    pub fn bonded_amount_of(&self, delegator: &AccountAddress) -> TokenAmount {
        let mut total: u128 = 0;
        for ((owner, operator), delegation) in &self.delegations {
            if owner != delegator {
                continue;
            }
            if let Some(validator) = self.validators.get(operator) {
                if validator.is_bonded() {
                    total = total
                        .saturating_add(validator.tokens_from_shares(delegation.shares).raw());
                }
            }
        }

        if self.params.redelegation_power_policy == RedelegationPowerPolicy::Source {
            let bonded = |op: &ValidatorAddress| {
                self.validators.get(op).map(|v| v.is_bonded()).unwrap_or(false)
            };
            for (entry, amount) in self.redelegations_in_flight() {
                if &entry.delegator != delegator {
                    continue;
                }
                if bonded(&entry.src_validator) {
                    total = total.saturating_add(amount);
                }
                if bonded(&entry.dst_validator) {
                    total = total.saturating_sub(amount);
                }
            }
        }
        TokenAmount::new(total)
    }
}

impl VotingPowerProvider for StakingPowerProvider<'_> {
    fn bonded_amount(&self, voter: &AccountAddress) -> TokenAmount {
        self.ledger.bonded_amount_of(voter)
    }

    fn total_bonded_supply(&self) -> TokenAmount {
        self.ledger.total_bonded_tokens()
    }
}
