//! Slashing: applying a slash-fraction event produced by the evidence layer.
//!
//! A slash burns `fraction` of the validator's tokens and leaves its shares
//! alone, so the exchange rate drops for every delegator at once. Stake that
//! left the validator at or after the infraction height was still at risk, so
//! unbonding entries lose the same fraction of their initial balance and
//! redelegation entries give up the matching destination shares.

use crate::delegation::Delegation;
use crate::error::StakingError;
use crate::events;
use crate::ledger::{DelegationKey, StakingLedger};
use crate::queue::QueueKey;
use crate::validator::Validator;
use scloud_types::{BalanceLedger, BlockHeight, BlockInfo, Dec, Event, TokenAmount, ValidatorAddress};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::warn;

/// Tokens burned by one slash, by origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlashOutcome {
    pub validator_burn: TokenAmount,
    pub unbonding_burn: TokenAmount,
    pub redelegation_burn: TokenAmount,
}

impl SlashOutcome {
    pub fn total(&self) -> TokenAmount {
        self.validator_burn
            .saturating_add(self.unbonding_burn)
            .saturating_add(self.redelegation_burn)
    }
}

struct RedelegationCut {
    key: QueueKey,
    amount: TokenAmount,
    shares: Dec,
}

fn checked_add(a: TokenAmount, b: TokenAmount) -> Result<TokenAmount, StakingError> {
    a.checked_add(b).ok_or(StakingError::Overflow)
}

impl StakingLedger {
    /// Burn `fraction` of `operator`'s stake for an infraction at `infraction_height`.
    pub fn slash(
        &mut self,
        bank: &mut dyn BalanceLedger,
        block: BlockInfo,
        operator: &ValidatorAddress,
        infraction_height: BlockHeight,
        fraction: Dec,
    ) -> Result<SlashOutcome, StakingError> {
        if fraction > Dec::ONE {
            return Err(StakingError::InvalidInput(format!(
                "slash fraction {fraction} above 1"
            )));
        }
        if infraction_height > block.height {
            return Err(StakingError::InvalidInput(format!(
                "infraction height {infraction_height} is in the future"
            )));
        }
        let mut validator = self.validator_cloned(operator)?;
        let mut outcome = SlashOutcome::default();

        // Unbonding entries created at or after the infraction.
        let mut unbonding_cuts: Vec<(QueueKey, TokenAmount)> = Vec::new();
        for (key, entry) in self.unbondings.iter() {
            if &entry.validator != operator || entry.creation_height < infraction_height {
                continue;
            }
            let due = fraction
                .mul_int_truncate(entry.initial_balance.raw())
                .ok_or(StakingError::Overflow)?;
            let cut = TokenAmount::new(due).min(entry.balance);
            if cut.is_zero() {
                continue;
            }
            outcome.unbonding_burn = checked_add(outcome.unbonding_burn, cut)?;
            unbonding_cuts.push((*key, cut));
        }

        // Redelegation entries: unbond the destination shares they minted.
        let mut staged_validators: BTreeMap<ValidatorAddress, Validator> = BTreeMap::new();
        let mut staged_delegations: BTreeMap<DelegationKey, Delegation> = BTreeMap::new();
        let mut redelegation_cuts: Vec<RedelegationCut> = Vec::new();
        for (key, entry) in self.redelegations.iter() {
            if &entry.src_validator != operator || entry.creation_height < infraction_height {
                continue;
            }
            let due = fraction
                .mul_int_truncate(entry.initial_balance.raw())
                .ok_or(StakingError::Overflow)?;
            let cut = TokenAmount::new(due).min(entry.balance);
            if cut.is_zero() {
                continue;
            }
            let dst = match staged_validators.entry(entry.dst_validator.clone()) {
                Entry::Occupied(slot) => Some(slot.into_mut()),
                Entry::Vacant(slot) => self
                    .validators
                    .get(&entry.dst_validator)
                    .cloned()
                    .map(|v| slot.insert(v)),
            };
            let del_key = (entry.delegator.clone(), entry.dst_validator.clone());
            let delegation = match staged_delegations.entry(del_key.clone()) {
                Entry::Occupied(slot) => Some(slot.into_mut()),
                Entry::Vacant(slot) => self
                    .delegations
                    .get(&del_key)
                    .cloned()
                    .map(|d| slot.insert(d)),
            };
            // The delegator may have already moved the stake on (or the destination
            // emptied out); only the entry shrinks then.
            let mut shares = Dec::ZERO;
            if let (Some(dst), Some(delegation)) = (dst, delegation) {
                let wanted = dst.shares_from_tokens(cut).unwrap_or(entry.shares_dst);
                shares = wanted.min(delegation.shares).min(entry.shares_dst);
                let burned = dst.remove_delegator_shares(shares);
                delegation.shares = delegation.shares.saturating_sub(shares);
                outcome.redelegation_burn = checked_add(outcome.redelegation_burn, burned)?;
            }
            redelegation_cuts.push(RedelegationCut {
                key: *key,
                amount: cut,
                shares,
            });
        }

        let validator_burn = fraction
            .mul_int_truncate(validator.tokens.raw())
            .ok_or(StakingError::Overflow)?;
        outcome.validator_burn = TokenAmount::new(validator_burn);
        validator.remove_tokens(outcome.validator_burn);

        let total = outcome.total();
        if !total.is_zero() {
            bank.transfer(&self.pool, &self.burn_sink, total)?;
        }

        for (key, cut) in unbonding_cuts {
            if let Some(entry) = self.unbondings.get_mut(&key) {
                entry.balance = entry.balance.saturating_sub(cut);
            }
        }
        for cut in redelegation_cuts {
            if let Some(entry) = self.redelegations.get_mut(&cut.key) {
                entry.balance = entry.balance.saturating_sub(cut.amount);
                entry.shares_dst = entry.shares_dst.saturating_sub(cut.shares);
            }
        }
        for (_, delegation) in staged_delegations {
            self.store_delegation(delegation);
        }
        for (_, dst) in staged_validators {
            self.store_validator(dst);
        }
        self.store_validator(validator);

        warn!(
            validator = %operator,
            %infraction_height,
            %fraction,
            burned = %total,
            "validator slashed"
        );
        self.emit(
            Event::new(events::SLASH)
                .attr(events::ATTR_VALIDATOR, operator)
                .attr(events::ATTR_HEIGHT, infraction_height)
                .attr(events::ATTR_FRACTION, fraction)
                .attr(events::ATTR_BURNED, total.raw()),
        );
        Ok(outcome)
    }
}
