//! Bonded validator set selection.
//!
//! Validators are ranked by effective tokens, descending, with the operator
//! address (ascending) as tie-break. The top `max_validators` with non-zero
//! consensus power are bonded; bonded validators that drop out begin
//! unbonding. The result is a delta against the previously reported powers,
//! ready for the consensus layer.

use crate::delegation::RedelegationEntry;
use crate::events;
use crate::ledger::StakingLedger;
use crate::validator::{consensus_power, Validator, ValidatorStatus};
use scloud_types::{
    AccountAddress, BlockInfo, ConsensusPubKey, Dec, Event, RedelegationPowerPolicy, Timestamp,
    TokenAmount, ValidatorAddress,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Power last reported to consensus for a bonded validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastPower {
    pub consensus_pubkey: ConsensusPubKey,
    pub power: u64,
}

/// One change to the consensus validator set. Power 0 removes the validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub operator: ValidatorAddress,
    pub consensus_pubkey: ConsensusPubKey,
    pub power: u64,
}

/// Per-validator token corrections from in-flight redelegations.
#[derive(Default)]
struct Adjustment {
    add: u128,
    sub: u128,
}

impl StakingLedger {
    /// Under the `Source` policy, immature redelegations still count toward
    /// their source validator.
    fn redelegation_adjustments(&self) -> BTreeMap<ValidatorAddress, Adjustment> {
        let mut adjustments: BTreeMap<ValidatorAddress, Adjustment> = BTreeMap::new();
        if self.params.redelegation_power_policy == RedelegationPowerPolicy::Destination {
            return adjustments;
        }
        for (entry, amount) in self.redelegations_in_flight() {
            let src = adjustments.entry(entry.src_validator.clone()).or_default();
            src.add = src.add.saturating_add(amount);
            let dst = adjustments.entry(entry.dst_validator.clone()).or_default();
            dst.sub = dst.sub.saturating_add(amount);
        }
        adjustments
    }

    /// Immature redelegations paired with the tokens they still hold on the
    /// destination. Each entry is capped by the delegator's remaining shares
    /// there, consumed in maturity order, so stake already unbonded or moved
    /// away from the destination is not credited back to the source.
    pub(crate) fn redelegations_in_flight(&self) -> Vec<(&RedelegationEntry, u128)> {
        let mut remaining: BTreeMap<(&AccountAddress, &ValidatorAddress), Dec> = BTreeMap::new();
        let mut out = Vec::new();
        for (_, entry) in self.redelegations.iter() {
            let Some(dst) = self.validators.get(&entry.dst_validator) else {
                continue;
            };
            let left = remaining
                .entry((&entry.delegator, &entry.dst_validator))
                .or_insert_with(|| {
                    self.delegations
                        .get(&(entry.delegator.clone(), entry.dst_validator.clone()))
                        .map(|d| d.shares)
                        .unwrap_or(Dec::ZERO)
                });
            let shares = (*left).min(entry.shares_dst);
            *left = left.saturating_sub(shares);
            let amount = dst.tokens_from_shares(shares).raw().min(entry.balance.raw());
            if amount > 0 {
                out.push((entry, amount));
            }
        }
        out
    }

    fn effective_with(
        validator: &Validator,
        adjustments: &BTreeMap<ValidatorAddress, Adjustment>,
    ) -> u128 {
        let tokens = validator.tokens.raw();
        match adjustments.get(&validator.operator) {
            Some(adj) => tokens.saturating_add(adj.add).saturating_sub(adj.sub),
            None => tokens,
        }
    }

    /// Tokens that count toward `operator`'s power under the redelegation policy.
    pub fn effective_tokens(&self, operator: &ValidatorAddress) -> TokenAmount {
        let adjustments = self.redelegation_adjustments();
        self.validators
            .get(operator)
            .map(|v| TokenAmount::new(Self::effective_with(v, &adjustments)))
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Sum of effective tokens over bonded validators.
    pub fn total_bonded_tokens(&self) -> TokenAmount {
        let adjustments = self.redelegation_adjustments();
        let total = self
            .validators
            .values()
            .filter(|v| v.is_bonded())
            .fold(0u128, |acc, v| {
                acc.saturating_add(Self::effective_with(v, &adjustments))
            });
        TokenAmount::new(total)
    }

    /// Select the bonded set and return the changes since the last call.
    pub fn compute_bonded_set(&mut self, block: BlockInfo) -> Vec<ValidatorUpdate> {
        let adjustments = self.redelegation_adjustments();
        let reduction = self.params.power_reduction;

        let mut ranked: Vec<(u128, &Validator)> = self
            .validators
            .values()
            .filter(|v| !v.jailed)
            .map(|v| (Self::effective_with(v, &adjustments), v))
            .filter(|(tokens, _)| consensus_power(*tokens, reduction) > 0)
            .collect();
        ranked.sort_by(|(ta, a), (tb, b)| tb.cmp(ta).then_with(|| a.operator.cmp(&b.operator)));
        ranked.truncate(self.params.max_validators as usize);

        let next_set: BTreeMap<ValidatorAddress, LastPower> = ranked
            .iter()
            .map(|(tokens, v)| {
                (
                    v.operator.clone(),
                    LastPower {
                        consensus_pubkey: v.consensus_pubkey.clone(),
                        power: consensus_power(*tokens, reduction),
                    },
                )
            })
            .collect();

        let operators: Vec<ValidatorAddress> = self.validators.keys().cloned().collect();
        for operator in operators {
            let in_set = next_set.contains_key(&operator);
            match (self.validators.get(&operator).map(|v| v.status), in_set) {
                (Some(ValidatorStatus::Bonded), false) => self.begin_unbonding(&operator, block),
                (Some(status), true) if status != ValidatorStatus::Bonded => {
                    self.bond(&operator)
                }
                _ => {}
            }
        }

        let mut updates: BTreeMap<ValidatorAddress, ValidatorUpdate> = BTreeMap::new();
        for (operator, next) in &next_set {
            if self.last_powers.get(operator).map(|p| p.power) != Some(next.power) {
                updates.insert(
                    operator.clone(),
                    ValidatorUpdate {
                        operator: operator.clone(),
                        consensus_pubkey: next.consensus_pubkey.clone(),
                        power: next.power,
                    },
                );
            }
        }
        for (operator, last) in &self.last_powers {
            if !next_set.contains_key(operator) {
                updates.insert(
                    operator.clone(),
                    ValidatorUpdate {
                        operator: operator.clone(),
                        consensus_pubkey: last.consensus_pubkey.clone(),
                        power: 0,
                    },
                );
            }
        }
        self.last_powers = next_set;

        if !updates.is_empty() {
            info!(
                changes = updates.len(),
                bonded = self.last_powers.len(),
                "validator set updated"
            );
        }
        updates.into_values().collect()
    }

    fn bond(&mut self, operator: &ValidatorAddress) {
        let Some(mut validator) = self.validators.get(operator).cloned() else {
            return;
        };
        if let Some(key) = validator.unbonding_queue_key.take() {
            self.validator_queue.remove(&key);
        }
        validator.status = ValidatorStatus::Bonded;
        validator.unbonding_height = 0;
        validator.unbonding_completion_time = Timestamp::EPOCH;
        self.validators.insert(operator.clone(), validator);
        info!(validator = %operator, "validator bonded");
        self.emit(Event::new(events::BOND_VALIDATOR).attr(events::ATTR_VALIDATOR, operator));
    }

    fn begin_unbonding(&mut self, operator: &ValidatorAddress, block: BlockInfo) {
        let Some(mut validator) = self.validators.get(operator).cloned() else {
            return;
        };
        let completion = block.time.plus_secs(self.params.unbonding_duration_secs);
        let key = self.validator_queue.push(completion, operator.clone());
        validator.status = ValidatorStatus::Unbonding;
        validator.unbonding_height = block.height;
        validator.unbonding_completion_time = completion;
        validator.unbonding_queue_key = Some(key);
        self.validators.insert(operator.clone(), validator);
        info!(validator = %operator, completion_time = %completion, "validator begins unbonding");
        self.emit(
            Event::new(events::BEGIN_UNBONDING_VALIDATOR)
                .attr(events::ATTR_VALIDATOR, operator)
                .attr(events::ATTR_COMPLETION_TIME, completion.as_secs()),
        );
    }
}
