//! The staking ledger: owns validators, delegations and the maturity queues.
//!
//! Every transaction validates its full input against current state before the
//! first mutation. The only externally fallible step, a `BalanceLedger`
//! transfer, runs after validation and before any internal write, so a failed
//! transaction leaves the ledger untouched.

use crate::delegation::{Delegation, RedelegationEntry, UnbondingEntry};
use crate::error::StakingError;
use crate::events;
use crate::queue::TimeQueue;
use crate::validator::{
    Commission, CommissionRates, Description, Validator, ValidatorStatus,
    COMMISSION_UPDATE_INTERVAL_SECS,
};
use crate::validator_set::LastPower;
use scloud_types::{
    AccountAddress, BalanceLedger, BlockInfo, ConsensusPubKey, Dec, Event, ModuleAccounts,
    StakingParams, TokenAmount, ValidatorAddress,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// `(delegator, validator)`.
pub type DelegationKey = (AccountAddress, ValidatorAddress);

/// Input of a CreateValidator transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewValidator {
    pub operator: ValidatorAddress,
    pub consensus_pubkey: ConsensusPubKey,
    pub self_delegation: TokenAmount,
    pub commission: CommissionRates,
    pub description: Description,
    /// Raised to the chain-wide minimum when absent or lower.
    pub min_self_delegation: Option<TokenAmount>,
}

/// Validators, delegations and pending unbonding/redelegation entries.
///
/// All collections are ordered maps so that iteration, and therefore every
/// derived state transition, is identical on every node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakingLedger {
    pub(crate) params: StakingParams,
    pub(crate) pool: AccountAddress,
    pub(crate) burn_sink: AccountAddress,
    pub(crate) validators: BTreeMap<ValidatorAddress, Validator>,
    pub(crate) consensus_keys: BTreeMap<ConsensusPubKey, ValidatorAddress>,
    pub(crate) delegations: BTreeMap<DelegationKey, Delegation>,
    pub(crate) unbondings: TimeQueue<UnbondingEntry>,
    pub(crate) redelegations: TimeQueue<RedelegationEntry>,
    pub(crate) validator_queue: TimeQueue<ValidatorAddress>,
    pub(crate) last_powers: BTreeMap<ValidatorAddress, LastPower>,
    #[serde(skip)]
    pending_events: Vec<Event>,
}

impl StakingLedger {
    pub fn new(params: StakingParams, accounts: &ModuleAccounts) -> Self {
        Self {
            params,
            pool: accounts.staking_pool.clone(),
            burn_sink: accounts.burn_sink.clone(),
            validators: BTreeMap::new(),
            consensus_keys: BTreeMap::new(),
            delegations: BTreeMap::new(),
            unbondings: TimeQueue::new(),
            redelegations: TimeQueue::new(),
            validator_queue: TimeQueue::new(),
            last_powers: BTreeMap::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn params(&self) -> &StakingParams {
        &self.params
    }

    /// Replace the parameters. Existing queue entries keep their completion times.
    pub fn set_params(&mut self, params: StakingParams) -> Result<(), StakingError> {
        params
            .validate()
            .map_err(|e| StakingError::InvalidInput(e.to_string()))?;
        info!(?params, "staking params updated");
        self.params = params;
        Ok(())
    }

    /// Account holding every bonded and unbonding token.
    pub fn pool_account(&self) -> &AccountAddress {
        &self.pool
    }

    /// Drain the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events)
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.pending_events.push(event);
    }

    // ── Transactions ───────────────────────────────────────────────────

    /// Register a validator and bond its operator's self-delegation 1:1.
    pub fn create_validator(
        &mut self,
        bank: &mut dyn BalanceLedger,
        block: BlockInfo,
        msg: NewValidator,
    ) -> Result<Dec, StakingError> {
        msg.commission.validate()?;
        msg.description.validate()?;
        if self.validators.contains_key(&msg.operator) {
            return Err(StakingError::ValidatorExists(msg.operator.to_string()));
        }
        if self.consensus_keys.contains_key(&msg.consensus_pubkey) {
            return Err(StakingError::ConsensusKeyExists(msg.consensus_pubkey.to_string()));
        }
        let minimum = msg
            .min_self_delegation
            .unwrap_or(TokenAmount::ZERO)
            .max(self.params.min_self_delegation);
        if msg.self_delegation < minimum {
            return Err(StakingError::BelowMinimum {
                amount: msg.self_delegation.raw(),
                minimum: minimum.raw(),
            });
        }
        if msg.self_delegation.is_zero() {
            return Err(StakingError::InvalidInput(
                "self delegation must be positive".into(),
            ));
        }

        let mut validator = Validator {
            operator: msg.operator.clone(),
            consensus_pubkey: msg.consensus_pubkey.clone(),
            status: ValidatorStatus::Unbonded,
            jailed: false,
            tokens: TokenAmount::ZERO,
            delegator_shares: Dec::ZERO,
            description: msg.description,
            commission: Commission {
                rates: msg.commission,
                update_time: block.time,
            },
            min_self_delegation: minimum,
            unbonding_height: 0,
            unbonding_completion_time: block.time,
            unbonding_queue_key: None,
        };
        let shares = validator.add_tokens_from_delegation(msg.self_delegation)?;
        let owner = msg.operator.to_account();

        bank.transfer(&owner, &self.pool, msg.self_delegation)?;

        self.consensus_keys
            .insert(msg.consensus_pubkey, msg.operator.clone());
        self.validators.insert(msg.operator.clone(), validator);
        self.delegations.insert(
            (owner.clone(), msg.operator.clone()),
            Delegation {
                delegator: owner,
                validator: msg.operator.clone(),
                shares,
            },
        );

        info!(validator = %msg.operator, amount = %msg.self_delegation, "validator created");
        self.emit(
            Event::new(events::CREATE_VALIDATOR)
                .attr(events::ATTR_VALIDATOR, &msg.operator)
                .attr(events::ATTR_AMOUNT, msg.self_delegation.raw()),
        );
        Ok(shares)
    }

    /// Update a validator's description and/or commission rate.
    pub fn edit_validator(
        &mut self,
        block: BlockInfo,
        operator: &ValidatorAddress,
        description: Option<Description>,
        commission_rate: Option<Dec>,
    ) -> Result<(), StakingError> {
        let mut validator = self.validator_cloned(operator)?;
        if let Some(description) = description {
            description.validate()?;
            validator.description = description;
        }
        if let Some(rate) = commission_rate {
            let rates = validator.commission.rates;
            if rate > rates.max_rate {
                return Err(StakingError::InvalidInput(
                    "commission rate above max rate".into(),
                ));
            }
            let change = if rate > rates.rate {
                rate.saturating_sub(rates.rate)
            } else {
                rates.rate.saturating_sub(rate)
            };
            if change > rates.max_change_rate {
                return Err(StakingError::InvalidInput(
                    "commission change exceeds max change rate".into(),
                ));
            }
            if !validator
                .commission
                .update_time
                .has_expired(COMMISSION_UPDATE_INTERVAL_SECS, block.time)
            {
                return Err(StakingError::InvalidState(
                    "commission can only change once per day".into(),
                ));
            }
            validator.commission.rates.rate = rate;
            validator.commission.update_time = block.time;
        }
        self.validators.insert(operator.clone(), validator);
        self.emit(Event::new(events::EDIT_VALIDATOR).attr(events::ATTR_VALIDATOR, operator));
        Ok(())
    }

    /// Bond `amount` tokens from `delegator` to `operator`, returning the shares minted.
    pub fn delegate(
        &mut self,
        bank: &mut dyn BalanceLedger,
        delegator: &AccountAddress,
        operator: &ValidatorAddress,
        amount: TokenAmount,
    ) -> Result<Dec, StakingError> {
        if amount.is_zero() {
            return Err(StakingError::InvalidInput("delegation amount must be positive".into()));
        }
        let mut validator = self.validator_cloned(operator)?;
        let shares = validator.add_tokens_from_delegation(amount)?;
        let key = (delegator.clone(), operator.clone());
        let mut delegation = self.delegations.get(&key).cloned().unwrap_or(Delegation {
            delegator: delegator.clone(),
            validator: operator.clone(),
            shares: Dec::ZERO,
        });
        delegation.shares = delegation
            .shares
            .checked_add(shares)
            .ok_or(StakingError::Overflow)?;

        bank.transfer(delegator, &self.pool, amount)?;

        self.validators.insert(operator.clone(), validator);
        self.delegations.insert(key, delegation);

        debug!(%delegator, validator = %operator, %amount, %shares, "delegated");
        self.emit(
            Event::new(events::DELEGATE)
                .attr(events::ATTR_DELEGATOR, delegator)
                .attr(events::ATTR_VALIDATOR, operator)
                .attr(events::ATTR_AMOUNT, amount.raw())
                .attr(events::ATTR_SHARES, shares),
        );
        Ok(shares)
    }

    /// Start unbonding `shares`. Voting power drops immediately; tokens are paid
    /// out when the returned entry matures.
    pub fn undelegate(
        &mut self,
        block: BlockInfo,
        delegator: &AccountAddress,
        operator: &ValidatorAddress,
        shares: Dec,
    ) -> Result<UnbondingEntry, StakingError> {
        if shares.is_zero() {
            return Err(StakingError::InvalidInput("shares must be positive".into()));
        }
        let mut validator = self.validator_cloned(operator)?;
        let mut delegation = self.delegation_cloned(delegator, operator)?;
        if delegation.shares < shares {
            return Err(StakingError::InsufficientShares {
                have: delegation.shares,
                need: shares,
            });
        }
        if self.unbonding_entry_count(delegator, operator) >= self.params.max_entries as usize {
            return Err(StakingError::TooManyEntries {
                max: self.params.max_entries,
            });
        }

        let tokens = validator.remove_delegator_shares(shares);
        if tokens.is_zero() {
            return Err(StakingError::InvalidInput(
                "unbonded amount rounds to zero tokens".into(),
            ));
        }
        delegation.shares = delegation.shares.saturating_sub(shares);
        let completion_time = block.time.plus_secs(self.params.unbonding_duration_secs);
        let entry = UnbondingEntry {
            delegator: delegator.clone(),
            validator: operator.clone(),
            creation_height: block.height,
            creation_time: block.time,
            completion_time,
            initial_balance: tokens,
            balance: tokens,
        };

        self.store_delegation(delegation);
        self.jail_if_below_min_self_delegation(&mut validator);
        self.store_validator(validator);
        self.unbondings.push(completion_time, entry.clone());

        info!(%delegator, validator = %operator, %tokens, %completion_time, "unbonding scheduled");
        self.emit(
            Event::new(events::UNBOND)
                .attr(events::ATTR_DELEGATOR, delegator)
                .attr(events::ATTR_VALIDATOR, operator)
                .attr(events::ATTR_AMOUNT, tokens.raw())
                .attr(events::ATTR_COMPLETION_TIME, completion_time.as_secs()),
        );
        Ok(entry)
    }

    /// Move `shares` worth of stake from `src` to `dst` without unbonding.
    pub fn redelegate(
        &mut self,
        block: BlockInfo,
        delegator: &AccountAddress,
        src: &ValidatorAddress,
        dst: &ValidatorAddress,
        shares: Dec,
    ) -> Result<RedelegationEntry, StakingError> {
        if src == dst {
            return Err(StakingError::InvalidInput(
                "cannot redelegate to the same validator".into(),
            ));
        }
        if shares.is_zero() {
            return Err(StakingError::InvalidInput("shares must be positive".into()));
        }
        let mut src_validator = self.validator_cloned(src)?;
        let mut dst_validator = self.validator_cloned(dst)?;
        let mut src_delegation = self.delegation_cloned(delegator, src)?;
        if src_delegation.shares < shares {
            return Err(StakingError::InsufficientShares {
                have: src_delegation.shares,
                need: shares,
            });
        }
        if self.has_incoming_redelegation(delegator, src) {
            return Err(StakingError::InvalidState(format!(
                "stake redelegated to {src} has not matured yet"
            )));
        }
        if self.redelegation_in_lookback(delegator, dst, block) {
            return Err(StakingError::InvalidState(format!(
                "a redelegation to {dst} is still within the lookback window"
            )));
        }
        if self.redelegation_entry_count(delegator, src, dst) >= self.params.max_entries as usize {
            return Err(StakingError::TooManyEntries {
                max: self.params.max_entries,
            });
        }

        let tokens = src_validator.remove_delegator_shares(shares);
        if tokens.is_zero() {
            return Err(StakingError::InvalidInput(
                "redelegated amount rounds to zero tokens".into(),
            ));
        }
        let dst_shares = dst_validator.add_tokens_from_delegation(tokens)?;
        src_delegation.shares = src_delegation.shares.saturating_sub(shares);
        let dst_key = (delegator.clone(), dst.clone());
        let mut dst_delegation = self.delegations.get(&dst_key).cloned().unwrap_or(Delegation {
            delegator: delegator.clone(),
            validator: dst.clone(),
            shares: Dec::ZERO,
        });
        dst_delegation.shares = dst_delegation
            .shares
            .checked_add(dst_shares)
            .ok_or(StakingError::Overflow)?;
        let completion_time = block.time.plus_secs(self.params.unbonding_duration_secs);
        let entry = RedelegationEntry {
            delegator: delegator.clone(),
            src_validator: src.clone(),
            dst_validator: dst.clone(),
            creation_height: block.height,
            creation_time: block.time,
            completion_time,
            initial_balance: tokens,
            balance: tokens,
            shares_dst: dst_shares,
        };

        self.store_delegation(src_delegation);
        self.store_delegation(dst_delegation);
        self.jail_if_below_min_self_delegation(&mut src_validator);
        self.store_validator(src_validator);
        self.store_validator(dst_validator);
        self.redelegations.push(completion_time, entry.clone());

        info!(%delegator, %src, %dst, %tokens, %completion_time, "redelegated");
        self.emit(
            Event::new(events::REDELEGATE)
                .attr(events::ATTR_DELEGATOR, delegator)
                .attr(events::ATTR_SRC_VALIDATOR, src)
                .attr(events::ATTR_DST_VALIDATOR, dst)
                .attr(events::ATTR_AMOUNT, tokens.raw())
                .attr(events::ATTR_COMPLETION_TIME, completion_time.as_secs()),
        );
        Ok(entry)
    }

    /// Release a jailed validator once its self-delegation is back above minimum.
    pub fn unjail(&mut self, operator: &ValidatorAddress) -> Result<(), StakingError> {
        let mut validator = self.validator_cloned(operator)?;
        if !validator.jailed {
            return Err(StakingError::InvalidState(format!("validator {operator} is not jailed")));
        }
        let own = self.self_delegation_tokens(&validator);
        if own < validator.min_self_delegation {
            return Err(StakingError::BelowMinimum {
                amount: own.raw(),
                minimum: validator.min_self_delegation.raw(),
            });
        }
        validator.jailed = false;
        self.validators.insert(operator.clone(), validator);
        info!(validator = %operator, "validator unjailed");
        self.emit(Event::new(events::UNJAIL).attr(events::ATTR_VALIDATOR, operator));
        Ok(())
    }

    // ── Internal helpers ───────────────────────────────────────────────

    pub(crate) fn validator_cloned(
        &self,
        operator: &ValidatorAddress,
    ) -> Result<Validator, StakingError> {
        self.validators
            .get(operator)
            .cloned()
            .ok_or_else(|| StakingError::ValidatorNotFound(operator.to_string()))
    }

    fn delegation_cloned(
        &self,
        delegator: &AccountAddress,
        operator: &ValidatorAddress,
    ) -> Result<Delegation, StakingError> {
        self.delegations
            .get(&(delegator.clone(), operator.clone()))
            .cloned()
            .ok_or_else(|| StakingError::DelegationNotFound {
                delegator: delegator.to_string(),
                validator: operator.to_string(),
            })
    }

    /// Insert, or drop once no shares remain.
    pub(crate) fn store_delegation(&mut self, delegation: Delegation) {
        let key = (delegation.delegator.clone(), delegation.validator.clone());
        if delegation.shares.is_zero() {
            self.delegations.remove(&key);
        } else {
            self.delegations.insert(key, delegation);
        }
    }

    /// Insert, or drop an unbonded validator with no tokens and no shares.
    pub(crate) fn store_validator(&mut self, validator: Validator) {
        if validator.is_empty() {
            debug!(validator = %validator.operator, "removing empty validator");
            self.consensus_keys.remove(&validator.consensus_pubkey);
            self.last_powers.remove(&validator.operator);
            self.validators.remove(&validator.operator);
        } else {
            self.validators.insert(validator.operator.clone(), validator);
        }
    }

    /// Token value of the operator's own delegation.
    pub(crate) fn self_delegation_tokens(&self, validator: &Validator) -> TokenAmount {
        self.delegations
            .get(&(validator.operator.to_account(), validator.operator.clone()))
            .map(|d| validator.tokens_from_shares(d.shares))
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Jail `validator` when its operator's stake fell under the recorded minimum.
    /// Reads delegations, so call after storing the updated delegation.
    fn jail_if_below_min_self_delegation(&mut self, validator: &mut Validator) {
        if validator.jailed || validator.delegator_shares.is_zero() {
            return;
        }
        let own = self.self_delegation_tokens(validator);
        if own < validator.min_self_delegation {
            validator.jailed = true;
            warn!(
                validator = %validator.operator,
                self_delegation = %own,
                minimum = %validator.min_self_delegation,
                "self delegation below minimum, validator jailed"
            );
            self.emit(
                Event::new(events::JAIL).attr(events::ATTR_VALIDATOR, &validator.operator),
            );
        }
    }

    pub(crate) fn unbonding_entry_count(
        &self,
        delegator: &AccountAddress,
        operator: &ValidatorAddress,
    ) -> usize {
        self.unbondings
            .iter()
            .filter(|(_, e)| &e.delegator == delegator && &e.validator == operator)
            .count()
    }

    fn redelegation_entry_count(
        &self,
        delegator: &AccountAddress,
        src: &ValidatorAddress,
        dst: &ValidatorAddress,
    ) -> usize {
        self.redelegations
            .iter()
            .filter(|(_, e)| {
                &e.delegator == delegator && &e.src_validator == src && &e.dst_validator == dst
            })
            .count()
    }

    /// Whether `delegator` still has immature stake redelegated *into* `operator`.
    fn has_incoming_redelegation(
        &self,
        delegator: &AccountAddress,
        operator: &ValidatorAddress,
    ) -> bool {
        self.redelegations
            .iter()
            .any(|(_, e)| &e.delegator == delegator && &e.dst_validator == operator)
    }

    fn redelegation_in_lookback(
        &self,
        delegator: &AccountAddress,
        dst: &ValidatorAddress,
        block: BlockInfo,
    ) -> bool {
        let lookback = self.params.redelegation_lookback_secs;
        self.redelegations.iter().any(|(_, e)| {
            &e.delegator == delegator
                && &e.dst_validator == dst
                && !e.creation_time.has_expired(lookback, block.time)
        })
    }
}
