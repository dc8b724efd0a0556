//! End-of-block maturity sweep.
//!
//! Processes, in order: validators finishing their unbonding period, matured
//! unbonding entries (paid out through the balance ledger), matured
//! redelegation entries. Each queue is consumed in ascending
//! `(completion_time, creation order)`. Any failure here is fatal to the block:
//! a skipped payout would make nodes diverge.

use crate::delegation::{RedelegationEntry, UnbondingEntry};
use crate::error::StakingError;
use crate::events;
use crate::ledger::StakingLedger;
use crate::validator::ValidatorStatus;
use scloud_types::{BalanceLedger, BlockInfo, Event, ValidatorAddress};
use tracing::{debug, info};

/// Everything that matured in one sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaturityReport {
    pub unbonded_validators: Vec<ValidatorAddress>,
    pub completed_unbondings: Vec<UnbondingEntry>,
    pub completed_redelegations: Vec<RedelegationEntry>,
}

impl StakingLedger {
    pub fn end_block_maturity(
        &mut self,
        bank: &mut dyn BalanceLedger,
        block: BlockInfo,
    ) -> Result<MaturityReport, StakingError> {
        let now = block.time;
        let mut report = MaturityReport::default();

        while let Some(key) = self.validator_queue.next_matured(now) {
            let operator = self
                .validator_queue
                .remove(&key)
                .ok_or_else(|| StakingError::Inconsistent("validator queue entry vanished".into()))?;
            let mut validator = self.validators.get(&operator).cloned().ok_or_else(|| {
                StakingError::Inconsistent(format!("queued validator {operator} missing"))
            })?;
            if validator.status != ValidatorStatus::Unbonding
                || validator.unbonding_queue_key != Some(key)
            {
                return Err(StakingError::Inconsistent(format!(
                    "queued validator {operator} is not unbonding at {key:?}"
                )));
            }
            validator.status = ValidatorStatus::Unbonded;
            validator.unbonding_queue_key = None;
            self.store_validator(validator);
            info!(validator = %operator, "validator unbonding complete");
            self.emit(
                Event::new(events::COMPLETE_UNBONDING_VALIDATOR)
                    .attr(events::ATTR_VALIDATOR, &operator),
            );
            report.unbonded_validators.push(operator);
        }

        while let Some(key) = self.unbondings.next_matured(now) {
            let entry = self
                .unbondings
                .get(&key)
                .cloned()
                .ok_or_else(|| StakingError::Inconsistent("unbonding entry vanished".into()))?;
            if !entry.balance.is_zero() {
                bank.transfer(&self.pool, &entry.delegator, entry.balance)?;
            }
            self.unbondings.remove(&key);
            debug!(
                delegator = %entry.delegator,
                validator = %entry.validator,
                amount = %entry.balance,
                "unbonding complete"
            );
            self.emit(
                Event::new(events::COMPLETE_UNBONDING)
                    .attr(events::ATTR_DELEGATOR, &entry.delegator)
                    .attr(events::ATTR_VALIDATOR, &entry.validator)
                    .attr(events::ATTR_AMOUNT, entry.balance.raw()),
            );
            report.completed_unbondings.push(entry);
        }

        for (_, entry) in self.redelegations.pop_matured(now) {
            debug!(
                delegator = %entry.delegator,
                src = %entry.src_validator,
                dst = %entry.dst_validator,
                "redelegation complete"
            );
            self.emit(
                Event::new(events::COMPLETE_REDELEGATION)
                    .attr(events::ATTR_DELEGATOR, &entry.delegator)
                    .attr(events::ATTR_SRC_VALIDATOR, &entry.src_validator)
                    .attr(events::ATTR_DST_VALIDATOR, &entry.dst_validator),
            );
            report.completed_redelegations.push(entry);
        }

        Ok(report)
    }
}
