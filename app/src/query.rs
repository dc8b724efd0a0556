//! Committed read snapshot and the query surface served from it.
//!
//! [`crate::Chain::commit`] publishes a new [`Snapshot`]; readers holding a
//! [`Querier`] see either the previous or the new snapshot in full, never a
//! block in progress.

use std::sync::{Arc, PoisonError, RwLock};

use scloud_governance::{
    Deposit, GovernanceEngine, Proposal, ProposalFilter, TallyResult, Vote,
};
use scloud_staking::{
    Delegation, Pool, RedelegationEntry, StakingLedger, UnbondingEntry, Validator,
    ValidatorStatus,
};
use scloud_types::{
    AccountAddress, BlockInfo, GovParams, StakingParams, TokenAmount, ValidatorAddress,
};

use crate::commit::AppHash;
use crate::AppError;

/// State as of the last commit.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub block: BlockInfo,
    pub app_hash: AppHash,
    pub staking: StakingLedger,
    pub governance: GovernanceEngine,
}

pub(crate) type SharedSnapshot = Arc<RwLock<Arc<Snapshot>>>;

/// Cloneable, thread-safe handle to the committed state.
#[derive(Clone)]
pub struct Querier {
    committed: SharedSnapshot,
}

impl Querier {
    pub(crate) fn new(committed: SharedSnapshot) -> Self {
        Self { committed }
    }

    /// The current snapshot. Hold on to it to run several queries against
    /// one consistent state.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        // A panicked writer cannot leave a half-written Arc behind.
        let guard = self.committed.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn block(&self) -> BlockInfo {
        self.snapshot().block
    }

    pub fn app_hash(&self) -> AppHash {
        self.snapshot().app_hash
    }

    // ── Staking ────────────────────────────────────────────────────────

    pub fn validator(&self, operator: &ValidatorAddress) -> Option<Validator> {
        self.snapshot().staking.validator(operator).cloned()
    }

    pub fn validators(&self, status: Option<ValidatorStatus>) -> Vec<Validator> {
        let snapshot = self.snapshot();
        snapshot.staking.validators(status).into_iter().cloned().collect()
    }

    /// Bonded validators in rank order.
    pub fn bonded_validators(&self) -> Vec<Validator> {
        let snapshot = self.snapshot();
        snapshot.staking.bonded_validators().into_iter().cloned().collect()
    }

    pub fn delegation(
        &self,
        delegator: &AccountAddress,
        operator: &ValidatorAddress,
    ) -> Option<Delegation> {
        self.snapshot().staking.delegation(delegator, operator).cloned()
    }

    pub fn delegation_tokens(
        &self,
        delegator: &AccountAddress,
        operator: &ValidatorAddress,
    ) -> TokenAmount {
        self.snapshot().staking.delegation_tokens(delegator, operator)
    }

    pub fn delegator_delegations(&self, delegator: &AccountAddress) -> Vec<Delegation> {
        let snapshot = self.snapshot();
        snapshot
            .staking
            .delegator_delegations(delegator)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn validator_delegations(&self, operator: &ValidatorAddress) -> Vec<Delegation> {
        let snapshot = self.snapshot();
        snapshot
            .staking
            .validator_delegations(operator)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn unbonding_delegations(
        &self,
        delegator: &AccountAddress,
        operator: &ValidatorAddress,
    ) -> Vec<UnbondingEntry> {
        let snapshot = self.snapshot();
        snapshot
            .staking
            .unbonding_delegations(delegator, operator)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn redelegations(&self, delegator: &AccountAddress) -> Vec<RedelegationEntry> {
        let snapshot = self.snapshot();
        snapshot
            .staking
            .redelegations(delegator)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn pool(&self) -> Pool {
        self.snapshot().staking.pool()
    }

    pub fn staking_params(&self) -> StakingParams {
        self.snapshot().staking.query_params()
    }

    /// Governance weight of `voter` at the last commit.
    pub fn voting_power(&self, voter: &AccountAddress) -> TokenAmount {
        self.snapshot().staking.bonded_amount_of(voter)
    }

    // ── Governance ─────────────────────────────────────────────────────

    pub fn proposal(&self, id: u64) -> Option<Proposal> {
        self.snapshot().governance.proposal(id).cloned()
    }

    pub fn proposals(&self, filter: &ProposalFilter) -> Vec<Proposal> {
        let snapshot = self.snapshot();
        snapshot
            .governance
            .proposals(filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn deposit(&self, id: u64, depositor: &AccountAddress) -> Option<Deposit> {
        self.snapshot().governance.deposit_of(id, depositor).cloned()
    }

    pub fn deposits(&self, id: u64) -> Vec<Deposit> {
        let snapshot = self.snapshot();
        snapshot.governance.deposits(id).into_iter().cloned().collect()
    }

    pub fn vote(&self, id: u64, voter: &AccountAddress) -> Option<Vote> {
        self.snapshot().governance.vote_of(id, voter).cloned()
    }

    pub fn votes(&self, id: u64) -> Vec<Vote> {
        let snapshot = self.snapshot();
        snapshot.governance.votes(id).into_iter().cloned().collect()
    }

    /// Live tally against committed stake while voting; stored result after.
    pub fn tally(&self, id: u64) -> Result<TallyResult, AppError> {
        let snapshot = self.snapshot();
        let power = snapshot.staking.power_provider();
        Ok(snapshot.governance.tally(id, &power)?)
    }

    pub fn gov_params(&self) -> GovParams {
        self.snapshot().governance.params().clone()
    }
}
