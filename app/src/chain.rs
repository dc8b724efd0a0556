//! The chain application: routes transactions to the staking ledger and the
//! governance engine, drives the end-of-block pipeline, and commits.
//!
//! Block lifecycle, as driven by the consensus layer:
//!
//! 1. [`Chain::deliver_tx`] for every transaction (and [`Chain::slash`] for
//!    evidence), in block order.
//! 2. [`Chain::end_block`]: staking maturity, bonded-set recompute,
//!    governance sweep, execution of passed proposals.
//! 3. [`Chain::commit`]: app hash and a new read snapshot for queries.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use scloud_governance::{
    apply_gov_changes, apply_staking_changes, GovernanceEngine, GovernanceError,
    ProposalContent, ProposalOutcome, ProposalStatus,
};
use scloud_staking::{SlashOutcome, StakingLedger, UnbondingEntry, ValidatorUpdate};
use scloud_types::{
    AccountAddress, BalanceLedger, BlockClock, BlockHeight, BlockInfo, Dec, Event, EventSink,
    ValidatorAddress,
};

use crate::commit::{state_hash, AppHash};
use crate::config::ChainConfig;
use crate::events;
use crate::genesis::GenesisState;
use crate::msg::{Msg, TxResult};
use crate::query::{Querier, SharedSnapshot, Snapshot};
use crate::AppError;

/// Everything `end_block` produced, for the consensus layer and for logs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndBlockOutcome {
    pub block: BlockInfo,
    /// Consensus power changes; power 0 removes a validator.
    pub validator_updates: Vec<ValidatorUpdate>,
    pub matured_unbondings: Vec<UnbondingEntry>,
    pub finished_proposals: Vec<ProposalOutcome>,
    pub events: Vec<Event>,
}

pub struct Chain<B, C, S> {
    staking: StakingLedger,
    governance: GovernanceEngine,
    community_pool: AccountAddress,
    bank: B,
    clock: C,
    sink: S,
    committed: SharedSnapshot,
    last_app_hash: AppHash,
}

impl<B, C, S> Chain<B, C, S>
where
    B: BalanceLedger,
    C: BlockClock,
    S: EventSink,
{
    pub fn new(config: &ChainConfig, bank: B, clock: C, sink: S) -> Result<Self, AppError> {
        config.validate()?;
        let staking = StakingLedger::new(config.staking.clone(), &config.modules);
        let governance = GovernanceEngine::new(config.governance.clone(), &config.modules);
        let app_hash = state_hash(&staking, &governance)?;
        let snapshot = Snapshot {
            block: clock.info(),
            app_hash,
            staking: staking.clone(),
            governance: governance.clone(),
        };
        Ok(Self {
            staking,
            governance,
            community_pool: config.modules.community_pool.clone(),
            bank,
            clock,
            sink,
            committed: Arc::new(RwLock::new(Arc::new(snapshot))),
            last_app_hash: app_hash,
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────

    /// Uncommitted staking state.
    pub fn staking(&self) -> &StakingLedger {
        &self.staking
    }

    /// Uncommitted governance state.
    pub fn governance(&self) -> &GovernanceEngine {
        &self.governance
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn last_app_hash(&self) -> AppHash {
        self.last_app_hash
    }

    /// A read handle on the committed state, usable from other threads.
    pub fn querier(&self) -> Querier {
        Querier::new(Arc::clone(&self.committed))
    }

    // ── Genesis ────────────────────────────────────────────────────────

    /// Load the genesis parameters and validators and compute the initial
    /// bonded set. Only valid on an empty chain.
    pub fn init_genesis(&mut self, genesis: GenesisState) -> Result<Vec<ValidatorUpdate>, AppError> {
        genesis.validate()?;
        if !self.staking.validators(None).is_empty() || self.governance.proposal(1).is_some() {
            return Err(AppError::Genesis("chain already has state".into()));
        }
        let block = self.clock.info();

        self.staking.set_params(genesis.staking_params)?;
        self.governance.set_params(genesis.gov_params)?;
        let count = genesis.validators.len();
        for validator in genesis.validators {
            let operator = validator.operator.clone();
            if let Err(e) = self.staking.create_validator(&mut self.bank, block, validator) {
                error!(validator = %operator, error = %e, "genesis validator rejected");
                return Err(AppError::Genesis(format!("validator {operator}: {e}")));
            }
        }
        let updates = self.staking.compute_bonded_set(block);
        let events = self.drain_events();
        self.publish(&events);
        info!(
            height = block.height,
            validators = count,
            bonded = updates.len(),
            "genesis loaded"
        );
        Ok(updates)
    }

    // ── Transactions ───────────────────────────────────────────────────

    /// Apply one transaction. A rejected transaction changes nothing and
    /// emits nothing.
    pub fn deliver_tx(&mut self, msg: Msg) -> Result<TxResult, AppError> {
        let block = self.clock.info();
        let name = msg.name();
        let outcome = self.route(block, msg);
        let events = self.drain_events();
        match outcome {
            Ok(proposal_id) => {
                self.publish(&events);
                debug!(height = block.height, msg = name, events = events.len(), "tx delivered");
                Ok(TxResult {
                    proposal_id,
                    events,
                })
            }
            Err(e) => {
                debug!(height = block.height, msg = name, error = %e, "tx rejected");
                Err(e)
            }
        }
    }

    fn route(&mut self, block: BlockInfo, msg: Msg) -> Result<Option<u64>, AppError> {
        match msg {
            Msg::CreateValidator(new) => {
                self.staking.create_validator(&mut self.bank, block, new)?;
            }
            Msg::EditValidator {
                operator,
                description,
                commission_rate,
            } => {
                self.staking
                    .edit_validator(block, &operator, description, commission_rate)?;
            }
            Msg::Delegate {
                delegator,
                validator,
                amount,
            } => {
                self.staking
                    .delegate(&mut self.bank, &delegator, &validator, amount)?;
            }
            Msg::Undelegate {
                delegator,
                validator,
                shares,
            } => {
                self.staking.undelegate(block, &delegator, &validator, shares)?;
            }
            Msg::Redelegate {
                delegator,
                src,
                dst,
                shares,
            } => {
                self.staking.redelegate(block, &delegator, &src, &dst, shares)?;
            }
            Msg::Unjail { operator } => {
                self.staking.unjail(&operator)?;
            }
            Msg::SubmitProposal {
                proposer,
                content,
                initial_deposit,
            } => {
                let id = self.governance.submit_proposal(
                    &mut self.bank,
                    block,
                    &proposer,
                    content,
                    initial_deposit,
                )?;
                return Ok(Some(id));
            }
            Msg::Deposit {
                proposal_id,
                depositor,
                amount,
            } => {
                self.governance
                    .deposit(&mut self.bank, block, proposal_id, &depositor, amount)?;
            }
            Msg::Vote {
                proposal_id,
                voter,
                option,
            } => {
                self.governance.vote(proposal_id, &voter, option)?;
            }
        }
        Ok(None)
    }

    /// Evidence entry point: burn `fraction` of `validator`'s stake for an
    /// infraction committed at `infraction_height`.
    pub fn slash(
        &mut self,
        validator: &ValidatorAddress,
        infraction_height: BlockHeight,
        fraction: Dec,
    ) -> Result<SlashOutcome, AppError> {
        let block = self.clock.info();
        let result = self.staking.slash(
            &mut self.bank,
            block,
            validator,
            infraction_height,
            fraction,
        );
        let events = self.drain_events();
        let outcome = result?;
        self.publish(&events);
        Ok(outcome)
    }

    // ── End of block ───────────────────────────────────────────────────

    /// Run the end-of-block pipeline. Any error is fatal: the block must not
    /// be committed.
    pub fn end_block(&mut self) -> Result<EndBlockOutcome, AppError> {
        let block = self.clock.info();

        let maturity = self
            .staking
            .end_block_maturity(&mut self.bank, block)
            .map_err(|e| halt(block, "staking maturity", &e))?;

        let validator_updates = self.staking.compute_bonded_set(block);

        let power = self.staking.power_provider();
        let finished_proposals = self
            .governance
            .end_block_sweep(&mut self.bank, block, &power)
            .map_err(|e| halt(block, "governance sweep", &e))?;

        let mut events = self.drain_events();
        for outcome in &finished_proposals {
            if outcome.status == ProposalStatus::Passed {
                events.push(self.execute_proposal(outcome.id));
            }
        }
        self.publish(&events);

        if !validator_updates.is_empty() || !finished_proposals.is_empty() {
            info!(
                height = block.height,
                validator_updates = validator_updates.len(),
                matured_unbondings = maturity.completed_unbondings.len(),
                finished_proposals = finished_proposals.len(),
                "end block"
            );
        }
        Ok(EndBlockOutcome {
            block,
            validator_updates,
            matured_unbondings: maturity.completed_unbondings,
            finished_proposals,
            events,
        })
    }

    /// Apply a passed proposal, returning the event describing the result.
    /// Failure leaves the proposal `Passed` and the state untouched.
    fn execute_proposal(&mut self, id: u64) -> Event {
        let kind = self
            .governance
            .proposal(id)
            .map_or("unknown", |p| p.content.kind());
        match self.try_execute(id) {
            Ok(()) => {
                info!(proposal_id = id, kind, "proposal executed");
                Event::new(events::PROPOSAL_EXECUTED)
                    .attr(events::ATTR_PROPOSAL_ID, id)
                    .attr(events::ATTR_PROPOSAL_TYPE, kind)
            }
            Err(e) => {
                warn!(proposal_id = id, kind, error = %e, "proposal execution failed");
                Event::new(events::PROPOSAL_EXECUTION_FAILED)
                    .attr(events::ATTR_PROPOSAL_ID, id)
                    .attr(events::ATTR_PROPOSAL_TYPE, kind)
                    .attr(events::ATTR_ERROR, e)
            }
        }
    }

    fn try_execute(&mut self, id: u64) -> Result<(), AppError> {
        let content = self
            .governance
            .proposal(id)
            .map(|p| p.content.clone())
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        match content {
            ProposalContent::Text { .. } => Ok(()),
            ProposalContent::ParameterChange { changes, .. } => {
                // Both parameter sets are computed before either is replaced.
                let staking = apply_staking_changes(&changes, self.staking.params())?;
                let governance = apply_gov_changes(&changes, self.governance.params())?;
                if &staking != self.staking.params() {
                    self.staking.set_params(staking)?;
                }
                if &governance != self.governance.params() {
                    self.governance.set_params(governance)?;
                }
                Ok(())
            }
            ProposalContent::CommunityPoolSpend {
                recipient, amount, ..
            } => {
                self.bank.transfer(&self.community_pool, &recipient, amount)?;
                Ok(())
            }
        }
    }

    // ── Commit ─────────────────────────────────────────────────────────

    /// Hash the state and publish it to queriers.
    pub fn commit(&mut self) -> Result<AppHash, AppError> {
        let block = self.clock.info();
        let app_hash = state_hash(&self.staking, &self.governance)?;
        let snapshot = Arc::new(Snapshot {
            block,
            app_hash,
            staking: self.staking.clone(),
            governance: self.governance.clone(),
        });
        *self.committed.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
        self.last_app_hash = app_hash;
        info!(height = block.height, app_hash = %app_hash, "committed");
        Ok(app_hash)
    }

    // ── Internal helpers ───────────────────────────────────────────────

    /// Pending component events: staking first, then governance.
    fn drain_events(&mut self) -> Vec<Event> {
        let mut events = self.staking.take_events();
        events.extend(self.governance.take_events());
        events
    }

    fn publish(&mut self, events: &[Event]) {
        for event in events {
            self.sink.emit(event);
        }
    }
}

fn halt(block: BlockInfo, stage: &str, err: &dyn std::fmt::Display) -> AppError {
    error!(height = block.height, stage, error = %err, "end block halted");
    AppError::Fatal(format!("{stage} at height {}: {err}", block.height))
}
