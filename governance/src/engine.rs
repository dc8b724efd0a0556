//! Core governance engine: proposals through deposit, voting and tally.
//!
//! Deposits sit in the escrow account until the proposal finishes: refunded
//! per depositor when it passes or is rejected, burned when the deposit
//! period lapses or the vote misses quorum. Deadlines live in ordered
//! `(end_time, id)` indexes so the end-of-block sweep is deterministic.

use crate::error::GovernanceError;
use crate::events;
use crate::proposal::{Proposal, ProposalContent, ProposalStatus, TallyResult};
use crate::tally::{count_votes, decide};
use crate::vote::{Deposit, Vote, VoteOption};
use scloud_types::{
    AccountAddress, BalanceLedger, BlockInfo, Event, GovParams, ModuleAccounts, Timestamp,
    TokenAmount, VotingPowerProvider,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// What happened to one proposal during a sweep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalOutcome {
    pub id: u64,
    pub status: ProposalStatus,
    /// `None` for proposals that never reached a vote.
    pub tally: Option<TallyResult>,
    pub deposits_burned: bool,
}

/// Selection for [`GovernanceEngine::proposals`]. Empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalFilter {
    pub status: Option<ProposalStatus>,
    pub depositor: Option<AccountAddress>,
    pub voter: Option<AccountAddress>,
    /// Keep only the most recent `limit` matches.
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceEngine {
    params: GovParams,
    escrow: AccountAddress,
    burn_sink: AccountAddress,
    next_id: u64,
    proposals: BTreeMap<u64, Proposal>,
    deposits: BTreeMap<(u64, AccountAddress), Deposit>,
    votes: BTreeMap<(u64, AccountAddress), Vote>,
    /// DepositPeriod proposals by deposit end time.
    inactive_queue: BTreeSet<(Timestamp, u64)>,
    /// VotingPeriod proposals by voting end time.
    active_queue: BTreeSet<(Timestamp, u64)>,
    #[serde(skip)]
    pending_events: Vec<Event>,
}

impl GovernanceEngine {
    pub fn new(params: GovParams, accounts: &ModuleAccounts) -> Self {
        Self {
            params,
            escrow: accounts.governance_escrow.clone(),
            burn_sink: accounts.burn_sink.clone(),
            next_id: 1,
            proposals: BTreeMap::new(),
            deposits: BTreeMap::new(),
            votes: BTreeMap::new(),
            inactive_queue: BTreeSet::new(),
            active_queue: BTreeSet::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn params(&self) -> &GovParams {
        &self.params
    }

    /// Replace the parameters. Running proposals keep their deadlines.
    pub fn set_params(&mut self, params: GovParams) -> Result<(), GovernanceError> {
        params
            .validate()
            .map_err(|e| GovernanceError::InvalidInput(e.to_string()))?;
        info!(?params, "governance params updated");
        self.params = params;
        Ok(())
    }

    pub fn escrow_account(&self) -> &AccountAddress {
        &self.escrow
    }

    /// Drain the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events)
    }

    // ── Transactions ───────────────────────────────────────────────────

    /// Create a proposal, escrowing `initial_deposit`. Returns the new id.
    pub fn submit_proposal(
        &mut self,
        bank: &mut dyn BalanceLedger,
        block: BlockInfo,
        proposer: &AccountAddress,
        content: ProposalContent,
        initial_deposit: TokenAmount,
    ) -> Result<u64, GovernanceError> {
        content.validate()?;
        let id = self.next_id;
        let next_id = id.checked_add(1).ok_or(GovernanceError::Overflow)?;

        if !initial_deposit.is_zero() {
            bank.transfer(proposer, &self.escrow, initial_deposit)?;
        }

        let deposit_end_time = block.time.plus_secs(self.params.max_deposit_period_secs);
        let kind = content.kind();
        let proposal = Proposal {
            id,
            proposer: proposer.clone(),
            content,
            status: ProposalStatus::DepositPeriod,
            submit_time: block.time,
            deposit_end_time,
            total_deposit: initial_deposit,
            voting_start_time: None,
            voting_end_time: None,
            final_tally: None,
        };
        self.next_id = next_id;
        self.proposals.insert(id, proposal);
        self.inactive_queue.insert((deposit_end_time, id));
        if !initial_deposit.is_zero() {
            self.deposits.insert(
                (id, proposer.clone()),
                Deposit {
                    proposal_id: id,
                    depositor: proposer.clone(),
                    amount: initial_deposit,
                },
            );
        }

        info!(proposal_id = id, %proposer, kind, deposit = %initial_deposit, "proposal submitted");
        self.emit(
            Event::new(events::SUBMIT_PROPOSAL)
                .attr(events::ATTR_PROPOSAL_ID, id)
                .attr(events::ATTR_PROPOSAL_TYPE, kind)
                .attr(events::ATTR_PROPOSER, proposer)
                .attr(events::ATTR_AMOUNT, initial_deposit.raw()),
        );
        if initial_deposit >= self.params.min_deposit {
            self.start_voting(id, block.time)?;
        }
        Ok(id)
    }

    /// Add to a proposal's deposit. Returns `true` if this deposit opened voting.
    pub fn deposit(
        &mut self,
        bank: &mut dyn BalanceLedger,
        block: BlockInfo,
        id: u64,
        depositor: &AccountAddress,
        amount: TokenAmount,
    ) -> Result<bool, GovernanceError> {
        if amount.is_zero() {
            return Err(GovernanceError::InvalidInput("deposit must be positive".into()));
        }
        let proposal = self.proposal_in(id, ProposalStatus::DepositPeriod, "accept deposits")?;
        let total = proposal
            .total_deposit
            .checked_add(amount)
            .ok_or(GovernanceError::Overflow)?;
        let key = (id, depositor.clone());
        let previous = self
            .deposits
            .get(&key)
            .map(|d| d.amount)
            .unwrap_or(TokenAmount::ZERO);
        let own = previous.checked_add(amount).ok_or(GovernanceError::Overflow)?;

        bank.transfer(depositor, &self.escrow, amount)?;

        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.total_deposit = total;
        }
        self.deposits.insert(
            key,
            Deposit {
                proposal_id: id,
                depositor: depositor.clone(),
                amount: own,
            },
        );

        debug!(proposal_id = id, %depositor, %amount, total = %total, "deposit added");
        self.emit(
            Event::new(events::PROPOSAL_DEPOSIT)
                .attr(events::ATTR_PROPOSAL_ID, id)
                .attr(events::ATTR_DEPOSITOR, depositor)
                .attr(events::ATTR_AMOUNT, amount.raw()),
        );
        if total >= self.params.min_deposit {
            self.start_voting(id, block.time)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Record (or replace) `voter`'s vote. Stake is only looked at during the tally.
    pub fn vote(
        &mut self,
        id: u64,
        voter: &AccountAddress,
        option: VoteOption,
    ) -> Result<(), GovernanceError> {
        self.proposal_in(id, ProposalStatus::VotingPeriod, "accept votes")?;
        self.votes.insert(
            (id, voter.clone()),
            Vote {
                proposal_id: id,
                voter: voter.clone(),
                option,
            },
        );
        debug!(proposal_id = id, %voter, %option, "vote recorded");
        self.emit(
            Event::new(events::PROPOSAL_VOTE)
                .attr(events::ATTR_PROPOSAL_ID, id)
                .attr(events::ATTR_VOTER, voter)
                .attr(events::ATTR_OPTION, option),
        );
        Ok(())
    }

    // ── End of block ───────────────────────────────────────────────────

    /// Expire lapsed deposit periods, then tally finished voting periods,
    /// each in ascending `(end_time, id)` order.
    pub fn end_block_sweep(
        &mut self,
        bank: &mut dyn BalanceLedger,
        block: BlockInfo,
        power: &dyn VotingPowerProvider,
    ) -> Result<Vec<ProposalOutcome>, GovernanceError> {
        let now = block.time;
        let mut outcomes = Vec::new();

        while let Some(&(end, id)) = self.inactive_queue.first() {
            if end > now {
                break;
            }
            self.inactive_queue.remove(&(end, id));
            let total = self
                .proposal_in(id, ProposalStatus::DepositPeriod, "expire")
                .map_err(|e| GovernanceError::Inconsistent(e.to_string()))?
                .total_deposit;
            if !total.is_zero() {
                bank.transfer(&self.escrow, &self.burn_sink, total)?;
            }
            self.set_status(id, ProposalStatus::Failed, None);
            warn!(proposal_id = id, burned = %total, "deposit period expired, proposal failed");
            self.emit(
                Event::new(events::INACTIVE_PROPOSAL)
                    .attr(events::ATTR_PROPOSAL_ID, id)
                    .attr(events::ATTR_RESULT, ProposalStatus::Failed),
            );
            outcomes.push(ProposalOutcome {
                id,
                status: ProposalStatus::Failed,
                tally: None,
                deposits_burned: true,
            });
        }

        while let Some(&(end, id)) = self.active_queue.first() {
            if end > now {
                break;
            }
            self.active_queue.remove(&(end, id));
            let total = self
                .proposal_in(id, ProposalStatus::VotingPeriod, "tally")
                .map_err(|e| GovernanceError::Inconsistent(e.to_string()))?
                .total_deposit;
            let result = count_votes(self.votes_iter(id), power);
            let outcome = decide(result, power.total_bonded_supply(), &self.params);

            if outcome.burn_deposits {
                if !total.is_zero() {
                    bank.transfer(&self.escrow, &self.burn_sink, total)?;
                }
            } else {
                let refunds: Vec<(AccountAddress, TokenAmount)> = self
                    .deposits_iter(id)
                    .map(|d| (d.depositor.clone(), d.amount))
                    .collect();
                for (depositor, amount) in refunds {
                    bank.transfer(&self.escrow, &depositor, amount)?;
                }
            }
            self.set_status(id, outcome.status, Some(outcome.result));

            info!(
                proposal_id = id,
                status = %outcome.status,
                yes = %outcome.result.yes,
                no = %outcome.result.no,
                abstain = %outcome.result.abstain,
                no_with_veto = %outcome.result.no_with_veto,
                "proposal tallied"
            );
            self.emit(
                Event::new(events::ACTIVE_PROPOSAL)
                    .attr(events::ATTR_PROPOSAL_ID, id)
                    .attr(events::ATTR_RESULT, outcome.status),
            );
            outcomes.push(ProposalOutcome {
                id,
                status: outcome.status,
                tally: Some(outcome.result),
                deposits_burned: outcome.burn_deposits,
            });
        }

        Ok(outcomes)
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn proposal(&self, id: u64) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// Matching proposals in ascending id order.
    pub fn proposals(&self, filter: &ProposalFilter) -> Vec<&Proposal> {
        let mut matches: Vec<&Proposal> = self
            .proposals
            .values()
            .filter(|p| filter.status.map_or(true, |s| p.status == s))
            .filter(|p| {
                filter
                    .depositor
                    .as_ref()
                    .map_or(true, |d| self.deposits.contains_key(&(p.id, d.clone())))
            })
            .filter(|p| {
                filter
                    .voter
                    .as_ref()
                    .map_or(true, |v| self.votes.contains_key(&(p.id, v.clone())))
            })
            .collect();
        if let Some(limit) = filter.limit {
            let skip = matches.len().saturating_sub(limit);
            matches.drain(..skip);
        }
        matches
    }

    pub fn deposit_of(&self, id: u64, depositor: &AccountAddress) -> Option<&Deposit> {
        self.deposits.get(&(id, depositor.clone()))
    }

    pub fn deposits(&self, id: u64) -> Vec<&Deposit> {
        self.deposits_iter(id).collect()
    }

    pub fn vote_of(&self, id: u64, voter: &AccountAddress) -> Option<&Vote> {
        self.votes.get(&(id, voter.clone()))
    }

    pub fn votes(&self, id: u64) -> Vec<&Vote> {
        self.votes_iter(id).collect()
    }

    /// Live tally while voting, the stored result once finished.
    pub fn tally(
        &self,
        id: u64,
        power: &dyn VotingPowerProvider,
    ) -> Result<TallyResult, GovernanceError> {
        let proposal = self
            .proposals
            .get(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        match (proposal.status, proposal.final_tally) {
            (ProposalStatus::VotingPeriod, _) => Ok(count_votes(self.votes_iter(id), power)),
            (_, Some(result)) => Ok(result),
            (_, None) => Ok(TallyResult::default()),
        }
    }

    // ── Internal helpers ───────────────────────────────────────────────

    fn emit(&mut self, event: Event) {
        self.pending_events.push(event);
    }

    fn proposal_in(
        &self,
        id: u64,
        status: ProposalStatus,
        action: &'static str,
    ) -> Result<&Proposal, GovernanceError> {
        let proposal = self
            .proposals
            .get(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if proposal.status != status {
            return Err(GovernanceError::WrongStatus {
                id,
                status: proposal.status,
                action,
            });
        }
        Ok(proposal)
    }

    fn start_voting(&mut self, id: u64, now: Timestamp) -> Result<(), GovernanceError> {
        let end = now.plus_secs(self.params.voting_period_secs);
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        self.inactive_queue.remove(&(proposal.deposit_end_time, id));
        proposal.status = ProposalStatus::VotingPeriod;
        proposal.voting_start_time = Some(now);
        proposal.voting_end_time = Some(end);
        self.active_queue.insert((end, id));

        info!(proposal_id = id, voting_end_time = %end, "voting period started");
        self.emit(
            Event::new(events::VOTING_PERIOD_START).attr(events::ATTR_PROPOSAL_ID, id),
        );
        Ok(())
    }

    fn set_status(&mut self, id: u64, status: ProposalStatus, tally: Option<TallyResult>) {
        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.status = status;
            proposal.final_tally = tally;
        }
    }

    fn deposits_iter(&self, id: u64) -> impl Iterator<Item = &Deposit> {
        self.deposits.values().filter(move |d| d.proposal_id == id)
    }

    fn votes_iter(&self, id: u64) -> impl Iterator<Item = &Vote> {
        self.votes.values().filter(move |v| v.proposal_id == id)
    }
}
