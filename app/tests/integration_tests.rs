//! End-to-end block pipeline tests: genesis, transactions, the end-of-block
//! driver, proposal execution, commit hashes and committed queries, all on
//! nullable collaborators.

use scloud_app::{
    state_hash, AppError, Chain, ChainConfig, EndBlockOutcome, GenesisState, GenesisValidator,
    Msg,
};
use scloud_governance::{ParamChange, ProposalContent, ProposalFilter, ProposalStatus, VoteOption};
use scloud_nullables::{NullBalanceLedger, NullClock, NullEventSink};
use scloud_staking::{CommissionRates, Description, NewValidator, ValidatorStatus};
use scloud_types::{
    AccountAddress, BalanceLedger, ConsensusPubKey, Dec, ErrorKind, GovParams, ModuleAccounts,
    StakingParams, TokenAmount, ValidatorAddress,
};
use std::io::Write;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type TestChain = Chain<NullBalanceLedger, NullClock, NullEventSink>;

const BLOCK_SECS: u64 = 5;
const UNBONDING: u64 = 1_000;
const VOTING_PERIOD: u64 = 200;

fn account(name: &str) -> AccountAddress {
    AccountAddress::new(format!("scloud1{name}"))
}

fn operator(name: &str) -> ValidatorAddress {
    ValidatorAddress::new(format!("scloudvaloper1{name}"))
}

fn staking_params() -> StakingParams {
    StakingParams {
        power_reduction: 1,
        unbonding_duration_secs: UNBONDING,
        ..StakingParams::default()
    }
}

fn gov_params() -> GovParams {
    GovParams {
        min_deposit: TokenAmount::new(10),
        max_deposit_period_secs: 100,
        voting_period_secs: VOTING_PERIOD,
        quorum: Dec::from_percent(33),
        threshold: Dec::from_percent(50),
        veto_threshold: Dec::from_percent(33),
    }
}

fn config() -> ChainConfig {
    ChainConfig {
        staking: staking_params(),
        governance: gov_params(),
        ..ChainConfig::default()
    }
}

fn genesis_validator(name: &str, key: u8, amount: u128) -> GenesisValidator {
    NewValidator {
        operator: operator(name),
        consensus_pubkey: ConsensusPubKey::new([key; 32]),
        self_delegation: TokenAmount::new(amount),
        commission: CommissionRates::new(
            Dec::from_percent(5),
            Dec::from_percent(20),
            Dec::from_percent(1),
        ),
        description: Description::new(name),
        min_self_delegation: None,
    }
}

fn genesis() -> GenesisState {
    GenesisState {
        staking_params: staking_params(),
        gov_params: gov_params(),
        validators: vec![
            genesis_validator("alpha", 1, 60),
            genesis_validator("beta", 2, 40),
        ],
    }
}

fn bank() -> NullBalanceLedger {
    let mut bank = NullBalanceLedger::new();
    for name in ["alpha", "beta", "alice", "bob", "carol"] {
        bank.set_balance(&account(name), 10_000);
    }
    bank
}

/// A chain at height 1 with the genesis validators bonded and committed.
fn started_chain() -> TestChain {
    let mut chain = TestChain::new(
        &config(),
        bank(),
        NullClock::new(1, 1_000_000),
        NullEventSink::new(),
    )
    .unwrap();
    chain.init_genesis(genesis()).unwrap();
    chain.commit().unwrap();
    chain
}

/// Finish the current block, commit it and open the next one `secs` later.
fn next_block(chain: &mut TestChain, secs: u64) -> EndBlockOutcome {
    let outcome = chain.end_block().unwrap();
    chain.commit().unwrap();
    chain.clock().advance_block(secs);
    outcome
}

fn delegate(who: &str, validator: &str, amount: u128) -> Msg {
    Msg::Delegate {
        delegator: account(who),
        validator: operator(validator),
        amount: TokenAmount::new(amount),
    }
}

fn vote(id: u64, who: &str, option: VoteOption) -> Msg {
    Msg::Vote {
        proposal_id: id,
        voter: account(who),
        option,
    }
}

fn submit(who: &str, content: ProposalContent, deposit: u128) -> Msg {
    Msg::SubmitProposal {
        proposer: account(who),
        content,
        initial_deposit: TokenAmount::new(deposit),
    }
}

fn param_change(subspace: &str, key: &str, value: &str) -> ProposalContent {
    ProposalContent::ParameterChange {
        title: format!("set {key}"),
        description: format!("set {subspace}/{key} to {value}"),
        changes: vec![ParamChange::new(subspace, key, value)],
    }
}

fn pool_spend(recipient: &str, amount: u128) -> ProposalContent {
    ProposalContent::CommunityPoolSpend {
        title: "grant".into(),
        description: "pay the contributor".into(),
        recipient: account(recipient),
        amount: TokenAmount::new(amount),
    }
}

/// Submit, vote yes with enough stake, and run blocks until the proposal ends.
/// Returns the id, the block that finished the proposal and the block after.
fn pass_proposal(
    chain: &mut TestChain,
    content: ProposalContent,
) -> (u64, EndBlockOutcome, EndBlockOutcome) {
    let id = chain
        .deliver_tx(submit("bob", content, 10))
        .unwrap()
        .proposal_id
        .unwrap();
    chain.deliver_tx(vote(id, "alpha", VoteOption::Yes)).unwrap();
    next_block(chain, VOTING_PERIOD + 1);
    let finishing = next_block(chain, BLOCK_SECS);
    let following = next_block(chain, BLOCK_SECS);
    (id, finishing, following)
}

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

#[test]
fn genesis_bonds_validators_in_rank_order() {
    let mut chain = TestChain::new(
        &config(),
        bank(),
        NullClock::new(1, 1_000_000),
        NullEventSink::new(),
    )
    .unwrap();
    let updates = chain.init_genesis(genesis()).unwrap();
    let powers: Vec<(String, u64)> = updates
        .iter()
        .map(|u| (u.operator.to_string(), u.power))
        .collect();
    assert!(powers.contains(&("scloudvaloper1alpha".to_string(), 60)));
    assert!(powers.contains(&("scloudvaloper1beta".to_string(), 40)));

    // Nothing is visible to queriers until commit.
    let querier = chain.querier();
    assert!(querier.bonded_validators().is_empty());
    chain.commit().unwrap();
    let bonded: Vec<_> = querier
        .bonded_validators()
        .into_iter()
        .map(|v| v.operator)
        .collect();
    assert_eq!(bonded, vec![operator("alpha"), operator("beta")]);
    assert_eq!(querier.pool().bonded_tokens, TokenAmount::new(100));
}

#[test]
fn genesis_cannot_run_twice() {
    let mut chain = started_chain();
    let err = chain.init_genesis(genesis()).unwrap_err();
    assert!(matches!(err, AppError::Genesis(_)));
}

#[test]
fn genesis_with_unfunded_operator_is_rejected() {
    let mut chain = TestChain::new(
        &config(),
        NullBalanceLedger::new(),
        NullClock::new(1, 1_000_000),
        NullEventSink::new(),
    )
    .unwrap();
    assert!(matches!(
        chain.init_genesis(genesis()),
        Err(AppError::Genesis(_))
    ));
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[test]
fn delivered_events_reach_the_sink_in_order() {
    let mut chain = started_chain();
    chain.sink_mut().clear();

    let result = chain.deliver_tx(delegate("alice", "alpha", 100)).unwrap();
    assert_eq!(result.events.len(), 1);
    assert_eq!(result.events[0].kind, "delegate");
    assert_eq!(chain.sink().kinds(), vec!["delegate"]);

    let result = chain
        .deliver_tx(submit("bob", ProposalContent::text("hello", "world"), 10))
        .unwrap();
    assert_eq!(result.proposal_id, Some(1));
    assert_eq!(
        chain.sink().kinds(),
        vec!["delegate", "submit_proposal", "voting_period_start"]
    );
}

#[test]
fn rejected_tx_changes_nothing() {
    let mut chain = started_chain();
    chain.sink_mut().clear();
    let before = state_hash(chain.staking(), chain.governance()).unwrap();

    chain.bank_mut().set_unavailable(true);
    let err = chain.deliver_tx(delegate("alice", "alpha", 100)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    let err = chain
        .deliver_tx(submit("bob", ProposalContent::text("t", "d"), 10))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    chain.bank_mut().set_unavailable(false);

    let err = chain.deliver_tx(delegate("alice", "nobody", 100)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = chain.deliver_tx(vote(7, "alice", VoteOption::Yes)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(before, state_hash(chain.staking(), chain.governance()).unwrap());
    assert!(chain.sink().events().is_empty());
    assert_eq!(chain.bank().balance(&account("alice")), TokenAmount::new(10_000));
}

#[test]
fn undelegation_pays_out_at_end_block() {
    let mut chain = started_chain();
    chain.deliver_tx(delegate("alice", "alpha", 100)).unwrap();
    let shares = chain
        .staking()
        .delegation(&account("alice"), &operator("alpha"))
        .unwrap()
        .shares;
    chain
        .deliver_tx(Msg::Undelegate {
            delegator: account("alice"),
            validator: operator("alpha"),
            shares,
        })
        .unwrap();
    assert_eq!(chain.bank().balance(&account("alice")), TokenAmount::new(9_900));

    let outcome = next_block(&mut chain, UNBONDING);
    assert!(outcome.matured_unbondings.is_empty());

    let outcome = next_block(&mut chain, BLOCK_SECS);
    assert_eq!(outcome.matured_unbondings.len(), 1);
    assert_eq!(chain.bank().balance(&account("alice")), TokenAmount::new(10_000));
    assert!(outcome.events.iter().any(|e| e.kind == "complete_unbonding"));
}

#[test]
fn slash_burns_and_forwards_events() {
    let mut chain = started_chain();
    chain.sink_mut().clear();
    let accounts = ModuleAccounts::default();

    let outcome = chain
        .slash(&operator("alpha"), 1, Dec::from_percent(10))
        .unwrap();
    assert_eq!(outcome.total(), TokenAmount::new(6));
    assert_eq!(
        chain.staking().validator(&operator("alpha")).unwrap().tokens,
        TokenAmount::new(54)
    );
    assert_eq!(chain.bank().balance(&accounts.burn_sink), TokenAmount::new(6));
    assert_eq!(chain.sink().kinds(), vec!["slash"]);

    let err = chain
        .slash(&operator("alpha"), 99, Dec::from_percent(10))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ---------------------------------------------------------------------------
// Governance through the pipeline
// ---------------------------------------------------------------------------

#[test]
fn passed_parameter_change_shrinks_the_validator_set() {
    let mut chain = started_chain();
    let (id, finishing, following) =
        pass_proposal(&mut chain, param_change("staking", "max_validators", "1"));

    let finished = &finishing.finished_proposals;
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].id, id);
    assert_eq!(finished[0].status, ProposalStatus::Passed);
    assert!(finishing.events.iter().any(|e| e.kind == "proposal_executed"));
    assert_eq!(chain.staking().params().max_validators, 1);

    // The new size applies from the following block's recompute.
    let removal = following
        .validator_updates
        .iter()
        .find(|u| u.operator == operator("beta"))
        .unwrap();
    assert_eq!(removal.power, 0);
    assert_eq!(
        chain.staking().validator(&operator("beta")).unwrap().status,
        ValidatorStatus::Unbonding
    );

    // Deposit refunded to the proposer.
    assert_eq!(chain.bank().balance(&account("bob")), TokenAmount::new(10_000));
    let querier = chain.querier();
    assert_eq!(querier.staking_params().max_validators, 1);
    assert_eq!(querier.proposal(id).unwrap().status, ProposalStatus::Passed);
}

#[test]
fn passed_governance_change_updates_gov_params() {
    let mut chain = started_chain();
    pass_proposal(&mut chain, param_change("gov", "quorum", "0.5"));
    assert_eq!(chain.governance().params().quorum, Dec::from_percent(50));
}

#[test]
fn community_pool_spend_pays_recipient() {
    let mut chain = started_chain();
    let pool = ModuleAccounts::default().community_pool;
    chain.bank_mut().set_balance(&pool, 500);

    pass_proposal(&mut chain, pool_spend("carol", 300));
    assert_eq!(chain.bank().balance(&account("carol")), TokenAmount::new(10_300));
    assert_eq!(chain.bank().balance(&pool), TokenAmount::new(200));
}

#[test]
fn failed_execution_keeps_proposal_passed() {
    let mut chain = started_chain();
    let (id, finishing, _) = pass_proposal(&mut chain, pool_spend("carol", 300));

    let failure = finishing
        .events
        .iter()
        .find(|e| e.kind == "proposal_execution_failed")
        .unwrap();
    assert_eq!(failure.get("proposal_id"), Some(id.to_string().as_str()));
    assert_eq!(
        chain.governance().proposal(id).unwrap().status,
        ProposalStatus::Passed
    );
    assert_eq!(chain.bank().balance(&account("carol")), TokenAmount::new(10_000));
}

#[test]
fn quorum_miss_burns_deposit() {
    let mut chain = started_chain();
    let accounts = ModuleAccounts::default();
    let id = chain
        .deliver_tx(submit("bob", ProposalContent::text("t", "d"), 10))
        .unwrap()
        .proposal_id
        .unwrap();
    // Nobody votes.
    let outcome = next_block(&mut chain, VOTING_PERIOD + 1);
    assert!(outcome.finished_proposals.is_empty());
    let outcome = next_block(&mut chain, BLOCK_SECS);
    assert_eq!(outcome.finished_proposals[0].id, id);
    assert_eq!(outcome.finished_proposals[0].status, ProposalStatus::Failed);
    assert!(outcome.finished_proposals[0].deposits_burned);
    assert_eq!(chain.bank().balance(&accounts.burn_sink), TokenAmount::new(10));
}

#[test]
fn tally_follows_stake_moved_during_voting() {
    let mut chain = started_chain();
    let id = chain
        .deliver_tx(submit("bob", ProposalContent::text("t", "d"), 10))
        .unwrap()
        .proposal_id
        .unwrap();
    chain.deliver_tx(delegate("alice", "beta", 100)).unwrap();
    chain.deliver_tx(vote(id, "alice", VoteOption::No)).unwrap();
    chain.deliver_tx(vote(id, "alpha", VoteOption::Yes)).unwrap();
    next_block(&mut chain, BLOCK_SECS);

    let querier = chain.querier();
    let tally = querier.tally(id).unwrap();
    assert_eq!(tally.no, TokenAmount::new(100));
    assert_eq!(tally.yes, TokenAmount::new(60));

    // Alice unbonds half before the end: her weight drops with it.
    let shares = chain
        .staking()
        .delegation(&account("alice"), &operator("beta"))
        .unwrap()
        .shares;
    chain
        .deliver_tx(Msg::Undelegate {
            delegator: account("alice"),
            validator: operator("beta"),
            shares: shares.checked_quo(Dec::from_int(2).unwrap()).unwrap(),
        })
        .unwrap();
    next_block(&mut chain, VOTING_PERIOD);
    let outcome = next_block(&mut chain, BLOCK_SECS);
    let finished = &outcome.finished_proposals[0];
    assert_eq!(finished.tally.unwrap().no, TokenAmount::new(50));
    assert_eq!(finished.status, ProposalStatus::Passed);
}

// ---------------------------------------------------------------------------
// Commit and queries
// ---------------------------------------------------------------------------

fn scripted_run() -> Vec<String> {
    let mut chain = started_chain();
    let mut hashes = vec![chain.last_app_hash().to_hex()];
    chain.deliver_tx(delegate("alice", "alpha", 100)).unwrap();
    chain.deliver_tx(delegate("bob", "beta", 50)).unwrap();
    next_block(&mut chain, BLOCK_SECS);
    hashes.push(chain.last_app_hash().to_hex());

    let id = chain
        .deliver_tx(submit("carol", param_change("gov", "threshold", "0.6"), 10))
        .unwrap()
        .proposal_id
        .unwrap();
    chain.deliver_tx(vote(id, "alice", VoteOption::Yes)).unwrap();
    chain
        .deliver_tx(Msg::Redelegate {
            delegator: account("bob"),
            src: operator("beta"),
            dst: operator("alpha"),
            shares: Dec::from_int(20).unwrap(),
        })
        .unwrap();
    chain.slash(&operator("beta"), 2, Dec::from_percent(5)).unwrap();
    next_block(&mut chain, VOTING_PERIOD + 1);
    hashes.push(chain.last_app_hash().to_hex());
    next_block(&mut chain, BLOCK_SECS);
    hashes.push(chain.last_app_hash().to_hex());
    hashes
}

#[test]
fn replay_produces_identical_app_hashes() {
    let first = scripted_run();
    let second = scripted_run();
    assert_eq!(first, second);
    // Every block changed something.
    for pair in first.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
}

#[test]
fn queries_are_idempotent_between_commits() {
    let mut chain = started_chain();
    chain.deliver_tx(delegate("alice", "alpha", 100)).unwrap();
    let id = chain
        .deliver_tx(submit("bob", ProposalContent::text("t", "d"), 10))
        .unwrap()
        .proposal_id
        .unwrap();
    chain.deliver_tx(vote(id, "alice", VoteOption::Yes)).unwrap();
    next_block(&mut chain, BLOCK_SECS);

    let querier = chain.querier();
    let filter = ProposalFilter {
        voter: Some(account("alice")),
        ..ProposalFilter::default()
    };
    assert_eq!(querier.proposals(&filter), querier.proposals(&filter));
    assert_eq!(querier.tally(id).unwrap(), querier.tally(id).unwrap());
    assert_eq!(querier.pool(), querier.pool());
    assert_eq!(querier.votes(id).len(), 1);
    assert_eq!(querier.voting_power(&account("alice")), TokenAmount::new(100));

    // Uncommitted changes stay invisible.
    chain.deliver_tx(delegate("carol", "alpha", 5)).unwrap();
    assert!(querier.delegation(&account("carol"), &operator("alpha")).is_none());
    assert_eq!(querier.app_hash(), chain.last_app_hash());
}

#[test]
fn querier_serves_other_threads() {
    let mut chain = started_chain();
    chain.deliver_tx(delegate("alice", "beta", 100)).unwrap();
    next_block(&mut chain, BLOCK_SECS);

    let querier = chain.querier();
    let handle = std::thread::spawn(move || {
        querier
            .bonded_validators()
            .into_iter()
            .map(|v| v.operator)
            .collect::<Vec<_>>()
    });
    let bonded = handle.join().unwrap();
    assert_eq!(bonded, vec![operator("beta"), operator("alpha")]);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn chain_starts_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
log_format = "json"

[staking]
power_reduction = 1
max_validators = 1

[governance]
min_deposit = "10"
"#
    )
    .unwrap();

    let config = ChainConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.staking.max_validators, 1);

    let mut chain = TestChain::new(
        &config,
        bank(),
        NullClock::new(1, 1_000_000),
        NullEventSink::new(),
    )
    .unwrap();
    let genesis = GenesisState {
        staking_params: config.staking.clone(),
        gov_params: config.governance.clone(),
        ..genesis()
    };
    let updates = chain.init_genesis(genesis).unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].operator, operator("alpha"));
}

#[test]
fn invalid_config_refuses_to_start() {
    let config = ChainConfig {
        staking: StakingParams {
            max_entries: 0,
            ..StakingParams::default()
        },
        ..ChainConfig::default()
    };
    let result = TestChain::new(
        &config,
        bank(),
        NullClock::new(1, 0),
        NullEventSink::new(),
    );
    assert!(matches!(result, Err(AppError::Config(_))));
}
