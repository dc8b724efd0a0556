//! Proposal governance for the scloud chain.
//!
//! Lifecycle: DepositPeriod → VotingPeriod → Passed | Rejected | Failed.
//! A proposal that does not collect the minimum deposit in time fails and its
//! deposits are burned. Votes are weighted by bonded stake read live from a
//! [`scloud_types::VotingPowerProvider`] when the voting period ends.
//!
//! The engine never touches staking state. Executing a passed proposal is the
//! application's job.

pub mod engine;
pub mod error;
pub mod events;
pub mod params;
pub mod proposal;
pub mod tally;
pub mod vote;

pub use engine::{GovernanceEngine, ProposalFilter, ProposalOutcome};
pub use error::GovernanceError;
pub use params::{apply_gov_changes, apply_staking_changes, GovernableParam, ParamChange};
pub use proposal::{Proposal, ProposalContent, ProposalStatus, TallyResult};
pub use tally::TallyOutcome;
pub use vote::{Deposit, Vote, VoteOption};
