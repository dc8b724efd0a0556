//! Event kinds and attribute keys emitted by the governance engine.

pub const SUBMIT_PROPOSAL: &str = "submit_proposal";
pub const PROPOSAL_DEPOSIT: &str = "proposal_deposit";
pub const PROPOSAL_VOTE: &str = "proposal_vote";
pub const VOTING_PERIOD_START: &str = "voting_period_start";
/// A proposal dropped out of the deposit period without reaching the minimum.
pub const INACTIVE_PROPOSAL: &str = "inactive_proposal";
/// A proposal finished its voting period.
pub const ACTIVE_PROPOSAL: &str = "active_proposal";

pub const ATTR_PROPOSAL_ID: &str = "proposal_id";
pub const ATTR_PROPOSAL_TYPE: &str = "proposal_type";
pub const ATTR_PROPOSER: &str = "proposer";
pub const ATTR_DEPOSITOR: &str = "depositor";
pub const ATTR_VOTER: &str = "voter";
pub const ATTR_OPTION: &str = "option";
pub const ATTR_AMOUNT: &str = "amount";
pub const ATTR_RESULT: &str = "proposal_result";
