//! Event kinds emitted by the chain itself, on top of the component events.

pub const PROPOSAL_EXECUTED: &str = "proposal_executed";
/// A passed proposal could not be applied; it stays `passed`.
pub const PROPOSAL_EXECUTION_FAILED: &str = "proposal_execution_failed";

pub const ATTR_PROPOSAL_ID: &str = "proposal_id";
pub const ATTR_PROPOSAL_TYPE: &str = "proposal_type";
pub const ATTR_ERROR: &str = "error";
