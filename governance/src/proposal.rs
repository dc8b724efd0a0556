//! Governance proposals and their lifecycle.

use crate::error::GovernanceError;
use crate::params::ParamChange;
use scloud_types::{AccountAddress, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_TITLE_LEN: usize = 140;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Proposal status. Transitions only move forward:
/// `DepositPeriod → {VotingPeriod, Failed}`, `VotingPeriod → {Passed, Rejected, Failed}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Collecting deposits until the minimum is reached.
    DepositPeriod,
    /// Open for votes until the voting period ends.
    VotingPeriod,
    Passed,
    /// Voted down or vetoed; deposits refunded.
    Rejected,
    /// Deposit period expired or quorum missed; deposits burned.
    Failed,
}

impl ProposalStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Passed | Self::Rejected | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepositPeriod => "deposit_period",
            Self::VotingPeriod => "voting_period",
            Self::Passed => "passed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a proposal asks for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalContent {
    /// Signalling only; nothing executes when it passes.
    Text { title: String, description: String },
    ParameterChange {
        title: String,
        description: String,
        changes: Vec<ParamChange>,
    },
    /// Pay `amount` from the community pool to `recipient`.
    CommunityPoolSpend {
        title: String,
        description: String,
        recipient: AccountAddress,
        amount: TokenAmount,
    },
}

impl ProposalContent {
    pub fn text(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Text {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Text { title, .. }
            | Self::ParameterChange { title, .. }
            | Self::CommunityPoolSpend { title, .. } => title,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Text { description, .. }
            | Self::ParameterChange { description, .. }
            | Self::CommunityPoolSpend { description, .. } => description,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ParameterChange { .. } => "parameter_change",
            Self::CommunityPoolSpend { .. } => "community_pool_spend",
        }
    }

    /// Structural validation, run before any state is touched.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        let title = self.title();
        if title.trim().is_empty() {
            return Err(GovernanceError::InvalidContent("title must not be empty".into()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(GovernanceError::InvalidContent(format!(
                "title longer than {MAX_TITLE_LEN} characters"
            )));
        }
        let description = self.description();
        if description.trim().is_empty() {
            return Err(GovernanceError::InvalidContent(
                "description must not be empty".into(),
            ));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(GovernanceError::InvalidContent(format!(
                "description longer than {MAX_DESCRIPTION_LEN} characters"
            )));
        }

        match self {
            Self::Text { .. } => Ok(()),
            Self::ParameterChange { changes, .. } => {
                if changes.is_empty() {
                    return Err(GovernanceError::InvalidContent(
                        "parameter change without changes".into(),
                    ));
                }
                changes.iter().try_for_each(ParamChange::validate)
            }
            Self::CommunityPoolSpend { amount, .. } => {
                if amount.is_zero() {
                    return Err(GovernanceError::InvalidContent(
                        "community pool spend of zero".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Voting power per option, in bonded tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub yes: TokenAmount,
    pub no: TokenAmount,
    pub abstain: TokenAmount,
    pub no_with_veto: TokenAmount,
}

impl TallyResult {
    pub fn total(&self) -> TokenAmount {
        self.yes
            .saturating_add(self.no)
            .saturating_add(self.abstain)
            .saturating_add(self.no_with_veto)
    }
}

/// A governance proposal. Never deleted; finished proposals keep their final tally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Monotonic, starting at 1.
    pub id: u64,
    pub proposer: AccountAddress,
    pub content: ProposalContent,
    pub status: ProposalStatus,
    pub submit_time: Timestamp,
    pub deposit_end_time: Timestamp,
    pub total_deposit: TokenAmount,
    pub voting_start_time: Option<Timestamp>,
    pub voting_end_time: Option<Timestamp>,
    pub final_tally: Option<TallyResult>,
}
