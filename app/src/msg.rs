//! Transactions accepted by [`crate::Chain::deliver_tx`].

use serde::{Deserialize, Serialize};

use scloud_governance::{ProposalContent, VoteOption};
use scloud_staking::{Description, NewValidator};
use scloud_types::{AccountAddress, Dec, Event, TokenAmount, ValidatorAddress};

/// A signed-and-verified message. Authentication happens before the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Msg {
    CreateValidator(NewValidator),
    EditValidator {
        operator: ValidatorAddress,
        description: Option<Description>,
        commission_rate: Option<Dec>,
    },
    Delegate {
        delegator: AccountAddress,
        validator: ValidatorAddress,
        amount: TokenAmount,
    },
    Undelegate {
        delegator: AccountAddress,
        validator: ValidatorAddress,
        shares: Dec,
    },
    Redelegate {
        delegator: AccountAddress,
        src: ValidatorAddress,
        dst: ValidatorAddress,
        shares: Dec,
    },
    Unjail {
        operator: ValidatorAddress,
    },
    SubmitProposal {
        proposer: AccountAddress,
        content: ProposalContent,
        initial_deposit: TokenAmount,
    },
    Deposit {
        proposal_id: u64,
        depositor: AccountAddress,
        amount: TokenAmount,
    },
    Vote {
        proposal_id: u64,
        voter: AccountAddress,
        option: VoteOption,
    },
}

impl Msg {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateValidator(_) => "create_validator",
            Self::EditValidator { .. } => "edit_validator",
            Self::Delegate { .. } => "delegate",
            Self::Undelegate { .. } => "undelegate",
            Self::Redelegate { .. } => "redelegate",
            Self::Unjail { .. } => "unjail",
            Self::SubmitProposal { .. } => "submit_proposal",
            Self::Deposit { .. } => "deposit",
            Self::Vote { .. } => "vote",
        }
    }
}

/// Result of a successful transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    /// Set by SubmitProposal.
    pub proposal_id: Option<u64>,
    pub events: Vec<Event>,
}
