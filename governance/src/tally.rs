//! Stake-weighted tally.
//!
//! Power is read live from the [`VotingPowerProvider`] when the tally runs,
//! so stake moved during the voting window counts in its final position.

use crate::proposal::{ProposalStatus, TallyResult};
use crate::vote::{Vote, VoteOption};
use scloud_types::{Dec, GovParams, TokenAmount, VotingPowerProvider};

/// Outcome of tallying a proposal whose voting period has ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TallyOutcome {
    pub status: ProposalStatus,
    pub result: TallyResult,
    /// Deposits are burned on a missed quorum and refunded otherwise.
    pub burn_deposits: bool,
}

/// Sum current bonded power per option.
pub fn count_votes<'a>(
    votes: impl IntoIterator<Item = &'a Vote>,
    power: &dyn VotingPowerProvider,
) -> TallyResult {
    let mut result = TallyResult::default();
    for vote in votes {
        let weight = power.bonded_amount(&vote.voter);
        if weight.is_zero() {
            continue;
        }
        let slot = match vote.option {
            VoteOption::Yes => &mut result.yes,
            VoteOption::No => &mut result.no,
            VoteOption::Abstain => &mut result.abstain,
            VoteOption::NoWithVeto => &mut result.no_with_veto,
        };
        *slot = slot.saturating_add(weight);
    }
    result
}

/// `num / den` as a decimal; zero when `den` is zero.
fn ratio(num: TokenAmount, den: TokenAmount) -> Dec {
    Dec::from_ratio(num.raw(), den.raw()).unwrap_or(Dec::ZERO)
}

/// Decide a proposal from its counted votes.
///
/// - no bonded supply, or participation below quorum: `Failed`, deposits burned
/// - nobody voted other than abstain: `Rejected`
/// - `veto / (yes + no + veto) >= veto_threshold`: `Rejected`
/// - `yes / (yes + no) >= threshold`: `Passed`, otherwise `Rejected`
pub fn decide(result: TallyResult, total_bonded: TokenAmount, params: &GovParams) -> TallyOutcome {
    let outcome = |status, burn_deposits| TallyOutcome {
        status,
        result,
        burn_deposits,
    };

    if total_bonded.is_zero() {
        return outcome(ProposalStatus::Failed, true);
    }
    let participation = ratio(result.total(), total_bonded);
    if participation < params.quorum {
        return outcome(ProposalStatus::Failed, true);
    }

    let non_abstain = result
        .yes
        .saturating_add(result.no)
        .saturating_add(result.no_with_veto);
    if non_abstain.is_zero() {
        return outcome(ProposalStatus::Rejected, false);
    }
    if ratio(result.no_with_veto, non_abstain) >= params.veto_threshold {
        return outcome(ProposalStatus::Rejected, false);
    }

    let yes_no = result.yes.saturating_add(result.no);
    if !yes_no.is_zero() && ratio(result.yes, yes_no) >= params.threshold {
        return outcome(ProposalStatus::Passed, false);
    }
    outcome(ProposalStatus::Rejected, false)
}
