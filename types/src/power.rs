//! Read-only stake view consumed by governance.

use crate::address::AccountAddress;
use crate::amount::TokenAmount;

/// Bonded-stake snapshot computed from committed staking state at call time.
///
/// Implementations must not cache: governance relies on a live reading when
/// it tallies.
pub trait VotingPowerProvider {
    /// Tokens `voter` has bonded to validators in the active set.
    fn bonded_amount(&self, voter: &AccountAddress) -> TokenAmount;

    /// Total tokens bonded to the active set.
    fn total_bonded_supply(&self) -> TokenAmount;
}
