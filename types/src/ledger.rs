//! Account balance storage, owned outside the ledger.

use crate::address::AccountAddress;
use crate::amount::TokenAmount;
use crate::error::BalanceError;

/// Debit/credit interface to the external balance store.
///
/// A transfer is atomic: it either moves the full amount or changes nothing.
pub trait BalanceLedger {
    fn transfer(
        &mut self,
        from: &AccountAddress,
        to: &AccountAddress,
        amount: TokenAmount,
    ) -> Result<(), BalanceError>;

    fn balance(&self, account: &AccountAddress) -> TokenAmount;
}
