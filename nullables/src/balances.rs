//! Nullable balance ledger — in-memory balances for testing.

use scloud_types::{AccountAddress, BalanceError, BalanceLedger, TokenAmount};
use std::collections::BTreeMap;

/// A recorded transfer, in application order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRecord {
    pub from: AccountAddress,
    pub to: AccountAddress,
    pub amount: TokenAmount,
}

/// An in-memory balance ledger.
///
/// Can be switched into an "unavailable" mode to exercise infrastructure
/// failures.
#[derive(Default)]
pub struct NullBalanceLedger {
    balances: BTreeMap<AccountAddress, TokenAmount>,
    transfers: Vec<TransferRecord>,
    unavailable: bool,
}

impl NullBalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: start with `amount` in `account`.
    pub fn with_balance(mut self, account: &AccountAddress, amount: u128) -> Self {
        self.set_balance(account, amount);
        self
    }

    pub fn set_balance(&mut self, account: &AccountAddress, amount: u128) {
        self.balances
            .insert(account.clone(), TokenAmount::new(amount));
    }

    /// Make every subsequent transfer fail with `BalanceError::Unavailable`.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// All successful transfers so far.
    pub fn transfers(&self) -> &[TransferRecord] {
        &self.transfers
    }

    /// Sum of every balance; constant under transfers.
    pub fn total_supply(&self) -> TokenAmount {
        self.balances
            .values()
            .fold(TokenAmount::ZERO, |acc, b| acc.saturating_add(*b))
    }
}

impl BalanceLedger for NullBalanceLedger {
    fn transfer(
        &mut self,
        from: &AccountAddress,
        to: &AccountAddress,
        amount: TokenAmount,
    ) -> Result<(), BalanceError> {
        if self.unavailable {
            return Err(BalanceError::Unavailable("null ledger switched off".into()));
        }
        let available = self.balance(from);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| BalanceError::InsufficientFunds {
                account: from.to_string(),
                needed: amount.raw(),
                available: available.raw(),
            })?;
        self.balances.insert(from.clone(), remaining);
        let credited = self.balance(to).saturating_add(amount);
        self.balances.insert(to.clone(), credited);
        self.transfers.push(TransferRecord {
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    fn balance(&self, account: &AccountAddress) -> TokenAmount {
        self.balances.get(account).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(name: &str) -> AccountAddress {
        AccountAddress::new(format!("scloud1{name}"))
    }

    #[test]
    fn transfer_moves_funds() {
        let mut ledger = NullBalanceLedger::new().with_balance(&addr("alice"), 100);
        ledger
            .transfer(&addr("alice"), &addr("bob"), TokenAmount::new(40))
            .unwrap();
        assert_eq!(ledger.balance(&addr("alice")).raw(), 60);
        assert_eq!(ledger.balance(&addr("bob")).raw(), 40);
        assert_eq!(ledger.total_supply().raw(), 100);
        assert_eq!(ledger.transfers().len(), 1);
    }

    #[test]
    fn overdraft_changes_nothing() {
        let mut ledger = NullBalanceLedger::new().with_balance(&addr("alice"), 10);
        let err = ledger
            .transfer(&addr("alice"), &addr("bob"), TokenAmount::new(11))
            .unwrap_err();
        assert!(matches!(err, BalanceError::InsufficientFunds { needed: 11, available: 10, .. }));
        assert_eq!(ledger.balance(&addr("alice")).raw(), 10);
        assert!(ledger.transfers().is_empty());
    }

    #[test]
    fn unavailable_mode_fails_transfers() {
        let mut ledger = NullBalanceLedger::new().with_balance(&addr("alice"), 10);
        ledger.set_unavailable(true);
        let err = ledger
            .transfer(&addr("alice"), &addr("bob"), TokenAmount::new(1))
            .unwrap_err();
        assert!(matches!(err, BalanceError::Unavailable(_)));
    }
}
