//! Validator records and delegation-share arithmetic.
//!
//! A validator holds `tokens` on behalf of all its delegators, who own it
//! proportionally through `delegator_shares`. Delegating mints shares at the
//! current exchange rate; slashing only shrinks `tokens`, so every delegator
//! absorbs the loss without any per-delegation update.

use crate::error::StakingError;
use crate::queue::QueueKey;
use scloud_types::dec::mul_div;
use scloud_types::{BlockHeight, ConsensusPubKey, Dec, Timestamp, TokenAmount, ValidatorAddress};
use serde::{Deserialize, Serialize};

/// Minimum seconds between two commission-rate changes.
pub const COMMISSION_UPDATE_INTERVAL_SECS: u64 = 24 * 3600;

/// Bonding status of a validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidatorStatus {
    Unbonded,
    /// Left the active set; still slashable until the unbonding period ends.
    Unbonding,
    Bonded,
}

/// Human-facing validator metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub moniker: String,
    pub identity: String,
    pub website: String,
    pub details: String,
}

impl Description {
    pub fn new(moniker: impl Into<String>) -> Self {
        Self {
            moniker: moniker.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), StakingError> {
        let limits = [
            ("moniker", &self.moniker, 70),
            ("identity", &self.identity, 3000),
            ("website", &self.website, 140),
            ("details", &self.details, 280),
        ];
        if self.moniker.trim().is_empty() {
            return Err(StakingError::InvalidInput("moniker must not be empty".into()));
        }
        for (field, value, max) in limits {
            if value.chars().count() > max {
                return Err(StakingError::InvalidInput(format!(
                    "{field} longer than {max} characters"
                )));
            }
        }
        Ok(())
    }
}

/// Commission parameters fixed at creation (except `rate`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRates {
    pub rate: Dec,
    pub max_rate: Dec,
    pub max_change_rate: Dec,
}

impl CommissionRates {
    pub fn new(rate: Dec, max_rate: Dec, max_change_rate: Dec) -> Self {
        Self {
            rate,
            max_rate,
            max_change_rate,
        }
    }

    pub fn validate(&self) -> Result<(), StakingError> {
        if self.max_rate > Dec::ONE {
            return Err(StakingError::InvalidInput("commission max rate above 1".into()));
        }
        if self.rate > self.max_rate {
            return Err(StakingError::InvalidInput(
                "commission rate above max rate".into(),
            ));
        }
        if self.max_change_rate > self.max_rate {
            return Err(StakingError::InvalidInput(
                "commission max change rate above max rate".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub rates: CommissionRates,
    /// Block time of the last rate change.
    pub update_time: Timestamp,
}

/// A validator and its pooled stake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator: ValidatorAddress,
    pub consensus_pubkey: ConsensusPubKey,
    pub status: ValidatorStatus,
    /// Excluded from the bonded set until unjailed.
    pub jailed: bool,
    pub tokens: TokenAmount,
    pub delegator_shares: Dec,
    pub description: Description,
    pub commission: Commission,
    /// The operator's own stake must stay at or above this value.
    pub min_self_delegation: TokenAmount,
    pub unbonding_height: BlockHeight,
    pub unbonding_completion_time: Timestamp,
    /// Position in the validator unbonding queue while `Unbonding`.
    pub unbonding_queue_key: Option<QueueKey>,
}

impl Validator {
    pub fn is_bonded(&self) -> bool {
        self.status == ValidatorStatus::Bonded
    }

    /// Tokens per share. One for a validator without shares.
    pub fn exchange_rate(&self) -> Dec {
        if self.delegator_shares.is_zero() {
            return Dec::ONE;
        }
        Dec::from_ratio(self.tokens.raw(), 1)
            .and_then(|t| t.checked_quo(self.delegator_shares))
            .unwrap_or(Dec::ZERO)
    }

    /// Shares minted for `amount` tokens at the current exchange rate.
    pub fn shares_from_tokens(&self, amount: TokenAmount) -> Result<Dec, StakingError> {
        if self.tokens.is_zero() {
            if !self.delegator_shares.is_zero() {
                return Err(StakingError::InvalidState(format!(
                    "validator {} has shares but no tokens",
                    self.operator
                )));
            }
            return Dec::from_int(amount.raw()).ok_or(StakingError::Overflow);
        }
        mul_div(amount.raw(), self.delegator_shares.raw(), self.tokens.raw())
            .map(Dec::from_raw)
            .ok_or(StakingError::Overflow)
    }

    /// Token value of `shares`, truncated. The last shares out take every
    /// remaining token so no dust is stranded.
    pub fn tokens_from_shares(&self, shares: Dec) -> TokenAmount {
        if shares >= self.delegator_shares {
            return self.tokens;
        }
        mul_div(shares.raw(), self.tokens.raw(), self.delegator_shares.raw())
            .map(TokenAmount::new)
            .unwrap_or(self.tokens)
    }

    /// Add delegated tokens, returning the shares minted.
    pub fn add_tokens_from_delegation(
        &mut self,
        amount: TokenAmount,
    ) -> Result<Dec, StakingError> {
        let shares = self.shares_from_tokens(amount)?;
        self.tokens = self
            .tokens
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;
        self.delegator_shares = self
            .delegator_shares
            .checked_add(shares)
            .ok_or(StakingError::Overflow)?;
        Ok(shares)
    }

    /// Remove delegator shares, returning the tokens they were worth.
    pub fn remove_delegator_shares(&mut self, shares: Dec) -> TokenAmount {
        let tokens = self.tokens_from_shares(shares);
        self.delegator_shares = self.delegator_shares.saturating_sub(shares);
        self.tokens = self.tokens.saturating_sub(tokens);
        tokens
    }

    /// Burn `amount` tokens, leaving shares untouched.
    pub fn remove_tokens(&mut self, amount: TokenAmount) {
        self.tokens = self.tokens.saturating_sub(amount);
    }

    pub fn consensus_power(&self, power_reduction: u64) -> u64 {
        consensus_power(self.tokens.raw(), power_reduction)
    }

    /// Nothing left to track: no tokens, no shares, not in the active set.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_zero()
            && self.delegator_shares.is_zero()
            && self.status == ValidatorStatus::Unbonded
    }
}

/// Consensus power of `tokens`, saturating at `u64::MAX`.
pub fn consensus_power(tokens: u128, power_reduction: u64) -> u64 {
    let power = tokens.checked_div(u128::from(power_reduction)).unwrap_or(0);
    u64::try_from(power).unwrap_or(u64::MAX)
}
