//! Account and validator-operator addresses.
//!
//! An operator address shares its body with the account that controls it; only the
//! prefix differs. Both types order lexicographically, which is the tie-break used
//! when ranking validators.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

fn check(raw: &str, prefix: &str) -> Result<(), ParseError> {
    match raw.strip_prefix(prefix) {
        Some(body) if !body.is_empty() && body.bytes().all(|b| b.is_ascii_alphanumeric()) => {
            Ok(())
        }
        _ => Err(ParseError::InvalidAddress(raw.to_string())),
    }
}

/// An account address, always prefixed with `scloud1`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress(String);

impl AccountAddress {
    pub const PREFIX: &'static str = "scloud1";

    /// Create an address from a string known to be well-formed.
    ///
    /// # Panics
    /// Panics if the string is not a valid account address. Use [`Self::parse`]
    /// for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(check(&s, Self::PREFIX).is_ok(), "malformed account address: {s}");
        Self(s)
    }

    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        check(raw, Self::PREFIX)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The operator address controlled by this account.
    pub fn to_validator(&self) -> ValidatorAddress {
        ValidatorAddress(format!(
            "{}{}",
            ValidatorAddress::PREFIX,
            &self.0[Self::PREFIX.len()..]
        ))
    }
}

/// A validator operator address, always prefixed with `scloudvaloper1`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValidatorAddress(String);

impl ValidatorAddress {
    pub const PREFIX: &'static str = "scloudvaloper1";

    /// # Panics
    /// Panics if the string is not a valid operator address.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(check(&s, Self::PREFIX).is_ok(), "malformed validator address: {s}");
        Self(s)
    }

    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        check(raw, Self::PREFIX)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The account that operates this validator and holds its self-delegation.
    pub fn to_account(&self) -> AccountAddress {
        AccountAddress(format!(
            "{}{}",
            AccountAddress::PREFIX,
            &self.0[Self::PREFIX.len()..]
        ))
    }
}

macro_rules! string_conversions {
    ($ty:ident) => {
        impl TryFrom<String> for $ty {
            type Error = ParseError;
            fn try_from(s: String) -> Result<Self, Self::Error> {
                check(&s, Self::PREFIX)?;
                Ok(Self(s))
            }
        }

        impl From<$ty> for String {
            fn from(a: $ty) -> Self {
                a.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_conversions!(AccountAddress);
string_conversions!(ValidatorAddress);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_and_account_share_a_body() {
        let acct = AccountAddress::new("scloud1alice");
        let val = acct.to_validator();
        assert_eq!(val.as_str(), "scloudvaloper1alice");
        assert_eq!(val.to_account(), acct);
    }

    #[test]
    fn parse_rejects_wrong_prefix_and_empty_body() {
        assert!(AccountAddress::parse("scloud1").is_err());
        assert!(AccountAddress::parse("cosmos1abc").is_err());
        assert!(ValidatorAddress::parse("scloud1abc").is_err());
        assert!(AccountAddress::parse("scloud1a b").is_err());
        assert!(ValidatorAddress::parse("scloudvaloper1abc").is_ok());
    }

    #[test]
    fn deserialize_validates() {
        let ok: AccountAddress = serde_json::from_str("\"scloud1bob\"").unwrap();
        assert_eq!(ok.as_str(), "scloud1bob");
        assert!(serde_json::from_str::<AccountAddress>("\"bob\"").is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = ValidatorAddress::new("scloudvaloper1aaa");
        let b = ValidatorAddress::new("scloudvaloper1aab");
        assert!(a < b);
    }
}
