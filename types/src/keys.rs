//! Consensus public keys.
//!
//! The ledger never verifies signatures; it only needs keys as unique, ordered
//! identifiers handed to the consensus layer alongside voting power.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte consensus public key, hex encoded when serialized.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConsensusPubKey([u8; 32]);

impl ConsensusPubKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let bytes = hex::decode(s).map_err(|_| ParseError::InvalidPubKey(s.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseError::InvalidPubKey(s.to_string()))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl TryFrom<String> for ConsensusPubKey {
    type Error = ParseError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<ConsensusPubKey> for String {
    fn from(k: ConsensusPubKey) -> Self {
        k.to_hex()
    }
}

impl fmt::Display for ConsensusPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
