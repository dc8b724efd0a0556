//! App hash over the committed staking and governance state.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

use scloud_governance::GovernanceEngine;
use scloud_staking::StakingLedger;

use crate::AppError;

type Blake2b256 = Blake2b<U32>;

/// Blake2b-256 digest of the bincode-encoded ledger state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppHash([u8; 32]);

impl AppHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for AppHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash staking then governance state. Both use ordered maps only, so equal
/// state always encodes to equal bytes.
pub fn state_hash(
    staking: &StakingLedger,
    governance: &GovernanceEngine,
) -> Result<AppHash, AppError> {
    let staking_bytes =
        bincode::serialize(staking).map_err(|e| AppError::Encoding(format!("staking: {e}")))?;
    let governance_bytes = bincode::serialize(governance)
        .map_err(|e| AppError::Encoding(format!("governance: {e}")))?;

    let mut hasher = Blake2b256::new();
    hasher.update(&staking_bytes);
    hasher.update(&governance_bytes);
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    Ok(AppHash(output))
}
