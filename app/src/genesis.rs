//! Genesis state: initial parameters and the founding validator set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use scloud_staking::NewValidator;
use scloud_types::{GovParams, StakingParams};

use crate::AppError;

/// A validator created at genesis. Its self-delegation is drawn from the
/// operator's account, which the balance ledger must already fund.
pub type GenesisValidator = NewValidator;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub staking_params: StakingParams,
    #[serde(default)]
    pub gov_params: GovParams,
    #[serde(default)]
    pub validators: Vec<GenesisValidator>,
}

impl GenesisState {
    pub fn from_json_str(s: &str) -> Result<Self, AppError> {
        let genesis: Self =
            serde_json::from_str(s).map_err(|e| AppError::Genesis(e.to_string()))?;
        genesis.validate()?;
        Ok(genesis)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::Genesis(e.to_string()))?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self).map_err(|e| AppError::Genesis(e.to_string()))
    }

    /// Reject duplicate operators or consensus keys, self-delegations below the
    /// minimum, and invalid parameters.
    pub fn validate(&self) -> Result<(), AppError> {
        self.staking_params
            .validate()
            .map_err(|e| AppError::Genesis(format!("staking params: {e}")))?;
        self.gov_params
            .validate()
            .map_err(|e| AppError::Genesis(format!("gov params: {e}")))?;

        let mut operators = BTreeSet::new();
        let mut keys = BTreeSet::new();
        for v in &self.validators {
            if !operators.insert(&v.operator) {
                return Err(AppError::Genesis(format!("duplicate validator {}", v.operator)));
            }
            if !keys.insert(&v.consensus_pubkey) {
                return Err(AppError::Genesis(format!(
                    "duplicate consensus key {}",
                    v.consensus_pubkey
                )));
            }
            let minimum = v
                .min_self_delegation
                .unwrap_or_default()
                .max(self.staking_params.min_self_delegation);
            if v.self_delegation.is_zero() || v.self_delegation < minimum {
                return Err(AppError::Genesis(format!(
                    "validator {} self delegation {} below minimum {}",
                    v.operator, v.self_delegation, minimum
                )));
            }
            v.commission
                .validate()
                .and_then(|_| v.description.validate())
                .map_err(|e| AppError::Genesis(format!("validator {}: {e}", v.operator)))?;
        }
        Ok(())
    }
}
