//! Chain configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use scloud_types::{GovParams, ModuleAccounts, StakingParams};

use crate::logging::LogFormat;
use crate::AppError;

/// Configuration for a chain instance.
///
/// Can be loaded from a TOML file via [`ChainConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every section is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Staking parameters used until genesis or governance replaces them.
    #[serde(default)]
    pub staking: StakingParams,

    /// Governance parameters used until genesis or governance replaces them.
    #[serde(default)]
    pub governance: GovParams,

    /// Module account addresses.
    #[serde(default)]
    pub modules: ModuleAccounts,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter, e.g. "info" or "debug,scloud_governance=trace".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ChainConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, AppError> {
        let config: Self = toml::from_str(s).map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, AppError> {
        toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.staking
            .validate()
            .map_err(|e| AppError::Config(format!("[staking] {e}")))?;
        self.governance
            .validate()
            .map_err(|e| AppError::Config(format!("[governance] {e}")))?;
        let m = &self.modules;
        let accounts = [
            &m.staking_pool,
            &m.governance_escrow,
            &m.burn_sink,
            &m.community_pool,
        ];
        for (i, a) in accounts.iter().enumerate() {
            if accounts[..i].contains(a) {
                return Err(AppError::Config(format!(
                    "[modules] account {a} is used twice"
                )));
            }
        }
        self.log_format()?;
        Ok(())
    }

    pub fn log_format(&self) -> Result<LogFormat, AppError> {
        self.log_format.parse()
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            staking: StakingParams::default(),
            governance: GovParams::default(),
            modules: ModuleAccounts::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scloud_types::{Dec, TokenAmount};

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ChainConfig::default();
        let toml_str = config.to_toml_string().expect("serializable");
        let parsed = ChainConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ChainConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.staking.max_validators, 100);
        assert_eq!(config.log_format, "human");
        assert_eq!(config.log_format().unwrap(), LogFormat::Human);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            log_format = "json"

            [staking]
            max_validators = 4

            [governance]
            quorum = "0.4"
            min_deposit = "500"
        "#;
        let config = ChainConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.staking.max_validators, 4);
        assert_eq!(config.staking.max_entries, 7); // default
        assert_eq!(config.governance.quorum, Dec::from_percent(40));
        assert_eq!(config.governance.min_deposit, TokenAmount::new(500));
        assert_eq!(config.log_format().unwrap(), LogFormat::Json);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let zero_set = "[staking]\nmax_validators = 0\n";
        assert!(matches!(
            ChainConfig::from_toml_str(zero_set),
            Err(AppError::Config(_))
        ));
        let bad_threshold = "[governance]\nthreshold = \"1.5\"\n";
        assert!(ChainConfig::from_toml_str(bad_threshold).is_err());
        assert!(ChainConfig::from_toml_str("log_format = \"xml\"").is_err());
    }

    #[test]
    fn shared_module_accounts_are_rejected() {
        let toml = r#"
            [modules]
            burn_sink = "scloud1stakingpool"
        "#;
        assert!(ChainConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ChainConfig::from_toml_file("/nonexistent/scloud.toml");
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
