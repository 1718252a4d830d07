// Genesis parameter file.
//
// Read with the `config` crate: format chosen by file extension, then overlaid
// with LEDGER_PARAMS_-prefixed environment variables, e.g.
// LEDGER_PARAMS_STAKING__MAX_VALIDATORS=150.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::staking::StakingParams;

pub const ENV_PREFIX: &str = "LEDGER_PARAMS";

fn default_chain_id() -> String {
    "ledger-devnet".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenesisConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    pub staking: StakingSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StakingSection {
    pub unbonding_time_secs: u64,
    pub max_validators: u16,
    pub bond_denom: String,
}

impl StakingSection {
    pub fn to_params(&self) -> StakingParams {
        StakingParams {
            unbonding_time: Duration::from_secs(self.unbonding_time_secs),
            max_validators: self.max_validators,
            bond_denom: self.bond_denom.clone(),
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true)
}

pub fn load(path: &Path) -> Result<GenesisConfig, ConfigError> {
    Config::builder()
        .add_source(File::from(path))
        .add_source(environment())
        .build()?
        .try_deserialize()
}

/// Parse an inline TOML document, without the environment overlay.
pub fn from_toml_str(contents: &str) -> Result<GenesisConfig, ConfigError> {
    Config::builder()
        .add_source(File::from_str(contents, FileFormat::Toml))
        .build()?
        .try_deserialize()
}
