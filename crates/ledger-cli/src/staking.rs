// Staking parameter group used by the operator CLI.

use serde::Serialize;
use std::time::Duration;

use ledger_params::{KeyTable, ParamSet, ParamSetPair, ParamSetPairs};

pub const SUBSPACE_NAME: &str = "staking";

pub const KEY_UNBONDING_TIME: &[u8] = b"UnbondingTime";
pub const KEY_MAX_VALIDATORS: &[u8] = b"MaxValidators";
pub const KEY_BOND_DENOM: &[u8] = b"BondDenom";

pub const MIN_UNBONDING_TIME: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StakingParams {
    pub unbonding_time: Duration,
    pub max_validators: u16,
    pub bond_denom: String,
}

impl Default for StakingParams {
    fn default() -> Self {
        StakingParams {
            unbonding_time: Duration::from_secs(21 * 24 * 3600),
            max_validators: 100,
            bond_denom: "stake".to_string(),
        }
    }
}

fn validate_unbonding_time(v: &Duration) -> Result<(), String> {
    if *v < MIN_UNBONDING_TIME {
        return Err(format!(
            "unbonding time must be at least {}s, got {}s",
            MIN_UNBONDING_TIME.as_secs(),
            v.as_secs()
        ));
    }
    Ok(())
}

fn validate_max_validators(v: &u16) -> Result<(), String> {
    if *v == 0 {
        return Err("max validators must be positive".to_string());
    }
    Ok(())
}

fn validate_bond_denom(v: &String) -> Result<(), String> {
    if v.is_empty() {
        return Err("bond denom cannot be empty".to_string());
    }
    if !v.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return Err(format!("bond denom {:?} must be lowercase alphanumeric", v));
    }
    Ok(())
}

impl ParamSet for StakingParams {
    fn param_set_pairs(&mut self) -> ParamSetPairs<'_> {
        vec![
            ParamSetPair::new(KEY_UNBONDING_TIME, &mut self.unbonding_time, validate_unbonding_time),
            ParamSetPair::new(KEY_MAX_VALIDATORS, &mut self.max_validators, validate_max_validators),
            ParamSetPair::new(KEY_BOND_DENOM, &mut self.bond_denom, validate_bond_denom),
        ]
    }
}

pub fn key_table() -> KeyTable {
    KeyTable::new().register_param_set(&mut StakingParams::default())
}
