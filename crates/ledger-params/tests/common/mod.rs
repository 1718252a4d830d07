// Shared fixture: a staking-style parameter group mounted on in-memory stores.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ledger_params::{JsonCodec, KeyTable, ParamSet, ParamSetPair, ParamSetPairs, Subspace};
use ledger_store::{RootMultiStore, StoreKey};

pub const KEY_UNBONDING_TIME: &[u8] = b"UnbondingTime";
pub const KEY_MAX_VALIDATORS: &[u8] = b"MaxValidators";
pub const KEY_BOND_DENOM: &[u8] = b"BondDenom";

pub const ALL_KEYS: [&[u8]; 3] = [KEY_UNBONDING_TIME, KEY_MAX_VALIDATORS, KEY_BOND_DENOM];

pub const SUBSPACE_NAME: &str = "testsubspace";

pub fn hours(h: u64) -> Duration {
    Duration::from_secs(h * 3600)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pub unbonding_time: Duration,
    pub max_validators: u16,
    pub bond_denom: String,
}

impl Params {
    pub fn new(unbonding_time: Duration, max_validators: u16, bond_denom: &str) -> Self {
        Params { unbonding_time, max_validators, bond_denom: bond_denom.to_string() }
    }

    pub fn defaults() -> Self {
        Params::new(hours(48), 100, "stake")
    }
}

pub fn validate_unbonding_time(v: &Duration) -> Result<(), String> {
    if *v < hours(24) {
        return Err("unbonding time must be at least one day".to_string());
    }
    Ok(())
}

pub fn validate_max_validators(_: &u16) -> Result<(), String> {
    Ok(())
}

pub fn validate_bond_denom(v: &String) -> Result<(), String> {
    if v.is_empty() {
        return Err("denom cannot be empty".to_string());
    }
    Ok(())
}

impl ParamSet for Params {
    fn param_set_pairs(&mut self) -> ParamSetPairs<'_> {
        vec![
            ParamSetPair::new(KEY_UNBONDING_TIME, &mut self.unbonding_time, validate_unbonding_time),
            ParamSetPair::new(KEY_MAX_VALIDATORS, &mut self.max_validators, validate_max_validators),
            ParamSetPair::new(KEY_BOND_DENOM, &mut self.bond_denom, validate_bond_denom),
        ]
    }
}

pub fn param_key_table() -> KeyTable {
    KeyTable::new().register_param_set(&mut Params::default())
}

pub fn store_keys() -> (StoreKey, StoreKey) {
    (StoreKey::committed("params"), StoreKey::transient("transient_params"))
}

pub fn mounted_store() -> RootMultiStore {
    let (key, tkey) = store_keys();
    let mut store = RootMultiStore::new();
    store.mount(key).unwrap();
    store.mount(tkey).unwrap();
    store
}

pub fn bare_subspace(name: &str) -> Subspace {
    let (key, tkey) = store_keys();
    Subspace::new(Arc::new(JsonCodec), key, tkey, name)
}

/// Store tree plus a subspace with the staking key table attached.
pub fn setup() -> (RootMultiStore, Subspace) {
    let _ = env_logger::builder().is_test(true).try_init();
    (mounted_store(), bare_subspace(SUBSPACE_NAME).with_key_table(param_key_table()))
}
