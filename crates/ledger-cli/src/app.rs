// Minimal state-machine host for the staking subspace: mounts the stores,
// runs genesis passes and governance-style updates, and commits blocks.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use ledger_params::{JsonCodec, ParamsError, Subspace};
use ledger_store::{BlockHeader, CommitId, Context, RootMultiStore, StoreError, StoreKey};

use crate::staking::{self, StakingParams};

pub const PARAMS_STORE: &str = "params";
pub const TRANSIENT_PARAMS_STORE: &str = "transient_params";

/// One parameter as seen in the committed and transient stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamEntry {
    pub key: String,
    pub raw: Option<String>,
    pub hex: Option<String>,
    pub modified: bool,
}

pub struct ParamsApp {
    store: RootMultiStore,
    staking: Subspace,
    header: BlockHeader,
}

impl ParamsApp {
    pub fn new(chain_id: &str) -> Result<Self, StoreError> {
        let key = StoreKey::committed(PARAMS_STORE);
        let tkey = StoreKey::transient(TRANSIENT_PARAMS_STORE);

        let mut store = RootMultiStore::new();
        store.mount(key.clone())?;
        store.mount(tkey.clone())?;

        let staking = Subspace::new(Arc::new(JsonCodec), key, tkey, staking::SUBSPACE_NAME)
            .with_key_table(staking::key_table());

        Ok(ParamsApp { store, staking, header: BlockHeader::new(chain_id, 1) })
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn has_param(&self, key: &[u8]) -> bool {
        self.staking.key_table().map_or(false, |t| t.contains(key))
    }

    /// Write `params` for every key not in `ignore_keys`.
    pub fn init_genesis(&mut self, params: &StakingParams, ignore_keys: &[&[u8]]) {
        let mut params = params.clone();
        let mut ctx = Context::new(&mut self.store, self.header.clone());
        self.staking
            .set_param_set_for_init_genesis(&mut ctx, &mut params, ignore_keys);
        info!(height = self.header.height, ignored = ignore_keys.len(), "genesis parameters written");
    }

    /// Apply an encoded value to `key` as its own transition.
    pub fn update(&mut self, key: &[u8], encoded: &[u8]) -> Result<(), ParamsError> {
        let staking = &self.staking;
        let mut ctx = Context::new(&mut self.store, self.header.clone());
        ctx.run_atomic(|branch| staking.update(branch, key, encoded))
    }

    pub fn staking_params(&mut self) -> StakingParams {
        let mut params = StakingParams::default();
        let ctx = Context::new(&mut self.store, self.header.clone());
        self.staking.get_param_set_if_exists(&ctx, &mut params);
        params
    }

    /// Current raw contents of every registered staking key.
    pub fn snapshot(&mut self) -> Vec<ParamEntry> {
        let keys: Vec<Vec<u8>> = match self.staking.key_table() {
            Some(table) => table.keys().map(|k| k.to_vec()).collect(),
            None => Vec::new(),
        };
        let ctx = Context::new(&mut self.store, self.header.clone());

        keys.iter()
            .map(|key| {
                let raw = self.staking.get_raw(&ctx, key);
                ParamEntry {
                    key: String::from_utf8_lossy(key).into_owned(),
                    raw: raw.as_ref().map(|b| String::from_utf8_lossy(b).into_owned()),
                    hex: raw.as_ref().map(hex::encode_upper),
                    modified: self.staking.modified(&ctx, key),
                }
            })
            .collect()
    }

    /// Close the current block and open the next one.
    pub fn commit(&mut self) -> CommitId {
        let id = self.store.commit();
        self.header.height += 1;
        id
    }
}
