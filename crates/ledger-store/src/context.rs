// Execution context passed through every state-machine call
//
// The context carries the store tree for the current transition and the
// block header. It routes reads and writes, and never inspects them.

use serde::{Deserialize, Serialize};
use log::debug;

use crate::multistore::{CacheMultiStore, MultiStore, StoreKey};

/// Block metadata visible to the state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub chain_id: String,
    pub height: u64,
}

impl BlockHeader {
    pub fn new(chain_id: impl Into<String>, height: u64) -> Self {
        BlockHeader { chain_id: chain_id.into(), height }
    }
}

pub struct Context<'a> {
    store: &'a mut dyn MultiStore,
    header: BlockHeader,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a mut dyn MultiStore, header: BlockHeader) -> Self {
        Context { store, header }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn block_height(&self) -> u64 {
        self.header.height
    }

    pub fn chain_id(&self) -> &str {
        &self.header.chain_id
    }

    pub fn with_block_height(mut self, height: u64) -> Self {
        self.header.height = height;
        self
    }

    pub fn get(&self, store: &StoreKey, key: &[u8]) -> Option<Vec<u8>> {
        self.store.get(store, key)
    }

    pub fn has(&self, store: &StoreKey, key: &[u8]) -> bool {
        self.store.has(store, key)
    }

    pub fn set(&mut self, store: &StoreKey, key: &[u8], value: Vec<u8>) {
        self.store.set(store, key, value);
    }

    pub fn delete(&mut self, store: &StoreKey, key: &[u8]) {
        self.store.delete(store, key);
    }

    /// Run `f` against a cache branch of this context.
    ///
    /// The branch is written back only when `f` returns `Ok`. On `Err`, or if
    /// `f` panics, every write made through the branch is discarded.
    pub fn run_atomic<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Context<'_>) -> Result<T, E>,
    {
        let header = self.header.clone();
        let mut cache = CacheMultiStore::new(&mut *self.store);
        let result = {
            let mut branch = Context::new(&mut cache, header);
            f(&mut branch)
        };

        if result.is_ok() {
            cache.write();
        } else {
            debug!("Discarding cached writes at height {}", self.header.height);
        }
        result
    }
}
