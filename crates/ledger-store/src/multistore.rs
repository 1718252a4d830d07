// Multi-store routing, commit and cache branches
//
// SAFETY INVARIANTS:
// 1. Every access is routed by StoreKey; an unmounted store is a wiring defect
// 2. Transient stores are cleared on commit, committed stores are not
// 3. The commit hash covers committed stores only and is deterministic
// 4. A cache branch reaches its parent only through write(); dropping it discards all writes
// 5. write() flushes committed and transient writes together

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use log::{debug, error, info};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::kv::{KvStore, MemStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store already mounted: {0}")]
    AlreadyMounted(String),

    #[error("Store not mounted: {0}")]
    NotMounted(String),
}

/// Lifetime class of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StoreKind {
    /// Durable, part of consensus state
    Committed,

    /// Cleared at every commit (block-scoped)
    Transient,
}

/// Identifies one mounted store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreKey {
    name: String,
    kind: StoreKind,
}

impl StoreKey {
    pub fn committed(name: impl Into<String>) -> Self {
        StoreKey { name: name.into(), kind: StoreKind::Committed }
    }

    pub fn transient(name: impl Into<String>) -> Self {
        StoreKey { name: name.into(), kind: StoreKind::Transient }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub fn is_transient(&self) -> bool {
        self.kind == StoreKind::Transient
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StoreKind::Committed => write!(f, "{}", self.name),
            StoreKind::Transient => write!(f, "{} (transient)", self.name),
        }
    }
}

/// Routes byte-level reads and writes to the store named by a `StoreKey`.
pub trait MultiStore {
    fn get(&self, store: &StoreKey, key: &[u8]) -> Option<Vec<u8>>;

    fn has(&self, store: &StoreKey, key: &[u8]) -> bool {
        self.get(store, key).is_some()
    }

    fn set(&mut self, store: &StoreKey, key: &[u8], value: Vec<u8>);

    fn delete(&mut self, store: &StoreKey, key: &[u8]);

    fn is_mounted(&self, store: &StoreKey) -> bool;
}

pub(crate) fn not_mounted(store: &StoreKey) -> ! {
    let err = StoreError::NotMounted(store.to_string());
    error!("{}", err);
    panic!("{}", err)
}

/// Result of a commit: the new version and the committed-state hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitId {
    pub version: u64,
    pub hash: [u8; 32],
}

impl CommitId {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.hash_hex(), self.version)
    }
}

/// Root of the store tree: one `MemStore` per mounted key.
#[derive(Debug, Default)]
pub struct RootMultiStore {
    stores: BTreeMap<StoreKey, MemStore>,
    version: u64,
}

impl RootMultiStore {
    pub fn new() -> Self {
        RootMultiStore::default()
    }

    pub fn mount(&mut self, key: StoreKey) -> Result<(), StoreError> {
        if self.stores.contains_key(&key) {
            return Err(StoreError::AlreadyMounted(key.to_string()));
        }
        debug!("Mounted store {}", key);
        self.stores.insert(key, MemStore::new());
        Ok(())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Read-only access to a mounted store.
    pub fn store(&self, key: &StoreKey) -> Option<&MemStore> {
        self.stores.get(key)
    }

    /// Deterministic hash over every committed store, in store-key order.
    pub fn working_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for (key, store) in self.stores.iter().filter(|(k, _)| !k.is_transient()) {
            hasher.update((key.name().len() as u64).to_be_bytes());
            hasher.update(key.name().as_bytes());
            for (k, v) in store.iter() {
                hasher.update((k.len() as u64).to_be_bytes());
                hasher.update(k);
                hasher.update((v.len() as u64).to_be_bytes());
                hasher.update(v);
            }
        }
        hasher.finalize().into()
    }

    /// Close the current block: clear transient stores and hash committed state.
    pub fn commit(&mut self) -> CommitId {
        for store in self
            .stores
            .iter_mut()
            .filter(|(k, _)| k.is_transient())
            .map(|(_, s)| s)
        {
            store.clear();
        }
        self.version += 1;

        let id = CommitId { version: self.version, hash: self.working_hash() };
        info!("Committed version {} with hash {}", id.version, id.hash_hex());
        id
    }

    fn mounted(&self, key: &StoreKey) -> &MemStore {
        match self.stores.get(key) {
            Some(store) => store,
            None => not_mounted(key),
        }
    }

    fn mounted_mut(&mut self, key: &StoreKey) -> &mut MemStore {
        match self.stores.get_mut(key) {
            Some(store) => store,
            None => not_mounted(key),
        }
    }
}

impl MultiStore for RootMultiStore {
    fn get(&self, store: &StoreKey, key: &[u8]) -> Option<Vec<u8>> {
        self.mounted(store).get(key)
    }

    fn has(&self, store: &StoreKey, key: &[u8]) -> bool {
        self.mounted(store).has(key)
    }

    fn set(&mut self, store: &StoreKey, key: &[u8], value: Vec<u8>) {
        self.mounted_mut(store).set(key, value);
    }

    fn delete(&mut self, store: &StoreKey, key: &[u8]) {
        self.mounted_mut(store).delete(key);
    }

    fn is_mounted(&self, store: &StoreKey) -> bool {
        self.stores.contains_key(store)
    }
}

/// Write buffer over a parent store; `None` records a delete.
pub struct CacheMultiStore<'a> {
    parent: &'a mut dyn MultiStore,
    writes: BTreeMap<StoreKey, BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl<'a> CacheMultiStore<'a> {
    pub fn new(parent: &'a mut dyn MultiStore) -> Self {
        CacheMultiStore { parent, writes: BTreeMap::new() }
    }

    /// Whether any write is buffered.
    pub fn is_dirty(&self) -> bool {
        self.writes.values().any(|w| !w.is_empty())
    }

    /// Flush every buffered write to the parent.
    pub fn write(self) {
        let CacheMultiStore { parent, writes } = self;
        for (store, entries) in writes {
            for (key, value) in entries {
                match value {
                    Some(value) => parent.set(&store, &key, value),
                    None => parent.delete(&store, &key),
                }
            }
        }
    }

    fn buffered(&self, store: &StoreKey, key: &[u8]) -> Option<&Option<Vec<u8>>> {
        self.writes.get(store).and_then(|w| w.get(key))
    }

    fn buffer(&mut self, store: &StoreKey, key: &[u8], value: Option<Vec<u8>>) {
        if !self.parent.is_mounted(store) {
            not_mounted(store);
        }
        self.writes
            .entry(store.clone())
            .or_default()
            .insert(key.to_vec(), value);
    }
}

impl MultiStore for CacheMultiStore<'_> {
    fn get(&self, store: &StoreKey, key: &[u8]) -> Option<Vec<u8>> {
        match self.buffered(store, key) {
            Some(entry) => entry.clone(),
            None => self.parent.get(store, key),
        }
    }

    fn has(&self, store: &StoreKey, key: &[u8]) -> bool {
        match self.buffered(store, key) {
            Some(entry) => entry.is_some(),
            None => self.parent.has(store, key),
        }
    }

    fn set(&mut self, store: &StoreKey, key: &[u8], value: Vec<u8>) {
        self.buffer(store, key, Some(value));
    }

    fn delete(&mut self, store: &StoreKey, key: &[u8]) {
        self.buffer(store, key, None);
    }

    fn is_mounted(&self, store: &StoreKey) -> bool {
        self.parent.is_mounted(store)
    }
}
