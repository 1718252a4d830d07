pub mod kv;
pub mod multistore;
pub mod context;

pub use kv::{KvStore, MemStore};
pub use multistore::{
    CacheMultiStore, CommitId, MultiStore, RootMultiStore, StoreError, StoreKey, StoreKind,
};
pub use context::{BlockHeader, Context};
