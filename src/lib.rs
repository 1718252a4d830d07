//! Parameter subspaces over a versioned multi-store.
//!
//! `ledger_store` provides the committed and transient stores and the
//! per-transition `Context`; `ledger_params` layers typed, validated,
//! namespaced parameters on top.

pub use ledger_params;
pub use ledger_store;
