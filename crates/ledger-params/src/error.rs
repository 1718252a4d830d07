// Parameter store errors
//
// Two disjoint classes:
// 1. Invariant violations - module wiring defects, raised through invariant_violation() and never returned
// 2. Update failures - externally supplied values, returned to the caller with the store untouched

use log::error;
use thiserror::Error;

use crate::value::AttributeType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed encoding: {0}")]
    Malformed(String),

    #[error("Shape mismatch: expected {expected}, found {found}")]
    Shape {
        expected: AttributeType,
        found: String,
    },

    #[error("Value out of range for {ty}: {value}")]
    OutOfRange {
        ty: AttributeType,
        value: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("Parameter key {key:?} is not registered in subspace {subspace}")]
    UnknownKey { subspace: String, key: String },

    #[error("Type mismatch for {key:?} in subspace {subspace}: registered {registered}, accessed as {requested}")]
    TypeMismatch {
        subspace: String,
        key: String,
        registered: AttributeType,
        requested: AttributeType,
    },

    #[error("Key table already set for subspace {0}")]
    KeyTableAlreadySet(String),

    #[error("Parameter {key:?} in subspace {subspace} has no stored value")]
    MissingValue { subspace: String, key: String },

    #[error("Stored value for {key:?} in subspace {subspace} is corrupt: {source}")]
    CorruptValue {
        subspace: String,
        key: String,
        source: CodecError,
    },

    #[error("Failed to encode {key:?} in subspace {subspace}: {source}")]
    EncodeFailed {
        subspace: String,
        key: String,
        source: CodecError,
    },

    #[error("Invalid parameter key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Parameter key {0:?} registered twice")]
    DuplicateKey(String),

    #[error("Value for {key:?} in subspace {subspace} rejected: {reason}")]
    Rejected {
        subspace: String,
        key: String,
        reason: String,
    },

    #[error("Failed to decode update for {key:?}: {source}")]
    UpdateDecode { key: String, source: CodecError },

    #[error("Update for {key:?} rejected: {reason}")]
    UpdateRejected { key: String, reason: String },
}

impl ParamsError {
    /// Whether the error belongs to the recoverable class returned by `Subspace::update`.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ParamsError::UpdateDecode { .. } | ParamsError::UpdateRejected { .. }
        )
    }
}

/// Abort the current operation on a broken wiring invariant.
pub(crate) fn invariant_violation(err: ParamsError) -> ! {
    error!("Parameter invariant violated: {}", err);
    panic!("{}", err)
}

/// Printable form of a parameter key.
pub(crate) fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
