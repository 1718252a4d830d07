// Value codec collaborator.
//
// A codec turns the canonical JSON document of a parameter value into the bytes
// written to the committed store, and back. The shape check happens one layer up,
// in `ParamValue::from_json`.

use serde_json::Value;
use std::fmt;

use crate::error::CodecError;
use crate::value::ParamValue;

pub trait Codec: Send + Sync + fmt::Debug {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    fn unmarshal(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}

/// Compact JSON codec. Default for every subspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Malformed(e.to_string()))
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))
    }
}

/// Encode a typed value with `codec`.
pub fn encode_value<V: ParamValue>(codec: &dyn Codec, value: &V) -> Result<Vec<u8>, CodecError> {
    codec.marshal(&value.to_json()?)
}

/// Decode bytes produced by `encode_value` back into `V`.
pub fn decode_value<V: ParamValue>(codec: &dyn Codec, bytes: &[u8]) -> Result<V, CodecError> {
    V::from_json(codec.unmarshal(bytes)?)
}
