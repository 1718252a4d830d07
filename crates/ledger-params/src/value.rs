// Typed parameter values
//
// SAFETY INVARIANTS:
// 1. Every value type carries an explicit AttributeType tag, compared on every access
// 2. Encoding is canonical: the same value always yields the same document
// 3. 64-bit integers and durations are encoded as quoted decimal strings
// 4. A ValidatorFn only ever accepts values of the type it was built for

use base64::Engine as _;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CodecError;

/// Value shape bound to a key at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Duration,
    Bool,
    Uint16,
    Uint32,
    Uint64,
    Int64,
    String,
    Bytes,
    /// Module-defined structured value, identified by name
    Custom(&'static str),
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::Duration => "duration",
            AttributeType::Bool => "bool",
            AttributeType::Uint16 => "uint16",
            AttributeType::Uint32 => "uint32",
            AttributeType::Uint64 => "uint64",
            AttributeType::Int64 => "int64",
            AttributeType::String => "string",
            AttributeType::Bytes => "bytes",
            AttributeType::Custom(name) => name,
        };
        f.write_str(name)
    }
}

/// A type that can be stored under a parameter key.
pub trait ParamValue: Any + Clone + fmt::Debug + Send + Sync {
    fn attribute_type() -> AttributeType;

    fn to_json(&self) -> Result<Value, CodecError>;

    fn from_json(value: Value) -> Result<Self, CodecError>;
}

/// Decodes a document into a boxed slot of a fixed concrete type.
pub type SlotDecoder = fn(Value) -> Result<Box<dyn ParamSlot>, CodecError>;

/// Object-safe view of a `ParamValue`, used where the concrete type is erased
/// (ParamSet pairs, governance updates).
pub trait ParamSlot: Send + Sync {
    fn slot_type(&self) -> AttributeType;

    fn encode_slot(&self) -> Result<Value, CodecError>;

    /// Overwrite the slot with a decoded document.
    fn decode_into(&mut self, value: Value) -> Result<(), CodecError>;

    /// Decoder producing fresh slots of this slot's concrete type.
    fn decoder(&self) -> SlotDecoder;

    fn as_any(&self) -> &dyn Any;
}

pub(crate) fn decode_boxed<V: ParamValue>(value: Value) -> Result<Box<dyn ParamSlot>, CodecError> {
    Ok(Box::new(V::from_json(value)?))
}

impl<V: ParamValue> ParamSlot for V {
    fn slot_type(&self) -> AttributeType {
        V::attribute_type()
    }

    fn encode_slot(&self) -> Result<Value, CodecError> {
        self.to_json()
    }

    fn decode_into(&mut self, value: Value) -> Result<(), CodecError> {
        *self = V::from_json(value)?;
        Ok(())
    }

    fn decoder(&self) -> SlotDecoder {
        decode_boxed::<V>
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Validation predicate bound to one value type.
#[derive(Clone)]
pub struct ValidatorFn {
    expected: AttributeType,
    check: Arc<dyn Fn(&dyn Any) -> Result<(), String> + Send + Sync>,
}

impl ValidatorFn {
    pub fn new<V, F>(f: F) -> Self
    where
        V: ParamValue,
        F: Fn(&V) -> Result<(), String> + Send + Sync + 'static,
    {
        let check = move |value: &dyn Any| match value.downcast_ref::<V>() {
            Some(v) => f(v),
            None => Err(format!("validator expects a {} value", V::attribute_type())),
        };
        ValidatorFn { expected: V::attribute_type(), check: Arc::new(check) }
    }

    /// Validator that accepts every value of type `V`.
    pub fn accept_all<V: ParamValue>() -> Self {
        ValidatorFn::new(|_: &V| Ok(()))
    }

    pub fn expected_type(&self) -> AttributeType {
        self.expected
    }

    pub fn validate(&self, value: &dyn Any) -> Result<(), String> {
        (self.check)(value)
    }
}

impl fmt::Debug for ValidatorFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorFn")
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}

fn shape(expected: AttributeType, found: &Value) -> CodecError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    CodecError::Shape { expected, found: found.to_string() }
}

fn decimal_string<T: std::str::FromStr>(ty: AttributeType, value: Value) -> Result<T, CodecError> {
    match value {
        Value::String(s) => s
            .parse::<T>()
            .map_err(|_| CodecError::OutOfRange { ty, value: s }),
        other => Err(shape(ty, &other)),
    }
}

fn small_uint<T: TryFrom<u64>>(ty: AttributeType, value: Value) -> Result<T, CodecError> {
    match &value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| T::try_from(n).ok())
            .ok_or_else(|| CodecError::OutOfRange { ty, value: n.to_string() }),
        other => Err(shape(ty, other)),
    }
}

impl ParamValue for Duration {
    fn attribute_type() -> AttributeType {
        AttributeType::Duration
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        let nanos = self.as_nanos();
        if nanos > i64::MAX as u128 {
            return Err(CodecError::OutOfRange {
                ty: AttributeType::Duration,
                value: nanos.to_string(),
            });
        }
        Ok(Value::String(nanos.to_string()))
    }

    fn from_json(value: Value) -> Result<Self, CodecError> {
        let nanos: i64 = decimal_string(AttributeType::Duration, value)?;
        if nanos < 0 {
            return Err(CodecError::OutOfRange {
                ty: AttributeType::Duration,
                value: nanos.to_string(),
            });
        }
        Ok(Duration::from_nanos(nanos as u64))
    }
}

impl ParamValue for bool {
    fn attribute_type() -> AttributeType {
        AttributeType::Bool
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(Value::Bool(*self))
    }

    fn from_json(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(shape(AttributeType::Bool, &other)),
        }
    }
}

impl ParamValue for u16 {
    fn attribute_type() -> AttributeType {
        AttributeType::Uint16
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(Value::from(*self))
    }

    fn from_json(value: Value) -> Result<Self, CodecError> {
        small_uint(AttributeType::Uint16, value)
    }
}

impl ParamValue for u32 {
    fn attribute_type() -> AttributeType {
        AttributeType::Uint32
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(Value::from(*self))
    }

    fn from_json(value: Value) -> Result<Self, CodecError> {
        small_uint(AttributeType::Uint32, value)
    }
}

impl ParamValue for u64 {
    fn attribute_type() -> AttributeType {
        AttributeType::Uint64
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(Value::String(self.to_string()))
    }

    fn from_json(value: Value) -> Result<Self, CodecError> {
        decimal_string(AttributeType::Uint64, value)
    }
}

impl ParamValue for i64 {
    fn attribute_type() -> AttributeType {
        AttributeType::Int64
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(Value::String(self.to_string()))
    }

    fn from_json(value: Value) -> Result<Self, CodecError> {
        decimal_string(AttributeType::Int64, value)
    }
}

impl ParamValue for String {
    fn attribute_type() -> AttributeType {
        AttributeType::String
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(Value::String(self.clone()))
    }

    fn from_json(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(shape(AttributeType::String, &other)),
        }
    }
}

impl ParamValue for Vec<u8> {
    fn attribute_type() -> AttributeType {
        AttributeType::Bytes
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(Value::String(base64::engine::general_purpose::STANDARD.encode(self)))
    }

    fn from_json(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::String(s) => base64::engine::general_purpose::STANDARD
                .decode(s.as_bytes())
                .map_err(|e| CodecError::Malformed(e.to_string())),
            other => Err(shape(AttributeType::Bytes, &other)),
        }
    }
}

/// Implement `ParamValue` for a serde type, tagged `AttributeType::Custom($tag)`.
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct CommissionRates { max_rate: u64, max_change: u64 }
/// ledger_params::json_param_value!(CommissionRates, "commission_rates");
/// ```
#[macro_export]
macro_rules! json_param_value {
    ($ty:ty, $tag:expr) => {
        impl $crate::ParamValue for $ty {
            fn attribute_type() -> $crate::AttributeType {
                $crate::AttributeType::Custom($tag)
            }

            fn to_json(&self) -> Result<$crate::serde_json::Value, $crate::CodecError> {
                $crate::serde_json::to_value(self)
                    .map_err(|e| $crate::CodecError::Malformed(e.to_string()))
            }

            fn from_json(value: $crate::serde_json::Value) -> Result<Self, $crate::CodecError> {
                $crate::serde_json::from_value(value)
                    .map_err(|e| $crate::CodecError::Malformed(e.to_string()))
            }
        }
    };
}
