// Parameter key table
//
// SAFETY INVARIANTS:
// 1. Keys are non-empty ASCII alphanumeric and at most MAX_KEY_LENGTH bytes
// 2. Each key is registered exactly once
// 3. A key's validator is built for the same type the key is registered with
// 4. Once attached to a subspace the table is frozen

use std::any::Any;
use std::collections::BTreeMap;

use crate::error::{display_key, invariant_violation, ParamsError};
use crate::param_set::{ParamSet, ParamSetPairs};
use crate::subspace::Subspace;
use crate::value::{decode_boxed, AttributeType, ParamValue, SlotDecoder, ValidatorFn};

pub const MAX_KEY_LENGTH: usize = 255;

/// Registered shape and validator of one key.
#[derive(Debug, Clone)]
pub struct Attribute {
    ty: AttributeType,
    validator: ValidatorFn,
    decoder: SlotDecoder,
}

impl Attribute {
    pub fn attribute_type(&self) -> AttributeType {
        self.ty
    }

    pub fn validator(&self) -> &ValidatorFn {
        &self.validator
    }

    pub fn validate(&self, value: &dyn Any) -> Result<(), String> {
        self.validator.validate(value)
    }

    pub(crate) fn decoder(&self) -> SlotDecoder {
        self.decoder
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyTable {
    attributes: BTreeMap<Vec<u8>, Attribute>,
}

impl KeyTable {
    pub fn new() -> Self {
        KeyTable::default()
    }

    /// Build a table from the pairs of a parameter group.
    pub fn from_pairs(pairs: ParamSetPairs<'_>) -> Self {
        pairs.into_iter().fold(KeyTable::new(), |table, pair| {
            let attribute = Attribute {
                ty: pair.value.slot_type(),
                validator: pair.validator,
                decoder: pair.value.decoder(),
            };
            table.register(pair.key, attribute)
        })
    }

    /// Register a single key of type `V`.
    pub fn register_type<V, F>(self, key: &[u8], validator: F) -> Self
    where
        V: ParamValue,
        F: Fn(&V) -> Result<(), String> + Send + Sync + 'static,
    {
        let attribute = Attribute {
            ty: V::attribute_type(),
            validator: ValidatorFn::new(validator),
            decoder: decode_boxed::<V>,
        };
        self.register(key, attribute)
    }

    /// Register every key of a parameter group. The slot values are not read.
    pub fn register_param_set<P: ParamSet + ?Sized>(self, ps: &mut P) -> Self {
        let mut table = self;
        for pair in ps.param_set_pairs() {
            let attribute = Attribute {
                ty: pair.value.slot_type(),
                validator: pair.validator,
                decoder: pair.value.decoder(),
            };
            table = table.register(pair.key, attribute);
        }
        table
    }

    /// Bind this table to `subspace`; see `Subspace::with_key_table`.
    pub fn attach(self, subspace: Subspace) -> Subspace {
        subspace.with_key_table(self)
    }

    pub fn lookup(&self, key: &[u8]) -> Option<&Attribute> {
        self.attributes.get(key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Registered keys in ascending byte order.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.attributes.keys().map(|k| k.as_slice())
    }

    fn register(mut self, key: &[u8], attribute: Attribute) -> Self {
        validate_key(key);
        if self.attributes.contains_key(key) {
            invariant_violation(ParamsError::DuplicateKey(display_key(key)));
        }
        if attribute.validator.expected_type() != attribute.ty {
            invariant_violation(ParamsError::TypeMismatch {
                subspace: "<key table>".to_string(),
                key: display_key(key),
                registered: attribute.ty,
                requested: attribute.validator.expected_type(),
            });
        }
        self.attributes.insert(key.to_vec(), attribute);
        self
    }
}

fn validate_key(key: &[u8]) {
    let reason = if key.is_empty() {
        Some("key is empty".to_string())
    } else if key.len() > MAX_KEY_LENGTH {
        Some(format!("key exceeds {} bytes", MAX_KEY_LENGTH))
    } else if !key.iter().all(u8::is_ascii_alphanumeric) {
        Some("key must be ASCII alphanumeric".to_string())
    } else {
        None
    };

    if let Some(reason) = reason {
        invariant_violation(ParamsError::InvalidKey { key: display_key(key), reason });
    }
}
