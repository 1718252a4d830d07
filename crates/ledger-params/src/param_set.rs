use crate::value::{ParamSlot, ParamValue, ValidatorFn};

/// One binding of a module's parameter group: key, the in-memory slot holding
/// its value, and the validator for that value.
pub struct ParamSetPair<'a> {
    pub key: &'a [u8],
    pub value: &'a mut dyn ParamSlot,
    pub validator: ValidatorFn,
}

impl<'a> ParamSetPair<'a> {
    pub fn new<V, F>(key: &'a [u8], value: &'a mut V, validator: F) -> Self
    where
        V: ParamValue,
        F: Fn(&V) -> Result<(), String> + Send + Sync + 'static,
    {
        ParamSetPair { key, value, validator: ValidatorFn::new(validator) }
    }
}

pub type ParamSetPairs<'a> = Vec<ParamSetPair<'a>>;

/// A module-defined parameter group.
///
/// Pairs are visited in the returned order. Keys must be unique within one set.
pub trait ParamSet {
    fn param_set_pairs(&mut self) -> ParamSetPairs<'_>;
}

/// Whether `key` appears in a genesis ignore list.
pub(crate) fn is_ignored(ignore_keys: &[&[u8]], key: &[u8]) -> bool {
    ignore_keys.iter().any(|ignored| *ignored == key)
}
