// Parameter Subspace - namespaced, typed, validated parameter access
//
// SAFETY INVARIANTS:
// 1. Every key must be registered in the attached key table; anything else is a wiring defect
// 2. The registered type is compared against the accessed type on every read and write
// 3. No value reaches the committed store before its validator accepted it
// 4. The value and its modified marker are written through the same context, so they commit or roll back together
// 5. A subspace accepts exactly one key table
// 6. Governance updates fail recoverably and leave the store untouched

use log::{debug, warn};
use std::sync::Arc;

use ledger_store::{Context, StoreKey};

use crate::codec::{decode_value, Codec};
use crate::error::{display_key, invariant_violation, ParamsError};
use crate::key_table::{Attribute, KeyTable};
use crate::param_set::{is_ignored, ParamSet};
use crate::value::{AttributeType, ParamSlot, ParamValue};

/// Value written to the transient store when a key is modified.
const MODIFIED_MARKER: &[u8] = &[1];

/// Namespaced handle over the parameter stores.
///
/// The physical key of a parameter is `name + "/" + key`, in both the committed
/// store (value) and the transient store (modified marker).
#[derive(Debug, Clone)]
pub struct Subspace {
    codec: Arc<dyn Codec>,
    key: StoreKey,
    tkey: StoreKey,
    name: String,
    table: Option<Arc<KeyTable>>,
}

impl Subspace {
    pub fn new(codec: Arc<dyn Codec>, key: StoreKey, tkey: StoreKey, name: impl Into<String>) -> Self {
        if key.is_transient() || !tkey.is_transient() {
            panic!(
                "Subspace needs a committed and a transient store, got {} and {}",
                key, tkey
            );
        }
        Subspace { codec, key, tkey, name: name.into(), table: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_key_table(&self) -> bool {
        self.table.is_some()
    }

    pub fn key_table(&self) -> Option<&KeyTable> {
        self.table.as_deref()
    }

    /// Bind `table` to this subspace. Panics if a table is already attached.
    pub fn with_key_table(mut self, table: KeyTable) -> Self {
        if self.table.is_some() {
            invariant_violation(ParamsError::KeyTableAlreadySet(self.name.clone()));
        }
        debug!("Subspace {} attached key table with {} keys", self.name, table.len());
        self.table = Some(Arc::new(table));
        self
    }

    pub fn read_only(&self) -> ReadOnlySubspace {
        ReadOnlySubspace { inner: self.clone() }
    }

    /// Decode the stored value of `key`. Panics if the key is unregistered,
    /// accessed with the wrong type, or has never been set.
    pub fn get<V: ParamValue>(&self, ctx: &Context<'_>, key: &[u8]) -> V {
        self.check_type(key, V::attribute_type());
        let bytes = match ctx.get(&self.key, &self.physical_key(key)) {
            Some(bytes) => bytes,
            None => invariant_violation(ParamsError::MissingValue {
                subspace: self.name.clone(),
                key: display_key(key),
            }),
        };
        match decode_value::<V>(self.codec.as_ref(), &bytes) {
            Ok(value) => value,
            Err(source) => invariant_violation(ParamsError::CorruptValue {
                subspace: self.name.clone(),
                key: display_key(key),
                source,
            }),
        }
    }

    /// Like `get`, but leaves `out` untouched when nothing is stored.
    pub fn get_if_exists<V: ParamValue>(&self, ctx: &Context<'_>, key: &[u8], out: &mut V) {
        self.load_slot(ctx, key, out, false);
    }

    /// Stored bytes of `key`, without decoding or key-table lookup.
    pub fn get_raw(&self, ctx: &Context<'_>, key: &[u8]) -> Option<Vec<u8>> {
        ctx.get(&self.key, &self.physical_key(key))
    }

    pub fn has(&self, ctx: &Context<'_>, key: &[u8]) -> bool {
        ctx.has(&self.key, &self.physical_key(key))
    }

    /// Whether `key` was written since the transient store was last reset.
    pub fn modified(&self, ctx: &Context<'_>, key: &[u8]) -> bool {
        ctx.has(&self.tkey, &self.physical_key(key))
    }

    /// Trusted write. Panics if the key is unregistered, the type does not
    /// match, or the registered validator rejects `value`.
    pub fn set<V: ParamValue>(&self, ctx: &mut Context<'_>, key: &[u8], value: &V) {
        self.store_slot(ctx, key, value);
    }

    /// Apply an externally encoded value (e.g. from a governance proposal).
    ///
    /// Panics on an unregistered key. A value that fails to decode or validate
    /// is returned as an error and nothing is written.
    pub fn update(&self, ctx: &mut Context<'_>, key: &[u8], encoded: &[u8]) -> Result<(), ParamsError> {
        let attribute = self.attribute(key);

        let decoded = self
            .codec
            .unmarshal(encoded)
            .and_then(attribute.decoder())
            .map_err(|source| ParamsError::UpdateDecode { key: display_key(key), source });
        let value = match decoded {
            Ok(value) => value,
            Err(err) => {
                warn!("Subspace {} rejected update: {}", self.name, err);
                return Err(err);
            }
        };

        if let Err(reason) = attribute.validate(value.as_any()) {
            let err = ParamsError::UpdateRejected { key: display_key(key), reason };
            warn!("Subspace {} rejected update: {}", self.name, err);
            return Err(err);
        }

        let bytes = value
            .encode_slot()
            .and_then(|doc| self.codec.marshal(&doc))
            .map_err(|source| ParamsError::UpdateDecode { key: display_key(key), source })?;
        self.set_raw(ctx, key, bytes);
        Ok(())
    }

    /// Read every pair of `ps` into its slot. Panics like `get` on the first failure.
    pub fn get_param_set<P: ParamSet + ?Sized>(&self, ctx: &Context<'_>, ps: &mut P) {
        self.get_param_set_for_init_genesis(ctx, ps, &[]);
    }

    /// Read every stored pair of `ps`; slots of unset keys keep their value.
    pub fn get_param_set_if_exists<P: ParamSet + ?Sized>(&self, ctx: &Context<'_>, ps: &mut P) {
        for pair in ps.param_set_pairs() {
            self.load_slot(ctx, pair.key, pair.value, false);
        }
    }

    /// Validate and write every pair of `ps`, in order.
    ///
    /// Not atomic: when a later pair is rejected, earlier pairs stay written.
    pub fn set_param_set<P: ParamSet + ?Sized>(&self, ctx: &mut Context<'_>, ps: &mut P) {
        self.set_param_set_for_init_genesis(ctx, ps, &[]);
    }

    /// `set_param_set`, skipping pairs whose key is in `ignore_keys`.
    /// Skipped pairs are neither validated nor written.
    pub fn set_param_set_for_init_genesis<P: ParamSet + ?Sized>(
        &self,
        ctx: &mut Context<'_>,
        ps: &mut P,
        ignore_keys: &[&[u8]],
    ) {
        for pair in ps.param_set_pairs() {
            if is_ignored(ignore_keys, pair.key) {
                debug!("Subspace {} keeps existing {}", self.name, display_key(pair.key));
                continue;
            }
            if let Err(reason) = pair.validator.validate(pair.value.as_any()) {
                invariant_violation(ParamsError::Rejected {
                    subspace: self.name.clone(),
                    key: display_key(pair.key),
                    reason,
                });
            }
            self.store_slot(ctx, pair.key, &*pair.value);
        }
    }

    /// `get_param_set`, leaving slots of keys in `ignore_keys` untouched.
    pub fn get_param_set_for_init_genesis<P: ParamSet + ?Sized>(
        &self,
        ctx: &Context<'_>,
        ps: &mut P,
        ignore_keys: &[&[u8]],
    ) {
        for pair in ps.param_set_pairs() {
            if is_ignored(ignore_keys, pair.key) {
                continue;
            }
            self.load_slot(ctx, pair.key, pair.value, true);
        }
    }

    fn physical_key(&self, key: &[u8]) -> Vec<u8> {
        let mut physical = Vec::with_capacity(self.name.len() + 1 + key.len());
        physical.extend_from_slice(self.name.as_bytes());
        physical.push(b'/');
        physical.extend_from_slice(key);
        physical
    }

    fn attribute(&self, key: &[u8]) -> &Attribute {
        match self.table.as_ref().and_then(|t| t.lookup(key)) {
            Some(attribute) => attribute,
            None => invariant_violation(ParamsError::UnknownKey {
                subspace: self.name.clone(),
                key: display_key(key),
            }),
        }
    }

    fn check_type(&self, key: &[u8], requested: AttributeType) -> &Attribute {
        let attribute = self.attribute(key);
        if attribute.attribute_type() != requested {
            invariant_violation(ParamsError::TypeMismatch {
                subspace: self.name.clone(),
                key: display_key(key),
                registered: attribute.attribute_type(),
                requested,
            });
        }
        attribute
    }

    fn load_slot(&self, ctx: &Context<'_>, key: &[u8], slot: &mut dyn ParamSlot, required: bool) {
        self.check_type(key, slot.slot_type());
        let bytes = match ctx.get(&self.key, &self.physical_key(key)) {
            Some(bytes) => bytes,
            None if required => invariant_violation(ParamsError::MissingValue {
                subspace: self.name.clone(),
                key: display_key(key),
            }),
            None => return,
        };
        let loaded = self
            .codec
            .unmarshal(&bytes)
            .and_then(|doc| slot.decode_into(doc));
        if let Err(source) = loaded {
            invariant_violation(ParamsError::CorruptValue {
                subspace: self.name.clone(),
                key: display_key(key),
                source,
            });
        }
    }

    fn store_slot(&self, ctx: &mut Context<'_>, key: &[u8], slot: &dyn ParamSlot) {
        let attribute = self.check_type(key, slot.slot_type());
        if let Err(reason) = attribute.validate(slot.as_any()) {
            invariant_violation(ParamsError::Rejected {
                subspace: self.name.clone(),
                key: display_key(key),
                reason,
            });
        }
        let encoded = slot.encode_slot().and_then(|doc| self.codec.marshal(&doc));
        match encoded {
            Ok(bytes) => self.set_raw(ctx, key, bytes),
            Err(source) => invariant_violation(ParamsError::EncodeFailed {
                subspace: self.name.clone(),
                key: display_key(key),
                source,
            }),
        }
    }

    fn set_raw(&self, ctx: &mut Context<'_>, key: &[u8], bytes: Vec<u8>) {
        let physical = self.physical_key(key);
        ctx.set(&self.key, &physical, bytes);
        ctx.set(&self.tkey, &physical, MODIFIED_MARKER.to_vec());
        debug!("Subspace {} set {}", self.name, display_key(key));
    }
}

/// Read-only view of a subspace, for modules that consume but never own parameters.
#[derive(Debug, Clone)]
pub struct ReadOnlySubspace {
    inner: Subspace,
}

impl ReadOnlySubspace {
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn get<V: ParamValue>(&self, ctx: &Context<'_>, key: &[u8]) -> V {
        self.inner.get(ctx, key)
    }

    pub fn get_if_exists<V: ParamValue>(&self, ctx: &Context<'_>, key: &[u8], out: &mut V) {
        self.inner.get_if_exists(ctx, key, out)
    }

    pub fn get_raw(&self, ctx: &Context<'_>, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get_raw(ctx, key)
    }

    pub fn has(&self, ctx: &Context<'_>, key: &[u8]) -> bool {
        self.inner.has(ctx, key)
    }

    pub fn modified(&self, ctx: &Context<'_>, key: &[u8]) -> bool {
        self.inner.modified(ctx, key)
    }

    pub fn get_param_set<P: ParamSet + ?Sized>(&self, ctx: &Context<'_>, ps: &mut P) {
        self.inner.get_param_set(ctx, ps)
    }
}
