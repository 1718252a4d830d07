// Parameter subspaces for the ledger state machine
pub mod error;
pub mod value;
pub mod codec;
pub mod param_set;
pub mod key_table;
pub mod subspace;

pub use serde_json;

pub use error::{CodecError, ParamsError};

pub use value::{AttributeType, ParamSlot, ParamValue, SlotDecoder, ValidatorFn};

pub use codec::{decode_value, encode_value, Codec, JsonCodec};

pub use param_set::{ParamSet, ParamSetPair, ParamSetPairs};

pub use key_table::{Attribute, KeyTable, MAX_KEY_LENGTH};

pub use subspace::{ReadOnlySubspace, Subspace};
