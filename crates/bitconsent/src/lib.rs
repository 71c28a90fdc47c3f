//! # bitconsent
//!
//! A schema-driven codec that packs small, versioned flag and consent records
//! into bits and frames them as URL-safe base64 tokens.
//!
//! Describe each version's layout as an ordered list of fields (ints, bools,
//! timestamps, raw bits, two-letter codes and repeated groups), register the
//! schemas in a [`VersionMap`], and encode or decode records through a
//! [`Codec`]. The first field of every schema is the `version` field, so a
//! token carries its own layout selector. Nothing else about the layout is
//! self-describing.
//!
//! ## Example
//!
//! ```
//! use bitconsent::{Codec, CodecConfig, Field, Record, Schema, Value, VersionMap};
//!
//! let schema = Schema::new(vec![
//!     Field::int("version", 6),
//!     Field::bool("flag"),
//!     Field::language("code"),
//! ])
//! .unwrap();
//! let versions = VersionMap::new().with_schema(1, schema).unwrap();
//! let codec = Codec::new(versions, CodecConfig::default()).unwrap();
//!
//! let record = Record::from([
//!     ("version".to_string(), Value::Int(1)),
//!     ("flag".to_string(), Value::Bool(true)),
//!     ("code".to_string(), Value::Language("en".to_string())),
//! ]);
//! let token = codec.encode(&record).unwrap();
//! assert_eq!(token, "BiGg");
//! assert_eq!(codec.decode(&token).unwrap(), record);
//! ```

pub mod bits;
pub mod config;
pub mod engine;
pub mod errors;
pub mod field;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod text;
pub mod value;
pub mod versions;

pub use bits::decode_bits_to_ids;
pub use config::{CodecConfig, Mode};
pub use errors::{DecodeError, EncodeError, SchemaError};
pub use field::{Decoded, Field, FieldKind, ListSpec, Size};
pub use schema::Schema;
pub use value::{Record, Value};
pub use versions::{Codec, VersionMap, decode_record, encode_record};
