//! Version dispatch and the top-level [`Codec`].
//!
//! Every schema starts with a `version` int field of a width shared by all
//! versions, so a decoder can read the version before it knows the layout.

use std::{borrow::Cow, collections::BTreeMap};

use tracing::debug;

use crate::{
    bits,
    config::{CodecConfig, Mode},
    errors::{DecodeError, EncodeError, SchemaError},
    field::FieldKind,
    schema::Schema,
    text,
    value::{Record, Value},
};

/// Name of the field every schema starts with.
pub const VERSION_FIELD: &str = "version";

/// Mapping from version number to [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct VersionMap {
    schemas: BTreeMap<u64, Schema>,
}

impl VersionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the schema for `version`. The schema must start with a fixed-width `version` int field.
    pub fn insert(&mut self, version: u64, schema: Schema) -> Result<(), SchemaError> {
        version_width(&schema)?;
        self.schemas.insert(version, schema);
        Ok(())
    }

    pub fn with_schema(mut self, version: u64, schema: Schema) -> Result<Self, SchemaError> {
        self.insert(version, schema)?;
        Ok(self)
    }

    pub fn get(&self, version: u64) -> Option<&Schema> {
        self.schemas.get(&version)
    }

    /// Known versions, ascending.
    pub fn versions(&self) -> impl Iterator<Item = u64> + '_ {
        self.schemas.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn version_width(schema: &Schema) -> Result<usize, SchemaError> {
    match schema.fields().first() {
        Some(field) if field.name == VERSION_FIELD && matches!(field.kind, FieldKind::Int) => {
            field.width.fixed().ok_or(SchemaError::MissingVersionField)
        }
        _ => Err(SchemaError::MissingVersionField),
    }
}

/// Encodes `record` with the schema selected by its `version` field.
pub fn encode_record(record: &Record, versions: &VersionMap, mode: Mode) -> Result<String, EncodeError> {
    let version = match record.get(VERSION_FIELD) {
        Some(Value::Int(version)) => *version,
        _ => return Err(EncodeError::MissingVersion),
    };

    let schema = versions
        .get(version)
        .ok_or(EncodeError::UnknownVersion(version))?;

    debug!(version, "encoding record");
    schema.encode(record, mode)
}

/// Reads the version at offset 0 and decodes `bits` with that version's schema.
///
/// The version field is decoded again as the first field of the schema.
pub fn decode_record(
    bits: &str,
    versions: &VersionMap,
    version_bits: usize,
    mode: Mode,
) -> Result<Record, DecodeError> {
    let bits = match mode {
        _ if bits::is_bit_string(bits) => Cow::Borrowed(bits),
        Mode::Strict => return Err(DecodeError::InvalidBits),
        // Anything but '1' reads as a zero bit.
        Mode::Lenient => Cow::Owned(
            bits.chars()
                .map(|c| if c == '1' { '1' } else { '0' })
                .collect(),
        ),
    };
    let bits = bits.as_ref();

    if mode == Mode::Strict && bits.len() < version_bits {
        return Err(DecodeError::TruncatedInput {
            field: VERSION_FIELD.to_string(),
            needed: version_bits,
            available: bits.len(),
        });
    }

    let version = bits::decode_int(bits, 0, version_bits);
    let schema = versions
        .get(version)
        .ok_or(DecodeError::UnknownVersion(version))?;

    let (record, end) = schema.decode(bits, 0, mode)?;
    debug!(version, consumed = end, available = bits.len(), "decoded record");

    Ok(record)
}

/// A version map and configuration bundled for repeated use.
///
/// Immutable after construction, so one codec can be shared across threads.
#[derive(Debug, Clone)]
pub struct Codec {
    versions: VersionMap,
    config: CodecConfig,
}

impl Codec {
    /// Fails if any schema's version field is not `config.version_bits` wide.
    pub fn new(versions: VersionMap, config: CodecConfig) -> Result<Self, SchemaError> {
        for schema in versions.schemas.values() {
            let found = version_width(schema)?;
            if found != config.version_bits {
                return Err(SchemaError::VersionWidthMismatch {
                    expected: config.version_bits,
                    found,
                });
            }
        }

        Ok(Self { versions, config })
    }

    pub fn versions(&self) -> &VersionMap {
        &self.versions
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encodes `record` to a bit string, without byte padding.
    pub fn encode_bits(&self, record: &Record) -> Result<String, EncodeError> {
        encode_record(record, &self.versions, self.config.mode)
    }

    pub fn decode_bits(&self, bits: &str) -> Result<Record, DecodeError> {
        decode_record(bits, &self.versions, self.config.version_bits, self.config.mode)
    }

    /// Encodes `record` to a URL-safe base64 token.
    pub fn encode(&self, record: &Record) -> Result<String, EncodeError> {
        let bits = self.encode_bits(record)?;
        Ok(text::bits_to_text(&bits))
    }

    /// Decodes a URL-safe base64 token.
    pub fn decode(&self, token: &str) -> Result<Record, DecodeError> {
        let bits = text::text_to_bits(token, self.config.mode)?;
        self.decode_bits(&bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    fn schema_v1() -> Schema {
        Schema::new(vec![
            Field::int("version", 6),
            Field::bool("flag"),
            Field::language("code"),
        ])
        .unwrap()
    }

    fn schema_v2() -> Schema {
        Schema::new(vec![Field::int("version", 6), Field::int("count", 8)]).unwrap()
    }

    fn codec(config: CodecConfig) -> Codec {
        let versions = VersionMap::new()
            .with_schema(1, schema_v1())
            .unwrap()
            .with_schema(2, schema_v2())
            .unwrap();
        Codec::new(versions, config).unwrap()
    }

    fn record_v1() -> Record {
        Record::from([
            ("version".to_string(), Value::Int(1)),
            ("flag".to_string(), Value::Bool(true)),
            ("code".to_string(), Value::Language("en".into())),
        ])
    }

    #[test]
    fn test_encode_to_text() {
        let codec = codec(CodecConfig::default());
        assert_eq!(codec.encode_bits(&record_v1()).unwrap().len(), 19);
        assert_eq!(codec.encode(&record_v1()).unwrap(), "BiGg");
    }

    #[test]
    fn test_decode_from_text() {
        let codec = codec(CodecConfig::strict());
        assert_eq!(codec.decode("BiGg").unwrap(), record_v1());
    }

    #[test]
    fn test_dispatch_by_version() {
        let codec = codec(CodecConfig::default());
        let record = Record::from([
            ("version".to_string(), Value::Int(2)),
            ("count".to_string(), Value::Int(200)),
        ]);

        let bits = codec.encode_bits(&record).unwrap();
        assert_eq!(bits, "00001011001000");
        assert_eq!(codec.decode_bits(&bits).unwrap(), record);
    }

    #[test]
    fn test_missing_version() {
        let codec = codec(CodecConfig::default());
        assert_eq!(
            codec.encode(&Record::new()).unwrap_err(),
            EncodeError::MissingVersion
        );

        let record = Record::from([("version".to_string(), Value::Bool(true))]);
        assert_eq!(codec.encode(&record).unwrap_err(), EncodeError::MissingVersion);
    }

    #[test]
    fn test_unknown_version() {
        let codec = codec(CodecConfig::default());
        let record = Record::from([("version".to_string(), Value::Int(9))]);
        assert_eq!(codec.encode(&record).unwrap_err(), EncodeError::UnknownVersion(9));

        // 000011 = version 3.
        assert_eq!(codec.decode_bits("000011").unwrap_err(), DecodeError::UnknownVersion(3));
    }

    #[test]
    fn test_short_input() {
        let lenient = codec(CodecConfig::default());
        let decoded = lenient.decode_bits("0000011").unwrap();
        assert_eq!(decoded.get("flag"), Some(&Value::Bool(true)));
        assert_eq!(decoded.get("code"), Some(&Value::Language("aa".into())));

        let strict = codec(CodecConfig::strict());
        assert!(matches!(
            strict.decode_bits("0000011"),
            Err(DecodeError::TruncatedInput { .. })
        ));
        assert!(matches!(
            strict.decode_bits("0000"),
            Err(DecodeError::TruncatedInput { needed: 6, .. })
        ));
    }

    #[test]
    fn test_non_bit_characters() {
        let input = "0000011000001é000001";

        let strict = codec(CodecConfig::strict());
        assert_eq!(strict.decode_bits(input).unwrap_err(), DecodeError::InvalidBits);

        let lenient = codec(CodecConfig::default());
        let decoded = lenient.decode_bits(input).unwrap();
        assert_eq!(decoded.get("flag"), Some(&Value::Bool(true)));
        assert_eq!(decoded.get("code"), Some(&Value::Language("ba".into())));
    }

    #[test]
    fn test_schema_must_start_with_version() {
        let schema = Schema::new(vec![Field::bool("flag")]).unwrap();
        assert_eq!(
            VersionMap::new().with_schema(1, schema).unwrap_err(),
            SchemaError::MissingVersionField
        );
    }

    #[test]
    fn test_version_width_mismatch() {
        let versions = VersionMap::new().with_schema(1, schema_v1()).unwrap();
        let mut config = CodecConfig::default();
        config.set_version_bits(4);

        assert_eq!(
            Codec::new(versions, config).unwrap_err(),
            SchemaError::VersionWidthMismatch {
                expected: 4,
                found: 6
            }
        );
    }

    #[test]
    fn test_versions_listing() {
        let codec = codec(CodecConfig::default());
        assert_eq!(codec.versions().versions().collect::<Vec<_>>(), vec![1, 2]);
        assert!(!codec.versions().is_empty());
    }

    #[test]
    fn test_codec_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Codec>();
    }
}
