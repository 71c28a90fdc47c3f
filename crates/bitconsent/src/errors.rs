//! Error types for schema construction, encoding and decoding.
//!
//! Configuration problems (a bad schema, an unknown version) are always
//! errors. Data problems are only reported in [`crate::config::Mode::Strict`];
//! lenient mode decodes short input to zeros instead.

use thiserror::Error;

/// Errors produced while building a [`crate::schema::Schema`], a
/// [`crate::versions::VersionMap`] or a [`crate::versions::Codec`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Field name is empty.
    #[error("field name is empty")]
    InvalidFieldName,
    /// Two fields at the same level share a name.
    #[error("duplicate field name `{0}`")]
    DuplicateFieldName(String),
    /// Fixed width is not allowed for the field kind (e.g. a 65 bit int).
    #[error("field `{field}` cannot be {width} bits wide")]
    InvalidFieldWidth { field: String, width: usize },
    /// A JSON field definition of a sized kind has no width.
    #[error("field `{0}` has no width")]
    MissingWidth(String),
    /// Language fields split their width in two halves.
    #[error("language field `{field}` has odd width {width}")]
    OddLanguageWidth { field: String, width: usize },
    /// Every schema must start with a fixed-width `version` int field.
    #[error("schema does not start with a fixed-width `version` int field")]
    MissingVersionField,
    /// A schema's version field disagrees with the configured version width.
    #[error("version field is {found} bits wide, expected {expected}")]
    VersionWidthMismatch { expected: usize, found: usize },
    /// Unrecognised `type` in a JSON field definition.
    #[error("unknown field type `{0}`")]
    UnknownFieldType(String),
    /// A computed width, count or condition refers to a field that is not strictly earlier.
    #[error("field `{field}` references `{reference}`, which is not an earlier field")]
    UnknownFieldReference { field: String, reference: String },
    /// A custom field needs both an encoder and a decoder.
    #[error("custom field `{0}` needs both an encoder and a decoder")]
    MissingOverride(String),
    /// JSON definition could not be parsed.
    #[error("invalid schema definition: {0}")]
    InvalidJson(String),
}

/// Errors produced when encoding a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The record has no integer `version` field.
    #[error("no version field to encode")]
    MissingVersion,
    /// The version map has no schema for this version.
    #[error("no definition for version {0}")]
    UnknownVersion(u64),
    /// A custom field was encoded without an encoder hook.
    #[error("custom field `{0}` has no encoder")]
    MissingOverride(String),
    /// Strict mode: value variant does not match the field kind.
    #[error("field `{field}` expects a {expected} value")]
    TypeMismatch { field: String, expected: &'static str },
    /// Strict mode: value does not fit in the field width.
    #[error("value of field `{field}` does not fit in {width} bits")]
    ValueOutOfRange { field: String, width: usize },
    /// Strict mode: value is malformed for its kind.
    #[error("invalid value for field `{field}`: {reason}")]
    InvalidValue { field: String, reason: &'static str },
}

/// Errors produced when decoding a bit string or text token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The version read at offset 0 has no schema.
    #[error("unsupported version {0} in the string to decode")]
    UnknownVersion(u64),
    /// Strict mode: input ends before a field does.
    #[error("field `{field}` needs {needed} bits, input has {available}")]
    TruncatedInput {
        field: String,
        needed: usize,
        available: usize,
    },
    /// Strict mode: bit input contains a character other than `'0'` or `'1'`.
    #[error("bit input contains characters other than '0' and '1'")]
    InvalidBits,
    /// Token is not valid base64.
    #[error("invalid text token: {0}")]
    InvalidText(String),
    /// A decoder hook moved the cursor backwards.
    #[error("decoder of field `{field}` moved the cursor from {cursor} back to {next}")]
    CursorRegressed {
        field: String,
        cursor: usize,
        next: usize,
    },
    /// A custom field was decoded without a decoder hook.
    #[error("custom field `{0}` has no decoder")]
    MissingOverride(String),
}
