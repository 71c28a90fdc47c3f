//! Schema: ordered list of fields for one version.
//!
//! Field order is the bit layout. It is also the dependency order: computed
//! widths, list counts and validators may only look at earlier fields. That
//! cannot be checked for closures, so it is a precondition of [`Schema::new`].

use std::collections::HashSet;

use tracing::trace;

use crate::{
    config::Mode,
    engine::{decode_field, encode_field},
    errors::{DecodeError, EncodeError, SchemaError},
    field::{Decoded, Field, FieldKind},
    value::Record,
};

/// A validated, ordered list of [`Field`]s. Build with [`Schema::new`].
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Validates `fields` and wraps them in a schema.
    ///
    /// Rejects empty or duplicate names, ints and dates wider than 64 bits,
    /// bools not 1 bit wide, odd language widths, and custom fields missing a
    /// hook. List elements are checked the same way.
    pub fn new(fields: Vec<Field>) -> Result<Self, SchemaError> {
        validate_fields(&fields)?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Concatenates the bits of every field of `input`.
    pub fn encode(&self, input: &Record, mode: Mode) -> Result<String, EncodeError> {
        encode_fields(&self.fields, input, mode)
    }

    /// Decodes every field starting at `start`. Returns the record and the cursor after the last field.
    pub fn decode(&self, bits: &str, start: usize, mode: Mode) -> Result<(Record, usize), DecodeError> {
        decode_fields(&self.fields, bits, start, mode)
    }
}

/// Encodes `fields` in order against the same input record.
pub fn encode_fields(fields: &[Field], input: &Record, mode: Mode) -> Result<String, EncodeError> {
    fields.iter().try_fold(String::new(), |mut acc, field| {
        acc.push_str(&encode_field(field, input, mode)?);
        Ok::<_, EncodeError>(acc)
    })
}

/// Decodes `fields` in order, threading the cursor and growing the record.
pub fn decode_fields(
    fields: &[Field],
    bits: &str,
    start: usize,
    mode: Mode,
) -> Result<(Record, usize), DecodeError> {
    let mut record = Record::new();
    let mut position = start;

    for field in fields {
        let Decoded { value, next } = decode_field(field, bits, &record, position, mode)?;

        if let Some(value) = value {
            record.insert(field.name.clone(), value);
        }

        position = next;
    }

    trace!(start, end = position, fields = fields.len(), "decoded fields");
    Ok((record, position))
}

fn validate_fields(fields: &[Field]) -> Result<(), SchemaError> {
    let mut names = HashSet::with_capacity(fields.len());

    for field in fields {
        if field.name.trim().is_empty() {
            return Err(SchemaError::InvalidFieldName);
        }
        if !names.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateFieldName(field.name.clone()));
        }

        let invalid_width = |width| SchemaError::InvalidFieldWidth {
            field: field.name.clone(),
            width,
        };

        match (&field.kind, field.width.fixed()) {
            (FieldKind::Int | FieldKind::Date, Some(width)) if width > 64 => {
                return Err(invalid_width(width));
            }
            (FieldKind::Bool, Some(width)) if width != 1 => {
                return Err(invalid_width(width));
            }
            (FieldKind::Language, Some(width)) if width % 2 != 0 => {
                return Err(SchemaError::OddLanguageWidth {
                    field: field.name.clone(),
                    width,
                });
            }
            (FieldKind::List(spec), _) => validate_fields(&spec.fields)?,
            (FieldKind::Custom, _) if field.encoder.is_none() || field.decoder.is_none() => {
                return Err(SchemaError::MissingOverride(field.name.clone()));
            }
            _ => {}
        }
    }

    Ok(())
}
