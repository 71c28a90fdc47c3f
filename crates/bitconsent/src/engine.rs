//! Encoding and decoding of a single field.
//!
//! Both directions check the validator first, then the override hook, then
//! fall back to the built-in layout for the field kind. Lists recurse into
//! [`crate::schema`] once per element.

use tracing::{trace, warn};

use crate::{
    bits,
    config::Mode,
    errors::{DecodeError, EncodeError},
    field::{Decoded, Field, FieldKind},
    schema::{decode_fields, encode_fields},
    value::{Record, Value},
};

/// Encodes `field` from `input`.
///
/// A field rejected by its validator contributes no bits. Missing values
/// encode as zeros of the field width (an empty list encodes as nothing).
pub fn encode_field(field: &Field, input: &Record, mode: Mode) -> Result<String, EncodeError> {
    if let Some(validator) = &field.validator {
        if !validator(input) {
            return Ok(String::new());
        }
    }

    if let Some(encoder) = &field.encoder {
        return Ok(encoder(input));
    }

    let width = field.width.resolve(input);
    let value = input.get(&field.name);

    match &field.kind {
        FieldKind::Int => match value {
            None => Ok(bits::encode_int(0, width)),
            Some(Value::Int(n)) => encode_checked(field, *n, width, mode),
            Some(_) => mismatch(field, width, mode),
        },
        FieldKind::Bool => match value {
            None => Ok(bits::encode_bool(false)),
            Some(Value::Bool(b)) => Ok(bits::encode_bool(*b)),
            Some(_) => mismatch(field, 1, mode),
        },
        FieldKind::Date => match value {
            None => Ok(bits::encode_int(0, width)),
            Some(Value::Date(millis)) => encode_checked(field, millis / 100, width, mode),
            // Already in 100 ms units.
            Some(Value::Int(n)) => encode_checked(field, *n, width, mode),
            Some(_) => mismatch(field, width, mode),
        },
        FieldKind::Bits => match value {
            None => Ok(bits::encode_int(0, width)),
            Some(Value::Bits(raw)) => encode_raw_bits(field, raw, width, mode),
            Some(_) => mismatch(field, width, mode),
        },
        FieldKind::Language => match value {
            None => Ok(bits::encode_int(0, width)),
            Some(Value::Language(code)) => {
                if mode == Mode::Strict
                    && (code.chars().count() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()))
                {
                    return Err(EncodeError::InvalidValue {
                        field: field.name.clone(),
                        reason: "expected two ASCII letters",
                    });
                }
                if mode == Mode::Strict
                    && !code.chars().all(|c| bits::fits(bits::letter_index(c), width / 2))
                {
                    return Err(EncodeError::ValueOutOfRange {
                        field: field.name.clone(),
                        width,
                    });
                }
                Ok(bits::encode_language(code, width))
            }
            Some(_) => mismatch(field, width, mode),
        },
        FieldKind::List(spec) => match value {
            None => Ok(String::new()),
            Some(Value::List(items)) => items.iter().try_fold(String::new(), |mut acc, item| {
                acc.push_str(&encode_fields(&spec.fields, item, mode)?);
                Ok::<_, EncodeError>(acc)
            }),
            Some(_) => mismatch(field, 0, mode),
        },
        FieldKind::Custom => Err(EncodeError::MissingOverride(field.name.clone())),
    }
}

/// Decodes `field` at `cursor`, given the record decoded so far.
///
/// A field rejected by its validator yields no value and leaves the cursor
/// where it was, so the next field starts at the same position.
pub fn decode_field(
    field: &Field,
    bits: &str,
    partial: &Record,
    cursor: usize,
    mode: Mode,
) -> Result<Decoded, DecodeError> {
    if let Some(validator) = &field.validator {
        if !validator(partial) {
            trace!(field = %field.name, cursor, "field skipped by validator");
            return Ok(Decoded::skipped(cursor));
        }
    }

    if let Some(decoder) = &field.decoder {
        let decoded = decoder(bits, partial, cursor);
        if decoded.next < cursor {
            return Err(DecodeError::CursorRegressed {
                field: field.name.clone(),
                cursor,
                next: decoded.next,
            });
        }
        return Ok(decoded);
    }

    let width = field.width.resolve(partial);
    trace!(field = %field.name, kind = field.kind.name(), cursor, width, "decoding field");

    match &field.kind {
        FieldKind::Int => {
            let next = advance(field, bits, cursor, width, mode)?;
            let value = bits::decode_int(bits, cursor, width);
            Ok(Decoded::new(Value::Int(value), next))
        }
        FieldKind::Bool => {
            let next = advance(field, bits, cursor, 1, mode)?;
            Ok(Decoded::new(Value::Bool(bits::decode_bool(bits, cursor)), next))
        }
        FieldKind::Date => {
            let next = advance(field, bits, cursor, width, mode)?;
            let millis = bits::decode_date(bits, cursor, width);
            Ok(Decoded::new(Value::Date(millis), next))
        }
        FieldKind::Bits => {
            let next = advance(field, bits, cursor, width, mode)?;
            let raw = bits::slice(bits, cursor, width).to_string();
            Ok(Decoded::new(Value::Bits(raw), next))
        }
        FieldKind::Language => {
            let next = advance(field, bits, cursor, width, mode)?;
            let code = bits::decode_language(bits, cursor, width);
            Ok(Decoded::new(Value::Language(code), next))
        }
        FieldKind::List(spec) => {
            let count = spec.count.resolve(partial);
            let mut items = Vec::new();
            let mut position = cursor;

            for decoded in 0..count {
                if position >= bits.len() && mode == Mode::Lenient {
                    // Every further element would read past the end.
                    warn!(field = %field.name, decoded, count, "list runs past end of input");
                    break;
                }

                let (item, next) = decode_fields(&spec.fields, bits, position, mode)?;
                if next == position && position >= bits.len() {
                    return Err(DecodeError::TruncatedInput {
                        field: field.name.clone(),
                        needed: position.saturating_add(count - decoded),
                        available: bits.len(),
                    });
                }

                items.push(item);
                position = next;
            }

            Ok(Decoded::new(Value::List(items), position))
        }
        FieldKind::Custom => Err(DecodeError::MissingOverride(field.name.clone())),
    }
}

fn encode_checked(field: &Field, value: u64, width: usize, mode: Mode) -> Result<String, EncodeError> {
    if mode == Mode::Strict && !bits::fits(value, width) {
        return Err(EncodeError::ValueOutOfRange {
            field: field.name.clone(),
            width,
        });
    }

    Ok(bits::encode_int(value, width))
}

fn encode_raw_bits(field: &Field, raw: &str, width: usize, mode: Mode) -> Result<String, EncodeError> {
    match mode {
        Mode::Strict => {
            if !bits::is_bit_string(raw) {
                return Err(EncodeError::InvalidValue {
                    field: field.name.clone(),
                    reason: "expected only '0' and '1'",
                });
            }
            if raw.len() > width {
                return Err(EncodeError::ValueOutOfRange {
                    field: field.name.clone(),
                    width,
                });
            }
            Ok(bits::pad_right(raw, width - raw.len()))
        }
        Mode::Lenient => {
            // Anything that is not a one is a zero.
            let normalized: String = raw
                .chars()
                .take(width)
                .map(|c| if c == '1' { '1' } else { '0' })
                .collect();
            let padding = width - normalized.len();
            Ok(bits::pad_right(&normalized, padding))
        }
    }
}

fn mismatch(field: &Field, width: usize, mode: Mode) -> Result<String, EncodeError> {
    match mode {
        Mode::Strict => Err(EncodeError::TypeMismatch {
            field: field.name.clone(),
            expected: field.kind.name(),
        }),
        Mode::Lenient => match field.kind {
            FieldKind::List(_) => Ok(String::new()),
            _ => Ok(bits::encode_int(0, width)),
        },
    }
}

/// Cursor after a `width`-bit read at `cursor`.
///
/// Lenient mode clamps a read past the end to the end of the input, never
/// moving the cursor backwards.
fn advance(
    field: &Field,
    bits: &str,
    cursor: usize,
    width: usize,
    mode: Mode,
) -> Result<usize, DecodeError> {
    let needed = cursor.checked_add(width);
    if let Some(next) = needed {
        if next <= bits.len() {
            return Ok(next);
        }
    }

    match mode {
        Mode::Strict => Err(DecodeError::TruncatedInput {
            field: field.name.clone(),
            needed: needed.unwrap_or(usize::MAX),
            available: bits.len(),
        }),
        Mode::Lenient => {
            warn!(field = %field.name, cursor, width, available = bits.len(), "reading past end of input");
            Ok(bits.len().max(cursor))
        }
    }
}
