//! Field descriptors used to build a [crate::schema::Schema].
//!
//! A field is a name, a kind, a width and optional hooks. Widths, list counts
//! and validators may look at the record built so far, which only ever holds
//! fields that come strictly earlier in the same schema (or list element).

use std::{fmt, sync::Arc};

use crate::value::{Record, Value};

/// Decides from the record so far whether a field is present.
pub type Validator = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Replaces the built-in encoding of a field. Receives the whole input record
/// and returns the field's bits verbatim.
pub type Encoder = Arc<dyn Fn(&Record) -> String + Send + Sync>;

/// Replaces the built-in decoding of a field. Receives the full bit string,
/// the record so far and the cursor, and must return the cursor after the field.
pub type Decoder = Arc<dyn Fn(&str, &Record, usize) -> Decoded + Send + Sync>;

/// Outcome of decoding one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// `None` leaves the field out of the record.
    pub value: Option<Value>,
    /// Cursor after the field.
    pub next: usize,
}

impl Decoded {
    pub fn new(value: Value, next: usize) -> Self {
        Self {
            value: Some(value),
            next,
        }
    }

    /// No value, cursor unchanged.
    pub fn skipped(cursor: usize) -> Self {
        Self {
            value: None,
            next: cursor,
        }
    }
}

/// A bit width or list count: fixed, or computed from the record so far.
#[derive(Clone)]
pub enum Size {
    Fixed(usize),
    Computed(Arc<dyn Fn(&Record) -> usize + Send + Sync>),
}

impl Size {
    pub fn computed(f: impl Fn(&Record) -> usize + Send + Sync + 'static) -> Self {
        Size::Computed(Arc::new(f))
    }

    pub fn resolve(&self, record: &Record) -> usize {
        match self {
            Size::Fixed(size) => *size,
            Size::Computed(f) => f(record),
        }
    }

    pub fn fixed(&self) -> Option<usize> {
        match self {
            Size::Fixed(size) => Some(*size),
            Size::Computed(_) => None,
        }
    }
}

impl From<usize> for Size {
    fn from(size: usize) -> Self {
        Size::Fixed(size)
    }
}

impl fmt::Debug for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Fixed(size) => f.debug_tuple("Fixed").field(size).finish(),
            Size::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Repeated group of sub-fields.
#[derive(Debug, Clone)]
pub struct ListSpec {
    /// Number of elements. Must be derivable from earlier fields; lists carry no length prefix.
    pub count: Size,
    /// Layout of each element. Their widths and validators see the element record.
    pub fields: Vec<Field>,
}

/// What a field holds on the wire.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Int,
    /// Always one bit.
    Bool,
    /// Timestamp in 100 ms units.
    Date,
    /// Raw bits, right-padded or truncated to the width.
    Bits,
    /// Two letters, `width / 2` bits each.
    Language,
    List(ListSpec),
    /// No built-in layout: both an encoder and a decoder hook are required.
    Custom,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Int => "int",
            FieldKind::Bool => "bool",
            FieldKind::Date => "date",
            FieldKind::Bits => "bits",
            FieldKind::Language => "language",
            FieldKind::List(_) => "list",
            FieldKind::Custom => "custom",
        }
    }
}

/// A single named field.
#[derive(Clone)]
pub struct Field {
    /// Key in the record.
    pub name: String,
    pub kind: FieldKind,
    /// Bit width. Ignored by lists, whose width is the sum of their elements.
    pub width: Size,
    pub validator: Option<Validator>,
    pub encoder: Option<Encoder>,
    pub decoder: Option<Decoder>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind, width: impl Into<Size>) -> Self {
        Field {
            name: name.into(),
            kind,
            width: width.into(),
            validator: None,
            encoder: None,
            decoder: None,
        }
    }

    pub fn int(name: impl Into<String>, width: impl Into<Size>) -> Self {
        Self::new(name, FieldKind::Int, width)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool, 1)
    }

    pub fn date(name: impl Into<String>, width: impl Into<Size>) -> Self {
        Self::new(name, FieldKind::Date, width)
    }

    pub fn bits(name: impl Into<String>, width: impl Into<Size>) -> Self {
        Self::new(name, FieldKind::Bits, width)
    }

    /// Two-letter code in the usual 12 bits.
    pub fn language(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Language, 12)
    }

    pub fn list(name: impl Into<String>, count: impl Into<Size>, fields: Vec<Field>) -> Self {
        let spec = ListSpec {
            count: count.into(),
            fields,
        };
        Self::new(name, FieldKind::List(spec), 0)
    }

    pub fn custom(
        name: impl Into<String>,
        encoder: impl Fn(&Record) -> String + Send + Sync + 'static,
        decoder: impl Fn(&str, &Record, usize) -> Decoded + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, FieldKind::Custom, 0)
            .with_encoder(encoder)
            .with_decoder(decoder)
    }

    pub fn with_width(mut self, width: impl Into<Size>) -> Self {
        self.width = width.into();
        self
    }

    /// Only encode/decode this field when `validator` accepts the record.
    ///
    /// Encoding checks the full input record; decoding can only check the
    /// fields decoded so far. A rejected field takes no bits either way.
    pub fn with_validator(mut self, validator: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_encoder(mut self, encoder: impl Fn(&Record) -> String + Send + Sync + 'static) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    pub fn with_decoder(
        mut self,
        decoder: impl Fn(&str, &Record, usize) -> Decoded + Send + Sync + 'static,
    ) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("validator", &self.validator.is_some())
            .field("encoder", &self.encoder.is_some())
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}
