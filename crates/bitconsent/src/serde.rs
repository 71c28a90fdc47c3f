//! JSON-deserializable version map description.
//!
//! These types describe schemas as data, for example a definitions file
//! shipped with your application. Closures cannot be written in JSON, so
//! computed widths, list counts and validators are expressed as references to
//! earlier fields:
//!
//! ```json
//! {
//!   "config": { "version_bits": 6 },
//!   "versions": {
//!     "1": {
//!       "fields": [
//!         { "name": "version", "type": "int", "width": 6 },
//!         { "name": "maxVendorId", "type": "int", "width": 16 },
//!         { "name": "isRange", "type": "bool" },
//!         { "name": "bitField", "type": "bits", "width": { "field": "maxVendorId" },
//!           "when": { "field": "isRange", "equals": false } }
//!       ]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    config::CodecConfig,
    errors::SchemaError,
    field::{Field, FieldKind, ListSpec, Size},
    schema::Schema,
    value::{Value, int_field},
    versions::{Codec, VersionMap},
};

/// Top-level definition: configuration plus one schema per version.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VersionMapDef {
    #[serde(default)]
    pub config: CodecConfig,
    /// Keyed by version number.
    pub versions: BTreeMap<u64, SchemaDef>,
}

/// Ordered list of field definitions for one version.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchemaDef {
    pub fields: Vec<FieldDef>,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    /// Key in the record.
    pub name: String,
    /// One of `int`, `bool`, `date`, `bits`, `language`, `list`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Required for `int`, `date` and `bits`. Defaults to 12 for `language`.
    #[serde(default)]
    pub width: Option<SizeDef>,
    /// Number of elements of a `list`. Defaults to 0.
    #[serde(default, alias = "listCount")]
    pub list_count: Option<SizeDef>,
    /// Element layout of a `list`.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Only present when the condition holds.
    #[serde(default)]
    pub when: Option<ConditionDef>,
}

/// A fixed size, or the integer value of an earlier field.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum SizeDef {
    Fixed(usize),
    Field { field: String },
}

/// Field presence condition: an earlier field equals a constant.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConditionDef {
    pub field: String,
    pub equals: ConstDef,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ConstDef {
    Bool(bool),
    Int(u64),
}

impl ConstDef {
    fn matches(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (ConstDef::Bool(expected), Some(Value::Bool(actual))) => expected == actual,
            (ConstDef::Int(expected), Some(Value::Int(actual))) => expected == actual,
            // Absent fields behave like false / 0.
            (ConstDef::Bool(expected), None) => !expected,
            (ConstDef::Int(expected), None) => *expected == 0,
            _ => false,
        }
    }
}

impl TryFrom<SchemaDef> for Schema {
    type Error = SchemaError;

    fn try_from(value: SchemaDef) -> Result<Self, Self::Error> {
        Schema::new(fields_from_defs(value.fields)?)
    }
}

impl TryFrom<VersionMapDef> for Codec {
    type Error = SchemaError;

    fn try_from(value: VersionMapDef) -> Result<Self, Self::Error> {
        let mut versions = VersionMap::new();
        for (version, schema) in value.versions {
            versions.insert(version, schema.try_into()?)?;
        }

        Codec::new(versions, value.config)
    }
}

impl Codec {
    /// Builds a codec from a JSON [`VersionMapDef`].
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let def: VersionMapDef =
            serde_json::from_str(json).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;
        def.try_into()
    }
}

fn fields_from_defs(defs: Vec<FieldDef>) -> Result<Vec<Field>, SchemaError> {
    let mut earlier: Vec<String> = Vec::with_capacity(defs.len());
    let mut fields = Vec::with_capacity(defs.len());

    for def in defs {
        let name = def.name.clone();
        fields.push(field_from_def(def, &earlier)?);
        earlier.push(name);
    }

    Ok(fields)
}

fn field_from_def(def: FieldDef, earlier: &[String]) -> Result<Field, SchemaError> {
    let width = def
        .width
        .map(|width| size_from_def(width, &def.name, earlier))
        .transpose()?;
    let sized = |width: Option<Size>| width.ok_or_else(|| SchemaError::MissingWidth(def.name.clone()));

    let mut field = match def.kind.as_str() {
        "int" => Field::int(&def.name, sized(width)?),
        "date" => Field::date(&def.name, sized(width)?),
        "bits" => Field::bits(&def.name, sized(width)?),
        "bool" => Field::bool(&def.name),
        "language" => Field::language(&def.name).with_width(width.unwrap_or(Size::Fixed(12))),
        "list" => {
            let count = def
                .list_count
                .map(|count| size_from_def(count, &def.name, earlier))
                .transpose()?
                .unwrap_or(Size::Fixed(0));
            let spec = ListSpec {
                count,
                fields: fields_from_defs(def.fields)?,
            };
            Field::new(&def.name, FieldKind::List(spec), 0)
        }
        // Hooks cannot be expressed as data.
        "custom" => return Err(SchemaError::MissingOverride(def.name)),
        other => return Err(SchemaError::UnknownFieldType(other.to_string())),
    };

    if let Some(condition) = def.when {
        check_reference(&condition.field, &def.name, earlier)?;
        let ConditionDef { field: reference, equals } = condition;
        field = field.with_validator(move |record| equals.matches(record.get(&reference)));
    }

    Ok(field)
}

fn size_from_def(def: SizeDef, field: &str, earlier: &[String]) -> Result<Size, SchemaError> {
    match def {
        SizeDef::Fixed(size) => Ok(Size::Fixed(size)),
        SizeDef::Field { field: reference } => {
            check_reference(&reference, field, earlier)?;
            Ok(Size::computed(move |record| {
                usize::try_from(int_field(record, &reference)).unwrap_or(usize::MAX)
            }))
        }
    }
}

fn check_reference(reference: &str, field: &str, earlier: &[String]) -> Result<(), SchemaError> {
    if earlier.iter().any(|name| name == reference) {
        Ok(())
    } else {
        Err(SchemaError::UnknownFieldReference {
            field: field.to_string(),
            reference: reference.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    const DEFINITIONS: &str = r#"{
        "versions": {
            "1": {
                "fields": [
                    { "name": "version", "type": "int", "width": 6 },
                    { "name": "created", "type": "date", "width": 36 },
                    { "name": "consentLanguage", "type": "language" },
                    { "name": "maxVendorId", "type": "int", "width": 16 },
                    { "name": "isRange", "type": "bool" },
                    { "name": "bitField", "type": "bits", "width": { "field": "maxVendorId" },
                      "when": { "field": "isRange", "equals": false } },
                    { "name": "numEntries", "type": "int", "width": 12,
                      "when": { "field": "isRange", "equals": true } },
                    { "name": "vendorRangeList", "type": "list",
                      "listCount": { "field": "numEntries" },
                      "when": { "field": "isRange", "equals": true },
                      "fields": [
                          { "name": "isRange", "type": "bool" },
                          { "name": "startVendorId", "type": "int", "width": 16 },
                          { "name": "endVendorId", "type": "int", "width": 16,
                            "when": { "field": "isRange", "equals": true } }
                      ] }
                ]
            }
        }
    }"#;

    fn entry(start: u64, end: Option<u64>) -> Record {
        let mut item = Record::from([
            ("isRange".to_string(), Value::Bool(end.is_some())),
            ("startVendorId".to_string(), Value::Int(start)),
        ]);
        if let Some(end) = end {
            item.insert("endVendorId".to_string(), Value::Int(end));
        }
        item
    }

    #[test]
    fn test_bit_field_layout() {
        let codec = Codec::from_json(DEFINITIONS).unwrap();
        let record = Record::from([
            ("version".to_string(), Value::Int(1)),
            ("created".to_string(), Value::Date(1_510_082_155_400)),
            ("consentLanguage".to_string(), Value::Language("en".into())),
            ("maxVendorId".to_string(), Value::Int(5)),
            ("isRange".to_string(), Value::Bool(false)),
            ("bitField".to_string(), Value::Bits("10110".into())),
        ]);

        let bits = codec.encode_bits(&record).unwrap();
        assert_eq!(bits.len(), 6 + 36 + 12 + 16 + 1 + 5);

        let token = codec.encode(&record).unwrap();
        assert_eq!(codec.decode(&token).unwrap(), record);
    }

    #[test]
    fn test_range_list_layout() {
        let codec = Codec::from_json(DEFINITIONS).unwrap();
        let record = Record::from([
            ("version".to_string(), Value::Int(1)),
            ("created".to_string(), Value::Date(1_510_082_155_400)),
            ("consentLanguage".to_string(), Value::Language("fr".into())),
            ("maxVendorId".to_string(), Value::Int(400)),
            ("isRange".to_string(), Value::Bool(true)),
            ("numEntries".to_string(), Value::Int(2)),
            (
                "vendorRangeList".to_string(),
                Value::List(vec![entry(3, None), entry(10, Some(300))]),
            ),
        ]);

        let bits = codec.encode_bits(&record).unwrap();
        assert_eq!(bits.len(), 6 + 36 + 12 + 16 + 1 + 12 + (1 + 16) + (1 + 16 + 16));

        let decoded = codec.decode(&codec.encode(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
        assert!(!decoded.contains_key("bitField"));
    }

    #[test]
    fn test_unknown_type() {
        let json = r#"{ "versions": { "1": { "fields": [
            { "name": "version", "type": "int", "width": 6 },
            { "name": "x", "type": "float", "width": 32 }
        ] } } }"#;
        assert_eq!(
            Codec::from_json(json).unwrap_err(),
            SchemaError::UnknownFieldType("float".into())
        );
    }

    #[test]
    fn test_forward_reference() {
        let json = r#"{ "versions": { "1": { "fields": [
            { "name": "version", "type": "int", "width": 6 },
            { "name": "ids", "type": "bits", "width": { "field": "max" } },
            { "name": "max", "type": "int", "width": 8 }
        ] } } }"#;
        assert_eq!(
            Codec::from_json(json).unwrap_err(),
            SchemaError::UnknownFieldReference {
                field: "ids".into(),
                reference: "max".into()
            }
        );
    }

    #[test]
    fn test_missing_width() {
        let json = r#"{ "versions": { "1": { "fields": [
            { "name": "version", "type": "int" }
        ] } } }"#;
        assert_eq!(
            Codec::from_json(json).unwrap_err(),
            SchemaError::MissingWidth("version".into())
        );
    }

    #[test]
    fn test_custom_needs_hooks() {
        let json = r#"{ "versions": { "1": { "fields": [
            { "name": "version", "type": "int", "width": 6 },
            { "name": "blob", "type": "custom" }
        ] } } }"#;
        assert_eq!(
            Codec::from_json(json).unwrap_err(),
            SchemaError::MissingOverride("blob".into())
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Codec::from_json("{ not json"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{ "config": { "version_bits": 4, "mode": "Strict" },
            "versions": { "1": { "fields": [
                { "name": "version", "type": "int", "width": 4 }
            ] } } }"#;
        let codec = Codec::from_json(json).unwrap();
        assert_eq!(codec.config(), &CodecConfig {
            version_bits: 4,
            mode: crate::config::Mode::Strict
        });
    }

    #[test]
    fn test_width_from_token_past_end() {
        let fields = r#"[
            { "name": "version", "type": "int", "width": 6 },
            { "name": "max", "type": "int", "width": 64 },
            { "name": "ids", "type": "bits", "width": { "field": "max" } },
            { "name": "tail", "type": "bool" }
        ]"#;
        let bits = format!("000001{}", "1".repeat(64));

        let lenient = Codec::from_json(&format!(r#"{{ "versions": {{ "1": {{ "fields": {fields} }} }} }}"#)).unwrap();
        let decoded = lenient.decode_bits(&bits).unwrap();
        assert_eq!(decoded.get("max"), Some(&Value::Int(u64::MAX)));
        assert_eq!(decoded.get("ids"), Some(&Value::Bits(String::new())));
        assert_eq!(decoded.get("tail"), Some(&Value::Bool(false)));

        let strict = Codec::from_json(&format!(
            r#"{{ "config": {{ "version_bits": 6, "mode": "Strict" }}, "versions": {{ "1": {{ "fields": {fields} }} }} }}"#
        ))
        .unwrap();
        assert!(matches!(
            strict.decode_bits(&bits),
            Err(crate::errors::DecodeError::TruncatedInput { .. })
        ));
    }
}
