//! JSON codec interpretation
//!
//! [`parse`] follows `__<tag>_<record>_from_json`: members are looked up by JSON name,
//! absence is handled per node, and an enum string without a match fails. [`build`]
//! follows `__<tag>_<record>_to_json`. A [`RecordValue`] stands in for the C struct:
//! a member the parser never wrote is simply missing, and a missing member is built
//! as the zero value a zero-initialized struct holds.

use std::collections::BTreeMap;

use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::{alphabet, Engine as _};
use codegen::generators::json_codec::{DefaultValue, EnumMapping};
use codegen::{JsonField, JsonKind};
use serde_json::{Map, Value};
use thiserror::Error;

/// Padded standard base64; stray low bits in the last quantum are ignored as glib does
const BLOB_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// A member value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Integer scalar
    Int(i64),
    /// Floating-point scalar
    Double(f64),
    /// Boolean scalar
    Boolean(bool),
    /// String pointer
    String(String),
    /// Blob buffer; its length member is implied
    Blob(Vec<u8>),
    /// Enum value
    Enum(i64),
    /// Nested record, inline or not
    Record(RecordValue),
}

/// Member values keyed by C member name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordValue {
    members: BTreeMap<String, FieldValue>,
}

impl RecordValue {
    /// An empty record
    pub fn new() -> Self { Self::default() }

    /// Set a member, builder style
    pub fn with(mut self, name: &str, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a member
    pub fn insert(&mut self, name: &str, value: FieldValue) {
        self.members.insert(name.to_string(), value);
    }

    /// Member value, if written
    pub fn get(&self, name: &str) -> Option<&FieldValue> { self.members.get(name) }

    /// Number of written members
    pub fn len(&self) -> usize { self.members.len() }

    /// Whether no member was written
    pub fn is_empty(&self) -> bool { self.members.is_empty() }
}

/// Why a parse (or a build of an ill-typed value) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecFailure {
    /// The input is not a JSON object.
    #[error("expected a JSON object")]
    NotAnObject,
    /// A required member is absent.
    #[error("required member `{0}` is missing")]
    Missing(String),
    /// A member holds the wrong JSON type.
    #[error("member `{member}` is not {expected}")]
    TypeMismatch {
        /// JSON (or C) member name
        member: String,
        /// Expected kind
        expected: &'static str,
    },
    /// A blob member is not valid base64.
    #[error("member `{0}` is not valid base64")]
    InvalidBase64(String),
    /// An enum member names no symbol.
    #[error("member `{member}` has no enum symbol `{value}`")]
    UnknownEnumName {
        /// JSON member name
        member: String,
        /// Offending text
        value: String,
    },
}

/// Parse `input` the way the generated parser for `tree` does
pub fn parse(tree: &JsonField, input: &Value) -> Result<RecordValue, CodecFailure> {
    let object = input.as_object().ok_or(CodecFailure::NotAnObject)?;
    let mut record = RecordValue::new();
    parse_members(&tree.children, object, &mut record)?;
    Ok(record)
}

fn parse_members(
    fields: &[JsonField],
    object: &Map<String, Value>,
    record: &mut RecordValue,
) -> Result<(), CodecFailure> {
    for field in fields {
        if field.kind == JsonKind::InlineObject {
            let mut inner = RecordValue::new();
            parse_members(&field.children, object, &mut inner)?;
            record.insert(field.c_name(), FieldValue::Record(inner));
            continue;
        }

        match object.get(field.member_name()) {
            Some(value) => {
                if let Some(parsed) = parse_value(field, value)? {
                    record.insert(field.c_name(), parsed);
                }
            }
            None => {
                if let Some(default) = &field.default {
                    record.insert(field.c_name(), default_value(default));
                } else if !field.optional {
                    return Err(CodecFailure::Missing(field.member_name().to_string()));
                }
            }
        }
    }
    Ok(())
}

fn parse_value(field: &JsonField, value: &Value) -> Result<Option<FieldValue>, CodecFailure> {
    let name = field.member_name();
    let mismatch =
        |expected: &'static str| CodecFailure::TypeMismatch { member: name.to_string(), expected };

    let parsed = match &field.kind {
        JsonKind::Int => FieldValue::Int(value.as_i64().ok_or_else(|| mismatch("an integer"))?),
        JsonKind::Double => FieldValue::Double(value.as_f64().ok_or_else(|| mismatch("a number"))?),
        JsonKind::Boolean => {
            FieldValue::Boolean(value.as_bool().ok_or_else(|| mismatch("a boolean"))?)
        }
        JsonKind::String => match value {
            // the string accessor yields NULL for a null member
            Value::Null => return Ok(None),
            Value::String(s) => FieldValue::String(s.clone()),
            _ => return Err(mismatch("a string")),
        },
        JsonKind::Base64Blob => {
            let text = value.as_str().ok_or_else(|| mismatch("a base64 string"))?;
            let bytes = BLOB_ENGINE
                .decode(text)
                .map_err(|_| CodecFailure::InvalidBase64(name.to_string()))?;
            FieldValue::Blob(bytes)
        }
        JsonKind::Enum(mapping) => {
            let entry = value.as_str().and_then(|text| mapping.lookup(text)).ok_or_else(|| {
                CodecFailure::UnknownEnumName { member: name.to_string(), value: value.to_string() }
            })?;
            FieldValue::Enum(entry.value)
        }
        JsonKind::Object => {
            let object = value.as_object().ok_or_else(|| mismatch("an object"))?;
            let mut inner = RecordValue::new();
            parse_members(&field.children, object, &mut inner)?;
            FieldValue::Record(inner)
        }
        JsonKind::InlineObject => return Ok(None),
    };
    Ok(Some(parsed))
}

fn default_value(default: &DefaultValue) -> FieldValue {
    match default {
        DefaultValue::Int(v) => FieldValue::Int(*v),
        DefaultValue::Double(v) => FieldValue::Double(*v),
        DefaultValue::Boolean(v) => FieldValue::Boolean(*v),
        DefaultValue::Enum { value, .. } => FieldValue::Enum(*value),
    }
}

/// Build the JSON the generated builder for `tree` produces from `record`
pub fn build(tree: &JsonField, record: &RecordValue) -> Result<Value, CodecFailure> {
    let mut object = Map::new();
    build_members(&tree.children, record, &mut object)?;
    Ok(Value::Object(object))
}

fn build_members(
    fields: &[JsonField],
    record: &RecordValue,
    object: &mut Map<String, Value>,
) -> Result<(), CodecFailure> {
    let empty = RecordValue::new();
    for field in fields {
        let member = record.get(field.c_name());
        if field.kind == JsonKind::InlineObject {
            let inner = nested(field, member, &empty)?;
            build_members(&field.children, inner, object)?;
            continue;
        }

        let pointer = matches!(field.kind, JsonKind::String | JsonKind::Base64Blob);
        if field.optional && pointer && member.is_none() {
            continue;
        }
        let value = build_value(field, member, &empty)?;
        object.insert(field.member_name().to_string(), value);
    }
    Ok(())
}

fn nested<'a>(
    field: &JsonField,
    member: Option<&'a FieldValue>,
    empty: &'a RecordValue,
) -> Result<&'a RecordValue, CodecFailure> {
    match member {
        None => Ok(empty),
        Some(FieldValue::Record(inner)) => Ok(inner),
        Some(_) => Err(ill_typed(field, "a record")),
    }
}

fn build_value(
    field: &JsonField,
    member: Option<&FieldValue>,
    empty: &RecordValue,
) -> Result<Value, CodecFailure> {
    let value = match (&field.kind, member) {
        (JsonKind::Int, None) => Value::from(0),
        (JsonKind::Int, Some(FieldValue::Int(v))) => Value::from(*v),
        (JsonKind::Double, None) => Value::from(0.0),
        (JsonKind::Double, Some(FieldValue::Double(v))) => Value::from(*v),
        (JsonKind::Boolean, None) => Value::Bool(false),
        (JsonKind::Boolean, Some(FieldValue::Boolean(v))) => Value::Bool(*v),
        // a NULL string pointer becomes a null member
        (JsonKind::String, None) => Value::Null,
        (JsonKind::String, Some(FieldValue::String(s))) => Value::String(s.clone()),
        (JsonKind::Base64Blob, None) => Value::String(String::new()),
        (JsonKind::Base64Blob, Some(FieldValue::Blob(bytes))) => {
            Value::String(BLOB_ENGINE.encode(bytes))
        }
        (JsonKind::Enum(mapping), None) => enum_name(mapping, 0),
        (JsonKind::Enum(mapping), Some(FieldValue::Enum(v))) => enum_name(mapping, *v),
        (JsonKind::Object | JsonKind::InlineObject, member) => {
            let inner = nested(field, member, empty)?;
            let mut object = Map::new();
            build_members(&field.children, inner, &mut object)?;
            Value::Object(object)
        }
        (kind, Some(_)) => return Err(ill_typed(field, kind_name(kind))),
    };
    Ok(value)
}

fn enum_name(mapping: &EnumMapping, value: i64) -> Value {
    match mapping.by_value(value) {
        Some(entry) => Value::String(entry.name.clone()),
        None => Value::Null,
    }
}

fn ill_typed(field: &JsonField, expected: &'static str) -> CodecFailure {
    CodecFailure::TypeMismatch { member: field.c_name().to_string(), expected }
}

fn kind_name(kind: &JsonKind) -> &'static str {
    match kind {
        JsonKind::String => "a string",
        JsonKind::Int => "an integer",
        JsonKind::Double => "a number",
        JsonKind::Boolean => "a boolean",
        JsonKind::Object | JsonKind::InlineObject => "a record",
        JsonKind::Base64Blob => "a blob",
        JsonKind::Enum(_) => "an enum",
    }
}
