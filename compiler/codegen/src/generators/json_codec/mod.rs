//! JSON codec model
//!
//! A [`JsonField`] tree is the JSON view of a record: which members exist under
//! which names, what JSON kind each one has, and how absence is handled. The parser
//! and builder generators both walk the same tree, so the two directions agree by
//! construction.

mod builder;
mod parser;

use std::collections::HashSet;

use analysis::{Field, FieldKind, RecordModel, SchemaError};
use ir::EnumDef;
use tracing::debug;

pub use builder::JsonBuilderGenerator;
pub use parser::JsonParserGenerator;

/// Directive kinds the JSON codec generator accepts
pub const DIRECTIVE_KINDS: &[&str] = &["member", "flags", "default"];
/// Artifacts the JSON codec generator produces
pub const ARTIFACT_KINDS: &[&str] = &["parser", "builder"];

const FLAG_INLINE: &str = "inline";
const FLAG_OPTIONAL: &str = "optional";

/// JSON shape of a member.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonKind {
    /// `gchar*` as a JSON string
    String,
    /// Integer scalar
    Int,
    /// Floating-point scalar
    Double,
    /// Boolean scalar
    Boolean,
    /// Nested record as a nested JSON object
    Object,
    /// Nested record whose members live in the enclosing object
    InlineObject,
    /// Byte buffer plus `<field>len`, as a base64 string
    Base64Blob,
    /// Enum as its symbol name
    Enum(EnumMapping),
}

/// String forms of an enum's symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMapping {
    /// Enum name
    pub enum_name: String,
    /// Symbols in declaration order
    pub entries: Vec<EnumEntry>,
}

/// One enum symbol and its JSON name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    /// Declared symbol (`LEVEL_HIGH`)
    pub symbol: String,
    /// Symbol without the enum prefix (`HIGH`)
    pub name: String,
    /// Numeric value
    pub value: i64,
}

/// The C member a JSON node reads from or writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceField {
    /// Member name
    pub name: String,
    /// Member type as declared
    pub c_type: String,
}

/// Value assigned when a member is absent.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Integer default
    Int(i64),
    /// Floating-point default
    Double(f64),
    /// Boolean default
    Boolean(bool),
    /// Enum default
    Enum {
        /// Symbol assigned
        symbol: String,
        /// Its numeric value
        value: i64,
    },
}

impl DefaultValue {
    /// The value as a C literal
    pub fn c_literal(&self) -> String {
        match self {
            DefaultValue::Int(v) => v.to_string(),
            DefaultValue::Double(v) => format!("{:?}", v),
            DefaultValue::Boolean(true) => "TRUE".to_string(),
            DefaultValue::Boolean(false) => "FALSE".to_string(),
            DefaultValue::Enum { symbol, .. } => symbol.clone(),
        }
    }
}

/// A node of the JSON view of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonField {
    /// Member name in JSON; `None` for the root and for inline objects
    pub json_name: Option<String>,
    /// JSON shape
    pub kind: JsonKind,
    /// Backing C member; `None` for the root
    pub source: Option<SourceField>,
    /// Absence is not an error
    pub optional: bool,
    /// Value assigned on absence
    pub default: Option<DefaultValue>,
    /// Members of `Object` and `InlineObject` nodes, in declaration order
    pub children: Vec<JsonField>,
}

impl JsonField {
    /// Build the JSON view of `record`
    pub fn from_record(record: &RecordModel) -> analysis::Result<Self> {
        let children = children_of(record)?;
        debug!(record = %record.name, members = children.len(), "built json tree");
        Ok(Self {
            json_name: None,
            kind: JsonKind::Object,
            source: None,
            optional: false,
            default: None,
            children,
        })
    }

    /// JSON member name, empty for unnamed nodes
    pub fn member_name(&self) -> &str { self.json_name.as_deref().unwrap_or_default() }

    /// C member name, empty for the root
    pub fn c_name(&self) -> &str {
        self.source.as_ref().map(|s| s.name.as_str()).unwrap_or_default()
    }

    /// Whether absence fails the parse
    pub fn is_required(&self) -> bool { !self.optional && self.default.is_none() }
}

impl EnumMapping {
    /// Strip the `<ENUMNAME>_` prefix from every symbol of `def`
    pub fn from_def(def: &EnumDef) -> analysis::Result<Self> {
        if def.values.is_empty() {
            return Err(SchemaError::EmptyEnum(def.name.clone()));
        }
        let prefix = format!("{}_", def.name.to_uppercase());
        let entries = def
            .values
            .iter()
            .map(|v| match v.symbol.strip_prefix(&prefix) {
                Some(name) if !name.is_empty() => Ok(EnumEntry {
                    symbol: v.symbol.clone(),
                    name: name.to_string(),
                    value: v.value,
                }),
                _ => Err(SchemaError::EnumSymbolPrefix {
                    enum_name: def.name.clone(),
                    symbol: v.symbol.clone(),
                    prefix: prefix.clone(),
                }),
            })
            .collect::<analysis::Result<Vec<_>>>()?;
        Ok(Self { enum_name: def.name.clone(), entries })
    }

    /// Entry whose JSON name is `text` exactly or its lowercase form
    pub fn lookup(&self, text: &str) -> Option<&EnumEntry> {
        self.entries.iter().find(|e| e.name == text || e.name.to_lowercase() == text)
    }

    /// First entry carrying `value`
    pub fn by_value(&self, value: i64) -> Option<&EnumEntry> {
        self.entries.iter().find(|e| e.value == value)
    }
}

/// JSON kind of a scalar C type
pub fn scalar_kind(c_type: &str) -> Option<JsonKind> {
    match c_type {
        "guint8" | "guint16" | "guint32" | "guint64" | "gint8" | "gint16" | "gint32"
        | "gint64" | "gsize" | "gssize" | "gint" | "guint" | "glong" | "gulong" | "int"
        | "unsigned" | "long" | "size_t" | "uint8_t" | "uint16_t" | "uint32_t" | "uint64_t"
        | "int8_t" | "int16_t" | "int32_t" | "int64_t" => Some(JsonKind::Int),
        "gdouble" | "gfloat" | "double" | "float" => Some(JsonKind::Double),
        "gboolean" | "bool" => Some(JsonKind::Boolean),
        _ => None,
    }
}

/// JSON kind of a pointer member, by element type
pub fn pointer_kind(element: &str) -> Option<JsonKind> {
    match element {
        "gchar" | "char" => Some(JsonKind::String),
        "guint8" | "uint8_t" | "unsigned char" => Some(JsonKind::Base64Blob),
        _ => None,
    }
}

/// Name of the length member that accompanies blob `field`
pub fn blob_length_name(field: &str) -> String { format!("{}len", field) }

fn children_of(record: &RecordModel) -> analysis::Result<Vec<JsonField>> {
    let companions = blob_companions(record)?;
    let mut children = Vec::new();
    for field in &record.fields {
        if !companions.contains(&field.name) {
            children.push(json_field(record, field)?);
        } else if !field.directives.is_empty() {
            return Err(SchemaError::MalformedDirective {
                record: record.name.clone(),
                field: field.name.clone(),
                reason: "blob length members take no directives".to_string(),
            });
        }
    }

    ensure_unique_members(&record.name, &children)?;
    Ok(children)
}

fn ensure_unique_members(record: &str, children: &[JsonField]) -> analysis::Result<()> {
    let mut seen = HashSet::new();
    for name in member_names(children) {
        if !seen.insert(name) {
            return Err(SchemaError::DuplicateMember {
                record: record.to_string(),
                member: name.to_string(),
            });
        }
    }
    Ok(())
}

/// JSON names written into the enclosing object, inline members spliced in
fn member_names(fields: &[JsonField]) -> Vec<&str> {
    fields
        .iter()
        .flat_map(|f| match f.kind {
            JsonKind::InlineObject => member_names(&f.children),
            _ => vec![f.member_name()],
        })
        .collect()
}

fn blob_companions(record: &RecordModel) -> analysis::Result<Vec<String>> {
    let mut companions = Vec::new();
    for field in &record.fields {
        let FieldKind::Pointer(element) = &field.kind else { continue };
        if pointer_kind(element) != Some(JsonKind::Base64Blob) {
            continue;
        }
        let expected = blob_length_name(&field.name);
        let is_int = |f: &&Field| {
            matches!(&f.kind, FieldKind::Scalar(t) if scalar_kind(t) == Some(JsonKind::Int))
        };
        if record.field(&expected).filter(is_int).is_none() {
            return Err(SchemaError::MissingBlobLength {
                record: record.name.clone(),
                field: field.name.clone(),
                expected,
            });
        }
        companions.push(expected);
    }
    Ok(companions)
}

#[derive(Default)]
struct FieldOptions {
    member: Option<String>,
    inline: bool,
    optional: bool,
    default: Option<String>,
}

impl FieldOptions {
    fn from_directives(record: &str, field: &Field) -> analysis::Result<Self> {
        let mut options = Self::default();
        for directive in &field.directives {
            match directive.kind.as_str() {
                "member" => {
                    let member = single_param(record, field, directive, &options.member)?;
                    options.member = Some(member);
                }
                "default" => {
                    let default = single_param(record, field, directive, &options.default)?;
                    options.default = Some(default);
                }
                "flags" => {
                    for flag in &directive.params {
                        match flag.as_str() {
                            FLAG_INLINE => options.inline = true,
                            FLAG_OPTIONAL => options.optional = true,
                            _ => {
                                return Err(SchemaError::UnknownFlag {
                                    record: record.to_string(),
                                    field: field.name.clone(),
                                    flag: flag.clone(),
                                })
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(options)
    }
}

fn single_param(
    record: &str,
    field: &Field,
    directive: &analysis::Directive,
    previous: &Option<String>,
) -> analysis::Result<String> {
    let malformed = |reason: String| SchemaError::MalformedDirective {
        record: record.to_string(),
        field: field.name.clone(),
        reason,
    };
    if previous.is_some() {
        return Err(malformed(format!("duplicate `{}` directive", directive.kind)));
    }
    match directive.params.as_slice() {
        [param] => Ok(param.clone()),
        params => Err(malformed(format!(
            "`{}` takes exactly one parameter, got {}",
            directive.kind,
            params.len()
        ))),
    }
}

fn json_field(record: &RecordModel, field: &Field) -> analysis::Result<JsonField> {
    let options = FieldOptions::from_directives(&record.name, field)?;
    let invalid_flag = |reason: &str| SchemaError::InvalidFlag {
        record: record.name.clone(),
        field: field.name.clone(),
        reason: reason.to_string(),
    };
    let unmapped = |c_type: String| SchemaError::UnmappedType {
        record: record.name.clone(),
        field: field.name.clone(),
        c_type,
    };

    let (kind, children) = match &field.kind {
        FieldKind::Scalar(c_type) => {
            (scalar_kind(c_type).ok_or_else(|| unmapped(c_type.clone()))?, vec![])
        }
        FieldKind::Pointer(element) => {
            (pointer_kind(element).ok_or_else(|| unmapped(format!("{}*", element)))?, vec![])
        }
        FieldKind::NestedRecord(nested) => {
            let kind = if options.inline { JsonKind::InlineObject } else { JsonKind::Object };
            (kind, children_of(nested)?)
        }
        FieldKind::Enum(def) => (JsonKind::Enum(EnumMapping::from_def(def)?), vec![]),
    };

    if options.inline && kind != JsonKind::InlineObject {
        return Err(invalid_flag("`inline` applies to record members only"));
    }
    if options.optional && kind == JsonKind::InlineObject {
        return Err(invalid_flag("inline members cannot be `optional`"));
    }
    if options.member.is_some() && kind == JsonKind::InlineObject {
        return Err(SchemaError::MalformedDirective {
            record: record.name.clone(),
            field: field.name.clone(),
            reason: "inline members have no JSON name to rename".to_string(),
        });
    }

    let default = match options.default {
        Some(raw) => Some(parse_default(record, field, &kind, &raw)?),
        None => None,
    };

    let json_name = match kind {
        JsonKind::InlineObject => None,
        _ => Some(options.member.unwrap_or_else(|| field.name.clone())),
    };

    Ok(JsonField {
        json_name,
        optional: options.optional || default.is_some(),
        kind,
        source: Some(SourceField { name: field.name.clone(), c_type: field.kind.describe() }),
        default,
        children,
    })
}

fn parse_default(
    record: &RecordModel,
    field: &Field,
    kind: &JsonKind,
    raw: &str,
) -> analysis::Result<DefaultValue> {
    let invalid = |reason: &str| SchemaError::InvalidDefault {
        record: record.name.clone(),
        field: field.name.clone(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    match kind {
        JsonKind::Int => raw.parse().map(DefaultValue::Int).map_err(|_| invalid("not an integer")),
        JsonKind::Double => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(DefaultValue::Double(v)),
            _ => Err(invalid("not a finite number")),
        },
        JsonKind::Boolean => match raw {
            "TRUE" | "true" => Ok(DefaultValue::Boolean(true)),
            "FALSE" | "false" => Ok(DefaultValue::Boolean(false)),
            _ => Err(invalid("not a boolean")),
        },
        JsonKind::Enum(mapping) => mapping
            .lookup(raw)
            .map(|e| DefaultValue::Enum { symbol: e.symbol.clone(), value: e.value })
            .ok_or_else(|| invalid("not a symbol of the enum")),
        _ => Err(invalid("defaults apply to int, double, boolean and enum members")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mapping() {
        for t in ["guint8", "gint64", "gsize", "size_t", "int32_t", "unsigned", "glong"] {
            assert_eq!(scalar_kind(t), Some(JsonKind::Int), "{t}");
        }
        assert_eq!(scalar_kind("gfloat"), Some(JsonKind::Double));
        assert_eq!(scalar_kind("bool"), Some(JsonKind::Boolean));
        assert_eq!(scalar_kind("gpointer"), None);
        assert_eq!(pointer_kind("char"), Some(JsonKind::String));
        assert_eq!(pointer_kind("unsigned char"), Some(JsonKind::Base64Blob));
        assert_eq!(pointer_kind("gint"), None);
    }

    #[test]
    fn test_enum_mapping() {
        let def = EnumDef::new("level", &[("LEVEL_LOW", 0), ("LEVEL_HIGH", 5)]);
        let mapping = EnumMapping::from_def(&def).expect("prefixed symbols");
        assert_eq!(mapping.entries[1].name, "HIGH");
        assert_eq!(mapping.lookup("HIGH").map(|e| e.value), Some(5));
        assert_eq!(mapping.lookup("high").map(|e| e.value), Some(5));
        assert!(mapping.lookup("High").is_none());
        assert_eq!(mapping.by_value(0).map(|e| e.symbol.as_str()), Some("LEVEL_LOW"));

        let bad = EnumDef::new("level", &[("LOW", 0)]);
        assert!(matches!(EnumMapping::from_def(&bad), Err(SchemaError::EnumSymbolPrefix { .. })));
        let empty = EnumDef::new("level", &[]);
        assert_eq!(EnumMapping::from_def(&empty), Err(SchemaError::EmptyEnum("level".into())));
    }

    #[test]
    fn test_default_literals() {
        assert_eq!(DefaultValue::Int(7).c_literal(), "7");
        assert_eq!(DefaultValue::Double(2.0).c_literal(), "2.0");
        assert_eq!(DefaultValue::Boolean(false).c_literal(), "FALSE");
        let e = DefaultValue::Enum { symbol: "LEVEL_HIGH".into(), value: 1 };
        assert_eq!(e.c_literal(), "LEVEL_HIGH");
    }
}
