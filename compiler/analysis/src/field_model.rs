//! Field model construction
//!
//! Turns a raw record from the type model into an owned tree: data fields in
//! declaration order with their directives attached, nested records resolved and
//! built recursively, enums resolved to their definitions.

use ir::{EnumDef, RawField, RawKind, TypeModel};
use tracing::debug;

use crate::annotations::{AnnotationResolver, Directive, DirectiveTable};
use crate::identifiers::ensure_identifier;
use crate::{Result, SchemaError};

/// A record with its data fields resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordModel {
    /// Record name
    pub name: String,
    /// Data fields in declaration order
    pub fields: Vec<Field>,
}

/// One data field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Member name
    pub name: String,
    /// Resolved kind
    pub kind: FieldKind,
    /// Directives targeting this field, in declaration order
    pub directives: Vec<Directive>,
}

/// The closed set of field kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Scalar with its C type
    Scalar(String),
    /// Single-level pointer with its element type
    Pointer(String),
    /// Embedded record, fully built
    NestedRecord(Box<RecordModel>),
    /// Enum-typed member
    Enum(EnumDef),
}

impl RecordModel {
    /// Look up a data field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl FieldKind {
    /// Short description used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            FieldKind::Scalar(c_type) => c_type.clone(),
            FieldKind::Pointer(c_type) => format!("{}*", c_type),
            FieldKind::NestedRecord(record) => format!("struct {}", record.name),
            FieldKind::Enum(def) => format!("enum {}", def.name),
        }
    }
}

/// Builds [`RecordModel`] trees from a [`TypeModel`].
pub struct FieldModelBuilder<'a> {
    model: &'a TypeModel,
    resolver: &'a AnnotationResolver,
}

impl<'a> FieldModelBuilder<'a> {
    /// Create a builder over `model`, decoding directives with `resolver`
    pub fn new(model: &'a TypeModel, resolver: &'a AnnotationResolver) -> Self {
        Self { model, resolver }
    }

    /// Build the tree rooted at record `name`
    pub fn build(&self, name: &str) -> Result<RecordModel> {
        let mut stack = Vec::new();
        self.build_record(name, &mut stack)
    }

    fn build_record(&self, name: &str, stack: &mut Vec<String>) -> Result<RecordModel> {
        let raw = self.model.record(name).ok_or_else(|| SchemaError::UnresolvedAliasTarget {
            alias: self.resolver.tag().to_string(),
            target: name.to_string(),
        })?;
        ensure_identifier("record", name)?;

        stack.push(name.to_string());
        let mut data: Vec<&RawField> = Vec::new();
        let mut directives = DirectiveTable::new();

        for raw_field in &raw.fields {
            ensure_identifier("field", &raw_field.name)?;
            match self.resolver.resolve_field(name, &raw_field.name)? {
                Some(directive) => directives.insert(directive),
                None => {
                    if data.iter().any(|f| f.name == raw_field.name) {
                        return Err(SchemaError::DuplicateField {
                            record: name.to_string(),
                            field: raw_field.name.clone(),
                        });
                    }
                    data.push(raw_field);
                }
            }
        }

        for target in directives.targets() {
            if !data.iter().any(|f| f.name == target) {
                let kind = directives.for_field(target).first().map(|d| d.kind.clone());
                return Err(SchemaError::DirectiveTargetNotFound {
                    record: name.to_string(),
                    kind: kind.unwrap_or_default(),
                    target: target.to_string(),
                });
            }
        }

        let mut fields = Vec::with_capacity(data.len());
        for raw_field in data {
            let kind = self.resolve_kind(name, raw_field, stack)?;
            debug!(
                record = name,
                field = %raw_field.name,
                kind = %kind.describe(),
                "resolved field"
            );
            fields.push(Field {
                name: raw_field.name.clone(),
                kind,
                directives: directives.for_field(&raw_field.name).to_vec(),
            });
        }
        stack.pop();

        Ok(RecordModel { name: name.to_string(), fields })
    }

    fn resolve_kind(
        &self,
        record: &str,
        raw: &RawField,
        stack: &mut Vec<String>,
    ) -> Result<FieldKind> {
        match raw.kind {
            RawKind::Scalar => Ok(FieldKind::Scalar(raw.c_type.clone())),
            RawKind::Pointer => Ok(FieldKind::Pointer(raw.c_type.clone())),
            RawKind::Record => {
                if let Some(pos) = stack.iter().position(|r| *r == raw.c_type) {
                    let mut path = stack[pos..].to_vec();
                    path.push(raw.c_type.clone());
                    return Err(SchemaError::CyclicRecord { path });
                }
                if self.model.record(&raw.c_type).is_none() {
                    return Err(SchemaError::UnresolvedRecord {
                        record: record.to_string(),
                        field: raw.name.clone(),
                        target: raw.c_type.clone(),
                    });
                }
                let nested = self.build_record(&raw.c_type, stack)?;
                Ok(FieldKind::NestedRecord(Box::new(nested)))
            }
            RawKind::Enum => {
                let def = self.model.enum_def(&raw.c_type).ok_or_else(|| {
                    SchemaError::UnresolvedEnum {
                        record: record.to_string(),
                        field: raw.name.clone(),
                        target: raw.c_type.clone(),
                    }
                })?;
                ensure_identifier("enum", &def.name)?;
                for value in &def.values {
                    ensure_identifier("enum symbol", &value.symbol)?;
                }
                Ok(FieldKind::Enum(def.clone()))
            }
            RawKind::Array | RawKind::Union | RawKind::FunctionPointer => {
                Err(SchemaError::UnsupportedFieldKind {
                    record: record.to_string(),
                    field: raw.name.clone(),
                    kind: raw.kind.as_str().to_string(),
                })
            }
        }
    }
}
