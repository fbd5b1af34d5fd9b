//! Structural type model
//!
//! This is the boundary with the host-language declaration parser: records with
//! their raw fields in declaration order, enums with their symbols, and the alias
//! declarations that request generated artifacts. Raw field names may be directive
//! pseudo-fields; telling them apart is the annotation resolver's job, not this
//! crate's.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{IrError, Result};

/// The complete type model for one generator run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeModel {
    /// Record (struct) declarations in declaration order
    #[serde(default)]
    records: Vec<RawRecord>,
    /// Enum declarations in declaration order
    #[serde(default)]
    enums: Vec<EnumDef>,
    /// Alias (typedef) declarations in declaration order
    #[serde(default)]
    aliases: Vec<Alias>,
}

/// A record declaration as written in the source header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Record (struct tag) name
    pub name: String,
    /// Raw fields, directive pseudo-fields included
    #[serde(default)]
    pub fields: Vec<RawField>,
}

/// One declared member of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawField {
    /// Member name
    pub name: String,
    /// Declaration shape
    pub kind: RawKind,
    /// Scalar type, pointee element type, or the referenced record/enum name
    pub c_type: String,
    /// Element count for array members
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

/// Declaration shapes the header parser reports.
///
/// Only the first four are supported by the generators; the rest exist so a model
/// can describe them and be rejected with a precise error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawKind {
    /// Plain scalar (`guint32 x`)
    Scalar,
    /// Single-level pointer (`gchar* x`)
    Pointer,
    /// Embedded struct (`struct foo x`)
    Record,
    /// Enum-typed member (`enum bar x`)
    Enum,
    /// Fixed-size array
    Array,
    /// Embedded union
    Union,
    /// Function pointer
    FunctionPointer,
}

impl RawKind {
    /// Human-readable name used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            RawKind::Scalar => "scalar",
            RawKind::Pointer => "pointer",
            RawKind::Record => "record",
            RawKind::Enum => "enum",
            RawKind::Array => "array",
            RawKind::Union => "union",
            RawKind::FunctionPointer => "function_pointer",
        }
    }
}

/// An enum declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    /// Enum tag name
    pub name: String,
    /// Symbols in declaration order
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

/// One enum symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Symbol as declared (`LEVEL_LOW`)
    pub symbol: String,
    /// Numeric value
    pub value: i64,
}

/// A typedef-style alias declaration (`typedef struct foo __jsongen_parser_foo;`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// Alias name
    pub name: String,
    /// Name of the aliased record
    pub target: String,
}

impl TypeModel {
    /// Create a type model from its parts
    pub fn new(records: Vec<RawRecord>, enums: Vec<EnumDef>, aliases: Vec<Alias>) -> Self {
        Self { records, enums, aliases }
    }

    /// Load a single type-model document
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| IrError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&content)
            .map_err(|source| IrError::Json { path: path.to_path_buf(), source })
    }

    /// Load the input document and merge every `*.json` document found in `headers`.
    ///
    /// Header documents are merged in file-name order. The input document itself is
    /// skipped if it lives in the headers directory.
    pub fn load(input: &Path, headers: &Path) -> Result<Self> {
        let mut model = Self::from_file(input)?;
        for header in header_documents(headers)? {
            if same_file(&header, input) {
                continue;
            }
            model.merge(Self::from_file(&header)?)?;
        }
        Ok(model)
    }

    /// Merge every `*.json` document found in `headers`, in file-name order
    pub fn from_headers(headers: &Path) -> Result<Self> {
        let mut model = Self::default();
        for header in header_documents(headers)? {
            model.merge(Self::from_file(&header)?)?;
        }
        Ok(model)
    }

    /// Append another model's declarations, rejecting names defined twice
    pub fn merge(&mut self, other: TypeModel) -> Result<()> {
        for record in other.records {
            if self.record(&record.name).is_some() {
                return Err(IrError::DuplicateDefinition { kind: "record", name: record.name });
            }
            self.records.push(record);
        }
        for def in other.enums {
            if self.enum_def(&def.name).is_some() {
                return Err(IrError::DuplicateDefinition { kind: "enum", name: def.name });
            }
            self.enums.push(def);
        }
        for alias in other.aliases {
            if self.aliases.iter().any(|a| a.name == alias.name) {
                return Err(IrError::DuplicateDefinition { kind: "alias", name: alias.name });
            }
            self.aliases.push(alias);
        }
        Ok(())
    }

    /// Look up a record by name
    pub fn record(&self, name: &str) -> Option<&RawRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Look up an enum by name
    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// All records in declaration order
    pub fn records(&self) -> &[RawRecord] { &self.records }

    /// All enums in declaration order
    pub fn enums(&self) -> &[EnumDef] { &self.enums }

    /// All aliases in declaration order
    pub fn aliases(&self) -> &[Alias] { &self.aliases }
}

impl RawRecord {
    /// Create a record from its parts
    pub fn new(name: impl Into<String>, fields: Vec<RawField>) -> Self {
        Self { name: name.into(), fields }
    }
}

impl RawField {
    /// Scalar member
    pub fn scalar(name: impl Into<String>, c_type: impl Into<String>) -> Self {
        Self::of_kind(name, RawKind::Scalar, c_type)
    }

    /// Pointer member; `c_type` is the pointee element type
    pub fn pointer(name: impl Into<String>, c_type: impl Into<String>) -> Self {
        Self::of_kind(name, RawKind::Pointer, c_type)
    }

    /// Embedded record member
    pub fn record(name: impl Into<String>, record: impl Into<String>) -> Self {
        Self::of_kind(name, RawKind::Record, record)
    }

    /// Enum-typed member
    pub fn enumeration(name: impl Into<String>, enum_name: impl Into<String>) -> Self {
        Self::of_kind(name, RawKind::Enum, enum_name)
    }

    /// Member of an arbitrary kind
    pub fn of_kind(name: impl Into<String>, kind: RawKind, c_type: impl Into<String>) -> Self {
        Self { name: name.into(), kind, c_type: c_type.into(), length: None }
    }
}

impl EnumDef {
    /// Create an enum from `(symbol, value)` pairs
    pub fn new(name: impl Into<String>, values: &[(&str, i64)]) -> Self {
        Self {
            name: name.into(),
            values: values
                .iter()
                .map(|(symbol, value)| EnumValue { symbol: (*symbol).to_string(), value: *value })
                .collect(),
        }
    }
}

fn header_documents(headers: &Path) -> Result<Vec<PathBuf>> {
    if !headers.is_dir() {
        return Err(IrError::HeadersNotDirectory(headers.to_path_buf()));
    }
    let entries = std::fs::read_dir(headers)
        .map_err(|source| IrError::Io { path: headers.to_path_buf(), source })?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| IrError::Io { path: headers.to_path_buf(), source })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
