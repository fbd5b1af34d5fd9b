#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! schemagen schema analysis
//!
//! Turns the raw type model into the owned field trees the generators walk:
//! directive pseudo-fields are decoded into a typed side-table, real fields are
//! resolved against the model (nested records recursively, enums by name), and every
//! inconsistency is reported as a [`SchemaError`] before any text is emitted.

pub mod annotations;
pub mod error;
pub mod field_model;
pub mod identifiers;

pub use annotations::{AnnotationResolver, Directive, DirectiveTable, GenerationRequest};
pub use error::SchemaError;
pub use field_model::{Field, FieldKind, FieldModelBuilder, RecordModel};
pub use identifiers::{ensure_identifier, is_identifier};

/// Result type for schema analysis.
pub type Result<T> = std::result::Result<T, SchemaError>;
