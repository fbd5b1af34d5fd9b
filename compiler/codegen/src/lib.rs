#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Code generation for C marshaling and dispatch.
//!
//! This crate turns analyzed schemas into C source text: json-glib parser and builder
//! functions for annotated records, and a topic dispatcher for an RPC schema. All
//! output goes through [`StructuredEmitter`], which tracks open blocks so that
//! generated code is always balanced.
//!
//! Loading documents and writing files are the pipeline's job, not this crate's.

pub mod emitter;
pub mod generators;

/// Sub-crate: **`utils`**
///
/// Small helpers shared by the generators.
pub mod utils;

use analysis::SchemaError;
use thiserror::Error;

pub use emitter::{Argument, EmitterError, FunctionSignature, StructuredEmitter};
pub use generators::{
    HeaderGenerator, JsonBuilderGenerator, JsonField, JsonKind, JsonParserGenerator,
    RpcDispatchGenerator,
};

/// Error type for code generation operations in this crate.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// The schema is invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A generator misused the emitter.
    #[error(transparent)]
    Emitter(#[from] EmitterError),
    /// Formatting error when building generated source.
    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

/// Convenient result type for codegen functions in this crate.
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Defines the core interface of a generator: one unit of output written into a shared
/// emitter. Implementors may reject their input in `validate` before anything is
/// written.
pub trait CodeGenerator {
    /// Short description of the unit for diagnostics
    fn describe(&self) -> String;

    /// Write the unit
    fn generate(&self, emitter: &mut StructuredEmitter) -> Result<()>;

    /// Optional validation step before generation (default is no-op).
    fn validate(&self) -> Result<()> { Ok(()) }
}
