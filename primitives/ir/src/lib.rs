#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! schemagen Intermediate Representation (IR)
//!
//! This crate defines the input documents the generators consume: the structural
//! type model (records, enums and generation aliases, as a C header would declare
//! them) and the topic-addressed RPC schema. Both are plain data, loaded once per
//! invocation and never mutated after loading.

pub mod rpc_schema;
pub mod type_model;

mod ordered;

use std::path::PathBuf;

use thiserror::Error;

pub use rpc_schema::*;
pub use type_model::*;

/// Errors raised while loading IR documents.
#[derive(Debug, Error)]
pub enum IrError {
    /// The document could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Document path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON or does not match the expected shape.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// Document path
        path: PathBuf,
        /// Underlying decoding error
        #[source]
        source: serde_json::Error,
    },
    /// Two documents (or one document twice) define the same name.
    #[error("duplicate {kind} definition `{name}`")]
    DuplicateDefinition {
        /// "record", "enum" or "alias"
        kind: &'static str,
        /// The conflicting name
        name: String,
    },
    /// The headers path is not a directory.
    #[error("headers path {0} is not a directory")]
    HeadersNotDirectory(PathBuf),
}

/// Convenient result type for IR loading.
pub type Result<T> = std::result::Result<T, IrError>;
