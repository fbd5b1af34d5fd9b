#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! High-level pipeline that turns schema documents into one generated C artifact.
//!
//! ## Module Organization
//!
//! - `generation_context` - The explicit state threaded through a run
//! - `orchestration` - Entry points for the two generators (`run_json`, `run_rpc`)
//! - `output` - Buffer-then-commit artifact writing

use thiserror::Error;

/// Convenient result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while running the codegen pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Generic message-based error.
    #[error("{0}")]
    Message(String),
    /// An input document could not be loaded.
    #[error(transparent)]
    Ir(#[from] ir::IrError),
    /// The schema is invalid.
    #[error(transparent)]
    Schema(#[from] analysis::SchemaError),
    /// Error propagated from the codegen crate.
    #[error(transparent)]
    Codegen(#[from] codegen::CodegenError),
    /// The emitter was left with open blocks.
    #[error(transparent)]
    Emitter(#[from] codegen::EmitterError),
    /// I/O error while writing the artifact.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The finished artifact could not be moved into place.
    #[error(transparent)]
    Persist(#[from] tempfile::PersistError),
}

pub mod generation_context;
pub mod orchestration;
pub mod output;

pub use generation_context::GenerationContext;
pub use orchestration::{generate_json, generate_rpc, run_json, run_rpc};
