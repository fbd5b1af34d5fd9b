//! This crate contains the generators that write C source units.
//!
//! Each generator implements [`crate::CodeGenerator`] and writes one unit into the
//! shared emitter.

/// Provenance line at the top of every artifact
pub mod header;
pub use header::HeaderGenerator;

/// json-glib parser and builder generation for annotated records
pub mod json_codec;
pub use json_codec::{JsonBuilderGenerator, JsonField, JsonKind, JsonParserGenerator};

/// Topic dispatcher generation for an RPC schema
pub mod rpc_dispatch;
pub use rpc_dispatch::RpcDispatchGenerator;
