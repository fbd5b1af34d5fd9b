#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Reference interpreter for generated code
//!
//! The generators emit C that only a C toolchain and json-glib can run. This crate
//! executes the same [`codegen::JsonField`] trees and [`ir::RpcSchema`]s directly, over
//! `serde_json` values and topic string slices, following the control flow the
//! generated functions have. Tests use it to check codec and dispatch behavior
//! without compiling any C.

pub mod dispatch;
pub mod json;

pub use dispatch::{dispatch, result_code, DispatchError, Invocation, SegmentValue};
pub use json::{build, parse, CodecFailure, FieldValue, RecordValue};
