//! Generate a topic dispatcher for an RPC schema.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

use std::process::ExitCode;

use schemagen_cli::Generator;

fn main() -> ExitCode { schemagen_cli::main(Generator::Rpc) }
