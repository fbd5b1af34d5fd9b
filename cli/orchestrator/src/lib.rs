#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
//! Shared entry point of the `jsongen` and `rpcgen` binaries.
//!
//! Both take the same three required flags and differ only in the pipeline they run.
//! Any failure is reported on stderr and turns into exit status 1; no partial
//! artifact is ever written.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use config::{Config, ConfigError};
use pipeline::{GenerationContext, PipelineError};
use thiserror::Error;
use tracing::error;

/// Errors that end a generator run.
#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Generation failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Result type alias for generator runs.
pub type Result<T> = std::result::Result<T, CliError>;

/// Which generator a binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    /// JSON parser/builder functions for annotated records
    Json,
    /// Topic dispatcher for an RPC schema
    Rpc,
}

/// Command-line arguments shared by both generators.
#[derive(Parser, Debug)]
#[command(version, about = "Generate C marshaling code from schema documents")]
pub struct Args {
    /// Input document (type model for jsongen, RPC schema for rpcgen)
    #[arg(long)]
    pub input: PathBuf,
    /// Path of the generated C source
    #[arg(long)]
    pub output: PathBuf,
    /// Directory of additional type-model documents
    #[arg(long)]
    pub headers: PathBuf,
}

/// Parse the process arguments and run `generator`
pub fn main(generator: Generator) -> ExitCode {
    let args = Args::parse();
    match run(generator, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run `generator` with already parsed arguments
pub fn run(generator: Generator, args: &Args) -> Result<()> {
    let config = Config::load()?;
    logging::init(&config.logging.level);

    let tag = match generator {
        Generator::Json => config.codegen.json_tag.clone(),
        Generator::Rpc => config.codegen.rpc_tag.clone(),
    };
    let ctx = GenerationContext::builder()
        .tag(tag)
        .input(&args.input)
        .headers(&args.headers)
        .output(&args.output)
        .config(config)
        .build()?;

    match generator {
        Generator::Json => pipeline::run_json(ctx)?,
        Generator::Rpc => pipeline::run_rpc(ctx)?,
    }
    Ok(())
}
