//! Generation context for the code generation pipeline.
//!
//! One context exists per run. It owns the run's parameters, the effective
//! configuration and the emitter every unit writes into, and is passed explicitly to
//! each step.

use std::path::{Path, PathBuf};

use codegen::{CodeGenerator, StructuredEmitter};
use config::Config;

use crate::{PipelineError, Result};

/// Context containing everything a generator run needs
pub struct GenerationContext {
    /// Sentinel tag of the generator (`jsongen`, `rpcgen`)
    pub tag: String,
    /// Input document
    pub input: PathBuf,
    /// Directory of additional type-model documents
    pub headers: PathBuf,
    /// Artifact destination
    pub output: PathBuf,
    /// Effective configuration
    pub config: Config,
    emitter: StructuredEmitter,
    units: usize,
}

impl GenerationContext {
    /// Create a new builder for GenerationContext
    pub fn builder() -> GenerationContextBuilder { GenerationContextBuilder::default() }

    /// Validate and write one unit
    pub fn run_unit(&mut self, generator: &dyn CodeGenerator) -> Result<()> {
        logging::trace(&self.tag, &format!("generating {}", generator.describe()));
        generator.validate()?;
        generator.generate(&mut self.emitter)?;
        self.units += 1;
        Ok(())
    }

    /// Number of units written so far
    pub fn units(&self) -> usize { self.units }

    /// Input path as it appears in the provenance header
    pub fn input_display(&self) -> String { self.input.display().to_string() }

    /// Take the finished artifact text
    pub fn finish(self) -> Result<String> { Ok(self.emitter.finish()?) }
}

#[derive(Default)]
/// Builder for GenerationContext
pub struct GenerationContextBuilder {
    tag: Option<String>,
    input: Option<PathBuf>,
    headers: Option<PathBuf>,
    output: Option<PathBuf>,
    config: Option<Config>,
}

impl GenerationContextBuilder {
    /// Set the generator tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the input document
    pub fn input(mut self, input: impl AsRef<Path>) -> Self {
        self.input = Some(input.as_ref().to_path_buf());
        self
    }

    /// Set the headers directory
    pub fn headers(mut self, headers: impl AsRef<Path>) -> Self {
        self.headers = Some(headers.as_ref().to_path_buf());
        self
    }

    /// Set the artifact destination
    pub fn output(mut self, output: impl AsRef<Path>) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    /// Set the configuration (optional; defaults apply if not provided)
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the GenerationContext
    pub fn build(self) -> Result<GenerationContext> {
        let config = self.config.unwrap_or_default();
        Ok(GenerationContext {
            tag: self.tag.ok_or_else(|| PipelineError::Message("tag is required".to_string()))?,
            input: self
                .input
                .ok_or_else(|| PipelineError::Message("input is required".to_string()))?,
            headers: self
                .headers
                .ok_or_else(|| PipelineError::Message("headers is required".to_string()))?,
            output: self
                .output
                .ok_or_else(|| PipelineError::Message("output is required".to_string()))?,
            emitter: StructuredEmitter::new(config.indent_unit()),
            config,
            units: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_paths() {
        let err = GenerationContext::builder().tag("jsongen").input("in.json").build();
        assert!(matches!(err, Err(PipelineError::Message(ref m)) if m == "headers is required"));
    }

    #[test]
    fn test_builder_applies_config() {
        let mut config = Config::default();
        config.codegen.indent_width = Some(2);
        let mut ctx = GenerationContext::builder()
            .tag("jsongen")
            .input("in.json")
            .headers(".")
            .output("out.c")
            .config(config)
            .build()
            .expect("complete builder");
        assert_eq!(ctx.input_display(), "in.json");

        let unit = codegen::HeaderGenerator::new("jsongen", "in.json");
        ctx.run_unit(&unit).expect("header unit");
        assert_eq!(ctx.units(), 1);
        assert_eq!(ctx.finish().expect("balanced"), "//generated by jsongen from in.json\n");
    }
}
