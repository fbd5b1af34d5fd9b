//! Pipeline orchestration for the main entry points.
//!
//! Each run loads its documents, writes every unit into the context's emitter and
//! only then commits the artifact. Nothing reaches the output path unless the whole
//! run succeeded.

use analysis::{AnnotationResolver, FieldModelBuilder};
use codegen::generators::json_codec::{ARTIFACT_KINDS, DIRECTIVE_KINDS};
use codegen::{HeaderGenerator, JsonBuilderGenerator, JsonParserGenerator, RpcDispatchGenerator};
use ir::{RpcSchema, TypeModel};
use tracing::info;

use crate::generation_context::GenerationContext;
use crate::output::commit;
use crate::{PipelineError, Result};

/// Generate the JSON codec artifact for every annotated record in `model`.
///
/// Units follow record declaration order; a record's parser and builder follow the
/// order of the aliases that request them.
pub fn generate_json(mut ctx: GenerationContext, model: &TypeModel) -> Result<String> {
    let tag = ctx.tag.clone();
    let resolver = AnnotationResolver::new(&tag, DIRECTIVE_KINDS, ARTIFACT_KINDS);
    let requests = resolver.resolve_aliases(model)?;
    let builder = FieldModelBuilder::new(model, &resolver);

    let header = HeaderGenerator::new(tag.clone(), ctx.input_display());
    ctx.run_unit(&header)?;

    for request in &requests {
        let record = builder.build(&request.record)?;
        for artifact in &request.artifacts {
            match artifact.as_str() {
                "parser" => ctx.run_unit(&JsonParserGenerator::new(&tag, &record)?)?,
                "builder" => ctx.run_unit(&JsonBuilderGenerator::new(&tag, &record)?)?,
                other => {
                    return Err(PipelineError::Message(format!(
                        "no generator for artifact `{}`",
                        other
                    )))
                }
            }
        }
    }

    info!(records = requests.len(), units = ctx.units(), "json codec generated");
    ctx.finish()
}

/// Generate the dispatcher artifact for `schema`.
///
/// `headers` supplies the response record, when it declares one.
pub fn generate_rpc(
    mut ctx: GenerationContext,
    schema: RpcSchema,
    headers: &TypeModel,
) -> Result<String> {
    let header = HeaderGenerator::new(ctx.tag.clone(), ctx.input_display());
    ctx.run_unit(&header)?;

    let dispatcher = RpcDispatchGenerator::new(schema, headers);
    let endpoints = dispatcher.reachable_endpoints().len();
    ctx.run_unit(&dispatcher)?;

    info!(endpoints, "dispatcher generated");
    ctx.finish()
}

/// Run the JSON codec generator end to end.
pub fn run_json(ctx: GenerationContext) -> Result<()> {
    let model = TypeModel::load(&ctx.input, &ctx.headers)?;
    let output = ctx.output.clone();
    let text = generate_json(ctx, &model)?;
    commit(&output, &text)
}

/// Run the RPC dispatch generator end to end.
pub fn run_rpc(ctx: GenerationContext) -> Result<()> {
    let schema = RpcSchema::from_file(&ctx.input)?;
    let headers = TypeModel::from_headers(&ctx.headers)?;
    let output = ctx.output.clone();
    let text = generate_rpc(ctx, schema, &headers)?;
    commit(&output, &text)
}
