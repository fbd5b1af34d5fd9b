//! Annotation resolution
//!
//! A header cannot attach metadata to a struct member, so generators read it from
//! sibling pseudo-fields named `__<tag>_<kind>_<target>[_<param>]*` and from aliases
//! named `__<tag>_<artifact>_<Record>`. This module decodes both into typed values.
//! Nothing downstream of it looks at raw names again.

use ir::TypeModel;
use tracing::info;

use crate::{Result, SchemaError};

const DELIMITER: char = '_';

/// A decoded directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Directive kind (`member`, `flags`, ...)
    pub kind: String,
    /// Name of the field the directive applies to
    pub target: String,
    /// Remaining parameters, in order
    pub params: Vec<String>,
}

/// Side-table of directives keyed by target field, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveTable {
    entries: Vec<(String, Vec<Directive>)>,
}

/// Artifacts requested for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Record to generate for
    pub record: String,
    /// Requested artifacts, in first-declaration order, without repeats
    pub artifacts: Vec<String>,
}

/// Decodes directive pseudo-fields and generation aliases for one generator tag.
#[derive(Debug, Clone)]
pub struct AnnotationResolver {
    tag: String,
    prefix: String,
    directive_kinds: Vec<String>,
    artifact_kinds: Vec<String>,
}

impl AnnotationResolver {
    /// Create a resolver for `tag` accepting the given directive and artifact kinds
    pub fn new(tag: &str, directive_kinds: &[&str], artifact_kinds: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            prefix: format!("__{}{}", tag, DELIMITER),
            directive_kinds: directive_kinds.iter().map(|k| k.to_string()).collect(),
            artifact_kinds: artifact_kinds.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// The generator tag
    pub fn tag(&self) -> &str { &self.tag }

    /// Decode one raw member name of `record`.
    ///
    /// Returns `Ok(None)` for a data field.
    pub fn resolve_field(&self, record: &str, name: &str) -> Result<Option<Directive>> {
        let Some(rest) = name.strip_prefix(&self.prefix) else {
            info!(record, field = name, "found field");
            return Ok(None);
        };

        let mut parts = rest.split(DELIMITER);
        let kind = parts.next().unwrap_or_default();
        if kind.is_empty() {
            return Err(malformed(record, name, "missing directive kind"));
        }
        if !self.directive_kinds.iter().any(|k| k == kind) {
            return Err(SchemaError::UnknownDirectiveKind {
                record: record.to_string(),
                field: name.to_string(),
                kind: kind.to_string(),
            });
        }

        let target = match parts.next() {
            Some(target) if !target.is_empty() => target,
            _ => return Err(malformed(record, name, "missing target field")),
        };
        let params: Vec<String> = parts.map(str::to_string).collect();
        if params.iter().any(String::is_empty) {
            return Err(malformed(record, name, "empty parameter"));
        }

        info!(record, kind, target, ?params, "found annotation");
        Ok(Some(Directive { kind: kind.to_string(), target: target.to_string(), params }))
    }

    /// Collect generation requests from the model's aliases.
    ///
    /// Requests follow record declaration order; each record's artifacts follow the
    /// order in which their aliases were declared.
    pub fn resolve_aliases(&self, model: &TypeModel) -> Result<Vec<GenerationRequest>> {
        let mut by_record: Vec<GenerationRequest> = Vec::new();

        for alias in model.aliases() {
            let Some(rest) = alias.name.strip_prefix(&self.prefix) else {
                continue;
            };
            let artifact = rest.split(DELIMITER).next().unwrap_or_default();
            if artifact.is_empty() {
                return Err(malformed(&alias.target, &alias.name, "missing artifact"));
            }
            if !self.artifact_kinds.iter().any(|k| k == artifact) {
                return Err(SchemaError::UnknownArtifact {
                    alias: alias.name.clone(),
                    artifact: artifact.to_string(),
                });
            }
            if model.record(&alias.target).is_none() {
                return Err(SchemaError::UnresolvedAliasTarget {
                    alias: alias.name.clone(),
                    target: alias.target.clone(),
                });
            }

            info!(record = %alias.target, artifact, "found generation request");
            match by_record.iter_mut().find(|r| r.record == alias.target) {
                Some(request) => {
                    if !request.artifacts.iter().any(|a| a == artifact) {
                        request.artifacts.push(artifact.to_string());
                    }
                }
                None => by_record.push(GenerationRequest {
                    record: alias.target.clone(),
                    artifacts: vec![artifact.to_string()],
                }),
            }
        }

        let mut ordered = Vec::with_capacity(by_record.len());
        for record in model.records() {
            if let Some(pos) = by_record.iter().position(|r| r.record == record.name) {
                ordered.push(by_record.swap_remove(pos));
            }
        }
        Ok(ordered)
    }
}

impl DirectiveTable {
    /// Create an empty table
    pub fn new() -> Self { Self::default() }

    /// Append a directive under its target
    pub fn insert(&mut self, directive: Directive) {
        match self.entries.iter_mut().find(|(target, _)| *target == directive.target) {
            Some((_, list)) => list.push(directive),
            None => self.entries.push((directive.target.clone(), vec![directive])),
        }
    }

    /// Directives targeting `field`, in declaration order
    pub fn for_field(&self, field: &str) -> &[Directive] {
        self.entries
            .iter()
            .find(|(target, _)| target == field)
            .map(|(_, list)| list.as_slice())
            .unwrap_or(&[])
    }

    /// Targets in first-seen order
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(target, _)| target.as_str())
    }
}

fn malformed(record: &str, field: &str, reason: &str) -> SchemaError {
    SchemaError::MalformedDirective {
        record: record.to_string(),
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
