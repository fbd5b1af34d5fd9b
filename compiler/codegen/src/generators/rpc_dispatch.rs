//! Topic dispatcher generation
//!
//! A topic arrives as an array of strings. Segment 0 selects the endpoint, the rest
//! are that endpoint's positional parameters. The generated dispatcher validates and
//! converts each parameter, calls the endpoint's handler, and records a result code
//! in `response->code`.

use std::collections::HashSet;

use analysis::{ensure_identifier, SchemaError};
use ir::{Conversion, Endpoint, RawKind, RawRecord, ResultCode, RpcSchema, TopicSegment, TypeModel};
use tracing::warn;

use crate::{CodeGenerator, FunctionSignature, Result, StructuredEmitter};

/// Names the dispatcher itself declares; segments may not reuse them
const RESERVED_NAMES: &[&str] = &[
    "context",
    "request",
    "response",
    "topicparts",
    "numtopicparts",
    "endpoint",
    "ret",
    "converted",
];

const STRING_TYPES: &[&str] = &["const gchar*", "gchar*", "const char*", "char*"];

/// Emits the result-code enum, handler prototypes and `<root>_dispatch`.
pub struct RpcDispatchGenerator {
    schema: RpcSchema,
    response_record: Option<RawRecord>,
}

impl RpcDispatchGenerator {
    /// Prepare the dispatcher; `headers` is consulted for the response record
    pub fn new(schema: RpcSchema, headers: &TypeModel) -> Self {
        let response_record =
            response_struct(&schema.response.c_type).and_then(|name| headers.record(name)).cloned();
        Self { schema, response_record }
    }

    /// The schema being generated
    pub fn schema(&self) -> &RpcSchema { &self.schema }

    /// `<ROOT>_RESULT_<CODE>`
    pub fn result_symbol(&self, code: ResultCode) -> String {
        format!("{}_RESULT_{}", self.schema.root.to_uppercase(), code.suffix())
    }

    /// `<root>_<endpoint>_handler`
    pub fn handler_name(&self, endpoint: &Endpoint) -> String {
        format!("{}_{}_handler", self.schema.root, endpoint.name)
    }

    /// Endpoints that can match, i.e. the first declaration of each name
    pub fn reachable_endpoints(&self) -> Vec<&Endpoint> {
        let mut seen = HashSet::new();
        let mut reachable = Vec::new();
        for endpoint in &self.schema.endpoints {
            if seen.insert(endpoint.name.as_str()) {
                reachable.push(endpoint);
            } else {
                warn!(endpoint = %endpoint.name, "endpoint is shadowed by an earlier declaration");
            }
        }
        reachable
    }

    fn handler_signature(&self, endpoint: &Endpoint) -> FunctionSignature {
        FunctionSignature::new(self.handler_name(endpoint), "void")
            .arg("context", &self.schema.context.c_type)
            .args(
                endpoint
                    .topic_parts
                    .iter()
                    .map(|s| crate::Argument::new(&s.name, segment_c_type(s))),
            )
            .arg("request", &self.schema.request.c_type)
            .arg("response", &self.schema.response.c_type)
    }

    fn validate_segment(
        &self,
        endpoint: &Endpoint,
        segment: &TopicSegment,
    ) -> analysis::Result<()> {
        ensure_identifier("topic segment", &segment.name)?;
        if RESERVED_NAMES.contains(&segment.name.as_str()) {
            return Err(SchemaError::InvalidIdentifier {
                what: "topic segment (reserved)",
                name: segment.name.clone(),
            });
        }

        let invalid = |reason: &str| SchemaError::InvalidConstraint {
            endpoint: endpoint.name.clone(),
            segment: segment.name.clone(),
            reason: reason.to_string(),
        };
        if let (Some(min), Some(max)) = (segment.min, segment.max) {
            if min > max {
                return Err(invalid("min exceeds max"));
            }
        }
        let constrained =
            segment.length.is_some() || segment.min.is_some() || segment.max.is_some();
        match segment.conversion {
            Conversion::Unsigned if segment.length.is_some() => {
                Err(invalid("length applies to unconverted segments only"))
            }
            Conversion::Unsigned => match (segment.type_max(), segment.max) {
                (None, None) => Err(invalid("c_type of unknown width needs an explicit max")),
                (Some(limit), Some(max)) if max > limit => {
                    Err(invalid("max exceeds the c_type range"))
                }
                _ => Ok(()),
            },
            Conversion::Identity if constrained && !is_string_type(&segment_c_type(segment)) => {
                Err(invalid("length constraints need a string c_type"))
            }
            _ => Ok(()),
        }
    }
}

impl CodeGenerator for RpcDispatchGenerator {
    fn describe(&self) -> String { format!("dispatcher for {}", self.schema.root) }

    fn validate(&self) -> Result<()> {
        ensure_identifier("root", &self.schema.root)?;
        for endpoint in &self.schema.endpoints {
            ensure_identifier("endpoint", &endpoint.name)?;
            let mut names = HashSet::new();
            for segment in &endpoint.topic_parts {
                if !names.insert(segment.name.as_str()) {
                    return Err(SchemaError::DuplicateSegment {
                        endpoint: endpoint.name.clone(),
                        segment: segment.name.clone(),
                    }
                    .into());
                }
                self.validate_segment(endpoint, segment)?;
            }
        }

        if let Some(record) = &self.response_record {
            let has_code =
                record.fields.iter().any(|f| f.name == "code" && f.kind == RawKind::Scalar);
            if !has_code {
                return Err(SchemaError::ResponseWithoutCode { record: record.name.clone() }.into());
            }
        }
        Ok(())
    }

    fn generate(&self, emitter: &mut StructuredEmitter) -> Result<()> {
        let root = &self.schema.root;

        emitter.start_scope(Some(&format!("enum {}_result ", root)));
        emitter.add_items(
            ResultCode::ALL
                .iter()
                .map(|code| format!("{} = {}", self.result_symbol(*code), code.value())),
        );
        emitter.end_scope(true)?;
        emitter.add_blank_line();

        let endpoints = self.reachable_endpoints();
        for endpoint in &endpoints {
            emitter.function_prototype(&self.handler_signature(endpoint));
        }
        if !endpoints.is_empty() {
            emitter.add_blank_line();
        }

        let signature = FunctionSignature::new(format!("{}_dispatch", root), "int")
            .arg("context", &self.schema.context.c_type)
            .arg("topicparts", "const gchar**")
            .arg("numtopicparts", "gint")
            .arg("request", &self.schema.request.c_type)
            .arg("response", &self.schema.response.c_type);
        emitter.start_function(&signature)?;

        emitter.add_statement(&format!("int ret = {}", self.result_symbol(ResultCode::None)));
        emitter.start_condition("numtopicparts < 1");
        self.fail(emitter, ResultCode::InvalidTopic);
        emitter.end_condition()?;
        emitter.add_statement("const gchar* endpoint = topicparts[0]");

        if endpoints.is_empty() {
            self.set(emitter, ResultCode::InvalidTopic);
        } else {
            for endpoint in &endpoints {
                let matches = format!("strcmp(endpoint, \"{}\") == 0", endpoint.name);
                emitter.start_or_alternative(&matches)?;
                self.endpoint_body(emitter, endpoint)?;
            }
            emitter.add_else()?;
            self.set(emitter, ResultCode::InvalidTopic);
            emitter.end_condition()?;
        }

        emitter.add_label("out");
        emitter.add_statement("response->code = ret");
        emitter.add_statement("return ret");
        emitter.end_function()?;
        emitter.add_blank_line();
        Ok(())
    }
}

impl RpcDispatchGenerator {
    fn set(&self, emitter: &mut StructuredEmitter, code: ResultCode) {
        emitter.add_statement(&format!("ret = {}", self.result_symbol(code)));
    }

    fn fail(&self, emitter: &mut StructuredEmitter, code: ResultCode) {
        self.set(emitter, code);
        emitter.add_statement("goto out");
    }

    fn endpoint_body(&self, emitter: &mut StructuredEmitter, endpoint: &Endpoint) -> Result<()> {
        emitter.start_condition(&format!("numtopicparts - 1 != {}", endpoint.topic_parts.len()));
        self.fail(emitter, ResultCode::InvalidTopic);
        emitter.end_condition()?;

        for (i, segment) in endpoint.topic_parts.iter().enumerate() {
            let source = format!("topicparts[{}]", i + 1);
            let c_type = segment_c_type(segment);
            match segment.conversion {
                Conversion::Identity => {
                    emitter.add_statement(&format!("{} {} = {}", c_type, segment.name, source));
                    if let Some(length) = segment.length {
                        emitter.start_condition(&format!("strlen({}) != {}", segment.name, length));
                        self.fail(emitter, ResultCode::BadTopicPart);
                        emitter.end_condition()?;
                    }
                    let mut bounds = Vec::new();
                    if let Some(min) = segment.min {
                        bounds.push(format!("strlen({}) < {}", segment.name, min));
                    }
                    if let Some(max) = segment.max {
                        bounds.push(format!("strlen({}) > {}", segment.name, max));
                    }
                    if !bounds.is_empty() {
                        emitter.start_condition(&bounds.join(" || "));
                        self.fail(emitter, ResultCode::BadTopicPart);
                        emitter.end_condition()?;
                    }
                }
                Conversion::Unsigned => {
                    let min = segment.min.map(guint64_literal).unwrap_or_else(|| "0".to_string());
                    let max = match segment.max {
                        Some(max) => guint64_literal(max),
                        None => limit_macro(segment.upper_bound()),
                    };
                    emitter.add_statement(&format!("{} {}", c_type, segment.name));
                    emitter.start_scope(None);
                    emitter.add_statement("guint64 converted");
                    emitter.start_condition(&format!(
                        "!g_ascii_string_to_unsigned({}, 10, {}, {}, &converted, NULL)",
                        source, min, max
                    ));
                    self.fail(emitter, ResultCode::BadTopicPart);
                    emitter.end_condition()?;
                    emitter.add_statement(&format!("{} = converted", segment.name));
                    emitter.end_scope(false)?;
                }
            }
        }

        let args: Vec<&str> = std::iter::once("context")
            .chain(endpoint.topic_parts.iter().map(|s| s.name.as_str()))
            .chain(["request", "response"])
            .collect();
        emitter.add_statement(&format!("{}({})", self.handler_name(endpoint), args.join(", ")));
        Ok(())
    }
}

/// C type of a segment, falling back to the conversion's default
pub fn segment_c_type(segment: &TopicSegment) -> String {
    match (&segment.c_type, segment.conversion) {
        (Some(c_type), _) => c_type.clone(),
        (None, Conversion::Identity) => "const gchar*".to_string(),
        (None, Conversion::Unsigned) => "guint64".to_string(),
    }
}

fn is_string_type(c_type: &str) -> bool {
    let normalized = c_type.split_whitespace().collect::<Vec<_>>().join(" ").replace(" *", "*");
    STRING_TYPES.contains(&normalized.as_str())
}

fn guint64_literal(value: u64) -> String { format!("G_GUINT64_CONSTANT({})", value) }

/// glib limit macro spelling `value`, when one exists
fn limit_macro(value: u64) -> String {
    let name = match value {
        v if v == u8::MAX as u64 => "G_MAXUINT8",
        v if v == u16::MAX as u64 => "G_MAXUINT16",
        v if v == u32::MAX as u64 => "G_MAXUINT32",
        v if v == i8::MAX as u64 => "G_MAXINT8",
        v if v == i16::MAX as u64 => "G_MAXINT16",
        v if v == i32::MAX as u64 => "G_MAXINT32",
        v if v == i64::MAX as u64 => "G_MAXINT64",
        u64::MAX => "G_MAXUINT64",
        other => return guint64_literal(other),
    };
    name.to_string()
}

/// Record name of a `struct X*` type
fn response_struct(c_type: &str) -> Option<&str> {
    let name = c_type.trim().strip_prefix("struct ")?.trim().strip_suffix('*')?.trim();
    (!name.is_empty()).then_some(name)
}
