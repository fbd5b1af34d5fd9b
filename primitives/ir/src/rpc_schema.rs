//! RPC schema
//!
//! Describes a topic-addressed RPC surface: a root name, the C types shared by every
//! handler signature, and the ordered endpoints with their ordered topic segments.

use std::path::Path;

use serde::Deserialize;

use crate::ordered::OrderedEntries;
use crate::{IrError, Result};

/// A C type reference (`{"c_type": "struct ctx*"}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CType {
    /// The spelled-out C type
    pub c_type: String,
}

/// A parsed RPC schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcSchema {
    /// Prefix for every generated symbol
    pub root: String,
    /// Type of the opaque context argument
    pub context: CType,
    /// Type of the request argument
    pub request: CType,
    /// Type of the response argument; must have a `code` member
    pub response: CType,
    /// Endpoints in declaration order, duplicates kept
    pub endpoints: Vec<Endpoint>,
}

/// One endpoint: the topic discriminator plus its positional segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Discriminator (topic segment 0)
    pub name: String,
    /// Segments following the discriminator, in order
    pub topic_parts: Vec<TopicSegment>,
}

/// A positional topic segment and its constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSegment {
    /// Variable name in the generated handler signature
    pub name: String,
    /// Declared C type, if any
    pub c_type: Option<String>,
    /// Exact length constraint (unconverted segments only)
    pub length: Option<u64>,
    /// Lower bound: length for unconverted segments, value for unsigned ones
    pub min: Option<u64>,
    /// Upper bound: length for unconverted segments, value for unsigned ones
    pub max: Option<u64>,
    /// How the raw string is converted
    pub conversion: Conversion,
}

/// Topic segment conversion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Conversion {
    /// The raw string is passed through
    #[default]
    #[serde(rename = "none")]
    Identity,
    /// Parsed as a base-10 unsigned integer
    #[serde(rename = "unsigned", alias = "unsigned_integer", alias = "uint")]
    Unsigned,
}

/// Integer C types an unsigned segment may be stored in, with the largest value each holds.
const INTEGER_TYPES: &[(&[&str], u64)] = &[
    (&["guint8", "uint8_t", "guchar", "unsigned char"], u8::MAX as u64),
    (&["guint16", "uint16_t", "gushort", "unsigned short"], u16::MAX as u64),
    (&["guint32", "uint32_t", "guint", "unsigned", "unsigned int"], u32::MAX as u64),
    (&["guint64", "uint64_t"], u64::MAX),
    (&["gint8", "int8_t"], i8::MAX as u64),
    (&["gint16", "int16_t", "gshort", "short"], i16::MAX as u64),
    (&["gint32", "int32_t", "gint", "int"], i32::MAX as u64),
    (&["gint64", "int64_t"], i64::MAX as u64),
];

/// Largest non-negative value an integer C type holds, if the type is a known integer
pub fn integer_type_max(c_type: &str) -> Option<u64> {
    let normalized = c_type.split_whitespace().collect::<Vec<_>>().join(" ");
    INTEGER_TYPES
        .iter()
        .find(|(names, _)| names.contains(&normalized.as_str()))
        .map(|(_, max)| *max)
}

/// Result codes the generated dispatcher reports. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    /// A handler was invoked
    None,
    /// Unknown endpoint or wrong segment count
    InvalidTopic,
    /// A segment failed conversion or a constraint
    BadTopicPart,
}

impl ResultCode {
    /// All codes in numeric order
    pub const ALL: [ResultCode; 3] =
        [ResultCode::None, ResultCode::InvalidTopic, ResultCode::BadTopicPart];

    /// Numeric value in the generated enum
    pub fn value(&self) -> i32 {
        match self {
            ResultCode::None => 0,
            ResultCode::InvalidTopic => 1,
            ResultCode::BadTopicPart => 2,
        }
    }

    /// Symbol suffix in the generated enum (`<ROOT>_RESULT_<suffix>`)
    pub fn suffix(&self) -> &'static str {
        match self {
            ResultCode::None => "NONE",
            ResultCode::InvalidTopic => "INVALID_TOPIC",
            ResultCode::BadTopicPart => "BAD_TOPIC_PART",
        }
    }
}

#[derive(Deserialize)]
struct RpcSchemaDocument {
    root: String,
    context: CType,
    request: CType,
    response: CType,
    #[serde(default)]
    endpoints: OrderedEntries<EndpointDocument>,
}

#[derive(Deserialize)]
struct EndpointDocument {
    #[serde(default)]
    topic_parts: OrderedEntries<SegmentDocument>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SegmentDocument {
    c_type: Option<String>,
    length: Option<u64>,
    min: Option<u64>,
    max: Option<u64>,
    #[serde(default)]
    conversion: Conversion,
}

impl From<RpcSchemaDocument> for RpcSchema {
    fn from(doc: RpcSchemaDocument) -> Self {
        let endpoints = doc
            .endpoints
            .0
            .into_iter()
            .map(|(name, endpoint)| Endpoint {
                name,
                topic_parts: endpoint
                    .topic_parts
                    .0
                    .into_iter()
                    .map(|(name, seg)| TopicSegment {
                        name,
                        c_type: seg.c_type,
                        length: seg.length,
                        min: seg.min,
                        max: seg.max,
                        conversion: seg.conversion,
                    })
                    .collect(),
            })
            .collect();

        RpcSchema {
            root: doc.root,
            context: doc.context,
            request: doc.request,
            response: doc.response,
            endpoints,
        }
    }
}

impl RpcSchema {
    /// Parse a schema from JSON text
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RpcSchemaDocument>(content).map(RpcSchema::from)
    }

    /// Load a schema document from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| IrError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&content)
            .map_err(|source| IrError::Json { path: path.to_path_buf(), source })
    }

    /// Find the first endpoint declared with `name`
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}

impl CType {
    /// Wrap a spelled-out C type
    pub fn new(c_type: impl Into<String>) -> Self { Self { c_type: c_type.into() } }
}

impl TopicSegment {
    /// An unconstrained pass-through segment
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            c_type: None,
            length: None,
            min: None,
            max: None,
            conversion: Conversion::Identity,
        }
    }

    /// An unsigned segment bounded by `[min, max]`
    pub fn unsigned(name: impl Into<String>, min: u64, max: u64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            conversion: Conversion::Unsigned,
            ..Self::text(name)
        }
    }

    /// Largest value the segment's storage type holds (`guint64` when undeclared)
    pub fn type_max(&self) -> Option<u64> {
        integer_type_max(self.c_type.as_deref().unwrap_or("guint64"))
    }

    /// Effective upper bound of an unsigned segment
    pub fn upper_bound(&self) -> u64 { self.max.or_else(|| self.type_max()).unwrap_or(u64::MAX) }
}
