//! Topic dispatch interpretation
//!
//! Mirrors `<root>_dispatch`: the first endpoint declared under the discriminator
//! wins, the part count must match exactly, and segments are checked in order so the
//! first bad one decides the outcome.

use ir::{Conversion, Endpoint, ResultCode, RpcSchema, TopicSegment};
use thiserror::Error;

/// A converted segment value as the handler receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentValue {
    /// Pass-through string
    Text(String),
    /// Parsed unsigned integer
    Unsigned(u64),
}

/// A handler call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Endpoint whose handler runs
    pub endpoint: String,
    /// Segment values in declaration order
    pub args: Vec<SegmentValue>,
}

/// Why no handler ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The topic has no parts.
    #[error("empty topic")]
    EmptyTopic,
    /// No endpoint carries the discriminator.
    #[error("no endpoint named `{0}`")]
    UnknownEndpoint(String),
    /// The endpoint matched but the part count differs.
    #[error("endpoint `{endpoint}` takes {expected} topic part(s), got {actual}")]
    PartCount {
        /// Matched endpoint
        endpoint: String,
        /// Declared segment count
        expected: usize,
        /// Parts after the discriminator
        actual: usize,
    },
    /// A segment failed conversion or a constraint.
    #[error("endpoint `{endpoint}`: topic part `{segment}` rejects `{value}`")]
    BadTopicPart {
        /// Matched endpoint
        endpoint: String,
        /// Rejecting segment
        segment: String,
        /// Raw part
        value: String,
    },
}

impl DispatchError {
    /// The result code the generated dispatcher reports for this failure
    pub fn code(&self) -> ResultCode {
        match self {
            DispatchError::BadTopicPart { .. } => ResultCode::BadTopicPart,
            _ => ResultCode::InvalidTopic,
        }
    }
}

/// Dispatch `topic` against `schema`
pub fn dispatch(schema: &RpcSchema, topic: &[&str]) -> Result<Invocation, DispatchError> {
    let (discriminator, parts) = topic.split_first().ok_or(DispatchError::EmptyTopic)?;
    let endpoint = schema
        .endpoint(discriminator)
        .ok_or_else(|| DispatchError::UnknownEndpoint(discriminator.to_string()))?;

    if parts.len() != endpoint.topic_parts.len() {
        return Err(DispatchError::PartCount {
            endpoint: endpoint.name.clone(),
            expected: endpoint.topic_parts.len(),
            actual: parts.len(),
        });
    }

    let args = endpoint
        .topic_parts
        .iter()
        .zip(parts)
        .map(|(segment, raw)| convert(endpoint, segment, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Invocation { endpoint: endpoint.name.clone(), args })
}

/// The code `response->code` holds after dispatching
pub fn result_code(outcome: &Result<Invocation, DispatchError>) -> ResultCode {
    match outcome {
        Ok(_) => ResultCode::None,
        Err(e) => e.code(),
    }
}

fn convert(
    endpoint: &Endpoint,
    segment: &TopicSegment,
    raw: &str,
) -> Result<SegmentValue, DispatchError> {
    let bad = || DispatchError::BadTopicPart {
        endpoint: endpoint.name.clone(),
        segment: segment.name.clone(),
        value: raw.to_string(),
    };

    match segment.conversion {
        Conversion::Identity => {
            // strlen counts bytes
            let len = raw.len() as u64;
            let fits = segment.length.map_or(true, |l| len == l)
                && segment.min.map_or(true, |min| len >= min)
                && segment.max.map_or(true, |max| len <= max);
            if fits {
                Ok(SegmentValue::Text(raw.to_string()))
            } else {
                Err(bad())
            }
        }
        Conversion::Unsigned => {
            // g_ascii_string_to_unsigned rejects signs, whitespace and trailing text
            if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
                return Err(bad());
            }
            let value: u64 = raw.parse().map_err(|_| bad())?;
            if (segment.min.unwrap_or(0)..=segment.upper_bound()).contains(&value) {
                Ok(SegmentValue::Unsigned(value))
            } else {
                Err(bad())
            }
        }
    }
}
