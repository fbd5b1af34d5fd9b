//! Schema errors
//!
//! Every condition here is fatal: schemas are reviewed source artifacts, so a run
//! stops at the first inconsistency instead of producing partial output.

use thiserror::Error;

/// An invalid or inconsistent schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A directive pseudo-field names a kind outside the generator's whitelist.
    #[error("record `{record}`: unknown directive kind `{kind}` in `{field}`")]
    UnknownDirectiveKind {
        /// Owning record
        record: String,
        /// Raw pseudo-field name
        field: String,
        /// Offending kind
        kind: String,
    },
    /// A directive pseudo-field or alias does not decode.
    #[error("record `{record}`: malformed directive `{field}`: {reason}")]
    MalformedDirective {
        /// Owning record (or alias target)
        record: String,
        /// Raw pseudo-field (or alias) name
        field: String,
        /// What is wrong with it
        reason: String,
    },
    /// A directive targets a field the record does not declare.
    #[error("record `{record}`: directive `{kind}` targets unknown field `{target}`")]
    DirectiveTargetNotFound {
        /// Owning record
        record: String,
        /// Directive kind
        kind: String,
        /// Missing target
        target: String,
    },
    /// A nested-record member names a record the model does not declare.
    #[error("record `{record}`: field `{field}` references unknown record `{target}`")]
    UnresolvedRecord {
        /// Owning record
        record: String,
        /// Member name
        field: String,
        /// Referenced record
        target: String,
    },
    /// An enum member names an enum the model does not declare.
    #[error("record `{record}`: field `{field}` references unknown enum `{target}`")]
    UnresolvedEnum {
        /// Owning record
        record: String,
        /// Member name
        field: String,
        /// Referenced enum
        target: String,
    },
    /// A member's declaration shape is outside the supported set.
    #[error("record `{record}`: field `{field}` has unsupported kind `{kind}`")]
    UnsupportedFieldKind {
        /// Owning record
        record: String,
        /// Member name
        field: String,
        /// Declaration shape
        kind: String,
    },
    /// A record declares the same member twice.
    #[error("record `{record}`: duplicate field `{field}`")]
    DuplicateField {
        /// Owning record
        record: String,
        /// Member name
        field: String,
    },
    /// Two members of one JSON object share a name, counting spliced inline members.
    #[error("record `{record}`: JSON member `{member}` is written twice")]
    DuplicateMember {
        /// Record whose object holds both
        record: String,
        /// Colliding JSON name
        member: String,
    },
    /// Nested records reference each other in a loop.
    #[error("cyclic record reference: {}", path.join(" -> "))]
    CyclicRecord {
        /// Records on the cycle, first repeated at the end
        path: Vec<String>,
    },
    /// A name that ends up in generated code is not a C identifier.
    #[error("invalid {what} name `{name}`")]
    InvalidIdentifier {
        /// What kind of name
        what: &'static str,
        /// The name
        name: String,
    },
    /// A generation alias requests an artifact the generator does not produce.
    #[error("alias `{alias}`: unknown artifact `{artifact}`")]
    UnknownArtifact {
        /// Alias name
        alias: String,
        /// Requested artifact
        artifact: String,
    },
    /// A generation alias (or the generator) names a record the model does not declare.
    #[error("alias `{alias}` targets unknown record `{target}`")]
    UnresolvedAliasTarget {
        /// Alias name
        alias: String,
        /// Missing record
        target: String,
    },
    /// A scalar or pointer type has no JSON mapping.
    #[error("record `{record}`: field `{field}` has no JSON mapping for type `{c_type}`")]
    UnmappedType {
        /// Owning record
        record: String,
        /// Member name
        field: String,
        /// Unmapped type
        c_type: String,
    },
    /// A base64 blob has no integer companion length member.
    #[error("record `{record}`: blob `{field}` requires an integer length member `{expected}`")]
    MissingBlobLength {
        /// Owning record
        record: String,
        /// Blob member
        field: String,
        /// Expected companion name
        expected: String,
    },
    /// An enum symbol does not carry the enum's uppercase name prefix.
    #[error("enum `{enum_name}`: symbol `{symbol}` lacks prefix `{prefix}`")]
    EnumSymbolPrefix {
        /// Enum name
        enum_name: String,
        /// Offending symbol
        symbol: String,
        /// Expected prefix
        prefix: String,
    },
    /// An enum used by a codec declares no symbols.
    #[error("enum `{0}` declares no symbols")]
    EmptyEnum(String),
    /// A `flags` directive carries an unknown flag.
    #[error("record `{record}`: field `{field}` has unknown flag `{flag}`")]
    UnknownFlag {
        /// Owning record
        record: String,
        /// Member name
        field: String,
        /// Offending flag
        flag: String,
    },
    /// A known flag is applied where it has no meaning.
    #[error("record `{record}`: field `{field}`: {reason}")]
    InvalidFlag {
        /// Owning record
        record: String,
        /// Member name
        field: String,
        /// Why it does not apply
        reason: String,
    },
    /// A `default` directive value does not fit its field.
    #[error("record `{record}`: field `{field}`: invalid default `{value}`: {reason}")]
    InvalidDefault {
        /// Owning record
        record: String,
        /// Member name
        field: String,
        /// Offending value
        value: String,
        /// Why it does not fit
        reason: String,
    },
    /// A topic segment constraint is inconsistent.
    #[error("endpoint `{endpoint}`: segment `{segment}`: {reason}")]
    InvalidConstraint {
        /// Endpoint name
        endpoint: String,
        /// Segment name
        segment: String,
        /// What is inconsistent
        reason: String,
    },
    /// An endpoint declares the same topic segment twice.
    #[error("endpoint `{endpoint}`: duplicate topic segment `{segment}`")]
    DuplicateSegment {
        /// Endpoint name
        endpoint: String,
        /// Segment name
        segment: String,
    },
    /// The response record cannot carry the dispatch result code.
    #[error("response record `{record}` has no scalar `code` member")]
    ResponseWithoutCode {
        /// Response record name
        record: String,
    },
}
