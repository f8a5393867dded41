//! Issue records.
//!
//! Schemas emit [`RawIssue`]s while parsing: no rendered message and a path
//! relative to the schema that produced them. Containers prefix their key or
//! index as issues bubble up, and the parse entry point finalises every raw
//! issue into an [`Issue`] once the root is reached.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::config;
use crate::context::{ErrorMap, ParseContext};
use crate::messages;
use crate::schema::SchemaKind;
use crate::value::{Number, Value};

/// One step from a container to a nested value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Path segment for a map key of any kind.
    pub fn from_value(key: &Value) -> Self {
        match key {
            Value::String(s) => PathSegment::Key(s.clone()),
            other => PathSegment::Key(other.to_string()),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

impl Serialize for PathSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathSegment::Key(k) => serializer.serialize_str(k),
            PathSegment::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Render a path as an RFC 6901 JSON Pointer (`""` for the root).
pub fn json_pointer(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        out.push('/');
        match segment {
            PathSegment::Key(k) => out.push_str(&k.replace('~', "~0").replace('/', "~1")),
            PathSegment::Index(i) => out.push_str(&i.to_string()),
        }
    }
    out
}

/// Render a path as `a[2].b`; keys that are not plain identifiers are quoted.
pub fn dotted_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Index(i) => out.push_str(&format!("[{}]", i)),
            PathSegment::Key(k) if is_identifier(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            PathSegment::Key(k) => out.push_str(&format!("[{:?}]", k)),
        }
    }
    out
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Stable issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    InvalidValue,
    TooSmall,
    TooBig,
    InvalidFormat,
    NotMultipleOf,
    UnrecognisedKeys,
    InvalidUnion,
    InvalidKey,
    InvalidElement,
    InvalidIntersection,
    Custom,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::InvalidType => "invalid_type",
            IssueCode::InvalidValue => "invalid_value",
            IssueCode::TooSmall => "too_small",
            IssueCode::TooBig => "too_big",
            IssueCode::InvalidFormat => "invalid_format",
            IssueCode::NotMultipleOf => "not_multiple_of",
            IssueCode::UnrecognisedKeys => "unrecognised_keys",
            IssueCode::InvalidUnion => "invalid_union",
            IssueCode::InvalidKey => "invalid_key",
            IssueCode::InvalidElement => "invalid_element",
            IssueCode::InvalidIntersection => "invalid_intersection",
            IssueCode::Custom => "custom",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code-specific issue fields.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IssueKind {
    InvalidType {
        expected: String,
        received: String,
    },
    InvalidValue {
        values: Vec<Value>,
    },
    TooSmall {
        minimum: Number,
        inclusive: bool,
        exact: bool,
    },
    TooBig {
        maximum: Number,
        inclusive: bool,
        exact: bool,
    },
    InvalidFormat {
        format: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    NotMultipleOf {
        divisor: Number,
    },
    UnrecognisedKeys {
        keys: Vec<String>,
    },
    InvalidUnion {
        branches: Vec<Vec<Issue>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        discriminator: Option<String>,
    },
    InvalidKey {
        key: Value,
        issues: Vec<Issue>,
    },
    InvalidElement {
        key: PathSegment,
        issues: Vec<Issue>,
    },
    InvalidIntersection {
        reason: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        merge_path: Vec<PathSegment>,
    },
    Custom {
        #[serde(skip_serializing_if = "Option::is_none")]
        params: Option<serde_json::Value>,
    },
}

impl IssueKind {
    pub fn code(&self) -> IssueCode {
        match self {
            IssueKind::InvalidType { .. } => IssueCode::InvalidType,
            IssueKind::InvalidValue { .. } => IssueCode::InvalidValue,
            IssueKind::TooSmall { .. } => IssueCode::TooSmall,
            IssueKind::TooBig { .. } => IssueCode::TooBig,
            IssueKind::InvalidFormat { .. } => IssueCode::InvalidFormat,
            IssueKind::NotMultipleOf { .. } => IssueCode::NotMultipleOf,
            IssueKind::UnrecognisedKeys { .. } => IssueCode::UnrecognisedKeys,
            IssueKind::InvalidUnion { .. } => IssueCode::InvalidUnion,
            IssueKind::InvalidKey { .. } => IssueCode::InvalidKey,
            IssueKind::InvalidElement { .. } => IssueCode::InvalidElement,
            IssueKind::InvalidIntersection { .. } => IssueCode::InvalidIntersection,
            IssueKind::Custom { .. } => IssueCode::Custom,
        }
    }

    pub fn invalid_type(expected: impl Into<String>, received: &Value) -> Self {
        IssueKind::InvalidType {
            expected: expected.into(),
            received: received.type_name().to_string(),
        }
    }

    pub fn custom() -> Self {
        IssueKind::Custom { params: None }
    }
}

/// An issue as emitted during parsing.
#[derive(Clone)]
pub struct RawIssue {
    pub kind: IssueKind,
    pub input: Option<Value>,
    /// Relative to the schema that emitted the issue until it reaches the root.
    pub path: Vec<PathSegment>,
    pub message: Option<String>,
    pub origin: Option<SchemaKind>,
    pub(crate) check_hook: Option<ErrorMap>,
    pub(crate) schema_hook: Option<ErrorMap>,
}

impl RawIssue {
    pub fn new(kind: IssueKind, input: Option<Value>) -> Self {
        Self {
            kind,
            input,
            path: Vec::new(),
            message: None,
            origin: None,
            check_hook: None,
            schema_hook: None,
        }
    }

    /// A `custom` issue carrying an explicit message.
    pub fn custom(message: impl Into<String>) -> Self {
        let mut issue = Self::new(IssueKind::custom(), None);
        issue.message = Some(message.into());
        issue
    }

    pub fn code(&self) -> IssueCode {
        self.kind.code()
    }

    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        if let IssueKind::Custom { params: slot } = &mut self.kind {
            *slot = Some(params);
        }
        self
    }

    pub(crate) fn prefix(&mut self, segment: &PathSegment) {
        self.path.insert(0, segment.clone());
    }
}

impl fmt::Debug for RawIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawIssue")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("message", &self.message)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// A finalised, user-facing issue with an absolute path and rendered message.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    #[serde(flatten)]
    pub kind: IssueKind,
    pub path: Vec<PathSegment>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<SchemaKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl Issue {
    pub fn code(&self) -> IssueCode {
        self.kind.code()
    }

    /// JSON Pointer (RFC 6901) to the offending value.
    pub fn pointer(&self) -> String {
        json_pointer(&self.path)
    }

    pub fn dotted_path(&self) -> String {
        dotted_path(&self.path)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pointer = self.pointer();
        let pointer = if pointer.is_empty() {
            "/"
        } else {
            pointer.as_str()
        };
        write!(f, "{}: {}", pointer, self.message)
    }
}

/// Promote a raw issue to its user-facing form.
///
/// Message precedence: explicit message, check hook, schema hook, context
/// error map, process-wide error map, locale bundle, built-in default.
pub(crate) fn finalize(raw: RawIssue, ctx: &ParseContext) -> Issue {
    let message = resolve_message(&raw, ctx);
    Issue {
        kind: raw.kind,
        path: raw.path,
        message,
        origin: raw.origin,
        input: raw.input,
    }
}

fn resolve_message(raw: &RawIssue, ctx: &ParseContext) -> String {
    if let Some(message) = raw.message.as_ref().filter(|m| !m.is_empty()) {
        return message.clone();
    }

    [
        raw.check_hook.as_ref(),
        raw.schema_hook.as_ref(),
        ctx.error_map.as_ref(),
    ]
    .into_iter()
    .flatten()
    .find_map(|hook| hook(raw).filter(|m| !m.is_empty()))
    .or_else(|| config::global_message(raw, ctx.locale.as_deref()))
    .unwrap_or_else(|| messages::default_message(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn too_small() -> RawIssue {
        RawIssue::new(
            IssueKind::TooSmall {
                minimum: Number::Int(3),
                inclusive: true,
                exact: false,
            },
            Some(Value::from("hi")),
        )
    }

    #[test]
    fn pointer_escapes_segments() {
        let path = vec![
            PathSegment::from("a/b"),
            PathSegment::from(2),
            PathSegment::from("c~d"),
        ];
        assert_eq!(json_pointer(&path), "/a~1b/2/c~0d");
        assert_eq!(json_pointer(&[]), "");
    }

    #[test]
    fn dotted_path_quotes_odd_keys() {
        let path = vec![
            PathSegment::from("a"),
            PathSegment::from(2),
            PathSegment::from("b"),
            PathSegment::from("with space"),
        ];
        assert_eq!(dotted_path(&path), "a[2].b[\"with space\"]");
    }

    #[test]
    fn explicit_message_wins() {
        let mut raw = too_small();
        raw.message = Some("explicit".into());
        raw.check_hook = Some(Arc::new(|_| Some("check".into())));
        let issue = finalize(raw, &ParseContext::new());
        assert_eq!(issue.message, "explicit");
    }

    #[test]
    fn check_hook_beats_schema_hook_and_context() {
        let mut raw = too_small();
        raw.check_hook = Some(Arc::new(|_| Some("check".into())));
        raw.schema_hook = Some(Arc::new(|_| Some("schema".into())));
        let ctx = ParseContext::new().error_map(|_| Some("context".into()));
        assert_eq!(finalize(raw, &ctx).message, "check");
    }

    #[test]
    fn empty_hook_messages_fall_through() {
        let mut raw = too_small();
        raw.check_hook = Some(Arc::new(|_| Some(String::new())));
        raw.schema_hook = Some(Arc::new(|_| None));
        let ctx = ParseContext::new().error_map(|issue| {
            (issue.code() == IssueCode::TooSmall).then(|| "context".to_string())
        });
        assert_eq!(finalize(raw, &ctx).message, "context");
    }

    #[test]
    fn falls_back_to_default_message() {
        let issue = finalize(too_small(), &ParseContext::new());
        assert!(issue.message.contains(">=3"));
        assert_eq!(issue.code(), IssueCode::TooSmall);
    }

    #[test]
    fn issue_serializes_code_and_fields() {
        let raw = too_small().with_path(vec!["name".into()]);
        let issue = finalize(raw, &ParseContext::new());
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["code"], "too_small");
        assert_eq!(json["minimum"], 3);
        assert_eq!(json["path"], serde_json::json!(["name"]));
    }

    #[test]
    fn issue_display_uses_pointer() {
        let raw = too_small().with_path(vec!["name".into()]);
        let issue = finalize(raw, &ParseContext::new());
        assert!(issue.to_string().starts_with("/name: "));
    }
}
