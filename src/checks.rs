//! Ordered constraints attached to a schema.
//!
//! A check runs only after its schema accepted the input's runtime kind. Checks
//! execute in insertion order; a failing check marked `abort` ends the run for
//! that value. Transforming checks (`trim`, case conversion) rewrite the value
//! in place so later checks see the result.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::context::{ErrorMap, ParseContext};
use crate::formats::StringFormat;
use crate::issue::{IssueKind, PathSegment, RawIssue};
use crate::payload::Payload;
use crate::pipe::guard;
use crate::schema::SchemaNode;
use crate::value::{Number, Value};

/// Largest integer exactly representable as an IEEE-754 double.
pub const MAX_SAFE_INTEGER: i128 = 9_007_199_254_740_991;

/// Callback behind a custom check.
pub type CheckFn = Arc<dyn Fn(&Value, &mut RefinementCtx<'_>) + Send + Sync>;

/// Handle to the issue list of the value being checked or transformed.
pub struct RefinementCtx<'a> {
    issues: &'a mut Vec<RawIssue>,
    path: &'a [PathSegment],
}

impl<'a> RefinementCtx<'a> {
    pub(crate) fn new(issues: &'a mut Vec<RawIssue>, path: &'a [PathSegment]) -> Self {
        Self { issues, path }
    }

    /// Report an issue. Its path is relative to the value under inspection.
    pub fn add_issue(&mut self, issue: RawIssue) {
        self.issues.push(issue);
    }

    /// Report a `custom` issue with a message.
    pub fn issue(&mut self, message: impl Into<String>) {
        self.add_issue(RawIssue::custom(message));
    }

    /// Absolute path of the value under inspection.
    pub fn path(&self) -> &[PathSegment] {
        self.path
    }
}

/// Options for a refinement.
#[derive(Debug, Clone, Default)]
pub struct RefineParams {
    pub message: Option<String>,
    /// Appended to the refined value's path.
    pub path: Vec<PathSegment>,
    pub abort: bool,
    pub params: Option<serde_json::Value>,
}

impl RefineParams {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn at<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn abort(mut self) -> Self {
        self.abort = true;
        self
    }

    pub fn params(mut self, params: serde_json::Value) -> Self {
        self.params = Some(params);
        self
    }

    pub(crate) fn to_issue(&self) -> RawIssue {
        let mut issue = RawIssue::new(IssueKind::custom(), None).with_path(self.path.clone());
        issue.message = self.message.clone();
        match &self.params {
            Some(params) => issue.with_params(params.clone()),
            None => issue,
        }
    }
}

/// User callback wrapped so check kinds stay `Debug`.
#[derive(Clone)]
pub struct CustomCheck(pub CheckFn);

impl fmt::Debug for CustomCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCheck(..)")
    }
}

/// What a check tests. Exposed so exporters can inspect a schema's constraints.
#[derive(Debug, Clone)]
pub enum CheckKind {
    /// Characters for strings, elements or entries for containers.
    MinSize(usize),
    MaxSize(usize),
    ExactSize(usize),
    GreaterThan { value: Number, inclusive: bool },
    LessThan { value: Number, inclusive: bool },
    MultipleOf(Number),
    Finite,
    Int,
    SafeInt,
    Format(StringFormat),
    Regex(Regex),
    StartsWith(String),
    EndsWith(String),
    Includes(String),
    Trim,
    ToLowercase,
    ToUppercase,
    Custom(CustomCheck),
}

impl CheckKind {
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::MinSize(_) => "min_size",
            CheckKind::MaxSize(_) => "max_size",
            CheckKind::ExactSize(_) => "exact_size",
            CheckKind::GreaterThan { .. } => "greater_than",
            CheckKind::LessThan { .. } => "less_than",
            CheckKind::MultipleOf(_) => "multiple_of",
            CheckKind::Finite => "finite",
            CheckKind::Int => "int",
            CheckKind::SafeInt => "safe_int",
            CheckKind::Format(format) => format.name(),
            CheckKind::Regex(_) => "regex",
            CheckKind::StartsWith(_) => "starts_with",
            CheckKind::EndsWith(_) => "ends_with",
            CheckKind::Includes(_) => "includes",
            CheckKind::Trim => "trim",
            CheckKind::ToLowercase => "to_lowercase",
            CheckKind::ToUppercase => "to_uppercase",
            CheckKind::Custom(_) => "custom",
        }
    }
}

/// A constraint with its abort bit and optional message hook.
#[derive(Clone)]
pub struct Check {
    pub kind: CheckKind,
    pub abort: bool,
    pub(crate) error: Option<ErrorMap>,
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("kind", &self.kind)
            .field("abort", &self.abort)
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl Check {
    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            abort: false,
            error: None,
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value, &mut RefinementCtx<'_>) + Send + Sync + 'static,
    {
        Self::new(CheckKind::Custom(CustomCheck(Arc::new(f))))
    }

    pub fn min_size(n: usize) -> Self {
        Self::new(CheckKind::MinSize(n))
    }

    pub fn max_size(n: usize) -> Self {
        Self::new(CheckKind::MaxSize(n))
    }

    pub fn exact_size(n: usize) -> Self {
        Self::new(CheckKind::ExactSize(n))
    }

    pub fn gt(value: impl Into<Number>) -> Self {
        Self::new(CheckKind::GreaterThan {
            value: value.into(),
            inclusive: false,
        })
    }

    pub fn gte(value: impl Into<Number>) -> Self {
        Self::new(CheckKind::GreaterThan {
            value: value.into(),
            inclusive: true,
        })
    }

    pub fn lt(value: impl Into<Number>) -> Self {
        Self::new(CheckKind::LessThan {
            value: value.into(),
            inclusive: false,
        })
    }

    pub fn lte(value: impl Into<Number>) -> Self {
        Self::new(CheckKind::LessThan {
            value: value.into(),
            inclusive: true,
        })
    }

    pub fn multiple_of(divisor: impl Into<Number>) -> Self {
        Self::new(CheckKind::MultipleOf(divisor.into()))
    }

    pub fn format(format: StringFormat) -> Self {
        Self::new(CheckKind::Format(format))
    }

    pub fn regex(regex: Regex) -> Self {
        Self::new(CheckKind::Regex(regex))
    }

    /// Stop running later checks when this one fails.
    pub fn abort(mut self) -> Self {
        self.abort = true;
        self
    }

    /// Fixed message for issues raised by this check.
    pub fn message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.error(move |_| Some(message.clone()))
    }

    pub fn error<F>(mut self, map: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(map));
        self
    }

    pub(crate) fn run(&self, node: &SchemaNode, payload: &mut Payload) {
        let kind = match &self.kind {
            CheckKind::Trim | CheckKind::ToLowercase | CheckKind::ToUppercase => {
                rewrite(&self.kind, &mut payload.value);
                return;
            }
            CheckKind::Custom(CustomCheck(f)) => {
                self.run_custom(f, node, payload);
                return;
            }
            kind => match failure(kind, &payload.value) {
                Some(issue) => issue,
                None => return,
            },
        };
        let mut issue = node.issue(kind, &payload.value);
        issue.check_hook = self.error.clone();
        payload.push(issue);
    }

    fn run_custom(&self, f: &CheckFn, node: &SchemaNode, payload: &mut Payload) {
        let before = payload.issue_count();
        let Payload {
            value,
            issues,
            path,
        } = payload;
        let outcome = guard("check", || f(value, &mut RefinementCtx::new(issues, path)));
        if let Err(message) = outcome {
            issues.push(RawIssue::custom(message));
        }
        for issue in &mut issues[before..] {
            if issue.input.is_none() {
                issue.input = Some(value.clone());
            }
            if issue.origin.is_none() {
                issue.origin = Some(node.kind());
            }
            if issue.check_hook.is_none() {
                issue.check_hook = self.error.clone();
            }
            if issue.schema_hook.is_none() {
                issue.schema_hook = node.internals.error.clone();
            }
        }
    }
}

/// Run `checks` in order, stopping after a failing aborting check.
pub(crate) fn run_all(
    checks: &[Check],
    node: &SchemaNode,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    for check in checks {
        let before = payload.issue_count();
        check.run(node, payload);
        if payload.issue_count() > before && (check.abort || ctx.abort_early) {
            break;
        }
    }
}

fn rewrite(kind: &CheckKind, value: &mut Value) {
    if let Value::String(s) = value {
        *s = match kind {
            CheckKind::Trim => s.trim().to_string(),
            CheckKind::ToLowercase => s.to_lowercase(),
            CheckKind::ToUppercase => s.to_uppercase(),
            _ => return,
        };
    }
}

/// The issue `kind` raises for `value`, if it fails.
fn failure(kind: &CheckKind, value: &Value) -> Option<IssueKind> {
    match kind {
        CheckKind::MinSize(n) => {
            let size = size_of(value)?;
            (size < *n).then(|| too_small(Number::from(*n), true, false))
        }
        CheckKind::MaxSize(n) => {
            let size = size_of(value)?;
            (size > *n).then(|| too_big(Number::from(*n), true, false))
        }
        CheckKind::ExactSize(n) => {
            let size = size_of(value)?;
            if size < *n {
                Some(too_small(Number::from(*n), true, true))
            } else if size > *n {
                Some(too_big(Number::from(*n), true, true))
            } else {
                None
            }
        }
        CheckKind::GreaterThan {
            value: bound,
            inclusive,
        } => {
            let n = numeric(value)?;
            let ok = if *inclusive { n >= *bound } else { n > *bound };
            (!ok).then(|| too_small(*bound, *inclusive, false))
        }
        CheckKind::LessThan {
            value: bound,
            inclusive,
        } => {
            let n = numeric(value)?;
            let ok = if *inclusive { n <= *bound } else { n < *bound };
            (!ok).then(|| too_big(*bound, *inclusive, false))
        }
        CheckKind::MultipleOf(divisor) => {
            let n = numeric(value)?;
            (!is_multiple(n, *divisor)).then_some(IssueKind::NotMultipleOf { divisor: *divisor })
        }
        CheckKind::Finite => {
            let n = value.as_number()?;
            (!n.is_finite()).then(|| non_number("number", n))
        }
        CheckKind::Int => {
            let n = value.as_number()?;
            (!n.is_integer()).then(|| non_number("int", n))
        }
        CheckKind::SafeInt => {
            let n = value.as_number()?;
            match n.as_i128() {
                None => Some(non_number("int", n)),
                Some(i) if i < -MAX_SAFE_INTEGER => {
                    Some(too_small(Number::Int(-MAX_SAFE_INTEGER), true, false))
                }
                Some(i) if i > MAX_SAFE_INTEGER => {
                    Some(too_big(Number::Int(MAX_SAFE_INTEGER), true, false))
                }
                Some(_) => None,
            }
        }
        CheckKind::Format(format) => {
            let s = value.as_str()?;
            (!format.matches(s)).then(|| IssueKind::InvalidFormat {
                format: format.name().to_string(),
                pattern: format.pattern().map(str::to_string),
            })
        }
        CheckKind::Regex(regex) => {
            let s = value.as_str()?;
            (!regex.is_match(s)).then(|| invalid_format("regex", regex.as_str()))
        }
        CheckKind::StartsWith(prefix) => {
            let s = value.as_str()?;
            (!s.starts_with(prefix.as_str())).then(|| invalid_format("starts_with", prefix))
        }
        CheckKind::EndsWith(suffix) => {
            let s = value.as_str()?;
            (!s.ends_with(suffix.as_str())).then(|| invalid_format("ends_with", suffix))
        }
        CheckKind::Includes(needle) => {
            let s = value.as_str()?;
            (!s.contains(needle.as_str())).then(|| invalid_format("includes", needle))
        }
        CheckKind::Trim
        | CheckKind::ToLowercase
        | CheckKind::ToUppercase
        | CheckKind::Custom(_) => None,
    }
}

fn size_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) | Value::Set(items) => Some(items.len()),
        Value::Map(entries) => Some(entries.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

fn numeric(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(*n),
        Value::BigInt(i) => Some(Number::Int(*i)),
        _ => None,
    }
}

fn too_small(minimum: Number, inclusive: bool, exact: bool) -> IssueKind {
    IssueKind::TooSmall {
        minimum,
        inclusive,
        exact,
    }
}

fn too_big(maximum: Number, inclusive: bool, exact: bool) -> IssueKind {
    IssueKind::TooBig {
        maximum,
        inclusive,
        exact,
    }
}

fn invalid_format(format: &str, pattern: &str) -> IssueKind {
    IssueKind::InvalidFormat {
        format: format.to_string(),
        pattern: Some(pattern.to_string()),
    }
}

/// `invalid_type` for a number that is not the expected numeric refinement.
pub(crate) fn non_number(expected: &str, n: Number) -> IssueKind {
    let received = if n.is_nan() {
        "NaN"
    } else if !n.is_finite() {
        "Infinity"
    } else {
        "float"
    };
    IssueKind::InvalidType {
        expected: expected.to_string(),
        received: received.to_string(),
    }
}

/// Integer divisors are exact; float operands are scaled to integers by
/// their longest decimal expansion first.
fn is_multiple(value: Number, divisor: Number) -> bool {
    if let (Number::Int(v), Number::Int(d)) = (value, divisor) {
        return d != 0 && v.checked_rem(d).map_or(true, |r| r == 0);
    }
    let (v, d) = (value.as_f64(), divisor.as_f64());
    if !v.is_finite() || !d.is_finite() || d == 0.0 {
        return false;
    }
    let scale = decimals(v).max(decimals(d)).min(15);
    let factor = 10f64.powi(scale as i32);
    let (v, d) = ((v * factor).round(), (d * factor).round());
    d != 0.0 && v % d == 0.0
}

fn decimals(x: f64) -> usize {
    let text = x.abs().to_string();
    text.split_once('.').map_or(0, |(_, frac)| frac.len())
}
