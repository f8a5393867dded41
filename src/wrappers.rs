//! Wrappers that change how `null` input and failures are handled.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::context::ParseContext;
use crate::engine::{finalize_all, run};
use crate::issue::{Issue, RawIssue};
use crate::payload::Payload;
use crate::pipe::guard;
use crate::schema::{Definition, Schema, SchemaNode};
use crate::value::Value;

/// Substitute used by `default` and `prefault`.
#[derive(Clone)]
pub enum Fallback {
    Value(Value),
    Thunk(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl Fallback {
    fn produce(&self) -> Result<Value, String> {
        match self {
            Fallback::Value(value) => Ok(value.clone()),
            Fallback::Thunk(f) => guard("fallback", || f()),
        }
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Fallback::Thunk(_) => f.write_str("Thunk(..)"),
        }
    }
}

/// What a `catch_fn` fallback sees of the failed parse.
#[derive(Debug, Clone)]
pub struct CatchContext {
    pub input: Value,
    pub issues: Vec<Issue>,
}

/// Substitute used by `catch`.
#[derive(Clone)]
pub enum CatchFallback {
    Value(Value),
    Thunk(Arc<dyn Fn(&CatchContext) -> Value + Send + Sync>),
}

impl fmt::Debug for CatchFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatchFallback::Value(value) => f.debug_tuple("Value").field(value).finish(),
            CatchFallback::Thunk(_) => f.write_str("Thunk(..)"),
        }
    }
}

/// Accepts `null`; a missing object key is omitted from the output.
pub fn optional(schema: impl Into<Schema>) -> Schema {
    Schema::new(Definition::Optional(schema.into()))
}

/// Accepts `null` and keeps it in the output.
pub fn nilable(schema: impl Into<Schema>) -> Schema {
    Schema::new(Definition::Nilable(schema.into()))
}

pub fn nullish(schema: impl Into<Schema>) -> Schema {
    optional(nilable(schema))
}

/// Marks the output as read-only. Parsing is unchanged.
pub fn readonly(schema: impl Into<Schema>) -> Schema {
    Schema::new(Definition::Readonly(schema.into()))
}

pub(crate) fn parse_default(
    inner: &Schema,
    fallback: &Fallback,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    if !payload.value.is_null() {
        run(inner, payload, ctx);
        return;
    }
    match fallback.produce() {
        Ok(value) => payload.value = value,
        Err(message) => payload.push(RawIssue::custom(message)),
    }
}

pub(crate) fn parse_prefault(
    inner: &Schema,
    fallback: &Fallback,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    if payload.value.is_null() {
        match fallback.produce() {
            Ok(value) => payload.value = value,
            Err(message) => {
                payload.push(RawIssue::custom(message));
                return;
            }
        }
    }
    run(inner, payload, ctx);
}

pub(crate) fn parse_catch(
    node: &SchemaNode,
    inner: &Schema,
    fallback: &CatchFallback,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    let input = payload.value.clone();
    let mut attempt = payload.fork(input.clone());
    run(inner, &mut attempt, ctx);
    if attempt.issues.is_empty() {
        payload.value = attempt.value;
        return;
    }

    debug!(
        kind = %node.kind(),
        path = ?payload.path,
        issues = attempt.issues.len(),
        "catch recovered"
    );
    let recovered = match fallback {
        CatchFallback::Value(value) => Ok(value.clone()),
        CatchFallback::Thunk(f) => {
            let caught = CatchContext {
                input,
                issues: finalize_all(attempt.issues, &payload.path, ctx),
            };
            guard("catch", || f(&caught))
        }
    };
    match recovered {
        Ok(value) => payload.value = value,
        Err(message) => payload.push(RawIssue::custom(message)),
    }
}
