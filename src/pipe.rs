//! Pipes, transforms and custom predicates, plus panic capture for every
//! user callback.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use crate::checks::RefinementCtx;
use crate::context::ParseContext;
use crate::engine::run;
use crate::issue::{IssueKind, RawIssue};
use crate::payload::Payload;
use crate::schema::{Definition, Schema, SchemaNode};
use crate::value::Value;

/// Callback behind a transform node. `Err` becomes a `custom` issue.
pub type TransformFn =
    Arc<dyn Fn(Value, &mut RefinementCtx<'_>) -> Result<Value, String> + Send + Sync>;

/// Callback behind a `custom` schema.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Run a user callback, turning a panic into an error message.
pub(crate) fn guard<T>(what: &str, f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(callback = what, %message, "user callback panicked");
        message
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "callback panicked".to_string()
    }
}

/// Parse with `first`, then feed its output to `second`.
pub fn pipe(first: impl Into<Schema>, second: impl Into<Schema>) -> Schema {
    Schema::new(Definition::Pipe(first.into(), second.into()))
}

/// A schema that maps any input through `f`.
pub fn transform<F>(f: F) -> Schema
where
    F: Fn(Value, &mut RefinementCtx<'_>) -> Value + Send + Sync + 'static,
{
    Schema::new(Definition::Transform(Arc::new(move |value, ctx| Ok(f(value, ctx)))))
}

/// A transform whose `Err` fails the parse with the error's message.
pub fn try_transform<F, E>(f: F) -> Schema
where
    F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
    E: fmt::Display,
{
    Schema::new(Definition::Transform(Arc::new(move |value, _| {
        f(value).map_err(|e| e.to_string())
    })))
}

/// Accept any input for which `pred` holds.
pub fn custom<F>(pred: F) -> Schema
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Schema::new(Definition::Custom(Arc::new(pred)))
}

pub(crate) fn parse_pipe(
    first: &Schema,
    second: &Schema,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    let before = payload.issue_count();
    run(first, payload, ctx);
    if payload.issue_count() == before {
        run(second, payload, ctx);
    }
}

/// A transform that reports issues yields no value.
pub(crate) fn parse_transform(node: &SchemaNode, f: &TransformFn, payload: &mut Payload) {
    let before = payload.issue_count();
    let input = std::mem::take(&mut payload.value);
    let Payload { issues, path, .. } = &mut *payload;
    let mut ctx = RefinementCtx::new(issues, path);
    let outcome = guard("transform", || f(input, &mut ctx));

    let output = match outcome {
        Ok(Ok(value)) => value,
        Ok(Err(message)) | Err(message) => {
            payload.push(RawIssue::custom(message));
            Value::Null
        }
    };
    if payload.issue_count() > before {
        for issue in &mut payload.issues[before..] {
            if issue.origin.is_none() {
                issue.origin = Some(node.kind());
            }
        }
        payload.value = Value::Null;
    } else {
        payload.value = output;
    }
}

pub(crate) fn parse_custom(node: &SchemaNode, pred: &Predicate, payload: &mut Payload) {
    let issue = match guard("custom", || pred(&payload.value)) {
        Ok(true) => return,
        Ok(false) => node.issue(IssueKind::custom(), &payload.value),
        Err(message) => {
            let mut issue = node.issue(IssueKind::custom(), &payload.value);
            issue.message = Some(message);
            issue
        }
    };
    payload.push(issue);
}
