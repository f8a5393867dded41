//! The per-node parse pipeline.
//!
//! Every node runs the same steps: nil gate, optional coercion, kind-specific
//! parsing, then its checks. Issues stay raw until the root call finishes.

use tracing::trace;

use crate::checks;
use crate::coerce;
use crate::containers;
use crate::context::ParseContext;
use crate::error::ValidationError;
use crate::function;
use crate::issue::{finalize, Issue, IssueKind, PathSegment, RawIssue};
use crate::merge;
use crate::object;
use crate::payload::Payload;
use crate::pipe;
use crate::primitives;
use crate::schema::{Definition, Schema, SchemaNode};
use crate::union;
use crate::value::Value;
use crate::wrappers;

pub(crate) fn parse(
    schema: &Schema,
    input: Value,
    ctx: &ParseContext,
) -> Result<Value, ValidationError> {
    let mut payload = Payload::new(input);
    run(schema, &mut payload, ctx);
    finish(payload, ctx)
}

/// Turn a finished root payload into the parse result.
pub(crate) fn finish(payload: Payload, ctx: &ParseContext) -> Result<Value, ValidationError> {
    if payload.issues.is_empty() {
        Ok(payload.value)
    } else {
        Err(ValidationError::new(
            finalize_all(payload.issues, &[], ctx),
            ctx.report_format,
        ))
    }
}

/// Finalise issues nested inside another issue, anchoring their paths at
/// `base` so they read as absolute.
pub(crate) fn finalize_all(
    issues: Vec<RawIssue>,
    base: &[PathSegment],
    ctx: &ParseContext,
) -> Vec<Issue> {
    issues
        .into_iter()
        .map(|mut raw| {
            if !base.is_empty() {
                let mut path = base.to_vec();
                path.append(&mut raw.path);
                raw.path = path;
            }
            finalize(raw, ctx)
        })
        .collect()
}

/// Parse `payload.value` against `schema`, appending issues to the payload.
pub(crate) fn run(schema: &Schema, payload: &mut Payload, ctx: &ParseContext) {
    let node = schema.node();
    trace!(kind = %node.kind(), path = ?payload.path, "parse");

    if payload.value.is_null() && node.is_nil_gated() {
        let issue = node.issue(
            IssueKind::invalid_type(node.expected(), &Value::Null),
            &Value::Null,
        );
        payload.push(issue);
        return;
    }

    if node.internals.coerce {
        coerce::apply(&node.def, &mut payload.value);
    }

    let before = payload.issue_count();
    dispatch(node, payload, ctx);

    if payload.issue_count() == before && !node.internals.checks.is_empty() {
        checks::run_all(&node.internals.checks, node, payload, ctx);
    }
}

fn dispatch(node: &SchemaNode, payload: &mut Payload, ctx: &ParseContext) {
    match &node.def {
        Definition::String => primitives::parse_string(node, payload),
        Definition::Number(kind) => primitives::parse_number(node, *kind, payload),
        Definition::BigInt => primitives::parse_bigint(node, payload),
        Definition::Bool => primitives::parse_bool(node, payload),
        Definition::Nil => primitives::parse_nil(node, payload),
        Definition::Any | Definition::Unknown => {}
        Definition::Never => payload.push(node.type_issue(&payload.value)),
        Definition::Literal(values) => primitives::parse_literal(node, values, payload),
        Definition::Enum(def) => primitives::parse_literal(node, &def.values(), payload),
        Definition::Array(element) => containers::parse_array(node, element, payload, ctx),
        Definition::Tuple { items, rest } => {
            containers::parse_tuple(node, items, rest.as_ref(), payload, ctx)
        }
        Definition::Set(element) => containers::parse_set(node, element, payload, ctx),
        Definition::Map { key, value } => containers::parse_map(node, key, value, payload, ctx),
        Definition::Record { key, value } => {
            containers::parse_record(node, key, value, payload, ctx)
        }
        Definition::Object(def) => object::parse_object(node, def, payload, ctx),
        Definition::Union(options) => union::parse_union(node, options, payload, ctx),
        Definition::DiscriminatedUnion(def) => union::parse_discriminated(node, def, payload, ctx),
        Definition::ExclusiveUnion(options) => union::parse_exclusive(node, options, payload, ctx),
        Definition::Intersection(left, right) => {
            merge::parse_intersection(node, left, right, payload, ctx)
        }
        Definition::Lazy(lazy) => run(lazy.resolve(), payload, ctx),
        Definition::Function(def) => function::parse_function(node, def, payload, ctx),
        Definition::Pipe(first, second) => pipe::parse_pipe(first, second, payload, ctx),
        Definition::Transform(f) => pipe::parse_transform(node, f, payload),
        Definition::Custom(pred) => pipe::parse_custom(node, pred, payload),
        Definition::Readonly(inner) => run(inner, payload, ctx),
        Definition::Optional(inner) | Definition::Nilable(inner) => {
            if !payload.value.is_null() {
                run(inner, payload, ctx);
            }
        }
        Definition::Default(inner, fallback) => {
            wrappers::parse_default(inner, fallback, payload, ctx)
        }
        Definition::Prefault(inner, fallback) => {
            wrappers::parse_prefault(inner, fallback, payload, ctx)
        }
        Definition::Catch(inner, fallback) => {
            wrappers::parse_catch(node, inner, fallback, payload, ctx)
        }
    }
}
