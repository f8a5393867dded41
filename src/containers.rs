//! Arrays, tuples, sets, maps and records.

use crate::checks::Check;
use crate::context::ParseContext;
use crate::engine::{finalize_all, run};
use crate::issue::{IssueKind, PathSegment};
use crate::payload::Payload;
use crate::schema::{typed_schema, Definition, Schema, SchemaNode, SchemaType};
use crate::value::{Number, Object, Value};

typed_schema!(ArraySchema);
typed_schema!(
    /// Fixed-position items with an optional uniform tail.
    TupleSchema
);
typed_schema!(SetSchema);
typed_schema!(MapSchema);
typed_schema!(RecordSchema);

pub fn array(element: impl Into<Schema>) -> ArraySchema {
    ArraySchema(Schema::new(Definition::Array(element.into())))
}

pub fn tuple<I, S>(items: I) -> TupleSchema
where
    I: IntoIterator<Item = S>,
    S: Into<Schema>,
{
    TupleSchema(Schema::new(Definition::Tuple {
        items: items.into_iter().map(Into::into).collect(),
        rest: None,
    }))
}

pub fn set(element: impl Into<Schema>) -> SetSchema {
    SetSchema(Schema::new(Definition::Set(element.into())))
}

pub fn map(key: impl Into<Schema>, value: impl Into<Schema>) -> MapSchema {
    MapSchema(Schema::new(Definition::Map {
        key: key.into(),
        value: value.into(),
    }))
}

/// An object with uniformly typed keys and values. A key schema with a finite
/// value set (literal or enum) makes every listed key required.
pub fn record(key: impl Into<Schema>, value: impl Into<Schema>) -> RecordSchema {
    RecordSchema(Schema::new(Definition::Record {
        key: key.into(),
        value: value.into(),
    }))
}

impl ArraySchema {
    pub fn element(&self) -> &Schema {
        match self.definition() {
            Definition::Array(element) => element,
            _ => unreachable!("ArraySchema always wraps an array definition"),
        }
    }

    pub fn min(self, n: usize) -> Self {
        self.check(Check::min_size(n))
    }

    pub fn max(self, n: usize) -> Self {
        self.check(Check::max_size(n))
    }

    pub fn length(self, n: usize) -> Self {
        self.check(Check::exact_size(n))
    }

    pub fn non_empty(self) -> Self {
        self.min(1)
    }
}

impl TupleSchema {
    /// Accept any number of trailing items matching `rest`.
    pub fn rest(self, rest: impl Into<Schema>) -> Self {
        let rest = rest.into();
        Self(self.0.modify(|node| {
            if let Definition::Tuple { rest: slot, .. } = &mut node.def {
                *slot = Some(rest);
            }
        }))
    }
}

macro_rules! size_checks {
    ($($name:ident),*) => {
        $(impl $name {
            pub fn min(self, n: usize) -> Self {
                self.check(Check::min_size(n))
            }

            pub fn max(self, n: usize) -> Self {
                self.check(Check::max_size(n))
            }

            pub fn size(self, n: usize) -> Self {
                self.check(Check::exact_size(n))
            }
        })*
    };
}

size_checks!(SetSchema, MapSchema, RecordSchema);

pub(crate) fn parse_array(
    node: &SchemaNode,
    element: &Schema,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    let items = match std::mem::take(&mut payload.value) {
        Value::Array(items) => items,
        other => {
            payload.push(node.type_issue(&other));
            payload.value = other;
            return;
        }
    };
    let mut output = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let mut child = payload.child(PathSegment::Index(index), item);
        run(element, &mut child, ctx);
        output.push(payload.absorb(child));
        if ctx.abort_early && !payload.issues.is_empty() {
            break;
        }
    }
    payload.value = Value::Array(output);
}

pub(crate) fn parse_tuple(
    node: &SchemaNode,
    items: &[Schema],
    rest: Option<&Schema>,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    let input = match std::mem::take(&mut payload.value) {
        Value::Array(input) => input,
        other => {
            payload.push(node.type_issue(&other));
            payload.value = other;
            return;
        }
    };

    let required = items
        .iter()
        .rposition(|item| !item.is_optional() && !item.fills_missing())
        .map_or(0, |last| last + 1);
    let all_required = required == items.len();
    let bound = if input.len() < required {
        Some(IssueKind::TooSmall {
            minimum: Number::from(required),
            inclusive: true,
            exact: rest.is_none() && all_required,
        })
    } else if rest.is_none() && input.len() > items.len() {
        Some(IssueKind::TooBig {
            maximum: Number::from(items.len()),
            inclusive: true,
            exact: all_required,
        })
    } else {
        None
    };
    if let Some(kind) = bound {
        let input = Value::Array(input);
        payload.push(node.issue(kind, &input));
        payload.value = input;
        return;
    }

    let mut output = Vec::with_capacity(input.len());
    for (index, item) in input.into_iter().enumerate() {
        let Some(schema) = items.get(index).or(rest) else {
            break;
        };
        let mut child = payload.child(PathSegment::Index(index), item);
        run(schema, &mut child, ctx);
        output.push(payload.absorb(child));
        if ctx.abort_early && !payload.issues.is_empty() {
            payload.value = Value::Array(output);
            return;
        }
    }

    // missing items up to the last fallback are parsed from null
    let filled = items
        .iter()
        .rposition(Schema::fills_missing)
        .map_or(0, |last| last + 1);
    for (index, schema) in items.iter().enumerate().take(filled).skip(output.len()) {
        let mut child = payload.child(PathSegment::Index(index), Value::Null);
        run(schema, &mut child, ctx);
        output.push(payload.absorb(child));
    }
    payload.value = Value::Array(output);
}

pub(crate) fn parse_set(
    node: &SchemaNode,
    element: &Schema,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    let items = match std::mem::take(&mut payload.value) {
        Value::Set(items) => items,
        other => {
            payload.push(node.type_issue(&other));
            payload.value = other;
            return;
        }
    };
    let mut output = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let mut child = payload.child(PathSegment::Index(index), item);
        run(element, &mut child, ctx);
        output.push(payload.absorb(child));
        if ctx.abort_early && !payload.issues.is_empty() {
            break;
        }
    }
    payload.value = Value::set(output);
}

pub(crate) fn parse_map(
    node: &SchemaNode,
    key_schema: &Schema,
    value_schema: &Schema,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    let entries = match std::mem::take(&mut payload.value) {
        Value::Map(entries) => entries,
        other => {
            payload.push(node.type_issue(&other));
            payload.value = other;
            return;
        }
    };
    let mut output: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let segment = PathSegment::from_value(&key);
        let mut entry_path = payload.path.clone();
        entry_path.push(segment.clone());

        let mut key_payload = payload.fork(key.clone());
        run(key_schema, &mut key_payload, ctx);
        if !key_payload.issues.is_empty() {
            let issues = finalize_all(key_payload.issues, &payload.path, ctx);
            let kind = IssueKind::InvalidKey {
                key: key.clone(),
                issues,
            };
            let issue = node.issue(kind, &key).with_path(vec![segment.clone()]);
            payload.push(issue);
        }

        let mut value_payload = payload.child(segment.clone(), value.clone());
        run(value_schema, &mut value_payload, ctx);
        if !value_payload.issues.is_empty() {
            let issues = finalize_all(value_payload.issues, &entry_path, ctx);
            let kind = IssueKind::InvalidElement {
                key: segment.clone(),
                issues,
            };
            let issue = node.issue(kind, &value).with_path(vec![segment]);
            payload.push(issue);
        }

        let (key, value) = (key_payload.value, value_payload.value);
        match output.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => output.push((key, value)),
        }
        if ctx.abort_early && !payload.issues.is_empty() {
            break;
        }
    }
    payload.value = Value::Map(output);
}

pub(crate) fn parse_record(
    node: &SchemaNode,
    key_schema: &Schema,
    value_schema: &Schema,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    let mut input = match std::mem::take(&mut payload.value) {
        Value::Object(input) => input,
        other => {
            payload.push(node.type_issue(&other));
            payload.value = other;
            return;
        }
    };
    let mut output = Object::with_capacity(input.len());

    if let Some(keys) = key_schema.values() {
        for key in keys.iter().filter(|key| !key.is_null()) {
            let name = key_name(key);
            let value = match input.shift_remove(&name) {
                Some(value) => value,
                None if value_schema.omits_when_missing() => continue,
                None => Value::Null,
            };
            let mut child = payload.child(PathSegment::Key(name.clone()), value);
            run(value_schema, &mut child, ctx);
            output.insert(name, payload.absorb(child));
            if ctx.abort_early && !payload.issues.is_empty() {
                break;
            }
        }
        if !input.is_empty() && !(ctx.abort_early && !payload.issues.is_empty()) {
            let keys = input.keys().cloned().collect();
            let issue = node.issue(IssueKind::UnrecognisedKeys { keys }, &Value::Object(input));
            payload.push(issue);
        }
        payload.value = Value::Object(output);
        return;
    }

    for (name, value) in input {
        let mut key_payload = payload.fork(Value::String(name.clone()));
        run(key_schema, &mut key_payload, ctx);
        let key = if key_payload.issues.is_empty() {
            key_name(&key_payload.value)
        } else {
            let issues = finalize_all(key_payload.issues, &payload.path, ctx);
            let key = Value::String(name.clone());
            let kind = IssueKind::InvalidKey {
                key: key.clone(),
                issues,
            };
            let issue = node
                .issue(kind, &key)
                .with_path(vec![PathSegment::Key(name.clone())]);
            payload.push(issue);
            name.clone()
        };

        let mut child = payload.child(PathSegment::Key(name), value);
        run(value_schema, &mut child, ctx);
        output.insert(key, payload.absorb(child));
        if ctx.abort_early && !payload.issues.is_empty() {
            break;
        }
    }
    payload.value = Value::Object(output);
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
