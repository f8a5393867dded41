//! Intersections and the structural merge of their two outputs.

use thiserror::Error;

use crate::context::ParseContext;
use crate::engine::run;
use crate::issue::{IssueKind, PathSegment};
use crate::payload::Payload;
use crate::schema::{Definition, Schema, SchemaNode};
use crate::value::{Object, Value};

/// Why two values could not be merged, and where.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct MergeConflict {
    pub path: Vec<PathSegment>,
    pub reason: String,
}

impl MergeConflict {
    fn new(reason: String) -> Self {
        Self {
            path: Vec::new(),
            reason,
        }
    }

    fn at(mut self, segment: PathSegment) -> Self {
        self.path.insert(0, segment);
        self
    }
}

/// Input must satisfy both schemas; the outputs are merged.
pub fn intersection(left: impl Into<Schema>, right: impl Into<Schema>) -> Schema {
    Schema::new(Definition::Intersection(left.into(), right.into()))
}

/// Merge two parsed values.
///
/// `null` yields the other side and deep-equal values yield the left one.
/// Objects and maps merge key-wise, arrays element-wise at equal length.
/// Anything else conflicts.
pub fn merge_values(left: Value, right: Value) -> Result<Value, MergeConflict> {
    match (left, right) {
        (Value::Null, other) | (other, Value::Null) => Ok(other),
        (left, right) if left == right => Ok(left),
        (Value::Object(left), Value::Object(right)) => {
            merge_objects(left, right).map(Value::Object)
        }
        (Value::Map(left), Value::Map(right)) => merge_maps(left, right).map(Value::Map),
        (Value::Array(left), Value::Array(right)) => {
            if left.len() != right.len() {
                return Err(MergeConflict::new(format!(
                    "array lengths differ ({} and {})",
                    left.len(),
                    right.len()
                )));
            }
            left.into_iter()
                .zip(right)
                .enumerate()
                .map(|(index, (l, r))| {
                    merge_values(l, r).map_err(|conflict| conflict.at(PathSegment::Index(index)))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        (left, right) if left.type_name() != right.type_name() => Err(MergeConflict::new(format!(
            "incompatible types {} and {}",
            left.type_name(),
            right.type_name()
        ))),
        (left, right) => Err(MergeConflict::new(format!(
            "conflicting values {} and {}",
            left, right
        ))),
    }
}

fn merge_objects(mut left: Object, right: Object) -> Result<Object, MergeConflict> {
    for (key, value) in right {
        match left.get_mut(&key) {
            Some(slot) => {
                let existing = std::mem::take(slot);
                *slot = merge_values(existing, value)
                    .map_err(|conflict| conflict.at(PathSegment::Key(key.clone())))?;
            }
            None => {
                left.insert(key, value);
            }
        }
    }
    Ok(left)
}

fn merge_maps(
    mut left: Vec<(Value, Value)>,
    right: Vec<(Value, Value)>) -> Result<Vec<(Value, Value,
)>, MergeConflict> {
    for (key, value) in right {
        match left.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => {
                let existing = std::mem::take(&mut slot.1);
                slot.1 = merge_values(existing, value)
                    .map_err(|conflict| conflict.at(PathSegment::from_value(&key)))?;
            }
            None => left.push((key, value)),
        }
    }
    Ok(left)
}

pub(crate) fn parse_intersection(
    node: &SchemaNode,
    left: &Schema,
    right: &Schema,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    let input = payload.value.clone();
    let mut left_payload = payload.fork(input.clone());
    run(left, &mut left_payload, ctx);
    let mut right_payload = payload.fork(input.clone());
    run(right, &mut right_payload, ctx);

    let failed = !left_payload.issues.is_empty() || !right_payload.issues.is_empty();
    let left_value = payload.absorb(left_payload);
    let right_value = payload.absorb(right_payload);
    if failed {
        return;
    }

    match merge_values(left_value, right_value) {
        Ok(value) => payload.value = value,
        Err(conflict) => {
            let issue = node.issue(
                IssueKind::InvalidIntersection {
                    reason: conflict.reason,
                    merge_path: conflict.path,
                },
                &input,
            );
            payload.push(issue);
        }
    }
}
