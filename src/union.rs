//! Ordered, exclusive and discriminated unions.

use crate::context::ParseContext;
use crate::engine::{finalize_all, run};
use crate::error::SchemaError;
use crate::issue::{Issue, IssueKind, PathSegment};
use crate::payload::Payload;
use crate::schema::{Definition, Schema, SchemaNode};
use crate::value::Value;

/// Discriminator field, members and the value-to-member lookup built at
/// construction.
#[derive(Debug, Clone)]
pub struct DiscriminatedDef {
    pub field: String,
    pub options: Vec<Schema>,
    pub lookup: Vec<(Value, usize)>,
}

/// The first member to accept the input wins.
pub fn union<I, S>(options: I) -> Schema
where
    I: IntoIterator<Item = S>,
    S: Into<Schema>,
{
    Schema::new(Definition::Union(
        options.into_iter().map(Into::into).collect(),
    ))
}

/// Exactly one member may accept the input.
pub fn exclusive_union<I, S>(options: I) -> Schema
where
    I: IntoIterator<Item = S>,
    S: Into<Schema>,
{
    Schema::new(Definition::ExclusiveUnion(
        options.into_iter().map(Into::into).collect(),
    ))
}

/// A union of object schemas selected by the literal value at `field`.
///
/// Members may also be unions or discriminated unions on the same field.
pub fn discriminated_union<I, S>(
    field: impl Into<String>,
    options: I,
) -> Result<Schema, SchemaError>
where
    I: IntoIterator<Item = S>,
    S: Into<Schema>,
{
    let field = field.into();
    let options: Vec<Schema> = options.into_iter().map(Into::into).collect();
    let mut lookup: Vec<(Value, usize)> = Vec::new();

    for (index, option) in options.iter().enumerate() {
        let values = discriminator_values(option, &field, index)?;
        for value in values {
            if lookup.iter().any(|(existing, _)| *existing == value) {
                return Err(SchemaError::DuplicateDiscriminator {
                    discriminator: field,
                    value: value.to_string(),
                });
            }
            lookup.push((value, index));
        }
    }

    Ok(Schema::new(Definition::DiscriminatedUnion(DiscriminatedDef {
        field,
        options,
        lookup,
    })))
}

fn discriminator_values(
    option: &Schema,
    field: &str,
    index: usize,
) -> Result<Vec<Value>, SchemaError> {
    let missing = || SchemaError::MissingDiscriminator {
        discriminator: field.to_string(),
        index,
    };
    match option.definition() {
        Definition::Object(def) => def
            .shape
            .get(field)
            .and_then(Schema::values)
            .filter(|values| !values.is_empty())
            .ok_or_else(missing),
        Definition::DiscriminatedUnion(def) if def.field == field => {
            Ok(def.lookup.iter().map(|(value, _)| value.clone()).collect())
        }
        Definition::Union(members) => {
            let mut values = Vec::new();
            for member in members {
                values.extend(discriminator_values(member, field, index)?);
            }
            Ok(values)
        }
        Definition::Lazy(lazy) => discriminator_values(lazy.resolve(), field, index),
        _ => Err(SchemaError::NotAnObject {
            index,
            kind: option.kind(),
        }),
    }
}

pub(crate) fn parse_union(
    node: &SchemaNode,
    options: &[Schema],
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    let mut branches: Vec<Vec<Issue>> = Vec::with_capacity(options.len());
    for option in options {
        let mut fork = payload.fork(payload.value.clone());
        run(option, &mut fork, ctx);
        if fork.issues.is_empty() {
            payload.value = fork.value;
            return;
        }
        branches.push(finalize_all(fork.issues, &payload.path, ctx));
    }
    let issue = node.issue(
        IssueKind::InvalidUnion {
            branches,
            note: None,
            discriminator: None,
        },
        &payload.value,
    );
    payload.push(issue);
}

pub(crate) fn parse_exclusive(
    node: &SchemaNode,
    options: &[Schema],
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    let mut branches: Vec<Vec<Issue>> = Vec::new();
    let mut matched: Option<Value> = None;
    let mut matches = 0;
    for option in options {
        let mut fork = payload.fork(payload.value.clone());
        run(option, &mut fork, ctx);
        if fork.issues.is_empty() {
            matches += 1;
            if matched.is_none() {
                matched = Some(fork.value);
            }
        } else {
            branches.push(finalize_all(fork.issues, &payload.path, ctx));
        }
    }

    let kind = match (matches, matched) {
        (1, Some(value)) => {
            payload.value = value;
            return;
        }
        (0, _) => IssueKind::InvalidUnion {
            branches,
            note: None,
            discriminator: None,
        },
        _ => IssueKind::InvalidUnion {
            branches: Vec::new(),
            note: Some("input matched more than one branch".to_string()),
            discriminator: None,
        },
    };
    let issue = node.issue(kind, &payload.value);
    payload.push(issue);
}

pub(crate) fn parse_discriminated(
    node: &SchemaNode,
    def: &DiscriminatedDef,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    let Value::Object(input) = &payload.value else {
        let issue = node.type_issue(&payload.value);
        payload.push(issue);
        return;
    };
    let tag = input.get(&def.field).cloned().unwrap_or_default();
    match def.lookup.iter().find(|(value, _)| *value == tag) {
        Some((_, index)) => run(&def.options[*index], payload, ctx),
        None => {
            let issue = node
                .issue(
                    IssueKind::InvalidUnion {
                        branches: Vec::new(),
                        note: Some("no matching discriminator".to_string()),
                        discriminator: Some(def.field.clone()),
                    },
                    &tag,
                )
                .with_path(vec![PathSegment::Key(def.field.clone())]);
            payload.push(issue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueCode;
    use crate::object::object;
    use crate::primitives::{literal, literals, number, string};
    use crate::schema::SchemaKind;
    use serde_json::json;

    #[test]
    fn first_matching_branch_wins() {
        let s = union([Schema::from(string().trim()), number().into()]);
        assert_eq!(s.parse(" a ").unwrap(), Value::from("a"));
        assert_eq!(s.parse(2).unwrap(), Value::from(2));
    }

    #[test]
    fn failure_collects_every_branch() {
        let s = union([Schema::from(string()), number().into()]);
        let err = s.parse(true).unwrap_err();
        match &err.first().kind {
            IssueKind::InvalidUnion { branches, .. } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(branches[0][0].code(), IssueCode::InvalidType);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn exclusive_union_counts_matches() {
        let s = exclusive_union([Schema::from(string()), string().min(3).into()]);
        assert!(s.parse("ab").is_ok());
        let err = s.parse("abcd").unwrap_err();
        match &err.first().kind {
            IssueKind::InvalidUnion { note, branches, .. } => {
                assert!(branches.is_empty());
                assert!(note.is_some());
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(s.parse(1).is_err());
    }

    fn shapes() -> Schema {
        discriminated_union(
            "type",
            [
                object()
                    .field("type", literal("circle"))
                    .field("r", number()),
                object()
                    .field("type", literals(["square", "box"]))
                    .field("side", number()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn dispatches_on_discriminator() {
        assert!(shapes().parse(json!({ "type": "circle", "r": 1 })).is_ok());
        assert!(shapes().parse(json!({ "type": "box", "side": 2 })).is_ok());

        let err = shapes()
            .parse(json!({ "type": "circle", "side": 2 }))
            .unwrap_err();
        assert_eq!(err.first().path, vec![PathSegment::from("r")]);
    }

    #[test]
    fn unknown_discriminator() {
        let err = shapes().parse(json!({ "type": "hexagon" })).unwrap_err();
        let issue = err.first();
        assert_eq!(issue.code(), IssueCode::InvalidUnion);
        assert_eq!(issue.path, vec![PathSegment::from("type")]);
        match &issue.kind {
            IssueKind::InvalidUnion { discriminator, .. } => {
                assert_eq!(discriminator.as_deref(), Some("type"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        let err = shapes().parse("circle").unwrap_err();
        assert_eq!(err.first().code(), IssueCode::InvalidType);
    }

    #[test]
    fn nested_discriminated_unions() {
        let outer = discriminated_union(
            "type",
            [shapes(), object().field("type", literal("dot")).into()],
        )
        .unwrap();
        assert!(outer.parse(json!({ "type": "square", "side": 1 })).is_ok());
        assert!(outer.parse(json!({ "type": "dot" })).is_ok());
    }

    #[test]
    fn construction_errors() {
        let err = discriminated_union("type", [Schema::from(string())]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::NotAnObject {
                index: 0,
                kind: SchemaKind::String
            }
        );

        let err = discriminated_union("type", [object().field("kind", literal("a"))]).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MissingDiscriminator { index: 0, .. }
        ));

        let err = discriminated_union(
            "type",
            [
                object().field("type", literal("a")),
                object().field("type", literal("a")),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateDiscriminator { .. }));
    }
}
