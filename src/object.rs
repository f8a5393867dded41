//! Object schemas: a fixed shape plus a policy for keys outside it.

use crate::context::ParseContext;
use crate::engine::run;
use crate::error::SchemaError;
use crate::issue::{IssueKind, PathSegment};
use crate::payload::Payload;
use crate::primitives::{enumeration, EnumSchema};
use crate::schema::{typed_schema, Definition, Schema, SchemaNode, SchemaType, Shape};
use crate::value::{Object, Value};
use crate::wrappers;

/// What to do with input keys the shape does not declare.
#[derive(Debug, Clone, Default)]
pub enum UnknownKeys {
    /// Drop them from the output.
    #[default]
    Strip,
    /// Report them as `unrecognised_keys`.
    Strict,
    /// Copy them to the output unchanged.
    Passthrough,
    /// Validate their values against a schema.
    Catchall(Schema),
}

#[derive(Debug, Clone, Default)]
pub struct ObjectDef {
    pub shape: Shape,
    pub unknown_keys: UnknownKeys,
}

typed_schema!(
    /// An object schema. Shape-changing operators build a fresh schema and do
    /// not carry over checks.
    ObjectSchema
);

pub fn object() -> ObjectSchema {
    ObjectSchema(Schema::new(Definition::Object(ObjectDef::default())))
}

impl ObjectSchema {
    fn def(&self) -> &ObjectDef {
        match self.definition() {
            Definition::Object(def) => def,
            _ => unreachable!("ObjectSchema always wraps an object definition"),
        }
    }

    fn reshape(&self, f: impl FnOnce(&mut ObjectDef)) -> ObjectSchema {
        let mut def = self.def().clone();
        f(&mut def);
        ObjectSchema(Schema::new(Definition::Object(def)))
    }

    fn with_mode(self, mode: UnknownKeys) -> ObjectSchema {
        ObjectSchema(self.0.modify(|node| {
            if let Definition::Object(def) = &mut node.def {
                def.unknown_keys = mode;
            }
        }))
    }

    fn known_keys<I, S>(&self, keys: I) -> Result<Vec<String>, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keys.into_iter()
            .map(|key| {
                let key = key.as_ref();
                if self.def().shape.contains_key(key) {
                    Ok(key.to_string())
                } else {
                    Err(SchemaError::UnknownKey {
                        key: key.to_string(),
                    })
                }
            })
            .collect()
    }

    /// Add or replace a field.
    pub fn field(self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        let (name, schema) = (name.into(), schema.into());
        ObjectSchema(self.0.modify(|node| {
            if let Definition::Object(def) = &mut node.def {
                def.shape.insert(name, schema);
            }
        }))
    }

    pub fn shape(&self) -> &Shape {
        &self.def().shape
    }

    pub fn keys(&self) -> Vec<&str> {
        self.shape().keys().map(String::as_str).collect()
    }

    pub fn unknown_keys(&self) -> &UnknownKeys {
        &self.def().unknown_keys
    }

    pub fn strict(self) -> Self {
        self.with_mode(UnknownKeys::Strict)
    }

    pub fn strip(self) -> Self {
        self.with_mode(UnknownKeys::Strip)
    }

    pub fn passthrough(self) -> Self {
        self.with_mode(UnknownKeys::Passthrough)
    }

    pub fn catchall(self, schema: impl Into<Schema>) -> Self {
        self.with_mode(UnknownKeys::Catchall(schema.into()))
    }

    /// Keep only the named fields.
    pub fn pick<I, S>(&self, keys: I) -> Result<ObjectSchema, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = self.known_keys(keys)?;
        Ok(self.reshape(|def| def.shape.retain(|name, _| keys.contains(name))))
    }

    /// Drop the named fields.
    pub fn omit<I, S>(&self, keys: I) -> Result<ObjectSchema, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = self.known_keys(keys)?;
        Ok(self.reshape(|def| def.shape.retain(|name, _| !keys.contains(name))))
    }

    /// Make every field optional.
    pub fn partial(&self) -> ObjectSchema {
        self.reshape(|def| {
            for field in def.shape.values_mut() {
                *field = make_optional(field);
            }
        })
    }

    pub fn partial_keys<I, S>(&self, keys: I) -> Result<ObjectSchema, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = self.known_keys(keys)?;
        Ok(self.reshape(|def| {
            for (name, field) in def.shape.iter_mut() {
                if keys.contains(name) {
                    *field = make_optional(field);
                }
            }
        }))
    }

    /// Remove an outer `optional` from every field.
    pub fn required(&self) -> ObjectSchema {
        self.reshape(|def| {
            for field in def.shape.values_mut() {
                *field = make_required(field);
            }
        })
    }

    pub fn required_keys<I, S>(&self, keys: I) -> Result<ObjectSchema, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = self.known_keys(keys)?;
        Ok(self.reshape(|def| {
            for (name, field) in def.shape.iter_mut() {
                if keys.contains(name) {
                    *field = make_required(field);
                }
            }
        }))
    }

    /// Add fields; a repeated name replaces the existing field in place.
    pub fn extend<I, K, S>(&self, fields: I) -> ObjectSchema
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Schema>,
    {
        let fields: Vec<(String, Schema)> = fields
            .into_iter()
            .map(|(name, schema)| (name.into(), schema.into()))
            .collect();
        self.reshape(|def| def.shape.extend(fields))
    }

    /// Extend with `other`'s fields; `other`'s unknown-key mode wins.
    pub fn merge(&self, other: &ObjectSchema) -> ObjectSchema {
        let other = other.def().clone();
        self.reshape(|def| {
            def.shape.extend(other.shape);
            def.unknown_keys = other.unknown_keys;
        })
    }

    /// An enum over the field names.
    pub fn key_of(&self) -> EnumSchema {
        enumeration(self.shape().keys().cloned())
    }
}

fn make_optional(field: &Schema) -> Schema {
    if field.is_optional() {
        field.clone()
    } else {
        wrappers::optional(field.clone())
    }
}

fn make_required(field: &Schema) -> Schema {
    match field.definition() {
        Definition::Optional(inner) => inner.clone(),
        _ => field.clone(),
    }
}

pub(crate) fn parse_object(
    node: &SchemaNode,
    def: &ObjectDef,
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

    let mut output = Object::with_capacity(def.shape.len());
    for (name, field) in &def.shape {
        let value = match input.shift_remove(name) {
            Some(value) => value,
            None if field.omits_when_missing() => continue,
            None => Value::Null,
        };
        let mut child = payload.child(PathSegment::Key(name.clone()), value);
        run(field, &mut child, ctx);
        output.insert(name.clone(), payload.absorb(child));
        if ctx.abort_early && !payload.issues.is_empty() {
            payload.value = Value::Object(output);
            return;
        }
    }

    match (&def.unknown_keys, ctx.strict) {
        (UnknownKeys::Strict, _) | (UnknownKeys::Strip, true) => {
            if !input.is_empty() {
                let keys = input.keys().cloned().collect();
                let issue = node.issue(IssueKind::UnrecognisedKeys { keys }, &Value::Object(input));
                payload.push(issue);
            }
        }
        (UnknownKeys::Strip, false) => {}
        (UnknownKeys::Passthrough, _) => output.extend(input),
        (UnknownKeys::Catchall(schema), _) => {
            for (name, value) in input {
                let mut child = payload.child(PathSegment::Key(name.clone()), value);
                run(schema, &mut child, ctx);
                output.insert(name, payload.absorb(child));
                if ctx.abort_early && !payload.issues.is_empty() {
                    break;
                }
            }
        }
    }
    payload.value = Value::Object(output);
}
