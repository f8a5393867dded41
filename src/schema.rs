//! Schema nodes and the modifier surface shared by every schema kind.
//!
//! A [`Schema`] is an `Arc` around an immutable node: a [`Definition`] naming
//! the kind plus the [`Internals`] every kind carries (checks, coercion flag,
//! error hook, metadata, brand). Modifiers never touch a shared node; they
//! copy it and return a new schema, so existing holders keep their behaviour.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};

use crate::checks::{Check, RefineParams, RefinementCtx};
use crate::containers::ArraySchema;
use crate::context::{ErrorMap, ParseContext};
use crate::engine;
use crate::error::ValidationError;
use crate::function::FunctionDef;
use crate::issue::{IssueKind, RawIssue};
use crate::lazy::LazySchema;
use crate::merge;
use crate::object::ObjectDef;
use crate::pipe::{self, Predicate, TransformFn};
use crate::primitives::{EnumDef, NumberKind};
use crate::registry::Metadata;
use crate::union::{self, DiscriminatedDef};
use crate::value::Value;
use crate::wrappers::{self, CatchContext, CatchFallback, Fallback};

/// The kind of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    String,
    Number,
    BigInt,
    Bool,
    Nil,
    Any,
    Unknown,
    Never,
    Literal,
    Enum,
    Array,
    Tuple,
    Set,
    Map,
    Record,
    Object,
    Union,
    DiscriminatedUnion,
    ExclusiveUnion,
    Intersection,
    Lazy,
    Function,
    Pipe,
    Transform,
    Readonly,
    Optional,
    Nilable,
    Default,
    Prefault,
    Catch,
    Custom,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::BigInt => "bigint",
            SchemaKind::Bool => "boolean",
            SchemaKind::Nil => "null",
            SchemaKind::Any => "any",
            SchemaKind::Unknown => "unknown",
            SchemaKind::Never => "never",
            SchemaKind::Literal => "literal",
            SchemaKind::Enum => "enum",
            SchemaKind::Array => "array",
            SchemaKind::Tuple => "tuple",
            SchemaKind::Set => "set",
            SchemaKind::Map => "map",
            SchemaKind::Record => "record",
            SchemaKind::Object => "object",
            SchemaKind::Union => "union",
            SchemaKind::DiscriminatedUnion => "discriminated_union",
            SchemaKind::ExclusiveUnion => "exclusive_union",
            SchemaKind::Intersection => "intersection",
            SchemaKind::Lazy => "lazy",
            SchemaKind::Function => "function",
            SchemaKind::Pipe => "pipe",
            SchemaKind::Transform => "transform",
            SchemaKind::Readonly => "readonly",
            SchemaKind::Optional => "optional",
            SchemaKind::Nilable => "nilable",
            SchemaKind::Default => "default",
            SchemaKind::Prefault => "prefault",
            SchemaKind::Catch => "catch",
            SchemaKind::Custom => "custom",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SchemaKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Kind-specific part of a schema node.
#[derive(Clone)]
pub enum Definition {
    String,
    Number(NumberKind),
    BigInt,
    Bool,
    Nil,
    Any,
    Unknown,
    Never,
    Literal(Vec<Value>),
    Enum(EnumDef),
    Array(Schema),
    Tuple {
        items: Vec<Schema>,
        rest: Option<Schema>,
    },
    Set(Schema),
    Map {
        key: Schema,
        value: Schema,
    },
    Record {
        key: Schema,
        value: Schema,
    },
    Object(ObjectDef),
    Union(Vec<Schema>),
    DiscriminatedUnion(DiscriminatedDef),
    ExclusiveUnion(Vec<Schema>),
    Intersection(Schema, Schema),
    Lazy(LazySchema),
    Function(FunctionDef),
    Pipe(Schema, Schema),
    Transform(TransformFn),
    Readonly(Schema),
    Optional(Schema),
    Nilable(Schema),
    Default(Schema, Fallback),
    Prefault(Schema, Fallback),
    Catch(Schema, CatchFallback),
    Custom(Predicate),
}

impl Definition {
    pub fn kind(&self) -> SchemaKind {
        match self {
            Definition::String => SchemaKind::String,
            Definition::Number(_) => SchemaKind::Number,
            Definition::BigInt => SchemaKind::BigInt,
            Definition::Bool => SchemaKind::Bool,
            Definition::Nil => SchemaKind::Nil,
            Definition::Any => SchemaKind::Any,
            Definition::Unknown => SchemaKind::Unknown,
            Definition::Never => SchemaKind::Never,
            Definition::Literal(_) => SchemaKind::Literal,
            Definition::Enum(_) => SchemaKind::Enum,
            Definition::Array(_) => SchemaKind::Array,
            Definition::Tuple { .. } => SchemaKind::Tuple,
            Definition::Set(_) => SchemaKind::Set,
            Definition::Map { .. } => SchemaKind::Map,
            Definition::Record { .. } => SchemaKind::Record,
            Definition::Object(_) => SchemaKind::Object,
            Definition::Union(_) => SchemaKind::Union,
            Definition::DiscriminatedUnion(_) => SchemaKind::DiscriminatedUnion,
            Definition::ExclusiveUnion(_) => SchemaKind::ExclusiveUnion,
            Definition::Intersection(..) => SchemaKind::Intersection,
            Definition::Lazy(_) => SchemaKind::Lazy,
            Definition::Function(_) => SchemaKind::Function,
            Definition::Pipe(..) => SchemaKind::Pipe,
            Definition::Transform(_) => SchemaKind::Transform,
            Definition::Readonly(_) => SchemaKind::Readonly,
            Definition::Optional(_) => SchemaKind::Optional,
            Definition::Nilable(_) => SchemaKind::Nilable,
            Definition::Default(..) => SchemaKind::Default,
            Definition::Prefault(..) => SchemaKind::Prefault,
            Definition::Catch(..) => SchemaKind::Catch,
            Definition::Custom(_) => SchemaKind::Custom,
        }
    }
}

/// State shared by every schema kind.
#[derive(Clone, Default)]
pub(crate) struct Internals {
    pub checks: Vec<Check>,
    pub coerce: bool,
    pub error: Option<ErrorMap>,
    pub meta: Option<Arc<Metadata>>,
    pub brand: Option<String>,
}

#[derive(Clone)]
pub(crate) struct SchemaNode {
    pub def: Definition,
    pub internals: Internals,
}

impl SchemaNode {
    pub fn kind(&self) -> SchemaKind {
        self.def.kind()
    }

    /// A raw issue attributed to this node.
    pub fn issue(&self, kind: IssueKind, input: &Value) -> RawIssue {
        let mut issue = RawIssue::new(kind, Some(input.clone()));
        issue.origin = Some(self.kind());
        issue.schema_hook = self.internals.error.clone();
        issue
    }

    /// `invalid_type` for input of the wrong runtime kind.
    pub fn type_issue(&self, input: &Value) -> RawIssue {
        self.issue(IssueKind::invalid_type(self.expected(), input), input)
    }

    /// Name of the runtime kind this node expects.
    pub fn expected(&self) -> &'static str {
        match &self.def {
            Definition::Number(kind) => kind.name(),
            Definition::Record { .. } | Definition::DiscriminatedUnion(_) => "object",
            Definition::Tuple { .. } => "array",
            def => def.kind().as_str(),
        }
    }

    /// Kinds that reject `null` before any coercion or parsing.
    pub fn is_nil_gated(&self) -> bool {
        matches!(
            self.def,
            Definition::String
                | Definition::Number(_)
                | Definition::BigInt
                | Definition::Bool
                | Definition::Array(_)
                | Definition::Tuple { .. }
                | Definition::Set(_)
                | Definition::Map { .. }
                | Definition::Record { .. }
                | Definition::Object(_)
                | Definition::Function(_)
        )
    }
}

/// An immutable, cheaply clonable schema.
#[derive(Clone)]
pub struct Schema {
    node: Arc<SchemaNode>,
}

impl Schema {
    pub(crate) fn new(def: Definition) -> Self {
        Self {
            node: Arc::new(SchemaNode {
                def,
                internals: Internals::default(),
            }),
        }
    }

    pub(crate) fn node(&self) -> &SchemaNode {
        &self.node
    }

    /// Copy-on-write update; a node no one else holds is edited in place.
    pub(crate) fn modify(self, f: impl FnOnce(&mut SchemaNode)) -> Self {
        let mut node = Arc::try_unwrap(self.node).unwrap_or_else(|shared| (*shared).clone());
        f(&mut node);
        Self {
            node: Arc::new(node),
        }
    }

    /// Validate `input`, returning the parsed output.
    pub fn parse(&self, input: impl Into<Value>) -> Result<Value, ValidationError> {
        engine::parse(self, input.into(), &ParseContext::default())
    }

    pub fn parse_with(
        &self,
        input: impl Into<Value>,
        ctx: &ParseContext,
    ) -> Result<Value, ValidationError> {
        engine::parse(self, input.into(), ctx)
    }

    /// Like [`parse`](Self::parse), panicking with the first issue on failure.
    pub fn must_parse(&self, input: impl Into<Value>) -> Value {
        match self.parse(input) {
            Ok(value) => value,
            Err(err) => panic!("{}", err.first()),
        }
    }

    /// Parse, then deserialise the output into `T`.
    pub fn parse_into<T: DeserializeOwned>(
        &self,
        input: impl Into<Value>,
    ) -> Result<T, ValidationError> {
        let output = self.parse(input)?;
        serde_json::from_value(output.to_json()).map_err(|e| ValidationError::custom(e.to_string()))
    }

    /// Parse a Rust value and hand back the same type, so `Option<T>` in
    /// yields `Option<T>` out.
    pub fn parse_typed<T: Serialize + DeserializeOwned>(
        &self,
        input: &T,
    ) -> Result<T, ValidationError> {
        let input =
            Value::from_serialize(input).map_err(|e| ValidationError::custom(e.to_string()))?;
        self.parse_into(input)
    }

    pub fn kind(&self) -> SchemaKind {
        self.node.kind()
    }

    pub fn definition(&self) -> &Definition {
        &self.node.def
    }

    pub fn checks(&self) -> &[Check] {
        &self.node.internals.checks
    }

    pub fn is_coercing(&self) -> bool {
        self.node.internals.coerce
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.node.internals.meta.as_deref()
    }

    pub fn brand_tag(&self) -> Option<&str> {
        self.node.internals.brand.as_deref()
    }

    /// True when a missing object key is acceptable for this schema.
    pub fn is_optional(&self) -> bool {
        match &self.node.def {
            Definition::Optional(_) => true,
            Definition::Readonly(inner) => inner.is_optional(),
            _ => false,
        }
    }

    /// True when a missing key is left out of the output.
    pub(crate) fn omits_when_missing(&self) -> bool {
        match &self.node.def {
            Definition::Optional(_) | Definition::Any | Definition::Unknown => true,
            Definition::Readonly(inner) => inner.omits_when_missing(),
            _ => false,
        }
    }

    /// True when parsing a missing value yields a fallback.
    pub(crate) fn fills_missing(&self) -> bool {
        match &self.node.def {
            Definition::Default(..) | Definition::Prefault(..) => true,
            Definition::Readonly(inner) => inner.fills_missing(),
            _ => false,
        }
    }

    /// The wrapped schema of a wrapper kind.
    pub fn inner(&self) -> Option<&Schema> {
        match &self.node.def {
            Definition::Readonly(inner)
            | Definition::Optional(inner)
            | Definition::Nilable(inner)
            | Definition::Default(inner, _)
            | Definition::Prefault(inner, _)
            | Definition::Catch(inner, _) => Some(inner),
            _ => None,
        }
    }

    /// The finite set of values this schema accepts, when it has one.
    pub fn values(&self) -> Option<Vec<Value>> {
        match &self.node.def {
            Definition::Literal(values) => Some(values.clone()),
            Definition::Enum(def) => Some(def.values()),
            Definition::Nil => Some(vec![Value::Null]),
            Definition::Optional(inner) | Definition::Nilable(inner) => {
                let mut values = inner.values()?;
                if !values.contains(&Value::Null) {
                    values.push(Value::Null);
                }
                Some(values)
            }
            Definition::Readonly(inner)
            | Definition::Default(inner, _)
            | Definition::Prefault(inner, _)
            | Definition::Catch(inner, _)
            | Definition::Pipe(inner, _) => inner.values(),
            Definition::Lazy(lazy) => lazy.resolve().values(),
            _ => None,
        }
    }

    /// True when both handles point at the same node.
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("kind", &self.kind())
            .field("checks", &self.checks())
            .field("brand", &self.brand_tag())
            .finish_non_exhaustive()
    }
}

/// Modifiers common to every schema.
///
/// Methods returning `Self` keep the concrete builder type so kind-specific
/// checks can still be chained; wrapping methods return a plain [`Schema`].
pub trait SchemaType: Clone + Into<Schema> {
    fn schema(&self) -> &Schema;

    #[doc(hidden)]
    fn rebuild(schema: Schema) -> Self;

    /// Append a check.
    fn check(self, check: Check) -> Self {
        Self::rebuild(self.into().modify(|node| node.internals.checks.push(check)))
    }

    /// Fail with a `custom` issue when `pred` returns false.
    fn refine<F>(self, pred: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.refine_with(pred, RefineParams::default())
    }

    fn refine_with<F>(self, pred: F, params: RefineParams) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let abort = params.abort;
        let check = Check::custom(move |value, ctx| {
            if !pred(value) {
                ctx.add_issue(params.to_issue());
            }
        });
        self.check(if abort { check.abort() } else { check })
    }

    /// Refine against the value deserialised as `T`.
    fn refine_as<T, F>(self, pred: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.check(Check::custom(move |value, ctx| {
            match serde_json::from_value::<T>(value.to_json()) {
                Ok(typed) if pred(&typed) => {}
                Ok(_) => ctx.add_issue(RawIssue::new(IssueKind::custom(), None)),
                Err(err) => ctx.issue(format!("Invalid input: {}", err)),
            }
        }))
    }

    /// Inspect the value and report any number of issues.
    fn super_refine<F>(self, f: F) -> Self
    where
        F: Fn(&Value, &mut RefinementCtx<'_>) + Send + Sync + 'static,
    {
        self.check(Check::custom(f))
    }

    /// Message hook for issues raised by this schema and its checks.
    fn error<F>(self, map: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        let map: ErrorMap = Arc::new(map);
        Self::rebuild(self.into().modify(|node| node.internals.error = Some(map)))
    }

    fn message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.error(move |_| Some(message.clone()))
    }

    fn describe(self, meta: impl Into<Metadata>) -> Self {
        let meta = Arc::new(meta.into());
        Self::rebuild(self.into().modify(|node| node.internals.meta = Some(meta)))
    }

    /// Tag the schema; registries key brand metadata by this tag.
    fn brand(self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self::rebuild(self.into().modify(|node| node.internals.brand = Some(tag)))
    }

    /// Convert input to this kind before type checking.
    fn coerce(self) -> Self {
        Self::rebuild(self.into().modify(|node| node.internals.coerce = true))
    }

    fn optional(self) -> Schema {
        wrappers::optional(self)
    }

    fn nilable(self) -> Schema {
        wrappers::nilable(self)
    }

    fn nullish(self) -> Schema {
        wrappers::nullish(self)
    }

    fn readonly(self) -> Schema {
        wrappers::readonly(self)
    }

    /// Return `value` for `null` input without running this schema.
    fn default(self, value: impl Into<Value>) -> Schema {
        Schema::new(Definition::Default(self.into(), Fallback::Value(value.into())))
    }

    fn default_fn<F>(self, f: F) -> Schema
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Schema::new(Definition::Default(self.into(), Fallback::Thunk(Arc::new(f))))
    }

    /// Parse `value` in place of `null` input.
    fn prefault(self, value: impl Into<Value>) -> Schema {
        Schema::new(Definition::Prefault(self.into(), Fallback::Value(value.into())))
    }

    fn prefault_fn<F>(self, f: F) -> Schema
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Schema::new(Definition::Prefault(self.into(), Fallback::Thunk(Arc::new(f))))
    }

    /// Return `value` whenever parsing fails.
    fn catch(self, value: impl Into<Value>) -> Schema {
        Schema::new(Definition::Catch(self.into(), CatchFallback::Value(value.into())))
    }

    fn catch_fn<F>(self, f: F) -> Schema
    where
        F: Fn(&CatchContext) -> Value + Send + Sync + 'static,
    {
        Schema::new(Definition::Catch(self.into(), CatchFallback::Thunk(Arc::new(f))))
    }

    /// Map the parsed output.
    fn transform<F>(self, f: F) -> Schema
    where
        F: Fn(Value, &mut RefinementCtx<'_>) -> Value + Send + Sync + 'static,
    {
        pipe::pipe(self, pipe::transform(f))
    }

    /// Map the parsed output; an `Err` becomes a `custom` issue.
    fn try_transform<F, E>(self, f: F) -> Schema
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        pipe::pipe(self, pipe::try_transform(f))
    }

    /// Feed this schema's output into `next`.
    fn pipe(self, next: impl Into<Schema>) -> Schema {
        pipe::pipe(self, next)
    }

    fn or(self, other: impl Into<Schema>) -> Schema {
        union::union([self.into(), other.into()])
    }

    fn and(self, other: impl Into<Schema>) -> Schema {
        merge::intersection(self, other)
    }

    fn array(self) -> ArraySchema {
        crate::containers::array(self)
    }
}

impl SchemaType for Schema {
    fn schema(&self) -> &Schema {
        self
    }

    fn rebuild(schema: Schema) -> Self {
        schema
    }
}

/// Declares a typed builder around [`Schema`].
macro_rules! typed_schema {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name(pub(crate) $crate::schema::Schema);

        impl From<$name> for $crate::schema::Schema {
            fn from(schema: $name) -> Self {
                schema.0
            }
        }

        impl $crate::schema::SchemaType for $name {
            fn schema(&self) -> &$crate::schema::Schema {
                &self.0
            }

            fn rebuild(schema: $crate::schema::Schema) -> Self {
                $name(schema)
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::schema::Schema;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

pub(crate) use typed_schema;

/// Field map of an object schema.
pub type Shape = IndexMap<String, Schema>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{number, string};

    #[test]
    fn modifiers_leave_the_original_untouched() {
        let base = string();
        let bounded = base.clone().min(3);
        assert!(base.checks().is_empty());
        assert_eq!(bounded.checks().len(), 1);
        assert!(base.parse("hi").is_ok());
        assert!(bounded.parse("hi").is_err());
    }

    #[test]
    fn modify_copies_shared_nodes() {
        let base: Schema = number().into();
        let held = base.clone();
        let described = base.describe("a number");
        assert!(held.metadata().is_none());
        assert_eq!(
            described.metadata().and_then(|m| m.description.as_deref()),
            Some("a number")
        );
        assert!(!held.ptr_eq(&described));
    }

    #[test]
    fn optional_detection_sees_through_readonly() {
        assert!(string().optional().is_optional());
        assert!(string().optional().readonly().is_optional());
        assert!(!string().nilable().is_optional());
        assert!(!string().default("x").is_optional());
    }

    #[test]
    fn kinds_serialize_by_name() {
        let json = serde_json::to_value(SchemaKind::DiscriminatedUnion).unwrap();
        assert_eq!(json, "discriminated_union");
        assert_eq!(SchemaKind::Bool.to_string(), "boolean");
    }

    #[test]
    fn wrappers_expose_inner() {
        let wrapped = string().nullish();
        assert_eq!(wrapped.kind(), SchemaKind::Optional);
        let nilable = wrapped.inner().unwrap();
        assert_eq!(nilable.kind(), SchemaKind::Nilable);
        assert_eq!(nilable.inner().unwrap().kind(), SchemaKind::String);
    }
}
