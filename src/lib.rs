//! Shapeguard
//!
//! Runtime validation and shape transformation of untyped data.
//!
//! Build a [`Schema`] describing the expected value, then parse input against
//! it. A successful parse returns the (possibly transformed) output value; a
//! failed one returns a [`ValidationError`] listing every issue with its path.
//!
//! # Example
//!
//! ```
//! use shapeguard::prelude::*;
//! use serde_json::json;
//!
//! let user = object()
//!     .field("name", string().trim().min(1))
//!     .field("age", int().gte(0))
//!     .field("email", string().email().optional())
//!     .strict();
//!
//! let parsed = user.parse(json!({ "name": "  Ada ", "age": 36 })).unwrap();
//! assert_eq!(parsed.get("name"), Some(&Value::from("Ada")));
//!
//! let err = user.parse(json!({ "name": "Ada", "age": -1, "extra": true })).unwrap_err();
//! assert_eq!(err.len(), 2);
//! assert_eq!(err.issues()[0].pointer(), "/age");
//! ```
//!
//! # Unknown keys
//!
//! | Mode | Unknown keys in output | Issue |
//! |------|------------------------|-------|
//! | `strip` (default) | dropped | none |
//! | `strict` | n/a | `unrecognised_keys` |
//! | `passthrough` | kept as-is | none |
//! | `catchall(s)` | parsed by `s` | from `s` |
//!
//! # Messages
//!
//! Issue messages resolve through, in order: a message set on the check or
//! refinement, the schema's error hook, the [`ParseContext`] error map, the
//! process-wide map in [`config`], a registered locale, then the built-in
//! English default.

mod checks;
mod coerce;
pub mod config;
mod containers;
mod context;
mod engine;
mod error;
mod formats;
mod function;
mod issue;
mod lazy;
mod merge;
mod messages;
mod object;
mod payload;
mod pipe;
mod primitives;
mod registry;
mod schema;
mod union;
mod value;
mod wrappers;

pub use checks::{
    Check, CheckFn, CheckKind, CustomCheck, RefineParams, RefinementCtx, MAX_SAFE_INTEGER,
};
pub use containers::{
    array, map, record, set, tuple, ArraySchema, MapSchema, RecordSchema, SetSchema, TupleSchema,
};
pub use context::{ErrorMap, ParseContext, ReportFormat};
pub use error::{ErrorTree, FlattenedError, SchemaError, ValidationError};
pub use formats::StringFormat;
pub use function::{function, FunctionDef, FunctionSchema};
pub use issue::{dotted_path, json_pointer, Issue, IssueCode, IssueKind, PathSegment, RawIssue};
pub use lazy::{lazy, LazySchema};
pub use merge::{intersection, merge_values, MergeConflict};
pub use object::{object, ObjectDef, ObjectSchema, UnknownKeys};
pub use pipe::{custom, pipe, transform, try_transform, Predicate, TransformFn};
pub use primitives::{
    any, bigint, boolean, enumeration, float32, float64, int, int16, int32, int64, int8, literal,
    literals, native_enum, never, nil, number, number_of, string, uint16, uint32, uint64, uint8,
    unknown, BigIntSchema, EnumDef, EnumSchema, NumberKind, NumberSchema, StringSchema,
};
pub use registry::{global_registry, Metadata, Registry};
pub use schema::{Definition, Schema, SchemaKind, SchemaType, Shape};
pub use union::{discriminated_union, exclusive_union, union, DiscriminatedDef};
pub use value::{Callable, Number, Object, Value};
pub use wrappers::{
    nilable, nullish, optional, readonly, CatchContext, CatchFallback, Fallback,
};

/// The constructors and traits most schemas need.
pub mod prelude {
    pub use crate::{
        any, array, bigint, boolean, custom, discriminated_union, enumeration, exclusive_union,
        float32, float64, function, int, intersection, lazy, literal, literals, map, native_enum,
        never, nil, nilable, nullish, number, object, optional, pipe, readonly, record, set,
        string, transform, tuple, union, unknown, Check, ParseContext, RefineParams, Schema,
        SchemaType, ValidationError, Value,
    };
}
