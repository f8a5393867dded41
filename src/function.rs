//! Function schemas: validated arguments in, validated return value out.

use crate::containers::tuple;
use crate::context::ParseContext;
use crate::engine;
use crate::error::ValidationError;
use crate::payload::Payload;
use crate::schema::{typed_schema, Definition, Schema, SchemaNode};
use crate::value::{Callable, Value};

#[derive(Debug, Clone, Default)]
pub struct FunctionDef {
    /// Tuple schema for the argument list.
    pub args: Option<Schema>,
    pub returns: Option<Schema>,
}

impl FunctionDef {
    /// Wrap `inner` so every call validates its arguments and return value.
    fn wrap(&self, inner: Callable, ctx: ParseContext) -> Callable {
        let def = self.clone();
        Callable::fallible(move |args: &[Value]| {
            let args = match &def.args {
                Some(schema) => match engine::parse(schema, Value::Array(args.to_vec()), &ctx)? {
                    Value::Array(items) => items,
                    other => vec![other],
                },
                None => args.to_vec(),
            };
            let output = inner.call(&args)?;
            match &def.returns {
                Some(schema) => engine::parse(schema, output, &ctx),
                None => Ok(output),
            }
        })
    }
}

typed_schema!(FunctionSchema);

pub fn function() -> FunctionSchema {
    FunctionSchema(Schema::new(Definition::Function(FunctionDef::default())))
}

impl FunctionSchema {
    fn def(&self) -> &FunctionDef {
        match self.definition() {
            Definition::Function(def) => def,
            _ => unreachable!("FunctionSchema always wraps a function definition"),
        }
    }

    fn with_def(self, f: impl FnOnce(&mut FunctionDef)) -> Self {
        Self(self.0.modify(|node| {
            if let Definition::Function(def) = &mut node.def {
                f(def);
            }
        }))
    }

    /// Positional argument schemas.
    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Schema>,
    {
        let args: Schema = tuple(args).into();
        self.with_def(|def| def.args = Some(args))
    }

    pub fn returns(self, schema: impl Into<Schema>) -> Self {
        let schema = schema.into();
        self.with_def(|def| def.returns = Some(schema))
    }

    pub fn parameters(&self) -> Option<&Schema> {
        self.def().args.as_ref()
    }

    pub fn return_type(&self) -> Option<&Schema> {
        self.def().returns.as_ref()
    }

    /// A callable running `f` behind this schema's validation.
    pub fn implement<F>(&self, f: F) -> Callable
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.def().wrap(Callable::new(f), ParseContext::default())
    }

    pub fn implement_fallible<F>(&self, f: F) -> Callable
    where
        F: Fn(&[Value]) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        self.def()
            .wrap(Callable::fallible(f), ParseContext::default())
    }
}

/// A function input is replaced by a validating wrapper; the wrapper checks
/// each call under the context of the parse that produced it.
pub(crate) fn parse_function(
    node: &SchemaNode,
    def: &FunctionDef,
    payload: &mut Payload,
    ctx: &ParseContext,
) {
    match &payload.value {
        Value::Function(inner) => {
            let wrapped = def.wrap(inner.clone(), ctx.clone());
            payload.value = Value::Function(wrapped);
        }
        other => {
            let issue = node.type_issue(other);
            payload.push(issue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueCode;
    use crate::primitives::{number, string};

    fn add() -> FunctionSchema {
        function().args([number(), number()]).returns(number())
    }

    #[test]
    fn implement_validates_arguments() {
        let sum = add().implement(|args| {
            Value::from(args.iter().filter_map(Value::as_f64).sum::<f64>())
        });
        let out = sum.call(&[Value::from(1), Value::from(2)]).unwrap();
        assert_eq!(out, Value::from(3));

        let err = sum.call(&[Value::from(1), Value::from("2")]).unwrap_err();
        assert_eq!(err.first().pointer(), "/1");
    }

    #[test]
    fn implement_validates_return_value() {
        let broken = add().implement(|_| Value::from("three"));
        let err = broken.call(&[Value::from(1), Value::from(2)]).unwrap_err();
        assert_eq!(err.first().code(), IssueCode::InvalidType);
    }

    #[test]
    fn parsing_a_function_wraps_it() {
        let raw = Callable::new(|args| args.first().cloned().unwrap_or_default());
        let schema = function().args([string()]).returns(string());
        let parsed = schema.parse(raw.clone()).unwrap();
        let Value::Function(wrapped) = parsed else {
            panic!("expected a function");
        };
        assert!(!wrapped.ptr_eq(&raw));
        assert_eq!(wrapped.call(&[Value::from("x")]).unwrap(), Value::from("x"));
        assert!(wrapped.call(&[Value::from(1)]).is_err());
        assert!(schema.parse(1).is_err());
    }
}
