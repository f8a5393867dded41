//! Scalar schemas: strings, numbers, bigints, booleans, null, the top and
//! bottom types, literals and enums.

use regex::Regex;

use crate::checks::{non_number, Check, CheckKind, MAX_SAFE_INTEGER};
use crate::error::SchemaError;
use crate::formats::StringFormat;
use crate::issue::IssueKind;
use crate::payload::Payload;
use crate::schema::{typed_schema, Definition, Schema, SchemaNode, SchemaType};
use crate::value::{Number, Value};

/// Numeric sub-kind: float width or integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Float64,
    Float32,
    /// Integers within `±(2^53 - 1)`.
    SafeInt,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
}

impl NumberKind {
    pub fn name(&self) -> &'static str {
        match self {
            NumberKind::Float64 => "number",
            NumberKind::Float32 => "float32",
            NumberKind::SafeInt => "int",
            NumberKind::Int8 => "int8",
            NumberKind::Int16 => "int16",
            NumberKind::Int32 => "int32",
            NumberKind::Int64 => "int64",
            NumberKind::Uint8 => "uint8",
            NumberKind::Uint16 => "uint16",
            NumberKind::Uint32 => "uint32",
            NumberKind::Uint64 => "uint64",
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, NumberKind::Float64 | NumberKind::Float32)
    }

    /// Inclusive range enforced on finite values.
    pub fn bounds(&self) -> Option<(Number, Number)> {
        let int = |min: i128, max: i128| Some((Number::Int(min), Number::Int(max)));
        match self {
            NumberKind::Float64 => None,
            NumberKind::Float32 => Some((
                Number::Float(-(f32::MAX as f64)),
                Number::Float(f32::MAX as f64),
            )),
            NumberKind::SafeInt => int(-MAX_SAFE_INTEGER, MAX_SAFE_INTEGER),
            NumberKind::Int8 => int(i8::MIN.into(), i8::MAX.into()),
            NumberKind::Int16 => int(i16::MIN.into(), i16::MAX.into()),
            NumberKind::Int32 => int(i32::MIN.into(), i32::MAX.into()),
            NumberKind::Int64 => int(i64::MIN.into(), i64::MAX.into()),
            NumberKind::Uint8 => int(0, u8::MAX.into()),
            NumberKind::Uint16 => int(0, u16::MAX.into()),
            NumberKind::Uint32 => int(0, u32::MAX.into()),
            NumberKind::Uint64 => int(0, u64::MAX.into()),
        }
    }
}

/// Named options of an enum schema.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub entries: Vec<(String, Value)>,
}

impl EnumDef {
    pub fn values(&self) -> Vec<Value> {
        self.entries
            .iter()
            .map(|(_, value)| value.clone())
            .collect()
    }
}

typed_schema!(
    /// A string schema with length, format and rewrite checks.
    StringSchema
);
typed_schema!(NumberSchema);
typed_schema!(BigIntSchema);
typed_schema!(EnumSchema);

pub fn string() -> StringSchema {
    StringSchema(Schema::new(Definition::String))
}

/// A 64-bit float, infinities included.
pub fn number() -> NumberSchema {
    number_of(NumberKind::Float64)
}

pub fn float64() -> NumberSchema {
    number_of(NumberKind::Float64)
}

/// A float that must fit in 32 bits.
pub fn float32() -> NumberSchema {
    number_of(NumberKind::Float32)
}

/// A safe integer.
pub fn int() -> NumberSchema {
    number_of(NumberKind::SafeInt)
}

pub fn int8() -> NumberSchema {
    number_of(NumberKind::Int8)
}

pub fn int16() -> NumberSchema {
    number_of(NumberKind::Int16)
}

pub fn int32() -> NumberSchema {
    number_of(NumberKind::Int32)
}

pub fn int64() -> NumberSchema {
    number_of(NumberKind::Int64)
}

pub fn uint8() -> NumberSchema {
    number_of(NumberKind::Uint8)
}

pub fn uint16() -> NumberSchema {
    number_of(NumberKind::Uint16)
}

pub fn uint32() -> NumberSchema {
    number_of(NumberKind::Uint32)
}

pub fn uint64() -> NumberSchema {
    number_of(NumberKind::Uint64)
}

pub fn number_of(kind: NumberKind) -> NumberSchema {
    NumberSchema(Schema::new(Definition::Number(kind)))
}

pub fn bigint() -> BigIntSchema {
    BigIntSchema(Schema::new(Definition::BigInt))
}

pub fn boolean() -> Schema {
    Schema::new(Definition::Bool)
}

/// Accepts only `null`.
pub fn nil() -> Schema {
    Schema::new(Definition::Nil)
}

pub fn any() -> Schema {
    Schema::new(Definition::Any)
}

pub fn unknown() -> Schema {
    Schema::new(Definition::Unknown)
}

/// Rejects every input.
pub fn never() -> Schema {
    Schema::new(Definition::Never)
}

pub fn literal(value: impl Into<Value>) -> Schema {
    Schema::new(Definition::Literal(vec![value.into()]))
}

/// A literal admitting any of `values`.
pub fn literals<I, V>(values: I) -> Schema
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Schema::new(Definition::Literal(
        values.into_iter().map(Into::into).collect(),
    ))
}

/// An enum over plain values; each option is named after its value.
pub fn enumeration<I, V>(values: I) -> EnumSchema
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let entries = values
        .into_iter()
        .map(|value| {
            let value = value.into();
            let name = match &value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name, value)
        })
        .collect();
    enum_of(entries)
}

/// An enum over named values, e.g. `[("Red", 0), ("Green", 1)]`.
pub fn native_enum<I, K, V>(entries: I) -> EnumSchema
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    enum_of(
        entries
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect(),
    )
}

fn enum_of(entries: Vec<(String, Value)>) -> EnumSchema {
    EnumSchema(Schema::new(Definition::Enum(EnumDef { entries })))
}

impl StringSchema {
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

    pub fn email(self) -> Self {
        self.format(StringFormat::Email)
    }

    pub fn url(self) -> Self {
        self.format(StringFormat::Url)
    }

    pub fn uuid(self) -> Self {
        self.format(StringFormat::Uuid)
    }

    pub fn ipv4(self) -> Self {
        self.format(StringFormat::Ipv4)
    }

    pub fn ipv6(self) -> Self {
        self.format(StringFormat::Ipv6)
    }

    pub fn date(self) -> Self {
        self.format(StringFormat::IsoDate)
    }

    pub fn time(self) -> Self {
        self.format(StringFormat::IsoTime)
    }

    /// ISO 8601 datetime in UTC (`Z` suffix).
    pub fn datetime(self) -> Self {
        self.datetime_with(false, false)
    }

    /// ISO 8601 datetime; `offset` admits `±HH:MM`, `local` admits no zone.
    pub fn datetime_with(self, offset: bool, local: bool) -> Self {
        self.format(StringFormat::IsoDateTime { offset, local })
    }

    pub fn duration(self) -> Self {
        self.format(StringFormat::IsoDuration)
    }

    pub fn format(self, format: StringFormat) -> Self {
        self.check(Check::format(format))
    }

    pub fn regex(self, regex: Regex) -> Self {
        self.check(Check::regex(regex))
    }

    pub fn starts_with(self, prefix: impl Into<String>) -> Self {
        self.check(Check::new(CheckKind::StartsWith(prefix.into())))
    }

    pub fn ends_with(self, suffix: impl Into<String>) -> Self {
        self.check(Check::new(CheckKind::EndsWith(suffix.into())))
    }

    pub fn includes(self, needle: impl Into<String>) -> Self {
        self.check(Check::new(CheckKind::Includes(needle.into())))
    }

    pub fn trim(self) -> Self {
        self.check(Check::new(CheckKind::Trim))
    }

    pub fn to_lower(self) -> Self {
        self.check(Check::new(CheckKind::ToLowercase))
    }

    pub fn to_upper(self) -> Self {
        self.check(Check::new(CheckKind::ToUppercase))
    }
}

impl NumberSchema {
    pub fn number_kind(&self) -> NumberKind {
        match self.definition() {
            Definition::Number(kind) => *kind,
            _ => unreachable!("NumberSchema always wraps a number definition"),
        }
    }

    pub fn gt(self, value: impl Into<Number>) -> Self {
        self.check(Check::gt(value))
    }

    pub fn gte(self, value: impl Into<Number>) -> Self {
        self.check(Check::gte(value))
    }

    pub fn min(self, value: impl Into<Number>) -> Self {
        self.gte(value)
    }

    pub fn lt(self, value: impl Into<Number>) -> Self {
        self.check(Check::lt(value))
    }

    pub fn lte(self, value: impl Into<Number>) -> Self {
        self.check(Check::lte(value))
    }

    pub fn max(self, value: impl Into<Number>) -> Self {
        self.lte(value)
    }

    pub fn positive(self) -> Self {
        self.gt(0)
    }

    pub fn negative(self) -> Self {
        self.lt(0)
    }

    pub fn non_negative(self) -> Self {
        self.gte(0)
    }

    pub fn non_positive(self) -> Self {
        self.lte(0)
    }

    pub fn multiple_of(self, divisor: impl Into<Number>) -> Self {
        self.check(Check::multiple_of(divisor))
    }

    pub fn finite(self) -> Self {
        self.check(Check::new(CheckKind::Finite))
    }

    pub fn int(self) -> Self {
        self.check(Check::new(CheckKind::Int))
    }

    pub fn safe_int(self) -> Self {
        self.check(Check::new(CheckKind::SafeInt))
    }
}

impl BigIntSchema {
    pub fn gt(self, value: impl Into<Number>) -> Self {
        self.check(Check::gt(value))
    }

    pub fn gte(self, value: impl Into<Number>) -> Self {
        self.check(Check::gte(value))
    }

    pub fn min(self, value: impl Into<Number>) -> Self {
        self.gte(value)
    }

    pub fn lt(self, value: impl Into<Number>) -> Self {
        self.check(Check::lt(value))
    }

    pub fn lte(self, value: impl Into<Number>) -> Self {
        self.check(Check::lte(value))
    }

    pub fn max(self, value: impl Into<Number>) -> Self {
        self.lte(value)
    }

    pub fn positive(self) -> Self {
        self.gt(0)
    }

    pub fn negative(self) -> Self {
        self.lt(0)
    }

    pub fn non_negative(self) -> Self {
        self.gte(0)
    }

    pub fn non_positive(self) -> Self {
        self.lte(0)
    }

    pub fn multiple_of(self, divisor: impl Into<Number>) -> Self {
        self.check(Check::multiple_of(divisor))
    }
}

impl EnumSchema {
    fn def(&self) -> &EnumDef {
        match self.definition() {
            Definition::Enum(def) => def,
            _ => unreachable!("EnumSchema always wraps an enum definition"),
        }
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.def().entries
    }

    pub fn options(&self) -> Vec<Value> {
        self.def().values()
    }

    /// The value of the option called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries()
            .iter()
            .find(|(option, _)| option == name)
            .map(|(_, value)| value)
    }

    /// A new enum keeping only the named options.
    pub fn extract<I, S>(&self, names: I) -> Result<EnumSchema, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = self.known_names(names)?;
        Ok(enum_of(
            self.entries()
                .iter()
                .filter(|(name, _)| names.contains(name))
                .cloned()
                .collect(),
        ))
    }

    /// A new enum without the named options.
    pub fn exclude<I, S>(&self, names: I) -> Result<EnumSchema, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = self.known_names(names)?;
        Ok(enum_of(
            self.entries()
                .iter()
                .filter(|(name, _)| !names.contains(name))
                .cloned()
                .collect(),
        ))
    }

    fn known_names<I, S>(&self, names: I) -> Result<Vec<String>, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                match self.get(name) {
                    Some(_) => Ok(name.to_string()),
                    None => Err(SchemaError::UnknownOption {
                        name: name.to_string(),
                    }),
                }
            })
            .collect()
    }
}

pub(crate) fn parse_string(node: &SchemaNode, payload: &mut Payload) {
    if !matches!(payload.value, Value::String(_)) {
        let issue = node.type_issue(&payload.value);
        payload.push(issue);
    }
}

pub(crate) fn parse_number(node: &SchemaNode, kind: NumberKind, payload: &mut Payload) {
    let n = match payload.value {
        Value::Number(n) => n,
        _ => {
            let issue = node.type_issue(&payload.value);
            payload.push(issue);
            return;
        }
    };
    if n.is_nan() || (kind.is_integer() && !n.is_integer()) {
        let issue = node.issue(non_number(kind.name(), n), &payload.value);
        payload.push(issue);
        return;
    }
    let n = match n.as_i128() {
        Some(i) if kind.is_integer() => Number::Int(i),
        _ => n,
    };
    payload.value = Value::Number(n);

    let Some((min, max)) = kind.bounds() else {
        return;
    };
    if !n.is_finite() {
        return;
    }
    let kind = if n < min {
        IssueKind::TooSmall {
            minimum: min,
            inclusive: true,
            exact: false,
        }
    } else if n > max {
        IssueKind::TooBig {
            maximum: max,
            inclusive: true,
            exact: false,
        }
    } else {
        return;
    };
    let issue = node.issue(kind, &payload.value);
    payload.push(issue);
}

pub(crate) fn parse_bigint(node: &SchemaNode, payload: &mut Payload) {
    if !matches!(payload.value, Value::BigInt(_)) {
        let issue = node.type_issue(&payload.value);
        payload.push(issue);
    }
}

pub(crate) fn parse_bool(node: &SchemaNode, payload: &mut Payload) {
    if !matches!(payload.value, Value::Bool(_)) {
        let issue = node.type_issue(&payload.value);
        payload.push(issue);
    }
}

pub(crate) fn parse_nil(node: &SchemaNode, payload: &mut Payload) {
    if !payload.value.is_null() {
        let issue = node.type_issue(&payload.value);
        payload.push(issue);
    }
}

pub(crate) fn parse_literal(node: &SchemaNode, values: &[Value], payload: &mut Payload) {
    if !values.contains(&payload.value) {
        let issue = node.issue(
            IssueKind::InvalidValue {
                values: values.to_vec(),
            },
            &payload.value,
        );
        payload.push(issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueCode;
    use serde_json::json;

    #[test]
    fn integer_kinds_normalise_integral_floats() {
        assert_eq!(int32().parse(4.0).unwrap(), Value::Number(Number::Int(4)));
        let err = int32().parse(4.5).unwrap_err();
        assert_eq!(err.first().code(), IssueCode::InvalidType);
    }

    #[test]
    fn integer_kinds_enforce_ranges() {
        assert!(uint8().parse(255).is_ok());
        let err = uint8().parse(256).unwrap_err();
        assert_eq!(err.first().code(), IssueCode::TooBig);
        let err = int8().parse(-129).unwrap_err();
        assert_eq!(err.first().code(), IssueCode::TooSmall);
        assert!(uint64().parse(json!(u64::MAX)).is_ok());
    }

    #[test]
    fn nan_is_rejected_but_infinity_is_a_number() {
        let err = number().parse(f64::NAN).unwrap_err();
        match &err.first().kind {
            IssueKind::InvalidType { received, .. } => assert_eq!(received, "NaN"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(number().parse(f64::INFINITY).is_ok());
        assert!(number().finite().parse(f64::INFINITY).is_err());
        assert!(int().parse(f64::INFINITY).is_err());
    }

    #[test]
    fn float32_range() {
        assert!(float32().parse(1.5).is_ok());
        assert!(float32().parse(1e39).is_err());
    }

    #[test]
    fn bigint_is_distinct_from_number() {
        assert!(bigint().parse(Value::BigInt(5)).is_ok());
        assert!(bigint().parse(5).is_err());
        assert!(bigint().positive().parse(Value::BigInt(0)).is_err());
    }

    #[test]
    fn coerced_number_from_string() {
        assert_eq!(number().coerce().parse("12").unwrap(), Value::from(12));
        let err = number().coerce().parse("twelve").unwrap_err();
        assert_eq!(err.first().code(), IssueCode::InvalidType);
    }

    #[test]
    fn literal_and_enum_report_invalid_value() {
        assert!(literal("on").parse("on").is_ok());
        let err = literal("on").parse("off").unwrap_err();
        assert_eq!(err.first().code(), IssueCode::InvalidValue);

        let colours = enumeration(["red", "green"]);
        assert!(colours.parse("green").is_ok());
        assert!(colours.parse(Value::Null).is_err());
    }

    #[test]
    fn native_enum_matches_values() {
        let level = native_enum([("Low", 0), ("High", 1)]);
        assert!(level.parse(1).is_ok());
        assert!(level.parse("High").is_err());
        assert_eq!(level.get("High"), Some(&Value::from(1)));
    }

    #[test]
    fn enum_extract_and_exclude() {
        let colours = enumeration(["red", "green", "blue"]);
        let warm = colours.extract(["red"]).unwrap();
        assert_eq!(warm.options(), vec![Value::from("red")]);
        let cool = colours.exclude(["red"]).unwrap();
        assert_eq!(cool.options().len(), 2);
        assert_eq!(
            colours.extract(["purple"]).unwrap_err(),
            SchemaError::UnknownOption {
                name: "purple".into()
            }
        );
    }

    #[test]
    fn string_formats_and_rewrites() {
        assert!(string().email().parse("a@b.co").is_ok());
        assert!(string().uuid().parse("nope").is_err());
        assert_eq!(
            string().trim().to_upper().parse("  ok ").unwrap(),
            Value::from("OK")
        );
        let err = string()
            .starts_with("https://")
            .parse("http://x")
            .unwrap_err();
        assert_eq!(
            err.first().message,
            "Invalid string: must start with \"https://\""
        );
    }

    #[test]
    fn nil_accepts_only_null() {
        assert!(nil().parse(Value::Null).is_ok());
        assert!(nil().parse(0).is_err());
        assert!(never().parse(Value::Null).is_err());
        assert!(any().parse(json!({ "x": 1 })).is_ok());
    }
}
