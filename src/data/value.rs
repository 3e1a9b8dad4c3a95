use crate::data::datetime::{
    format_date, format_datetime, format_time, format_timestamp, parse_date, parse_datetime,
    parse_time, parse_timestamp,
};
use crate::data::{ExprType, Tuple};
use crate::expression::{ExpressionError, ExpressionResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use ordered_float::OrderedFloat;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime value flowing through expressions and operators.
///
/// `Null` is a present-but-SQL-NULL value, `Missing` marks a field that is
/// absent from the tuple. Both are singletons rather than typed nulls.
#[derive(Debug, Clone)]
pub enum ExprValue {
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Zone-naive date and time, compared as if it were UTC
    Datetime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Tuple(Tuple),
    Array(Vec<ExprValue>),
    Null,
    Missing,
}

impl ExprValue {
    pub fn string(value: impl Into<String>) -> Self {
        ExprValue::String(value.into())
    }

    /// Build a DATE value from a `yyyy-MM-dd` literal
    pub fn date(text: &str) -> ExpressionResult<Self> {
        parse_date(text).map(ExprValue::Date)
    }

    /// Build a TIME value from a `HH:mm:ss[.fraction]` literal
    pub fn time(text: &str) -> ExpressionResult<Self> {
        parse_time(text).map(ExprValue::Time)
    }

    /// Build a DATETIME value from a `yyyy-MM-dd HH:mm:ss[.fraction]` literal
    pub fn datetime(text: &str) -> ExpressionResult<Self> {
        parse_datetime(text).map(ExprValue::Datetime)
    }

    /// Build a TIMESTAMP value from a UTC `yyyy-MM-dd HH:mm:ss[.fraction]` literal
    pub fn timestamp(text: &str) -> ExpressionResult<Self> {
        parse_timestamp(text).map(ExprValue::Timestamp)
    }

    pub fn expr_type(&self) -> ExprType {
        match self {
            ExprValue::Integer(_) => ExprType::Integer,
            ExprValue::Long(_) => ExprType::Long,
            ExprValue::Float(_) => ExprType::Float,
            ExprValue::Double(_) => ExprType::Double,
            ExprValue::String(_) => ExprType::String,
            ExprValue::Boolean(_) => ExprType::Boolean,
            ExprValue::Date(_) => ExprType::Date,
            ExprValue::Time(_) => ExprType::Time,
            ExprValue::Datetime(_) => ExprType::Datetime,
            ExprValue::Timestamp(_) => ExprType::Timestamp,
            ExprValue::Tuple(_) => ExprType::Struct,
            ExprValue::Array(_) => ExprType::Array,
            ExprValue::Null => ExprType::Null,
            ExprValue::Missing => ExprType::Undefined,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ExprValue::Null)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ExprValue::Missing)
    }

    pub fn is_null_or_missing(&self) -> bool {
        self.is_null() || self.is_missing()
    }

    pub fn is_number(&self) -> bool {
        self.expr_type().is_numeric()
    }

    fn type_error(&self, expected: &str) -> ExpressionError {
        ExpressionError::evaluation(format!("invalid to get {} from value of type {}", expected, self.expr_type()))
    }

    pub fn integer_value(&self) -> ExpressionResult<i32> {
        match self {
            ExprValue::Integer(v) => Ok(*v),
            ExprValue::Long(v) => Ok(*v as i32),
            ExprValue::Float(v) => Ok(*v as i32),
            ExprValue::Double(v) => Ok(*v as i32),
            _ => Err(self.type_error("integerValue")),
        }
    }

    pub fn long_value(&self) -> ExpressionResult<i64> {
        match self {
            ExprValue::Integer(v) => Ok(i64::from(*v)),
            ExprValue::Long(v) => Ok(*v),
            ExprValue::Float(v) => Ok(*v as i64),
            ExprValue::Double(v) => Ok(*v as i64),
            _ => Err(self.type_error("longValue")),
        }
    }

    pub fn float_value(&self) -> ExpressionResult<f32> {
        match self {
            ExprValue::Integer(v) => Ok(*v as f32),
            ExprValue::Long(v) => Ok(*v as f32),
            ExprValue::Float(v) => Ok(*v),
            ExprValue::Double(v) => Ok(*v as f32),
            _ => Err(self.type_error("floatValue")),
        }
    }

    pub fn double_value(&self) -> ExpressionResult<f64> {
        match self {
            ExprValue::Integer(v) => Ok(f64::from(*v)),
            ExprValue::Long(v) => Ok(*v as f64),
            ExprValue::Float(v) => Ok(f64::from(*v)),
            ExprValue::Double(v) => Ok(*v),
            _ => Err(self.type_error("doubleValue")),
        }
    }

    pub fn string_value(&self) -> ExpressionResult<&str> {
        match self {
            ExprValue::String(v) => Ok(v),
            _ => Err(self.type_error("stringValue")),
        }
    }

    pub fn boolean_value(&self) -> ExpressionResult<bool> {
        match self {
            ExprValue::Boolean(v) => Ok(*v),
            _ => Err(self.type_error("booleanValue")),
        }
    }

    /// Calendar date of any DATE, DATETIME or TIMESTAMP value
    pub fn date_value(&self) -> ExpressionResult<NaiveDate> {
        match self {
            ExprValue::Date(v) => Ok(*v),
            ExprValue::Datetime(v) => Ok(v.date()),
            ExprValue::Timestamp(v) => Ok(v.date_naive()),
            _ => Err(self.type_error("dateValue")),
        }
    }

    /// Time of day of any TIME, DATETIME or TIMESTAMP value
    pub fn time_value(&self) -> ExpressionResult<NaiveTime> {
        match self {
            ExprValue::Time(v) => Ok(*v),
            ExprValue::Datetime(v) => Ok(v.time()),
            ExprValue::Timestamp(v) => Ok(v.time()),
            _ => Err(self.type_error("timeValue")),
        }
    }

    /// DATE values become midnight, TIMESTAMP values their UTC wall clock
    pub fn datetime_value(&self) -> ExpressionResult<NaiveDateTime> {
        match self {
            ExprValue::Date(v) => Ok(v.and_time(NaiveTime::MIN)),
            ExprValue::Datetime(v) => Ok(*v),
            ExprValue::Timestamp(v) => Ok(v.naive_utc()),
            _ => Err(self.type_error("datetimeValue")),
        }
    }

    pub fn timestamp_value(&self) -> ExpressionResult<DateTime<Utc>> {
        match self {
            ExprValue::Timestamp(v) => Ok(*v),
            ExprValue::Date(_) | ExprValue::Datetime(_) => {
                Ok(Utc.from_utc_datetime(&self.datetime_value()?))
            }
            _ => Err(self.type_error("timestampValue")),
        }
    }

    pub fn tuple_value(&self) -> ExpressionResult<&Tuple> {
        match self {
            ExprValue::Tuple(v) => Ok(v),
            _ => Err(self.type_error("tupleValue")),
        }
    }

    pub fn array_value(&self) -> ExpressionResult<&[ExprValue]> {
        match self {
            ExprValue::Array(v) => Ok(v),
            _ => Err(self.type_error("arrayValue")),
        }
    }

    /// Unquoted text form: strings as-is, temporals in their literal format
    pub fn to_text(&self) -> String {
        match self {
            ExprValue::String(v) => v.clone(),
            ExprValue::Date(v) => format_date(v),
            ExprValue::Time(v) => format_time(v),
            ExprValue::Datetime(v) => format_datetime(v),
            ExprValue::Timestamp(v) => format_timestamp(v),
            other => other.to_string(),
        }
    }

    /// Convert this value to `target` along the widening chain.
    ///
    /// NULL and MISSING pass through unchanged so the null-missing guard can
    /// still see them.
    pub fn cast_to(&self, target: ExprType) -> ExpressionResult<ExprValue> {
        if self.is_null_or_missing() || self.expr_type() == target {
            return Ok(self.clone());
        }
        if !self.expr_type().widens_to(target) {
            return Err(ExpressionError::evaluation(format!(
                "can't cast value of type {} to {}",
                self.expr_type(),
                target
            )));
        }
        match target {
            ExprType::Long => Ok(ExprValue::Long(self.long_value()?)),
            ExprType::Float => Ok(ExprValue::Float(self.float_value()?)),
            ExprType::Double => Ok(ExprValue::Double(self.double_value()?)),
            _ => Ok(self.clone()),
        }
    }

    /// Compare two values of the same type family.
    ///
    /// Numbers compare across INTEGER/LONG/FLOAT/DOUBLE. Any other pairing of
    /// different types, or a NULL/MISSING operand, is an evaluation error.
    pub fn compare(&self, other: &ExprValue) -> ExpressionResult<Ordering> {
        match (self, other) {
            (ExprValue::Integer(_) | ExprValue::Long(_), ExprValue::Integer(_) | ExprValue::Long(_)) => {
                Ok(self.long_value()?.cmp(&other.long_value()?))
            }
            (a, b) if a.is_number() && b.is_number() => {
                Ok(OrderedFloat(a.double_value()?).cmp(&OrderedFloat(b.double_value()?)))
            }
            (ExprValue::String(a), ExprValue::String(b)) => Ok(a.cmp(b)),
            (ExprValue::Boolean(a), ExprValue::Boolean(b)) => Ok(a.cmp(b)),
            (ExprValue::Date(a), ExprValue::Date(b)) => Ok(a.cmp(b)),
            (ExprValue::Time(a), ExprValue::Time(b)) => Ok(a.cmp(b)),
            (ExprValue::Datetime(a), ExprValue::Datetime(b)) => Ok(a.cmp(b)),
            (ExprValue::Timestamp(a), ExprValue::Timestamp(b)) => Ok(a.cmp(b)),
            _ => Err(ExpressionError::evaluation(format!(
                "compare expected value have same type, but with [{}, {}]",
                self.expr_type(),
                other.expr_type()
            ))),
        }
    }

    /// Convert a raw JSON value read from a relation into a value of `ty`.
    ///
    /// JSON `null` becomes NULL. Untyped (`STRUCT`, `ARRAY`, `UNDEFINED`)
    /// positions infer their element types from the JSON itself.
    pub fn from_json(raw: &serde_json::Value, ty: ExprType) -> ExpressionResult<ExprValue> {
        use serde_json::Value as Json;

        let mismatch = || {
            ExpressionError::semantic(format!("can't convert raw value {} to type {}", raw, ty))
        };
        if raw.is_null() {
            return Ok(ExprValue::Null);
        }
        match ty {
            ExprType::Integer => raw
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(ExprValue::Integer)
                .ok_or_else(mismatch),
            ExprType::Long => raw.as_i64().map(ExprValue::Long).ok_or_else(mismatch),
            ExprType::Float => raw
                .as_f64()
                .map(|v| ExprValue::Float(v as f32))
                .ok_or_else(mismatch),
            ExprType::Double => raw.as_f64().map(ExprValue::Double).ok_or_else(mismatch),
            ExprType::String => match raw {
                Json::String(s) => Ok(ExprValue::String(s.clone())),
                _ => Err(mismatch()),
            },
            ExprType::Boolean => raw.as_bool().map(ExprValue::Boolean).ok_or_else(mismatch),
            ExprType::Date => ExprValue::date(raw.as_str().ok_or_else(mismatch)?),
            ExprType::Time => ExprValue::time(raw.as_str().ok_or_else(mismatch)?),
            ExprType::Datetime => ExprValue::datetime(raw.as_str().ok_or_else(mismatch)?),
            ExprType::Timestamp => match raw {
                Json::Number(n) => n
                    .as_i64()
                    .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                    .map(ExprValue::Timestamp)
                    .ok_or_else(mismatch),
                Json::String(s) => ExprValue::timestamp(s),
                _ => Err(mismatch()),
            },
            ExprType::Struct => match raw {
                Json::Object(_) => ExprValue::infer_json(raw),
                _ => Err(mismatch()),
            },
            ExprType::Array => match raw {
                Json::Array(_) => ExprValue::infer_json(raw),
                _ => Err(mismatch()),
            },
            ExprType::Null | ExprType::Undefined => ExprValue::infer_json(raw),
        }
    }

    fn infer_json(raw: &serde_json::Value) -> ExpressionResult<ExprValue> {
        use serde_json::Value as Json;

        Ok(match raw {
            Json::Null => ExprValue::Null,
            Json::Bool(b) => ExprValue::Boolean(*b),
            Json::Number(n) => match n.as_i64() {
                Some(v) => match i32::try_from(v) {
                    Ok(small) => ExprValue::Integer(small),
                    Err(_) => ExprValue::Long(v),
                },
                None => ExprValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => ExprValue::String(s.clone()),
            Json::Array(items) => ExprValue::Array(
                items
                    .iter()
                    .map(ExprValue::infer_json)
                    .collect::<ExpressionResult<Vec<_>>>()?,
            ),
            Json::Object(fields) => {
                let mut tuple = Tuple::new();
                for (name, value) in fields {
                    tuple.insert(name.clone(), ExprValue::infer_json(value)?);
                }
                ExprValue::Tuple(tuple)
            }
        })
    }
}

impl PartialEq for ExprValue {
    /// MISSING never equals anything, another MISSING included
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExprValue::Missing, _) | (_, ExprValue::Missing) => false,
            (ExprValue::Null, ExprValue::Null) => true,
            (ExprValue::Integer(a), ExprValue::Integer(b)) => a == b,
            (ExprValue::Long(a), ExprValue::Long(b)) => a == b,
            (ExprValue::Float(a), ExprValue::Float(b)) => a == b,
            (ExprValue::Double(a), ExprValue::Double(b)) => a == b,
            (ExprValue::String(a), ExprValue::String(b)) => a == b,
            (ExprValue::Boolean(a), ExprValue::Boolean(b)) => a == b,
            (ExprValue::Date(a), ExprValue::Date(b)) => a == b,
            (ExprValue::Time(a), ExprValue::Time(b)) => a == b,
            (ExprValue::Datetime(a), ExprValue::Datetime(b)) => a == b,
            (ExprValue::Timestamp(a), ExprValue::Timestamp(b)) => a == b,
            (ExprValue::Tuple(a), ExprValue::Tuple(b)) => a == b,
            (ExprValue::Array(a), ExprValue::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Hash for ExprValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ExprValue::Integer(v) => v.hash(state),
            ExprValue::Long(v) => v.hash(state),
            ExprValue::Float(v) => OrderedFloat(*v).hash(state),
            ExprValue::Double(v) => OrderedFloat(*v).hash(state),
            ExprValue::String(v) => v.hash(state),
            ExprValue::Boolean(v) => v.hash(state),
            ExprValue::Date(v) => v.hash(state),
            ExprValue::Time(v) => v.hash(state),
            ExprValue::Datetime(v) => v.hash(state),
            ExprValue::Timestamp(v) => v.hash(state),
            ExprValue::Tuple(v) => v.hash(state),
            ExprValue::Array(v) => v.hash(state),
            ExprValue::Null | ExprValue::Missing => {}
        }
    }
}

impl fmt::Display for ExprValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprValue::Integer(v) => write!(f, "{}", v),
            ExprValue::Long(v) => write!(f, "{}", v),
            ExprValue::Float(v) => write!(f, "{}", v),
            ExprValue::Double(v) => write!(f, "{}", v),
            ExprValue::String(v) => write!(f, "\"{}\"", v),
            ExprValue::Boolean(v) => write!(f, "{}", v),
            ExprValue::Date(v) => write!(f, "DATE '{}'", format_date(v)),
            ExprValue::Time(v) => write!(f, "TIME '{}'", format_time(v)),
            ExprValue::Datetime(v) => write!(f, "DATETIME '{}'", format_datetime(v)),
            ExprValue::Timestamp(v) => write!(f, "TIMESTAMP '{}'", format_timestamp(v)),
            ExprValue::Tuple(v) => write!(f, "{}", v),
            ExprValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ExprValue::Null => write!(f, "NULL"),
            ExprValue::Missing => write!(f, "MISSING"),
        }
    }
}

impl Serialize for ExprValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExprValue::Integer(v) => serializer.serialize_i32(*v),
            ExprValue::Long(v) => serializer.serialize_i64(*v),
            ExprValue::Float(v) => serializer.serialize_f32(*v),
            ExprValue::Double(v) => serializer.serialize_f64(*v),
            ExprValue::String(v) => serializer.serialize_str(v),
            ExprValue::Boolean(v) => serializer.serialize_bool(*v),
            ExprValue::Date(v) => serializer.serialize_str(&format_date(v)),
            ExprValue::Time(v) => serializer.serialize_str(&format_time(v)),
            ExprValue::Datetime(v) => serializer.serialize_str(&format_datetime(v)),
            ExprValue::Timestamp(v) => serializer.serialize_str(&format_timestamp(v)),
            ExprValue::Tuple(tuple) => {
                let mut map = serializer.serialize_map(Some(tuple.len()))?;
                for (name, value) in tuple.iter() {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            ExprValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ExprValue::Null | ExprValue::Missing => serializer.serialize_unit(),
        }
    }
}

impl From<i32> for ExprValue {
    fn from(v: i32) -> Self {
        ExprValue::Integer(v)
    }
}

impl From<i64> for ExprValue {
    fn from(v: i64) -> Self {
        ExprValue::Long(v)
    }
}

impl From<f32> for ExprValue {
    fn from(v: f32) -> Self {
        ExprValue::Float(v)
    }
}

impl From<f64> for ExprValue {
    fn from(v: f64) -> Self {
        ExprValue::Double(v)
    }
}

impl From<bool> for ExprValue {
    fn from(v: bool) -> Self {
        ExprValue::Boolean(v)
    }
}

impl From<&str> for ExprValue {
    fn from(v: &str) -> Self {
        ExprValue::String(v.to_string())
    }
}

impl From<String> for ExprValue {
    fn from(v: String) -> Self {
        ExprValue::String(v)
    }
}
