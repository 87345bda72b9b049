//! Dynamically typed filter values.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sift_schema::ScalarType;
use uuid::Uuid;

/// A value a filter condition compares against.
///
/// Values arrive loosely typed (JSON numbers, request strings) and are
/// coerced to the attribute's declared scalar type before compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Single character.
    Char(char),
    /// UUID value.
    Uuid(Uuid),
    /// Calendar date.
    Date(NaiveDate),
    /// Point in time.
    DateTime(DateTime<Utc>),
    /// Time of day.
    Time(NaiveTime),
    /// JSON value.
    Json(serde_json::Value),
    /// List of values.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the string content of text values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value's type for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Char(_) => "char",
            Self::Uuid(_) => "uuid",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Time(_) => "time",
            Self::Json(_) => "json",
            Self::List(_) => "list",
        }
    }

    /// Parse a raw request string as a value of the given scalar type.
    pub fn parse_as(raw: &str, scalar: ScalarType) -> Result<Self, String> {
        Self::String(raw.to_string()).coerce(scalar)
    }

    /// Convert this value to the representation used for `scalar`.
    ///
    /// Null stays null. A list is only a valid value for a `Json`
    /// attribute; list conditions hold their elements individually.
    pub fn coerce(self, scalar: ScalarType) -> Result<Self, String> {
        use ScalarType as S;

        let mismatch = |v: &FilterValue| format!("expected {}, found {}", scalar, v.type_name());

        match (scalar, self) {
            (_, Self::Null) => Ok(Self::Null),
            (S::Json, Self::List(values)) => serde_json::to_value(values)
                .map(Self::Json)
                .map_err(|e| e.to_string()),
            (_, Self::List(_)) => Err(format!("expected a single {}, found a list", scalar)),

            (S::Int | S::BigInt, Self::Int(i)) => Ok(Self::Int(i)),
            (S::Int | S::BigInt, Self::Float(f)) if f.fract() == 0.0 => {
                if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Ok(Self::Int(f as i64))
                } else {
                    Err(format!("`{}` is out of range for {}", f, scalar))
                }
            }
            (S::Int | S::BigInt, Self::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Self::Int)
                .map_err(|_| format!("`{}` is not an integer", s)),

            (S::Float | S::Decimal, Self::Float(f)) => Ok(Self::Float(f)),
            (S::Float | S::Decimal, Self::Int(i)) => Ok(Self::Float(i as f64)),
            (S::Float | S::Decimal, Self::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Self::Float)
                .map_err(|_| format!("`{}` is not a number", s)),

            (S::String, Self::String(s)) => Ok(Self::String(s)),
            (S::String, Self::Char(c)) => Ok(Self::String(c.to_string())),

            (S::Char, Self::Char(c)) => Ok(Self::Char(c)),
            (S::Char, Self::String(s)) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Self::Char(c)),
                    _ => Err(format!("`{}` is not a single character", s)),
                }
            }

            (S::Boolean, Self::Bool(b)) => Ok(Self::Bool(b)),
            (S::Boolean, Self::String(s)) => parse_bool(&s).map(Self::Bool),

            (S::Uuid, Self::Uuid(u)) => Ok(Self::Uuid(u)),
            (S::Uuid, Self::String(s)) => Uuid::parse_str(s.trim())
                .map(Self::Uuid)
                .map_err(|_| format!("`{}` is not a UUID", s)),

            (S::Date, Self::Date(d)) => Ok(Self::Date(d)),
            (S::Date, Self::DateTime(dt)) => Ok(Self::Date(dt.date_naive())),
            (S::Date, Self::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Self::Date)
                .map_err(|_| format!("`{}` is not a date (YYYY-MM-DD)", s)),

            (S::DateTime, Self::DateTime(dt)) => Ok(Self::DateTime(dt)),
            (S::DateTime, Self::Date(d)) => Ok(Self::DateTime(d.and_time(NaiveTime::MIN).and_utc())),
            (S::DateTime, Self::String(s)) => parse_datetime(s.trim())
                .map(Self::DateTime)
                .ok_or_else(|| format!("`{}` is not an RFC 3339 date-time", s)),

            (S::Time, Self::Time(t)) => Ok(Self::Time(t)),
            (S::Time, Self::String(s)) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M"))
                .map(Self::Time)
                .map_err(|_| format!("`{}` is not a time (HH:MM:SS)", s)),

            (S::Json, v) => Ok(v),
            (S::Bytes, Self::String(s)) => Ok(Self::String(s)),

            (_, other) => Err(mismatch(&other)),
        }
    }

    /// Compare two values of compatible types.
    ///
    /// Returns `None` when either side is null or the types are unrelated.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Char(a), Self::Char(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Uuid(a), Self::Uuid(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::Json(a), Self::Json(b)) => (a == b).then_some(Ordering::Equal),
            _ => None,
        }
    }

    /// SQL-style equality: unknown when either side is null.
    pub fn sql_eq(&self, other: &Self) -> Option<bool> {
        if self.is_null() || other.is_null() {
            return None;
        }
        Some(self.compare(other) == Some(Ordering::Equal))
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(format!("`{}` is not a boolean", s)),
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

impl<'de> Deserialize<'de> for FilterValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

impl From<serde_json::Value> for FilterValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            obj @ Value::Object(_) => Self::Json(obj),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(true) => write!(f, "TRUE"),
            Self::Bool(false) => write!(f, "FALSE"),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Char(c) => write!(f, "'{}'", c),
            Self::Uuid(u) => write!(f, "'{}'", u),
            Self::Date(d) => write!(f, "'{}'", d),
            Self::DateTime(dt) => write!(f, "'{}'", dt.to_rfc3339()),
            Self::Time(t) => write!(f, "'{}'", t),
            Self::Json(v) => write!(f, "'{}'", v),
            Self::List(values) => {
                write!(f, "(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for FilterValue {
    fn from(v: i16) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<char> for FilterValue {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<Uuid> for FilterValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<NaiveTime> for FilterValue {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}
