//! Host-side values exchanged with the engine.
//!
//! [`Value`] is the closed set of scalars that may cross the boundary in
//! either direction. Decoding a result column always yields one of the
//! structural variants (`Null`, `Integer`, `Real`, `Text`); `Boolean` and
//! `Timestamp` exist only on the way in, and are recovered on the way out by
//! asking for the logical type through [`FromValue`].

use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::DecodeError;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;
const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// A scalar value passed to or read from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
   Null,
   Integer(i64),
   /// Infinities round-trip; NaN is rejected when bound.
   Real(f64),
   Text(String),
   /// Stored as INTEGER 1 or 0.
   Boolean(bool),
   /// Stored as REAL seconds since the Unix epoch.
   ///
   /// Precision is one microsecond: reading the value back rounds any
   /// sub-microsecond part to the nearest microsecond, so an instant from
   /// `OffsetDateTime::now_utc()` is not returned bit-for-bit.
   Timestamp(OffsetDateTime),
}

impl Value {
   /// Name of the variant, used in type mismatch reports.
   pub fn kind(&self) -> &'static str {
      match self {
         Value::Null => "NULL",
         Value::Integer(_) => "INTEGER",
         Value::Real(_) => "REAL",
         Value::Text(_) => "TEXT",
         Value::Boolean(_) => "BOOLEAN",
         Value::Timestamp(_) => "TIMESTAMP",
      }
   }

   pub fn is_null(&self) -> bool {
      matches!(self, Value::Null)
   }

   pub fn as_str(&self) -> Option<&str> {
      match self {
         Value::Text(s) => Some(s),
         _ => None,
      }
   }

   pub fn as_i64(&self) -> Option<i64> {
      match self {
         Value::Integer(v) => Some(*v),
         _ => None,
      }
   }

   pub fn as_f64(&self) -> Option<f64> {
      match self {
         Value::Real(v) => Some(*v),
         _ => None,
      }
   }
}

/// Convert a timestamp into fractional seconds since the Unix epoch.
pub fn timestamp_to_seconds(ts: &OffsetDateTime) -> f64 {
   ts.unix_timestamp() as f64 + f64::from(ts.nanosecond()) / NANOS_PER_SECOND
}

/// Convert fractional seconds since the Unix epoch into a timestamp.
///
/// Sub-second precision is rounded to the microsecond; a REAL cannot carry
/// more than that for present-day instants.
pub fn seconds_to_timestamp(seconds: f64) -> Option<OffsetDateTime> {
   if !seconds.is_finite() {
      return None;
   }
   let micros = (seconds * MICROS_PER_SECOND).round();
   if micros.abs() > i64::MAX as f64 {
      return None;
   }
   OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros as i64) * 1_000).ok()
}

impl Serialize for Value {
   fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
   where
      S: Serializer,
   {
      match self {
         Value::Null => serializer.serialize_unit(),
         Value::Integer(v) => serializer.serialize_i64(*v),
         Value::Real(v) => serializer.serialize_f64(*v),
         Value::Text(v) => serializer.serialize_str(v),
         Value::Boolean(v) => serializer.serialize_bool(*v),
         Value::Timestamp(v) => {
            let formatted = v.format(&Rfc3339).map_err(S::Error::custom)?;
            serializer.serialize_str(&formatted)
         }
      }
   }
}

impl From<&str> for Value {
   fn from(value: &str) -> Self {
      Value::Text(value.to_owned())
   }
}

impl From<String> for Value {
   fn from(value: String) -> Self {
      Value::Text(value)
   }
}

impl From<i64> for Value {
   fn from(value: i64) -> Self {
      Value::Integer(value)
   }
}

impl From<i32> for Value {
   fn from(value: i32) -> Self {
      Value::Integer(i64::from(value))
   }
}

impl From<f64> for Value {
   fn from(value: f64) -> Self {
      Value::Real(value)
   }
}

impl From<bool> for Value {
   fn from(value: bool) -> Self {
      Value::Boolean(value)
   }
}

/// Stored with microsecond precision; see [`Value::Timestamp`].
impl From<OffsetDateTime> for Value {
   fn from(value: OffsetDateTime) -> Self {
      Value::Timestamp(value)
   }
}

impl<T: Into<Value>> From<Option<T>> for Value {
   fn from(value: Option<T>) -> Self {
      value.map_or(Value::Null, Into::into)
   }
}

/// Reads a decoded [`Value`] as a concrete host type.
///
/// This is where the caller supplies the logical type the engine does not
/// keep: `bool` reads INTEGER 0/1, `OffsetDateTime` reads REAL or INTEGER
/// seconds since the epoch. NULL only decodes into `Option<T>` or `Value`.
pub trait FromValue: Sized {
   fn from_value(value: &Value, column: &str) -> Result<Self, DecodeError>;
}

fn mismatch(column: &str, expected: &'static str, found: &Value) -> DecodeError {
   DecodeError::TypeMismatch {
      column: column.to_owned(),
      expected,
      found: found.kind(),
   }
}

impl FromValue for Value {
   fn from_value(value: &Value, _column: &str) -> Result<Self, DecodeError> {
      Ok(value.clone())
   }
}

impl FromValue for String {
   fn from_value(value: &Value, column: &str) -> Result<Self, DecodeError> {
      match value {
         Value::Text(s) => Ok(s.clone()),
         other => Err(mismatch(column, "TEXT", other)),
      }
   }
}

impl FromValue for i64 {
   fn from_value(value: &Value, column: &str) -> Result<Self, DecodeError> {
      match value {
         Value::Integer(v) => Ok(*v),
         Value::Boolean(v) => Ok(i64::from(*v)),
         other => Err(mismatch(column, "INTEGER", other)),
      }
   }
}

impl FromValue for i32 {
   fn from_value(value: &Value, column: &str) -> Result<Self, DecodeError> {
      let wide = i64::from_value(value, column)?;
      i32::try_from(wide).map_err(|_| DecodeError::IntegerOverflow {
         column: column.to_owned(),
         value: wide,
      })
   }
}

impl FromValue for f64 {
   fn from_value(value: &Value, column: &str) -> Result<Self, DecodeError> {
      match value {
         Value::Real(v) => Ok(*v),
         Value::Integer(v) => Ok(*v as f64),
         other => Err(mismatch(column, "REAL", other)),
      }
   }
}

impl FromValue for bool {
   fn from_value(value: &Value, column: &str) -> Result<Self, DecodeError> {
      match value {
         Value::Integer(v) => Ok(*v != 0),
         Value::Boolean(v) => Ok(*v),
         other => Err(mismatch(column, "BOOLEAN", other)),
      }
   }
}

impl FromValue for OffsetDateTime {
   fn from_value(value: &Value, column: &str) -> Result<Self, DecodeError> {
      let out_of_range = || DecodeError::TimestampOutOfRange {
         column: column.to_owned(),
      };
      match value {
         Value::Real(seconds) => seconds_to_timestamp(*seconds).ok_or_else(out_of_range),
         Value::Integer(seconds) => {
            OffsetDateTime::from_unix_timestamp(*seconds).map_err(|_| out_of_range())
         }
         Value::Timestamp(ts) => Ok(*ts),
         other => Err(mismatch(column, "TIMESTAMP", other)),
      }
   }
}

impl<T: FromValue> FromValue for Option<T> {
   fn from_value(value: &Value, column: &str) -> Result<Self, DecodeError> {
      match value {
         Value::Null => Ok(None),
         other => T::from_value(other, column).map(Some),
      }
   }
}
