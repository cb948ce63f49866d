//! Mapping between [`Value`] and the engine's native bind/column primitives.

use std::ffi::c_int;
use std::fmt;

use libsqlite3_sys::{
   SQLITE_BLOB, SQLITE_FLOAT, SQLITE_INTEGER, SQLITE_NULL, SQLITE_TEXT, sqlite3_column_bytes,
   sqlite3_column_double, sqlite3_column_int64, sqlite3_column_text, sqlite3_column_type,
};

use crate::error::DecodeError;
use crate::statement::Statement;
use crate::value::{Value, timestamp_to_seconds};

/// The engine's runtime category for a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
   Null,
   Integer,
   Real,
   Text,
   Blob,
}

impl StorageClass {
   /// Map a `sqlite3_column_type` result; `None` for codes the engine does not define.
   pub fn from_raw(code: c_int) -> Option<Self> {
      match code {
         SQLITE_NULL => Some(StorageClass::Null),
         SQLITE_INTEGER => Some(StorageClass::Integer),
         SQLITE_FLOAT => Some(StorageClass::Real),
         SQLITE_TEXT => Some(StorageClass::Text),
         SQLITE_BLOB => Some(StorageClass::Blob),
         _ => None,
      }
   }
}

impl fmt::Display for StorageClass {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(match self {
         StorageClass::Null => "NULL",
         StorageClass::Integer => "INTEGER",
         StorageClass::Real => "REAL",
         StorageClass::Text => "TEXT",
         StorageClass::Blob => "BLOB",
      })
   }
}

/// The single native bind call a [`Value`] turns into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindOp<'a> {
   Null,
   Int64(i64),
   Double(f64),
   Text(&'a str),
}

/// Encode a host value for binding.
///
/// Booleans bind as INTEGER 1/0 and timestamps as REAL seconds since the
/// epoch, so that [`crate::FromValue`] can read them back symmetrically.
pub fn encode(value: &Value) -> BindOp<'_> {
   match value {
      Value::Null => BindOp::Null,
      Value::Integer(v) => BindOp::Int64(*v),
      Value::Real(v) => BindOp::Double(*v),
      Value::Text(v) => BindOp::Text(v),
      Value::Boolean(v) => BindOp::Int64(i64::from(*v)),
      Value::Timestamp(v) => BindOp::Double(timestamp_to_seconds(v)),
   }
}

/// Decode column `index` of the current row by its storage class.
///
/// NULL storage always decodes to [`Value::Null`], whatever the declared
/// column type. BLOB storage is rejected.
///
/// If the statement is not positioned on a row the engine reports every
/// column as NULL.
pub fn decode_column(
   statement: &Statement<'_>,
   index: usize,
   column: &str,
) -> Result<Value, DecodeError> {
   let len = statement.column_count();
   let idx = c_int::try_from(index)
      .ok()
      .filter(|_| index < len)
      .ok_or(DecodeError::IndexOutOfRange { index, len })?;
   let stmt = statement.as_ptr();

   // SAFETY: stmt is a live prepared statement owned by `statement` and idx
   // is within its column count.
   let code = unsafe { sqlite3_column_type(stmt, idx) };
   let storage = StorageClass::from_raw(code).ok_or_else(|| DecodeError::UnsupportedStorageClass {
      column: column.to_owned(),
      storage: format!("type code {code}"),
   })?;

   match storage {
      StorageClass::Null => Ok(Value::Null),
      // SAFETY: same statement and index as above; the storage class matches
      // the accessor, so no conversion takes place.
      StorageClass::Integer => Ok(Value::Integer(unsafe { sqlite3_column_int64(stmt, idx) })),
      // SAFETY: as for INTEGER.
      StorageClass::Real => Ok(Value::Real(unsafe { sqlite3_column_double(stmt, idx) })),
      StorageClass::Text => {
         // sqlite3_column_bytes must follow sqlite3_column_text so the length
         // refers to the UTF-8 form just produced.
         // SAFETY: same statement and index as above.
         let text = unsafe { sqlite3_column_text(stmt, idx) };
         // SAFETY: same statement and index as above.
         let bytes = unsafe { sqlite3_column_bytes(stmt, idx) };
         if text.is_null() {
            if bytes == 0 {
               return Ok(Value::Text(String::new()));
            }
            return Err(DecodeError::OutOfMemory {
               column: column.to_owned(),
            });
         }
         let bytes = usize::try_from(bytes).unwrap_or_default();
         // SAFETY: the engine guarantees `bytes` readable bytes at `text`
         // until the next step, reset or finalize of this statement.
         let slice = unsafe { std::slice::from_raw_parts(text, bytes) };
         String::from_utf8(slice.to_vec())
            .map(Value::Text)
            .map_err(|_| DecodeError::InvalidUtf8 {
               column: column.to_owned(),
            })
      }
      StorageClass::Blob => Err(DecodeError::UnsupportedStorageClass {
         column: column.to_owned(),
         storage: storage.to_string(),
      }),
   }
}
