//! Error types for sqlite-typed-core

use std::path::PathBuf;

use thiserror::Error;

/// A type alias for Results with the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the native statement layer.
///
/// Engine-originated variants carry the SQLite extended result code and the
/// message reported by `sqlite3_errmsg` at the time of failure.
#[derive(Error, Debug)]
pub enum Error {
   /// The connection could not be established (bad path, permissions, not a database).
   #[error("failed to open database at {}: {message} (code {code})", .path.display())]
   Open {
      path: PathBuf,
      code: i32,
      message: String,
   },

   /// The SQL text could not be compiled.
   #[error("failed to prepare `{sql}`: {message} (code {code})")]
   Prepare {
      sql: String,
      code: i32,
      message: String,
   },

   /// A parameter could not be bound.
   #[error(transparent)]
   Bind(#[from] BindError),

   /// The engine reported an error while stepping the statement
   /// (constraint violation, busy/locked database, I/O failure).
   #[error("failed to execute `{sql}`: {message} (code {code})")]
   Step {
      sql: String,
      code: i32,
      message: String,
   },

   /// A result column could not be decoded into the requested value.
   #[error(transparent)]
   Decode(#[from] DecodeError),

   /// The native connection refused to close cleanly.
   #[error("failed to close database: {message} (code {code})")]
   Close { code: i32, message: String },
}

impl Error {
   /// The SQLite extended result code, when the engine produced this error.
   pub fn sqlite_code(&self) -> Option<i32> {
      match self {
         Error::Open { code, .. }
         | Error::Prepare { code, .. }
         | Error::Step { code, .. }
         | Error::Close { code, .. } => Some(*code),
         Error::Bind(BindError::Engine { code, .. }) => Some(*code),
         Error::Bind(_) | Error::Decode(_) => None,
      }
   }
}

/// Parameter binding failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
   /// The parameter list does not match the statement's placeholders.
   #[error("`{sql}` expects {expected} parameter(s) but {actual} were supplied")]
   ParameterCount {
      sql: String,
      expected: usize,
      actual: usize,
   },

   /// The engine rejected the bind call at `position` (1-based).
   #[error("failed to bind parameter {position}: {message} (code {code})")]
   Engine {
      position: usize,
      code: i32,
      message: String,
   },

   /// The value at `position` exceeds what the engine's bind API accepts.
   #[error("parameter {position} is too large to bind ({len} bytes)")]
   TooBig { position: usize, len: usize },

   /// A REAL parameter is NaN, which the engine would silently store as NULL.
   #[error("parameter {position} is NaN")]
   NotANumber { position: usize },
}

impl BindError {
   /// The 1-based position of the offending parameter, if the failure is tied to one.
   pub fn position(&self) -> Option<usize> {
      match self {
         BindError::ParameterCount { .. } => None,
         BindError::Engine { position, .. }
         | BindError::TooBig { position, .. }
         | BindError::NotANumber { position } => Some(*position),
      }
   }
}

/// Failures turning a stored column into a host value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
   /// No column with this name exists in the result set.
   #[error("no column named `{0}` in result set")]
   ColumnNotFound(String),

   /// Positional access past the last column.
   #[error("column index {index} out of range for row with {len} column(s)")]
   IndexOutOfRange { index: usize, len: usize },

   /// The engine did not report a name for the column (out of memory).
   #[error("engine reported no name for column {index}")]
   MissingColumnName { index: usize },

   /// The stored value cannot be read as the requested type.
   #[error("column `{column}`: expected {expected}, found {found}")]
   TypeMismatch {
      column: String,
      expected: &'static str,
      found: &'static str,
   },

   /// The engine returned a storage class outside the supported scalar set.
   #[error("column `{column}`: unsupported storage class {storage}")]
   UnsupportedStorageClass { column: String, storage: String },

   /// TEXT storage that is not valid UTF-8.
   #[error("column `{column}`: text is not valid UTF-8")]
   InvalidUtf8 { column: String },

   /// An integer does not fit the requested width.
   #[error("column `{column}`: integer {value} does not fit the requested type")]
   IntegerOverflow { column: String, value: i64 },

   /// A numeric value does not describe a representable instant.
   #[error("column `{column}`: value is not a representable timestamp")]
   TimestampOutOfRange { column: String },

   /// A row was assembled with a different number of values than columns.
   #[error("row has {values} value(s) for {columns} column(s)")]
   ColumnCountMismatch { columns: usize, values: usize },

   /// The engine could not materialize the column value.
   #[error("column `{column}`: engine ran out of memory reading value")]
   OutOfMemory { column: String },
}
