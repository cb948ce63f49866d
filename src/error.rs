use std::path::PathBuf;

use serde::{Serialize, Serializer};
use sqlite_typed_core::Error as CoreError;

/// Result type alias for database handle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for serialized callers.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
   code: &'static str,
   message: String,
   #[serde(skip_serializing_if = "Option::is_none")]
   sqlite_code: Option<i32>,
}

/// Error types for database handle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from the engine layer (open, prepare, bind, step, decode, close).
   #[error(transparent)]
   Sqlite(#[from] CoreError),

   /// Operation attempted on a handle with no open connection.
   #[error("database is not open")]
   NotOpen,

   /// `open` called on a handle that already holds a connection.
   #[error("database is already open at {}", .0.display())]
   AlreadyOpen(PathBuf),

   /// Invalid database path provided.
   #[error("invalid database path: {0}")]
   InvalidPath(String),

   /// Multiple rows returned from a `query_one` call.
   #[error("query_one() returned {0} rows, expected 0 or 1")]
   MultipleRowsReturned(usize),
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> &'static str {
      match self {
         Error::Sqlite(e) => match e {
            CoreError::Open { .. } => "OPEN_ERROR",
            CoreError::Prepare { .. } => "PREPARE_ERROR",
            CoreError::Bind(_) => "BIND_ERROR",
            CoreError::Step { .. } => "STEP_ERROR",
            CoreError::Decode(_) => "DECODE_ERROR",
            CoreError::Close { .. } => "CLOSE_ERROR",
         },
         Error::NotOpen => "NOT_OPEN",
         Error::AlreadyOpen(_) => "ALREADY_OPEN",
         Error::InvalidPath(_) => "INVALID_PATH",
         Error::MultipleRowsReturned(_) => "MULTIPLE_ROWS_RETURNED",
      }
   }

   /// The SQLite extended result code, when the engine produced this error.
   pub fn sqlite_code(&self) -> Option<i32> {
      match self {
         Error::Sqlite(e) => e.sqlite_code(),
         _ => None,
      }
   }
}

impl From<sqlite_typed_core::BindError> for Error {
   fn from(err: sqlite_typed_core::BindError) -> Self {
      Error::Sqlite(CoreError::Bind(err))
   }
}

impl From<sqlite_typed_core::DecodeError> for Error {
   fn from(err: sqlite_typed_core::DecodeError) -> Self {
      Error::Sqlite(CoreError::Decode(err))
   }
}

impl Serialize for Error {
   fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
   where
      S: Serializer,
   {
      let response = ErrorResponse {
         code: self.error_code(),
         message: self.to_string(),
         sqlite_code: self.sqlite_code(),
      };
      response.serialize(serializer)
   }
}
