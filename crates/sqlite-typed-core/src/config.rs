//! Configuration for opening a SQLite connection

use serde::{Deserialize, Serialize};

/// Configuration applied when a connection is opened
///
/// # Examples
///
/// ```
/// use sqlite_typed_core::DatabaseConfig;
///
/// // Use defaults
/// let config = DatabaseConfig::default();
///
/// // Override just one field
/// let config = DatabaseConfig {
///     read_only: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
   /// Create the database file if it does not exist
   ///
   /// Ignored when `read_only` is set, since a read-only connection can never
   /// create a file.
   ///
   /// Default: true
   pub create_if_missing: bool,

   /// Open the connection read-only
   ///
   /// Writes fail at step time with the engine's read-only error.
   ///
   /// Default: false
   pub read_only: bool,

   /// How long the engine waits on a locked database before giving up (in milliseconds)
   ///
   /// When the wait expires the statement fails with a step error; nothing is
   /// retried automatically. Zero disables waiting.
   ///
   /// Default: 5000
   pub busy_timeout_ms: u32,
}

impl Default for DatabaseConfig {
   fn default() -> Self {
      Self {
         create_if_missing: true,
         read_only: false,
         busy_timeout_ms: 5000,
      }
   }
}
