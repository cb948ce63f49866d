//! Typed, synchronous access to a single SQLite database file.
//!
//! This crate sits on top of the native statement layer (`sqlite-typed-core`)
//! and gives application code one owned handle:
//!
//! - [`Database`]: open, execute, query, close
//! - [`Value`]: text, integer, real, boolean, timestamp or NULL parameters
//! - [`Row`]: decoded rows with name and positional lookup and typed reads
//! - [`Error`]: one error type with stable machine-readable codes
//!
//! # Example
//!
//! ```no_run
//! use sqlite_typed::{Database, OffsetDateTime, Value};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut db = Database::new(None);
//! db.open("mydb.db")?;
//!
//! // Write
//! db.execute(
//!    "CREATE TABLE IF NOT EXISTS events (name TEXT, at REAL, done INTEGER)",
//!    &[],
//! )?;
//! db.execute(
//!    "INSERT INTO events (name, at, done) VALUES (?, ?, ?)",
//!    &[Value::from("deploy"), Value::from(OffsetDateTime::now_utc()), Value::from(false)],
//! )?;
//!
//! // Read, supplying the logical type for booleans and timestamps
//! for row in db.query("SELECT * FROM events WHERE done = ?", &[Value::from(false)])? {
//!    let at: OffsetDateTime = row.get("at")?;
//!    let done: bool = row.get("done")?;
//!    println!("{} at {at} done={done}", row.get::<String>("name")?);
//! }
//!
//! db.close()?;
//! # Ok(())
//! # }
//! ```

mod database;
mod error;

pub use database::Database;
pub use error::{Error, Result};

// Re-export the value and row types from the native layer
pub use sqlite_typed_core::{
   BindError, Columns, DatabaseConfig, DecodeError, FromValue, OffsetDateTime, Row, Value,
   WriteQueryResult,
};
