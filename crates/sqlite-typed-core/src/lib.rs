//! # sqlite-typed-core
//!
//! The native layer between typed Rust values and SQLite's C prepared-statement API.
//!
//! ## Core Types
//!
//! - **[`Connection`]**: owns one `sqlite3*` handle and closes it on drop
//! - **[`Statement`]**: owns one `sqlite3_stmt*` and finalizes it on drop
//! - **[`Value`]**: the closed set of scalars that crosses the boundary
//! - **[`Row`]**: a decoded result row with name and positional lookup
//! - **[`FromValue`]**: typed reads, including booleans and timestamps
//! - **[`DatabaseConfig`]**: open flags and busy timeout
//!
//! ## Lifecycle
//!
//! [`execute`] and [`query`] prepare a statement, check and bind the
//! parameters, step it to completion and finalize it before returning,
//! whether they succeed or fail:
//!
//! ```no_run
//! use sqlite_typed_core::{Connection, DatabaseConfig, Value};
//!
//! # fn example() -> sqlite_typed_core::Result<()> {
//! let conn = Connection::open("example.db", &DatabaseConfig::default())?;
//! conn.execute("CREATE TABLE t (name TEXT, done INTEGER)", &[])?;
//! conn.execute(
//!     "INSERT INTO t (name, done) VALUES (?, ?)",
//!     &[Value::from("write docs"), Value::from(true)],
//! )?;
//!
//! for row in conn.query("SELECT name, done FROM t", &[])? {
//!     let done: bool = row.get("done")?;
//!     println!("{} {}", row.get::<String>("name")?, done);
//! }
//! conn.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Threading
//!
//! Everything runs synchronously on the calling thread. A connection may be
//! moved between threads but serves one caller at a time.

mod bind;
mod codec;
mod config;
mod connection;
mod decode;
mod error;
mod row;
mod statement;
mod value;

pub use bind::{bind_parameters, bind_value};
pub use codec::{BindOp, StorageClass, decode_column, encode};
pub use config::DatabaseConfig;
pub use connection::Connection;
pub use decode::{decode_row, read_columns};
pub use error::{BindError, DecodeError, Error, Result};
pub use row::{Columns, Row};
pub use statement::{Statement, Step, WriteQueryResult, execute, query};
pub use value::{FromValue, Value, seconds_to_timestamp, timestamp_to_seconds};

pub use time::OffsetDateTime;
