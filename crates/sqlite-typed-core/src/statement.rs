//! Prepared statement guard and the execute/query lifecycle built on it.
//!
//! A [`Statement`] owns exactly one native prepared statement and finalizes
//! it in `Drop`. Because the guard is created the moment preparation
//! succeeds, every later exit path (a bind failure, a step error, a decode
//! error, a panic) releases the statement exactly once, and a failed
//! preparation has nothing to release.

use std::ffi::{CStr, c_char, c_int};
use std::ptr::{self, NonNull};
use std::sync::Arc;

use libsqlite3_sys::{
   SQLITE_DONE, SQLITE_MISUSE, SQLITE_OK, SQLITE_ROW, SQLITE_TOOBIG, sqlite3_bind_parameter_count,
   sqlite3_column_count, sqlite3_column_name, sqlite3_finalize, sqlite3_prepare_v2, sqlite3_step,
   sqlite3_stmt,
};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::bind::bind_parameters;
use crate::connection::{Connection, errstr};
use crate::decode::{decode_row, read_columns};
use crate::error::{BindError, DecodeError, Error, Result};
use crate::row::Row;
use crate::value::Value;

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
   /// A result row is available.
   Row,
   /// The statement has run to completion.
   Done,
}

/// Result returned from write operations (e.g. INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteQueryResult {
   /// The number of rows affected by the write operation.
   ///
   /// Zero for DDL and for statements that modify nothing. Rows changed by
   /// triggers are not counted.
   pub rows_affected: u64,
   /// ROWID of the most recent successful INSERT on the connection.
   ///
   /// Unchanged by statements that are not inserts; 0 if nothing has ever
   /// been inserted through this connection.
   pub last_insert_id: i64,
}

/// One compiled SQL statement, finalized on drop.
pub struct Statement<'a> {
   stmt: NonNull<sqlite3_stmt>,
   conn: &'a Connection,
   sql: &'a str,
}

impl<'a> Statement<'a> {
   /// Compile `sql` on `conn`.
   ///
   /// Returns `Ok(None)` when the text holds no statement (only whitespace
   /// or comments). Text with a second statement after the first is
   /// rejected.
   pub fn prepare(conn: &'a Connection, sql: &'a str) -> Result<Option<Self>> {
      let len = c_int::try_from(sql.len()).map_err(|_| Error::Prepare {
         sql: sql.to_owned(),
         code: SQLITE_TOOBIG,
         message: errstr(SQLITE_TOOBIG),
      })?;

      let mut stmt: *mut sqlite3_stmt = ptr::null_mut();
      let mut tail: *const c_char = ptr::null();
      // SAFETY: the connection is open, sql points to `len` readable bytes,
      // and both out-pointers are valid.
      let rc = unsafe {
         sqlite3_prepare_v2(
            conn.handle(),
            sql.as_ptr().cast(),
            len,
            &mut stmt,
            &mut tail,
         )
      };
      if rc != SQLITE_OK {
         // No statement is produced when preparation fails.
         let (code, message) = conn.last_error();
         warn!(%sql, code, %message, "Failed to prepare statement");
         return Err(Error::Prepare {
            sql: sql.to_owned(),
            code,
            message,
         });
      }

      let Some(stmt) = NonNull::new(stmt) else {
         trace!(%sql, "SQL text contains no statement");
         return Ok(None);
      };
      let statement = Self { stmt, conn, sql };
      trace!(%sql, "Prepared statement");

      let consumed = if tail.is_null() {
         sql.len()
      } else {
         (tail as usize).saturating_sub(sql.as_ptr() as usize)
      };
      let rest = sql.get(consumed..).unwrap_or_default();
      if !is_blank_sql(rest) {
         warn!(%sql, "Rejected SQL containing more than one statement");
         return Err(Error::Prepare {
            sql: sql.to_owned(),
            code: SQLITE_MISUSE,
            message: "multiple statements are not supported in a single call".into(),
         });
      }

      Ok(Some(statement))
   }

   pub(crate) fn as_ptr(&self) -> *mut sqlite3_stmt {
      self.stmt.as_ptr()
   }

   pub(crate) fn connection(&self) -> &'a Connection {
      self.conn
   }

   /// SQL text this statement was compiled from.
   pub fn sql(&self) -> &str {
      self.sql
   }

   /// Number of `?` placeholders the statement expects.
   pub fn parameter_count(&self) -> usize {
      // SAFETY: stmt is live for the lifetime of self.
      let count = unsafe { sqlite3_bind_parameter_count(self.as_ptr()) };
      usize::try_from(count).unwrap_or_default()
   }

   /// Number of result columns (zero for statements that return no data).
   pub fn column_count(&self) -> usize {
      // SAFETY: stmt is live for the lifetime of self.
      let count = unsafe { sqlite3_column_count(self.as_ptr()) };
      usize::try_from(count).unwrap_or_default()
   }

   /// Name the engine reports for result column `index`.
   pub fn column_name(&self, index: usize) -> std::result::Result<String, DecodeError> {
      let len = self.column_count();
      let idx = c_int::try_from(index)
         .ok()
         .filter(|_| index < len)
         .ok_or(DecodeError::IndexOutOfRange { index, len })?;
      // SAFETY: stmt is live and idx is within the column count.
      let name = unsafe { sqlite3_column_name(self.as_ptr(), idx) };
      if name.is_null() {
         return Err(DecodeError::MissingColumnName { index });
      }
      // SAFETY: the engine returns a NUL-terminated UTF-8 string valid until
      // the statement is finalized; it is copied immediately.
      Ok(unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
   }

   /// Check the parameter count, then bind `params` in order.
   pub fn bind(&mut self, params: &[Value]) -> Result<()> {
      let expected = self.parameter_count();
      if expected != params.len() {
         warn!(sql = %self.sql, expected, actual = params.len(), "Parameter count mismatch");
         return Err(BindError::ParameterCount {
            sql: self.sql.to_owned(),
            expected,
            actual: params.len(),
         }
         .into());
      }
      bind_parameters(self, params)?;
      Ok(())
   }

   /// Advance the statement by one step.
   pub fn step(&mut self) -> Result<Step> {
      // SAFETY: stmt is live for the lifetime of self.
      match unsafe { sqlite3_step(self.as_ptr()) } {
         SQLITE_ROW => Ok(Step::Row),
         SQLITE_DONE => Ok(Step::Done),
         _ => {
            let (code, message) = self.conn.last_error();
            Err(Error::Step {
               sql: self.sql.to_owned(),
               code,
               message,
            })
         }
      }
   }
}

impl Drop for Statement<'_> {
   fn drop(&mut self) {
      // The return value repeats the last step error, which was already
      // reported to the caller.
      // SAFETY: stmt is owned by this guard and never used after drop.
      let rc = unsafe { sqlite3_finalize(self.stmt.as_ptr()) };
      trace!(sql = %self.sql, rc, "Finalized statement");
   }
}

/// True if `sql` holds only whitespace, semicolons and comments.
fn is_blank_sql(sql: &str) -> bool {
   let mut rest = sql;
   loop {
      rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ';');
      if let Some(comment) = rest.strip_prefix("--") {
         rest = comment.split_once('\n').map_or("", |(_, after)| after);
      } else if let Some(comment) = rest.strip_prefix("/*") {
         rest = comment.split_once("*/").map_or("", |(_, after)| after);
      } else {
         return rest.is_empty();
      }
   }
}

/// Prepare, bind and run `sql` to completion.
///
/// Any rows the statement produces are discarded.
pub fn execute(conn: &Connection, sql: &str, params: &[Value]) -> Result<WriteQueryResult> {
   let Some(mut statement) = Statement::prepare(conn, sql)? else {
      reject_params_for_empty_sql(sql, params)?;
      return Ok(WriteQueryResult {
         rows_affected: 0,
         last_insert_id: conn.last_insert_rowid(),
      });
   };
   statement.bind(params)?;

   let total_before = conn.total_changes();
   let mut discarded = 0usize;
   while statement.step()? == Step::Row {
      discarded += 1;
   }
   if discarded > 0 {
      trace!(%sql, discarded, "Discarded rows produced by execute");
   }

   // sqlite3_changes keeps the count of the last DML statement, so only
   // trust it when this statement actually changed something.
   let rows_affected = if conn.total_changes() == total_before {
      0
   } else {
      conn.changes()
   };

   Ok(WriteQueryResult {
      rows_affected,
      last_insert_id: conn.last_insert_rowid(),
   })
}

/// Prepare, bind and run `sql`, decoding every result row.
///
/// Any failure fails the whole call and discards the rows decoded so far.
pub fn query(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
   let Some(mut statement) = Statement::prepare(conn, sql)? else {
      reject_params_for_empty_sql(sql, params)?;
      return Ok(Vec::new());
   };
   statement.bind(params)?;

   let columns = Arc::new(read_columns(&statement)?);
   let mut rows = Vec::new();
   while statement.step()? == Step::Row {
      rows.push(decode_row(&statement, &columns)?);
   }

   trace!(%sql, rows = rows.len(), "Query complete");
   Ok(rows)
}

fn reject_params_for_empty_sql(sql: &str, params: &[Value]) -> Result<()> {
   if params.is_empty() {
      return Ok(());
   }
   Err(BindError::ParameterCount {
      sql: sql.to_owned(),
      expected: 0,
      actual: params.len(),
   }
   .into())
}
