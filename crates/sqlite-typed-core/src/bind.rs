//! Positional parameter binding.

use std::ffi::c_int;

use libsqlite3_sys::{
   SQLITE_OK, SQLITE_RANGE, SQLITE_TRANSIENT, sqlite3_bind_double, sqlite3_bind_int64,
   sqlite3_bind_null, sqlite3_bind_text,
};

use crate::codec::{BindOp, encode};
use crate::error::BindError;
use crate::statement::Statement;
use crate::value::Value;

/// Bind `params` to placeholders 1..=N in order.
///
/// Stops at the first failure; earlier bindings are left in place and are
/// discarded when the statement is finalized. The caller is responsible for
/// checking the parameter count first.
pub fn bind_parameters(statement: &mut Statement<'_>, params: &[Value]) -> Result<(), BindError> {
   for (offset, value) in params.iter().enumerate() {
      bind_value(statement, offset + 1, value)?;
   }
   Ok(())
}

/// Bind a single value at 1-based `position`.
pub fn bind_value(
   statement: &mut Statement<'_>,
   position: usize,
   value: &Value,
) -> Result<(), BindError> {
   let idx = c_int::try_from(position).map_err(|_| BindError::Engine {
      position,
      code: SQLITE_RANGE,
      message: crate::connection::errstr(SQLITE_RANGE),
   })?;
   let stmt = statement.as_ptr();

   // SAFETY: stmt is a live prepared statement owned by `statement`; text is
   // bound with SQLITE_TRANSIENT so the engine copies it before returning.
   let rc = match encode(value) {
      BindOp::Null => unsafe { sqlite3_bind_null(stmt, idx) },
      BindOp::Int64(v) => unsafe { sqlite3_bind_int64(stmt, idx, v) },
      BindOp::Double(v) if v.is_nan() => return Err(BindError::NotANumber { position }),
      BindOp::Double(v) => unsafe { sqlite3_bind_double(stmt, idx, v) },
      BindOp::Text(text) => {
         let len = c_int::try_from(text.len()).map_err(|_| BindError::TooBig {
            position,
            len: text.len(),
         })?;
         unsafe { sqlite3_bind_text(stmt, idx, text.as_ptr().cast(), len, SQLITE_TRANSIENT()) }
      }
   };

   if rc != SQLITE_OK {
      let (_, message) = statement.connection().last_error();
      return Err(BindError::Engine {
         position,
         code: rc,
         message,
      });
   }
   Ok(())
}
