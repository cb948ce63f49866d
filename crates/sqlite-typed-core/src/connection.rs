//! Owned native connection handle.

use std::ffi::{CStr, CString, c_int};
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};

use libsqlite3_sys::{
   SQLITE_CANTOPEN, SQLITE_NOMEM, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_NOMUTEX,
   SQLITE_OPEN_READONLY, SQLITE_OPEN_READWRITE, sqlite3, sqlite3_busy_timeout, sqlite3_changes64,
   sqlite3_close, sqlite3_errmsg, sqlite3_errstr, sqlite3_extended_errcode,
   sqlite3_extended_result_codes, sqlite3_last_insert_rowid, sqlite3_next_stmt,
   sqlite3_open_v2, sqlite3_total_changes64,
};
use tracing::{debug, error};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::statement::{self, WriteQueryResult};
use crate::value::Value;

/// Closes the wrapped `sqlite3*` when dropped.
///
/// Kept separate from [`Connection`] so `Connection::close` can move the
/// handle out and report the close result instead of logging it.
struct RawConnection(NonNull<sqlite3>);

impl RawConnection {
   fn close(self) -> std::result::Result<(), (i32, String)> {
      let db = self.0;
      std::mem::forget(self);
      // SAFETY: db came from a successful sqlite3_open_v2 and ownership left
      // `self` above, so it is closed exactly once.
      unsafe { close_handle(db) }
   }
}

impl Drop for RawConnection {
   fn drop(&mut self) {
      // SAFETY: the handle is owned by this guard and not used after drop.
      if let Err((code, message)) = unsafe { close_handle(self.0) } {
         error!(code, %message, "Failed to close SQLite connection");
      }
   }
}

/// Close a native connection handle.
///
/// The engine refuses with `SQLITE_BUSY` while statements prepared on the
/// connection are still alive; the refusal is returned and the handle stays
/// open. Every [`crate::Statement`] borrows its connection, so safe code
/// always finalizes them first.
///
/// # Safety
///
/// `db` must be an open connection that is not used again after a
/// successful close.
unsafe fn close_handle(db: NonNull<sqlite3>) -> std::result::Result<(), (i32, String)> {
   // SAFETY: the caller guarantees db is an open connection.
   let rc = unsafe { sqlite3_close(db.as_ptr()) };
   if rc == SQLITE_OK {
      return Ok(());
   }
   // SAFETY: the close was refused, so db is still a valid connection.
   let message = unsafe { errmsg(db.as_ptr()) };
   Err((rc, message))
}

/// Read the connection's most recent error message.
///
/// # Safety
///
/// `db` must be a valid connection handle.
pub(crate) unsafe fn errmsg(db: *mut sqlite3) -> String {
   let ptr = unsafe { sqlite3_errmsg(db) };
   if ptr.is_null() {
      return errstr(SQLITE_NOMEM);
   }
   // SAFETY: sqlite3_errmsg returns a NUL-terminated string owned by the
   // connection, copied before any other call on it.
   unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// English description of a result code.
pub(crate) fn errstr(code: c_int) -> String {
   // SAFETY: sqlite3_errstr returns a pointer to a static string for any code.
   let ptr = unsafe { sqlite3_errstr(code) };
   if ptr.is_null() {
      return format!("SQLite error {code}");
   }
   // SAFETY: non-null results point at static NUL-terminated strings.
   unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// A single open connection to one database file.
///
/// The connection is `Send` but not `Sync`: it can move to another thread,
/// but only one caller uses it at a time. It is opened with
/// `SQLITE_OPEN_NOMUTEX`, which the engine permits under exactly that rule.
///
/// Dropping the connection closes it; use [`Connection::close`] to observe
/// a failed close.
pub struct Connection {
   raw: RawConnection,
   path: PathBuf,
}

// SAFETY: the handle is only reachable through `&self`/`&mut self` of a
// non-Sync owner, so it is never used from two threads at once.
unsafe impl Send for Connection {}

impl std::fmt::Debug for Connection {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("Connection")
         .field("path", &self.path)
         .finish_non_exhaustive()
   }
}

impl Connection {
   /// Open (or create, per `config`) the database at `path`.
   pub fn open(path: impl AsRef<Path>, config: &DatabaseConfig) -> Result<Self> {
      let path = path.as_ref();
      let open_error = |code: i32, message: String| Error::Open {
         path: path.to_path_buf(),
         code,
         message,
      };

      let path_str = path
         .to_str()
         .ok_or_else(|| open_error(SQLITE_CANTOPEN, "path is not valid UTF-8".into()))?;
      let c_path = CString::new(path_str)
         .map_err(|_| open_error(SQLITE_CANTOPEN, "path contains a NUL byte".into()))?;

      let mut flags = SQLITE_OPEN_NOMUTEX;
      if config.read_only {
         flags |= SQLITE_OPEN_READONLY;
      } else {
         flags |= SQLITE_OPEN_READWRITE;
         if config.create_if_missing {
            flags |= SQLITE_OPEN_CREATE;
         }
      }

      let mut db: *mut sqlite3 = ptr::null_mut();
      // SAFETY: c_path is NUL-terminated and db is a valid out-pointer.
      let rc = unsafe { sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };
      if rc != SQLITE_OK {
         let message = match NonNull::new(db) {
            Some(handle) => {
               // The engine allocates a handle even on most failures; it still
               // has to be closed.
               // SAFETY: handle came from sqlite3_open_v2, has no statements
               // and is not used after this block.
               let message = unsafe { errmsg(handle.as_ptr()) };
               let _ = unsafe { close_handle(handle) };
               message
            }
            None => errstr(rc),
         };
         return Err(open_error(rc, message));
      }

      let handle =
         NonNull::new(db).ok_or_else(|| open_error(SQLITE_NOMEM, errstr(SQLITE_NOMEM)))?;
      let raw = RawConnection(handle);

      let busy_timeout = c_int::try_from(config.busy_timeout_ms).unwrap_or(c_int::MAX);
      // SAFETY: handle is a freshly opened connection.
      unsafe {
         sqlite3_extended_result_codes(handle.as_ptr(), 1);
         sqlite3_busy_timeout(handle.as_ptr(), busy_timeout);
      }

      debug!(
         path = %path.display(),
         read_only = config.read_only,
         "Opened SQLite connection"
      );

      Ok(Self {
         raw,
         path: path.to_path_buf(),
      })
   }

   /// Path this connection was opened with.
   pub fn path(&self) -> &Path {
      &self.path
   }

   pub(crate) fn handle(&self) -> *mut sqlite3 {
      self.raw.0.as_ptr()
   }

   /// Extended result code and message of the most recent failure.
   pub(crate) fn last_error(&self) -> (i32, String) {
      // SAFETY: handle is open for the lifetime of self.
      unsafe {
         (
            sqlite3_extended_errcode(self.handle()),
            errmsg(self.handle()),
         )
      }
   }

   /// Rows modified by the most recent INSERT, UPDATE or DELETE.
   pub(crate) fn changes(&self) -> u64 {
      // SAFETY: handle is open for the lifetime of self.
      let changes = unsafe { sqlite3_changes64(self.handle()) };
      u64::try_from(changes).unwrap_or_default()
   }

   /// Rows modified since the connection was opened, triggers included.
   pub(crate) fn total_changes(&self) -> i64 {
      // SAFETY: handle is open for the lifetime of self.
      unsafe { sqlite3_total_changes64(self.handle()) }
   }

   /// ROWID of the most recent successful INSERT on this connection.
   pub fn last_insert_rowid(&self) -> i64 {
      // SAFETY: handle is open for the lifetime of self.
      unsafe { sqlite3_last_insert_rowid(self.handle()) }
   }

   /// Number of prepared statements on this connection that have not been finalized.
   ///
   /// Every call in this crate finalizes its statement before returning, so
   /// this is zero between calls.
   pub fn live_statement_count(&self) -> usize {
      let mut count = 0;
      // SAFETY: handle is open; sqlite3_next_stmt only walks the connection's
      // statement list and the connection is not shared across threads.
      let mut stmt = unsafe { sqlite3_next_stmt(self.handle(), ptr::null_mut()) };
      while !stmt.is_null() {
         count += 1;
         // SAFETY: stmt was just returned by the engine for this connection.
         stmt = unsafe { sqlite3_next_stmt(self.handle(), stmt) };
      }
      count
   }

   /// Run a statement that is not expected to produce rows.
   ///
   /// See [`crate::execute`].
   pub fn execute(&self, sql: &str, params: &[Value]) -> Result<WriteQueryResult> {
      statement::execute(self, sql, params)
   }

   /// Run a statement and collect every result row.
   ///
   /// See [`crate::query`].
   pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
      statement::query(self, sql, params)
   }

   /// Close the connection, reporting a refused close.
   ///
   /// Statements borrow the connection, so it cannot be closed while one is
   /// still alive:
   ///
   /// ```compile_fail
   /// use sqlite_typed_core::{Connection, DatabaseConfig, Statement};
   ///
   /// let conn = Connection::open(":memory:", &DatabaseConfig::default()).unwrap();
   /// let stmt = Statement::prepare(&conn, "SELECT 1").unwrap();
   /// conn.close().unwrap();
   /// drop(stmt);
   /// ```
   pub fn close(self) -> Result<()> {
      let Connection { raw, path } = self;
      match raw.close() {
         Ok(()) => {
            debug!(path = %path.display(), "Closed SQLite connection");
            Ok(())
         }
         Err((code, message)) => Err(Error::Close { code, message }),
      }
   }
}
