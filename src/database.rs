use std::path::Path;

use sqlite_typed_core::{Connection, DatabaseConfig, Row, Value, WriteQueryResult};
use tracing::debug;

use crate::Error;

/// Handle owning at most one open SQLite connection.
///
/// This struct is the main entry point: open a file, run statements with
/// positional [`Value`] parameters, read back [`Row`]s, close. Every call
/// runs to completion on the calling thread, and the prepared statement it
/// creates is finalized before it returns, whether it succeeds or fails.
///
/// The handle is `Send` but not `Sync`. To share it between threads, wrap it
/// in a `Mutex`; calls are never serialized internally.
///
/// # Examples
///
/// ```no_run
/// use sqlite_typed::{Database, Value};
///
/// # fn example() -> Result<(), sqlite_typed::Error> {
/// let mut db = Database::new(None);
/// db.open("/tmp/my.db")?;
///
/// db.execute("CREATE TABLE IF NOT EXISTS users (name TEXT, active INTEGER)", &[])?;
/// db.execute(
///     "INSERT INTO users (name, active) VALUES (?, ?)",
///     &[Value::from("Alice"), Value::from(true)],
/// )?;
///
/// for row in db.query("SELECT name, active FROM users", &[])? {
///     let active: bool = row.get("active")?;
///     println!("{}: {}", row.get::<String>("name")?, active);
/// }
///
/// db.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Database {
   conn: Option<Connection>,
   config: DatabaseConfig,
}

impl Database {
   /// Create a closed handle.
   ///
   /// * `custom_config` - Settings applied by [`Database::open`]. Pass `None`
   ///   for the defaults (create if missing, read-write, 5 second busy timeout).
   pub fn new(custom_config: Option<DatabaseConfig>) -> Self {
      Self {
         conn: None,
         config: custom_config.unwrap_or_default(),
      }
   }

   /// Create a handle and open the database at `path` in one step.
   ///
   /// # Examples
   ///
   /// ```no_run
   /// use sqlite_typed::{Database, DatabaseConfig};
   ///
   /// # fn example() -> Result<(), sqlite_typed::Error> {
   /// let config = DatabaseConfig {
   ///    read_only: true,
   ///    ..Default::default()
   /// };
   /// let db = Database::connect("/tmp/my.db", Some(config))?;
   /// # Ok(())
   /// # }
   /// ```
   pub fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<DatabaseConfig>,
   ) -> Result<Self, Error> {
      let mut db = Self::new(custom_config);
      db.open(path)?;
      Ok(db)
   }

   /// Open (or create) the database file at `path`.
   ///
   /// Fails with [`Error::AlreadyOpen`] if this handle already holds a
   /// connection; call [`Database::close`] first to switch files.
   pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
      let path = path.as_ref();

      if let Some(conn) = &self.conn {
         return Err(Error::AlreadyOpen(conn.path().to_path_buf()));
      }

      if path.as_os_str().is_empty() {
         return Err(Error::InvalidPath("database path cannot be empty".into()));
      }

      self.conn = Some(Connection::open(path, &self.config)?);
      Ok(())
   }

   /// Returns true while a connection is held.
   pub fn is_open(&self) -> bool {
      self.conn.is_some()
   }

   /// Path of the open database, if any.
   pub fn path(&self) -> Option<&Path> {
      self.conn.as_ref().map(Connection::path)
   }

   pub fn config(&self) -> &DatabaseConfig {
      &self.config
   }

   fn connection(&self) -> Result<&Connection, Error> {
      self.conn.as_ref().ok_or(Error::NotOpen)
   }

   /// Run a statement that returns no rows (INSERT, UPDATE, DELETE, DDL).
   ///
   /// `params` bind to the `?` placeholders in order, and their number must
   /// match. Rows produced by the statement, if any, are discarded.
   ///
   /// # Examples
   ///
   /// ```no_run
   /// # fn example(db: &sqlite_typed::Database) -> Result<(), sqlite_typed::Error> {
   /// use sqlite_typed::Value;
   ///
   /// let result = db.execute(
   ///     "INSERT INTO users (name, age) VALUES (?, ?)",
   ///     &[Value::from("Alice"), Value::from(30)],
   /// )?;
   ///
   /// println!("Inserted row {}", result.last_insert_id);
   /// # Ok(())
   /// # }
   /// ```
   pub fn execute(&self, sql: &str, params: &[Value]) -> Result<WriteQueryResult, Error> {
      Ok(self.connection()?.execute(sql, params)?)
   }

   /// Run a query and return every result row.
   ///
   /// Returns an empty vector when nothing matches. If any row fails to
   /// step or decode, the whole call fails and no rows are returned.
   pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, Error> {
      Ok(self.connection()?.query(sql, params)?)
   }

   /// Run a query expected to return zero or one row.
   ///
   /// Returns an error if the query returns more than one row.
   pub fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>, Error> {
      let mut rows = self.query(sql, params)?;
      match rows.len() {
         0 | 1 => Ok(rows.pop()),
         count => Err(Error::MultipleRowsReturned(count)),
      }
   }

   /// Number of prepared statements on the open connection not yet finalized.
   ///
   /// Always zero between calls; exposed so callers and tests can verify that.
   pub fn live_statement_count(&self) -> Result<usize, Error> {
      Ok(self.connection()?.live_statement_count())
   }

   /// Close the connection.
   ///
   /// Closing a handle that is not open does nothing. The handle counts as
   /// closed even if the engine reports an error; every statement has been
   /// finalized by then, so no refusal is expected.
   pub fn close(&mut self) -> Result<(), Error> {
      let Some(conn) = self.conn.take() else {
         debug!("close() called on a database that is not open");
         return Ok(());
      };
      conn.close()?;
      Ok(())
   }
}
